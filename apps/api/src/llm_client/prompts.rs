// Instruction templates for critique requests. Replace `{resume_text}` before sending.
//
// The section labels here are load-bearing: the response parser recognizes
// exactly these headings. Changing a label requires updating the parser table.

pub const CRITIQUE_PROMPT_TEMPLATE: &str = "You are a senior technical resume optimization expert. \
Provide a rigorous, detailed analysis with actionable, specific improvements. \
Use strong, metric-focused rewrites. Avoid generic advice. Do NOT invent experience; only reshape what's implied. \
Return content in exactly these sections (no extra text before or after):\n\
Rating: <1-10 overall score>\n\
Suggestions:\n\
- <High-impact item 1 with concrete example / rewrite>\n\
- <High-impact item 2 ...> (5-12 bullets total, prioritize quantified impact, clarity, ATS alignment)\n\
Keyword Gaps (comma-separated): <missing or weak keywords>\n\
Improved Summary (10/10):\n<rewritten professional summary>\n\
Improved Bullet Examples:\n\
<2-4 transformed bullet rewrites showing before -> after OR just the improved versions>\n\
Priority Fix Order:\n1. <Most critical fix>\n2. <Second>\n3. <Third> (limit to top 5)\n\
\nResume:\n{resume_text}\n\
Ensure each bullet is specific, includes measurable impact where possible \
(%, time saved, scale, users, revenue, performance changes).";

/// Renders the critique prompt for one resume.
pub fn critique_prompt(resume_text: &str) -> String {
    CRITIQUE_PROMPT_TEMPLATE.replace("{resume_text}", resume_text)
}
