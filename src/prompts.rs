//! Prompts for the project-analysis call.
//!
//! Every prompt lives here so the retry and parsing logic in
//! [`crate::pipeline::llm`] never has to change when the wording does, and
//! so tests can inspect prompts without a provider.
//!
//! Callers can override the system prompt via
//! [`crate::config::ReportConfig::system_prompt`]; the template here is used
//! only when no override is provided.

/// System prompt template. `{company}` is replaced by the brand's legal name.
///
/// Asks for the flat schema: eight string fields, markdown inside, three of
/// them pipe tables. The composer also accepts the structured schema, so a
/// custom prompt may ask for that instead.
pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a **Senior Technical Consultant and Enterprise Solution Architect** working for **{company}**, a premium IT services and digital solutions company.

**YOUR GOAL:**
Generate a complete, client-ready, enterprise-grade **Project Proposal** based strictly on the project description provided.

**CRITICAL INSTRUCTIONS:**
- Return ONLY a valid JSON object. No code fences, no commentary.
- The content inside the JSON strings MUST use Markdown formatting (e.g., tables, headers, bullet points).
- **Tone:** Formal, confident, and premium consulting tone. No emojis, slang, or casual phrasing.
- **Inference:** Never return "Not Specified". Estimate realistic details based on industry standards.

**JSON OUTPUT SCHEMA & CONTENT GUIDELINES:**
{
  "projectName": "String (Official project title)",
  "projectOverview": "String (Concise, professional explanation of idea, objectives, and outcomes. Demonstrate clear understanding.)",
  "scopeOfWork": "String (Define scope clearly. Divide into logical phases e.g., '### Phase 1' using Markdown headers. Be detailed.)",
  "timeline": "String (MUST be a Markdown Table. Columns: | Week | Phase / Activity | Description of Work |. Provide week-wise breakdown.)",
  "technologies": "String (MUST be a Markdown Table. Columns: | Category | Technology Stack | e.g. Frontend | React, Tailwind...)",
  "investment": "String (MUST be a Markdown Table. Columns: | Week / Phase | Work Description | Estimated Cost |. The LAST ROW must be 'TOTAL' with the final amount. Use specific currency symbols.)",
  "paymentTerms": "String (Define professional payment terms aligned with milestones. e.g. 50% Advance, 50% Completion.)",
  "deliverables": "String (List all project deliverables professionally. e.g. source code, admin rights, docs.)"
}

**FINANCIAL & TIMELINE ESTIMATION LOGIC:**
- **Timeline:** Standard Web = 4-6 Weeks. Mobile Apps = 10-14 Weeks. AI/SaaS = 12-20 Weeks.
- **Budget:** Simple Web: ₹70,000 - ₹1.5L | Custom App: ₹3L - ₹8L | Enterprise AI: ₹15L - ₹25L+. (Use USD for international clients, INR for India).
"#;

/// Text sent with an image attachment in place of extracted document text.
pub const IMAGE_ATTACHMENT_NOTE: &str =
    "The client attached the image below (a sketch, screenshot or mock-up). Use it as project context.";

/// The system prompt for `company`.
pub fn analysis_system_prompt(company: &str) -> String {
    ANALYSIS_SYSTEM_PROMPT.replace("{company}", company)
}

/// The first `limit` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// Build the user turn: description, optional category and country, then
/// the attachment text cut to `char_limit` characters.
pub fn build_user_prompt(
    description: &str,
    category: Option<&str>,
    country: Option<&str>,
    document: Option<&str>,
    char_limit: usize,
) -> String {
    let mut prompt = format!("Project Description:\n{description}\n");
    if let Some(category) = category.filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("Service Category: {category}\n"));
    }
    if let Some(country) = country.filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("Client Country: {country}\n"));
    }
    if let Some(doc) = document.filter(|d| !d.is_empty()) {
        prompt.push_str("\nProject Document Content:\n");
        prompt.push_str(truncate_chars(doc, char_limit));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_names_the_company_and_schema() {
        let p = analysis_system_prompt("Acme Labs");
        assert!(p.contains("working for **Acme Labs**"));
        assert!(!p.contains("{company}"));
        for field in crate::analysis::FLAT_FIELDS {
            assert!(p.contains(&format!("\"{field}\"")), "missing {field}");
        }
    }

    #[test]
    fn user_prompt_skips_blank_metadata() {
        let p = build_user_prompt("A CRM", Some(""), Some("Germany"), None, 100);
        assert_eq!(p, "Project Description:\nA CRM\nClient Country: Germany\n");
    }

    #[test]
    fn document_is_truncated_by_characters() {
        let doc = "é".repeat(30);
        let p = build_user_prompt("X", Some("Web"), None, Some(&doc), 10);
        assert!(p.contains("Service Category: Web\n"));
        assert!(p.ends_with(&"é".repeat(10)));
        assert!(!p.ends_with(&"é".repeat(11)));
    }

    #[test]
    fn truncate_short_text_is_identity() {
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
