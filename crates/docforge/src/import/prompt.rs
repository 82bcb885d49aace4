//! The instruction sent with pasted text.

/// The system message.
pub const SYSTEM_PROMPT: &str = "You are a document structuring assistant. \
You split plain text into a hierarchy of headings and body text without \
rewriting, summarizing or translating it.";

/// The JSON shape the model must reply with.
pub const OUTPUT_SCHEMA: &str =
    r#"[{"level": 1, "title": "heading text", "content": "body text under the heading"}]"#;

/// Builds the user message embedding `text`.
pub fn user_prompt(text: &str) -> String {
    format!(
        "Split the text below into sections. Each section has a heading level \
(1, 2 or 3), a heading title and the body text that follows the heading. \
Keep the original wording and order. Separate body paragraphs with a blank \
line.\n\
\n\
Reply with a single fenced ```json code block containing an array with this \
shape and nothing else:\n\
{OUTPUT_SCHEMA}\n\
\n\
Text:\n\
<<<\n\
{text}\n\
>>>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_text_and_schema() {
        let prompt = user_prompt("第一章\n正文");
        assert!(prompt.contains("<<<\n第一章\n正文\n>>>"));
        assert!(prompt.contains(OUTPUT_SCHEMA));
        assert!(prompt.contains("```json"));
    }
}
