use crate::llm::ChatMessage;
use crate::translate::Language;

pub const SYSTEM_PROMPT: &str = "You act as a text translator";

/// Delimiters around the article inside the user message
pub const ARTICLE_START: &str = "<<<ARTICLE>>>";
pub const ARTICLE_END: &str = "<<<END ARTICLE>>>";

/// Build the messages for a single markdown-preserving translation call.
pub fn build_translation_prompt(
    markdown: &str,
    source_language: Option<Language>,
    target_language: Language,
) -> Vec<ChatMessage> {
    let from = source_language
        .map(|lang| format!(" from {} ({})", lang.native_name(), lang.display_name()))
        .unwrap_or_default();

    let instruction = format!(
        "Translate the markdown article between {start} and {end}{from} to {target} ({target_en}) language.\n\
         Keep the markdown formatting exactly: the same headings and heading levels, list markers and \
         nesting, emphasis, links and link targets, images, tables, block quotes and code blocks. \
         Do not translate code, URLs or link targets.\n\
         Respond only with the translation in markdown format, without the delimiters or any comment.\n\n\
         {start}\n{markdown}\n{end}",
        start = ARTICLE_START,
        end = ARTICLE_END,
        from = from,
        target = target_language.native_name(),
        target_en = target_language.display_name(),
        markdown = markdown.trim(),
    );

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(instruction)]
}
