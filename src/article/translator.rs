use std::sync::Arc;

use chrono::Local;
use tracing::{debug, info, warn};

use super::extractor::extract_article;
use super::fetcher::{parse_article_url, PageFetcher};
use super::prompt::build_translation_prompt;
use crate::error::{TranslateError, TranslateResult};
use crate::llm::CompletionInterface;
use crate::translate::{
    OutputFormat, TranslatedContent, TranslationRequest, TranslationResult, TranslationSource,
};

/// Orchestrates URL → markdown → completion → downloadable markdown.
pub struct ArticleTranslator {
    fetcher: PageFetcher,
    llm: Arc<dyn CompletionInterface>,
    max_article_chars: usize,
}

impl ArticleTranslator {
    pub fn new(fetcher: PageFetcher, llm: Arc<dyn CompletionInterface>, max_article_chars: usize) -> Self {
        Self {
            fetcher,
            llm,
            max_article_chars,
        }
    }

    pub async fn translate(&self, request: &TranslationRequest) -> TranslateResult<TranslationResult> {
        // Everything up to the fetch is local validation
        let target = request.require_target()?;
        let raw_url = match &request.source {
            TranslationSource::Url(url) => url,
            TranslationSource::File { .. } => {
                return Err(TranslateError::input("the article translator expects a URL"))
            }
        };
        let url = parse_article_url(raw_url)?;
        if request.source_language == Some(target) {
            return Err(TranslateError::input(
                "source and target languages must be different",
            ));
        }

        info!("Translating article {} to {}", url, target.code());
        let page = self.fetcher.fetch(&url).await?;
        let content = extract_article(&page.html, &page.url);
        if content.is_empty() {
            warn!("No content extracted from {}", url);
            return Err(TranslateError::NoContent(url.to_string()));
        }

        let chars = content.markdown.chars().count();
        if chars > self.max_article_chars {
            return Err(TranslateError::input(format!(
                "the article is too long to translate in one request ({} characters, limit {})",
                chars, self.max_article_chars
            )));
        }
        debug!(
            "Extracted {} characters and {} headings from {}",
            chars,
            content.heading_count(),
            url
        );

        let messages = build_translation_prompt(&content.markdown, request.source_language, target);
        let translation = self.llm.complete(messages).await?;
        info!("Article {} translated ({} characters)", url, translation.len());

        Ok(TranslationResult {
            content: TranslatedContent::Markdown(translation),
            output_format: OutputFormat::Markdown,
            file_name: format!(
                "translation_{}.{}",
                Local::now().format("%Y%m%d_%H%M%S"),
                OutputFormat::Markdown.extension()
            ),
            source_preview: Some(content.markdown),
            translated_preview: None,
        })
    }
}
