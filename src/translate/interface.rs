/// Request and result types shared by the article and document pipelines

use serde::{Deserialize, Serialize};

use super::language::Language;
use crate::error::{TranslateError, TranslateResult};

pub const MARKDOWN_MIME: &str = "text/markdown; charset=utf-8";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// What the user submitted for translation
#[derive(Debug, Clone)]
pub enum TranslationSource {
    Url(String),
    File { name: String, bytes: Vec<u8> },
}

#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub source: TranslationSource,
    pub source_language: Option<Language>,
    pub target_language: Option<Language>,
}

impl TranslationRequest {
    pub fn url(url: impl Into<String>, target_language: Option<Language>) -> Self {
        Self {
            source: TranslationSource::Url(url.into()),
            source_language: None,
            target_language,
        }
    }

    pub fn file(name: impl Into<String>, bytes: Vec<u8>, target_language: Option<Language>) -> Self {
        Self {
            source: TranslationSource::File { name: name.into(), bytes },
            source_language: None,
            target_language,
        }
    }

    pub fn with_source_language(mut self, language: Option<Language>) -> Self {
        self.source_language = language;
        self
    }

    /// The target must be chosen before any network call is made.
    pub fn require_target(&self) -> TranslateResult<Language> {
        self.target_language
            .ok_or_else(|| TranslateError::input("please select a target language"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Markdown,
    Docx,
}

impl OutputFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => MARKDOWN_MIME,
            OutputFormat::Docx => DOCX_MIME,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Docx => "docx",
        }
    }
}

#[derive(Debug, Clone)]
pub enum TranslatedContent {
    Markdown(String),
    Binary(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct TranslationResult {
    pub content: TranslatedContent,
    pub output_format: OutputFormat,
    pub file_name: String,
    /// Plain text of the source, when it is worth showing next to the result
    pub source_preview: Option<String>,
    pub translated_preview: Option<String>,
}

impl TranslationResult {
    pub fn bytes(&self) -> &[u8] {
        match &self.content {
            TranslatedContent::Markdown(text) => text.as_bytes(),
            TranslatedContent::Binary(bytes) => bytes,
        }
    }

    pub fn markdown(&self) -> Option<&str> {
        match &self.content {
            TranslatedContent::Markdown(text) => Some(text),
            TranslatedContent::Binary(_) => None,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self.content {
            TranslatedContent::Markdown(text) => text.into_bytes(),
            TranslatedContent::Binary(bytes) => bytes,
        }
    }

    pub fn content_disposition(&self) -> String {
        // Header values must stay visible ASCII
        let name: String = self
            .file_name
            .chars()
            .filter(|c| *c != '"')
            .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
            .collect();
        format!("attachment; filename=\"{}\"", name)
    }
}
