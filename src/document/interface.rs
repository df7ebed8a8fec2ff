use async_trait::async_trait;

use crate::error::TranslateResult;
use crate::translate::Language;

/// Interface for a managed document translation service
/// The service receives a whole file and returns a file in the same format
#[async_trait]
pub trait DocumentTranslationInterface: Send + Sync {
    /// Translate `bytes` and return the translated document.
    ///
    /// # Arguments
    /// * `file_name` - Original file name, forwarded to the service
    /// * `source_language` - `None` lets the service detect the language
    async fn translate_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        source_language: Option<Language>,
        target_language: Language,
    ) -> TranslateResult<Vec<u8>>;
}
