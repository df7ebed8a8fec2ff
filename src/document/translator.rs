use std::sync::Arc;

use tracing::{debug, info, warn};

use super::docx;
use super::interface::DocumentTranslationInterface;
use crate::error::{TranslateError, TranslateResult};
use crate::translate::{
    OutputFormat, TranslatedContent, TranslationRequest, TranslationResult, TranslationSource,
};

const PREVIEW_CHARS: usize = 4000;

/// Orchestrates upload → local validation → document API → downloadable file.
pub struct DocumentTranslator {
    service: Arc<dyn DocumentTranslationInterface>,
    max_bytes: usize,
}

impl DocumentTranslator {
    pub fn new(service: Arc<dyn DocumentTranslationInterface>, max_bytes: usize) -> Self {
        Self { service, max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn translate(&self, request: TranslationRequest) -> TranslateResult<TranslationResult> {
        let target = request.require_target()?;
        if request.source_language == Some(target) {
            return Err(TranslateError::input(
                "source and target languages must be different",
            ));
        }

        let (name, bytes) = match request.source {
            TranslationSource::File { name, bytes } => (name, bytes),
            TranslationSource::Url(_) => {
                return Err(TranslateError::input("please upload a Word file"));
            }
        };
        self.validate(&name, &bytes)?;

        info!(
            "Translating document {} ({} bytes) to {}",
            name,
            bytes.len(),
            target.code()
        );
        let source_preview = docx::preview(&bytes, PREVIEW_CHARS);

        let translated = self
            .service
            .translate_document(&name, bytes, request.source_language, target)
            .await?;

        // Same container in, same container out
        if !docx::is_docx_container(&translated) {
            warn!("Document service returned {} bytes that are not a .docx package", translated.len());
            return Err(TranslateError::Provider {
                status: 200,
                message: "the translation service did not return a Word document".to_string(),
            });
        }
        let translated_preview = docx::preview(&translated, PREVIEW_CHARS);
        debug!("Document {} translated ({} bytes)", name, translated.len());

        Ok(TranslationResult {
            content: TranslatedContent::Binary(translated),
            output_format: OutputFormat::Docx,
            file_name: name,
            source_preview,
            translated_preview,
        })
    }

    /// Local checks; any failure here means no upload happens.
    fn validate(&self, name: &str, bytes: &[u8]) -> TranslateResult<()> {
        if name.trim().is_empty() {
            return Err(TranslateError::input("please upload a Word file"));
        }
        if !docx::has_docx_extension(name) {
            return Err(TranslateError::input(format!(
                "unsupported file type: {} (only .docx Word documents are supported)",
                name
            )));
        }
        if bytes.is_empty() {
            return Err(TranslateError::input(format!("{} is empty", name)));
        }
        if bytes.len() > self.max_bytes {
            return Err(TranslateError::TooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }
        if !docx::is_docx_container(bytes) {
            return Err(TranslateError::input(format!(
                "{} is not a valid Word document",
                name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{docx_bytes, FixedDocumentTranslator, PNG_BYTES};
    use crate::translate::Language;

    fn translator(service: Arc<FixedDocumentTranslator>) -> DocumentTranslator {
        DocumentTranslator::new(service, 1024 * 1024)
    }

    #[tokio::test]
    async fn translated_report_keeps_name_and_format() {
        let service = Arc::new(FixedDocumentTranslator::returning(docx_bytes(&[
            "Informe trimestral",
            "Las ventas crecieron",
        ])));
        let request = TranslationRequest::file(
            "report.docx",
            docx_bytes(&["Quarterly report", "Sales grew"]),
            Some(Language::Spanish),
        );

        let result = translator(service.clone()).translate(request).await.unwrap();

        assert_eq!(service.calls(), 1);
        assert_eq!(result.file_name, "report.docx");
        assert_eq!(result.output_format, OutputFormat::Docx);
        assert!(docx::is_docx_container(result.bytes()));
        assert_eq!(result.source_preview.as_deref(), Some("Quarterly report\nSales grew"));
        assert_eq!(
            result.translated_preview.as_deref(),
            Some("Informe trimestral\nLas ventas crecieron")
        );
        assert_eq!(
            *service.last_languages.lock().unwrap(),
            Some((None, Language::Spanish))
        );
    }

    #[tokio::test]
    async fn png_is_rejected_without_calling_the_service() {
        let service = Arc::new(FixedDocumentTranslator::returning(docx_bytes(&["x"])));
        let request = TranslationRequest::file("image.png", PNG_BYTES.to_vec(), Some(Language::French));

        let err = translator(service.clone()).translate(request).await.unwrap_err();
        assert!(matches!(err, TranslateError::Input(_)));
        assert!(err.to_string().contains("unsupported file type"));
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn renamed_non_docx_is_rejected() {
        let service = Arc::new(FixedDocumentTranslator::returning(docx_bytes(&["x"])));
        let request = TranslationRequest::file("fake.docx", PNG_BYTES.to_vec(), Some(Language::French));

        let err = translator(service.clone()).translate(request).await.unwrap_err();
        assert!(matches!(err, TranslateError::Input(_)));
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn missing_target_is_rejected() {
        let service = Arc::new(FixedDocumentTranslator::returning(docx_bytes(&["x"])));
        let request = TranslationRequest::file("report.docx", docx_bytes(&["Hello"]), None);

        let err = translator(service.clone()).translate(request).await.unwrap_err();
        assert!(matches!(err, TranslateError::Input(_)));
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn oversized_files_are_rejected_before_upload() {
        let service = Arc::new(FixedDocumentTranslator::returning(docx_bytes(&["x"])));
        let bytes = docx_bytes(&["Hello"]);
        let limit = bytes.len() - 1;
        let request = TranslationRequest::file("report.docx", bytes, Some(Language::German));

        let err = DocumentTranslator::new(service.clone(), limit)
            .translate(request)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslateError::TooLarge { .. }));
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn same_source_and_target_is_rejected() {
        let service = Arc::new(FixedDocumentTranslator::returning(docx_bytes(&["x"])));
        let request = TranslationRequest::file("report.docx", docx_bytes(&["Hello"]), Some(Language::English))
            .with_source_language(Some(Language::English));

        let err = translator(service.clone()).translate(request).await.unwrap_err();
        assert!(matches!(err, TranslateError::Input(_)));
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn provider_failure_is_surfaced() {
        let service = Arc::new(FixedDocumentTranslator::failing(401, "The request is not authorized."));
        let request = TranslationRequest::file("report.docx", docx_bytes(&["Hello"]), Some(Language::Italian));

        let err = translator(service.clone()).translate(request).await.unwrap_err();
        assert_eq!(err.to_string(), "provider error (401): The request is not authorized.");
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn non_docx_response_is_a_provider_error() {
        let service = Arc::new(FixedDocumentTranslator::returning(b"<html>oops</html>".to_vec()));
        let request = TranslationRequest::file("report.docx", docx_bytes(&["Hello"]), Some(Language::Italian));

        let err = translator(service.clone()).translate(request).await.unwrap_err();
        assert!(matches!(err, TranslateError::Provider { .. }));
    }
}
