use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, info};
use uuid::Uuid;

use super::interface::DocumentTranslationInterface;
use crate::config::DocumentTranslatorConfig;
use crate::error::{TranslateError, TranslateResult};
use crate::provider::{network_error, provider_error};
use crate::translate::{Language, DOCX_MIME};

const SERVICE: &str = "Document Translation API";

/// Azure AI Translator client using synchronous document translation
pub struct AzureDocumentTranslator {
    client: Client,
    endpoint: String,
    api_key: String,
    region: String,
    api_version: String,
}

impl AzureDocumentTranslator {
    pub fn new(client: Client, config: &DocumentTranslatorConfig) -> Self {
        info!(
            "Initialized AzureDocumentTranslator: endpoint={}, region={}",
            config.endpoint, config.region
        );
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            region: config.region.clone(),
            api_version: config.api_version.clone(),
        }
    }

    fn url(&self) -> String {
        format!("{}/translator/document:translate", self.endpoint)
    }
}

#[async_trait]
impl DocumentTranslationInterface for AzureDocumentTranslator {
    async fn translate_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        source_language: Option<Language>,
        target_language: Language,
    ) -> TranslateResult<Vec<u8>> {
        let mut query = vec![
            ("targetLanguage", target_language.code()),
            ("api-version", self.api_version.as_str()),
        ];
        if let Some(source) = source_language {
            query.push(("sourceLanguage", source.code()));
        }

        let size = bytes.len();
        let document = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(DOCX_MIME)
            .map_err(|e| TranslateError::input(format!("invalid document type: {}", e)))?;
        let form = Form::new().part("document", document);

        let trace_id = Uuid::new_v4();
        debug!(
            "Uploading {} ({} bytes) for translation to {}, trace id {}",
            file_name,
            size,
            target_language.code(),
            trace_id
        );

        let response = self
            .client
            .post(self.url())
            .query(&query)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Ocp-Apim-Subscription-Region", &self.region)
            .header("X-ClientTraceId", trace_id.to_string())
            .multipart(form)
            .send()
            .await
            .map_err(|e| network_error(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(provider_error(SERVICE, response).await);
        }

        let translated = response
            .bytes()
            .await
            .map_err(|e| network_error(SERVICE, e))?;
        debug!("Received {} translated bytes for {}", translated.len(), file_name);
        Ok(translated.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{docx_bytes, spawn_server};
    use axum::{
        extract::{Multipart, Query},
        http::{HeaderMap, StatusCode, Uri},
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Debug)]
    struct Seen {
        path: String,
        query: HashMap<String, String>,
        key: String,
        region: String,
        trace_id: bool,
        file_name: Option<String>,
        content_type: Option<String>,
        size: usize,
    }

    fn config(endpoint: String) -> DocumentTranslatorConfig {
        DocumentTranslatorConfig {
            endpoint,
            api_key: "translator-key".to_string(),
            region: "westeurope".to_string(),
            api_version: "2024-05-01".to_string(),
        }
    }

    #[tokio::test]
    async fn uploads_document_with_language_pair() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let captured = seen.clone();
        // matchit treats ':' as a parameter marker, so serve everything
        let router = Router::new().fallback(
            move |uri: Uri,
                  Query(query): Query<HashMap<String, String>>,
                  headers: HeaderMap,
                  mut multipart: Multipart| {
                let captured = captured.clone();
                async move {
                    let header = |name: &str| {
                        headers
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string()
                    };
                    let mut seen = Seen {
                        path: uri.path().to_string(),
                        query,
                        key: header("Ocp-Apim-Subscription-Key"),
                        region: header("Ocp-Apim-Subscription-Region"),
                        trace_id: !header("X-ClientTraceId").is_empty(),
                        ..Default::default()
                    };
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        if field.name() == Some("document") {
                            seen.file_name = field.file_name().map(str::to_string);
                            seen.content_type = field.content_type().map(str::to_string);
                            seen.size = field.bytes().await.unwrap().len();
                        }
                    }
                    *captured.lock().unwrap() = seen;
                    docx_bytes(&["Informe trimestral"])
                }
            },
        );
        let base = spawn_server(router).await;
        let client = AzureDocumentTranslator::new(Client::new(), &config(base));

        let upload = docx_bytes(&["Quarterly report"]);
        let upload_len = upload.len();
        let translated = client
            .translate_document("report.docx", upload, Some(Language::English), Language::Spanish)
            .await
            .unwrap();
        assert!(crate::document::docx::is_docx_container(&translated));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.path, "/translator/document:translate");
        assert_eq!(seen.query.get("targetLanguage").map(String::as_str), Some("es"));
        assert_eq!(seen.query.get("sourceLanguage").map(String::as_str), Some("en"));
        assert_eq!(seen.query.get("api-version").map(String::as_str), Some("2024-05-01"));
        assert_eq!(seen.key, "translator-key");
        assert_eq!(seen.region, "westeurope");
        assert!(seen.trace_id);
        assert_eq!(seen.file_name.as_deref(), Some("report.docx"));
        assert_eq!(seen.content_type.as_deref(), Some(DOCX_MIME));
        assert_eq!(seen.size, upload_len);
    }

    #[tokio::test]
    async fn auto_detect_omits_source_language() {
        let seen = Arc::new(Mutex::new(HashMap::new()));
        let captured = seen.clone();
        let router = Router::new().fallback(move |Query(query): Query<HashMap<String, String>>| {
            let captured = captured.clone();
            async move {
                *captured.lock().unwrap() = query;
                docx_bytes(&["Rapport"])
            }
        });
        let base = spawn_server(router).await;
        let client = AzureDocumentTranslator::new(Client::new(), &config(base));

        client
            .translate_document("a.docx", docx_bytes(&["Report"]), None, Language::French)
            .await
            .unwrap();
        let query = seen.lock().unwrap();
        assert!(!query.contains_key("sourceLanguage"));
        assert_eq!(query.get("targetLanguage").map(String::as_str), Some("fr"));
    }

    #[tokio::test]
    async fn provider_message_is_passed_through() {
        let router = Router::new().fallback(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": {"code": "401000", "message": "The request is not authorized."}})),
            )
        });
        let base = spawn_server(router).await;
        let client = AzureDocumentTranslator::new(Client::new(), &config(base));

        let err = client
            .translate_document("a.docx", docx_bytes(&["x"]), None, Language::German)
            .await
            .unwrap_err();
        match err {
            TranslateError::Provider { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "The request is not authorized. (401000)");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
