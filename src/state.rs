use std::sync::Arc;

use crate::article::{ArticleTranslator, PageFetcher};
use crate::config::Config;
use crate::document::{AzureDocumentTranslator, DocumentTranslationInterface, DocumentTranslator};
use crate::llm::{AzureOpenAILLM, CompletionInterface};
use crate::provider::{http_client, page_client};

/// Shared by every handler. Everything inside is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub articles: Arc<ArticleTranslator>,
    pub documents: Arc<DocumentTranslator>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let client = http_client();
        let llm = Arc::new(AzureOpenAILLM::new(client.clone(), &config.completion));
        let documents = Arc::new(AzureDocumentTranslator::new(
            client,
            &config.document_translator,
        ));
        Self::with_services(config, llm, documents)
    }

    /// Build the state around explicit service clients.
    pub fn with_services(
        config: Config,
        llm: Arc<dyn CompletionInterface>,
        document_service: Arc<dyn DocumentTranslationInterface>,
    ) -> Self {
        let fetcher = PageFetcher::new(page_client(), config.limits.max_page_bytes)
            .allow_private_hosts(config.limits.allow_private_hosts);
        let articles = ArticleTranslator::new(fetcher, llm, config.limits.max_article_chars);
        let documents = DocumentTranslator::new(document_service, config.limits.max_document_bytes);

        Self {
            config: Arc::new(config),
            articles: Arc::new(articles),
            documents: Arc::new(documents),
        }
    }
}
