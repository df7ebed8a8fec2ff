use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// Process-wide configuration, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub completion: CompletionConfig,
    pub document_translator: DocumentTranslatorConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Azure OpenAI chat completions deployment
#[derive(Clone)]
pub struct CompletionConfig {
    /// Full deployment URL, including `api-version`
    pub endpoint: String,
    pub api_key: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

/// Azure AI Translator resource used for document translation
#[derive(Clone)]
pub struct DocumentTranslatorConfig {
    pub endpoint: String,
    pub api_key: String,
    pub region: String,
    pub api_version: String,
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub max_article_chars: usize,
    pub max_document_bytes: usize,
    pub max_page_bytes: usize,
    /// Let the article fetcher reach loopback, private and link-local
    /// addresses. Off unless explicitly enabled.
    pub allow_private_hosts: bool,
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl fmt::Debug for DocumentTranslatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentTranslatorConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("region", &self.region)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Flat view of the settings, keyed like the environment variables
/// (lowercased by the `config` crate).
#[derive(Debug, Deserialize)]
struct RawSettings {
    azure_openai_key: Option<String>,
    azure_endpoint: Option<String>,
    translator_api_key: Option<String>,
    translator_endpoint: Option<String>,
    translator_location: Option<String>,

    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default = "default_temperature")]
    completion_temperature: f32,
    #[serde(default = "default_top_p")]
    completion_top_p: f32,
    #[serde(default = "default_max_tokens")]
    completion_max_tokens: u32,

    #[serde(default = "default_api_version")]
    translator_api_version: String,

    #[serde(default = "default_max_article_chars")]
    max_article_chars: usize,
    #[serde(default = "default_max_document_bytes")]
    max_document_bytes: usize,
    #[serde(default = "default_max_page_bytes")]
    max_page_bytes: usize,
    #[serde(default)]
    allow_private_hosts: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_temperature() -> f32 {
    0.9
}

fn default_top_p() -> f32 {
    0.95
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_api_version() -> String {
    "2024-05-01".to_string()
}

fn default_max_article_chars() -> usize {
    40_000
}

// Synchronous document translation accepts up to 10 MiB per file
fn default_max_document_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_max_page_bytes() -> usize {
    5 * 1024 * 1024
}

impl Config {
    /// Load from an optional YAML file overlaid by the process environment.
    pub fn load(path: &str) -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::default());
        Self::from_builder(builder)
    }

    /// Same as [`Config::load`] but reads variables from `vars` instead of
    /// the process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::Environment::default().source(Some(vars)));
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let raw: RawSettings = builder.build()?.try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self> {
        let mut missing = Vec::new();
        let mut required = |value: Option<String>, name: &'static str| -> String {
            match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
                Some(v) => v,
                None => {
                    missing.push(name);
                    String::new()
                }
            }
        };

        let completion_key = required(raw.azure_openai_key, "AZURE_OPENAI_KEY");
        let completion_endpoint = required(raw.azure_endpoint, "AZURE_ENDPOINT");
        let translator_key = required(raw.translator_api_key, "TRANSLATOR_API_KEY");
        let translator_endpoint = required(raw.translator_endpoint, "TRANSLATOR_ENDPOINT");
        let translator_region = required(raw.translator_location, "TRANSLATOR_LOCATION");

        if !missing.is_empty() {
            anyhow::bail!(
                "Missing required environment variables: {}",
                missing.join(", ")
            );
        }

        if raw.max_document_bytes == 0 || raw.max_article_chars == 0 || raw.max_page_bytes == 0 {
            anyhow::bail!("Size limits must be greater than zero");
        }

        Ok(Self {
            server: ServerConfig {
                host: raw.host,
                port: raw.port,
            },
            completion: CompletionConfig {
                endpoint: completion_endpoint,
                api_key: completion_key,
                temperature: raw.completion_temperature,
                top_p: raw.completion_top_p,
                max_tokens: raw.completion_max_tokens,
            },
            document_translator: DocumentTranslatorConfig {
                endpoint: translator_endpoint.trim_end_matches('/').to_string(),
                api_key: translator_key,
                region: translator_region,
                api_version: raw.translator_api_version,
            },
            limits: LimitsConfig {
                max_article_chars: raw.max_article_chars,
                max_document_bytes: raw.max_document_bytes,
                max_page_bytes: raw.max_page_bytes,
                allow_private_hosts: raw.allow_private_hosts,
            },
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn required_vars() -> HashMap<String, String> {
        [
            ("AZURE_OPENAI_KEY", "openai-key"),
            ("AZURE_ENDPOINT", "https://example.openai.azure.com/openai/deployments/gpt/chat/completions?api-version=2024-02-15-preview"),
            ("TRANSLATOR_API_KEY", "translator-key"),
            ("TRANSLATOR_ENDPOINT", "https://example.cognitiveservices.azure.com/"),
            ("TRANSLATOR_LOCATION", "westeurope"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// Configuration for tests whose pages are served from 127.0.0.1.
    pub(crate) fn test_config() -> Config {
        let mut vars = required_vars();
        vars.insert("ALLOW_PRIVATE_HOSTS".into(), "true".into());
        Config::from_vars(vars).unwrap()
    }

    #[test]
    fn loads_required_vars_with_defaults() {
        let config = test_config();
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.completion.api_key, "openai-key");
        assert_eq!(config.completion.max_tokens, 4000);
        assert!((config.completion.temperature - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.document_translator.region, "westeurope");
        assert_eq!(
            config.document_translator.endpoint,
            "https://example.cognitiveservices.azure.com"
        );
        assert_eq!(config.limits.max_document_bytes, 10 * 1024 * 1024);
        assert!(config.limits.allow_private_hosts);

        let defaults = Config::from_vars(required_vars()).unwrap();
        assert!(!defaults.limits.allow_private_hosts);
    }

    #[test]
    fn overrides_are_parsed_from_strings() {
        let mut vars = required_vars();
        vars.insert("PORT".into(), "9000".into());
        vars.insert("MAX_ARTICLE_CHARS".into(), "1200".into());
        vars.insert("COMPLETION_TOP_P".into(), "0.5".into());

        let config = Config::from_vars(vars).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.limits.max_article_chars, 1200);
        assert!((config.completion.top_p - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_credentials_prevent_startup() {
        let mut vars = required_vars();
        vars.remove("AZURE_OPENAI_KEY");
        vars.insert("TRANSLATOR_LOCATION".into(), "   ".into());

        let err = Config::from_vars(vars).unwrap_err().to_string();
        assert!(err.contains("AZURE_OPENAI_KEY"), "{err}");
        assert!(err.contains("TRANSLATOR_LOCATION"), "{err}");
        assert!(!err.contains("AZURE_ENDPOINT"), "{err}");
    }

    #[test]
    fn debug_output_hides_keys() {
        let rendered = format!("{:?}", test_config());
        assert!(!rendered.contains("openai-key"));
        assert!(!rendered.contains("translator-key"));
    }
}
