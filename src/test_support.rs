//! Helpers shared by the unit tests.

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::article::prompt::{ARTICLE_END, ARTICLE_START};
use crate::document::DocumentTranslationInterface;
use crate::error::{TranslateError, TranslateResult};
use crate::llm::{ChatMessage, CompletionInterface};
use crate::translate::Language;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Minimal Word package with one paragraph per entry in `paragraphs`.
pub fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
        .collect();
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{}</w:body></w:document>",
        body
    );

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default();
    zip.start_file("[Content_Types].xml", opts).unwrap();
    zip.write_all(b"<?xml version=\"1.0\"?><Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\"/>")
        .unwrap();
    zip.start_file("word/document.xml", opts).unwrap();
    zip.write_all(document.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

/// The markdown between the article delimiters of a translation prompt.
/// The delimiters are matched only on their own lines; the instruction text
/// names them too.
pub fn article_body(prompt: &str) -> String {
    let opening = format!("\n{}\n", ARTICLE_START);
    let closing = format!("\n{}", ARTICLE_END);
    let start = prompt.find(&opening).map(|i| i + opening.len());
    let end = prompt.rfind(&closing);
    match (start, end) {
        (Some(start), Some(end)) if start <= end => prompt[start..end].trim().to_string(),
        _ => String::new(),
    }
}

/// Target language named by a translation prompt.
pub fn prompt_target(prompt: &str) -> Option<Language> {
    Language::ALL.into_iter().find(|lang| {
        prompt.contains(&format!(
            " to {} ({}) language",
            lang.native_name(),
            lang.display_name()
        ))
    })
}

/// Completion fake that echoes the article back, tagging every line with the
/// requested target code (`[fr]`, `[it]`, ...), counting calls.
#[derive(Default)]
pub struct EchoCompletion {
    pub calls: AtomicUsize,
    pub last_messages: Mutex<Vec<ChatMessage>>,
    pub fail_with: Option<(u16, String)>,
}

impl EchoCompletion {
    pub fn failing(status: u16, message: &str) -> Self {
        Self {
            fail_with: Some((status, message.to_string())),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionInterface for EchoCompletion {
    async fn complete(&self, messages: Vec<ChatMessage>) -> TranslateResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = messages.clone();
        if let Some((status, message)) = &self.fail_with {
            return Err(TranslateError::Provider {
                status: *status,
                message: message.clone(),
            });
        }
        let user = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        let tag = prompt_target(&user).map(|lang| lang.code()).unwrap_or("??");
        let article = article_body(&user);
        Ok(article
            .lines()
            .map(|line| if line.trim().is_empty() { String::new() } else { format!("{} [{}]", line, tag) })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Document fake returning a fixed payload, counting calls.
pub struct FixedDocumentTranslator {
    pub calls: AtomicUsize,
    pub response: TranslateResult<Vec<u8>>,
    pub last_languages: Mutex<Option<(Option<Language>, Language)>>,
}

impl FixedDocumentTranslator {
    pub fn returning(bytes: Vec<u8>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            response: Ok(bytes),
            last_languages: Mutex::new(None),
        }
    }

    pub fn failing(status: u16, message: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            response: Err(TranslateError::Provider {
                status,
                message: message.to_string(),
            }),
            last_languages: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentTranslationInterface for FixedDocumentTranslator {
    async fn translate_document(
        &self,
        _file_name: &str,
        _bytes: Vec<u8>,
        source_language: Option<Language>,
        target_language: Language,
    ) -> TranslateResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_languages.lock().unwrap() = Some((source_language, target_language));
        match &self.response {
            Ok(bytes) => Ok(bytes.clone()),
            Err(TranslateError::Provider { status, message }) => Err(TranslateError::Provider {
                status: *status,
                message: message.clone(),
            }),
            Err(other) => Err(TranslateError::Network(other.to_string())),
        }
    }
}
