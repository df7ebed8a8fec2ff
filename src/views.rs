//! Server-rendered pages for the two translation forms.

use base64::Engine;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

use crate::error::TranslateError;
use crate::translate::{Language, TranslationResult};

/// Values to put back into a form after a submission
#[derive(Debug, Default, Clone)]
pub struct FormValues {
    pub url: String,
    pub source_language: Option<Language>,
    pub target_language: Option<Language>,
}

/// What to show under a form
pub enum Outcome<'a> {
    Empty,
    Translated(&'a TranslationResult),
    Failed(&'a TranslateError),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Page {
    Home,
    Article,
    Document,
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; display: flex; min-height: 100vh; color: #1f2933; }
aside { width: 14rem; background: #f3f4f6; padding: 1.5rem 1rem; }
aside a { display: block; padding: .4rem .6rem; border-radius: .3rem; color: inherit; text-decoration: none; }
aside a.active { background: #dbe4ff; font-weight: 600; }
main { flex: 1; padding: 2rem 3rem; max-width: 60rem; }
form { display: grid; gap: .8rem; margin: 1.5rem 0; }
label { font-weight: 600; }
input, select, button { font: inherit; padding: .45rem; }
button { width: fit-content; cursor: pointer; }
.row { display: flex; gap: 1rem; }
.row > div { flex: 1; display: grid; gap: .3rem; }
.error { background: #fde8e8; border: 1px solid #f5b5b5; padding: .8rem 1rem; border-radius: .3rem; }
.result { border-top: 1px solid #e5e7eb; margin-top: 1.5rem; padding-top: 1rem; }
.download { display: inline-block; margin-top: 1rem; padding: .5rem .9rem; background: #2563eb; color: white; border-radius: .3rem; text-decoration: none; }
pre.preview { white-space: pre-wrap; background: #f9fafb; padding: 1rem; max-height: 20rem; overflow: auto; }
"#;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Relative links and http(s)/mailto targets. Anything else with a scheme
/// (`javascript:`, `data:`, `vbscript:`...) is refused.
fn is_safe_destination(dest: &str) -> bool {
    // Browsers ignore whitespace and control characters inside the scheme
    let cleaned: String = dest
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    match cleaned.find(':') {
        Some(colon) if !cleaned[..colon].contains(['/', '?', '#']) => matches!(
            cleaned[..colon].to_ascii_lowercase().as_str(),
            "http" | "https" | "mailto"
        ),
        _ => true,
    }
}

fn safe_destination(dest: CowStr<'_>) -> CowStr<'_> {
    if is_safe_destination(&dest) {
        dest
    } else {
        CowStr::Borrowed("#")
    }
}

/// Render model output. Raw HTML in the markdown is shown as text and link
/// or image targets with an unsafe scheme are replaced by `#`.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link { link_type, dest_url, title, id }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image { link_type, dest_url, title, id }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        }),
        other => other,
    });
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

fn layout(title: &str, active: Page, body: &str) -> String {
    let nav = [
        (Page::Home, "/", "🏠 Home Page"),
        (Page::Article, "/article", "📰 Article Translator"),
        (Page::Document, "/document", "📄 Document Translator"),
    ]
    .iter()
    .map(|(page, href, label)| {
        let class = if *page == active { " class=\"active\"" } else { "" };
        format!("<a href=\"{href}\"{class}>{label}</a>")
    })
    .collect::<String>();

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title} · Multilingual Translator</title>\n<style>{STYLE}</style>\n</head>\n\
         <body>\n<aside><h2>📚 Menu</h2>{nav}</aside>\n<main>\n{body}\n</main>\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

fn language_select(name: &str, label: &str, selected: Option<Language>, placeholder: &str) -> String {
    let mut options = format!(
        "<option value=\"\"{}>{}</option>",
        if selected.is_none() { " selected" } else { "" },
        escape_html(placeholder)
    );
    for lang in Language::ALL {
        let sel = if selected == Some(lang) { " selected" } else { "" };
        options.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            lang.code(),
            sel,
            lang.display_name()
        ));
    }
    format!(
        "<div><label for=\"{name}\">{label}</label><select id=\"{name}\" name=\"{name}\">{options}</select></div>"
    )
}

fn download_link(result: &TranslationResult, label: &str) -> String {
    let data = base64::engine::general_purpose::STANDARD.encode(result.bytes());
    format!(
        "<a class=\"download\" download=\"{name}\" href=\"data:{mime};base64,{data}\">📥 {label}</a>",
        name = escape_html(&result.file_name),
        mime = result.output_format.mime_type().split(';').next().unwrap_or_default(),
    )
}

fn error_box(error: &TranslateError) -> String {
    format!(
        "<div class=\"error\" role=\"alert\" data-kind=\"{}\">An error occurred: {}</div>",
        error.kind().as_str(),
        escape_html(&error.to_string())
    )
}

pub fn home_page() -> String {
    let body = r#"
<h1>🌍 Multilingual Translator</h1>
<h2>Welcome to the Multilingual Translator!</h2>
<p>Two translation tools are available:</p>
<h3>📰 Article Translator</h3>
<p>Translate web articles while keeping their markdown formatting and original structure.
Paste a link, pick a language and download the result as a <code>.md</code> file.</p>
<h3>📄 Document Translator</h3>
<p>Translate Word documents (<code>.docx</code>) between supported languages and download
the translated document with its layout intact.</p>
<h3>Technologies</h3>
<ul>
<li>Article Translator: Azure OpenAI chat completions</li>
<li>Document Translator: Azure AI Translator document translation</li>
</ul>
"#;
    layout("Home", Page::Home, body)
}

pub fn article_page(values: &FormValues, outcome: Outcome<'_>) -> String {
    let mut body = format!(
        r#"<h1>📰 Article Translator</h1>
<h3>How does it work?</h3>
<ol>
<li>Paste the URL of the article you want to translate</li>
<li>Select the target language</li>
<li>Click translate</li>
<li>Download the result in markdown format</li>
</ol>
<form method="post" action="/article">
<div><label for="url">🔗 Article URL</label>
<input id="url" name="url" type="url" placeholder="https://example.com/article" value="{url}" style="width:100%"></div>
<div class="row">{source}{target}</div>
<button type="submit">🔄 Translate Article</button>
</form>
"#,
        url = escape_html(&values.url),
        source = language_select("source_language", "🔤 Source language", values.source_language, "Detect automatically"),
        target = language_select("target_language", "🌍 Target language", values.target_language, "Select a language"),
    );

    match outcome {
        Outcome::Empty => {}
        Outcome::Failed(error) => body.push_str(&error_box(error)),
        Outcome::Translated(result) => {
            body.push_str("<section class=\"result\">\n<h3>Translation Result</h3>\n");
            if let Some(markdown) = result.markdown() {
                body.push_str(&render_markdown(markdown));
            }
            body.push_str(&download_link(result, "Download Translation"));
            body.push_str("\n</section>\n");
        }
    }

    layout("Article Translator", Page::Article, &body)
}

pub fn document_page(values: &FormValues, max_bytes: usize, outcome: Outcome<'_>) -> String {
    let mut body = format!(
        r#"<h1>📄 Word Document Translator</h1>
<h3>How does it work?</h3>
<ol>
<li>Upload your Word document</li>
<li>Select source and target languages</li>
<li>Click translate</li>
<li>Download the translated document</li>
</ol>
<form method="post" action="/document" enctype="multipart/form-data">
<div><label for="file">📎 Upload Word file (.docx, up to {limit})</label>
<input id="file" name="file" type="file" accept=".docx,application/vnd.openxmlformats-officedocument.wordprocessingml.document"></div>
<div class="row">{source}{target}</div>
<button type="submit">🔄 Translate</button>
</form>
"#,
        limit = human_size(max_bytes),
        source = language_select("source_language", "🔤 Source language", values.source_language, "Detect automatically"),
        target = language_select("target_language", "🔤 Target language", values.target_language, "Select a language"),
    );

    match outcome {
        Outcome::Empty => {}
        Outcome::Failed(error) => body.push_str(&error_box(error)),
        Outcome::Translated(result) => {
            body.push_str("<section class=\"result\">\n");
            if let Some(original) = &result.source_preview {
                body.push_str(&format!(
                    "<h3>Original Text</h3>\n<pre class=\"preview\">{}</pre>\n",
                    escape_html(original)
                ));
            }
            if let Some(translated) = &result.translated_preview {
                body.push_str(&format!(
                    "<h3>Translation Result</h3>\n<pre class=\"preview\">{}</pre>\n",
                    escape_html(translated)
                ));
            }
            body.push_str(&download_link(result, "Download Translated Document"));
            body.push_str("\n</section>\n");
        }
    }

    layout("Document Translator", Page::Document, &body)
}

fn human_size(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else if bytes >= 1024 {
        format!("{} KB", bytes / 1024)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::{OutputFormat, TranslatedContent};

    #[test]
    fn markdown_is_rendered_without_raw_html() {
        let html = render_markdown("# Titre\n\n- un\n- deux\n\n<script>alert(1)</script>");
        assert!(html.contains("<h1>Titre</h1>"));
        assert!(html.contains("<li>un</li>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn unsafe_link_targets_are_neutralised() {
        let html = render_markdown(
            "[click me](javascript:alert(document.cookie))\n\n\
             ![pixel](data:image/svg+xml;base64,PHN2Zz4=)\n\n\
             <JavaScript:alert(1)>\n\n\
             [docs](https://example.com/docs) [mail](mailto:team@example.com) [local](/about)",
        );
        assert!(html.contains("<a href=\"#\">click me</a>"), "{html}");
        assert!(html.contains("src=\"#\""), "{html}");
        assert!(!html.to_ascii_lowercase().contains("href=\"javascript"), "{html}");
        assert!(!html.contains("data:image"), "{html}");
        assert!(html.contains("href=\"https://example.com/docs\""));
        assert!(html.contains("href=\"mailto:team@example.com\""));
        assert!(html.contains("href=\"/about\""));
    }

    #[test]
    fn destination_scheme_check() {
        assert!(is_safe_destination("https://example.com/a:b"));
        assert!(is_safe_destination("page.html#section:2"));
        assert!(is_safe_destination("/path?q=a:b"));
        assert!(!is_safe_destination("java\tscript:alert(1)"));
        assert!(!is_safe_destination(" VBScript:msgbox"));
        assert!(!is_safe_destination("data:text/html,<b>x</b>"));
    }

    #[test]
    fn article_result_has_download_link() {
        let result = TranslationResult {
            content: TranslatedContent::Markdown("# Bonjour".into()),
            output_format: OutputFormat::Markdown,
            file_name: "translation_20240101_120000.md".into(),
            source_preview: None,
            translated_preview: None,
        };
        let page = article_page(&FormValues::default(), Outcome::Translated(&result));
        assert!(page.contains("<h1>Bonjour</h1>"));
        assert!(page.contains("download=\"translation_20240101_120000.md\""));
        // "# Bonjour" in base64
        assert!(page.contains("href=\"data:text/markdown;base64,IyBCb25qb3Vy\""));
    }

    #[test]
    fn errors_are_rendered_inline_and_escaped() {
        let error = TranslateError::input("bad <url>");
        let values = FormValues {
            url: "\"><script>".into(),
            target_language: Some(Language::French),
            ..Default::default()
        };
        let page = article_page(&values, Outcome::Failed(&error));
        assert!(page.contains("An error occurred: bad &lt;url&gt;"));
        assert!(page.contains("data-kind=\"input\""));
        assert!(page.contains("value=\"&quot;&gt;&lt;script&gt;\""));
        assert!(page.contains("<option value=\"fr\" selected>French</option>"));
    }

    #[test]
    fn document_form_is_multipart() {
        let page = document_page(&FormValues::default(), 10 * 1024 * 1024, Outcome::Empty);
        assert!(page.contains("enctype=\"multipart/form-data\""));
        assert!(page.contains("up to 10 MB"));
        assert!(page.contains("<option value=\"\" selected>Select a language</option>"));
    }
}
