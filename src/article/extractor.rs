//! HTML → markdown content extraction.
//!
//! The heuristic keeps the main article body (`<article>`, then `<main>`,
//! then `<body>`), drops page chrome (scripts, navigation, ads, share
//! widgets, cookie banners...) and rewrites the remaining structure as
//! markdown so the completion model can translate it without losing
//! headings, lists, emphasis or links.

use std::sync::OnceLock;

use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Node};

/// Content derived from one fetched page. Immutable once extracted.
#[derive(Debug, Clone)]
pub struct ArticleContent {
    pub url: String,
    pub raw_html: String,
    pub title: Option<String>,
    pub extracted_text: String,
    pub markdown: String,
}

impl ArticleContent {
    pub fn is_empty(&self) -> bool {
        self.markdown.trim().is_empty()
    }

    pub fn heading_count(&self) -> usize {
        count_headings(&self.markdown)
    }
}

/// Number of ATX heading lines in `markdown`, ignoring fenced code.
pub fn count_headings(markdown: &str) -> usize {
    let mut in_fence = false;
    markdown
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            if trimmed.starts_with("```") {
                in_fence = !in_fence;
                return false;
            }
            !in_fence && heading_level(strip_container_markers(trimmed)).is_some()
        })
        .count()
}

fn container_marker() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:>\s?|(?:[-+*]|\d{1,9}[.)])\s+)*").expect("valid container marker pattern")
    })
}

/// Drop leading quote and list markers so `- ## Title` counts as a heading.
fn strip_container_markers(line: &str) -> &str {
    let end = container_marker().find(line).map_or(0, |m| m.end());
    &line[end..]
}

fn heading_level(line: &str) -> Option<usize> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    ((1..=6).contains(&hashes) && line[hashes..].starts_with(' ')).then_some(hashes)
}

const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "footer", "aside", "form", "iframe", "svg", "canvas",
    "button", "template", "select", "input", "textarea", "object", "embed", "video", "audio",
    "dialog", "menu", "head", "link", "meta",
];

const NOISE_ROLES: &[&str] = &[
    "navigation", "banner", "complementary", "contentinfo", "search", "dialog", "alert",
];

const NOISE_TOKENS: &[&str] = &[
    "ad", "ads", "advert", "adverts", "advertisement", "advertising", "banner", "sponsor",
    "sponsored", "promo", "cookie", "cookies", "consent", "share", "sharing", "social",
    "sidebar", "newsletter", "subscribe", "related", "comment", "comments", "popup", "modal",
    "breadcrumb", "breadcrumbs", "outbrain", "taboola",
];

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "body", "center", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "html", "li", "main", "ol", "p", "pre", "section", "summary", "table", "tbody", "td",
    "tfoot", "th", "thead", "tr", "ul",
];

fn whitespace() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

fn collapse(text: &str) -> String {
    whitespace().replace_all(text, " ").into_owned()
}

fn ordered_marker() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{1,9})([.)])(\s|$)").expect("valid ordered list pattern"))
}

fn block_marker() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:#{1,6}(?:\s|$)|>|[-+*](?:\s|$)|=+\s*$|-+\s*$)").expect("valid block marker pattern")
    })
}

/// Escape characters of page text that markdown would read as inline markup.
fn escape_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape line starts that markdown would read as a heading, list, quote or
/// setext underline.
fn escape_block_start(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if ordered_marker().is_match(line) {
                ordered_marker().replace(line, "$1\\$2$3").into_owned()
            } else if block_marker().is_match(line) {
                format!("\\{}", line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_block(name: &str) -> bool {
    BLOCK_TAGS.contains(&name)
}

fn is_heading(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// Page chrome that never belongs to the article body.
fn is_noise(el: ElementRef<'_>) -> bool {
    let element = el.value();
    let name = element.name();

    if SKIPPED_TAGS.contains(&name) {
        return true;
    }
    // Site headers go; article headers carrying the title stay.
    if name == "header" {
        return !el.descendants().any(|node| {
            ElementRef::wrap(node).is_some_and(|child| is_heading(child.value().name()))
        });
    }
    if element.attr("hidden").is_some() || element.attr("aria-hidden") == Some("true") {
        return true;
    }
    if let Some(role) = element.attr("role") {
        if NOISE_ROLES.contains(&role.to_ascii_lowercase().as_str()) {
            return true;
        }
    }

    // Content landmarks carry taxonomy classes such as `category-social-media`
    if is_landmark(el) {
        return false;
    }

    element
        .classes()
        .chain(element.id())
        .filter(|name| !is_taxonomy_class(name))
        .flat_map(|name| name.split(|c: char| c == '-' || c == '_' || c.is_whitespace()))
        .any(|token| NOISE_TOKENS.contains(&token.to_ascii_lowercase().as_str()))
}

fn is_landmark(el: ElementRef<'_>) -> bool {
    matches!(el.value().name(), "article" | "main")
        || el
            .value()
            .attr("role")
            .is_some_and(|role| role.eq_ignore_ascii_case("main") || role.eq_ignore_ascii_case("article"))
}

/// WordPress-style `category-*` / `tag-*` classes name the post topic, not a widget.
fn is_taxonomy_class(class: &str) -> bool {
    let lower = class.to_ascii_lowercase();
    ["category-", "tag-", "tags-", "topic-"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// `a` elements wrapping a heading, as card and teaser markup does.
fn linked_heading_level(el: ElementRef<'_>) -> Option<usize> {
    if el.value().name() != "a" {
        return None;
    }
    el.descendants()
        .filter_map(ElementRef::wrap)
        .find(|child| is_heading(child.value().name()))
        .and_then(|heading| heading.value().name()[1..].parse().ok())
}

fn text_len(el: ElementRef<'_>) -> usize {
    el.text().map(|t| t.trim().len()).sum()
}

/// Pick the element holding the article body.
fn content_root(document: &Html) -> ElementRef<'_> {
    let root = document.root_element();
    let elements = || root.descendants().filter_map(ElementRef::wrap);

    let best_article = elements()
        .filter(|el| el.value().name() == "article" && !is_noise(*el))
        .max_by_key(|el| text_len(*el));
    if let Some(article) = best_article {
        return article;
    }

    let main = elements().find(|el| {
        el.value().name() == "main" || el.value().attr("role") == Some("main")
    });
    if let Some(main) = main {
        return main;
    }

    elements()
        .find(|el| el.value().name() == "body")
        .unwrap_or(root)
}

fn page_title(document: &Html) -> Option<String> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "title")
        .map(|el| collapse(&el.text().collect::<String>()).trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Tidy an inline run: trim every line and drop blank ones.
fn clean_inline(text: &str) -> String {
    text.split('\n')
        .map(|line| collapse(line).trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("  \n")
}

fn wrap_marker(inner: &str, marker: &str) -> String {
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        return inner.to_string();
    }
    let lead = if inner.starts_with(char::is_whitespace) { " " } else { "" };
    let trail = if inner.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{lead}{marker}{trimmed}{marker}{trail}")
}

struct MarkdownWriter<'a> {
    base: &'a Url,
}

impl<'a> MarkdownWriter<'a> {
    fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.to_ascii_lowercase().starts_with("javascript:") {
            return None;
        }
        self.base.join(href).ok().map(|url| url.to_string())
    }

    /// Render the children of a block container, grouping loose inline
    /// content into paragraphs.
    fn blocks(&self, el: ElementRef<'_>, out: &mut Vec<String>) {
        let mut inline = String::new();
        for child in el.children() {
            match child.value() {
                Node::Text(text) => inline.push_str(&escape_inline(&collapse(text))),
                Node::Element(_) => {
                    let Some(child) = ElementRef::wrap(child) else { continue };
                    if is_noise(child) {
                        continue;
                    }
                    if linked_heading_level(child).is_some() {
                        push_paragraph(&mut inline, out);
                        out.extend(self.linked_blocks(child));
                    } else if is_block(child.value().name()) {
                        push_paragraph(&mut inline, out);
                        self.block(child, out);
                    } else {
                        inline.push_str(&self.inline(child));
                    }
                }
                _ => {}
            }
        }
        push_paragraph(&mut inline, out);
    }

    fn block(&self, el: ElementRef<'_>, out: &mut Vec<String>) {
        let name = el.value().name();
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                let text = clean_inline(&self.inline_children(el)).replace("  \n", " ");
                if !text.is_empty() {
                    out.push(format!("{} {}", "#".repeat(level), text));
                }
            }
            "p" | "dt" | "dd" | "figcaption" | "summary" | "address" => {
                let text = escape_block_start(&clean_inline(&self.inline_children(el)));
                if !text.is_empty() {
                    out.push(text);
                }
            }
            "ul" | "ol" => {
                let lines = self.list(el, name == "ol", "");
                if !lines.is_empty() {
                    out.push(lines.join("\n"));
                }
            }
            "li" => {
                let lines = self.list_item(el, "- ", "");
                if !lines.is_empty() {
                    out.push(lines.join("\n"));
                }
            }
            "blockquote" => {
                let mut inner = Vec::new();
                self.blocks(el, &mut inner);
                if !inner.is_empty() {
                    let quoted = inner
                        .join("\n\n")
                        .lines()
                        .map(|line| if line.is_empty() { ">".to_string() } else { format!("> {}", line) })
                        .collect::<Vec<_>>()
                        .join("\n");
                    out.push(quoted);
                }
            }
            "pre" => {
                let code: String = el.text().collect();
                let code = code.trim_matches('\n');
                if !code.trim().is_empty() {
                    out.push(format!("```{}\n{}\n```", code_language(el), code));
                }
            }
            "hr" => out.push("---".to_string()),
            "table" => {
                if let Some(table) = self.table(el) {
                    out.push(table);
                }
            }
            _ => self.blocks(el, out),
        }
    }

    /// Blocks inside a link that wraps a heading. Headings keep their level
    /// and carry the link; the rest stays as is.
    fn linked_blocks(&self, a: ElementRef<'_>) -> Vec<String> {
        let href = a.value().attr("href").and_then(|href| self.resolve(href));
        let mut inner = Vec::new();
        self.blocks(a, &mut inner);
        inner
            .into_iter()
            .map(|block| match (&href, heading_level(&block)) {
                (Some(href), Some(level)) => {
                    format!("{} [{}]({})", &block[..level], block[level..].trim(), href)
                }
                _ => block,
            })
            .collect()
    }

    fn inline_children(&self, el: ElementRef<'_>) -> String {
        let mut text = String::new();
        for child in el.children() {
            match child.value() {
                Node::Text(t) => text.push_str(&escape_inline(&collapse(t))),
                Node::Element(_) => {
                    let Some(child) = ElementRef::wrap(child) else { continue };
                    if is_noise(child) {
                        continue;
                    }
                    if is_block(child.value().name()) {
                        text.push(' ');
                        text.push_str(&self.inline_children(child));
                        text.push(' ');
                    } else {
                        text.push_str(&self.inline(child));
                    }
                }
                _ => {}
            }
        }
        text
    }

    fn inline(&self, el: ElementRef<'_>) -> String {
        let element = el.value();
        match element.name() {
            "br" => "\n".to_string(),
            "strong" | "b" => wrap_marker(&self.inline_children(el), "**"),
            "em" | "i" => wrap_marker(&self.inline_children(el), "*"),
            "del" | "s" | "strike" => wrap_marker(&self.inline_children(el), "~~"),
            "code" | "kbd" | "samp" => {
                let code = collapse(&el.text().collect::<String>());
                if code.trim().is_empty() {
                    code
                } else {
                    format!("`{}`", code.trim())
                }
            }
            "a" => {
                let label = self.inline_children(el);
                match element.attr("href").and_then(|href| self.resolve(href)) {
                    Some(href) if !label.trim().is_empty() => {
                        format!("[{}]({})", label.trim(), href)
                    }
                    _ => label,
                }
            }
            "img" => {
                let alt = collapse(element.attr("alt").unwrap_or_default());
                match element.attr("src").and_then(|src| self.resolve(src)) {
                    Some(src) => format!("![{}]({})", alt.trim(), src),
                    None => String::new(),
                }
            }
            _ => self.inline_children(el),
        }
    }

    fn list(&self, el: ElementRef<'_>, ordered: bool, indent: &str) -> Vec<String> {
        let mut lines = Vec::new();
        let mut index = el
            .value()
            .attr("start")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1);

        for child in el.children().filter_map(ElementRef::wrap) {
            if is_noise(child) {
                continue;
            }
            match child.value().name() {
                "li" => {
                    let marker = if ordered { format!("{}. ", index) } else { "- ".to_string() };
                    index += 1;
                    lines.extend(self.list_item(child, &marker, indent));
                }
                // Lists nested directly in lists (invalid but common)
                "ul" | "ol" => {
                    let nested_indent = format!("{}  ", indent);
                    lines.extend(self.list(child, child.value().name() == "ol", &nested_indent));
                }
                _ => {}
            }
        }
        lines
    }

    fn list_item(&self, el: ElementRef<'_>, marker: &str, indent: &str) -> Vec<String> {
        let nested_indent = format!("{}{}", indent, " ".repeat(marker.len()));
        let mut heading = None;
        let mut text = String::new();
        let mut nested = Vec::new();

        for child in el.children() {
            match child.value() {
                Node::Text(t) => text.push_str(&escape_inline(&collapse(t))),
                Node::Element(_) => {
                    let Some(child) = ElementRef::wrap(child) else { continue };
                    if is_noise(child) {
                        continue;
                    }
                    let name = child.value().name();
                    // A heading opening the item stays a heading: `- ### Title`
                    if heading.is_none() && text.trim().is_empty() {
                        let found = if is_heading(name) {
                            name[1..]
                                .parse::<usize>()
                                .ok()
                                .map(|level| (level, self.inline_children(child)))
                        } else {
                            linked_heading_level(child).map(|level| (level, self.inline(child)))
                        };
                        if let Some((level, title)) = found {
                            let title = clean_inline(&title).replace("  \n", " ");
                            if !title.is_empty() {
                                heading = Some(format!("{} {}", "#".repeat(level), title));
                                text.clear();
                                continue;
                            }
                        }
                    }
                    match name {
                        "ul" | "ol" => {
                            nested.extend(self.list(child, name == "ol", &nested_indent))
                        }
                        name if is_block(name) => {
                            text.push(' ');
                            text.push_str(&self.inline_children(child));
                            text.push(' ');
                        }
                        _ => text.push_str(&self.inline(child)),
                    }
                }
                _ => {}
            }
        }

        let text = escape_block_start(&clean_inline(&text).replace("  \n", " "));
        let mut lines = Vec::new();
        match heading {
            Some(heading) => {
                lines.push(format!("{}{}{}", indent, marker, heading));
                if !text.is_empty() {
                    lines.push(format!("{}{}", nested_indent, text));
                }
            }
            None if !text.is_empty() || !nested.is_empty() => {
                lines.push(format!("{}{}{}", indent, marker, text).trim_end().to_string());
            }
            None => {}
        }
        lines.extend(nested);
        lines
    }

    fn table(&self, el: ElementRef<'_>) -> Option<String> {
        let rows: Vec<Vec<String>> = el
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|row| row.value().name() == "tr")
            .map(|row| {
                row.children()
                    .filter_map(ElementRef::wrap)
                    .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                    .map(|cell| {
                        clean_inline(&self.inline_children(cell))
                            .replace("  \n", " ")
                            .replace('|', "\\|")
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|cells| !cells.is_empty())
            .collect();

        let columns = rows.iter().map(Vec::len).max()?;
        let render_row = |cells: &[String]| {
            let mut padded: Vec<&str> = cells.iter().map(String::as_str).collect();
            padded.resize(columns, "");
            format!("| {} |", padded.join(" | "))
        };

        let mut lines = vec![render_row(&rows[0])];
        lines.push(format!("|{}", " --- |".repeat(columns)));
        lines.extend(rows[1..].iter().map(|row| render_row(row)));
        Some(lines.join("\n"))
    }
}

fn push_paragraph(inline: &mut String, out: &mut Vec<String>) {
    let text = escape_block_start(&clean_inline(inline));
    if !text.is_empty() {
        out.push(text);
    }
    inline.clear();
}

fn code_language(pre: ElementRef<'_>) -> String {
    pre.descendants()
        .filter_map(ElementRef::wrap)
        .flat_map(|el| el.value().classes().collect::<Vec<_>>())
        .find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
                .map(str::to_string)
        })
        .unwrap_or_default()
}

fn plain_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    if is_noise(child) {
                        continue;
                    }
                    let block = is_block(child.value().name()) || child.value().name() == "br";
                    if block {
                        out.push(' ');
                    }
                    plain_text(child, out);
                    if block {
                        out.push(' ');
                    }
                }
            }
            _ => {}
        }
    }
}

/// Extract the article body of `html`, resolving links against `base`.
pub fn extract_article(html: &str, base: &Url) -> ArticleContent {
    let document = Html::parse_document(html);
    let root = content_root(&document);
    let title = page_title(&document);

    let writer = MarkdownWriter { base };
    let mut blocks = Vec::new();
    writer.block(root, &mut blocks);

    let mut markdown = blocks.join("\n\n");
    if count_headings(&markdown) == 0 && !markdown.trim().is_empty() {
        if let Some(title) = &title {
            markdown = format!("# {}\n\n{}", escape_inline(title), markdown);
        }
    }

    let mut text = String::new();
    plain_text(root, &mut text);

    ArticleContent {
        url: base.to_string(),
        raw_html: html.to_string(),
        title,
        extracted_text: collapse(&text).trim().to_string(),
        markdown,
    }
}
