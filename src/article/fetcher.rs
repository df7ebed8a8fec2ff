use std::net::IpAddr;
use std::sync::OnceLock;

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use reqwest::{
    header::{CONTENT_TYPE, LOCATION},
    Client, Url,
};
use tracing::{debug, warn};

use crate::error::{TranslateError, TranslateResult};

const MAX_REDIRECTS: usize = 5;

/// Downloads article pages
pub struct PageFetcher {
    client: Client,
    max_bytes: usize,
    allow_private_hosts: bool,
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects, used to resolve relative links
    pub url: Url,
    pub html: String,
}

fn charset_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)charset\s*=\s*["']?([a-z0-9_\-:.]+)"#).expect("valid charset pattern")
    })
}

/// Validate user input as an absolute http(s) URL. No network access.
pub fn parse_article_url(raw: &str) -> TranslateResult<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TranslateError::input("please enter the article URL"));
    }
    let url = Url::parse(raw).map_err(|e| TranslateError::input(format!("invalid URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(TranslateError::input(format!(
            "invalid URL '{}': only http and https pages can be translated",
            raw
        ))),
    }
}

/// Addresses reachable from the public internet. Loopback, private,
/// link-local (cloud metadata), carrier-grade NAT and similar ranges are not.
fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            !(v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_multicast()
                || v4.is_documentation()
                || a == 0
                || (a == 100 && (64..128).contains(&b)))
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_public(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            !(v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_multicast()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80)
        }
    }
}

/// Pick the text encoding from the Content-Type header, then from a
/// `<meta charset>` near the top of the document.
fn detect_encoding(content_type: Option<&str>, body: &[u8]) -> &'static Encoding {
    let from_header = content_type
        .and_then(|ct| charset_pattern().captures(ct))
        .and_then(|caps| Encoding::for_label(caps[1].as_bytes()));
    if let Some(encoding) = from_header {
        return encoding;
    }

    let head = String::from_utf8_lossy(&body[..body.len().min(2048)]);
    head.find("<meta")
        .and_then(|_| charset_pattern().captures(&head))
        .and_then(|caps| Encoding::for_label(caps[1].as_bytes()))
        .unwrap_or(UTF_8)
}

impl PageFetcher {
    pub fn new(client: Client, max_bytes: usize) -> Self {
        Self {
            client,
            max_bytes,
            allow_private_hosts: false,
        }
    }

    pub fn allow_private_hosts(mut self, allow: bool) -> Self {
        self.allow_private_hosts = allow;
        self
    }

    /// Refuse hosts that resolve to non-public addresses.
    async fn check_destination(&self, url: &Url) -> TranslateResult<()> {
        if self.allow_private_hosts {
            return Ok(());
        }
        let host = url
            .host_str()
            .ok_or_else(|| TranslateError::input(format!("invalid URL '{}': missing host", url)))?;
        let bare = host.trim_start_matches('[').trim_end_matches(']');

        let addresses: Vec<IpAddr> = match bare.parse::<IpAddr>() {
            Ok(ip) => vec![ip],
            Err(_) => {
                let port = url.port_or_known_default().unwrap_or(80);
                tokio::net::lookup_host((bare, port))
                    .await
                    .map_err(|e| TranslateError::UnreachableSource(format!("{}: {}", url, e)))?
                    .map(|addr| addr.ip())
                    .collect()
            }
        };

        if let Some(ip) = addresses.iter().find(|ip| !is_public(**ip)) {
            warn!("Refusing to fetch {}: {} is not a public address", url, ip);
            return Err(TranslateError::input(format!(
                "{} points to a non-public address ({}) and cannot be fetched",
                host, ip
            )));
        }
        Ok(())
    }

    pub async fn fetch(&self, url: &Url) -> TranslateResult<FetchedPage> {
        let mut current = url.clone();
        let mut redirects = 0;
        let mut response = loop {
            self.check_destination(&current).await?;
            debug!("Fetching article: {}", current);
            let response = self.client.get(current.clone()).send().await.map_err(|e| {
                warn!("Failed to fetch URL {}: {}", current, e);
                TranslateError::UnreachableSource(format!("{}: {}", current, e))
            })?;

            let next = response
                .status()
                .is_redirection()
                .then(|| response.headers().get(LOCATION))
                .flatten()
                .and_then(|location| location.to_str().ok())
                .and_then(|location| current.join(location).ok());
            let Some(next) = next else { break response };

            redirects += 1;
            if redirects > MAX_REDIRECTS {
                return Err(TranslateError::UnreachableSource(format!(
                    "{}: too many redirects",
                    url
                )));
            }
            if !matches!(next.scheme(), "http" | "https") {
                return Err(TranslateError::UnreachableSource(format!(
                    "{} redirects to unsupported location {}",
                    current, next
                )));
            }
            debug!("{} redirects to {}", current, next);
            current = next;
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Fetching {} returned {}", url, status);
            return Err(TranslateError::UnreachableSource(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        if let Some(length) = response.content_length() {
            if length as usize > self.max_bytes {
                return Err(self.too_large(length as usize));
            }
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TranslateError::UnreachableSource(format!("{}: {}", url, e)))?
        {
            body.extend_from_slice(&chunk);
            if body.len() > self.max_bytes {
                return Err(self.too_large(body.len()));
            }
        }

        let encoding = detect_encoding(content_type.as_deref(), &body);
        let (html, _, had_errors) = encoding.decode(&body);
        if had_errors {
            debug!("Page {} contained invalid {} sequences", url, encoding.name());
        }

        debug!("Fetched {} bytes from {}", body.len(), final_url);
        Ok(FetchedPage {
            url: final_url,
            html: html.into_owned(),
        })
    }

    fn too_large(&self, size: usize) -> TranslateError {
        TranslateError::input(format!(
            "the page is too large to translate ({} bytes, limit {} bytes)",
            size, self.max_bytes
        ))
    }
}
