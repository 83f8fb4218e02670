use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::crawl::types::{FetchOptions, LinkSets, PageFetch};
use crate::models::Result;

/// The external crawling capability. The pipeline only depends on this
/// contract; `HttpCrawlEngine` is the stock implementation.
#[async_trait]
pub trait CrawlEngine: Send + Sync {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<PageFetch>;
}

pub struct HttpCrawlEngine {
    client: Client,
}

impl HttpCrawlEngine {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    fn strip_excluded_tags(html: &str, excluded: &[String]) -> String {
        let mut cleaned = html.to_string();
        for tag in excluded {
            // (?is): excluded blocks span lines and tags vary in case.
            let pattern = format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}>");
            if let Ok(re) = Regex::new(&pattern) {
                cleaned = re.replace_all(&cleaned, " ").into_owned();
            }
        }
        cleaned
    }

    fn extract_text(document: &Html) -> String {
        let body_selector = Selector::parse("body").unwrap();
        document
            .select(&body_selector)
            .next()
            .map(|body| {
                body.text()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }

    fn classify_links(document: &Html, page_url: &str) -> LinkSets {
        let link_selector = Selector::parse("a[href]").unwrap();
        let base_host = Url::parse(page_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()));

        let mut links = LinkSets::default();
        for element in document.select(&link_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if href.is_empty() || href.starts_with('#') || href.starts_with("mailto:") {
                continue;
            }
            if href.starts_with("http") {
                let host = Url::parse(href)
                    .ok()
                    .and_then(|u| u.host_str().map(|h| h.to_string()));
                if host.is_some() && host == base_host {
                    links.internal.push(href.to_string());
                } else {
                    links.external.push(href.to_string());
                }
            } else {
                links.internal.push(href.to_string());
            }
        }
        links
    }
}

#[async_trait]
impl CrawlEngine for HttpCrawlEngine {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<PageFetch> {
        debug!("Fetching: {}", url);
        let mut request = self.client.get(url);
        if options.bypass_cache {
            request = request.header("Cache-Control", "no-cache");
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(format!("HTTP error: {}", response.status()).into());
        }

        let html = response.text().await?;
        debug!("Fetched {} bytes from {}", html.len(), url);

        let cleaned = Self::strip_excluded_tags(&html, &options.excluded_tags);
        let document = Html::parse_document(&cleaned);
        let text = Self::extract_text(&document);
        let links = Self::classify_links(&document, url);

        Ok(PageFetch {
            url: url.to_string(),
            text,
            html: Some(html),
            links,
        })
    }
}
