use serde_json::Value;
use tracing::{info, warn};

use crate::crawl::engine::CrawlEngine;
use crate::crawl::planner;
use crate::crawl::types::{FetchOptions, PageFetch};
use crate::models::Lead;

/// Everything the rest of the pipeline needs from a site visit: the
/// aggregated content buffer plus the home page's text and markup for
/// signal detection. The home fields stay `None` when the home fetch fails.
#[derive(Debug, Default)]
pub struct CrawlHarvest {
    pub content: String,
    pub home_text: Option<String>,
    pub home_html: Option<String>,
}

pub struct CrawlExecutor<'a> {
    engine: &'a dyn CrawlEngine,
    options: FetchOptions,
    max_pages: usize,
    social_content_cap: usize,
    delay_ms: u64,
}

impl<'a> CrawlExecutor<'a> {
    pub fn new(
        engine: &'a dyn CrawlEngine,
        max_pages: usize,
        social_content_cap: usize,
        delay_ms: u64,
    ) -> Self {
        Self {
            engine,
            options: FetchOptions::default(),
            max_pages,
            social_content_cap,
            delay_ms,
        }
    }

    async fn pace(&self) {
        if self.delay_ms == 0 {
            return;
        }
        let jitter = fastrand::u64(0..=250);
        tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms + jitter)).await;
    }

    async fn fetch_page(&self, url: &str, context_name: &str) -> Option<PageFetch> {
        info!("🕷️ Crawling {}: {}...", context_name, url);
        match self.engine.fetch(url, &self.options).await {
            Ok(page) => {
                info!("   ✅ {} crawled ({} chars)", context_name, page.text.len());
                Some(page)
            }
            Err(e) => {
                warn!("   ❌ Failed to crawl {}: {}", context_name, e);
                None
            }
        }
    }

    /// Visits the home page, the planned pages, and the social links in that
    /// fixed order, accumulating the content buffer. Recognized social URLs
    /// are written back onto the lead. A failed fetch contributes no text
    /// and never aborts the lead.
    pub async fn crawl_site(&self, lead: &mut Lead, base_url: &str) -> CrawlHarvest {
        let mut harvest = CrawlHarvest::default();

        let home = self.fetch_page(base_url, "Home").await;
        let links = home.as_ref().map(|h| h.links.clone()).unwrap_or_default();
        if let Some(home) = home {
            harvest.content.push_str(&format!("# Homepage\n{}\n", home.text));
            harvest.home_text = Some(home.text);
            harvest.home_html = home.html;
        }

        info!(
            "   🔗 Found {} internal and {} external links.",
            links.internal.len(),
            links.external.len()
        );

        let plan = planner::build_plan(base_url, &links, self.max_pages);
        info!(
            "   📋 Selected {} pages to crawl (Priority: {})",
            plan.page_count(),
            plan.priority_pages.len()
        );

        let total = plan.page_count();
        for (i, page_url) in plan.pages().enumerate() {
            info!("   🕷️ Deep Crawling [{}/{}]: {}", i + 1, total, page_url);
            if let Some(page) = self.fetch_page(page_url, &format!("Page-{}", i + 1)).await {
                harvest
                    .content
                    .push_str(&format!("\n# Page: {}\n{}\n", page_url, page.text));
            }
            if i + 1 < total {
                self.pace().await;
            }
        }

        for (i, (platform, social_url)) in plan.social_links.iter().enumerate() {
            if i > 0 {
                self.pace().await;
            }
            info!("   🕷️ Social Crawling {}: {}", platform.key(), social_url);
            if let Some(page) = self
                .fetch_page(social_url, &format!("Social-{}", platform.label()))
                .await
            {
                // Socials are mostly noise past the header/bio; cap them.
                let snippet: String = page.text.chars().take(self.social_content_cap).collect();
                harvest.content.push_str(&format!(
                    "\n# Social Media ({})\n{}\n",
                    platform.label(),
                    snippet
                ));
                lead.set_field(platform.key(), Value::String(social_url.clone()));
            }
        }

        harvest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::types::LinkSets;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubEngine {
        fetched: Mutex<Vec<String>>,
    }

    impl StubEngine {
        fn new() -> Self {
            Self {
                fetched: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CrawlEngine for StubEngine {
        async fn fetch(
            &self,
            url: &str,
            _options: &FetchOptions,
        ) -> crate::models::Result<PageFetch> {
            self.fetched.lock().unwrap().push(url.to_string());
            if url.contains("broken") {
                return Err("HTTP error: 500".into());
            }
            let links = if url == "http://acme.com" {
                LinkSets {
                    internal: vec!["/contato".to_string(), "/broken".to_string()],
                    external: vec!["https://instagram.com/acme".to_string()],
                }
            } else {
                LinkSets::default()
            };
            Ok(PageFetch {
                url: url.to_string(),
                text: format!("text of {} {}", url, "x".repeat(3000)),
                html: Some("<html></html>".to_string()),
                links,
            })
        }
    }

    fn lead() -> Lead {
        Lead(serde_json::Map::new())
    }

    #[tokio::test]
    async fn crawls_home_pages_and_socials_in_order() {
        let engine = StubEngine::new();
        let executor = CrawlExecutor::new(&engine, 0, 2000, 0);
        let mut lead = lead();
        let harvest = executor.crawl_site(&mut lead, "http://acme.com").await;

        let fetched = engine.fetched.lock().unwrap().clone();
        assert_eq!(
            fetched,
            vec![
                "http://acme.com",
                "http://acme.com/contato",
                "http://acme.com/broken",
                "https://instagram.com/acme",
            ]
        );
        assert!(harvest.content.starts_with("# Homepage\n"));
        assert!(harvest.content.contains("# Page: http://acme.com/contato"));
        // The broken page contributed no section.
        assert!(!harvest.content.contains("# Page: http://acme.com/broken"));
        assert!(harvest.home_text.is_some());
    }

    #[tokio::test]
    async fn social_content_is_capped_and_link_written_back() {
        let engine = StubEngine::new();
        let executor = CrawlExecutor::new(&engine, 0, 2000, 0);
        let mut lead = lead();
        let harvest = executor.crawl_site(&mut lead, "http://acme.com").await;

        let social_section = harvest
            .content
            .split("# Social Media (Instagram)\n")
            .nth(1)
            .unwrap();
        let snippet = social_section.split('\n').next().unwrap();
        assert!(snippet.chars().count() <= 2000);
        assert_eq!(lead.field("instagram"), Some("https://instagram.com/acme"));
    }

    #[tokio::test]
    async fn failed_home_fetch_yields_empty_harvest() {
        let engine = StubEngine::new();
        let executor = CrawlExecutor::new(&engine, 0, 2000, 0);
        let mut lead = lead();
        let harvest = executor.crawl_site(&mut lead, "http://broken.example").await;
        assert!(harvest.content.is_empty());
        assert!(harvest.home_text.is_none());
    }
}
