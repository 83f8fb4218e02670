// Pipeline stages and the sequential driver. Stages exchange typed
// messages; one loop drives them so every lead fully completes (or is
// dropped) before the next begins, which keeps output in arrival order.
use std::time::Duration;

use tracing::{info, warn};

use crate::config::OutputConfig;
use crate::crawl::{CrawlEngine, CrawlExecutor};
use crate::enrichment::{detect_tech_stack, EmailFinder, TaxIdExtractor};
use crate::fusion::FusionEngine;
use crate::models::{DetectedSignals, EnrichedProfile, Lead, Result};
use crate::postprocess::PostProcessor;
use crate::queue::{self, LeadStream};

/// Stage 1 output: the lead (possibly with social links appended), its
/// aggregated site content, and the independently detected signals.
pub struct CrawledLead {
    pub lead: Lead,
    pub content: String,
    pub signals: DetectedSignals,
}

/// Websites that are placeholders or directory self-references get no crawl;
/// the lead still flows through fusion on raw data alone.
fn usable_website(lead: &Lead) -> Option<String> {
    let site = lead.website()?;
    if site.is_empty() || site.contains("google.com") || site == "Não disponível" {
        return None;
    }
    if site.starts_with("http") {
        Some(site.to_string())
    } else {
        Some(format!("http://{}", site))
    }
}

fn domain_of(base_url: &str) -> String {
    base_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

pub struct CrawlStage<'a> {
    executor: CrawlExecutor<'a>,
    finder: &'a EmailFinder,
    tax: &'a TaxIdExtractor,
    country_hint: Option<&'static str>,
}

impl<'a> CrawlStage<'a> {
    pub fn new(
        engine: &'a dyn CrawlEngine,
        finder: &'a EmailFinder,
        tax: &'a TaxIdExtractor,
        country_hint: Option<&'static str>,
        max_pages: usize,
        social_content_cap: usize,
        delay_ms: u64,
    ) -> Self {
        Self {
            executor: CrawlExecutor::new(engine, max_pages, social_content_cap, delay_ms),
            finder,
            tax,
            country_hint,
        }
    }

    pub async fn process(&self, index: usize, mut lead: Lead) -> CrawledLead {
        let mut content = String::new();
        let mut signals = DetectedSignals::default();

        match usable_website(&lead) {
            Some(base_url) => {
                info!(
                    "[{}] Processing {} ({})...",
                    index,
                    lead.company_name(),
                    base_url
                );
                let harvest = self.executor.crawl_site(&mut lead, &base_url).await;
                content = harvest.content;

                if let Some(text) = &harvest.home_text {
                    signals.tax_id = self.tax.extract(text, self.country_hint);
                }
                if let Some(html) = &harvest.home_html {
                    signals.tech_stack = detect_tech_stack(html);
                }
                signals.verified_emails = self.finder.discover(&domain_of(&base_url)).await;
            }
            None => {
                info!(
                    "[{}] Processing {} (No Website - Maps Data Only)...",
                    index,
                    lead.company_name()
                );
            }
        }

        content.push_str("\n\n[SYSTEM DETECTED DATA (High Confidence)]\n");
        if let Some(tax) = &signals.tax_id {
            content.push_str(&format!("TAX ID: {} - {}\n", tax.id_type, tax.value));
        }
        if !signals.tech_stack.is_empty() {
            content.push_str(&format!("TECH STACK: {}\n", signals.tech_stack.join(", ")));
        }

        CrawledLead {
            lead,
            content,
            signals,
        }
    }
}

pub struct Pipeline<'a> {
    crawl: CrawlStage<'a>,
    fusion: FusionEngine<'a>,
    post: PostProcessor<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(crawl: CrawlStage<'a>, fusion: FusionEngine<'a>, post: PostProcessor<'a>) -> Self {
        Self {
            crawl,
            fusion,
            post,
        }
    }

    /// Runs one lead through every stage. `None` means the lead was dropped
    /// (fusion failed); the caller just moves on.
    pub async fn process_lead(&self, index: usize, lead: Lead) -> Option<EnrichedProfile> {
        let crawled = self.crawl.process(index, lead).await;

        let Some(mut profile) = self
            .fusion
            .fuse(
                &crawled.lead,
                &crawled.content,
                &crawled.signals.verified_emails,
            )
            .await
        else {
            warn!("   ⚠️ Could not generate clean profile, skipping.");
            return None;
        };

        self.post.finalize(&mut profile).await;
        info!("   ✨ Lead successfully enriched and cleaned!");
        Some(profile)
    }
}

/// Drives the whole run: consumes the queue (bounded or streaming), feeds
/// each lead through the pipeline, and writes the terminal snapshot file.
pub async fn run(
    pipeline: &Pipeline<'_>,
    input_path: &str,
    stream_mode: bool,
    poll_interval: Duration,
    output: &OutputConfig,
) -> Result<()> {
    let mut final_leads: Vec<EnrichedProfile> = Vec::new();

    if stream_mode {
        info!("🧵 Stream mode ON (processing leads as they arrive).");
        let mut stream = LeadStream::open(input_path, poll_interval);
        let mut processed = 0usize;
        while let Some(lead) = stream.recv().await {
            processed += 1;
            if let Some(profile) = pipeline.process_lead(processed, lead).await {
                final_leads.push(profile);
            }
        }
    } else {
        let leads = queue::load_bounded(input_path).await?;
        info!("Loaded {} leads from {}", leads.len(), input_path);
        for (i, lead) in leads.into_iter().enumerate() {
            if let Some(profile) = pipeline.process_lead(i + 1, lead).await {
                final_leads.push(profile);
            }
        }
    }

    write_output(&final_leads, output).await?;

    if !stream_mode {
        // Bounded inputs are transient hand-off files; streaming queues are
        // kept for audit.
        match tokio::fs::remove_file(input_path).await {
            Ok(()) => info!("Deleted temporary file: {}", input_path),
            Err(e) => warn!("⚠️ Could not delete temporary file: {}", e),
        }
    }

    Ok(())
}

async fn write_output(profiles: &[EnrichedProfile], output: &OutputConfig) -> Result<()> {
    info!("Saving CLEAN data to {}...", output.file);
    let json = if output.pretty_json {
        serde_json::to_string_pretty(profiles)?
    } else {
        serde_json::to_string(profiles)?
    };
    tokio::fs::write(&output.file, json).await?;
    info!("💾 Saved {} enriched leads to {}", profiles.len(), output.file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::{FetchOptions, PageFetch};
    use crate::enrichment::{EmailVerifier, RegistryClient};
    use crate::fusion::{CompanyProfile, CompletionService};
    use async_trait::async_trait;
    use serde_json::json;

    struct DeadEngine;

    #[async_trait]
    impl CrawlEngine for DeadEngine {
        async fn fetch(&self, _url: &str, _options: &FetchOptions) -> Result<PageFetch> {
            Err("unreachable".into())
        }
    }

    struct StubCompletion;

    #[async_trait]
    impl CompletionService for StubCompletion {
        async fn complete_json(&self, _system: &str, _prompt: &str) -> Result<serde_json::Value> {
            Ok(json!({
                "company_info": {"name": "Acme", "tax_id": {"type": null, "value": null, "country": null}},
                "contact_details": {"emails": [], "phones": []}
            }))
        }
    }

    #[test]
    fn website_gating() {
        let mut map = serde_json::Map::new();
        map.insert("website".to_string(), json!("acme.com.br"));
        assert_eq!(
            usable_website(&Lead(map.clone())),
            Some("http://acme.com.br".to_string())
        );

        map.insert("website".to_string(), json!("Não disponível"));
        assert!(usable_website(&Lead(map.clone())).is_none());

        map.insert("website".to_string(), json!("https://maps.google.com/x"));
        assert!(usable_website(&Lead(map)).is_none());
    }

    #[test]
    fn domain_extraction_strips_scheme_and_path() {
        assert_eq!(domain_of("https://acme.com.br/contato"), "acme.com.br");
        assert_eq!(domain_of("http://acme.com"), "acme.com");
    }

    #[tokio::test]
    async fn lead_without_website_still_yields_a_profile() {
        let engine = DeadEngine;
        let finder = EmailFinder::new("k".to_string(), Duration::from_millis(200), 3)
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let tax = TaxIdExtractor::new();
        let persona = CompanyProfile::default();
        let completion = StubCompletion;
        let verifier = EmailVerifier::new();
        let registry = RegistryClient::new(Duration::from_millis(200))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");

        let pipeline = Pipeline::new(
            CrawlStage::new(&engine, &finder, &tax, None, 0, 2000, 0),
            FusionEngine::new(&completion, &persona, "en".to_string(), None, 20000),
            PostProcessor::new(&verifier, &registry),
        );

        let mut map = serde_json::Map::new();
        map.insert("nome_empresa".to_string(), json!("Acme"));
        let profile = pipeline.process_lead(1, Lead(map)).await.unwrap();
        assert_eq!(profile.0.pointer("/company_info/name").unwrap(), "Acme");
        // Registry attach always leaves the key present.
        assert!(profile.0.get("cnpja_data").is_some());
    }

    #[tokio::test]
    async fn bounded_run_writes_snapshot_and_deletes_input() {
        use std::io::Write;

        let engine = DeadEngine;
        let finder = EmailFinder::new("k".to_string(), Duration::from_millis(200), 3)
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let tax = TaxIdExtractor::new();
        let persona = CompanyProfile::default();
        let completion = StubCompletion;
        let verifier = EmailVerifier::new();
        let registry = RegistryClient::new(Duration::from_millis(200))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");

        let pipeline = Pipeline::new(
            CrawlStage::new(&engine, &finder, &tax, None, 0, 2000, 0),
            FusionEngine::new(&completion, &persona, "en".to_string(), None, 20000),
            PostProcessor::new(&verifier, &registry),
        );

        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("batch.json");
        let mut input = std::fs::File::create(&input_path).unwrap();
        write!(input, r#"[{{"nome_empresa": "A"}}, {{"nome_empresa": "B"}}]"#).unwrap();

        let output = OutputConfig {
            file: dir
                .path()
                .join("final_leads.json")
                .to_string_lossy()
                .into_owned(),
            pretty_json: true,
        };

        run(
            &pipeline,
            input_path.to_str().unwrap(),
            false,
            Duration::from_millis(50),
            &output,
        )
        .await
        .unwrap();

        let written = std::fs::read_to_string(&output.file).unwrap();
        let profiles: Vec<serde_json::Value> = serde_json::from_str(&written).unwrap();
        assert_eq!(profiles.len(), 2);
        assert!(!input_path.exists());
    }
}
