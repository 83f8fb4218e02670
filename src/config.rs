use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub enrichment: EnrichmentConfig,
    pub fusion: FusionConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlConfig {
    pub request_timeout_seconds: u64,
    pub user_agent: String,
    /// Pages queued per lead after planning. 0 means unlimited, matching the
    /// historical behavior; large sites can make a single lead arbitrarily
    /// expensive, so operators may want a bound here.
    pub max_pages_per_lead: usize,
    pub social_content_cap: usize,
    pub delay_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnrichmentConfig {
    pub email_api_timeout_seconds: u64,
    pub email_max_attempts: u32,
    pub registry_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FusionConfig {
    pub model: String,
    pub content_budget: usize,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub file: String,
    pub pretty_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawl: CrawlConfig {
                request_timeout_seconds: 30,
                user_agent: "Mozilla/5.0 (compatible; LeadEnricher/1.0)".to_string(),
                max_pages_per_lead: 0,
                social_content_cap: 2000,
                delay_ms: 1000,
                poll_interval_ms: 500,
            },
            enrichment: EnrichmentConfig {
                email_api_timeout_seconds: 10,
                email_max_attempts: 3,
                registry_timeout_seconds: 15,
            },
            fusion: FusionConfig {
                model: "gpt-4o-mini".to_string(),
                content_budget: 20000,
                request_timeout_seconds: 120,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            output: OutputConfig {
                file: "final_leads.json".to_string(),
                pretty_json: true,
            },
        }
    }
}

pub async fn load_config(
    path: &str,
) -> std::result::Result<Config, Box<dyn std::error::Error + Send + Sync>> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&content)?;
    Ok(config)
}
