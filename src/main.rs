use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod crawl;
mod enrichment;
mod fusion;
mod models;
mod pipeline;
mod postprocess;
mod queue;

use config::{load_config, Config};
use crawl::HttpCrawlEngine;
use enrichment::{tax_id, EmailFinder, EmailVerifier, RegistryClient, TaxIdExtractor};
use fusion::{CompanyProfile, FusionEngine, OpenAiCompletion};
use models::Result;
use pipeline::{CrawlStage, Pipeline};
use postprocess::PostProcessor;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let Some(input_path) = args.get(1).cloned() else {
        println!("Usage: lead-enricher <input.json|input.jsonl> [lang] [country]");
        return Ok(());
    };
    let output_lang = args.get(2).cloned().unwrap_or_else(|| "en".to_string());
    let search_country = args.get(3).cloned();

    let config = match load_config("config.yml").await {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config.yml: {}. Using defaults.", e);
            Config::default()
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("lead_enricher={}", config.logging.level).parse()?),
        )
        .init();

    if tokio::fs::metadata(&input_path).await.is_err() {
        println!("File not found: {}", input_path);
        return Ok(());
    }

    let stream_mode = input_path.to_lowercase().ends_with(".jsonl");
    info!("Loading data from {}...", input_path);
    info!("🌐 Output Language: {}", output_lang);
    if let Some(country) = &search_country {
        info!("🏳️ Search Country: {}", country);
    }

    let openai_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
    if openai_key.is_empty() {
        warn!("OPENAI_API_KEY is not set; fusion requests will fail.");
    }
    let hunter_key = std::env::var("HUNTER_API_KEY").unwrap_or_default();

    let engine = HttpCrawlEngine::new(
        &config.crawl.user_agent,
        Duration::from_secs(config.crawl.request_timeout_seconds),
    )?;
    let finder = EmailFinder::new(
        hunter_key,
        Duration::from_secs(config.enrichment.email_api_timeout_seconds),
        config.enrichment.email_max_attempts,
    )?;
    let tax = TaxIdExtractor::new();
    let verifier = EmailVerifier::new();
    let registry = RegistryClient::new(Duration::from_secs(
        config.enrichment.registry_timeout_seconds,
    ))?;
    let completion = OpenAiCompletion::new(
        openai_key,
        config.fusion.model.clone(),
        Duration::from_secs(config.fusion.request_timeout_seconds),
    )?;
    let persona = CompanyProfile::load("company_profile.json").await;

    let country_hint = search_country.as_deref().and_then(tax_id::country_code);

    let pipeline = Pipeline::new(
        CrawlStage::new(
            &engine,
            &finder,
            &tax,
            country_hint,
            config.crawl.max_pages_per_lead,
            config.crawl.social_content_cap,
            config.crawl.delay_ms,
        ),
        FusionEngine::new(
            &completion,
            &persona,
            output_lang,
            search_country,
            config.fusion.content_budget,
        ),
        PostProcessor::new(&verifier, &registry),
    );

    tokio::select! {
        result = pipeline::run(
            &pipeline,
            &input_path,
            stream_mode,
            Duration::from_millis(config.crawl.poll_interval_ms),
            &config.output,
        ) => {
            result?;
        }
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    info!("Done!");
    Ok(())
}
