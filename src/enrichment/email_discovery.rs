// Email discovery against a hunter-style domain-search API, with an
// explicit retry state machine for rate limiting.
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use crate::enrichment::email_verify::EmailVerifier;
use crate::models::Result;

/// Discovery never queries social hosts; their mailboxes are not the
/// lead's.
pub const SOCIAL_DOMAINS: [&str; 7] = [
    "instagram.com",
    "facebook.com",
    "linkedin.com",
    "linktr.ee",
    "twitter.com",
    "youtube.com",
    "tiktok.com",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    Proceed { attempt: u32 },
    Exhausted,
}

/// Retry bookkeeping for rate-limited calls: attempt counter plus the wait
/// to apply before the next try. Kept separate from the HTTP loop so the
/// contract (at most `max_attempts` tries, `Retry-After` honored, else
/// exponential backoff) is testable on its own.
#[derive(Debug)]
pub struct RetryState {
    attempt: u32,
    max_attempts: u32,
}

impl RetryState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts,
        }
    }

    pub fn next_attempt(&mut self) -> RetryStep {
        if self.attempt >= self.max_attempts {
            return RetryStep::Exhausted;
        }
        self.attempt += 1;
        RetryStep::Proceed {
            attempt: self.attempt,
        }
    }

    /// Wait before retrying the current attempt's 429: the server's
    /// `Retry-After` seconds when present, else 2^attempt seconds.
    pub fn backoff(&self, retry_after: Option<u64>) -> Duration {
        Duration::from_secs(retry_after.unwrap_or(1u64 << self.attempt))
    }
}

pub struct EmailFinder {
    client: Client,
    api_key: String,
    base_url: String,
    max_attempts: u32,
    verifier: EmailVerifier,
}

impl EmailFinder {
    pub fn new(api_key: String, timeout: Duration, max_attempts: u32) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: "https://api.hunter.io".to_string(),
            max_attempts,
            verifier: EmailVerifier::new(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Discovered, deliverability-checked addresses for a domain. Always
    /// succeeds; an unavailable or uncooperative API just means an empty
    /// list.
    pub async fn discover(&self, domain: &str) -> Vec<String> {
        if SOCIAL_DOMAINS.iter().any(|b| domain.contains(b)) {
            info!("   🚫 Skipping email discovery for social domain: {}", domain);
            return Vec::new();
        }

        info!("   🔫 Hunting emails for: {}...", domain);
        let url = format!(
            "{}/v2/domain-search?domain={}&api_key={}",
            self.base_url, domain, self.api_key
        );

        let mut retry = RetryState::new(self.max_attempts);
        loop {
            let attempt = match retry.next_attempt() {
                RetryStep::Proceed { attempt } => attempt,
                RetryStep::Exhausted => {
                    warn!("   ⚠️ Email API rate limit persisted after retries. Skipping this lead.");
                    return Vec::new();
                }
            };

            let response = match self.client.get(&url).send().await {
                Ok(r) => r,
                Err(e) => {
                    warn!("   ⚠️ Email API request failed: {}", e);
                    return Vec::new();
                }
            };

            match response.status().as_u16() {
                200 => {
                    let data: Value = match response.json().await {
                        Ok(v) => v,
                        Err(e) => {
                            warn!("   ⚠️ Email API returned invalid JSON: {}", e);
                            return Vec::new();
                        }
                    };
                    let raw: Vec<&str> = data
                        .pointer("/data/emails")
                        .and_then(Value::as_array)
                        .map(|emails| {
                            emails
                                .iter()
                                .filter_map(|e| e.get("value").and_then(Value::as_str))
                                .collect()
                        })
                        .unwrap_or_default();
                    let valid: Vec<String> = raw
                        .iter()
                        .filter_map(|e| self.verifier.verify(e))
                        .collect();
                    info!(
                        "   🎯 Found {} VALID emails (from {} raw)!",
                        valid.len(),
                        raw.len()
                    );
                    return valid;
                }
                429 => {
                    let retry_after = response
                        .headers()
                        .get("Retry-After")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok());
                    let wait = retry.backoff(retry_after);
                    warn!(
                        "   ⚠️ Email API rate limit (429). Waiting {}s then retrying ({}/{})...",
                        wait.as_secs(),
                        attempt,
                        self.max_attempts
                    );
                    tokio::time::sleep(wait).await;
                }
                status => {
                    // Anything else is not worth insisting on.
                    warn!("   ⚠️ Email API error: {}", status);
                    return Vec::new();
                }
            }
        }
    }
}
