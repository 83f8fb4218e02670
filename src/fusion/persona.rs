use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

/// The outreach persona: who "we" are when the fusion step drafts
/// personalized messages. Loaded once at startup and passed into the engine
/// by reference; an absent profile just means generic outreach copy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile(pub Map<String, Value>);

impl CompanyProfile {
    pub async fn load(path: &str) -> Self {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(map) => {
                    let profile = Self(map);
                    info!("📋 Loaded company profile: {}", profile.company_name());
                    profile
                }
                Err(e) => {
                    warn!("⚠️ Could not parse {}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("⚠️ Could not load {}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn company_name(&self) -> &str {
        self.0
            .get("company_name")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}
