// Post-merge validation and normalization of the fused profile.
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::enrichment::email_verify::EmailVerifier;
use crate::enrichment::registry::RegistryClient;
use crate::models::EnrichedProfile;

/// Reserved "value not yet determined" token the completion step sometimes
/// leaves behind; scrubbed to null everywhere.
pub const PENDING_TOKEN: &str = "Pendente";

/// Recursively replaces every string containing the pending token with
/// null, at any depth, across objects and arrays. Other fields are left
/// untouched.
pub fn scrub_pending(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for v in map.values_mut() {
                if matches!(v, Value::String(s) if s.contains(PENDING_TOKEN)) {
                    *v = Value::Null;
                } else {
                    scrub_pending(v);
                }
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                if matches!(v, Value::String(s) if s.contains(PENDING_TOKEN)) {
                    *v = Value::Null;
                } else {
                    scrub_pending(v);
                }
            }
        }
        _ => {}
    }
}

/// Messaging deep-link for Brazilian mobile numbers. Eleven digits are read
/// as area code + mobile number; thirteen digits must already carry the 55
/// calling code. Anything else produces no link.
pub fn whatsapp_link(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        11 => Some(format!("https://wa.me/55{}", digits)),
        13 if digits.starts_with("55") => Some(format!("https://wa.me/{}", digits)),
        _ => None,
    }
}

pub struct PostProcessor<'a> {
    verifier: &'a EmailVerifier,
    registry: &'a RegistryClient,
}

impl<'a> PostProcessor<'a> {
    pub fn new(verifier: &'a EmailVerifier, registry: &'a RegistryClient) -> Self {
        Self { verifier, registry }
    }

    /// Runs all post-merge steps in order: email re-validation, WhatsApp
    /// link derivation, placeholder scrub, registry attach.
    pub async fn finalize(&self, profile: &mut EnrichedProfile) {
        if let Some(emails) = profile.emails_mut() {
            let validated: Vec<Value> = emails
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|e| self.verifier.verify(e))
                .map(Value::String)
                .collect();
            if validated.len() < emails.len() {
                info!(
                    "   📧 Re-validation kept {}/{} proposed emails",
                    validated.len(),
                    emails.len()
                );
            }
            *emails = validated;
        }

        let links: Vec<Value> = profile
            .phones()
            .iter()
            .filter_map(|p| whatsapp_link(p).map(|link| json!({"phone": p, "link": link})))
            .collect();
        if !links.is_empty() {
            if let Some(details) = profile.contact_details_mut() {
                details.insert("whatsapp_verified".to_string(), Value::Array(links));
            }
        }

        scrub_pending(&mut profile.0);

        let mut registry_data = Value::Null;
        if let Some((id_type, Some(value), country)) = profile.tax_id() {
            if id_type == "CNPJ" || country == "BR" {
                if let Some(record) = self.registry.lookup(&value).await {
                    match serde_json::to_value(&record) {
                        Ok(v) => registry_data = v,
                        Err(e) => warn!("   ⚠️ Could not serialize registry record: {}", e),
                    }
                }
            }
        }
        profile.set_top_level("cnpja_data", registry_data);
        profile.set_top_level(
            "enriched_at",
            Value::String(chrono::Utc::now().to_rfc3339()),
        );
    }
}
