pub mod completion;
pub mod persona;
pub mod prompt;

pub use completion::{CompletionService, OpenAiCompletion};
pub use persona::CompanyProfile;

use serde_json::Value;
use tracing::{info, warn};

use crate::models::{EnrichedProfile, Lead};
use prompt::{build_prompt, PromptInputs};

const SYSTEM_MESSAGE: &str = "You are a helpful assistant that outputs ONLY valid JSON.";

/// Merges everything known about a lead into one schema-constrained profile
/// via the completion capability. A failed or malformed response drops the
/// lead; there is no partial profile.
pub struct FusionEngine<'a> {
    service: &'a dyn CompletionService,
    persona: &'a CompanyProfile,
    output_lang: String,
    search_country: Option<String>,
    content_budget: usize,
}

impl<'a> FusionEngine<'a> {
    pub fn new(
        service: &'a dyn CompletionService,
        persona: &'a CompanyProfile,
        output_lang: String,
        search_country: Option<String>,
        content_budget: usize,
    ) -> Self {
        Self {
            service,
            persona,
            output_lang,
            search_country,
            content_budget,
        }
    }

    pub async fn fuse(
        &self,
        lead: &Lead,
        content: &str,
        verified_emails: &[String],
    ) -> Option<EnrichedProfile> {
        info!(
            "   🤖 Analyzing and Consolidating data for {}...",
            lead.company_name()
        );

        let prompt = build_prompt(&PromptInputs {
            lead,
            content,
            verified_emails,
            persona: self.persona,
            output_lang: &self.output_lang,
            search_country: self.search_country.as_deref(),
            content_budget: self.content_budget,
        });

        match self.service.complete_json(SYSTEM_MESSAGE, &prompt).await {
            Ok(value @ Value::Object(_)) => Some(EnrichedProfile(value)),
            Ok(other) => {
                warn!("   ⚠️ Fusion returned a non-object response: {}", other);
                None
            }
            Err(e) => {
                warn!("   ⚠️ Fusion failed: {}", e);
                None
            }
        }
    }
}
