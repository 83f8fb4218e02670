// Prompt assembly for the fusion request. The completion capability gets
// every partial signal plus a strict output schema and must return a single
// JSON object.
use crate::fusion::persona::CompanyProfile;
use crate::models::Lead;

fn language_name(code: &str) -> &'static str {
    match code {
        "pt" => "Portuguese",
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "ja" => "Japanese",
        "zh" => "Chinese",
        "ko" => "Korean",
        "ar" => "Arabic",
        "ru" => "Russian",
        _ => "English",
    }
}

pub struct PromptInputs<'a> {
    pub lead: &'a Lead,
    pub content: &'a str,
    pub verified_emails: &'a [String],
    pub persona: &'a CompanyProfile,
    pub output_lang: &'a str,
    pub search_country: Option<&'a str>,
    pub content_budget: usize,
}

pub fn build_prompt(inputs: &PromptInputs) -> String {
    let lang_instruction = format!(
        "OUTPUT ALL TEXT FIELDS IN {}.",
        language_name(inputs.output_lang).to_uppercase()
    );

    let country_instruction = inputs
        .search_country
        .map(|c| {
            format!(
                "The business is located in {}. Include country and country_code \
                 (ISO 3166-1 alpha-2) in address_components.",
                c
            )
        })
        .unwrap_or_default();

    let verified_context = if inputs.verified_emails.is_empty() {
        String::new()
    } else {
        format!(
            "\nVERIFIED EMAILS (deliverability-checked):\n{}\n",
            serde_json::to_string_pretty(inputs.verified_emails).unwrap_or_default()
        )
    };

    let persona_json = if inputs.persona.is_empty() {
        "Not available".to_string()
    } else {
        inputs.persona.to_pretty_json()
    };

    // The content budget bounds request cost and keeps the request inside
    // completion-service limits.
    let content: String = inputs.content.chars().take(inputs.content_budget).collect();

    let raw_lead = serde_json::to_string(&inputs.lead.as_value()).unwrap_or_default();

    format!(
        r#"You are a Data Cleaning and Business Intelligence Expert.

IMPORTANT: {lang_instruction}
{country_instruction}

I have raw directory data, unstructured text scraped from the company's website, and VERIFIED EMAILS from a discovery service.
Your goal is to MERGE, VALIDATE, and CLEAN this information into a single, perfect JSON profile.

RAW DIRECTORY DATA:
{raw_lead}

{verified_context}

SCRAPED WEBSITE CONTENT (Markdown):
{content}

OUR COMPANY PROFILE (For generating personalized outreach messages):
{persona_json}

INSTRUCTIONS:
1. Verify the company name and address. PARSE THE ADDRESS into components (street, number, neighborhood, city, state, zip, country, country_code).
2. Merge phone numbers. STANDARDIZE them to E.164 format (e.g., +5511999999999).
3. Extract a professional business summary.
4. List key products/services.
5. Identify the target audience.
6. Extract specific valuable contacts (Names + Roles).
7. Determine the business category/sector.
8. EXTRACT SOCIAL MEDIA INSIGHTS.
9. MERGE EMAILS: Prioritize the VERIFIED EMAILS above. If none, look for emails in the website text.
10. PRESERVE SOURCE METADATA: Copy 'is_claimed', 'plus_code', 'available_actions', 'google_attributes', 'avaliacao', 'numero_avaliacoes', 'horario_funcionamento', 'latitude', 'longitude' etc. from the RAW DIRECTORY DATA into 'google_maps_metadata'.
11. GENERATE PERSONALIZED OUTREACH MESSAGES:
    - Analyze the lead's business type, services, and potential pain points.
    - Using OUR COMPANY PROFILE, create:
        a) EMAIL: Professional email with personalized subject and body (3-5 sentences). Reference specific aspects of the lead's business that our services can help with.
        b) WHATSAPP: Short, informal message (2-3 sentences) with emoji. Direct value proposition for this specific lead.
    - Messages must be in the OUTPUT LANGUAGE specified above.
    - If a contact name is available from key_people, use it in the greeting.

OUTPUT JSON FORMAT:
{{
    "company_info": {{
        "name": "Verified Name",
        "tax_id": {{
            "type": "CNPJ or EIN or VAT or ABN or RFC or CUIT or null",
            "value": "12.345.678/0001-90 or 12-3456789 or null",
            "country": "BR or US or DE or null"
        }},
        "description": "Professional Summary",
        "category": "Verified Category",
        "sentiment": "Professional Assessment"
    }},
    "contact_details": {{
        "address": "Full Formatted Address",
        "address_components": {{
            "street": "Rua X",
            "number": "123",
            "neighborhood": "Bairro",
            "city": "Cidade",
            "state": "SP",
            "zip_code": "00000-000",
            "country": "Brazil",
            "country_code": "BR"
        }},
        "phones": ["+5511999999999"],
        "emails": ["email1@domain.com", "email2@domain.com"],
        "website": "URL",
        "social_media": {{
            "instagram": "url or null",
            "facebook": "url or null",
            "linkedin": "url or null"
        }}
    }},
    "business_intelligence": {{
        "tech_stack": ["WordPress", "Google Analytics"],
        "products_services": ["Product A", "Service B"],
        "target_audience": "Description of target audience",
        "key_people": [
            {{"name": "Person Name", "role": "Role"}}
        ],
        "social_media_insights": {{
            "bio": "Extracted Bio",
            "followers": "Follower count",
            "latest_activity": "Latest post"
        }},
        "hunter_io_verified": true
    }},
    "google_maps_metadata": {{
        "is_claimed": true,
        "plus_code": "Code",
        "located_in": "Location",
        "google_description": "Description from Maps",
        "opening_hours": "Mon-Fri 9am-6pm",
        "coordinates": {{
            "latitude": "-23.5505",
            "longitude": "-46.6333"
        }},
        "rating": "4.8",
        "reviews": "150",
        "available_actions": ["Reservar", "Menu"],
        "google_attributes": {{
            "raw_about_text": "Full text from About tab"
        }}
    }},
    "outreach_messages": {{
        "email": {{
            "subject": "Personalized subject line based on lead's business",
            "body": "Professional email body (3-5 sentences) explaining how our services can help THIS SPECIFIC lead. Include greeting with contact name if available."
        }},
        "whatsapp": "Short WhatsApp message (2-3 sentences) with emoji. Informal but professional. Direct value proposition for THIS lead."
    }}
}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lead() -> Lead {
        let map = match json!({"nome_empresa": "Acme", "website": "acme.com"}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        Lead(map)
    }

    #[test]
    fn prompt_carries_language_and_country_instructions() {
        let persona = CompanyProfile::default();
        let lead = lead();
        let prompt = build_prompt(&PromptInputs {
            lead: &lead,
            content: "site text",
            verified_emails: &[],
            persona: &persona,
            output_lang: "pt",
            search_country: Some("Brazil"),
            content_budget: 20000,
        });
        assert!(prompt.contains("OUTPUT ALL TEXT FIELDS IN PORTUGUESE."));
        assert!(prompt.contains("The business is located in Brazil."));
        assert!(prompt.contains(r#""nome_empresa":"Acme""#));
    }

    #[test]
    fn verified_emails_block_present_only_when_nonempty() {
        let persona = CompanyProfile::default();
        let lead = lead();
        let emails = vec!["sales@acme.com".to_string()];
        let with = build_prompt(&PromptInputs {
            lead: &lead,
            content: "",
            verified_emails: &emails,
            persona: &persona,
            output_lang: "en",
            search_country: None,
            content_budget: 20000,
        });
        assert!(with.contains("VERIFIED EMAILS (deliverability-checked):"));
        assert!(with.contains("sales@acme.com"));

        let without = build_prompt(&PromptInputs {
            lead: &lead,
            content: "",
            verified_emails: &[],
            persona: &persona,
            output_lang: "en",
            search_country: None,
            content_budget: 20000,
        });
        assert!(!without.contains("VERIFIED EMAILS (deliverability-checked):"));
    }

    #[test]
    fn content_is_cut_to_budget() {
        let persona = CompanyProfile::default();
        let lead = lead();
        let long = "x".repeat(30000);
        let prompt = build_prompt(&PromptInputs {
            lead: &lead,
            content: &long,
            verified_emails: &[],
            persona: &persona,
            output_lang: "en",
            search_country: None,
            content_budget: 20000,
        });
        assert!(!prompt.contains(&"x".repeat(20001)));
        assert!(prompt.contains(&"x".repeat(20000)));
    }

    #[test]
    fn unknown_language_defaults_to_english() {
        assert_eq!(language_name("xx"), "English");
    }
}
