// Company-registry lookup for Brazilian CNPJ identifiers against the open
// CNPJA office endpoint. Any failure yields None; the lookup is never fatal.
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::models::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shareholder {
    pub name: Option<String>,
    pub role: Option<String>,
    pub since: Option<String>,
    pub age_range: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryAddress {
    pub street: Option<String>,
    pub number: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

/// Structured organization record from the national registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub company_name: Option<String>,
    pub alias: Option<String>,
    pub status: Option<String>,
    pub status_date: Option<String>,
    pub founded: Option<String>,
    pub equity: Option<Value>,
    pub nature: Option<String>,
    pub size: Option<String>,
    pub main_activity: Option<String>,
    pub side_activities: Vec<String>,
    pub shareholders: Vec<Shareholder>,
    pub official_address: Option<RegistryAddress>,
    pub official_phones: Vec<String>,
    pub official_emails: Vec<String>,
}

pub struct RegistryClient {
    client: Client,
    base_url: String,
}

fn text_at(value: &Value, pointer: &str) -> Option<String> {
    value.pointer(pointer).and_then(Value::as_str).map(str::to_string)
}

impl RegistryClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: "https://open.cnpja.com".to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub async fn lookup(&self, tax_value: &str) -> Option<RegistryRecord> {
        let digits: String = tax_value.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() != 14 {
            warn!("   ⚠️ Invalid CNPJ format: {}", tax_value);
            return None;
        }

        info!("   🏢 Fetching registry data for: {}...", tax_value);
        let url = format!("{}/office/{}", self.base_url, digits);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("   ⚠️ Registry request failed: {}", e);
                return None;
            }
        };
        if !response.status().is_success() {
            warn!("   ⚠️ Registry API returned status: {}", response.status());
            return None;
        }
        let data: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                warn!("   ⚠️ Registry API returned invalid JSON: {}", e);
                return None;
            }
        };

        let record = Self::map_record(&data);
        info!(
            "   ✅ Registry: {} ({})",
            record.company_name.as_deref().unwrap_or("?"),
            record.status.as_deref().unwrap_or("?")
        );
        Some(record)
    }

    fn map_record(data: &Value) -> RegistryRecord {
        let shareholders = data
            .pointer("/company/members")
            .and_then(Value::as_array)
            .map(|members| {
                members
                    .iter()
                    .map(|m| Shareholder {
                        name: text_at(m, "/person/name"),
                        role: text_at(m, "/role/text"),
                        since: text_at(m, "/since"),
                        age_range: text_at(m, "/person/age"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let official_address = data.get("address").map(|addr| RegistryAddress {
            street: text_at(addr, "/street"),
            number: text_at(addr, "/number"),
            district: text_at(addr, "/district"),
            city: text_at(addr, "/city"),
            state: text_at(addr, "/state"),
            zip: text_at(addr, "/zip"),
        });

        let official_phones = data
            .get("phones")
            .and_then(Value::as_array)
            .map(|phones| {
                phones
                    .iter()
                    .map(|p| {
                        format!(
                            "+55{}{}",
                            text_at(p, "/area").unwrap_or_default(),
                            text_at(p, "/number").unwrap_or_default()
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        let official_emails = data
            .get("emails")
            .and_then(Value::as_array)
            .map(|emails| {
                emails
                    .iter()
                    .filter_map(|e| text_at(e, "/address"))
                    .collect()
            })
            .unwrap_or_default();

        RegistryRecord {
            company_name: text_at(data, "/company/name"),
            alias: text_at(data, "/alias"),
            status: text_at(data, "/status/text"),
            status_date: text_at(data, "/statusDate"),
            founded: text_at(data, "/founded"),
            equity: data.pointer("/company/equity").cloned(),
            nature: text_at(data, "/company/nature/text"),
            size: text_at(data, "/company/size/text"),
            main_activity: text_at(data, "/mainActivity/text"),
            side_activities: data
                .get("sideActivities")
                .and_then(Value::as_array)
                .map(|acts| acts.iter().filter_map(|a| text_at(a, "/text")).collect())
                .unwrap_or_default(),
            shareholders,
            official_address,
            official_phones,
            official_emails,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(base: &str) -> RegistryClient {
        RegistryClient::new(Duration::from_secs(2))
            .unwrap()
            .with_base_url(base)
    }

    #[tokio::test]
    async fn maps_office_response_into_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/office/12345678000190"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "alias": "Acme",
                "founded": "2010-05-20",
                "statusDate": "2010-05-20",
                "status": {"text": "Ativa"},
                "company": {
                    "name": "Acme Ltda",
                    "equity": 100000,
                    "nature": {"text": "Sociedade Limitada"},
                    "size": {"text": "ME"},
                    "members": [
                        {"person": {"name": "Maria", "age": "31-40"},
                         "role": {"text": "Sócio-Administrador"},
                         "since": "2010-05-20"}
                    ]
                },
                "mainActivity": {"text": "Real estate"},
                "sideActivities": [{"text": "Consulting"}],
                "address": {"street": "Rua X", "number": "123", "district": "Centro",
                            "city": "São Paulo", "state": "SP", "zip": "01000-000"},
                "phones": [{"area": "11", "number": "999999999"}],
                "emails": [{"address": "contato@acme.com.br"}]
            })))
            .mount(&server)
            .await;

        let record = client(&server.uri())
            .await
            .lookup("12.345.678/0001-90")
            .await
            .unwrap();
        assert_eq!(record.company_name.as_deref(), Some("Acme Ltda"));
        assert_eq!(record.status.as_deref(), Some("Ativa"));
        assert_eq!(record.shareholders.len(), 1);
        assert_eq!(record.shareholders[0].name.as_deref(), Some("Maria"));
        assert_eq!(record.official_phones, vec!["+5511999999999".to_string()]);
        assert_eq!(record.official_emails, vec!["contato@acme.com.br".to_string()]);
        assert_eq!(
            record.official_address.unwrap().city.as_deref(),
            Some("São Paulo")
        );
    }

    #[tokio::test]
    async fn wrong_digit_count_short_circuits() {
        // No server: a malformed identifier must not produce a request.
        let client = RegistryClient::new(Duration::from_secs(2))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        assert!(client.lookup("12.345.678").await.is_none());
    }

    #[tokio::test]
    async fn non_success_status_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        assert!(client(&server.uri())
            .await
            .lookup("12.345.678/0001-90")
            .await
            .is_none());
    }
}
