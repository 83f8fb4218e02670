use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// One raw business-directory record as read from the queue. Kept as a JSON
/// map because upstream providers attach arbitrary metadata that must be
/// passed through to the fusion step verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead(pub Map<String, Value>);

impl Lead {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn company_name(&self) -> &str {
        self.field("nome_empresa").unwrap_or("Unknown")
    }

    pub fn website(&self) -> Option<&str> {
        self.field("website")
    }

    pub fn set_field(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxId {
    #[serde(rename = "type")]
    pub id_type: String,
    pub value: String,
    pub country: String,
    pub name: String,
}

/// Independently detected per-lead signals. Every field is optional by
/// design; an absent signal is not an error.
#[derive(Debug, Clone, Default)]
pub struct DetectedSignals {
    pub tax_id: Option<TaxId>,
    pub tech_stack: Vec<String>,
    pub verified_emails: Vec<String>,
}

/// The fused profile returned by the completion step. Stored as a raw JSON
/// value: the post-processor has to walk arbitrary nesting, and the schema
/// tolerates extra fields. Everything the pipeline itself reads or writes
/// goes through the typed accessors below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedProfile(pub Value);

impl EnrichedProfile {
    /// (type uppercased, value, country uppercased) from company_info.tax_id.
    pub fn tax_id(&self) -> Option<(String, Option<String>, String)> {
        let obj = self.0.get("company_info")?.get("tax_id")?.as_object()?;
        let id_type = obj
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_uppercase();
        let value = obj
            .get("value")
            .and_then(Value::as_str)
            .map(|v| v.to_string());
        let country = obj
            .get("country")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_uppercase();
        Some((id_type, value, country))
    }

    pub fn emails_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.0
            .get_mut("contact_details")?
            .get_mut("emails")?
            .as_array_mut()
    }

    pub fn phones(&self) -> Vec<String> {
        self.0
            .get("contact_details")
            .and_then(|c| c.get("phones"))
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contact_details_mut(&mut self) -> Option<&mut Map<String, Value>> {
        self.0.get_mut("contact_details")?.as_object_mut()
    }

    pub fn set_top_level(&mut self, key: &str, value: Value) {
        if let Some(obj) = self.0.as_object_mut() {
            obj.insert(key.to_string(), value);
        }
    }
}
