// Tax-identifier extraction. A static per-country pattern table, tried in
// hint-first order with a BR fallback and a generic VAT pattern as last
// resort. Returns at most one match, never an aggregate.
use regex::Regex;

use crate::models::TaxId;

struct PatternEntry {
    country: &'static str,
    regex: Regex,
    // Some national numbers are bare digit runs; those patterns carry a
    // non-digit boundary on each side and extract capture group 1.
    group: usize,
    id_type: &'static str,
    name: &'static str,
}

pub struct TaxIdExtractor {
    entries: Vec<PatternEntry>,
    generic_vat: Regex,
}

impl TaxIdExtractor {
    pub fn new() -> Self {
        let table: [(&str, &str, usize, &str, &str); 12] = [
            (
                "BR",
                r"\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}",
                0,
                "CNPJ",
                "Cadastro Nacional da Pessoa Jurídica",
            ),
            ("US", r"\d{2}-\d{7}", 0, "EIN", "Employer Identification Number"),
            (
                "GB",
                r"(?:^|[^0-9])(\d{8})(?:$|[^0-9])",
                1,
                "Company Number",
                "UK Company Registration Number",
            ),
            (
                "AU",
                r"\d{2}\s?\d{3}\s?\d{3}\s?\d{3}",
                0,
                "ABN",
                "Australian Business Number",
            ),
            (
                "MX",
                r"[A-Z]{3,4}\d{6}[A-Z0-9]{3}",
                0,
                "RFC",
                "Registro Federal de Contribuyentes",
            ),
            (
                "AR",
                r"\d{2}-\d{8}-\d",
                0,
                "CUIT",
                "Clave Única de Identificación Tributaria",
            ),
            (
                "PT",
                r"(?:^|[^0-9])(\d{9})(?:$|[^0-9])",
                1,
                "NIF",
                "Número de Identificação Fiscal",
            ),
            (
                "DE",
                r"DE\d{9}",
                0,
                "VAT",
                "Umsatzsteuer-Identifikationsnummer",
            ),
            (
                "FR",
                r"FR\d{11}",
                0,
                "VAT",
                "Numéro de TVA intracommunautaire",
            ),
            (
                "ES",
                r"ES[A-Z0-9]\d{7}[A-Z0-9]",
                0,
                "NIF/CIF",
                "Número de Identificação Fiscal",
            ),
            ("IT", r"IT\d{11}", 0, "VAT", "Partita IVA"),
            ("CA", r"\d{9}[A-Z]{2}\d{4}", 0, "BN", "Business Number"),
        ];

        let entries = table
            .into_iter()
            .map(|(country, pattern, group, id_type, name)| PatternEntry {
                country,
                regex: Regex::new(&format!("(?i){}", pattern)).unwrap(),
                group,
                id_type,
                name,
            })
            .collect();

        Self {
            entries,
            generic_vat: Regex::new(r"[A-Z]{2}\d{9,12}").unwrap(),
        }
    }

    fn entry(&self, country: &str) -> Option<&PatternEntry> {
        self.entries.iter().find(|e| e.country == country)
    }

    fn search(entry: &PatternEntry, text: &str) -> Option<String> {
        let captures = entry.regex.captures(text)?;
        captures.get(entry.group).map(|m| m.as_str().to_string())
    }

    /// At most one identifier: the hinted country's pattern first, then the
    /// BR fallback, then a generic two-letter-prefix VAT pattern.
    pub fn extract(&self, text: &str, country_hint: Option<&str>) -> Option<TaxId> {
        if text.is_empty() {
            return None;
        }

        if let Some(hint) = country_hint {
            let hint = hint.to_uppercase();
            if let Some(entry) = self.entry(&hint) {
                if let Some(value) = Self::search(entry, text) {
                    return Some(TaxId {
                        id_type: entry.id_type.to_string(),
                        value,
                        country: hint,
                        name: entry.name.to_string(),
                    });
                }
            }
        }

        // Default entry: most of the directory data this feeds on is
        // Brazilian.
        let br = self.entry("BR").unwrap();
        if let Some(value) = Self::search(br, text) {
            return Some(TaxId {
                id_type: br.id_type.to_string(),
                value,
                country: "BR".to_string(),
                name: br.name.to_string(),
            });
        }

        let upper = text.to_uppercase();
        if let Some(m) = self.generic_vat.find(&upper) {
            let value = m.as_str().to_string();
            let country = value[..2].to_string();
            return Some(TaxId {
                id_type: "VAT".to_string(),
                value,
                country,
                name: "VAT Number".to_string(),
            });
        }

        None
    }
}

impl Default for TaxIdExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// ISO code for the country name passed on the command line.
pub fn country_code(name: &str) -> Option<&'static str> {
    let code = match name {
        "Brazil" | "Brasil" => "BR",
        "USA" | "United States" => "US",
        "France" => "FR",
        "Germany" => "DE",
        "UK" | "United Kingdom" => "GB",
        "Australia" => "AU",
        "Mexico" | "México" => "MX",
        "Argentina" => "AR",
        "Portugal" => "PT",
        "Spain" => "ES",
        "Italy" => "IT",
        "Canada" => "CA",
        _ => return None,
    };
    Some(code)
}
