// Technology fingerprinting: case-insensitive substring checks over the raw
// page markup. Labels are not mutually exclusive.
const TECH_CHECKS: [(&str, &[&str]); 10] = [
    ("WordPress", &["wp-content", "generator\" content=\"wordpress"]),
    ("Wix", &["wix.com", "wix-dns"]),
    ("RD Station", &["d335luupugsy2.cloudfront.net", "rdstation"]),
    ("Shopify", &["shopify"]),
    ("Google Analytics", &["googletagmanager", "ua-", "g-"]),
    ("Facebook Pixel", &["fbevents.js"]),
    ("Hotjar", &["hotjar"]),
    ("Vercel", &["vercel"]),
    ("Next.js", &["__next"]),
    ("Nuxt.js", &["__nuxt"]),
];

pub fn detect_tech_stack(html: &str) -> Vec<String> {
    if html.is_empty() {
        return Vec::new();
    }
    let lower = html.to_lowercase();
    TECH_CHECKS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(label, _)| label.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_multiple_labels() {
        let html = r#"<link href="/wp-content/themes/x.css"><script src="https://cdn.shopify.com/x.js"></script>"#;
        let stack = detect_tech_stack(html);
        assert!(stack.contains(&"WordPress".to_string()));
        assert!(stack.contains(&"Shopify".to_string()));
    }

    #[test]
    fn match_is_case_insensitive() {
        assert_eq!(
            detect_tech_stack("<script>window.HOTJAR=1</script>"),
            vec!["Hotjar".to_string()]
        );
    }

    #[test]
    fn empty_markup_yields_empty_stack() {
        assert!(detect_tech_stack("").is_empty());
    }
}
