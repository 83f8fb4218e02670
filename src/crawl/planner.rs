// Crawl planner: turns the home page's link sets into a deduplicated,
// priority-ordered page list plus one recognized social URL per platform.
use std::collections::HashSet;

use tracing::debug;

use crate::crawl::types::{CrawlPlan, LinkSets, SocialPlatform};

/// Path keywords marking high-value internal pages. Ordered; the first
/// matching category wins, though category identity only decides inclusion,
/// not a finer priority tier.
const PRIORITY_KEYWORDS: [(&str, &[&str]); 3] = [
    ("contact", &["contato", "contact", "fale", "atendimento"]),
    (
        "about",
        &[
            "sobre",
            "about",
            "quem-somos",
            "institucional",
            "empresa",
            "imobiliaria",
        ],
    ),
    (
        "services",
        &["servicos", "services", "produtos", "products", "imoveis"],
    ),
];

/// Resolves a discovered href against the base URL. Absolute links pass
/// through untouched, which also makes the function idempotent. Relative
/// links are joined with exactly one slash at the boundary.
pub fn normalize_url(link: &str, base: &str) -> String {
    if link.starts_with("http") {
        return link.to_string();
    }
    match (base.ends_with('/'), link.starts_with('/')) {
        (false, false) => format!("{}/{}", base, link),
        (true, true) => format!("{}{}", base, &link[1..]),
        _ => format!("{}{}", base, link),
    }
}

fn is_priority(href: &str) -> bool {
    let lower = href.to_lowercase();
    for (_category, words) in PRIORITY_KEYWORDS {
        if words.iter().any(|w| lower.contains(w)) {
            return true;
        }
    }
    false
}

/// Builds the crawl plan for one lead. `max_pages` of 0 means unlimited.
pub fn build_plan(base_url: &str, links: &LinkSets, max_pages: usize) -> CrawlPlan {
    let mut seen: HashSet<String> = HashSet::new();
    let mut plan = CrawlPlan::default();
    let root = base_url.trim_end_matches('/');

    for href in &links.internal {
        if href.is_empty() {
            continue;
        }
        let full_url = normalize_url(href, base_url);
        if full_url.trim_end_matches('/') == root || !seen.insert(full_url.clone()) {
            continue;
        }
        if is_priority(href) {
            plan.priority_pages.push(full_url);
        } else {
            plan.other_pages.push(full_url);
        }
    }

    for href in &links.external {
        let lower = href.to_lowercase();
        for platform in SocialPlatform::ALL {
            if plan.social_links.iter().any(|(p, _)| *p == platform) {
                continue;
            }
            if platform.domains().iter().any(|d| lower.contains(d)) {
                debug!("Found {} link: {}", platform.key(), href);
                plan.social_links.push((platform, href.clone()));
            }
        }
    }

    if max_pages > 0 && plan.page_count() > max_pages {
        let keep_other = max_pages.saturating_sub(plan.priority_pages.len());
        plan.other_pages.truncate(keep_other);
        plan.priority_pages.truncate(max_pages);
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(internal: &[&str], external: &[&str]) -> LinkSets {
        LinkSets {
            internal: internal.iter().map(|s| s.to_string()).collect(),
            external: external.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn normalize_inserts_missing_slash() {
        assert_eq!(
            normalize_url("contato", "http://acme.com"),
            "http://acme.com/contato"
        );
    }

    #[test]
    fn normalize_drops_duplicate_slash() {
        assert_eq!(
            normalize_url("/contato", "http://acme.com/"),
            "http://acme.com/contato"
        );
    }

    #[test]
    fn normalize_concatenates_single_slash() {
        assert_eq!(
            normalize_url("/contato", "http://acme.com"),
            "http://acme.com/contato"
        );
        assert_eq!(
            normalize_url("contato", "http://acme.com/"),
            "http://acme.com/contato"
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_url("contato", "http://acme.com");
        assert_eq!(normalize_url(&once, "http://acme.com"), once);
    }

    #[test]
    fn plan_excludes_root_and_duplicates() {
        let plan = build_plan(
            "http://acme.com",
            &links(
                &["/", "/sobre", "/sobre", "http://acme.com/", "/precos"],
                &[],
            ),
            0,
        );
        let pages: Vec<&String> = plan.pages().collect();
        assert_eq!(pages.len(), 2);
        assert!(!pages.iter().any(|p| p.trim_end_matches('/') == "http://acme.com"));
    }

    #[test]
    fn priority_pages_come_first_in_seen_order() {
        let plan = build_plan(
            "http://acme.com",
            &links(&["/blog", "/contato", "/precos", "/sobre"], &[]),
            0,
        );
        assert_eq!(
            plan.priority_pages,
            vec!["http://acme.com/contato", "http://acme.com/sobre"]
        );
        assert_eq!(
            plan.other_pages,
            vec!["http://acme.com/blog", "http://acme.com/precos"]
        );
    }

    #[test]
    fn one_social_link_per_platform_first_wins() {
        let plan = build_plan(
            "http://acme.com",
            &links(
                &[],
                &[
                    "https://instagram.com/acme",
                    "https://instagram.com/acme_other",
                    "https://linkedin.com/company/acme",
                ],
            ),
            0,
        );
        assert_eq!(plan.social_links.len(), 2);
        assert_eq!(
            plan.social_links[0],
            (SocialPlatform::Instagram, "https://instagram.com/acme".to_string())
        );
    }

    #[test]
    fn page_cap_keeps_priority_pages() {
        let plan = build_plan(
            "http://acme.com",
            &links(&["/a", "/b", "/contato", "/c", "/sobre"], &[]),
            3,
        );
        assert_eq!(plan.page_count(), 3);
        assert_eq!(plan.priority_pages.len(), 2);
        assert_eq!(plan.other_pages, vec!["http://acme.com/a"]);
    }
}
