use serde::{Deserialize, Serialize};

/// Content-extraction options passed to the crawling capability.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub excluded_tags: Vec<String>,
    pub bypass_cache: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            excluded_tags: vec![
                "nav".to_string(),
                "footer".to_string(),
                "header".to_string(),
                "script".to_string(),
                "style".to_string(),
            ],
            bypass_cache: true,
        }
    }
}

/// Hyperlinks discovered on a page, already split by the engine into links
/// that stay on the site and links that leave it. Internal hrefs may still
/// be relative; the planner normalizes them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkSets {
    pub internal: Vec<String>,
    pub external: Vec<String>,
}

/// A successfully fetched page: rendered text, optional raw markup, and the
/// classified link sets.
#[derive(Debug, Clone)]
pub struct PageFetch {
    pub url: String,
    pub text: String,
    pub html: Option<String>,
    pub links: LinkSets,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocialPlatform {
    Instagram,
    Facebook,
    Linktree,
    Linkedin,
}

impl SocialPlatform {
    pub const ALL: [SocialPlatform; 4] = [
        SocialPlatform::Instagram,
        SocialPlatform::Facebook,
        SocialPlatform::Linktree,
        SocialPlatform::Linkedin,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::Facebook => "facebook",
            SocialPlatform::Linktree => "linktree",
            SocialPlatform::Linkedin => "linkedin",
        }
    }

    pub fn domains(&self) -> &'static [&'static str] {
        match self {
            SocialPlatform::Instagram => &["instagram.com"],
            SocialPlatform::Facebook => &["facebook.com"],
            SocialPlatform::Linktree => &["linktr.ee"],
            SocialPlatform::Linkedin => &["linkedin.com"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SocialPlatform::Instagram => "Instagram",
            SocialPlatform::Facebook => "Facebook",
            SocialPlatform::Linktree => "Linktree",
            SocialPlatform::Linkedin => "Linkedin",
        }
    }
}

/// The per-lead crawl plan: priority pages first, then the rest, plus at
/// most one recognized social URL per platform. No URL appears twice and
/// the lead's own root is never included.
#[derive(Debug, Clone, Default)]
pub struct CrawlPlan {
    pub priority_pages: Vec<String>,
    pub other_pages: Vec<String>,
    pub social_links: Vec<(SocialPlatform, String)>,
}

impl CrawlPlan {
    /// Pages in final crawl order.
    pub fn pages(&self) -> impl Iterator<Item = &String> {
        self.priority_pages.iter().chain(self.other_pages.iter())
    }

    pub fn page_count(&self) -> usize {
        self.priority_pages.len() + self.other_pages.len()
    }
}
