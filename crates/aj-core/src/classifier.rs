//! Article Classifier
//!
//! Decides from the URL alone whether a page is a specific piece of
//! content or a homepage/section/utility page. Rules run in a fixed order
//! and the first one that fires decides; a non-article verdict from the
//! path tables is never overridden by a later article signal.
//!
//! Unparsable URLs classify as articles.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::types::PageClassification;
use crate::url::{path_segments, NavigationUrl};

// =============================================================================
// Path Tables
// =============================================================================

/// Paths that always denote the site root.
const HOMEPAGE_PATHS: &[&str] = &["", "/", "/index.html", "/index.php"];

/// Prefixes of subscription, account, legal, search, feed, jobs,
/// advertising and event pages.
pub const NON_ARTICLE_PREFIXES: &[&str] = &[
    "/subscribe", "/subscription", "/pricing", "/plans", "/login", "/signup",
    "/register", "/account", "/profile", "/settings", "/preferences",
    "/about", "/contact", "/help", "/support", "/faq", "/terms", "/privacy",
    "/search", "/archive", "/sitemap", "/rss", "/feed",
    "/newsletter", "/newsletters", "/email-signup",
    "/jobs", "/careers", "/work-with-us",
    "/advertise", "/advertising", "/media-kit",
    "/events", "/conferences", "/webinars",
];

/// Bare section indexes.
pub const SECTION_PAGES: &[&str] = &[
    "/business", "/tech", "/technology", "/science", "/health", "/sports",
    "/politics", "/world", "/opinion", "/style", "/food", "/travel",
    "/culture", "/arts", "/books", "/movies", "/tv", "/music",
    "/fashion", "/lifestyle", "/education", "/environment", "/climate",
];

/// Substrings that mark a path as editorial content.
pub const ARTICLE_KEYWORDS: &[&str] = &[
    "article", "story", "news", "post", "blog", "feature",
    "analysis", "opinion", "editorial", "commentary", "review",
    "interview", "profile", "investigation", "report",
];

const DATE_PATTERN: &str = r"/[0-9]{4}/[0-9]{2}/[0-9]{2}/";

/// Site key (matched as a hostname substring) and its article path patterns.
const SITE_PATTERN_SOURCES: &[(&str, &[&str])] = &[
    ("nytimes.com", &[DATE_PATTERN, r"/article/", r"/interactive/"]),
    ("wsj.com", &[r"/articles/", r"/story/"]),
    ("washingtonpost.com", &[DATE_PATTERN, r"/news/", r"/opinions/"]),
    ("bloomberg.com", &[r"/news/articles/", r"/opinion/"]),
    ("ft.com", &[r"/content/", r"/story/"]),
    ("economist.com", &[DATE_PATTERN, r"/articles?/", r"/briefing/"]),
    ("theatlantic.com", &[r"/archive/", r"/article/"]),
    ("newyorker.com", &[r"/magazine/", r"/news/", r"/culture/"]),
    ("wired.com", &[r"/story/", r"/article/"]),
    ("techcrunch.com", &[DATE_PATTERN, r"/article/"]),
];

/// Compiled site table, built once on first use.
pub struct SitePatterns {
    pub site: &'static str,
    pub patterns: Vec<Regex>,
}

static SITE_PATTERNS: Lazy<Vec<SitePatterns>> = Lazy::new(|| {
    SITE_PATTERN_SOURCES
        .iter()
        .map(|&(site, sources)| SitePatterns {
            site,
            patterns: sources
                .iter()
                .map(|source| Regex::new(source).expect("site article pattern"))
                .collect(),
        })
        .collect()
});

static YEAR_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"20[2-3][0-9]").expect("YEAR_TOKEN regex"));
static SLUG_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]+-[a-z]+").expect("SLUG_TOKEN regex"));

/// Paths longer than this fall back to article.
const FALLBACK_MIN_PATH_LEN: usize = 20;
/// Paths with at least this many segments fall back to article.
const FALLBACK_MIN_SEGMENTS: usize = 3;
/// Generic heuristics only apply from this many segments on.
const HEURISTIC_MIN_SEGMENTS: usize = 2;

// =============================================================================
// Verdict
// =============================================================================

/// Which rule produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    /// URL could not be parsed
    Unparsable,
    /// Root or index page
    Homepage,
    /// Subscription/account/legal/... prefix
    NonArticlePath,
    /// Bare section index
    SectionIndex,
    /// Site-specific pattern table
    SitePattern,
    /// 2020s year in the path
    YearToken,
    /// Hyphenated slug in the path
    SlugToken,
    /// Editorial keyword in the path
    Keyword,
    /// Segment count / length fallback
    Fallback,
}

/// Classification plus the rule that decided it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub classification: PageClassification,
    pub rule: Rule,
}

impl Verdict {
    fn article(rule: Rule) -> Self {
        Self { classification: PageClassification::Article, rule }
    }

    fn non_article(rule: Rule) -> Self {
        Self { classification: PageClassification::NonArticle, rule }
    }

    #[inline]
    pub fn is_article(&self) -> bool {
        self.classification.is_article()
    }
}

// =============================================================================
// Classification
// =============================================================================

/// True if the URL points at a specific piece of content.
#[inline]
pub fn is_article_page(url: &str) -> bool {
    classify(url).is_article()
}

/// Classify a URL and report the deciding rule.
pub fn classify(url: &str) -> Verdict {
    let verdict = match NavigationUrl::parse(url) {
        Some(parsed) => classify_parts(&parsed.host, &parsed.path),
        None => Verdict::article(Rule::Unparsable),
    };
    log::trace!("classify {} -> {:?} ({:?})", url, verdict.classification, verdict.rule);
    verdict
}

/// Classify an already lowercased host and path.
pub fn classify_parts(host: &str, path: &str) -> Verdict {
    if HOMEPAGE_PATHS.contains(&path) {
        return Verdict::non_article(Rule::Homepage);
    }

    if NON_ARTICLE_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return Verdict::non_article(Rule::NonArticlePath);
    }

    let bare = path.strip_suffix('/').unwrap_or(path);
    if SECTION_PAGES.contains(&bare) {
        return Verdict::non_article(Rule::SectionIndex);
    }

    if matches_site_pattern(host, path) {
        return Verdict::article(Rule::SitePattern);
    }

    let segment_count = path_segments(path).count();

    if segment_count >= HEURISTIC_MIN_SEGMENTS {
        if YEAR_TOKEN.is_match(path) {
            return Verdict::article(Rule::YearToken);
        }
        if SLUG_TOKEN.is_match(path) {
            return Verdict::article(Rule::SlugToken);
        }
        if ARTICLE_KEYWORDS.iter().any(|keyword| path.contains(keyword)) {
            return Verdict::article(Rule::Keyword);
        }
    }

    if segment_count >= FALLBACK_MIN_SEGMENTS || path.len() > FALLBACK_MIN_PATH_LEN {
        Verdict::article(Rule::Fallback)
    } else {
        Verdict::non_article(Rule::Fallback)
    }
}

/// Site table lookup. Sites are keyed by substring of the host.
fn matches_site_pattern(host: &str, path: &str) -> bool {
    SITE_PATTERNS
        .iter()
        .filter(|entry| host.contains(entry.site))
        .any(|entry| entry.patterns.iter().any(|pattern| pattern.is_match(path)))
}

/// The compiled site pattern table.
pub fn site_patterns() -> &'static [SitePatterns] {
    &SITE_PATTERNS
}
