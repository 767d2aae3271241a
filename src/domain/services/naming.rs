use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Top-level folders seeded into every tenant repository, one per
/// balance-sheet category.
pub const REPO_CATEGORIES: [&str; 5] = [
    "activos_corrientes",
    "activos_no_corrientes",
    "pasivos_corrientes",
    "pasivos_no_corrientes",
    "patrimonio_neto",
];

/// Prefix layout seeded into every tenant bucket. Object storage has no
/// real folders, so these become `.placeholder` objects.
pub const BUCKET_PREFIXES: [&str; 7] = [
    "data/raw/",
    "data/processed/",
    "results/balance/",
    "results/ratios/",
    "results/estados/",
    "backup/",
    "logs/",
];

pub const DEFAULT_CATEGORY: &str = "uncategorized";

const RESOURCE_PREFIX: &str = "viny";
const MAX_SLUG_LEN: usize = 24;

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "tenant".to_string()
    } else {
        slug
    }
}

/// Repository name: display-name slug plus a minute-resolution timestamp
/// so bursts of onboarding requests do not collide on the provider.
pub fn repo_logical_name(display_name: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}-{}", RESOURCE_PREFIX, slugify(display_name), at.format("%Y%m%d%H%M"))
}

/// Bucket name: slug plus a random 8-char suffix, computed once at tenant
/// creation and stored; the bucket itself is created lazily.
pub fn bucket_name(display_name: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", RESOURCE_PREFIX, slugify(display_name), &suffix[..8])
}
