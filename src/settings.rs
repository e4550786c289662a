use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct SiteRules {
    #[serde(default = "default_shopping_domains")]
    pub shopping_domains: Vec<String>,
    #[serde(default = "default_url_keywords")]
    pub url_keywords: Vec<String>,
}

fn default_shopping_domains() -> Vec<String> {
    [
        "amazon",
        "ebay",
        "walmart",
        "target",
        "bestbuy",
        "etsy",
        "aliexpress",
        "alibaba",
        "costco",
        "newegg",
        "wayfair",
        "zalando",
        "rakuten",
        "shopify",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_url_keywords() -> Vec<String> {
    [
        "shop",
        "store",
        "buy",
        "cart",
        "checkout",
        "product",
        "purchase",
        "merchandise",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for SiteRules {
    fn default() -> Self {
        Self {
            shopping_domains: default_shopping_domains(),
            url_keywords: default_url_keywords(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Extraction {
    /// Upper bound on candidates per pass; pathological pages stop here.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    /// Elements with more text than this are containers, not price leaves.
    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,
    /// How far the textual fallback walks up from a text node looking for an
    /// element that passes the filter.
    #[serde(default = "default_max_ancestor_hops")]
    pub max_ancestor_hops: usize,
}

fn default_max_candidates() -> usize {
    200
}
fn default_max_text_len() -> usize {
    120
}
fn default_max_ancestor_hops() -> usize {
    6
}

impl Default for Extraction {
    fn default() -> Self {
        Self {
            max_candidates: default_max_candidates(),
            max_text_len: default_max_text_len(),
            max_ancestor_hops: default_max_ancestor_hops(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Presentation {
    #[serde(default = "default_badge_class")]
    pub badge_class: String,
}

fn default_badge_class() -> String {
    "wagelens-badge".to_string()
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            badge_class: default_badge_class(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Reprocess {
    /// Debounce window for mutation-triggered reprocessing.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    500
}

impl Default for Reprocess {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub site: SiteRules,
    #[serde(default)]
    pub extraction: Extraction,
    #[serde(default)]
    pub presentation: Presentation,
    #[serde(default)]
    pub reprocess: Reprocess,
}

impl Settings {
    /// Load settings from `config/default.toml` (optional) with
    /// `WAGELENS_`-prefixed environment overrides, e.g.
    /// `WAGELENS_REPROCESS__DEBOUNCE_MS=250`.
    pub fn new() -> Result<Self, ConfigError> {
        let config_path =
            env::var("WAGELENS_CONFIG").unwrap_or_else(|_| "config/default".to_string());

        let builder = Config::builder()
            .add_source(File::with_name(&config_path).required(false))
            .add_source(Environment::with_prefix("WAGELENS").separator("__"));

        let mut settings: Settings = builder.build()?.try_deserialize()?;

        // Comma-separated override for the domain allow-list, the simplest
        // shape to set from a shell.
        if let Ok(raw) = env::var("WAGELENS_SHOPPING_DOMAINS") {
            if let Some(list) = parse_string_list(&raw) {
                if !list.is_empty() {
                    settings.site.shopping_domains = list;
                }
            }
        }

        Ok(settings)
    }
}

fn parse_string_list(input: &str) -> Option<Vec<String>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Some(vec![]);
    }
    if trimmed.starts_with('[') {
        if let Ok(v) = serde_json::from_str::<Vec<String>>(trimmed) {
            return Some(v);
        }
    }
    let parts: Vec<String> = trimmed
        .split(',')
        .map(|s| s.trim().trim_matches('"').to_string())
        .filter(|s| !s.is_empty())
        .collect();
    Some(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.presentation.badge_class, "wagelens-badge");
        assert_eq!(settings.reprocess.debounce_ms, 500);
        assert!(settings.site.url_keywords.contains(&"checkout".to_string()));
    }

    #[test]
    fn test_parse_string_list() {
        assert_eq!(
            parse_string_list("amazon, ebay").unwrap(),
            vec!["amazon".to_string(), "ebay".to_string()]
        );
        assert_eq!(
            parse_string_list(r#"["a","b"]"#).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(parse_string_list("").unwrap().is_empty());
    }

    #[test]
    fn test_file_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "[reprocess]\ndebounce_ms = 250\n\n[presentation]\nbadge_class = \"hours-badge\"\n",
        )
        .unwrap();

        let settings: Settings = Config::builder()
            .add_source(File::from(path.as_path()))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.reprocess.debounce_ms, 250);
        assert_eq!(settings.presentation.badge_class, "hours-badge");
        // untouched sections fall back to defaults
        assert_eq!(settings.extraction.max_candidates, 200);
    }
}
