use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CampusError, Result};

/// Top-level configuration for the campusbot client.
///
/// Loaded from `~/.campusbot/config.toml` by default. Every section is
/// optional; missing sections and fields fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampusConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub suggestions: SuggestionsConfig,
    #[serde(default)]
    pub links: LinksConfig,
}

impl CampusConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CampusConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CampusError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the local store (session + suggestions).
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.campusbot/data".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the chatbot server, without a trailing `/api`.
    pub base_url: String,
    /// Header carrying the session token on authenticated calls.
    pub token_header: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            token_header: "X-Session-Token".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Chat flow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Minimum overlap score for an offline FAQ answer.
    pub offline_threshold: f64,
    /// Lower threshold used for quick-access questions.
    pub quick_access_threshold: f64,
    /// Longest message accepted, in characters.
    pub max_message_length: usize,
    /// Preset questions offered as quick-access shortcuts.
    pub quick_access: Vec<String>,
    /// Queries always offered by autocomplete.
    pub builtin_suggestions: Vec<String>,
    /// First bot message shown in an empty chat.
    pub greeting: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            offline_threshold: 0.35,
            quick_access_threshold: 0.15,
            max_message_length: 2000,
            quick_access: [
                "admission process",
                "courses offered",
                "fee structure",
                "placement record",
                "hostel facilities",
                "contact details",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            builtin_suggestions: [
                "admission process",
                "how to apply for admission",
                "required documents for admission",
                "courses offered at mmec",
                "fee structure for b.tech",
                "scholarships available",
                "placement record",
                "top recruiters",
                "contact details for admissions",
                "hostel facilities",
                "campus facilities",
                "student life",
                "college website",
                "management",
                "fee payment",
                "results",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            greeting: "Hello! 👋 How can I help you with MMEC information today?".to_string(),
        }
    }
}

/// History paging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Page size for the in-chat "load earlier" pager.
    pub page_size: u32,
    /// Page size for the standalone history listing.
    pub listing_size: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            listing_size: 200,
        }
    }
}

/// Persisted query suggestions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionsConfig {
    /// Maximum number of remembered queries.
    pub cap: usize,
    /// Maximum number of autocomplete entries returned.
    pub autocomplete_limit: usize,
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            cap: 100,
            autocomplete_limit: 8,
        }
    }
}

/// Follow-up link rules: when the user asks for "the website link", the
/// previous bot message decides which site is meant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    pub rules: Vec<LinkRule>,
}

/// A single follow-up link rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRule {
    /// Case-insensitive substrings looked for in the last bot message.
    pub keywords: Vec<String>,
    /// Answer returned when any keyword matches.
    pub answer: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            rules: vec![
                LinkRule {
                    keywords: vec!["vtu".to_string()],
                    answer: "VTU official website: https://vtu.ac.in".to_string(),
                },
                LinkRule {
                    keywords: vec![
                        "mmec".to_string(),
                        "college website".to_string(),
                        "mmec.edu".to_string(),
                    ],
                    answer: "Visit our website: https://www.mmec.edu.in".to_string(),
                },
            ],
        }
    }
}
