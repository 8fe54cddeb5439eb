use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use url::Url;

const DEFAULT_PRODUCTIVE: &[&str] = &[
    "github.com",
    "stackoverflow.com",
    "codepen.io",
    "repl.it",
    "leetcode.com",
    "hackerrank.com",
    "coursera.org",
    "udemy.com",
    "edx.org",
    "khanacademy.org",
    "docs.google.com",
    "notion.so",
    "trello.com",
    "asana.com",
    "slack.com",
    "teams.microsoft.com",
    "zoom.us",
    "meet.google.com",
];

const DEFAULT_UNPRODUCTIVE: &[&str] = &[
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "tiktok.com",
    "snapchat.com",
    "youtube.com",
    "netflix.com",
    "twitch.tv",
    "reddit.com",
    "pinterest.com",
    "linkedin.com",
    "whatsapp.com",
    "telegram.org",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Productive,
    Unproductive,
    Neutral,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Productive,
        Category::Unproductive,
        Category::Neutral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Productive => "productive",
            Category::Unproductive => "unproductive",
            Category::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "productive" => Ok(Category::Productive),
            "unproductive" => Ok(Category::Unproductive),
            "neutral" => Ok(Category::Neutral),
            _ => bail!("Unknown category: {raw}. Expected productive|unproductive|neutral"),
        }
    }
}

/// How a rule entry is compared against a domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The domain, as given, contains `rule` anywhere. Known to be loose:
    /// `evil-github.com.attacker.net` matches `github.com`.
    #[default]
    Substring,
    /// `domain == rule` or `domain` ends with `.rule`, compared lower-cased
    /// with a leading `www.` stripped.
    HostSuffix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRules {
    #[serde(default)]
    pub match_mode: MatchMode,
    pub productive: Vec<String>,
    pub unproductive: Vec<String>,
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::default(),
            productive: DEFAULT_PRODUCTIVE.iter().map(|rule| rule.to_string()).collect(),
            unproductive: DEFAULT_UNPRODUCTIVE
                .iter()
                .map(|rule| rule.to_string())
                .collect(),
        }
    }
}

impl CategoryRules {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read categories file: {}", path.display()))?;
        let parsed: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse categories file: {}", path.display()))?;

        Ok(parsed.normalized())
    }

    /// Productive rules are checked first, so a domain matching both lists is
    /// productive. An empty domain is always neutral.
    pub fn categorize(&self, domain: &str) -> Category {
        let candidate = match self.match_mode {
            MatchMode::Substring => domain.to_string(),
            MatchMode::HostSuffix => normalize_domain(domain),
        };
        if candidate.is_empty() {
            return Category::Neutral;
        }

        let matches_any = |rules: &[String]| {
            rules
                .iter()
                .any(|rule| rule_matches(self.match_mode, &candidate, rule))
        };

        if matches_any(self.productive.as_slice()) {
            Category::Productive
        } else if matches_any(self.unproductive.as_slice()) {
            Category::Unproductive
        } else {
            Category::Neutral
        }
    }

    fn normalized(self) -> Self {
        let normalize_list = |rules: Vec<String>| {
            rules
                .iter()
                .map(|rule| normalize_domain(rule))
                .filter(|rule| !rule.is_empty())
                .collect::<Vec<_>>()
        };

        Self {
            match_mode: self.match_mode,
            productive: normalize_list(self.productive),
            unproductive: normalize_list(self.unproductive),
        }
    }
}

/// Host of `raw_url` without a leading `www.`, or an empty string when the
/// URL does not parse or has no host.
pub fn extract_domain(raw_url: &str) -> String {
    Url::parse(raw_url.trim())
        .ok()
        .and_then(|url| url.host_str().map(ToOwned::to_owned))
        .map(|host| normalize_domain(&host))
        .unwrap_or_default()
}

/// Accepts either a full URL or a bare domain.
pub fn resolve_domain(input: &str) -> String {
    if input.contains("://") {
        extract_domain(input)
    } else {
        normalize_domain(input)
    }
}

fn normalize_domain(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    if let Some(stripped) = lowered.strip_prefix("www.") {
        return stripped.to_string();
    }
    lowered
}

fn rule_matches(mode: MatchMode, domain: &str, rule: &str) -> bool {
    match mode {
        MatchMode::HostSuffix => domain == rule || domain.ends_with(&format!(".{rule}")),
        MatchMode::Substring => domain.contains(rule),
    }
}
