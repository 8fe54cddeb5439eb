use crate::analyzer::categorizer::CategoryRules;
use anyhow::{Context, Result, anyhow, bail};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".SiteTime";
const CONFIG_FILE: &str = "config.json";
const CATEGORIES_FILE: &str = "categories.json";
const PENDING_FILE: &str = "pending.jsonl";
pub const DEFAULT_API_PORT: u16 = 3000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: PathBuf,
    pub categories_path: PathBuf,
    /// Entries the tracker could not submit, one JSON object per line.
    pub pending_path: PathBuf,
    pub api_port: u16,
    pub server_url: Option<String>,
    pub fill_missing_dates: bool,
}

impl Default for Config {
    fn default() -> Self {
        let root = default_root_dir();

        Self {
            db_path: root.join("db").join("sitetime.db"),
            categories_path: root.join(CATEGORIES_FILE),
            pending_path: root.join(PENDING_FILE),
            api_port: DEFAULT_API_PORT,
            server_url: None,
            fill_missing_dates: true,
        }
    }
}

impl Config {
    pub fn root_dir() -> Result<PathBuf> {
        Ok(default_root_dir())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(default_root_dir().join(CONFIG_FILE))
    }

    /// `None` when no config file exists yet. A file that exists but does not
    /// parse is an error, so a typo never gets replaced by defaults.
    pub fn load_if_present(config_path: &Path) -> Result<Option<Self>> {
        if !config_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        serde_json::from_str(&content)
            .map(Some)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        set_mode_600(&config_path)?;

        Ok(())
    }

    pub fn ensure_bootstrap_files(&self) -> Result<()> {
        let root = Self::root_dir()?;
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create root directory: {}", root.display()))?;

        if let Some(parent) = self.db_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        write_default_categories(&self.categories_path)
    }

    /// Base URL the tab tracker submits entries to.
    pub fn server_base_url(&self) -> String {
        self.server_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", self.api_port))
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match normalize_config_key(key) {
            "db_path" => {
                self.db_path = expand_home(value.trim());
            }
            "categories_path" => {
                self.categories_path = expand_home(value.trim());
            }
            "pending_path" => {
                self.pending_path = expand_home(value.trim());
            }
            "api_port" => {
                self.api_port = value
                    .trim()
                    .parse::<u16>()
                    .map_err(|_| anyhow!("api_port must be a number"))?;
            }
            "server_url" => {
                let trimmed = value.trim().trim_end_matches('/');
                if !trimmed.is_empty() && url::Url::parse(trimmed).is_err() {
                    bail!("server_url must be an absolute URL, e.g. http://127.0.0.1:3000");
                }
                self.server_url = (!trimmed.is_empty()).then(|| trimmed.to_string());
            }
            "fill_missing_dates" => {
                self.fill_missing_dates = value
                    .trim()
                    .parse::<bool>()
                    .map_err(|_| anyhow!("fill_missing_dates must be true/false"))?;
            }
            _ => {
                bail!(
                    "Unsupported config key: {key}. Supported keys: db_path|db.path, categories_path|categories.path, pending_path|tracker.pending_path, api_port|api.port, server_url|server.url, fill_missing_dates|stats.fill_missing_dates"
                );
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        match normalize_config_key(key) {
            "db_path" => Some(self.db_path.display().to_string()),
            "categories_path" => Some(self.categories_path.display().to_string()),
            "pending_path" => Some(self.pending_path.display().to_string()),
            "api_port" => Some(self.api_port.to_string()),
            "server_url" => Some(self.server_base_url()),
            "fill_missing_dates" => Some(self.fill_missing_dates.to_string()),
            _ => None,
        }
    }
}

fn normalize_config_key(key: &str) -> &str {
    match key {
        "db_path" | "db.path" => "db_path",
        "categories_path" | "categories.path" => "categories_path",
        "pending_path" | "tracker.pending_path" => "pending_path",
        "api_port" | "api.port" => "api_port",
        "server_url" | "server.url" => "server_url",
        "fill_missing_dates" | "stats.fill_missing_dates" => "fill_missing_dates",
        _ => key,
    }
}

pub fn write_default_categories(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }

    write_categories(path, &CategoryRules::default())
}

pub fn write_categories(path: &Path, rules: &CategoryRules) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create categories directory: {}", parent.display())
        })?;
    }

    let content =
        serde_json::to_string_pretty(rules).context("Failed to serialize categories JSON")?;
    fs::write(path, content)
        .with_context(|| format!("Failed to save categories file: {}", path.display()))?;
    set_mode_600(path)
}

pub fn expand_home(raw: &str) -> PathBuf {
    raw.strip_prefix("~/")
        .and_then(|stripped| home_dir().map(|home| home.join(stripped)))
        .unwrap_or_else(|| PathBuf::from(raw))
}

fn default_root_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn set_mode_600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set file permissions: {}", path.display()))?;
    }

    Ok(())
}
