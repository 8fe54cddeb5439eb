use crate::analyzer::categorizer::{CategoryRules, MatchMode};
use crate::config::{Config, DEFAULT_API_PORT, expand_home, write_categories};
use crate::db::Database;
use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};

pub fn run_onboarding() -> Result<Config> {
    println!("──────────────────────────────────────────");
    println!("  Welcome to SiteTime onboarding.");
    println!("──────────────────────────────────────────");

    let theme = ColorfulTheme::default();
    let defaults = Config::default();

    println!("\n[1/4] API port");
    let api_port: u16 = Input::with_theme(&theme)
        .with_prompt("  Port the tracker submits entries to")
        .default(DEFAULT_API_PORT)
        .interact_text()
        .context("Failed to read API port")?;
    println!("  ✓ http://127.0.0.1:{api_port}");

    println!("\n[2/4] Database location");
    let db_input: String = Input::with_theme(&theme)
        .with_prompt("  SQLite file")
        .default(defaults.db_path.display().to_string())
        .interact_text()
        .context("Failed to read database path")?;
    let db_path = expand_home(&db_input);
    println!("  ✓ {}", db_path.display());

    println!("\n[3/4] Domain matching");
    let modes = [
        "substring (anything containing github.com matches)",
        "host suffix (only github.com and its subdomains match)",
    ];
    let selected_mode = Select::with_theme(&theme)
        .with_prompt("  How should category rules match domains?")
        .default(0)
        .items(&modes)
        .interact()
        .context("Failed to select match mode")?;
    let match_mode = if selected_mode == 1 {
        MatchMode::HostSuffix
    } else {
        MatchMode::Substring
    };

    println!("\n[4/4] Empty days");
    let fill_missing_dates = Confirm::with_theme(&theme)
        .with_prompt("  Show days without activity as zero in weekly/trend stats?")
        .default(true)
        .interact()
        .context("Failed to read empty-day preference")?;

    let config = Config {
        api_port,
        db_path,
        fill_missing_dates,
        ..defaults
    };

    config.ensure_bootstrap_files()?;
    config.save()?;
    save_match_mode(&config, match_mode)?;
    let _ = Database::open(&config.db_path)?;

    println!("\n──────────────────────────────────────────");
    println!("  Onboarding complete!");
    println!("  Run SiteTime service to start the API.");
    println!("──────────────────────────────────────────");

    Ok(config)
}

fn save_match_mode(config: &Config, match_mode: MatchMode) -> Result<()> {
    let rules = CategoryRules {
        match_mode,
        ..CategoryRules::load(&config.categories_path)?
    };

    write_categories(&config.categories_path, &rules)
}
