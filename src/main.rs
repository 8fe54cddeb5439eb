mod analyzer;
mod api;
mod cli;
mod collector;
mod config;
mod db;

use crate::analyzer::categorizer::{CategoryRules, resolve_domain};
use crate::analyzer::report::render_daily_report;
use crate::cli::onboard::run_onboarding;
use crate::cli::{Cli, Commands, ConfigCommands};
use crate::collector::pending::PendingEntries;
use crate::config::Config;
use crate::db::Database;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => {
            let _ = run_onboarding()?;
            Ok(())
        }
        Commands::Config { command } => handle_config_command(command),
        Commands::Status => handle_status(),
        Commands::Doctor => handle_doctor(),
        Commands::Service => {
            let config = load_or_default_config()?;
            run_service(config).await
        }
        Commands::Report { date, days } => handle_report(date, days),
        Commands::Rebuild => handle_rebuild(),
        Commands::Categorize { url } => handle_categorize(&url),
        Commands::Track => {
            let config = load_or_default_config()?;
            run_tracker(config).await
        }
    }
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = load_or_default_config()?;
            config.set_value(&key, &value)?;
            config.ensure_bootstrap_files()?;
            config.save()?;

            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = load_or_default_config()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn handle_status() -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;
    let today = Local::now().date_naive();
    let summary = analyzer::daily_stats(&database, today)?;

    println!("SiteTime status");
    println!("- db_path: {}", config.db_path.display());
    println!("- api_running: {}", is_port_open(config.api_port));
    println!("- entries: {}", database.entry_count()?);
    println!(
        "- last_entry_at: {}",
        database
            .latest_entry_timestamp()?
            .unwrap_or_else(|| "none".to_string())
    );
    println!(
        "- today_total: {}",
        analyzer::report::format_duration_ms(summary.total_time)
    );

    let pending = PendingEntries::new(&config.pending_path);
    println!(
        "- pending_entries: {} ({})",
        pending.load()?.len(),
        pending.path().display()
    );

    Ok(())
}

fn handle_doctor() -> Result<()> {
    let config_path = Config::config_path()?;
    let mut issues = Vec::new();

    if config_path.exists() {
        println!("[OK] config.json found: {}", config_path.display());
    } else {
        println!("[WARN] config.json not found: {}", config_path.display());
        issues.push("config missing".to_string());
    }

    let config = load_or_default_config()?;

    match Database::open(&config.db_path) {
        Ok(_) => println!("[OK] SQLite reachable: {}", config.db_path.display()),
        Err(error) => {
            println!("[WARN] SQLite check failed: {error}");
            issues.push("db unreachable".to_string());
        }
    }

    match CategoryRules::load(&config.categories_path) {
        Ok(rules) => println!(
            "[OK] category rules loaded: {} productive, {} unproductive ({:?})",
            rules.productive.len(),
            rules.unproductive.len(),
            rules.match_mode
        ),
        Err(error) => {
            println!("[WARN] category rules invalid: {error:#}");
            issues.push("categories invalid".to_string());
        }
    }

    if is_port_open(config.api_port) {
        println!("[OK] API answering on port {}", config.api_port);
    } else {
        println!(
            "[WARN] nothing listening on port {}. Run `SiteTime service`.",
            config.api_port
        );
        issues.push("api not running".to_string());
    }

    if issues.is_empty() {
        println!("doctor result: no issues");
    } else {
        println!("doctor result: {} warning(s)", issues.len());
    }

    Ok(())
}

fn handle_report(date: Option<String>, days: u32) -> Result<()> {
    let config = load_or_default_config()?;
    let target_date = parse_optional_date(date)?;
    let database = Database::open(&config.db_path)?;

    let summary = analyzer::daily_stats(&database, target_date)?;
    let domains = analyzer::top_domains(&database, target_date, days.saturating_sub(1))?;

    print!("{}", render_daily_report(&summary, &domains));
    Ok(())
}

fn handle_rebuild() -> Result<()> {
    let config = load_or_default_config()?;
    let mut database = Database::open(&config.db_path)?;
    let rebuilt = database.rebuild_summaries()?;

    println!("Rebuilt {rebuilt} daily summaries");
    Ok(())
}

fn handle_categorize(url: &str) -> Result<()> {
    let config = load_or_default_config()?;
    let rules = load_category_rules(&config)?;
    let domain = resolve_domain(url);

    println!("{} -> {}", domain, rules.categorize(&domain));
    Ok(())
}

async fn run_service(config: Config) -> Result<()> {
    config.ensure_bootstrap_files()?;
    let _ = Database::open(&config.db_path)?;

    info!("SiteTime service started");

    tokio::select! {
        api_result = api::run_server(Arc::new(config)) => {
            api_result?;
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}

async fn run_tracker(config: Config) -> Result<()> {
    config.ensure_bootstrap_files()?;
    let rules = Arc::new(load_category_rules(&config)?);
    let input = BufReader::new(tokio::io::stdin());

    tokio::select! {
        collector_result = collector::run_tab_collector(Arc::new(config), rules, input) => {
            collector_result?;
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}

fn parse_optional_date(input: Option<String>) -> Result<NaiveDate> {
    input
        .as_deref()
        .map(|date| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("Invalid date format: {date}. Example: 2026-02-18"))
        })
        .transpose()?
        .map_or_else(|| Ok(Local::now().date_naive()), Ok)
}

fn load_category_rules(config: &Config) -> Result<CategoryRules> {
    CategoryRules::load(&config.categories_path).with_context(|| {
        format!(
            "Failed to load category rules: {}",
            config.categories_path.display()
        )
    })
}

fn load_or_default_config() -> Result<Config> {
    if let Some(config) = Config::load_if_present(&Config::config_path()?)? {
        return Ok(config);
    }

    let config = Config::default();
    config.ensure_bootstrap_files()?;
    config.save()?;
    Ok(config)
}

fn is_port_open(port: u16) -> bool {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    TcpStream::connect_timeout(&addr, Duration::from_millis(250)).is_ok()
}
