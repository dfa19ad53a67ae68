use clap::Parser;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/gastos";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub level: String,
    pub timezone: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    /// JSON file with the expenses written before the ledger starts.
    pub seed: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            timezone: "UTC".to_string(),
            name: "Demo".to_string(),
            phone: "0000-0000".to_string(),
            email: "demo@example.com".to_string(),
            password: "demo-password".to_string(),
            seed: None,
        }
    }
}

/// Filters typed on the command line.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub value: String,
    pub date: String,
}

#[derive(Debug, Parser)]
#[command(name = "gastos", about = "Lists and totals expenses from a live ledger")]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override log level.
    #[arg(long)]
    level: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long)]
    timezone: Option<String>,
    /// Override the seed file.
    #[arg(long)]
    seed: Option<String>,
    /// Amount filter, e.g. `>50`, `<30` or `20`.
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    value: String,
    /// Date filter, a piece of `YYYY-MM-DD`, e.g. `2025-05`.
    #[arg(long, default_value = "")]
    date: String,
}

pub fn load() -> Result<(AppConfig, Filters)> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("GASTOS"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(level) = args.level {
        settings.level = level;
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }
    if let Some(seed) = args.seed {
        settings.seed = Some(seed);
    }

    Ok((
        settings,
        Filters {
            value: args.value,
            date: args.date,
        },
    ))
}
