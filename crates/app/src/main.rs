use std::{fs, sync::Arc};

use chrono_tz::Tz;
use ledger::{ExpenseDraft, FilterSpec, LiveLedger, MemoryBackend, expenses, remote::Session};
use serde::Deserialize;

use crate::{
    config::AppConfig,
    error::{AppError, Result},
};

mod config;
mod error;

/// One entry of the seed file.
#[derive(Debug, Deserialize)]
struct SeedExpense {
    description: String,
    value: String,
    date: String,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (settings, filters) = config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "gastos={level},ledger={level}",
            level = settings.level
        ))
        .init();

    if let Err(err) = run(settings, filters).await {
        tracing::error!("{err}");
        return Err(err.into());
    }
    Ok(())
}

async fn run(settings: AppConfig, filters: config::Filters) -> Result<()> {
    let timezone: Tz = settings
        .timezone
        .parse()
        .map_err(|_| AppError::Timezone(settings.timezone.clone()))?;

    let backend = Arc::new(MemoryBackend::new());
    let session = open_session(backend.as_ref(), &settings)?;

    if let Some(path) = &settings.seed {
        let written = seed(&backend, &session, path, timezone)?;
        tracing::info!("seeded {written} expenses from {path}");
    }

    let mut live = LiveLedger::start(Arc::clone(&backend), session.owner.clone(), timezone).await?;
    live.drain().await?;
    live.set_filter(FilterSpec::from_inputs(&filters.value, &filters.date));

    let view = live.view().await;
    for record in &view.visible {
        println!("{record}");
    }
    println!("Total: R$ {}", view.total_display());

    live.stop().await;
    ledger::sign_out(backend.as_ref(), &session)?;
    Ok(())
}

/// Registers the configured account on the fresh backend, then logs in with
/// the configured credentials.
fn open_session(backend: &MemoryBackend, settings: &AppConfig) -> Result<Session> {
    let registered = ledger::register(
        backend,
        &settings.name,
        &settings.phone,
        &settings.email,
        &settings.password,
    )?;
    ledger::sign_out(backend, &registered)?;
    Ok(ledger::sign_in(backend, &settings.email, &settings.password)?)
}

fn seed(backend: &MemoryBackend, session: &Session, path: &str, timezone: Tz) -> Result<usize> {
    let raw = fs::read_to_string(path)?;
    let entries: Vec<SeedExpense> = serde_json::from_str(&raw)?;

    let mut written = 0;
    for entry in entries {
        match ExpenseDraft::parse(&entry.description, &entry.value, &entry.date) {
            Ok(draft) => {
                expenses::create(backend, session, &draft, timezone)?;
                written += 1;
            }
            Err(err) => tracing::warn!("skipping seed entry {:?}: {err}", entry.description),
        }
    }
    Ok(written)
}
