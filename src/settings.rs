use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::availability::{parse_date, parse_weekday, weekday_key};
use crate::error::BookingError;
use crate::models::{Settings, WeeklyHours};

/// Read/write access to the weekly-hours + holidays document.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<Settings>;
    async fn save(&self, settings: &Settings) -> Result<()>;
}

/// Validate an admin-supplied settings document: holidays must be real dates.
/// Returns the document with holidays canonical, sorted and deduplicated.
pub fn sanitize(mut settings: Settings) -> crate::error::Result<Settings> {
    let mut holidays = Vec::with_capacity(settings.holidays.len());
    for h in &settings.holidays {
        let (_, canon) = parse_date(h)
            .map_err(|_| BookingError::invalid(format!("Data di ferie non valida: '{h}'")))?;
        holidays.push(canon);
    }
    holidays.sort();
    holidays.dedup();
    settings.holidays = holidays;

    let mut weekly = WeeklyHours::new();
    for (day, hours) in settings.weekly {
        let key = parse_weekday(&day)
            .map(weekday_key)
            .ok_or_else(|| BookingError::invalid(format!("Giorno sconosciuto: '{day}'")))?;
        if hours.open && hours.start >= hours.end {
            warn!("Settings: {} opens at {} but closes at {}", key, hours.start, hours.end);
        }
        weekly.insert(key.to_string(), hours);
    }
    settings.weekly = weekly;
    Ok(settings)
}

/// Settings persisted as a pretty-printed JSON file. The file is created with
/// defaults on first access.
pub struct JsonFileSettings {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Parse a stored document, normalising it the same way an admin update is.
    fn parse(&self, contents: &str) -> Result<Settings> {
        let settings = serde_json::from_str(contents)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        sanitize(settings).with_context(|| format!("Invalid settings in {}", self.path.display()))
    }

    async fn write(&self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_string_pretty(settings)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for JsonFileSettings {
    async fn load(&self) -> Result<Settings> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => self.parse(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let _guard = self.write_lock.lock().await;
                // Another request may have created it while we waited.
                if let Ok(contents) = tokio::fs::read_to_string(&self.path).await {
                    return self.parse(&contents);
                }
                let defaults = Settings::default();
                self.write(&defaults).await?;
                info!("Settings: created defaults at {}", self.path.display());
                Ok(defaults)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        }
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(settings).await
    }
}

/// In-process settings, starting from the defaults.
#[cfg(test)]
#[derive(Default)]
pub struct MemorySettings {
    inner: std::sync::RwLock<Settings>,
}

#[cfg(test)]
#[async_trait]
impl SettingsStore for MemorySettings {
    async fn load(&self) -> Result<Settings> {
        self.inner
            .read()
            .map(|s| s.clone())
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        *guard = settings.clone();
        Ok(())
    }
}
