use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::models::Config;

pub fn load_config(path: &Path) -> Result<Config> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    validate(&config).with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let minutes = config.booking.slot_minutes;
    if minutes == 0 || minutes > 24 * 60 {
        bail!("booking.slot_minutes must be between 1 and 1440, got {minutes}");
    }
    if config.admin.username.is_empty() || config.admin.password.is_empty() {
        bail!("admin.username and admin.password must not be empty");
    }
    Ok(())
}
