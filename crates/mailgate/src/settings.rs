//! Settings that persist across sessions.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mailgate_core::BackendKind;
use mailgate_login::Provider;
use serde::{Deserialize, Serialize};

/// Email used when the login form was left empty.
pub const DEFAULT_FALLBACK_EMAIL: &str = "uzivatel@email.cz";

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where the session is stored.
    pub backend: BackendKind,
    /// Session file for [`BackendKind::File`]; defaults to the data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_store_path: Option<PathBuf>,
    /// Identity provider.
    pub provider: Provider,
    /// Email logged in when the form was left empty.
    pub fallback_email: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            file_store_path: None,
            provider: Provider::seznam(),
            fallback_email: Some(DEFAULT_FALLBACK_EMAIL.to_string()),
        }
    }
}

impl Settings {
    /// Session file used by the file backend.
    #[must_use]
    pub fn session_file(&self) -> PathBuf {
        self.file_store_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("mailgate")
                .join("session.json")
        })
    }
}

/// Default settings file location.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailgate")
        .join("settings.json")
}

/// Load application settings from file.
///
/// A missing file yields the defaults.
pub async fn load_settings(path: &Path) -> Result<Settings> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(Settings::default());
    }

    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    let settings: Settings = serde_json::from_str(&contents)
        .with_context(|| format!("parsing {}", path.display()))?;
    settings
        .provider
        .validate()
        .with_context(|| format!("provider in {}", path.display()))?;
    Ok(settings)
}

/// Save application settings to file.
pub async fn save_settings(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
    }

    let contents = serde_json::to_string_pretty(settings)?;
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("writing {}", path.display()))?;

    tracing::info!("Settings saved to {:?}", path);
    Ok(())
}
