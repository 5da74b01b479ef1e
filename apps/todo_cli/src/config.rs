use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use todo_core::{table_url, DEFAULT_API_ROOT, ITEMS_PER_PAGE};

pub const SETTINGS_FILE: &str = "todo_sync.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_root: String,
    pub base_id: String,
    pub table_name: String,
    pub token: String,
    pub items_per_page: usize,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.into(),
            base_id: String::new(),
            table_name: "Todos".into(),
            token: String::new(),
            items_per_page: ITEMS_PER_PAGE,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_root: Option<String>,
    base_id: Option<String>,
    table_name: Option<String>,
    token: Option<String>,
    items_per_page: Option<usize>,
    request_timeout_secs: Option<u64>,
}

impl Settings {
    pub fn table_url(&self) -> String {
        table_url(&self.api_root, &self.base_id, &self.table_name)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_id.trim().is_empty() {
            bail!("missing base id; set TODO_BASE_ID or base_id in {SETTINGS_FILE}");
        }
        if self.table_name.trim().is_empty() {
            bail!("missing table name; set TODO_TABLE_NAME or table_name in {SETTINGS_FILE}");
        }
        if self.token.trim().is_empty() {
            bail!("missing access token; set TODO_PAT or token in {SETTINGS_FILE}");
        }
        if self.items_per_page == 0 {
            bail!("items_per_page must be at least 1");
        }
        Ok(())
    }

    fn apply_file(&mut self, file: FileSettings) {
        if let Some(v) = file.api_root {
            self.api_root = v;
        }
        if let Some(v) = file.base_id {
            self.base_id = v;
        }
        if let Some(v) = file.table_name {
            self.table_name = v;
        }
        if let Some(v) = file.token {
            self.token = v;
        }
        if let Some(v) = file.items_per_page {
            self.items_per_page = v;
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
    }
}

pub fn load_settings() -> Result<Settings> {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// File values first, then environment. Later keys in each list win.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
        settings.apply_file(file_cfg);
    }

    let last_of = |keys: &[&str]| keys.iter().filter_map(|&key| env(key)).last();

    if let Some(v) = last_of(&["APP__API_ROOT"]) {
        settings.api_root = v;
    }
    if let Some(v) = last_of(&["TODO_BASE_ID", "APP__BASE_ID"]) {
        settings.base_id = v;
    }
    if let Some(v) = last_of(&["TODO_TABLE_NAME", "APP__TABLE_NAME"]) {
        settings.table_name = v;
    }
    if let Some(v) = last_of(&["TODO_PAT", "APP__PAT"]) {
        settings.token = v;
    }
    if let Some(v) = last_of(&["APP__ITEMS_PER_PAGE"]) {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.items_per_page = parsed;
        }
    }
    if let Some(v) = last_of(&["APP__REQUEST_TIMEOUT_SECS"]) {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
