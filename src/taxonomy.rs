// src/taxonomy.rs
//! Injected taxonomy: record defaults, link keywords and the keyword tables
//! behind category / resource-type / subject classification.
//!
//! Loaded from TOML (`config/taxonomy.toml` unless `TAXONOMY_CONFIG_PATH` says
//! otherwise). A copy of the default file is compiled in, so the extractor
//! works without any file on disk.

use anyhow::{anyhow, bail, Context};
use chrono::NaiveTime;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

// --- env defaults & names ---
pub const DEFAULT_TAXONOMY_CONFIG_PATH: &str = "config/taxonomy.toml";
pub const ENV_TAXONOMY_CONFIG_PATH: &str = "TAXONOMY_CONFIG_PATH";
pub const ENV_TAXONOMY_HOT_RELOAD: &str = "TAXONOMY_HOT_RELOAD";

static EMBEDDED: Lazy<Taxonomy> = Lazy::new(|| {
    let raw = include_str!("../config/taxonomy.toml");
    Taxonomy::from_toml_str(raw).expect("valid embedded taxonomy")
});

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub defaults: Defaults,
    #[serde(default)]
    pub links: LinkCfg,
    pub categories: KeywordTable,
    pub resource_types: KeywordTable,
    pub subjects: KeywordTable,
}

/// Values the validator falls back to when a field is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    pub event_title: String,
    pub resource_title: String,
    pub description: String,
    pub location: String,
    /// `HH:MM`
    pub time: String,
    /// Missing dates become `today + date_offset_days`.
    pub date_offset_days: i64,
    pub resource_url_base: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkCfg {
    /// Words near a URL that mark it as a registration link.
    #[serde(default = "default_registration_keywords")]
    pub registration_keywords: Vec<String>,
}

impl Default for LinkCfg {
    fn default() -> Self {
        Self {
            registration_keywords: default_registration_keywords(),
        }
    }
}

fn default_registration_keywords() -> Vec<String> {
    ["register", "registration", "sign up", "join", "enroll", "apply"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// An ordered enumeration with signal keywords per member.
/// `fallback` must itself be one of the members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordTable {
    pub fallback: String,
    pub classes: Vec<KeywordClass>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordClass {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl KeywordTable {
    /// Member names in configured order.
    pub fn names(&self) -> Vec<&str> {
        self.classes.iter().map(|c| c.name.as_str()).collect()
    }

    /// Case-insensitive membership; returns the canonical spelling.
    pub fn member(&self, value: &str) -> Option<&str> {
        let v = value.trim();
        self.classes
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(v))
            .map(|c| c.name.as_str())
    }

    fn validate(&self, table: &str) -> anyhow::Result<()> {
        if self.classes.is_empty() {
            bail!("taxonomy table `{table}` has no members");
        }
        let mut seen = HashSet::new();
        for c in &self.classes {
            let key = c.name.trim().to_lowercase();
            if key.is_empty() {
                bail!("taxonomy table `{table}` has a member with an empty name");
            }
            if !seen.insert(key) {
                bail!("taxonomy table `{table}` lists `{}` twice", c.name);
            }
        }
        if self.member(&self.fallback).is_none() {
            bail!(
                "taxonomy table `{table}`: fallback `{}` is not one of its members",
                self.fallback
            );
        }
        Ok(())
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        EMBEDDED.clone()
    }
}

impl Taxonomy {
    /// Load from a TOML file. Uses TAXONOMY_CONFIG_PATH or defaults to "config/taxonomy.toml".
    pub fn from_toml() -> anyhow::Result<Self> {
        Self::from_path(&config_path_from_env())
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read taxonomy config at {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid taxonomy config at {}", path.display()))
    }

    /// Parse and validate a TOML string.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let tax: Taxonomy = toml::from_str(toml_str)?;
        tax.validate()?;
        Ok(tax)
    }

    /// Reject anything that would let a record leave the validator
    /// with an empty required field or an out-of-enum value.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.categories.validate("categories")?;
        self.resource_types.validate("resource_types")?;
        self.subjects.validate("subjects")?;

        let d = &self.defaults;
        for (name, value) in [
            ("event_title", &d.event_title),
            ("resource_title", &d.resource_title),
            ("description", &d.description),
            ("location", &d.location),
        ] {
            if value.trim().is_empty() {
                bail!("defaults.{name} must not be empty");
            }
        }
        let t = NaiveTime::parse_from_str(d.time.trim(), "%H:%M")
            .map_err(|e| anyhow!("defaults.time `{}` is not HH:MM: {}", d.time, e))?;
        if t.format("%H:%M").to_string() != d.time {
            bail!("defaults.time `{}` must be zero-padded HH:MM", d.time);
        }
        if !(0..=366).contains(&d.date_offset_days) {
            bail!(
                "defaults.date_offset_days must be within 0..=366, got {}",
                d.date_offset_days
            );
        }
        let base = url::Url::parse(&d.resource_url_base)
            .map_err(|e| anyhow!("defaults.resource_url_base is not a URL: {e}"))?;
        if base.host_str().is_none() {
            bail!("defaults.resource_url_base needs a host");
        }
        Ok(())
    }
}

/// TAXONOMY_CONFIG_PATH, or the default path.
pub fn config_path_from_env() -> PathBuf {
    std::env::var(ENV_TAXONOMY_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_TAXONOMY_CONFIG_PATH))
}

/* ----------------------------
Thread-safe handle + hot reload
---------------------------- */

/// Shared, swappable taxonomy. Readers take a cheap `Arc` snapshot, so a
/// reload never changes the tables underneath an extraction in flight.
#[derive(Clone, Debug)]
pub struct TaxonomyHandle {
    inner: Arc<RwLock<Arc<Taxonomy>>>,
}

impl TaxonomyHandle {
    pub fn new(taxonomy: Taxonomy) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(taxonomy))),
        }
    }

    /// Load from TAXONOMY_CONFIG_PATH; fall back to the embedded default when the
    /// file is missing. A file that exists but is invalid is an error.
    pub fn from_env() -> anyhow::Result<Self> {
        let path = config_path_from_env();
        if !path.exists() {
            warn!(path = %path.display(), "taxonomy config not found, using embedded default");
            return Ok(Self::new(Taxonomy::default()));
        }
        Ok(Self::new(Taxonomy::from_path(&path)?))
    }

    pub fn current(&self) -> Arc<Taxonomy> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, taxonomy: Taxonomy) {
        match self.inner.write() {
            Ok(mut guard) => *guard = Arc::new(taxonomy),
            Err(poisoned) => *poisoned.into_inner() = Arc::new(taxonomy),
        }
    }
}

/// Returns true if we should enable hot reload (dev/local only).
fn hot_reload_enabled() -> bool {
    let want = std::env::var(ENV_TAXONOMY_HOT_RELOAD)
        .ok()
        .map(|v| v == "1")
        .unwrap_or(false);
    if !want {
        return false;
    }
    cfg!(debug_assertions) || crate::text::is_dev_env()
}

/// Start a polling watcher on `path` that swaps the taxonomy in `handle`.
/// Polls mtime every 2s. Invalid files are logged and ignored.
pub fn start_hot_reload_thread(handle: TaxonomyHandle, path: PathBuf) {
    if !hot_reload_enabled() {
        return;
    }

    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;

        loop {
            if let Ok(mtime) = fs::metadata(&path).and_then(|m| m.modified()) {
                let changed = match last_mtime {
                    None => {
                        last_mtime = Some(mtime);
                        false
                    }
                    Some(prev) => mtime > prev,
                };
                if changed {
                    match Taxonomy::from_path(&path) {
                        Ok(fresh) => {
                            handle.replace(fresh);
                            info!(target: "taxonomy", path = %path.display(), "taxonomy reloaded");
                        }
                        Err(e) => {
                            warn!(target: "taxonomy", error = %e, "taxonomy reload rejected");
                        }
                    }
                    last_mtime = Some(mtime);
                }
            }
            thread::sleep(poll);
        }
    });
}
