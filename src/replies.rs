//! Canned chat replies (hot-reloaded from `config/replies.json`).
//!
//! Messages that are a bare acknowledgement ("thanks", "ok") get a fixed
//! reply. Otherwise keyword rules run in order, using a small JSON DSL over the
//! message (case-insensitive):
//! - `any_contains`: match if ANY of the phrases appears
//! - `all_contains`: match if ALL of the phrases appear
//! - `not_contains`: match if NONE of the phrases appear
//! - `min_len` / `max_len`: bounds on the message length (chars)
//!
//! A matching rule either answers (`reply`, first one wins) or tags the
//! message (`tag`, e.g. `event_query`) so the caller can answer from stored
//! records. Anything left unanswered goes to the generative service.

use anyhow::Context;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
    time::SystemTime,
};
use tracing::warn;

use crate::text::normalize;

pub const DEFAULT_REPLIES_PATH: &str = "config/replies.json";
pub const ENV_REPLIES_CONFIG_PATH: &str = "REPLIES_CONFIG_PATH";

static EMBEDDED: Lazy<ReplySet> = Lazy::new(|| {
    serde_json::from_str(include_str!("../config/replies.json")).expect("valid embedded replies")
});

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplySet {
    #[serde(default)]
    pub acknowledgements: BTreeMap<String, String>,
    #[serde(default)]
    pub rules: Vec<ReplyRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyRule {
    pub name: Option<String>,
    #[serde(default)]
    pub when: When,
    #[serde(default)]
    pub then: Then,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct When {
    pub any_contains: Option<Vec<String>>,
    pub all_contains: Option<Vec<String>>,
    pub not_contains: Option<Vec<String>>,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Then {
    pub reply: Option<String>,
    pub tag: Option<String>,
}

/// What the rules made of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplyOutcome {
    pub reply: Option<String>,
    pub tags: Vec<String>,
}

impl ReplyOutcome {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl ReplySet {
    /// The set compiled into the binary.
    pub fn embedded() -> Self {
        EMBEDDED.clone()
    }

    pub fn respond(&self, message: &str) -> ReplyOutcome {
        let text = normalize(message);
        let bare = text.trim_end_matches(['!', '.', '?']).trim();
        if let Some(reply) = self.acknowledgements.get(bare) {
            return ReplyOutcome {
                reply: Some(reply.clone()),
                tags: Vec::new(),
            };
        }

        let mut out = ReplyOutcome::default();
        for rule in &self.rules {
            if !matches_when(&text, &rule.when) {
                continue;
            }
            if out.reply.is_none() {
                out.reply = rule.then.reply.clone();
            }
            if let Some(tag) = &rule.then.tag {
                if !out.has_tag(tag) {
                    out.tags.push(tag.clone());
                }
            }
        }
        out
    }
}

#[derive(Debug)]
pub struct HotReloadReplies {
    path: PathBuf,
    inner: RwLock<State>,
}

#[derive(Debug)]
struct State {
    replies: ReplySet,
    last_modified: Option<SystemTime>,
}

impl HotReloadReplies {
    /// Starts from the embedded set; the file replaces it once it is readable.
    pub fn new(path: Option<&Path>) -> Self {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPLIES_PATH));
        Self {
            path,
            inner: RwLock::new(State {
                replies: ReplySet::embedded(),
                last_modified: None,
            }),
        }
    }

    /// Watch REPLIES_CONFIG_PATH, or the default path.
    pub fn from_env() -> Self {
        let path = std::env::var(ENV_REPLIES_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_REPLIES_PATH));
        Self::new(Some(&path))
    }

    pub fn current(&self) -> ReplySet {
        let mtime = fs::metadata(&self.path).and_then(|m| m.modified()).ok();
        let needs_reload = match mtime {
            Some(m) => {
                let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
                guard.last_modified != Some(m)
            }
            None => false,
        };

        if !needs_reload {
            return self
                .inner
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .replies
                .clone();
        }

        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if guard.last_modified != mtime {
            match load_replies_file(&self.path) {
                Ok(replies) => guard.replies = replies,
                Err(e) => warn!(target: "replies", error = %e, "keeping previous replies"),
            }
            // recorded even when the file is rejected
            guard.last_modified = mtime;
        }
        guard.replies.clone()
    }
}

pub fn load_replies_file(path: &Path) -> anyhow::Result<ReplySet> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

// --- internals ---

fn matches_when(text: &str, w: &When) -> bool {
    let len = text.chars().count();
    if w.min_len.is_some_and(|min| len < min) {
        return false;
    }
    if w.max_len.is_some_and(|max| len > max) {
        return false;
    }
    if let Some(v) = &w.any_contains {
        if !v.iter().any(|p| contains(text, p)) {
            return false;
        }
    }
    if let Some(v) = &w.all_contains {
        if !v.iter().all(|p| contains(text, p)) {
            return false;
        }
    }
    if let Some(v) = &w.not_contains {
        if v.iter().any(|p| contains(text, p)) {
            return false;
        }
    }
    true
}

fn contains(text: &str, pat: &str) -> bool {
    let p = normalize(pat);
    p.is_empty() || text.contains(p.as_str())
}
