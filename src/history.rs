//! Historical draw records
//!
//! Past results feed the weighted selection engine. The data is fetched at
//! most once per process: a successful load is cached, a failed load leaves
//! weighted draws unavailable for the rest of the session.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HistoryError;

/// One past draw
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawRecord {
    /// Main numbers
    pub numbers: Vec<u32>,
    /// Secondary numbers (stars / extra balls)
    pub stars: Vec<u32>,
}

/// Which set of numbers to read from a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberField {
    Main,
    Second,
}

impl DrawRecord {
    pub fn field(&self, field: NumberField) -> &[u32] {
        match field {
            NumberField::Main => &self.numbers,
            NumberField::Second => &self.stars,
        }
    }
}

/// Ordered past draws, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawHistory {
    #[serde(default)]
    pub draws: Vec<DrawRecord>,
}

impl DrawHistory {
    pub fn new(draws: Vec<DrawRecord>) -> Self {
        Self { draws }
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Parse `{ "draws": [ { "numbers": [...], "stars": [...] }, ... ] }`
    pub fn from_json_str(json: &str) -> Result<Self, HistoryError> {
        let history: Self = serde_json::from_str(json)?;
        Ok(history)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[derive(Debug, Clone, Default)]
enum CacheState {
    #[default]
    NotLoaded,
    Ready(DrawHistory),
    Unavailable,
}

/// Load-once cache for the history collaborator
#[derive(Debug, Clone, Default)]
pub struct HistoryCache {
    state: CacheState,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the history, running `loader` only on the first call.
    ///
    /// An empty data set counts as a failure.
    pub fn get_or_load<F>(&mut self, loader: F) -> Result<&DrawHistory, HistoryError>
    where
        F: FnOnce() -> Result<DrawHistory, HistoryError>,
    {
        if matches!(self.state, CacheState::NotLoaded) {
            self.state = match loader().and_then(|h| {
                if h.is_empty() {
                    Err(HistoryError::Empty)
                } else {
                    Ok(h)
                }
            }) {
                Ok(history) => {
                    log::info!("Historical draws loaded: {}", history.len());
                    CacheState::Ready(history)
                }
                Err(err) => {
                    log::warn!("Historical draws unavailable, weighted draws disabled: {}", err);
                    CacheState::Unavailable
                }
            };
        }

        match &self.state {
            CacheState::Ready(history) => Ok(history),
            _ => Err(HistoryError::Unavailable),
        }
    }

    /// Cached history, if a previous load succeeded
    pub fn get(&self) -> Option<&DrawHistory> {
        match &self.state {
            CacheState::Ready(history) => Some(history),
            _ => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self.state, CacheState::Unavailable)
    }
}
