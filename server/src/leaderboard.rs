//! Cross-round win counts, persisted across restarts

use crate::persistence::{JsonTable, PersistenceError};
use log::info;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

pub struct Leaderboard {
    wins: Mutex<BTreeMap<String, u32>>,
    table: JsonTable<u32>,
}

impl Leaderboard {
    /// Opens the leaderboard, loading the persisted win counts.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let table = JsonTable::new(path);
        let wins = table.load().await?;
        info!(
            "Loaded leaderboard with {} players from {}",
            wins.len(),
            table.path().display()
        );

        Ok(Self {
            wins: Mutex::new(wins),
            table,
        })
    }

    /// Adds one win for `name`, persists the full table and returns the new
    /// ranking. On a failed write the in-memory counts are left untouched.
    pub async fn increment_and_persist(
        &self,
        name: &str,
    ) -> Result<Vec<(String, u32)>, PersistenceError> {
        let mut wins = self.wins.lock().await;

        let mut updated = wins.clone();
        *updated.entry(name.to_string()).or_insert(0) += 1;
        self.table.store(&updated).await?;
        *wins = updated;

        info!(
            "{} now has {} wins",
            name,
            wins.get(name).copied().unwrap_or_default()
        );
        Ok(rank(&wins))
    }

    /// Current ranking, most wins first.
    pub async fn snapshot(&self) -> Vec<(String, u32)> {
        rank(&*self.wins.lock().await)
    }

    pub async fn wins_of(&self, name: &str) -> u32 {
        self.wins.lock().await.get(name).copied().unwrap_or_default()
    }
}

/// Sorts by wins descending; equal counts keep name order.
pub fn rank(wins: &BTreeMap<String, u32>) -> Vec<(String, u32)> {
    let mut ranked: Vec<(String, u32)> = wins
        .iter()
        .map(|(name, count)| (name.clone(), *count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}
