//! Profiles stored in the `Personality` worksheet, behind a read-through
//! cache keyed by username.

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::metrics;
use crate::sheets::{Record, SheetsError, SpreadsheetGateway, Table, Worksheet};
use crate::survey::{PersonalityTrait, TraitScores};

const USERNAME_COLUMN: &str = "Username";
const CACHE_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub scores: TraitScores,
}

impl Profile {
    pub fn new(username: impl Into<String>, scores: TraitScores) -> Self {
        Self {
            username: username.into(),
            scores,
        }
    }

    /// `[username, E, A, C, ES, O]`
    pub fn to_row(&self) -> Vec<Value> {
        let mut row = vec![Value::from(self.username.as_str())];
        row.extend(self.scores.iter().map(|(_, score)| Value::from(score)));
        row
    }

    /// `None` when any trait cell is missing or not a number in 0–100.
    pub fn from_record(record: &Record<'_>) -> Option<Self> {
        let username = record.get(USERNAME_COLUMN)?.to_string();
        let mut values = [0u8; 5];
        for (slot, t) in values.iter_mut().zip(PersonalityTrait::ALL) {
            *slot = parse_score(record.get(t.label())?)?;
        }
        Some(Self::new(
            username,
            TraitScores::new(values[0], values[1], values[2], values[3], values[4]),
        ))
    }
}

/// Sheets may hand back `60`, `60.0` or ` 60 `.
fn parse_score(cell: &str) -> Option<u8> {
    let value: f64 = cell.trim().parse().ok()?;
    if (0.0..=100.0).contains(&value) {
        Some(value.round() as u8)
    } else {
        None
    }
}

/// First row whose username matches exactly. Later duplicates are ignored.
pub fn find_in_table(table: &Table, username: &str) -> Option<Profile> {
    for record in table.records() {
        if record.get(USERNAME_COLUMN) != Some(username) {
            continue;
        }
        match Profile::from_record(&record) {
            Some(profile) => return Some(profile),
            None => warn!("Skipping unreadable profile row for '{}': {:?}", username, record.cells()),
        }
    }
    None
}

pub struct ProfileStore {
    gateway: SpreadsheetGateway,
    sheet: Worksheet,
    cache: Cache<String, Option<Profile>>,
}

impl ProfileStore {
    /// Opens (or creates) the profile worksheet.
    pub async fn open(gateway: SpreadsheetGateway, ttl: Duration) -> Result<Self, SheetsError> {
        let sheet = gateway.open_or_create_profile_sheet().await?;
        info!("Profile store ready on worksheet '{}'", sheet.title());

        Ok(Self {
            gateway,
            sheet,
            cache: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(ttl)
                .build(),
        })
    }

    pub async fn find(&self, username: &str) -> Result<Option<Profile>, SheetsError> {
        if let Some(cached) = self.cache.get(username).await {
            debug!("Profile cache hit for '{}'", username);
            metrics::inc_profile_cache(true);
            return Ok(cached);
        }
        metrics::inc_profile_cache(false);

        let table = self.gateway.read_all(&self.sheet).await?;
        let profile = find_in_table(&table, username);
        self.cache.insert(username.to_string(), profile.clone()).await;
        Ok(profile)
    }

    pub async fn exists(&self, username: &str) -> Result<bool, SheetsError> {
        Ok(self.find(username).await?.is_some())
    }

    /// Append the profile row and drop any cached lookup for the user.
    pub async fn create(&self, profile: &Profile) -> Result<(), SheetsError> {
        let result = self.gateway.append_row(&self.sheet, profile.to_row()).await;
        self.cache.invalidate(&profile.username).await;
        result?;
        info!("Saved profile for '{}'", profile.username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::{InMemorySheets, SheetsBackend, PROFILE_SHEET};
    use serde_json::json;
    use std::sync::Arc;

    async fn store() -> (ProfileStore, InMemorySheets) {
        let sheets = InMemorySheets::new();
        let gateway = SpreadsheetGateway::new(Arc::new(sheets.clone()));
        let store = ProfileStore::open(gateway, Duration::from_secs(60)).await.unwrap();
        (store, sheets)
    }

    #[test]
    fn test_to_row_order() {
        let profile = Profile::new("ana", TraitScores::new(10, 20, 30, 40, 50));
        assert_eq!(
            profile.to_row(),
            vec![json!("ana"), json!(10), json!(20), json!(30), json!(40), json!(50)]
        );
    }

    #[test]
    fn test_parse_score_variants() {
        assert_eq!(parse_score("60"), Some(60));
        assert_eq!(parse_score(" 60.0 "), Some(60));
        assert_eq!(parse_score("101"), None);
        assert_eq!(parse_score(""), None);
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let (store, _sheets) = store().await;
        assert!(!store.exists("ana").await.unwrap());

        let profile = Profile::new("ana", TraitScores::new(80, 60, 60, 40, 90));
        store.create(&profile).await.unwrap();

        assert_eq!(store.find("ana").await.unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn test_negative_lookup_is_cached_until_write() {
        let (store, sheets) = store().await;
        assert!(store.find("bo").await.unwrap().is_none());

        // A write that bypasses the store stays invisible while cached.
        sheets
            .append_row(PROFILE_SHEET, vec![json!("bo"), json!(60), json!(60), json!(60), json!(60), json!(60)])
            .await
            .unwrap();
        assert!(store.find("bo").await.unwrap().is_none());

        store.cache.invalidate("bo").await;
        assert!(store.find("bo").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_first_matching_row_wins() {
        let (store, sheets) = store().await;
        sheets
            .append_row(PROFILE_SHEET, vec![json!("cy"), json!(20), json!(20), json!(20), json!(20), json!(20)])
            .await
            .unwrap();
        sheets
            .append_row(PROFILE_SHEET, vec![json!("cy"), json!(100), json!(100), json!(100), json!(100), json!(100)])
            .await
            .unwrap();

        let profile = store.find("cy").await.unwrap().unwrap();
        assert_eq!(profile.scores.openness, 20);
    }

    #[tokio::test]
    async fn test_username_match_is_exact() {
        let (store, _sheets) = store().await;
        store
            .create(&Profile::new("Ana", TraitScores::new(60, 60, 60, 60, 60)))
            .await
            .unwrap();

        assert!(store.find("ana").await.unwrap().is_none());
        assert!(store.find("Ana").await.unwrap().is_some());
    }
}
