//! Favorite stations.
//!
//! Favorites are stored as a comma-separated list of station ids under a
//! single key. Entries that do not parse as ids are skipped on read.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::model::{RadioConfig, RadioStation};
use crate::store::LocalStore;

/// Namespace of the favorites store.
pub const FAVORITES_NAMESPACE: &str = "favorites";

/// Key holding the favorite id list.
pub const FAVORITES_KEY: &str = "favorites";

/// Manages the set of favorite station ids.
pub struct FavoriteManager {
    store: Arc<dyn LocalStore>,
}

impl FavoriteManager {
    /// Create a manager over a store scoped to [`FAVORITES_NAMESPACE`].
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// All favorite ids. An unreadable store yields an empty set.
    pub fn favorites(&self) -> BTreeSet<i64> {
        match self.store.get(FAVORITES_KEY) {
            Ok(Some(raw)) => parse_ids(&raw),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!("Failed to read favorites: {}", e);
                BTreeSet::new()
            }
        }
    }

    /// Whether `station_id` is a favorite.
    pub fn is_favorite(&self, station_id: i64) -> bool {
        self.favorites().contains(&station_id)
    }

    /// Mark a station as favorite.
    pub fn add(&self, station_id: i64) -> Result<()> {
        let mut favorites = self.favorites();
        if favorites.insert(station_id) {
            debug!("Added station {} to favorites", station_id);
            self.save(&favorites)?;
        }
        Ok(())
    }

    /// Unmark a station.
    pub fn remove(&self, station_id: i64) -> Result<()> {
        let mut favorites = self.favorites();
        if favorites.remove(&station_id) {
            debug!("Removed station {} from favorites", station_id);
            self.save(&favorites)?;
        }
        Ok(())
    }

    /// Flip the favorite state of a station and return the new state.
    pub fn toggle(&self, station_id: i64) -> Result<bool> {
        if self.is_favorite(station_id) {
            self.remove(station_id)?;
            Ok(false)
        } else {
            self.add(station_id)?;
            Ok(true)
        }
    }

    /// Favorite stations present in `config`, in catalog order.
    pub fn favorite_stations<'a>(&self, config: &'a RadioConfig) -> Vec<&'a RadioStation> {
        let favorites = self.favorites();
        config
            .all_stations()
            .filter(|s| favorites.contains(&s.id))
            .collect()
    }

    fn save(&self, favorites: &BTreeSet<i64>) -> Result<()> {
        let joined = favorites
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.store.set(FAVORITES_KEY, &joined)
    }
}

fn parse_ids(raw: &str) -> BTreeSet<i64> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}
