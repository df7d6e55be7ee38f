//! Station catalog data model.
//!
//! A [`RadioConfig`] is the versioned catalog published by the remote source
//! and mirrored in the local cache. It groups [`RadioStation`]s into ordered
//! [`Category`] lists.

use serde::{Deserialize, Serialize};

/// A single streamable radio station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioStation {
    /// Station identifier, unique across the whole catalog.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Stream endpoint.
    pub url: String,
    /// Short description (genre, tagline).
    #[serde(default)]
    pub description: String,
    /// Optional logo reference.
    #[serde(default)]
    pub logo: Option<String>,
}

impl RadioStation {
    /// Create a station without description or logo.
    pub fn new(id: i64, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            url: url.into(),
            description: String::new(),
            logo: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the logo reference.
    #[must_use]
    pub fn with_logo(mut self, logo: impl Into<String>) -> Self {
        self.logo = Some(logo.into());
        self
    }
}

/// A named group of stations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category identifier, unique within a config.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Opaque icon reference.
    pub icon: String,
    /// Stations in display order.
    pub stations: Vec<RadioStation>,
}

/// The versioned station catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioConfig {
    /// Publisher-assigned version; higher means newer.
    pub version: u64,
    /// Opaque "last updated" label set by the publisher.
    pub last_updated: String,
    /// Categories in display order.
    pub categories: Vec<Category>,
}

impl RadioConfig {
    /// An empty catalog at version 0.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            version: 0,
            last_updated: String::new(),
            categories: Vec::new(),
        }
    }

    /// Parse a catalog from its JSON representation.
    ///
    /// Unknown fields are ignored. A missing `description` becomes empty and a
    /// missing `logo` becomes `None`; every other field is required. A
    /// negative version is rejected.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Parse a catalog from raw bytes, rejecting invalid UTF-8.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Serialize the catalog as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Returns true if `self` was published after `other`.
    #[must_use]
    pub const fn is_newer_than(&self, other: &Self) -> bool {
        self.version > other.version
    }

    /// All stations, flattened in category order.
    pub fn all_stations(&self) -> impl Iterator<Item = &RadioStation> {
        self.categories.iter().flat_map(|c| c.stations.iter())
    }

    /// Total number of stations across all categories.
    #[must_use]
    pub fn station_count(&self) -> usize {
        self.categories.iter().map(|c| c.stations.len()).sum()
    }

    /// Find a station by id in any category.
    #[must_use]
    pub fn find_station(&self, id: i64) -> Option<&RadioStation> {
        self.all_stations().find(|s| s.id == id)
    }

    /// Find a category by id.
    #[must_use]
    pub fn find_category(&self, id: i64) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// The station after `id` in the flattened list, wrapping around.
    ///
    /// Returns the first station when `id` is unknown.
    #[must_use]
    pub fn next_station(&self, id: i64) -> Option<&RadioStation> {
        let stations: Vec<&RadioStation> = self.all_stations().collect();
        match stations.iter().position(|s| s.id == id) {
            Some(idx) => stations.get((idx + 1) % stations.len()).copied(),
            None => stations.first().copied(),
        }
    }

    /// The station before `id` in the flattened list, wrapping around.
    ///
    /// Returns the last station when `id` is unknown.
    #[must_use]
    pub fn previous_station(&self, id: i64) -> Option<&RadioStation> {
        let stations: Vec<&RadioStation> = self.all_stations().collect();
        match stations.iter().position(|s| s.id == id) {
            Some(0) => stations.last().copied(),
            Some(idx) => stations.get(idx - 1).copied(),
            None => stations.last().copied(),
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self::empty()
    }
}
