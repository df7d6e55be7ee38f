//! Playback preferences: last station, autoplay and volume.

use std::sync::Arc;

use crate::error::Result;
use crate::model::{RadioConfig, RadioStation};
use crate::store::{LocalStore, LocalStoreExt};

/// Namespace of the settings store.
pub const SETTINGS_NAMESPACE: &str = "settings";

const KEY_LAST_STATION_ID: &str = "last_station_id";
const KEY_AUTO_PLAY: &str = "auto_play";
const KEY_LAST_VOLUME: &str = "last_volume";

/// Stored when no station has been played; older installs wrote it explicitly.
const NO_STATION: i64 = -1;

/// Volume used when none has been saved.
pub const DEFAULT_VOLUME: u8 = 100;

/// Maximum volume.
pub const MAX_VOLUME: u8 = 100;

/// Reads and writes playback preferences.
///
/// Reads never fail: missing or unparseable values yield the defaults.
pub struct PreferencesManager {
    store: Arc<dyn LocalStore>,
}

impl PreferencesManager {
    /// Create a manager over a store scoped to [`SETTINGS_NAMESPACE`].
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// Remember the last played station.
    pub fn save_last_station(&self, station_id: i64) -> Result<()> {
        self.store.set_display(KEY_LAST_STATION_ID, &station_id)
    }

    /// The last played station, if any.
    pub fn last_station_id(&self) -> Option<i64> {
        let id: i64 = self
            .store
            .get_or(KEY_LAST_STATION_ID, NO_STATION);
        (id >= 0).then_some(id)
    }

    /// The last played station, looked up in `config`.
    pub fn resume_station<'a>(&self, config: &'a RadioConfig) -> Option<&'a RadioStation> {
        self.last_station_id().and_then(|id| config.find_station(id))
    }

    /// Enable or disable autoplay on startup.
    pub fn set_auto_play(&self, enabled: bool) -> Result<()> {
        self.store.set_display(KEY_AUTO_PLAY, &enabled)
    }

    /// Whether autoplay is enabled. Defaults to false.
    pub fn is_auto_play_enabled(&self) -> bool {
        self.store.get_or(KEY_AUTO_PLAY, false)
    }

    /// Remember the volume, clamped to [`MAX_VOLUME`].
    pub fn save_volume(&self, volume: u8) -> Result<()> {
        self.store
            .set_display(KEY_LAST_VOLUME, &volume.min(MAX_VOLUME))
    }

    /// The last volume. Defaults to [`DEFAULT_VOLUME`].
    pub fn last_volume(&self) -> u8 {
        self.store
            .get_or(KEY_LAST_VOLUME, DEFAULT_VOLUME)
            .min(MAX_VOLUME)
    }
}
