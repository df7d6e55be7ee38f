//! Built-in fallback station list.
//!
//! Served when neither the cache nor the remote source can provide a catalog.

use crate::model::{Category, RadioConfig, RadioStation};

/// Id of the single category wrapping the built-in stations.
pub const BUILTIN_CATEGORY_ID: i64 = 0;

/// The hardcoded station list shipped with the application.
#[must_use]
pub fn default_stations() -> Vec<RadioStation> {
    vec![
        RadioStation::new(
            1,
            "PowerTürk",
            "http://listen.powerapp.com.tr/powerturk/mpeg/icecast.audio",
        )
        .with_description("Top Türkçe"),
        RadioStation::new(2, "Kral Pop", "http://46.20.3.204/listen.pls")
            .with_description("Pop Müzik"),
        RadioStation::new(3, "Radyo D", "http://37.247.98.8/stream/166/")
            .with_description("Türkçe Pop"),
        RadioStation::new(
            4,
            "Power FM",
            "http://listen.powerapp.com.tr/powerfm/mpeg/icecast.audio",
        )
        .with_description("Türkçe Slow"),
        RadioStation::new(5, "Number One FM", "http://n10101m.mediatriple.net/numberone")
            .with_description("Pop/Dance"),
        RadioStation::new(6, "Best FM", "http://46.20.3.229/").with_description("Pop/Rock"),
        RadioStation::new(
            7,
            "Radyo Pause",
            "http://radyopause.listenpowerapp.com/radyopause/mpeg/icecast.audio",
        )
        .with_description("Chill/Relax"),
    ]
}

/// The built-in stations wrapped in a version 0 catalog.
///
/// Version 0 never wins against a published catalog, so this value is safe to
/// show but is never written to the cache.
#[must_use]
pub fn fallback_config() -> RadioConfig {
    RadioConfig {
        version: 0,
        last_updated: String::new(),
        categories: vec![Category {
            id: BUILTIN_CATEGORY_ID,
            name: "Stations".to_string(),
            icon: String::new(),
            stations: default_stations(),
        }],
    }
}
