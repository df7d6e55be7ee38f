//! Command handlers.
//!
//! Each handler writes its report to the given writer so the output can be
//! checked in tests.

use std::io::Write;
use std::sync::Arc;

use radiosync_core::{
    AppConfig, ConfigSource, ConfigSyncCache, FAVORITES_NAMESPACE, FavoriteManager,
    JsonFileStore, PreferencesManager, RadioConfig, RadioStation, SETTINGS_NAMESPACE, SleepTimer,
    SyncOutcome, fallback_config,
};
use tracing::{debug, info};

use crate::cli::{Command, FavoritesCommand, PrefsCommand};
use crate::error::{CliError, Result};

/// Everything a command needs, built once from configuration.
pub struct AppState {
    config: AppConfig,
    cache: ConfigSyncCache,
    favorites: FavoriteManager,
    preferences: PreferencesManager,
}

impl AppState {
    /// Wire the core services to the configured data directory.
    pub fn new(config: AppConfig) -> Self {
        let cache = ConfigSyncCache::from_config(&config);
        let favorites = FavoriteManager::new(Arc::new(JsonFileStore::new(
            &config.data_directory,
            FAVORITES_NAMESPACE,
        )));
        let preferences = PreferencesManager::new(Arc::new(JsonFileStore::new(
            &config.data_directory,
            SETTINGS_NAMESPACE,
        )));
        Self {
            config,
            cache,
            favorites,
            preferences,
        }
    }

    /// Run `command`, defaulting to a catalog sync.
    pub async fn run(&self, command: Option<Command>, out: &mut dyn Write) -> Result<()> {
        match command.unwrap_or(Command::Sync { json: false }) {
            Command::Sync { json } => self.sync(json, out).await,
            Command::Cached => self.cached(out),
            Command::Status => self.status(out),
            Command::Clear => {
                self.cache.clear()?;
                writeln!(out, "Cleared {}", self.cache.cache_path().display())?;
                Ok(())
            }
            Command::Play { id } => self.play(id, out),
            Command::Next => self.step(true, out),
            Command::Previous => self.step(false, out),
            Command::Resume => self.resume(out),
            Command::Favorites(action) => self.favorites(action, out),
            Command::Prefs(action) => self.prefs(action, out),
            Command::Sleep { minutes } => sleep(SleepTimer::from_minutes(minutes), out).await,
        }
    }

    async fn sync(&self, json: bool, out: &mut dyn Write) -> Result<()> {
        info!("Syncing catalog from {}", self.config.remote_url);
        let outcome = self.cache.sync_async().await;
        for error in &outcome.errors {
            writeln!(out, "warning: {error}")?;
        }

        let catalog = match &outcome.config {
            Some(config) => config.clone(),
            None => {
                writeln!(out, "warning: no catalog available, using built-in stations")?;
                fallback_config()
            }
        };

        if json {
            writeln!(out, "{}", catalog.to_json()?)?;
        } else {
            writeln!(out, "{}", summarize(&outcome))?;
            self.list(&catalog, out)?;
        }
        Ok(())
    }

    fn cached(&self, out: &mut dyn Write) -> Result<()> {
        match self.cache.cached_config() {
            Some(catalog) => self.list(&catalog, out),
            None => {
                writeln!(out, "No cached catalog at {}", self.cache.cache_path().display())?;
                Ok(())
            }
        }
    }

    fn status(&self, out: &mut dyn Write) -> Result<()> {
        let metadata = self.cache.metadata();
        writeln!(out, "Remote URL:     {}", self.config.remote_url)?;
        writeln!(out, "Cache file:     {}", self.cache.cache_path().display())?;
        writeln!(out, "Last version:   {}", display_or_never(metadata.last_version))?;
        writeln!(out, "Last check:     {}", display_or_never(metadata.last_check))?;
        writeln!(
            out,
            "Last station:   {}",
            self.preferences
                .last_station_id()
                .map_or_else(|| "none".to_string(), |id| id.to_string())
        )?;
        writeln!(out, "Volume:         {}", self.preferences.last_volume())?;
        writeln!(out, "Auto-play:      {}", on_off(self.preferences.is_auto_play_enabled()))?;
        writeln!(out, "Favorites:      {}", self.favorites.favorites().len())?;
        Ok(())
    }

    fn play(&self, id: i64, out: &mut dyn Write) -> Result<()> {
        let catalog = self.offline_catalog();
        let station = catalog
            .find_station(id)
            .ok_or(CliError::UnknownStation(id))?;
        self.preferences.save_last_station(station.id)?;
        writeln!(out, "Now playing: {}", describe(station))?;
        Ok(())
    }

    fn step(&self, forward: bool, out: &mut dyn Write) -> Result<()> {
        let catalog = self.offline_catalog();
        let current = self.preferences.last_station_id().unwrap_or(-1);
        let station = if forward {
            catalog.next_station(current)
        } else {
            catalog.previous_station(current)
        }
        .ok_or(CliError::EmptyCatalog)?;
        debug!("Stepping from station {} to {}", current, station.id);
        self.preferences.save_last_station(station.id)?;
        writeln!(out, "Now playing: {}", describe(station))?;
        Ok(())
    }

    fn resume(&self, out: &mut dyn Write) -> Result<()> {
        let catalog = self.offline_catalog();
        match self.preferences.resume_station(&catalog) {
            Some(station) => {
                let mode = if self.preferences.is_auto_play_enabled() {
                    "auto-play"
                } else {
                    "paused"
                };
                writeln!(out, "Resume ({mode}): {}", describe(station))?;
            }
            None => writeln!(out, "Nothing to resume")?,
        }
        Ok(())
    }

    fn favorites(&self, action: FavoritesCommand, out: &mut dyn Write) -> Result<()> {
        match action {
            FavoritesCommand::List => {
                let catalog = self.offline_catalog();
                let stations = self.favorites.favorite_stations(&catalog);
                if stations.is_empty() {
                    writeln!(out, "No favorites")?;
                }
                for station in stations {
                    writeln!(out, "  {}", describe(station))?;
                }
            }
            FavoritesCommand::Add { id } => {
                self.favorites.add(id)?;
                writeln!(out, "Added {id} to favorites")?;
            }
            FavoritesCommand::Remove { id } => {
                self.favorites.remove(id)?;
                writeln!(out, "Removed {id} from favorites")?;
            }
            FavoritesCommand::Toggle { id } => {
                let now = self.favorites.toggle(id)?;
                writeln!(
                    out,
                    "Station {id} is {} a favorite",
                    if now { "now" } else { "no longer" }
                )?;
            }
        }
        Ok(())
    }

    fn prefs(&self, action: PrefsCommand, out: &mut dyn Write) -> Result<()> {
        match action {
            PrefsCommand::Show => {
                writeln!(out, "volume = {}", self.preferences.last_volume())?;
                writeln!(
                    out,
                    "auto_play = {}",
                    on_off(self.preferences.is_auto_play_enabled())
                )?;
            }
            PrefsCommand::Volume { level } => {
                self.preferences.save_volume(level)?;
                writeln!(out, "volume = {}", self.preferences.last_volume())?;
            }
            PrefsCommand::Autoplay { enabled } => {
                self.preferences.set_auto_play(enabled)?;
                writeln!(out, "auto_play = {}", on_off(enabled))?;
            }
        }
        Ok(())
    }

    fn list(&self, catalog: &RadioConfig, out: &mut dyn Write) -> Result<()> {
        let favorites = self.favorites.favorites();
        writeln!(
            out,
            "Catalog v{} ({}), {} stations",
            catalog.version,
            catalog.last_updated,
            catalog.station_count()
        )?;
        for category in &catalog.categories {
            writeln!(out, "{} {}", category.icon, category.name)?;
            for station in &category.stations {
                let star = if favorites.contains(&station.id) { "*" } else { " " };
                writeln!(out, " {star} {}", describe(station))?;
            }
        }
        Ok(())
    }

    /// Cached catalog, or the built-in stations when there is none.
    fn offline_catalog(&self) -> RadioConfig {
        self.cache.cached_config().unwrap_or_else(fallback_config)
    }
}

async fn sleep(timer: SleepTimer, out: &mut dyn Write) -> Result<()> {
    let Some(handle) = timer.schedule(|| info!("Stopping playback")) else {
        writeln!(out, "Sleep timer cancelled")?;
        return Ok(());
    };
    writeln!(out, "Sleep timer: {timer}")?;
    out.flush()?;
    handle.await?;
    writeln!(out, "Sleep timer expired")?;
    Ok(())
}

fn summarize(outcome: &SyncOutcome) -> String {
    let versions = format!(
        "cached {}, remote {}",
        display_or_none(outcome.cached_version),
        display_or_none(outcome.remote_version)
    );
    match outcome.source {
        ConfigSource::Remote if outcome.persisted => format!("Updated from remote ({versions})"),
        ConfigSource::Remote => format!("Serving remote, not persisted ({versions})"),
        ConfigSource::Cache => format!("Serving cache ({versions})"),
        ConfigSource::Unavailable => format!("No catalog ({versions})"),
    }
}

fn describe(station: &RadioStation) -> String {
    if station.description.is_empty() {
        format!("[{}] {}", station.id, station.name)
    } else {
        format!("[{}] {} - {}", station.id, station.name, station.description)
    }
}

fn display_or_none(value: Option<u64>) -> String {
    value.map_or_else(|| "none".to_string(), |v| v.to_string())
}

fn display_or_never(value: Option<u64>) -> String {
    value.map_or_else(|| "never".to_string(), |v| v.to_string())
}

const fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
