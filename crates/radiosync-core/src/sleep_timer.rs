//! Sleep timer presets and scheduling.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

/// Minutes offered as sleep timer presets.
pub const SLEEP_TIMER_PRESETS: [u32; 4] = [15, 30, 45, 60];

/// A sleep timer setting. Zero minutes means off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SleepTimer {
    /// No timer.
    #[default]
    Off,
    /// Stop playback after the given number of minutes.
    Minutes(u32),
}

impl SleepTimer {
    /// Build a timer from a minute count; `0` turns it off.
    #[must_use]
    pub const fn from_minutes(minutes: u32) -> Self {
        if minutes == 0 {
            Self::Off
        } else {
            Self::Minutes(minutes)
        }
    }

    /// The preset timers, in menu order.
    #[must_use]
    pub fn presets() -> Vec<Self> {
        SLEEP_TIMER_PRESETS
            .iter()
            .map(|m| Self::Minutes(*m))
            .collect()
    }

    /// Time until expiry, or `None` when off.
    #[must_use]
    pub const fn duration(&self) -> Option<Duration> {
        match self {
            Self::Off => None,
            Self::Minutes(m) => Some(Duration::from_secs(*m as u64 * 60)),
        }
    }

    /// Spawn a task that runs `on_expire` when the timer elapses.
    ///
    /// Returns `None` when the timer is off. Abort the handle to cancel.
    pub fn schedule<F>(self, on_expire: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        let duration = self.duration()?;
        info!("Sleep timer set for {} minutes", duration.as_secs() / 60);
        Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            info!("Sleep timer expired");
            on_expire();
        }))
    }
}

impl std::fmt::Display for SleepTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => write!(f, "Off"),
            Self::Minutes(m) => write!(f, "{m} minutes"),
        }
    }
}
