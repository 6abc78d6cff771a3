//! Player settings and engine options
//!
//! Persisted separately from best scores in LocalStorage.

use serde::{Deserialize, Serialize};

/// What the world does between a collision and the bird reaching the floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DyingMotion {
    /// Pipes stop the moment the bird is hit
    #[default]
    Freeze,
    /// Pipes keep scrolling until the bird lands
    ScrollUntilFloor,
}

impl DyingMotion {
    pub fn id(&self) -> &'static str {
        match self {
            DyingMotion::Freeze => "freeze",
            DyingMotion::ScrollUntilFloor => "scroll",
        }
    }

    pub fn from_id(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "freeze" => Some(DyingMotion::Freeze),
            "scroll" | "scrolluntilfloor" | "scroll_until_floor" => {
                Some(DyingMotion::ScrollUntilFloor)
            }
            _ => None,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Gameplay ===
    pub dying_motion: DyingMotion,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            dying_motion: DyingMotion::Freeze,
        }
    }
}

impl Settings {
    /// Effective volume multiplier for tones (respects mute)
    pub fn tone_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "arcade_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Discarding unreadable settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                Self::report_save(storage.set_item(Self::STORAGE_KEY, &json));
            }
        }
    }

    /// Log a storage write; true if it landed
    #[allow(dead_code)]
    fn report_save<E: std::fmt::Debug>(result: Result<(), E>) -> bool {
        match result {
            Ok(()) => {
                log::info!("Settings saved");
                true
            }
            Err(e) => {
                log::warn!("Failed to save settings: {:?}", e);
                false
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
