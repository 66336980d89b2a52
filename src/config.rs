//! Configuration system for Framesync
//!
//! Loads configuration from TOML file at `~/.config/framesync/config.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub transport: TransportConfig,
    pub launcher: LauncherConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path
    ///
    /// A missing file is replaced by a freshly written default.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            // Auto-generate default config file
            if let Err(e) = Self::save_default(config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Configuration loaded from {:?}", config_path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("framesync");

        Ok(config_dir.join("config.toml"))
    }

    /// Save default configuration to file
    fn save_default(path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let default_config = Self::default();
        let toml_string =
            toml::to_string_pretty(&default_config).context("Failed to serialize default config")?;

        fs::write(path, toml_string).context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

/// Engine configuration (chrome metrics, placement, limits)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Smallest width/height a resize may produce
    pub min_size: i32,
    /// Remove host-closed windows once no gesture references them
    pub collect_closed_windows: bool,
    /// Consecutive geometry mismatches before a divergence warning
    pub divergence_warn_after: u32,
    pub frame: FrameConfig,
    pub placement: PlacementConfig,
    pub screen: ScreenConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_size: 50,
            collect_closed_windows: true,
            divergence_warn_after: 30,
            frame: FrameConfig::default(),
            placement: PlacementConfig::default(),
            screen: ScreenConfig::default(),
        }
    }
}

/// Window chrome geometry
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Title bar height above the content area, in pixels
    pub border_width: i32,
    /// Resize hit-test margin around the content area, in pixels
    pub resize_margin: i32,
    /// Extra margin announced to the host with `window_register_border`
    pub register_margin: i32,
    /// Title bar button size in pixels
    pub button_size: i32,
    /// Title bar button padding in pixels
    pub button_padding: i32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            border_width: 20,
            resize_margin: 5,
            register_margin: 0,
            button_size: 16,
            button_padding: 4,
        }
    }
}

/// Default placement for windows the host has not placed yet
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub default_x: i32,
    pub default_y: i32,
    /// Used when the host reports a zero width
    pub default_width: i32,
    /// Used when the host reports a zero height
    pub default_height: i32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            default_x: 100,
            default_y: 100,
            default_width: 640,
            default_height: 480,
        }
    }
}

/// Available screen bounds (maximize target)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: i32,
    pub height: i32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Host transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Socket override; defaults to `$XDG_RUNTIME_DIR/framesync-host.sock`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,
    /// Rendering ticks per second
    pub tick_rate_hz: u32,
    /// Round trip timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Append `render_request` to every batch
    pub render_handshake: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            tick_rate_hz: 60,
            request_timeout_ms: 1000,
            render_handshake: true,
        }
    }
}

impl TransportConfig {
    /// Interval between ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.tick_rate_hz.max(1)))
    }

    /// Round trip timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Socket the host bridge connects to
    pub fn resolved_socket_path(&self) -> PathBuf {
        self.socket_path
            .clone()
            .unwrap_or_else(framesync_proto::socket_path)
    }
}

/// Launcher configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Send commands as argv arrays instead of a single string
    pub argv: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "framesync=debug,info".to_string(),
        }
    }
}
