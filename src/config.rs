use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::LauncherError;
use crate::foreground::CommandSpec;

/// One tile of the home screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppEntry {
    pub name: String,
    pub command: CommandSpec,
    /// Nerd Font glyph shown above the name.
    #[serde(default)]
    pub icon: String,
}

/// A font file plus the family name it registers under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontEntry {
    pub path: PathBuf,
    pub family: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LauncherConfig {
    #[serde(default = "default_apps")]
    pub apps: Vec<AppEntry>,
    #[serde(default = "default_settings_command")]
    pub settings_command: CommandSpec,
    #[serde(default = "default_reboot_command")]
    pub reboot_command: CommandSpec,
    #[serde(default = "default_poweroff_command")]
    pub poweroff_command: CommandSpec,
    /// Tried in order; the first existing file becomes the wallpaper.
    #[serde(default)]
    pub wallpapers: Vec<PathBuf>,
    #[serde(default)]
    pub text_font: Option<FontEntry>,
    #[serde(default)]
    pub icon_font: Option<FontEntry>,
    /// Redraw scheduler cadence while the launcher is visible.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Liveness poll cadence while an application owns the screen.
    #[serde(default = "default_foreground_poll_ms")]
    pub foreground_poll_ms: u64,
    #[serde(default = "default_sample_interval_secs")]
    pub sample_interval_secs: u64,
    #[serde(default = "default_thermal_sensor")]
    pub thermal_sensor: PathBuf,
    #[serde(default = "default_disk_mount")]
    pub disk_mount: PathBuf,
    /// Used for the generated wallpaper when no image file is found.
    #[serde(default = "default_screen_width")]
    pub screen_width: u32,
    #[serde(default = "default_screen_height")]
    pub screen_height: u32,
}

fn app(name: &str, command: &str, icon: &str) -> AppEntry {
    AppEntry { name: name.into(), command: CommandSpec::argv([command]), icon: icon.into() }
}

fn default_apps() -> Vec<AppEntry> {
    vec![
        app("Kodi", "kodi", "\u{F26C}"),
        app("Stremio", "stremio", "\u{F04B}"),
        app("IPTV", "iptv", "\u{F03D}"),
        app("Tidal", "tidal-hifi", "\u{F001}"),
        app("Bluetooth", "blueman-manager", "\u{F293}"),
    ]
}
fn default_settings_command() -> CommandSpec { CommandSpec::argv(["gnome-control-center"]) }
fn default_reboot_command() -> CommandSpec { CommandSpec::argv(["sudo", "reboot"]) }
fn default_poweroff_command() -> CommandSpec { CommandSpec::argv(["sudo", "poweroff"]) }
fn default_tick_ms() -> u64 { 50 }
fn default_foreground_poll_ms() -> u64 { 200 }
fn default_sample_interval_secs() -> u64 { 2 }
fn default_thermal_sensor() -> PathBuf { PathBuf::from("/sys/class/thermal/thermal_zone0/temp") }
fn default_disk_mount() -> PathBuf { PathBuf::from("/") }
fn default_screen_width() -> u32 { 1920 }
fn default_screen_height() -> u32 { 1080 }

const MIN_FOREGROUND_POLL_MS: u64 = 200;

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            apps: default_apps(),
            settings_command: default_settings_command(),
            reboot_command: default_reboot_command(),
            poweroff_command: default_poweroff_command(),
            wallpapers: Vec::new(),
            text_font: None,
            icon_font: None,
            tick_ms: default_tick_ms(),
            foreground_poll_ms: default_foreground_poll_ms(),
            sample_interval_secs: default_sample_interval_secs(),
            thermal_sensor: default_thermal_sensor(),
            disk_mount: default_disk_mount(),
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
        }
    }
}

impl LauncherConfig {
    /// Linux → ~/.config/tvlauncher/config.json
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tvlauncher")
            .join("config.json")
    }

    /// Load from an explicit path (errors are fatal) or from the default
    /// location (a missing or broken file falls back to defaults).
    pub fn load(explicit: Option<&Path>) -> Result<Self, LauncherError> {
        let mut config = match explicit {
            Some(path) => Self::read(path)?,
            None => {
                let path = Self::default_path();
                match Self::read(&path) {
                    Ok(config) => config,
                    Err(LauncherError::ConfigRead { source, .. })
                        if source.kind() == std::io::ErrorKind::NotFound =>
                    {
                        info!(path = %path.display(), "no config file, using defaults");
                        Self::default()
                    }
                    Err(e) => {
                        warn!("{e}; using defaults");
                        Self::default()
                    }
                }
            }
        };
        config.sanitize();
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, LauncherError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| LauncherError::ConfigRead { path: path.to_path_buf(), source })?;
        serde_json::from_str(&contents)
            .map_err(|source| LauncherError::ConfigParse { path: path.to_path_buf(), source })
    }

    /// Clamp all numeric fields to workable ranges.
    fn sanitize(&mut self) {
        if self.apps.is_empty() {
            warn!("config has no apps, using the default catalog");
            self.apps = default_apps();
        }
        self.tick_ms = self.tick_ms.clamp(10, 1000);
        self.foreground_poll_ms = self
            .foreground_poll_ms
            .clamp(self.tick_ms.max(MIN_FOREGROUND_POLL_MS), 5000);
        self.sample_interval_secs = self.sample_interval_secs.clamp(1, 60);
        self.screen_width = self.screen_width.clamp(320, 7680);
        self.screen_height = self.screen_height.clamp(240, 4320);
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn foreground_poll_interval(&self) -> Duration {
        Duration::from_millis(self.foreground_poll_ms)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let config = LauncherConfig::default();
        assert_eq!(config.apps.len(), 5);
        assert_eq!(config.apps[0].name, "Kodi");
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
        assert_eq!(config.foreground_poll_interval(), Duration::from_millis(200));
        assert_eq!(config.sample_interval(), Duration::from_secs(2));
        assert_eq!(config.disk_mount, PathBuf::from("/"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let json = r#"{"apps":[{"name":"Kodi","command":"kodi --standalone"}],"tick_ms":40}"#;
        let config: LauncherConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.apps.len(), 1);
        assert_eq!(config.apps[0].command, CommandSpec::Shell("kodi --standalone".into()));
        assert!(config.apps[0].icon.is_empty());
        assert_eq!(config.tick_ms, 40);
        assert_eq!(config.foreground_poll_ms, 200);
    }

    #[test]
    fn test_sanitize_clamps() {
        let mut config = LauncherConfig {
            apps: Vec::new(),
            tick_ms: 1,
            foreground_poll_ms: 5,
            sample_interval_secs: 0,
            ..Default::default()
        };
        config.sanitize();
        assert_eq!(config.apps.len(), 5);
        assert_eq!(config.tick_ms, 10);
        assert_eq!(config.foreground_poll_ms, 200);
        assert_eq!(config.sample_interval_secs, 1);
    }

    #[test]
    fn test_foreground_poll_never_faster_than_tick() {
        let mut config = LauncherConfig { tick_ms: 600, foreground_poll_ms: 250, ..Default::default() };
        config.sanitize();
        assert_eq!(config.foreground_poll_ms, 600);
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"apps":[{{"name":"Shell","command":["sh"]}}],"sample_interval_secs":5}}"#).unwrap();
        let config = LauncherConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.apps[0].command, CommandSpec::argv(["sh"]));
        assert_eq!(config.sample_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_explicit_missing_or_broken_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            LauncherConfig::load(Some(missing.as_path())),
            Err(LauncherError::ConfigRead { .. })
        ));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            LauncherConfig::load(Some(broken.as_path())),
            Err(LauncherError::ConfigParse { .. })
        ));
    }
}
