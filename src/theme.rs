use iced::Color;

use crate::raster::{PanelSpec, Rgba};

// ─── ARC BLUEBERRY PALETTE ──────────────────────────────────────

pub const BG: Rgba = Rgba::new(0x11, 0x14, 0x22, 0xFF);
pub const BG_SECONDARY: Rgba = Rgba::new(0x1A, 0x1E, 0x33, 0xFF);
pub const BG_TILE: Rgba = Rgba::new(0x1E, 0x23, 0x37, 0xB8);
pub const BG_TILE_SELECTED: Rgba = Rgba::new(0x2D, 0x34, 0x50, 0xD0);
pub const BG_SETTINGS: Rgba = Rgba::new(0x1A, 0x1E, 0x33, 0x96);
pub const BG_SETTINGS_SELECTED: Rgba = Rgba::new(0x2D, 0x34, 0x50, 0xC8);
pub const BG_STATS_BAR: Rgba = Rgba::new(0x1A, 0x1E, 0x33, 0xD8);
pub const BG_DIALOG: Rgba = Rgba::new(0x1A, 0x1E, 0x33, 0xF0);

pub const FG: Color = hex(0xBC, 0xC1, 0xDC);
pub const FG_DIM: Color = hex(0x42, 0x47, 0x61);
pub const TILE_OUTLINE: Color = Color::from_rgba(0x42 as f32 / 255.0, 0x47 as f32 / 255.0, 0x61 as f32 / 255.0, 0x50 as f32 / 255.0);
pub const ACCENT: Color = hex(0x8E, 0xB0, 0xE6);
pub const PINK: Color = hex(0xF3, 0x8C, 0xEC);
pub const GREEN: Color = hex(0x3C, 0xEC, 0x85);
pub const YELLOW: Color = hex(0xEA, 0xCD, 0x61);
pub const RED: Color = hex(0xE3, 0x55, 0x35);
pub const ORANGE: Color = hex(0xFF, 0x95, 0x5C);
pub const CYAN: Color = hex(0x69, 0xC3, 0xFF);
pub const SCRIM: Color = Color::from_rgba(0.0, 0.0, 0.0, 180.0 / 255.0);

// ─── LAYOUT ─────────────────────────────────────────────────────

pub const TILE_WIDTH: u32 = 140;
pub const TILE_HEIGHT: u32 = 130;
pub const TILE_SPACING: u32 = 20;
pub const TILE_RADIUS: u32 = 16;

pub const TILE_PANEL: PanelSpec = PanelSpec::new(TILE_WIDTH, TILE_HEIGHT, TILE_RADIUS, BG_TILE);
pub const TILE_PANEL_SELECTED: PanelSpec =
    PanelSpec::new(TILE_WIDTH, TILE_HEIGHT, TILE_RADIUS, BG_TILE_SELECTED);
pub const SETTINGS_PANEL: PanelSpec = PanelSpec::new(50, 50, 25, BG_SETTINGS);
pub const SETTINGS_PANEL_SELECTED: PanelSpec = PanelSpec::new(56, 56, 28, BG_SETTINGS_SELECTED);
pub const STATS_BAR_PANEL: PanelSpec = PanelSpec::new(600, 100, 16, BG_STATS_BAR);
pub const DIALOG_PANEL: PanelSpec = PanelSpec::new(400, 180, 20, BG_DIALOG);

// ─── TYPE SIZES ─────────────────────────────────────────────────

pub const CLOCK_SIZE: f32 = 180.0;
pub const DATE_SIZE: f32 = 42.0;
pub const TILE_LABEL_SIZE: f32 = 22.0;
pub const STAT_VALUE_SIZE: f32 = 36.0;
pub const STAT_LABEL_SIZE: f32 = 16.0;
pub const ICON_SIZE: f32 = 42.0;
pub const ICON_SMALL_SIZE: f32 = 22.0;

pub const SETTINGS_ICON: &str = "\u{F013}";
pub const HELP_GLYPH: &str = "?";

// ─── STAT THRESHOLDS ────────────────────────────────────────────

/// Which of the four readouts a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    Cpu,
    Memory,
    Temperature,
    Disk,
}

impl Stat {
    pub const ALL: [Stat; 4] = [Stat::Cpu, Stat::Memory, Stat::Temperature, Stat::Disk];

    pub fn label(&self) -> &'static str {
        match self {
            Stat::Cpu => "CPU",
            Stat::Memory => "RAM",
            Stat::Temperature => "TEMP",
            Stat::Disk => "DISK",
        }
    }

    /// Nerd Font glyph for this readout.
    pub fn icon(&self) -> &'static str {
        match self {
            Stat::Cpu => "\u{F4BC}",
            Stat::Memory => "\u{EFC5}",
            Stat::Temperature => "\u{F2C9}",
            Stat::Disk => "\u{F0A0}",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Stat::Temperature => "°C",
            _ => "%",
        }
    }
}

/// Severity band a readout falls into; each band has its own colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatLevel {
    Normal,
    Warm,
    Hot,
    Critical,
}

impl StatLevel {
    pub const ALL: [StatLevel; 4] = [
        StatLevel::Normal,
        StatLevel::Warm,
        StatLevel::Hot,
        StatLevel::Critical,
    ];

    pub fn classify(stat: Stat, value: i32) -> Self {
        match stat {
            Stat::Temperature => match value {
                v if v >= 70 => StatLevel::Critical,
                v if v >= 55 => StatLevel::Hot,
                v if v >= 45 => StatLevel::Warm,
                _ => StatLevel::Normal,
            },
            _ => match value {
                v if v >= 80 => StatLevel::Critical,
                v if v >= 60 => StatLevel::Warm,
                _ => StatLevel::Normal,
            },
        }
    }

    pub fn color(&self) -> Color {
        match self {
            StatLevel::Normal => GREEN,
            StatLevel::Warm => YELLOW,
            StatLevel::Hot => ORANGE,
            StatLevel::Critical => RED,
        }
    }
}

const fn hex(r: u8, g: u8, b: u8) -> Color {
    Color::from_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_bands() {
        assert_eq!(StatLevel::classify(Stat::Temperature, 30), StatLevel::Normal);
        assert_eq!(StatLevel::classify(Stat::Temperature, 45), StatLevel::Warm);
        assert_eq!(StatLevel::classify(Stat::Temperature, 55), StatLevel::Hot);
        assert_eq!(StatLevel::classify(Stat::Temperature, 70), StatLevel::Critical);
    }

    #[test]
    fn test_percentage_bands_skip_hot() {
        assert_eq!(StatLevel::classify(Stat::Cpu, 59), StatLevel::Normal);
        assert_eq!(StatLevel::classify(Stat::Memory, 60), StatLevel::Warm);
        assert_eq!(StatLevel::classify(Stat::Disk, 79), StatLevel::Warm);
        assert_eq!(StatLevel::classify(Stat::Disk, 80), StatLevel::Critical);
        assert!(Stat::ALL
            .iter()
            .filter(|s| **s != Stat::Temperature)
            .all(|s| (0..=100).all(|v| StatLevel::classify(*s, v) != StatLevel::Hot)));
    }

    #[test]
    fn test_panels_fit_layout() {
        assert_eq!(TILE_PANEL.width, TILE_PANEL_SELECTED.width);
        assert_ne!(TILE_PANEL, TILE_PANEL_SELECTED);
        assert!(SETTINGS_PANEL.radius * 2 <= SETTINGS_PANEL.width);
    }
}
