//! Startup-baked images and glyphs, keyed by the visual role they play.
//!
//! Nothing in here is mutated after [`RasterCache::build`] returns. Visual
//! variants (selected, dim, per-level stat colours) are separate entries.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use iced::widget::image::Handle;
use iced::widget::{text, Text};
use iced::{Color, Font};
use tracing::{debug, info};

use crate::config::LauncherConfig;
use crate::fonts::FontSet;
use crate::raster::{render_rounded_panel, vertical_gradient, PanelSpec, RgbaImage};
use crate::theme::{self, Stat, StatLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emphasis {
    Normal,
    Selected,
}

impl Emphasis {
    pub fn from_selected(selected: bool) -> Self {
        if selected {
            Emphasis::Selected
        } else {
            Emphasis::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelRole {
    Tile(Emphasis),
    Settings(Emphasis),
    StatsBar,
    ConfirmDialog,
}

impl PanelRole {
    pub const ALL: [PanelRole; 6] = [
        PanelRole::Tile(Emphasis::Normal),
        PanelRole::Tile(Emphasis::Selected),
        PanelRole::Settings(Emphasis::Normal),
        PanelRole::Settings(Emphasis::Selected),
        PanelRole::StatsBar,
        PanelRole::ConfirmDialog,
    ];

    pub fn spec(&self) -> PanelSpec {
        match self {
            PanelRole::Tile(Emphasis::Normal) => theme::TILE_PANEL,
            PanelRole::Tile(Emphasis::Selected) => theme::TILE_PANEL_SELECTED,
            PanelRole::Settings(Emphasis::Normal) => theme::SETTINGS_PANEL,
            PanelRole::Settings(Emphasis::Selected) => theme::SETTINGS_PANEL_SELECTED,
            PanelRole::StatsBar => theme::STATS_BAR_PANEL,
            PanelRole::ConfirmDialog => theme::DIALOG_PANEL,
        }
    }
}

/// A rasterized panel together with the renderer handle uploaded from it.
pub struct CachedImage {
    image: RgbaImage,
    handle: Handle,
}

impl CachedImage {
    fn new(image: RgbaImage) -> Self {
        let handle = Handle::from_rgba(image.width(), image.height(), image.as_bytes().to_vec());
        Self { image, handle }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn width(&self) -> f32 {
        self.image.width() as f32
    }

    pub fn height(&self) -> f32 {
        self.image.height() as f32
    }
}

impl std::fmt::Debug for CachedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CachedImage").field(&self.image).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlyphRole {
    TileLabel(usize),
    TileIcon(usize, Emphasis),
    SettingsIcon(Emphasis),
    StatLabel(Stat),
    StatIcon(Stat, StatLevel),
    Help,
}

/// A fixed piece of text with its colour, size and face decided up front.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphSprite {
    pub text: String,
    pub size: f32,
    pub color: Color,
    pub font: Font,
}

impl GlyphSprite {
    fn new(text: impl Into<String>, size: f32, color: Color, font: Font) -> Self {
        Self { text: text.into(), size, color, font }
    }

    pub fn widget(&self) -> Text<'_> {
        text(&self.text).size(self.size).color(self.color).font(self.font)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WallpaperSource {
    File(PathBuf),
    Gradient,
}

#[derive(Debug, Clone)]
pub struct Wallpaper {
    pub source: WallpaperSource,
    pub handle: Handle,
}

impl Wallpaper {
    fn resolve(config: &LauncherConfig) -> Self {
        if let Some(path) = config.wallpapers.iter().find(|p| p.is_file()) {
            info!(path = %path.display(), "wallpaper");
            return Self {
                source: WallpaperSource::File(path.clone()),
                handle: Handle::from_path(path),
            };
        }

        debug!("no wallpaper file found, generating gradient");
        let image = vertical_gradient(
            config.screen_width,
            config.screen_height,
            theme::BG,
            theme::BG_SECONDARY,
        );
        Self {
            source: WallpaperSource::Gradient,
            handle: Handle::from_rgba(image.width(), image.height(), image.into_bytes()),
        }
    }
}

/// Rasterizes each distinct [`PanelSpec`] once and hands out shared copies.
#[derive(Default)]
struct PanelBaker {
    baked: HashMap<PanelSpec, Arc<CachedImage>>,
}

impl PanelBaker {
    fn bake(&mut self, spec: PanelSpec) -> Arc<CachedImage> {
        self.baked
            .entry(spec)
            .or_insert_with(|| Arc::new(CachedImage::new(render_rounded_panel(spec))))
            .clone()
    }
}

#[derive(Debug)]
pub struct RasterCache {
    panels: HashMap<PanelRole, Arc<CachedImage>>,
    glyphs: HashMap<GlyphRole, GlyphSprite>,
    wallpaper: Wallpaper,
}

impl RasterCache {
    pub fn build(config: &LauncherConfig, fonts: &FontSet) -> Self {
        let mut baker = PanelBaker::default();
        let panels: HashMap<_, _> =
            PanelRole::ALL.iter().map(|role| (*role, baker.bake(role.spec()))).collect();

        let glyphs = build_glyphs(config, fonts);
        let wallpaper = Wallpaper::resolve(config);

        info!(
            panels = baker.baked.len(),
            glyphs = glyphs.len(),
            wallpaper = ?wallpaper.source,
            "raster cache built"
        );
        Self { panels, glyphs, wallpaper }
    }

    pub fn panel(&self, role: PanelRole) -> Option<&Arc<CachedImage>> {
        self.panels.get(&role)
    }

    pub fn glyph(&self, role: GlyphRole) -> Option<&GlyphSprite> {
        self.glyphs.get(&role)
    }

    pub fn wallpaper(&self) -> &Wallpaper {
        &self.wallpaper
    }
}

fn build_glyphs(config: &LauncherConfig, fonts: &FontSet) -> HashMap<GlyphRole, GlyphSprite> {
    let text_font = fonts.text_font();
    let icon_font = fonts.icon_font();
    let mut glyphs = HashMap::new();

    for (i, app) in config.apps.iter().enumerate() {
        glyphs.insert(
            GlyphRole::TileLabel(i),
            GlyphSprite::new(&app.name, theme::TILE_LABEL_SIZE, theme::FG, text_font),
        );
        // Without a Nerd Font the name's initial stands in for the icon.
        let (icon, font) = match icon_font {
            Some(font) if !app.icon.is_empty() => (app.icon.clone(), font),
            _ => (initial(&app.name), text_font),
        };
        for (emphasis, color) in [(Emphasis::Selected, theme::FG), (Emphasis::Normal, theme::FG_DIM)] {
            glyphs.insert(
                GlyphRole::TileIcon(i, emphasis),
                GlyphSprite::new(icon.clone(), theme::ICON_SIZE, color, font),
            );
        }
    }

    let (settings, settings_font) = match icon_font {
        Some(font) => (theme::SETTINGS_ICON, font),
        None => ("S", text_font),
    };
    for (emphasis, color) in [(Emphasis::Selected, theme::FG), (Emphasis::Normal, theme::FG_DIM)] {
        glyphs.insert(
            GlyphRole::SettingsIcon(emphasis),
            GlyphSprite::new(settings, theme::ICON_SMALL_SIZE, color, settings_font),
        );
    }

    for stat in Stat::ALL {
        glyphs.insert(
            GlyphRole::StatLabel(stat),
            GlyphSprite::new(stat.label(), theme::STAT_LABEL_SIZE, theme::FG_DIM, text_font),
        );
        for level in StatLevel::ALL {
            let sprite = match icon_font {
                Some(font) => GlyphSprite::new(stat.icon(), theme::ICON_SMALL_SIZE, level.color(), font),
                None => GlyphSprite::new("", theme::ICON_SMALL_SIZE, level.color(), text_font),
            };
            glyphs.insert(GlyphRole::StatIcon(stat, level), sprite);
        }
    }

    glyphs.insert(
        GlyphRole::Help,
        GlyphSprite::new(theme::HELP_GLYPH, theme::TILE_LABEL_SIZE, theme::FG_DIM, text_font),
    );
    glyphs
}

fn initial(name: &str) -> String {
    name.chars().next().map(|c| c.to_uppercase().collect()).unwrap_or_default()
}
