//! System font discovery.
//!
//! Fonts are read from disk at startup and handed to iced as raw bytes; the
//! family name is what widgets then refer to.

use std::fs;
use std::path::{Path, PathBuf};

use iced::font::{Family, Font};
use tracing::{info, warn};

use crate::config::{FontEntry, LauncherConfig};
use crate::error::LauncherError;

const TEXT_CANDIDATES: &[(&str, &str)] = &[
    ("/usr/share/fonts/TTF/DejaVuSans.ttf", "DejaVu Sans"),
    ("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf", "DejaVu Sans"),
    ("/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf", "DejaVu Sans"),
    ("/usr/share/fonts/noto/NotoSans-Regular.ttf", "Noto Sans"),
    ("/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf", "Noto Sans"),
    ("/usr/share/fonts/google-noto/NotoSans-Regular.ttf", "Noto Sans"),
    ("/usr/share/fonts/Adwaita/AdwaitaSans-Regular.ttf", "Adwaita Sans"),
    ("/usr/share/fonts/adwaita-sans-fonts/AdwaitaSans-Regular.ttf", "Adwaita Sans"),
    ("/usr/share/fonts/liberation/LiberationSans-Regular.ttf", "Liberation Sans"),
    ("/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf", "Liberation Sans"),
];

const ICON_CANDIDATES: &[(&str, &str)] = &[
    ("/usr/share/fonts/TTF/JetBrainsMonoNerdFont-Regular.ttf", "JetBrainsMono Nerd Font"),
    ("/usr/share/fonts/TTF/JetBrainsMonoNerdFontMono-Regular.ttf", "JetBrainsMono Nerd Font Mono"),
    ("/usr/share/fonts/nerd-fonts/JetBrainsMonoNerdFont-Regular.ttf", "JetBrainsMono Nerd Font"),
    ("/usr/local/share/fonts/JetBrainsMonoNerdFont-Regular.ttf", "JetBrainsMono Nerd Font"),
];

/// A font whose bytes have been read and that is ready to register.
#[derive(Clone)]
pub struct LoadedFont {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub font: Font,
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("path", &self.path)
            .field("font", &self.font)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct FontSet {
    pub text: LoadedFont,
    /// `None` when no Nerd Font is installed; icons fall back to plain text.
    pub icon: Option<LoadedFont>,
}

impl FontSet {
    pub fn discover(config: &LauncherConfig) -> Result<Self, LauncherError> {
        let text_candidates = candidates(config.text_font.as_ref(), TEXT_CANDIDATES);
        let text = first_readable(&text_candidates)
            .ok_or_else(|| LauncherError::NoTextFont {
                searched: text_candidates.iter().map(|(p, _)| p.clone()).collect(),
            })?;
        info!(path = %text.path.display(), "text font");

        let icon = first_readable(&candidates(config.icon_font.as_ref(), ICON_CANDIDATES));
        match &icon {
            Some(icon) => info!(path = %icon.path.display(), "icon font"),
            None => warn!("no Nerd Font found, icons fall back to plain text"),
        }

        Ok(Self { text, icon })
    }

    pub fn text_font(&self) -> Font {
        self.text.font
    }

    pub fn icon_font(&self) -> Option<Font> {
        self.icon.as_ref().map(|f| f.font)
    }

    /// Every font that has to be registered with the renderer.
    pub fn all(&self) -> impl Iterator<Item = &LoadedFont> {
        std::iter::once(&self.text).chain(self.icon.as_ref())
    }
}

fn candidates(configured: Option<&FontEntry>, builtin: &[(&str, &str)]) -> Vec<(PathBuf, String)> {
    configured
        .map(|entry| (entry.path.clone(), entry.family.clone()))
        .into_iter()
        .chain(builtin.iter().map(|(path, family)| (PathBuf::from(path), family.to_string())))
        .collect()
}

fn first_readable(candidates: &[(PathBuf, String)]) -> Option<LoadedFont> {
    candidates.iter().find_map(|(path, family)| load(path, family))
}

fn load(path: &Path, family: &str) -> Option<LoadedFont> {
    let bytes = fs::read(path).ok()?;
    if bytes.is_empty() {
        return None;
    }
    Some(LoadedFont {
        path: path.to_path_buf(),
        bytes,
        font: font_named(family),
    })
}

/// iced wants a `'static` family name. Fonts are discovered once per
/// process, so leaking the handful of names is fine.
fn font_named(family: &str) -> Font {
    let name: &'static str = Box::leak(family.to_owned().into_boxed_str());
    Font {
        family: Family::Name(name),
        ..Font::DEFAULT
    }
}
