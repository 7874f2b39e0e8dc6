use iced::keyboard::{key::Named, Key};

/// Confirmation-gated system actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemAction {
    Reboot,
    PowerOff,
}

impl SystemAction {
    pub fn title(&self) -> &'static str {
        match self {
            SystemAction::Reboot => "Reboot",
            SystemAction::PowerOff => "Power Off",
        }
    }
}

/// State owned by the UI loop. Other components signal through flags and
/// never write here directly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UiState {
    pub selected: usize,
    pub settings_selected: bool,
    /// Modal yes/no prompt currently shown, if any.
    pub confirm: Option<SystemAction>,
    pub needs_redraw: bool,
    /// Minute (since the Unix epoch, local time) shown by the last frame.
    pub last_minute: Option<i64>,
    pub foreground_active: bool,
}

impl UiState {
    /// A fresh state owes its first frame.
    pub fn new() -> Self {
        Self { needs_redraw: true, ..Default::default() }
    }
}

/// Keys the launcher reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherKey {
    Left,
    Right,
    Up,
    Down,
    Activate,
    /// Escape: cancels a prompt, otherwise quits.
    Back,
    Quit,
    Reboot,
    PowerOff,
}

impl LauncherKey {
    pub fn from_iced(key: &Key) -> Option<Self> {
        match key {
            Key::Named(Named::ArrowLeft) => Some(LauncherKey::Left),
            Key::Named(Named::ArrowRight) => Some(LauncherKey::Right),
            Key::Named(Named::ArrowUp) => Some(LauncherKey::Up),
            Key::Named(Named::ArrowDown) => Some(LauncherKey::Down),
            Key::Named(Named::Enter) => Some(LauncherKey::Activate),
            Key::Named(Named::Escape) => Some(LauncherKey::Back),
            Key::Character(c) => match c.as_str() {
                "q" | "Q" => Some(LauncherKey::Quit),
                "r" | "R" => Some(LauncherKey::Reboot),
                "p" | "P" => Some(LauncherKey::PowerOff),
                _ => None,
            },
            _ => None,
        }
    }
}

/// What the caller has to do after a key was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    None,
    LaunchTile(usize),
    LaunchSettings,
    Execute(SystemAction),
    Quit,
}

/// Maps keys onto selection-state transitions over `tile_count` tiles.
#[derive(Debug, Clone, Copy)]
pub struct InputRouter {
    tile_count: usize,
}

impl InputRouter {
    pub fn new(tile_count: usize) -> Self {
        Self { tile_count: tile_count.max(1) }
    }

    /// Apply `key` to `ui`. `needs_redraw` is raised only if `ui` actually
    /// changed. Launch intents do not touch `ui`; the caller flips
    /// `foreground_active` once the spawn succeeded.
    pub fn route(&self, ui: &mut UiState, key: LauncherKey) -> Intent {
        let before = (ui.selected, ui.settings_selected, ui.confirm);
        let intent = match ui.confirm {
            Some(action) => self.route_prompt(ui, action, key),
            None => self.route_home(ui, key),
        };
        if before != (ui.selected, ui.settings_selected, ui.confirm) {
            ui.needs_redraw = true;
        }
        intent
    }

    fn route_prompt(&self, ui: &mut UiState, action: SystemAction, key: LauncherKey) -> Intent {
        match key {
            LauncherKey::Activate => {
                ui.confirm = None;
                Intent::Execute(action)
            }
            LauncherKey::Back => {
                ui.confirm = None;
                Intent::None
            }
            _ => Intent::None,
        }
    }

    fn route_home(&self, ui: &mut UiState, key: LauncherKey) -> Intent {
        let n = self.tile_count;
        match key {
            LauncherKey::Left => {
                if ui.settings_selected {
                    ui.settings_selected = false;
                } else {
                    ui.selected = (ui.selected + n - 1) % n;
                }
                Intent::None
            }
            LauncherKey::Right => {
                if ui.settings_selected {
                    ui.settings_selected = false;
                    ui.selected = 0;
                } else {
                    ui.selected = (ui.selected + 1) % n;
                }
                Intent::None
            }
            LauncherKey::Up => {
                ui.settings_selected = true;
                Intent::None
            }
            LauncherKey::Down => {
                ui.settings_selected = false;
                Intent::None
            }
            LauncherKey::Activate if ui.settings_selected => Intent::LaunchSettings,
            LauncherKey::Activate => Intent::LaunchTile(ui.selected),
            LauncherKey::Back | LauncherKey::Quit => Intent::Quit,
            LauncherKey::Reboot => {
                ui.confirm = Some(SystemAction::Reboot);
                Intent::None
            }
            LauncherKey::PowerOff => {
                ui.confirm = Some(SystemAction::PowerOff);
                Intent::None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled() -> UiState {
        UiState { needs_redraw: false, ..UiState::new() }
    }

    #[test]
    fn test_right_wraps_around() {
        let router = InputRouter::new(5);
        let mut ui = settled();
        for _ in 0..5 {
            assert_eq!(router.route(&mut ui, LauncherKey::Right), Intent::None);
        }
        assert_eq!(ui.selected, 0);
    }

    #[test]
    fn test_left_wraps_to_last() {
        let router = InputRouter::new(5);
        let mut ui = settled();
        router.route(&mut ui, LauncherKey::Left);
        assert_eq!(ui.selected, 4);
        assert!(ui.needs_redraw);
    }

    #[test]
    fn test_settings_mode_round_trip() {
        let router = InputRouter::new(5);
        let mut ui = settled();
        router.route(&mut ui, LauncherKey::Right);
        router.route(&mut ui, LauncherKey::Right);
        router.route(&mut ui, LauncherKey::Up);
        assert!(ui.settings_selected);
        assert_eq!(ui.selected, 2);

        router.route(&mut ui, LauncherKey::Right);
        assert!(!ui.settings_selected);
        assert_eq!(ui.selected, 0);
    }

    #[test]
    fn test_left_from_settings_keeps_selection() {
        let router = InputRouter::new(5);
        let mut ui = UiState { selected: 3, settings_selected: true, ..settled() };
        router.route(&mut ui, LauncherKey::Left);
        assert!(!ui.settings_selected);
        assert_eq!(ui.selected, 3);
    }

    #[test]
    fn test_noop_keys_do_not_dirty() {
        let router = InputRouter::new(5);
        let mut ui = settled();
        router.route(&mut ui, LauncherKey::Down);
        assert!(!ui.needs_redraw);

        ui.settings_selected = true;
        router.route(&mut ui, LauncherKey::Up);
        assert!(!ui.needs_redraw);
    }

    #[test]
    fn test_single_tile_left_right_is_noop() {
        let router = InputRouter::new(1);
        let mut ui = settled();
        router.route(&mut ui, LauncherKey::Right);
        router.route(&mut ui, LauncherKey::Left);
        assert_eq!(ui.selected, 0);
        assert!(!ui.needs_redraw);
    }

    #[test]
    fn test_activate_intents() {
        let router = InputRouter::new(5);
        let mut ui = UiState { selected: 2, ..settled() };
        assert_eq!(router.route(&mut ui, LauncherKey::Activate), Intent::LaunchTile(2));
        ui.settings_selected = true;
        assert_eq!(router.route(&mut ui, LauncherKey::Activate), Intent::LaunchSettings);
        assert!(!ui.foreground_active);
    }

    #[test]
    fn test_quit_keys() {
        let router = InputRouter::new(5);
        let mut ui = settled();
        assert_eq!(router.route(&mut ui, LauncherKey::Quit), Intent::Quit);
        assert_eq!(router.route(&mut ui, LauncherKey::Back), Intent::Quit);
    }

    #[test]
    fn test_prompt_confirm_and_cancel() {
        let router = InputRouter::new(5);
        let mut ui = settled();

        router.route(&mut ui, LauncherKey::PowerOff);
        assert_eq!(ui.confirm, Some(SystemAction::PowerOff));
        assert!(ui.needs_redraw);

        // Escape cancels instead of quitting while the prompt is up.
        assert_eq!(router.route(&mut ui, LauncherKey::Back), Intent::None);
        assert_eq!(ui.confirm, None);

        router.route(&mut ui, LauncherKey::Reboot);
        assert_eq!(
            router.route(&mut ui, LauncherKey::Activate),
            Intent::Execute(SystemAction::Reboot)
        );
        assert_eq!(ui.confirm, None);
    }

    #[test]
    fn test_prompt_swallows_other_keys() {
        let router = InputRouter::new(5);
        let mut ui = UiState { confirm: Some(SystemAction::Reboot), ..settled() };
        for key in [LauncherKey::Left, LauncherKey::Right, LauncherKey::Up, LauncherKey::Quit, LauncherKey::PowerOff] {
            assert_eq!(router.route(&mut ui, key), Intent::None);
        }
        assert_eq!(ui.selected, 0);
        assert_eq!(ui.confirm, Some(SystemAction::Reboot));
        assert!(!ui.needs_redraw);
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(LauncherKey::from_iced(&Key::Named(Named::ArrowLeft)), Some(LauncherKey::Left));
        assert_eq!(LauncherKey::from_iced(&Key::Named(Named::Enter)), Some(LauncherKey::Activate));
        assert_eq!(LauncherKey::from_iced(&Key::Character("q".into())), Some(LauncherKey::Quit));
        assert_eq!(LauncherKey::from_iced(&Key::Character("x".into())), None);
        assert_eq!(LauncherKey::from_iced(&Key::Named(Named::Tab)), None);
    }
}
