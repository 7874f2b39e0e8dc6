use chrono::{Local, NaiveDateTime};
use iced::widget::{center, column, container, image, row, stack, text, Space};
use iced::{keyboard, window};
use iced::{Alignment, Background, Border, ContentFit, Element, Font, Length, Subscription, Task, Theme};
use tracing::{info, warn};

use crate::cache::{Emphasis, GlyphRole, PanelRole, RasterCache};
use crate::config::LauncherConfig;
use crate::error::LauncherError;
use crate::fonts::FontSet;
use crate::foreground::CommandSpec;
use crate::input::{InputRouter, Intent, LauncherKey, SystemAction, UiState};
use crate::metrics::{snapshot_slot, MetricsSnapshot, SamplerHandle, SystemSource};
use crate::scheduler::{FrameRenderer, RedrawScheduler, TickOutcome};
use crate::theme::{self, Stat, StatLevel};

// ─── MESSAGE ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Message {
    Tick,
    KeyPressed(keyboard::Key),
}

// ─── FRAME ──────────────────────────────────────────────────────

/// One stats-bar cell as it was last painted.
#[derive(Debug, Clone, PartialEq)]
struct StatReadout {
    stat: Stat,
    value: String,
    level: StatLevel,
    /// CPU has no figure until the sampler has a baseline.
    pending: bool,
}

impl StatReadout {
    fn new(stat: Stat, value: Option<i32>) -> Self {
        match value {
            Some(v) => Self {
                stat,
                value: format!("{v}{}", stat.unit()),
                level: StatLevel::classify(stat, v),
                pending: false,
            },
            None => Self {
                stat,
                value: format!("--{}", stat.unit()),
                level: StatLevel::Normal,
                pending: true,
            },
        }
    }
}

/// Everything `view` draws, baked by the scheduler only when a repaint is
/// owed. Between repaints the view keeps showing the same frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    clock: String,
    date: String,
    selected: usize,
    settings_selected: bool,
    confirm: Option<SystemAction>,
    stats: Vec<StatReadout>,
}

impl FrameRenderer for Frame {
    fn render(&mut self, ui: &UiState, metrics: &MetricsSnapshot, now: NaiveDateTime) {
        self.clock = now.format("%H:%M").to_string();
        self.date = now.format("%A, %B %d").to_string();
        self.selected = ui.selected;
        self.settings_selected = ui.settings_selected;
        self.confirm = ui.confirm;
        self.stats = Stat::ALL
            .iter()
            .map(|&stat| {
                let value = match stat {
                    Stat::Cpu => metrics.cpu.map(i32::from),
                    Stat::Memory => Some(metrics.mem.into()),
                    Stat::Temperature => Some(metrics.temp),
                    Stat::Disk => Some(metrics.disk.into()),
                };
                StatReadout::new(stat, value)
            })
            .collect();
    }
}

// ─── APP STATE ──────────────────────────────────────────────────

/// The launcher application.
///
/// Fields drop in declaration order: the sampler thread is stopped and
/// joined first, then the cached images go, then the scheduler releases
/// the foreground handle (leaving any running child alive).
pub struct Launcher {
    sampler: SamplerHandle,
    cache: RasterCache,
    scheduler: RedrawScheduler,
    frame: Frame,
    router: InputRouter,
    config: LauncherConfig,
    text_font: Font,
    windowed: bool,
}

impl Launcher {
    pub fn new(
        config: LauncherConfig,
        fonts: &FontSet,
        windowed: bool,
    ) -> Result<(Self, Task<Message>), LauncherError> {
        let (writer, reader) = snapshot_slot();
        let source = SystemSource::new(&config.thermal_sensor, &config.disk_mount);
        let sampler = SamplerHandle::spawn(source, config.sample_interval(), writer)
            .map_err(LauncherError::Sampler)?;

        let launcher = Self {
            sampler,
            cache: RasterCache::build(&config, fonts),
            scheduler: RedrawScheduler::new(reader),
            frame: Frame::default(),
            router: InputRouter::new(config.apps.len()),
            text_font: fonts.text_font(),
            config,
            windowed,
        };
        let startup = Task::batch([launcher.show_window(), Task::done(Message::Tick)]);
        Ok((launcher, startup))
    }

    pub fn title(&self) -> String {
        String::from("TV Launcher")
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    pub fn subscription(&self) -> Subscription<Message> {
        if self.scheduler.is_foreground() {
            // Hidden: only the liveness poll, at the slower cadence.
            return iced::time::every(self.config.foreground_poll_interval()).map(|_| Message::Tick);
        }
        let tick = iced::time::every(self.config.tick_interval()).map(|_| Message::Tick);
        let keys = keyboard::on_key_press(|key, _modifiers| Some(Message::KeyPressed(key)));
        Subscription::batch([tick, keys])
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                let now = Local::now().naive_local();
                match self.scheduler.tick(now, &mut self.frame) {
                    TickOutcome::Restored => self.show_window(),
                    TickOutcome::Idle | TickOutcome::Repainted | TickOutcome::Foreground => {
                        Task::none()
                    }
                }
            }
            Message::KeyPressed(key) => {
                if self.scheduler.is_foreground() {
                    return Task::none();
                }
                let Some(key) = LauncherKey::from_iced(&key) else {
                    return Task::none();
                };
                self.dispatch(key)
            }
        }
    }

    fn dispatch(&mut self, key: LauncherKey) -> Task<Message> {
        match self.router.route(self.scheduler.ui_mut(), key) {
            Intent::None => Task::none(),
            Intent::LaunchTile(i) => match self.config.apps.get(i) {
                Some(app) => launch(&mut self.scheduler, &app.command),
                None => Task::none(),
            },
            Intent::LaunchSettings => launch(&mut self.scheduler, &self.config.settings_command),
            Intent::Execute(action) => {
                self.execute(action);
                Task::none()
            }
            Intent::Quit => {
                info!("quit requested");
                self.sampler.stop();
                iced::exit()
            }
        }
    }

    fn execute(&self, action: SystemAction) {
        let command = match action {
            SystemAction::Reboot => &self.config.reboot_command,
            SystemAction::PowerOff => &self.config.poweroff_command,
        };
        info!(%command, "{}", action.title());
        match command.run_blocking() {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(%command, %status, "system action failed"),
            Err(e) => warn!("{e}"),
        }
    }

    fn show_window(&self) -> Task<Message> {
        let mode = if self.windowed {
            window::Mode::Windowed
        } else {
            window::Mode::Fullscreen
        };
        window::get_oldest().and_then(move |id| {
            Task::batch([window::change_mode(id, mode), window::gain_focus(id)])
        })
    }

    // ─── VIEW ───────────────────────────────────────────────────

    pub fn view(&self) -> Element<'_, Message> {
        let wallpaper = image(self.cache.wallpaper().handle.clone())
            .width(Length::Fill)
            .height(Length::Fill)
            .content_fit(ContentFit::Cover);

        let clock = column![
            text(&self.frame.clock).size(theme::CLOCK_SIZE).font(self.text_font).color(theme::FG),
            text(&self.frame.date).size(theme::DATE_SIZE).font(self.text_font).color(theme::FG),
        ]
        .align_x(Alignment::Center);

        let top_bar = row![Space::with_width(Length::Fill), self.settings_button()]
            .height(56)
            .align_y(Alignment::Center);

        let bottom_bar = row![
            Space::with_width(Length::Fill),
            self.glyph(GlyphRole::Help),
        ];

        let home = column![
            top_bar,
            clock,
            Space::with_height(Length::FillPortion(2)),
            self.tiles(),
            Space::with_height(Length::FillPortion(3)),
            self.stats_bar(),
            bottom_bar,
        ]
        .align_x(Alignment::Center)
        .padding([22, 32])
        .width(Length::Fill)
        .height(Length::Fill);

        let mut layers = stack![wallpaper, home];
        if let Some(action) = self.frame.confirm {
            layers = layers.push(self.confirm_dialog(action));
        }
        layers.into()
    }

    fn glyph(&self, role: GlyphRole) -> Element<'_, Message> {
        match self.cache.glyph(role) {
            Some(sprite) => sprite.widget().into(),
            None => Space::new(0, 0).into(),
        }
    }

    fn panel(&self, role: PanelRole) -> Element<'_, Message> {
        match self.cache.panel(role) {
            Some(panel) => image(panel.handle().clone())
                .width(panel.width())
                .height(panel.height())
                .into(),
            None => {
                let spec = role.spec();
                Space::new(spec.width as f32, spec.height as f32).into()
            }
        }
    }

    fn tiles(&self) -> Element<'_, Message> {
        let tiles = (0..self.config.apps.len()).map(|i| -> Element<'_, Message> {
            let selected = i == self.frame.selected && !self.frame.settings_selected;
            let emphasis = Emphasis::from_selected(selected);

            let face = column![
                self.glyph(GlyphRole::TileIcon(i, emphasis)),
                self.glyph(GlyphRole::TileLabel(i)),
            ]
            .spacing(10)
            .align_x(Alignment::Center);

            // Tiles get a square frame around the rounded panel; only the
            // settings button's highlight ring follows its radius.
            let (border_color, border_width) = if selected {
                (theme::PINK, 3.0)
            } else {
                (theme::TILE_OUTLINE, 1.0)
            };
            container(stack![self.panel(PanelRole::Tile(emphasis)), center(face)])
                .padding(3)
                .style(move |_: &Theme| container::Style {
                    border: Border { color: border_color, width: border_width, radius: 0.0.into() },
                    ..Default::default()
                })
                .into()
        });
        row(tiles)
            .spacing(theme::TILE_SPACING as f32)
            .align_y(Alignment::Center)
            .into()
    }

    fn settings_button(&self) -> Element<'_, Message> {
        let selected = self.frame.settings_selected;
        let emphasis = Emphasis::from_selected(selected);
        let mut button = stack![
            self.panel(PanelRole::Settings(emphasis)),
            center(self.glyph(GlyphRole::SettingsIcon(emphasis))),
        ];
        if selected {
            let spec = theme::SETTINGS_PANEL_SELECTED;
            button = button.push(
                container(Space::new(spec.width as f32, spec.height as f32)).style(|_: &Theme| {
                    container::Style {
                        border: Border {
                            color: theme::PINK,
                            width: 2.5,
                            radius: (theme::SETTINGS_PANEL_SELECTED.radius as f32).into(),
                        },
                        ..Default::default()
                    }
                }),
            );
        }
        container(button)
            .center_x(theme::SETTINGS_PANEL_SELECTED.width as f32)
            .center_y(theme::SETTINGS_PANEL_SELECTED.height as f32)
            .into()
    }

    fn stats_bar(&self) -> Element<'_, Message> {
        let cells = self.frame.stats.iter().map(|readout| -> Element<'_, Message> {
            let value_color = if readout.pending { theme::CYAN } else { readout.level.color() };
            column![
                self.glyph(GlyphRole::StatLabel(readout.stat)),
                text(&readout.value)
                    .size(theme::STAT_VALUE_SIZE)
                    .font(self.text_font)
                    .color(value_color),
                self.glyph(GlyphRole::StatIcon(readout.stat, readout.level)),
            ]
            .align_x(Alignment::Center)
            .width(Length::FillPortion(1))
            .into()
        });
        let spec = theme::STATS_BAR_PANEL;
        let cells = row(cells)
            .width(spec.width as f32)
            .height(spec.height as f32)
            .padding([6, 0])
            .align_y(Alignment::Center);
        stack![self.panel(PanelRole::StatsBar), cells].into()
    }

    fn confirm_dialog(&self, action: SystemAction) -> Element<'_, Message> {
        let body = column![
            text(format!("{}?", action.title()))
                .size(theme::DATE_SIZE)
                .font(self.text_font)
                .color(theme::FG),
            text("Enter = Yes    Esc = No")
                .size(theme::TILE_LABEL_SIZE)
                .font(self.text_font)
                .color(theme::FG_DIM),
        ]
        .spacing(28)
        .align_x(Alignment::Center);

        let dialog = container(stack![self.panel(PanelRole::ConfirmDialog), center(body)])
            .padding(2)
            .style(|_: &Theme| container::Style {
                border: Border { color: theme::ACCENT, width: 2.0, radius: 0.0.into() },
                ..Default::default()
            });

        center(dialog)
            .style(|_: &Theme| container::Style {
                background: Some(Background::Color(theme::SCRIM)),
                ..Default::default()
            })
            .into()
    }
}

fn launch(scheduler: &mut RedrawScheduler, command: &CommandSpec) -> Task<Message> {
    match scheduler.launch(command) {
        Ok(process) => {
            info!(pid = process.pid(), "hiding launcher");
            window::get_oldest().and_then(|id| window::change_mode(id, window::Mode::Hidden))
        }
        Err(e) => {
            warn!("{e}");
            Task::none()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(12, 7, 41).unwrap()
    }

    #[test]
    fn test_frame_formats_clock_and_date() {
        let mut frame = Frame::default();
        frame.render(&UiState::new(), &MetricsSnapshot::default(), noon());
        assert_eq!(frame.clock, "12:07");
        assert_eq!(frame.date, "Saturday, March 09");
    }

    #[test]
    fn test_frame_copies_selection() {
        let ui = UiState {
            selected: 3,
            settings_selected: true,
            confirm: Some(SystemAction::PowerOff),
            ..UiState::new()
        };
        let mut frame = Frame::default();
        frame.render(&ui, &MetricsSnapshot::default(), noon());
        assert_eq!(frame.selected, 3);
        assert!(frame.settings_selected);
        assert_eq!(frame.confirm, Some(SystemAction::PowerOff));
    }

    #[test]
    fn test_stat_readouts() {
        let metrics = MetricsSnapshot { cpu: None, mem: 61, temp: 72, disk: 12 };
        let mut frame = Frame::default();
        frame.render(&UiState::new(), &metrics, noon());

        let values: Vec<_> = frame.stats.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, ["--%", "61%", "72°C", "12%"]);
        assert!(frame.stats[0].pending);
        assert_eq!(frame.stats[1].level, StatLevel::Warm);
        assert_eq!(frame.stats[2].level, StatLevel::Critical);
        assert_eq!(frame.stats[3].level, StatLevel::Normal);
    }

    #[test]
    fn test_stat_readout_with_cpu() {
        let readout = StatReadout::new(Stat::Cpu, Some(85));
        assert_eq!(readout.value, "85%");
        assert_eq!(readout.level, StatLevel::Critical);
        assert!(!readout.pending);
    }
}
