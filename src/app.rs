//! App: terminal init, main loop, tick and key handling.

use crate::game::GameState;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::{Args, Difficulty, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// DAS (Delayed Auto-Shift): delay before cursor movement starts repeating when you hold a key.
const REPEAT_DELAY_MS: u64 = 170;
/// ARR (Auto-Repeat Rate): time between repeated moves while holding. 50 ms ≈ 20 moves/sec.
const REPEAT_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    MainMenu,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    /// A completed row pushed occupied cells past the top of the board.
    Overflow,
    /// Line budget spent and no clearable group left anywhere.
    Victory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTab {
    Difficulty,
    Lines,
    Start,
}

/// Line budgets selectable from the menu.
pub const LINE_BUDGETS: [u32; 3] = [50, 100, 200];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    pub current_tab: MenuTab,
    pub selected_difficulty: Difficulty,
    pub selected_lines: u32,
    pub animation_start: Instant,
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            current_tab: MenuTab::Difficulty,
            selected_difficulty: Difficulty::Easy,
            selected_lines: LINE_BUDGETS[1],
            animation_start: Instant::now(),
        }
    }
}

pub struct App {
    args: Args,
    config: GameConfig,
    theme: Theme,
    state: GameState,
    screen: Screen,
    paused: bool,
    game_over_reason: Option<GameOverReason>,
    /// Fixed-step accumulators: act when elapsed crosses the interval, then reset.
    last_line_step: Instant,
    last_gravity_step: Instant,
    /// Line-builder rate (Hz) when --tick-rate is not given.
    line_rate: f64,
    repeat_state: Option<(Action, Instant)>,
    last_repeat_fire: Option<Instant>,
    /// TachyonFX fade for the pending group clear (created when the clear starts).
    clear_effect: Option<Effect>,
    /// Last time we processed the clear effect (for delta).
    clear_effect_process_time: Option<Instant>,
    menu_state: MenuState,
    quit_selected: QuitOption,
    /// Best score seen this process run (nothing is persisted).
    best_score: u32,
}

fn line_rate_for_difficulty(d: Difficulty) -> f64 {
    match d {
        Difficulty::Easy => 4.0,
        Difficulty::Medium => 6.0,
        Difficulty::Hard => 9.0,
    }
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        let state = GameState::new(theme.clone(), args.width, args.height, &config);
        let line_rate = args
            .tick_rate
            .unwrap_or_else(|| line_rate_for_difficulty(args.difficulty));
        let screen = if args.no_menu {
            Screen::Playing
        } else {
            Screen::Menu
        };
        let now = Instant::now();
        Ok(Self {
            args,
            config,
            theme,
            state,
            screen,
            paused: false,
            game_over_reason: None,
            last_line_step: now,
            last_gravity_step: now,
            line_rate,
            repeat_state: None,
            last_repeat_fire: None,
            clear_effect: None,
            clear_effect_process_time: None,
            menu_state: MenuState::default(),
            quit_selected: QuitOption::Resume,
            best_score: 0,
        })
    }

    /// Fresh session with the current config; menu selections already applied.
    fn reset_game(&mut self) {
        let now = Instant::now();
        self.state = GameState::new(
            self.theme.clone(),
            self.args.width,
            self.args.height,
            &self.config,
        );
        self.screen = Screen::Playing;
        self.paused = false;
        self.game_over_reason = None;
        self.last_line_step = now;
        self.last_gravity_step = now;
        self.repeat_state = None;
        self.last_repeat_fire = None;
        self.clear_effect = None;
        self.clear_effect_process_time = None;
    }

    /// Start from the menu: fold the tab selections into the config first.
    fn start_from_menu(&mut self) {
        self.args.difficulty = self.menu_state.selected_difficulty;
        self.config.difficulty = self.menu_state.selected_difficulty;
        self.config.lines = self.menu_state.selected_lines;
        self.line_rate = self
            .args
            .tick_rate
            .unwrap_or_else(|| line_rate_for_difficulty(self.args.difficulty));
        self.reset_game();
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::MoveLeft => self.state.move_cursor(-1, 0),
            Action::MoveRight => self.state.move_cursor(1, 0),
            Action::MoveUp => self.state.move_cursor(0, -1),
            Action::MoveDown => self.state.move_cursor(0, 1),
            Action::Pop => {
                self.state.pop_at_cursor();
                if self.args.no_animation && self.state.clear_in_progress {
                    self.state.finish_clear();
                }
                self.repeat_state = None;
            }
            _ => {}
        }
    }

    fn tick_repeat(&mut self) {
        let now = Instant::now();
        let (action, first) = match self.repeat_state {
            Some(s) => s,
            None => return,
        };
        if !matches!(
            action,
            Action::MoveLeft | Action::MoveRight | Action::MoveUp | Action::MoveDown
        ) {
            return;
        }
        if first.elapsed() < Duration::from_millis(REPEAT_DELAY_MS) {
            return;
        }
        let next = self.last_repeat_fire.unwrap_or(first) + Duration::from_millis(REPEAT_INTERVAL_MS);
        if now >= next {
            self.apply_action(action);
            self.last_repeat_fire = Some(now);
        }
    }

    /// Left click pops the clicked cell; terminal coordinates are converted
    /// to grid coordinates against the drawn board rect.
    fn on_mouse(&mut self, mouse: MouseEvent, area: Rect) {
        if self.screen != Screen::Playing || self.paused {
            return;
        }
        if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
            if let Some((x, y)) = crate::ui::hit_test(area, &self.state, mouse.column, mouse.row) {
                self.state.cursor = (x, y);
                self.state.pop_at(x, y);
                if self.args.no_animation && self.state.clear_in_progress {
                    self.state.finish_clear();
                }
            }
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{
                DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
                PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
            },
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        if !self.args.no_mouse {
            execute!(stdout, EnableMouseCapture)?;
        }

        // Attempt to enable enhanced keyboard for Release events
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        if !self.args.no_mouse {
            let _ = execute!(std::io::stdout(), DisableMouseCapture);
        }
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            let quit_selected =
                (self.screen == Screen::QuitMenu).then_some(self.quit_selected);
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    self.paused,
                    self.game_over_reason,
                    f.area(),
                    &mut self.clear_effect,
                    &mut self.clear_effect_process_time,
                    &self.menu_state,
                    now,
                    self.args.no_animation,
                    quit_selected,
                    self.best_score,
                )
            })?;

            // Clear fade finished: actually zero the cells.
            if self.state.clear_in_progress
                && !self.args.no_animation
                && self.clear_effect.as_ref().is_some_and(|e| e.done())
            {
                self.state.finish_clear();
                self.clear_effect = None;
                self.clear_effect_process_time = None;
            }

            let line_interval = Duration::from_secs_f64(1.0 / self.line_rate);
            let gravity_interval = Duration::from_secs_f64(1.0 / self.args.gravity_rate);

            // Limit event polling to hit ~60 FPS rendering (16ms)
            let frame_duration = Duration::from_millis(16);
            let timeout = frame_duration.saturating_sub(now.elapsed());

            if self.state.score > self.best_score {
                self.best_score = self.state.score;
            }

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Mouse(mouse) => {
                            let (cols, rows) =
                                crossterm::terminal::size().unwrap_or((80, 24));
                            self.on_mouse(mouse, Rect::new(0, 0, cols, rows));
                        }
                        Event::Key(key) => {
                            let action = key_to_action(key);

                            // Ignore OS repeats and only process first Press;
                            // Release ends our own repeat for that action.
                            if key.kind != KeyEventKind::Press {
                                if key.kind == KeyEventKind::Release
                                    && self.repeat_state.map(|(a, _)| a) == Some(action)
                                {
                                    self.repeat_state = None;
                                    self.last_repeat_fire = None;
                                }
                                continue;
                            }
                            if self.repeat_state.map(|(a, _)| a) == Some(action) {
                                continue;
                            }

                            match self.screen {
                                Screen::Menu => match action {
                                    Action::Quit => return Ok(()),
                                    Action::MoveLeft => self.menu_value_prev(),
                                    Action::MoveRight => self.menu_value_next(),
                                    Action::MoveDown => {
                                        self.menu_state.current_tab =
                                            match self.menu_state.current_tab {
                                                MenuTab::Difficulty => MenuTab::Lines,
                                                MenuTab::Lines => MenuTab::Start,
                                                MenuTab::Start => MenuTab::Difficulty,
                                            };
                                    }
                                    Action::MoveUp => {
                                        self.menu_state.current_tab =
                                            match self.menu_state.current_tab {
                                                MenuTab::Difficulty => MenuTab::Start,
                                                MenuTab::Lines => MenuTab::Difficulty,
                                                MenuTab::Start => MenuTab::Lines,
                                            };
                                    }
                                    Action::Pop => {
                                        if self.menu_state.current_tab == MenuTab::Start {
                                            self.start_from_menu();
                                        } else {
                                            self.menu_state.current_tab = MenuTab::Start;
                                        }
                                    }
                                    _ => {}
                                },
                                Screen::Playing => {
                                    if self.paused {
                                        if action == Action::Pause {
                                            self.paused = false;
                                        } else if action == Action::Quit {
                                            self.screen = Screen::QuitMenu;
                                            self.quit_selected = QuitOption::Resume;
                                        }
                                    } else if action == Action::Pause {
                                        self.paused = true;
                                    } else if action == Action::Quit {
                                        self.screen = Screen::QuitMenu;
                                        self.quit_selected = QuitOption::Resume;
                                    } else {
                                        self.apply_action(action);
                                        let repeatable = matches!(
                                            action,
                                            Action::MoveLeft
                                                | Action::MoveRight
                                                | Action::MoveUp
                                                | Action::MoveDown
                                        );
                                        if repeatable {
                                            self.repeat_state = Some((action, Instant::now()));
                                            self.last_repeat_fire = None;
                                        }
                                    }
                                }
                                Screen::QuitMenu => match action {
                                    Action::MoveDown | Action::MoveRight => {
                                        self.quit_selected = match self.quit_selected {
                                            QuitOption::Resume => QuitOption::MainMenu,
                                            QuitOption::MainMenu => QuitOption::Exit,
                                            QuitOption::Exit => QuitOption::Resume,
                                        };
                                    }
                                    Action::MoveUp | Action::MoveLeft => {
                                        self.quit_selected = match self.quit_selected {
                                            QuitOption::Resume => QuitOption::Exit,
                                            QuitOption::MainMenu => QuitOption::Resume,
                                            QuitOption::Exit => QuitOption::MainMenu,
                                        };
                                    }
                                    Action::Pop => match self.quit_selected {
                                        QuitOption::Resume => self.screen = Screen::Playing,
                                        QuitOption::MainMenu => {
                                            self.screen = Screen::Menu;
                                            self.menu_state.animation_start = Instant::now();
                                        }
                                        QuitOption::Exit => return Ok(()),
                                    },
                                    Action::Pause | Action::Quit => {
                                        self.screen = Screen::Playing;
                                    }
                                    _ => {}
                                },
                                Screen::GameOver => match action {
                                    Action::Quit => return Ok(()),
                                    Action::Restart => self.reset_game(),
                                    Action::Pop => {
                                        self.screen = Screen::Menu;
                                        self.menu_state.animation_start = Instant::now();
                                    }
                                    _ => {}
                                },
                            }
                        }
                        _ => {}
                    }
                }
            }

            if self.screen == Screen::Playing && !self.paused {
                self.tick_repeat();
                if self.last_line_step.elapsed() >= line_interval {
                    self.last_line_step = Instant::now();
                    self.state.tick_line();
                }
                if self.last_gravity_step.elapsed() >= gravity_interval {
                    self.last_gravity_step = Instant::now();
                    self.state.tick_gravity();
                }
                if self.state.clear_in_progress && self.args.no_animation {
                    self.state.finish_clear();
                }
                if self.state.game_over {
                    self.game_over_reason = Some(GameOverReason::Overflow);
                    self.screen = Screen::GameOver;
                } else if self.state.victory {
                    self.game_over_reason = Some(GameOverReason::Victory);
                    self.screen = Screen::GameOver;
                }
            }
        }
    }

    fn menu_value_prev(&mut self) {
        match self.menu_state.current_tab {
            MenuTab::Difficulty => {
                self.menu_state.selected_difficulty = match self.menu_state.selected_difficulty {
                    Difficulty::Easy => Difficulty::Hard,
                    Difficulty::Medium => Difficulty::Easy,
                    Difficulty::Hard => Difficulty::Medium,
                };
            }
            MenuTab::Lines => {
                let i = LINE_BUDGETS
                    .iter()
                    .position(|&n| n == self.menu_state.selected_lines)
                    .unwrap_or(1);
                self.menu_state.selected_lines =
                    LINE_BUDGETS[(i + LINE_BUDGETS.len() - 1) % LINE_BUDGETS.len()];
            }
            MenuTab::Start => {}
        }
    }

    fn menu_value_next(&mut self) {
        match self.menu_state.current_tab {
            MenuTab::Difficulty => {
                self.menu_state.selected_difficulty = match self.menu_state.selected_difficulty {
                    Difficulty::Easy => Difficulty::Medium,
                    Difficulty::Medium => Difficulty::Hard,
                    Difficulty::Hard => Difficulty::Easy,
                };
            }
            MenuTab::Lines => {
                let i = LINE_BUDGETS
                    .iter()
                    .position(|&n| n == self.menu_state.selected_lines)
                    .unwrap_or(1);
                self.menu_state.selected_lines = LINE_BUDGETS[(i + 1) % LINE_BUDGETS.len()];
            }
            MenuTab::Start => {}
        }
    }
}
