//! Collapstui — Collapse-style tile-popping puzzle game in the terminal.

mod app;
mod game;
mod input;
mod theme;
mod ui;

use anyhow::{Result, ensure};
use app::App;
use clap::{Parser, ValueEnum};

/// Options derived from CLI that affect game behaviour (line budget, group
/// threshold, bomb radius, rng seed).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub lines: u32,
    pub min_group: usize,
    pub bomb_radius: usize,
    pub seed: Option<u64>,
    pub difficulty: Difficulty,
}

fn main() -> Result<()> {
    let args = Args::parse();
    ensure!(
        (4..=32).contains(&args.width),
        "--width must be between 4 and 32 columns"
    );
    ensure!(
        (4..=32).contains(&args.height),
        "--height must be between 4 and 32 rows"
    );
    ensure!(args.min_group >= 2, "--min-group must be at least 2");
    ensure!(args.lines >= 1, "--lines must be at least 1");
    ensure!(
        args.tick_rate.is_none_or(|r| r > 0.0),
        "--tick-rate must be positive"
    );
    ensure!(args.gravity_rate > 0.0, "--gravity-rate must be positive");
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = GameConfig {
        lines: args.lines,
        min_group: args.min_group as usize,
        bomb_radius: args.bomb_radius as usize,
        seed: args.seed,
        difficulty: args.difficulty,
    };
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Collapse-style tile-popping puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "collapstui",
    version,
    about = "Collapse-style tile-popping puzzle in the terminal. Rows of coloured tiles rise from the bottom; pop 4-connected groups of 3+ before the stack hits the top.",
    long_about = "Collapstui is a terminal puzzle game in the Collapse/SameGame family.\n\n\
        Tiles are dealt one by one into the staging row at the bottom; each completed row \
        pushes the whole stack up. Pop 4-connected groups of 3 or more same-coloured tiles \
        to score (+1 per tile); bombs clear a square blast radius. Gravity closes vertical \
        gaps, then drains leftovers toward the centre. Survive the whole line budget and \
        clear every remaining group to win.\n\n\
        CONTROLS (normal):\n  Arrows      Move cursor  Enter/Space  Pop group\n  P           Pause        Q / Esc      Quit menu\n\n\
        CONTROLS (vim):\n  h/j/k/l     Move cursor  Space        Pop group\n  p           Pause        q            Quit menu\n\n\
        The mouse works too: left-click a tile to pop its group. Hold a movement key to keep \
        the cursor moving. Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Difficulty: easy, medium, or hard. Affects how quickly new tiles are dealt.
    #[arg(short, long, default_value = "easy")]
    pub difficulty: Difficulty,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Playfield width in columns (grid cells).
    #[arg(long, default_value = "12", value_name = "COLS")]
    pub width: u16,

    /// Playfield height in rows (grid cells), staging row excluded.
    #[arg(long, default_value = "16", value_name = "ROWS")]
    pub height: u16,

    /// Line budget: rows dealt before the endgame scan starts.
    #[arg(short, long, default_value = "100", value_name = "N")]
    pub lines: u32,

    /// Minimum group size eligible for popping.
    #[arg(long, default_value = "3", value_name = "N")]
    pub min_group: u16,

    /// Bomb blast radius (Chebyshev distance, clamped to the grid).
    #[arg(long, default_value = "3", value_name = "R")]
    pub bomb_radius: u16,

    /// Line-builder steps per second (one tile dealt per step). Overrides the difficulty default.
    #[arg(long, value_name = "RATE")]
    pub tick_rate: Option<f64>,

    /// Gravity steps per second (vertical fall, then sideways drain).
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub gravity_rate: f64,

    /// RNG seed for a reproducible tile pool.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Disable the group-clear fade (instant removal).
    #[arg(long)]
    pub no_animation: bool,

    /// Skip main menu and start game immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Disable mouse capture (keyboard only).
    #[arg(long)]
    pub no_mouse: bool,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}
