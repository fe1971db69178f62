//! Layout and drawing: menu, board, sidebar, pause, game over, clear fade.

use crate::app::{GameOverReason, MenuState, MenuTab, QuitOption, Screen};
use crate::game::{Cell, GameState};
use crate::{Difficulty, app::LINE_BUDGETS};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each grid cell is drawn as 2 terminal columns × 1 row.
const CELL_W: u16 = 2;
const CELL_H: u16 = 1;

const SIDEBAR_WIDTH: u16 = 22;

/// Duration of the group-clear fade in ms.
const CLEAR_FADE_MS: u32 = 350;

/// Board size in terminal cells (playable rows + staging row + border).
fn board_pixel_size(width: u16, height: u16) -> (u16, u16) {
    (width * CELL_W + 2, (height + 1) * CELL_H + 2)
}

/// Board inner rect (no border) for given area and state; matches draw_game layout.
fn board_rect(area: Rect, state: &GameState) -> Rect {
    let (pw, ph) = board_pixel_size(state.board.width as u16, state.board.height as u16);
    let total_w = pw + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(ph) / 2;
    let outer = Rect {
        x,
        y,
        width: pw.min(area.width),
        height: ph.min(area.height),
    };
    Rect {
        x: outer.x + 1,
        y: outer.y + 1,
        width: (state.board.width as u16 * CELL_W).min(outer.width.saturating_sub(2)),
        height: ((state.board.height as u16 + 1) * CELL_H).min(outer.height.saturating_sub(2)),
    }
}

/// Terminal position → playable grid cell: subtract the board origin, divide
/// by the cell size. The staging row and anything outside the board miss.
pub fn hit_test(area: Rect, state: &GameState, column: u16, row: u16) -> Option<(usize, usize)> {
    let rect = board_rect(area, state);
    if !rect.contains(Position::new(column, row)) {
        return None;
    }
    let x = ((column - rect.x) / CELL_W) as usize;
    let y = ((row - rect.y) / CELL_H) as usize;
    if x >= state.board.width || y >= state.board.height {
        return None;
    }
    Some((x, y))
}

/// Build set of buffer (x, y) positions that belong to clearing cells.
fn clearing_buffer_positions(
    rect: Rect,
    clear_cells: &[(usize, usize)],
) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &(gx, gy) in clear_cells {
        let x0 = rect.x + (gx as u16) * CELL_W;
        let y0 = rect.y + (gy as u16) * CELL_H;
        for bx in x0..(x0 + CELL_W).min(rect.x + rect.width) {
            for by in y0..(y0 + CELL_H).min(rect.y + rect.height) {
                set.insert((bx, by));
            }
        }
    }
    set
}

/// Scale an RGB colour toward black (staging-row tiles are drawn at half
/// brightness until they shift into play).
fn dim(color: Color, factor: f32) -> Color {
    let (r, g, b) = match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Red => (255, 0, 0),
        Color::Green => (0, 255, 0),
        Color::Yellow => (255, 255, 0),
        Color::Blue => (0, 0, 255),
        Color::Magenta => (255, 0, 255),
        Color::Cyan => (0, 255, 255),
        Color::White => (255, 255, 255),
        _ => (128, 128, 128),
    };
    Color::Rgb(
        (r as f32 * factor).min(255.0) as u8,
        (g as f32 * factor).min(255.0) as u8,
        (b as f32 * factor).min(255.0) as u8,
    )
}

/// Create or update the clear fade and process it (TachyonFX: fade the
/// clearing cells to bg, then the app zeroes them).
fn apply_clear_effect(
    frame: &mut Frame,
    state: &GameState,
    area: Rect,
    clear_effect: &mut Option<Effect>,
    clear_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let rect = board_rect(area, state);
    let delta = clear_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    let tfx_delta = TfxDuration::from_millis(delta_ms);
    *clear_process_time = Some(now);

    if clear_effect.is_none() {
        let clearing_set = clearing_buffer_positions(rect, &state.clear_cells);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            clearing_set.contains(&(pos.x, pos.y))
        }));
        let bg = state.theme.bg;
        let effect = fx::fade_to(bg, bg, (CLEAR_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(rect);
        *clear_effect = Some(effect);
    }

    if let Some(effect) = clear_effect {
        frame.render_effect(effect, rect, tfx_delta);
    }
}

/// Draw current screen (menu, game, game over), with optional pause overlay
/// and end-of-session reason. While a clear is pending and animation is on,
/// applies the TachyonFX fade and updates `clear_effect` / `clear_process_time`.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    paused: bool,
    game_over_reason: Option<GameOverReason>,
    area: Rect,
    clear_effect: &mut Option<Effect>,
    clear_process_time: &mut Option<Instant>,
    menu_state: &MenuState,
    now: Instant,
    no_animation: bool,
    quit_selected: Option<QuitOption>,
    best_score: u32,
) {
    match screen {
        Screen::Menu => draw_menu(frame, state, menu_state, area, now),
        Screen::Playing => {
            draw_game(frame, state, area, best_score);
            if paused {
                draw_pause_overlay(frame, state, area);
            }
            if state.clear_in_progress && !state.clear_cells.is_empty() && !no_animation {
                apply_clear_effect(frame, state, area, clear_effect, clear_process_time, now);
            }
        }
        Screen::QuitMenu => {
            draw_game(frame, state, area, best_score);
            if let Some(opt) = quit_selected {
                draw_quit_menu(frame, state, opt);
            }
        }
        Screen::GameOver => draw_game_over(frame, state, game_over_reason, area, best_score),
    }
}

fn draw_menu(
    frame: &mut Frame,
    state: &GameState,
    menu_state: &MenuState,
    area: Rect,
    now: Instant,
) {
    let popup_w = 46u16;
    let popup_h = 19u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };

    let title = Line::from(vec![
        Span::styled(
            " Collaps ",
            Style::default().fg(state.theme.tile_color(0)).bold(),
        ),
        Span::styled(" tui ", Style::default().fg(state.theme.main_fg).bold()),
    ]);

    let highlight_style = Style::default()
        .fg(Color::Black)
        .bg(state.theme.title)
        .bold();
    let selected_style = Style::default().fg(state.theme.title).bold();
    let normal_style = Style::default().fg(state.theme.main_fg);

    fn tab_style(
        current: bool,
        selected: bool,
        highlight: Style,
        select: Style,
        normal: Style,
    ) -> Style {
        if current {
            highlight
        } else if selected {
            select
        } else {
            normal
        }
    }

    let diff_span = |d: Difficulty, label: &'static str| {
        Span::styled(
            label,
            tab_style(
                menu_state.current_tab == MenuTab::Difficulty
                    && menu_state.selected_difficulty == d,
                menu_state.selected_difficulty == d,
                highlight_style,
                selected_style,
                normal_style,
            ),
        )
    };
    let lines_span = |n: u32| {
        Span::styled(
            format!(" {n} "),
            tab_style(
                menu_state.current_tab == MenuTab::Lines && menu_state.selected_lines == n,
                menu_state.selected_lines == n,
                highlight_style,
                selected_style,
                normal_style,
            ),
        )
    };

    let start_btn = if menu_state.current_tab == MenuTab::Start {
        Span::styled(" [ START ] ", highlight_style)
    } else {
        Span::styled(" [ START ] ", normal_style)
    };

    let lines = vec![
        Line::from(""),
        title,
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            " ─ DIFFICULTY ─ ",
            Style::default().fg(state.theme.div_line),
        )),
        Line::from(vec![
            diff_span(Difficulty::Easy, " EASY "),
            Span::from("  "),
            diff_span(Difficulty::Medium, " MEDIUM "),
            Span::from("  "),
            diff_span(Difficulty::Hard, " HARD "),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            " ─ LINE BUDGET ─ ",
            Style::default().fg(state.theme.div_line),
        )),
        Line::from(vec![
            lines_span(LINE_BUDGETS[0]),
            Span::from("  "),
            lines_span(LINE_BUDGETS[1]),
            Span::from("  "),
            lines_span(LINE_BUDGETS[2]),
        ]),
        Line::from(""),
        Line::from(""),
        Line::from(start_btn),
        Line::from(""),
        Line::from(""),
        Line::from(vec![
            Span::styled(" ↕ ", Style::default().fg(state.theme.tile_color(2))),
            Span::from("NAVIGATE   "),
            Span::styled(" ↔ ", Style::default().fg(state.theme.tile_color(2))),
            Span::from("CHANGE   "),
            Span::styled(" ENTER ", Style::default().fg(state.theme.tile_color(2))),
            Span::from("START"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            " [Q] QUIT ",
            Style::default().fg(state.theme.tile_color(0)),
        )),
    ];

    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(state.theme.div_line).bg(state.theme.bg)),
    );

    // Startup animation: slide in from bottom, ease-out cubic
    let elapsed = now.duration_since(menu_state.animation_start).as_millis() as u32;
    let anim_duration = 500u32;
    let t = (elapsed as f32 / anim_duration as f32).min(1.0);
    let offset_t = 1.0 - (1.0 - t).powi(3);
    let anim_y_offset = ((1.0 - offset_t) * 10.0) as u16;
    let mut anim_popup = popup;
    anim_popup.y += anim_y_offset;

    p.render(anim_popup, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, state: &GameState, area: Rect) {
    let popup_w = 28u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P — Resume    Q — Quit ",
            Style::default().fg(state.theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(state.theme.div_line).bg(state.theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_game_over(
    frame: &mut Frame,
    state: &GameState,
    reason: Option<GameOverReason>,
    area: Rect,
    best_score: u32,
) {
    let (pw, ph) = board_pixel_size(state.board.width as u16, state.board.height as u16);
    let total_w = pw + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(ph) / 2;
    let popup = Rect {
        x,
        y,
        width: total_w.min(area.width),
        height: ph.min(area.height),
    };
    let title = match reason {
        Some(GameOverReason::Victory) => Span::styled(
            " You Win! ",
            Style::default().fg(Color::Black).bg(Color::Green),
        ),
        _ => Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        ),
    };
    let mut lines: Vec<Line> = vec![
        Line::from(""),
        Line::from(title),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", state.score),
            Style::default().fg(state.theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Best: {} ", best_score),
            Style::default().fg(state.theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Tiles cleared: {} ", state.tiles_cleared),
            Style::default().fg(state.theme.main_fg),
        )),
    ];
    if reason == Some(GameOverReason::Overflow) {
        lines.push(Line::from(Span::styled(
            format!(" Lines left: {} ", state.lines_left),
            Style::default().fg(state.theme.inactive_fg),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " R — Restart    Enter — Menu    Q — Quit ",
        Style::default().fg(state.theme.main_fg),
    )));
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(state.theme.div_line).bg(state.theme.bg))
            .title(Span::styled(" Collapstui ", state.theme.title)),
    );
    p.render(popup, frame.buffer_mut());
}

/// Draw game: board + sidebar; use full area and center both.
fn draw_game(frame: &mut Frame, state: &GameState, area: Rect, best_score: u32) {
    let (pw, ph) = board_pixel_size(state.board.width as u16, state.board.height as u16);
    let total_w = pw + SIDEBAR_WIDTH;

    let horiz_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let center_horiz = horiz_chunks[1];

    let vert_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(center_horiz);
    let active_area = vert_chunks[1];

    let (board_area, sidebar_area) = {
        let inner = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
            .split(active_area);
        (inner[0], inner[1])
    };

    draw_board(frame, state, board_area);
    draw_sidebar(frame, state, sidebar_area, best_score);
}

fn draw_board(frame: &mut Frame, state: &GameState, area: Rect) {
    let title = format!(" Collapstui  | Lines left: {} ", state.lines_left);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(state.theme.div_line).bg(state.theme.bg))
        .title(Span::styled(title, state.theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let rect = Rect {
        x: inner.x,
        y: inner.y,
        width: (state.board.width as u16 * CELL_W).min(inner.width),
        height: ((state.board.height as u16 + 1) * CELL_H).min(inner.height),
    };

    let clear_set: HashSet<(usize, usize)> = state.clear_cells.iter().copied().collect();
    let flashing = state.clear_in_progress && !state.clear_cells.is_empty();
    let staging = state.board.staging_row();

    let buf = frame.buffer_mut();
    for y in 0..=state.board.height {
        for x in 0..state.board.width {
            let cell = state.board.get(x, y).unwrap_or(Cell::Empty);
            let base = match cell {
                Cell::Tile(i) => state.theme.tile_color(i),
                Cell::Bomb => state.theme.bomb,
                Cell::Empty => state.theme.bg,
            };
            let color = if flashing && clear_set.contains(&(x, y)) {
                Color::White
            } else if y == staging && cell.is_occupied() {
                // Dealt but not yet in play
                dim(base, 0.5)
            } else {
                base
            };

            let rx = rect.x + x as u16 * CELL_W;
            let ry = rect.y + y as u16 * CELL_H;
            if rx + 1 >= rect.x + rect.width || ry >= rect.y + rect.height {
                continue;
            }
            match cell {
                Cell::Bomb => {
                    buf[(rx, ry)]
                        .set_symbol("✹")
                        .set_style(Style::default().fg(Color::Black).bg(color));
                    buf[(rx + 1, ry)]
                        .set_symbol("█")
                        .set_style(Style::default().fg(color).bg(color));
                }
                _ => {
                    for dx in 0..CELL_W {
                        buf[(rx + dx, ry)]
                            .set_symbol("█")
                            .set_style(Style::default().fg(color).bg(color));
                    }
                }
            }
        }
    }

    // Cursor brackets over whatever it sits on
    let (cx, cy) = state.cursor;
    let rx = rect.x + cx as u16 * CELL_W;
    let ry = rect.y + cy as u16 * CELL_H;
    if rx + 1 < rect.x + rect.width && ry < rect.y + rect.height {
        let under = match state.board.get(cx, cy) {
            Some(Cell::Tile(i)) => state.theme.tile_color(i),
            Some(Cell::Bomb) => state.theme.bomb,
            _ => state.theme.bg,
        };
        let style = Style::default().fg(state.theme.title).bg(under).bold();
        buf[(rx, ry)].set_symbol("[").set_style(style);
        buf[(rx + 1, ry)].set_symbol("]").set_style(style);
    }
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, area: Rect, best_score: u32) {
    let title_style = Style::default().fg(state.theme.title);
    let fg_style = Style::default().fg(state.theme.main_fg);
    let border_style = Style::default().fg(state.theme.div_line).bg(state.theme.bg);

    // Free-floating sections with their own borders; vertical layout with small gaps
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Stats (border + score, best, lines, cleared, pool)
            Constraint::Length(1), // gap
            Constraint::Length(4), // Tiles (border + title + strip)
            Constraint::Length(1), // gap
            Constraint::Length(4), // Progress (border + title + gauge)
        ])
        .split(area);

    // --- Stats (own border) ---
    let stats_outer = chunks[0];
    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(stats_outer);
    stats_block.render(stats_outer, frame.buffer_mut());
    let stats_lines = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(state.score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Best: ", title_style),
            Span::styled(best_score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Lines left: ", title_style),
            Span::styled(state.lines_left.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Cleared: ", title_style),
            Span::styled(state.tiles_cleared.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Pool: ", title_style),
            Span::styled(state.pool.remaining().to_string(), fg_style),
        ]),
    ];
    Paragraph::new(ratatui::text::Text::from(stats_lines))
        .render(stats_inner, frame.buffer_mut());

    // --- Tiles (own border): colour strip incl. bomb ---
    let tiles_outer = chunks[2];
    let tiles_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let tiles_inner = tiles_block.inner(tiles_outer);
    tiles_block.render(tiles_outer, frame.buffer_mut());
    let tiles_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(tiles_inner);
    Paragraph::new(Line::from(Span::styled("Tiles", title_style)))
        .render(tiles_layout[0], frame.buffer_mut());
    draw_colour_strip(frame, state, tiles_layout[1]);

    // --- Progress (own border): lines dealt so far ---
    let progress_outer = chunks[4];
    let progress_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let progress_inner = progress_block.inner(progress_outer);
    progress_block.render(progress_outer, frame.buffer_mut());
    let progress_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(progress_inner);
    Paragraph::new(Line::from(Span::styled("Progress", title_style)))
        .render(progress_layout[0], frame.buffer_mut());
    let ratio = state.lines_progress().clamp(0.0, 1.0);
    let bar_color = if ratio > 0.8 {
        Color::Red
    } else if ratio > 0.5 {
        Color::Yellow
    } else {
        Color::Green
    };
    let gauge = Gauge::default()
        .ratio(ratio)
        .gauge_style(Style::default().fg(bar_color));
    gauge.render(progress_layout[1], frame.buffer_mut());
}

/// Draw the three tile colours plus the bomb swatch.
fn draw_colour_strip(frame: &mut Frame, state: &GameState, area: Rect) {
    let block_w = (area.width / 4).max(1);
    for i in 0..4u8 {
        let r = Rect {
            x: area.x + u16::from(i) * block_w,
            y: area.y,
            width: block_w,
            height: area.height.min(1),
        };
        let c = if i < 3 {
            state.theme.tile_color(i)
        } else {
            state.theme.bomb
        };
        let p = Paragraph::new("█").style(Style::default().fg(c).bg(c));
        p.render(r, frame.buffer_mut());
    }
}

pub fn draw_quit_menu(frame: &mut Frame, state: &GameState, selected: QuitOption) {
    let area = frame.area();
    let qw = 24;
    let qh = 8;
    let quit_rect = Rect {
        x: area.x + area.width.saturating_sub(qw) / 2,
        y: area.y + area.height.saturating_sub(qh) / 2,
        width: qw,
        height: qh,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(state.theme.title))
        .title(" Quit? ");

    // Clear background
    for y in quit_rect.y..quit_rect.y + quit_rect.height {
        for x in quit_rect.x..quit_rect.x + quit_rect.width {
            frame.buffer_mut()[(x, y)].set_style(Style::default().bg(state.theme.bg));
        }
    }

    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::MainMenu, " Main Menu "),
        (QuitOption::Exit, " Exit "),
    ];

    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default()
                .fg(state.theme.bg)
                .bg(state.theme.title)
                .bold()
        } else {
            Style::default().fg(state.theme.title)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        frame.buffer_mut().set_string(rx, ry, *label, style);
    }
}
