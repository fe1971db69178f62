//! Game state: board, tile pool, group matching, gravity, line lifecycle.

use crate::theme::Theme;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Number of tile colours (indices into theme.tile_color).
pub const TILE_COLORS: u8 = 3;

/// One in BOMB_ODDS pool entries is a bomb.
const BOMB_ODDS: u32 = 300;

/// Single cell: empty, a coloured tile, or a bomb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Tile(u8), // colour index 0..TILE_COLORS
    Bomb,
}

impl Cell {
    #[inline]
    pub fn is_occupied(&self) -> bool {
        !matches!(self, Self::Empty)
    }
}

/// Board: playable rows 0..height (row 0 is the top) plus the staging row at
/// index `height`, where new tiles sit before the next upward shift.
#[derive(Debug, Clone)]
pub struct Board {
    pub width: usize,
    pub height: usize,
    /// rows[y][x]; rows[height] is the staging row.
    rows: VecDeque<Vec<Cell>>,
}

impl Board {
    pub fn new(width: u16, height: u16) -> Self {
        let (w, h) = (width as usize, height as usize);
        let rows = (0..=h).map(|_| vec![Cell::Empty; w]).collect();
        Self {
            width: w,
            height: h,
            rows,
        }
    }

    #[inline]
    pub fn staging_row(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        if x >= self.width {
            return None;
        }
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width {
            if let Some(row) = self.rows.get_mut(y) {
                row[x] = cell;
            }
        }
    }

    /// 4-connected same-colour group containing (x, y), each cell visited at
    /// most once (explicit stack; neighbours pushed up, right, down, left).
    /// Empty cells and bombs have no group; the staging row is never entered.
    pub fn group_at(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        if x >= self.width || y >= self.height {
            return Vec::new();
        }
        let color = match self.rows[y][x] {
            Cell::Tile(c) => c,
            _ => return Vec::new(),
        };

        let mut visited = vec![false; self.width * self.height];
        let mut group = Vec::new();
        let mut stack = vec![(x, y)];
        visited[y * self.width + x] = true;

        while let Some((cx, cy)) = stack.pop() {
            group.push((cx, cy));
            let neighbours = [
                (cx as isize, cy as isize - 1),
                (cx as isize + 1, cy as isize),
                (cx as isize, cy as isize + 1),
                (cx as isize - 1, cy as isize),
            ];
            for (nx, ny) in neighbours {
                if nx < 0 || ny < 0 || nx >= self.width as isize || ny >= self.height as isize {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                let idx = ny * self.width + nx;
                if !visited[idx] && self.rows[ny][nx] == Cell::Tile(color) {
                    visited[idx] = true;
                    stack.push((nx, ny));
                }
            }
        }
        group
    }

    /// True if any tile group of at least `min_group` exists on the playable
    /// rows. Used for the win scan once the line budget is spent.
    pub fn has_clearable_group(&self, min_group: usize) -> bool {
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                if matches!(self.rows[y][x], Cell::Tile(_))
                    && self.group_at(x, y).len() >= min_group
                {
                    return true;
                }
            }
        }
        false
    }

    /// Vertical gravity phase: scanning playable rows bottom-to-top, every
    /// occupied cell with an empty cell directly below moves down one row.
    /// The staging row does not fall. Returns true when nothing moved.
    pub fn settle_vertical(&mut self) -> bool {
        let mut settled = true;
        if self.height < 2 {
            return settled;
        }
        for y in (0..self.height - 1).rev() {
            for x in 0..self.width {
                if self.rows[y][x].is_occupied() && self.rows[y + 1][x] == Cell::Empty {
                    settled = false;
                    self.rows[y + 1][x] = self.rows[y][x];
                    self.rows[y][x] = Cell::Empty;
                }
            }
        }
        settled
    }

    /// Horizontal gravity phase: drain cells one step toward the centre
    /// column, gated on the destination column's bottom playable cell being
    /// empty. The column scan ascends, so left-half cells can slide several
    /// columns in one pass while right-half cells move at most one.
    pub fn drain_sideways(&mut self) {
        if self.width < 2 || self.height == 0 {
            return;
        }
        let bottom = self.height - 1;
        let mid = self.width / 2;
        for x in 0..self.width {
            for y in 0..self.height {
                let dest = if x < mid { x + 1 } else { x - 1 };
                if self.rows[bottom][dest].is_occupied() {
                    continue;
                }
                if self.rows[y][x].is_occupied() && self.rows[y][dest] == Cell::Empty {
                    self.rows[y][dest] = self.rows[y][x];
                    self.rows[y][x] = Cell::Empty;
                }
            }
        }
    }

    /// Shift every row up by one; the staging row enters the play area and a
    /// fresh staging row appears. Returns true (and leaves the board
    /// untouched) when row 0 held any occupied cell at the moment of the
    /// shift, the overflow that ends the session.
    pub fn shift_rows_up(&mut self) -> bool {
        if self.rows[0].iter().any(Cell::is_occupied) {
            return true;
        }
        self.rows.pop_front();
        self.rows.push_back(vec![Cell::Empty; self.width]);
        false
    }
}

/// Pre-shuffled tile sequence for a whole session (`lines × width` entries),
/// consumed front-to-back; rebuilt and reshuffled on restart.
#[derive(Debug, Clone)]
pub struct TilePool {
    queue: Vec<Cell>,
    next: usize,
}

impl TilePool {
    pub fn new(lines: u32, width: usize, rng: &mut StdRng) -> Self {
        let len = lines as usize * width;
        let mut queue: Vec<Cell> = (0..len)
            .map(|_| {
                if rng.random_range(0..BOMB_ODDS) == 0 {
                    Cell::Bomb
                } else {
                    Cell::Tile(rng.random_range(0..TILE_COLORS))
                }
            })
            .collect();
        queue.shuffle(rng);
        Self { queue, next: 0 }
    }

    /// Next pool entry, or None once the session's supply is exhausted.
    pub fn draw(&mut self) -> Option<Cell> {
        let cell = self.queue.get(self.next).copied();
        if cell.is_some() {
            self.next += 1;
        }
        cell
    }

    pub fn remaining(&self) -> usize {
        self.queue.len() - self.next
    }
}

/// Session state: board, pool, counters, cursor, pending clear.
#[derive(Debug)]
pub struct GameState {
    pub theme: Theme,
    pub board: Board,
    pub pool: TilePool,
    pub score: u32,
    pub lines_left: u32,
    /// Next staging column to fill, 1..=width; past width the row is complete
    /// and the next line step shifts the board up.
    pub fill_column: usize,
    pub cursor: (usize, usize),
    pub min_group: usize,
    pub bomb_radius: usize,
    pub game_over: bool,
    pub victory: bool,
    /// Cells awaiting removal (clear fade); zeroed by finish_clear.
    pub clear_cells: Vec<(usize, usize)>,
    pub clear_in_progress: bool,
    pub tiles_cleared: u32,
    lines_total: u32,
}

impl GameState {
    pub fn new(theme: Theme, width: u16, height: u16, config: &crate::GameConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let board = Board::new(width, height);
        let pool = TilePool::new(config.lines, board.width, &mut rng);
        let cursor = (board.width / 2, board.height / 2);
        Self {
            theme,
            board,
            pool,
            score: 0,
            lines_left: config.lines,
            fill_column: 1,
            cursor,
            min_group: config.min_group,
            bomb_radius: config.bomb_radius,
            game_over: false,
            victory: false,
            clear_cells: Vec::new(),
            clear_in_progress: false,
            tiles_cleared: 0,
            lines_total: config.lines,
        }
    }

    /// Session still accepts ticks and player actions.
    #[inline]
    pub fn in_play(&self) -> bool {
        !self.game_over && !self.victory
    }

    /// Fraction of the line budget already fed in, for the progress gauge.
    pub fn lines_progress(&self) -> f64 {
        if self.lines_total == 0 {
            return 1.0;
        }
        f64::from(self.lines_total - self.lines_left) / f64::from(self.lines_total)
    }

    /// One line-builder step: inject the next pool entry into the staging row
    /// and advance the fill column, or shift the board up once the row is
    /// complete. After the line budget is spent, each step instead runs the
    /// exhaustive match scan and flips to victory when nothing is clearable.
    pub fn tick_line(&mut self) {
        if !self.in_play() || self.clear_in_progress {
            return;
        }
        if self.lines_left > 0 {
            if self.fill_column > self.board.width {
                if self.board.shift_rows_up() {
                    self.game_over = true;
                    return;
                }
                self.lines_left = self.lines_left.saturating_sub(1);
                self.fill_column = 1;
            } else {
                // An exhausted pool skips placement; the column still advances.
                if let Some(cell) = self.pool.draw() {
                    let staging = self.board.staging_row();
                    self.board.set(self.fill_column - 1, staging, cell);
                }
                self.fill_column += 1;
            }
        } else if !self.board.has_clearable_group(self.min_group) {
            self.victory = true;
        }
    }

    /// One gravity step: vertical compaction, then sideways draining once the
    /// board is vertically settled within the same tick.
    pub fn tick_gravity(&mut self) {
        if !self.in_play() || self.clear_in_progress {
            return;
        }
        if self.board.settle_vertical() {
            self.board.drain_sideways();
        }
    }

    /// Pop the group at (x, y): bombs detonate, tile groups of at least
    /// `min_group` score +1 per tile and are staged for clearing. Empty
    /// cells, staging-row cells and sub-threshold groups are no-ops.
    pub fn pop_at(&mut self, x: usize, y: usize) {
        if !self.in_play() || self.clear_in_progress || y >= self.board.height {
            return;
        }
        match self.board.get(x, y) {
            Some(Cell::Bomb) => self.detonate_at(x, y),
            Some(Cell::Tile(_)) => {
                let group = self.board.group_at(x, y);
                if group.len() >= self.min_group {
                    self.score += group.len() as u32;
                    self.tiles_cleared += group.len() as u32;
                    self.clear_cells = group;
                    self.clear_in_progress = true;
                }
            }
            _ => {}
        }
    }

    /// Clear every cell within the bomb radius (Chebyshev), clamped to the
    /// playable grid. Coloured tiles score +1 each; bombs caught in the
    /// blast clear without scoring.
    pub fn detonate_at(&mut self, x: usize, y: usize) {
        if !self.in_play() || self.clear_in_progress || y >= self.board.height {
            return;
        }
        let left = x.saturating_sub(self.bomb_radius);
        let top = y.saturating_sub(self.bomb_radius);
        let right = (x + self.bomb_radius).min(self.board.width - 1);
        let bottom = (y + self.bomb_radius).min(self.board.height - 1);

        let mut affected = Vec::new();
        for cx in left..=right {
            for cy in top..=bottom {
                match self.board.get(cx, cy) {
                    Some(Cell::Tile(_)) => {
                        self.score += 1;
                        self.tiles_cleared += 1;
                        affected.push((cx, cy));
                    }
                    Some(Cell::Bomb) => affected.push((cx, cy)),
                    _ => {}
                }
            }
        }
        if !affected.is_empty() {
            self.clear_cells = affected;
            self.clear_in_progress = true;
        }
    }

    /// Pop whatever the cursor is on.
    pub fn pop_at_cursor(&mut self) {
        let (x, y) = self.cursor;
        self.pop_at(x, y);
    }

    /// Zero the staged cells. Called immediately under --no-animation,
    /// otherwise when the clear fade finishes.
    pub fn finish_clear(&mut self) {
        for &(x, y) in &self.clear_cells {
            self.board.set(x, y, Cell::Empty);
        }
        self.clear_cells.clear();
        self.clear_in_progress = false;
    }

    /// Move the cursor, clamped to the playable rows.
    pub fn move_cursor(&mut self, dx: isize, dy: isize) {
        let (x, y) = self.cursor;
        let nx = x.saturating_add_signed(dx).min(self.board.width - 1);
        let ny = y.saturating_add_signed(dy).min(self.board.height - 1);
        self.cursor = (nx, ny);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Difficulty, GameConfig};

    fn config(lines: u32) -> GameConfig {
        GameConfig {
            lines,
            min_group: 3,
            bomb_radius: 3,
            seed: Some(7),
            difficulty: Difficulty::Easy,
        }
    }

    fn state(width: u16, height: u16, lines: u32) -> GameState {
        GameState::new(Theme::default(), width, height, &config(lines))
    }

    /// Board from rows of codes: 0 empty, 1..=3 tile colour, -1 bomb.
    /// The staging row is appended empty.
    fn board_from(codes: &[&[i8]]) -> Board {
        let height = codes.len();
        let width = codes[0].len();
        let mut board = Board::new(width as u16, height as u16);
        for (y, row) in codes.iter().enumerate() {
            for (x, &code) in row.iter().enumerate() {
                let cell = match code {
                    0 => Cell::Empty,
                    -1 => Cell::Bomb,
                    c => Cell::Tile((c - 1) as u8),
                };
                board.set(x, y, cell);
            }
        }
        board
    }

    fn occupied_count(board: &Board) -> usize {
        let mut n = 0;
        for y in 0..=board.height {
            for x in 0..board.width {
                if board.get(x, y).is_some_and(|c| c.is_occupied()) {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn group_count_is_start_cell_independent() {
        let board = board_from(&[
            &[1, 1, 0, 2],
            &[0, 1, 1, 2],
            &[0, 0, 1, 0],
            &[0, 0, 0, 0],
        ]);
        let sizes: Vec<usize> = [(0, 0), (1, 0), (1, 1), (2, 1), (2, 2)]
            .iter()
            .map(|&(x, y)| board.group_at(x, y).len())
            .collect();
        assert!(sizes.iter().all(|&n| n == 5));
        assert_eq!(board.group_at(3, 0).len(), 2);
    }

    #[test]
    fn empty_and_bomb_cells_have_no_group() {
        let board = board_from(&[&[0, -1, 1], &[0, -1, 1], &[0, -1, 1]]);
        assert!(board.group_at(0, 0).is_empty());
        assert!(board.group_at(1, 1).is_empty());
        assert_eq!(board.group_at(2, 0).len(), 3);
    }

    #[test]
    fn group_never_reaches_staging_row() {
        let mut board = board_from(&[&[1, 0, 0], &[1, 0, 0]]);
        board.set(0, board.staging_row(), Cell::Tile(0));
        assert_eq!(board.group_at(0, 0).len(), 2);
        assert!(board.group_at(0, board.staging_row()).is_empty());
    }

    #[test]
    fn sub_threshold_group_is_not_cleared() {
        let mut st = state(4, 4, 1);
        st.board = board_from(&[
            &[0, 0, 0, 0],
            &[0, 0, 0, 0],
            &[0, 0, 0, 0],
            &[1, 1, 0, 0],
        ]);
        st.pop_at(0, 3);
        assert_eq!(st.score, 0);
        assert!(!st.clear_in_progress);
        assert!(st.board.get(0, 3).unwrap().is_occupied());
    }

    #[test]
    fn full_group_clears_and_scores() {
        for start in 0..3 {
            let mut s = state(3, 2, 1);
            s.board = board_from(&[&[1, 1, 1], &[0, 0, 0]]);
            s.pop_at(start, 0);
            s.finish_clear();
            assert_eq!(s.score, 3);
            assert_eq!(occupied_count(&s.board), 0);
        }
    }

    #[test]
    fn clear_is_all_or_nothing() {
        // An L of 4 reds next to 2 greens: popping red takes all 4 reds and
        // leaves both greens.
        let mut st = state(4, 3, 1);
        st.board = board_from(&[
            &[1, 0, 0, 0],
            &[1, 1, 1, 2],
            &[0, 0, 0, 2],
        ]);
        st.pop_at(1, 1);
        st.finish_clear();
        assert_eq!(st.score, 4);
        assert_eq!(occupied_count(&st.board), 2);
        assert_eq!(st.board.get(3, 1), Some(Cell::Tile(1)));
    }

    #[test]
    fn vertical_gravity_reaches_fixpoint() {
        let mut board = board_from(&[
            &[1, 0, 2],
            &[0, 0, 0],
            &[2, 0, 0],
            &[0, 3, 0],
            &[0, 0, 0],
        ]);
        while !board.settle_vertical() {}
        for y in 0..board.height - 1 {
            for x in 0..board.width {
                if board.get(x, y).unwrap().is_occupied() {
                    assert!(
                        board.get(x, y + 1).unwrap().is_occupied(),
                        "floating cell at ({x}, {y})"
                    );
                }
            }
        }
        assert_eq!(occupied_count(&board), 4);
    }

    #[test]
    fn vertical_gravity_leaves_staging_row_alone() {
        let mut board = Board::new(3, 3);
        board.set(1, board.staging_row(), Cell::Tile(2));
        assert!(board.settle_vertical());
        assert_eq!(board.get(1, board.staging_row()), Some(Cell::Tile(2)));
    }

    #[test]
    fn drain_carries_left_half_cells_toward_centre() {
        // One pass: the ascending scan slides the tile rightward up to the
        // centre column, where the right-half rule hands it back one step.
        let mut board = board_from(&[
            &[0, 0, 0, 0],
            &[0, 0, 0, 0],
            &[1, 0, 0, 0],
        ]);
        board.drain_sideways();
        assert_eq!(board.get(0, 2), Some(Cell::Empty));
        assert_eq!(board.get(1, 2), Some(Cell::Tile(0)));
        // Fixpoint: later passes shuffle it across the centre seam and back.
        board.drain_sideways();
        assert_eq!(board.get(1, 2), Some(Cell::Tile(0)));
    }

    #[test]
    fn drain_moves_right_half_one_column_per_pass() {
        let mut board = board_from(&[
            &[0, 0, 0, 0],
            &[0, 0, 0, 0],
            &[0, 0, 0, 1],
        ]);
        board.drain_sideways();
        assert_eq!(board.get(3, 2), Some(Cell::Empty));
        assert_eq!(board.get(2, 2), Some(Cell::Tile(0)));
        board.drain_sideways();
        assert_eq!(board.get(1, 2), Some(Cell::Tile(0)));
    }

    #[test]
    fn drain_guard_blocks_into_occupied_bottom_column() {
        // Destination column's bottom playable cell is occupied, so the
        // stacked cell above must not drain into it.
        let mut board = board_from(&[
            &[0, 0, 0, 0],
            &[1, 0, 0, 0],
            &[0, 2, 0, 0],
        ]);
        board.drain_sideways();
        assert_eq!(board.get(0, 1), Some(Cell::Tile(0)));
    }

    #[test]
    fn row_shift_decrements_lines_once_and_never_negative() {
        let mut st = state(3, 3, 1);
        st.fill_column = st.board.width + 1;
        st.tick_line();
        assert_eq!(st.lines_left, 0);
        assert_eq!(st.fill_column, 1);
        // Budget spent: further steps run the win scan, not the decrement.
        st.tick_line();
        assert_eq!(st.lines_left, 0);
    }

    #[test]
    fn row_shift_moves_staging_into_play() {
        let mut st = state(3, 3, 2);
        let staging = st.board.staging_row();
        st.board.set(0, staging, Cell::Tile(1));
        st.fill_column = st.board.width + 1;
        st.tick_line();
        assert_eq!(st.board.get(0, st.board.height - 1), Some(Cell::Tile(1)));
        assert_eq!(st.board.get(0, st.board.staging_row()), Some(Cell::Empty));
    }

    #[test]
    fn occupied_top_row_at_shift_is_game_over() {
        let mut st = state(3, 3, 5);
        st.board.set(1, 0, Cell::Tile(0));
        st.fill_column = st.board.width + 1;
        let lines_before = st.lines_left;
        st.tick_line();
        assert!(st.game_over);
        assert!(!st.in_play());
        assert_eq!(st.lines_left, lines_before);
    }

    #[test]
    fn fill_steps_walk_the_staging_row() {
        let mut st = state(4, 4, 2);
        for expected in 1..=st.board.width {
            assert_eq!(st.fill_column, expected);
            st.tick_line();
        }
        let staging = st.board.staging_row();
        let placed = (0..st.board.width)
            .filter(|&x| st.board.get(x, staging).unwrap().is_occupied())
            .count();
        assert_eq!(placed, st.board.width);
        assert_eq!(st.fill_column, st.board.width + 1);
    }

    #[test]
    fn bomb_clears_exactly_the_clamped_square() {
        let mut st = state(6, 6, 1);
        st.bomb_radius = 2;
        st.board = board_from(&[
            &[1, 1, 1, 1, 1, 1],
            &[1, 1, 1, 1, 1, 1],
            &[1, -1, 1, 1, 1, 1],
            &[1, 1, 1, 1, 1, 1],
            &[1, 1, 1, 1, 1, 1],
            &[1, 1, 1, 1, 1, 1],
        ]);
        st.pop_at(1, 2);
        st.finish_clear();
        // Blast square [0..=3] x [0..=4] clamped at the left edge: 4 wide,
        // 5 tall, minus the bomb itself = 19 tiles.
        assert_eq!(st.score, 19);
        for y in 0..st.board.height {
            for x in 0..st.board.width {
                let inside = x <= 3 && y <= 4;
                assert_eq!(
                    st.board.get(x, y).unwrap().is_occupied(),
                    !inside,
                    "cell ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn bombs_in_blast_clear_without_scoring() {
        let mut st = state(4, 4, 1);
        st.board = board_from(&[
            &[0, 0, 0, 0],
            &[0, -1, -1, 0],
            &[0, 2, 0, 0],
            &[0, 0, 0, 0],
        ]);
        st.pop_at(1, 1);
        st.finish_clear();
        assert_eq!(st.score, 1);
        assert_eq!(occupied_count(&st.board), 0);
    }

    #[test]
    fn actions_are_noops_outside_active_play() {
        let mut st = state(3, 2, 1);
        st.board = board_from(&[&[1, 1, 1], &[0, 0, 0]]);
        st.game_over = true;
        st.pop_at(0, 0);
        assert_eq!(st.score, 0);
        assert!(!st.clear_in_progress);

        st.game_over = false;
        st.victory = true;
        st.pop_at(0, 0);
        assert_eq!(st.score, 0);
    }

    #[test]
    fn actions_are_noops_on_staging_row_and_while_clearing() {
        let mut st = state(3, 2, 1);
        st.board = board_from(&[&[1, 1, 1], &[2, 2, 2]]);
        st.board.set(0, st.board.staging_row(), Cell::Tile(0));
        st.pop_at(0, st.board.staging_row());
        assert_eq!(st.score, 0);

        st.pop_at(0, 0);
        assert!(st.clear_in_progress);
        let score = st.score;
        st.pop_at(0, 1);
        assert_eq!(st.score, score);
    }

    #[test]
    fn no_clearable_group_on_alternating_grid_wins() {
        let mut st = state(4, 4, 1);
        st.lines_left = 0;
        st.board = board_from(&[
            &[1, 2, 1, 2],
            &[2, 1, 2, 1],
            &[1, 2, 1, 2],
            &[2, 1, 2, 1],
        ]);
        assert!(!st.board.has_clearable_group(st.min_group));
        st.tick_line();
        assert!(st.victory);
    }

    #[test]
    fn win_scan_ignores_leftover_bombs() {
        let mut st = state(4, 4, 1);
        st.lines_left = 0;
        st.board = board_from(&[
            &[0, 0, 0, 0],
            &[0, 0, 0, 0],
            &[-1, -1, 0, 0],
            &[-1, -1, 0, 0],
        ]);
        st.tick_line();
        assert!(st.victory);
    }

    #[test]
    fn remaining_matches_block_the_win() {
        let mut st = state(4, 4, 1);
        st.lines_left = 0;
        st.board = board_from(&[
            &[0, 0, 0, 0],
            &[0, 0, 0, 0],
            &[0, 0, 0, 0],
            &[3, 3, 3, 0],
        ]);
        st.tick_line();
        assert!(!st.victory);
        assert!(st.in_play());
    }

    #[test]
    fn pool_is_reproducible_under_a_seed() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let mut pa = TilePool::new(10, 12, &mut a);
        let mut pb = TilePool::new(10, 12, &mut b);
        assert_eq!(pa.remaining(), 120);
        for _ in 0..120 {
            assert_eq!(pa.draw(), pb.draw());
        }
        assert_eq!(pa.draw(), None);
        assert_eq!(pa.remaining(), 0);
    }

    #[test]
    fn exhausted_pool_still_advances_the_fill_column() {
        let mut st = state(3, 3, 1);
        while st.pool.draw().is_some() {}
        st.tick_line();
        assert_eq!(st.fill_column, 2);
        assert_eq!(st.board.get(0, st.board.staging_row()), Some(Cell::Empty));
    }

    #[test]
    fn cursor_clamps_to_playable_area() {
        let mut st = state(4, 4, 1);
        st.move_cursor(-10, -10);
        assert_eq!(st.cursor, (0, 0));
        st.move_cursor(10, 10);
        assert_eq!(st.cursor, (3, 3));
    }

    #[test]
    fn gravity_tick_runs_horizontal_only_after_settling() {
        let mut st = state(4, 4, 1);
        st.board = board_from(&[
            &[0, 0, 0, 0],
            &[1, 0, 0, 0],
            &[0, 0, 0, 0],
            &[0, 0, 0, 0],
        ]);
        // First tick: still falling, no sideways motion.
        st.tick_gravity();
        assert_eq!(st.board.get(0, 2), Some(Cell::Tile(0)));
        assert_eq!(st.board.get(1, 2), Some(Cell::Empty));
        // Falls to the floor, then the settled tick drains it toward centre.
        st.tick_gravity();
        assert_eq!(st.board.get(0, 3), Some(Cell::Tile(0)));
        st.tick_gravity();
        assert_eq!(st.board.get(1, 3), Some(Cell::Tile(0)));
    }
}
