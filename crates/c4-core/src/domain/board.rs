//! Connect Four board domain entity.
//!
//! The board is a fixed grid of [`Cell`]s stored row-major in a flat vector.
//! Row 0 is the **bottom** row, so a cell's flat index is
//! `row * columns + column`.  Pieces obey gravity: within every column the
//! occupied cells form a contiguous run starting at row 0.
//!
//! Win detection only ever runs around the cell that was just filled, because
//! a new line of four must pass through the latest move.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

/// Standard board height.
pub const DEFAULT_ROWS: usize = 6;
/// Standard board width.
pub const DEFAULT_COLUMNS: usize = 7;
/// Number of same-player cells in a line needed to win.
pub const DEFAULT_WIN_LENGTH: usize = 4;

/// One of the two players in a session.
///
/// Player A is always the peer that moves first (the discovery Initiator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    A,
    B,
}

impl Player {
    /// Returns the other player.
    pub fn opponent(self) -> Player {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }

    /// Returns the cell value this player leaves behind.
    pub fn cell(self) -> Cell {
        match self {
            Player::A => Cell::OccupiedByA,
            Player::B => Cell::OccupiedByB,
        }
    }

    /// Character used when printing the board.
    pub fn symbol(self) -> char {
        match self {
            Player::A => 'X',
            Player::B => 'O',
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::A => write!(f, "Player 1 ({})", self.symbol()),
            Player::B => write!(f, "Player 2 ({})", self.symbol()),
        }
    }
}

/// Contents of a single board position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    OccupiedByA,
    OccupiedByB,
}

impl Cell {
    /// Returns the player occupying this cell, if any.
    pub fn owner(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::OccupiedByA => Some(Player::A),
            Cell::OccupiedByB => Some(Player::B),
        }
    }

    /// Returns `true` if no piece has been placed here.
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    fn symbol(self) -> char {
        self.owner().map_or('.', Player::symbol)
    }
}

/// Errors produced by board operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardError {
    /// The column index does not exist on this board.
    #[error("column {column} is out of range (board has {columns} columns)")]
    ColumnOutOfRange { column: usize, columns: usize },

    /// The top cell of the column is already occupied.
    #[error("column {0} is full")]
    ColumnFull(usize),

    /// The requested dimensions cannot host a game.
    #[error("invalid board dimensions: {0}")]
    InvalidDimensions(String),
}

/// Size of the grid and the run length required to win.
///
/// Deserializable so the peer configuration file can carry the grid in its `[game]`
/// section; absent fields fall back to the standard 6×7 / four-in-a-row game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardDimensions {
    pub rows: usize,
    pub columns: usize,
    pub win_length: usize,
}

impl Default for BoardDimensions {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
            win_length: DEFAULT_WIN_LENGTH,
        }
    }
}

impl BoardDimensions {
    /// Checks that a win is geometrically possible on this grid.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidDimensions`] for an empty grid, a win
    /// length below 2, or a win length longer than both sides.
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(BoardError::InvalidDimensions(format!(
                "{}x{} grid has no cells",
                self.rows, self.columns
            )));
        }
        if self.win_length < 2 {
            return Err(BoardError::InvalidDimensions(format!(
                "win length {} must be at least 2",
                self.win_length
            )));
        }
        if self.win_length > self.rows.max(self.columns) {
            return Err(BoardError::InvalidDimensions(format!(
                "win length {} does not fit on a {}x{} grid",
                self.win_length, self.rows, self.columns
            )));
        }
        Ok(())
    }
}

/// A filled board position, as returned by [`Board::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Row counted from the bottom (0 = bottom row).
    pub row: usize,
    /// Zero-based column.
    pub column: usize,
}

/// The four lines a winning run can lie on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Left ↔ right along a row.
    Horizontal,
    /// Down ↔ up along a column.
    Vertical,
    /// Top-left ↔ bottom-right (`\`).
    DiagonalNegative,
    /// Bottom-left ↔ top-right (`/`).
    DiagonalPositive,
}

impl Axis {
    /// All axes in evaluation order.
    pub const ALL: [Axis; 4] = [
        Axis::Horizontal,
        Axis::Vertical,
        Axis::DiagonalNegative,
        Axis::DiagonalPositive,
    ];

    /// `(row delta, column delta)` of one step in the positive direction.
    fn step(self) -> (isize, isize) {
        match self {
            Axis::Horizontal => (0, 1),
            Axis::Vertical => (1, 0),
            Axis::DiagonalNegative => (-1, 1),
            Axis::DiagonalPositive => (1, 1),
        }
    }
}

/// The game grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    dims: BoardDimensions,
    cells: Vec<Cell>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Creates an empty standard 6×7 board.
    pub fn new() -> Self {
        let dims = BoardDimensions::default();
        Self {
            dims,
            cells: vec![Cell::Empty; dims.rows * dims.columns],
        }
    }

    /// Creates an empty board of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidDimensions`] if `dims` fails validation.
    pub fn with_dimensions(dims: BoardDimensions) -> Result<Self, BoardError> {
        dims.validate()?;
        Ok(Self {
            dims,
            cells: vec![Cell::Empty; dims.rows * dims.columns],
        })
    }

    pub fn dimensions(&self) -> BoardDimensions {
        self.dims
    }

    pub fn rows(&self) -> usize {
        self.dims.rows
    }

    pub fn columns(&self) -> usize {
        self.dims.columns
    }

    /// Returns the cell at `(row, column)`, or `None` outside the grid.
    pub fn cell(&self, row: usize, column: usize) -> Option<Cell> {
        if row >= self.dims.rows || column >= self.dims.columns {
            return None;
        }
        Some(self.cells[self.index_of(Position { row, column })])
    }

    /// Returns `true` if the column's top cell is occupied.
    ///
    /// Out-of-range columns are reported as full so they never appear legal.
    pub fn is_column_full(&self, column: usize) -> bool {
        match self.cell(self.dims.rows - 1, column) {
            Some(cell) => !cell.is_empty(),
            None => true,
        }
    }

    /// Returns `true` iff every column's top cell is occupied.
    pub fn is_full(&self) -> bool {
        (0..self.dims.columns).all(|column| self.is_column_full(column))
    }

    /// Columns that can still accept a piece, in ascending order.
    pub fn legal_columns(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.dims.columns).filter(move |&column| !self.is_column_full(column))
    }

    /// Drops a piece for `player` into `column`.
    ///
    /// Walks down from the top of the column to the lowest empty cell and
    /// occupies it.  The board is left untouched on error.
    ///
    /// # Errors
    ///
    /// - [`BoardError::ColumnOutOfRange`] if `column` is not on the board.
    /// - [`BoardError::ColumnFull`] if the column's top cell is occupied.
    pub fn insert(&mut self, column: usize, player: Player) -> Result<Position, BoardError> {
        if column >= self.dims.columns {
            return Err(BoardError::ColumnOutOfRange {
                column,
                columns: self.dims.columns,
            });
        }

        let mut target = self.index_of(Position {
            row: self.dims.rows - 1,
            column,
        });
        if !self.cells[target].is_empty() {
            return Err(BoardError::ColumnFull(column));
        }

        while let Some(below) = self.neighbour(target, -1, 0) {
            if !self.cells[below].is_empty() {
                break;
            }
            target = below;
        }

        self.cells[target] = player.cell();
        let position = self.position_of(target);
        trace!(column, row = position.row, ?player, "piece placed");
        Ok(position)
    }

    /// Returns `true` if the piece at `position` completes a winning run.
    pub fn has_won(&self, position: Position) -> bool {
        self.winning_axis(position).is_some()
    }

    /// Returns the first axis (in [`Axis::ALL`] order) on which the piece at
    /// `position` is part of a run of at least the win length.
    ///
    /// An empty or off-board `position` never wins.
    pub fn winning_axis(&self, position: Position) -> Option<Axis> {
        let player = self.cell(position.row, position.column)?.owner()?;
        let origin = self.index_of(position);

        Axis::ALL
            .into_iter()
            .find(|&axis| self.run_length(origin, player, axis) >= self.dims.win_length)
    }

    /// Renders the board top row first, with column labels starting at
    /// `column_base`.
    pub fn render(&self, column_base: usize) -> String {
        let mut out = String::new();
        for row in (0..self.dims.rows).rev() {
            out.push('|');
            for column in 0..self.dims.columns {
                let cell = self.cells[self.index_of(Position { row, column })];
                out.push(' ');
                out.push(cell.symbol());
                out.push(' ');
                out.push('|');
            }
            out.push('\n');
        }
        out.push(' ');
        for column in 0..self.dims.columns {
            let label = (column + column_base).to_string();
            out.push_str(&format!("{label:^3} "));
        }
        out
    }

    // ── Traversal ─────────────────────────────────────────────────────────────

    /// Counts the run through `origin` along `axis`, origin included.
    fn run_length(&self, origin: usize, player: Player, axis: Axis) -> usize {
        let (row_step, column_step) = axis.step();
        let wanted = player.cell();
        let mut count = 1;

        for sign in [1, -1] {
            let mut cursor = origin;
            while let Some(next) = self.neighbour(cursor, row_step * sign, column_step * sign) {
                if self.cells[next] != wanted {
                    break;
                }
                count += 1;
                cursor = next;
            }
        }
        count
    }

    /// Flat index of the cell one step away, or `None` when the step leaves
    /// the grid.
    ///
    /// Bounds are checked on row and column separately, so stepping right
    /// from the last column never lands on the first column of the next row.
    fn neighbour(&self, index: usize, row_step: isize, column_step: isize) -> Option<usize> {
        let here = self.position_of(index);
        let row = here.row.checked_add_signed(row_step)?;
        let column = here.column.checked_add_signed(column_step)?;
        if row >= self.dims.rows || column >= self.dims.columns {
            return None;
        }
        Some(self.index_of(Position { row, column }))
    }

    fn index_of(&self, position: Position) -> usize {
        position.row * self.dims.columns + position.column
    }

    fn position_of(&self, index: usize) -> Position {
        Position {
            row: index / self.dims.columns,
            column: index % self.dims.columns,
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(0))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
