//! Interactive move source reading columns typed by the local player.
//!
//! Before each prompt the board is printed with column labels in the session's
//! column base.  Input that is not a number, names a column off the board, or
//! names a full column is answered with a hint and a new prompt.

use std::io::Write;

use async_trait::async_trait;
use c4_core::{Board, BoardError, ColumnBase};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tracing::debug;

use crate::application::turn_coordinator::{InputError, MoveSource};

/// Reads moves from `input`, writing the board and prompts to `output`.
pub struct TerminalMoves<R, W> {
    input: R,
    output: W,
    column_base: ColumnBase,
}

impl TerminalMoves<BufReader<Stdin>, std::io::Stdout> {
    /// A move source on the process's stdin and stdout.
    pub fn stdio(column_base: ColumnBase) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), std::io::stdout(), column_base)
    }
}

impl<R, W> TerminalMoves<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    pub fn new(input: R, output: W, column_base: ColumnBase) -> Self {
        Self {
            input,
            output,
            column_base,
        }
    }

    fn say(&mut self, text: &str) {
        let written = self
            .output
            .write_all(text.as_bytes())
            .and_then(|()| self.output.flush());
        if let Err(e) = written {
            debug!("terminal write failed: {e}");
        }
    }
}

#[async_trait]
impl<R, W> MoveSource for TerminalMoves<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    async fn next_move(&mut self, board: &Board) -> Result<usize, InputError> {
        let base = self.column_base;
        self.say(&format!("\n{}\n", board.render(base.offset())));

        loop {
            let last = base.to_wire(board.columns() - 1);
            self.say(&format!("Your move ({}-{last}): ", base.offset()));

            let mut line = String::new();
            if self.input.read_line(&mut line).await? == 0 {
                return Err(InputError::Closed);
            }

            match parse_column(line.trim(), board, base) {
                Ok(column) => return Ok(column),
                Err(hint) => self.say(&format!("{hint}\n")),
            }
        }
    }

    fn move_rejected(&mut self, column: usize, reason: &BoardError) {
        let number = self.column_base.to_wire(column);
        self.say(&format!("Column {number} cannot be played ({reason}). Try again.\n"));
    }
}

/// Converts typed text into a playable zero-based column, or a hint for the
/// player explaining why it is not one.
pub fn parse_column(text: &str, board: &Board, base: ColumnBase) -> Result<usize, String> {
    let first = base.offset();
    let last = base.to_wire(board.columns() - 1);

    let number: usize = text
        .parse()
        .map_err(|_| format!("{text:?} is not a column number."))?;
    let column = base
        .from_wire(number)
        .filter(|&column| column < board.columns())
        .ok_or_else(|| format!("Column {number} does not exist; choose {first}-{last}."))?;
    if board.is_column_full(column) {
        return Err(format!("Column {number} is full; choose another."));
    }
    Ok(column)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
