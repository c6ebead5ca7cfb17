//! Scripted move source.
//!
//! Plays a fixed list of columns in order, then reports closed input.  Used to
//! drive whole sessions from integration tests without a terminal.

use std::collections::VecDeque;

use async_trait::async_trait;
use c4_core::{Board, BoardError};
use tracing::debug;

use crate::application::turn_coordinator::{InputError, MoveSource};

/// A [`MoveSource`] that replays pre-recorded columns.
#[derive(Debug, Clone, Default)]
pub struct ScriptedMoves {
    columns: VecDeque<usize>,
}

impl ScriptedMoves {
    /// Creates a source that will return `columns` in order.
    pub fn new(columns: impl IntoIterator<Item = usize>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }
}

#[async_trait]
impl MoveSource for ScriptedMoves {
    async fn next_move(&mut self, _board: &Board) -> Result<usize, InputError> {
        self.columns.pop_front().ok_or(InputError::Closed)
    }

    /// The next scripted column is tried on the following call.
    fn move_rejected(&mut self, column: usize, reason: &BoardError) {
        debug!(column, "scripted move rejected: {reason}");
    }
}
