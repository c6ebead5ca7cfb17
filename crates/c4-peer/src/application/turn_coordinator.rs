//! TurnCoordinator: runs one game over an established connection.
//!
//! The coordinator owns the connection and the board for the whole session.
//! It alternates between asking the local [`MoveSource`] for a column and
//! reading the opponent's next line, applying every move to the board and
//! deciding when the game is over.
//!
//! # State machine
//!
//! ```text
//!                 ┌──────── INSERT applied, no win ────────┐
//!                 ▼                                         │
//!   AwaitingLocalMove ── INSERT sent ──► AwaitingRemoteMove ┘
//!         │                                   │
//!         └─ board full ──► Done(Tie)         ├─ YOU WIN ──► Done(LocalWin)
//!                                             ├─ opponent wins ──► Done(RemoteWin)
//!                                             └─ ERROR / bad line / EOF ──► Done(ProtocolError)
//! ```
//!
//! The Initiator starts in `AwaitingLocalMove`, the Responder in
//! `AwaitingRemoteMove`.  A peer whose own move wins still goes to
//! `AwaitingRemoteMove` and waits for the opponent's `YOU WIN`.
//!
//! # Architecture
//!
//! The coordinator is generic over the stream (`AsyncRead + AsyncWrite`) and
//! the move source, so tests drive it with scripted in-memory connections.

use async_trait::async_trait;
use c4_core::{
    decode_turn_line, encode_turn_line, Board, BoardError, ColumnBase, Role, SessionOutcome,
    TurnMessage,
};
use thiserror::Error;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tracing::{debug, error, info, warn};

/// Longest line accepted from the opponent, newline included.
const MAX_LINE_BYTES: u64 = 256;

/// Error type for local move input.
#[derive(Debug, Error)]
pub enum InputError {
    /// The input has no more moves (e.g. stdin reached end of file).
    #[error("move input closed")]
    Closed,

    /// Reading the input failed.
    #[error("failed to read move input: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the local player's moves come from.
///
/// The terminal implementation prompts a human; tests script the columns.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MoveSource: Send {
    /// Returns the zero-based column for the local player's next move.
    async fn next_move(&mut self, board: &Board) -> Result<usize, InputError>;

    /// Called when the board refused the column last returned by
    /// [`MoveSource::next_move`].  `next_move` is called again afterwards.
    fn move_rejected(&mut self, column: usize, reason: &BoardError);
}

/// Where the coordinator is in the turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingLocalMove,
    AwaitingRemoteMove,
    Done(SessionOutcome),
}

/// Drives one game session to a terminal [`SessionOutcome`].
pub struct TurnCoordinator<S, M> {
    stream: BufReader<S>,
    board: Board,
    role: Role,
    column_base: ColumnBase,
    moves: M,
    state: TurnState,
    /// Set after sending a winning move, until the opponent concedes.
    awaiting_concession: bool,
}

impl<S, M> TurnCoordinator<S, M>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    M: MoveSource,
{
    /// Creates a coordinator with a standard empty board and zero-based columns.
    pub fn new(stream: S, role: Role, moves: M) -> Self {
        let state = if role.moves_first() {
            TurnState::AwaitingLocalMove
        } else {
            TurnState::AwaitingRemoteMove
        };
        Self {
            stream: BufReader::new(stream),
            board: Board::new(),
            role,
            column_base: ColumnBase::Zero,
            moves,
            state,
            awaiting_concession: false,
        }
    }

    /// Replaces the starting board (custom dimensions, or a position to resume from).
    pub fn with_board(mut self, board: Board) -> Self {
        self.board = board;
        self
    }

    pub fn with_column_base(mut self, column_base: ColumnBase) -> Self {
        self.column_base = column_base;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Runs turns until the session is over, then shuts down the write half.
    pub async fn run(&mut self) -> SessionOutcome {
        let dims = self.board.dimensions();
        info!(
            role = %self.role,
            player = %self.role.local_player(),
            rows = dims.rows,
            columns = dims.columns,
            win_length = dims.win_length,
            "game started"
        );
        loop {
            if let TurnState::Done(outcome) = self.step().await {
                self.shutdown().await;
                info!(%outcome, "game over");
                return outcome;
            }
        }
    }

    /// Advances the state machine by one transition and returns the new state.
    ///
    /// Calling `step` in a `Done` state is a no-op.
    pub async fn step(&mut self) -> TurnState {
        let next = match self.state {
            TurnState::AwaitingLocalMove => self.local_turn().await,
            TurnState::AwaitingRemoteMove => self.remote_turn().await,
            done @ TurnState::Done(_) => done,
        };
        if next != self.state {
            debug!(from = ?self.state, to = ?next, "turn state changed");
        }
        self.state = next;
        next
    }

    // ── Turns ─────────────────────────────────────────────────────────────────

    async fn local_turn(&mut self) -> TurnState {
        if self.board.is_full() {
            info!("board is full; the game is a tie");
            self.send_best_effort(TurnMessage::Error).await;
            return TurnState::Done(SessionOutcome::Tie);
        }

        let player = self.role.local_player();
        let position = loop {
            let column = match self.moves.next_move(&self.board).await {
                Ok(column) => column,
                Err(e) => {
                    warn!("no local move available: {e}");
                    self.send_best_effort(TurnMessage::Error).await;
                    return TurnState::Done(SessionOutcome::ProtocolError);
                }
            };
            match self.board.insert(column, player) {
                Ok(position) => break position,
                Err(e) => {
                    debug!(column, "local move rejected: {e}");
                    self.moves.move_rejected(column, &e);
                }
            }
        };

        if let Err(e) = self.send(TurnMessage::Insert(position.column)).await {
            error!("failed to send move to opponent: {e}");
            return TurnState::Done(SessionOutcome::ProtocolError);
        }

        if self.board.has_won(position) {
            info!(
                column = position.column,
                "winning move sent; waiting for the opponent to concede"
            );
            self.awaiting_concession = true;
        }
        TurnState::AwaitingRemoteMove
    }

    async fn remote_turn(&mut self) -> TurnState {
        let msg = match self.read_message().await {
            Some(msg) => msg,
            None => {
                self.send_best_effort(TurnMessage::Error).await;
                return TurnState::Done(SessionOutcome::ProtocolError);
            }
        };

        match msg {
            TurnMessage::YouWin => {
                if !self.awaiting_concession {
                    warn!("opponent conceded without a winning move on our side");
                }
                info!("opponent conceded");
                TurnState::Done(SessionOutcome::LocalWin)
            }
            TurnMessage::Error => {
                info!("opponent aborted the session");
                TurnState::Done(SessionOutcome::ProtocolError)
            }
            TurnMessage::Insert(column) if self.awaiting_concession => {
                warn!(column, "opponent kept playing after losing");
                self.send_best_effort(TurnMessage::Error).await;
                TurnState::Done(SessionOutcome::ProtocolError)
            }
            TurnMessage::Insert(column) => {
                let position = match self.board.insert(column, self.role.remote_player()) {
                    Ok(position) => position,
                    Err(e) => {
                        warn!("opponent sent an illegal move: {e}");
                        self.send_best_effort(TurnMessage::Error).await;
                        return TurnState::Done(SessionOutcome::ProtocolError);
                    }
                };

                if !self.board.has_won(position) {
                    return TurnState::AwaitingLocalMove;
                }

                info!(column, "opponent completed a winning run");
                match self.send(TurnMessage::YouWin).await {
                    Ok(()) => TurnState::Done(SessionOutcome::RemoteWin),
                    Err(e) => {
                        error!("failed to concede to opponent: {e}");
                        TurnState::Done(SessionOutcome::ProtocolError)
                    }
                }
            }
        }
    }

    // ── Wire I/O ──────────────────────────────────────────────────────────────

    /// Reads and decodes one line.  `None` means the session cannot continue.
    async fn read_message(&mut self) -> Option<TurnMessage> {
        let mut line = String::new();
        let read = (&mut self.stream)
            .take(MAX_LINE_BYTES)
            .read_line(&mut line)
            .await;
        match read {
            Ok(0) => {
                warn!("opponent closed the connection");
                None
            }
            Ok(len) if len as u64 >= MAX_LINE_BYTES && !line.ends_with('\n') => {
                warn!(limit = MAX_LINE_BYTES, "line from opponent is too long");
                None
            }
            Ok(_) => {
                debug!(line = line.trim_end(), "received");
                decode_turn_line(&line, self.column_base)
                    .map_err(|e| warn!("malformed line from opponent: {e}"))
                    .ok()
            }
            Err(e) => {
                warn!("failed to read from opponent: {e}");
                None
            }
        }
    }

    async fn send(&mut self, msg: TurnMessage) -> std::io::Result<()> {
        let line = encode_turn_line(msg, self.column_base);
        let writer = self.stream.get_mut();
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        debug!(line = line.trim_end(), "sent");
        Ok(())
    }

    async fn send_best_effort(&mut self, msg: TurnMessage) {
        if let Err(e) = self.send(msg).await {
            debug!("could not notify opponent: {e}");
        }
    }

    async fn shutdown(&mut self) {
        if let Err(e) = self.stream.get_mut().shutdown().await {
            debug!("connection shutdown failed: {e}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
