//! Session vocabulary shared by discovery and the turn coordinator.

use std::fmt;

use crate::domain::board::Player;

/// Which side of the discovery race this peer ended up on.
///
/// The Initiator announced and accepted the inbound connection; it plays as
/// [`Player::A`] and moves first.  The Responder heard the announcement and
/// dialled out; it plays as [`Player::B`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Initiator,
    Responder,
}

impl Role {
    pub fn moves_first(self) -> bool {
        self == Role::Initiator
    }

    /// The player this peer controls.
    pub fn local_player(self) -> Player {
        match self {
            Role::Initiator => Player::A,
            Role::Responder => Player::B,
        }
    }

    /// The player the remote peer controls.
    pub fn remote_player(self) -> Player {
        self.local_player().opponent()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Initiator => f.write_str("initiator"),
            Role::Responder => f.write_str("responder"),
        }
    }
}

/// Terminal result of one game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionOutcome {
    /// The remote peer acknowledged our winning move with `YOU WIN`.
    LocalWin,
    /// The remote peer's move completed a run; we conceded with `YOU WIN`.
    RemoteWin,
    /// The board filled up with no winner.
    Tie,
    /// The session was aborted by a malformed message, an illegal move, or a
    /// dropped connection.
    ProtocolError,
}

impl SessionOutcome {
    /// Returns `true` for outcomes where the game was played to completion.
    pub fn is_completed_game(self) -> bool {
        !matches!(self, SessionOutcome::ProtocolError)
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SessionOutcome::LocalWin => "you win",
            SessionOutcome::RemoteWin => "you lose",
            SessionOutcome::Tie => "tie game",
            SessionOutcome::ProtocolError => "game aborted by a protocol error",
        };
        f.write_str(text)
    }
}
