//! Terminal adapters: the interactive move source and the text a player sees.
//!
//! None of this makes game decisions.  The terminal move source only checks
//! that typed input names a playable column so it can re-prompt early; the
//! board still has the final word through the turn coordinator.
//!
//! # Testability
//!
//! [`terminal::TerminalMoves`] is generic over its reader and writer, and
//! [`scripted::ScriptedMoves`] plays a fixed list of columns, so sessions can
//! be driven without a human at the keyboard.

use std::net::SocketAddr;

use c4_core::{Role, SessionOutcome};

pub mod scripted;
pub mod terminal;

/// Text shown once discovery has assigned a role.
pub fn start_banner(role: Role) -> String {
    let order = if role.moves_first() {
        "You move first."
    } else {
        "Your opponent moves first."
    };
    format!(
        "\n=== CONNECT FOUR ===\nYou are {}. {order}\n",
        role.local_player()
    )
}

/// Text shown when the rendezvous connection is up.
pub fn connection_banner(local: SocketAddr, remote: SocketAddr) -> String {
    format!("\n----------- CONNECTION ESTABLISHED -----------\n{local} <-----> {remote}\n")
}

/// Final line printed after the game.
pub fn outcome_message(outcome: SessionOutcome) -> &'static str {
    match outcome {
        SessionOutcome::LocalWin => "You win! Your opponent conceded.",
        SessionOutcome::RemoteWin => "You lose! Your opponent connected four.",
        SessionOutcome::Tie => "The board is full. It's a tie!",
        SessionOutcome::ProtocolError => "The game was aborted: the connection or a message was invalid.",
    }
}
