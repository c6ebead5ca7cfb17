//! Domain entities for LAN Connect Four.
//!
//! Pure game logic with no infrastructure dependencies.  The board never
//! touches the network; the turn coordinator in `c4-peer` feeds it validated
//! moves and reacts to what it reports.

/// Grid state, insertion, and win/tie detection.
///
/// See [`board::Board`] for the main type.
pub mod board;

/// Roles assigned by discovery and the terminal outcomes of a session.
pub mod session;
