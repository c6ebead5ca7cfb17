//! Application layer use cases for a game peer.
//!
//! Use cases here orchestrate the `c4_core` board over an already-established
//! connection.  They depend on abstractions (the [`turn_coordinator::MoveSource`]
//! trait and generic `AsyncRead + AsyncWrite` streams) rather than on sockets
//! or the terminal, so the whole turn exchange can be driven from tests with
//! in-memory streams.
//!
//! # Sub-modules
//!
//! - **`turn_coordinator`** – The per-session state machine: asks the local
//!   player for moves, applies the opponent's moves, and decides when the game
//!   is over.

pub mod turn_coordinator;
