//! # c4-core
//!
//! Shared library for LAN Connect Four containing the board engine and the
//! text wire protocol spoken between two peers.
//!
//! It has zero dependencies on network sockets, terminals, or async runtimes,
//! so everything here can be unit-tested in isolation.
//!
//! - **`domain`** – The board: cell ownership, gravity-based insertion, and
//!   four-axis win detection around the most recent move.  Also the session
//!   vocabulary (`Role`, `SessionOutcome`) shared by both peers.
//!
//! - **`protocol`** – The discovery announce datagram (`NEW GAME:<port>`) and
//!   the line-delimited turn messages (`INSERT:<column>`, `YOU WIN`, `ERROR`).

pub mod domain;
pub mod protocol;

pub use domain::board::{
    Axis, Board, BoardDimensions, BoardError, Cell, Player, Position, DEFAULT_COLUMNS,
    DEFAULT_ROWS, DEFAULT_WIN_LENGTH,
};
pub use domain::session::{Role, SessionOutcome};
pub use protocol::codec::{
    decode_announce, decode_turn_line, encode_announce, encode_turn_line, match_announce_tag,
    ProtocolError,
};
pub use protocol::messages::{AnnounceMessage, ColumnBase, TurnMessage, DEFAULT_DISCOVERY_TAG};
