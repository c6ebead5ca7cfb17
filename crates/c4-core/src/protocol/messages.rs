//! Message types exchanged between two LAN Connect Four peers.
//!
//! Two channels exist:
//!
//! - **Discovery** – a single UDP broadcast datagram, `"<tag>:<port>"`, telling
//!   whoever hears it which TCP port to dial.
//! - **Turns** – `\n`-terminated text lines on the rendezvous TCP connection.

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Discovery tag a peer announces with unless configured otherwise.
pub const DEFAULT_DISCOVERY_TAG: &str = "NEW GAME";

/// Separator between the discovery tag and the rendezvous port.
pub const ANNOUNCE_SEPARATOR: char = ':';

/// Prefix of a move line, followed by the column number.
pub const INSERT_PREFIX: &str = "INSERT:";

/// Line sent by the peer that concedes a win to the other side.
pub const YOU_WIN_LINE: &str = "YOU WIN";

/// Line sent to abort the session.
pub const ERROR_LINE: &str = "ERROR";

// ── Turn messages ─────────────────────────────────────────────────────────────

/// One line of the turn protocol.
///
/// The column carried by [`TurnMessage::Insert`] is always zero-based; the
/// codec translates it to and from the configured [`ColumnBase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnMessage {
    /// The sender dropped a piece into this column.
    Insert(usize),
    /// The sender concedes: the receiver's last move won.
    YouWin,
    /// The sender aborts the session.
    Error,
}

// ── Column numbering ──────────────────────────────────────────────────────────

/// Numbering of columns on the wire and in the terminal.
///
/// Both peers must use the same base; it is not negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ColumnBase {
    /// Leftmost column is `0`.
    #[default]
    Zero,
    /// Leftmost column is `1`.
    One,
}

impl ColumnBase {
    pub fn offset(self) -> usize {
        match self {
            ColumnBase::Zero => 0,
            ColumnBase::One => 1,
        }
    }

    /// Converts a zero-based board column into its wire number.
    pub fn to_wire(self, column: usize) -> usize {
        column + self.offset()
    }

    /// Converts a wire number into a zero-based board column.
    ///
    /// Returns `None` when the number is below the base (e.g. `0` in base 1).
    pub fn from_wire(self, number: usize) -> Option<usize> {
        number.checked_sub(self.offset())
    }
}

impl TryFrom<u8> for ColumnBase {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ColumnBase::Zero),
            1 => Ok(ColumnBase::One),
            other => Err(format!("column base must be 0 or 1, got {other}")),
        }
    }
}

impl From<ColumnBase> for u8 {
    fn from(base: ColumnBase) -> Self {
        base.offset() as u8
    }
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// Discovery broadcast: "a game is waiting on `port`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnounceMessage {
    pub tag: String,
    pub port: u16,
}

impl AnnounceMessage {
    pub fn new(tag: impl Into<String>, port: u16) -> Self {
        Self {
            tag: tag.into(),
            port,
        }
    }

    /// Renders the datagram text, `"<tag>:<port>"`.
    pub fn to_wire(&self) -> String {
        format!("{}{}{}", self.tag, ANNOUNCE_SEPARATOR, self.port)
    }
}
