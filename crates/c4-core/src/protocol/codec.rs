//! Text codec for the LAN Connect Four wire protocol.
//!
//! Turn lines:
//! ```text
//! INSERT:<column>\n
//! YOU WIN\n
//! ERROR\n
//! ```
//! Discovery datagram (no terminator):
//! ```text
//! <tag>:<rendezvous-port>
//! ```
//! Decoding tolerates a trailing `\r\n` or `\n` on turn lines.  Column numbers
//! on the wire are expressed in the session's [`ColumnBase`].

use thiserror::Error;

use crate::protocol::messages::{
    AnnounceMessage, ColumnBase, TurnMessage, ANNOUNCE_SEPARATOR, ERROR_LINE, INSERT_PREFIX,
    YOU_WIN_LINE,
};

/// Errors that can occur while decoding protocol text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The line is not one of `INSERT:<n>`, `YOU WIN`, or `ERROR`.
    #[error("unrecognized turn line: {0:?}")]
    UnknownLine(String),

    /// The text after `INSERT:` is not a non-negative integer.
    #[error("invalid column number: {0:?}")]
    InvalidColumn(String),

    /// The column number is smaller than the configured base.
    #[error("column {number} is below the column base {base}")]
    ColumnBelowBase { number: usize, base: usize },

    /// The datagram is not valid UTF-8.
    #[error("announcement is not valid UTF-8")]
    NotUtf8,

    /// The datagram has no `:` between tag and port.
    #[error("announcement has no ':' separator: {0:?}")]
    MissingSeparator(String),

    /// The datagram carries another application's tag.
    #[error("announcement tag {found:?} does not match {expected:?}")]
    TagMismatch { expected: String, found: String },

    /// The text after the tag is not a valid TCP port.
    #[error("invalid rendezvous port: {0:?}")]
    InvalidPort(String),
}

// ── Turn lines ────────────────────────────────────────────────────────────────

/// Encodes a turn message as one `\n`-terminated line.
///
/// # Examples
///
/// ```rust
/// use c4_core::{encode_turn_line, ColumnBase, TurnMessage};
///
/// assert_eq!(encode_turn_line(TurnMessage::Insert(3), ColumnBase::Zero), "INSERT:3\n");
/// assert_eq!(encode_turn_line(TurnMessage::Insert(3), ColumnBase::One), "INSERT:4\n");
/// assert_eq!(encode_turn_line(TurnMessage::YouWin, ColumnBase::Zero), "YOU WIN\n");
/// ```
pub fn encode_turn_line(msg: TurnMessage, base: ColumnBase) -> String {
    match msg {
        TurnMessage::Insert(column) => format!("{INSERT_PREFIX}{}\n", base.to_wire(column)),
        TurnMessage::YouWin => format!("{YOU_WIN_LINE}\n"),
        TurnMessage::Error => format!("{ERROR_LINE}\n"),
    }
}

/// Decodes one turn line.
///
/// The column in a decoded [`TurnMessage::Insert`] is zero-based but is not
/// checked against any board; that is the board's job.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the line is not a recognized message or the
/// column number is malformed.
///
/// # Examples
///
/// ```rust
/// use c4_core::{decode_turn_line, ColumnBase, TurnMessage};
///
/// let msg = decode_turn_line("INSERT:99\r\n", ColumnBase::Zero).unwrap();
/// assert_eq!(msg, TurnMessage::Insert(99));
/// assert!(decode_turn_line("HELLO", ColumnBase::Zero).is_err());
/// ```
pub fn decode_turn_line(line: &str, base: ColumnBase) -> Result<TurnMessage, ProtocolError> {
    let line = line.trim_end_matches(['\r', '\n']);

    if line == YOU_WIN_LINE {
        return Ok(TurnMessage::YouWin);
    }
    if line == ERROR_LINE {
        return Ok(TurnMessage::Error);
    }

    let digits = line
        .strip_prefix(INSERT_PREFIX)
        .ok_or_else(|| ProtocolError::UnknownLine(line.to_string()))?;
    let number: usize = digits
        .parse()
        .map_err(|_| ProtocolError::InvalidColumn(digits.to_string()))?;
    let column = base.from_wire(number).ok_or(ProtocolError::ColumnBelowBase {
        number,
        base: base.offset(),
    })?;

    Ok(TurnMessage::Insert(column))
}

// ── Discovery datagrams ───────────────────────────────────────────────────────

/// Encodes an announcement as datagram bytes.
pub fn encode_announce(msg: &AnnounceMessage) -> Vec<u8> {
    msg.to_wire().into_bytes()
}

/// Checks that a datagram carries `expected_tag` and returns the text after
/// the separator, unparsed.
///
/// Listeners use this to filter traffic without committing to a port value.
///
/// # Errors
///
/// [`ProtocolError::NotUtf8`], [`ProtocolError::MissingSeparator`] or
/// [`ProtocolError::TagMismatch`].
pub fn match_announce_tag<'a>(
    payload: &'a [u8],
    expected_tag: &str,
) -> Result<&'a str, ProtocolError> {
    let text = std::str::from_utf8(payload).map_err(|_| ProtocolError::NotUtf8)?;
    let (tag, rest) = text
        .split_once(ANNOUNCE_SEPARATOR)
        .ok_or_else(|| ProtocolError::MissingSeparator(text.to_string()))?;
    if tag != expected_tag {
        return Err(ProtocolError::TagMismatch {
            expected: expected_tag.to_string(),
            found: tag.to_string(),
        });
    }
    Ok(rest)
}

/// Decodes a full announcement, including the rendezvous port.
///
/// # Errors
///
/// Any error from [`match_announce_tag`], or [`ProtocolError::InvalidPort`]
/// when the port is not an integer in `1..=65535`.
pub fn decode_announce(
    payload: &[u8],
    expected_tag: &str,
) -> Result<AnnounceMessage, ProtocolError> {
    let rest = match_announce_tag(payload, expected_tag)?;
    let port = rest
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|&port| port != 0)
        .ok_or_else(|| ProtocolError::InvalidPort(rest.to_string()))?;
    Ok(AnnounceMessage::new(expected_tag, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::DEFAULT_DISCOVERY_TAG;

    // ── Turn lines ────────────────────────────────────────────────────────────

    #[test]
    fn test_decode_insert_strips_crlf() {
        // Arrange / Act
        let msg = decode_turn_line("INSERT:4\r\n", ColumnBase::Zero).unwrap();

        // Assert
        assert_eq!(msg, TurnMessage::Insert(4));
    }

    #[test]
    fn test_decode_insert_applies_column_base() {
        let msg = decode_turn_line("INSERT:1\n", ColumnBase::One).unwrap();
        assert_eq!(msg, TurnMessage::Insert(0));
    }

    #[test]
    fn test_decode_insert_zero_in_base_one_is_rejected() {
        assert_eq!(
            decode_turn_line("INSERT:0", ColumnBase::One),
            Err(ProtocolError::ColumnBelowBase { number: 0, base: 1 })
        );
    }

    #[test]
    fn test_decode_out_of_range_column_is_not_a_codec_error() {
        // Range checking belongs to the board
        assert_eq!(
            decode_turn_line("INSERT:99", ColumnBase::Zero),
            Ok(TurnMessage::Insert(99))
        );
    }

    #[test]
    fn test_decode_negative_column_is_invalid() {
        assert_eq!(
            decode_turn_line("INSERT:-1", ColumnBase::Zero),
            Err(ProtocolError::InvalidColumn("-1".to_string()))
        );
    }

    #[test]
    fn test_decode_insert_without_number_is_invalid() {
        assert!(matches!(
            decode_turn_line("INSERT:", ColumnBase::Zero),
            Err(ProtocolError::InvalidColumn(_))
        ));
    }

    #[test]
    fn test_decode_you_win_and_error() {
        assert_eq!(
            decode_turn_line("YOU WIN\n", ColumnBase::Zero),
            Ok(TurnMessage::YouWin)
        );
        assert_eq!(
            decode_turn_line("ERROR", ColumnBase::One),
            Ok(TurnMessage::Error)
        );
    }

    #[test]
    fn test_decode_unknown_line() {
        assert_eq!(
            decode_turn_line("you win\n", ColumnBase::Zero),
            Err(ProtocolError::UnknownLine("you win".to_string()))
        );
    }

    #[test]
    fn test_encode_lines_are_newline_terminated() {
        assert_eq!(
            encode_turn_line(TurnMessage::Insert(6), ColumnBase::Zero),
            "INSERT:6\n"
        );
        assert_eq!(encode_turn_line(TurnMessage::Error, ColumnBase::Zero), "ERROR\n");
    }

    // ── Discovery datagrams ───────────────────────────────────────────────────

    #[test]
    fn test_decode_announce_extracts_port() {
        let msg = decode_announce(b"NEW GAME:9042", DEFAULT_DISCOVERY_TAG).unwrap();
        assert_eq!(msg, AnnounceMessage::new("NEW GAME", 9042));
    }

    #[test]
    fn test_encode_announce_bytes() {
        let bytes = encode_announce(&AnnounceMessage::new("NEW GAME", 9000));
        assert_eq!(bytes, b"NEW GAME:9000");
    }

    #[test]
    fn test_announce_with_other_tag_is_mismatch() {
        assert_eq!(
            match_announce_tag(b"OLD GAME:9042", DEFAULT_DISCOVERY_TAG),
            Err(ProtocolError::TagMismatch {
                expected: "NEW GAME".to_string(),
                found: "OLD GAME".to_string()
            })
        );
    }

    #[test]
    fn test_announce_without_separator_is_rejected() {
        assert!(matches!(
            match_announce_tag(b"NEW GAME 9042", DEFAULT_DISCOVERY_TAG),
            Err(ProtocolError::MissingSeparator(_))
        ));
    }

    #[test]
    fn test_announce_invalid_utf8_is_rejected() {
        assert_eq!(
            match_announce_tag(&[0xFF, 0xFE, b':', b'1'], DEFAULT_DISCOVERY_TAG),
            Err(ProtocolError::NotUtf8)
        );
    }

    #[test]
    fn test_announce_tag_matches_but_port_is_garbage() {
        // Arrange: the tag filter passes, the port parse does not
        let payload = b"NEW GAME:banana";

        // Act / Assert
        assert_eq!(match_announce_tag(payload, DEFAULT_DISCOVERY_TAG), Ok("banana"));
        assert_eq!(
            decode_announce(payload, DEFAULT_DISCOVERY_TAG),
            Err(ProtocolError::InvalidPort("banana".to_string()))
        );
    }

    #[test]
    fn test_announce_port_out_of_u16_range_is_invalid() {
        assert!(matches!(
            decode_announce(b"NEW GAME:70000", DEFAULT_DISCOVERY_TAG),
            Err(ProtocolError::InvalidPort(_))
        ));
        assert!(matches!(
            decode_announce(b"NEW GAME:0", DEFAULT_DISCOVERY_TAG),
            Err(ProtocolError::InvalidPort(_))
        ));
    }
}
