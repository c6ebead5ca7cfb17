//! Protocol module containing message types and the text codec.

pub mod codec;
pub mod messages;

pub use codec::{
    decode_announce, decode_turn_line, encode_announce, encode_turn_line, match_announce_tag,
    ProtocolError,
};
pub use messages::*;
