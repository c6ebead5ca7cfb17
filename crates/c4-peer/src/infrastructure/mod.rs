//! Infrastructure layer for a game peer.
//!
//! Contains OS-facing adapters: discovery and rendezvous sockets, the terminal
//! move source, and configuration file loading.
//!
//! **Dependency rule**: this layer may depend on `application` and `c4_core`,
//! but MUST NOT be imported by the `application` layer.

pub mod console;
pub mod network;
pub mod storage;
