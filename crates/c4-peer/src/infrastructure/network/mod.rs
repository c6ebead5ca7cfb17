//! Network infrastructure for a game peer.
//!
//! # Sub-modules
//!
//! - **`listener`** – The stoppable background-task handle shared by both
//!   listeners, and the `Found` / `Stopped` outcome they complete with.
//!
//! - **`broadcast_listener`** – Waits on the discovery UDP port for an
//!   announcement carrying this session's tag.
//!
//! - **`rendezvous_listener`** – Waits on the randomly chosen TCP port for the
//!   single inbound connection from an opponent who heard our announcement.
//!
//! - **`interfaces`** – Finds the directed broadcast address of the first
//!   usable IPv4 interface when none is configured.
//!
//! - **`discovery`** – Races the two listeners against a periodic announce
//!   timer and returns exactly one connection plus this peer's role.

pub mod broadcast_listener;
pub mod discovery;
pub mod interfaces;
pub mod listener;
pub mod rendezvous_listener;
