//! UDP listener for discovery announcements.
//!
//! Binds the discovery port and waits for a datagram of the form
//! `"<tag>:<port>"` whose tag matches this session's tag.  Everything else on
//! the port (other applications, other games, garbage) is logged and ignored.
//!
//! The port text is **not** parsed here; the matchmaker decides what to do
//! with a matching announcement whose port is malformed.

use std::net::SocketAddr;

use c4_core::match_announce_tag;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::discovery::DiscoveryError;
use super::listener::{ListenOutcome, ListenerHandle};

/// Receive buffer size; announcements are a few dozen bytes.
const MAX_DATAGRAM_SIZE: usize = 1024;

/// A matching announcement as it arrived on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    /// Address the datagram came from.  Its IP is the opponent's host.
    pub source: SocketAddr,
    /// Raw datagram bytes, tag included.
    pub payload: Vec<u8>,
}

/// Binds a UDP socket on `bind_addr` and spawns the listening task.
///
/// # Errors
///
/// Returns [`DiscoveryError::BindFailed`] if the port cannot be bound.
pub async fn spawn(
    bind_addr: SocketAddr,
    tag: String,
) -> Result<ListenerHandle<Announcement>, DiscoveryError> {
    let socket = UdpSocket::bind(bind_addr)
        .await
        .map_err(|source| DiscoveryError::BindFailed {
            kind: "discovery",
            addr: bind_addr,
            source,
        })?;
    let local_addr = socket.local_addr().unwrap_or(bind_addr);
    debug!(%local_addr, "broadcast listener started");

    Ok(ListenerHandle::spawn(local_addr, move |stop_rx| {
        listen(socket, tag, stop_rx)
    }))
}

/// The receive loop executed by the listener task.
async fn listen(
    socket: UdpSocket,
    tag: String,
    mut stop_rx: oneshot::Receiver<()>,
) -> ListenOutcome<Announcement> {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        tokio::select! {
            biased;

            _ = &mut stop_rx => {
                debug!("broadcast listener stopped");
                return ListenOutcome::Stopped;
            }

            received = socket.recv_from(&mut buf) => {
                let (len, source) = match received {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!("discovery recv error: {e}");
                        continue;
                    }
                };

                let payload = &buf[..len];
                match match_announce_tag(payload, &tag) {
                    Ok(_) => {
                        info!(%source, "announcement received: {}", String::from_utf8_lossy(payload));
                        return ListenOutcome::Found(Announcement {
                            source,
                            payload: payload.to_vec(),
                        });
                    }
                    Err(e) => debug!(%source, "ignoring discovery datagram: {e}"),
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn loopback_any_port() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    async fn send(to: SocketAddr, payload: &[u8]) {
        let sender = UdpSocket::bind(loopback_any_port()).await.unwrap();
        sender.send_to(payload, to).await.unwrap();
    }

    #[tokio::test]
    async fn test_matching_announcement_is_found() {
        // Arrange
        let handle = spawn(loopback_any_port(), "NEW GAME".to_string())
            .await
            .unwrap();
        let target = handle.local_addr();

        // Act
        send(target, b"NEW GAME:9042").await;
        let outcome = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("listener must complete");

        // Assert
        match outcome {
            ListenOutcome::Found(a) => {
                assert_eq!(a.payload, b"NEW GAME:9042");
                assert!(a.source.ip().is_loopback());
            }
            ListenOutcome::Stopped => panic!("expected an announcement"),
        }
    }

    #[tokio::test]
    async fn test_foreign_datagrams_are_skipped() {
        // Arrange
        let handle = spawn(loopback_any_port(), "NEW GAME".to_string())
            .await
            .unwrap();
        let target = handle.local_addr();

        // Act: noise first, then a real announcement
        send(target, b"OLD GAME:9001").await;
        send(target, b"no separator here").await;
        send(target, &[0xFF, 0x00, 0xFE]).await;
        send(target, b"NEW GAME:9002").await;
        let outcome = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("listener must complete");

        // Assert
        assert!(matches!(outcome, ListenOutcome::Found(a) if a.payload == b"NEW GAME:9002"));
    }

    #[tokio::test]
    async fn test_matching_tag_with_bad_port_is_still_found() {
        let handle = spawn(loopback_any_port(), "NEW GAME".to_string())
            .await
            .unwrap();
        send(handle.local_addr(), b"NEW GAME:abc").await;
        let outcome = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap();
        assert!(outcome.is_found());
    }

    #[tokio::test]
    async fn test_stop_releases_port() {
        // Arrange
        let handle = spawn(loopback_any_port(), "NEW GAME".to_string())
            .await
            .unwrap();
        let bound = handle.local_addr();

        // Act
        let outcome = handle.stop().await;

        // Assert: stopped, and the same port can be bound again
        assert!(!outcome.is_found());
        UdpSocket::bind(bound)
            .await
            .expect("port must be free after stop");
    }

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        // Arrange: occupy a port
        let holder = UdpSocket::bind(loopback_any_port()).await.unwrap();
        let taken = holder.local_addr().unwrap();

        // Act
        let result = spawn(taken, "NEW GAME".to_string()).await;

        // Assert
        assert!(matches!(result, Err(DiscoveryError::BindFailed { .. })));
    }
}
