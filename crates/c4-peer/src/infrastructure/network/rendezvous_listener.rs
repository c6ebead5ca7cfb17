//! TCP listener that accepts the opponent's single inbound connection.
//!
//! The port is the one advertised in this peer's announcements.  At most one
//! connection is ever returned per listener; once it is accepted the listening
//! socket is closed.

use std::io;
use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::discovery::DiscoveryError;
use super::listener::{ListenOutcome, ListenerHandle};

/// Pending-connection backlog.  Only one connection is ever accepted.
const BACKLOG: u32 = 1;

/// Creates a TCP socket of the right address family with `SO_REUSEADDR` set.
///
/// The rendezvous port is bound twice in a Responder's lifetime (first by the
/// listener, then as the local end of the outbound connection), so both binds
/// go through here.
pub(crate) fn reusable_tcp_socket(addr: SocketAddr) -> io::Result<TcpSocket> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    Ok(socket)
}

/// Binds `bind_addr`, starts listening, and spawns the accept task.
///
/// # Errors
///
/// Returns [`DiscoveryError::BindFailed`] if the port cannot be bound.
pub fn spawn(
    bind_addr: SocketAddr,
) -> Result<ListenerHandle<(TcpStream, SocketAddr)>, DiscoveryError> {
    let bind_failed = |source| DiscoveryError::BindFailed {
        kind: "rendezvous",
        addr: bind_addr,
        source,
    };
    let socket = reusable_tcp_socket(bind_addr).map_err(bind_failed)?;
    socket.bind(bind_addr).map_err(bind_failed)?;
    let listener = socket.listen(BACKLOG).map_err(bind_failed)?;
    let local_addr = listener.local_addr().unwrap_or(bind_addr);
    debug!(%local_addr, "rendezvous listener started");

    Ok(ListenerHandle::spawn(local_addr, move |stop_rx| {
        accept_one(listener, stop_rx)
    }))
}

/// The accept loop executed by the listener task.
async fn accept_one(
    listener: TcpListener,
    mut stop_rx: oneshot::Receiver<()>,
) -> ListenOutcome<(TcpStream, SocketAddr)> {
    loop {
        tokio::select! {
            biased;

            _ = &mut stop_rx => {
                debug!("rendezvous listener stopped");
                return ListenOutcome::Stopped;
            }

            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    info!(%peer_addr, "accepted rendezvous connection");
                    return ListenOutcome::Found((stream, peer_addr));
                }
                Err(e) => warn!("rendezvous accept error: {e}"),
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
