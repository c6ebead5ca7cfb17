//! Integration tests for the discovery race over real loopback sockets.
//!
//! Broadcast addresses are not needed here: each peer's announcements are
//! aimed straight at the other peer's discovery port on `127.0.0.1`.  The
//! "eager" peer announces every 100 ms while the "quiet" peer's interval is a
//! minute, so the eager peer is always the one heard first.
//!
//! ```text
//! eager                                quiet
//! ─────                                ─────
//! "NEW GAME:<rx>"  ── UDP ──────────►  heard announcement
//!                                      stop rendezvous, dial rx
//! accept on rx     ◄── TCP ──────────  connect from ry
//! Initiator                            Responder
//! ```

use std::net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener, UdpSocket as StdUdpSocket};
use std::time::Duration;

use c4_core::{Role, DEFAULT_DISCOVERY_TAG};
use c4_peer::infrastructure::network::discovery::{discover, DiscoveryConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, UdpSocket};
use tokio::time::{sleep, timeout};

const RACE_TIMEOUT: Duration = Duration::from_secs(10);

// ── Helpers ───────────────────────────────────────────────────────────────────

/// A UDP port the OS considers free right now.
fn free_udp_port() -> u16 {
    let socket = StdUdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    socket.local_addr().unwrap().port()
}

/// A TCP port the OS considers free right now.
fn free_tcp_port() -> u16 {
    let listener = StdTcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    listener.local_addr().unwrap().port()
}

fn peer_config(own_udp: u16, other_udp: u16, interval: Duration) -> DiscoveryConfig {
    DiscoveryConfig {
        bind_ip: Ipv4Addr::LOCALHOST.into(),
        discovery_port: own_udp,
        broadcast_target: SocketAddr::from((Ipv4Addr::LOCALHOST, other_udp)),
        tag: DEFAULT_DISCOVERY_TAG.to_string(),
        announce_interval: interval,
        rendezvous_port: free_tcp_port(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_two_peers_agree_on_opposite_roles() {
    // Arrange
    let (eager_udp, quiet_udp) = (free_udp_port(), free_udp_port());
    let eager = peer_config(eager_udp, quiet_udp, Duration::from_millis(100));
    let quiet = peer_config(quiet_udp, eager_udp, Duration::from_secs(60));

    // Act
    let (eager_peer, quiet_peer) = timeout(RACE_TIMEOUT, async {
        tokio::join!(discover(&eager), discover(&quiet))
    })
    .await
    .expect("discovery must finish");
    let eager_peer = eager_peer.unwrap();
    let quiet_peer = quiet_peer.unwrap();

    // Assert
    assert_eq!(eager_peer.role, Role::Initiator);
    assert_eq!(quiet_peer.role, Role::Responder);
    assert_eq!(quiet_peer.peer_addr, eager.rendezvous_addr());
    assert_eq!(eager_peer.peer_addr, quiet.rendezvous_addr());
}

#[tokio::test]
async fn test_discovered_stream_carries_lines_both_ways() {
    // Arrange
    let (eager_udp, quiet_udp) = (free_udp_port(), free_udp_port());
    let eager = peer_config(eager_udp, quiet_udp, Duration::from_millis(100));
    let quiet = peer_config(quiet_udp, eager_udp, Duration::from_secs(60));
    let (initiator, responder) = timeout(RACE_TIMEOUT, async {
        tokio::join!(discover(&eager), discover(&quiet))
    })
    .await
    .expect("discovery must finish");
    let mut initiator = initiator.unwrap().stream;
    let mut responder = BufReader::new(responder.unwrap().stream);

    // Act
    initiator.write_all(b"INSERT:3\n").await.unwrap();
    let mut line = String::new();
    responder.read_line(&mut line).await.unwrap();
    responder.get_mut().write_all(b"YOU WIN\n").await.unwrap();
    let mut reply = String::new();
    BufReader::new(&mut initiator)
        .read_line(&mut reply)
        .await
        .unwrap();

    // Assert
    assert_eq!(line, "INSERT:3\n");
    assert_eq!(reply, "YOU WIN\n");
}

#[tokio::test]
async fn test_foreign_tag_is_never_answered() {
    // Arrange: the eager peer announces a different game
    let (eager_udp, quiet_udp) = (free_udp_port(), free_udp_port());
    let mut eager = peer_config(eager_udp, quiet_udp, Duration::from_millis(50));
    eager.tag = "OTHER GAME".to_string();
    let quiet = peer_config(quiet_udp, eager_udp, Duration::from_secs(60));

    // Act
    let result = timeout(Duration::from_millis(500), async {
        tokio::join!(discover(&eager), discover(&quiet))
    })
    .await;

    // Assert
    assert!(result.is_err(), "neither peer may find an opponent");
}

#[tokio::test]
async fn test_bad_port_announcement_is_skipped_and_waiting_continues() {
    // Arrange: a stand-in opponent listens on TCP and announces by hand
    let quiet_udp = free_udp_port();
    let quiet = peer_config(quiet_udp, free_udp_port(), Duration::from_secs(60));
    let opponent = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let opponent_addr = opponent.local_addr().unwrap();
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let target = SocketAddr::from((Ipv4Addr::LOCALHOST, quiet_udp));
    let valid = format!("{DEFAULT_DISCOVERY_TAG}:{}", opponent_addr.port());

    let announcer = async {
        sleep(Duration::from_millis(100)).await;
        sender.send_to(b"NEW GAME:banana", target).await.unwrap();
        // The listener restarts after the bad announcement; repeat until heard.
        for _ in 0..100 {
            sleep(Duration::from_millis(50)).await;
            sender.send_to(valid.as_bytes(), target).await.unwrap();
        }
    };

    // Act
    let found = timeout(RACE_TIMEOUT, async {
        tokio::select! {
            found = discover(&quiet) => found,
            _ = announcer => panic!("announcement was never answered"),
        }
    })
    .await
    .expect("discovery must finish")
    .unwrap();
    let (_, dialled_from) = opponent.accept().await.unwrap();

    // Assert
    assert_eq!(found.role, Role::Responder);
    assert_eq!(found.peer_addr, opponent_addr);
    assert_eq!(dialled_from, quiet.rendezvous_addr());
}
