//! Peer discovery: turns "two programs on the same LAN" into one TCP
//! connection and a role for each side.
//!
//! Each peer runs the same race:
//!
//! 1. Listen on the discovery UDP port for someone else's announcement.
//! 2. Listen on its own randomly chosen rendezvous TCP port for a connection.
//! 3. Every announce interval, broadcast `"<tag>:<rendezvous-port>"`.
//!
//! Whichever happens first decides the role:
//!
//! - **Heard an announcement** → dial the announced port.  This peer is the
//!   [`Role::Responder`] and moves second.
//! - **Accepted a connection** → someone heard us.  This peer is the
//!   [`Role::Initiator`] and moves first.
//!
//! The wait is a `biased` [`tokio::select!`], so if both listeners are done
//! at once the announcement wins and the role is always Responder.
//!
//! # Why the broadcast listener stops before announcing
//!
//! The announce socket is bound to the discovery port, and a broadcast is
//! delivered to the sending host as well.  Stopping our own listener first
//! frees the port and keeps this peer from answering itself.

use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;
use std::time::Duration;

use c4_core::{decode_announce, encode_announce, AnnounceMessage, Role};
use rand::Rng;
use thiserror::Error;
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::broadcast_listener::{self, Announcement};
use super::listener::{ListenOutcome, ListenerHandle};
use super::rendezvous_listener;

/// Error type for discovery operations.
///
/// All variants are transport-fatal: the session cannot start.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// A listener socket could not be bound.
    #[error("failed to bind {kind} socket on {addr}: {source}")]
    BindFailed {
        kind: &'static str,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The outbound connection to an announcing peer failed.
    #[error("failed to connect to {remote} from {local}: {source}")]
    Connect {
        local: SocketAddr,
        remote: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The rendezvous listener task ended without being asked to.
    #[error("rendezvous listener stopped unexpectedly")]
    RendezvousStopped,
}

/// Everything discovery needs to know, already resolved to socket types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Local IP all sockets bind to.
    pub bind_ip: IpAddr,
    /// UDP port announcements are received on and sent from.
    pub discovery_port: u16,
    /// Where announcements are sent, normally `255.255.255.255:<discovery_port>`.
    pub broadcast_target: SocketAddr,
    /// Tag that prefixes every announcement.
    pub tag: String,
    /// Time between announcements.
    pub announce_interval: Duration,
    /// This peer's rendezvous TCP port.
    pub rendezvous_port: u16,
}

impl DiscoveryConfig {
    pub fn discovery_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.discovery_port)
    }

    pub fn rendezvous_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.rendezvous_port)
    }
}

/// The result of a successful discovery race.
#[derive(Debug)]
pub struct DiscoveredPeer {
    /// The session's only connection.
    pub stream: TcpStream,
    /// Which side of the race this peer won.
    pub role: Role,
    /// The opponent's end of `stream`.
    pub peer_addr: SocketAddr,
}

/// Picks a rendezvous port uniformly at random from `range`.
///
/// An empty range yields its start.
pub fn choose_rendezvous_port(range: RangeInclusive<u16>) -> u16 {
    if range.is_empty() {
        return *range.start();
    }
    rand::rng().random_range(range)
}

// ── The race ──────────────────────────────────────────────────────────────────

/// One step of the discovery race.
#[derive(Debug)]
pub(crate) enum RaceEvent<A, C> {
    Announced(ListenOutcome<A>),
    Accepted(ListenOutcome<C>),
    AnnounceDue,
}

impl<A, C> RaceEvent<A, C> {
    /// The role this event hands the peer if it ends the race.
    ///
    /// An announcement makes the peer the Responder and an accepted
    /// connection makes it the Initiator.  An announcement whose port turns
    /// out to be unusable is discarded later and the race goes on.
    pub(crate) fn role(&self) -> Option<Role> {
        match self {
            RaceEvent::Announced(ListenOutcome::Found(_)) => Some(Role::Responder),
            RaceEvent::Accepted(ListenOutcome::Found(_)) => Some(Role::Initiator),
            _ => None,
        }
    }
}

/// Waits for the first of: announcement, accepted connection, announce tick.
///
/// Branches are polled in that order, so a ready announcement always beats a
/// ready connection.
pub(crate) async fn next_event<FA, FC, A, C>(
    announced: &mut FA,
    accepted: &mut FC,
    ticker: &mut Interval,
) -> RaceEvent<A, C>
where
    FA: Future<Output = ListenOutcome<A>> + Unpin,
    FC: Future<Output = ListenOutcome<C>> + Unpin,
{
    tokio::select! {
        biased;

        outcome = announced => RaceEvent::Announced(outcome),
        outcome = accepted => RaceEvent::Accepted(outcome),
        _ = ticker.tick() => RaceEvent::AnnounceDue,
    }
}

/// Runs the discovery race until this peer has a connection and a role.
///
/// # Errors
///
/// Returns [`DiscoveryError`] if a listener cannot be bound, the outbound
/// connection to an announcing peer fails, or the rendezvous listener dies.
pub async fn discover(config: &DiscoveryConfig) -> Result<DiscoveredPeer, DiscoveryError> {
    let discovery_addr = config.discovery_addr();
    let mut broadcast = broadcast_listener::spawn(discovery_addr, config.tag.clone()).await?;
    let mut rendezvous = rendezvous_listener::spawn(config.rendezvous_addr())?;

    let period = config.announce_interval;
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        discovery = %discovery_addr,
        rendezvous_port = config.rendezvous_port,
        "looking for an opponent"
    );

    loop {
        let event = next_event(&mut broadcast, &mut rendezvous, &mut ticker).await;
        if let Some(role) = event.role() {
            debug!(%role, "race event");
        }
        match event {
            RaceEvent::Announced(ListenOutcome::Found(announcement)) => {
                if let Some(remote) = announced_endpoint(&announcement, &config.tag) {
                    return respond(config, remote, rendezvous).await;
                }
            }
            RaceEvent::Announced(ListenOutcome::Stopped) => {
                warn!("broadcast listener stopped unexpectedly; restarting");
            }
            RaceEvent::Accepted(ListenOutcome::Found((stream, peer_addr))) => {
                if let ListenOutcome::Found(late) = broadcast.stop().await {
                    debug!(source = %late.source, "dropping announcement that lost the race");
                }
                info!(%peer_addr, "opponent connected; playing first");
                return Ok(DiscoveredPeer {
                    stream,
                    role: Role::Initiator,
                    peer_addr,
                });
            }
            RaceEvent::Accepted(ListenOutcome::Stopped) => {
                return Err(DiscoveryError::RendezvousStopped);
            }
            RaceEvent::AnnounceDue => {
                if let Some(remote) = stop_for_announce(broadcast, &config.tag).await {
                    return respond(config, remote, rendezvous).await;
                }
                send_announce(config).await;
            }
        }

        broadcast = broadcast_listener::spawn(discovery_addr, config.tag.clone()).await?;
    }
}

/// Stops the broadcast listener so the discovery port is free to announce
/// from, returning the endpoint of a matching announcement it caught first.
async fn stop_for_announce(
    broadcast: ListenerHandle<Announcement>,
    tag: &str,
) -> Option<SocketAddr> {
    match broadcast.stop().await {
        ListenOutcome::Found(announcement) => announced_endpoint(&announcement, tag),
        ListenOutcome::Stopped => None,
    }
}

/// Extracts the endpoint to dial from a matching announcement, or `None` if
/// its port is malformed.
fn announced_endpoint(announcement: &Announcement, tag: &str) -> Option<SocketAddr> {
    match decode_announce(&announcement.payload, tag) {
        Ok(msg) => Some(SocketAddr::new(announcement.source.ip(), msg.port)),
        Err(e) => {
            warn!(source = %announcement.source, "discarding announcement: {e}");
            None
        }
    }
}

/// Responder branch: release the rendezvous port and dial the announcer from it.
async fn respond(
    config: &DiscoveryConfig,
    remote: SocketAddr,
    rendezvous: ListenerHandle<(TcpStream, SocketAddr)>,
) -> Result<DiscoveredPeer, DiscoveryError> {
    if let ListenOutcome::Found((_, dropped)) = rendezvous.stop().await {
        debug!(peer = %dropped, "dropping inbound connection that lost the race");
    }

    let local = config.rendezvous_addr();
    info!(%remote, "answering announcement; playing second");
    let stream = connect_from(local, remote)
        .await
        .map_err(|source| DiscoveryError::Connect {
            local,
            remote,
            source,
        })?;

    Ok(DiscoveredPeer {
        stream,
        role: Role::Responder,
        peer_addr: remote,
    })
}

async fn connect_from(local: SocketAddr, remote: SocketAddr) -> io::Result<TcpStream> {
    let socket = rendezvous_listener::reusable_tcp_socket(local)?;
    socket.bind(local)?;
    socket.connect(remote).await
}

/// Sends one announcement.  Failures are logged and otherwise ignored.
async fn send_announce(config: &DiscoveryConfig) {
    let msg = AnnounceMessage::new(config.tag.as_str(), config.rendezvous_port);
    match broadcast_once(config.discovery_addr(), config.broadcast_target, &msg).await {
        Ok(()) => info!(
            target_addr = %config.broadcast_target,
            "announced game on port {}",
            msg.port
        ),
        Err(e) => warn!(
            target_addr = %config.broadcast_target,
            "failed to send announcement: {e}"
        ),
    }
}

async fn broadcast_once(
    bind_addr: SocketAddr,
    target: SocketAddr,
    msg: &AnnounceMessage,
) -> io::Result<()> {
    let socket = UdpSocket::bind(bind_addr).await?;
    socket.set_broadcast(true)?;
    socket.send_to(&encode_announce(msg), target).await?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
