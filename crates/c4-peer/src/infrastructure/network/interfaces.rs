//! Broadcast address detection from the host's network interfaces.
//!
//! The limited broadcast `255.255.255.255` only leaves through the interface
//! that owns the default route.  When no broadcast address is configured the
//! peer instead announces on the directed broadcast address of the first
//! usable IPv4 interface, and falls back to the limited broadcast when there
//! is none.

use std::io;
use std::net::Ipv4Addr;

use if_addrs::IfAddr;
use tracing::{debug, info, warn};

/// Address used when no interface yields a directed broadcast address.
pub const LIMITED_BROADCAST: Ipv4Addr = Ipv4Addr::BROADCAST;

/// The parts of an IPv4 interface address that broadcast selection looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceV4 {
    pub name: String,
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
    /// Broadcast address reported by the OS, if any.
    pub broadcast: Option<Ipv4Addr>,
    pub is_loopback: bool,
}

impl InterfaceV4 {
    /// The directed broadcast address of this interface's subnet.
    ///
    /// Uses the OS-reported address when present, otherwise derives it from
    /// the netmask.  Point-to-point style masks (`/31`, `/32`) have none.
    pub fn directed_broadcast(&self) -> Option<Ipv4Addr> {
        if let Some(broadcast) = self.broadcast {
            return Some(broadcast);
        }
        let mask = u32::from(self.netmask);
        if mask.count_ones() >= 31 {
            return None;
        }
        Some(Ipv4Addr::from(u32::from(self.ip) | !mask))
    }

    fn is_usable(&self) -> bool {
        !self.is_loopback && !self.ip.is_loopback() && !self.ip.is_link_local()
    }
}

/// Picks the directed broadcast address of the first usable interface.
///
/// Loopback and link-local (unconfigured) interfaces are skipped.
pub fn select_broadcast(interfaces: &[InterfaceV4]) -> Option<Ipv4Addr> {
    interfaces
        .iter()
        .filter(|iface| iface.is_usable())
        .find_map(|iface| {
            let broadcast = iface.directed_broadcast()?;
            debug!(interface = %iface.name, ip = %iface.ip, %broadcast, "broadcast candidate");
            Some(broadcast)
        })
}

/// Lists the host's IPv4 interface addresses.
///
/// # Errors
///
/// Returns the OS error if the interface table cannot be read.
pub fn local_ipv4_interfaces() -> io::Result<Vec<InterfaceV4>> {
    let interfaces = if_addrs::get_if_addrs()?
        .into_iter()
        .filter_map(|iface| {
            let is_loopback = iface.is_loopback();
            match iface.addr {
                IfAddr::V4(v4) => Some(InterfaceV4 {
                    name: iface.name,
                    ip: v4.ip,
                    netmask: v4.netmask,
                    broadcast: v4.broadcast,
                    is_loopback,
                }),
                IfAddr::V6(_) => None,
            }
        })
        .collect();
    Ok(interfaces)
}

/// Returns the broadcast address announcements should be sent to.
pub fn detect_broadcast_address() -> Ipv4Addr {
    let interfaces = match local_ipv4_interfaces() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            warn!("cannot list network interfaces: {e}; using {LIMITED_BROADCAST}");
            return LIMITED_BROADCAST;
        }
    };
    match select_broadcast(&interfaces) {
        Some(broadcast) => {
            info!(%broadcast, "detected broadcast address");
            broadcast
        }
        None => {
            warn!("no interface has a broadcast address; using {LIMITED_BROADCAST}");
            LIMITED_BROADCAST
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
