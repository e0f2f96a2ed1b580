//! Participant connection tracking for the session server
//!
//! This module maps transport addresses to session membership, including:
//! - Which session and seat a remote address belongs to
//! - Liveness tracking (last packet seen per address)
//! - Timeout detection and automatic registry cleanup
//!
//! It deliberately knows nothing about game rules: detaching an address
//! from the registry never removes the player's seat or moves from the
//! session, it only forgets where to deliver snapshots. Reconnection is
//! out of scope, so a timed-out address is simply gone.

use log::info;
use shared::PlayerId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// How long an address may stay silent before it is detached. Generous
/// because a turn-based client sends nothing while its player thinks.
pub const PARTICIPANT_TIMEOUT: Duration = Duration::from_secs(300);

/// A remote address participating in one session.
#[derive(Debug)]
pub struct Participant {
    /// Network address for delivering responses and snapshots
    pub addr: SocketAddr,
    /// Code of the session this address belongs to
    pub session_id: String,
    /// Seat index within that session's roster
    pub player_id: PlayerId,
    /// Last time any packet arrived from this address
    pub last_seen: Instant,
}

impl Participant {
    fn new(addr: SocketAddr, session_id: String, player_id: PlayerId) -> Self {
        Self {
            addr,
            session_id,
            player_id,
            last_seen: Instant::now(),
        }
    }

    /// True if no packet has arrived within `timeout`.
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Registry of all participating addresses across all sessions.
///
/// One address participates in at most one session at a time; a Create or
/// Join from an already-registered address replaces its previous
/// membership.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    participants: HashMap<SocketAddr, Participant>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates an address with a session seat, replacing any previous
    /// membership of the same address.
    pub fn register(&mut self, addr: SocketAddr, session_id: &str, player_id: PlayerId) {
        info!(
            "Participant {} registered as player {} in session {}",
            addr, player_id, session_id
        );
        self.participants
            .insert(addr, Participant::new(addr, session_id.to_string(), player_id));
    }

    /// Detaches an address, returning its former membership if any.
    pub fn remove(&mut self, addr: SocketAddr) -> Option<Participant> {
        let participant = self.participants.remove(&addr);
        if let Some(p) = &participant {
            info!(
                "Participant {} left session {} (player {})",
                addr, p.session_id, p.player_id
            );
        }
        participant
    }

    /// Looks up the membership of an address.
    pub fn get(&self, addr: SocketAddr) -> Option<&Participant> {
        self.participants.get(&addr)
    }

    /// Marks an address as alive. Called for every packet received.
    pub fn refresh(&mut self, addr: SocketAddr) {
        if let Some(p) = self.participants.get_mut(&addr) {
            p.last_seen = Instant::now();
        }
    }

    /// Removes every timed-out address from the registry and returns the
    /// detached memberships so the caller can evict them from their
    /// sessions.
    pub fn check_timeouts(&mut self) -> Vec<Participant> {
        let timed_out: Vec<SocketAddr> = self
            .participants
            .values()
            .filter(|p| p.is_timed_out(PARTICIPANT_TIMEOUT))
            .map(|p| p.addr)
            .collect();

        timed_out
            .into_iter()
            .filter_map(|addr| self.remove(addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
