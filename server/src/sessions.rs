//! Session management for the authoritative game server
//!
//! This module owns every live session, keyed by its shareable five
//! character code. All external mutation requests — create, join, start,
//! submit a turn — pass through the [`SessionManager`]; the game state
//! machine in `shared` decides acceptance, and the manager's caller
//! broadcasts the resulting snapshot. The manager is only ever driven from
//! the server's single event loop, so mutations of one session can never
//! interleave.
//!
//! Sessions are garbage-collected when their last participant address
//! detaches (explicit leave or timeout); there is no other eviction.

use log::info;
use rand::distributions::Alphanumeric;
use rand::Rng;
use shared::protocol::SESSION_ID_LEN;
use shared::{Game, GameError, Grid, LineId, PlayerId, Snapshot, TurnOutcome, ROSTER};
use std::collections::HashMap;
use std::net::SocketAddr;

/// One live session: the authoritative game plus the addresses snapshots
/// are delivered to. Seats and delivery addresses are tracked separately;
/// a seat survives its address timing out.
#[derive(Debug)]
pub struct Session {
    pub game: Game,
    pub participants: Vec<SocketAddr>,
}

/// Owns all sessions of the process and mediates every mutation.
pub struct SessionManager {
    sessions: HashMap<String, Session>,
    /// Board dimensions for newly created sessions.
    grid: Grid,
}

impl SessionManager {
    pub fn new(grid: Grid) -> Self {
        Self {
            sessions: HashMap::new(),
            grid,
        }
    }

    /// Allocates a fresh lobby session with the creator seated as player 0.
    ///
    /// The session code is random, five alphanumeric characters, and
    /// checked against live sessions: a collision is regenerated, never
    /// handed out twice.
    pub fn create_session(&mut self, addr: SocketAddr) -> (String, PlayerId) {
        let session_id = loop {
            let candidate = random_session_id();
            if !self.sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let mut game = Game::new(self.grid);
        let (name, color) = ROSTER[0];
        let player_id = game
            .add_player(name, color)
            .expect("fresh lobby always has a free seat");

        self.sessions.insert(
            session_id.clone(),
            Session {
                game,
                participants: vec![addr],
            },
        );
        info!("Session {} created by {}", session_id, addr);

        (session_id, player_id)
    }

    /// Seats a new player in an existing lobby.
    pub fn join_session(
        &mut self,
        session_id: &str,
        addr: SocketAddr,
    ) -> Result<PlayerId, GameError> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or(GameError::SessionNotFound)?;

        let (name, color) = ROSTER[session.game.players().len().min(ROSTER.len() - 1)];
        let player_id = session.game.add_player(name, color)?;
        session.participants.push(addr);
        info!(
            "Player {} ({}) joined session {} from {}",
            player_id, name, session_id, addr
        );

        Ok(player_id)
    }

    /// Moves a lobby into the active phase.
    pub fn start_session(&mut self, session_id: &str) -> Result<(), GameError> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or(GameError::SessionNotFound)?;

        session.game.start()?;
        info!(
            "Session {} started with {} players",
            session_id,
            session.game.players().len()
        );
        Ok(())
    }

    /// Validates and applies a move, propagating the state machine's
    /// rejection reasons verbatim.
    pub fn submit_turn(
        &mut self,
        session_id: &str,
        player_id: PlayerId,
        line: LineId,
    ) -> Result<TurnOutcome, GameError> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or(GameError::SessionNotFound)?;

        session.game.apply_turn(player_id, line)
    }

    /// The grid of a live session, for bounds-checking remote coordinates
    /// before they reach the panicking adjacency lookups.
    pub fn grid_of(&self, session_id: &str) -> Option<Grid> {
        self.sessions.get(session_id).map(|s| s.game.grid())
    }

    /// Full canonical state of a session, as broadcast to participants.
    pub fn snapshot(&self, session_id: &str) -> Option<Snapshot> {
        self.sessions.get(session_id).map(|session| Snapshot {
            session_id: session_id.to_string(),
            phase: session.game.phase(),
            grid: session.game.grid(),
            players: session.game.players().to_vec(),
            current_player: session.game.current_player(),
            turns: session.game.turns().to_vec(),
        })
    }

    /// Delivery addresses of a session's participants.
    pub fn participants(&self, session_id: &str) -> Vec<SocketAddr> {
        self.sessions
            .get(session_id)
            .map(|s| s.participants.clone())
            .unwrap_or_default()
    }

    /// Detaches an address from a session; the session itself is dropped
    /// once no participant address remains.
    pub fn remove_participant(&mut self, session_id: &str, addr: SocketAddr) {
        let Some(session) = self.sessions.get_mut(session_id) else {
            return;
        };
        session.participants.retain(|a| *a != addr);

        if session.participants.is_empty() {
            self.sessions.remove(session_id);
            info!("Session {} dropped (no participants left)", session_id);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Five random alphanumeric characters, the same alphabet the shareable
/// URL path segment uses.
fn random_session_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Phase, MAX_PLAYERS};

    fn test_addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    fn manager() -> SessionManager {
        SessionManager::new(Grid::new(2, 2))
    }

    #[test]
    fn test_create_session_seats_creator_as_player_zero() {
        let mut mgr = manager();
        let (session_id, player_id) = mgr.create_session(test_addr(9000));

        assert_eq!(session_id.len(), SESSION_ID_LEN);
        assert!(session_id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(player_id, 0);
        assert_eq!(mgr.len(), 1);

        let snapshot = mgr.snapshot(&session_id).unwrap();
        assert_eq!(snapshot.phase, Phase::Lobby);
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.players[0].name, "Mr. Pink");
        assert!(snapshot.turns.is_empty());
    }

    #[test]
    fn test_session_ids_are_unique() {
        let mut mgr = manager();
        let mut ids = std::collections::HashSet::new();
        for port in 0..50 {
            let (id, _) = mgr.create_session(test_addr(9000 + port));
            assert!(ids.insert(id), "duplicate session code handed out");
        }
    }

    #[test]
    fn test_join_assigns_next_seat_and_color() {
        let mut mgr = manager();
        let (session_id, _) = mgr.create_session(test_addr(9000));

        let player_id = mgr.join_session(&session_id, test_addr(9001)).unwrap();
        assert_eq!(player_id, 1);

        let snapshot = mgr.snapshot(&session_id).unwrap();
        assert_eq!(snapshot.players[1].name, "Mr. Orange");
        assert_eq!(snapshot.players[1].color, "orange");
        assert_eq!(mgr.participants(&session_id).len(), 2);
    }

    #[test]
    fn test_join_unknown_session() {
        let mut mgr = manager();
        let err = mgr.join_session("zzzzz", test_addr(9001)).unwrap_err();
        assert_eq!(err, GameError::SessionNotFound);
    }

    #[test]
    fn test_join_full_session() {
        let mut mgr = manager();
        let (session_id, _) = mgr.create_session(test_addr(9000));
        for i in 1..MAX_PLAYERS {
            mgr.join_session(&session_id, test_addr(9000 + i as u16))
                .unwrap();
        }

        let err = mgr.join_session(&session_id, test_addr(9100)).unwrap_err();
        assert_eq!(err, GameError::MaxPlayersReached);
    }

    #[test]
    fn test_join_after_start() {
        let mut mgr = manager();
        let (session_id, _) = mgr.create_session(test_addr(9000));
        mgr.join_session(&session_id, test_addr(9001)).unwrap();
        mgr.start_session(&session_id).unwrap();

        let err = mgr.join_session(&session_id, test_addr(9002)).unwrap_err();
        assert_eq!(err, GameError::GameAlreadyStarted);
    }

    #[test]
    fn test_start_requires_enough_players() {
        let mut mgr = manager();
        let (session_id, _) = mgr.create_session(test_addr(9000));

        let err = mgr.start_session(&session_id).unwrap_err();
        assert_eq!(err, GameError::NotEnoughPlayers);

        assert_eq!(
            mgr.start_session("zzzzz").unwrap_err(),
            GameError::SessionNotFound
        );
    }

    #[test]
    fn test_submit_turn_roundtrip() {
        let mut mgr = manager();
        let (session_id, _) = mgr.create_session(test_addr(9000));
        mgr.join_session(&session_id, test_addr(9001)).unwrap();

        // Before start the state machine's rejection passes through.
        let err = mgr
            .submit_turn(&session_id, 0, LineId::horizontal(0, 0))
            .unwrap_err();
        assert_eq!(err, GameError::GameNotStarted);

        mgr.start_session(&session_id).unwrap();
        let outcome = mgr
            .submit_turn(&session_id, 0, LineId::horizontal(0, 0))
            .unwrap();
        assert!(outcome.boxes_closed.is_empty());

        let snapshot = mgr.snapshot(&session_id).unwrap();
        assert_eq!(snapshot.turns.len(), 1);
        assert_eq!(snapshot.current_player, 1);

        assert_eq!(
            mgr.submit_turn("zzzzz", 0, LineId::horizontal(0, 0))
                .unwrap_err(),
            GameError::SessionNotFound
        );
    }

    #[test]
    fn test_closing_a_box_keeps_the_turn() {
        let mut mgr = manager();
        let (session_id, _) = mgr.create_session(test_addr(9000));
        mgr.join_session(&session_id, test_addr(9001)).unwrap();
        mgr.start_session(&session_id).unwrap();

        // Alternating non-closing moves assemble the top-left box, with
        // player 1 spending one move elsewhere on the board.
        mgr.submit_turn(&session_id, 0, LineId::horizontal(0, 0))
            .unwrap();
        mgr.submit_turn(&session_id, 1, LineId::horizontal(0, 1))
            .unwrap();
        mgr.submit_turn(&session_id, 0, LineId::vertical(0, 0))
            .unwrap();
        mgr.submit_turn(&session_id, 1, LineId::vertical(2, 0))
            .unwrap();

        let outcome = mgr
            .submit_turn(&session_id, 0, LineId::vertical(1, 0))
            .unwrap();
        assert_eq!(outcome.boxes_closed, vec![shared::BoxId::new(0, 0)]);
        assert!(!outcome.finished);

        let snapshot = mgr.snapshot(&session_id).unwrap();
        // Bonus turn: still player 0's move.
        assert_eq!(snapshot.current_player, 0);
    }

    #[test]
    fn test_session_dropped_when_last_participant_leaves() {
        let mut mgr = manager();
        let (session_id, _) = mgr.create_session(test_addr(9000));
        mgr.join_session(&session_id, test_addr(9001)).unwrap();

        mgr.remove_participant(&session_id, test_addr(9000));
        assert_eq!(mgr.len(), 1, "session lives while a participant remains");

        mgr.remove_participant(&session_id, test_addr(9001));
        assert!(mgr.is_empty());
        assert!(mgr.snapshot(&session_id).is_none());
    }
}
