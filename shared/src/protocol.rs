//! Wire protocol between clients and the session server
//!
//! One bincode-encoded [`Packet`] per UDP datagram. Requests are answered
//! to the sender only ([`Packet::Welcome`] / [`Packet::Accepted`] /
//! [`Packet::Rejected`]); every accepted mutation additionally pushes a
//! [`Packet::State`] carrying the full [`Snapshot`] to every participant of
//! the session. There are no delta updates: a client can always rebuild its
//! whole view from the latest snapshot alone.

use serde::{Deserialize, Serialize};

use crate::game::{GameError, Phase, Player, PlayerId, Turn};
use crate::grid::{Grid, LineId};

/// Length of a session code: five alphanumeric characters, also used as
/// the shareable URL path segment.
pub const SESSION_ID_LEN: usize = 5;

/// Largest payload a single UDP datagram can carry. Receive buffers on
/// both sides are sized to this, so no packet the transport delivers is
/// ever truncated.
pub const MAX_DATAGRAM_LEN: usize = 65_507;

/// Largest board dimension the server accepts. The worst-case snapshot
/// of a board this size (every line claimed, full roster) must fit in a
/// single datagram.
pub const MAX_BOARD_DIM: u8 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Packet {
    // Client -> server. The sender of Create becomes player 0 of a fresh
    // session; Start and Turn are resolved against the session the sender
    // already belongs to.
    Create,
    Join { session_id: String },
    Start,
    Turn { line: LineId },
    Leave,

    // Server -> client.
    Welcome {
        session_id: String,
        player_id: PlayerId,
        snapshot: Snapshot,
    },
    Accepted,
    Rejected { error: GameError },
    State { snapshot: Snapshot },
}

/// Complete canonical session state, broadcast after every accepted
/// mutation. Line and box ownership and all scores are derived by
/// replaying `turns`; they are intentionally not part of the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub session_id: String,
    pub phase: Phase,
    pub grid: Grid,
    pub players: Vec<Player>,
    pub current_player: PlayerId,
    pub turns: Vec<Turn>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Orientation;
    use bincode::{deserialize, serialize};

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            session_id: "Ab3xZ".to_string(),
            phase: Phase::Active,
            grid: Grid::new(3, 3),
            players: vec![
                Player {
                    id: 0,
                    name: "Mr. Pink".to_string(),
                    color: "pink".to_string(),
                },
                Player {
                    id: 1,
                    name: "Mr. Orange".to_string(),
                    color: "orange".to_string(),
                },
            ],
            current_player: 1,
            turns: vec![Turn {
                sequence: 0,
                player_id: 0,
                line: LineId::horizontal(2, 1),
            }],
        }
    }

    #[test]
    fn test_state_packet_roundtrip() {
        let packet = Packet::State {
            snapshot: sample_snapshot(),
        };

        let bytes = serialize(&packet).unwrap();
        let decoded: Packet = deserialize(&bytes).unwrap();

        match decoded {
            Packet::State { snapshot } => {
                assert_eq!(snapshot.session_id, "Ab3xZ");
                assert_eq!(snapshot.phase, Phase::Active);
                assert_eq!(snapshot.players.len(), 2);
                assert_eq!(snapshot.current_player, 1);
                assert_eq!(snapshot.turns.len(), 1);
                assert_eq!(snapshot.turns[0].line.orientation, Orientation::Horizontal);
            }
            _ => panic!("wrong packet type after roundtrip"),
        }
    }

    #[test]
    fn test_rejected_carries_error_kind() {
        let packet = Packet::Rejected {
            error: GameError::NotYourTurn,
        };

        let bytes = serialize(&packet).unwrap();
        let decoded: Packet = deserialize(&bytes).unwrap();

        match decoded {
            Packet::Rejected { error } => {
                assert_eq!(error, GameError::NotYourTurn);
                assert_eq!(error.code(), "not_your_turn");
            }
            _ => panic!("wrong packet type after roundtrip"),
        }
    }

    #[test]
    fn test_worst_case_snapshot_fits_one_datagram() {
        use crate::game::ROSTER;

        let grid = Grid::new(MAX_BOARD_DIM, MAX_BOARD_DIM);
        let players: Vec<Player> = ROSTER
            .iter()
            .enumerate()
            .map(|(id, (name, color))| Player {
                id: id as PlayerId,
                name: name.to_string(),
                color: color.to_string(),
            })
            .collect();
        let turns: Vec<Turn> = grid
            .lines()
            .enumerate()
            .map(|(i, line)| Turn {
                sequence: i as u32,
                player_id: 4,
                line,
            })
            .collect();
        assert_eq!(turns.len(), grid.line_count());

        let packet = Packet::State {
            snapshot: Snapshot {
                session_id: "Ab3xZ".to_string(),
                phase: Phase::Finished,
                grid,
                players,
                current_player: 4,
                turns,
            },
        };

        let bytes = serialize(&packet).unwrap();
        assert!(
            bytes.len() <= MAX_DATAGRAM_LEN,
            "worst-case snapshot is {} bytes, over the {} byte datagram limit",
            bytes.len(),
            MAX_DATAGRAM_LEN
        );
    }

    #[test]
    fn test_turn_packet_roundtrip() {
        let packet = Packet::Turn {
            line: LineId::vertical(0, 2),
        };

        let bytes = serialize(&packet).unwrap();
        let decoded: Packet = deserialize(&bytes).unwrap();

        match decoded {
            Packet::Turn { line } => {
                assert_eq!(line, LineId::vertical(0, 2));
            }
            _ => panic!("wrong packet type after roundtrip"),
        }
    }
}
