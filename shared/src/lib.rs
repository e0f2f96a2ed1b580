//! Shared game logic and wire protocol for networked dots-and-boxes
//!
//! Everything both sides of the wire must agree on lives here:
//!
//! - [`grid`]: the pure board model — line/box identifiers and adjacency.
//! - [`game`]: the turn state machine — move validation, box-closure
//!   detection, bonus turns, scoring and winner determination.
//! - [`protocol`]: the bincode packet types exchanged over UDP.
//!
//! The server applies moves through [`game::Game`] and broadcasts the full
//! session snapshot after every accepted mutation; clients rebuild their
//! local view by replaying the snapshot's turn log through the same
//! [`game::Game`] code. Sharing this crate is what makes the replay
//! deterministic across parties.

pub mod game;
pub mod grid;
pub mod protocol;

pub use game::{
    Game, GameError, Outcome, Phase, Player, PlayerId, Turn, TurnOutcome, MAX_PLAYERS,
    MIN_PLAYERS, ROSTER,
};
pub use grid::{BoxId, Grid, LineId, Orientation};
pub use protocol::{Packet, Snapshot, MAX_BOARD_DIM, MAX_DATAGRAM_LEN, SESSION_ID_LEN};
