//! Turn state machine for a single dots-and-boxes session
//!
//! The [`Game`] owns line and box ownership, the player roster and the
//! append-only turn log. The turn log is the source of truth: current
//! ownership is always reproducible by folding the log from an empty board
//! through [`Game::replay`], and both server and client run this exact code
//! so their views cannot diverge.
//!
//! Box closure is detected by a static adjacency lookup: after a line is
//! claimed, its one or two neighboring boxes are tested directly for four
//! owned edges. Scores are never stored; they are recomputed from box
//! ownership on demand.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{BoxId, Grid, LineId};

/// Index of a player within a session's roster.
pub type PlayerId = u8;

/// Fewest players a game can start with.
pub const MIN_PLAYERS: usize = 2;

/// Seat limit per session; also the length of [`ROSTER`].
pub const MAX_PLAYERS: usize = 5;

/// Default name and color per seat, assigned in join order.
pub const ROSTER: [(&str, &str); MAX_PLAYERS] = [
    ("Mr. Pink", "pink"),
    ("Mr. Orange", "orange"),
    ("Mr. Blue", "blue"),
    ("Mr. Brown", "brown"),
    ("Mr. White", "white"),
];

/// Session lifecycle phase. Transitions only move forward:
/// lobby -> active -> finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Lobby,
    Active,
    Finished,
}

/// A seated player. Score is deliberately absent: it is derived from box
/// ownership via [`Game::scores`] so it can never drift from the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
}

/// One accepted move, as recorded in the append-only turn log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub sequence: u32,
    pub player_id: PlayerId,
    pub line: LineId,
}

/// Why a request was rejected. Rejections are reported to the requester
/// only, never broadcast, and never mutate session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("session not found")]
    SessionNotFound,
    #[error("game already started")]
    GameAlreadyStarted,
    #[error("maximum number of players reached")]
    MaxPlayersReached,
    #[error("waiting for players")]
    NotEnoughPlayers,
    #[error("game not started")]
    GameNotStarted,
    #[error("not your turn")]
    NotYourTurn,
    #[error("line already taken")]
    LineAlreadyTaken,
}

impl GameError {
    /// Stable wire code for this rejection.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound => "session_not_found",
            Self::GameAlreadyStarted => "game_already_started",
            Self::MaxPlayersReached => "max_players",
            Self::NotEnoughPlayers => "not_enough_players",
            Self::GameNotStarted => "game_not_started",
            Self::NotYourTurn => "not_your_turn",
            Self::LineAlreadyTaken => "line_already_taken",
        }
    }
}

/// Result of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Boxes whose fourth edge this move supplied. Non-empty means the
    /// mover keeps the turn.
    pub boxes_closed: Vec<BoxId>,
    /// True if this move filled the last open box.
    pub finished: bool,
}

/// Final result of a finished game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Winner(PlayerId),
    /// Two or more players tied for the strict maximum score.
    Tie(Vec<PlayerId>),
}

/// Authoritative state of one game.
#[derive(Debug, Clone)]
pub struct Game {
    grid: Grid,
    phase: Phase,
    players: Vec<Player>,
    current_player: usize,
    line_owners: HashMap<LineId, PlayerId>,
    box_owners: HashMap<BoxId, PlayerId>,
    turns: Vec<Turn>,
}

impl Game {
    /// Creates an empty game in the lobby phase.
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            phase: Phase::Lobby,
            players: Vec::new(),
            current_player: 0,
            line_owners: HashMap::new(),
            box_owners: HashMap::new(),
            turns: Vec::new(),
        }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Roster index of the player whose move it is.
    pub fn current_player(&self) -> PlayerId {
        self.current_player as PlayerId
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn line_owner(&self, line: LineId) -> Option<PlayerId> {
        self.line_owners.get(&line).copied()
    }

    pub fn box_owner(&self, b: BoxId) -> Option<PlayerId> {
        self.box_owners.get(&b).copied()
    }

    /// Seats a new player, returning their roster index.
    pub fn add_player(&mut self, name: &str, color: &str) -> Result<PlayerId, GameError> {
        if self.phase != Phase::Lobby {
            return Err(GameError::GameAlreadyStarted);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::MaxPlayersReached);
        }

        let id = self.players.len() as PlayerId;
        self.players.push(Player {
            id,
            name: name.to_string(),
            color: color.to_string(),
        });
        Ok(id)
    }

    /// Transitions lobby -> active.
    pub fn start(&mut self) -> Result<(), GameError> {
        if self.phase != Phase::Lobby {
            return Err(GameError::GameAlreadyStarted);
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }

        self.phase = Phase::Active;
        Ok(())
    }

    /// Validates and applies one move.
    ///
    /// Validation order (first failure wins): game must be active, the line
    /// must be unowned, and it must be the requester's turn. A rejected
    /// move leaves the state untouched.
    ///
    /// On acceptance the line becomes owned by `player_id` (write-once),
    /// every adjacent box whose four edges are now all owned is closed for
    /// `player_id`, and the move is appended to the turn log. Closing at
    /// least one box keeps the turn with the mover; otherwise the turn
    /// passes to the next seat, wrapping around. Filling the last box ends
    /// the game.
    ///
    /// The line must be in range for this grid; out-of-range coordinates
    /// are a programming error and panic, so callers handling remote input
    /// check [`Grid::contains_line`] first.
    pub fn apply_turn(
        &mut self,
        player_id: PlayerId,
        line: LineId,
    ) -> Result<TurnOutcome, GameError> {
        if self.phase != Phase::Active {
            return Err(GameError::GameNotStarted);
        }
        if self.line_owners.contains_key(&line) {
            return Err(GameError::LineAlreadyTaken);
        }
        if player_id != self.players[self.current_player].id {
            return Err(GameError::NotYourTurn);
        }

        self.line_owners.insert(line, player_id);

        // A box can only close when its fourth edge arrives, and this line
        // is an edge of every adjacent box, so no closed box is ever seen
        // here with a prior owner.
        let mut boxes_closed = Vec::new();
        for b in self.grid.boxes_adjacent_to(line) {
            let closed = self
                .grid
                .lines_of(b)
                .iter()
                .all(|edge| self.line_owners.contains_key(edge));
            if closed {
                self.box_owners.insert(b, player_id);
                boxes_closed.push(b);
            }
        }

        let sequence = self.turns.len() as u32;
        self.turns.push(Turn {
            sequence,
            player_id,
            line,
        });

        // Bonus turn: closing a box keeps the move with the same player.
        if boxes_closed.is_empty() {
            self.current_player = (self.current_player + 1) % self.players.len();
        }

        let finished = self.box_owners.len() == self.grid.box_count();
        if finished {
            self.phase = Phase::Finished;
        }

        Ok(TurnOutcome {
            boxes_closed,
            finished,
        })
    }

    /// Per-seat box counts, folded from box ownership.
    pub fn scores(&self) -> Vec<u32> {
        let mut scores = vec![0u32; self.players.len()];
        for owner in self.box_owners.values() {
            scores[*owner as usize] += 1;
        }
        scores
    }

    /// Winner or tie, available once the game is finished.
    ///
    /// A sole winner must hold a strictly greater score than every other
    /// player; equal top scores among two or more players are a tie.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.phase != Phase::Finished {
            return None;
        }

        let scores = self.scores();
        let top = *scores.iter().max()?;
        let leaders: Vec<PlayerId> = scores
            .iter()
            .enumerate()
            .filter(|(_, score)| **score == top)
            .map(|(id, _)| id as PlayerId)
            .collect();

        match leaders.as_slice() {
            [winner] => Some(Outcome::Winner(*winner)),
            _ => Some(Outcome::Tie(leaders)),
        }
    }

    /// Rebuilds a game by folding a turn log from an empty board.
    ///
    /// `started` distinguishes an active session with no moves yet from a
    /// lobby. Replaying any log of accepted moves reproduces identical
    /// ownership and scores on every party that runs it.
    pub fn replay(
        grid: Grid,
        players: Vec<Player>,
        started: bool,
        turns: &[Turn],
    ) -> Result<Game, GameError> {
        let mut game = Game::new(grid);
        game.players = players;
        if started {
            game.phase = Phase::Active;
        }

        for turn in turns {
            game.apply_turn(turn.player_id, turn.line)?;
        }
        Ok(game)
    }
}
