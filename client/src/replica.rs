//! Client-side mirror of the authoritative session state
//!
//! The client never mutates game state on its own. Every snapshot from the
//! server carries the complete turn log, and the mirror rebuilds its local
//! game by replaying that log from an empty board. Whatever state the
//! previous snapshot produced is discarded wholesale, so the client cannot
//! drift from the server even after lost or reordered packets.

use shared::{Game, GameError, LineId, Outcome, Phase, PlayerId, Snapshot};
use thiserror::Error;

/// Why an incoming snapshot was refused instead of replayed. The server
/// never produces these, so any of them means a corrupt or forged
/// datagram; the previous local state stays in place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot names out-of-range line {0:?}")]
    LineOutOfRange(LineId),
    #[error("snapshot has turns but no players")]
    NoPlayers,
    #[error("snapshot replay rejected: {0}")]
    Replay(#[from] GameError),
}

/// Local replica of one session, rebuilt from each snapshot.
pub struct Replica {
    session_id: String,
    player_id: PlayerId,
    game: Option<Game>,
}

impl Replica {
    pub fn new(session_id: String, player_id: PlayerId) -> Self {
        Self {
            session_id,
            player_id,
            game: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    /// Replaces the local state with a replay of the snapshot's turn log.
    ///
    /// The log is validated before it reaches the state machine, whose
    /// grid accessors treat out-of-range coordinates as a programming
    /// error and panic. A refused snapshot changes nothing.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        if !snapshot.turns.is_empty() && snapshot.players.is_empty() {
            return Err(SnapshotError::NoPlayers);
        }
        if let Some(turn) = snapshot
            .turns
            .iter()
            .find(|turn| !snapshot.grid.contains_line(turn.line))
        {
            return Err(SnapshotError::LineOutOfRange(turn.line));
        }

        let game = Game::replay(
            snapshot.grid,
            snapshot.players.clone(),
            snapshot.phase != Phase::Lobby,
            &snapshot.turns,
        )?;
        self.session_id = snapshot.session_id.clone();
        self.game = Some(game);
        Ok(())
    }

    pub fn is_my_turn(&self) -> bool {
        match &self.game {
            Some(game) => game.phase() == Phase::Active && game.current_player() == self.player_id,
            None => false,
        }
    }

    /// The board and a status line, ready for the terminal.
    pub fn render(&self) -> String {
        let Some(game) = &self.game else {
            return format!("Session {}: waiting for first snapshot...\n", self.session_id);
        };

        let mut out = String::new();
        out.push_str(&self.render_board(game));
        out.push('\n');
        out.push_str(&self.status_line(game));
        out.push('\n');
        out
    }

    /// Draws the dot grid. Claimed lines are solid, closed boxes carry the
    /// owning player's seat number.
    fn render_board(&self, game: &Game) -> String {
        let grid = game.grid();
        let mut out = String::new();

        for y in 0..=grid.height() {
            // Dot row with horizontal lines.
            for x in 0..grid.width() {
                out.push('+');
                let owned = game
                    .line_owner(shared::LineId::horizontal(x, y))
                    .is_some();
                out.push_str(if owned { "---" } else { "   " });
            }
            out.push('+');
            out.push('\n');

            if y == grid.height() {
                break;
            }

            // Cell row with vertical lines and box owners.
            for x in 0..grid.width() {
                let owned = game.line_owner(shared::LineId::vertical(x, y)).is_some();
                out.push(if owned { '|' } else { ' ' });

                match game.box_owner(shared::BoxId::new(x, y)) {
                    Some(owner) => out.push_str(&format!(" {} ", owner)),
                    None => out.push_str("   "),
                }
            }
            let owned = game
                .line_owner(shared::LineId::vertical(grid.width(), y))
                .is_some();
            out.push(if owned { '|' } else { ' ' });
            out.push('\n');
        }

        out
    }

    fn status_line(&self, game: &Game) -> String {
        match game.phase() {
            Phase::Lobby => format!(
                "Session {}: {} players in lobby, type 'start' to begin",
                self.session_id,
                game.players().len()
            ),
            Phase::Active => {
                let scores = self.score_line(game);
                let current = &game.players()[game.current_player() as usize];
                if self.is_my_turn() {
                    format!("{} | Your move, {}", scores, current.name)
                } else {
                    format!("{} | Waiting for {}", scores, current.name)
                }
            }
            Phase::Finished => {
                let scores = self.score_line(game);
                match game.outcome() {
                    Some(Outcome::Winner(id)) => {
                        let winner = &game.players()[id as usize];
                        if id == self.player_id {
                            format!("{} | Game over, you win!", scores)
                        } else {
                            format!("{} | Game over, {} wins", scores, winner.name)
                        }
                    }
                    Some(Outcome::Tie(ids)) => {
                        let names: Vec<&str> = ids
                            .iter()
                            .map(|id| game.players()[*id as usize].name.as_str())
                            .collect();
                        format!("{} | Game over, tie between {}", scores, names.join(", "))
                    }
                    None => format!("{} | Game over", scores),
                }
            }
        }
    }

    fn score_line(&self, game: &Game) -> String {
        let scores = game.scores();
        let parts: Vec<String> = game
            .players()
            .iter()
            .zip(scores.iter())
            .map(|(player, score)| format!("{} {}", player.name, score))
            .collect();
        parts.join(" | ")
    }
}
