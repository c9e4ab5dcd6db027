use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tracing::debug;

use crate::error::GameError;
use crate::game::board::{Board, Letter};
use crate::game::detector::count_new_lines;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub name: String,
    pub score: u32,
}

/// What a successfully applied move changed, for broadcast.
#[derive(Debug, Clone, Copy)]
pub struct MoveOutcome {
    pub sos_count: u32,
    pub finished: bool,
    /// Winning player index once finished; `None` for a tie.
    pub winner: Option<usize>,
}

/// One live match: roster, board, turn pointer and status. All mutations go
/// through the methods below; the registry serializes access per room.
#[derive(Debug, Clone)]
pub struct Match {
    pub room_id: String,
    pub players: Vec<Player>,
    pub board: Board,
    pub current_player: usize,
    pub status: MatchStatus,
    pub last_activity: SystemTime,
}

impl Match {
    pub fn new(room_id: String, user_id: String, name: String, board_size: usize) -> Self {
        Match {
            room_id,
            players: vec![Player {
                user_id,
                name,
                score: 0,
            }],
            board: Board::empty(board_size),
            current_player: 0,
            status: MatchStatus::Waiting,
            last_activity: SystemTime::now(),
        }
    }

    /// Index of the roster entry for `user_id`, if they are in this match.
    pub fn player_index(&self, user_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.user_id == user_id)
    }

    pub fn scores(&self) -> Vec<u32> {
        self.players.iter().map(|p| p.score).collect()
    }

    /// Adds the second player and starts the game. A user already in the
    /// roster re-attaches without any state change (rejoin after recovery).
    pub fn join(&mut self, user_id: String, name: String) -> Result<(), GameError> {
        if self.player_index(&user_id).is_some() {
            debug!("Player {} re-attached to room {}", user_id, self.room_id);
            self.last_activity = SystemTime::now();
            return Ok(());
        }
        if self.status != MatchStatus::Waiting || self.players.len() >= 2 {
            debug!("Join rejected: room {} is full.", self.room_id);
            return Err(GameError::RoomFull);
        }

        self.players.push(Player {
            user_id,
            name,
            score: 0,
        });
        self.status = MatchStatus::Playing;
        self.last_activity = SystemTime::now();
        Ok(())
    }

    pub fn make_move(
        &mut self,
        player_index: usize,
        row: usize,
        col: usize,
        letter: Letter,
    ) -> Result<MoveOutcome, GameError> {
        if self.status == MatchStatus::Finished {
            debug!("Move rejected: match {} is already over.", self.room_id);
            return Err(GameError::GameOver);
        }
        // Before the second join it is nobody's turn.
        if self.status != MatchStatus::Playing || player_index != self.current_player {
            debug!("Move rejected: not player {}'s turn.", player_index);
            return Err(GameError::NotYourTurn);
        }
        if self.board.get(row, col)?.is_some() {
            debug!("Move rejected: cell ({}, {}) already taken.", row, col);
            return Err(GameError::CellOccupied);
        }

        self.board.set(row, col, letter)?;
        let sos_count = count_new_lines(&self.board, row, col, letter);
        self.players[player_index].score += sos_count;

        // A scoring move keeps the turn; otherwise it passes.
        if sos_count == 0 {
            self.current_player = 1 - self.current_player;
            debug!("Turn switched: now player {} moves.", self.current_player);
        } else {
            debug!(
                "Player {} completed {} line(s) and keeps the turn.",
                player_index, sos_count
            );
        }

        let finished = self.board.is_full();
        let winner = if finished {
            self.status = MatchStatus::Finished;
            debug!("Match {} finished, winner: {:?}", self.room_id, self.winner());
            self.winner()
        } else {
            None
        };

        self.last_activity = SystemTime::now();
        Ok(MoveOutcome {
            sos_count,
            finished,
            winner,
        })
    }

    /// Resets the board, scores and turn while keeping room id and roster.
    pub fn new_game(&mut self) {
        let size = self.board.size();
        self.board = Board::empty(size);
        for player in &mut self.players {
            player.score = 0;
        }
        self.current_player = 0;
        self.status = if self.players.len() == 2 {
            MatchStatus::Playing
        } else {
            MatchStatus::Waiting
        };
        self.last_activity = SystemTime::now();
        debug!("Match {} reset for a new game.", self.room_id);
    }

    /// Strictly higher score wins; equal scores are a tie (`None`).
    pub fn winner(&self) -> Option<usize> {
        match (self.players.first(), self.players.get(1)) {
            (Some(a), Some(b)) if a.score > b.score => Some(0),
            (Some(a), Some(b)) if b.score > a.score => Some(1),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_match(board_size: usize) -> Match {
        let mut m = Match::new(
            "ROOM01".into(),
            "alice".into(),
            "Alice".into(),
            board_size,
        );
        m.join("bob".into(), "Bob".into()).unwrap();
        m
    }

    #[test]
    fn second_join_starts_the_game() {
        let mut m = Match::new("ROOM01".into(), "alice".into(), "Alice".into(), 8);
        assert_eq!(m.status, MatchStatus::Waiting);
        m.join("bob".into(), "Bob".into()).unwrap();
        assert_eq!(m.status, MatchStatus::Playing);
        assert_eq!(m.players.len(), 2);
        assert_eq!(m.current_player, 0);
    }

    #[test]
    fn third_join_is_rejected_without_state_change() {
        let mut m = playing_match(8);
        assert!(matches!(
            m.join("carol".into(), "Carol".into()),
            Err(GameError::RoomFull)
        ));
        assert_eq!(m.players.len(), 2);
        assert_eq!(m.status, MatchStatus::Playing);
    }

    #[test]
    fn roster_member_can_reattach() {
        let mut m = playing_match(8);
        m.join("alice".into(), "Alice".into()).unwrap();
        assert_eq!(m.players.len(), 2);
    }

    #[test]
    fn move_before_second_join_is_rejected() {
        let mut m = Match::new("ROOM01".into(), "alice".into(), "Alice".into(), 8);
        assert!(matches!(
            m.make_move(0, 0, 0, Letter::S),
            Err(GameError::NotYourTurn)
        ));
        assert_eq!(m.board.get(0, 0).unwrap(), None);
    }

    #[test]
    fn scoring_move_grants_an_extra_turn() {
        // S(0,0) by p0, S(0,2) by p1, then O(0,1) by p0 completes a line.
        let mut m = playing_match(8);
        let out = m.make_move(0, 0, 0, Letter::S).unwrap();
        assert_eq!(out.sos_count, 0);
        assert_eq!(m.current_player, 1);

        let out = m.make_move(1, 0, 2, Letter::S).unwrap();
        assert_eq!(out.sos_count, 0);
        assert_eq!(m.current_player, 0);

        let out = m.make_move(0, 0, 1, Letter::O).unwrap();
        assert_eq!(out.sos_count, 1);
        assert_eq!(m.players[0].score, 1);
        assert_eq!(m.current_player, 0, "scoring player moves again");
    }

    #[test]
    fn wrong_player_never_mutates_the_board() {
        let mut m = playing_match(8);
        assert!(matches!(
            m.make_move(1, 0, 0, Letter::S),
            Err(GameError::NotYourTurn)
        ));
        assert_eq!(m.board.get(0, 0).unwrap(), None);
        assert_eq!(m.current_player, 0);
    }

    #[test]
    fn occupied_cell_never_mutates_the_board() {
        let mut m = playing_match(8);
        m.make_move(0, 0, 0, Letter::S).unwrap();
        assert!(matches!(
            m.make_move(1, 0, 0, Letter::O),
            Err(GameError::CellOccupied)
        ));
        assert_eq!(m.board.get(0, 0).unwrap(), Some(Letter::S));
        assert_eq!(m.current_player, 1);
    }

    #[test]
    fn out_of_bounds_move_is_rejected() {
        let mut m = playing_match(3);
        assert!(matches!(
            m.make_move(0, 3, 0, Letter::S),
            Err(GameError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn score_sum_tracks_cumulative_sos_count() {
        let mut m = playing_match(8);
        let mut total = 0;
        // Fill the first two rows left to right, alternating letters.
        for (row, col) in (0..2).flat_map(|r| (0..8).map(move |c| (r, c))) {
            let letter = if col % 2 == 0 { Letter::S } else { Letter::O };
            let mover = m.current_player;
            let out = m.make_move(mover, row, col, letter).unwrap();
            total += out.sos_count;
            assert_eq!(m.scores().iter().sum::<u32>(), total);
        }
        assert!(total > 0);
    }

    #[test]
    fn filling_the_board_finishes_the_match_once() {
        let mut m = playing_match(3);
        let mut finishes = 0;
        for row in 0..3 {
            for col in 0..3 {
                let mover = m.current_player;
                let out = m.make_move(mover, row, col, Letter::S).unwrap();
                if out.finished {
                    finishes += 1;
                }
            }
        }
        assert_eq!(finishes, 1);
        assert_eq!(m.status, MatchStatus::Finished);
        // All 'S', no lines: a tie.
        assert_eq!(m.winner(), None);
        assert!(matches!(
            m.make_move(m.current_player, 0, 0, Letter::O),
            Err(GameError::GameOver)
        ));
    }

    #[test]
    fn last_move_can_both_score_and_finish() {
        let mut m = playing_match(3);
        // p0: S(0,0)  p1: S(0,2)  p0: O(0,1) scores, keeps turn.
        m.make_move(0, 0, 0, Letter::S).unwrap();
        m.make_move(1, 0, 2, Letter::S).unwrap();
        m.make_move(0, 0, 1, Letter::O).unwrap();
        // Fill the middle and bottom rows with 'O's, none of which scores.
        m.make_move(0, 1, 0, Letter::O).unwrap();
        m.make_move(1, 1, 1, Letter::O).unwrap();
        m.make_move(0, 1, 2, Letter::O).unwrap();
        m.make_move(1, 2, 0, Letter::O).unwrap();
        m.make_move(0, 2, 1, Letter::O).unwrap();
        // Last cell: S at (2,2) completes the S(0,2)-O(1,2) column and the
        // S(0,0)-O(1,1) diagonal, scoring twice on the finishing move.
        let mover = m.current_player;
        assert_eq!(mover, 1);
        let out = m.make_move(mover, 2, 2, Letter::S).unwrap();
        assert!(out.finished);
        assert_eq!(out.sos_count, 2);
        assert_eq!(m.status, MatchStatus::Finished);
        assert_eq!(m.scores(), vec![1, 2]);
        assert_eq!(out.winner, Some(1));
        assert_eq!(m.winner(), Some(1));
    }

    #[test]
    fn winner_is_the_strictly_higher_score() {
        let mut m = playing_match(8);
        m.players[0].score = 3;
        m.players[1].score = 1;
        assert_eq!(m.winner(), Some(0));
        m.players[1].score = 5;
        assert_eq!(m.winner(), Some(1));
        m.players[0].score = 5;
        assert_eq!(m.winner(), None);
    }

    #[test]
    fn new_game_clears_board_scores_and_turn() {
        let mut m = playing_match(3);
        for row in 0..3 {
            for col in 0..3 {
                let mover = m.current_player;
                m.make_move(mover, row, col, Letter::S).unwrap();
            }
        }
        m.players[0].score = 2;
        assert_eq!(m.status, MatchStatus::Finished);

        m.new_game();
        assert_eq!(m.status, MatchStatus::Playing);
        assert_eq!(m.current_player, 0);
        assert_eq!(m.scores(), vec![0, 0]);
        assert!(!m.board.is_full());
        assert_eq!(m.board.get(0, 0).unwrap(), None);
    }

    #[test]
    fn new_game_with_one_player_stays_waiting() {
        let mut m = Match::new("ROOM01".into(), "alice".into(), "Alice".into(), 8);
        m.new_game();
        assert_eq!(m.status, MatchStatus::Waiting);
    }
}
