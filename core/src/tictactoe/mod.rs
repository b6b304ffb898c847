//! 3x3 Tic-Tac-Toe with an optional perfect computer opponent.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{GameError, Result};

pub use ai::best_move;

mod ai;

/// One square of the 3x3 board, indexed 0..9 row-major.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    X,
    O,
}

impl Default for Cell {
    fn default() -> Self {
        Self::Empty
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Player {
    X,
    O,
}

impl Player {
    pub const fn opponent(self) -> Player {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }

    pub const fn to_cell(self) -> Cell {
        match self {
            Self::X => Cell::X,
            Self::O => Cell::O,
        }
    }
}

/// Who drives the second seat.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// The caller plays X, the engine answers as O.
    SinglePlayer,
    /// Both seats are driven by the caller.
    TwoPlayer,
}

/// How a decided game ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Winner(Player),
    Draw,
}

/// Outcome of a `play` call, describing the position after any engine reply.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PlayOutcome {
    NoChange,
    Advanced,
    Won(Player),
    Draw,
}

impl PlayOutcome {
    /// Whether this outcome could have caused an update to the game
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Advanced => true,
            Self::Won(_) => true,
            Self::Draw => true,
        }
    }
}

/// The 8 winning lines: 3 rows, 3 columns, 2 diagonals.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

pub(crate) fn line_winner(cells: &[Cell; 9]) -> Option<(Player, [usize; 3])> {
    for &line in &WINNING_LINES {
        let [a, b, c] = line;
        if cells[a] != Cell::Empty && cells[a] == cells[b] && cells[b] == cells[c] {
            let winner = match cells[a] {
                Cell::X => Player::X,
                _ => Player::O,
            };
            return Some((winner, line));
        }
    }
    None
}

pub(crate) fn is_full(cells: &[Cell; 9]) -> bool {
    cells.iter().all(|&cell| cell != Cell::Empty)
}

/// Win/draw tallies for one mode.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub x_wins: u32,
    pub o_wins: u32,
    pub draws: u32,
}

impl Tally {
    fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Winner(Player::X) => self.x_wins += 1,
            Verdict::Winner(Player::O) => self.o_wins += 1,
            Verdict::Draw => self.draws += 1,
        }
    }
}

/// Mode-partitioned tallies. The caller persists this as an opaque snapshot;
/// the engine only defines the in-memory shape.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub single: Tally,
    pub versus: Tally,
}

impl Scoreboard {
    fn tally_mut(&mut self, mode: Mode) -> &mut Tally {
        match mode {
            Mode::SinglePlayer => &mut self.single,
            Mode::TwoPlayer => &mut self.versus,
        }
    }
}

/// A sequence of games under one mode, with a running score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    cells: [Cell; 9],
    to_move: Player,
    result: Option<Verdict>,
    winning_line: Option<[usize; 3]>,
    mode: Mode,
    scores: Scoreboard,
}

impl Match {
    pub fn new(mode: Mode) -> Self {
        Self::with_scores(mode, Scoreboard::default())
    }

    /// Resume with a previously persisted scoreboard.
    pub fn with_scores(mode: Mode, scores: Scoreboard) -> Self {
        Self {
            cells: [Cell::Empty; 9],
            to_move: Player::X,
            result: None,
            winning_line: None,
            mode,
            scores,
        }
    }

    /// Reset the board for another game, keeping the score.
    pub fn new_game(&mut self) {
        self.cells = [Cell::Empty; 9];
        self.to_move = Player::X;
        self.result = None;
        self.winning_line = None;
    }

    pub fn cells(&self) -> &[Cell; 9] {
        &self.cells
    }

    pub fn cell_at(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    pub fn to_move(&self) -> Player {
        self.to_move
    }

    pub fn result(&self) -> Option<Verdict> {
        self.result
    }

    pub fn winning_line(&self) -> Option<[usize; 3]> {
        self.winning_line
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn scores(&self) -> &Scoreboard {
        &self.scores
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    /// Indices still open for play; empty once the game is decided.
    pub fn legal_moves(&self) -> SmallVec<[usize; 9]> {
        if self.is_finished() {
            return SmallVec::new();
        }
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &cell)| cell == Cell::Empty)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn is_legal_move(&self, index: usize) -> bool {
        index < 9
            && !self.is_finished()
            && self.cells[index] == Cell::Empty
            && (self.mode == Mode::TwoPlayer || self.to_move == Player::X)
    }

    /// Place the current player's mark at `index`.
    ///
    /// In single-player mode the engine replies as O before returning, so the
    /// board is back at the caller's turn (or decided). Occupied cells and
    /// out-of-turn calls are no-ops reported as `NoChange`.
    pub fn play(&mut self, index: usize) -> Result<PlayOutcome> {
        if index >= 9 {
            return Err(GameError::InvalidCoords);
        }
        if self.is_finished() {
            return Err(GameError::AlreadyEnded);
        }
        if self.cells[index] != Cell::Empty {
            return Ok(PlayOutcome::NoChange);
        }
        if self.mode == Mode::SinglePlayer && self.to_move != Player::X {
            return Ok(PlayOutcome::NoChange);
        }

        let mut outcome = self.place(index);

        if self.mode == Mode::SinglePlayer && !self.is_finished() {
            if let Some(reply) = ai::best_move(&self.cells) {
                outcome = self.place(reply);
            }
        }

        Ok(outcome)
    }

    fn place(&mut self, index: usize) -> PlayOutcome {
        self.cells[index] = self.to_move.to_cell();
        log::debug!("{:?} plays cell {}", self.to_move, index);
        self.to_move = self.to_move.opponent();
        self.evaluate()
    }

    /// Scan the 8 lines, then the full-board draw, recording the verdict once.
    fn evaluate(&mut self) -> PlayOutcome {
        if let Some((winner, line)) = line_winner(&self.cells) {
            self.winning_line = Some(line);
            self.finish(Verdict::Winner(winner));
            return PlayOutcome::Won(winner);
        }

        if is_full(&self.cells) {
            self.finish(Verdict::Draw);
            return PlayOutcome::Draw;
        }

        PlayOutcome::Advanced
    }

    fn finish(&mut self, verdict: Verdict) {
        self.result = Some(verdict);
        self.scores.tally_mut(self.mode).record(verdict);
        log::debug!("game over: {:?}", verdict);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_completes_top_row_and_wins() {
        let mut game = Match::new(Mode::TwoPlayer);

        // X: 0, 1; O: 3, 4; X to move at 2
        for index in [0, 3, 1, 4] {
            assert_eq!(game.play(index).unwrap(), PlayOutcome::Advanced);
        }
        let outcome = game.play(2).unwrap();

        assert_eq!(outcome, PlayOutcome::Won(Player::X));
        assert_eq!(game.result(), Some(Verdict::Winner(Player::X)));
        assert_eq!(game.winning_line(), Some([0, 1, 2]));
    }

    #[test]
    fn occupied_cell_is_rejected_without_board_change() {
        let mut game = Match::new(Mode::TwoPlayer);
        game.play(4).unwrap();

        let before = *game.cells();
        assert_eq!(game.play(4).unwrap(), PlayOutcome::NoChange);
        assert_eq!(*game.cells(), before);
        assert_eq!(game.to_move(), Player::O);
    }

    #[test]
    fn decided_game_rejects_further_moves() {
        let mut game = Match::new(Mode::TwoPlayer);
        for index in [0, 3, 1, 4, 2] {
            game.play(index).unwrap();
        }

        assert_eq!(game.play(5), Err(GameError::AlreadyEnded));
        assert!(!game.is_legal_move(5));
    }

    #[test]
    fn out_of_range_index_is_a_contract_violation() {
        let mut game = Match::new(Mode::TwoPlayer);
        assert_eq!(game.play(9), Err(GameError::InvalidCoords));
    }

    #[test]
    fn full_board_without_line_is_a_draw() {
        let mut game = Match::new(Mode::TwoPlayer);

        // X X O / O O X / X O X
        let moves = [0, 2, 1, 3, 5, 4, 6, 7, 8];
        let mut last = PlayOutcome::NoChange;
        for index in moves {
            last = game.play(index).unwrap();
        }

        assert_eq!(last, PlayOutcome::Draw);
        assert_eq!(game.result(), Some(Verdict::Draw));
        assert_eq!(game.winning_line(), None);
    }

    #[test]
    fn engine_replies_within_the_same_call() {
        let mut game = Match::new(Mode::SinglePlayer);

        let outcome = game.play(0).unwrap();

        assert_eq!(outcome, PlayOutcome::Advanced);
        assert_eq!(game.to_move(), Player::X);
        let o_marks = game.cells().iter().filter(|&&cell| cell == Cell::O).count();
        assert_eq!(o_marks, 1);
    }

    #[test]
    fn engine_never_loses_as_second_player() {
        fn sweep(game: &Match, decided: &mut u32) {
            for index in 0..9 {
                if !game.is_legal_move(index) {
                    continue;
                }
                let mut next = game.clone();
                match next.play(index).unwrap() {
                    PlayOutcome::Won(player) => {
                        assert_ne!(player, Player::X, "engine lost after move {}", index);
                        *decided += 1;
                    }
                    PlayOutcome::Draw => *decided += 1,
                    PlayOutcome::Advanced => sweep(&next, decided),
                    PlayOutcome::NoChange => unreachable!(),
                }
            }
        }

        let mut decided = 0;
        sweep(&Match::new(Mode::SinglePlayer), &mut decided);
        assert!(decided > 0);
    }

    #[test]
    fn scores_accumulate_per_mode_once_per_game() {
        let mut game = Match::new(Mode::TwoPlayer);
        for index in [0, 3, 1, 4, 2] {
            game.play(index).unwrap();
        }
        assert_eq!(game.scores().versus.x_wins, 1);
        assert_eq!(game.scores().single, Tally::default());

        // A decided game cannot be tallied twice through rejected moves.
        let _ = game.play(5);
        assert_eq!(game.scores().versus.x_wins, 1);

        game.new_game();
        for index in [0, 3, 1, 4, 2] {
            game.play(index).unwrap();
        }
        assert_eq!(game.scores().versus.x_wins, 2);
    }

    #[test]
    fn scoreboard_snapshot_round_trips() {
        let mut game = Match::new(Mode::TwoPlayer);
        for index in [0, 3, 1, 4, 2] {
            game.play(index).unwrap();
        }

        let snapshot = serde_json::to_string(game.scores()).unwrap();
        let restored: Scoreboard = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(&restored, game.scores());

        let resumed = Match::with_scores(Mode::TwoPlayer, restored);
        assert_eq!(resumed.scores().versus.x_wins, 1);
        assert!(!resumed.is_finished());
    }

    #[test]
    fn new_game_clears_the_board_but_not_the_scores() {
        let mut game = Match::new(Mode::TwoPlayer);
        for index in [0, 3, 1, 4, 2] {
            game.play(index).unwrap();
        }

        game.new_game();

        assert_eq!(*game.cells(), [Cell::Empty; 9]);
        assert_eq!(game.to_move(), Player::X);
        assert_eq!(game.result(), None);
        assert_eq!(game.winning_line(), None);
        assert_eq!(game.scores().versus.x_wins, 1);
    }
}
