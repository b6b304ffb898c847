//! Variable-size Minesweeper with flood-fill reveal.

use alloc::collections::VecDeque;

use hashbrown::HashSet;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{CellCount, GameError, GameStatus, MarkOutcome, NeighborIter, Pos, Result};

pub use generator::{BoardGenerator, RandomBoardGenerator};

mod generator;

/// Player-visible state of one tile. A tile is never both flagged and
/// revealed, and a revealed tile never goes back.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileState {
    Hidden,
    Flagged,
    Revealed,
}

/// One tile: the mine flag and adjacency count are fixed at generation,
/// `state` is the only part that moves during play.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub(crate) mine: bool,
    pub(crate) adjacent: u8,
    pub(crate) state: TileState,
}

impl Tile {
    pub const fn has_mine(self) -> bool {
        self.mine
    }

    /// Mine count among the up-to-8 neighbors; incidental on mine tiles.
    pub const fn adjacent_mines(self) -> u8 {
        self.adjacent
    }

    pub const fn state(self) -> TileState {
        self.state
    }

    pub const fn is_revealed(self) -> bool {
        matches!(self.state, TileState::Revealed)
    }

    pub const fn is_flagged(self) -> bool {
        matches!(self.state, TileState::Flagged)
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            mine: false,
            adjacent: 0,
            state: TileState::Hidden,
        }
    }
}

/// Board shape and mine budget.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difficulty {
    pub size: Pos,
    pub mines: CellCount,
}

impl Difficulty {
    pub fn new(size: Pos, mines: CellCount) -> Result<Self> {
        let (rows, cols) = size;
        if mines == 0 || usize::from(mines) >= rows * cols {
            return Err(GameError::InvalidMineCount);
        }
        Ok(Self { size, mines })
    }

    pub const fn easy() -> Self {
        Self {
            size: (8, 8),
            mines: 10,
        }
    }

    pub const fn medium() -> Self {
        Self {
            size: (10, 10),
            mines: 20,
        }
    }

    pub const fn hard() -> Self {
        Self {
            size: (12, 12),
            mines: 40,
        }
    }

    pub const fn total_cells(&self) -> usize {
        self.size.0 * self.size.1
    }
}

/// Outcome of revealing a tile
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

impl RevealOutcome {
    /// Whether this outcome could have caused an update to the game
    pub const fn has_update(self) -> bool {
        use RevealOutcome::*;
        match self {
            NoChange => false,
            Revealed => true,
            HitMine => true,
            Won => true,
        }
    }
}

/// A game from deal to win or detonation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Minesweeper {
    board: Array2<Tile>,
    mine_count: CellCount,
    revealed_count: CellCount,
    flags_remaining: CellCount,
    status: GameStatus,
    elapsed_secs: u32,
    triggered_mine: Option<Pos>,
}

impl Minesweeper {
    /// Deal a fresh board for `difficulty` using `generator`.
    pub fn new(difficulty: Difficulty, generator: impl BoardGenerator) -> Self {
        Self::from_board(generator.generate(difficulty))
    }

    /// Deterministic board from explicit mine coordinates (replays, tests).
    pub fn from_mine_positions(size: Pos, mine_positions: &[Pos]) -> Result<Self> {
        Ok(Self::from_board(generator::board_from_mines(
            size,
            mine_positions,
        )?))
    }

    fn from_board(board: Array2<Tile>) -> Self {
        let mine_count = board.iter().filter(|tile| tile.mine).count() as CellCount;
        Self {
            board,
            mine_count,
            revealed_count: 0,
            flags_remaining: mine_count,
            status: GameStatus::default(),
            elapsed_secs: 0,
            triggered_mine: None,
        }
    }

    pub fn size(&self) -> Pos {
        self.board.dim()
    }

    pub fn difficulty(&self) -> Difficulty {
        Difficulty {
            size: self.size(),
            mines: self.mine_count,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    pub fn total_mines(&self) -> CellCount {
        self.mine_count
    }

    pub fn flags_remaining(&self) -> CellCount {
        self.flags_remaining
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    /// The mine that ended the game, if it ended by detonation.
    pub fn triggered_mine(&self) -> Option<Pos> {
        self.triggered_mine
    }

    pub fn tile_at(&self, pos: Pos) -> Option<Tile> {
        self.board.get(pos).copied()
    }

    /// Reveal a hidden tile.
    ///
    /// The first reveal of a game starts the clock. Revealing a mine ends the
    /// game and discloses every mine on the board; revealing a zero-adjacency
    /// tile cascades through the connected zero region and its numbered
    /// border. Flagged and already-revealed tiles report `NoChange`.
    pub fn reveal(&mut self, pos: Pos) -> Result<RevealOutcome> {
        let pos = self.validate_pos(pos)?;
        self.check_not_finished()?;

        if self.board[pos].state != TileState::Hidden {
            return Ok(RevealOutcome::NoChange);
        }

        self.mark_started();

        if self.board[pos].mine {
            self.triggered_mine = Some(pos);
            self.disclose_mines();
            self.status = GameStatus::Lost;
            log::debug!("mine hit at {:?}", pos);
            return Ok(RevealOutcome::HitMine);
        }

        self.reveal_tile(pos);
        if self.board[pos].adjacent == 0 {
            self.flood_fill(pos);
        }

        if usize::from(self.revealed_count) == self.safe_cell_count() {
            self.status = GameStatus::Won;
            log::debug!("all safe tiles revealed after {}s", self.elapsed_secs);
            Ok(RevealOutcome::Won)
        } else {
            Ok(RevealOutcome::Revealed)
        }
    }

    /// Toggle a flag on a hidden tile. Flagging draws from the flag budget
    /// (one per mine) and is rejected once the budget is spent; unflagging
    /// refunds it. Revealed tiles report `NoChange`.
    pub fn toggle_flag(&mut self, pos: Pos) -> Result<MarkOutcome> {
        let pos = self.validate_pos(pos)?;
        self.check_not_finished()?;

        Ok(match self.board[pos].state {
            TileState::Hidden => {
                if self.flags_remaining == 0 {
                    log::debug!("no flags left for {:?}", pos);
                    MarkOutcome::NoChange
                } else {
                    self.board[pos].state = TileState::Flagged;
                    self.flags_remaining -= 1;
                    MarkOutcome::Changed
                }
            }
            TileState::Flagged => {
                self.board[pos].state = TileState::Hidden;
                self.flags_remaining += 1;
                MarkOutcome::Changed
            }
            TileState::Revealed => MarkOutcome::NoChange,
        })
    }

    /// Advance the clock by one second; the caller drives this on a 1 Hz
    /// cadence while the game is active.
    pub fn tick(&mut self) {
        if matches!(self.status, GameStatus::Active) {
            self.elapsed_secs += 1;
        }
    }

    /// Queue-based flood fill from a zero-adjacency tile: opens the connected
    /// zero region and its numbered border, leaving flagged tiles alone.
    fn flood_fill(&mut self, origin: Pos) {
        let mut visited: HashSet<Pos> = HashSet::new();
        visited.insert(origin);
        let mut to_visit: VecDeque<Pos> = self
            .neighbors(origin)
            .filter(|&pos| self.board[pos].state == TileState::Hidden)
            .collect();
        log::trace!("flood fill from {:?}", origin);

        while let Some(pos) = to_visit.pop_front() {
            if !visited.insert(pos) {
                continue;
            }
            if self.board[pos].state != TileState::Hidden {
                continue;
            }

            self.reveal_tile(pos);

            if self.board[pos].adjacent == 0 {
                to_visit.extend(
                    self.neighbors(pos)
                        .filter(|&next| self.board[next].state == TileState::Hidden)
                        .filter(|next| !visited.contains(next)),
                );
            }
        }
    }

    fn reveal_tile(&mut self, pos: Pos) {
        self.board[pos].state = TileState::Revealed;
        self.revealed_count += 1;
        log::trace!("revealed {:?}, adjacent mines: {}", pos, self.board[pos].adjacent);
    }

    /// One-way disclosure of every mine for the post-loss board; flags stay
    /// where the player put them.
    fn disclose_mines(&mut self) {
        for tile in self.board.iter_mut() {
            if tile.mine && tile.state == TileState::Hidden {
                tile.state = TileState::Revealed;
            }
        }
    }

    fn neighbors(&self, pos: Pos) -> NeighborIter {
        NeighborIter::new(pos, self.size())
    }

    fn safe_cell_count(&self) -> usize {
        self.board.len() - usize::from(self.mine_count)
    }

    fn mark_started(&mut self) {
        if self.status.is_ready() {
            self.status = GameStatus::Active;
        }
    }

    fn validate_pos(&self, pos: Pos) -> Result<Pos> {
        let (rows, cols) = self.size();
        if pos.0 < rows && pos.1 < cols {
            Ok(pos)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    fn check_not_finished(&self) -> Result<()> {
        if self.status.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }
}
