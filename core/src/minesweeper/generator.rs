//! Board generation: uniform mine placement plus adjacency precompute.

use alloc::vec::Vec;

use ndarray::Array2;
use rand::prelude::*;
use rand::rngs::SmallRng;

use super::{Difficulty, Tile};
use crate::{GameError, NeighborIter, Pos, Result};

/// Produces a dealt board: mines placed, adjacency counts filled in, every
/// tile hidden.
pub trait BoardGenerator {
    fn generate(self, difficulty: Difficulty) -> Array2<Tile>;
}

/// Uniform placement over distinct cells, deterministic per seed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RandomBoardGenerator {
    seed: u64,
}

impl RandomBoardGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl BoardGenerator for RandomBoardGenerator {
    fn generate(self, difficulty: Difficulty) -> Array2<Tile> {
        let (rows, cols) = difficulty.size;
        let mut board: Array2<Tile> = Array2::default((rows, cols));

        let mut deck: Vec<usize> = (0..rows * cols).collect();
        let mut rng = SmallRng::seed_from_u64(self.seed);
        deck.shuffle(&mut rng);

        for &index in deck.iter().take(usize::from(difficulty.mines)) {
            board[(index / cols, index % cols)].mine = true;
        }

        fill_adjacency(&mut board);
        log::debug!(
            "generated {}x{} board with {} mines",
            rows,
            cols,
            difficulty.mines
        );
        board
    }
}

/// Deterministic board from explicit mine coordinates.
pub(crate) fn board_from_mines(size: Pos, mine_positions: &[Pos]) -> Result<Array2<Tile>> {
    let (rows, cols) = size;
    let mut board: Array2<Tile> = Array2::default((rows, cols));

    for &(row, col) in mine_positions {
        if row >= rows || col >= cols {
            return Err(GameError::InvalidCoords);
        }
        board[(row, col)].mine = true;
    }

    fill_adjacency(&mut board);
    Ok(board)
}

/// One pass over the Moore neighborhoods; counts never change afterwards.
fn fill_adjacency(board: &mut Array2<Tile>) {
    let size = board.dim();
    for row in 0..size.0 {
        for col in 0..size.1 {
            let count = NeighborIter::new((row, col), size)
                .filter(|&pos| board[pos].mine)
                .count();
            board[(row, col)].adjacent = count as u8;
        }
    }
}
