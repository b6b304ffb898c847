//! Puzzle generation: randomized backtracking solution, then masking.

use rand::prelude::*;
use rand::rngs::SmallRng;
use smallvec::SmallVec;

use super::{Difficulty, Grid, Square, SIDE};

/// A freshly dealt puzzle plus the solution it was carved from.
///
/// The solution is never consulted during play; it is exposed for callers
/// that want replays or post-game review.
#[derive(Clone, Debug, PartialEq)]
pub struct Puzzle {
    pub givens: Grid,
    pub solution: Grid,
    pub difficulty: Difficulty,
}

/// Seeded generator, deterministic for a given `(seed, difficulty)` pair.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PuzzleGenerator {
    seed: u64,
}

impl PuzzleGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Deal a puzzle: complete a grid from a random first row, then blank a
    /// difficulty-dependent number of squares.
    ///
    /// The masked puzzle is not re-checked for solution uniqueness.
    pub fn generate(self, difficulty: Difficulty) -> Puzzle {
        let mut rng = SmallRng::seed_from_u64(self.seed);

        let solution = loop {
            if let Some(grid) = generate_solution(&mut rng) {
                break grid;
            }
            // A seeded first row always extends to a full grid.
            log::warn!("solution search dead-ended, redrawing first row");
        };

        let givens = mask(&solution, difficulty.removed_cells(), &mut rng);
        log::debug!(
            "generated {:?} puzzle, {} givens",
            difficulty,
            givens.filled_count()
        );

        Puzzle {
            givens,
            solution,
            difficulty,
        }
    }
}

/// Complete a grid by randomized backtracking: row 0 is seeded with a random
/// permutation of 1-9, remaining squares are searched row-major with the
/// candidate order shuffled per square.
fn generate_solution(rng: &mut SmallRng) -> Option<Grid> {
    let mut grid = Grid::empty();

    let mut first_row: [u8; SIDE] = [1, 2, 3, 4, 5, 6, 7, 8, 9];
    first_row.shuffle(rng);
    for (col, &value) in first_row.iter().enumerate() {
        grid.set((0, col), Square::Filled(value));
    }

    if fill_from(&mut grid, rng) {
        Some(grid)
    } else {
        None
    }
}

fn fill_from(grid: &mut Grid, rng: &mut SmallRng) -> bool {
    let Some(pos) = grid.first_empty() else {
        return true;
    };

    let mut candidates: SmallVec<[u8; SIDE]> = (1..=9u8)
        .filter(|&value| grid.is_candidate(pos, value))
        .collect();
    candidates.shuffle(rng);

    for &value in &candidates {
        grid.set(pos, Square::Filled(value));
        if fill_from(grid, rng) {
            return true;
        }
        grid.set(pos, Square::Empty);
    }

    false
}

/// Blank `removed` squares chosen uniformly without replacement, freezing the
/// rest as givens.
fn mask(solution: &Grid, removed: usize, rng: &mut SmallRng) -> Grid {
    let mut deck: [usize; SIDE * SIDE] = core::array::from_fn(|index| index);
    deck.shuffle(rng);

    let mut givens = Grid::empty();
    for row in 0..SIDE {
        for col in 0..SIDE {
            if let Some(value) = solution[(row, col)].value() {
                givens.set((row, col), Square::Given(value));
            }
        }
    }

    for &index in deck.iter().take(removed) {
        givens.set((index / SIDE, index % SIDE), Square::Empty);
    }

    givens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sudoku::BOX_SIDE;

    /// Every row, column, and box of a solved grid must hold 1-9 exactly once.
    fn assert_solved(grid: &Grid) {
        for row in 0..SIDE {
            let mut seen = [false; SIDE + 1];
            for col in 0..SIDE {
                let value = grid[(row, col)].value().unwrap() as usize;
                assert!(!seen[value], "duplicate {} in row {}", value, row);
                seen[value] = true;
            }
        }

        for col in 0..SIDE {
            let mut seen = [false; SIDE + 1];
            for row in 0..SIDE {
                let value = grid[(row, col)].value().unwrap() as usize;
                assert!(!seen[value], "duplicate {} in column {}", value, col);
                seen[value] = true;
            }
        }

        for box_row in (0..SIDE).step_by(BOX_SIDE) {
            for box_col in (0..SIDE).step_by(BOX_SIDE) {
                let mut seen = [false; SIDE + 1];
                for r in box_row..box_row + BOX_SIDE {
                    for c in box_col..box_col + BOX_SIDE {
                        let value = grid[(r, c)].value().unwrap() as usize;
                        assert!(
                            !seen[value],
                            "duplicate {} in box ({}, {})",
                            value, box_row, box_col
                        );
                        seen[value] = true;
                    }
                }
            }
        }
    }

    #[test]
    fn solutions_satisfy_all_constraints() {
        for seed in 0..8 {
            let puzzle = PuzzleGenerator::new(seed).generate(Difficulty::Medium);
            assert_solved(&puzzle.solution);
        }
    }

    #[test]
    fn given_count_matches_difficulty() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let puzzle = PuzzleGenerator::new(7).generate(difficulty);
            assert_eq!(puzzle.givens.filled_count(), difficulty.given_cells());
        }
    }

    #[test]
    fn givens_agree_with_the_solution() {
        let puzzle = PuzzleGenerator::new(11).generate(Difficulty::Easy);
        for row in 0..SIDE {
            for col in 0..SIDE {
                match puzzle.givens[(row, col)] {
                    Square::Given(value) => {
                        assert_eq!(puzzle.solution[(row, col)].value(), Some(value));
                    }
                    Square::Empty => {}
                    Square::Filled(_) => panic!("masked grid holds a player square"),
                }
            }
        }
    }

    #[test]
    fn same_seed_deals_the_same_puzzle() {
        let first = PuzzleGenerator::new(42).generate(Difficulty::Hard);
        let second = PuzzleGenerator::new(42).generate(Difficulty::Hard);
        assert_eq!(first, second);
    }

    #[test]
    fn different_seeds_vary_the_deal() {
        let first = PuzzleGenerator::new(1).generate(Difficulty::Easy);
        let second = PuzzleGenerator::new(2).generate(Difficulty::Easy);
        assert_ne!(first.solution, second.solution);
    }
}
