#![no_std]

extern crate alloc;

use serde::{Deserialize, Serialize};

pub use error::*;
pub use types::*;

pub mod minesweeper;
pub mod sudoku;
pub mod tictactoe;

mod error;
mod types;

/// Lifecycle of a timed game.
///
/// Valid transitions:
/// - Ready -> Active
/// - Ready -> Won | Lost (a first move can decide the game outright)
/// - Active -> Won
/// - Active -> Lost
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Board dealt, no move made yet
    Ready,
    /// Game started, clock running
    Active,
    /// Game ended and player won
    Won,
    /// Game ended and player lost
    Lost,
}

impl GameStatus {
    /// Indicates the game has not started yet
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Indicates the game has ended and no moves can be made anymore
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        Self::Ready
    }
}

/// Outcome of a reversible board mark (flag toggle, cell clear).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

impl MarkOutcome {
    /// Whether this outcome could have caused an update to the game
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Changed => true,
        }
    }
}
