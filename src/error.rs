//! Error types for the engine.

use thiserror::Error;

/// Errors raised when a move or an imported state breaks the rules of the game.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    #[error("move ({row}, {col}) is outside the 9x9 grid")]
    OutOfBounds { row: u8, col: u8 },

    #[error("cell ({row}, {col}) is already occupied")]
    CellOccupied { row: u8, col: u8 },

    #[error("block ({block_row}, {block_col}) is already closed")]
    BlockClosed { block_row: u8, block_col: u8 },

    #[error("move ({row}, {col}) is outside the active block ({active_row}, {active_col})")]
    WrongBlock {
        row: u8,
        col: u8,
        active_row: u8,
        active_col: u8,
    },

    #[error("game already over")]
    GameOver,

    #[error("invalid game state: {reason}")]
    InvalidState { reason: String },

    #[error("row {row} has {got} cells, expected 9")]
    InvalidRowLength { row: usize, got: usize },

    #[error("invalid character '{character}' in row {row}")]
    InvalidCellCharacter { character: char, row: usize },
}

impl EngineError {
    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        EngineError::InvalidState {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
