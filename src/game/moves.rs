use std::ops::Deref;

use crate::{
    board::{BLOCK_SIZE, BlockStatus, GRID_SIZE, Move, N_CELLS},
    error::{EngineError, Result},
    game::GameState,
};

/// Fixed-capacity list of moves, filled without touching the heap so rollouts stay cheap.
#[derive(Debug, Clone, Copy)]
pub struct MoveList {
    moves: [Move; N_CELLS],
    len: usize,
}

impl Default for MoveList {
    fn default() -> Self {
        Self {
            moves: [Move::new(0, 0); N_CELLS],
            len: 0,
        }
    }
}

impl MoveList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, mv: Move) {
        debug_assert!(self.len < N_CELLS);
        self.moves[self.len] = mv;
        self.len += 1;
    }
}

impl Deref for MoveList {
    type Target = [Move];

    fn deref(&self) -> &Self::Target {
        &self.moves[..self.len]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl GameState {
    /// All legal moves in row-major order (left to right, top to bottom).
    ///
    /// Empty iff the game is over.
    pub fn legal_moves(&self) -> MoveList {
        let mut list = MoveList::new();
        if self.winner().is_some() {
            return list;
        }

        match self.active_block() {
            Some(block) => {
                for local_row in 0..BLOCK_SIZE {
                    for local_col in 0..BLOCK_SIZE {
                        let mv = Move::from_block(block, (local_row, local_col));
                        if self.cell(mv).is_none() {
                            list.push(mv);
                        }
                    }
                }
            }
            None => {
                for row in 0..GRID_SIZE {
                    for col in 0..GRID_SIZE {
                        let mv = Move::new(row, col);
                        if self.cell(mv).is_none()
                            && self.block_status(mv.block()) == BlockStatus::InPlay
                        {
                            list.push(mv);
                        }
                    }
                }
            }
        }

        list
    }

    /// Whether the player to move has anything to play, i.e. the game is not over.
    pub fn has_legal_moves(&self) -> bool {
        !self.legal_moves().is_empty()
    }

    /// Checks `mv` against the move-validity rule, naming the broken rule on failure.
    pub fn check_move(&self, mv: Move) -> Result<()> {
        if !mv.is_in_bounds() {
            return Err(EngineError::OutOfBounds {
                row: mv.row,
                col: mv.col,
            });
        }
        if self.winner().is_some() {
            return Err(EngineError::GameOver);
        }
        if self.cell(mv).is_some() {
            return Err(EngineError::CellOccupied {
                row: mv.row,
                col: mv.col,
            });
        }
        let (block_row, block_col) = mv.block();
        if self.block_status(mv.block()) != BlockStatus::InPlay {
            return Err(EngineError::BlockClosed {
                block_row,
                block_col,
            });
        }
        if let Some((active_row, active_col)) = self.active_block() {
            if (active_row, active_col) != mv.block() {
                return Err(EngineError::WrongBlock {
                    row: mv.row,
                    col: mv.col,
                    active_row,
                    active_col,
                });
            }
        }
        Ok(())
    }
}
