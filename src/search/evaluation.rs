//! Static evaluation of a game state for the alpha-beta engine.

use crate::{
    board::{BlockStatus, N_CELLS, Player},
    game::GameState,
};

pub type Score = i32;

/// Magnitude of a decided macroboard; larger than any heuristic score can get.
pub const WIN_SCORE: Score = 10_000;

pub const CENTER_WEIGHT: Score = 3;
pub const CORNER_WEIGHT: Score = 2;
pub const EDGE_WEIGHT: Score = 1;

/// A won block is worth this many marks in an open block of the same position.
pub const WON_BLOCK_MULTIPLIER: Score = 10;

/// Positional weight of a block on the macroboard (or of a cell inside a block).
pub const fn block_weight((row, col): (u8, u8)) -> Score {
    match (row, col) {
        (1, 1) => CENTER_WEIGHT,
        (1, _) | (_, 1) => EDGE_WEIGHT,
        _ => CORNER_WEIGHT,
    }
}

/// Scores `state` from the point of view of `perspective`.
///
/// A decided macroboard scores `±(WIN_SCORE + depth_left)`, so wins found closer to the root
/// outrank later ones. Otherwise every won block credits its owner with its weight times
/// [`WON_BLOCK_MULTIPLIER`], and every mark inside a still open block credits its owner with
/// that block's weight. The result is the net of `perspective` minus the opponent.
pub fn evaluate(state: &GameState, perspective: Player, depth_left: u32) -> Score {
    if let Some(winner) = state.winner() {
        // a game has at most N_CELLS plies, so the cast cannot truncate
        let magnitude = WIN_SCORE + depth_left.min(N_CELLS as u32) as Score;
        return if winner == perspective {
            magnitude
        } else {
            -magnitude
        };
    }

    let sign = |player: Player| if player == perspective { 1 } else { -1 };
    let mut score = 0;
    for (block_row, row) in state.blocks().iter().enumerate() {
        for (block_col, status) in row.iter().enumerate() {
            let block = (block_row as u8, block_col as u8);
            let weight = block_weight(block);
            match status {
                BlockStatus::WonBy(owner) => score += sign(*owner) * weight * WON_BLOCK_MULTIPLIER,
                BlockStatus::InPlay => {
                    score += state
                        .block_cells(block)
                        .iter()
                        .flatten()
                        .map(|mark| sign(*mark) * weight)
                        .sum::<Score>();
                }
                BlockStatus::Drawn | BlockStatus::Unavailable => {}
            }
        }
    }
    score
}
