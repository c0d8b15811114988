//! The game state of an Ultimate Tic-Tac-Toe match and its rules.

use std::fmt;

use crate::{
    board::{BLOCK_SIZE, BlockStatus, Cell, GRID_SIZE, GameOutcome, Move, Player},
    error::{EngineError, Result},
};

/// The win detector, shared by blocks and the macroboard.
pub mod lines;
/// The move generator.
pub mod moves;

pub use moves::MoveList;

/// A complete game state: the 9x9 grid, the status of every block and the move counter.
///
/// The player to move is derived from the parity of the move counter. States are values:
/// [`GameState::play`] returns a successor and never touches `self`, and cloning copies every
/// field, so no two states ever share storage. Every public constructor checks the rules, so a
/// `GameState` outside this crate always satisfies them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameState {
    cells: [[Cell; GRID_SIZE as usize]; GRID_SIZE as usize],
    blocks: [[BlockStatus; BLOCK_SIZE as usize]; BLOCK_SIZE as usize],
    move_count: u32,
    last_move: Option<Move>,
    winner: Option<Player>,
}

impl Default for GameState {
    /// The empty board with `X` to move.
    fn default() -> Self {
        Self {
            cells: [[None; GRID_SIZE as usize]; GRID_SIZE as usize],
            blocks: [[BlockStatus::InPlay; BLOCK_SIZE as usize]; BLOCK_SIZE as usize],
            move_count: 0,
            last_move: None,
            winner: None,
        }
    }
}

impl GameState {
    /// The empty board with `X` to move.
    pub fn new() -> Self {
        Self::default()
    }

    /// Imports a state owned by someone else, e.g. a match orchestrator, checking every invariant.
    ///
    /// `Unavailable` entries of `macroboard` are read as `InPlay`.
    pub fn from_parts(
        cells: [[Cell; 9]; 9],
        macroboard: [[BlockStatus; 3]; 3],
        move_count: u32,
        last_move: Option<Move>,
    ) -> Result<Self> {
        let (mut x_count, mut o_count) = (0u32, 0u32);
        for cell in cells.iter().flatten() {
            match cell {
                Some(Player::X) => x_count += 1,
                Some(Player::O) => o_count += 1,
                None => {}
            }
        }
        if x_count + o_count != move_count {
            return Err(EngineError::invalid_state(format!(
                "move counter is {move_count} but {} cells are occupied",
                x_count + o_count
            )));
        }
        if x_count != o_count && x_count != o_count + 1 {
            return Err(EngineError::invalid_state(format!(
                "X has {x_count} marks and O has {o_count}"
            )));
        }

        let mut state = Self {
            cells,
            move_count,
            last_move,
            ..Self::default()
        };

        for block_row in 0..BLOCK_SIZE {
            for block_col in 0..BLOCK_SIZE {
                let block = (block_row, block_col);
                let derived = derive_block_status(&state.block_cells(block)).ok_or_else(|| {
                    EngineError::invalid_state(format!(
                        "block ({block_row}, {block_col}) is won by both players"
                    ))
                })?;
                let claimed = match macroboard[block_row as usize][block_col as usize] {
                    BlockStatus::Unavailable => BlockStatus::InPlay,
                    status => status,
                };
                if claimed != derived {
                    return Err(EngineError::invalid_state(format!(
                        "block ({block_row}, {block_col}) is reported as {claimed:?} but its cells say {derived:?}"
                    )));
                }
                state.blocks[block_row as usize][block_col as usize] = derived;
            }
        }

        let last_mover = match (move_count, last_move) {
            (0, None) => None,
            (0, Some(mv)) => {
                return Err(EngineError::invalid_state(format!(
                    "last move {mv} given for an empty board"
                )));
            }
            (_, None) => {
                return Err(EngineError::invalid_state(
                    "the last move is required once moves have been played",
                ));
            }
            (_, Some(mv)) => {
                let mover = Player::to_move_after(move_count - 1);
                if !mv.is_in_bounds() || state.cell(mv) != Some(mover) {
                    return Err(EngineError::invalid_state(format!(
                        "last move {mv} is not a mark of {mover}"
                    )));
                }
                if let BlockStatus::WonBy(owner) = state.block_status(mv.block()) {
                    let mut before = state.block_cells(mv.block());
                    before[lines::local_index(mv.local())] = None;
                    if owner != mover || lines::block_winner(&before, mover) {
                        return Err(EngineError::invalid_state(format!(
                            "last move {mv} was played into a block already won by {owner}"
                        )));
                    }
                }
                Some(mover)
            }
        };

        let macro_cells = lines::macro_cells(&state.blocks);
        state.winner = match (
            lines::block_winner(&macro_cells, Player::X),
            lines::block_winner(&macro_cells, Player::O),
        ) {
            (true, true) => {
                return Err(EngineError::invalid_state(
                    "the macroboard is won by both players",
                ));
            }
            (true, false) => Some(Player::X),
            (false, true) => Some(Player::O),
            (false, false) => None,
        };
        if let (Some(winner), Some(mv)) = (state.winner, last_move) {
            // the match must have been decided by the block the last move closed
            let mut before = state.blocks;
            let (block_row, block_col) = mv.block();
            before[block_row as usize][block_col as usize] = BlockStatus::InPlay;
            let decided_earlier = lines::block_winner(&lines::macro_cells(&before), winner);
            if Some(winner) != last_mover || decided_earlier {
                return Err(EngineError::invalid_state(format!(
                    "{winner} already won the match before the last move"
                )));
            }
        }

        Ok(state)
    }

    /// Parses nine rows of `X`, `O` and `.` (spaces and `|` are ignored) and imports the result.
    pub fn from_rows(rows: [&str; 9], last_move: Option<Move>) -> Result<Self> {
        let mut cells = [[None; 9]; 9];
        let mut move_count = 0;
        for (row_idx, row) in rows.iter().enumerate() {
            let marks: Vec<char> = row.chars().filter(|c| !matches!(c, ' ' | '|')).collect();
            if marks.len() != GRID_SIZE as usize {
                return Err(EngineError::InvalidRowLength {
                    row: row_idx,
                    got: marks.len(),
                });
            }
            for (col_idx, mark) in marks.into_iter().enumerate() {
                cells[row_idx][col_idx] = match mark {
                    'X' | 'x' => Some(Player::X),
                    'O' | 'o' => Some(Player::O),
                    '.' | '-' => None,
                    character => {
                        return Err(EngineError::InvalidCellCharacter {
                            character,
                            row: row_idx,
                        });
                    }
                };
                if cells[row_idx][col_idx].is_some() {
                    move_count += 1;
                }
            }
        }

        let mut macroboard = [[BlockStatus::InPlay; 3]; 3];
        for block_row in 0..BLOCK_SIZE {
            for block_col in 0..BLOCK_SIZE {
                let block_cells = extract_block(&cells, (block_row, block_col));
                // both-players-won is reported by from_parts
                if let Some(status) = derive_block_status(&block_cells) {
                    macroboard[block_row as usize][block_col as usize] = status;
                }
            }
        }

        Self::from_parts(cells, macroboard, move_count, last_move)
    }

    /// The mark at `mv`. Panics when `mv` is off the grid.
    pub fn cell(&self, mv: Move) -> Cell {
        self.cells[mv.row as usize][mv.col as usize]
    }

    pub fn cells(&self) -> &[[Cell; 9]; 9] {
        &self.cells
    }

    /// The 9 cells of a block in row-major order.
    pub fn block_cells(&self, block: (u8, u8)) -> [Cell; 9] {
        extract_block(&self.cells, block)
    }

    /// The stored status of a block; never [`BlockStatus::Unavailable`].
    pub fn block_status(&self, (block_row, block_col): (u8, u8)) -> BlockStatus {
        self.blocks[block_row as usize][block_col as usize]
    }

    pub fn blocks(&self) -> &[[BlockStatus; 3]; 3] {
        &self.blocks
    }

    /// The macroboard as seen by the player to move: open blocks they may not play in this
    /// turn are reported as [`BlockStatus::Unavailable`].
    pub fn macroboard(&self) -> [[BlockStatus; 3]; 3] {
        let active = self.active_block();
        let mut view = self.blocks;
        for (block_row, row) in view.iter_mut().enumerate() {
            for (block_col, status) in row.iter_mut().enumerate() {
                let block = (block_row as u8, block_col as u8);
                let blocked = self.winner.is_some() || active.is_some_and(|a| a != block);
                if *status == BlockStatus::InPlay && blocked {
                    *status = BlockStatus::Unavailable;
                }
            }
        }
        view
    }

    /// Number of marks on the grid.
    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    /// Derived from the parity of the move counter.
    pub fn current_player(&self) -> Player {
        Player::to_move_after(self.move_count)
    }

    /// The player who completed a line on the macroboard, if any.
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// The block the player to move is confined to, or `None` when any open block may be used.
    pub fn active_block(&self) -> Option<(u8, u8)> {
        let target = self.last_move?.local();
        (self.block_status(target) == BlockStatus::InPlay).then_some(target)
    }

    pub fn outcome(&self) -> GameOutcome {
        if let Some(winner) = self.winner {
            return GameOutcome::Won(winner);
        }
        // an open block always has an empty cell, full blocks are closed on the spot
        let any_open = self
            .blocks
            .iter()
            .flatten()
            .any(|status| *status == BlockStatus::InPlay);
        if any_open {
            GameOutcome::InProgress
        } else {
            GameOutcome::Drawn
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome().is_over()
    }

    /// Returns the state after the player to move plays `mv`.
    ///
    /// The move must be legal; this is only checked in debug builds. Searches call it with
    /// moves taken from [`GameState::legal_moves`].
    #[must_use]
    pub(crate) fn apply(&self, mv: Move) -> GameState {
        debug_assert_eq!(self.check_move(mv), Ok(()), "illegal move {mv}");
        let player = self.current_player();
        let block = mv.block();

        let mut next = self.clone();
        next.cells[mv.row as usize][mv.col as usize] = Some(player);
        next.move_count += 1;
        next.last_move = Some(mv);

        let block_cells = next.block_cells(block);
        if lines::completes_line(&block_cells, lines::local_index(mv.local()), player) {
            next.blocks[block.0 as usize][block.1 as usize] = BlockStatus::WonBy(player);
            let macro_cells = lines::macro_cells(&next.blocks);
            if lines::completes_line(&macro_cells, lines::local_index(block), player) {
                next.winner = Some(player);
            }
        } else if block_cells.iter().all(Option::is_some) {
            next.blocks[block.0 as usize][block.1 as usize] = BlockStatus::Drawn;
        }

        next
    }

    /// Returns the state after the player to move plays `mv`, or the rule `mv` breaks.
    pub fn play(&self, mv: Move) -> Result<GameState> {
        self.check_move(mv)?;
        Ok(self.apply(mv))
    }
}

fn extract_block(cells: &[[Cell; 9]; 9], (block_row, block_col): (u8, u8)) -> [Cell; 9] {
    let mut block = [None; 9];
    for local_row in 0..BLOCK_SIZE {
        for local_col in 0..BLOCK_SIZE {
            let mv = Move::from_block((block_row, block_col), (local_row, local_col));
            block[lines::local_index((local_row, local_col))] =
                cells[mv.row as usize][mv.col as usize];
        }
    }
    block
}

/// Status implied by a block's cells, `None` when both players own a line.
fn derive_block_status(cells: &[Cell; 9]) -> Option<BlockStatus> {
    match (
        lines::block_winner(cells, Player::X),
        lines::block_winner(cells, Player::O),
    ) {
        (true, true) => None,
        (true, false) => Some(BlockStatus::WonBy(Player::X)),
        (false, true) => Some(BlockStatus::WonBy(Player::O)),
        (false, false) if cells.iter().all(Option::is_some) => Some(BlockStatus::Drawn),
        (false, false) => Some(BlockStatus::InPlay),
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row_idx, row) in self.cells.iter().enumerate() {
            if row_idx != 0 && row_idx % BLOCK_SIZE as usize == 0 {
                writeln!(f, "------+-------+------")?;
            }
            for (col_idx, cell) in row.iter().enumerate() {
                if col_idx != 0 && col_idx % BLOCK_SIZE as usize == 0 {
                    write!(f, "| ")?;
                }
                let mark = cell.map_or('.', Player::symbol);
                write!(f, "{mark}")?;
                if col_idx + 1 != GRID_SIZE as usize {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
