use std::fmt;

/// Number of rows (and columns) of the full grid.
pub const GRID_SIZE: u8 = 9;
/// Number of rows (and columns) of a single block and of the macroboard.
pub const BLOCK_SIZE: u8 = 3;
/// Number of cells in the full grid.
pub const N_CELLS: usize = (GRID_SIZE as usize) * (GRID_SIZE as usize);

/// The two players of a match.
///
/// `X` opens the game and moves whenever the move counter is even, `O` moves on odd counters.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum Player {
    X,
    O,
}

impl Player {
    /// Returns the opponent of this player.
    pub const fn other(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// The player who moves when `move_count` moves have been played.
    pub const fn to_move_after(move_count: u32) -> Player {
        if move_count % 2 == 0 {
            Player::X
        } else {
            Player::O
        }
    }

    pub const fn symbol(self) -> char {
        match self {
            Player::X => 'X',
            Player::O => 'O',
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Content of a single cell, `None` when empty.
pub type Cell = Option<Player>;

/// A cell of the 9x9 grid, addressed by row and column.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub struct Move {
    pub row: u8,
    pub col: u8,
}

impl Move {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Builds the move at `local` inside the block at `block`.
    pub const fn from_block(block: (u8, u8), local: (u8, u8)) -> Self {
        Self {
            row: block.0 * BLOCK_SIZE + local.0,
            col: block.1 * BLOCK_SIZE + local.1,
        }
    }

    pub const fn is_in_bounds(&self) -> bool {
        self.row < GRID_SIZE && self.col < GRID_SIZE
    }

    /// Macroboard coordinates of the block containing this cell.
    pub const fn block(&self) -> (u8, u8) {
        (self.row / BLOCK_SIZE, self.col / BLOCK_SIZE)
    }

    /// Coordinates of this cell inside its block.
    ///
    /// These are also the macroboard coordinates of the block the opponent has to answer in.
    pub const fn local(&self) -> (u8, u8) {
        (self.row % BLOCK_SIZE, self.col % BLOCK_SIZE)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Status of one block on the macroboard.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum BlockStatus {
    /// The block is open and may receive moves.
    InPlay,
    /// The block was won by the given player. Never changes afterwards.
    WonBy(Player),
    /// Every cell is occupied and nobody completed a line.
    Drawn,
    /// The block is open, but the player to move is sent to another block this turn.
    ///
    /// Only reported by [`crate::game::GameState::macroboard`], never stored.
    Unavailable,
}

impl BlockStatus {
    /// Won or drawn blocks are closed for good.
    pub const fn is_closed(&self) -> bool {
        matches!(self, BlockStatus::WonBy(_) | BlockStatus::Drawn)
    }

    /// The owner of the block as a mark on the macroboard.
    pub const fn owner(&self) -> Cell {
        match self {
            BlockStatus::WonBy(player) => Some(*player),
            _ => None,
        }
    }
}

/// Represents the possible outcomes of a game.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum GameOutcome {
    /// The game is still ongoing.
    InProgress,
    /// The given player completed a line on the macroboard.
    Won(Player),
    /// No legal move is left and nobody won the macroboard.
    Drawn,
}

impl GameOutcome {
    pub const fn is_over(&self) -> bool {
        !matches!(self, GameOutcome::InProgress)
    }

    /// Rollout reward for `player`: `1` for a win, `-1` for a loss, `0` otherwise.
    pub const fn reward_for(&self, player: Player) -> i32 {
        match self {
            GameOutcome::Won(winner) if *winner as u8 == player as u8 => 1,
            GameOutcome::Won(_) => -1,
            _ => 0,
        }
    }
}
