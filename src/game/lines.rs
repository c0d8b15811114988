use crate::board::{BlockStatus, Cell, Player};

/// The 8 winning lines of a 3x3 grid, as row-major cell indices.
pub const LINES: [[usize; 3]; 8] = [
    // rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// For every cell, the indices into [`LINES`] of the lines passing through it.
/// Unused slots are `usize::MAX`; the center is the only cell on 4 lines.
const LINES_THROUGH: [[usize; 4]; 9] = {
    let mut table = [[usize::MAX; 4]; 9];
    let mut cell = 0;
    while cell != 9 {
        let mut n = 0;
        let mut line = 0;
        while line != LINES.len() {
            let [a, b, c] = LINES[line];
            if a == cell || b == cell || c == cell {
                table[cell][n] = line;
                n += 1;
            }
            line += 1;
        }
        cell += 1;
    }
    table
};

fn is_line_of(cells: &[Cell; 9], line: [usize; 3], player: Player) -> bool {
    line.iter().all(|&idx| cells[idx] == Some(player))
}

/// True iff `player` owns all three cells of any line of the 3x3 grid.
pub fn block_winner(cells: &[Cell; 9], player: Player) -> bool {
    LINES.iter().any(|line| is_line_of(cells, *line, player))
}

/// Same as [`block_winner`] but only inspects the lines through `last`, the cell played last.
pub fn completes_line(cells: &[Cell; 9], last: usize, player: Player) -> bool {
    debug_assert!(last < 9);
    LINES_THROUGH[last]
        .iter()
        .take_while(|&&line| line != usize::MAX)
        .any(|&line| is_line_of(cells, LINES[line], player))
}

/// The macroboard as marks: only blocks won by a single player count,
/// open and drawn blocks are empty and block every line through them.
pub fn macro_cells(blocks: &[[BlockStatus; 3]; 3]) -> [Cell; 9] {
    let mut cells = [None; 9];
    for (idx, status) in blocks.iter().flatten().enumerate() {
        cells[idx] = status.owner();
    }
    cells
}

/// Row-major index of a cell inside a 3x3 grid.
pub const fn local_index((row, col): (u8, u8)) -> usize {
    row as usize * 3 + col as usize
}
