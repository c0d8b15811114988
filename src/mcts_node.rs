use crate::{
    board::{GameOutcome, Move, Player},
    game::GameState,
};

/// Game-theoretic value of a node once it is known, from the point of view of the player
/// who made the move leading to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Bound {
    #[default]
    None,
    ProvenWin,
    ProvenLoss,
}

/// Represents a single node in the Monte Carlo search tree.
///
/// Statistics are kept from the point of view of `mover`, the player whose move led here,
/// so a parent can compare its children directly.
#[derive(Debug, Clone)]
pub struct MctsNode {
    /// The depth of the node in the tree.
    pub height: u32,
    /// The game state that this node represents.
    pub state: GameState,
    /// The move that led to this node's state from its parent. `None` for the root node.
    pub prev_move: Option<Move>,
    /// The player who made `prev_move`. For the root, the player who moved last.
    pub mover: Player,
    /// The outcome of the game at this node, if it is terminal.
    pub outcome: GameOutcome,
    /// The number of times this node has been visited during the search.
    pub visits: u32,
    /// Simulations through this node won by `mover`.
    pub wins: u32,
    /// The number of times simulations from this node have resulted in a draw.
    pub draws: u32,
    pub bound: Bound,
    /// A flag indicating whether the outcome of this node is definitively known.
    pub is_fully_calculated: bool,
}

impl MctsNode {
    pub fn root(state: GameState) -> Self {
        let mover = state.current_player().other();
        Self::new(state, None, mover, 0)
    }

    /// The node reached by playing `mv` in `parent`.
    pub fn child(parent: &GameState, mv: Move, height: u32) -> Self {
        Self::new(parent.apply(mv), Some(mv), parent.current_player(), height)
    }

    fn new(state: GameState, prev_move: Option<Move>, mover: Player, height: u32) -> Self {
        let outcome = state.outcome();
        Self {
            height,
            state,
            prev_move,
            mover,
            outcome,
            visits: 0,
            wins: 0,
            draws: 0,
            bound: Bound::None,
            is_fully_calculated: false,
        }
    }

    /// Calculates the win rate of this node.
    pub fn wins_rate(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(self.visits)
        }
    }

    /// Calculates the draw rate of this node.
    pub fn draws_rate(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            f64::from(self.draws) / f64::from(self.visits)
        }
    }

    /// Expected result for `mover` with a draw counted as half a win.
    pub fn score(&self) -> f64 {
        self.wins_rate() + self.draws_rate() / 2.0
    }

    /// Records one simulation result.
    pub(crate) fn record(&mut self, outcome: GameOutcome) {
        self.visits += 1;
        match outcome {
            GameOutcome::Won(winner) if winner == self.mover => self.wins += 1,
            GameOutcome::Drawn => self.draws += 1,
            _ => {}
        }
    }
}
