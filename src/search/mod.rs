//! Move selection strategies behind a common [`Bot`] interface.

use std::time::Duration;

use crate::{board::Move, game::GameState};

pub mod alpha_beta;
pub mod evaluation;
pub mod monte_carlo;
pub mod tree_search;

pub use alpha_beta::{AlphaBetaBot, AlphaBetaConfig};
pub use monte_carlo::{Budget, MonteCarloBot, MonteCarloConfig};
pub use tree_search::{TreeSearchBot, TreeSearchConfig};

/// An automated player.
///
/// `select_move` is called once per turn with the authoritative state and returns a legal move,
/// or `None` when the game is already over. The caller applies the move.
pub trait Bot {
    /// Human-readable name, constant for the lifetime of the bot.
    fn name(&self) -> &str;

    fn select_move(&mut self, state: &GameState) -> Option<Move>;
}

impl<B: Bot + ?Sized> Bot for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn select_move(&mut self, state: &GameState) -> Option<Move> {
        (**self).select_move(state)
    }
}

/// Counters collected by the alpha-beta search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub cutoffs: u64,
    /// Deepest iteration that ran to completion; 0 if the deadline hit during depth 1.
    pub completed_depth: u32,
    pub elapsed: Duration,
}

/// The first legal move (in generator order) that wins the game for the player to move.
pub fn immediate_win(state: &GameState) -> Option<Move> {
    let mover = state.current_player();
    state
        .legal_moves()
        .iter()
        .copied()
        .find(|mv| state.apply(*mv).winner() == Some(mover))
}

/// Which engine to build, with its configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    AlphaBeta(AlphaBetaConfig),
    MonteCarlo(MonteCarloConfig),
    TreeSearch(TreeSearchConfig),
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::AlphaBeta(AlphaBetaConfig::default())
    }
}

/// One configured strategy behind the [`Bot`] interface.
#[derive(Debug, Clone)]
pub enum Engine {
    AlphaBeta(AlphaBetaBot),
    MonteCarlo(MonteCarloBot),
    TreeSearch(TreeSearchBot),
}

impl Engine {
    pub fn new(strategy: Strategy) -> Self {
        match strategy {
            Strategy::AlphaBeta(config) => Engine::AlphaBeta(AlphaBetaBot::new(config)),
            Strategy::MonteCarlo(config) => Engine::MonteCarlo(MonteCarloBot::new(config)),
            Strategy::TreeSearch(config) => Engine::TreeSearch(TreeSearchBot::new(config)),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Strategy::default())
    }
}

impl From<Strategy> for Engine {
    fn from(strategy: Strategy) -> Self {
        Self::new(strategy)
    }
}

impl Bot for Engine {
    fn name(&self) -> &str {
        match self {
            Engine::AlphaBeta(bot) => bot.name(),
            Engine::MonteCarlo(bot) => bot.name(),
            Engine::TreeSearch(bot) => bot.name(),
        }
    }

    fn select_move(&mut self, state: &GameState) -> Option<Move> {
        match self {
            Engine::AlphaBeta(bot) => bot.select_move(state),
            Engine::MonteCarlo(bot) => bot.select_move(state),
            Engine::TreeSearch(bot) => bot.select_move(state),
        }
    }
}
