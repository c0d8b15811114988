//! [`Bot`] wrapper around the tree-structured [`MonteCarloTreeSearch`].

use std::time::{Duration, Instant};

use tracing::debug;

use crate::{
    board::Move,
    game::GameState,
    mcts::{DEFAULT_EXPLORATION, MonteCarloTreeSearch},
    random::{RandomGenerator, SeededRandomGenerator},
    search::{Bot, immediate_win},
};

pub const DEFAULT_ITERATIONS: u32 = 10_000;

/// Settings of the [`TreeSearchBot`].
#[derive(Debug, Clone, PartialEq)]
pub struct TreeSearchConfig {
    /// Upper bound on iterations per move.
    pub iterations: u32,
    /// Stops iterating at this wall-clock limit even if `iterations` is not reached.
    pub time_limit: Option<Duration>,
    /// Weight of the exploration term of UCB1.
    pub exploration: f64,
    /// Seed of the generator that seeds every search. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Propagate proven wins and losses up the tree and stop once the root is solved.
    pub use_proven_bounds: bool,
}

impl Default for TreeSearchConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            time_limit: None,
            exploration: DEFAULT_EXPLORATION,
            seed: None,
            use_proven_bounds: true,
        }
    }
}

impl TreeSearchConfig {
    /// Sets the maximum number of iterations per move.
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Stops each search after `time_limit`.
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    /// Sets the exploration weight of UCB1.
    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    /// Makes the bot reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Turns the propagation of proven wins and losses on or off.
    pub fn with_proven_bounds(mut self, use_proven_bounds: bool) -> Self {
        self.use_proven_bounds = use_proven_bounds;
        self
    }

    /// A small seeded search, for fast deterministic tests.
    pub fn for_testing() -> Self {
        Self {
            iterations: 300,
            time_limit: None,
            exploration: DEFAULT_EXPLORATION,
            seed: Some(7),
            use_proven_bounds: true,
        }
    }
}

/// Builds a fresh search tree for every move.
#[derive(Debug, Clone)]
pub struct TreeSearchBot {
    config: TreeSearchConfig,
    seeds: SeededRandomGenerator,
}

impl Default for TreeSearchBot {
    fn default() -> Self {
        Self::new(TreeSearchConfig::default())
    }
}

impl TreeSearchBot {
    pub const NAME: &'static str = "Monte Carlo Tree Search Bot";

    /// Creates a bot; with a seed in `config` its moves are reproducible.
    pub fn new(config: TreeSearchConfig) -> Self {
        let seeds = SeededRandomGenerator::from_optional_seed(config.seed);
        Self { config, seeds }
    }

    pub fn config(&self) -> &TreeSearchConfig {
        &self.config
    }

    /// Runs the search from `state` and returns it, for inspection of the tree.
    ///
    /// Iterates until the iteration cap, the time limit or a solved root, whichever comes
    /// first. [`Bot::select_move`] picks its move from the returned tree.
    pub fn search(&mut self, state: &GameState) -> MonteCarloTreeSearch {
        let deadline = self.config.time_limit.map(|limit| Instant::now() + limit);
        let mut mcts = MonteCarloTreeSearch::builder(state.clone())
            .with_random_generator(SeededRandomGenerator::new(self.seeds.next_u64()))
            .with_exploration(self.config.exploration)
            .with_proven_bounds(self.config.use_proven_bounds)
            .build();

        let mut iterations = 0;
        while iterations < self.config.iterations && !mcts.is_fully_calculated() {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                debug!(iterations, "search deadline reached");
                break;
            }
            mcts.do_iteration();
            iterations += 1;
        }
        mcts
    }
}

impl Bot for TreeSearchBot {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn select_move(&mut self, state: &GameState) -> Option<Move> {
        let started = Instant::now();
        let first = *state.legal_moves().first()?;
        if let Some(winning) = immediate_win(state) {
            debug!(bot = Self::NAME, best_move = %winning, "playing immediate win");
            return Some(winning);
        }

        let mcts = self.search(state);
        let best_move = mcts.best_move().unwrap_or(first);
        let root = mcts.root().value();
        debug!(
            bot = Self::NAME,
            player = %state.current_player(),
            %best_move,
            visits = root.visits,
            solved = mcts.is_fully_calculated(),
            elapsed = ?started.elapsed(),
            "selected move"
        );
        Some(best_move)
    }
}
