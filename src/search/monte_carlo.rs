//! Flat Monte-Carlo search: random rollouts per root candidate, compared by UCB1.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::{
    board::{GameOutcome, Move, Player},
    game::GameState,
    random::{RandomGenerator, SeededRandomGenerator},
    search::{Bot, immediate_win},
};

pub const DEFAULT_ROLLOUTS: u32 = 100;
pub const DEFAULT_TIME_PER_CANDIDATE: Duration = Duration::from_millis(1000);
pub const DEFAULT_EXPLORATION: f64 = 1.414;

/// How much work each root candidate gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// A fixed number of rollouts per candidate. Deterministic for a fixed seed.
    Rollouts(u32),
    /// Rollouts are started until this much wall-clock time has passed for the candidate.
    TimePerCandidate(Duration),
}

impl Default for Budget {
    fn default() -> Self {
        Budget::Rollouts(DEFAULT_ROLLOUTS)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloConfig {
    pub budget: Budget,
    pub exploration: f64,
    /// Seed of the generator that hands out per-candidate seeds. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Evaluate candidates on the rayon thread pool.
    pub parallel: bool,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            budget: Budget::default(),
            exploration: DEFAULT_EXPLORATION,
            seed: None,
            parallel: false,
        }
    }
}

impl MonteCarloConfig {
    /// Sets the work done per candidate.
    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
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

    /// Evaluates candidates on the rayon thread pool when `parallel` is set.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Few rollouts and a fixed seed, for fast deterministic tests.
    pub fn for_testing() -> Self {
        Self {
            budget: Budget::Rollouts(20),
            exploration: DEFAULT_EXPLORATION,
            seed: Some(7),
            parallel: false,
        }
    }
}

/// Aggregated rollout results of one root candidate, from the root mover's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateStats {
    pub mv: Move,
    pub reward_sum: i64,
    pub visits: u32,
}

impl CandidateStats {
    /// A candidate without any rollout yet.
    pub fn new(mv: Move) -> Self {
        Self {
            mv,
            reward_sum: 0,
            visits: 0,
        }
    }

    fn record(&mut self, reward: i32) {
        self.reward_sum += i64::from(reward);
        self.visits += 1;
    }

    /// Mean reward in `[-1, 1]`; 0 before the first rollout.
    pub fn mean_reward(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.reward_sum as f64 / f64::from(self.visits)
        }
    }

    /// UCB1 score against `total_visits` rollouts spent at this decision point.
    /// `None` for a candidate that never completed a rollout.
    pub fn ucb(&self, total_visits: u64, exploration: f64) -> Option<f64> {
        if self.visits == 0 {
            return None;
        }
        let visits = f64::from(self.visits);
        Some(self.mean_reward() + exploration * ((total_visits as f64).ln() / visits).sqrt())
    }
}

/// Rollouts completed over all candidates; can exceed `u32::MAX` with a large budget.
fn total_visits(candidates: &[CandidateStats]) -> u64 {
    candidates.iter().map(|stats| u64::from(stats.visits)).sum()
}

/// Plays uniformly random legal moves from `state` until the game is over.
pub fn rollout<R: RandomGenerator>(state: &GameState, rng: &mut R) -> GameOutcome {
    let mut current = state.clone();
    loop {
        let moves = current.legal_moves();
        match rng.choose(&moves[..]) {
            Some(mv) => current = current.apply(*mv),
            None => return current.outcome(),
        }
    }
}

fn evaluate_candidate(
    state: &GameState,
    mv: Move,
    mover: Player,
    budget: Budget,
    seed: u64,
) -> CandidateStats {
    let child = state.apply(mv);
    let mut rng = SeededRandomGenerator::new(seed);
    let mut stats = CandidateStats::new(mv);
    match budget {
        Budget::Rollouts(rollouts) => {
            for _ in 0..rollouts {
                stats.record(rollout(&child, &mut rng).reward_for(mover));
            }
        }
        Budget::TimePerCandidate(slice) => {
            let deadline = Instant::now() + slice;
            while Instant::now() < deadline {
                stats.record(rollout(&child, &mut rng).reward_for(mover));
            }
        }
    }
    stats
}

/// Result of one flat Monte-Carlo decision.
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloOutcome {
    pub best_move: Move,
    /// Per-candidate statistics in generator order. Empty when an immediate win short-circuited
    /// the rollouts.
    pub candidates: Vec<CandidateStats>,
    pub total_rollouts: u64,
    pub elapsed: Duration,
}

/// Estimates every legal move with random rollouts and plays the best by UCB1.
#[derive(Debug, Clone)]
pub struct MonteCarloBot {
    config: MonteCarloConfig,
    seeds: SeededRandomGenerator,
}

impl Default for MonteCarloBot {
    fn default() -> Self {
        Self::new(MonteCarloConfig::default())
    }
}

impl MonteCarloBot {
    pub const NAME: &'static str = "Monte Carlo Bot";

    /// Creates a bot; with a seed in `config` its moves are reproducible.
    pub fn new(config: MonteCarloConfig) -> Self {
        let seeds = SeededRandomGenerator::from_optional_seed(config.seed);
        Self { config, seeds }
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Runs the rollouts for every legal move of `state`, in generator order.
    pub fn evaluate_candidates(&mut self, state: &GameState) -> Vec<CandidateStats> {
        let mover = state.current_player();
        let budget = self.config.budget;
        let candidates: Vec<(Move, u64)> = state
            .legal_moves()
            .iter()
            .map(|mv| (*mv, self.seeds.next_u64()))
            .collect();

        if self.config.parallel {
            candidates
                .par_iter()
                .map(|(mv, seed)| evaluate_candidate(state, *mv, mover, budget, *seed))
                .collect()
        } else {
            candidates
                .iter()
                .map(|(mv, seed)| evaluate_candidate(state, *mv, mover, budget, *seed))
                .collect()
        }
    }

    /// Chooses a move for `state`, or `None` when the game is over.
    ///
    /// A move that wins the game on the spot is returned without any rollouts. When no
    /// candidate completed a rollout within the budget, the first legal move is returned.
    pub fn search(&mut self, state: &GameState) -> Option<MonteCarloOutcome> {
        let started = Instant::now();
        let first = *state.legal_moves().first()?;

        if let Some(winning) = immediate_win(state) {
            return Some(MonteCarloOutcome {
                best_move: winning,
                candidates: Vec::new(),
                total_rollouts: 0,
                elapsed: started.elapsed(),
            });
        }

        let candidates = self.evaluate_candidates(state);
        let total_rollouts = total_visits(&candidates);

        let mut best: Option<(Move, f64)> = None;
        for stats in &candidates {
            let Some(score) = stats.ucb(total_rollouts, self.config.exploration) else {
                continue;
            };
            trace!(
                mv = %stats.mv,
                mean = stats.mean_reward(),
                visits = stats.visits,
                score,
                "scored candidate"
            );
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((stats.mv, score));
            }
        }

        let best_move = match best {
            Some((mv, _)) => mv,
            None => {
                debug!("budget expired before any rollout completed");
                first
            }
        };

        Some(MonteCarloOutcome {
            best_move,
            candidates,
            total_rollouts,
            elapsed: started.elapsed(),
        })
    }
}

impl Bot for MonteCarloBot {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn select_move(&mut self, state: &GameState) -> Option<Move> {
        let outcome = self.search(state)?;
        debug!(
            bot = Self::NAME,
            player = %state.current_player(),
            best_move = %outcome.best_move,
            candidates = outcome.candidates.len(),
            rollouts = outcome.total_rollouts,
            elapsed = ?outcome.elapsed,
            "selected move"
        );
        Some(outcome.best_move)
    }
}
