//! Depth-limited minimax with alpha-beta pruning.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::{
    board::{Move, N_CELLS, Player},
    game::GameState,
    search::{
        Bot, SearchStats,
        evaluation::{Score, WIN_SCORE, evaluate},
    },
};

pub const DEFAULT_DEPTH: u32 = 3;
/// No game lasts longer than this many plies, so deeper searches see nothing new.
pub const MAX_DEPTH: u32 = N_CELLS as u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaBetaConfig {
    /// Plies searched below the root, clamped to `1..=MAX_DEPTH`.
    pub depth: u32,
    /// When set, the search deepens iteratively from depth 1 and stops at this wall-clock
    /// limit, keeping the best move of the deepest completed iteration.
    pub time_limit: Option<Duration>,
}

impl Default for AlphaBetaConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            time_limit: None,
        }
    }
}

impl AlphaBetaConfig {
    /// Sets the number of plies searched below the root.
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Switches to iterative deepening that stops after `time_limit`.
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    /// The depth actually searched.
    pub fn effective_depth(&self) -> u32 {
        self.depth.clamp(1, MAX_DEPTH)
    }

    /// Shallow and unbounded in time, for fast deterministic tests.
    pub fn for_testing() -> Self {
        Self {
            depth: 2,
            time_limit: None,
        }
    }
}

/// Result of one root search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    pub best_move: Move,
    /// Score of `best_move` from the point of view of the player to move.
    pub score: Score,
    pub stats: SearchStats,
}

/// The search ran into its deadline; partial results are discarded.
#[derive(Debug)]
struct Timeout;

struct Search {
    perspective: Player,
    deadline: Option<Instant>,
    stats: SearchStats,
}

impl Search {
    fn new(perspective: Player, deadline: Option<Instant>) -> Self {
        Self {
            perspective,
            deadline,
            stats: SearchStats::default(),
        }
    }

    fn check_deadline(&self) -> Result<(), Timeout> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Timeout),
            _ => Ok(()),
        }
    }

    fn alpha_beta(
        &mut self,
        state: &GameState,
        depth: u32,
        mut alpha: Score,
        mut beta: Score,
        maximizing: bool,
    ) -> Result<Score, Timeout> {
        self.check_deadline()?;
        self.stats.nodes += 1;

        let moves = state.legal_moves();
        if depth == 0 || moves.is_empty() {
            return Ok(evaluate(state, self.perspective, depth));
        }

        if maximizing {
            let mut value = Score::MIN;
            for mv in &moves {
                let child = state.apply(*mv);
                value = value.max(self.alpha_beta(&child, depth - 1, alpha, beta, false)?);
                alpha = alpha.max(value);
                if beta <= alpha {
                    self.stats.cutoffs += 1;
                    break;
                }
            }
            Ok(value)
        } else {
            let mut value = Score::MAX;
            for mv in &moves {
                let child = state.apply(*mv);
                value = value.min(self.alpha_beta(&child, depth - 1, alpha, beta, true)?);
                beta = beta.min(value);
                if beta <= alpha {
                    self.stats.cutoffs += 1;
                    break;
                }
            }
            Ok(value)
        }
    }

    /// Scores every root move at `depth` with a shared alpha, keeping the first move with the
    /// strictly highest score.
    fn search_root(
        &mut self,
        state: &GameState,
        depth: u32,
    ) -> Result<Option<(Move, Score)>, Timeout> {
        let mut best: Option<(Move, Score)> = None;
        let mut alpha = Score::MIN;
        for mv in &state.legal_moves() {
            let child = state.apply(*mv);
            let score = self.alpha_beta(&child, depth - 1, alpha, Score::MAX, false)?;
            trace!(%mv, score, depth, "scored root move");
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((*mv, score));
                alpha = alpha.max(score);
            }
        }
        Ok(best)
    }
}

/// Plays the move a shallow minimax search considers best for the player to move.
#[derive(Debug, Clone, Default)]
pub struct AlphaBetaBot {
    config: AlphaBetaConfig,
}

impl AlphaBetaBot {
    pub const NAME: &'static str = "Alpha Beta Bot";

    pub fn new(config: AlphaBetaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlphaBetaConfig {
        &self.config
    }

    /// Searches `state` and returns the chosen move with its score, or `None` when the game
    /// is over.
    ///
    /// Without a time limit this is a single search at the configured depth. With one, the
    /// search deepens one ply at a time and an interrupted iteration is thrown away; if not
    /// even depth 1 completes, the first legal move is returned with a static score.
    pub fn search(&self, state: &GameState) -> Option<SearchOutcome> {
        let started = Instant::now();
        let moves = state.legal_moves();
        let first = *moves.first()?;
        let perspective = state.current_player();
        let max_depth = self.config.effective_depth();
        let deadline = self.config.time_limit.map(|limit| started + limit);

        let mut search = Search::new(perspective, deadline);
        let mut best_move = first;
        let mut score = evaluate(&state.apply(first), perspective, 0);
        let first_depth = if deadline.is_some() { 1 } else { max_depth };

        for depth in first_depth..=max_depth {
            match search.search_root(state, depth) {
                Ok(Some((mv, mv_score))) => {
                    best_move = mv;
                    score = mv_score;
                    search.stats.completed_depth = depth;
                    if mv_score >= WIN_SCORE {
                        break;
                    }
                }
                Ok(None) => break,
                Err(Timeout) => {
                    debug!(depth, "search deadline reached");
                    break;
                }
            }
        }

        search.stats.elapsed = started.elapsed();
        Some(SearchOutcome {
            best_move,
            score,
            stats: search.stats,
        })
    }

    /// Exact minimax score of every legal move at the configured depth, in generator order.
    ///
    /// Each move is searched with a full window and no deadline, so the scores are
    /// comparable with each other.
    pub fn score_moves(&self, state: &GameState) -> Vec<(Move, Score)> {
        let depth = self.config.effective_depth();
        let mut search = Search::new(state.current_player(), None);
        state
            .legal_moves()
            .iter()
            .filter_map(|mv| {
                let child = state.apply(*mv);
                search
                    .alpha_beta(&child, depth - 1, Score::MIN, Score::MAX, false)
                    .ok()
                    .map(|score| (*mv, score))
            })
            .collect()
    }
}

impl Bot for AlphaBetaBot {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn select_move(&mut self, state: &GameState) -> Option<Move> {
        let outcome = self.search(state)?;
        debug!(
            bot = Self::NAME,
            player = %state.current_player(),
            best_move = %outcome.best_move,
            score = outcome.score,
            depth = outcome.stats.completed_depth,
            nodes = outcome.stats.nodes,
            cutoffs = outcome.stats.cutoffs,
            elapsed = ?outcome.stats.elapsed,
            "selected move"
        );
        Some(outcome.best_move)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        board::BlockStatus,
        random::{RandomGenerator, SeededRandomGenerator},
    };

    /// Plain minimax without pruning, used as the reference the pruned search must match.
    fn minimax(state: &GameState, perspective: Player, depth: u32, maximizing: bool) -> Score {
        let moves = state.legal_moves();
        if depth == 0 || moves.is_empty() {
            return evaluate(state, perspective, depth);
        }
        let scores = moves
            .iter()
            .map(|mv| minimax(&state.apply(*mv), perspective, depth - 1, !maximizing));
        if maximizing {
            scores.max().unwrap_or(Score::MIN)
        } else {
            scores.min().unwrap_or(Score::MAX)
        }
    }

    fn reference_move(state: &GameState, depth: u32) -> (Move, Score) {
        let perspective = state.current_player();
        let mut best: Option<(Move, Score)> = None;
        for mv in &state.legal_moves() {
            let score = minimax(&state.apply(*mv), perspective, depth - 1, false);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((*mv, score));
            }
        }
        best.unwrap()
    }

    fn random_position(seed: u64, plies: usize) -> GameState {
        let mut rng = SeededRandomGenerator::new(seed);
        let mut state = GameState::new();
        for _ in 0..plies {
            let moves = state.legal_moves();
            match rng.choose(&moves[..]) {
                Some(mv) => state = state.apply(*mv),
                None => break,
            }
        }
        state
    }

    #[test]
    fn matches_plain_minimax() {
        for seed in 0..12 {
            let state = random_position(seed, 10 + seed as usize);
            if state.is_terminal() {
                continue;
            }
            for depth in 1..=3 {
                let bot = AlphaBetaBot::new(AlphaBetaConfig::default().with_depth(depth));
                let outcome = bot.search(&state).unwrap();
                assert_eq!(
                    (outcome.best_move, outcome.score),
                    reference_move(&state, depth),
                    "seed {seed}, depth {depth}"
                );
            }
        }
    }

    /// Empty cells in open blocks; no game can last longer than this from `state`.
    fn open_cells(state: &GameState) -> u32 {
        let mut count = 0;
        for row in 0..9 {
            for col in 0..9 {
                let mv = Move::new(row, col);
                if state.cell(mv).is_none() && state.block_status(mv.block()) == BlockStatus::InPlay
                {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn matches_plain_minimax_to_the_end_of_the_game() {
        let mut compared = 0;
        for seed in 0..100 {
            let mut rng = SeededRandomGenerator::new(seed);
            let mut state = GameState::new();
            while !state.is_terminal() {
                let open = open_cells(&state);
                if (2..=7).contains(&open) {
                    let bot = AlphaBetaBot::new(AlphaBetaConfig::default().with_depth(open));
                    let outcome = bot.search(&state).unwrap();
                    assert_eq!(
                        (outcome.best_move, outcome.score),
                        reference_move(&state, open),
                        "seed {seed}"
                    );
                    // deeper than the game can go shifts win scores, never the choice
                    let unbounded = AlphaBetaConfig::default().with_depth(u32::MAX);
                    let deepest = AlphaBetaBot::new(unbounded).search(&state).unwrap();
                    assert_eq!(deepest.best_move, outcome.best_move, "seed {seed}");
                    assert_eq!(deepest.stats.completed_depth, MAX_DEPTH);
                    compared += 1;
                    break;
                }
                let moves = state.legal_moves();
                let mv = *rng.choose(&moves[..]).unwrap();
                state = state.apply(mv);
            }
        }
        assert!(compared > 0);
    }

    #[test]
    fn score_moves_agrees_with_minimax() {
        let state = random_position(7, 12);
        let bot = AlphaBetaBot::new(AlphaBetaConfig::default().with_depth(2));
        let perspective = state.current_player();
        for (mv, score) in bot.score_moves(&state) {
            assert_eq!(score, minimax(&state.apply(mv), perspective, 1, false));
        }
    }

    #[test]
    fn opening_move_is_in_the_center_block() {
        let mut bot = AlphaBetaBot::default();
        let mv = bot.select_move(&GameState::new()).unwrap();
        assert_eq!(mv.block(), (1, 1));
        assert_eq!(mv, Move::new(3, 4));
    }

    #[test]
    fn every_depth_opens_in_the_center_block() {
        for depth in 1..=3 {
            let bot = AlphaBetaBot::new(AlphaBetaConfig::default().with_depth(depth));
            let outcome = bot.search(&GameState::new()).unwrap();
            assert_eq!(outcome.best_move.block(), (1, 1), "depth {depth}");
        }
    }

    #[test]
    fn completes_a_block_line() {
        let state = GameState::from_rows(
            [
                "O..|...|...",
                "...|...|...",
                "...|...|...",
                "...|XX.|...",
                "...|.O.|...",
                "...|...|...",
                "...|...|...",
                "...|...|...",
                "...|...|...",
            ],
            Some(Move::new(4, 4)),
        )
        .unwrap();
        assert_eq!(state.current_player(), Player::X);
        assert_eq!(state.active_block(), Some((1, 1)));

        let mut bot = AlphaBetaBot::default();
        assert_eq!(bot.select_move(&state), Some(Move::new(3, 5)));
    }

    #[test]
    fn finished_game_has_no_move() {
        let state = GameState::from_rows(
            [
                "XXX|XXX|XXX",
                "OO.|OO.|OO.",
                "...|...|...",
                "...|...|...",
                "...|...|...",
                "...|...|...",
                "O..|...|...",
                "...|...|...",
                "O..|...|...",
            ],
            Some(Move::new(0, 8)),
        )
        .unwrap();
        let mut bot = AlphaBetaBot::default();
        assert_eq!(bot.select_move(&state), None);
        assert!(bot.search(&state).is_none());
    }

    #[test]
    fn expired_deadline_falls_back_to_first_legal_move() {
        let state = GameState::new().apply(Move::new(4, 4));
        let bot = AlphaBetaBot::new(AlphaBetaConfig::default().with_time_limit(Duration::ZERO));
        let outcome = bot.search(&state).unwrap();
        assert_eq!(outcome.best_move, state.legal_moves()[0]);
        assert_eq!(outcome.stats.completed_depth, 0);
    }

    #[test]
    fn generous_deadline_reaches_full_depth() {
        let state = GameState::new().apply(Move::new(4, 4));
        let timed = AlphaBetaBot::new(
            AlphaBetaConfig::default()
                .with_depth(2)
                .with_time_limit(Duration::from_secs(60)),
        );
        let fixed = AlphaBetaBot::new(AlphaBetaConfig::default().with_depth(2));
        let timed = timed.search(&state).unwrap();
        let fixed = fixed.search(&state).unwrap();
        assert_eq!(timed.stats.completed_depth, 2);
        assert_eq!(timed.best_move, fixed.best_move);
        assert_eq!(timed.score, fixed.score);
    }

    #[test]
    fn pruning_visits_fewer_nodes_than_the_full_tree() {
        let bot = AlphaBetaBot::new(AlphaBetaConfig::default().with_depth(3));
        let outcome = bot.search(&GameState::new()).unwrap();
        assert!(outcome.stats.cutoffs > 0);
        // 81 root moves with up to 9 replies and 9 answers each
        assert!(outcome.stats.nodes < 81 * (1 + 9 + 81));
    }

    #[test]
    fn search_does_not_touch_the_input() {
        let state = random_position(3, 9);
        let snapshot = state.clone();
        let mut bot = AlphaBetaBot::new(AlphaBetaConfig::for_testing());
        bot.select_move(&state);
        assert_eq!(state, snapshot);
    }
}
