//! A search and evaluation engine for Ultimate Tic-Tac-Toe bots.
//!
//! The game is played on a 9x9 grid split into nine 3x3 blocks. Winning a block claims the
//! matching cell of the 3x3 macroboard, and three claimed cells in a line win the game. The
//! position of a move inside its block decides which block the opponent plays in next.
//!
//! The crate provides an immutable [`GameState`] with move generation and win detection, and
//! three interchangeable engines behind the [`Bot`] trait: depth-limited alpha-beta, flat
//! Monte-Carlo rollouts compared by UCB1, and a tree-structured Monte Carlo Tree Search.
//!
//! # Example
//!
//! ```rust
//! use uttt_engine::{Bot, Engine, GameState, Strategy};
//! use uttt_engine::search::{AlphaBetaConfig, MonteCarloConfig};
//!
//! let mut x = Engine::new(Strategy::AlphaBeta(AlphaBetaConfig::default().with_depth(2)));
//! let mut o = Engine::new(Strategy::MonteCarlo(MonteCarloConfig::for_testing()));
//!
//! let mut state = GameState::new();
//! for _ in 0..4 {
//!     let bot = if state.move_count() % 2 == 0 { &mut x } else { &mut o };
//!     let mv = bot.select_move(&state).expect("the game is not over yet");
//!     state = state.play(mv).expect("bots only return legal moves");
//! }
//!
//! println!("{state}");
//! ```

/// Players, moves, block statuses and game outcomes.
pub mod board;
/// The error type returned when a state or move breaks the rules.
pub mod error;
/// The `GameState` value type with move generation and win detection.
pub mod game;
/// The core of the tree search, containing the `MonteCarloTreeSearch` implementation.
pub mod mcts;
/// Contains the `MctsNode` struct, which represents a node in the search tree.
pub mod mcts_node;
/// Contains traits and implementations for random number generation.
pub mod random;
/// Move selection strategies and the `Bot` interface.
pub mod search;

pub use board::{BlockStatus, Cell, GameOutcome, Move, Player};
pub use error::{EngineError, Result};
pub use game::GameState;
pub use search::{Bot, Engine, Strategy};
