extern crate uttt_engine;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use uttt_engine::search::{AlphaBetaConfig, MonteCarloConfig, TreeSearchBot, TreeSearchConfig};
use uttt_engine::{Bot, Engine, GameOutcome, GameState, Player, Strategy};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // X searches two plies deep, O samples random games
    let mut x = Engine::new(Strategy::AlphaBeta(AlphaBetaConfig::default().with_depth(2)));
    let mut o = Engine::new(Strategy::MonteCarlo(
        MonteCarloConfig::for_testing().with_parallel(true),
    ));

    let mut state = GameState::new();
    while !state.is_terminal() {
        let bot = match state.current_player() {
            Player::X => &mut x,
            Player::O => &mut o,
        };
        let mv = bot
            .select_move(&state)
            .context("a running game always has a legal move")?;
        println!(
            "{:>3}. {} {} plays {mv}",
            state.move_count() + 1,
            state.current_player(),
            bot.name()
        );
        state = state.play(mv)?;
    }

    println!("\n{state}\n");
    match state.outcome() {
        GameOutcome::Won(player) => println!("{player} wins"),
        GameOutcome::Drawn => println!("Draw"),
        GameOutcome::InProgress => unreachable!("the loop only ends on a finished game"),
    }

    // Print the chances of the tree search for the opening
    let mut tree_bot = TreeSearchBot::new(TreeSearchConfig::for_testing().with_iterations(2_000));
    let mcts = tree_bot.search(&GameState::new());
    for child in mcts.root().children().take(9) {
        let node = child.value();
        println!("Move: {:?} = {:.2?}%", node.prev_move, node.wins_rate() * 100.0);
    }
    println!("The best move is: {:?}", mcts.best_move());

    Ok(())
}
