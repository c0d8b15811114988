use anyhow::Result;
use uttt_engine::{
    BlockStatus, Bot, Engine, EngineError, GameState, Move, Player, Strategy,
    game::lines::{LINES, block_winner},
    random::{RandomGenerator, SeededRandomGenerator},
    search::{
        AlphaBetaBot, AlphaBetaConfig, Budget, MonteCarloConfig, TreeSearchConfig,
        evaluation::block_weight,
    },
};

fn all_strategies() -> Vec<Strategy> {
    vec![
        Strategy::AlphaBeta(AlphaBetaConfig::for_testing()),
        Strategy::AlphaBeta(AlphaBetaConfig::default()),
        Strategy::MonteCarlo(MonteCarloConfig::for_testing()),
        Strategy::MonteCarlo(MonteCarloConfig::for_testing().with_parallel(true)),
        Strategy::TreeSearch(TreeSearchConfig::for_testing()),
    ]
}

fn random_game(seed: u64) -> Vec<GameState> {
    let mut rng = SeededRandomGenerator::new(seed);
    let mut states = vec![GameState::new()];
    loop {
        let state = states.last().expect("starts non-empty");
        let moves = state.legal_moves();
        let Some(mv) = rng.choose(&moves[..]) else {
            break;
        };
        let next = state.play(*mv).expect("generated moves are legal");
        states.push(next);
    }
    states
}

/// X owns blocks (0, 0) and (0, 1); the third cell of the top row of block (0, 2) is the last
/// legal move in generator order and wins the match.
fn macro_win_in_one() -> Result<GameState> {
    Ok(GameState::from_rows(
        [
            "XXX|XXX|..X",
            "OO.|OO.|..X",
            "...|...|...",
            "...|..O|...",
            "...|.O.|...",
            "...|...|...",
            "O..|...|...",
            "...|...|.O.",
            "...|...|...",
        ],
        Some(Move::new(3, 5)),
    )?)
}

#[test]
fn legal_moves_are_exactly_the_valid_moves() {
    for seed in 0..10 {
        for state in random_game(seed) {
            let legal = state.legal_moves();
            for row in 0..9 {
                for col in 0..9 {
                    let mv = Move::new(row, col);
                    assert_eq!(legal.contains(&mv), state.check_move(mv).is_ok());
                }
            }
            assert_eq!(legal.is_empty(), state.is_terminal());
        }
    }
}

#[test]
fn legal_moves_are_in_row_major_order() {
    for state in random_game(3) {
        let legal = state.legal_moves();
        assert!(
            legal
                .windows(2)
                .all(|pair| (pair[0].row, pair[0].col) < (pair[1].row, pair[1].col))
        );
    }
}

#[test]
fn win_detector_on_every_line() {
    for line in LINES {
        let mut cells = [None; 9];
        for idx in line {
            cells[idx] = Some(Player::O);
        }
        assert!(block_winner(&cells, Player::O));
        assert!(!block_winner(&cells, Player::X));

        cells[line[1]] = Some(Player::X);
        assert!(!block_winner(&cells, Player::O));
        assert!(!block_winner(&cells, Player::X));
    }
    assert!(!block_winner(&[None; 9], Player::X));
    assert!(!block_winner(&[None; 9], Player::O));
}

#[test]
fn clones_are_independent() -> Result<()> {
    let states = random_game(21);
    let source = states[states.len() / 2].clone();
    let snapshot = source.clone();

    let successors = source
        .legal_moves()
        .iter()
        .take(3)
        .map(|mv| source.play(*mv))
        .collect::<uttt_engine::Result<Vec<_>>>()?;
    for successor in &successors {
        assert_ne!(successor, &source);
        assert_eq!(successor.move_count(), source.move_count() + 1);
    }
    assert_eq!(source, snapshot);
    Ok(())
}

#[test]
fn outside_moves_are_always_checked() -> Result<()> {
    let state = GameState::new().play(Move::new(4, 4))?;
    assert_eq!(
        state.play(Move::new(4, 4)),
        Err(EngineError::CellOccupied { row: 4, col: 4 })
    );
    assert_eq!(
        state.play(Move::new(9, 3)),
        Err(EngineError::OutOfBounds { row: 9, col: 3 })
    );
    assert_eq!(state.move_count(), 1);
    assert_eq!(state.cell(Move::new(4, 4)), Some(Player::X));
    Ok(())
}

#[test]
fn imported_states_round_trip() -> Result<()> {
    for state in random_game(5) {
        let imported = GameState::from_parts(
            *state.cells(),
            state.macroboard(),
            state.move_count(),
            state.last_move(),
        )?;
        assert_eq!(imported, state);
    }
    Ok(())
}

#[test]
fn imported_state_with_a_move_into_a_closed_block_is_rejected() -> Result<()> {
    let state = macro_win_in_one()?;
    let mut cells = *state.cells();
    // an O mark inside block (0, 0), which X has already won
    cells[2][2] = Some(Player::O);
    cells[8][8] = Some(Player::X);
    let result = GameState::from_parts(cells, state.macroboard(), 18, Some(Move::new(2, 2)));
    assert!(matches!(result, Err(EngineError::InvalidState { .. })));
    Ok(())
}

#[test]
fn every_engine_takes_the_immediate_win() -> Result<()> {
    let state = macro_win_in_one()?;
    assert_eq!(state.legal_moves().last(), Some(&Move::new(2, 8)));
    for strategy in all_strategies() {
        let mut engine = Engine::new(strategy);
        assert_eq!(
            engine.select_move(&state),
            Some(Move::new(2, 8)),
            "{}",
            engine.name()
        );
    }
    Ok(())
}

#[test]
fn scenario_a_opening_move() {
    let state = GameState::new();
    for strategy in all_strategies() {
        let mut engine = Engine::new(strategy);
        let mv = engine.select_move(&state).expect("the opening has moves");
        assert!(state.check_move(mv).is_ok());
    }

    let mut engine = Engine::new(Strategy::default());
    assert_eq!(engine.select_move(&state).map(|mv| mv.block()), Some((1, 1)));

    let scores = AlphaBetaBot::default().score_moves(&state);
    let best_center = scores
        .iter()
        .filter(|(mv, _)| mv.block() == (1, 1))
        .map(|(_, score)| *score)
        .max();
    let best_elsewhere = scores
        .iter()
        .filter(|(mv, _)| mv.block() != (1, 1))
        .map(|(_, score)| *score)
        .max();
    assert!(best_center >= best_elsewhere);
    assert!(block_weight((1, 1)) > block_weight((0, 0)));
    assert!(block_weight((0, 0)) > block_weight((0, 1)));
}

#[test]
fn scenario_b_completes_the_line_in_the_active_block() -> Result<()> {
    // X holds the top two cells of the middle column of block (1, 1), and O's mark in the
    // middle of block (0, 0) sends X there
    let state = GameState::from_rows(
        [
            "O..|...|...",
            ".O.|...|...",
            "...|...|...",
            "...|.X.|...",
            "...|.X.|...",
            "...|...|...",
            "...|...|...",
            "...|...|...",
            "...|...|...",
        ],
        Some(Move::new(1, 1)),
    )?;
    assert_eq!(state.current_player(), Player::X);
    assert_eq!(state.active_block(), Some((1, 1)));
    assert_eq!(state.block_status((1, 1)), BlockStatus::InPlay);
    assert_ne!(state.legal_moves()[0], Move::new(5, 4));

    for strategy in all_strategies() {
        let mut engine = Engine::new(strategy);
        assert_eq!(
            engine.select_move(&state),
            Some(Move::new(5, 4)),
            "{}",
            engine.name()
        );
    }
    Ok(())
}

#[test]
fn scenario_c_decided_match_has_no_move() -> Result<()> {
    let state = macro_win_in_one()?.play(Move::new(2, 8))?;
    assert_eq!(state.winner(), Some(Player::X));
    for strategy in all_strategies() {
        let mut engine = Engine::new(strategy);
        assert_eq!(engine.select_move(&state), None, "{}", engine.name());
    }
    Ok(())
}

#[test]
fn engines_play_complete_legal_games() -> Result<()> {
    let mut x = Engine::new(Strategy::AlphaBeta(AlphaBetaConfig::default().with_depth(1)));
    let mut o = Engine::new(Strategy::MonteCarlo(
        MonteCarloConfig::for_testing().with_budget(Budget::Rollouts(3)),
    ));

    let mut state = GameState::new();
    while let Some(mv) = match state.current_player() {
        Player::X => x.select_move(&state),
        Player::O => o.select_move(&state),
    } {
        state = state.play(mv)?;
    }
    assert!(state.is_terminal());
    assert!(state.legal_moves().is_empty());
    Ok(())
}
