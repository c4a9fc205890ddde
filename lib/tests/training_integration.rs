use endgame::fen::{parse_fen, write_fen};
use endgame::learning::curriculum::{train_both_sides, Side};
use endgame::learning::metrics::SessionMetrics;
use endgame::learning::q_table::scenario_table_path;
use endgame::learning::{QTable, TrainingConfig, TrainingSession};
use endgame::oracle::greedy::GreedyOracle;
use endgame::oracle::OracleError;
use endgame::random::sample_positions;
use endgame::scenario::Scenario;
use endgame::{ChessBoard, PlayerColor};
use ntest::timeout;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("endgame-it-{}-{}", name, std::process::id()))
}

fn sorted_moves(board: &ChessBoard) -> Vec<String> {
    let mut moves: Vec<String> = board.legal_moves().iter().map(|m| m.to_string()).collect();
    moves.sort();
    moves
}

/// Plays random games from the start position. Writing and parsing the FEN
/// at every step must not change which moves are legal, and every game has to
/// end on its own.
#[test]
#[timeout(60000)]
fn random_games_survive_fen_roundtrips() {
    let mut rng = StdRng::seed_from_u64(2022);
    for _ in 0..20 {
        let mut board = ChessBoard::new();
        let mut plies = 0;
        while !board.victory_state.is_over() {
            let reparsed = parse_fen(&write_fen(&board)).unwrap();
            assert_eq!(write_fen(&reparsed), write_fen(&board));
            assert_eq!(sorted_moves(&reparsed), sorted_moves(&board));

            let moves = board.legal_moves();
            let mv = *moves.choose(&mut rng).unwrap();
            board.execute(mv).unwrap();
            plies += 1;
            assert!(plies < 6000, "game did not end: {}", write_fen(&board));
        }
        assert!(board.legal_moves().is_empty());
    }
}

#[test]
#[timeout(120000)]
fn training_against_the_greedy_oracle() {
    let mut rng = StdRng::seed_from_u64(77);
    let starts = sample_positions(Scenario::KingQueenRookVsKing, 20, &mut rng);
    let config = TrainingConfig {
        epsilon: 0.3,
        ..Default::default()
    };
    let mut session = TrainingSession::new(
        config,
        PlayerColor::White,
        QTable::new(),
        GreedyOracle::new(StdRng::seed_from_u64(5)),
        StdRng::seed_from_u64(6),
    );
    let tally = session.train(&starts, 100).unwrap();

    let history = session.history();
    assert_eq!(history.len(), 100);
    assert_eq!(tally, history[99].tally);
    assert_eq!(tally.decided() as usize, history.iter().filter(|r| r.outcome.is_some()).count());
    // Cut off episodes are the exception, most games end on the board.
    assert!(tally.decided() > 0);
    // Epsilon never grows and the records are numbered in order.
    for pair in history.windows(2) {
        assert!(pair[1].epsilon <= pair[0].epsilon);
        assert_eq!(pair[1].episode, pair[0].episode + 1);
        assert!(pair[1].table_size >= pair[0].table_size);
    }
    // The oracle still answers the learner's last move before the cut off.
    assert!(history.iter().all(|r| r.length <= 151));
}

#[test]
#[timeout(120000)]
fn both_sides_share_one_table_file() {
    let dir = scratch_dir("curriculum");
    let scenario = Scenario::KingRookVsKing;
    let path = scenario_table_path(&dir, scenario.id());
    let mut rng = StdRng::seed_from_u64(31);
    let starts = sample_positions(scenario, 10, &mut rng);

    let mut seed = 100;
    let report = train_both_sides(
        &TrainingConfig::default(),
        Side::Both,
        &starts,
        20,
        &path,
        || {
            seed += 1;
            Ok::<_, OracleError>(GreedyOracle::new(StdRng::seed_from_u64(seed)))
        },
        &mut rng,
    )
    .unwrap();

    let black = report.black.as_ref().unwrap();
    let stored = QTable::try_load(&path).unwrap();
    assert_eq!(stored.len(), black.table_size);

    for side in report.sides() {
        let metrics = SessionMetrics::new(scenario.id(), side.learner, &side.history);
        let file = dir.join(format!("metrics_{:?}.json", side.learner));
        metrics.write_json(&file).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(json["episodes"].as_array().unwrap().len(), 20);
        assert_eq!(json["rolling_win_rate"].as_array().unwrap().len(), 20);
    }

    let _ = std::fs::remove_dir_all(&dir);
}
