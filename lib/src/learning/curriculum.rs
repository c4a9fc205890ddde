//! Trains both colors of a scenario one after another. White starts from an
//! empty table, black continues from the table white left behind. Both
//! share one table file.

use super::metrics::{EpisodeRecord, Tally};
use super::q_table::QTable;
use super::training::{TrainingConfig, TrainingSession};
use super::TrainingError;
use crate::oracle::{OpponentOracle, OracleError};
use crate::{ChessBoard, PlayerColor};
use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which colors to train.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
    Both,
}

impl Side {
    pub fn includes(self, color: PlayerColor) -> bool {
        match self {
            Side::White => color == PlayerColor::White,
            Side::Black => color == PlayerColor::Black,
            Side::Both => true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SideReport {
    pub learner: PlayerColor,
    pub tally: Tally,
    pub history: Vec<EpisodeRecord>,
    pub table_size: usize,
}

#[derive(Clone, Debug, Default)]
pub struct CurriculumReport {
    pub white: Option<SideReport>,
    pub black: Option<SideReport>,
}

impl CurriculumReport {
    pub fn sides(&self) -> impl Iterator<Item = &SideReport> {
        self.white.iter().chain(self.black.iter())
    }
}

/// Runs the two sided protocol on the table at `table_path`. A fresh oracle
/// is opened for every color and shut down once that color is done, also if
/// training failed.
pub fn train_both_sides<O, R, F>(
    config: &TrainingConfig,
    side: Side,
    starts: &[ChessBoard],
    episodes: usize,
    table_path: &Path,
    mut open_oracle: F,
    rng: &mut R,
) -> Result<CurriculumReport, TrainingError>
where
    O: OpponentOracle,
    R: Rng + ?Sized,
    F: FnMut() -> Result<O, OracleError>,
{
    let mut report = CurriculumReport::default();

    if side.includes(PlayerColor::White) {
        if table_path.exists() {
            std::fs::remove_file(table_path)?;
            info!("Removed old q-table {}", table_path.display());
        }
        report.white = Some(train_side(
            config,
            PlayerColor::White,
            QTable::new(),
            starts,
            episodes,
            table_path,
            &mut open_oracle,
            rng,
        )?);
    }

    if side.includes(PlayerColor::Black) {
        let table = QTable::load(table_path);
        report.black = Some(train_side(
            config,
            PlayerColor::Black,
            table,
            starts,
            episodes,
            table_path,
            &mut open_oracle,
            rng,
        )?);
    }

    Ok(report)
}

#[allow(clippy::too_many_arguments)]
fn train_side<O, R, F>(
    config: &TrainingConfig,
    learner: PlayerColor,
    table: QTable,
    starts: &[ChessBoard],
    episodes: usize,
    table_path: &Path,
    open_oracle: &mut F,
    rng: &mut R,
) -> Result<SideReport, TrainingError>
where
    O: OpponentOracle,
    R: Rng + ?Sized,
    F: FnMut() -> Result<O, OracleError>,
{
    let mut oracle = open_oracle()?;
    let trained = {
        let mut session = TrainingSession::new(config.clone(), learner, table, &mut oracle, &mut *rng);
        session.train(starts, episodes).map(|tally| (tally, session.into_parts()))
    };
    let closed = oracle.shutdown();

    let (tally, (q_table, history)) = trained?;
    q_table.save(table_path)?;
    closed?;

    Ok(SideReport {
        learner,
        tally,
        history,
        table_size: q_table.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::greedy::GreedyOracle;
    use crate::oracle::SearchLimit;
    use crate::random::sample_positions;
    use crate::scenario::Scenario;
    use crate::ChessMove;
    use ntest::timeout;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::Cell;
    use std::path::PathBuf;
    use std::rc::Rc;

    /// Greedy oracle that counts how often it was shut down.
    struct CountingOracle {
        inner: GreedyOracle<StdRng>,
        shutdowns: Rc<Cell<u32>>,
    }

    impl OpponentOracle for CountingOracle {
        fn play(&mut self, board: &ChessBoard, limit: SearchLimit) -> Result<Option<ChessMove>, OracleError> {
            self.inner.play(board, limit)
        }

        fn shutdown(&mut self) -> Result<(), OracleError> {
            self.shutdowns.set(self.shutdowns.get() + 1);
            Ok(())
        }
    }

    fn table_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("endgame-curriculum-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn side_selection() {
        assert!(Side::Both.includes(PlayerColor::White));
        assert!(Side::Both.includes(PlayerColor::Black));
        assert!(Side::White.includes(PlayerColor::White));
        assert!(!Side::White.includes(PlayerColor::Black));
        assert!(!Side::Black.includes(PlayerColor::White));
    }

    #[test]
    #[timeout(30000)]
    fn black_continues_from_the_white_table() {
        let mut rng = StdRng::seed_from_u64(4);
        let starts = sample_positions(Scenario::KingQueenVsKing, 10, &mut rng);
        let path = table_path("both.bin");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"stale").unwrap();

        let shutdowns = Rc::new(Cell::new(0));
        let mut seed = 0;
        let open = || {
            seed += 1;
            Ok::<_, OracleError>(CountingOracle {
                inner: GreedyOracle::new(StdRng::seed_from_u64(seed)),
                shutdowns: shutdowns.clone(),
            })
        };
        let report = train_both_sides(
            &TrainingConfig::default(),
            Side::Both,
            &starts,
            15,
            &path,
            open,
            &mut rng,
        )
        .unwrap();

        let white = report.white.as_ref().unwrap();
        let black = report.black.as_ref().unwrap();
        assert_eq!(white.history.len(), 15);
        assert_eq!(black.history.len(), 15);
        assert!(white.table_size > 0);
        // Black keeps every entry white wrote.
        assert!(black.table_size >= white.table_size);
        assert_eq!(QTable::try_load(&path).unwrap().len(), black.table_size);
        assert_eq!(shutdowns.get(), 2);
        assert_eq!(report.sides().count(), 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    #[timeout(30000)]
    fn oracle_is_closed_when_training_fails() {
        let path = table_path("failing.bin");
        let shutdowns = Rc::new(Cell::new(0));
        let open = || {
            Ok::<_, OracleError>(CountingOracle {
                inner: GreedyOracle::new(StdRng::seed_from_u64(1)),
                shutdowns: shutdowns.clone(),
            })
        };
        let result = train_both_sides(
            &TrainingConfig::default(),
            Side::White,
            &[],
            5,
            &path,
            open,
            &mut StdRng::seed_from_u64(1),
        );
        assert!(matches!(result, Err(TrainingError::NoStartPositions)));
        assert_eq!(shutdowns.get(), 1);
    }
}
