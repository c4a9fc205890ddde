//! Progress reporting for long-running training runs.

use serde::Serialize;
use std::fmt::Display;

/// A progress report. We don't type the topic and just use a string instead.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub topic: &'static str,
    pub total: usize,
    pub current: usize,
}

impl Progress {
    pub fn new(topic: &'static str, total: usize, current: usize) -> Self {
        Self {
            topic,
            total,
            current,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.current == self.total
    }

    /// Whether a report should be printed at this step. We report every
    /// `interval` steps and always on the last one. An interval of 0 only
    /// reports the last step.
    pub fn is_due(&self, interval: usize) -> bool {
        self.is_finished() || (interval > 0 && self.current % interval == 0)
    }
}

impl Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{}", self.topic, self.current, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_on_interval_and_at_the_end() {
        let due: Vec<usize> = (1..=250)
            .filter(|i| Progress::new("Ep", 250, *i).is_due(100))
            .collect();
        assert_eq!(due, vec![100, 200, 250]);
        assert!(Progress::new("Ep", 7, 7).is_due(0));
        assert!(!Progress::new("Ep", 7, 3).is_due(0));
    }

    #[test]
    fn display() {
        assert_eq!(Progress::new("Ep", 3000, 100).to_string(), "Ep 100/3000");
    }
}
