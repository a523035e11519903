//! Progress callbacks for integration.

use std::sync::Arc;

/// Phase of an integration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum StackingStage {
    /// One step per supplier, excluded frames included.
    Loading,
    /// One step per channel of each row chunk.
    Combining,
}

/// `completed` of `total` steps of `stage` are done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackingProgress {
    pub stage: StackingStage,
    pub completed: usize,
    pub total: usize,
}

impl StackingProgress {
    /// Completed share in `[0, 1]`; an empty stage counts as done.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }
}

/// Optional observer of [`StackingProgress`].
pub type ProgressCallback = Option<Arc<dyn Fn(StackingProgress) + Send + Sync>>;

/// Callback bound to one stage and its step count.
pub(crate) struct StageReporter<'a> {
    callback: &'a ProgressCallback,
    stage: StackingStage,
    total: usize,
}

impl<'a> StageReporter<'a> {
    pub(crate) fn new(callback: &'a ProgressCallback, stage: StackingStage, total: usize) -> Self {
        Self {
            callback,
            stage,
            total,
        }
    }

    pub(crate) fn report(&self, completed: usize) {
        if let Some(f) = self.callback {
            f(StackingProgress {
                stage: self.stage,
                completed,
                total: self.total,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_fraction() {
        let p = StackingProgress {
            stage: StackingStage::Loading,
            completed: 1,
            total: 4,
        };
        assert_eq!(p.fraction(), 0.25);
        let empty = StackingProgress { total: 0, ..p };
        assert_eq!(empty.fraction(), 1.0);
    }

    #[test]
    fn test_reporter_fills_stage_and_total() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let callback: ProgressCallback = {
            let seen = Arc::clone(&seen);
            Some(Arc::new(move |p: StackingProgress| seen.lock().unwrap().push(p)))
        };

        let reporter = StageReporter::new(&callback, StackingStage::Combining, 6);
        reporter.report(0);
        reporter.report(6);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|p| p.stage == StackingStage::Combining && p.total == 6));
        assert_eq!(seen[1].completed, 6);
    }

    #[test]
    fn test_reporter_without_callback_is_silent() {
        StageReporter::new(&None, StackingStage::Loading, 3).report(1);
    }
}
