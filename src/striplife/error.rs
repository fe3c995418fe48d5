//! Error types for StripLife runs.

use thiserror::Error;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, StripLifeError>;

#[derive(Debug, Error)]
pub enum StripLifeError {
    /// Grid side or worker count is zero.
    #[error("grid side and worker count must be positive (side {side}, workers {workers})")]
    InvalidSize { side: usize, workers: usize },

    /// Worker count does not divide the grid side.
    #[error("worker count {workers} does not evenly divide grid side {side}")]
    InvalidPartition { side: usize, workers: usize },

    /// A worker arrived at a barrier that another party had already abandoned.
    #[error("worker {worker} observed a broken barrier at generation {generation}")]
    BarrierBroken { worker: usize, generation: u64 },

    /// A worker (or the merge action it was running) panicked.
    #[error("worker {worker} aborted at generation {generation}: {message}")]
    WorkerAborted {
        worker: usize,
        generation: u64,
        message: String,
    },

    #[error("failed to build strip worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl StripLifeError {
    /// True for errors raised before any worker thread was started.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidSize { .. } | Self::InvalidPartition { .. }
        )
    }

    /// Ranking used to pick the root cause out of several worker failures.
    /// Lower is more fundamental.
    pub(crate) fn severity_rank(&self) -> u8 {
        match self {
            Self::WorkerAborted { .. } => 0,
            Self::ThreadPool(_) => 1,
            Self::InvalidSize { .. } | Self::InvalidPartition { .. } => 2,
            Self::BarrierBroken { .. } => 3,
        }
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::{StripLifeError, panic_message};

    #[test]
    fn worker_abort_outranks_broken_barrier() {
        let aborted = StripLifeError::WorkerAborted {
            worker: 3,
            generation: 10,
            message: "boom".into(),
        };
        let broken = StripLifeError::BarrierBroken {
            worker: 1,
            generation: 10,
        };
        assert!(aborted.severity_rank() < broken.severity_rank());
        assert!(!aborted.is_configuration());
    }

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        let payload = std::panic::catch_unwind(|| panic!("static text")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static text");

        let value = 7;
        let payload = std::panic::catch_unwind(|| panic!("formatted {value}")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 7");
    }

    #[test]
    fn display_mentions_partition() {
        let err = StripLifeError::InvalidPartition {
            side: 50,
            workers: 7,
        };
        assert_eq!(
            err.to_string(),
            "worker count 7 does not evenly divide grid side 50"
        );
        assert!(err.is_configuration());
    }
}
