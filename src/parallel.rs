//! Parallel processing configuration
//!
//! Per-time-slice array work runs on Rayon's global thread pool. The pool is
//! configured once from the command line before any data is read.

use crate::errors::{FlowError, Result};
use rayon::ThreadPoolBuilder;

/// Configuration for parallel processing
#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    /// Configuration for `--threads`; all CPU cores when it was not given.
    pub fn from_cli(num_threads: Option<usize>) -> Self {
        num_threads.map_or_else(Self::all_cores, Self::with_threads)
    }

    /// Set up the global Rayon thread pool with the specified configuration
    pub fn setup_global_pool(&self) -> Result<()> {
        if let Some(num_threads) = self.num_threads {
            ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .map_err(|e| {
                    FlowError::ThreadPoolError(format!(
                        "Failed to initialize thread pool with {num_threads} threads: {e}"
                    ))
                })?;

            log::info!(
                "✅ Configured parallel processing with {} threads",
                self.current_threads()
            );
        } else {
            log::debug!("Using default thread pool ({} threads)", self.current_threads());
        }

        Ok(())
    }

    /// Get the current number of threads being used
    pub fn current_threads(&self) -> usize {
        rayon::current_num_threads()
    }

    /// Create a configuration that uses all available CPU cores
    pub fn all_cores() -> Self {
        Self {
            num_threads: Some(num_cpus::get()),
        }
    }

    /// Create a configuration that uses a specific number of threads
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
        }
    }
}
