use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;

use crate::config::WalkConfig;
use crate::error::{DiffError, DiffResult};

/// Where walk tasks run.
///
/// The pool is built explicitly and injected into each walk; cloning an
/// executor shares the same pool, so concurrent walks can share one set of
/// workers. The serial executor runs every task on the calling thread in
/// canonical order.
#[derive(Clone)]
pub enum WalkExecutor {
    Serial,
    Pool(Arc<rayon::ThreadPool>),
}

impl WalkExecutor {
    pub fn serial() -> Self {
        WalkExecutor::Serial
    }

    /// Build a dedicated pool with `threads` workers.
    pub fn with_threads(threads: usize, name_prefix: &str) -> DiffResult<Self> {
        let prefix = name_prefix.to_string();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(move |i| format!("{prefix}-{i}"))
            .build()
            .map_err(|e| DiffError::Pool(e.to_string()))?;
        Ok(WalkExecutor::Pool(Arc::new(pool)))
    }

    pub fn from_config(config: &WalkConfig) -> DiffResult<Self> {
        if config.preserve_order {
            Ok(WalkExecutor::Serial)
        } else {
            Self::with_threads(config.effective_threads(), &config.thread_name_prefix)
        }
    }

    pub fn is_serial(&self) -> bool {
        matches!(self, WalkExecutor::Serial)
    }

    pub fn threads(&self) -> usize {
        match self {
            WalkExecutor::Serial => 1,
            WalkExecutor::Pool(pool) => pool.current_num_threads(),
        }
    }

    /// Run `op` inside the executor.
    pub(crate) fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match self {
            WalkExecutor::Serial => op(),
            WalkExecutor::Pool(pool) => pool.install(op),
        }
    }

    /// Run `task` for every item: in order on the serial executor, forked
    /// across the pool otherwise. Stops scheduling new items after the first
    /// error.
    pub(crate) fn for_each<T, F>(&self, items: Vec<T>, task: F) -> DiffResult<()>
    where
        T: Send,
        F: Fn(T) -> DiffResult<()> + Send + Sync,
    {
        match self {
            WalkExecutor::Serial => items.into_iter().try_for_each(task),
            WalkExecutor::Pool(_) if items.len() <= 1 => items.into_iter().try_for_each(task),
            WalkExecutor::Pool(_) => items.into_par_iter().try_for_each(task),
        }
    }
}

impl Default for WalkExecutor {
    fn default() -> Self {
        WalkExecutor::Serial
    }
}

impl fmt::Debug for WalkExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkExecutor::Serial => write!(f, "WalkExecutor::Serial"),
            WalkExecutor::Pool(pool) => {
                write!(f, "WalkExecutor::Pool({} threads)", pool.current_num_threads())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn serial_runs_in_order() {
        let seen = parking_lot::Mutex::new(Vec::new());
        WalkExecutor::serial()
            .for_each((0..5).collect(), |i| {
                seen.lock().push(i);
                Ok(())
            })
            .unwrap();
        assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn pool_runs_every_item() {
        let executor = WalkExecutor::with_threads(3, "test-walk").unwrap();
        assert_eq!(executor.threads(), 3);
        let count = AtomicUsize::new(0);
        executor
            .install(|| {
                executor.for_each((0..100).collect(), |_| {
                    count.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                })
            })
            .unwrap();
        assert_eq!(count.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn first_error_is_returned() {
        let result = WalkExecutor::serial().for_each(vec![1, 2, 3], |i| {
            if i == 2 {
                Err(DiffError::Pool("boom".into()))
            } else {
                Ok(())
            }
        });
        assert!(matches!(result, Err(DiffError::Pool(_))));
    }

    #[test]
    fn from_config_respects_preserve_order() {
        let serial = WalkExecutor::from_config(&crate::config::DiffConfig::serial().walk).unwrap();
        assert!(serial.is_serial());
        let pooled = WalkExecutor::from_config(&WalkConfig {
            threads: Some(2),
            ..Default::default()
        })
        .unwrap();
        assert!(!pooled.is_serial());
    }
}
