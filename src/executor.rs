use crate::error::FluidError;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// How a per-cell kernel is mapped over a grid.
///
/// Every stage reads only the current buffer and writes only its own cell of
/// the output, so both strategies produce identical results. The parallel
/// strategy returns from `install` only after every worker has finished,
/// which is the barrier required before a buffer swap.
#[derive(Debug, Default)]
pub enum Executor {
    #[default]
    Sequential,
    Parallel(ThreadPool),
}

impl Executor {
    /// Bring up a dedicated rayon pool. `threads == 0` lets rayon pick.
    pub fn parallel(threads: usize) -> Result<Self, FluidError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("stirbox-worker-{i}"))
            .build()
            .map_err(|e| FluidError::ParallelUnavailable(e.to_string()))?;
        log::info!("parallel executor ready with {} workers", pool.current_num_threads());
        Ok(Executor::Parallel(pool))
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self, Executor::Parallel(_))
    }

    /// Fill `out` (row-major, `cols` wide) with `kernel(col, row)`.
    pub fn for_each_cell<T, F>(&self, cols: usize, out: &mut [T], kernel: F)
    where
        T: Send,
        F: Fn(usize, usize) -> T + Sync + Send,
    {
        match self {
            Executor::Sequential => {
                for (row, line) in out.chunks_mut(cols).enumerate() {
                    for (col, cell) in line.iter_mut().enumerate() {
                        *cell = kernel(col, row);
                    }
                }
            }
            Executor::Parallel(pool) => pool.install(|| {
                out.par_chunks_mut(cols).enumerate().for_each(|(row, line)| {
                    for (col, cell) in line.iter_mut().enumerate() {
                        *cell = kernel(col, row);
                    }
                });
            }),
        }
    }

    /// Sum `kernel(col, row)` over the interior cells of a `cols x rows` grid.
    pub fn sum_interior<F>(&self, cols: usize, rows: usize, kernel: F) -> f32
    where
        F: Fn(usize, usize) -> f32 + Sync + Send,
    {
        // Row sums are added in row order in both branches, so the result
        // does not depend on the strategy.
        let row_sum = |row: usize| (1..cols - 1).map(|col| kernel(col, row)).sum::<f32>();
        match self {
            Executor::Sequential => (1..rows - 1).map(row_sum).sum(),
            Executor::Parallel(pool) => pool.install(|| {
                let sums: Vec<f32> = (1..rows - 1).into_par_iter().map(row_sum).collect();
                sums.into_iter().sum()
            }),
        }
    }
}
