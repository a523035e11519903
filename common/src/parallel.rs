//! Bounded parallel processing of owned work items.
//!
//! Items are consumed in batches of at most `max_concurrent`. Each batch is
//! mapped in parallel on a dedicated rayon pool, then handed to `sink` one
//! result at a time, in input order, on the calling thread. Peak memory is
//! bounded by one batch of results.

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

/// Map owned `items` with at most `max_concurrent` in flight, feeding results
/// to `sink` in order. Stops at the first error from `map` or `sink`.
///
/// With `max_concurrent == 1` everything runs sequentially on the caller's
/// thread and no pool is created.
///
/// # Panics
///
/// Panics if `max_concurrent` is 0 or the thread pool cannot be built.
pub fn try_for_each_limited<T, R, E, F, S>(
    items: Vec<T>,
    max_concurrent: usize,
    map: F,
    mut sink: S,
) -> Result<(), E>
where
    T: Send,
    R: Send,
    E: Send,
    F: Fn(usize, T) -> Result<R, E> + Sync + Send,
    S: FnMut(usize, R) -> Result<(), E>,
{
    assert!(max_concurrent > 0, "max_concurrent must be > 0");

    if max_concurrent == 1 {
        for (index, item) in items.into_iter().enumerate() {
            let result = map(index, item)?;
            sink(index, result)?;
        }
        return Ok(());
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(max_concurrent)
        .build()
        .unwrap_or_else(|e| panic!("Failed to build worker pool: {}", e));

    let mut pending: Vec<(usize, T)> = items.into_iter().enumerate().collect();
    // Drain from the front in batch-sized pieces.
    pending.reverse();
    while !pending.is_empty() {
        let take = max_concurrent.min(pending.len());
        let mut batch: Vec<(usize, T)> = pending.split_off(pending.len() - take);
        batch.reverse();

        let results: Vec<(usize, Result<R, E>)> = pool.install(|| {
            batch
                .into_par_iter()
                .map(|(index, item)| (index, map(index, item)))
                .collect()
        });

        for (index, result) in results {
            sink(index, result?)?;
        }
    }

    Ok(())
}
