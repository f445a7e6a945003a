//! Conditional parallel iteration.
//!
//! Uses rayon when the `parallel` feature is enabled and the work is large
//! enough according to [`ParallelSettings`]. Results keep input order.

use crate::config::ParallelSettings;

/// Maps a function over items, in parallel when enabled and worthwhile.
///
/// Uses parallel iteration when:
/// - The `parallel` feature is enabled
/// - `settings.enabled` is true
/// - The collection has at least `settings.threshold` items
#[allow(unused_variables)]
pub fn maybe_parallel_map<T, U, F>(items: &[T], settings: &ParallelSettings, f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if settings.should_parallelize(items.len()) {
            return items.par_iter().map(f).collect();
        }
    }

    items.iter().map(f).collect()
}

/// Builds `0..len` by index, in parallel when enabled and worthwhile.
///
/// Lattice layers use this to evaluate independent nodes of one step.
#[allow(unused_variables)]
pub fn maybe_parallel_fill<U, F>(len: usize, settings: &ParallelSettings, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(usize) -> U + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if settings.should_parallelize(len) {
            return (0..len).into_par_iter().map(f).collect();
        }
    }

    (0..len).map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_preserves_order() {
        let items: Vec<u32> = (0..200).collect();
        let settings = ParallelSettings { enabled: true, threshold: 10 };
        let doubled = maybe_parallel_map(&items, &settings, |x| x * 2);
        assert_eq!(doubled, (0..200).map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn fill_matches_sequential() {
        let par = maybe_parallel_fill(100, &ParallelSettings { enabled: true, threshold: 1 }, |i| i * i);
        let seq = maybe_parallel_fill(100, &ParallelSettings::sequential(), |i| i * i);
        assert_eq!(par, seq);
    }
}
