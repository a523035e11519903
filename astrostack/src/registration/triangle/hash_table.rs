use std::f64::consts::PI;

use super::geometry::TriangleFeature;

/// Features bucketed on a `bins` x `bins` grid over their two smallest angles.
///
/// Bucket contents live in one flat array: bin `b` owns
/// `entries[starts[b]..starts[b + 1]]`, in feature order.
#[derive(Debug)]
pub(crate) struct TriangleHashTable {
    starts: Vec<usize>,
    entries: Vec<usize>,
    bins: usize,
}

impl TriangleHashTable {
    pub fn build(features: &[TriangleFeature], bins: usize) -> Self {
        assert!(bins > 0, "bins must be positive");

        let keys: Vec<usize> = features
            .iter()
            .map(|f| {
                let (bx, by) = f.hash_key(bins);
                by * bins + bx
            })
            .collect();

        let mut starts = vec![0usize; bins * bins + 1];
        for &key in &keys {
            starts[key + 1] += 1;
        }
        for b in 0..bins * bins {
            starts[b + 1] += starts[b];
        }

        let mut cursor = starts.clone();
        let mut entries = vec![0usize; features.len()];
        for (idx, &key) in keys.iter().enumerate() {
            entries[cursor[key]] = idx;
            cursor[key] += 1;
        }

        Self {
            starts,
            entries,
            bins,
        }
    }

    /// Feature indices from every bin within `tolerance` radians of the
    /// query's bin. Clears `candidates` first. The result is a superset; the
    /// caller applies the exact angle test.
    pub fn find_candidates_into(
        &self,
        query: &TriangleFeature,
        tolerance: f64,
        candidates: &mut Vec<usize>,
    ) {
        candidates.clear();

        let (bx, by) = query.hash_key(self.bins);
        // The smallest angle spans [0, π/3], the middle one [0, π/2].
        let xs = self.bin_span(bx, tolerance / (PI / 3.0));
        let ys = self.bin_span(by, tolerance / (PI / 2.0));

        for y in ys {
            let row = y * self.bins;
            let first = self.starts[row + xs.start];
            let last = self.starts[row + xs.end];
            candidates.extend_from_slice(&self.entries[first..last]);
        }
    }

    /// Bins within reach of `bin` for a tolerance expressed as a fraction of the axis.
    fn bin_span(&self, bin: usize, fraction: f64) -> std::ops::Range<usize> {
        let reach = ((fraction * self.bins as f64).ceil() as usize).max(1);
        bin.saturating_sub(reach)..(bin + reach + 1).min(self.bins)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn bin_len(&self, bx: usize, by: usize) -> usize {
        let b = by * self.bins + bx;
        self.starts[b + 1] - self.starts[b]
    }
}
