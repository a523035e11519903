//! Star detection result type.

use std::cmp::Ordering;

use glam::DVec2;

/// A detected point source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    /// X coordinate of the cluster centroid (truncated).
    pub x: i32,
    /// Y coordinate of the cluster centroid (truncated).
    pub y: i32,
    /// Mean value of the pixels in the cluster.
    pub brightness: f64,
}

impl Star {
    pub fn new(x: i32, y: i32, brightness: f64) -> Self {
        Self { x, y, brightness }
    }

    #[inline]
    pub fn pos(&self) -> DVec2 {
        DVec2::new(self.x as f64, self.y as f64)
    }

    /// Canonical star-list order: brighter first, then by row, then by column.
    pub fn canonical_cmp(&self, other: &Star) -> Ordering {
        other
            .brightness
            .total_cmp(&self.brightness)
            .then(self.y.cmp(&other.y))
            .then(self.x.cmp(&other.x))
    }
}

/// Sort a star list into canonical order.
pub fn sort_canonical(stars: &mut [Star]) {
    stars.sort_by(Star::canonical_cmp);
}

/// Keep at most `k` stars, assuming canonical order.
pub fn top_k(stars: &[Star], k: usize) -> &[Star] {
    &stars[..k.min(stars.len())]
}
