//! Local-maximum candidate scan and 8-connected clustering.

use common::Buffer2;
use rayon::prelude::*;

use super::star::{Star, sort_canonical};

const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Find point sources in a single-channel plane.
///
/// A pixel inside the 1-pixel border is a candidate when it is at least
/// `threshold` and at least every one of its 8 neighbours. Candidates that
/// touch (8-connected, through other candidates only) form one star whose
/// position is the brightness-weighted centroid, truncated to integers, and
/// whose brightness is the mean candidate value.
///
/// Returns stars brightest first. No candidates gives an empty list.
pub fn detect_stars(image: &Buffer2<f32>, threshold: f32) -> Vec<Star> {
    let mask = candidate_mask(image, threshold);
    let mut stars = cluster_candidates(image, &mask);
    sort_canonical(&mut stars);
    stars
}

/// Per-pixel candidate flags, computed row-parallel.
fn candidate_mask(image: &Buffer2<f32>, threshold: f32) -> Buffer2<bool> {
    let width = image.width();
    let height = image.height();
    let mut mask = vec![false; width * height];
    if width < 3 || height < 3 {
        return Buffer2::new(width, height, mask);
    }

    mask.par_chunks_mut(width)
        .enumerate()
        .skip(1)
        .take(height - 2)
        .for_each(|(y, row)| {
            for (x, flag) in row.iter_mut().enumerate().skip(1).take(width - 2) {
                *flag = is_local_maximum(image, x, y, threshold);
            }
        });

    Buffer2::new(width, height, mask)
}

#[inline]
fn is_local_maximum(image: &Buffer2<f32>, x: usize, y: usize, threshold: f32) -> bool {
    let v = *image.get(x, y);
    if v.is_nan() || v < threshold {
        return false;
    }
    NEIGHBOURS.iter().all(|&(dx, dy)| {
        let n = *image.get((x as i64 + dx) as usize, (y as i64 + dy) as usize);
        v >= n
    })
}

/// Flood-fill the candidate mask into clusters and reduce each to a star.
fn cluster_candidates(image: &Buffer2<f32>, mask: &Buffer2<bool>) -> Vec<Star> {
    let width = mask.width();
    let mut visited = vec![false; mask.len()];
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let mut stars = Vec::new();

    for (start, &is_candidate) in mask.iter().enumerate() {
        if !is_candidate || visited[start] {
            continue;
        }
        visited[start] = true;
        stack.push((start % width, start / width));

        let mut acc = ClusterAccumulator::default();
        while let Some((x, y)) = stack.pop() {
            acc.add(x, y, *image.get(x, y));
            for &(dx, dy) in &NEIGHBOURS {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if mask.get_checked(nx, ny) != Some(&true) {
                    continue;
                }
                let idx = ny as usize * width + nx as usize;
                if !visited[idx] {
                    visited[idx] = true;
                    stack.push((nx as usize, ny as usize));
                }
            }
        }
        stars.push(acc.into_star());
    }

    stars
}

#[derive(Debug, Default)]
struct ClusterAccumulator {
    count: usize,
    sum_value: f64,
    sum_wx: f64,
    sum_wy: f64,
    sum_x: f64,
    sum_y: f64,
}

impl ClusterAccumulator {
    #[inline]
    fn add(&mut self, x: usize, y: usize, value: f32) {
        let v = value as f64;
        self.count += 1;
        self.sum_value += v;
        self.sum_wx += v * x as f64;
        self.sum_wy += v * y as f64;
        self.sum_x += x as f64;
        self.sum_y += y as f64;
    }

    fn into_star(self) -> Star {
        let n = self.count as f64;
        // An all-zero cluster (threshold 0 on a black region) has no weights.
        let (cx, cy) = if self.sum_value > 0.0 {
            (self.sum_wx / self.sum_value, self.sum_wy / self.sum_value)
        } else {
            (self.sum_x / n, self.sum_y / n)
        };
        Star::new(cx.trunc() as i32, cy.trunc() as i32, self.sum_value / n)
    }
}
