use gms_core::{Keypoint, Match};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Left-image grid is fixed at 20x20 cells
const GRID_COLS: usize = 20;
const GRID_ROWS: usize = 20;

/// Relative scales tried for the right grid when scale support is on
const SCALE_RATIOS: [f64; 5] = [
    1.0,
    0.5,
    std::f64::consts::FRAC_1_SQRT_2,
    std::f64::consts::SQRT_2,
    2.0,
];

/// The 8 rotations of the 3x3 cell neighborhood (0-based cell order)
const ROTATION_PATTERNS: [[usize; 9]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8],
    [3, 0, 1, 6, 4, 2, 7, 8, 5],
    [6, 3, 0, 7, 4, 1, 8, 5, 2],
    [7, 6, 3, 8, 4, 0, 5, 2, 1],
    [8, 7, 6, 5, 4, 3, 2, 1, 0],
    [5, 8, 7, 2, 4, 6, 1, 0, 3],
    [2, 5, 8, 1, 4, 7, 0, 3, 6],
    [1, 2, 5, 0, 4, 8, 3, 6, 7],
];

/// Grid-statistics filter configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GmsConfig {
    /// Tolerate rotated correspondences between the two images
    pub with_rotation: bool,
    /// Tolerate scaled correspondences between the two images
    pub with_scale: bool,
    /// Acceptance threshold multiplier for the neighborhood score
    pub threshold_factor: f64,
}

impl Default for GmsConfig {
    fn default() -> Self {
        Self {
            with_rotation: false,
            with_scale: false,
            threshold_factor: 6.0,
        }
    }
}

/// Grid-based motion statistics match filter.
///
/// Rejects geometrically inconsistent matches by voting over cell pairs:
/// a match survives when its left cell's best right cell gathers enough
/// support from the surrounding 3x3 neighborhood. Rotation and scale
/// support try the 8 neighborhood rotations and 5 right-grid scales and
/// keep the configuration with the most inliers.
pub struct GmsFilter {
    cfg: GmsConfig,
}

impl GmsFilter {
    pub fn new(cfg: GmsConfig) -> Self {
        Self { cfg }
    }

    /// Select the geometrically consistent subset of `matches`.
    ///
    /// `size1`/`size2` are the (width, height) of the two images. Output
    /// preserves input order and is always a subset of the input. Match
    /// indices must be valid into `kp1`/`kp2`.
    pub fn filter(
        &self,
        size1: (usize, usize),
        size2: (usize, usize),
        kp1: &[Keypoint],
        kp2: &[Keypoint],
        matches: &[Match],
    ) -> Vec<Match> {
        if matches.is_empty() || size1.0 == 0 || size1.1 == 0 || size2.0 == 0 || size2.1 == 0 {
            return Vec::new();
        }

        let points1 = normalize_points(kp1, size1);
        let points2 = normalize_points(kp2, size2);

        let mut best_mask = vec![false; matches.len()];
        let mut best_count = 0usize;

        let scales: &[usize] = if self.cfg.with_scale { &[0, 1, 2, 3, 4] } else { &[0] };
        let rotations: &[usize] = if self.cfg.with_rotation {
            &[0, 1, 2, 3, 4, 5, 6, 7]
        } else {
            &[0]
        };

        let mut first = true;
        for &scale in scales {
            let mut ctx = GridContext::new(scale);
            for &rotation in rotations {
                let mask = ctx.run(
                    &points1,
                    &points2,
                    matches,
                    &ROTATION_PATTERNS[rotation],
                    self.cfg.threshold_factor,
                );
                let count = mask.iter().filter(|&&inlier| inlier).count();
                if first || count > best_count {
                    best_count = count;
                    best_mask = mask;
                    first = false;
                }
            }
        }

        log::debug!(
            "GMS kept {}/{} matches (rotation={}, scale={})",
            best_count,
            matches.len(),
            self.cfg.with_rotation,
            self.cfg.with_scale
        );

        matches
            .iter()
            .zip(best_mask.iter())
            .filter(|(_, &inlier)| inlier)
            .map(|(m, _)| *m)
            .collect()
    }
}

/// Keypoint coordinates scaled into [0, 1)
fn normalize_points(kps: &[Keypoint], size: (usize, usize)) -> Vec<(f64, f64)> {
    let (w, h) = (size.0 as f64, size.1 as f64);
    kps.iter().map(|kp| (kp.x as f64 / w, kp.y as f64 / h)).collect()
}

/// Per-scale voting state: motion statistics over (left cell, right cell)
/// pairs, rebuilt for each of the four half-cell-shifted left grids
struct GridContext {
    right_cols: usize,
    right_rows: usize,
    /// Votes per cell pair, flat [left_cell * right_count + right_cell]
    motion_statistics: Vec<u32>,
    /// Points per left cell
    points_per_cell: Vec<u32>,
    /// Verified right cell per left cell, `None` when rejected or empty
    cell_pairs: Vec<Option<usize>>,
    /// Cell pair per match under the current grid shift
    match_cells: Vec<Option<(usize, usize)>>,
}

impl GridContext {
    fn new(scale: usize) -> Self {
        let ratio = SCALE_RATIOS[scale];
        let right_cols = ((GRID_COLS as f64 * ratio) as usize).max(1);
        let right_rows = ((GRID_ROWS as f64 * ratio) as usize).max(1);
        let left_count = GRID_COLS * GRID_ROWS;
        let right_count = right_cols * right_rows;

        Self {
            right_cols,
            right_rows,
            motion_statistics: vec![0; left_count * right_count],
            points_per_cell: vec![0; left_count],
            cell_pairs: vec![None; left_count],
            match_cells: Vec::new(),
        }
    }

    /// One full pass under a fixed rotation pattern: vote and verify over
    /// the four shifted grids, OR-ing the verified matches together
    fn run(
        &mut self,
        points1: &[(f64, f64)],
        points2: &[(f64, f64)],
        matches: &[Match],
        rotation: &[usize; 9],
        threshold_factor: f64,
    ) -> Vec<bool> {
        let mut inliers = vec![false; matches.len()];

        for shift in 0..4 {
            self.assign_match_pairs(points1, points2, matches, shift);
            self.verify_cell_pairs(rotation, threshold_factor);

            for (i, cells) in self.match_cells.iter().enumerate() {
                if let Some((left, right)) = cells {
                    if self.cell_pairs[*left] == Some(*right) {
                        inliers[i] = true;
                    }
                }
            }
        }

        inliers
    }

    /// Bucket every match into its (left cell, right cell) pair and count
    /// votes; `shift` selects one of the four half-cell left-grid offsets
    fn assign_match_pairs(
        &mut self,
        points1: &[(f64, f64)],
        points2: &[(f64, f64)],
        matches: &[Match],
        shift: usize,
    ) {
        self.motion_statistics.fill(0);
        self.points_per_cell.fill(0);
        self.match_cells.clear();

        let right_count = self.right_cols * self.right_rows;

        for m in matches {
            let left = left_cell_index(points1[m.query_idx], shift);
            let right = self.right_cell_index(points2[m.train_idx]);

            let cells = match (left, right) {
                (Some(l), Some(r)) => {
                    self.motion_statistics[l * right_count + r] += 1;
                    self.points_per_cell[l] += 1;
                    Some((l, r))
                }
                _ => None,
            };
            self.match_cells.push(cells);
        }
    }

    /// Accept each populated left cell's best right cell when the 3x3
    /// neighborhood score beats `factor * sqrt(mean points per cell)`
    fn verify_cell_pairs(&mut self, rotation: &[usize; 9], threshold_factor: f64) {
        let right_count = self.right_cols * self.right_rows;

        for left in 0..GRID_COLS * GRID_ROWS {
            self.cell_pairs[left] = None;
            if self.points_per_cell[left] == 0 {
                continue;
            }

            let mut best_right = 0;
            let mut best_votes = 0;
            for right in 0..right_count {
                let votes = self.motion_statistics[left * right_count + right];
                if votes > best_votes {
                    best_votes = votes;
                    best_right = right;
                }
            }
            if best_votes == 0 {
                continue;
            }

            let nb_left = neighbor_cells(left, GRID_COLS, GRID_ROWS);
            let nb_right = neighbor_cells(best_right, self.right_cols, self.right_rows);

            let mut score = 0u32;
            let mut point_sum = 0u32;
            let mut cell_count = 0u32;

            for k in 0..9 {
                let (ll, rr) = match (nb_left[k], nb_right[rotation[k]]) {
                    (Some(ll), Some(rr)) => (ll, rr),
                    _ => continue,
                };
                score += self.motion_statistics[ll * right_count + rr];
                point_sum += self.points_per_cell[ll];
                cell_count += 1;
            }

            let threshold = threshold_factor * (point_sum as f64 / cell_count as f64).sqrt();
            if (score as f64) >= threshold {
                self.cell_pairs[left] = Some(best_right);
            }
        }
    }

    fn right_cell_index(&self, pt: (f64, f64)) -> Option<usize> {
        let x = (pt.0 * self.right_cols as f64).floor();
        let y = (pt.1 * self.right_rows as f64).floor();
        if x < 0.0 || y < 0.0 || x >= self.right_cols as f64 || y >= self.right_rows as f64 {
            return None;
        }
        Some(y as usize * self.right_cols + x as usize)
    }
}

/// Left grid cell under one of the four half-cell shifts (x, y, both)
fn left_cell_index(pt: (f64, f64), shift: usize) -> Option<usize> {
    let dx = if shift & 1 != 0 { 0.5 } else { 0.0 };
    let dy = if shift & 2 != 0 { 0.5 } else { 0.0 };
    let x = (pt.0 * GRID_COLS as f64 + dx).floor();
    let y = (pt.1 * GRID_ROWS as f64 + dy).floor();
    if x < 0.0 || y < 0.0 || x >= GRID_COLS as f64 || y >= GRID_ROWS as f64 {
        return None;
    }
    Some(y as usize * GRID_COLS + x as usize)
}

/// 3x3 neighborhood of a cell in row-major order, `None` off the grid
fn neighbor_cells(idx: usize, cols: usize, rows: usize) -> [Option<usize>; 9] {
    let x = (idx % cols) as i64;
    let y = (idx / cols) as i64;
    let mut nb = [None; 9];
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            let nx = x + dx;
            let ny = y + dy;
            let k = ((dy + 1) * 3 + dx + 1) as usize;
            if nx >= 0 && ny >= 0 && nx < cols as i64 && ny < rows as i64 {
                nb[k] = Some(ny as usize * cols + nx as usize);
            }
        }
    }
    nb
}
