//! Regular grids of per-label weights.
//!
//! A [`Grid`] stores, for every grid corner, one weight per label. Corners are
//! addressed either by their integer coordinates or by a row-major linear
//! index in which axis `0` varies slowest. The grid also carries the affine
//! map from grid coordinates to world coordinates used when boundary
//! geometry is emitted.

use crate::geometry::point::Point;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised while building or preprocessing a [`Grid`].
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GridError {
    /// An axis has fewer than two samples, so the grid has no cells.
    #[error("Invalid resolution {resolution} along axis {axis}: need at least 2 samples")]
    InvalidResolution {
        /// The offending axis.
        axis: usize,
        /// Its resolution.
        resolution: usize,
    },
    /// The sample buffer length does not match `corners * labels`.
    #[error("Expected {expected} samples, got {actual}")]
    SampleCountMismatch {
        /// `corner_count * label_count`.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },
    /// Fewer than two labels were supplied.
    #[error("At least 2 labels are required, got {label_count}")]
    LabelCountTooSmall {
        /// The supplied label count.
        label_count: usize,
    },
    /// A sample is NaN or infinite.
    #[error("Non-finite sample {value} at corner {corner}, label {label}")]
    NonFiniteSample {
        /// Linear corner index.
        corner: usize,
        /// Label index.
        label: usize,
        /// The offending value.
        value: f64,
    },
    /// A corner has no positive weight and cannot be normalized.
    #[error("Corner {corner} has no positive weight to normalize")]
    ZeroWeightSum {
        /// Linear corner index.
        corner: usize,
    },
    /// A corner coordinate is outside the grid.
    #[error("Corner index {index} out of range along axis {axis} (resolution {resolution})")]
    CornerOutOfRange {
        /// The offending axis.
        axis: usize,
        /// The offending index.
        index: usize,
        /// The resolution it was checked against.
        resolution: usize,
    },
    /// A label index is not below the label count.
    #[error("Label {label} out of range for {label_count} labels")]
    LabelOutOfRange {
        /// The requested label.
        label: usize,
        /// Number of labels in the grid.
        label_count: usize,
    },
    /// The jitter magnitude is NaN or infinite.
    #[error("Invalid jitter magnitude {magnitude}")]
    InvalidJitterMagnitude {
        /// The rejected magnitude.
        magnitude: f64,
    },
}

// =============================================================================
// GRID TRANSFORM
// =============================================================================

/// Affine map `x -> A x + t` from grid coordinates to world coordinates.
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::core::grid::GridTransform;
/// use multilabel_boundary::geometry::point::Point;
///
/// let t = GridTransform::new([[2.0, 0.0], [0.0, 3.0]], [1.0, -1.0]);
/// assert_eq!(t.apply(&Point::new([1.0, 1.0])), Point::new([3.0, 2.0]));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridTransform<const D: usize> {
    #[serde(with = "serde_matrix")]
    linear: [[f64; D]; D],
    #[serde(with = "serde_vector")]
    translation: [f64; D],
}

impl<const D: usize> GridTransform<D> {
    /// Creates the map from its linear part (row-major) and translation.
    #[must_use]
    pub const fn new(linear: [[f64; D]; D], translation: [f64; D]) -> Self {
        Self {
            linear,
            translation,
        }
    }

    /// The identity map.
    #[must_use]
    pub fn identity() -> Self {
        let mut linear = [[0.0; D]; D];
        for (i, row) in linear.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self::new(linear, [0.0; D])
    }

    /// Axis-aligned scaling followed by a translation.
    #[must_use]
    pub fn scale_translate(scale: [f64; D], translation: [f64; D]) -> Self {
        let mut linear = [[0.0; D]; D];
        for (i, row) in linear.iter_mut().enumerate() {
            row[i] = scale[i];
        }
        Self::new(linear, translation)
    }

    /// The linear part.
    #[must_use]
    pub const fn linear(&self) -> &[[f64; D]; D] {
        &self.linear
    }

    /// The translation.
    #[must_use]
    pub const fn translation(&self) -> &[f64; D] {
        &self.translation
    }

    /// Maps a grid-space point to world space.
    #[must_use]
    pub fn apply(&self, p: &Point<D>) -> Point<D> {
        let mut out = self.translation;
        for (o, row) in out.iter_mut().zip(self.linear.iter()) {
            *o += row.iter().zip(p.coords().iter()).map(|(a, x)| a * x).sum::<f64>();
        }
        Point::new(out)
    }
}

impl<const D: usize> Default for GridTransform<D> {
    fn default() -> Self {
        Self::identity()
    }
}

// Serde has no const-generic array impls; arrays go through Vec.
mod serde_vector {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer, const D: usize>(v: &[f64; D], s: S) -> Result<S::Ok, S::Error> {
        v.as_slice().serialize(s)
    }

    pub fn deserialize<'de, DE: Deserializer<'de>, const D: usize>(
        d: DE,
    ) -> Result<[f64; D], DE::Error> {
        let v = Vec::<f64>::deserialize(d)?;
        let len = v.len();
        v.try_into()
            .map_err(|_| DE::Error::invalid_length(len, &"one entry per dimension"))
    }
}

mod serde_matrix {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer, const D: usize>(
        m: &[[f64; D]; D],
        s: S,
    ) -> Result<S::Ok, S::Error> {
        let rows: Vec<&[f64]> = m.iter().map(<[f64; D]>::as_slice).collect();
        rows.serialize(s)
    }

    pub fn deserialize<'de, DE: Deserializer<'de>, const D: usize>(
        d: DE,
    ) -> Result<[[f64; D]; D], DE::Error> {
        let rows = Vec::<Vec<f64>>::deserialize(d)?;
        if rows.len() != D {
            return Err(DE::Error::invalid_length(rows.len(), &"one row per dimension"));
        }
        let mut out = [[0.0; D]; D];
        for (dst, row) in out.iter_mut().zip(rows) {
            let len = row.len();
            *dst = row
                .try_into()
                .map_err(|_| DE::Error::invalid_length(len, &"one entry per dimension"))?;
        }
        Ok(out)
    }
}

// =============================================================================
// GRID
// =============================================================================

/// Per-label weights sampled at the corners of a regular `D`-dimensional grid.
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::core::grid::Grid;
///
/// // 3x2 grid, two labels; label 0 on the left, label 1 on the right.
/// let grid = Grid::<2>::from_fn([3, 2], 2, |corner, label| {
///     let x = corner[1] as f64;
///     if label == 0 { 1.0 - x } else { x }
/// })
/// .unwrap();
/// assert_eq!(grid.corner_count(), 6);
/// assert_eq!(grid.cell_count(), 2);
/// assert_eq!(grid.values(grid.linearize(&[2, 1]).unwrap()), &[0.0, 1.0]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridRepr<D>")]
pub struct Grid<const D: usize> {
    #[serde(with = "serde_resolution")]
    resolution: [usize; D],
    label_count: usize,
    samples: Vec<f64>,
    transform: GridTransform<D>,
}

/// Unvalidated wire form of a [`Grid`]; deserialization goes through [`Grid::new`].
#[derive(Deserialize)]
struct GridRepr<const D: usize> {
    #[serde(with = "serde_resolution")]
    resolution: [usize; D],
    label_count: usize,
    samples: Vec<f64>,
    #[serde(default)]
    transform: GridTransform<D>,
}

impl<const D: usize> TryFrom<GridRepr<D>> for Grid<D> {
    type Error = GridError;

    fn try_from(repr: GridRepr<D>) -> Result<Self, Self::Error> {
        Ok(Self::new(repr.resolution, repr.label_count, repr.samples)?.with_transform(repr.transform))
    }
}

mod serde_resolution {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer, const D: usize>(
        v: &[usize; D],
        s: S,
    ) -> Result<S::Ok, S::Error> {
        v.as_slice().serialize(s)
    }

    pub fn deserialize<'de, DE: Deserializer<'de>, const D: usize>(
        d: DE,
    ) -> Result<[usize; D], DE::Error> {
        let v = Vec::<usize>::deserialize(d)?;
        let len = v.len();
        v.try_into()
            .map_err(|_| DE::Error::invalid_length(len, &"one entry per axis"))
    }
}

impl<const D: usize> Grid<D> {
    /// Builds a grid from corner-major samples: the weights of corner `c` are
    /// `samples[c * label_count .. (c + 1) * label_count]`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidResolution`], [`GridError::LabelCountTooSmall`],
    /// [`GridError::SampleCountMismatch`], or [`GridError::NonFiniteSample`].
    pub fn new(
        resolution: [usize; D],
        label_count: usize,
        samples: Vec<f64>,
    ) -> Result<Self, GridError> {
        for (axis, &r) in resolution.iter().enumerate() {
            if r < 2 {
                return Err(GridError::InvalidResolution {
                    axis,
                    resolution: r,
                });
            }
        }
        if label_count < 2 {
            return Err(GridError::LabelCountTooSmall { label_count });
        }
        let expected = resolution.iter().product::<usize>() * label_count;
        if samples.len() != expected {
            return Err(GridError::SampleCountMismatch {
                expected,
                actual: samples.len(),
            });
        }
        if let Some(i) = samples.iter().position(|v| !v.is_finite()) {
            return Err(GridError::NonFiniteSample {
                corner: i / label_count,
                label: i % label_count,
                value: samples[i],
            });
        }
        Ok(Self {
            resolution,
            label_count,
            samples,
            transform: GridTransform::identity(),
        })
    }

    /// Builds a grid by evaluating `f(corner, label)` at every corner.
    ///
    /// # Errors
    ///
    /// Same as [`Grid::new`].
    pub fn from_fn<F>(resolution: [usize; D], label_count: usize, mut f: F) -> Result<Self, GridError>
    where
        F: FnMut([usize; D], usize) -> f64,
    {
        let corners: usize = resolution.iter().product();
        let mut samples = Vec::with_capacity(corners * label_count);
        for linear in 0..corners {
            let corner = delinearize_with(&resolution, linear);
            for label in 0..label_count {
                samples.push(f(corner, label));
            }
        }
        Self::new(resolution, label_count, samples)
    }

    /// Replaces the grid-to-world transform.
    #[must_use]
    pub const fn with_transform(mut self, transform: GridTransform<D>) -> Self {
        self.transform = transform;
        self
    }

    /// Samples per axis.
    #[must_use]
    pub const fn resolution(&self) -> &[usize; D] {
        &self.resolution
    }

    /// Number of labels.
    #[must_use]
    pub const fn label_count(&self) -> usize {
        self.label_count
    }

    /// Number of grid corners.
    #[must_use]
    pub fn corner_count(&self) -> usize {
        self.resolution.iter().product()
    }

    /// Number of grid cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.resolution.iter().map(|r| r - 1).product()
    }

    /// The grid-to-world transform.
    #[must_use]
    pub const fn transform(&self) -> &GridTransform<D> {
        &self.transform
    }

    /// Maps a grid-space position to world space.
    #[must_use]
    pub fn to_world(&self, p: &Point<D>) -> Point<D> {
        self.transform.apply(p)
    }

    /// Row-major linear index of a corner; axis `0` varies slowest.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CornerOutOfRange`] if any coordinate is outside the grid.
    pub fn linearize(&self, corner: &[usize; D]) -> Result<usize, GridError> {
        let mut index = 0;
        for (axis, (&c, &r)) in corner.iter().zip(self.resolution.iter()).enumerate() {
            if c >= r {
                return Err(GridError::CornerOutOfRange {
                    axis,
                    index: c,
                    resolution: r,
                });
            }
            index = index * r + c;
        }
        Ok(index)
    }

    /// The label weights at a corner, by linear index.
    ///
    /// # Panics
    ///
    /// Panics if `corner` is not below [`Grid::corner_count`].
    #[must_use]
    pub fn values(&self, corner: usize) -> &[f64] {
        let start = corner * self.label_count;
        &self.samples[start..start + self.label_count]
    }

    /// One label's weight at a corner, by linear index.
    ///
    /// # Panics
    ///
    /// Panics if `corner` or `label` is out of range.
    #[must_use]
    pub fn value(&self, corner: usize, label: usize) -> f64 {
        self.values(corner)[label]
    }

    /// All samples, corner-major.
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Iterates over corner coordinates in linear-index order.
    pub fn corners(&self) -> impl Iterator<Item = [usize; D]> + '_ {
        (0..self.corner_count()).map(|i| delinearize_with(&self.resolution, i))
    }

    /// Iterates over cell origins (the corner with the smallest coordinates of
    /// each cell) in row-major order, axis `0` slowest.
    pub fn cells(&self) -> impl Iterator<Item = [usize; D]> + '_ {
        let cell_resolution = self.resolution.map(|r| r - 1);
        (0..self.cell_count()).map(move |i| delinearize_with(&cell_resolution, i))
    }

    // =========================================================================
    // PREPROCESSING
    // =========================================================================

    /// Clamps negative weights to zero and rescales each corner to sum to one.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ZeroWeightSum`] for the first corner with no
    /// positive weight. The grid is left unchanged in that case.
    pub fn normalize_weights(&mut self) -> Result<(), GridError> {
        let labels = self.label_count;
        let mut clamped = 0usize;
        for (corner, chunk) in self.samples.chunks(labels).enumerate() {
            if !chunk.iter().any(|&v| v > 0.0) {
                tracing::warn!(corner, "corner has no positive label weight");
                return Err(GridError::ZeroWeightSum { corner });
            }
        }
        for chunk in self.samples.chunks_mut(labels) {
            let mut sum = 0.0;
            for v in chunk.iter_mut() {
                if *v < 0.0 {
                    *v = 0.0;
                    clamped += 1;
                }
                sum += *v;
            }
            for v in chunk.iter_mut() {
                *v /= sum;
            }
        }
        if clamped > 0 {
            tracing::warn!(clamped, "clamped negative label weights to zero");
        }
        Ok(())
    }

    /// Adds seeded uniform noise in `[-|magnitude|, |magnitude|]` to every sample.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidJitterMagnitude`] for a non-finite magnitude.
    pub fn jitter(&mut self, magnitude: f64, seed: u64) -> Result<(), GridError> {
        if !magnitude.is_finite() {
            return Err(GridError::InvalidJitterMagnitude { magnitude });
        }
        let m = magnitude.abs();
        if m == 0.0 {
            return Ok(());
        }
        let mut rng = StdRng::seed_from_u64(seed);
        for v in &mut self.samples {
            *v += rng.random_range(-m..=m);
        }
        Ok(())
    }

    /// One pass of the separable `[1/4, 1/2, 1/4]` filter along every axis.
    ///
    /// At the grid border the taps that fall outside are dropped and the
    /// remaining weights renormalized.
    #[must_use]
    pub fn smoothed(&self) -> Self {
        const TAPS: [f64; 3] = [0.25, 0.5, 0.25];
        let labels = self.label_count;
        let mut current = self.samples.clone();
        let mut next = vec![0.0; current.len()];

        for axis in 0..D {
            let stride: usize = self.resolution[axis + 1..].iter().product();
            let r = self.resolution[axis];
            for (linear, corner) in self.corners().enumerate() {
                let c = corner[axis];
                let mut weight = 0.0;
                let dst = &mut next[linear * labels..(linear + 1) * labels];
                dst.fill(0.0);
                for (tap, &w) in TAPS.iter().enumerate() {
                    // tap 0 is the lower neighbor, tap 2 the upper one
                    let neighbor = match tap {
                        0 if c > 0 => linear - stride,
                        1 => linear,
                        2 if c + 1 < r => linear + stride,
                        _ => continue,
                    };
                    weight += w;
                    let src = &current[neighbor * labels..(neighbor + 1) * labels];
                    for (d, s) in dst.iter_mut().zip(src) {
                        *d += w * s;
                    }
                }
                for d in dst.iter_mut() {
                    *d /= weight;
                }
            }
            std::mem::swap(&mut current, &mut next);
        }

        Self {
            resolution: self.resolution,
            label_count: labels,
            samples: current,
            transform: self.transform,
        }
    }

    /// Index of the largest weight at every corner; ties go to the lowest label.
    #[must_use]
    pub fn discretize(&self) -> Vec<usize> {
        self.samples
            .chunks(self.label_count)
            .map(|chunk| {
                let mut best = 0;
                for (label, &v) in chunk.iter().enumerate().skip(1) {
                    if v > chunk[best] {
                        best = label;
                    }
                }
                best
            })
            .collect()
    }

    /// The scalar field of one label, in linear corner order.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::LabelOutOfRange`] if `label` is not below the label count.
    pub fn extract_label(&self, label: usize) -> Result<Vec<f64>, GridError> {
        if label >= self.label_count {
            return Err(GridError::LabelOutOfRange {
                label,
                label_count: self.label_count,
            });
        }
        Ok(self
            .samples
            .chunks(self.label_count)
            .map(|chunk| chunk[label])
            .collect())
    }
}

fn delinearize_with<const D: usize>(resolution: &[usize; D], mut index: usize) -> [usize; D] {
    let mut corner = [0; D];
    for axis in (0..D).rev() {
        corner[axis] = index % resolution[axis];
        index /= resolution[axis];
    }
    corner
}
