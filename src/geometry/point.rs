//! Data and operations on d-dimensional points.
//!
//! Points are plain `f64` value types. They are used for grid-space positions,
//! dual points of affine functions, and hull input alike, so the arithmetic
//! helpers here are deliberately small: sums, differences, scaling, dot
//! products and centroids.

use serde::de::{Error, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Index, Mul, Sub};
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur when validating point coordinates.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PointValidationError {
    /// A coordinate is NaN or infinite.
    #[error("Invalid coordinate at index {coordinate_index} in dimension {dimension}: {coordinate_value}")]
    NonFiniteCoordinate {
        /// Index of the offending coordinate.
        coordinate_index: usize,
        /// The offending value.
        coordinate_value: f64,
        /// Dimension of the point.
        dimension: usize,
    },
}

// =============================================================================
// POINT STRUCT DEFINITION
// =============================================================================

/// The [Point] struct represents a point in a D-dimensional space with `f64`
/// coordinates.
///
/// Points are immutable once created; the coordinate array is private and
/// exposed read-only through [`Point::coords`].
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::geometry::point::Point;
///
/// let p = Point::new([1.0, 2.0]);
/// assert_eq!(p.coords(), &[1.0, 2.0]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<const D: usize> {
    coords: [f64; D],
}

// =============================================================================
// PUBLIC API
// =============================================================================

impl<const D: usize> Point<D> {
    /// Creates a point from its coordinates.
    #[inline]
    #[must_use]
    pub const fn new(coords: [f64; D]) -> Self {
        Self { coords }
    }

    /// The origin of `R^D`.
    #[inline]
    #[must_use]
    pub const fn origin() -> Self {
        Self { coords: [0.0; D] }
    }

    /// Returns a reference to the point's coordinates.
    #[inline]
    #[must_use]
    pub const fn coords(&self) -> &[f64; D] {
        &self.coords
    }

    /// Returns the coordinates by value.
    #[inline]
    #[must_use]
    pub const fn to_array(&self) -> [f64; D] {
        self.coords
    }

    /// Returns the coordinate at `index`, or `None` when out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.coords.get(index).copied()
    }

    /// The dimension of the point.
    #[inline]
    #[must_use]
    pub const fn dim(&self) -> usize {
        D
    }

    /// Checks that every coordinate is finite.
    ///
    /// # Errors
    ///
    /// Returns [`PointValidationError::NonFiniteCoordinate`] for the first NaN or
    /// infinite coordinate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use multilabel_boundary::geometry::point::Point;
    ///
    /// assert!(Point::new([1.0, 2.0]).validate().is_ok());
    /// assert!(Point::new([f64::NAN, 2.0]).validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), PointValidationError> {
        for (index, &coord) in self.coords.iter().enumerate() {
            if !coord.is_finite() {
                return Err(PointValidationError::NonFiniteCoordinate {
                    coordinate_index: index,
                    coordinate_value: coord,
                    dimension: D,
                });
            }
        }
        Ok(())
    }

    /// Dot product of the two coordinate vectors.
    #[inline]
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Squared Euclidean norm.
    #[inline]
    #[must_use]
    pub fn squared_norm(&self) -> f64 {
        self.dot(self)
    }

    /// Centroid of a non-empty set of points; the origin for an empty slice.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use multilabel_boundary::geometry::point::Point;
    ///
    /// let c = Point::centroid(&[Point::new([0.0, 0.0]), Point::new([2.0, 4.0])]);
    /// assert_eq!(c, Point::new([1.0, 2.0]));
    /// ```
    #[must_use]
    pub fn centroid(points: &[Self]) -> Self {
        Self::centroid_of(points.iter())
    }

    /// Centroid of the points yielded by an iterator of references.
    #[must_use]
    pub fn centroid_of<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let mut sum = [0.0; D];
        let mut count = 0usize;
        for p in points {
            for (s, c) in sum.iter_mut().zip(p.coords.iter()) {
                *s += c;
            }
            count += 1;
        }
        if count == 0 {
            return Self::origin();
        }
        #[expect(clippy::cast_precision_loss, reason = "point counts are small")]
        let inv = 1.0 / count as f64;
        Self::new(sum.map(|s| s * inv))
    }
}

// =============================================================================
// STANDARD TRAIT IMPLEMENTATIONS
// =============================================================================

impl<const D: usize> Default for Point<D> {
    fn default() -> Self {
        Self::origin()
    }
}

impl<const D: usize> Index<usize> for Point<D> {
    type Output = f64;

    #[inline]
    fn index(&self, index: usize) -> &f64 {
        &self.coords[index]
    }
}

impl<const D: usize> Add for Point<D> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        let mut coords = self.coords;
        for (c, r) in coords.iter_mut().zip(rhs.coords.iter()) {
            *c += r;
        }
        Self::new(coords)
    }
}

impl<const D: usize> Sub for Point<D> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        let mut coords = self.coords;
        for (c, r) in coords.iter_mut().zip(rhs.coords.iter()) {
            *c -= r;
        }
        Self::new(coords)
    }
}

impl<const D: usize> Mul<f64> for Point<D> {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.coords.map(|c| c * rhs))
    }
}

impl<const D: usize> From<[f64; D]> for Point<D> {
    #[inline]
    fn from(coords: [f64; D]) -> Self {
        Self::new(coords)
    }
}

impl<const D: usize> From<Point<D>> for [f64; D] {
    #[inline]
    fn from(point: Point<D>) -> [f64; D] {
        point.coords
    }
}

impl<const D: usize> fmt::Display for Point<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.coords.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, ")")
    }
}

// Serde has no const-generic array impls, so points serialize as fixed-size tuples.
impl<const D: usize> Serialize for Point<D> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeTuple;
        let mut tuple = serializer.serialize_tuple(D)?;
        for coord in &self.coords {
            if coord.is_finite() {
                tuple.serialize_element(coord)?;
            } else {
                // JSON has no representation for non-finite numbers
                tuple.serialize_element(&Option::<f64>::None)?;
            }
        }
        tuple.end()
    }
}

impl<'de, const D: usize> Deserialize<'de> for Point<D> {
    fn deserialize<DE>(deserializer: DE) -> Result<Self, DE::Error>
    where
        DE: serde::Deserializer<'de>,
    {
        struct ArrayVisitor<const D: usize>;

        impl<'de, const D: usize> Visitor<'de> for ArrayVisitor<D> {
            type Value = Point<D>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_fmt(format_args!("an array of {D} coordinates (numbers or null)"))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut coords = [0.0; D];
                for (i, slot) in coords.iter_mut().enumerate() {
                    let element: Option<f64> = seq
                        .next_element()?
                        .ok_or_else(|| Error::invalid_length(i, &self))?;
                    *slot = element.unwrap_or(f64::NAN);
                }
                Ok(Point::new(coords))
            }
        }

        deserializer.deserialize_tuple(D, ArrayVisitor::<D>)
    }
}
