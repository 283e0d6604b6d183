//! Animatable values
//!
//! A property value is either a scalar or a fixed-width vector of
//! components (2 for position, 3 for color, ...). The shape of a value is
//! decided when it is built and checked once at spec construction; the
//! interpolation path never re-validates it.

use smallvec::SmallVec;

/// A scalar or fixed-width vector value driven by an animation.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Scalar(f64),
    Vector(SmallVec<[f64; 4]>),
}

impl Value {
    /// Number of vector components, or `None` for a scalar.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Value::Scalar(_) => None,
            Value::Vector(v) => Some(v.len()),
        }
    }

    /// Whether two values are both scalars, or vectors of the same width.
    pub fn same_shape(&self, other: &Value) -> bool {
        self.arity() == other.arity()
    }

    /// Interpolate toward `end` with an already-eased progress scalar.
    ///
    /// Eased progress outside `[0, 1]` (elastic/back overshoot) produces
    /// values outside the `[start, end]` range; no clamping is applied.
    /// Vector components all use the same eased scalar.
    pub fn lerp(&self, end: &Value, eased: f64) -> Value {
        debug_assert!(self.same_shape(end), "lerp on mismatched value shapes");
        match (self, end) {
            (Value::Scalar(a), Value::Scalar(b)) => Value::Scalar(a + (b - a) * eased),
            (Value::Vector(a), Value::Vector(b)) => Value::Vector(
                a.iter()
                    .zip(b.iter())
                    .map(|(s, e)| s + (e - s) * eased)
                    .collect(),
            ),
            // Mismatched shapes are rejected at spec construction.
            _ => self.clone(),
        }
    }

    /// The scalar payload, if this is a scalar value.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            Value::Vector(_) => None,
        }
    }

    /// The vector components, if this is a vector value.
    pub fn as_slice(&self) -> Option<&[f64]> {
        match self {
            Value::Scalar(_) => None,
            Value::Vector(v) => Some(v),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(v)
    }
}

impl From<(f64, f64)> for Value {
    fn from((x, y): (f64, f64)) -> Self {
        Value::Vector(SmallVec::from_slice(&[x, y]))
    }
}

impl From<(f64, f64, f64)> for Value {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Value::Vector(SmallVec::from_slice(&[x, y, z]))
    }
}

impl From<[f64; 2]> for Value {
    fn from(v: [f64; 2]) -> Self {
        Value::Vector(SmallVec::from_slice(&v))
    }
}

impl From<[f64; 3]> for Value {
    fn from(v: [f64; 3]) -> Self {
        Value::Vector(SmallVec::from_slice(&v))
    }
}

impl From<&[f64]> for Value {
    fn from(v: &[f64]) -> Self {
        Value::Vector(SmallVec::from_slice(v))
    }
}
