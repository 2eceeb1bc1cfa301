//! Piecewise-linear lookup tables (engine torque against RPM and similar).

use crate::error::{TrError, TrResult};
use crate::numeric::ensure_finite;

/// Table of `(x, y)` points with strictly increasing `x`.
///
/// Evaluation interpolates linearly between points and holds the end values
/// outside the table.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<(f64, f64)>", into = "Vec<(f64, f64)>"))]
pub struct Curve {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Curve {
    pub fn new(points: Vec<(f64, f64)>) -> TrResult<Self> {
        if points.is_empty() {
            return Err(TrError::InvalidArg {
                what: "curve needs at least one point",
            });
        }
        let mut x = Vec::with_capacity(points.len());
        let mut y = Vec::with_capacity(points.len());
        for (px, py) in points {
            ensure_finite(px, "curve point x")?;
            ensure_finite(py, "curve point y")?;
            if let Some(&last) = x.last() {
                if px <= last {
                    return Err(TrError::InvalidArg {
                        what: "curve x values must be strictly increasing",
                    });
                }
            }
            x.push(px);
            y.push(py);
        }
        Ok(Self { x, y })
    }

    /// Constant curve.
    pub fn constant(value: f64) -> Self {
        Self {
            x: vec![0.0],
            y: vec![value],
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn max_y(&self) -> f64 {
        self.y.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn eval(&self, at: f64) -> f64 {
        let n = self.x.len();
        if at <= self.x[0] {
            return self.y[0];
        }
        if at >= self.x[n - 1] {
            return self.y[n - 1];
        }
        // first index with x > at; at least 1 and at most n-1 here
        let hi = self.x.partition_point(|&xi| xi <= at);
        let lo = hi - 1;
        let t = (at - self.x[lo]) / (self.x[hi] - self.x[lo]);
        self.y[lo] + t * (self.y[hi] - self.y[lo])
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

impl TryFrom<Vec<(f64, f64)>> for Curve {
    type Error = TrError;

    fn try_from(points: Vec<(f64, f64)>) -> TrResult<Self> {
        Curve::new(points)
    }
}

impl From<Curve> for Vec<(f64, f64)> {
    fn from(curve: Curve) -> Self {
        curve.points().collect()
    }
}
