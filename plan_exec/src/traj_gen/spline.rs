//! Natural cubic spline interpolation.
//!
//! The spline passes through every knot, has continuous first and second derivatives, and has
//! zero curvature at both ends. Outside the knots it is extended as a straight line along the end
//! tangent.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{DMatrix, DVector};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,

    /// Second derivative at each knot
    m: Vec<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SplineError {
    #[error("A spline needs at least 2 knots, got {0}")]
    TooFewKnots(usize),

    #[error("Got {0} knot x values but {1} y values")]
    LengthMismatch(usize, usize),

    #[error("Knot {0} does not have an x greater than the previous knot")]
    NonIncreasing(usize),

    #[error("The spline equations are singular")]
    Singular,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CubicSpline {
    /// Fit a spline through the knots `(x[i], y[i])`. `x` must be strictly increasing.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, SplineError> {
        if x.len() != y.len() {
            return Err(SplineError::LengthMismatch(x.len(), y.len()));
        }
        if x.len() < 2 {
            return Err(SplineError::TooFewKnots(x.len()));
        }
        for i in 1..x.len() {
            // Also catches NaNs
            if !(x[i] > x[i - 1]) {
                return Err(SplineError::NonIncreasing(i));
            }
        }

        let n = x.len();
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

        // Tridiagonal system for the knot second derivatives. The first and last rows pin the
        // end curvature to zero.
        let mut a = DMatrix::<f64>::zeros(n, n);
        let mut b = DVector::<f64>::zeros(n);

        a[(0, 0)] = 1.0;
        a[(n - 1, n - 1)] = 1.0;

        for i in 1..n - 1 {
            a[(i, i - 1)] = h[i - 1];
            a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
            a[(i, i + 1)] = h[i];
            b[i] = 6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);
        }

        let m = a.lu().solve(&b).ok_or(SplineError::Singular)?;

        if m.iter().any(|v| !v.is_finite()) {
            return Err(SplineError::Singular);
        }

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            m: m.iter().cloned().collect(),
        })
    }

    /// Value of the spline at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.x.len();

        if x < self.x[0] {
            return self.y[0] + self.slope(0, self.x[0]) * (x - self.x[0]);
        }
        if x > self.x[n - 1] {
            return self.y[n - 1] + self.slope(n - 2, self.x[n - 1]) * (x - self.x[n - 1]);
        }

        let i = self.interval(x);
        let h = self.x[i + 1] - self.x[i];
        let to_end = self.x[i + 1] - x;
        let from_start = x - self.x[i];

        self.m[i] * to_end.powi(3) / (6.0 * h)
            + self.m[i + 1] * from_start.powi(3) / (6.0 * h)
            + (self.y[i] / h - self.m[i] * h / 6.0) * to_end
            + (self.y[i + 1] / h - self.m[i + 1] * h / 6.0) * from_start
    }

    /// Index of the interval `[x[i], x[i + 1]]` containing `x`.
    fn interval(&self, x: f64) -> usize {
        let i = self.x.partition_point(|&k| k <= x);
        i.saturating_sub(1).min(self.x.len() - 2)
    }

    /// First derivative of the piece on interval `i`, evaluated at `x`.
    fn slope(&self, i: usize, x: f64) -> f64 {
        let h = self.x[i + 1] - self.x[i];

        -self.m[i] * (self.x[i + 1] - x).powi(2) / (2.0 * h)
            + self.m[i + 1] * (x - self.x[i]).powi(2) / (2.0 * h)
            + (self.y[i + 1] - self.y[i]) / h
            - (self.m[i + 1] - self.m[i]) * h / 6.0
    }
}
