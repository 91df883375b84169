//! Closed-form least-squares fits over small monthly series (at most 24
//! points), explicit rather than pulled from a model-training crate.

/// Linear fit result: `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Quadratic fit result: `y = a * x^2 + b * x + c`.
#[derive(Debug, Clone, Copy)]
pub struct QuadraticFit {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub r_squared: f64,
}

impl QuadraticFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.a * x * x + self.b * x + self.c
    }
}

fn r_squared(ys: &[f64], predicted: impl Fn(usize) -> f64) -> f64 {
    let n = ys.len() as f64;
    let mean = ys.iter().sum::<f64>() / n;
    let ss_tot: f64 = ys.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = ys
        .iter()
        .enumerate()
        .map(|(i, y)| (y - predicted(i)).powi(2))
        .sum();

    if ss_tot > 0.0 {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    } else {
        // constant series: the fit reproduces it exactly or not at all
        if ss_res < 1e-9 {
            1.0
        } else {
            0.0
        }
    }
}

/// Ordinary least squares over `(i, ys[i])` with `i = 0..n-1`.
/// Degenerates to a flat line through the mean when n < 2.
pub fn linear_fit(ys: &[f64]) -> LinearFit {
    let n = ys.len() as f64;
    if ys.len() < 2 {
        return LinearFit {
            slope: 0.0,
            intercept: ys.first().copied().unwrap_or(0.0),
            r_squared: 0.0,
        };
    }

    let sum_x: f64 = (0..ys.len()).map(|i| i as f64).sum();
    let sum_y: f64 = ys.iter().sum();
    let sum_xx: f64 = (0..ys.len()).map(|i| (i as f64).powi(2)).sum();
    let sum_xy: f64 = ys.iter().enumerate().map(|(i, y)| i as f64 * y).sum();

    let denom = n * sum_xx - sum_x * sum_x;
    if denom.abs() < f64::EPSILON {
        return LinearFit {
            slope: 0.0,
            intercept: sum_y / n,
            r_squared: 0.0,
        };
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;
    let fit = LinearFit {
        slope,
        intercept,
        r_squared: 0.0,
    };
    let r2 = r_squared(ys, |i| fit.predict(i as f64));

    LinearFit { r_squared: r2, ..fit }
}

/// Degree-2 polynomial fit via the normal equations, solved with Cramer's
/// rule on the 3x3 system. Falls back to the linear fit when the system is
/// singular or there are fewer than 3 points.
pub fn quadratic_fit(ys: &[f64]) -> QuadraticFit {
    if ys.len() < 3 {
        let lin = linear_fit(ys);
        return QuadraticFit {
            a: 0.0,
            b: lin.slope,
            c: lin.intercept,
            r_squared: lin.r_squared,
        };
    }

    let n = ys.len() as f64;
    let (mut s1, mut s2, mut s3, mut s4) = (0.0, 0.0, 0.0, 0.0);
    let (mut sy, mut sxy, mut sxxy) = (0.0, 0.0, 0.0);
    for (i, &y) in ys.iter().enumerate() {
        let x = i as f64;
        s1 += x;
        s2 += x * x;
        s3 += x * x * x;
        s4 += x * x * x * x;
        sy += y;
        sxy += x * y;
        sxxy += x * x * y;
    }

    // normal equations, rows ordered [x^2, x, 1] . [a, b, c]^T
    let det3 = |m: [[f64; 3]; 3]| -> f64 {
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    };

    let m = [[s4, s3, s2], [s3, s2, s1], [s2, s1, n]];
    let det = det3(m);
    if det.abs() < 1e-9 {
        let lin = linear_fit(ys);
        return QuadraticFit {
            a: 0.0,
            b: lin.slope,
            c: lin.intercept,
            r_squared: lin.r_squared,
        };
    }

    let rhs = [sxxy, sxy, sy];
    let col = |j: usize| {
        let mut mm = m;
        for (row, &v) in mm.iter_mut().zip(rhs.iter()) {
            row[j] = v;
        }
        det3(mm) / det
    };

    let (a, b, c) = (col(0), col(1), col(2));
    let fit = QuadraticFit {
        a,
        b,
        c,
        r_squared: 0.0,
    };
    let r2 = r_squared(ys, |i| fit.predict(i as f64));

    QuadraticFit { r_squared: r2, ..fit }
}
