//! Real root solvers for quadratic, cubic and quartic polynomials.
//!
//! All solvers work in `f64` and return real roots in ascending order.
//! Quartic roots are polished with a fixed number of Newton steps; if the
//! polish does not converge the closed-form estimate is kept as a best
//! effort root.

use arrayvec::ArrayVec;

/// Up to four real roots, sorted ascending.
pub type Roots = ArrayVec<f64, 4>;

const NEAR_ZERO: f64 = 1.0e-12;
const NEWTON_ITERATIONS: usize = 8;

fn sorted(mut roots: Roots) -> Roots {
    roots.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    roots
}

/// Solve `a*x^2 + b*x + c = 0`.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Roots {
    let mut roots = Roots::new();

    if a.abs() < NEAR_ZERO {
        if b.abs() >= NEAR_ZERO {
            roots.push(-c / b);
        }
        return roots;
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return roots;
    }

    if discriminant == 0.0 {
        roots.push(-0.5 * b / a);
        return roots;
    }

    // Numerically stable form, avoids cancellation when b^2 >> 4ac
    let q = -0.5 * (b + b.signum() * discriminant.sqrt());
    roots.push(q / a);
    if q != 0.0 {
        roots.push(c / q);
    } else {
        roots.push(-q / a);
    }

    sorted(roots)
}

/// Solve `x^3 + a*x^2 + b*x + c = 0` (monic cubic).
pub fn solve_cubic_normalized(a: f64, b: f64, c: f64) -> Roots {
    let mut roots = Roots::new();
    let shift = a / 3.0;

    // Depressed cubic t^3 + p*t + q with x = t - a/3
    let p = b - a * a / 3.0;
    let q = 2.0 * a * a * a / 27.0 - a * b / 3.0 + c;

    let half_q = q / 2.0;
    let third_p = p / 3.0;
    let discriminant = half_q * half_q + third_p * third_p * third_p;

    if p.abs() < NEAR_ZERO && q.abs() < NEAR_ZERO {
        roots.push(-shift);
    } else if discriminant > 0.0 {
        let sqrt_d = discriminant.sqrt();
        let t = (-half_q + sqrt_d).cbrt() + (-half_q - sqrt_d).cbrt();
        roots.push(t - shift);
    } else {
        // Three real roots, trigonometric form (p < 0 here)
        let r = (-third_p).sqrt();
        let cos_arg = (-half_q / (r * r * r)).clamp(-1.0, 1.0);
        let phi = cos_arg.acos() / 3.0;
        for k in 0..3 {
            let angle = phi - 2.0 * std::f64::consts::PI * k as f64 / 3.0;
            roots.push(2.0 * r * angle.cos() - shift);
        }
    }

    sorted(roots)
}

/// Solve `a*x^3 + b*x^2 + c*x + d = 0`.
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> Roots {
    if a.abs() < NEAR_ZERO {
        return solve_quadratic(b, c, d);
    }
    solve_cubic_normalized(b / a, c / a, d / a)
}

/// Evaluate a polynomial given coefficients from the highest degree down.
pub fn evaluate(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().fold(0.0, |acc, &k| acc * x + k)
}

fn evaluate_derivative(coefficients: &[f64], x: f64) -> f64 {
    let degree = coefficients.len().saturating_sub(1);
    coefficients
        .iter()
        .take(degree)
        .enumerate()
        .fold(0.0, |acc, (i, &k)| acc * x + k * (degree - i) as f64)
}

/// Refine a root estimate with a fixed budget of Newton steps.
pub fn polish_root(coefficients: &[f64], mut x: f64) -> f64 {
    for _ in 0..NEWTON_ITERATIONS {
        let f = evaluate(coefficients, x);
        let df = evaluate_derivative(coefficients, x);
        if df.abs() < NEAR_ZERO {
            break;
        }
        let step = f / df;
        x -= step;
        if step.abs() < 1.0e-12 * x.abs().max(1.0) {
            break;
        }
    }
    x
}

/// Solve `a*x^4 + b*x^3 + c*x^2 + d*x + e = 0` with Ferrari's method.
pub fn solve_quartic(a: f64, b: f64, c: f64, d: f64, e: f64) -> Roots {
    if a.abs() < NEAR_ZERO {
        return solve_cubic(b, c, d, e);
    }

    let (b, c, d, e) = (b / a, c / a, d / a, e / a);
    let shift = b / 4.0;

    // Depressed quartic y^4 + p*y^2 + q*y + r with x = y - b/4
    let b2 = b * b;
    let p = c - 3.0 * b2 / 8.0;
    let q = d - b * c / 2.0 + b2 * b / 8.0;
    let r = e - b * d / 4.0 + b2 * c / 16.0 - 3.0 * b2 * b2 / 256.0;

    let mut depressed = Roots::new();

    if q.abs() < NEAR_ZERO {
        // Biquadratic: z^2 + p*z + r with z = y^2
        for z in solve_quadratic(1.0, p, r) {
            if z > 0.0 {
                let y = z.sqrt();
                depressed.push(-y);
                depressed.push(y);
            } else if z.abs() < NEAR_ZERO && !depressed.contains(&0.0) {
                depressed.push(0.0);
            }
        }
    } else {
        // Resolvent cubic m^3 + p*m^2 + (p^2/4 - r)*m - q^2/8 has a positive root
        let resolvent = solve_cubic_normalized(p, p * p / 4.0 - r, -q * q / 8.0);
        let m = match resolvent.last() {
            Some(&m) if m > 0.0 => m,
            _ => return Roots::new(),
        };

        let s = (2.0 * m).sqrt();
        let t = q / (2.0 * s);
        for y in solve_quadratic(1.0, s, p / 2.0 + m - t) {
            depressed.push(y);
        }
        for y in solve_quadratic(1.0, -s, p / 2.0 + m + t) {
            if !depressed.is_full() {
                depressed.push(y);
            }
        }
    }

    let coefficients = [1.0, b, c, d, e];
    let roots: Roots = depressed
        .into_iter()
        .map(|y| polish_root(&coefficients, y - shift))
        .collect();

    sorted(roots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_quadratic_two_roots() {
        let roots = solve_quadratic(1.0, -3.0, 2.0);
        assert_eq!(roots.len(), 2);
        assert_abs_diff_eq!(roots[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(roots[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quadratic_no_roots() {
        assert!(solve_quadratic(1.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn test_quadratic_degenerates_to_linear() {
        let roots = solve_quadratic(0.0, 2.0, -4.0);
        assert_eq!(roots.as_slice(), &[2.0]);
    }

    #[test]
    fn test_cubic_three_roots() {
        // (x - 1)(x - 2)(x - 3)
        let roots = solve_cubic(1.0, -6.0, 11.0, -6.0);
        assert_eq!(roots.len(), 3);
        for (root, expected) in roots.iter().zip([1.0, 2.0, 3.0]) {
            assert_abs_diff_eq!(*root, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_cubic_one_root() {
        // x^3 - 8
        let roots = solve_cubic(1.0, 0.0, 0.0, -8.0);
        assert_eq!(roots.len(), 1);
        assert_abs_diff_eq!(roots[0], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_quartic_four_roots() {
        // (x - 1)(x + 1)(x - 2)(x + 3) = x^4 + x^3 - 7x^2 - x + 6
        let roots = solve_quartic(1.0, 1.0, -7.0, -1.0, 6.0);
        assert_eq!(roots.len(), 4);
        for (root, expected) in roots.iter().zip([-3.0, -1.0, 1.0, 2.0]) {
            assert_abs_diff_eq!(*root, expected, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_quartic_biquadratic() {
        // (x^2 - 1)(x^2 - 4)
        let roots = solve_quartic(1.0, 0.0, -5.0, 0.0, 4.0);
        assert_eq!(roots.len(), 4);
        for (root, expected) in roots.iter().zip([-2.0, -1.0, 1.0, 2.0]) {
            assert_abs_diff_eq!(*root, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_quartic_no_real_roots() {
        // x^4 + 1
        assert!(solve_quartic(1.0, 0.0, 0.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn test_roots_satisfy_polynomial() {
        let coefficients = [2.0, -3.0, -11.0, 7.0, 1.5];
        let roots = solve_quartic(2.0, -3.0, -11.0, 7.0, 1.5);
        assert!(!roots.is_empty());
        for root in roots {
            assert!(evaluate(&coefficients, root).abs() < 1e-7);
        }
    }
}
