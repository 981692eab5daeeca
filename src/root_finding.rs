//! Bracketed root refinement

use crate::error::RootFindingError;

/// Root of a scalar function bracketed by `[a, b]`, found by Brent's method
///
/// `fa` and `fb` are the function values at the interval ends. They are taken from the caller
/// so an already tabulated function is not evaluated again, and so a periodic function can close
/// its bracket with the value at the period start. The bracket must contain a sign change, or
/// one of the ends must be an exact root, which is returned as is.
///
/// Iterations stop when the half-width of the current bracket is below
/// `(xtol + rtol * |x|) / 2`. The method mixes inverse quadratic extrapolation, secant
/// interpolation and bisection and never leaves the bracket.
pub fn brent<F>(
    f: F,
    (a, fa): (f64, f64),
    (b, fb): (f64, f64),
    xtol: f64,
    rtol: f64,
    max_iterations: u32,
) -> Result<f64, RootFindingError>
where
    F: Fn(f64) -> f64,
{
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if !(fa.is_finite() && fb.is_finite()) || fa.is_sign_negative() == fb.is_sign_negative() {
        return Err(RootFindingError::NotBracketed { a, fa, b, fb });
    }

    // `cur` is the best estimate, `blk` is the opposite end of the bracket, `pre` is the previous
    // estimate
    let (mut x_pre, mut f_pre) = (a, fa);
    let (mut x_cur, mut f_cur) = (b, fb);
    let (mut x_blk, mut f_blk) = (0.0, 0.0);
    let mut s_pre = 0.0;
    let mut s_cur = 0.0;

    for _ in 0..max_iterations {
        if f_pre != 0.0 && f_cur != 0.0 && f_pre.is_sign_negative() != f_cur.is_sign_negative() {
            x_blk = x_pre;
            f_blk = f_pre;
            s_cur = x_cur - x_pre;
            s_pre = s_cur;
        }
        if f_blk.abs() < f_cur.abs() {
            x_pre = x_cur;
            x_cur = x_blk;
            x_blk = x_pre;
            f_pre = f_cur;
            f_cur = f_blk;
            f_blk = f_pre;
        }

        let delta = 0.5 * (xtol + rtol * x_cur.abs());
        let s_bisect = 0.5 * (x_blk - x_cur);
        if f_cur == 0.0 || s_bisect.abs() < delta {
            return Ok(x_cur);
        }

        if s_pre.abs() > delta && f_cur.abs() < f_pre.abs() {
            let s_try = if x_pre == x_blk {
                // secant
                -f_cur * (x_cur - x_pre) / (f_cur - f_pre)
            } else {
                // inverse quadratic
                let d_pre = (f_pre - f_cur) / (x_pre - x_cur);
                let d_blk = (f_blk - f_cur) / (x_blk - x_cur);
                -f_cur * (f_blk * d_blk - f_pre * d_pre) / (d_blk * d_pre * (f_blk - f_pre))
            };
            if 2.0 * s_try.abs() < f64::min(s_pre.abs(), 3.0 * s_bisect.abs() - delta) {
                s_pre = s_cur;
                s_cur = s_try;
            } else {
                s_pre = s_bisect;
                s_cur = s_bisect;
            }
        } else {
            s_pre = s_bisect;
            s_cur = s_bisect;
        }

        x_pre = x_cur;
        f_pre = f_cur;
        if s_cur.abs() > delta {
            x_cur += s_cur;
        } else {
            x_cur += delta.copysign(s_bisect);
        }
        f_cur = f(x_cur);
    }

    Err(RootFindingError::NotConverged {
        iterations: max_iterations,
        x: x_cur,
    })
}
