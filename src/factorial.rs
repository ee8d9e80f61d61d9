//! Small helpers shared by `Polynomial` and `Observation` row-building: the
//! factorial ratios that show up when differentiating or integrating a
//! monomial, computed as running products so they never form an intermediate
//! factorial large enough to overflow.

/// `j! / (j-k)!` for `j >= k`, the coefficient scaling a `k`-th derivative of
/// `x^j` produces (`d^k/dx^k x^j = (j!/(j-k)!) x^(j-k)`). Returns `0.0` when
/// `j < k` (the term vanishes).
pub fn falling_factorial(j: usize, k: usize) -> f64 {
    if j < k {
        return 0.0;
    }
    let mut product = 1.0;
    for term in (j - k + 1)..=j {
        product *= term as f64;
    }
    product
}

/// `j! / (j+k)!` = `1 / ((j+1)(j+2)...(j+k))`, the coefficient scaling a
/// `k`-th indefinite integral of `x^j` produces.
pub fn rising_factorial_inverse(j: usize, k: usize) -> f64 {
    let mut product = 1.0;
    for term in (j + 1)..=(j + k) {
        product *= term as f64;
    }
    1.0 / product
}

/// `n!`, via a running product (`n` is always small here: an integration order).
pub fn factorial(n: usize) -> f64 {
    (1..=n).fold(1.0, |acc, term| acc * term as f64)
}
