/// Keep the inner value on one line when the outer struct is printed with
/// `{:#?}`.
pub(crate) struct NoPrettyPrint<T: std::fmt::Debug>(pub T);

impl<T: std::fmt::Debug> NoPrettyPrint<T> {
    pub const fn new(t: T) -> Self {
        Self(t)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for NoPrettyPrint<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Trapezoidal integral of `y` over the grid `x`.
#[cfg(test)]
pub(crate) fn trapz(y: &[f64], x: &[f64]) -> f64 {
    x.iter()
        .zip(x.iter().skip(1))
        .zip(y.iter().zip(y.iter().skip(1)))
        .map(|((x0, x1), (y0, y1))| (y1 + y0) * (x1 - x0) / 2.0)
        .sum()
}
