use std::cmp;

/// Helper trait for computing minimum and maximum values of point attributes. Floating point types
/// use `PartialOrd`, so a NaN on the left hand side is kept while a NaN on the right hand side is ignored
pub trait MinMax {
    /// Computes the infimum (the minimum) of this value and `other`
    ///
    /// # Example
    /// ```
    /// use sline_core::math::MinMax;
    ///
    /// assert_eq!(5u16.infimum(&3u16), 3u16);
    /// assert_eq!(0.5f64.infimum(&-1.0), -1.0);
    /// ```
    fn infimum(&self, other: &Self) -> Self;
    /// Computes the supremum (the maximum) of this value and `other`
    fn supremum(&self, other: &Self) -> Self;
}

macro_rules! impl_minmax_for_ord_type {
    ($type:tt) => {
        impl MinMax for $type {
            fn infimum(&self, other: &Self) -> Self {
                cmp::min(*self, *other)
            }

            fn supremum(&self, other: &Self) -> Self {
                cmp::max(*self, *other)
            }
        }
    };
}

macro_rules! impl_minmax_for_float_type {
    ($type:tt) => {
        impl MinMax for $type {
            fn infimum(&self, other: &Self) -> Self {
                if *other < *self {
                    *other
                } else {
                    *self
                }
            }

            fn supremum(&self, other: &Self) -> Self {
                if *other > *self {
                    *other
                } else {
                    *self
                }
            }
        }
    };
}

impl_minmax_for_ord_type! {u8}
impl_minmax_for_ord_type! {u16}
impl_minmax_for_ord_type! {i32}
impl_minmax_for_ord_type! {usize}
impl_minmax_for_float_type! {f32}
impl_minmax_for_float_type! {f64}

/// Returns the minimum and maximum of all `values`, or `None` if there are no values
/// ```
/// # use sline_core::math::minmax;
/// assert_eq!(minmax([3.0, -2.0, 7.5]), Some((-2.0, 7.5)));
/// assert_eq!(minmax(Vec::<u16>::new()), None);
/// ```
pub fn minmax<T: MinMax + Copy, I: IntoIterator<Item = T>>(values: I) -> Option<(T, T)> {
    values.into_iter().fold(None, |acc, val| match acc {
        None => Some((val, val)),
        Some((old_min, old_max)) => Some((old_min.infimum(&val), old_max.supremum(&val))),
    })
}
