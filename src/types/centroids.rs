use crate::{ClusterCount, CreateCentroidsError, LengthOutOfRange, MAX_PIXELS};
use ordered_float::OrderedFloat;
use palette::{Srgb, cast};

/// Returns the composite ordering key `r * 65536 + g * 256 + b` of a centroid.
///
/// Centroids carry no identity between iterations. Sorting by this key after every
/// recomputation is what lines up index `i` of one iteration with index `i` of the next.
#[inline]
pub fn ordering_key([r, g, b]: [f64; 3]) -> f64 {
    r * 65536.0 + g * 256.0 + b
}

/// Round each channel of a mean to the nearest integer (ties to even) in `0..=255`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[inline]
fn round_mean(mean: [f64; 3]) -> Srgb<u8> {
    cast::from_array(mean.map(|c| c.round_ties_even().clamp(0.0, 255.0) as u8))
}

/// An ordered set of `k` cluster centroids.
///
/// Holds the floating point means and, index-aligned, their rounded 8-bit colors. The means are
/// always sorted in ascending order of their [`ordering_key`].
///
/// A [`CentroidSet`] is never mutated. Each iteration of [`Kmeans`](crate::kmeans::Kmeans) produces a
/// brand new set.
#[derive(Debug, Clone, PartialEq)]
pub struct CentroidSet {
    /// The number of centroids.
    k: ClusterCount,
    /// The floating point means, sorted by [`ordering_key`].
    means: Vec<[f64; 3]>,
    /// `means` rounded to 8-bit colors.
    rounded: Vec<Srgb<u8>>,
}

impl CentroidSet {
    /// Sort `means` by their ordering key and compute the rounded colors.
    pub(crate) fn from_unsorted(k: ClusterCount, mut means: Vec<[f64; 3]>) -> Self {
        means.sort_by_key(|&mean| OrderedFloat(ordering_key(mean)));
        Self::from_sorted(k, means)
    }

    /// Compute the rounded colors of `means` which are already sorted by their ordering key.
    pub(crate) fn from_sorted(k: ClusterCount, means: Vec<[f64; 3]>) -> Self {
        debug_assert_eq!(means.len(), k.as_usize());
        let rounded = means.iter().copied().map(round_mean).collect();
        let centroids = Self { k, means, rounded };
        debug_assert!(centroids.is_sorted());
        centroids
    }

    /// Create a new [`CentroidSet`] from a list of means.
    ///
    /// The means are sorted by their [`ordering_key`].
    ///
    /// # Errors
    ///
    /// Returns an error if `means` is empty, has more than [`MAX_PIXELS`] elements, or has a
    /// channel that is NaN or infinite.
    pub fn new(means: Vec<[f64; 3]>) -> Result<Self, CreateCentroidsError> {
        let k = LengthOutOfRange::check_nz_u32(&means, MAX_PIXELS)?;
        if let Some(index) = means
            .iter()
            .position(|mean| !mean.iter().all(|c| c.is_finite()))
        {
            return Err(CreateCentroidsError::NonFinite { index });
        }
        Ok(Self::from_unsorted(k.into(), means))
    }

    /// Create a new [`CentroidSet`] whose means are exactly the given colors.
    ///
    /// # Errors
    ///
    /// Returns an error if `colors` is empty or has more than [`MAX_PIXELS`] elements.
    pub fn from_colors(colors: &[Srgb<u8>]) -> Result<Self, CreateCentroidsError> {
        Self::new(
            colors
                .iter()
                .map(|&color| cast::into_array(color).map(f64::from))
                .collect(),
        )
    }

    /// Returns the number of centroids.
    #[inline]
    pub fn k(&self) -> ClusterCount {
        self.k
    }

    /// Returns the floating point means in sorted order.
    #[inline]
    pub fn means(&self) -> &[[f64; 3]] {
        &self.means
    }

    /// Returns the rounded colors, index-aligned with [`means`](Self::means).
    #[inline]
    pub fn rounded(&self) -> &[Srgb<u8>] {
        &self.rounded
    }

    /// Consume the [`CentroidSet`] and return the rounded colors.
    #[must_use]
    #[inline]
    pub fn into_rounded(self) -> Vec<Srgb<u8>> {
        self.rounded
    }

    /// Returns the largest absolute difference of any channel between index-aligned means of
    /// `self` and `previous`.
    pub fn max_shift(&self, previous: &Self) -> f64 {
        self.means
            .iter()
            .zip(&previous.means)
            .flat_map(|(new, old)| new.iter().zip(old).map(|(n, o)| (n - o).abs()))
            .fold(0.0, f64::max)
    }

    /// Returns whether every channel of every index-aligned pair of means differs by at most
    /// `tolerance`.
    pub fn within_tolerance(&self, previous: &Self, tolerance: f64) -> bool {
        self.k == previous.k
            && self
                .means
                .iter()
                .zip(&previous.means)
                .all(|(new, old)| new.iter().zip(old).all(|(n, o)| (n - o).abs() <= tolerance))
    }

    /// Returns whether the means are in ascending order of their [`ordering_key`].
    pub fn is_sorted(&self) -> bool {
        self.means
            .windows(2)
            .all(|pair| OrderedFloat(ordering_key(pair[0])) <= OrderedFloat(ordering_key(pair[1])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sorts_by_ordering_key() {
        let set = CentroidSet::new(vec![
            [0.0, 0.0, 255.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0],
        ])
        .unwrap();

        assert!(set.is_sorted());
        assert_eq!(
            set.means(),
            [[0.0, 0.0, 0.0], [0.0, 0.0, 255.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]]
        );
        assert_eq!(set.k(), 4u32);
    }

    #[test]
    fn rounded_is_index_aligned() {
        let set = CentroidSet::new(vec![[200.4, 3.5, 4.5], [10.6, 20.2, 300.0]]).unwrap();
        assert_eq!(
            set.rounded(),
            [Srgb::new(11, 20, 255), Srgb::new(200, 4, 4)]
        );
    }

    #[test]
    fn empty_means_are_rejected() {
        assert!(matches!(
            CentroidSet::new(Vec::new()),
            Err(CreateCentroidsError::Length(_))
        ));
        assert!(CentroidSet::from_colors(&[]).is_err());
    }

    #[test]
    fn non_finite_means_are_rejected() {
        assert_eq!(
            CentroidSet::new(vec![[10.0; 3], [f64::NAN, 0.0, 0.0]]),
            Err(CreateCentroidsError::NonFinite { index: 1 })
        );
        assert_eq!(
            CentroidSet::new(vec![[0.0, f64::INFINITY, 0.0]]),
            Err(CreateCentroidsError::NonFinite { index: 0 })
        );
        assert_eq!(
            CentroidSet::new(vec![[f64::NEG_INFINITY; 3], [1.0; 3]]),
            Err(CreateCentroidsError::NonFinite { index: 0 })
        );
    }

    #[test]
    fn tolerance_is_inclusive() {
        let a = CentroidSet::new(vec![[10.0, 10.0, 10.0]]).unwrap();
        let b = CentroidSet::new(vec![[10.0, 10.0, 10.5]]).unwrap();
        assert!(b.within_tolerance(&a, 0.5));
        assert!(!b.within_tolerance(&a, 0.25));
        assert!((b.max_shift(&a) - 0.5).abs() < f64::EPSILON);
    }
}
