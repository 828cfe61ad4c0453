//! Construction of the initial centroids from a random partition of the input.
//!
//! The pixels are shuffled and split into `k` contiguous groups whose sizes differ by at most
//! one: the first `len % k` groups have `len / k + 1` pixels and the rest have `len / k` pixels.
//! The initial centroids are the group means sorted by [`ordering_key`](crate::ordering_key).

use crate::{CentroidSet, ClusterCount, ClusterError, LengthOutOfRange, MAX_PIXELS};
use palette::{Srgb, cast::AsArrays as _};
use rand::{Rng, seq::SliceRandom as _};

/// Check that `colors` can be split into `k` non-empty groups.
pub(crate) fn validate(colors: &[Srgb<u8>], k: ClusterCount) -> Result<(), ClusterError> {
    let len = LengthOutOfRange::check_u32(colors, 0, MAX_PIXELS)?;
    if len == 0 {
        Err(ClusterError::EmptyInput)
    } else if k.as_u32() > len {
        Err(ClusterError::ClusterCountAboveInputLength { k, len: colors.len() })
    } else {
        Ok(())
    }
}

/// Returns the sizes of the `k` groups that `len` pixels are split into.
///
/// The sizes sum to `len` and are all non-zero when `k <= len`.
pub(crate) fn group_sizes(len: usize, k: ClusterCount) -> impl Iterator<Item = usize> {
    let k = k.as_usize();
    let (size, larger) = (len / k, len % k);
    (0..k).map(move |i| size + usize::from(i < larger))
}

/// Returns the element-wise mean of a non-empty group of colors.
#[allow(clippy::cast_precision_loss)]
fn mean(group: &[[u8; 3]]) -> [f64; 3] {
    let mut sum = [0u64; 3];
    for color in group {
        for (s, &c) in sum.iter_mut().zip(color) {
            *s += u64::from(c);
        }
    }
    let len = group.len() as f64;
    sum.map(|s| s as f64 / len)
}

/// Split a uniformly random permutation of `colors` into `k` groups and return their sorted
/// means as the initial [`CentroidSet`].
///
/// # Errors
///
/// Returns an error if any of the following are true:
/// - `colors` is empty.
/// - `k` is greater than the length of `colors`.
/// - `colors` has more than [`MAX_PIXELS`] elements.
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use colorcluster::{ClusterCount, kmeans::partition};
/// use palette::Srgb;
/// use rand::SeedableRng as _;
/// use rand_xoshiro::Xoroshiro128PlusPlus;
///
/// let colors = [Srgb::new(255, 255, 255), Srgb::new(0, 0, 0)];
/// let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(7);
/// let centroids = partition(&colors, ClusterCount::try_from(2u32)?, rng)?;
/// assert_eq!(centroids.rounded(), [Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)]);
/// # Ok(())
/// # }
/// ```
pub fn partition<R: Rng + ?Sized>(
    colors: &[Srgb<u8>],
    k: ClusterCount,
    rng: &mut R,
) -> Result<CentroidSet, ClusterError> {
    validate(colors, k)?;

    let mut shuffled = colors.as_arrays().to_vec();
    shuffled.shuffle(rng);

    let mut means = Vec::with_capacity(k.as_usize());
    let mut rest = shuffled.as_slice();
    for size in group_sizes(shuffled.len(), k) {
        let (group, tail) = rest.split_at(size);
        means.push(mean(group));
        rest = tail;
    }
    debug_assert!(rest.is_empty());

    Ok(CentroidSet::from_unsorted(k, means))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;
    use rand::SeedableRng as _;
    use rand_xoshiro::Xoroshiro128PlusPlus;

    fn k(k: u32) -> ClusterCount {
        ClusterCount::try_from(k).unwrap()
    }

    #[test]
    fn group_sizes_at_boundary_ratios() {
        let sizes = |len, n| group_sizes(len, k(n)).collect::<Vec<_>>();
        assert_eq!(sizes(2, 2), [1, 1]);
        assert_eq!(sizes(5, 5), [1; 5]);
        assert_eq!(sizes(7, 3), [3, 2, 2]);
        assert_eq!(sizes(8, 3), [3, 3, 2]);
        assert_eq!(sizes(9, 3), [3, 3, 3]);
        assert_eq!(sizes(10, 1), [10]);
        assert_eq!(sizes(1000, 7).len(), 7);
        assert_eq!(sizes(1000, 7).iter().sum::<usize>(), 1000);
    }

    #[test]
    fn every_group_is_non_empty() {
        for len in 1..64 {
            for n in 1..=len {
                let n = u32::try_from(n).unwrap();
                assert!(group_sizes(len, k(n)).all(|size| size > 0));
            }
        }
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(0);
        assert_eq!(partition(&[], k(1), rng), Err(ClusterError::EmptyInput));

        let colors = test_colors(3);
        assert_eq!(
            partition(&colors, k(4), rng),
            Err(ClusterError::ClusterCountAboveInputLength { k: k(4), len: 3 })
        );
    }

    #[test]
    fn two_colors_give_singleton_groups() {
        let colors = [Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)];
        for seed in 0..8 {
            let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(seed);
            let centroids = partition(&colors, k(2), rng).unwrap();
            assert_eq!(centroids.means(), [[0.0; 3], [255.0; 3]]);
        }
    }

    #[test]
    fn single_group_is_the_overall_mean() {
        let colors = [Srgb::new(0, 10, 20), Srgb::new(10, 20, 30), Srgb::new(20, 30, 40)];
        let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(3);
        let centroids = partition(&colors, k(1), rng).unwrap();
        assert_eq!(centroids.means(), [[10.0, 20.0, 30.0]]);
    }

    #[test]
    fn initial_centroids_are_sorted() {
        let colors = test_data_1024();
        let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(42);
        let centroids = partition(&colors, k(16), rng).unwrap();
        assert_eq!(centroids.k(), 16u32);
        assert!(centroids.is_sorted());
    }

    #[test]
    fn same_seed_gives_same_partition() {
        let colors = test_data_1024();
        let a = partition(&colors, k(8), &mut Xoroshiro128PlusPlus::seed_from_u64(9)).unwrap();
        let b = partition(&colors, k(8), &mut Xoroshiro128PlusPlus::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }
}
