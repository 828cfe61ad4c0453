//! Color quantization by batch k-means clustering (Lloyd's algorithm).
//!
//! Each iteration assigns every pixel to its nearest centroid (the lowest index wins on ties),
//! replaces every centroid with the mean of its assigned pixels, and sorts the new centroids by
//! [`ordering_key`](crate::ordering_key). A cluster that receives no pixels keeps its previous
//! centroid. Iteration stops once no channel of any centroid moved more than the tolerance.
//!
//! Clusters have no identity across iterations. The sort is what lines up index `i` of one
//! iteration with index `i` of the next for the convergence check.
//!
//! See [`Kmeans`] and [`KmeansOptions`] for more information.

use super::partition::validate;
use crate::{
    CentroidSet, ClusterCount, ClusterError, ImageRef, NearestCentroidColorMap,
    color_map::argmin_distance, ordering_key,
};
use core::num::NonZeroU32;
use log::{debug, info, warn};
use ordered_float::OrderedFloat;
use palette::{Srgb, cast::AsArrays as _};
use rand::{Rng, SeedableRng as _};
use rand_xoshiro::Xoroshiro128PlusPlus;

pub use super::partition::partition;

/// The various options for k-means quantization.
///
/// This struct has a builder API. See the docs for each of the following functions for more details:
/// - [`tolerance`](`Self::tolerance`)
/// - [`seed`](`Self::seed`)
/// - [`max_iterations`](`Self::max_iterations`)
///
/// # Examples
///
/// ```
/// # use core::num::NonZeroU32;
/// # use colorcluster::kmeans::KmeansOptions;
/// KmeansOptions::new()
///     .tolerance(1e-3)
///     .seed(42)
///     .max_iterations(NonZeroU32::new(100));
/// ```
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KmeansOptions {
    /// The largest centroid movement that still counts as converged.
    tolerance: OrderedFloat<f64>,
    /// The seed for the random number generator used to build the initial partition.
    seed: u64,
    /// The maximum number of iterations, or `None` to iterate until convergence.
    max_iterations: Option<NonZeroU32>,
}

impl KmeansOptions {
    /// The default convergence tolerance.
    pub const DEFAULT_TOLERANCE: f64 = 1e-5;

    /// Create a new [`KmeansOptions`] with default options.
    #[inline]
    pub const fn new() -> Self {
        Self {
            tolerance: OrderedFloat(Self::DEFAULT_TOLERANCE),
            seed: 0,
            max_iterations: None,
        }
    }

    /// Sets the convergence tolerance.
    ///
    /// Clustering stops once every channel of every centroid differs from its value in the
    /// previous iteration by at most this amount.
    ///
    /// The default tolerance is `1e-5`. A negative or non-finite tolerance is rejected with
    /// [`ClusterError::InvalidTolerance`] when a run starts.
    #[inline]
    pub const fn tolerance(self, tolerance: f64) -> Self {
        Self {
            tolerance: OrderedFloat(tolerance),
            ..self
        }
    }

    /// Sets the seed number used for the random number generator that shuffles the input
    /// before it is partitioned.
    ///
    /// The default seed is `0`.
    #[inline]
    pub const fn seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }

    /// Sets the maximum number of iterations to run.
    ///
    /// Batch k-means always converges on a finite input, so by default there is no limit.
    /// If a limit is set and reached before convergence, the centroids of the last iteration
    /// are returned along with [`Convergence::IterationLimit`].
    #[inline]
    pub const fn max_iterations(self, max_iterations: Option<NonZeroU32>) -> Self {
        Self { max_iterations, ..self }
    }

    /// Returns the current tolerance.
    ///
    /// See [`tolerance`](Self::tolerance) for more information.
    #[inline]
    pub const fn get_tolerance(&self) -> f64 {
        self.tolerance.0
    }

    /// Returns the current seed number.
    ///
    /// See [`seed`](Self::seed) for more information.
    #[inline]
    pub const fn get_seed(&self) -> u64 {
        self.seed
    }

    /// Returns the current maximum number of iterations.
    ///
    /// See [`max_iterations`](Self::max_iterations) for more information.
    #[inline]
    pub const fn get_max_iterations(&self) -> Option<NonZeroU32> {
        self.max_iterations
    }

    /// Check that the tolerance is a finite, non-negative number.
    pub(crate) fn validate_tolerance(&self) -> Result<f64, ClusterError> {
        let tolerance = self.get_tolerance();
        if tolerance.is_finite() && tolerance >= 0.0 {
            Ok(tolerance)
        } else {
            Err(ClusterError::InvalidTolerance(tolerance))
        }
    }

    /// Create the default random number generator for these options.
    #[inline]
    pub(crate) fn rng(&self) -> Xoroshiro128PlusPlus {
        Xoroshiro128PlusPlus::seed_from_u64(self.seed)
    }
}

impl Default for KmeansOptions {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// The state of a [`Kmeans`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KmeansState {
    /// The centroids are still moving.
    Running,
    /// No centroid moved more than the tolerance in the last iteration.
    Converged,
}

/// How a finished [`Kmeans`] run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    /// The centroids converged after the given number of iterations.
    Converged {
        /// The number of iterations run.
        iterations: u32,
    },
    /// The maximum number of iterations was reached before convergence.
    IterationLimit {
        /// The number of iterations run.
        iterations: u32,
    },
}

impl Convergence {
    /// Returns the number of iterations run.
    #[inline]
    pub const fn iterations(&self) -> u32 {
        match *self {
            Self::Converged { iterations } | Self::IterationLimit { iterations } => iterations,
        }
    }

    /// Returns whether the centroids converged.
    #[inline]
    pub const fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }
}

/// Per cluster channel sums and pixel counts for one assignment pass.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ClusterSums {
    /// The channel sums of the pixels assigned to each cluster.
    sums: Vec<[u64; 3]>,
    /// The number of pixels assigned to each cluster.
    counts: Vec<u32>,
}

impl ClusterSums {
    fn new(k: usize) -> Self {
        Self {
            sums: vec![[0; 3]; k],
            counts: vec![0; k],
        }
    }

    /// Assign each color to its nearest mean and add it to that cluster.
    fn add_colors(&mut self, colors: &[[u8; 3]], means: &[[f64; 3]]) {
        for &color in colors {
            let (i, _) = argmin_distance(means, color.map(f64::from));
            for (s, c) in self.sums[i].iter_mut().zip(color) {
                *s += u64::from(c);
            }
            self.counts[i] += 1;
        }
    }

    /// Combine the partial sums of two disjoint sets of pixels.
    #[cfg(feature = "threads")]
    fn merge(mut self, other: Self) -> Self {
        for (a, b) in self.sums.iter_mut().zip(other.sums) {
            for (a, b) in a.iter_mut().zip(b) {
                *a += b;
            }
        }
        for (a, b) in self.counts.iter_mut().zip(other.counts) {
            *a += b;
        }
        self
    }

    /// Compute the new means, keeping the previous mean for clusters with no pixels.
    ///
    /// Returns the means paired with their counts, sorted by [`ordering_key`].
    #[allow(clippy::cast_precision_loss)]
    fn into_sorted_means(self, previous: &[[f64; 3]]) -> Vec<([f64; 3], u32)> {
        let mut means = self
            .sums
            .into_iter()
            .zip(self.counts)
            .zip(previous)
            .map(|((sum, count), &previous)| {
                let mean = if count == 0 {
                    previous
                } else {
                    sum.map(|s| s as f64 / f64::from(count))
                };
                (mean, count)
            })
            .collect::<Vec<_>>();

        means.sort_by_key(|&(mean, _)| OrderedFloat(ordering_key(mean)));
        means
    }
}

/// The struct for batch k-means quantization.
///
/// A [`Kmeans`] holds the current [`CentroidSet`] for a slice of colors and is advanced one
/// iteration at a time with [`step`](Self::step), or run to completion with
/// [`run`](Self::run). Each step replaces the centroid set with a new one.
///
/// Most of the time you want one of the functions that also build the initial centroids with
/// [`partition`]:
/// - [`run_slice`](Self::run_slice)
/// - [`run_image`](Self::run_image)
/// - [`run_slice_with_rng`](Self::run_slice_with_rng)
///
/// Parallel versions are also available if the `threads` feature is enabled.
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use colorcluster::{
///     ClusterCount,
///     kmeans::{Kmeans, KmeansOptions},
/// };
/// use palette::Srgb;
///
/// let colors = vec![Srgb::new(10, 20, 30); 4];
/// let clustering = Kmeans::run_slice(&colors, ClusterCount::MIN, KmeansOptions::new())?;
/// assert_eq!(clustering.centroids().rounded(), [Srgb::new(10, 20, 30)]);
/// assert_eq!(clustering.convergence().iterations(), 1);
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct Kmeans<'a> {
    /// The colors being clustered.
    colors: &'a [[u8; 3]],
    /// The current centroids.
    centroids: CentroidSet,
    /// The number of pixels assigned to each centroid in the last iteration.
    counts: Vec<u32>,
    /// The number of iterations run so far.
    iterations: u32,
    /// Whether the last iteration converged.
    state: KmeansState,
    /// The convergence tolerance.
    tolerance: f64,
    /// The maximum number of iterations for [`run`](Self::run).
    max_iterations: Option<NonZeroU32>,
}

impl<'a> Kmeans<'a> {
    /// Create a new [`Kmeans`] starting from the given `centroids`.
    ///
    /// # Errors
    ///
    /// Returns an error if `colors` is empty, has fewer colors than there are centroids, or has
    /// more than [`MAX_PIXELS`](crate::MAX_PIXELS) colors. The tolerance in `options` must also
    /// be finite and non-negative.
    pub fn new(
        colors: &'a [Srgb<u8>],
        centroids: CentroidSet,
        options: KmeansOptions,
    ) -> Result<Self, ClusterError> {
        let tolerance = options.validate_tolerance()?;
        validate(colors, centroids.k())?;
        Ok(Self {
            colors: colors.as_arrays(),
            counts: vec![0; centroids.k().as_usize()],
            centroids,
            iterations: 0,
            state: KmeansState::Running,
            tolerance,
            max_iterations: options.get_max_iterations(),
        })
    }

    /// Returns the current centroids.
    #[inline]
    pub fn centroids(&self) -> &CentroidSet {
        &self.centroids
    }

    /// Returns the number of iterations run so far.
    #[inline]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> KmeansState {
        self.state
    }

    /// Replace the centroids with the result of one assignment pass.
    fn update(&mut self, sums: ClusterSums) -> KmeansState {
        let k = self.centroids.k();
        let (means, counts): (Vec<_>, Vec<_>) =
            sums.into_sorted_means(self.centroids.means()).into_iter().unzip();
        let centroids = CentroidSet::from_sorted(k, means);

        self.iterations += 1;
        debug!(
            "k = {k}, iteration {}: max centroid shift {:.6}",
            self.iterations,
            centroids.max_shift(&self.centroids),
        );

        if centroids.within_tolerance(&self.centroids, self.tolerance) {
            self.state = KmeansState::Converged;
        }
        self.centroids = centroids;
        self.counts = counts;
        self.state
    }

    /// Run one iteration, unless already converged.
    pub fn step(&mut self) -> KmeansState {
        if self.state == KmeansState::Converged {
            return self.state;
        }
        let mut sums = ClusterSums::new(self.centroids.k().as_usize());
        sums.add_colors(self.colors, self.centroids.means());
        self.update(sums)
    }

    /// Run iterations with `step` until converged or the iteration limit is reached.
    fn run_with(mut self, mut step: impl FnMut(&mut Self) -> KmeansState) -> Clustering {
        let limit = self.max_iterations.map_or(u32::MAX, NonZeroU32::get);
        while self.state == KmeansState::Running && self.iterations < limit {
            step(&mut self);
        }

        let k = self.centroids.k();
        let convergence = match self.state {
            KmeansState::Converged => {
                info!("k = {k}: converged after {} iterations", self.iterations);
                Convergence::Converged { iterations: self.iterations }
            }
            KmeansState::Running => {
                warn!("k = {k}: stopped after {} iterations without converging", self.iterations);
                Convergence::IterationLimit { iterations: self.iterations }
            }
        };

        let empty = self.counts.iter().filter(|&&count| count == 0).count();
        if empty > 0 {
            warn!("k = {k}: {empty} clusters received no pixels and kept their previous centroid");
        }

        Clustering {
            centroids: self.centroids,
            counts: self.counts,
            convergence,
        }
    }

    /// Run iterations until converged or the iteration limit is reached.
    pub fn run(self) -> Clustering {
        self.run_with(Self::step)
    }

    /// Partition `colors` using `rng` and run k-means until convergence.
    ///
    /// # Errors
    ///
    /// Returns an error if `colors` is empty, `k` is larger than the number of colors, or there
    /// are more than [`MAX_PIXELS`](crate::MAX_PIXELS) colors.
    pub fn run_slice_with_rng<R: Rng + ?Sized>(
        colors: &[Srgb<u8>],
        k: ClusterCount,
        options: KmeansOptions,
        rng: &mut R,
    ) -> Result<Clustering, ClusterError> {
        options.validate_tolerance()?;
        let centroids = partition(colors, k, rng)?;
        Ok(Kmeans::new(colors, centroids, options)?.run())
    }

    /// Partition `colors` and run k-means until convergence.
    ///
    /// The partition uses a [`Xoroshiro128PlusPlus`] generator seeded with
    /// [`KmeansOptions::seed`].
    ///
    /// # Errors
    ///
    /// Returns an error if `colors` is empty, `k` is larger than the number of colors, or there
    /// are more than [`MAX_PIXELS`](crate::MAX_PIXELS) colors.
    pub fn run_slice(
        colors: &[Srgb<u8>],
        k: ClusterCount,
        options: KmeansOptions,
    ) -> Result<Clustering, ClusterError> {
        Self::run_slice_with_rng(colors, k, options, &mut options.rng())
    }

    /// Partition the pixels of an [`ImageRef`] and run k-means until convergence.
    ///
    /// # Errors
    ///
    /// Returns an error if the image has no pixels or `k` is larger than the number of pixels.
    pub fn run_image(
        image: ImageRef<'_, Srgb<u8>>,
        k: ClusterCount,
        options: KmeansOptions,
    ) -> Result<Clustering, ClusterError> {
        Self::run_slice(image.as_slice(), k, options)
    }
}

/// The result of a finished [`Kmeans`] run.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// The final centroids.
    centroids: CentroidSet,
    /// The number of pixels assigned to each centroid in the last iteration.
    counts: Vec<u32>,
    /// How the run ended.
    convergence: Convergence,
}

impl Clustering {
    /// Returns the final centroids.
    #[inline]
    pub fn centroids(&self) -> &CentroidSet {
        &self.centroids
    }

    /// Returns the number of pixels assigned to each centroid in the last iteration.
    ///
    /// A count of zero means the centroid was carried over from a previous iteration.
    #[inline]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Returns how the run ended.
    #[inline]
    pub fn convergence(&self) -> Convergence {
        self.convergence
    }

    /// Returns the final centroids.
    #[must_use]
    #[inline]
    pub fn into_centroids(self) -> CentroidSet {
        self.centroids
    }

    /// Returns a color map to the rounded centroids.
    #[must_use]
    #[inline]
    pub fn color_map(&self) -> NearestCentroidColorMap {
        NearestCentroidColorMap::new(&self.centroids)
    }
}

#[cfg(feature = "threads")]
/// Module for code gated behind the `threads` feature.
mod parallel {
    use super::{ClusterSums, Clustering, Kmeans, KmeansOptions, KmeansState, partition};
    use crate::{ClusterCount, ClusterError, ImageRef, NearestCentroidParallelColorMap};
    use palette::Srgb;
    use rand::Rng;
    use rayon::prelude::*;

    /// The number of pixels each rayon task assigns before its partial sums are merged.
    const CHUNK_SIZE: usize = 4096;

    impl Kmeans<'_> {
        /// Run one iteration in parallel, unless already converged.
        ///
        /// The partial sums of each chunk are exact integers, so the result is identical to
        /// [`step`](Self::step).
        pub fn step_par(&mut self) -> KmeansState {
            if self.state == KmeansState::Converged {
                return self.state;
            }
            let k = self.centroids.k().as_usize();
            let means = self.centroids.means();
            let sums = self
                .colors
                .par_chunks(CHUNK_SIZE)
                .fold(
                    || ClusterSums::new(k),
                    |mut sums, chunk| {
                        sums.add_colors(chunk, means);
                        sums
                    },
                )
                .reduce(|| ClusterSums::new(k), ClusterSums::merge);
            self.update(sums)
        }

        /// Run iterations in parallel until converged or the iteration limit is reached.
        pub fn run_par(self) -> Clustering {
            self.run_with(Self::step_par)
        }

        /// Partition `colors` using `rng` and run k-means in parallel until convergence.
        ///
        /// # Errors
        ///
        /// Returns an error if `colors` is empty, `k` is larger than the number of colors, or
        /// there are more than [`MAX_PIXELS`](crate::MAX_PIXELS) colors.
        pub fn run_slice_with_rng_par<R: Rng + ?Sized>(
            colors: &[Srgb<u8>],
            k: ClusterCount,
            options: KmeansOptions,
            rng: &mut R,
        ) -> Result<Clustering, ClusterError> {
            options.validate_tolerance()?;
            let centroids = partition(colors, k, rng)?;
            Ok(Kmeans::new(colors, centroids, options)?.run_par())
        }

        /// Partition `colors` and run k-means in parallel until convergence.
        ///
        /// # Errors
        ///
        /// Returns an error if `colors` is empty, `k` is larger than the number of colors, or
        /// there are more than [`MAX_PIXELS`](crate::MAX_PIXELS) colors.
        pub fn run_slice_par(
            colors: &[Srgb<u8>],
            k: ClusterCount,
            options: KmeansOptions,
        ) -> Result<Clustering, ClusterError> {
            Self::run_slice_with_rng_par(colors, k, options, &mut options.rng())
        }

        /// Partition the pixels of an [`ImageRef`] and run k-means in parallel until
        /// convergence.
        ///
        /// # Errors
        ///
        /// Returns an error if the image has no pixels or `k` is larger than the number of
        /// pixels.
        pub fn run_image_par(
            image: ImageRef<'_, Srgb<u8>>,
            k: ClusterCount,
            options: KmeansOptions,
        ) -> Result<Clustering, ClusterError> {
            Self::run_slice_par(image.as_slice(), k, options)
        }
    }

    impl Clustering {
        /// Returns a parallel color map to the rounded centroids.
        #[must_use]
        #[inline]
        pub fn parallel_color_map(&self) -> NearestCentroidParallelColorMap {
            NearestCentroidParallelColorMap::new(&self.centroids)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColorMap as _, tests::*};
    use std::collections::HashSet;

    fn k(k: u32) -> ClusterCount {
        ClusterCount::try_from(k).unwrap()
    }

    fn seeded(seed: u64) -> Xoroshiro128PlusPlus {
        Xoroshiro128PlusPlus::seed_from_u64(seed)
    }

    #[test]
    fn identical_pixels_converge_immediately() {
        let colors = vec![Srgb::new(10, 20, 30); 4];
        let clustering = Kmeans::run_slice(&colors, k(1), KmeansOptions::new()).unwrap();
        assert_eq!(clustering.centroids().means(), [[10.0, 20.0, 30.0]]);
        assert_eq!(clustering.counts(), [4]);
        assert_eq!(clustering.convergence(), Convergence::Converged { iterations: 1 });
    }

    #[test]
    fn black_and_white_converge_immediately() {
        let colors = [Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)];
        for seed in 0..4 {
            let clustering =
                Kmeans::run_slice(&colors, k(2), KmeansOptions::new().seed(seed)).unwrap();
            assert_eq!(clustering.centroids().rounded(), colors);
            assert_eq!(clustering.counts(), [1, 1]);
            assert_eq!(clustering.convergence().iterations(), 1);
        }
    }

    /// Sum of squared distances from each color to its nearest centroid.
    fn inertia(colors: &[Srgb<u8>], centroids: &CentroidSet) -> f64 {
        colors
            .as_arrays()
            .iter()
            .map(|color| argmin_distance(centroids.means(), color.map(f64::from)).1)
            .sum()
    }

    #[test]
    fn separated_blobs_are_found() {
        let colors = three_blobs();
        let best = (0..16)
            .map(|seed| Kmeans::run_slice(&colors, k(3), KmeansOptions::new().seed(seed)).unwrap())
            .inspect(|clustering| {
                assert!(clustering.convergence().is_converged());
                assert_eq!(clustering.counts().iter().sum::<u32>(), 15);
                assert!(clustering.centroids().is_sorted());
            })
            .min_by_key(|clustering| OrderedFloat(inertia(&colors, clustering.centroids())))
            .unwrap();

        // blob centers plus the mean offset of (1.2, 1.2, 1.2), sorted by ordering key
        let expected = [[21u8, 141, 31], [41, 11, 11], [171, 191, 241]];
        assert_eq!(best.counts(), [5, 5, 5]);
        for (centroid, expected) in best.centroids().rounded().iter().zip(expected) {
            let centroid = palette::cast::into_array(*centroid);
            for (c, e) in centroid.into_iter().zip(expected) {
                assert!(c.abs_diff(e) <= 1, "{centroid:?} is not near {expected:?}");
            }
        }
    }

    #[test]
    fn centroids_stay_sorted_every_iteration() {
        let colors = test_data_1024();
        let centroids = partition(&colors, k(12), &mut seeded(5)).unwrap();
        let mut kmeans = Kmeans::new(&colors, centroids, KmeansOptions::new()).unwrap();
        while kmeans.step() == KmeansState::Running {
            assert!(kmeans.centroids().is_sorted());
            assert_eq!(kmeans.centroids().k(), 12u32);
        }
        assert!(kmeans.centroids().is_sorted());
        assert_eq!(kmeans.step(), KmeansState::Converged);
    }

    #[test]
    fn converged_centroids_are_the_means_of_their_clusters() {
        let colors = test_data_1024();
        let clustering = Kmeans::run_slice(&colors, k(6), KmeansOptions::new().seed(11)).unwrap();
        let means = clustering.centroids().means();

        let mut sums = vec![[0.0f64; 3]; means.len()];
        let mut counts = vec![0u32; means.len()];
        for color in colors.as_arrays() {
            let (i, _) = argmin_distance(means, color.map(f64::from));
            for (s, &c) in sums[i].iter_mut().zip(color) {
                *s += f64::from(c);
            }
            counts[i] += 1;
        }

        assert_eq!(counts, clustering.counts());
        for ((sum, &count), mean) in sums.iter().zip(&counts).zip(means) {
            if count == 0 {
                continue;
            }
            for (s, m) in sum.iter().zip(mean) {
                assert!((s / f64::from(count) - m).abs() <= KmeansOptions::DEFAULT_TOLERANCE);
            }
        }
    }

    #[test]
    fn k_above_distinct_colors_still_converges() {
        let colors = [
            Srgb::new(0, 0, 0),
            Srgb::new(0, 0, 0),
            Srgb::new(0, 0, 0),
            Srgb::new(200, 200, 200),
            Srgb::new(200, 200, 200),
            Srgb::new(200, 200, 200),
        ];

        for seed in 0..16 {
            let clustering =
                Kmeans::run_slice(&colors, k(4), KmeansOptions::new().seed(seed)).unwrap();
            assert!(clustering.convergence().is_converged());

            let centroids = clustering.centroids();
            let distinct = centroids
                .means()
                .iter()
                .map(|mean| mean.map(f64::to_bits))
                .collect::<HashSet<_>>();
            let has_empty = clustering.counts().contains(&0);
            assert!(distinct.len() < 4 || has_empty);
        }
    }

    #[test]
    fn empty_clusters_keep_their_previous_centroid() {
        let colors = vec![Srgb::new(0, 0, 0); 3];
        let centroids = CentroidSet::new(vec![[0.0, 0.0, 0.0], [100.0, 100.0, 100.0]]).unwrap();
        let clustering = Kmeans::new(&colors, centroids, KmeansOptions::new()).unwrap().run();
        assert_eq!(clustering.centroids().means(), [[0.0; 3], [100.0; 3]]);
        assert_eq!(clustering.counts(), [3, 0]);
    }

    #[test]
    fn iteration_limit_is_reported() {
        let colors = test_data_1024();
        let centroids = partition(&colors, k(32), &mut seeded(2)).unwrap();
        let options = KmeansOptions::new().max_iterations(NonZeroU32::new(1));
        let clustering = Kmeans::new(&colors, centroids, options).unwrap().run();
        assert_eq!(clustering.convergence(), Convergence::IterationLimit { iterations: 1 });
        assert!(clustering.centroids().is_sorted());
    }

    #[test]
    fn zero_tolerance_terminates() {
        let colors = test_data_256();
        let clustering =
            Kmeans::run_slice(&colors, k(5), KmeansOptions::new().tolerance(0.0)).unwrap();
        assert!(clustering.convergence().is_converged());
    }

    #[test]
    fn invalid_tolerance_is_rejected() {
        let colors = test_data_256();
        for tolerance in [-1.0, -f64::EPSILON, f64::NAN, f64::INFINITY] {
            let options = KmeansOptions::new().tolerance(tolerance);
            assert!(matches!(
                Kmeans::run_slice(&colors, k(4), options),
                Err(ClusterError::InvalidTolerance(_))
            ));

            let centroids = partition(&colors, k(4), &mut seeded(0)).unwrap();
            assert!(matches!(
                Kmeans::new(&colors, centroids, options),
                Err(ClusterError::InvalidTolerance(_))
            ));

            #[cfg(feature = "threads")]
            assert!(matches!(
                Kmeans::run_slice_par(&colors, k(4), options),
                Err(ClusterError::InvalidTolerance(_))
            ));
        }
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        let centroids = CentroidSet::from_colors(&test_colors(4)).unwrap();
        assert_eq!(
            Kmeans::new(&[], centroids.clone(), KmeansOptions::new()).unwrap_err(),
            ClusterError::EmptyInput,
        );
        assert!(matches!(
            Kmeans::new(&test_colors(3), centroids, KmeansOptions::new()),
            Err(ClusterError::ClusterCountAboveInputLength { .. })
        ));
        assert!(matches!(
            Kmeans::run_image(ImageRef::default(), k(1), KmeansOptions::new()),
            Err(ClusterError::EmptyInput)
        ));
    }

    #[test]
    fn color_map_outputs_rounded_centroids() {
        let colors = test_data_1024();
        let clustering = Kmeans::run_slice(&colors, k(9), KmeansOptions::new()).unwrap();
        let color_map = clustering.color_map();
        let palette = clustering.centroids().rounded();
        assert!(color_map.map_to_colors(&colors).iter().all(|c| palette.contains(c)));
    }

    #[cfg(feature = "threads")]
    #[test]
    fn parallel_matches_serial() {
        let colors = test_colors(20_000);
        for seed in [0, 1, 2] {
            let options = KmeansOptions::new().seed(seed);
            let serial = Kmeans::run_slice(&colors, k(16), options).unwrap();
            let parallel = Kmeans::run_slice_par(&colors, k(16), options).unwrap();
            assert_eq!(serial, parallel);
        }
    }
}
