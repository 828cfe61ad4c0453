use crate::{
    CentroidSet, ClusterCount, ClusterError, ImageBuf, ImageRef, NearestCentroidColorMap,
    kmeans::{Clustering, Kmeans, KmeansOptions},
};
use log::debug;
use palette::Srgb;
use rand::Rng;
use rand_xoshiro::Xoroshiro128PlusPlus;
use std::collections::BTreeMap;

/// Clusters one image for any number of cluster counts and remaps it to the results.
///
/// The [`Quantizer`] owns the input image, the random number generator used for the initial
/// partitions, and a cache of results keyed by cluster count:
/// - [`cluster`](Self::cluster) runs k-means for a `k` and stores the [`Clustering`].
/// - [`quantize`](Self::quantize) remaps the image to the rounded centroids of a stored
///   clustering and stores the output image.
///
/// Asking for the centroids or the output of a `k` that was never clustered returns
/// [`ClusterError::CentroidsNotComputed`].
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use colorcluster::{ClusterCount, ClusterError, ImageBuf, Quantizer, kmeans::KmeansOptions};
/// use palette::Srgb;
///
/// let image = ImageBuf::new(2, 1, vec![Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)])?;
/// let k = ClusterCount::try_from(2u32)?;
///
/// let mut quantizer = Quantizer::with_options(image.clone(), KmeansOptions::new().seed(3));
/// assert_eq!(quantizer.quantize(k), Err(ClusterError::CentroidsNotComputed { k }));
///
/// quantizer.cluster(k)?;
/// assert_eq!(quantizer.quantize(k)?, &image);
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct Quantizer<R = Xoroshiro128PlusPlus> {
    /// The image to cluster.
    image: ImageBuf<Srgb<u8>>,
    /// The k-means options.
    options: KmeansOptions,
    /// The random number generator for initial partitions.
    rng: R,
    #[cfg(feature = "threads")]
    /// Whether or not to run clustering and remapping in parallel.
    parallel: bool,
    /// The clustering result for each computed `k`.
    clusterings: BTreeMap<ClusterCount, Clustering>,
    /// The remapped image for each quantized `k`.
    quantized: BTreeMap<ClusterCount, ImageBuf<Srgb<u8>>>,
}

impl Quantizer {
    /// Create a new [`Quantizer`] for `image` with default options.
    #[inline]
    pub fn new(image: ImageBuf<Srgb<u8>>) -> Self {
        Self::with_options(image, KmeansOptions::new())
    }

    /// Create a new [`Quantizer`] for `image` with the given options.
    ///
    /// The initial partitions use a [`Xoroshiro128PlusPlus`] generator seeded with
    /// [`KmeansOptions::seed`].
    #[inline]
    pub fn with_options(image: ImageBuf<Srgb<u8>>, options: KmeansOptions) -> Self {
        let rng = options.rng();
        Self::with_rng(image, options, rng)
    }
}

impl<R: Rng> Quantizer<R> {
    /// Create a new [`Quantizer`] that uses `rng` for the initial partitions.
    ///
    /// The seed in `options` is ignored.
    #[inline]
    pub fn with_rng(image: ImageBuf<Srgb<u8>>, options: KmeansOptions, rng: R) -> Self {
        Self {
            image,
            options,
            rng,
            #[cfg(feature = "threads")]
            parallel: false,
            clusterings: BTreeMap::new(),
            quantized: BTreeMap::new(),
        }
    }

    #[cfg(feature = "threads")]
    /// Sets whether or not to cluster and remap in parallel.
    ///
    /// Parallel and serial runs give identical results for the same random number generator
    /// state.
    ///
    /// By default, this option is `false`.
    #[inline]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Returns the input image.
    #[inline]
    pub fn image(&self) -> ImageRef<'_, Srgb<u8>> {
        self.image.as_ref()
    }

    /// Returns the k-means options.
    #[inline]
    pub fn options(&self) -> KmeansOptions {
        self.options
    }

    /// Run k-means with `k` clusters on the image and store the result.
    ///
    /// This always runs from a new random partition. Any previous result and output image for
    /// `k` are replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the image has no pixels, `k` is larger than the number of pixels, or
    /// the tolerance in the options is negative or not finite.
    pub fn cluster(&mut self, k: ClusterCount) -> Result<&Clustering, ClusterError> {
        let Self { image, options, rng, clusterings, quantized, .. } = self;

        #[cfg(feature = "threads")]
        let clustering = if self.parallel {
            Kmeans::run_slice_with_rng_par(image.as_slice(), k, *options, rng)
        } else {
            Kmeans::run_slice_with_rng(image.as_slice(), k, *options, rng)
        }?;

        #[cfg(not(feature = "threads"))]
        let clustering = Kmeans::run_slice_with_rng(image.as_slice(), k, *options, rng)?;

        quantized.remove(&k);
        clusterings.insert(k, clustering);
        Ok(&clusterings[&k])
    }

    /// Returns the stored clustering result for `k`.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::CentroidsNotComputed`] if [`cluster`](Self::cluster) has not been
    /// run for `k`.
    #[inline]
    pub fn clustering(&self, k: ClusterCount) -> Result<&Clustering, ClusterError> {
        self.clusterings
            .get(&k)
            .ok_or(ClusterError::CentroidsNotComputed { k })
    }

    /// Returns the stored centroids for `k`.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::CentroidsNotComputed`] if [`cluster`](Self::cluster) has not been
    /// run for `k`.
    #[inline]
    pub fn centroids(&self, k: ClusterCount) -> Result<&CentroidSet, ClusterError> {
        self.clustering(k).map(Clustering::centroids)
    }

    /// Returns the cluster counts that have a stored clustering result, in ascending order.
    #[inline]
    pub fn computed(&self) -> impl Iterator<Item = ClusterCount> + '_ {
        self.clusterings.keys().copied()
    }

    /// Remap every pixel of the image to its nearest rounded centroid for `k` and store the
    /// output image.
    ///
    /// The output has the same dimensions as the input and only contains colors from
    /// [`CentroidSet::rounded`]. A stored output is returned without remapping again.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::CentroidsNotComputed`] if [`cluster`](Self::cluster) has not been
    /// run for `k`. No output is produced in that case.
    pub fn quantize(&mut self, k: ClusterCount) -> Result<&ImageBuf<Srgb<u8>>, ClusterError> {
        let clustering = self
            .clusterings
            .get(&k)
            .ok_or(ClusterError::CentroidsNotComputed { k })?;

        if !self.quantized.contains_key(&k) {
            debug!("k = {k}: remapping {} pixels", self.image.num_pixels());
            let color_map = NearestCentroidColorMap::new(clustering.centroids());

            #[cfg(feature = "threads")]
            let output = if self.parallel {
                self.image.map_to_image(&color_map.into_parallel())
            } else {
                self.image.map_to_image(&color_map)
            };

            #[cfg(not(feature = "threads"))]
            let output = self.image.map_to_image(&color_map);

            self.quantized.insert(k, output);
        }

        Ok(&self.quantized[&k])
    }

    /// Returns the stored output image for `k`, if [`quantize`](Self::quantize) has been run.
    #[inline]
    pub fn quantized(&self, k: ClusterCount) -> Option<&ImageBuf<Srgb<u8>>> {
        self.quantized.get(&k)
    }

    /// Remove the stored clustering result and output image for `k`.
    ///
    /// Returns the removed clustering result, if any.
    #[inline]
    pub fn forget(&mut self, k: ClusterCount) -> Option<Clustering> {
        self.quantized.remove(&k);
        self.clusterings.remove(&k)
    }

    /// Consume the [`Quantizer`] and return the input image.
    #[must_use]
    #[inline]
    pub fn into_image(self) -> ImageBuf<Srgb<u8>> {
        self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColorMap as _, tests::*};
    use rand::SeedableRng as _;

    fn k(k: u32) -> ClusterCount {
        ClusterCount::try_from(k).unwrap()
    }

    fn test_image() -> ImageBuf<Srgb<u8>> {
        ImageBuf::new(32, 32, test_data_1024()).unwrap()
    }

    #[test]
    fn black_and_white_is_unchanged() {
        let image = ImageBuf::new(2, 1, vec![Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)]).unwrap();
        let mut quantizer = Quantizer::new(image.clone());
        let clustering = quantizer.cluster(k(2)).unwrap();
        assert_eq!(clustering.convergence().iterations(), 1);
        assert_eq!(quantizer.quantize(k(2)).unwrap(), &image);
    }

    #[test]
    fn uniform_image_is_unchanged() {
        let image = ImageBuf::new(2, 2, vec![Srgb::new(10, 20, 30); 4]).unwrap();
        let mut quantizer = Quantizer::new(image.clone());
        quantizer.cluster(k(1)).unwrap();
        assert_eq!(quantizer.centroids(k(1)).unwrap().means(), [[10.0, 20.0, 30.0]]);
        assert_eq!(quantizer.quantize(k(1)).unwrap(), &image);
    }

    #[test]
    fn uncomputed_k_is_a_usage_error() {
        let mut quantizer = Quantizer::new(test_image());
        quantizer.cluster(k(4)).unwrap();

        let error = ClusterError::CentroidsNotComputed { k: k(5) };
        assert_eq!(quantizer.quantize(k(5)), Err(error));
        assert_eq!(quantizer.centroids(k(5)), Err(error));
        assert_eq!(quantizer.quantized(k(5)), None);
        assert_eq!(error.to_string(), "centroids not computed for k = 5");
    }

    #[test]
    fn output_contains_only_rounded_centroids() {
        let mut quantizer = Quantizer::new(test_image());
        for n in [1, 3, 8] {
            quantizer.cluster(k(n)).unwrap();
            let palette = quantizer.centroids(k(n)).unwrap().rounded().to_vec();
            let output = quantizer.quantize(k(n)).unwrap();
            assert_eq!(output.dimensions(), (32, 32));
            assert!(output.as_slice().iter().all(|c| palette.contains(c)));
        }
        assert_eq!(quantizer.computed().collect::<Vec<_>>(), [k(1), k(3), k(8)]);
    }

    #[test]
    fn quantization_is_idempotent() {
        let mut quantizer = Quantizer::new(test_image());
        quantizer.cluster(k(6)).unwrap();
        let color_map = quantizer.clustering(k(6)).unwrap().color_map();
        let once = quantizer.quantize(k(6)).unwrap().clone();
        let twice = once.map_to_image(&color_map);
        assert_eq!(once, twice);
        assert_eq!(color_map.map_to_colors(once.as_slice()), once.as_slice());
    }

    #[test]
    fn reclustering_replaces_the_output() {
        let mut quantizer = Quantizer::new(test_image());
        quantizer.cluster(k(2)).unwrap();
        quantizer.quantize(k(2)).unwrap();
        assert!(quantizer.quantized(k(2)).is_some());

        quantizer.cluster(k(2)).unwrap();
        assert!(quantizer.quantized(k(2)).is_none());

        assert!(quantizer.forget(k(2)).is_some());
        assert!(quantizer.clustering(k(2)).is_err());
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        let mut quantizer = Quantizer::new(ImageBuf::default());
        assert_eq!(quantizer.cluster(k(1)).unwrap_err(), ClusterError::EmptyInput);

        let mut quantizer = Quantizer::new(ImageBuf::new(1, 2, test_colors(2)).unwrap());
        assert!(matches!(
            quantizer.cluster(k(3)),
            Err(ClusterError::ClusterCountAboveInputLength { .. })
        ));
        assert_eq!(quantizer.computed().count(), 0);
    }

    #[test]
    fn invalid_tolerance_is_rejected() {
        for tolerance in [-0.5, f64::NAN] {
            let options = KmeansOptions::new().tolerance(tolerance);
            let mut quantizer = Quantizer::with_options(test_image(), options);
            assert!(matches!(
                quantizer.cluster(k(3)),
                Err(ClusterError::InvalidTolerance(_))
            ));
            assert_eq!(quantizer.computed().count(), 0);
        }
    }

    #[test]
    fn injected_rng_is_used() {
        let options = KmeansOptions::new();
        let rng = Xoroshiro128PlusPlus::seed_from_u64(99);
        let mut a = Quantizer::with_rng(test_image(), options, rng.clone());
        let mut b = Quantizer::with_options(test_image(), options.seed(99));
        assert_eq!(a.cluster(k(5)).unwrap(), b.cluster(k(5)).unwrap());

        let expected = Kmeans::run_slice(&test_data_1024(), k(5), options.seed(99)).unwrap();
        assert_eq!(a.clustering(k(5)).unwrap(), &expected);
    }

    #[cfg(feature = "threads")]
    #[test]
    fn parallel_matches_serial() {
        let mut serial = Quantizer::new(test_image());
        let mut parallel = Quantizer::new(test_image()).parallel(true);
        for n in [2, 7] {
            assert_eq!(serial.cluster(k(n)).unwrap(), parallel.cluster(k(n)).unwrap());
            assert_eq!(serial.quantize(k(n)).unwrap(), parallel.quantize(k(n)).unwrap());
        }
    }
}
