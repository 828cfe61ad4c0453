use crate::{CentroidSet, ColorMap};
use palette::{Srgb, cast};

/// Returns the euclidean distance between two colors.
///
/// # Examples
///
/// ```
/// # use colorcluster::distance;
/// # use palette::Srgb;
/// assert_eq!(distance(Srgb::new(0, 0, 0), Srgb::new(0, 3, 4)), 5.0);
/// ```
#[inline]
pub fn distance(a: Srgb<u8>, b: Srgb<u8>) -> f64 {
    squared_distance(channels(a), channels(b)).sqrt()
}

/// Returns the squared euclidean distance between two color triples.
#[inline]
pub(crate) fn squared_distance(x: [f64; 3], y: [f64; 3]) -> f64 {
    let mut dist = 0.0;
    for c in 0..3 {
        let d = x[c] - y[c];
        dist += d * d;
    }
    dist
}

/// Returns the channels of `color` as floats.
#[inline]
pub(crate) fn channels(color: Srgb<u8>) -> [f64; 3] {
    cast::into_array(color).map(f64::from)
}

/// Compute the index of the nearest centroid to `color` and the squared distance to it.
///
/// Squared distance is monotone in the euclidean distance, so the comparison order is the same.
/// Only a strictly smaller distance replaces the current minimum, which means the lowest index
/// wins on ties.
#[inline]
pub(crate) fn argmin_distance(centroids: &[[f64; 3]], color: [f64; 3]) -> (usize, f64) {
    let mut min_index = 0;
    let mut min_distance = f64::INFINITY;
    for (i, &centroid) in centroids.iter().enumerate() {
        let distance = squared_distance(centroid, color);
        if distance < min_distance {
            min_distance = distance;
            min_index = i;
        }
    }
    (min_index, min_distance)
}

/// A [`ColorMap`] that maps input colors to their nearest rounded centroid according to
/// euclidean distance.
///
/// Distances are measured to the rounded centroid colors, so every color of the palette maps
/// to itself. This makes remapping an already remapped image a no-op.
#[derive(Clone, Debug)]
pub struct NearestCentroidColorMap {
    /// The rounded centroid colors.
    palette: Vec<Srgb<u8>>,
    /// `palette` as float triples.
    data: Vec<[f64; 3]>,
}

impl NearestCentroidColorMap {
    /// Create a new [`NearestCentroidColorMap`] from the rounded colors of a [`CentroidSet`].
    #[must_use]
    pub fn new(centroids: &CentroidSet) -> Self {
        let palette = centroids.rounded().to_vec();
        let data = palette.iter().copied().map(channels).collect();
        Self { palette, data }
    }

    /// Compute the index of the nearest palette color to `color`.
    #[inline]
    fn map_to_index(&self, color: Srgb<u8>) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        {
            argmin_distance(&self.data, channels(color)).0 as u32
        }
    }

    /// Replace a slice of colors with their nearest palette color.
    #[inline]
    pub fn map_slice_in_place(&self, colors: &mut [Srgb<u8>]) {
        for color in colors {
            *color = self.palette[self.map_to_index(*color) as usize];
        }
    }

    /// Consume a [`NearestCentroidColorMap`] and return the underlying color palette.
    #[must_use]
    #[inline]
    pub fn into_palette(self) -> Vec<Srgb<u8>> {
        self.palette
    }
}

impl ColorMap<Srgb<u8>> for NearestCentroidColorMap {
    type Output = Srgb<u8>;

    #[inline]
    fn palette(&self) -> &[Self::Output] {
        &self.palette
    }

    #[inline]
    fn palette_index(&self, color: &Srgb<u8>) -> u32 {
        self.map_to_index(*color)
    }
}

#[cfg(feature = "threads")]
mod parallel {
    use super::NearestCentroidColorMap;
    use crate::{CentroidSet, ColorMap};
    use palette::Srgb;
    use rayon::prelude::*;

    /// A [`ColorMap`] that maps input colors to their nearest rounded centroid according to
    /// euclidean distance in parallel.
    #[derive(Clone, Debug)]
    pub struct NearestCentroidParallelColorMap(NearestCentroidColorMap);

    impl NearestCentroidParallelColorMap {
        /// Create a new [`NearestCentroidParallelColorMap`] from the rounded colors of a
        /// [`CentroidSet`].
        #[must_use]
        #[inline]
        pub fn new(centroids: &CentroidSet) -> Self {
            Self(NearestCentroidColorMap::new(centroids))
        }

        /// Convert a [`NearestCentroidParallelColorMap`] to a [`NearestCentroidColorMap`].
        #[must_use]
        #[inline]
        pub fn into_serial(self) -> NearestCentroidColorMap {
            self.0
        }

        /// Replace a slice of colors with their nearest palette color.
        #[inline]
        pub fn map_slice_in_place(&self, colors: &mut [Srgb<u8>]) {
            colors
                .par_iter_mut()
                .for_each(|color| *color = self.palette_color(color));
        }
    }

    impl NearestCentroidColorMap {
        /// Convert a [`NearestCentroidColorMap`] to a [`NearestCentroidParallelColorMap`].
        #[must_use]
        #[inline]
        pub fn into_parallel(self) -> NearestCentroidParallelColorMap {
            NearestCentroidParallelColorMap(self)
        }
    }

    impl From<NearestCentroidColorMap> for NearestCentroidParallelColorMap {
        #[inline]
        fn from(color_map: NearestCentroidColorMap) -> Self {
            color_map.into_parallel()
        }
    }

    impl From<NearestCentroidParallelColorMap> for NearestCentroidColorMap {
        #[inline]
        fn from(color_map: NearestCentroidParallelColorMap) -> Self {
            color_map.into_serial()
        }
    }

    impl ColorMap<Srgb<u8>> for NearestCentroidParallelColorMap {
        type Output = Srgb<u8>;

        #[inline]
        fn palette(&self) -> &[Self::Output] {
            self.0.palette()
        }

        #[inline]
        fn palette_index(&self, color: &Srgb<u8>) -> u32 {
            self.0.palette_index(color)
        }

        #[inline]
        fn map_to_indices(&self, input: &[Srgb<u8>]) -> Vec<u32> {
            input
                .par_iter()
                .map(|color| self.palette_index(color))
                .collect()
        }

        #[inline]
        fn map_to_colors(&self, input: &[Srgb<u8>]) -> Vec<Self::Output> {
            input
                .par_iter()
                .map(|color| self.palette_color(color))
                .collect()
        }
    }
}

#[cfg(feature = "threads")]
pub use parallel::*;
