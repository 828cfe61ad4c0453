//! Reduce the colors of an image to `k` representative colors using batch k-means clustering.
//!
//! The clustering runs in three steps:
//! 1. [`kmeans::partition`] shuffles the pixels with a seeded generator, splits them into `k` groups,
//!    and uses the sorted group means as the initial [`CentroidSet`].
//! 2. [`kmeans::Kmeans`] repeatedly assigns every pixel to its nearest centroid and replaces each
//!    centroid with the mean of its pixels until no centroid moves more than the tolerance.
//! 3. [`NearestCentroidColorMap`] replaces every pixel with its nearest rounded centroid.
//!
//! The [`Quantizer`] ties these together and caches the results for each cluster count.
//!
//! # Examples
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use colorcluster::{ClusterCount, ImageBuf, Quantizer};
//! use palette::Srgb;
//!
//! let pixels = vec![
//!     Srgb::new(0, 0, 0),
//!     Srgb::new(10, 10, 10),
//!     Srgb::new(250, 250, 250),
//!     Srgb::new(255, 255, 255),
//! ];
//! let image = ImageBuf::new(2, 2, pixels)?;
//!
//! let k = ClusterCount::try_from(2u32)?;
//! let mut quantizer = Quantizer::new(image);
//! quantizer.cluster(k)?;
//! let quantized = quantizer.quantize(k)?;
//!
//! assert_eq!(quantized.dimensions(), (2, 2));
//! assert_eq!(quantized.as_slice()[0], Srgb::new(5, 5, 5));
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `threads` (default): adds parallel versions of the assignment and remapping passes using
//!   [`rayon`](https://docs.rs/rayon).
//! - `image`: adds conversions to and from [`image::RgbImage`] and the [`resize`] module.

mod api;
mod color_map;
mod quantize;
#[cfg(feature = "image")]
pub mod resize;
mod types;

pub use api::*;
pub use color_map::*;
pub use quantize::*;
pub use types::*;

pub use palette;

/// The maximum number of pixels in an image or input slice, which is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;

#[cfg(test)]
pub(crate) mod tests {
    use palette::Srgb;

    /// Deterministic, well spread colors generated with a linear congruential sequence.
    pub fn test_colors(len: usize) -> Vec<Srgb<u8>> {
        let mut state = 0x2545_f491_u32;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                let [r, g, b, _] = state.to_be_bytes();
                Srgb::new(r, g, b)
            })
            .collect()
    }

    pub fn test_data_256() -> Vec<Srgb<u8>> {
        test_colors(256)
    }

    pub fn test_data_1024() -> Vec<Srgb<u8>> {
        test_colors(1024)
    }

    /// Three tight blobs of colors around dark red, mid green, and light blue.
    pub fn three_blobs() -> Vec<Srgb<u8>> {
        let centers = [[40u8, 10, 10], [20, 140, 30], [170, 190, 240]];
        let offsets = [[0u8, 0, 0], [2, 1, 0], [1, 2, 3], [3, 0, 2], [0, 3, 1]];
        centers
            .iter()
            .flat_map(|c| {
                offsets
                    .iter()
                    .map(move |o| Srgb::new(c[0] + o[0], c[1] + o[1], c[2] + o[2]))
            })
            .collect()
    }
}
