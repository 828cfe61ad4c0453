//! Resizing of images before clustering.
//!
//! Clustering time grows linearly with the number of pixels, so large inputs are usually
//! downscaled first. A [`Resize`] describes the target size relative to the input size, and
//! [`Resize::apply`] resamples an [`RgbImage`] with a triangle (bilinear) filter.

use crate::{CreateImageBufError, ImageBuf, ImageRef};
use core::{error::Error, fmt};
use image::{
    RgbImage,
    imageops::{self, FilterType},
};
use palette::Srgb;

/// How to compute the output size of a resize from the input size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resize {
    /// Resize to exactly this width and height.
    Exact {
        /// The output width.
        width: u32,
        /// The output height.
        height: u32,
    },
    /// Resize to this width and scale the height by the same ratio.
    Width(u32),
    /// Resize to this height and scale the width by the same ratio.
    Height(u32),
    /// Multiply both dimensions by this factor.
    Scale(f64),
}

/// The error returned when a [`Resize`] cannot be applied to an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeError {
    /// A requested width or height was zero.
    ZeroDimension,
    /// The scale factor was zero, negative, or not finite.
    InvalidScale(f64),
    /// The computed output size has a zero or out of range dimension.
    EmptyOutput {
        /// The input width.
        width: u32,
        /// The input height.
        height: u32,
    },
}

impl fmt::Display for ResizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ResizeError::ZeroDimension => write!(f, "cannot resize to a zero width or height"),
            ResizeError::InvalidScale(scale) => {
                write!(f, "the scale factor {scale} is not a positive finite number")
            }
            ResizeError::EmptyOutput { width, height } => write!(
                f,
                "resizing an image of size {width}x{height} would give an empty or oversized image",
            ),
        }
    }
}

impl Error for ResizeError {}

/// Scale `len` by `num / den`, truncating.
fn scale_by_ratio(len: u32, num: u32, den: u32) -> Option<u32> {
    if den == 0 {
        return None;
    }
    let scaled = u64::from(len) * u64::from(num) / u64::from(den);
    u32::try_from(scaled).ok().filter(|&len| len > 0)
}

/// Scale `len` by `factor`, truncating.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_by_factor(len: u32, factor: f64) -> Option<u32> {
    let scaled = (f64::from(len) * factor).trunc();
    (1.0..=f64::from(u32::MAX))
        .contains(&scaled)
        .then_some(scaled as u32)
}

impl Resize {
    /// Returns the output `(width, height)` for an input of the given size.
    ///
    /// Scaled dimensions are truncated toward zero.
    ///
    /// # Errors
    ///
    /// Returns an error if a requested dimension is zero, the scale factor is not a positive
    /// finite number, or a computed dimension is zero or larger than `u32::MAX`.
    ///
    /// # Examples
    ///
    /// ```
    /// use colorcluster::resize::Resize;
    ///
    /// assert_eq!(Resize::Width(100).dimensions(400, 301), Ok((100, 75)));
    /// assert_eq!(Resize::Scale(0.5).dimensions(401, 300), Ok((200, 150)));
    /// ```
    pub fn dimensions(self, width: u32, height: u32) -> Result<(u32, u32), ResizeError> {
        let empty = ResizeError::EmptyOutput { width, height };
        match self {
            Resize::Exact { width: 0, .. }
            | Resize::Exact { height: 0, .. }
            | Resize::Width(0)
            | Resize::Height(0) => Err(ResizeError::ZeroDimension),
            Resize::Exact { width, height } => Ok((width, height)),
            Resize::Width(new_width) => scale_by_ratio(height, new_width, width)
                .map(|new_height| (new_width, new_height))
                .ok_or(empty),
            Resize::Height(new_height) => scale_by_ratio(width, new_height, height)
                .map(|new_width| (new_width, new_height))
                .ok_or(empty),
            Resize::Scale(factor) if !(factor.is_finite() && factor > 0.0) => {
                Err(ResizeError::InvalidScale(factor))
            }
            Resize::Scale(factor) => scale_by_factor(width, factor)
                .zip(scale_by_factor(height, factor))
                .ok_or(empty),
        }
    }

    /// Resample `image` to the size given by [`dimensions`](Self::dimensions).
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`dimensions`](Self::dimensions).
    pub fn apply(self, image: &RgbImage) -> Result<RgbImage, ResizeError> {
        let (width, height) = self.dimensions(image.width(), image.height())?;
        log::debug!(
            "resizing {}x{} image to {width}x{height}",
            image.width(),
            image.height(),
        );
        Ok(imageops::resize(image, width, height, FilterType::Triangle))
    }

    /// Resample an [`ImageRef`] to the size given by [`dimensions`](Self::dimensions).
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`dimensions`](Self::dimensions).
    pub fn apply_image(
        self,
        image: ImageRef<'_, Srgb<u8>>,
    ) -> Result<ImageBuf<Srgb<u8>>, ResizeError> {
        let (width, height) = image.dimensions();
        let resized = self.apply(&image.to_owned().into())?;
        ImageBuf::try_from(resized)
            .map_err(|_: CreateImageBufError<_>| ResizeError::EmptyOutput { width, height })
    }
}
