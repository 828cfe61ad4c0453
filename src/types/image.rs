use crate::{ColorMap, MAX_PIXELS};
use core::{
    error::Error,
    fmt::{self, Debug},
    marker::PhantomData,
};

/// The error returned when an [`Image`] failed to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateImageError {
    /// The provided image width.
    width: u32,
    /// The provided image height.
    height: u32,
    /// The length of the pixel buffer.
    length: usize,
}

impl fmt::Display for CreateImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { width, height, length } = *self;
        if width.checked_mul(height).is_some() {
            write!(
                f,
                "image dimensions of ({width}, {height}) do not match the buffer length of {length}"
            )
        } else {
            write!(
                f,
                "image dimensions of ({width}, {height}) are above the maximum number of pixels of {MAX_PIXELS}",
            )
        }
    }
}

impl Error for CreateImageError {}

/// The error returned when an [`Image`] failed to be created. Includes the pixel buffer used to try
/// and create the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateImageBufError<T> {
    /// The underlying error/reason.
    pub error: CreateImageError,
    /// The provided container holding the pixels of the image.
    pub buffer: T,
}

impl<T> fmt::Display for CreateImageBufError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<T: Debug> Error for CreateImageBufError<T> {}

/// A grid of pixels parameterized by the type of the container.
///
/// Typically you want to use one of the aliases with a defined container:
/// - [`ImageBuf`]: an owned image backed by a [`Vec`].
/// - [`ImageRef`]: a borrowed image backed by an immutable slice reference.
///
/// Pixels are stored in row-major order and the length of the pixel container always equals
/// `width * height`.
#[derive(Clone, Copy, Debug)]
pub struct Image<Color, Container> {
    /// The color type stored in `pixels`.
    color: PhantomData<Color>,
    /// The width of the image.
    width: u32,
    /// The height of the image.
    height: u32,
    /// The pixel buffer or slice.
    pixels: Container,
}

/// An owned image buffer backed by a [`Vec`].
///
/// # Examples
///
/// ```
/// # use colorcluster::{ImageBuf, CreateImageBufError};
/// # use palette::Srgb;
/// # fn main() -> Result<(), CreateImageBufError<Vec<Srgb<u8>>>> {
/// let (width, height) = (64, 32);
/// let pixels = vec![Srgb::new(0, 0, 0); (width * height) as usize];
/// let image = ImageBuf::new(width, height, pixels)?;
/// assert_eq!(image.num_pixels(), 64 * 32);
/// # Ok(())
/// # }
/// ```
pub type ImageBuf<Color> = Image<Color, Vec<Color>>;

/// A borrowed image backed by a reference to a slice.
///
/// Use [`ImageBuf::as_ref`] to borrow an owned image.
pub type ImageRef<'a, Color> = Image<Color, &'a [Color]>;

impl<Color, Container> Image<Color, Container> {
    /// Returns the width and height of the [`Image`].
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the width of the [`Image`].
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the [`Image`].
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns whether the [`Image`] has zero pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the underlying pixel container.
    #[must_use]
    #[inline]
    pub fn into_inner(self) -> Container {
        self.pixels
    }
}

impl<Color, Container: AsRef<[Color]>> Image<Color, Container> {
    /// Create a new [`Image`] without validating invariants.
    #[inline]
    pub(crate) fn new_unchecked(width: u32, height: u32, pixels: Container) -> Self {
        debug_assert_eq!(
            width.checked_mul(height).map(|len| len as usize),
            Some(pixels.as_ref().len())
        );
        Self {
            color: PhantomData,
            width,
            height,
            pixels,
        }
    }

    /// Create a new [`Image`] from a width, a height, and a `Container` of pixels.
    ///
    /// # Errors
    ///
    /// The provided `pixels` is returned as an `Err` if any of the following are true:
    /// - The length of `pixels` and `width * height` do not match.
    /// - `width * height` overflows a `u32`.
    #[inline]
    pub fn new(
        width: u32,
        height: u32,
        pixels: Container,
    ) -> Result<Self, CreateImageBufError<Container>> {
        let length = pixels.as_ref().len();
        if width.checked_mul(height).map(|len| len as usize) == Some(length) {
            Ok(Self::new_unchecked(width, height, pixels))
        } else {
            let error = CreateImageError { width, height, length };
            Err(CreateImageBufError { error, buffer: pixels })
        }
    }

    /// Returns the number of pixels in the [`Image`] specified by `width * height`.
    #[allow(clippy::cast_possible_truncation)]
    #[inline]
    pub fn num_pixels(&self) -> u32 {
        self.pixels.as_ref().len() as u32
    }

    /// Returns a reference to the underlying pixels as a slice in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[Color] {
        self.pixels.as_ref()
    }

    /// Returns the pixel at column `x` and row `y`, or `None` if it is out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<&Color> {
        if x < self.width && y < self.height {
            self.as_slice().get(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Returns an iterator over the rows of the [`Image`].
    #[inline]
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[Color]> {
        // a zero width means there are no pixels, but chunks_exact panics on a zero chunk size
        self.as_slice().chunks_exact((self.width as usize).max(1))
    }

    /// Convert an [`Image`] to an [`ImageRef`].
    #[inline]
    pub fn as_ref(&self) -> ImageRef<'_, Color> {
        let (width, height) = self.dimensions();
        Image::new_unchecked(width, height, self.as_slice())
    }

    /// Convert an [`Image`] to an owned [`ImageBuf`].
    #[must_use]
    #[inline]
    pub fn to_owned(&self) -> ImageBuf<Color>
    where
        Color: Clone,
    {
        let (width, height) = self.dimensions();
        Image::new_unchecked(width, height, self.as_slice().to_vec())
    }

    /// Map the pixel buffer of an [`Image`] to a new buffer type and/or color type.
    ///
    /// Rather than being a function from `Color -> NewColor`, `mapping` takes the whole pixel
    /// slice and returns a new buffer. This is to allow batch or parallel mappings.
    ///
    /// # Panics
    ///
    /// Panics if `mapping` returns a container with a different length than the original container.
    #[must_use]
    #[inline]
    pub fn map_ref<NewColor, NewContainer>(
        &self,
        mapping: impl FnOnce(&[Color]) -> NewContainer,
    ) -> Image<NewColor, NewContainer>
    where
        NewContainer: AsRef<[NewColor]>,
    {
        let num_pixels = self.num_pixels();
        let (width, height) = self.dimensions();
        let pixels = mapping(self.pixels.as_ref());
        assert_eq!(pixels.as_ref().len(), num_pixels as usize);
        Image::new_unchecked(width, height, pixels)
    }

    /// Map the pixel buffer of an [`Image`] using the provided [`ColorMap`].
    ///
    /// The returned image always has the same dimensions as `self`.
    ///
    /// # Panics
    ///
    /// Panics if `color_map` is not a valid implementor of [`ColorMap`]. That is, it returns
    /// a [`Vec`] with a different length than the input slice.
    #[must_use]
    #[inline]
    pub fn map_to_image<Map: ColorMap<Color>>(&self, color_map: &Map) -> ImageBuf<Map::Output> {
        self.map_ref(|pixels| color_map.map_to_colors(pixels))
    }
}

impl<Color> Default for ImageBuf<Color> {
    #[inline]
    fn default() -> Self {
        Self::new_unchecked(0, 0, Vec::new())
    }
}

impl<Color> Default for ImageRef<'_, Color> {
    #[inline]
    fn default() -> Self {
        Self::new_unchecked(0, 0, &[])
    }
}

impl<ColorA, ColorB, ContainerA, ContainerB> PartialEq<Image<ColorB, ContainerB>>
    for Image<ColorA, ContainerA>
where
    ColorA: PartialEq<ColorB>,
    ContainerA: AsRef<[ColorA]>,
    ContainerB: AsRef<[ColorB]>,
{
    fn eq(&self, other: &Image<ColorB, ContainerB>) -> bool {
        self.dimensions() == other.dimensions() && self.as_slice() == other.as_slice()
    }
}

impl<Color, Container> Eq for Image<Color, Container>
where
    Color: PartialEq<Color>,
    Container: AsRef<[Color]>,
{
}

#[cfg(feature = "image")]
mod image_integration {
    use super::{CreateImageBufError, CreateImageError, Image, ImageBuf, ImageRef};
    use image::RgbImage;
    use palette::{
        Srgb,
        cast::{ComponentsAs as _, ComponentsInto as _, IntoComponents as _},
    };

    impl From<ImageBuf<Srgb<u8>>> for RgbImage {
        #[allow(clippy::expect_used)]
        fn from(image: ImageBuf<Srgb<u8>>) -> Self {
            let Image { width, height, pixels, .. } = image;
            RgbImage::from_raw(width, height, pixels.into_components())
                .expect("buffer is large enough")
        }
    }

    impl TryFrom<RgbImage> for ImageBuf<Srgb<u8>> {
        type Error = CreateImageBufError<RgbImage>;

        fn try_from(image: RgbImage) -> Result<Self, Self::Error> {
            let (width, height) = image.dimensions();
            if let Some(len) = width.checked_mul(height) {
                let mut buf = image.into_raw();
                buf.truncate(len as usize * 3);
                assert_eq!(buf.len(), len as usize * 3); // in case buf.len() < len * 3
                let pixels = buf.components_into();
                Ok(Self::new_unchecked(width, height, pixels))
            } else {
                let error = CreateImageError {
                    width,
                    height,
                    length: image.pixels().len(),
                };
                Err(CreateImageBufError { error, buffer: image })
            }
        }
    }

    impl<'a> TryFrom<&'a RgbImage> for ImageRef<'a, Srgb<u8>> {
        type Error = CreateImageError;

        fn try_from(image: &'a RgbImage) -> Result<Self, Self::Error> {
            let (width, height) = image.dimensions();
            let raw = image.as_raw();
            match width.checked_mul(height) {
                Some(len) if len as usize * 3 <= raw.len() => {
                    let pixels = raw[..len as usize * 3].components_as();
                    Ok(Self::new_unchecked(width, height, pixels))
                }
                _ => Err(CreateImageError { width, height, length: raw.len() / 3 }),
            }
        }
    }
}
