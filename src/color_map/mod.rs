//! Map the colors of an image to a restricted set of palette colors.

mod nearest_neighbor;

pub use nearest_neighbor::*;

/// A trait for mapping colors to a restricted set of palette colors.
///
/// Implementors consist of a palette and a lookup to map any input color to one of the palette
/// colors.
///
/// The main function of interest is [`palette_index`](ColorMap::palette_index) which takes
/// a color as input and returns an index into [`palette`](ColorMap::palette). The other
/// mapping functions have default implementations based off
/// [`palette_index`](ColorMap::palette_index), but these should be overridden with more
/// efficient implementations where it makes sense (e.g., to run in parallel).
///
/// You likely want to use [`Image::map_to_image`](crate::Image::map_to_image) rather than
/// calling these functions directly.
pub trait ColorMap<Input> {
    /// The output color type.
    type Output: Clone + Send + Sync;

    /// Returns a reference to the palette of output colors.
    fn palette(&self) -> &[Self::Output];

    /// Returns the index of the palette color for the given input `color`.
    fn palette_index(&self, color: &Input) -> u32;

    /// Returns the palette color for the given input `color`.
    #[inline]
    fn palette_color(&self, color: &Input) -> Self::Output {
        self.palette()[self.palette_index(color) as usize].clone()
    }

    /// Map each `input` color to an index for one of the palette colors.
    #[inline]
    fn map_to_indices(&self, input: &[Input]) -> Vec<u32> {
        input
            .iter()
            .map(|color| self.palette_index(color))
            .collect()
    }

    /// Map each `input` color to one of the palette colors.
    #[inline]
    fn map_to_colors(&self, input: &[Input]) -> Vec<Self::Output> {
        input.iter().map(|color| self.palette_color(color)).collect()
    }
}

impl<Input, M> ColorMap<Input> for &M
where
    M: ColorMap<Input>,
{
    type Output = M::Output;

    #[inline]
    fn palette(&self) -> &[Self::Output] {
        (*self).palette()
    }

    #[inline]
    fn palette_index(&self, color: &Input) -> u32 {
        (*self).palette_index(color)
    }

    #[inline]
    fn palette_color(&self, color: &Input) -> Self::Output {
        (*self).palette_color(color)
    }

    #[inline]
    fn map_to_indices(&self, input: &[Input]) -> Vec<u32> {
        (*self).map_to_indices(input)
    }

    #[inline]
    fn map_to_colors(&self, input: &[Input]) -> Vec<Self::Output> {
        (*self).map_to_colors(input)
    }
}
