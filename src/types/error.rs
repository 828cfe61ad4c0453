use crate::ClusterCount;
use core::{
    error::Error,
    fmt::{self, Debug},
    num::NonZeroU32,
};

/// The error returned when the length of a value or input is not in the supported range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthOutOfRange {
    /// The length of the provided value.
    len: usize,
    /// The minimum supported length.
    min: u32,
    /// The maximum supported length.
    max: u32,
}

impl LengthOutOfRange {
    #[inline]
    pub(crate) const fn check_u32<T>(slice: &[T], min: u32, max: u32) -> Result<u32, Self> {
        let len = slice.len();
        #[allow(clippy::cast_possible_truncation)]
        if min as usize <= len && len <= max as usize {
            Ok(len as u32)
        } else {
            Err(Self { len, min, max })
        }
    }

    #[inline]
    pub(crate) const fn check_nz_u32<T>(slice: &[T], max: u32) -> Result<NonZeroU32, Self> {
        let len = slice.len();
        #[allow(clippy::cast_possible_truncation)]
        if len <= max as usize {
            if let Some(length) = NonZeroU32::new(len as u32) {
                return Ok(length);
            }
        }
        Err(Self { len, min: 1, max })
    }

    /// Returns the length of the provided value.
    #[inline]
    pub const fn length(&self) -> usize {
        self.len
    }
}

impl fmt::Display for LengthOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { len, min, max } = *self;
        if min == 0 {
            write!(
                f,
                "got an input with length {len} which is above the maximum {max}",
            )
        } else {
            write!(
                f,
                "got an input with length {len} which is not in the supported range of {min}..={max}",
            )
        }
    }
}

impl Error for LengthOutOfRange {}

/// The error returned when a [`CentroidSet`](crate::CentroidSet) could not be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateCentroidsError {
    /// There were no means, or more than [`MAX_PIXELS`](crate::MAX_PIXELS) of them.
    Length(LengthOutOfRange),
    /// A channel of the mean at `index` was NaN or infinite.
    NonFinite {
        /// The index of the offending mean in the provided list.
        index: usize,
    },
}

impl fmt::Display for CreateCentroidsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Length(error) => fmt::Display::fmt(&error, f),
            Self::NonFinite { index } => write!(f, "the mean at index {index} is not finite"),
        }
    }
}

impl Error for CreateCentroidsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Length(error) => Some(error),
            Self::NonFinite { .. } => None,
        }
    }
}

impl From<LengthOutOfRange> for CreateCentroidsError {
    #[inline]
    fn from(error: LengthOutOfRange) -> Self {
        Self::Length(error)
    }
}

/// The error returned when clustering could not be started or its results are unavailable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClusterError {
    /// The input has no pixels, so there is nothing to partition.
    EmptyInput,
    /// The cluster count is larger than the number of pixels, so some initial groups would
    /// have no members.
    ClusterCountAboveInputLength {
        /// The requested number of clusters.
        k: ClusterCount,
        /// The number of pixels in the input.
        len: usize,
    },
    /// The input has more than [`MAX_PIXELS`](crate::MAX_PIXELS) pixels.
    InputTooLarge(LengthOutOfRange),
    /// The convergence tolerance was negative or not finite, so a run could never converge.
    InvalidTolerance(f64),
    /// Centroids were requested for a cluster count that has not been clustered yet.
    CentroidsNotComputed {
        /// The requested number of clusters.
        k: ClusterCount,
    },
}

impl fmt::Display for ClusterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::EmptyInput => f.write_str("cannot cluster an input with no pixels"),
            Self::ClusterCountAboveInputLength { k, len } => write!(
                f,
                "cannot split {len} pixels into {k} non-empty clusters",
            ),
            Self::InputTooLarge(error) => fmt::Display::fmt(&error, f),
            Self::InvalidTolerance(tolerance) => write!(
                f,
                "the tolerance {tolerance} is not a finite, non-negative number",
            ),
            Self::CentroidsNotComputed { k } => write!(f, "centroids not computed for k = {k}"),
        }
    }
}

impl Error for ClusterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InputTooLarge(error) => Some(error),
            _ => None,
        }
    }
}

impl From<LengthOutOfRange> for ClusterError {
    #[inline]
    fn from(error: LengthOutOfRange) -> Self {
        Self::InputTooLarge(error)
    }
}
