use core::{
    error::Error,
    fmt,
    num::{NonZeroU32, NonZeroUsize},
    str::FromStr,
};

/// The error returned when attempting to convert an out of range integer into a [`ClusterCount`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ClusterCountFromIntError(());

impl fmt::Display for ClusterCountFromIntError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("out of range conversion from integer to cluster count")
    }
}

impl Error for ClusterCountFromIntError {}

/// The error returned when a string could not be parsed as a [`ClusterCount`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseClusterCountError {
    /// The string was not a valid unsigned integer.
    Int(core::num::ParseIntError),
    /// The integer was zero.
    OutOfRange(ClusterCountFromIntError),
}

impl fmt::Display for ParseClusterCountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(error) => fmt::Display::fmt(error, f),
            Self::OutOfRange(error) => fmt::Display::fmt(error, f),
        }
    }
}

impl Error for ParseClusterCountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Int(error) => Some(error),
            Self::OutOfRange(error) => Some(error),
        }
    }
}

/// The number of clusters, `k`, to reduce an image to.
///
/// This is a simple new type wrapper around [`NonZeroU32`], so a cluster count of zero
/// cannot be represented. Whether `k` is valid for a particular input (it must not exceed the
/// number of pixels) is checked when clustering starts.
///
/// # Examples
///
/// ```
/// # use core::num::NonZeroU32;
/// # use colorcluster::{ClusterCount, ClusterCountFromIntError};
/// # fn main() -> Result<(), ClusterCountFromIntError> {
/// let k: ClusterCount = 16u32.try_into()?;
/// assert_eq!(k, 16u32);
/// assert_eq!(ClusterCount::try_from(8usize)?, 8usize);
/// assert_eq!(ClusterCount::try_from_u32(0), None);
/// assert_eq!(ClusterCount::from_nz_u32(NonZeroU32::MIN), ClusterCount::MIN);
/// assert_eq!("4".parse::<ClusterCount>().ok(), ClusterCount::try_from_u32(4));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ClusterCount(NonZeroU32);

impl ClusterCount {
    /// The smallest possible cluster count, which is `1`.
    pub const MIN: Self = Self(NonZeroU32::MIN);

    /// Returns a [`ClusterCount`] as a [`NonZeroU32`].
    #[inline]
    pub const fn as_nz_u32(&self) -> NonZeroU32 {
        self.0
    }

    /// Returns a [`ClusterCount`] as a `u32`.
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0.get()
    }

    /// Returns a [`ClusterCount`] as a `usize`.
    #[inline]
    pub const fn as_usize(&self) -> usize {
        self.as_u32() as usize
    }

    /// Create a [`ClusterCount`] from a [`NonZeroU32`].
    #[inline]
    pub const fn from_nz_u32(value: NonZeroU32) -> Self {
        Self(value)
    }

    /// Create a [`ClusterCount`] from a `u32`, returning `None` if `value` is zero.
    #[must_use]
    #[inline]
    pub const fn try_from_u32(value: u32) -> Option<Self> {
        if let Some(value) = NonZeroU32::new(value) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create a [`ClusterCount`] from a `usize`, returning `None` if `value` is zero
    /// or does not fit in a `u32`.
    #[must_use]
    #[inline]
    pub const fn try_from_usize(value: usize) -> Option<Self> {
        if value <= u32::MAX as usize {
            #[allow(clippy::cast_possible_truncation)]
            {
                Self::try_from_u32(value as u32)
            }
        } else {
            None
        }
    }
}

impl From<NonZeroU32> for ClusterCount {
    #[inline]
    fn from(value: NonZeroU32) -> Self {
        Self::from_nz_u32(value)
    }
}

impl From<ClusterCount> for NonZeroU32 {
    #[inline]
    fn from(k: ClusterCount) -> Self {
        k.as_nz_u32()
    }
}

impl From<ClusterCount> for u32 {
    #[inline]
    fn from(k: ClusterCount) -> Self {
        k.as_u32()
    }
}

impl From<ClusterCount> for usize {
    #[inline]
    fn from(k: ClusterCount) -> Self {
        k.as_usize()
    }
}

impl TryFrom<u32> for ClusterCount {
    type Error = ClusterCountFromIntError;

    #[inline]
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::try_from_u32(value).ok_or(ClusterCountFromIntError(()))
    }
}

impl TryFrom<usize> for ClusterCount {
    type Error = ClusterCountFromIntError;

    #[inline]
    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::try_from_usize(value).ok_or(ClusterCountFromIntError(()))
    }
}

impl TryFrom<NonZeroUsize> for ClusterCount {
    type Error = ClusterCountFromIntError;

    #[inline]
    fn try_from(value: NonZeroUsize) -> Result<Self, Self::Error> {
        Self::try_from(value.get())
    }
}

impl FromStr for ClusterCount {
    type Err = ParseClusterCountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s.parse().map_err(ParseClusterCountError::Int)?;
        value.try_into().map_err(ParseClusterCountError::OutOfRange)
    }
}

impl PartialEq<u32> for ClusterCount {
    #[inline]
    fn eq(&self, other: &u32) -> bool {
        self.as_u32() == *other
    }
}

impl PartialEq<ClusterCount> for u32 {
    #[inline]
    fn eq(&self, other: &ClusterCount) -> bool {
        *self == other.as_u32()
    }
}

impl PartialEq<usize> for ClusterCount {
    #[inline]
    fn eq(&self, other: &usize) -> bool {
        self.as_usize() == *other
    }
}

impl PartialEq<ClusterCount> for usize {
    #[inline]
    fn eq(&self, other: &ClusterCount) -> bool {
        *self == other.as_usize()
    }
}

impl fmt::Display for ClusterCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(k) = *self;
        write!(f, "{k}")
    }
}
