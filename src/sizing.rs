//! Display size calculations: initial clamping and incremental scaling.

use crate::error::InvalidSizeInput;

/// Target display dimensions in pixels. Both dimensions are at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SizeSpec {
    pub width: u32,
    pub height: u32,
}

impl SizeSpec {
    /// Create a size, raising zero dimensions to 1.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Validate a signed width/height pair.
    pub fn try_from_dims(width: i64, height: i64) -> Result<Self, InvalidSizeInput> {
        Ok(Self {
            width: positive(width)?,
            height: positive(height)?,
        })
    }

    /// Parse the contents of the width and height text fields.
    ///
    /// Surrounding whitespace is ignored; anything else that is not a
    /// positive integer is rejected.
    ///
    /// ```rust
    /// use gif_view_core::SizeSpec;
    ///
    /// assert_eq!(SizeSpec::parse("300", " 240 ").unwrap(), SizeSpec::new(300, 240));
    /// assert!(SizeSpec::parse("3OO", "240").is_err());
    /// assert!(SizeSpec::parse("0", "240").is_err());
    /// ```
    pub fn parse(width: &str, height: &str) -> Result<Self, InvalidSizeInput> {
        Self::try_from_dims(parse_dim(width)?, parse_dim(height)?)
    }

    /// Number of pixels covered by this size.
    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl From<(u32, u32)> for SizeSpec {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

impl std::fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn parse_dim(text: &str) -> Result<i64, InvalidSizeInput> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| InvalidSizeInput::NotANumber(text.to_string()))
}

fn positive(value: i64) -> Result<u32, InvalidSizeInput> {
    if value < 1 {
        return Err(InvalidSizeInput::NonPositive(value));
    }
    u32::try_from(value).map_err(|_| InvalidSizeInput::OutOfRange(value))
}

/// Rules for the initial display size and for grow/shrink steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizePolicy {
    /// Smallest dimension an initial size may have
    pub min_dimension: u32,
    /// Largest dimension an initial size may have
    pub max_dimension: u32,
}

impl Default for SizePolicy {
    fn default() -> Self {
        Self::new(200, 1000)
    }
}

impl SizePolicy {
    pub fn new(min_dimension: u32, max_dimension: u32) -> Self {
        Self {
            min_dimension,
            max_dimension,
        }
    }

    /// Size at which a freshly opened image is first shown.
    ///
    /// Two clamps run in sequence on the same pair. A dimension below
    /// the band is lifted to its lower edge. If any dimension is above
    /// the band afterwards, both dimensions become the upper edge. Sizes
    /// already inside the band are returned unchanged.
    ///
    /// ```rust
    /// use gif_view_core::{SizePolicy, SizeSpec};
    ///
    /// let policy = SizePolicy::default();
    /// assert_eq!(policy.initial_size(150, 150), SizeSpec::new(200, 200));
    /// assert_eq!(policy.initial_size(1200, 400), SizeSpec::new(1000, 1000));
    /// assert_eq!(policy.initial_size(300, 300), SizeSpec::new(300, 300));
    /// ```
    pub fn initial_size(&self, width: u32, height: u32) -> SizeSpec {
        let (mut w, mut h) = (width, height);

        if w < self.min_dimension || h < self.min_dimension {
            w = w.max(self.min_dimension);
            h = h.max(self.min_dimension);
        }

        if w > self.max_dimension || h > self.max_dimension {
            w = self.max_dimension;
            h = self.max_dimension;
        }

        SizeSpec::new(w, h)
    }

    /// Multiply both dimensions by `factor`, truncating toward zero.
    ///
    /// Each dimension is floored at 1. The clamp band is not reapplied,
    /// so repeated steps may leave it in either direction.
    pub fn scale(current: SizeSpec, factor: f64) -> SizeSpec {
        SizeSpec::new(
            scale_dim(current.width, factor),
            scale_dim(current.height, factor),
        )
    }
}

fn scale_dim(dim: u32, factor: f64) -> u32 {
    let scaled = (dim as f64 * factor).trunc();
    if scaled.is_nan() || scaled < 1.0 {
        1
    } else if scaled >= u32::MAX as f64 {
        u32::MAX
    } else {
        scaled as u32
    }
}
