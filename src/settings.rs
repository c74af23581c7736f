/// Tunable constants for sizing and frame timing.
///
/// Every field has a default, so a partial settings file only needs to
/// name the values it overrides.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ViewerSettings {
    /// Lower edge of the initial clamp band
    pub min_dimension: u32,
    /// Upper edge of the initial clamp band
    pub max_dimension: u32,
    /// Factor applied by a grow step
    pub grow_factor: f64,
    /// Factor applied by a shrink step
    pub shrink_factor: f64,
    /// Display duration used when a frame carries none
    pub default_delay_ms: u32,
    /// Largest number of pixels per frame a resize may request
    pub max_area: u64,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            min_dimension: 200,
            max_dimension: 1000,
            grow_factor: 1.1,
            shrink_factor: 0.9,
            default_delay_ms: 100,
            max_area: crate::FrameDecoder::DEFAULT_MAX_AREA,
        }
    }
}

impl ViewerSettings {
    /// Parse a settings TOML string.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// The size policy described by these settings.
    pub fn size_policy(&self) -> crate::SizePolicy {
        crate::SizePolicy::new(self.min_dimension, self.max_dimension)
    }

    /// The frame decoder described by these settings.
    pub fn frame_decoder(&self) -> crate::FrameDecoder {
        crate::FrameDecoder::new(self.default_delay_ms).with_max_area(self.max_area)
    }
}
