//! Tracing parameter value types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Whether the tracer keeps colors or thresholds to black and white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Color,
    Binary,
}

impl ColorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Binary => "binary",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "color" | "colour" => Some(Self::Color),
            "binary" | "bw" => Some(Self::Binary),
            _ => None,
        }
    }
}

/// How overlapping color layers are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hierarchy {
    Stacked,
    Cutout,
}

impl Hierarchy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stacked => "stacked",
            Self::Cutout => "cutout",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stacked" => Some(Self::Stacked),
            "cutout" => Some(Self::Cutout),
            _ => None,
        }
    }
}

/// Curve fitting applied to traced outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveMode {
    Spline,
    Polygon,
    None,
}

impl CurveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spline => "spline",
            Self::Polygon => "polygon",
            Self::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spline" => Some(Self::Spline),
            "polygon" => Some(Self::Polygon),
            "none" | "pixel" => Some(Self::None),
            _ => None,
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CurveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) const COLOR_PRECISION_RANGE: std::ops::RangeInclusive<u8> = 1..=8;
pub(crate) const ANGLE_RANGE: std::ops::RangeInclusive<u32> = 0..=180;

/// Complete, validated set of tracing controls.
///
/// Values are only built from the preset table and by
/// [`resolve`](super::resolve), so every field is always populated and
/// inside its domain by the time it reaches a tracer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSet {
    #[serde(rename = "colormode")]
    pub(crate) color_mode: ColorMode,
    pub(crate) hierarchical: Hierarchy,
    #[serde(rename = "mode")]
    pub(crate) curve_mode: CurveMode,
    pub(crate) filter_speckle: u32,
    pub(crate) color_precision: u8,
    pub(crate) layer_difference: u32,
    pub(crate) corner_threshold: u32,
    pub(crate) length_threshold: f64,
    pub(crate) max_iterations: u32,
    pub(crate) splice_threshold: u32,
    pub(crate) path_precision: u32,
}

impl ParameterSet {
    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn hierarchical(&self) -> Hierarchy {
        self.hierarchical
    }

    pub fn curve_mode(&self) -> CurveMode {
        self.curve_mode
    }

    /// Speckles smaller than this many pixels are discarded.
    pub fn filter_speckle(&self) -> u32 {
        self.filter_speckle
    }

    /// Significant bits per channel used for color quantization (1-8).
    pub fn color_precision(&self) -> u8 {
        self.color_precision
    }

    /// Color difference between gradient layers.
    pub fn layer_difference(&self) -> u32 {
        self.layer_difference
    }

    /// Minimum angle in degrees to be treated as a corner.
    pub fn corner_threshold(&self) -> u32 {
        self.corner_threshold
    }

    /// Minimum segment length.
    pub fn length_threshold(&self) -> f64 {
        self.length_threshold
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Minimum angle displacement in degrees to splice a spline.
    pub fn splice_threshold(&self) -> u32 {
        self.splice_threshold
    }

    /// Decimal places kept in path coordinates.
    pub fn path_precision(&self) -> u32 {
        self.path_precision
    }

    /// Checks every field against its domain.
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if !COLOR_PRECISION_RANGE.contains(&self.color_precision) {
            return Err(ValidationError::out_of_range(
                "color_precision",
                self.color_precision,
                "1..=8",
            ));
        }
        if !ANGLE_RANGE.contains(&self.corner_threshold) {
            return Err(ValidationError::out_of_range(
                "corner_threshold",
                self.corner_threshold,
                "0..=180 degrees",
            ));
        }
        if !self.length_threshold.is_finite() || self.length_threshold < 0.0 {
            return Err(ValidationError::out_of_range(
                "length_threshold",
                self.length_threshold,
                "a finite number >= 0",
            ));
        }
        if self.max_iterations == 0 {
            return Err(ValidationError::out_of_range(
                "max_iterations",
                self.max_iterations,
                ">= 1",
            ));
        }
        if !ANGLE_RANGE.contains(&self.splice_threshold) {
            return Err(ValidationError::out_of_range(
                "splice_threshold",
                self.splice_threshold,
                "0..=180 degrees",
            ));
        }
        Ok(())
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        super::presets::preset(super::PresetName::Default)
            .parameters
            .clone()
    }
}

/// Per-field overrides layered on top of a preset.
///
/// Absent fields keep the preset's value. Values are range-checked only when
/// resolved, so a caller can collect overrides from loosely typed input
/// (form fields, CLI flags) before validating them in one place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterOverrides {
    #[serde(default, rename = "colormode", skip_serializing_if = "Option::is_none")]
    pub color_mode: Option<ColorMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchical: Option<Hierarchy>,
    #[serde(default, rename = "mode", skip_serializing_if = "Option::is_none")]
    pub curve_mode: Option<CurveMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_speckle: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_precision: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_difference: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splice_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_precision: Option<u32>,
}

/// Wire names accepted by [`ParameterOverrides::set_field`].
pub const OVERRIDE_FIELDS: [&str; 11] = [
    "colormode",
    "hierarchical",
    "mode",
    "filter_speckle",
    "color_precision",
    "layer_difference",
    "corner_threshold",
    "length_threshold",
    "max_iterations",
    "splice_threshold",
    "path_precision",
];

impl ParameterOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when no field is overridden.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Sets one field from its textual form.
    ///
    /// Returns `Ok(false)` when `name` is not a parameter field, so callers
    /// reading mixed form data can skip unrelated keys.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<bool, ValidationError> {
        let value = value.trim();
        match name {
            "colormode" | "color_mode" => {
                self.color_mode = Some(parse_enum("colormode", value, ColorMode::parse)?)
            }
            "hierarchical" => {
                self.hierarchical = Some(parse_enum("hierarchical", value, Hierarchy::parse)?)
            }
            "mode" | "curve_mode" => {
                self.curve_mode = Some(parse_enum("mode", value, CurveMode::parse)?)
            }
            "filter_speckle" => self.filter_speckle = Some(parse_number("filter_speckle", value)?),
            "color_precision" => {
                self.color_precision = Some(parse_number("color_precision", value)?)
            }
            "layer_difference" => {
                self.layer_difference = Some(parse_number("layer_difference", value)?)
            }
            "corner_threshold" => {
                self.corner_threshold = Some(parse_number("corner_threshold", value)?)
            }
            "length_threshold" => {
                self.length_threshold = Some(parse_number("length_threshold", value)?)
            }
            "max_iterations" => self.max_iterations = Some(parse_number("max_iterations", value)?),
            "splice_threshold" => {
                self.splice_threshold = Some(parse_number("splice_threshold", value)?)
            }
            "path_precision" => self.path_precision = Some(parse_number("path_precision", value)?),
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub(crate) fn apply_to(&self, params: &mut ParameterSet) {
        if let Some(v) = self.color_mode {
            params.color_mode = v;
        }
        if let Some(v) = self.hierarchical {
            params.hierarchical = v;
        }
        if let Some(v) = self.curve_mode {
            params.curve_mode = v;
        }
        if let Some(v) = self.filter_speckle {
            params.filter_speckle = v;
        }
        if let Some(v) = self.color_precision {
            params.color_precision = v;
        }
        if let Some(v) = self.layer_difference {
            params.layer_difference = v;
        }
        if let Some(v) = self.corner_threshold {
            params.corner_threshold = v;
        }
        if let Some(v) = self.length_threshold {
            params.length_threshold = v;
        }
        if let Some(v) = self.max_iterations {
            params.max_iterations = v;
        }
        if let Some(v) = self.splice_threshold {
            params.splice_threshold = v;
        }
        if let Some(v) = self.path_precision {
            params.path_precision = v;
        }
    }
}

fn parse_enum<T>(
    field: &'static str,
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, ValidationError> {
    parse(value).ok_or_else(|| ValidationError::InvalidValue {
        field,
        value: value.to_string(),
    })
}

fn parse_number<T: std::str::FromStr>(
    field: &'static str,
    value: &str,
) -> Result<T, ValidationError> {
    value.parse().map_err(|_| ValidationError::InvalidValue {
        field,
        value: value.to_string(),
    })
}
