//! Built-in preset table.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{ColorMode, CurveMode, Hierarchy, ParameterSet};

/// Name of a built-in preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetName {
    Default,
    Logo,
    Photo,
    #[serde(alias = "lineart")]
    LineArt,
    Sketch,
    Minimal,
}

impl PresetName {
    pub const ALL: [PresetName; 6] = [
        Self::Default,
        Self::Logo,
        Self::Photo,
        Self::LineArt,
        Self::Sketch,
        Self::Minimal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Logo => "logo",
            Self::Photo => "photo",
            Self::LineArt => "line-art",
            Self::Sketch => "sketch",
            Self::Minimal => "minimal",
        }
    }

    /// Parses a preset name. `lineart` and `line_art` are accepted for line-art.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Some(Self::Default),
            "logo" => Some(Self::Logo),
            "photo" => Some(Self::Photo),
            "line-art" | "lineart" | "line_art" => Some(Self::LineArt),
            "sketch" => Some(Self::Sketch),
            "minimal" => Some(Self::Minimal),
            _ => None,
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, fixed bundle of tracing parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preset {
    pub name: PresetName,
    pub description: &'static str,
    pub parameters: ParameterSet,
}

static PRESETS: [Preset; 6] = [
    Preset {
        name: PresetName::Default,
        description: "Balanced settings for most images",
        parameters: ParameterSet {
            color_mode: ColorMode::Color,
            hierarchical: Hierarchy::Stacked,
            curve_mode: CurveMode::Spline,
            filter_speckle: 4,
            color_precision: 6,
            layer_difference: 16,
            corner_threshold: 60,
            length_threshold: 4.0,
            max_iterations: 10,
            splice_threshold: 45,
            path_precision: 3,
        },
    },
    Preset {
        name: PresetName::Logo,
        description: "Flat colors and clean edges for logos and icons",
        parameters: ParameterSet {
            color_mode: ColorMode::Color,
            hierarchical: Hierarchy::Stacked,
            curve_mode: CurveMode::Spline,
            filter_speckle: 8,
            color_precision: 4,
            layer_difference: 24,
            corner_threshold: 60,
            length_threshold: 4.0,
            max_iterations: 10,
            splice_threshold: 45,
            path_precision: 2,
        },
    },
    Preset {
        name: PresetName::Photo,
        description: "High color fidelity for photographs",
        parameters: ParameterSet {
            color_mode: ColorMode::Color,
            hierarchical: Hierarchy::Stacked,
            curve_mode: CurveMode::Spline,
            filter_speckle: 2,
            color_precision: 8,
            layer_difference: 8,
            corner_threshold: 60,
            length_threshold: 2.0,
            max_iterations: 10,
            splice_threshold: 45,
            path_precision: 4,
        },
    },
    Preset {
        name: PresetName::LineArt,
        description: "Black and white tracing for drawings and line art",
        parameters: ParameterSet {
            color_mode: ColorMode::Binary,
            hierarchical: Hierarchy::Stacked,
            curve_mode: CurveMode::Spline,
            filter_speckle: 4,
            color_precision: 6,
            layer_difference: 16,
            corner_threshold: 60,
            length_threshold: 4.0,
            max_iterations: 10,
            splice_threshold: 45,
            path_precision: 3,
        },
    },
    Preset {
        name: PresetName::Sketch,
        description: "Fine detail black and white tracing for sketches",
        parameters: ParameterSet {
            color_mode: ColorMode::Binary,
            hierarchical: Hierarchy::Stacked,
            curve_mode: CurveMode::Spline,
            filter_speckle: 2,
            color_precision: 6,
            layer_difference: 16,
            corner_threshold: 45,
            length_threshold: 2.0,
            max_iterations: 15,
            splice_threshold: 45,
            path_precision: 3,
        },
    },
    Preset {
        name: PresetName::Minimal,
        description: "Few colors and straight segments for the smallest output",
        parameters: ParameterSet {
            color_mode: ColorMode::Color,
            hierarchical: Hierarchy::Stacked,
            curve_mode: CurveMode::Polygon,
            filter_speckle: 16,
            color_precision: 3,
            layer_difference: 32,
            corner_threshold: 60,
            length_threshold: 6.0,
            max_iterations: 10,
            splice_threshold: 45,
            path_precision: 2,
        },
    },
];

/// All built-in presets, in display order.
pub fn presets() -> &'static [Preset] {
    &PRESETS
}

/// Looks up a built-in preset.
pub fn preset(name: PresetName) -> &'static Preset {
    PRESETS
        .iter()
        .find(|p| p.name == name)
        .unwrap_or(&PRESETS[0])
}
