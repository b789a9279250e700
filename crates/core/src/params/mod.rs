//! Tracing parameters: value types, the built-in preset table, and the
//! resolver that merges a preset with per-field overrides.

mod presets;
mod resolver;
mod types;

pub use presets::{preset, presets, Preset, PresetName};
pub use resolver::resolve;
pub use types::{
    ColorMode, CurveMode, Hierarchy, ParameterOverrides, ParameterSet, OVERRIDE_FIELDS,
};
