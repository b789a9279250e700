//! Preset + override resolution.

use tracing::debug;

use crate::error::ValidationError;

use super::presets::{preset, PresetName};
use super::types::{ParameterOverrides, ParameterSet};

/// Resolves a preset name and optional overrides into a complete parameter set.
///
/// An absent preset name selects `default`. Overrides are applied on top of
/// the preset and the result is range-checked, so an out-of-domain override
/// is reported with the field it came from.
pub fn resolve(
    preset_name: Option<&str>,
    overrides: Option<&ParameterOverrides>,
) -> Result<ParameterSet, ValidationError> {
    let name = match preset_name {
        Some(raw) => PresetName::parse(raw)
            .ok_or_else(|| ValidationError::UnknownPreset(raw.to_string()))?,
        None => PresetName::Default,
    };

    let mut params = preset(name).parameters.clone();
    if let Some(overrides) = overrides.filter(|o| !o.is_empty()) {
        overrides.apply_to(&mut params);
        params.validate()?;
        debug!(preset = %name, ?overrides, "Applied parameter overrides");
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{presets, ColorMode, CurveMode, OVERRIDE_FIELDS};
    use serde_json::{json, Value};

    #[test]
    fn test_preset_without_overrides_is_exact() {
        for p in presets() {
            let resolved = resolve(Some(p.name.as_str()), None).unwrap();
            assert_eq!(resolved, p.parameters);
        }
    }

    #[test]
    fn test_missing_preset_uses_default() {
        let resolved = resolve(None, None).unwrap();
        assert_eq!(resolved, preset(PresetName::Default).parameters);
    }

    #[test]
    fn test_unknown_preset_fails() {
        let err = resolve(Some("vintage"), None).unwrap_err();
        assert_eq!(err, ValidationError::UnknownPreset("vintage".to_string()));
    }

    #[test]
    fn test_single_override_changes_only_that_field() {
        for p in presets() {
            let overrides = ParameterOverrides {
                corner_threshold: Some(90),
                ..Default::default()
            };
            let resolved = resolve(Some(p.name.as_str()), Some(&overrides)).unwrap();

            let mut expected = p.parameters.clone();
            expected.corner_threshold = 90;
            assert_eq!(resolved, expected);
        }
    }

    #[test]
    fn test_any_single_field_override_changes_only_that_field() {
        let cases = [
            ("colormode", "binary", json!("binary")),
            ("hierarchical", "cutout", json!("cutout")),
            ("mode", "none", json!("none")),
            ("filter_speckle", "7", json!(7)),
            ("color_precision", "5", json!(5)),
            ("layer_difference", "33", json!(33)),
            ("corner_threshold", "91", json!(91)),
            ("length_threshold", "5.5", json!(5.5)),
            ("max_iterations", "21", json!(21)),
            ("splice_threshold", "77", json!(77)),
            ("path_precision", "6", json!(6)),
        ];
        assert_eq!(cases.len(), OVERRIDE_FIELDS.len());

        for p in presets() {
            let base = serde_json::to_value(&p.parameters).unwrap();
            for (field, raw, expected) in &cases {
                let mut overrides = ParameterOverrides::new();
                assert!(overrides.set_field(field, raw).unwrap());
                let resolved = resolve(Some(p.name.as_str()), Some(&overrides)).unwrap();
                let resolved = serde_json::to_value(&resolved).unwrap();

                assert_eq!(&resolved[*field], expected, "{} {}", p.name, field);
                let Value::Object(fields) = &resolved else {
                    panic!("parameter set should serialize to an object")
                };
                for (key, value) in fields {
                    if key != field {
                        assert_eq!(value, &base[key], "{}: {} changed {}", p.name, field, key);
                    }
                }
            }
        }
    }

    #[test]
    fn test_enum_override_on_top_of_preset() {
        let overrides = ParameterOverrides {
            color_mode: Some(ColorMode::Binary),
            curve_mode: Some(CurveMode::None),
            ..Default::default()
        };
        let resolved = resolve(Some("photo"), Some(&overrides)).unwrap();
        assert_eq!(resolved.color_mode(), ColorMode::Binary);
        assert_eq!(resolved.curve_mode(), CurveMode::None);
        assert_eq!(resolved.color_precision(), 8);
    }

    #[test]
    fn test_out_of_domain_override_names_field() {
        let cases = [
            (
                ParameterOverrides {
                    color_precision: Some(9),
                    ..Default::default()
                },
                "color_precision",
            ),
            (
                ParameterOverrides {
                    corner_threshold: Some(200),
                    ..Default::default()
                },
                "corner_threshold",
            ),
            (
                ParameterOverrides {
                    length_threshold: Some(-1.0),
                    ..Default::default()
                },
                "length_threshold",
            ),
            (
                ParameterOverrides {
                    max_iterations: Some(0),
                    ..Default::default()
                },
                "max_iterations",
            ),
        ];

        for (overrides, field) in cases {
            let err = resolve(Some("logo"), Some(&overrides)).unwrap_err();
            assert_eq!(err.field(), Some(field));
        }
    }

    #[test]
    fn test_empty_overrides_are_ignored() {
        let resolved = resolve(Some("sketch"), Some(&ParameterOverrides::new())).unwrap();
        assert_eq!(resolved, preset(PresetName::Sketch).parameters);
    }
}
