use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::infrastructure::colorspace_transform::ColorSpace;
use crate::pipeline::frame_range::FrameRangePolicy;

/// The user-facing frame-range choice, in the order it is offered to the
/// host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameRangeChoice {
    #[default]
    InputsUnion,
    TimelineBounds,
    Manual,
}

impl FrameRangeChoice {
    pub const ALL: &'static [FrameRangeChoice] = &[
        FrameRangeChoice::InputsUnion,
        FrameRangeChoice::TimelineBounds,
        FrameRangeChoice::Manual,
    ];

    /// Position in the host's choice parameter.
    pub fn index(self) -> usize {
        match self {
            FrameRangeChoice::InputsUnion => 0,
            FrameRangeChoice::TimelineBounds => 1,
            FrameRangeChoice::Manual => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            FrameRangeChoice::InputsUnion => "Inputs union",
            FrameRangeChoice::TimelineBounds => "Timeline bounds",
            FrameRangeChoice::Manual => "Manual",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            FrameRangeChoice::InputsUnion => {
                "The union of all inputs frame ranges will be rendered."
            }
            FrameRangeChoice::TimelineBounds => {
                "The frame range delimited by the timeline bounds will be rendered."
            }
            FrameRangeChoice::Manual => {
                "The frame range will be the one defined by the first frame and last frame parameters."
            }
        }
    }
}

/// Snapshot of the writer's parameters.
///
/// `first_frame` and `last_frame` only matter under
/// [`FrameRangeChoice::Manual`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    pub filename: String,
    pub frame_range: FrameRangeChoice,
    pub first_frame: i32,
    pub last_frame: i32,
}

impl WriterConfig {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    pub fn frame_range_policy(&self) -> FrameRangePolicy {
        match self.frame_range {
            FrameRangeChoice::InputsUnion => FrameRangePolicy::InputsUnion,
            FrameRangeChoice::TimelineBounds => FrameRangePolicy::TimelineBounds,
            FrameRangeChoice::Manual => FrameRangePolicy::Manual {
                first: self.first_frame,
                last: self.last_frame,
            },
        }
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings file: {0}")]
    Format(#[from] serde_json::Error),
}

fn default_input_space() -> ColorSpace {
    ColorSpace::Linear
}

fn default_output_space() -> ColorSpace {
    ColorSpace::Srgb
}

/// Writer parameters plus colour-space selection, as stored on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WriterSettings {
    #[serde(default)]
    pub writer: WriterConfig,
    #[serde(default = "default_input_space")]
    pub input_space: ColorSpace,
    #[serde(default = "default_output_space")]
    pub output_space: ColorSpace,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            writer: WriterConfig::default(),
            input_space: default_input_space(),
            output_space: default_output_space(),
        }
    }
}

impl WriterSettings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&text)?;
        log::info!("Loaded writer settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::inputs(FrameRangeChoice::InputsUnion, 0, "Inputs union")]
    #[case::timeline(FrameRangeChoice::TimelineBounds, 1, "Timeline bounds")]
    #[case::manual(FrameRangeChoice::Manual, 2, "Manual")]
    fn test_choice_order_and_labels(
        #[case] choice: FrameRangeChoice,
        #[case] index: usize,
        #[case] label: &str,
    ) {
        assert_eq!(choice.index(), index);
        assert_eq!(FrameRangeChoice::from_index(index), Some(choice));
        assert_eq!(choice.label(), label);
        assert!(!choice.hint().is_empty());
    }

    #[test]
    fn test_out_of_range_index() {
        assert_eq!(FrameRangeChoice::from_index(3), None);
    }

    #[test]
    fn test_default_is_inputs_union() {
        let config = WriterConfig::new("out###.png");
        assert_eq!(config.frame_range, FrameRangeChoice::InputsUnion);
        assert_eq!(config.frame_range_policy(), FrameRangePolicy::InputsUnion);
    }

    #[test]
    fn test_manual_policy_carries_bounds() {
        let config = WriterConfig {
            frame_range: FrameRangeChoice::Manual,
            first_frame: 12,
            last_frame: 40,
            ..WriterConfig::new("a.mov")
        };
        assert_eq!(
            config.frame_range_policy(),
            FrameRangePolicy::Manual { first: 12, last: 40 }
        );
    }

    #[test]
    fn test_settings_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg/writer.json");
        let settings = WriterSettings {
            writer: WriterConfig {
                frame_range: FrameRangeChoice::TimelineBounds,
                ..WriterConfig::new("/renders/shot####.exr")
            },
            input_space: ColorSpace::Srgb,
            output_space: ColorSpace::Rec709,
        };

        settings.save(&path).unwrap();
        let loaded = WriterSettings::load(&path).unwrap();

        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("writer.json");
        std::fs::write(&path, r#"{ "writer": { "filename": "x##.png" } }"#).unwrap();

        let loaded = WriterSettings::load(&path).unwrap();

        assert_eq!(loaded.writer.filename, "x##.png");
        assert_eq!(loaded.writer.frame_range, FrameRangeChoice::InputsUnion);
        assert_eq!(loaded.input_space, ColorSpace::Linear);
        assert_eq!(loaded.output_space, ColorSpace::Srgb);
    }

    #[test]
    fn test_malformed_settings_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("writer.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            WriterSettings::load(&path),
            Err(SettingsError::Format(_))
        ));
    }

    #[test]
    fn test_missing_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            WriterSettings::load(&dir.path().join("absent.json")),
            Err(SettingsError::Io(_))
        ));
    }
}
