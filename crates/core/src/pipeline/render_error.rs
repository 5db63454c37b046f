use std::path::PathBuf;

use thiserror::Error;

use crate::copying::pixel_copier::CopyError;
use crate::shared::error::SendError;
use crate::shared::pixel_buffer::{BitDepth, PixelComponents};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid file name: '{pattern}'")]
    InvalidFilename { pattern: String },
    /// Reported to the host as a persistent message; rendering continues.
    #[error("Unsupported file extension: {extension}")]
    UnsupportedExtension { extension: String },
    #[error("no copy routine for {depth:?} {components:?} pixels")]
    UnsupportedFormat {
        depth: BitDepth,
        components: PixelComponents,
    },
    #[error(
        "source is {src_depth:?} {src_components:?} but destination is {dst_depth:?} {dst_components:?}"
    )]
    ComponentMismatch {
        src_depth: BitDepth,
        src_components: PixelComponents,
        dst_depth: BitDepth,
        dst_components: PixelComponents,
    },
    #[error("failed to fetch {clip} image at time {time}: {source}")]
    Fetch {
        clip: &'static str,
        time: f64,
        #[source]
        source: SendError,
    },
    #[error("{clip} clip has no image at time {time}")]
    MissingImage { clip: &'static str, time: f64 },
    #[error("colour transform failed: {0}")]
    ColorTransform(#[source] SendError),
    #[error("failed to encode {filename}: {source}")]
    Encode {
        filename: PathBuf,
        #[source]
        source: SendError,
    },
    #[error("failed to finalise output: {0}")]
    Finish(#[source] SendError),
    #[error("invalid render time {0}")]
    InvalidTime(f64),
    #[error("no frame range: the writer defers to the host and none was given")]
    UndefinedFrameRange,
    #[error("frame range {first}..{last} cannot be rendered")]
    FrameRangeOutOfBounds { first: f64, last: f64 },
}

impl RenderError {
    /// Whether the render call stops on this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RenderError::UnsupportedExtension { .. })
    }
}

impl From<CopyError> for RenderError {
    fn from(e: CopyError) -> Self {
        match e {
            CopyError::UnsupportedFormat { depth, components } => {
                RenderError::UnsupportedFormat { depth, components }
            }
            CopyError::ComponentMismatch {
                src_depth,
                src_components,
                dst_depth,
                dst_components,
            } => RenderError::ComponentMismatch {
                src_depth,
                src_components,
                dst_depth,
                dst_components,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::UNSUPPORTED_EXTENSION_MESSAGE;

    #[test]
    fn test_unsupported_extension_message() {
        let err = RenderError::UnsupportedExtension {
            extension: "xyz".into(),
        };
        assert_eq!(err.to_string(), format!("{UNSUPPORTED_EXTENSION_MESSAGE}xyz"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_copy_errors_convert() {
        let err: RenderError = CopyError::UnsupportedFormat {
            depth: BitDepth::U8,
            components: PixelComponents::Rgb,
        }
        .into();
        assert!(matches!(
            err,
            RenderError::UnsupportedFormat {
                depth: BitDepth::U8,
                components: PixelComponents::Rgb
            }
        ));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_encode_error_keeps_source() {
        use std::error::Error;

        let err = RenderError::Encode {
            filename: PathBuf::from("out.png"),
            source: "disk full".into(),
        };
        assert_eq!(err.to_string(), "failed to encode out.png: disk full");
        assert_eq!(err.source().map(|s| s.to_string()), Some("disk full".into()));
    }
}
