use crate::shared::constants::{EXTENSION_SEPARATOR, IMAGE_EXTENSIONS};

/// Whether the destination of a resolved filename gets one file per frame
/// or a single file for the whole range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetKind {
    ImageSequence,
    Video,
}

impl TargetKind {
    pub fn from_extension(ext: &str) -> Self {
        if is_image_file(ext) {
            TargetKind::ImageSequence
        } else {
            TargetKind::Video
        }
    }
}

/// True for still-image formats written one file per frame.
///
/// Expects an already lower-cased extension without the leading dot.
pub fn is_image_file(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext)
}

/// Lower-cased text after the last `.`; `None` if there is no separator.
pub fn file_extension(filename: &str) -> Option<String> {
    let sep = filename.rfind(EXTENSION_SEPARATOR)?;
    Some(filename[sep + 1..].to_ascii_lowercase())
}

/// Removes the run of ASCII digits directly before the last `.`.
///
/// Applied to video targets so that every frame lands in the same file.
/// The first character of the filename is never removed, so an all-digit
/// stem keeps its leading digit. Filenames without a separator are
/// returned unchanged.
pub fn strip_frame_digits(filename: &str) -> String {
    let Some(sep) = filename.rfind(EXTENSION_SEPARATOR) else {
        return filename.to_owned();
    };
    let stem = &filename[..sep];
    let kept = stem
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .len()
        .max(1)
        .min(stem.len());
    format!("{}{}", &stem[..kept], &filename[sep..])
}
