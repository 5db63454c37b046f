use crate::shared::constants::{EXTENSION_SEPARATOR, PLACEHOLDER_CHAR};

/// Derives the concrete filename for `frame` from a numbering pattern.
///
/// The run of `#` directly before the last `.` sets the minimum width of
/// the zero-padded frame number: `seq###.png` with frame 7 becomes
/// `seq007.png`. Wider numbers are never truncated. Every `#` in the
/// pattern is removed, wherever it appears.
///
/// Returns `None` when the pattern has no extension separator.
///
/// A pattern without any `#` is returned unchanged: the frame number is not
/// inserted. Image sequences written from such a pattern therefore
/// overwrite a single file.
pub fn filename_from_pattern(pattern: &str, frame: u64) -> Option<String> {
    let last_dot = pattern.rfind(EXTENSION_SEPARATOR)?;

    if !pattern.contains(PLACEHOLDER_CHAR) {
        return Some(pattern.to_owned());
    }

    let width = placeholder_run_before(pattern, last_dot);

    let mut resolved: String = pattern.chars().filter(|&c| c != PLACEHOLDER_CHAR).collect();
    // Removing '#' never removes '.', so the separator is still there.
    let dot = resolved.rfind(EXTENSION_SEPARATOR)?;
    resolved.insert_str(dot, &format!("{frame:0width$}"));
    Some(resolved)
}

/// Length of the contiguous `#` run ending just before byte index `end`.
fn placeholder_run_before(pattern: &str, end: usize) -> usize {
    pattern[..end]
        .chars()
        .rev()
        .take_while(|&c| c == PLACEHOLDER_CHAR)
        .count()
}
