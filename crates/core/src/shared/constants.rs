/// Marks one digit of the zero-padded frame-number field in a filename pattern.
pub const PLACEHOLDER_CHAR: char = '#';

pub const EXTENSION_SEPARATOR: char = '.';

/// Extensions written one file per frame. Anything else is a single-file
/// container that receives every frame.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "bmp", "dds", "dpx", "exr", "gif", "hdr", "ico", "jpeg", "jpg", "pbm", "pgm", "png", "pnm",
    "ppm", "psd", "qoi", "rgb", "rgba", "sgi", "tga", "tif", "tiff", "webp",
];

/// Script name of the frame-range choice parameter.
pub const FRAME_RANGE_PARAM: &str = "frameRange";

pub const FILENAME_HINT: &str = "The output image sequence/video stream file(s). \
The string must match the following format: path/sequenceName###.ext where the number of \
# characters will define the number of digits to append to each file. \
For example path/mySequence###.jpg will be translated to path/mySequence000.jpg, \
path/mySequence001.jpg, etc.";

pub const INVALID_FILENAME_MESSAGE: &str = "Invalid file name";
pub const UNSUPPORTED_EXTENSION_MESSAGE: &str = "Unsupported file extension: ";
