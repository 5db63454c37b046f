use std::path::PathBuf;
use std::process;

use clap::Parser;

use framewriter_core::clip::domain::image_clip::ImageClip;
use framewriter_core::clip::infrastructure::image_sequence_clip::ImageSequenceClip;
use framewriter_core::clip::infrastructure::memory_clip::MemoryClip;
use framewriter_core::color::infrastructure::colorspace_transform::{ColorSpace, ColorSpaceTransform};
use framewriter_core::encoding::domain::encoder::Encoder;
#[cfg(feature = "ffmpeg")]
use framewriter_core::encoding::infrastructure::ffmpeg_video_encoder::FfmpegVideoEncoder;
use framewriter_core::encoding::infrastructure::image_file_encoder::ImageFileEncoder;
use framewriter_core::host::infrastructure::fixed_timeline::FixedTimeline;
use framewriter_core::host::infrastructure::log_message_sink::LogMessageSink;
use framewriter_core::naming::domain::extension::{file_extension, is_image_file};
use framewriter_core::naming::domain::filename_pattern::filename_from_pattern;
use framewriter_core::pipeline::generic_writer::GenericWriter;
use framewriter_core::pipeline::render_sequence_use_case::{ProgressFn, RenderSequenceUseCase};
use framewriter_core::pipeline::writer_config::{FrameRangeChoice, WriterSettings};
use framewriter_core::shared::constants::FILENAME_HINT;
use framewriter_core::shared::pixel_buffer::{BitDepth, PixelComponents};
use framewriter_core::shared::rect::RectI;

/// Writes a numbered image sequence out as images or a video file.
#[derive(Parser)]
#[command(name = "framewriter", after_help = FILENAME_HINT)]
struct Cli {
    /// Input image sequence pattern, e.g. plates/shot_####.png.
    input: String,

    /// Output pattern, e.g. out/shot_###.exr or out/shot.mov (overrides --config).
    output: Option<String>,

    /// Frame range: inputs, timeline or manual.
    #[arg(long)]
    frame_range: Option<String>,

    /// First frame for a manual range.
    #[arg(long)]
    first: Option<i32>,

    /// Last frame for a manual range.
    #[arg(long)]
    last: Option<i32>,

    /// Timeline start frame.
    #[arg(long, default_value = "1")]
    timeline_start: f64,

    /// Timeline end frame.
    #[arg(long, default_value = "100")]
    timeline_end: f64,

    /// Colour space of the input: linear, srgb or rec709.
    #[arg(long)]
    input_space: Option<String>,

    /// Colour space written to the output: linear, srgb or rec709.
    #[arg(long)]
    output_space: Option<String>,

    /// Sample depth frames are loaded at: 8, 16 or float.
    #[arg(long, default_value = "float")]
    depth: String,

    /// Frame rate for video outputs.
    #[arg(long, default_value = "24")]
    fps: f64,

    /// Only accept these output extensions (comma-separated).
    #[arg(long, value_delimiter = ',')]
    supported_ext: Option<Vec<String>>,

    /// Also copy each frame into an in-memory destination clip.
    #[arg(long)]
    copy_pass: bool,

    /// Load writer settings from a JSON file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save the effective writer settings to a JSON file.
    #[arg(long)]
    save_config: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut settings = match &cli.config {
        Some(path) => WriterSettings::load(path)?,
        None => WriterSettings::default(),
    };
    apply_overrides(&cli, &mut settings)?;
    validate(&cli, &settings)?;

    let depth = parse_depth(&cli.depth)?;
    let source = ImageSequenceClip::new(cli.input.clone()).with_bit_depth(depth);
    let inputs_range = source.frame_range();
    let first_input = inputs_range.map(|(first, _)| first as f64).unwrap_or(0.0);
    let rod = source.region_of_definition(first_input);
    let bounds = RectI::new(rod.x1 as i32, rod.y1 as i32, rod.x2 as i32, rod.y2 as i32);

    let output = MemoryClip::output(bounds, depth, PixelComponents::Rgba);
    let output = if cli.copy_pass {
        output
    } else {
        output.disconnected()
    };

    let encoder = build_encoder(&settings.writer.filename, cli.fps)?;
    let mut writer = GenericWriter::new(
        Box::new(source),
        Box::new(output),
        encoder,
        Box::new(ColorSpaceTransform::new(
            settings.input_space,
            settings.output_space,
        )),
        Box::new(FixedTimeline::new(cli.timeline_start, cli.timeline_end)),
        Box::new(LogMessageSink::new()),
    )
    .with_config(settings.writer.clone());
    if let Some(exts) = &cli.supported_ext {
        writer = writer.with_supported_extensions(exts);
    }

    if cli.frame_range.is_some() {
        // Re-select so that a manual range is seeded from the timeline.
        writer.set_frame_range_choice(settings.writer.frame_range);
        if cli.first.is_some() || cli.last.is_some() {
            let config = writer.config();
            writer.set_manual_range(
                cli.first.unwrap_or(config.first_frame),
                cli.last.unwrap_or(config.last_frame),
            );
        }
    }

    if let Some(path) = &cli.save_config {
        let effective = WriterSettings {
            writer: (*writer.config()).clone(),
            ..settings.clone()
        };
        effective.save(path)?;
        log::info!("Saved writer settings to {}", path.display());
    }

    let default_range = inputs_range.map(|(first, last)| (first as f64, last as f64));
    let progress: ProgressFn = Box::new(|current, total| {
        eprint!("\rWriting frame {current}/{total}");
        true
    });
    let summary = RenderSequenceUseCase::new(&writer, default_range, Some(progress)).execute()?;
    eprintln!();

    println!(
        "Wrote {} of {} frames to {}",
        summary.encoded, summary.frames, settings.writer.filename
    );
    Ok(())
}

fn apply_overrides(cli: &Cli, settings: &mut WriterSettings) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(output) = &cli.output {
        settings.writer.filename = output.clone();
    }
    if let Some(choice) = &cli.frame_range {
        settings.writer.frame_range = parse_frame_range(choice)?;
    }
    if let Some(first) = cli.first {
        settings.writer.first_frame = first;
    }
    if let Some(last) = cli.last {
        settings.writer.last_frame = last;
    }
    if let Some(space) = &cli.input_space {
        settings.input_space = parse_color_space(space)?;
    }
    if let Some(space) = &cli.output_space {
        settings.output_space = parse_color_space(space)?;
    }
    Ok(())
}

fn validate(cli: &Cli, settings: &WriterSettings) -> Result<(), Box<dyn std::error::Error>> {
    if settings.writer.filename.is_empty() {
        return Err("An output pattern is required (argument or --config)".into());
    }
    if filename_from_pattern(&settings.writer.filename, 0).is_none() {
        return Err(format!(
            "Output pattern '{}' has no file extension",
            settings.writer.filename
        )
        .into());
    }
    if filename_from_pattern(&cli.input, 0).is_none() {
        return Err(format!("Input pattern '{}' has no file extension", cli.input).into());
    }
    if cli.fps <= 0.0 {
        return Err(format!("Frame rate must be positive, got {}", cli.fps).into());
    }
    if let (Some(first), Some(last)) = (cli.first, cli.last) {
        if first > last {
            return Err(format!("First frame {first} is after last frame {last}").into());
        }
    }
    Ok(())
}

fn build_encoder(pattern: &str, fps: f64) -> Result<Box<dyn Encoder>, Box<dyn std::error::Error>> {
    let ext = filename_from_pattern(pattern, 0)
        .and_then(|f| file_extension(&f))
        .ok_or("Output pattern has no file extension")?;
    if is_image_file(&ext) {
        log::info!("Writing .{ext} image sequence");
        return Ok(Box::new(ImageFileEncoder::new()));
    }
    video_encoder(&ext, fps)
}

#[cfg(feature = "ffmpeg")]
fn video_encoder(ext: &str, fps: f64) -> Result<Box<dyn Encoder>, Box<dyn std::error::Error>> {
    log::info!("Writing .{ext} video at {fps} fps");
    Ok(Box::new(FfmpegVideoEncoder::with_frame_rate(fps)))
}

#[cfg(not(feature = "ffmpeg"))]
fn video_encoder(ext: &str, _fps: f64) -> Result<Box<dyn Encoder>, Box<dyn std::error::Error>> {
    Err(format!("Writing .{ext} video requires a build with the 'ffmpeg' feature").into())
}

fn parse_frame_range(choice: &str) -> Result<FrameRangeChoice, Box<dyn std::error::Error>> {
    match choice {
        "inputs" => Ok(FrameRangeChoice::InputsUnion),
        "timeline" => Ok(FrameRangeChoice::TimelineBounds),
        "manual" => Ok(FrameRangeChoice::Manual),
        other => Err(format!(
            "Frame range must be one of: inputs, timeline, manual, got '{other}'"
        )
        .into()),
    }
}

fn parse_color_space(space: &str) -> Result<ColorSpace, Box<dyn std::error::Error>> {
    match space.to_ascii_lowercase().as_str() {
        "linear" => Ok(ColorSpace::Linear),
        "srgb" => Ok(ColorSpace::Srgb),
        "rec709" => Ok(ColorSpace::Rec709),
        _ => Err(format!(
            "Colour space must be one of: linear, srgb, rec709, got '{space}'"
        )
        .into()),
    }
}

fn parse_depth(depth: &str) -> Result<BitDepth, Box<dyn std::error::Error>> {
    match depth {
        "8" => Ok(BitDepth::U8),
        "16" => Ok(BitDepth::U16),
        "float" | "32" => Ok(BitDepth::F32),
        other => Err(format!("Depth must be one of: 8, 16, float, got '{other}'").into()),
    }
}
