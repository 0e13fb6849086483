use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const DEFAULT_ASSEMBLE_FPS: f64 = 30.0;

#[derive(Parser, Debug)]
#[command(name = "vidreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble a directory of images (sorted by file name) into a video.
    Assemble(AssembleArgs),
    /// Re-encode a video at a lower bitrate (requires `ffmpeg` and `ffprobe` on PATH).
    Compress(CompressArgs),
}

#[derive(Parser, Debug)]
struct AssembleArgs {
    /// Directory holding one image per frame.
    #[arg(long)]
    frames: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Session options JSON; flags below override its values.
    #[arg(long)]
    opts: Option<PathBuf>,

    /// Fixed frame rate. Defaults to 30 unless the options file sets a fixed rate.
    #[arg(long)]
    fps: Option<f64>,

    /// Fixed output width (requires --height). Resolution is automatic otherwise.
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Fixed output height (requires --width).
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Staged image extension.
    #[arg(long)]
    staged_format: Option<String>,

    /// Log the export report.
    #[arg(long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct CompressArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Target size as a fraction of the input size.
    #[arg(long, default_value_t = 0.5)]
    ratio: f64,

    /// Replace the input with the compressed file.
    #[arg(long)]
    overwrite: bool,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Assemble(args) => cmd_assemble(args),
        Command::Compress(args) => cmd_compress(args),
    }
}

fn read_opts_json(path: &Path) -> anyhow::Result<vidreel::SessionOpts> {
    let f = File::open(path).with_context(|| format!("open options '{}'", path.display()))?;
    let r = BufReader::new(f);
    let opts: vidreel::SessionOpts =
        serde_json::from_reader(r).with_context(|| "parse session options JSON")?;
    Ok(opts)
}

fn collect_frame_paths(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("read dir '{}'", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && image::ImageFormat::from_path(&path).is_ok() {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

fn cmd_assemble(args: AssembleArgs) -> anyhow::Result<()> {
    let mut opts = match &args.opts {
        Some(path) => read_opts_json(path)?,
        None => vidreel::SessionOpts::default(),
    };
    opts.output_path = args.out.clone();
    opts.export_mode = vidreel::ExportMode::Deferred;
    if let Some(fps) = args.fps {
        opts.frame_rate = vidreel::FrameRate::Fixed(fps);
    }
    // Decode speed says nothing about the intended playback rate of a directory of images.
    if opts.frame_rate == vidreel::FrameRate::Auto {
        tracing::warn!(
            fps = DEFAULT_ASSEMBLE_FPS,
            "automatic frame rate is not supported by assemble, using the default"
        );
        opts.frame_rate = vidreel::FrameRate::Fixed(DEFAULT_ASSEMBLE_FPS);
    }
    if let (Some(width), Some(height)) = (args.width, args.height) {
        opts.resolution =
            vidreel::ResolutionSetting::Fixed(vidreel::Resolution::new(width, height));
    }
    if let Some(ext) = args.staged_format {
        opts.staged_image_format = ext;
    }

    let paths = collect_frame_paths(&args.frames)?;
    if paths.is_empty() {
        anyhow::bail!("no images found in '{}'", args.frames.display());
    }

    let mut session = vidreel::VideoSession::new(opts)?;
    for path in &paths {
        let img = image::open(path).with_context(|| format!("decode '{}'", path.display()))?;
        session.update(&vidreel::Frame::from(img.to_rgb8()))?;
    }

    let report = session.export_with(args.verbose)?;
    println!("{report}");
    Ok(())
}

fn cmd_compress(args: CompressArgs) -> anyhow::Result<()> {
    let transcoder = vidreel::FfmpegTranscoder::detect().ok_or_else(|| {
        vidreel::VidreelError::dependency_missing("compress needs ffmpeg and ffprobe on PATH")
    })?;
    let opts = vidreel::CompressOpts {
        target_size_ratio: args.ratio,
        overwrite_original: args.overwrite,
    };
    let report = vidreel::compress_file(&transcoder, &args.in_path, &opts, None)?;
    println!("{report}");
    Ok(())
}
