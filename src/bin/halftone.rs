use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use halftone::{
    CancelToken, FfmpegRecorder, IntervalClock, ManualClock, MediaKind, Renderer,
    SeekableSource as _, Studio, StudioConfig, VideoSource,
};

#[derive(Parser, Debug)]
#[command(name = "halftone", version, about = "Halftone-stylize images and video")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one stylized frame as a PNG.
    Frame(FrameArgs),
    /// Write the animated preview as a numbered PNG sequence.
    Animate(AnimateArgs),
    /// Export one loop of the animated preview as a GIF.
    Gif(GifArgs),
    /// Export a stylized video (requires `ffmpeg` on PATH).
    Video(VideoArgs),
}

#[derive(Args, Debug)]
struct StyleArgs {
    /// JSON config file; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tile edge in pixels.
    #[arg(long)]
    resolution: Option<u32>,

    /// Primitive size multiplier.
    #[arg(long)]
    radius: Option<f64>,

    /// Source contrast factor.
    #[arg(long)]
    contrast: Option<f64>,

    /// classic, rgb, led, squares, ascii or duotone.
    #[arg(long)]
    mode: Option<String>,

    /// Duotone color for dark tiles, `#rrggbb`.
    #[arg(long)]
    duotone_low: Option<String>,

    /// Duotone color for bright tiles, `#rrggbb`.
    #[arg(long)]
    duotone_high: Option<String>,

    /// Monospace font for ascii mode.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Input image or video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Video timestamp in seconds.
    #[arg(long, default_value_t = 0.0)]
    at: f64,

    /// Animation phase in radians; renders with time-varying effects on (images only).
    #[arg(long)]
    phase: Option<f64>,

    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Args, Debug)]
struct AnimateArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory for `frame_0000.png`, `frame_0001.png`, ...
    #[arg(long)]
    out_dir: PathBuf,

    /// Number of refreshes to render.
    #[arg(long, default_value_t = 60)]
    frames: u64,

    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Args, Debug)]
struct GifArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output GIF path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Args, Debug)]
struct VideoArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path; `.mp4` selects H.264, anything else WebM.
    #[arg(long)]
    out: PathBuf,

    /// Pace frames at the export rate instead of as fast as possible.
    #[arg(long)]
    realtime: bool,

    #[command(flatten)]
    style: StyleArgs,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Animate(args) => cmd_animate(args),
        Command::Gif(args) => cmd_gif(args),
        Command::Video(args) => cmd_video(args),
    }
}

fn load_config(style: &StyleArgs) -> anyhow::Result<StudioConfig> {
    let mut cfg = match &style.config {
        Some(path) => StudioConfig::load(path)?,
        None => StudioConfig::default(),
    };
    let p = &mut cfg.params;
    if let Some(v) = style.resolution {
        p.resolution = v;
    }
    if let Some(v) = style.radius {
        p.radius_multiplier = v;
    }
    if let Some(v) = style.contrast {
        p.contrast = v;
    }
    if let Some(v) = &style.mode {
        p.mode = halftone::Mode::from_selector(v);
        if p.mode.is_none() {
            tracing::warn!(mode = %v, "unknown mode, only the background will be drawn");
        }
    }
    if let Some(v) = &style.duotone_low {
        p.duotone_low.clone_from(v);
    }
    if let Some(v) = &style.duotone_high {
        p.duotone_high.clone_from(v);
    }
    if style.font.is_some() {
        cfg.font.clone_from(&style.font);
    }
    cfg.validate()?;
    Ok(cfg)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.style)?;
    let kind = halftone::check_upload(&args.in_path)?;

    if kind == MediaKind::Video {
        let fps = cfg.video.frame_rate()?;
        let mut source = VideoSource::open(&args.in_path, fps)?;
        let frame = source.frame_at(args.at)?;
        let mut renderer = match &cfg.font {
            Some(path) => Renderer::with_font_path(path.clone()),
            None => Renderer::new(),
        };
        let mut canvas = halftone::Canvas::new();
        renderer.render_video_frame(Some(&frame), &cfg.params, &mut canvas)?;
        canvas.save_png(&args.out)?;
    } else {
        let mut studio = Studio::new(cfg);
        studio.load_image(&args.in_path)?;
        if let Some(phase) = args.phase {
            studio.render_phase(phase)?;
        }
        studio.export_png(&args.out)?;
    }

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_animate(args: AnimateArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.style)?;
    let mut studio = Studio::new(cfg);
    studio.load_image(&args.in_path)?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let out_dir = args.out_dir.as_path();
    let mut clock = ManualClock::default();
    let frames = studio.run_animation(&mut clock, Some(args.frames), |i, canvas| {
        canvas.save_png(&frame_path(out_dir, i))
    })?;

    eprintln!("wrote {frames} frames to {}", args.out_dir.display());
    Ok(())
}

fn frame_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("frame_{index:04}.png"))
}

fn cmd_gif(args: GifArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.style)?;
    let mut studio = Studio::new(cfg);
    studio.load_image(&args.in_path)?;

    let bytes = studio
        .export_gif(&CancelToken::new(), |p| {
            eprint!("\rencoding gif {:>3.0}%", p * 100.0);
        })?
        .context("no image loaded")?;
    eprintln!();

    halftone::write_asset(&args.out, &bytes)?;
    eprintln!("wrote {} ({} bytes)", args.out.display(), bytes.len());
    Ok(())
}

fn cmd_video(args: VideoArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.style)?;
    let bitrate = cfg.video.bitrate;
    let mut studio = Studio::new(cfg);
    studio.load_video(&args.in_path)?;
    studio.stop_preview();

    let mut recorder = FfmpegRecorder::new(args.out.clone(), bitrate)?;
    eprintln!("encoding with {}", recorder.codec());

    let cancel = CancelToken::new();
    let progress = |p: halftone::VideoProgress| {
        eprint!(
            "\rframe {}/{} ({:>3.0}%)",
            p.frame,
            p.total,
            p.fraction() * 100.0
        );
    };
    let report = if args.realtime {
        studio.export_video(&mut recorder, &mut IntervalClock::default(), &cancel, progress)?
    } else {
        studio.export_video(&mut recorder, &mut ManualClock::default(), &cancel, progress)?
    }
    .context("no video loaded")?;
    eprintln!();

    eprintln!(
        "wrote {} ({} frames, {} @ {} fps)",
        args.out.display(),
        report.frames,
        report.size,
        report.fps.as_f64()
    );
    Ok(())
}
