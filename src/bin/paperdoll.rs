use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use paperdoll::{
    Compositor, FrameRGBA, FrameSource, LandmarkSet, OverlayConfig, PartMappingTable,
    PixmapSurface, PoseSession, RenderSurface, ScriptedEstimator, SessionState, StillCapture,
    TickEvent, VectorAssetSet, ViewMode,
};

#[derive(Parser, Debug)]
#[command(name = "paperdoll", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite one landmark set onto a PNG.
    Frame(FrameArgs),
    /// Record a scripted estimate sequence, then render replay frames as PNGs.
    Replay(ReplayArgs),
    /// Load a part mapping (tagged or legacy JSON) and print the resolved strategies.
    CheckMapping(CheckMappingArgs),
}

#[derive(Parser, Debug)]
struct SceneArgs {
    /// Vector asset set JSON: `{"torso": "<svg ...>", ...}`.
    #[arg(long)]
    assets: PathBuf,

    /// Part mapping JSON; the standard mapping is used when omitted.
    #[arg(long)]
    mapping: Option<PathBuf>,

    /// Overlay configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Draw the landmark skeleton under the parts.
    #[arg(long, default_value_t = false)]
    debug_skeleton: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Landmark set JSON, in capture coordinates.
    #[arg(long)]
    pose: PathBuf,

    #[command(flatten)]
    scene: SceneArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    /// JSON array of landmark sets, fed to the session one estimate per tick.
    #[arg(long)]
    estimates: PathBuf,

    #[command(flatten)]
    scene: SceneArgs,

    /// Number of replay frames to render.
    #[arg(long, default_value_t = 30)]
    frames: u32,

    /// Output directory for `frame_NNNN.png`.
    #[arg(long)]
    out_dir: PathBuf,

    /// Also write the recording as JSON.
    #[arg(long)]
    save_recording: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CheckMappingArgs {
    #[arg(long)]
    mapping: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Replay(args) => cmd_replay(args),
        Command::CheckMapping(args) => cmd_check_mapping(args),
    }
}

fn load_scene(scene: &SceneArgs) -> anyhow::Result<Compositor> {
    let mut config = match &scene.config {
        Some(path) => OverlayConfig::from_path(path)?,
        None => OverlayConfig::default(),
    }
    .with_env_overrides();
    if scene.debug_skeleton {
        config.debug_skeleton = true;
    }

    let mapping = match &scene.mapping {
        Some(path) => PartMappingTable::from_path(path)?,
        None => PartMappingTable::standard(),
    };
    let assets = VectorAssetSet::from_path(&scene.assets)?;

    let mut compositor = Compositor::new(config, mapping)?;
    let snapshot = compositor.set_assets(&assets);
    for part in snapshot.failed_parts() {
        eprintln!("warning: '{part}' failed to decode and will not be drawn");
    }
    Ok(compositor)
}

fn new_surface(config: &OverlayConfig) -> anyhow::Result<PixmapSurface> {
    Ok(PixmapSurface::new(config.render)?.with_clear_color(config.background))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.pose)
        .with_context(|| format!("read pose '{}'", args.pose.display()))?;
    let pose: LandmarkSet = serde_json::from_str(&text)
        .with_context(|| format!("parse pose '{}'", args.pose.display()))?;

    let mut compositor = load_scene(&args.scene)?;
    let mut surface = new_surface(compositor.config())?;
    let report = compositor.render(&mut surface, FrameSource::Live(&pose));

    for (part, reason) in &report.skipped {
        eprintln!("skipped {part}: {reason:?}");
    }
    write_png(&args.out, surface.readback())?;
    eprintln!("wrote {} ({} parts)", args.out.display(), report.drawn.len());
    Ok(())
}

fn cmd_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.estimates)
        .with_context(|| format!("read estimates '{}'", args.estimates.display()))?;
    let estimates: Vec<LandmarkSet> = serde_json::from_str(&text)
        .with_context(|| format!("parse estimates '{}'", args.estimates.display()))?;
    let ticks = estimates.len();

    let mut compositor = load_scene(&args.scene)?;
    let config = compositor.config().clone();
    let capture = StillCapture::new(config.capture);
    let mut session = PoseSession::new(
        ScriptedEstimator::new(estimates),
        capture,
        config.clone(),
        ViewMode::Record,
    )?;

    let tick_secs = config.replay_fps.frame_duration_secs();
    let mut now = 0.0;
    session.load_model()?;
    while session.state() == SessionState::ModelLoading {
        if session.tick(now) == TickEvent::ModelFailed {
            anyhow::bail!("pose model failed to load");
        }
        now += tick_secs;
    }
    session.start_detecting()?;
    for _ in 0..ticks {
        session.tick(now);
        now += tick_secs;
    }
    session.stop_detecting()?;

    let stats = session.stats();
    eprintln!(
        "recorded {} frames ({} estimates, {} empty, {} failed)",
        session.recording().len(),
        stats.estimates_ok,
        stats.estimates_empty,
        stats.estimates_failed
    );
    if let Some(path) = &args.save_recording {
        session.recording().write_to_path(path)?;
    }
    if session.state() != SessionState::ViewingReplay {
        anyhow::bail!("nothing was recorded");
    }

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    let mut surface = new_surface(&config)?;
    // Replay time is derived from the output frame index so frame `i` shows recorded frame
    // `i % len`.
    compositor.reset_replay();
    for i in 0..args.frames {
        let at = config.replay_fps.frames_to_secs(u64::from(i));
        let report = compositor.render(&mut surface, session.frame_source(at));
        let out = args.out_dir.join(format!("frame_{i:04}.png"));
        write_png(&out, surface.readback())?;
        tracing::debug!(frame = i, replay_index = ?report.replay_index, "replay frame written");
    }
    eprintln!(
        "wrote {} frames to {} ({}x{})",
        args.frames,
        args.out_dir.display(),
        surface.size().width,
        surface.size().height
    );

    session.teardown();
    Ok(())
}

fn cmd_check_mapping(args: CheckMappingArgs) -> anyhow::Result<()> {
    let table = PartMappingTable::from_path(&args.mapping)?;
    for (part, mapping) in table.iter() {
        let landmarks: Vec<&str> = mapping
            .required()
            .as_slice()
            .iter()
            .map(|id| id.name())
            .collect();
        println!(
            "{part}: {} [{}]",
            mapping.strategy_name(),
            landmarks.join(", ")
        );
    }
    eprintln!("{} parts ok", table.len());
    Ok(())
}

fn write_png(path: &Path, frame: FrameRGBA) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let frame = frame.into_straight_alpha();
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}
