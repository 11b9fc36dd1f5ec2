use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::Parser;
use glam::Vec2;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use stardrift_core::{AnimationEngine, EngineConfig, FieldEngine, TrailEngine};
use stardrift_platform::{
    DrawingSurface, HeadlessHost, ListenerKind, RecordingSurface, Result, Viewport,
};

mod feed;
mod raster;

use crate::feed::{spawn_pointer_feed, FeedPlan, HostEvent};
use crate::raster::PixelSurface;

/// Render the particle backdrop and pointer trail headlessly and export PNGs.
#[derive(Debug, Parser)]
#[command(name = "stardrift", version)]
struct Cli {
    #[arg(long, default_value_t = 800)]
    width: u32,
    #[arg(long, default_value_t = 600)]
    height: u32,
    #[arg(long, default_value_t = 240)]
    frames: u32,
    /// Frame at which the viewport is resized.
    #[arg(long)]
    resize_at: Option<u32>,
    #[arg(long, default_value_t = 1024)]
    resize_width: u32,
    #[arg(long, default_value_t = 768)]
    resize_height: u32,
    #[arg(long, default_value_t = 2)]
    moves_per_frame: u32,
    /// TOML engine configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the seed from the configuration file.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value = "out")]
    out: PathBuf,
    /// Write one recorded frame of the field engine as JSON.
    #[arg(long)]
    dump_commands: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log: String,
}

fn main() {
    let cli = Cli::parse();

    // Init logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    info!("Stardrift starting");
    if let Err(e) = run(&cli) {
        eprintln!("Stardrift error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    let viewport = Viewport::new(cli.width, cli.height);
    std::fs::create_dir_all(&cli.out)?;

    if let Some(path) = &cli.dump_commands {
        dump_commands(&config, viewport, path)?;
    }

    let mut host = HeadlessHost::new(viewport);
    let mut field = FieldEngine::new(config.field.clone(), Some(PixelSurface::new(viewport)));
    let mut trail = TrailEngine::new(config.trail.clone(), Some(PixelSurface::new(viewport)));
    if let Some(seed) = config.seed {
        field = field.with_seed(seed);
        trail = trail.with_seed(seed.wrapping_add(1));
    }
    field.create(&mut host);
    trail.create(&mut host);

    let plan = FeedPlan {
        frames: cli.frames,
        viewport,
        moves_per_frame: cli.moves_per_frame,
        resize: cli
            .resize_at
            .map(|at| (at, Viewport::new(cli.resize_width, cli.resize_height))),
    };
    let (events, feed) = spawn_pointer_feed(plan);
    let mut painted = 0u32;
    for event in events.iter() {
        let mut engines: [&mut dyn AnimationEngine; 2] = [&mut field, &mut trail];
        match event {
            HostEvent::PointerMove(client) => {
                dispatch(&host, &mut engines, ListenerKind::PointerMove, |engine| {
                    engine.on_pointer_move(client)
                });
            }
            HostEvent::Resize(resized) => {
                host.set_viewport(resized);
                dispatch(&host, &mut engines, ListenerKind::Resize, |engine| {
                    engine.on_resize(resized)
                });
                info!(width = resized.width, height = resized.height, "viewport resized");
            }
            HostEvent::Frame => {
                let fired = host.fire_frames();
                for engine in engines.iter_mut() {
                    if engine.pending_frame().is_some_and(|h| fired.contains(&h)) {
                        engine.step(&mut host);
                    }
                }
                painted += 1;
            }
        }
    }
    feed.join().map_err(|_| "pointer feed thread panicked")?;
    info!(
        frames = painted,
        field = field.particles().len(),
        trail = trail.particles().len(),
        "render loop finished"
    );

    finish(&mut host, &mut field, &mut trail, &cli.out)
}

/// Export the layers, then tear both engines down whatever the export result.
fn finish(
    host: &mut HeadlessHost,
    field: &mut FieldEngine<PixelSurface>,
    trail: &mut TrailEngine<PixelSurface>,
    out: &Path,
) -> Result<()> {
    let exported = export_layers(field, trail, out);
    field.teardown(host);
    trail.teardown(host);
    if host.pending_frames() > 0 {
        warn!(pending = host.pending_frames(), "frames left pending after teardown");
    }
    exported
}

/// Deliver a notification to every engine owning a live listener of `kind`.
fn dispatch(
    host: &HeadlessHost,
    engines: &mut [&mut dyn AnimationEngine],
    kind: ListenerKind,
    mut deliver: impl FnMut(&mut dyn AnimationEngine),
) {
    for id in host.listeners_for(kind) {
        for engine in engines.iter_mut() {
            if engine.owns_listener(id) {
                deliver(&mut **engine);
            }
        }
    }
}

fn export_layers(
    field: &FieldEngine<PixelSurface>,
    trail: &TrailEngine<PixelSurface>,
    out: &Path,
) -> Result<()> {
    let (Some(background), Some(overlay)) = (field.surface(), trail.surface()) else {
        warn!("engine surfaces unavailable; nothing to export");
        return Ok(());
    };
    background.save_png(&out.join("field.png"))?;
    overlay.save_png(&out.join("trail.png"))?;
    let mut composite = background.clone();
    composite.screen(overlay);
    composite.save_png(&out.join("composite.png"))?;
    info!(dir = %out.display(), "exported field.png, trail.png, composite.png");
    Ok(())
}

fn dump_commands(config: &EngineConfig, viewport: Viewport, path: &Path) -> Result<()> {
    let mut host = HeadlessHost::new(viewport);
    let mut field = FieldEngine::new(config.field.clone(), Some(RecordingSurface::new(viewport)))
        .with_seed(config.seed.unwrap_or_default());
    field.create(&mut host);
    field.on_pointer_move(viewport.size() / 2.0 + Vec2::new(viewport.x as f32, viewport.y as f32));
    field.step(&mut host);

    if let Some(surface) = field.surface() {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, surface.commands())?;
        info!(
            path = %path.display(),
            commands = surface.commands().len(),
            width = surface.viewport().width,
            "dumped field frame"
        );
    }
    field.teardown(&mut host);
    Ok(())
}
