use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pose_player_core::{
    AppConfig, InMemoryRig, JointId, PlaybackSession, PlaybackSpeed, PlaybackState, TableParser,
};
use tracing_subscriber::EnvFilter;

fn main() -> pose_player_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { table, config } => run_inspect(&table, config.as_deref()),
        Commands::Play {
            table,
            config,
            speed,
            no_loop,
            fps,
            seconds,
            start_frame,
            watch,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(speed) = speed {
                config.playback.speed = PlaybackSpeed::new(speed)?;
            }
            if no_loop {
                config.playback.looping = false;
            }
            if start_frame.is_some() {
                config.playback.start_frame_index = start_frame;
            }
            run_play(&table, &config, fps, seconds, watch)
        }
    }
}

fn run_inspect(path: &Path, config: Option<&Path>) -> pose_player_core::Result<()> {
    let config = load_config(config)?;
    let text = std::fs::read_to_string(path)?;
    let parsed = TableParser::new(&config.joint_table)
        .with_policy(config.playback.numeric_policy)
        .parse(&text)?;

    println!(
        "{}: {} records, {} skipped lines (joint table `{}` v{}, {} columns)",
        path.display(),
        parsed.records.len(),
        parsed.skipped_lines(),
        config.joint_table.name,
        config.joint_table.version,
        config.joint_table.column_count(),
    );
    if let (Some(first), Some(last)) = (parsed.records.first(), parsed.records.last()) {
        println!("time span: {:.3}s .. {:.3}s", first.time, last.time);
    }
    for diagnostic in &parsed.diagnostics {
        println!("  {diagnostic}");
    }
    Ok(())
}

fn run_play(
    path: &Path,
    config: &AppConfig,
    fps: u32,
    seconds: Option<f64>,
    watch: Option<JointId>,
) -> pose_player_core::Result<()> {
    tracing::info!(?path, fps, looping = config.playback.looping, "starting playback");

    let text = std::fs::read_to_string(path)?;
    let mut session = PlaybackSession::from_config(config);
    let mut rig = InMemoryRig::humanoid();
    session.load_text(&text)?;
    session.bind(&rig);

    let fps = fps.max(1);
    let delta = 1.0 / f64::from(fps);
    let speed = config.playback.speed.get();
    let seconds = seconds.unwrap_or_else(|| {
        let duration = session.timeline().duration();
        if speed > 0.0 {
            duration / speed
        } else {
            duration
        }
    });
    let ticks = (seconds * f64::from(fps)).ceil().max(1.0) as u64;

    let mut last_frame = None;
    for tick in 0..ticks {
        let state = session.tick(delta, &mut rig);
        let frame = session.current_frame();
        if last_frame != Some(frame) {
            tracing::info!(tick, frame, clock = session.timeline().clock(), ?state, "pose");
            if let Some(transform) = watch.and_then(|joint| rig.transform(joint)) {
                let rotation = transform.rotation;
                let position = transform.position;
                tracing::info!(
                    joint = ?watch,
                    rotation = ?[rotation.i, rotation.j, rotation.k, rotation.w],
                    position = ?[position.x, position.y, position.z],
                    "watched joint"
                );
            }
            last_frame = Some(frame);
        }
        if state == PlaybackState::ClampedAtEnd {
            tracing::info!(tick, "reached the end of the table");
            break;
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> pose_player_core::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::default()),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Replays recorded skeletal pose tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a pose table and report what was found.
    Inspect {
        /// Path to the pose table.
        table: PathBuf,
        /// JSON configuration carrying the joint table layout.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Play a pose table against an in-memory humanoid rig.
    Play {
        /// Path to the pose table.
        table: PathBuf,
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Playback speed multiplier.
        #[arg(short, long)]
        speed: Option<f64>,
        /// Hold the last record instead of looping.
        #[arg(long)]
        no_loop: bool,
        /// Ticks per second of the simulated host loop.
        #[arg(long, default_value_t = 60)]
        fps: u32,
        /// Wall-clock seconds to simulate. Defaults to one pass of the table.
        #[arg(long)]
        seconds: Option<f64>,
        /// Record index to start from.
        #[arg(long)]
        start_frame: Option<usize>,
        /// Joint whose transform is logged whenever the frame changes.
        #[arg(short, long)]
        watch: Option<JointId>,
    },
}
