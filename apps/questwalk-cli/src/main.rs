mod wander;

use anyhow::Context;
use clap::{Parser, Subcommand};
use questwalk_assets::{AvatarAsset, AvatarResolver, GltfLoader, ModelLoader};
use questwalk_input::InputRecording;
use questwalk_motion::SmoothingMode;
use questwalk_scene::{FrameReport, SceneConfig, SceneOrchestrator};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "questwalk-cli", about = "Headless tools for the questwalk avatar scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SceneArgs {
    /// Scene configuration (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Avatar model (.gltf or .glb); overrides the config file
    #[arg(long)]
    avatar: Option<String>,

    /// Scale smoothing by frame duration instead of once per frame
    #[arg(long)]
    frame_rate_independent: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run a key script through the frame loop and print the HUD
    Simulate {
        /// Segments of `keys:frames`, e.g. "forward:60,forward+right+run:30,none:60"
        #[arg(short, long, conflicts_with = "wander")]
        script: Option<String>,
        /// Generate a pseudo-random walk from this seed instead of a script
        #[arg(long)]
        wander: Option<u64>,
        /// Number of segments in a generated walk
        #[arg(long, default_value = "12")]
        segments: usize,
        /// Frame duration in seconds
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,
        /// Print every Nth frame
        #[arg(long, default_value = "30")]
        every: u64,
        /// Print frame reports as JSON lines
        #[arg(long)]
        json: bool,
        /// Also save the input as a recording
        #[arg(long)]
        record: Option<PathBuf>,
        #[command(flatten)]
        scene: SceneArgs,
    },
    /// Save a key script as an input recording
    Record {
        /// Segments of `keys:frames`
        script: String,
        /// Output file (JSON)
        #[arg(short, long)]
        out: PathBuf,
        /// Frame duration in seconds
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,
    },
    /// Replay a recording twice and check both runs end in the same state
    Replay {
        /// Recording file (JSON)
        file: PathBuf,
        #[command(flatten)]
        scene: SceneArgs,
    },
    /// Load an avatar model and print how it would be animated
    InspectAsset {
        /// Model file (.gltf or .glb)
        path: String,
    },
}

impl SceneArgs {
    fn load(&self) -> anyhow::Result<SceneConfig> {
        let mut config = match &self.config {
            Some(path) => SceneConfig::load(path)
                .with_context(|| format!("loading scene config {}", path.display()))?,
            None => SceneConfig::default(),
        };
        if let Some(url) = &self.avatar {
            config.avatar_url = Some(url.clone());
        }
        if self.frame_rate_independent {
            config.motion.smoothing = SmoothingMode::FrameRateIndependent;
        }
        Ok(config)
    }
}

/// Mount a scene with the avatar resolved up front, so headless runs start
/// from the same state every time.
fn mount(config: SceneConfig) -> SceneOrchestrator {
    let loader = GltfLoader::new();
    let resolver = match &config.avatar_url {
        Some(url) => AvatarResolver::immediate(loader.load(url)),
        None => AvatarResolver::spawn(Arc::new(loader), None),
    };
    SceneOrchestrator::with_resolver(config, resolver)
}

fn print_report(
    scene: &SceneOrchestrator,
    report: &FrameReport,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }
    let clip = report
        .selection
        .as_ref()
        .and_then(|s| s.active_clip.as_deref())
        .unwrap_or("-");
    println!(
        "#{:<5} {}{}{}",
        report.frame,
        scene.hud(),
        if clip == "-" { String::new() } else { format!(" | clip {clip}") },
        if report.degraded { " | degraded" } else { "" }
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("questwalk-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("scene: {}", questwalk_scene::crate_info());
            let config = SceneConfig::default();
            println!(
                "motion: base_speed={} run_speed={} smoothing={:?}",
                config.motion.base_speed, config.motion.run_speed, config.motion.smoothing
            );
            println!(
                "camera: offset={} damping={}",
                config.camera.offset, config.camera.damping
            );
        }
        Commands::Simulate {
            script,
            wander,
            segments,
            dt,
            every,
            json,
            record,
            scene,
        } => {
            let recording = match (script, wander) {
                (Some(script), _) => InputRecording::from_script(&script, dt)?,
                (None, Some(seed)) => wander::wander(seed, segments, dt),
                (None, None) => anyhow::bail!("pass --script or --wander"),
            };
            if let Some(path) = &record {
                recording
                    .save(path)
                    .with_context(|| format!("saving recording {}", path.display()))?;
                tracing::info!(path = %path.display(), frames = recording.len(), "recording saved");
            }

            let mut scene = mount(scene.load()?);
            let every = every.max(1);
            let mut last = None;
            for frame in &recording.frames {
                scene.set_input_state(frame.input);
                let Some(report) = scene.frame(frame.dt) else {
                    break;
                };
                if report.frame % every == 0 {
                    print_report(&scene, &report, json)?;
                }
                last = Some(report);
            }
            if let Some(report) = &last {
                print_report(&scene, report, json)?;
            }
            scene.teardown();
        }
        Commands::Record { script, out, dt } => {
            let recording = InputRecording::from_script(&script, dt)?;
            recording
                .save(&out)
                .with_context(|| format!("saving recording {}", out.display()))?;
            println!(
                "Recorded {} frames ({:.2}s) to {}",
                recording.len(),
                recording.duration(),
                out.display()
            );
        }
        Commands::Replay { file, scene } => {
            let recording = InputRecording::load(&file)
                .with_context(|| format!("loading recording {}", file.display()))?;
            let config = scene.load()?;

            let mut first = mount(config.clone());
            let mut second = mount(config);
            let a = first.play(&recording);
            let b = second.play(&recording);

            let Some(a) = a else {
                anyhow::bail!("recording {} has no frames", file.display());
            };
            println!("Frames: {} ({:.2}s)", recording.len(), recording.duration());
            println!("Run 1: {}", first.hud());
            println!("Run 2: {}", second.hud());
            let matched = b.as_ref().is_some_and(|b| b.motion == a.motion);
            println!("Match: {}", if matched { "OK" } else { "MISMATCH" });
            if !matched {
                anyhow::bail!("replay diverged");
            }
        }
        Commands::InspectAsset { path } => {
            let model = GltfLoader::new()
                .load(&path)
                .with_context(|| format!("loading avatar {path}"))?;
            let asset = AvatarAsset::from_model(model);
            let scene = asset.scene();
            let names = |ids: &[questwalk_common::NodeId]| -> Vec<String> {
                ids.iter()
                    .filter_map(|id| scene.get(*id).map(|n| n.name.clone()))
                    .collect()
            };

            println!("Avatar: {path}");
            if let Some(id) = asset.source() {
                println!("Source: {:#018x}", id.0);
            }
            println!("Kind: {}", asset.kind_name());
            println!("Nodes: {}", scene.len());
            println!("Arms: {:?}", names(&asset.node_roles().arms));
            println!("Legs: {:?}", names(&asset.node_roles().legs));
            for clip in asset.clips() {
                println!("Clip: {} ({:.2}s)", clip.name, clip.duration);
            }
            if let AvatarAsset::Rigged {
                clips, clip_roles, ..
            } = &asset
            {
                for (role, index) in [("Moving", clip_roles.moving), ("Idle", clip_roles.idle)] {
                    if let Some(clip) = clips.get(index) {
                        println!("{role} clip: {}", clip.name);
                    }
                }
            }
        }
    }

    Ok(())
}
