//! contact-scene CLI - write a default config and run the demo headless

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

use contact_scene::config::CONFIG_FILE;
use contact_scene::{CollisionFlags, Color, ContactCallbackDemo, SceneConfig};

#[derive(Parser)]
#[command(name = "contact-scene")]
#[command(about = "Contact callback demo scene", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default scene.toml
    Init {
        /// Target directory (default: current directory)
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Overwrite an existing scene.toml
        #[arg(long)]
        force: bool,
    },
    /// Run the demo without rendering and report entity state
    Run {
        /// Path to a scene.toml or a directory containing one
        config: Option<PathBuf>,
        /// Number of fixed steps to simulate
        #[arg(short, long, default_value = "240", env = "CONTACT_SCENE_STEPS")]
        steps: u32,
        /// Shoot a box before simulating, as "x,y,z:dx,dy,dz" (repeatable)
        #[arg(long = "shoot")]
        shots: Vec<Shot>,
        /// Override the color seed
        #[arg(long)]
        seed: Option<u64>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Origin and direction of a shot box
#[derive(Debug, Clone, Copy)]
struct Shot {
    origin: [f32; 3],
    direction: [f32; 3],
}

impl FromStr for Shot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (origin, direction) = s
            .split_once(':')
            .ok_or_else(|| format!("expected \"x,y,z:dx,dy,dz\", got \"{}\"", s))?;
        Ok(Self {
            origin: parse_vec3(origin)?,
            direction: parse_vec3(direction)?,
        })
    }
}

fn parse_vec3(s: &str) -> Result<[f32; 3], String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("bad number \"{}\": {}", p, e)))
        .collect::<Result<Vec<_>, _>>()?;
    <[f32; 3]>::try_from(parts).map_err(|v| format!("expected 3 components, got {}", v.len()))
}

#[derive(Serialize)]
struct EntityReport {
    index: usize,
    name: String,
    position: Option<[f32; 3]>,
    color: Color,
    flags: u32,
    callback_enabled: bool,
    collided: bool,
}

#[derive(Serialize)]
struct RunReport {
    steps: u32,
    contacts_dispatched: usize,
    collided: usize,
    entities: Vec<EntityReport>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { dir, force } => init_config(&dir, force),
        Commands::Run {
            config,
            steps,
            shots,
            seed,
            json,
        } => run_demo(config, steps, &shots, seed, json),
    }
}

fn init_config(dir: &Path, force: bool) {
    let path = dir.join(CONFIG_FILE);
    if path.exists() && !force {
        eprintln!("Error: {} already exists (use --force to overwrite)", path.display());
        std::process::exit(1);
    }

    let text = match SceneConfig::default().to_toml_string() {
        Ok(text) => text,
        Err(e) => fail(e),
    };
    if let Err(e) = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&path, text)) {
        fail(format!("failed to write {}: {}", path.display(), e));
    }
    println!("Wrote {}", path.display());
}

fn load_config(path: Option<PathBuf>) -> SceneConfig {
    let result = match path {
        Some(p) if p.is_dir() => SceneConfig::from_dir(&p),
        Some(p) => SceneConfig::from_file(&p),
        None if Path::new(CONFIG_FILE).exists() => SceneConfig::from_file(Path::new(CONFIG_FILE)),
        None => Ok(SceneConfig::default()),
    };
    result.unwrap_or_else(|e| fail(e))
}

fn run_demo(config: Option<PathBuf>, steps: u32, shots: &[Shot], seed: Option<u64>, json: bool) {
    let mut config = load_config(config);
    if seed.is_some() {
        config.seed = seed;
    }

    let mut demo = ContactCallbackDemo::create(config).unwrap_or_else(|e| fail(e));
    for shot in shots {
        if let Err(e) = demo.tap(shot.origin, shot.direction) {
            fail(e);
        }
    }

    let contacts_dispatched: usize = (0..steps).map(|_| demo.update()).sum();

    let collided = demo.collided();
    let scene = demo.scene();
    let entities = scene
        .world()
        .entities
        .iter()
        .enumerate()
        .map(|(index, entity)| {
            let flags = scene.collision_flags(index).unwrap_or_default();
            EntityReport {
                index,
                name: entity.name.clone(),
                position: scene.world().position(index),
                color: entity.color,
                flags: flags.bits(),
                callback_enabled: flags.contains(CollisionFlags::CUSTOM_MATERIAL_CALLBACK),
                collided: collided.contains(&index),
            }
        })
        .collect();

    let report = RunReport {
        steps,
        contacts_dispatched,
        collided: collided.len(),
        entities,
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => fail(e),
        }
    } else {
        print_report(&report);
    }

    demo.dispose();
}

fn print_report(report: &RunReport) {
    println!(
        "Simulated {} steps, {} contact points dispatched, {} entities collided",
        report.steps, report.contacts_dispatched, report.collided
    );
    for e in &report.entities {
        let pos = e
            .position
            .map(|p| format!("({:.2}, {:.2}, {:.2})", p[0], p[1], p[2]))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  #{:<3} {:<6} pos={} flags={:#06b}{}",
            e.index,
            e.name,
            pos,
            e.flags,
            if e.collided { " collided" } else { "" }
        );
    }
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", e);
    std::process::exit(1);
}
