//! roomview CLI - loads a room description and reports what it contains.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use roomview::assets::ObjDecoder;
use roomview::config::DEFAULT_SCENE_FILE;
use roomview::scene::load_scene;
use roomview::{AssetsConfig, CachePolicy, RoomLoader};

#[derive(Parser)]
#[command(name = "roomview")]
#[command(about = "Load a room scene description and its models", long_about = None)]
struct Cli {
    /// Directory holding the scene description and the models it references
    #[arg(short = 'a', long = "assets", default_value = "./")]
    assets: PathBuf,

    /// Scene description, relative to the assets directory
    #[arg(short, long, default_value = DEFAULT_SCENE_FILE)]
    scene: PathBuf,

    /// Rebuild preprocessed models whose source changed since they were cached
    #[arg(long)]
    rebuild_stale: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let policy = if cli.rebuild_stale {
        CachePolicy::RebuildWhenStale
    } else {
        CachePolicy::ExistenceOnly
    };
    let config = AssetsConfig::new(cli.assets)
        .with_scene_file(cli.scene)
        .with_cache_policy(policy);
    let loader = RoomLoader::new(config, ObjDecoder);
    let config = loader.config();
    info!(
        "assets path: {} (cache policy {:?})",
        config.assets_root.display(),
        config.cache_policy
    );

    let scene_path = config.scene_path();
    let scene = load_scene(&scene_path)
        .with_context(|| format!("could not load room from '{}'", scene_path.display()))?;
    let loaded = loader.load(&scene);

    let camera = &loaded.room.camera;
    info!(
        "camera at ({}, {}, {}), yaw {}",
        camera.position.x, camera.position.y, camera.position.z, camera.rotation.y
    );
    for object in &loaded.room.objects {
        info!(
            "{} ({}): {} mesh(es), {} triangle(s)",
            object.file,
            object.model.name,
            object.model.meshes.len(),
            object.model.triangle_count()
        );
    }
    for failure in &loaded.failures {
        warn!("{}: {}", failure.file, failure.error);
    }

    info!(
        "{} object(s) placed, {} failed",
        loaded.room.objects.len(),
        loaded.failures.len()
    );
    Ok(())
}
