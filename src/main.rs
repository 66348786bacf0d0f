use anyhow::{Context, bail};
use clap::Parser;
use log::{debug, error, info, warn};
use lvl_files::level::types::Level;
use lvlimport::io::fs::loader::DirectoryLoader;
use lvlimport::rendering::importer::model_importer::ImportedModel;
use lvlimport::rendering::loader::material_cache::MaterialCache;
use lvlimport::rendering::loader::model_loader::ModelLoader;
use lvlimport::rendering::loader::texture_loader::ImageTextureProvider;
use lvlimport::settings::{CliArgs, ImportSettings, OperationMode};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    #[cfg(feature = "tracy")]
    tracy_client::Client::start();

    let args = CliArgs::parse();
    log::trace!("Starting with args: {:?}", args);

    match args.operation_mode {
        OperationMode::Import {
            levels,
            models,
            texture_dirs,
            settings,
        } => import(&args.data_dir, &levels, &models, &texture_dirs, settings.into_settings()?),
        OperationMode::Inspect { level } => inspect(&args.data_dir, &level),
    }
}

fn import(
    data_dir: &str,
    levels: &[PathBuf],
    models: &[String],
    texture_dirs: &[PathBuf],
    settings: ImportSettings,
) -> Result<(), anyhow::Error> {
    let mut failed = 0;

    for path in levels {
        let level = match load_level(data_dir, path) {
            Ok(level) => level,
            Err(err) => {
                error!("{:#}", err);
                failed += 1;
                continue;
            }
        };

        // Textures live next to the level unless told otherwise.
        let texture_roots = if texture_dirs.is_empty() {
            search_roots(data_dir, path)
        } else {
            texture_dirs.to_vec()
        };

        let textures = ImageTextureProvider::new(DirectoryLoader::new(texture_roots.as_slice()));
        let materials = Mutex::new(MaterialCache::new(Box::new(textures)));
        let loader = ModelLoader::new(&materials, &settings);

        for (name, result) in loader.import_level(&level, models) {
            match result {
                Ok(model) => log_summary(&model),
                Err(err) => {
                    error!("{}: {}", name, err);
                    failed += 1;
                }
            }
        }
    }

    if failed > 0 {
        bail!("{} levels or models failed to import", failed);
    }

    Ok(())
}

fn inspect(data_dir: &str, path: &Path) -> Result<(), anyhow::Error> {
    let level = load_level(data_dir, path)?;
    println!("{} ({} models)", level.name, level.models.len());

    for model in &level.models {
        println!(
            "  {:<32} bones: {:>3} segments: {:>3} vertices: {:>6} skeletal: {:<5} hierarchy: {:<5} broken: {:<5} collision: {}",
            model.name,
            model.bones.len(),
            model.segments.len(),
            model.total_vertex_count(),
            model.is_skeletal_mesh,
            model.has_non_trivial_hierarchy,
            model.is_skeleton_broken,
            model.collision_mesh.is_some()
        );
    }

    Ok(())
}

fn log_summary(model: &ImportedModel) {
    info!(
        "{}: {} nodes, {} meshes, {} submeshes, {} vertices, skin: {:?}, collider: {}, {} issues",
        model.name,
        model.scene.len(),
        model.meshes.len(),
        model.submesh_count(),
        model.vertex_count(),
        model.skin_type(),
        model.collision.is_some(),
        model.issues.len()
    );

    for (id, node) in model.scene.iter() {
        debug!("  {} {} at {}", id, model.scene.path(id).join("/"), node.translation);
    }

    for issue in &model.issues {
        warn!("  {}: {}", model.name, issue);
    }
}

/// The directory of `path` itself, and the same relative directory below the data dir.
fn search_roots(data_dir: &str, path: &Path) -> Vec<PathBuf> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    [parent.to_path_buf(), Path::new(data_dir).join(parent)]
        .into_iter()
        .filter(|root| root.is_dir())
        .collect()
}

fn load_level(data_dir: &str, path: &Path) -> Result<Level, anyhow::Error> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} doesn't name a level file", path.display()))?;

    let loader = DirectoryLoader::new(search_roots(data_dir, path).as_slice());
    ModelLoader::load_level(&loader, file_name)
}
