use crate::error::ImportError;
use crate::io::common::loader::RawAssetLoader;
use crate::rendering::importer::model_importer::{ImportedModel, ModelImporter};
use crate::rendering::loader::material_cache::SharedMaterialCache;
use crate::settings::ImportSettings;
use anyhow::{Context, anyhow};
use itertools::Itertools;
use log::{debug, info, warn};
use lvl_files::level::reader::LevelReader;
use lvl_files::level::types::{Level, Model};
use std::sync::Mutex;

/// Marks the low detail variants the game streams in at a distance.
pub const LOW_DETAIL_MARKER: &str = "LOWD";

pub type ModelResult = (String, Result<ImportedModel, ImportError>);

pub struct ModelLoader<'a> {
    materials: &'a SharedMaterialCache,
    settings: &'a ImportSettings,
}

impl<'a> ModelLoader<'a> {
    pub fn new(materials: &'a SharedMaterialCache, settings: &'a ImportSettings) -> Self {
        Self { materials, settings }
    }

    pub fn load_level<L: RawAssetLoader>(loader: &L, path: &str) -> Result<Level, anyhow::Error> {
        let buf = loader
            .load_raw_owned(path)
            .ok_or_else(|| anyhow!("Level {} could not be found", path))?;
        let mut level =
            LevelReader::parse_level_from_slice(&buf).with_context(|| format!("Failed to parse level {}", path))?;

        if level.name.is_empty() {
            level.name = path.to_string();
        }

        debug!("Loaded level {} with {} models", level.name, level.models.len());
        Ok(level)
    }

    /// The models of `level` that should be imported: all of them if `names` is empty, otherwise those named.
    /// Names that don't exist in the level are reported as [`ImportError::ModelNotFound`].
    pub fn select<'l>(&self, level: &'l Level, names: &[String]) -> (Vec<&'l Model>, Vec<ModelResult>) {
        if names.is_empty() {
            let models = level
                .models
                .iter()
                .filter(|model| {
                    let skip = self.settings.skip_lowd && model.name.contains(LOW_DETAIL_MARKER);
                    if skip {
                        debug!("Skipping the low detail model {}", model.name);
                    }
                    !skip
                })
                .collect();
            return (models, vec![]);
        }

        let mut models = vec![];
        let mut missing = vec![];
        for name in names.iter().unique() {
            match level.model(name) {
                Some(model) => models.push(model),
                None => {
                    warn!("Model {} is not part of level {}", name, level.name);
                    missing.push((name.clone(), Err(ImportError::ModelNotFound(name.clone()))));
                }
            }
        }

        (models, missing)
    }

    pub fn import_model(&self, model: &Model) -> Result<ImportedModel, ImportError> {
        let mut materials = self.materials;
        ModelImporter::import(model, &mut materials, self.settings)
    }

    /// Imports the selected models of `level`, spreading them over `settings.jobs` worker threads.
    /// The results keep the order of the level, followed by the models that couldn't be found.
    pub fn import_level(&self, level: &Level, names: &[String]) -> Vec<ModelResult> {
        profiling::scope!("ModelLoader::import_level");
        let (models, missing) = self.select(level, names);
        let jobs = self.settings.jobs.clamp(1, models.len().max(1));
        info!("Importing {} models of {} on {} threads", models.len(), level.name, jobs);

        let mut results = if jobs == 1 {
            models
                .iter()
                .map(|model| (model.name.clone(), self.import_model(model)))
                .collect_vec()
        } else {
            self.import_parallel(&models, jobs)
        };

        results.extend(missing);
        results
    }

    fn import_parallel(&self, models: &[&Model], jobs: usize) -> Vec<ModelResult> {
        let slots: Vec<Mutex<Option<ModelResult>>> = models.iter().map(|_| Mutex::new(None)).collect();
        let next = Mutex::new(0usize);

        std::thread::scope(|scope| {
            for worker in 0..jobs {
                let spawned = std::thread::Builder::new()
                    .name(format!("Import Worker {}", worker))
                    .spawn_scoped(scope, || {
                        loop {
                            let idx = {
                                let mut next = next.lock().expect("poisoned work queue lock");
                                let idx = *next;
                                *next += 1;
                                idx
                            };

                            let Some(model) = models.get(idx) else {
                                break;
                            };

                            let result = self.import_model(model);
                            *slots[idx].lock().expect("poisoned result lock") = Some((model.name.clone(), result));
                        }
                    });

                if let Err(err) = spawned {
                    warn!("Failed to spawn import worker {}: {}", worker, err);
                }
            }
        });

        // Models no worker picked up (because none could be spawned) are imported on this thread.
        slots
            .into_iter()
            .zip(models)
            .map(|(slot, model)| {
                slot.into_inner()
                    .expect("poisoned result lock")
                    .unwrap_or_else(|| (model.name.clone(), self.import_model(model)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::loader::material_cache::MaterialCache;
    use crate::rendering::loader::texture_loader::NoTextures;
    use lvl_files::common::types::{C3Vector, C4Quaternion};
    use lvl_files::level::types::{Bone, Segment};

    fn model(name: &str) -> Model {
        Model {
            name: name.to_string(),
            bones: vec![Bone {
                name: "root".to_string(),
                parent_name: String::new(),
                rotation: C4Quaternion::IDENTITY,
                location: C3Vector::default(),
            }],
            segments: vec![Segment {
                vertices: vec![C3Vector::default(); 3],
                indices: vec![0, 1, 2],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn level() -> Level {
        Level {
            name: "geo1".to_string(),
            models: vec![
                model("rep_bldg"),
                model("rep_bldg_LOWD"),
                model("rep_prop_crate"),
                model("rep_prop_barrel"),
                model("rep_prop_tank"),
            ],
        }
    }

    fn names(results: &[ModelResult]) -> Vec<&str> {
        results.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[test]
    fn low_detail_models_are_skipped() {
        let cache = Mutex::new(MaterialCache::new(Box::new(NoTextures)));
        let settings = ImportSettings::default();
        let loader = ModelLoader::new(&cache, &settings);

        let results = loader.import_level(&level(), &[]);
        assert_eq!(
            names(&results),
            vec!["rep_bldg", "rep_prop_crate", "rep_prop_barrel", "rep_prop_tank"]
        );
        assert!(results.iter().all(|(_, result)| result.is_ok()));

        let settings = ImportSettings {
            skip_lowd: false,
            ..Default::default()
        };
        let loader = ModelLoader::new(&cache, &settings);
        assert_eq!(loader.import_level(&level(), &[]).len(), 5);
    }

    #[test]
    fn unknown_models_are_not_found() {
        let cache = Mutex::new(MaterialCache::new(Box::new(NoTextures)));
        let settings = ImportSettings::default();
        let loader = ModelLoader::new(&cache, &settings);

        let wanted = vec!["rep_prop_tank".to_string(), "cis_walker".to_string()];
        let results = loader.import_level(&level(), &wanted);
        assert_eq!(names(&results), vec!["rep_prop_tank", "cis_walker"]);
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(ImportError::ModelNotFound(_))));
    }

    #[test]
    fn parallel_import_keeps_the_order() {
        let cache = Mutex::new(MaterialCache::new(Box::new(NoTextures)));
        let settings = ImportSettings {
            jobs: 3,
            ..Default::default()
        };
        let loader = ModelLoader::new(&cache, &settings);

        let results = loader.import_level(&level(), &[]);
        assert_eq!(
            names(&results),
            vec!["rep_bldg", "rep_prop_crate", "rep_prop_barrel", "rep_prop_tank"]
        );
        assert!(results.iter().all(|(_, result)| result.is_ok()));
    }

    #[test]
    fn levels_are_loaded_through_the_asset_loader() -> Result<(), anyhow::Error> {
        struct OneFile(Vec<u8>);
        impl RawAssetLoader for OneFile {
            fn load_raw_owned(&self, path: &str) -> Option<Vec<u8>> {
                (path == "geo1.json").then(|| self.0.clone())
            }

            fn contains(&self, path: &str) -> bool {
                path == "geo1.json"
            }
        }

        let loader = OneFile(br#"{ "models": [ { "name": "rep_bldg" } ] }"#.to_vec());
        let level = ModelLoader::load_level(&loader, "geo1.json")?;
        assert_eq!(level.name, "geo1.json");
        assert!(level.model("rep_bldg").is_some());
        assert!(ModelLoader::load_level(&loader, "geo2.json").is_err());
        Ok(())
    }
}
