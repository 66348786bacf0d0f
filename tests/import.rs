use glam::{Mat4, UVec2, Vec3};
use lvl_files::level::reader::LevelReader;
use lvl_files::level::types::{Level, Material};
use lvlimport::error::{Disposition, ImportError, ImportUnit};
use lvlimport::rendering::common::types::{BoneWeight, SkinType, Texture, TransparencyType};
use lvlimport::rendering::importer::model_importer::{ImportedModel, ModelImporter};
use lvlimport::rendering::loader::material_cache::{MaterialCache, MaterialResolver};
use lvlimport::rendering::loader::model_loader::ModelLoader;
use lvlimport::rendering::loader::texture_loader::{InMemoryTextures, NoTextures};
use lvlimport::settings::ImportSettings;
use std::sync::{Arc, Mutex};

const LEVEL: &str = r#"{
    "name": "test",
    "models": [
        {
            "name": "rep_inf_trooper",
            "is_skeletal_mesh": true,
            "bones": [
                { "name": "root", "location": [0.0, 1.0, 0.0] },
                { "name": "child", "parent_name": "root", "location": [0.0, 0.5, 0.0] }
            ],
            "segments": [
                {
                    "bone": "child",
                    "vertices": [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
                    "normals": [[0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
                    "uvs": [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
                    "indices": [0, 1, 2, 0, 2, 3],
                    "material": { "texture": "rep_inf_trooper", "flags": 2 },
                    "vertex_weights": [
                        { "bone_index": 0, "weight": 1.0 },
                        { "bone_index": 0, "weight": 1.0 },
                        { "bone_index": 0, "weight": 1.0 },
                        { "bone_index": 0, "weight": 1.0 }
                    ]
                }
            ]
        },
        {
            "name": "rep_bldg_door",
            "has_non_trivial_hierarchy": true,
            "bones": [
                { "name": "frame" },
                { "name": "wing", "parent_name": "frame", "location": [2.0, 0.0, 0.0] }
            ],
            "segments": [
                { "bone": "wing", "vertices": [[0, 0, 0], [1, 0, 0], [0, 1, 0]], "indices": [0, 1, 2] },
                { "bone": "frame", "vertices": [[0, 0, 0], [1, 0, 0], [0, 1, 0]], "indices": [0, 1, 2] },
                { "bone": "ghost", "vertices": [[0, 0, 0], [1, 0, 0], [0, 1, 0]], "indices": [0, 1, 2] }
            ],
            "collision_mesh": {
                "vertices": [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0],
                "indices": [0, 1, 2]
            }
        },
        {
            "name": "rep_walker",
            "is_skeletal_mesh": true,
            "bones": [ { "name": "root" } ],
            "segments": [
                { "vertices": [[0, 0, 0], [1, 0, 0], [0, 1, 0]], "indices": [0, 1, 2], "is_pretransformed": true },
                { "vertices": [[0, 0, 0], [1, 0, 0], [0, 1, 0]], "indices": [0, 1, 2] }
            ]
        }
    ]
}"#;

fn level() -> Level {
    LevelReader::parse_level_from_slice(LEVEL.as_bytes()).expect("the fixture is valid")
}

fn import(name: &str, cache: &mut MaterialCache) -> Result<ImportedModel, ImportError> {
    let level = level();
    let model = level.model(name).expect("the fixture contains the model");
    ModelImporter::import(model, cache, &ImportSettings::default())
}

#[test_log::test]
fn two_bone_skinned_model() -> Result<(), ImportError> {
    let mut textures = InMemoryTextures::default();
    textures.insert(Texture {
        label: "rep_inf_trooper".to_string(),
        size: UVec2::new(1, 1),
        data: vec![255, 255, 255, 255],
    });
    let mut cache = MaterialCache::new(Box::new(textures));
    let model = import("rep_inf_trooper", &mut cache)?;

    // the model root plus one node per bone
    assert_eq!(model.bone_nodes.len(), 2);
    assert_eq!(model.scene.len(), 3);
    let child = model.bone_nodes["child"];
    assert_eq!(model.scene.path(child), vec!["rep_inf_trooper", "root", "child"]);

    assert_eq!(model.meshes.len(), 1);
    let mesh = &model.meshes[0];
    assert_eq!(mesh.node, model.scene.root());
    assert_eq!(mesh.vertex_buffers.vertex_count(), 4);
    assert_eq!(mesh.vertex_buffers.position_buffer[1], Vec3::new(-1.0, 0.0, 0.0));
    assert_eq!(mesh.index_buffer, vec![0, 2, 1, 0, 3, 2]);
    assert!(mesh.materials[0].is_textured());
    assert_eq!(mesh.materials[0].transparency, TransparencyType::Cutout { cutout: 0.5 });

    let skin = mesh.skin.as_ref().expect("skeletal meshes are skinned");
    assert_eq!(skin.skin_type, SkinType::Deformed);
    assert_eq!(skin.bones.len(), 2);
    assert_eq!(skin.bind_poses.len(), 2);
    assert!(skin.bind_poses[0].abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)), 1e-6));
    assert!(skin.bind_poses[1].abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, -1.5, 0.0)), 1e-6));

    let weights = skin.weights.as_ref().expect("homogeneous segments are packed");
    assert_eq!(weights.influences_per_vertex, 3);
    assert_eq!(weights.weights.len(), 12);
    for vertex in 0..4 {
        let influences = weights.vertex_weights(vertex);
        assert_eq!(
            influences[0],
            BoneWeight {
                bone_index: 0,
                weight: 1.0
            }
        );
        assert!(influences[1..].iter().all(|influence| influence.weight == 0.0));
    }

    assert!(model.collision.is_none());
    assert!(model.issues.is_empty());
    Ok(())
}

#[test_log::test]
fn empty_texture_is_always_the_default_material() {
    let mut cache = MaterialCache::new(Box::new(NoTextures));
    let default = cache.default_material().clone();

    for flags in [0, 1, 2, 4, 6, 0x10000, 0xFFFF_FFFF] {
        let record = Material {
            texture: String::new(),
            flags,
        };
        assert!(Arc::ptr_eq(&cache.resolve_material(&record), &default));
    }

    assert!(cache.is_empty());
}

#[test_log::test]
fn grouped_model_with_an_unknown_bone() -> Result<(), ImportError> {
    let mut cache = MaterialCache::new(Box::new(NoTextures));
    let model = import("rep_bldg_door", &mut cache)?;

    assert_eq!(model.meshes.len(), 2);
    assert_eq!(model.meshes[0].node, model.bone_nodes["wing"]);
    assert_eq!(model.meshes[1].node, model.bone_nodes["frame"]);
    assert!(model.meshes.iter().all(|mesh| mesh.skin.is_none()));

    // rigid meshes hang below their bone
    let wing = model.scene.world_transform(model.bone_nodes["wing"]);
    assert_eq!(Vec3::from(wing.translation), Vec3::new(-2.0, 0.0, 0.0));

    assert_eq!(model.issues.len(), 1);
    assert_eq!(model.issues[0].unit, ImportUnit::SegmentGroup("ghost".to_string()));
    assert_eq!(model.issues[0].disposition, Disposition::Skipped);

    let collision = model.collision.as_ref().expect("the door has a collision mesh");
    assert_eq!(collision.vertices[1], Vec3::new(-1.0, 0.0, 0.0));
    assert_eq!(collision.indices, vec![0, 1, 2]);
    Ok(())
}

#[test_log::test]
fn heterogeneous_pretransformation_keeps_the_geometry() -> Result<(), ImportError> {
    let mut cache = MaterialCache::new(Box::new(NoTextures));
    let model = import("rep_walker", &mut cache)?;

    assert_eq!(model.meshes.len(), 1);
    assert_eq!(model.vertex_count(), 6);
    let skin = model.meshes[0].skin.as_ref().expect("skeletal meshes are skinned");
    assert!(skin.weights.is_none());
    assert_eq!(skin.bind_poses.len(), 1);

    assert_eq!(model.issues.len(), 1);
    assert_eq!(model.issues[0].unit, ImportUnit::SkinWeights);
    assert_eq!(model.issues[0].disposition, Disposition::Degraded);
    assert!(matches!(
        model.issues[0].error,
        ImportError::HeterogeneousPretransformation { .. }
    ));
    Ok(())
}

#[test_log::test]
fn batch_import_shares_the_material_cache() {
    let level = level();
    let cache = Mutex::new(MaterialCache::new(Box::new(NoTextures)));
    let settings = ImportSettings {
        jobs: 2,
        ..Default::default()
    };

    let results = ModelLoader::new(&cache, &settings).import_level(&level, &[]);
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|(_, result)| result.is_ok()));

    // Only the trooper references a texture, everything else uses the default material.
    let cache = cache.into_inner().expect("no worker panicked");
    assert_eq!(cache.len(), 1);
}
