use crate::error::{ImportError, ImportIssue, ImportUnit};
use crate::physics::collider_factory::{ColliderFactory, ImportedCollision};
use crate::rendering::common::mesh_merger::MeshMerger;
use crate::rendering::common::scene_graph::{NodeId, SceneGraph};
use crate::rendering::common::types::{CombinedMesh, SkinType};
use crate::rendering::importer::segment_grouping::{GroupingMode, SegmentGroup, SegmentGrouping};
use crate::rendering::importer::skeleton_importer::SkeletonImporter;
use crate::rendering::importer::skin_importer::SkinImporter;
use crate::rendering::loader::material_cache::MaterialResolver;
use crate::settings::{HierarchyPolicy, ImportSettings};
use glam::Affine3A;
use log::{debug, error, warn};
use lvl_files::level::types::Model;
use std::collections::{HashMap, HashSet};

/// Everything the pipeline produced for one model.
#[derive(Debug)]
pub struct ImportedModel {
    pub name: String,
    pub scene: SceneGraph,
    pub bone_nodes: HashMap<String, NodeId>,
    pub meshes: Vec<CombinedMesh>,
    pub collision: Option<ImportedCollision>,
    pub issues: Vec<ImportIssue>,
}

impl ImportedModel {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.vertex_buffers.vertex_count()).sum()
    }

    pub fn submesh_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.submeshes.len()).sum()
    }

    pub fn skin_type(&self) -> Option<SkinType> {
        self.meshes.iter().find_map(|mesh| mesh.skin.as_ref()).map(|skin| skin.skin_type)
    }
}

pub enum ModelImporter {}

impl ModelImporter {
    /// Runs the whole pipeline for `model`. Only structural problems of the skeleton are fatal, everything
    /// else ends up in [`ImportedModel::issues`].
    pub fn import<R: MaterialResolver>(
        model: &Model,
        materials: &mut R,
        settings: &ImportSettings,
    ) -> Result<ImportedModel, ImportError> {
        profiling::scope!("ModelImporter::import");
        // Skipping bones would shift the indices the weights refer to.
        let policy = if model.is_skeletal_mesh {
            HierarchyPolicy::Abort
        } else {
            settings.hierarchy_policy
        };

        let (skeleton, mut issues) = SkeletonImporter::build(&model.name, Affine3A::IDENTITY, &model.bones, policy)?;

        let mode = GroupingMode::for_model(model);
        debug!(
            "Importing {}: {} bones, {} segments, {:?}",
            model.name,
            model.bones.len(),
            model.segments.len(),
            mode
        );

        let mut meshes = vec![];
        let mut missing_textures = HashSet::new();

        for group in SegmentGrouping::group(model, &skeleton, mode) {
            let group = match group {
                Ok(group) => group,
                Err(issue) => {
                    issues.push(issue);
                    continue;
                }
            };

            if group.segments.is_empty() {
                continue;
            }

            let mut mesh = match ModelImporter::combine(&group, materials) {
                Ok(mesh) => mesh,
                Err(err) => {
                    error!("Model {}: dropping the {}: {}", model.name, group.unit(), err);
                    issues.push(ImportIssue::skipped(group.unit(), err));
                    continue;
                }
            };

            for (segment, material) in group.segments.iter().zip(&mesh.materials) {
                let texture = &segment.material.texture;
                if !texture.is_empty() && !material.is_textured() && missing_textures.insert(texture.clone()) {
                    issues.push(ImportIssue::degraded(
                        ImportUnit::Texture(texture.clone()),
                        ImportError::MissingTexture(texture.clone()),
                    ));
                }
            }

            if mode == GroupingMode::Flat && model.is_skeletal_mesh {
                let (skin, issue) = SkinImporter::import(
                    &group.segments,
                    &skeleton,
                    model.is_skeleton_broken,
                    settings.broken_bone_remap_for(&model.name),
                );
                mesh.skin = Some(skin);
                issues.extend(issue);
            }

            meshes.push(mesh);
        }

        let collision = match ColliderFactory::convert(model.collision_mesh.as_ref()) {
            Ok(collision) => collision,
            Err(err) => {
                warn!("Model {} won't have a collider: {}", model.name, err);
                issues.push(ImportIssue::degraded(ImportUnit::Collision, err));
                None
            }
        };

        Ok(ImportedModel {
            name: model.name.clone(),
            scene: skeleton.graph,
            bone_nodes: skeleton.bone_nodes,
            meshes,
            collision,
            issues,
        })
    }

    fn combine<R: MaterialResolver>(group: &SegmentGroup, materials: &mut R) -> Result<CombinedMesh, ImportError> {
        let (vertex_buffers, index_buffer) = MeshMerger::merge_segments(&group.segments, &group.layout)?;

        let materials = group
            .segments
            .iter()
            .map(|segment| materials.resolve_material(&segment.material))
            .collect();

        Ok(CombinedMesh {
            node: group.node,
            vertex_buffers,
            index_buffer,
            submeshes: group.layout.submeshes.clone(),
            materials,
            skin: None,
        })
    }
}
