use crate::error::{ImportError, ImportIssue, ImportUnit};
use crate::rendering::common::types::{BoneWeight, PackedWeights, Skin, SkinType};
use crate::rendering::importer::skeleton_importer::Skeleton;
use crate::settings::BoneIndexRemap;
use glam::Mat4;
use log::{debug, error, trace};
use lvl_files::level::types::Segment;

/// Influences per vertex when the vertices are baked into the bind pose.
pub const PRETRANSFORMED_INFLUENCES: u8 = 1;
pub const DEFORMED_INFLUENCES: u8 = 3;

pub enum WeightPacker {}

impl WeightPacker {
    /// Expands the native per segment weights into one buffer with a uniform width, in segment order.
    /// `remap` is only consulted when the skeleton is `broken`.
    pub fn pack(segments: &[&Segment], broken: bool, remap: &BoneIndexRemap) -> Result<PackedWeights, ImportError> {
        let total_vertices: usize = segments.iter().map(|segment| segment.vertex_count()).sum();
        let pretransformed = segments.iter().filter(|segment| segment.is_pretransformed).count();

        if pretransformed != 0 && pretransformed != segments.len() {
            return Err(ImportError::HeterogeneousPretransformation {
                pretransformed,
                segments: segments.len(),
            });
        }

        let influences_per_vertex = if pretransformed == 0 {
            DEFORMED_INFLUENCES
        } else {
            PRETRANSFORMED_INFLUENCES
        };

        let width = influences_per_vertex as usize;
        let mut weights = vec![BoneWeight::NONE; total_vertices * width];
        let mut offset = 0;

        for segment in segments {
            let native = segment.native_influences();
            if native > width {
                debug!(
                    "Segment bound to {} carries {} influences per vertex, keeping the first {}",
                    segment.bone, native, width
                );
            }

            for vertex in 0..segment.vertex_count() {
                let source = &segment.vertex_weights[vertex * native..(vertex + 1) * native];
                let target = &mut weights[(offset + vertex) * width..(offset + vertex + 1) * width];

                for (slot, weight) in target.iter_mut().zip(source) {
                    let bone_index = if broken {
                        remap.apply(weight.bone_index)
                    } else {
                        weight.bone_index as u32
                    };

                    *slot = BoneWeight {
                        bone_index,
                        weight: weight.weight,
                    };
                }
            }

            offset += segment.vertex_count();
        }

        trace!(
            "Packed {} vertices with {} influences each (broken skeleton: {})",
            total_vertices,
            influences_per_vertex,
            broken
        );

        Ok(PackedWeights {
            influences_per_vertex,
            weights,
        })
    }
}

pub enum BindPoseCalculator {}

impl BindPoseCalculator {
    /// One matrix per bone in skeleton order. Pretransformed vertices already are in the bind pose, so
    /// those get the identity. Otherwise each bone's pose is taken relative to the parent of the first bone.
    pub fn calculate(skeleton: &Skeleton, skin_type: SkinType) -> Vec<Mat4> {
        if skin_type == SkinType::Pretransformed {
            return vec![Mat4::IDENTITY; skeleton.bone_order.len()];
        }

        let Some(&first_bone) = skeleton.bone_order.first() else {
            return vec![];
        };

        let graph = &skeleton.graph;
        let reference = graph
            .node(first_bone)
            .parent
            .map(|parent| graph.world_transform(parent))
            .unwrap_or_default();

        skeleton
            .bone_order
            .iter()
            .map(|&bone| Mat4::from(graph.world_transform(bone).inverse() * reference))
            .collect()
    }
}

pub enum SkinImporter {}

impl SkinImporter {
    /// Builds the skin of a skeletal mesh. Failing to pack the weights is not fatal, the skin is kept without
    /// weights and the problem is returned as a degraded issue.
    pub fn import(
        segments: &[&Segment],
        skeleton: &Skeleton,
        broken: bool,
        remap: &BoneIndexRemap,
    ) -> (Skin, Option<ImportIssue>) {
        profiling::scope!("SkinImporter::import");
        let (weights, issue) = match WeightPacker::pack(segments, broken, remap) {
            Ok(weights) => (Some(weights), None),
            Err(err) => {
                error!("Abandoning the skin weights: {}", err);
                (None, Some(ImportIssue::degraded(ImportUnit::SkinWeights, err)))
            }
        };

        let skin_type = match &weights {
            Some(packed) if packed.influences_per_vertex == PRETRANSFORMED_INFLUENCES => SkinType::Pretransformed,
            _ => SkinType::Deformed,
        };

        let skin = Skin {
            skin_type,
            bones: skeleton.bone_order.clone(),
            bind_poses: BindPoseCalculator::calculate(skeleton, skin_type),
            weights,
        };

        (skin, issue)
    }
}
