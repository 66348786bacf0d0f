use crate::error::{ImportError, ImportIssue, ImportUnit};
use crate::rendering::common::mesh_merger::SegmentLayout;
use crate::rendering::common::scene_graph::NodeId;
use crate::rendering::importer::skeleton_importer::Skeleton;
use log::{error, trace};
use lvl_files::level::types::{Model, Segment};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingMode {
    /// One mesh per bone, the segments are rigidly parented to their bone node.
    ByBone,
    /// All segments form one mesh below the model root, skinned if the model is skeletal.
    Flat,
}

impl GroupingMode {
    pub fn for_model(model: &Model) -> Self {
        if model.has_non_trivial_hierarchy && !model.is_skeletal_mesh {
            GroupingMode::ByBone
        } else {
            GroupingMode::Flat
        }
    }
}

#[derive(Debug)]
pub struct SegmentGroup<'a> {
    /// The bone all segments are bound to, empty for the flat group.
    pub bone: &'a str,
    pub node: NodeId,
    pub segments: Vec<&'a Segment>,
    pub layout: SegmentLayout,
}

impl<'a> SegmentGroup<'a> {
    fn new(bone: &'a str, node: NodeId, segments: Vec<&'a Segment>) -> Self {
        let layout = SegmentLayout::new(&segments);
        Self {
            bone,
            node,
            segments,
            layout,
        }
    }

    pub fn unit(&self) -> ImportUnit {
        ImportUnit::SegmentGroup(self.bone.to_string())
    }
}

pub enum SegmentGrouping {}

impl SegmentGrouping {
    pub fn group<'a>(
        model: &'a Model,
        skeleton: &Skeleton,
        mode: GroupingMode,
    ) -> Vec<Result<SegmentGroup<'a>, ImportIssue>> {
        match mode {
            GroupingMode::Flat => vec![Ok(SegmentGroup::new(
                "",
                NodeId::ROOT,
                model.segments.iter().collect(),
            ))],
            GroupingMode::ByBone => SegmentGrouping::group_by_bone(model, skeleton),
        }
    }

    fn group_by_bone<'a>(model: &'a Model, skeleton: &Skeleton) -> Vec<Result<SegmentGroup<'a>, ImportIssue>> {
        // Keep the order in which the bones are first referenced, so the output is deterministic.
        let mut groups: Vec<(&'a str, Vec<&'a Segment>)> = vec![];
        let mut group_by_name: HashMap<&'a str, usize> = HashMap::new();

        for segment in &model.segments {
            if segment.bone.is_empty() {
                trace!("Skipping a segment of {} without a bone", model.name);
                continue;
            }

            let idx = *group_by_name.entry(segment.bone.as_str()).or_insert_with(|| {
                groups.push((segment.bone.as_str(), vec![]));
                groups.len() - 1
            });
            groups[idx].1.push(segment);
        }

        groups
            .into_iter()
            .map(|(bone, segments)| match skeleton.bone_node(bone) {
                Some(node) => Ok(SegmentGroup::new(bone, node, segments)),
                None => {
                    error!(
                        "Model {}: {} segments are bound to bone {}, which is missing from the skeleton",
                        model.name,
                        segments.len(),
                        bone
                    );
                    Err(ImportIssue::skipped(
                        ImportUnit::SegmentGroup(bone.to_string()),
                        ImportError::UnknownSegmentBone(bone.to_string()),
                    ))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::importer::skeleton_importer::SkeletonImporter;
    use crate::settings::HierarchyPolicy;
    use glam::Affine3A;
    use lvl_files::common::types::{C3Vector, C4Quaternion};
    use lvl_files::level::types::Bone;

    fn bone(name: &str, parent: &str) -> Bone {
        Bone {
            name: name.to_string(),
            parent_name: parent.to_string(),
            rotation: C4Quaternion::IDENTITY,
            location: C3Vector::default(),
        }
    }

    fn segment(bone: &str, vertex_count: usize) -> Segment {
        Segment {
            bone: bone.to_string(),
            vertices: vec![C3Vector::default(); vertex_count],
            indices: vec![0, 1, 2],
            ..Default::default()
        }
    }

    fn model(hierarchy: bool, skeletal: bool, segments: Vec<Segment>) -> Model {
        Model {
            name: "model".to_string(),
            bones: vec![bone("root", ""), bone("door", "root"), bone("hinge", "door")],
            segments,
            is_skeletal_mesh: skeletal,
            has_non_trivial_hierarchy: hierarchy,
            ..Default::default()
        }
    }

    fn skeleton(model: &Model) -> Skeleton {
        SkeletonImporter::build("model", Affine3A::IDENTITY, &model.bones, HierarchyPolicy::Abort)
            .expect("valid skeleton")
            .0
    }

    #[test]
    fn mode_selection() {
        assert_eq!(GroupingMode::for_model(&model(true, false, vec![])), GroupingMode::ByBone);
        assert_eq!(GroupingMode::for_model(&model(true, true, vec![])), GroupingMode::Flat);
        assert_eq!(GroupingMode::for_model(&model(false, false, vec![])), GroupingMode::Flat);
        assert_eq!(GroupingMode::for_model(&model(false, true, vec![])), GroupingMode::Flat);
    }

    #[test]
    fn grouping_by_bone_keeps_first_reference_order() {
        let model = model(
            true,
            false,
            vec![
                segment("hinge", 3),
                segment("door", 4),
                segment("", 5),
                segment("hinge", 6),
            ],
        );
        let skeleton = skeleton(&model);
        let groups = SegmentGrouping::group(&model, &skeleton, GroupingMode::ByBone);

        assert_eq!(groups.len(), 2);
        let hinge = groups[0].as_ref().expect("hinge is part of the skeleton");
        assert_eq!(hinge.bone, "hinge");
        assert_eq!(hinge.node, skeleton.bone_node("hinge").expect("hinge exists"));
        assert_eq!(hinge.segments.len(), 2);
        assert_eq!(hinge.layout.total_vertices, 9);
        assert_eq!(hinge.layout.submeshes[1].base_vertex, 3);

        let door = groups[1].as_ref().expect("door is part of the skeleton");
        assert_eq!(door.layout.total_vertices, 4);
    }

    #[test]
    fn flat_grouping_takes_everything() {
        let model = model(false, true, vec![segment("hinge", 3), segment("", 5)]);
        let skeleton = skeleton(&model);
        let groups = SegmentGrouping::group(&model, &skeleton, GroupingMode::Flat);

        assert_eq!(groups.len(), 1);
        let group = groups[0].as_ref().expect("flat groups always succeed");
        assert_eq!(group.node, NodeId::ROOT);
        assert_eq!(group.layout.total_vertices, 8);
        assert_eq!(group.layout.submeshes.len(), 2);
    }

    #[test]
    fn unknown_bone_fails_only_its_group() {
        let model = model(true, false, vec![segment("ghost", 3), segment("door", 3)]);
        let skeleton = skeleton(&model);
        let groups = SegmentGrouping::group(&model, &skeleton, GroupingMode::ByBone);

        assert_eq!(groups.len(), 2);
        let issue = groups[0].as_ref().expect_err("ghost isn't part of the skeleton");
        assert_eq!(issue.unit, ImportUnit::SegmentGroup("ghost".to_string()));
        assert!(matches!(issue.error, ImportError::UnknownSegmentBone(_)));
        assert!(groups[1].is_ok());
    }
}
