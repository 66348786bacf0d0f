use crate::error::{ImportError, ImportIssue, ImportUnit};
use crate::rendering::common::coordinate_systems;
use crate::rendering::common::scene_graph::{NodeId, SceneGraph, SceneNode};
use crate::settings::HierarchyPolicy;
use glam::{Affine3A, Quat};
use log::{debug, trace, warn};
use lvl_files::level::types::Bone;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Skeleton {
    pub graph: SceneGraph,
    pub bone_nodes: HashMap<String, NodeId>,
    /// Nodes of the imported bones in declaration order.
    pub bone_order: Vec<NodeId>,
}

impl Skeleton {
    pub fn bone_node(&self, name: &str) -> Option<NodeId> {
        self.bone_nodes.get(name).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParentRef {
    Root,
    Bone(usize),
}

pub enum SkeletonImporter {}

impl SkeletonImporter {
    /// Builds the node hierarchy below a fresh root node. Bones that can't be placed in the tree either
    /// abort the build or, with [`HierarchyPolicy::SkipBone`], are left out together with their descendants.
    pub fn build(
        root_name: &str,
        root_transform: Affine3A,
        bones: &[Bone],
        policy: HierarchyPolicy,
    ) -> Result<(Skeleton, Vec<ImportIssue>), ImportError> {
        let (parents, mut problems) = SkeletonImporter::resolve_parents(bones);

        if policy == HierarchyPolicy::Abort {
            if let Some(problem) = problems.into_iter().flatten().next() {
                return Err(problem);
            }
            problems = (0..bones.len()).map(|_| None).collect();
        }

        // Bones hanging below a skipped bone can't be placed either.
        let mut kept: Vec<bool> = problems.iter().map(Option::is_none).collect();
        loop {
            let mut changed = false;
            for idx in 0..bones.len() {
                if let (true, Some(ParentRef::Bone(parent))) = (kept[idx], parents[idx]) {
                    if !kept[parent] {
                        kept[idx] = false;
                        problems[idx] = Some(ImportError::UnresolvedParent {
                            bone: bones[idx].name.clone(),
                            parent: bones[idx].parent_name.clone(),
                        });
                        changed = true;
                    }
                }
            }

            if !changed {
                break;
            }
        }

        let issues = bones
            .iter()
            .zip(problems)
            .filter_map(|(bone, problem)| problem.map(|error| (bone, error)))
            .map(|(bone, error)| {
                warn!("Skipping bone {}: {}", bone.name, error);
                ImportIssue::skipped(ImportUnit::Bone(bone.name.clone()), error)
            })
            .collect();

        let mut graph = SceneGraph::new(root_name, root_transform);
        let mut nodes: Vec<Option<NodeId>> = vec![None; bones.len()];

        // Pass 1: create every node, the records are already in local space.
        for (idx, bone) in bones.iter().enumerate().filter(|(idx, _)| kept[*idx]) {
            let rotation = coordinate_systems::lvl_rot_to_render(&bone.rotation).unwrap_or_else(|| {
                warn!("Bone {} has a degenerate rotation {:?}, using the identity", bone.name, bone.rotation);
                Quat::IDENTITY
            });

            nodes[idx] = Some(graph.add_node(SceneNode::new(
                bone.name.clone(),
                rotation,
                coordinate_systems::lvl_vec_to_render(&bone.location),
            )));
        }

        // Pass 2: link them, now that every parent exists.
        let mut bone_nodes = HashMap::with_capacity(bones.len());
        let mut bone_order = Vec::with_capacity(bones.len());
        for (idx, bone) in bones.iter().enumerate() {
            let Some(node) = nodes[idx] else {
                continue;
            };

            let parent = match parents[idx] {
                Some(ParentRef::Bone(parent)) => nodes[parent].expect("kept bones have kept parents"),
                _ => NodeId::ROOT,
            };

            trace!("Linking bone {} to {}", bone.name, graph.node(parent).name);
            graph.set_parent(node, parent);
            bone_nodes.entry(bone.name.clone()).or_insert(node);
            bone_order.push(node);
        }

        Ok((
            Skeleton {
                graph,
                bone_nodes,
                bone_order,
            },
            issues,
        ))
    }

    fn resolve_parents(bones: &[Bone]) -> (Vec<Option<ParentRef>>, Vec<Option<ImportError>>) {
        let mut problems: Vec<Option<ImportError>> = (0..bones.len()).map(|_| None).collect();
        let mut index_by_name: HashMap<&str, usize> = HashMap::with_capacity(bones.len());

        for (idx, bone) in bones.iter().enumerate() {
            if index_by_name.contains_key(bone.name.as_str()) {
                problems[idx] = Some(ImportError::DuplicateBone(bone.name.clone()));
            } else {
                index_by_name.insert(bone.name.as_str(), idx);
            }
        }

        let parents = bones
            .iter()
            .enumerate()
            .map(|(idx, bone)| {
                if bone.is_root() {
                    if !bone.parent_name.is_empty() {
                        // TODO: Confirm whether self parenting is intended by the exporter or just broken data
                        debug!("Bone {} is its own parent, treating it as a root", bone.name);
                    }
                    return Some(ParentRef::Root);
                }

                let parent = index_by_name.get(bone.parent_name.as_str()).copied();
                if parent.is_none() && problems[idx].is_none() {
                    problems[idx] = Some(ImportError::UnresolvedParent {
                        bone: bone.name.clone(),
                        parent: bone.parent_name.clone(),
                    });
                }
                parent.map(ParentRef::Bone)
            })
            .collect::<Vec<_>>();

        for (idx, bone) in bones.iter().enumerate() {
            if problems[idx].is_some() {
                continue;
            }

            let mut current = parents[idx];
            let mut steps = 0;
            while let Some(ParentRef::Bone(parent)) = current {
                steps += 1;
                if steps > bones.len() {
                    problems[idx] = Some(ImportError::CyclicHierarchy(bone.name.clone()));
                    break;
                }
                current = parents[parent];
            }
        }

        (parents, problems)
    }
}
