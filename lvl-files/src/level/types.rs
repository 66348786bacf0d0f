use crate::common::types::{C2Vector, C3Vector, C4Quaternion};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// A level as produced by the extraction step: a flat list of models, each self-contained.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Level {
    #[serde(default)]
    pub name: String,
    pub models: Vec<Model>,
}

impl Level {
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|model| model.name == name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    #[serde(default)]
    pub bones: Vec<Bone>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub is_skeletal_mesh: bool,
    #[serde(default)]
    pub has_non_trivial_hierarchy: bool,
    /// Set by the extraction step for models whose weights index the skeleton off by one.
    #[serde(default)]
    pub is_skeleton_broken: bool,
    #[serde(default)]
    pub collision_mesh: Option<CollisionMesh>,
}

impl Model {
    pub fn total_vertex_count(&self) -> usize {
        self.segments.iter().map(Segment::vertex_count).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    /// Empty for bones that hang directly below the model root.
    #[serde(default)]
    pub parent_name: String,
    #[serde(default)]
    pub rotation: C4Quaternion,
    #[serde(default)]
    pub location: C3Vector,
}

impl Bone {
    pub fn is_root(&self) -> bool {
        self.parent_name.is_empty() || self.parent_name == self.name
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Segment {
    /// The bone this segment is rigidly attached to, may be empty.
    #[serde(default)]
    pub bone: String,
    pub vertices: Vec<C3Vector>,
    #[serde(default)]
    pub normals: Vec<C3Vector>,
    #[serde(default)]
    pub uvs: Vec<C2Vector>,
    /// Triangle list, local to this segment's vertex buffer.
    pub indices: Vec<u32>,
    #[serde(default)]
    pub material: Material,
    #[serde(default)]
    pub is_pretransformed: bool,
    /// `vertex_count * influences` entries, vertex major.
    #[serde(default)]
    pub vertex_weights: Vec<VertexWeight>,
}

impl Segment {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// The number of weights each vertex natively carries, 0 if the segment isn't weighted.
    pub fn native_influences(&self) -> usize {
        if self.vertices.is_empty() {
            0
        } else {
            self.vertex_weights.len() / self.vertices.len()
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexWeight {
    pub bone_index: u8,
    pub weight: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Material {
    /// Name of the primary (diffuse) texture, empty if untextured.
    #[serde(default)]
    pub texture: String,
    #[serde(default)]
    pub flags: u32,
}

impl Material {
    pub fn material_flags(&self) -> MaterialFlags {
        MaterialFlags::from_bits_retain(self.flags)
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u32 {
        const NORMAL = 1;
        const HARDEDGED = 1 << 1;
        const TRANSPARENT = 1 << 2;
        const GLOSSMAP = 1 << 3;
        const GLOW = 1 << 4;
        const BUMPMAP = 1 << 5;
        const ADDITIVE = 1 << 6;
        const SPECULAR = 1 << 7;
        const ENVMAP = 1 << 8;
        const VERTEX_LIGHTING = 1 << 9;
        const TILED_NORMALMAP = 1 << 11;
        const DOUBLESIDED = 1 << 16;
        const SCROLLING = 1 << 24;
        const ENERGY = 1 << 25;
        const ANIMATED = 1 << 26;
        const ATTACHED_LIGHT = 1 << 27;
    }
}

/// Raw collision buffers: `vertices` are packed xyz triples.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollisionMesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}
