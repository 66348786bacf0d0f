use crate::rendering::common::scene_graph::NodeId;
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::fmt::{Debug, Formatter};
use std::ops::Range;
use std::sync::Arc;

#[derive(Clone, Default, PartialEq)]
pub struct VertexBuffers {
    pub position_buffer: Vec<Vec3>,
    pub normals_buffer: Vec<Vec3>,
    pub texcoord_buffer_0: Vec<Vec2>,
}

impl VertexBuffers {
    pub fn with_vertex_count(vertex_count: usize) -> Self {
        Self {
            position_buffer: vec![Vec3::ZERO; vertex_count],
            normals_buffer: vec![Vec3::ZERO; vertex_count],
            texcoord_buffer_0: vec![Vec2::ZERO; vertex_count],
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.position_buffer.len()
    }
}

impl Debug for VertexBuffers {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ position_buffer: [{}], ", self.position_buffer.len())?;
        write!(f, "normals_buffer: [{}], ", self.normals_buffer.len())?;
        write!(f, "texcoord_buffer_0: [{}] }}", self.texcoord_buffer_0.len())
    }
}

/// A decoded RGBA8 image.
#[derive(Clone)]
pub struct Texture {
    pub label: String,
    pub size: glam::UVec2,
    pub data: Vec<u8>,
}

impl Debug for Texture {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Texture {{ label: {}, size: {}, data: [{}] }}", self.label, self.size, self.data.len())
    }
}

#[derive(Debug, Clone)]
pub enum AlbedoType {
    Value(Vec4),
    Texture(Arc<Texture>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransparencyType {
    Opaque,
    Cutout { cutout: f32 },
    Blend,
}

#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub albedo: AlbedoType,
    pub transparency: TransparencyType,
}

impl Material {
    pub fn is_textured(&self) -> bool {
        matches!(self.albedo, AlbedoType::Texture(_))
    }
}

/// One material-homogeneous slice of a [`CombinedMesh`]'s index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubMesh {
    pub index_start: usize,
    pub index_count: usize,
    /// First vertex of the segment this submesh came from, indices are already offset by it.
    pub base_vertex: u32,
    pub vertex_count: u32,
}

impl SubMesh {
    pub fn index_range(&self) -> Range<usize> {
        self.index_start..self.index_start + self.index_count
    }

    pub fn vertex_range(&self) -> Range<u32> {
        self.base_vertex..self.base_vertex + self.vertex_count
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneWeight {
    pub bone_index: u32,
    pub weight: f32,
}

impl BoneWeight {
    pub const NONE: BoneWeight = BoneWeight {
        bone_index: 0,
        weight: 0.0,
    };
}

/// Fixed-width weights, `influences_per_vertex` entries per vertex, vertex major.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedWeights {
    pub influences_per_vertex: u8,
    pub weights: Vec<BoneWeight>,
}

impl PackedWeights {
    pub fn vertex_weights(&self, vertex: usize) -> &[BoneWeight] {
        let width = self.influences_per_vertex as usize;
        &self.weights[vertex * width..(vertex + 1) * width]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkinType {
    /// Vertices are baked into the bind pose, one influence and identity bind poses.
    Pretransformed,
    Deformed,
}

#[derive(Debug, Clone)]
pub struct Skin {
    pub skin_type: SkinType,
    /// Bone nodes in skeleton order, weights index into this.
    pub bones: Vec<NodeId>,
    /// Index-aligned with `bones`.
    pub bind_poses: Vec<Mat4>,
    /// `None` if the weights couldn't be packed, the geometry is still usable.
    pub weights: Option<PackedWeights>,
}

#[derive(Clone)]
pub struct CombinedMesh {
    /// The scene node the mesh is attached to.
    pub node: NodeId,
    pub vertex_buffers: VertexBuffers,
    pub index_buffer: Vec<u32>,
    pub submeshes: Vec<SubMesh>,
    /// One per submesh.
    pub materials: Vec<Arc<Material>>,
    pub skin: Option<Skin>,
}

impl Debug for CombinedMesh {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ node: {:?}, vertex_buffers: {:?}, ", self.node, self.vertex_buffers)?;
        write!(f, "index_buffer: [{}], ", self.index_buffer.len())?;
        write!(f, "submeshes: {:?}, ", self.submeshes)?;
        write!(f, "skin: {:?} }}", self.skin.as_ref().map(|skin| skin.skin_type))
    }
}
