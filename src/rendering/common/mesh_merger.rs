use crate::error::ImportError;
use crate::rendering::common::coordinate_systems;
use crate::rendering::common::types::{SubMesh, VertexBuffers};
use glam::Vec2;
use log::warn;
use lvl_files::level::types::Segment;

/// Where each segment ends up in the shared buffers, computed before anything is copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentLayout {
    pub submeshes: Vec<SubMesh>,
    pub total_vertices: usize,
    pub total_indices: usize,
}

impl SegmentLayout {
    pub fn new(segments: &[&Segment]) -> Self {
        let mut submeshes = Vec::with_capacity(segments.len());
        let mut vertex_offset = 0usize;
        let mut index_offset = 0usize;

        for segment in segments {
            let vertex_count = segment.vertex_count();
            // incomplete trailing triangles are dropped while merging
            let index_count = segment.indices.len() - segment.indices.len() % 3;

            submeshes.push(SubMesh {
                index_start: index_offset,
                index_count,
                base_vertex: vertex_offset as u32,
                vertex_count: vertex_count as u32,
            });

            vertex_offset += vertex_count;
            index_offset += index_count;
        }

        Self {
            submeshes,
            total_vertices: vertex_offset,
            total_indices: index_offset,
        }
    }
}

pub enum MeshMerger {}

impl MeshMerger {
    /// Merge the segments into one vertex buffer and one index buffer, converting them into render space.
    /// Every segment becomes the submesh at the same position in `layout`.
    pub fn merge_segments(
        segments: &[&Segment],
        layout: &SegmentLayout,
    ) -> Result<(VertexBuffers, Vec<u32>), ImportError> {
        let mut vertex_buffers = VertexBuffers::with_vertex_count(layout.total_vertices);
        let mut index_buffer = vec![0u32; layout.total_indices];

        for (idx, (segment, submesh)) in segments.iter().zip(&layout.submeshes).enumerate() {
            let range = submesh.base_vertex as usize..(submesh.base_vertex + submesh.vertex_count) as usize;

            for (target, source) in vertex_buffers.position_buffer[range.clone()]
                .iter_mut()
                .zip(&segment.vertices)
            {
                *target = coordinate_systems::lvl_vec_to_render(source);
            }

            // Missing normals or uvs stay zeroed.
            for (target, source) in vertex_buffers.normals_buffer[range.clone()]
                .iter_mut()
                .zip(&segment.normals)
            {
                *target = coordinate_systems::lvl_vec_to_render(source);
            }

            for (target, source) in vertex_buffers.texcoord_buffer_0[range]
                .iter_mut()
                .zip(&segment.uvs)
            {
                *target = Vec2::new(source.x, source.y);
            }

            let rewound = MeshMerger::reverse_winding(&segment.indices);
            if rewound.len() != segment.indices.len() {
                warn!(
                    "Segment {} has {} indices, which isn't a triangle list. Dropping the remainder",
                    idx,
                    segment.indices.len()
                );
            }

            let target = &mut index_buffer[submesh.index_range()];
            for (slot, &index) in target.iter_mut().zip(&rewound) {
                if index >= submesh.vertex_count {
                    return Err(ImportError::IndexOutOfRange {
                        segment: idx,
                        index,
                        vertex_count: submesh.vertex_count as usize,
                    });
                }
                *slot = index + submesh.base_vertex;
            }
        }

        Ok((vertex_buffers, index_buffer))
    }

    /// Swaps the last two indices of every triangle, flipping its front face. Trailing indices that
    /// don't form a full triangle are dropped.
    pub fn reverse_winding(indices: &[u32]) -> Vec<u32> {
        indices
            .chunks_exact(3)
            .flat_map(|tri| [tri[0], tri[2], tri[1]])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use lvl_files::common::types::{C2Vector, C3Vector};

    fn segment(vertex_count: usize, indices: Vec<u32>) -> Segment {
        Segment {
            vertices: (0..vertex_count)
                .map(|i| C3Vector::from([i as f32, 1.0, 2.0]))
                .collect(),
            normals: (0..vertex_count)
                .map(|_| C3Vector::from([1.0, 0.0, 0.0]))
                .collect(),
            uvs: (0..vertex_count)
                .map(|i| C2Vector::from([i as f32 * 0.5, 0.25]))
                .collect(),
            indices,
            ..Default::default()
        }
    }

    #[test]
    fn reverse_winding_swaps_last_two() {
        assert_eq!(
            MeshMerger::reverse_winding(&[0, 1, 2, 3, 4, 5, 6]),
            vec![0, 2, 1, 3, 5, 4]
        );
    }

    #[test]
    fn layout_offsets() {
        let a = segment(4, vec![0, 1, 2, 0, 2, 3]);
        let b = segment(3, vec![0, 1, 2, 1]);
        let layout = SegmentLayout::new(&[&a, &b]);

        assert_eq!(layout.total_vertices, 7);
        assert_eq!(layout.total_indices, 9);
        assert_eq!(layout.submeshes[0].index_range(), 0..6);
        assert_eq!(layout.submeshes[1].index_range(), 6..9);
        assert_eq!(layout.submeshes[1].base_vertex, 4);
    }

    #[test]
    fn merged_indices_stay_in_their_segment() -> Result<(), ImportError> {
        let a = segment(4, vec![0, 1, 2, 0, 2, 3]);
        let b = segment(3, vec![0, 1, 2]);
        let segments = [&a, &b];
        let layout = SegmentLayout::new(&segments);
        let (buffers, indices) = MeshMerger::merge_segments(&segments, &layout)?;

        assert_eq!(indices, vec![0, 2, 1, 0, 3, 2, 4, 6, 5]);
        for submesh in &layout.submeshes {
            let range = submesh.vertex_range();
            assert!(indices[submesh.index_range()].iter().all(|i| range.contains(i)));
        }

        assert_eq!(buffers.vertex_count(), 7);
        assert_eq!(buffers.position_buffer[1], Vec3::new(-1.0, 1.0, 2.0));
        assert_eq!(buffers.position_buffer[4], Vec3::new(-0.0, 1.0, 2.0));
        assert_eq!(buffers.normals_buffer[6], Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(buffers.texcoord_buffer_0[5], Vec2::new(0.5, 0.25));
        Ok(())
    }

    #[test]
    fn missing_normals_are_zeroed() -> Result<(), ImportError> {
        let mut a = segment(3, vec![0, 1, 2]);
        a.normals.clear();
        a.uvs.clear();
        let layout = SegmentLayout::new(&[&a]);
        let (buffers, _) = MeshMerger::merge_segments(&[&a], &layout)?;
        assert_eq!(buffers.normals_buffer, vec![Vec3::ZERO; 3]);
        assert_eq!(buffers.texcoord_buffer_0, vec![Vec2::ZERO; 3]);
        Ok(())
    }

    #[test]
    fn out_of_range_index_fails() {
        let a = segment(3, vec![0, 1, 2]);
        let b = segment(3, vec![0, 1, 3]);
        let layout = SegmentLayout::new(&[&a, &b]);
        let result = MeshMerger::merge_segments(&[&a, &b], &layout);
        assert!(matches!(
            result,
            Err(ImportError::IndexOutOfRange {
                segment: 1,
                index: 3,
                vertex_count: 3
            })
        ));
    }
}
