use crate::error::ImportError;
use crate::rendering::common::coordinate_systems;
use glam::Vec3;
use log::{trace, warn};
use lvl_files::level::types::CollisionMesh;
use rapier3d::geometry::{Collider, ColliderBuilder, MeshConverter};

/// The collision geometry of a model in render space, together with the collider built from it.
#[derive(Debug, Clone)]
pub struct ImportedCollision {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub collider: Collider,
}

pub enum ColliderFactory {}

impl ColliderFactory {
    /// `Ok(None)` if there is nothing to collide with, which isn't an error.
    pub fn convert(mesh: Option<&CollisionMesh>) -> Result<Option<ImportedCollision>, ImportError> {
        profiling::scope!("ColliderFactory::convert");
        let Some(mesh) = mesh else {
            return Ok(None);
        };

        if mesh.indices.len() <= 2 {
            trace!("Ignoring a collision mesh with {} indices", mesh.indices.len());
            return Ok(None);
        }

        if mesh.vertices.len() % 3 != 0 {
            return Err(ImportError::InvalidCollisionMesh(format!(
                "{} floats don't form whole vertices",
                mesh.vertices.len()
            )));
        }

        let vertices: Vec<Vec3> = mesh
            .vertices
            .chunks_exact(3)
            .map(|xyz| coordinate_systems::lvl_to_render(Vec3::new(xyz[0], xyz[1], xyz[2])))
            .collect();

        if let Some(index) = mesh.indices.iter().find(|&&index| index as usize >= vertices.len()) {
            return Err(ImportError::InvalidCollisionMesh(format!(
                "index {} is out of range for {} vertices",
                index,
                vertices.len()
            )));
        }

        if mesh.indices.len() % 3 != 0 {
            warn!(
                "Collision mesh has {} indices, dropping the incomplete triangle",
                mesh.indices.len()
            );
        }

        // The collider doesn't care about the front face, so the winding stays as is.
        let indices: Vec<u32> = mesh.indices[..mesh.indices.len() - mesh.indices.len() % 3].to_vec();
        let collider = ColliderFactory::build_collider(&vertices, &indices)?;

        Ok(Some(ImportedCollision {
            vertices,
            indices,
            collider,
        }))
    }

    fn build_collider(vertices: &[Vec3], indices: &[u32]) -> Result<Collider, ImportError> {
        let points = vertices.iter().map(|&vert| vert.into()).collect();
        let triangles = indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
            .collect();

        // TODO: Offer convex decomposition for dynamic props, trimeshes can only be used for static geometry.
        let converter = MeshConverter::TriMesh;

        ColliderBuilder::converted_trimesh(points, triangles, converter)
            .map(|builder| builder.build())
            .map_err(|err| ImportError::InvalidCollisionMesh(format!("{:?}", err)))
    }
}
