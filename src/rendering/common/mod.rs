/// Level data and the render space disagree on handedness, this module converts between them.
pub mod coordinate_systems;
pub mod mesh_merger;
pub mod scene_graph;
/// basic types (e.g. mesh) to abstract away from both the level format and the render backend.
pub mod types;
