/// This module converts the records of lvl-files into our scene representation: a node hierarchy with
/// meshes, skins and materials bound to it. It doesn't read anything from disk, that is left to the loaders.
pub mod model_importer;
pub mod segment_grouping;
pub mod skeleton_importer;
pub mod skin_importer;
