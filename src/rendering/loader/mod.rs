/// Contrasting to the importers, that convert already parsed records into our scene representation,
/// Loaders are a lot more high level. They read levels and textures and pipe them into importers
pub mod material_cache;
pub mod model_loader;
pub mod texture_loader;
