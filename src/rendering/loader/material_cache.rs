use crate::rendering::common::types::{AlbedoType, Material, Texture, TransparencyType};
use crate::rendering::loader::texture_loader::TextureProvider;
use glam::Vec4;
use log::{debug, trace, warn};
use lvl_files::level::types::{Material as MaterialRecord, MaterialFlags};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const DEFAULT_MATERIAL_NAME: &str = "default";

/// Anything that can turn a material record into a shared material.
pub trait MaterialResolver {
    fn resolve_material(&mut self, record: &MaterialRecord) -> Arc<Material>;
}

/// Materials (and the textures they reference) of one import session, keyed by `texture_flags`.
/// Not synchronized, share it as [`SharedMaterialCache`] when importing in parallel.
pub struct MaterialCache {
    default_material: Arc<Material>,
    materials: HashMap<String, Arc<Material>>,
    textures: HashMap<String, Option<Arc<Texture>>>,
    texture_provider: Box<dyn TextureProvider + Send>,
}

pub type SharedMaterialCache = Mutex<MaterialCache>;

impl MaterialCache {
    pub fn new(texture_provider: Box<dyn TextureProvider + Send>) -> Self {
        Self {
            default_material: Arc::new(Material {
                name: DEFAULT_MATERIAL_NAME.to_string(),
                albedo: AlbedoType::Value(Vec4::new(0.6, 0.6, 0.6, 1.0)),
                transparency: TransparencyType::Opaque,
            }),
            materials: HashMap::new(),
            textures: HashMap::new(),
            texture_provider,
        }
    }

    pub fn cache_key(record: &MaterialRecord) -> String {
        format!("{}_{}", record.texture, record.flags)
    }

    pub fn default_material(&self) -> &Arc<Material> {
        &self.default_material
    }

    pub fn resolve(&mut self, record: &MaterialRecord) -> Arc<Material> {
        if record.texture.is_empty() {
            return self.default_material.clone();
        }

        let key = MaterialCache::cache_key(record);
        if let Some(material) = self.materials.get(&key) {
            return material.clone();
        }

        let mut material = Material {
            name: key.clone(),
            transparency: MaterialCache::classify(record.material_flags()),
            ..(*self.default_material).clone()
        };

        match self.texture(&record.texture) {
            Some(texture) => material.albedo = AlbedoType::Texture(texture),
            None => warn!("Material {} is missing its texture, leaving it untextured", key),
        }

        trace!("Created material {} ({:?})", key, material.transparency);
        let material = Arc::new(material);
        self.materials.insert(key, material.clone());
        material
    }

    /// Forget everything but the default material, typically between two import sessions.
    pub fn reset(&mut self) {
        debug!(
            "Resetting the material cache ({} materials, {} textures)",
            self.materials.len(),
            self.textures.len()
        );
        self.materials.clear();
        self.textures.clear();
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Hard edged wins over transparent, as alpha testing doesn't need sorting.
    pub fn classify(flags: MaterialFlags) -> TransparencyType {
        if flags.contains(MaterialFlags::HARDEDGED) {
            TransparencyType::Cutout { cutout: 0.5 }
        } else if flags.contains(MaterialFlags::TRANSPARENT) {
            TransparencyType::Blend
        } else {
            TransparencyType::Opaque
        }
    }

    fn texture(&mut self, name: &str) -> Option<Arc<Texture>> {
        if let Some(texture) = self.textures.get(name) {
            return texture.clone();
        }

        let texture = self.texture_provider.load_texture(name).map(Arc::new);
        self.textures.insert(name.to_string(), texture.clone());
        texture
    }
}

impl MaterialResolver for MaterialCache {
    fn resolve_material(&mut self, record: &MaterialRecord) -> Arc<Material> {
        self.resolve(record)
    }
}

impl MaterialResolver for &SharedMaterialCache {
    fn resolve_material(&mut self, record: &MaterialRecord) -> Arc<Material> {
        self.lock().expect("poisoned material cache lock").resolve(record)
    }
}
