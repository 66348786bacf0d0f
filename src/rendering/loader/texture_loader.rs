use crate::io::common::loader::RawAssetLoader;
use crate::rendering::common::types::Texture;
use image::ImageFormat;
use log::{error, trace};
use std::collections::HashMap;
use std::path::Path;

/// Resolves texture names to decoded images. Not finding a texture is not an error.
pub trait TextureProvider {
    fn load_texture(&self, name: &str) -> Option<Texture>;
}

/// For imports that don't care about textures, every material stays untextured.
pub struct NoTextures;

impl TextureProvider for NoTextures {
    fn load_texture(&self, _name: &str) -> Option<Texture> {
        None
    }
}

/// Textures that have been decoded ahead of time, mostly useful for tests and tools.
#[derive(Default)]
pub struct InMemoryTextures {
    textures: HashMap<String, Texture>,
}

impl InMemoryTextures {
    pub fn insert(&mut self, texture: Texture) {
        self.textures.insert(texture.label.clone(), texture);
    }
}

impl TextureProvider for InMemoryTextures {
    fn load_texture(&self, name: &str) -> Option<Texture> {
        self.textures.get(name).cloned()
    }
}

/// Extensions tried in order for texture names that don't carry one.
pub const TEXTURE_EXTENSIONS: [&str; 2] = ["tga", "png"];

/// Decodes the TGA and PNG files the level extraction writes next to the level.
pub struct ImageTextureProvider<L: RawAssetLoader> {
    loader: L,
}

impl<L: RawAssetLoader> ImageTextureProvider<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    fn file_names(name: &str) -> Vec<String> {
        if Path::new(name).extension().is_some() {
            vec![name.to_string()]
        } else {
            TEXTURE_EXTENSIONS
                .iter()
                .map(|extension| format!("{name}.{extension}"))
                .collect()
        }
    }
}

impl<L: RawAssetLoader> TextureProvider for ImageTextureProvider<L> {
    fn load_texture(&self, name: &str) -> Option<Texture> {
        let (file_name, buf) = Self::file_names(name)
            .into_iter()
            .find_map(|file_name| self.loader.load_raw_owned(&file_name).map(|buf| (file_name, buf)))?;

        ImageTextureProvider::<L>::decode(name, &file_name, &buf)
    }
}

impl<L: RawAssetLoader> ImageTextureProvider<L> {
    /// The format follows the extension of `file_name`. TGA has no magic number, so guessing only helps for the rest.
    pub fn decode(name: &str, file_name: &str, buf: &[u8]) -> Option<Texture> {
        let decoded = match ImageFormat::from_path(file_name) {
            Ok(format) => image::load_from_memory_with_format(buf, format),
            Err(_) => image::load_from_memory(buf),
        };

        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(err) => {
                error!("Decoding of the texture {name} ({file_name}) failed: {}", err);
                return None;
            }
        };

        let size = glam::UVec2::new(decoded.width(), decoded.height());
        trace!("Decoded texture {} ({}x{})", name, size.x, size.y);

        Some(Texture {
            label: name.to_string(),
            size,
            data: decoded.into_rgba8().into_raw(),
        })
    }
}
