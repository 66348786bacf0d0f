pub trait RawAssetLoader {
    /// in case of a caching implementation, this may need to clone the whole buffer!
    fn load_raw_owned(&self, path: &str) -> Option<Vec<u8>>;

    fn contains(&self, path: &str) -> bool;
}
