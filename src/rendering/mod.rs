pub mod common;
pub mod importer;
pub mod loader;
