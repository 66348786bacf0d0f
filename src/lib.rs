pub mod error;
pub mod io;
pub mod physics;
pub mod rendering;
pub mod settings;
