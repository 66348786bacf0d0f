pub mod collider_factory;
