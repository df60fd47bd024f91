pub mod camera;
pub mod components;
pub mod entity;
pub mod ingest;
pub mod renderable;
pub mod visibility;
pub mod world;

pub use world::*;
