pub mod config;
pub mod dbml;
pub mod frontend;
pub mod upstream;

pub use dbml::augment_relationships;
