//! Generation publication: staging, upload, verification, manifest flip.

pub mod controller;
pub mod manifest;
pub mod staging;

pub use controller::{BuildKind, PublishController, PublishReport};
pub use manifest::{generation_paths, Manifest};
pub use staging::Staging;
