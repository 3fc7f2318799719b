pub mod assemble;
pub mod document;

#[cfg(test)]
pub(crate) mod fixtures;

pub use assemble::DocumentBuilder;
pub use document::{Rotation, SourceDocument};
