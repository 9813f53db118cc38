//! Identifier generation for stored books.

use uuid::Uuid;

/// Source of opaque, process-unique book identifiers
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Time-ordered UUID v7 identifiers
///
/// 74 random bits per millisecond keep collisions out of reach at any
/// realistic insert rate.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn generate(&self) -> String {
        Uuid::now_v7().to_string()
    }
}
