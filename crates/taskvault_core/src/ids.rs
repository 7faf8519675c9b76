//! External identifier generation seam.
//!
//! Query builders only ever consume identifiers; this trait is where they
//! come from. The production generator emits time-sortable UUIDv7 text so
//! primary keys stay roughly insertion-ordered.

use uuid::Uuid;

/// Collaborator that produces externally-facing identifiers.
pub trait IdGenerator: Send + Sync {
    /// Returns a new opaque, unique, sortable identifier.
    fn generate(&self) -> String;
}

/// Default generator producing UUIDv7 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::now_v7().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{IdGenerator, UuidGenerator};

    #[test]
    fn generated_ids_are_unique_and_sortable() {
        let generator = UuidGenerator;
        let first = generator.generate();
        let second = generator.generate();

        assert_ne!(first, second);
        assert!(first <= second);
    }
}
