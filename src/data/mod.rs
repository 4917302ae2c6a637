// mod.rs - Data structures module

pub mod alignment;
pub mod alphabet;
pub mod loader;

// Re-export main types for convenience
pub use alignment::{pair_index, Alignment};
pub use alphabet::{Alphabet, Symbol, AMINO_ACIDS, GAP};
pub use loader::{AlignmentLoader, LoadReport, LoaderOptions};
