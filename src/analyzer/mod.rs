// Analyzer module: promotion classification, image resolution and record assembly.

pub mod promotion;
pub mod image_resolver;
pub mod assembler;

// Re-export the main Assembler implementation for ease of use.
pub use assembler::Assembler;
