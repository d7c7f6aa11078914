pub mod epic_parser;

pub use epic_parser::{CatalogParser, EpicParser};
