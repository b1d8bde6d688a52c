// Repository Pattern: one trait per table, SQLite implementations borrow a Connection

pub mod element_text_repository;
pub mod external_image_repository;
pub mod option_repository;

pub use element_text_repository::{ElementTextRepository, SqliteElementTextRepository};
pub use external_image_repository::{ExternalImageRepository, SqliteExternalImageRepository};
pub use option_repository::{OptionRepository, SqliteOptionRepository};
