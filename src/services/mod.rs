pub mod image_consolidator;
pub mod image_probe;
