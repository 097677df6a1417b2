pub mod catalog_link;
pub mod classifier;
pub mod formatter;
pub mod pipeline;
