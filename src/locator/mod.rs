pub mod extractor;
pub mod locator_model;
