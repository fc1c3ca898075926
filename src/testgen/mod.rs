pub mod default_mapping;
pub mod test_generator;
