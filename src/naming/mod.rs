pub mod sanitize;

pub use sanitize::{NameRegistry, page_class_name, pascal_case, sanitize, subject_from_url};
