pub mod accessor;
pub mod page_object;
