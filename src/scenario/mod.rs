pub mod generator;
pub mod mapping;
pub mod scenario_model;
