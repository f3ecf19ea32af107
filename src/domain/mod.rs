pub mod capability;
pub mod plan;
pub mod types;
