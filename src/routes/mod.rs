pub mod organizations;
pub mod reports;
pub mod usage;
