pub mod instances;
pub mod log;
pub mod role;
