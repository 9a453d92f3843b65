pub mod build;
pub mod describe;
