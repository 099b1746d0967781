pub mod config;
pub mod decode;
pub mod errors;
pub mod genotype;
pub mod roster;
pub mod utils;
