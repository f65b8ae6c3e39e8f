pub mod natsort;
pub mod types;

pub use types::*;
