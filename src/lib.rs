pub mod api;
pub mod cli;
pub mod core;
pub mod error;

pub use error::{CalcError, CalcResult};
