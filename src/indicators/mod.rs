pub mod boundary;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod explore;
pub mod io;
pub mod mapping;
pub mod normalize;
pub mod predict;
pub mod table;

pub use error::{IndicatorError, Result};
