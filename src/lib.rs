//! Core library for the poverty-indicators command line application.
//!
//! The library turns a statistics-agency export of regency and province
//! poverty indicators into the tables a dashboard renders. IO adapters live
//! under [`indicators::io`], the column vocabulary in [`indicators::mapping`],
//! the cleaning and province aggregation in [`indicators::normalize`], and the
//! page-level orchestration with its read-through caches under
//! [`indicators::dashboard`].

pub mod indicators;

pub use indicators::{
    IndicatorError, Result, boundary, cache, config, dashboard, error, explore, io, mapping,
    normalize, predict, table,
};
