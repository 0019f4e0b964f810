//! Centralized error type for the plettro umbrella crate.
//!
//! Wraps subsystem errors so `?` propagates naturally across crate
//! boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Analysis(#[from] plettro_analysis::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
