//! Common utilities module
//!
//! This module contains shared utilities used across the topo pipeline.

pub mod error;

pub use error::{TopoError, Result};
