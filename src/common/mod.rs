//! Common module - shared traits and interfaces
//!
//! This module contains the seams shared by the purge engine and its callers.

pub mod traits;

pub use traits::*;
