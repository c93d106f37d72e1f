//! Benchmark utilities for RecDB engines.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
