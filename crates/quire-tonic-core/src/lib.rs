#![doc = include_str!("../README.md")]

mod common;
pub use common::*;
// Public re-export so downstream crates can reach the domain layer via
// `quire_tonic_core::quire`
pub use quire;
