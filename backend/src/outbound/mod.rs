//! Driven adapters.

pub mod persistence;
