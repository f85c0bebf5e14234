//! Utility modules for the playground.

pub mod mime;
