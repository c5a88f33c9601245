//! CLI commands

pub mod gather;
