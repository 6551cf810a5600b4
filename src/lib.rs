#![allow(clippy::enum_variant_names)]

//! File-system mirror for build change detection.
//!
//! The core lives in [`filesystem`]; the other modules make up the
//! `tessy-mirror` binary that mirrors the inputs declared in `tasks.yaml`.

pub mod application;
pub mod cli;
pub mod config;
pub mod ext;
pub mod filesystem;
pub mod tasks;
