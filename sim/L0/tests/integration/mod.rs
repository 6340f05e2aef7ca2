//! Integration tests for the worm-* crate ecosystem.
//!
//! These tests verify end-to-end behavior across crates:
//! - configuration → simulation → trajectory file → fitness
//! - drag media and obstacle layouts reaching the mechanics
//! - differential evolution over real simulation runs
//! - JSON configuration files

pub mod config_files;
pub mod end_to_end;
pub mod environments;
pub mod evolution;
