// ABOUTME: Archive grace-period cleanup sweep
// ABOUTME: Hard-deletes entities archived past the grace period, releasing their numbers

pub mod sweep;

pub use sweep::{run_archive_cleanup, CleanupConfig, CleanupReport};
