// ABOUTME: Record number pool allocation and reuse
// ABOUTME: Allocates display numbers smallest-first from released numbers, sequence fallback

pub mod pool;

pub use pool::{allocate, pooled_numbers, release, sequence_value};
