//! Common test infrastructure shared across integration tests.
//!
//! # Usage
//!
//! From any integration test file:
//! ```ignore
//! #[path = "common/mod.rs"]
//! mod common;
//! use common::{drain_cycle, init_tracing, seeded};
//! ```

pub mod test_utils;

#[allow(unused_imports)]
pub use test_utils::{
    assert_permutation, drain_cycle, init_tracing, observed, seeded, WeylRng,
};
