//! # Groupie Test Suite
//!
//! Unified test crate for behaviour that spans more than one crate.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # criterion benchmarks
//! └── src/integration/
//!     ├── flows.rs      # repository + hub, in process
//!     └── e2e.rs        # real HTTP and WebSocket clients against a bound server
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p gp-tests
//! cargo test -p gp-tests integration::e2e::
//! cargo bench -p gp-tests
//! ```

pub mod integration;
