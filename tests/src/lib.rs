//! # DON Node Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Dispatcher hot-path benchmarks
//! └── src/integration/  # Flows spanning several crates
//!     ├── messaging.rs      # Dispatcher to dispatcher over one network
//!     └── launcher_flow.rs  # Registry change → oracle instances → receivers
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dn-tests
//! cargo bench -p dn-tests
//! ```

pub mod integration;
