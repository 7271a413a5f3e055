//! # Collab-Kernel Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── integration/   # Bus + authenticator + runtime wired together
//! └── exploits/      # Attack simulations against the token and ban logic
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ck-tests
//! cargo test -p ck-tests integration::
//! cargo test -p ck-tests exploits::
//! ```

pub mod exploits;
