//! Attack simulations.
//!
//! Each module states the attack and asserts the kernel's defence holds.

pub mod brute_force;
