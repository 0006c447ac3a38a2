//! Integration Tests for the Meridian Driver Core
//!
//! This crate contains various test modules:
//!
//! - `try_next_host_tests`: Fail-over to the next host of a deterministic query plan
//! - `coordinator_tests`: Retry decisions, metrics accounting and terminal outcomes
//! - `topology_tests`: Membership changes racing with in-flight requests
//! - `load_balancing_tests`: Policies observed through a session
//! - `mapping_tests`: Typed entities over executed statements
//! - `config_tests`: Layered configuration loading and environment overrides
//! - `mock_infrastructure`: Reusable scripted transport and helpers
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --package tests
//! ```


#[cfg(test)]
mod config_tests;

#[cfg(test)]
mod coordinator_tests;


#[cfg(test)]
mod mapping_tests;


#[cfg(test)]
mod try_next_host_tests;
