//! CodeCity: Hierarchical Resource Tree Service
//!
//! Builds a normalized tree from flat, path-tagged metric records, collapses
//! structurally redundant directory chains, and memoizes the result per
//! request fingerprint so that concurrent visualization requests share a
//! single tree instance.

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod service;
pub mod snapshot;
pub mod tree;
pub mod types;
