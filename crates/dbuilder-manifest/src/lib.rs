//! # dbuilder-manifest
//!
//! Turns build configurations into Dockerfiles and a Makefile.
//!
//! Handles:
//! - **Sanitize**: Safe make target names, Dockerfile names and push tags.
//! - **Graph**: The tag → template → repository → global build/push graph.
//! - **Render**: Dockerfile templates rendered with Tera.
//! - **Builder**: The generation run tying references, registries,
//!   rendering and the graph together.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod builder;
pub mod graph;
pub mod render;
pub mod sanitize;

pub use builder::{GenerateReport, ManifestBuilder, generate};
