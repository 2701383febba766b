//! # dbuilder-image
//!
//! Image references and the registries that host them.
//!
//! Handles:
//! - **Reference**: Splitting raw references into host, namespace, name and tag.
//! - **Registry**: V2/V1 API negotiation and tag listing.
//! - **HTTP**: The blocking `GET` collaborator registries are reached through.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod http;
pub mod reference;
pub mod registry;
