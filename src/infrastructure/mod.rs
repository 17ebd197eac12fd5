//! Infrastructure module
//!
//! This module contains adapters for external systems and the HTTP surface.

pub mod adapters;
pub mod http;
