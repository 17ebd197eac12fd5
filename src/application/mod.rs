//! Application layer
//!
//! This module contains the services orchestrating the payment session
//! lifecycle.

pub mod services;
