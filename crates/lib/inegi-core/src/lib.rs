//! Core query translation and response normalization for the INEGI APIs.
//!
//! This crate turns high-level intents (find an indicator, fetch or compare a
//! time series, search or count establishments) into well-formed upstream
//! requests against the BISE indicator API and the DENUE business registry,
//! and maps both APIs' JSON payloads into one shared entity model. Raw
//! upstream shapes never leak past the client modules.

pub mod aggregate;
pub mod catalog;
pub mod compare;
pub mod denue;
pub mod error;
pub mod indicators;
pub mod model;
pub mod transport;
