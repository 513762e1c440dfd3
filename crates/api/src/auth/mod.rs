//! Authentication primitives.
//!
//! - [`jwt`] -- verification of access tokens issued by the hosted identity service.

pub mod jwt;
