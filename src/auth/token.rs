//! Bearer token material issued by the token endpoint.

pub mod access;
pub mod secret;
