//! Service-account identity, signed assertions, and bearer token models.

pub mod assertion;
pub mod credential;
pub mod id;
pub mod token;

pub use assertion::*;
pub use credential::*;
pub use id::*;
pub use token::{access::*, secret::*};
