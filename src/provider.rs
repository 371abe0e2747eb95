//! Provider-facing endpoint descriptors.
//!
//! `descriptor` exposes validated metadata ([`ProviderDescriptor`]) covering the OAuth token
//! endpoint, the FCM messaging base URL, and the scope/audience pair written into assertions.
//! Endpoints must use HTTPS; loopback hosts are exempt so mock providers can run locally.

pub mod descriptor;

pub use descriptor::*;
