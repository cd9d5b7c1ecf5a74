//! # Bursar Gateway
//!
//! Everything the Bursar API knows about the external payment gateway:
//!
//! - [`config`]: merchant credentials and URLs, loaded from the environment
//! - [`payload`]: the typed callback payload with field-by-field validation
//! - [`signature`]: HMAC-SHA256 signing and constant-time verification
//! - [`redirect`]: signed form parameters for the gateway's pay page
//!
//! The gateway authenticates both directions with an HMAC-SHA256 hex digest
//! over a fixed-order, `|`-separated canonical string. Nothing here touches
//! the database; reconciliation lives in the server crate.

pub mod config;
pub mod payload;
pub mod redirect;
pub mod signature;

pub use config::GatewayConfig;
pub use payload::{CallbackPayload, GatewayStatus, PayloadFieldError};
pub use redirect::RedirectParams;
pub use signature::SignatureMismatch;
