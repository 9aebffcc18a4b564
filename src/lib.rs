//! Client-side implementation of the CAS (Central Authentication Service)
//! single-sign-on redirect protocol.
//!
//! For each inbound request the [`CasClient`] decides whether the caller is
//! already authenticated, needs to be redirected to the central login
//! service, or is returning from it with a one-time ticket that must be
//! exchanged for identity data via the CAS 2.0 `serviceValidate` endpoint.
//!
//! The HTTP framework, session backend and transport stack stay outside the
//! crate; the embedding application adapts them through the [`CasRequest`],
//! [`SessionMap`] and [`CasResponse`] traits.
//!
//! ```rust,ignore
//! use simple_cas::{AuthOutcome, CasClient, CasConfig};
//!
//! let client = CasClient::new(
//!     CasConfig::new("cas.example.edu").with_server_context("/cas"),
//! );
//!
//! // inside a request handler, with framework adapters for req/res:
//! match client.force_authentication(&mut req, &mut res) {
//!     AuthOutcome::Success | AuthOutcome::Validated => { /* serve the page */ }
//!     AuthOutcome::Redirected => { /* redirect already issued */ }
//!     AuthOutcome::Failure(reason) => { /* CAS rejected the ticket */ }
//!     AuthOutcome::Error(err) => { /* session/transport fault */ }
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod response;
pub mod urls;
pub mod validate;

pub use client::{AuthOutcome, AuthSession, CasClient, CasRequest, CasResponse, SessionMap};
pub use config::{CasConfig, ClientConfig, ServerConfig};
pub use error::CasError;
pub use response::{parse_cas20, ValidationResult, CAS_NAMESPACE};
pub use validate::{HttpTicketValidator, ValidateTicket};
