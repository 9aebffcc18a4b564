//! The one-shot ticket exchange with the CAS `serviceValidate` endpoint.

use isahc::config::{Configurable, SslOption};
use isahc::{ReadResponseExt, Request, RequestExt};
use log::debug;

use crate::config::CasConfig;
use crate::error::CasError;
use crate::response::{parse_cas20, ValidationResult};
use crate::urls;

/// Exchange of a one-time service ticket for identity data. The state
/// machine talks to the CAS server only through this seam, so embedders and
/// tests can supply their own transport.
pub trait ValidateTicket {
    fn validate(
        &self,
        config: &CasConfig,
        service: &str,
        ticket: &str,
    ) -> Result<ValidationResult, CasError>;
}

/// Production validator: a single blocking GET against the CAS server, no
/// retries, no internal timeout (the transport's policy governs).
pub struct HttpTicketValidator;

impl ValidateTicket for HttpTicketValidator {
    fn validate(
        &self,
        config: &CasConfig,
        service: &str,
        ticket: &str,
    ) -> Result<ValidationResult, CasError> {
        let url = urls::service_validate_url(config, service, ticket);
        debug!("validating ticket against {url}");

        // CAS servers are routinely internal with self-signed certificates;
        // certificate validation stays off for this one call.
        let request = Request::get(url.as_str())
            .ssl_options(SslOption::DANGER_ACCEPT_INVALID_CERTS)
            .body(())?;
        let mut response = request.send()?;

        // The whole body is accumulated before parsing and handed to the
        // parser exactly once.
        let body = response.text()?;
        Ok(parse_cas20(&body, &config.attribute_namespace)?)
    }
}
