use thiserror::Error;

/// Everything that can go wrong during an authentication check, other than
/// the CAS server explicitly rejecting the ticket (which is a protocol
/// outcome, not an error — see [`AuthOutcome::Failure`](crate::AuthOutcome)).
#[derive(Debug, Error)]
pub enum CasError {
    /// The request has no session support; the state machine cannot run
    /// without somewhere to keep the validated identity.
    #[error("session support is required but no session was found on the request")]
    SessionUnavailable,

    /// The validation request could not even be constructed.
    #[error("could not build the validation request: {0}")]
    InvalidRequest(#[from] isahc::http::Error),

    /// Transport-level failure contacting the CAS server.
    #[error("could not reach the CAS server: {0}")]
    Network(#[from] isahc::Error),

    /// The connection succeeded but the response body could not be read.
    #[error("could not read the CAS response body: {0}")]
    Body(#[from] std::io::Error),

    /// The CAS server answered with something that is not well-formed XML.
    #[error("CAS response is not well-formed XML: {0}")]
    MalformedResponse(#[from] roxmltree::Error),

    /// Anything else that surfaced while evaluating the state machine.
    #[error("unexpected error during authentication check: {0}")]
    Unexpected(String),
}
