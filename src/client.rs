//! The authentication decision state machine.
//!
//! Authentication is a four step exchange: the browser is redirected to the
//! CAS login page, CAS redirects back with a one-time ticket in the query,
//! the ticket is exchanged with the CAS server for identity data, and that
//! identity is stored in the session while the ticket is scrubbed from the
//! URL.

use std::collections::HashMap;

use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::config::CasConfig;
use crate::error::CasError;
use crate::urls;
use crate::validate::{HttpTicketValidator, ValidateTicket};

/// Identity stored in the session after a successful ticket validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: String,
    pub attributes: HashMap<String, String>,
}

/// What the state machine needs from the inbound request. Implemented by the
/// embedding application for whatever HTTP framework it runs on.
pub trait CasRequest {
    /// Value of a query parameter, if present.
    fn query_param(&self, name: &str) -> Option<String>;
    /// Scheme the client used, `http` or `https`.
    fn protocol(&self) -> String;
    /// Hostname the request addressed.
    fn hostname(&self) -> String;
    /// A request header value.
    fn header(&self, name: &str) -> Option<String>;
    /// Path plus query string, exactly as received.
    fn url(&self) -> String;
    /// The mutable session mapping, when session support is available.
    fn session(&mut self) -> Option<&mut dyn SessionMap>;
}

/// The session mapping the validated identity lives in, keyed by the
/// configured namespace.
pub trait SessionMap {
    fn get(&self, space: &str) -> Option<AuthSession>;
    fn insert(&mut self, space: &str, session: AuthSession);
    fn remove(&mut self, space: &str);
}

/// Plain in-memory session, enough for tests and single-process embedders.
impl SessionMap for HashMap<String, AuthSession> {
    fn get(&self, space: &str) -> Option<AuthSession> {
        HashMap::get(self, space).cloned()
    }
    fn insert(&mut self, space: &str, session: AuthSession) {
        HashMap::insert(self, space.to_string(), session);
    }
    fn remove(&mut self, space: &str) {
        HashMap::remove(self, space);
    }
}

/// What the state machine needs from the outbound response.
pub trait CasResponse {
    /// Issue an HTTP redirect to the given location.
    fn redirect(&mut self, location: &str);
}

/// Tagged outcome of one authentication check; exactly one fires per check,
/// and at most one redirect is ever issued.
#[derive(Debug)]
pub enum AuthOutcome {
    /// Already authenticated, no ticket: the request may proceed.
    Success,
    /// A ticket was just exchanged and stored; the browser was redirected to
    /// the current URL with the ticket removed.
    Validated,
    /// The browser was redirected, either to CAS login or away from a stale
    /// ticket.
    Redirected,
    /// CAS rejected the ticket; carries the joined failure text.
    Failure(String),
    /// Session missing, transport fault, or unexpected condition.
    Error(CasError),
}

/// Client-side CAS 2.0 handler: holds the immutable [`CasConfig`] and the
/// outbound ticket validator, no per-request state.
pub struct CasClient {
    config: CasConfig,
    validator: Box<dyn ValidateTicket + Send + Sync>,
}

impl CasClient {
    pub fn new(config: CasConfig) -> Self {
        Self {
            config,
            validator: Box::new(HttpTicketValidator),
        }
    }

    /// Same client with a caller-supplied validator. Tests and embedders
    /// with their own transport use this; everything else behaves
    /// identically.
    pub fn with_validator(
        config: CasConfig,
        validator: impl ValidateTicket + Send + Sync + 'static,
    ) -> Self {
        Self {
            config,
            validator: Box::new(validator),
        }
    }

    pub fn config(&self) -> &CasConfig {
        &self.config
    }

    /// Run one authentication check for the request, issuing at most one
    /// redirect on `res` and returning the single outcome. Internal failures
    /// are folded into [`AuthOutcome::Error`], never propagated.
    pub fn force_authentication(
        &self,
        req: &mut dyn CasRequest,
        res: &mut dyn CasResponse,
    ) -> AuthOutcome {
        match self.check(req, res) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("authentication check failed: {err}");
                AuthOutcome::Error(err)
            }
        }
    }

    fn check(
        &self,
        req: &mut dyn CasRequest,
        res: &mut dyn CasResponse,
    ) -> Result<AuthOutcome, CasError> {
        let ticket = req.query_param("ticket").filter(|t| !t.is_empty());

        // Session support is a hard requirement: without it there is nowhere
        // to keep the identity, and redirecting to CAS would loop forever.
        let authenticated = {
            let session = req.session().ok_or(CasError::SessionUnavailable)?;
            session
                .get(&self.config.session_space)
                .is_some_and(|s| !s.user.is_empty())
        };

        match (authenticated, ticket) {
            (false, None) => {
                let login =
                    urls::login_url(&self.config, &urls::callback_url(&self.config, req));
                debug!("unauthenticated without ticket, redirecting to {login}");
                res.redirect(&login);
                Ok(AuthOutcome::Redirected)
            }
            (false, Some(ticket)) => {
                let service = urls::strip_ticket(&urls::initiating_url(&self.config, req));
                let result = self.validator.validate(&self.config, &service, &ticket)?;
                if !result.errors.is_empty() {
                    return Ok(AuthOutcome::Failure(result.errors.join(", ")));
                }
                match result.user {
                    Some(user) => {
                        debug!("ticket validated for {user}");
                        let here = urls::unique_url(&service);
                        let session = req.session().ok_or(CasError::SessionUnavailable)?;
                        session.insert(
                            &self.config.session_space,
                            AuthSession {
                                user,
                                attributes: result.attributes,
                            },
                        );
                        res.redirect(&here);
                        Ok(AuthOutcome::Validated)
                    }
                    // an error-free result must name a user
                    None => Err(CasError::Unexpected(
                        "validation reported no errors but named no user".to_string(),
                    )),
                }
            }
            (true, Some(_)) => {
                // Already authenticated but a ticket is still in the URL;
                // scrub it so a bookmark or replay never carries a stale one.
                let here = urls::unique_url(&urls::strip_ticket(&urls::initiating_url(
                    &self.config,
                    req,
                )));
                res.redirect(&here);
                Ok(AuthOutcome::Redirected)
            }
            (true, None) => Ok(AuthOutcome::Success),
        }
    }

    /// Drop the stored identity, then send the browser to CAS logout with
    /// the same service URL computation as login. A request without session
    /// support still gets the redirect.
    pub fn logout(&self, req: &mut dyn CasRequest, res: &mut dyn CasResponse) -> AuthOutcome {
        let logout = urls::logout_url(&self.config, &urls::callback_url(&self.config, req));
        if let Some(session) = req.session() {
            session.remove(&self.config.session_space);
        }
        res.redirect(&logout);
        AuthOutcome::Redirected
    }
}
