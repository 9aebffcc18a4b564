//! URL computation: the service URL the CAS server redirects back to, the
//! login/logout/serviceValidate endpoints, ticket stripping and
//! cache-busting of the post-validation redirect.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

use crate::client::CasRequest;
use crate::config::CasConfig;

static TICKET_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[&?])ticket(=[^&]*)?").expect("ticket pattern compiles"));

/// Remove the first `ticket` query parameter, separator included.
///
/// This is a single pattern replace, not a full query re-parse: a URL
/// carrying a duplicated `ticket` parameter keeps its second occurrence.
/// Stripping an already-stripped URL is a no-op.
pub fn strip_ticket(url: &str) -> String {
    TICKET_PARAM.replace(url, "").into_owned()
}

/// Append a cache-busting `_=` parameter carrying the current
/// epoch-millisecond timestamp, so browsers do not serve the ticket-bearing
/// page from cache.
pub fn unique_url(url: &str) -> String {
    unique_url_at(url, Utc::now().timestamp_millis())
}

pub fn unique_url_at(url: &str, epoch_millis: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}_={epoch_millis}")
}

/// Scheme, host, optional port and context path of the CAS server.
///
/// Plain HTTP only when the configured port is exactly 80; an explicit port
/// segment only for a configured port that is neither 80 nor 443.
pub fn server_base(config: &CasConfig) -> String {
    let server = &config.server;
    let (protocol, port) = match server.port {
        Some(80) => ("http://", String::new()),
        Some(443) | None => ("https://", String::new()),
        Some(port) => ("https://", format!(":{port}")),
    };
    format!("{protocol}{}{port}{}", server.host, server.context)
}

pub fn login_url(config: &CasConfig, service: &str) -> String {
    format!(
        "{}/login?service={}",
        server_base(config),
        urlencoding::encode(service)
    )
}

pub fn logout_url(config: &CasConfig, service: &str) -> String {
    format!(
        "{}/logout?service={}",
        server_base(config),
        urlencoding::encode(service)
    )
}

pub fn service_validate_url(config: &CasConfig, service: &str, ticket: &str) -> String {
    format!(
        "{}/serviceValidate?service={}&ticket={}",
        server_base(config),
        urlencoding::encode(service),
        urlencoding::encode(ticket)
    )
}

/// URL the CAS server should send the browser back to after login.
pub fn callback_url(config: &CasConfig, req: &dyn CasRequest) -> String {
    config
        .callback_url
        .clone()
        .unwrap_or_else(|| initiating_url(config, req))
}

/// URL of the request currently being authenticated.
///
/// Precedence: an explicitly configured initiating URL, then the configured
/// client host (with optional prefix) plus the request path, then the first
/// forwarded host — or the request's own — with the request protocol and
/// path.
pub fn initiating_url(config: &CasConfig, req: &dyn CasRequest) -> String {
    if let Some(url) = &config.initiating_url {
        return url.clone();
    }
    if let Some(host) = &config.client.host {
        let mut url = host.clone();
        if let Some(prefix) = &config.client.prefix {
            url = format!("{prefix}{url}");
        }
        return format!("{url}{}", req.url());
    }
    let host = forwarded_host(req).unwrap_or_else(|| req.hostname());
    format!("{}://{}{}", req.protocol(), host.trim(), req.url())
}

// Proxies may stack hosts comma-separated; only the first entry names the
// host the client actually addressed.
fn forwarded_host(req: &dyn CasRequest) -> Option<String> {
    let header = req.header("x-forwarded-host")?;
    let first = header.split(',').next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SessionMap;

    struct TestRequest {
        protocol: &'static str,
        hostname: &'static str,
        url: &'static str,
        forwarded: Option<&'static str>,
    }

    impl Default for TestRequest {
        fn default() -> Self {
            Self {
                protocol: "https",
                hostname: "app.example.edu",
                url: "/protected",
                forwarded: None,
            }
        }
    }

    impl CasRequest for TestRequest {
        fn query_param(&self, _name: &str) -> Option<String> {
            None
        }
        fn protocol(&self) -> String {
            self.protocol.to_string()
        }
        fn hostname(&self) -> String {
            self.hostname.to_string()
        }
        fn header(&self, name: &str) -> Option<String> {
            (name == "x-forwarded-host")
                .then(|| self.forwarded.map(str::to_string))
                .flatten()
        }
        fn url(&self) -> String {
            self.url.to_string()
        }
        fn session(&mut self) -> Option<&mut dyn SessionMap> {
            None
        }
    }

    fn config() -> CasConfig {
        CasConfig::new("cas.example.edu").with_server_context("/cas")
    }

    #[test]
    fn strip_removes_leading_ticket() {
        assert_eq!(
            strip_ticket("https://app.example.edu/protected?ticket=ST-123"),
            "https://app.example.edu/protected"
        );
    }

    #[test]
    fn strip_removes_trailing_ticket_with_separator() {
        assert_eq!(
            strip_ticket("https://app.example.edu/protected?a=1&ticket=ST-123"),
            "https://app.example.edu/protected?a=1"
        );
    }

    #[test]
    fn strip_handles_valueless_ticket() {
        assert_eq!(
            strip_ticket("https://app.example.edu/protected?a=1&ticket"),
            "https://app.example.edu/protected?a=1"
        );
    }

    #[test]
    fn strip_is_idempotent() {
        let once = strip_ticket("https://app.example.edu/protected?ticket=ST-123&a=1");
        assert_eq!(strip_ticket(&once), once);
    }

    #[test]
    fn strip_removes_only_the_first_occurrence() {
        assert_eq!(
            strip_ticket("https://app.example.edu/p?ticket=ST-1&ticket=ST-2"),
            "https://app.example.edu/p&ticket=ST-2"
        );
    }

    #[test]
    fn strip_leaves_unrelated_parameters_alone() {
        assert_eq!(
            strip_ticket("https://app.example.edu/p?bigticket=1"),
            "https://app.example.edu/p?bigticket=1"
        );
    }

    #[test]
    fn unique_url_separator_depends_on_existing_query() {
        assert_eq!(
            unique_url_at("https://app.example.edu/p", 1000),
            "https://app.example.edu/p?_=1000"
        );
        assert_eq!(
            unique_url_at("https://app.example.edu/p?a=1", 1000),
            "https://app.example.edu/p?a=1&_=1000"
        );
    }

    #[test]
    fn unique_url_suffix_increases_with_time() {
        let url = "https://app.example.edu/p";
        let suffix = |u: String| -> i64 { u.rsplit("_=").next().unwrap().parse().unwrap() };
        let earlier = suffix(unique_url_at(url, 1_700_000_000_000));
        let later = suffix(unique_url_at(url, 1_700_000_000_001));
        assert!(later > earlier);
    }

    #[test]
    fn port_80_selects_plain_http() {
        let config = config().with_server_port(80);
        assert_eq!(server_base(&config), "http://cas.example.edu/cas");
    }

    #[test]
    fn port_443_omits_the_port_segment() {
        let config = config().with_server_port(443);
        assert_eq!(server_base(&config), "https://cas.example.edu/cas");
    }

    #[test]
    fn unconfigured_port_defaults_to_https() {
        assert_eq!(server_base(&config()), "https://cas.example.edu/cas");
    }

    #[test]
    fn nonstandard_port_is_explicit() {
        let config = config().with_server_port(8443);
        assert_eq!(server_base(&config), "https://cas.example.edu:8443/cas");
    }

    #[test]
    fn login_url_round_trips_the_service() {
        let service = "https://app.example.edu/protected?next=/home&lang=en US";
        let login = login_url(&config(), service);
        let parsed = url::Url::parse(&login).unwrap();
        assert_eq!(parsed.path(), "/cas/login");
        let round_tripped = parsed
            .query_pairs()
            .find(|(k, _)| k == "service")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(round_tripped, service);
    }

    #[test]
    fn logout_url_shape() {
        let logout = logout_url(&config(), "https://app.example.edu/");
        assert_eq!(
            logout,
            "https://cas.example.edu/cas/logout?service=https%3A%2F%2Fapp.example.edu%2F"
        );
    }

    #[test]
    fn service_validate_url_carries_both_parameters() {
        let validate = service_validate_url(&config(), "https://app.example.edu/p", "ST-123");
        assert_eq!(
            validate,
            "https://cas.example.edu/cas/serviceValidate?service=https%3A%2F%2Fapp.example.edu%2Fp&ticket=ST-123"
        );
    }

    #[test]
    fn initiating_url_prefers_the_configured_value() {
        let config = config().with_initiating_url("https://override.example.edu/entry");
        let req = TestRequest::default();
        assert_eq!(
            initiating_url(&config, &req),
            "https://override.example.edu/entry"
        );
    }

    #[test]
    fn initiating_url_builds_from_client_host_and_prefix() {
        let config = config()
            .with_client_host("app.example.edu")
            .with_client_prefix("https://");
        let req = TestRequest::default();
        assert_eq!(
            initiating_url(&config, &req),
            "https://app.example.edu/protected"
        );
    }

    #[test]
    fn initiating_url_uses_first_forwarded_host() {
        let req = TestRequest {
            forwarded: Some(" edge.example.edu , internal.example.edu"),
            ..TestRequest::default()
        };
        assert_eq!(
            initiating_url(&config(), &req),
            "https://edge.example.edu/protected"
        );
    }

    #[test]
    fn initiating_url_falls_back_to_request_host() {
        let req = TestRequest::default();
        assert_eq!(
            initiating_url(&config(), &req),
            "https://app.example.edu/protected"
        );
    }

    #[test]
    fn callback_url_prefers_the_configured_value() {
        let config = config().with_callback_url("https://app.example.edu/after");
        let req = TestRequest::default();
        assert_eq!(callback_url(&config, &req), "https://app.example.edu/after");
    }
}
