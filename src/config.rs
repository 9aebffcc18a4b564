use serde::Deserialize;

/// Session key under which the validated identity is stored.
pub const DEFAULT_SESSION_SPACE: &str = "simpleCAS";

/// Namespace of the attribute extension elements recognized by default.
pub const DEFAULT_ATTRIBUTE_NAMESPACE: &str = "https://max.gov";

/// Overrides for how the client's own URL is reconstructed.
///
/// When `host` is set, the service URL is synthesized from
/// `prefix + host + request path` instead of the request's host headers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    pub prefix: Option<String>,
    pub host: Option<String>,
}

/// Location of the CAS server.
///
/// `context` is the path the CAS endpoints hang off, e.g. `/cas`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    pub host: String,
    pub port: Option<u16>,
    pub context: String,
}

/// Settings resolved once per client instance and shared read-only by every
/// component. Construct with [`CasConfig::new`] plus `with_*` methods, or
/// deserialize from JSON with [`CasConfig::from_json`]; keys a config file
/// leaves out keep their built-in defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CasConfig {
    pub session_space: String,
    pub client: ClientConfig,
    pub server: ServerConfig,
    pub initiating_url: Option<String>,
    pub callback_url: Option<String>,
    pub attribute_namespace: String,
}

impl Default for CasConfig {
    fn default() -> Self {
        Self {
            session_space: DEFAULT_SESSION_SPACE.to_string(),
            client: ClientConfig::default(),
            server: ServerConfig::default(),
            initiating_url: None,
            callback_url: None,
            attribute_namespace: DEFAULT_ATTRIBUTE_NAMESPACE.to_string(),
        }
    }
}

impl CasConfig {
    /// Config pointing at the given CAS server host, defaults everywhere else.
    pub fn new(server_host: impl Into<String>) -> Self {
        Self {
            server: ServerConfig {
                host: server_host.into(),
                ..ServerConfig::default()
            },
            ..Self::default()
        }
    }

    /// Load from a JSON document with camelCase keys (`sessionSpace`,
    /// `server.host`, `initiatingUrl`, ...).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn with_session_space(mut self, space: impl Into<String>) -> Self {
        self.session_space = space.into();
        self
    }

    #[must_use]
    pub fn with_client_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.client.prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn with_client_host(mut self, host: impl Into<String>) -> Self {
        self.client.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn with_server_port(mut self, port: u16) -> Self {
        self.server.port = Some(port);
        self
    }

    #[must_use]
    pub fn with_server_context(mut self, context: impl Into<String>) -> Self {
        self.server.context = context.into();
        self
    }

    #[must_use]
    pub fn with_initiating_url(mut self, url: impl Into<String>) -> Self {
        self.initiating_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_attribute_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.attribute_namespace = namespace.into();
        self
    }
}
