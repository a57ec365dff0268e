//! Session configuration.

use std::time::Duration;

/// Greeting deadline: the server must greet within this window.
pub const TIMEOUT_CONNECTION: Duration = Duration::from_secs(90);

/// NOOP keep-alive spacing when the server lacks IDLE.
pub const TIMEOUT_NOOP: Duration = Duration::from_secs(180);

/// Maximum duration of one IDLE interval before it is renewed.
pub const TIMEOUT_IDLE: Duration = Duration::from_secs(180);

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Plaintext TCP (port 143). Intended for tests and local servers.
    Plain,
    /// TLS from the start (port 993).
    #[default]
    Tls,
}

impl Security {
    /// Returns the default port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Plain => 143,
            Self::Tls => 993,
        }
    }
}

/// Authentication material.
///
/// XOAUTH2 is used iff the server advertises `AUTH=XOAUTH2` and an access
/// token is present; otherwise LOGIN with the password.
#[derive(Debug, Clone)]
pub struct Auth {
    /// Username / account address.
    pub user: String,
    /// Password for LOGIN.
    pub pass: Option<String>,
    /// OAuth2 access token for AUTHENTICATE XOAUTH2.
    pub xoauth2: Option<String>,
}

impl Auth {
    /// Password credentials.
    #[must_use]
    pub fn password(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: Some(pass.into()),
            xoauth2: None,
        }
    }

    /// OAuth2 credentials.
    #[must_use]
    pub fn xoauth2(user: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: None,
            xoauth2: Some(access_token.into()),
        }
    }
}

/// IMAP session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Authentication material for the connect handshake.
    pub auth: Option<Auth>,
    /// Client identification sent via ID when the server supports it.
    /// `None` sends `ID NIL`.
    pub id: Option<Vec<(String, String)>>,
    /// Greeting deadline.
    pub connection_timeout: Duration,
    /// NOOP polling interval.
    pub noop_interval: Duration,
    /// IDLE renewal interval.
    pub idle_interval: Duration,
}

impl SessionConfig {
    /// Creates a configuration with implicit TLS and default timers.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Security::Tls.default_port(),
            security: Security::Tls,
            auth: None,
            id: Some(vec![
                ("name".to_string(), "tidemail".to_string()),
                ("version".to_string(), env!("CARGO_PKG_VERSION").to_string()),
            ]),
            connection_timeout: TIMEOUT_CONNECTION,
            noop_interval: TIMEOUT_NOOP,
            idle_interval: TIMEOUT_IDLE,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the security mode, adjusting the port if it was the default
    /// for the previous mode.
    #[must_use]
    pub fn security(mut self, security: Security) -> Self {
        if self.port == self.security.default_port() {
            self.port = security.default_port();
        }
        self.security = security;
        self
    }

    /// Sets the authentication material.
    #[must_use]
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Sets the client identification pairs sent via ID.
    #[must_use]
    pub fn id(mut self, id: Option<Vec<(String, String)>>) -> Self {
        self.id = id;
        self
    }

    /// Sets the greeting deadline.
    #[must_use]
    pub const fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the NOOP polling interval.
    #[must_use]
    pub const fn noop_interval(mut self, interval: Duration) -> Self {
        self.noop_interval = interval;
        self
    }

    /// Sets the IDLE renewal interval.
    #[must_use]
    pub const fn idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new("imap.example.com");
        assert_eq!(config.port, 993);
        assert_eq!(config.security, Security::Tls);
        assert_eq!(config.connection_timeout, Duration::from_secs(90));
        assert_eq!(config.noop_interval, Duration::from_secs(180));
        assert_eq!(config.idle_interval, Duration::from_secs(180));
        assert!(config.id.is_some());
    }

    #[test]
    fn test_security_adjusts_default_port() {
        let config = SessionConfig::new("localhost").security(Security::Plain);
        assert_eq!(config.port, 143);

        // An explicit port survives the security change
        let config = SessionConfig::new("localhost")
            .port(1143)
            .security(Security::Plain);
        assert_eq!(config.port, 1143);
    }

    #[test]
    fn test_auth_builders() {
        let auth = Auth::password("user", "secret");
        assert_eq!(auth.pass.as_deref(), Some("secret"));
        assert!(auth.xoauth2.is_none());

        let auth = Auth::xoauth2("user", "token");
        assert!(auth.pass.is_none());
        assert_eq!(auth.xoauth2.as_deref(), Some("token"));
    }
}
