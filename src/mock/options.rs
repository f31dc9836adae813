//! Options accepted when constructing a client.

/// Connection options, mirroring what the real client library accepts.
///
/// The mock stores them untouched so tests can check how the service
/// configured its clients.
///
/// # Example
///
/// ```rust
/// use ircmock::mock::ClientOptions;
///
/// let opts = ClientOptions::default()
///     .with_port(6697)
///     .with_secure(true)
///     .with_channel("#rust");
///
/// assert_eq!(opts.port, 6697);
/// assert_eq!(opts.channels, vec!["#rust".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Server port.
    pub port: u16,
    /// Username sent on registration.
    pub user_name: Option<String>,
    /// Real name sent on registration.
    pub real_name: Option<String>,
    /// Channels to join once connected.
    pub channels: Vec<String>,
    /// Connect as soon as the client is created.
    pub auto_connect: bool,
    /// Use TLS.
    pub secure: bool,
    /// Verbose client-side logging.
    pub debug: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            port: 6667,
            user_name: None,
            real_name: None,
            channels: Vec::new(),
            auto_connect: true,
            secure: false,
            debug: false,
        }
    }
}

impl ClientOptions {
    /// Set the server port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username.
    #[must_use]
    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    /// Set the real name.
    #[must_use]
    pub fn with_real_name(mut self, real_name: impl Into<String>) -> Self {
        self.real_name = Some(real_name.into());
        self
    }

    /// Add a channel to join once connected.
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channels.push(channel.into());
        self
    }

    /// Set whether to connect on construction.
    #[must_use]
    pub fn with_auto_connect(mut self, auto_connect: bool) -> Self {
        self.auto_connect = auto_connect;
        self
    }

    /// Set whether to use TLS.
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set client-side debug logging.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
