/// Proxy identity definitions
///
/// A proxy identity is the `host:port` address outbound requests are routed
/// through. Identities are immutable values; rotation replaces them whole.
use std::fmt;
use std::str::FromStr;

/// A network intermediary's `host:port` address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyIdentity {
    host: String,
    port: u16,
}

impl ProxyIdentity {
    /// Creates an identity from its parts
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the proxy URL handed to the HTTP client
    ///
    /// # Example
    ///
    /// ```
    /// use dispatch_scraper::ProxyIdentity;
    ///
    /// let proxy = ProxyIdentity::new("54.36.246.74", 80);
    /// assert_eq!(proxy.proxy_url(), "http://54.36.246.74:80");
    /// ```
    pub fn proxy_url(&self) -> String {
        format!("http://{}", self)
    }
}

impl fmt::Display for ProxyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for ProxyIdentity {
    type Err = String;

    /// Parses `host:port`, splitting on the last colon
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("'{}' is not in host:port form", s))?;

        let host = host.trim();
        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(format!("'{}' has an invalid host", s));
        }

        let port: u16 = port
            .trim()
            .parse()
            .map_err(|_| format!("'{}' has an invalid port", s))?;

        if port == 0 {
            return Err(format!("'{}' has an invalid port", s));
        }

        Ok(Self::new(host, port))
    }
}
