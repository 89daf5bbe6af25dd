use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

/// Default CoAP port.
pub const COAP_PORT: u16 = 5683;

/// Error returned when a server URI cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum UriError {
    /// The URI has no `scheme://` prefix.
    #[error("missing scheme in {0:?}")]
    MissingScheme(String),

    /// The scheme is known but needs transport security.
    #[error("secure scheme {0:?} is not supported")]
    SecureScheme(String),

    /// The scheme is not a CoAP scheme.
    #[error("unsupported scheme {0:?}")]
    UnsupportedScheme(String),

    /// The authority is empty or malformed.
    #[error("invalid host in {0:?}")]
    InvalidHost(String),

    /// The port is not a number in range.
    #[error("invalid port in {0:?}")]
    InvalidPort(String),

    /// The host did not resolve to any address.
    #[error("could not resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },
}

/// A `coap://host[:port]` server URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerUri {
    host: String,
    port: u16,
}

impl ServerUri {
    /// Parses a server URI.
    ///
    /// Only plain `coap://` is accepted. Anything after the authority
    /// (path, query) is ignored. IPv6 literals must be bracketed.
    pub fn parse(uri: &str) -> Result<Self, UriError> {
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| UriError::MissingScheme(uri.to_owned()))?;

        match scheme.to_ascii_lowercase().as_str() {
            "coap" => {}
            "coaps" => return Err(UriError::SecureScheme(scheme.to_owned())),
            _ => return Err(UriError::UnsupportedScheme(scheme.to_owned())),
        }

        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();

        let (host, port) = if let Some(bracketed) = authority.strip_prefix('[') {
            let (host, after) = bracketed
                .split_once(']')
                .ok_or_else(|| UriError::InvalidHost(uri.to_owned()))?;

            let port = match after {
                "" => None,
                _ => Some(
                    after
                        .strip_prefix(':')
                        .ok_or_else(|| UriError::InvalidHost(uri.to_owned()))?,
                ),
            };
            (host, port)
        } else {
            match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            }
        };

        if host.is_empty() || (!authority.starts_with('[') && host.contains(':')) {
            return Err(UriError::InvalidHost(uri.to_owned()));
        }

        let port = match port {
            Some(port) => port
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| UriError::InvalidPort(uri.to_owned()))?,
            None => COAP_PORT,
        };

        Ok(Self {
            host: host.to_owned(),
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolves the URI to the first matching socket address.
    pub fn resolve(&self) -> Result<SocketAddr, UriError> {
        let resolve_err = |source: io::Error| UriError::Resolve {
            host: self.host.clone(),
            source,
        };

        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(resolve_err)?
            .next()
            .ok_or_else(|| {
                resolve_err(io::Error::new(
                    io::ErrorKind::NotFound,
                    "no address found",
                ))
            })
    }
}

impl FromStr for ServerUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ServerUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "coap://[{}]:{}", self.host, self.port)
        } else {
            write!(f, "coap://{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_uri() {
        let uri = ServerUri::parse("coap://localhost:5683").unwrap();
        assert_eq!(uri.host(), "localhost");
        assert_eq!(uri.port(), 5683);
    }

    #[test]
    fn test_parse_default_port() {
        let uri = ServerUri::parse("coap://example.org/rd?ep=x").unwrap();
        assert_eq!(uri.host(), "example.org");
        assert_eq!(uri.port(), COAP_PORT);
    }

    #[test]
    fn test_parse_ipv6_literal() {
        let uri = ServerUri::parse("coap://[::1]:5700").unwrap();
        assert_eq!(uri.host(), "::1");
        assert_eq!(uri.port(), 5700);
        assert_eq!(uri.to_string(), "coap://[::1]:5700");

        let uri = ServerUri::parse("coap://[::1]").unwrap();
        assert_eq!(uri.port(), COAP_PORT);
    }

    #[test]
    fn test_reject_secure_scheme() {
        let err = ServerUri::parse("coaps://localhost:5684").unwrap_err();
        assert!(matches!(err, UriError::SecureScheme(_)));
    }

    #[test]
    fn test_reject_bad_uris() {
        assert!(matches!(
            ServerUri::parse("localhost:5683"),
            Err(UriError::MissingScheme(_))
        ));
        assert!(matches!(
            ServerUri::parse("http://localhost"),
            Err(UriError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            ServerUri::parse("coap://:5683"),
            Err(UriError::InvalidHost(_))
        ));
        assert!(matches!(
            ServerUri::parse("coap://localhost:0"),
            Err(UriError::InvalidPort(_))
        ));
        assert!(matches!(
            ServerUri::parse("coap://localhost:http"),
            Err(UriError::InvalidPort(_))
        ));
        assert!(matches!(
            ServerUri::parse("coap://::1"),
            Err(UriError::InvalidHost(_))
        ));
    }

    #[test]
    fn test_resolve_literal() {
        let addr = ServerUri::parse("coap://127.0.0.1:5683")
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!(addr, "127.0.0.1:5683".parse::<SocketAddr>().unwrap());
    }
}
