use http::Uri;
use thiserror::Error;

/// Port used when neither the URI nor the command line names one.
const DEFAULT_PORT: u16 = 80;

/// The server and path a command line URI points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub path: String,
}

#[derive(Error, Debug)]
pub enum TargetError {
    #[error("invalid uri {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("unsupported scheme in {uri:?}, only http is supported")]
    UnsupportedScheme { uri: String },

    #[error("uri {uri:?} names no host")]
    MissingHost { uri: String },
}

impl Target {
    /// Parses a URI such as `example.com`, `example.com/a.html` or
    /// `http://example.com:8080/`. The scheme defaults to `http`, the path to
    /// `/`, and `port` overrides the port of the URI.
    pub fn parse(uri: &str, port: Option<u16>) -> Result<Self, TargetError> {
        let uri = if uri.contains("://") { uri.to_string() } else { format!("http://{uri}") };
        let parsed = uri
            .parse::<Uri>()
            .map_err(|e| TargetError::InvalidUri { uri: uri.clone(), reason: e.to_string() })?;

        if parsed.scheme_str() != Some("http") {
            return Err(TargetError::UnsupportedScheme { uri });
        }

        let Some(host) = parsed.host() else {
            return Err(TargetError::MissingHost { uri });
        };

        let path = parsed.path_and_query().map(|path| path.as_str()).filter(|path| !path.is_empty()).unwrap_or("/");

        Ok(Self {
            host: host.to_string(),
            port: port.or(parsed.port_u16()).unwrap_or(DEFAULT_PORT),
            path: path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let target = Target::parse("example.com", None).unwrap();
        assert_eq!(target, Target { host: "example.com".into(), port: 80, path: "/".into() });
    }

    #[test]
    fn explicit_parts() {
        let target = Target::parse("http://localhost:8000/docs/a.html", None).unwrap();
        assert_eq!(target, Target { host: "localhost".into(), port: 8000, path: "/docs/a.html".into() });
    }

    #[test]
    fn command_line_port_wins() {
        let target = Target::parse("localhost:8000/index.html", Some(9000)).unwrap();
        assert_eq!(target.port, 9000);
        assert_eq!(target.path, "/index.html");
    }

    #[test]
    fn rejected_uris() {
        assert!(matches!(Target::parse("https://example.com/", None), Err(TargetError::UnsupportedScheme { .. })));
        assert!(matches!(Target::parse("http://exa mple.com/", None), Err(TargetError::InvalidUri { .. })));
    }
}
