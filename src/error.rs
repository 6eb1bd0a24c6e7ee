pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub enum Error {
    Configuration(String),
    Transport(BoxError),
    Api { status: u16 },
    Decode(serde_json::Error),
    NotFound { key: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Configuration(msg) => f.write_str(msg),
            Error::Transport(e) => write!(f, "request failed: {e}"),
            Error::Api { status } => {
                write!(f, "failed to fetch secrets, status code: {status}")
            }
            Error::Decode(e) => write!(f, "failed to decode secrets response: {e}"),
            Error::NotFound { key } => write!(f, "secret key {key} not found"),
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Transport(e) => Some(e.as_ref()),
            Error::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Self::Configuration(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Self::Configuration(msg.to_owned())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_includes_context() {
        assert_eq!(
            Error::Api { status: 403 }.to_string(),
            "failed to fetch secrets, status code: 403"
        );
        assert_eq!(
            Error::NotFound {
                key: "missing".to_owned()
            }
            .to_string(),
            "secret key missing not found"
        );
        assert_eq!(
            Error::from("transport not set").to_string(),
            "transport not set"
        );
    }

    #[test]
    fn test_source_is_wrapped_cause() {
        let parse_error = serde_json::from_str::<serde_json::Value>("not-json").unwrap_err();
        let error = Error::from(parse_error);
        assert!(matches!(error, Error::Decode(_)));
        assert!(error.source().is_some());

        let error = Error::Transport("connection refused".into());
        assert_eq!(error.source().unwrap().to_string(), "connection refused");

        assert!(Error::Api { status: 500 }.source().is_none());
    }
}
