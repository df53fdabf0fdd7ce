use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ConfigError {
    ReadFile,
    BadToml,
    MissingCredentials,
    PlaceholderCredentials,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadFile => write!(f, "Failed to read config file"),
            ConfigError::BadToml => write!(f, "Failed to parse TOML data"),
            ConfigError::MissingCredentials => write!(f, "Missing registry url or api key"),
            ConfigError::PlaceholderCredentials => {
                write!(f, "Registry credentials still contain placeholder values")
            }
        }
    }
}
