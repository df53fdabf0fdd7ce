use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum AgentError {
    BadConfig,
    NoGpu,
    RegistryUnreachable,
}

impl std::error::Error for AgentError {}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::BadConfig => write!(f, "Failed to load agent config"),
            AgentError::NoGpu => write!(f, "No supported GPU detected"),
            AgentError::RegistryUnreachable => write!(f, "Could not reach registry"),
        }
    }
}
