use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RegistryError {
    Connect,
    Request,
    BadResponse,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Connect => write!(f, "Failed to connect to registry"),
            RegistryError::Request => write!(f, "Failed to send registry request"),
            RegistryError::BadResponse => write!(f, "Bad response from registry"),
        }
    }
}
