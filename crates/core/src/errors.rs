use std::fmt::{Debug, Display};

pub enum Error {
    MissingSecret,
    InvalidSecret,
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingSecret => write!(f, "No signing secret configured"),
            Error::InvalidSecret => write!(f, "Signing secret rejected as HMAC key"),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

impl std::error::Error for Error {}

