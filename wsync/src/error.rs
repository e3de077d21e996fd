use std::{error, fmt};

use serde::{Deserialize, Serialize};

/// An error type for engine and protocol results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Error {
    Config(String),
    NoResponse(String),
    Remote(String),
    Tool(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::NoResponse(msg) => write!(f, "No response from server: {msg}"),
            Self::Remote(msg) => write!(f, "Server error: {msg}"),
            Self::Tool(msg) => write!(f, "Sync tool error: {msg}"),
        }
    }
}

impl error::Error for Error {}


pub type Result<T> = std::result::Result<T, Error>;

#[macro_export]
macro_rules! config_bail {
    ($($t:tt)*) => {
        return ::core::result::Result::Err($crate::Error::Config(format!($($t)*)));
    };
}

#[macro_export]
macro_rules! config_error {
    ($($t:tt)*) => {
        $crate::Error::Config(format!($($t)*))
    };
}

#[macro_export]
macro_rules! no_response_error {
    ($($t:tt)*) => {
        $crate::Error::NoResponse(format!($($t)*))
    };
}

#[macro_export]
macro_rules! remote_error {
    ($($t:tt)*) => {
        $crate::Error::Remote(format!($($t)*))
    };
}

#[macro_export]
macro_rules! tool_error {
    ($($t:tt)*) => {
        $crate::Error::Tool(format!($($t)*))
    };
}
