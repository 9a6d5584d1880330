//! Error types for the `testing-tools` crate.
//!
//! A root Error struct holds the error kind and an optional source for chaining.

use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// The request never produced a response.
    Http(HttpErrorKind),
    /// The backend answered with a non-success status.
    Status { status: u16, body: String },
    /// The response body was not the expected JSON shape.
    Decode,
    Scenario(ScenarioErrorKind),
}

#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    RequestFailed,
    Network,
}

#[derive(Debug, PartialEq)]
pub enum ScenarioErrorKind {
    NoProjects,
    ProjectNotFound,
}

impl Error {
    /// Returns the HTTP status for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self.error_kind {
            ErrorKind::Status { status, .. } => Some(status),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?}", kind)?,
            ErrorKind::Status { status, body } => write!(f, "status {}: {}", status, body)?,
            ErrorKind::Decode => write!(f, "unexpected response body")?,
            ErrorKind::Scenario(kind) => write!(f, "scenario error: {:?}", kind)?,
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_decode() {
            ErrorKind::Decode
        } else if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_request() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

pub fn status_error(status: u16, body: String) -> Error {
    Error {
        source: None,
        error_kind: ErrorKind::Status { status, body },
    }
}

pub fn decode_error(message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Decode,
    }
}

pub fn scenario_error(kind: ScenarioErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Scenario(kind),
    }
}
