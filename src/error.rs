//! Error types for certificate checks and report delivery.
//!
//! A [`CheckError`] only ever affects the line of the host it belongs to,
//! while a [`NotifyError`] aborts the run before or during delivery.

use std::fmt;
use std::io;
use std::time::Duration;

/// Why the expiry of one host could not be read.
///
/// Every variant renders the host as a failure line in the report; the
/// run carries on with the next host.
#[derive(Debug)]
pub enum CheckError {
    /// The host name has no usable address
    DnsResolution { hostname: String, source: io::Error },

    /// No resolved address accepted a TCP connection on port 443
    ConnectionFailed {
        /// `host:port` as dialed
        address: String,
        /// Error of the last address tried
        source: io::Error,
    },

    /// The peer broke off the handshake or was rejected by verification
    HandshakeFailed { details: String },

    /// The per-host time limit ran out while connecting or handshaking
    Timeout { hostname: String, limit: Duration },

    /// The handshake completed but no leaf certificate or date came back
    CertificateError { reason: String },

    /// The TLS context could not be set up
    OpenSSLError { details: String },

    /// Socket option failure after the connection was made
    IoError { source: io::Error },
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DnsResolution { hostname, source } => {
                write!(f, "Failed to resolve hostname '{}': {}", hostname, source)
            }
            Self::ConnectionFailed { address, source } => {
                write!(f, "Connection failed to {}: {}", address, source)
            }
            Self::HandshakeFailed { details } => {
                write!(f, "TLS handshake failed: {}", details)
            }
            Self::Timeout { hostname, limit } => {
                write!(f, "Check of '{}' exceeded {:?}", hostname, limit)
            }
            Self::CertificateError { reason } => {
                write!(f, "Certificate error: {}", reason)
            }
            Self::OpenSSLError { details } => {
                write!(f, "OpenSSL error: {}", details)
            }
            Self::IoError { source } => {
                write!(f, "I/O error: {}", source)
            }
        }
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DnsResolution { source, .. } => Some(source),
            Self::ConnectionFailed { source, .. } => Some(source),
            Self::IoError { source } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for CheckError {
    fn from(e: io::Error) -> Self {
        Self::IoError { source: e }
    }
}

impl From<openssl::error::ErrorStack> for CheckError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::OpenSSLError {
            details: e.to_string(),
        }
    }
}

impl<S: fmt::Debug> From<openssl::ssl::HandshakeError<S>> for CheckError {
    fn from(e: openssl::ssl::HandshakeError<S>) -> Self {
        Self::HandshakeFailed {
            details: format!("{}", e),
        }
    }
}

/// Error returned when the report cannot be delivered to Telegram.
#[derive(Debug)]
pub enum NotifyError {
    /// The sendMessage payload could not be encoded as JSON
    Serialization(serde_json::Error),

    /// The proxy address is not a valid URL
    Proxy {
        /// The rejected proxy address
        address: String,
        /// Why it was rejected
        reason: String,
    },

    /// The HTTP client could not be configured
    Client(reqwest::Error),

    /// The POST request could not be completed
    Transport(reqwest::Error),
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialization(e) => write!(f, "Failed to encode message as JSON: {}", e),
            Self::Proxy { address, reason } => {
                write!(f, "Failed to parse proxy '{}': {}", address, reason)
            }
            Self::Client(e) => write!(f, "Failed to build HTTP client: {}", e),
            Self::Transport(e) => write!(f, "Failed to send request: {}", e),
        }
    }
}

impl std::error::Error for NotifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialization(e) => Some(e),
            Self::Client(e) | Self::Transport(e) => Some(e),
            Self::Proxy { .. } => None,
        }
    }
}

impl From<serde_json::Error> for NotifyError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}
