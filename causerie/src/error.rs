// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::error::Error as StdError;
use std::fmt;
use std::io::Error as IoError;

use sasl::client::MechanismError as SaslMechanismError;

/// Top-level error type.
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(IoError),
    /// Error parsing a Jabber-Id
    JidParse(jid::Error),
    /// Protocol-level error
    Protocol(ProtocolError),
    /// Authentication error
    Auth(AuthError),
    /// TLS negotiation error
    Tls(TlsError),
    /// Connection closed
    Disconnected,
    /// The operation needs a bound session
    NotConnected,
    /// A forced encryption could not be performed
    Encryption(String),
    /// The addressed buffer/contact does not exist
    NoSuchBuddy,
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(e) => write!(fmt, "IO error: {}", e),
            Error::JidParse(e) => write!(fmt, "jid parse error: {}", e),
            Error::Protocol(e) => write!(fmt, "protocol error: {}", e),
            Error::Auth(e) => write!(fmt, "authentication error: {}", e),
            Error::Tls(e) => write!(fmt, "TLS error: {}", e),
            Error::Disconnected => write!(fmt, "disconnected"),
            Error::NotConnected => write!(fmt, "not connected"),
            Error::Encryption(e) => write!(fmt, "encryption error: {}", e),
            Error::NoSuchBuddy => write!(fmt, "no such buddy"),
        }
    }
}

impl StdError for Error {}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

impl From<jid::Error> for Error {
    fn from(e: jid::Error) -> Self {
        Error::JidParse(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<AuthError> for Error {
    fn from(e: AuthError) -> Self {
        Error::Auth(e)
    }
}

impl From<TlsError> for Error {
    fn from(e: TlsError) -> Self {
        Error::Tls(e)
    }
}

impl From<causerie_stanza::Error> for Error {
    fn from(e: causerie_stanza::Error) -> Self {
        ProtocolError::Stanza(e).into()
    }
}

/// XMPP protocol-level error
#[derive(Debug)]
pub enum ProtocolError {
    /// Error at the stanza codec layer
    Stanza(causerie_stanza::Error),
    /// No TLS available
    NoTls,
    /// Invalid response to resource binding
    InvalidBindResponse,
    /// No id attribute in `<stream:stream>`
    NoStreamId,
    /// Stream-level error received from the peer
    StreamError(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProtocolError::Stanza(e) => write!(fmt, "stanza error: {}", e),
            ProtocolError::NoTls => write!(fmt, "no TLS available"),
            ProtocolError::InvalidBindResponse => {
                write!(fmt, "invalid response to resource binding")
            }
            ProtocolError::NoStreamId => write!(fmt, "no id attribute in <stream:stream>"),
            ProtocolError::StreamError(e) => write!(fmt, "stream error: {}", e),
        }
    }
}

impl StdError for ProtocolError {}

impl From<causerie_stanza::Error> for ProtocolError {
    fn from(e: causerie_stanza::Error) -> Self {
        ProtocolError::Stanza(e)
    }
}

/// Authentication error
#[derive(Debug)]
pub enum AuthError {
    /// No matching SASL mechanism available
    NoMechanism,
    /// Local SASL implementation error
    Sasl(SaslMechanismError),
    /// Failure from server
    Fail(String),
}

impl StdError for AuthError {}

impl fmt::Display for AuthError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::NoMechanism => write!(fmt, "no matching SASL mechanism available"),
            AuthError::Sasl(s) => write!(fmt, "local SASL implementation error: {}", s),
            AuthError::Fail(c) => write!(fmt, "failure from the server: {}", c),
        }
    }
}

/// TLS setup error
#[derive(Debug)]
pub enum TlsError {
    /// Handshake or certificate error from the TLS backend
    #[cfg(feature = "tls-native")]
    Native(native_tls::Error),
    /// The server certificate did not match the pinned fingerprint
    FingerprintMismatch {
        /// What the certificate hashed to.
        got: String,
        /// What the configuration pinned.
        expected: String,
    },
    /// TLS was requested but the crate was built without a TLS backend
    Unavailable,
}

impl StdError for TlsError {}

impl fmt::Display for TlsError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            #[cfg(feature = "tls-native")]
            TlsError::Native(e) => write!(fmt, "TLS error: {}", e),
            TlsError::FingerprintMismatch { got, expected } => write!(
                fmt,
                "certificate fingerprint mismatch: got {}, expected {}",
                got, expected
            ),
            TlsError::Unavailable => write!(fmt, "TLS support not compiled in"),
        }
    }
}

#[cfg(feature = "tls-native")]
impl From<native_tls::Error> for TlsError {
    fn from(e: native_tls::Error) -> Self {
        TlsError::Native(e)
    }
}
