// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Contains one of the potential errors triggered while parsing or framing
/// an [`Element`][crate::Element].
#[derive(Debug)]
pub enum Error {
    /// The usual error when parsing something.
    ParseError(&'static str),

    /// Element local-name/namespace mismatch.
    ///
    /// Returns the expected ns and local-name along with the original
    /// element, unaltered.
    TypeMismatch(&'static str, &'static str, crate::Element),

    /// The peer sent something which is not well-formed XML.  This is fatal
    /// for the stream it happened on.
    Xml(String),

    /// I/O error from the underlying transport.
    Io(io::Error),

    /// Generated when some base64 content fails to decode.
    Base64Error(base64::DecodeError),

    /// Generated when text which should be an integer fails to parse.
    ParseIntError(std::num::ParseIntError),

    /// Generated when text which should be a JID fails to parse.
    JidParseError(jid::Error),

    /// Generated when a timestamp fails to parse.
    ChronoParseError(chrono::ParseError),
}

impl Error {
    /// Converts the TypeMismatch error to a generic ParseError.
    ///
    /// This must be used when TryFrom is called on children to avoid
    /// confusing user code which assumes that TypeMismatch refers to the top
    /// level element only.
    pub(crate) fn hide_type_mismatch(self) -> Self {
        match self {
            Error::TypeMismatch(..) => Error::ParseError("Unexpected child element"),
            other => other,
        }
    }
}

impl StdError for Error {
    fn cause(&self) -> Option<&dyn StdError> {
        match self {
            Error::ParseError(_) | Error::TypeMismatch(..) | Error::Xml(_) => None,
            Error::Io(e) => Some(e),
            Error::Base64Error(e) => Some(e),
            Error::ParseIntError(e) => Some(e),
            Error::JidParseError(e) => Some(e),
            Error::ChronoParseError(e) => Some(e),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ParseError(s) => write!(fmt, "parse error: {}", s),
            Error::TypeMismatch(ns, localname, element) => write!(
                fmt,
                "element type mismatch: expected {{{}}}{}, got {{{}}}{}",
                ns,
                localname,
                element.ns(),
                element.name()
            ),
            Error::Xml(s) => write!(fmt, "XML error: {}", s),
            Error::Io(e) => write!(fmt, "IO error: {}", e),
            Error::Base64Error(e) => write!(fmt, "base64 error: {}", e),
            Error::ParseIntError(e) => write!(fmt, "integer parsing error: {}", e),
            Error::JidParseError(e) => write!(fmt, "JID parsing error: {}", e),
            Error::ChronoParseError(e) => write!(fmt, "time parsing error: {}", e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        // The async reader folds XML well-formedness errors into
        // InvalidData; keep them apart from real transport failures.
        if err.kind() == io::ErrorKind::InvalidData {
            Error::Xml(err.to_string())
        } else {
            Error::Io(err)
        }
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(err: std::convert::Infallible) -> Error {
        match err {}
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Error {
        Error::Base64Error(err)
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Error {
        Error::ParseIntError(err)
    }
}

impl From<jid::Error> for Error {
    fn from(err: jid::Error) -> Error {
        Error::JidParseError(err)
    }
}

impl From<chrono::ParseError> for Error {
    fn from(err: chrono::ParseError) -> Error {
        Error::ChronoParseError(err)
    }
}
