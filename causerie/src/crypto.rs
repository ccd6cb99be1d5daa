// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Envelope hooks for PGP and OTR.
//!
//! The session core never performs cryptography itself; it hands bodies
//! to these traits at well-defined points of the message path.  The
//! default engines do nothing, which leaves the envelopes inert.

use std::fmt;

/// Failure inside an engine.
#[derive(Debug)]
pub struct CryptoError(pub String);

impl fmt::Display for CryptoError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.0)
    }
}

impl std::error::Error for CryptoError {}

/// Outcome of verifying a presence signature.
#[derive(Debug, Clone)]
pub struct SigInfo {
    /// The signing key id.
    pub key_id: String,
    /// Whether the signature checked out.
    pub ok: bool,
}

/// PGP operations on message bodies and presence signatures.
pub trait PgpEngine: Send {
    /// Whether the engine can do anything at all.
    fn enabled(&self) -> bool {
        false
    }

    /// Encrypts `body` to the contact's key, returning armored text.
    fn encrypt(&mut self, key_id: &str, body: &str) -> Result<String, CryptoError>;

    /// Decrypts armored text.
    fn decrypt(&mut self, armored: &str) -> Result<String, CryptoError>;

    /// Verifies a detached signature over `text`.
    fn verify(&mut self, text: &str, signature: &str) -> Option<SigInfo>;

    /// Signs `text` for our own presence, returning armored output.
    fn sign(&mut self, text: &str) -> Option<String>;
}

/// The disabled PGP engine.
pub struct NoPgp;

impl PgpEngine for NoPgp {
    fn encrypt(&mut self, _key_id: &str, _body: &str) -> Result<String, CryptoError> {
        Err(CryptoError("PGP support is disabled".to_owned()))
    }

    fn decrypt(&mut self, _armored: &str) -> Result<String, CryptoError> {
        Err(CryptoError("PGP support is disabled".to_owned()))
    }

    fn verify(&mut self, _text: &str, _signature: &str) -> Option<SigInfo> {
        None
    }

    fn sign(&mut self, _text: &str) -> Option<String> {
        None
    }
}

/// What OTR decided about an outgoing body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtrOutgoing {
    /// Send this (possibly rewritten) text.
    Send(String),
    /// Send nothing; the engine consumed the message.
    Suppress,
}

/// An inbound body after OTR processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtrIncoming {
    /// The plaintext to display.
    pub text: String,
    /// Whether the wire form was an OTR ciphertext.
    pub was_encrypted: bool,
}

/// OTR operations; invoked before PGP on both paths.
pub trait OtrEngine: Send {
    /// Whether the engine can do anything at all.
    fn enabled(&self) -> bool {
        false
    }

    /// Processes an outgoing plaintext.
    fn outgoing(&mut self, peer: &str, text: &str) -> Result<OtrOutgoing, CryptoError>;

    /// Processes an inbound body.
    fn incoming(&mut self, peer: &str, text: &str) -> Result<OtrIncoming, CryptoError>;
}

/// The disabled OTR engine.
pub struct NoOtr;

impl OtrEngine for NoOtr {
    fn outgoing(&mut self, _peer: &str, text: &str) -> Result<OtrOutgoing, CryptoError> {
        Ok(OtrOutgoing::Send(text.to_owned()))
    }

    fn incoming(&mut self, _peer: &str, text: &str) -> Result<OtrIncoming, CryptoError> {
        Ok(OtrIncoming {
            text: text.to_owned(),
            was_encrypted: false,
        })
    }
}
