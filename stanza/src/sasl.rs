// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use base64::{engine::general_purpose::STANDARD as Base64, Engine};

use crate::element::Element;
use crate::error::Error;
use crate::ns;

fn decode_optional_base64(elem: &Element) -> Result<Vec<u8>, Error> {
    let text = elem.text();
    if text.is_empty() || text == "=" {
        Ok(Vec::new())
    } else {
        Ok(Base64.decode(text)?)
    }
}

fn encode_base64(data: &[u8]) -> String {
    if data.is_empty() {
        "=".to_owned()
    } else {
        Base64.encode(data)
    }
}

/// An authentication request naming the mechanism and carrying its initial
/// response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auth {
    /// The SASL mechanism name, e.g. `PLAIN`.
    pub mechanism: String,
    /// The initial response, base64-wrapped on the wire.
    pub data: Vec<u8>,
}

impl TryFrom<Element> for Auth {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Auth, Error> {
        let elem = crate::util::check_element(elem, "auth", ns::SASL)?;
        let mechanism = get_attr!(elem, "mechanism", Required);
        let data = decode_optional_base64(&elem)?;
        Ok(Auth { mechanism, data })
    }
}

impl From<Auth> for Element {
    fn from(auth: Auth) -> Element {
        let mut elem = Element::builder("auth", ns::SASL)
            .attr("mechanism", auth.mechanism)
            .build();
        elem.append_text_node(encode_base64(&auth.data));
        elem
    }
}

/// A server challenge within a SASL exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Decoded challenge bytes.
    pub data: Vec<u8>,
}

impl TryFrom<Element> for Challenge {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Challenge, Error> {
        let elem = crate::util::check_element(elem, "challenge", ns::SASL)?;
        let data = decode_optional_base64(&elem)?;
        Ok(Challenge { data })
    }
}

/// A client response to a [`Challenge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response bytes, base64-wrapped on the wire.
    pub data: Vec<u8>,
}

impl From<Response> for Element {
    fn from(response: Response) -> Element {
        let mut elem = Element::bare("response", ns::SASL);
        elem.append_text_node(encode_base64(&response.data));
        elem
    }
}

/// Authentication succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Success {
    /// Optional additional data with success.
    pub data: Vec<u8>,
}

impl TryFrom<Element> for Success {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Success, Error> {
        let elem = crate::util::check_element(elem, "success", ns::SASL)?;
        let data = decode_optional_base64(&elem)?;
        Ok(Success { data })
    }
}

/// Authentication failed; the child element names the condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// The failure condition, e.g. `not-authorized`.
    pub condition: String,
    /// Optional human-readable text.
    pub text: Option<String>,
}

impl TryFrom<Element> for Failure {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Failure, Error> {
        let elem = crate::util::check_element(elem, "failure", ns::SASL)?;
        let mut condition = "not-authorized".to_owned();
        let mut text = None;
        for child in elem.children() {
            if child.ns() != ns::SASL {
                continue;
            }
            if child.name() == "text" {
                text = Some(child.text());
            } else {
                condition = child.name().to_owned();
            }
        }
        Ok(Failure { condition, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_plain() {
        let auth = Auth {
            mechanism: "PLAIN".to_owned(),
            data: b"\0juliet\0s3cr3t".to_vec(),
        };
        let elem: Element = auth.clone().into();
        assert_eq!(elem.attr("mechanism"), Some("PLAIN"));
        let parsed = Auth::try_from(elem).unwrap();
        assert_eq!(parsed, auth);
    }

    #[test]
    fn test_empty_data_encodes_as_equals() {
        let elem: Element = Auth {
            mechanism: "ANONYMOUS".to_owned(),
            data: vec![],
        }
        .into();
        assert_eq!(elem.text(), "=");
    }

    #[test]
    fn test_failure() {
        let elem: Element = "<failure xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>\
             <not-authorized/><text>bad password</text></failure>"
            .parse()
            .unwrap();
        let failure = Failure::try_from(elem).unwrap();
        assert_eq!(failure.condition, "not-authorized");
        assert_eq!(failure.text.as_deref(), Some("bad password"));
    }
}
