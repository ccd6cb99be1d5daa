// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::element::Element;
use crate::error::Error;
use crate::ns;

/// The `<stream:features/>` element sent by the server after each stream
/// header; the subset this client negotiates on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamFeatures {
    /// Whether `<starttls/>` was offered, and whether it was required.
    pub starttls: Option<RequiredStartTls>,
    /// The SASL mechanism names offered.
    pub sasl_mechanisms: Vec<String>,
    /// Whether resource binding was offered.
    pub bind: bool,
}

/// The starttls feature offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequiredStartTls {
    /// The server refuses to proceed without TLS.
    pub required: bool,
}

impl StreamFeatures {
    /// Whether the stream can be upgraded with `<starttls/>`.
    pub fn can_starttls(&self) -> bool {
        self.starttls.is_some()
    }
}

impl TryFrom<Element> for StreamFeatures {
    type Error = Error;

    fn try_from(elem: Element) -> Result<StreamFeatures, Error> {
        let elem = crate::util::check_element(elem, "features", ns::STREAM)?;
        let mut features = StreamFeatures::default();
        if let Some(starttls) = elem.get_child("starttls", ns::TLS) {
            features.starttls = Some(RequiredStartTls {
                required: starttls.has_child("required", ns::TLS),
            });
        }
        if let Some(mechanisms) = elem.get_child("mechanisms", ns::SASL) {
            for mechanism in mechanisms.children() {
                if mechanism.is("mechanism", ns::SASL) {
                    features.sasl_mechanisms.push(mechanism.text());
                }
            }
        }
        features.bind = elem.has_child("bind", ns::BIND);
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let elem: Element = "<stream:features xmlns:stream='http://etherx.jabber.org/streams'>\
             <starttls xmlns='urn:ietf:params:xml:ns:xmpp-tls'><required/></starttls>\
             <mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>\
             <mechanism>SCRAM-SHA-1</mechanism><mechanism>PLAIN</mechanism></mechanisms>\
             </stream:features>"
            .parse()
            .unwrap();
        let features = StreamFeatures::try_from(elem).unwrap();
        assert!(features.can_starttls());
        assert!(features.starttls.unwrap().required);
        assert_eq!(features.sasl_mechanisms, vec!["SCRAM-SHA-1", "PLAIN"]);
        assert!(!features.bind);
    }

    #[test]
    fn test_bind_only() {
        let elem: Element = "<stream:features xmlns:stream='http://etherx.jabber.org/streams'>\
             <bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'/></stream:features>"
            .parse()
            .unwrap();
        let features = StreamFeatures::try_from(elem).unwrap();
        assert!(features.bind);
        assert!(!features.can_starttls());
    }
}
