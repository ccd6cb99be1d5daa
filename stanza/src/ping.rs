// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::element::Element;
use crate::error::Error;
use crate::iq::IqGetPayload;
use crate::ns;

/// A `<ping/>` keep-alive request; the matching result is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping;

impl IqGetPayload for Ping {}

impl TryFrom<Element> for Ping {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Ping, Error> {
        crate::util::check_element(elem, "ping", ns::PING)?;
        Ok(Ping)
    }
}

impl From<Ping> for Element {
    fn from(_: Ping) -> Element {
        Element::bare("ping", ns::PING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let elem: Element = "<ping xmlns='urn:xmpp:ping'/>".parse().unwrap();
        Ping::try_from(elem).unwrap();
        let elem: Element = Ping.into();
        assert!(elem.is("ping", ns::PING));
    }
}
