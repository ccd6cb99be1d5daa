// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::element::Element;
use crate::error::Error;
use crate::ns;

/// A `<request/>` asking the recipient to acknowledge delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request;

impl TryFrom<Element> for Request {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Request, Error> {
        crate::util::check_element(elem, "request", ns::RECEIPTS)?;
        Ok(Request)
    }
}

impl From<Request> for Element {
    fn from(_: Request) -> Element {
        Element::bare("request", ns::RECEIPTS)
    }
}

/// A `<received/>` acknowledging the message with the given id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    /// Id of the message being acknowledged.
    pub id: String,
}

impl TryFrom<Element> for Received {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Received, Error> {
        let elem = crate::util::check_element(elem, "received", ns::RECEIPTS)?;
        let id = get_attr!(elem, "id", Required);
        Ok(Received { id })
    }
}

impl From<Received> for Element {
    fn from(received: Received) -> Element {
        Element::builder("received", ns::RECEIPTS)
            .attr("id", received.id)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let elem: Element = "<received xmlns='urn:xmpp:receipts' id='msg-1'/>"
            .parse()
            .unwrap();
        let received = Received::try_from(elem).unwrap();
        assert_eq!(received.id, "msg-1");
        let elem: Element = received.into();
        assert_eq!(elem.attr("id"), Some("msg-1"));
    }

    #[test]
    fn test_missing_id() {
        let elem: Element = "<received xmlns='urn:xmpp:receipts'/>".parse().unwrap();
        assert!(Received::try_from(elem).is_err());
    }
}
