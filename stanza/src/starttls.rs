// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::element::Element;
use crate::error::Error;
use crate::ns;

/// A `<starttls/>` request to upgrade the stream to TLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request;

impl From<Request> for Element {
    fn from(_: Request) -> Element {
        Element::bare("starttls", ns::TLS)
    }
}

/// The server's `<proceed/>` go-ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proceed;

impl TryFrom<Element> for Proceed {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Proceed, Error> {
        crate::util::check_element(elem, "proceed", ns::TLS)?;
        Ok(Proceed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proceed() {
        let elem: Element = "<proceed xmlns='urn:ietf:params:xml:ns:xmpp-tls'/>"
            .parse()
            .unwrap();
        Proceed::try_from(elem).unwrap();
    }
}
