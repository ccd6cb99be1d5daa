// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use jid::FullJid;

use crate::element::Element;
use crate::error::Error;
use crate::iq::{IqResultPayload, IqSetPayload};
use crate::ns;

/// A resource binding request, with an optional preferred resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindQuery {
    /// The resource this client prefers; the server may override it.
    pub resource: Option<String>,
}

impl BindQuery {
    /// Creates a binding request.
    pub fn new(resource: Option<String>) -> BindQuery {
        BindQuery { resource }
    }
}

impl IqSetPayload for BindQuery {}

impl TryFrom<Element> for BindQuery {
    type Error = Error;

    fn try_from(elem: Element) -> Result<BindQuery, Error> {
        let elem = crate::util::check_element(elem, "bind", ns::BIND)?;
        let resource = elem.get_child("resource", ns::BIND).map(Element::text);
        Ok(BindQuery { resource })
    }
}

impl From<BindQuery> for Element {
    fn from(bind: BindQuery) -> Element {
        let mut elem = Element::bare("bind", ns::BIND);
        if let Some(resource) = bind.resource {
            elem.append_child(Element::bare("resource", ns::BIND))
                .append_text_node(resource);
        }
        elem
    }
}

/// The server's answer to a binding request: the full JID this session is
/// now addressed as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindResponse {
    /// The bound full JID.
    pub jid: FullJid,
}

impl IqResultPayload for BindResponse {}

impl TryFrom<Element> for BindResponse {
    type Error = Error;

    fn try_from(elem: Element) -> Result<BindResponse, Error> {
        let elem = crate::util::check_element(elem, "bind", ns::BIND)?;
        let jid = elem
            .get_child("jid", ns::BIND)
            .map(Element::text)
            .ok_or(Error::ParseError("Missing jid in bind response."))?;
        Ok(BindResponse { jid: jid.parse()? })
    }
}

impl From<BindResponse> for Element {
    fn from(bind: BindResponse) -> Element {
        let mut elem = Element::bare("bind", ns::BIND);
        elem.append_child(Element::bare("jid", ns::BIND))
            .append_text_node(bind.jid.to_string());
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_with_resource() {
        let elem: Element = BindQuery::new(Some("console".to_owned())).into();
        assert_eq!(
            elem.get_child("resource", ns::BIND).unwrap().text(),
            "console"
        );
    }

    #[test]
    fn test_response() {
        let elem: Element = "<bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'>\
             <jid>juliet@example.com/balcony</jid></bind>"
            .parse()
            .unwrap();
        let response = BindResponse::try_from(elem).unwrap();
        assert_eq!(response.jid.to_string(), "juliet@example.com/balcony");
    }
}
