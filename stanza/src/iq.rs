// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use jid::Jid;

use crate::element::Element;
use crate::error::Error;
use crate::ns;
use crate::stanza_error::StanzaError;

/// Implemented by payloads going into an `<iq type='get'/>`.
pub trait IqGetPayload: TryFrom<Element> + Into<Element> {}
/// Implemented by payloads going into an `<iq type='set'/>`.
pub trait IqSetPayload: TryFrom<Element> + Into<Element> {}
/// Implemented by payloads coming back in an `<iq type='result'/>`.
pub trait IqResultPayload: TryFrom<Element> + Into<Element> {}

/// The payload of an IQ stanza, determined by its `type` attribute.
#[derive(Debug, Clone)]
pub enum IqType {
    /// `<iq type='get'/>`: a request for information.
    Get(Element),
    /// `<iq type='set'/>`: a request changing state.
    Set(Element),
    /// `<iq type='result'/>`: the answer to a get or set.
    Result(Option<Element>),
    /// `<iq type='error'/>`: the request failed.
    Error(StanzaError),
}

impl IqType {
    fn type_attr(&self) -> &'static str {
        match self {
            IqType::Get(_) => "get",
            IqType::Set(_) => "set",
            IqType::Result(_) => "result",
            IqType::Error(_) => "error",
        }
    }
}

/// A request/response stanza with a correlation id.
#[derive(Debug, Clone)]
pub struct Iq {
    /// The sender.
    pub from: Option<Jid>,
    /// The recipient; absent means the user's own server/account.
    pub to: Option<Jid>,
    /// The correlation id.  Always present on requests we emit; the
    /// specification makes it mandatory but some servers omit it on
    /// pushes, so it stays optional here.
    pub id: Option<String>,
    /// The typed payload.
    pub payload: IqType,
}

impl Iq {
    /// Creates a `get` request.
    pub fn from_get<S: Into<String>, P: IqGetPayload>(id: S, payload: P) -> Iq {
        Iq {
            from: None,
            to: None,
            id: Some(id.into()),
            payload: IqType::Get(payload.into()),
        }
    }

    /// Creates a `set` request.
    pub fn from_set<S: Into<String>, P: IqSetPayload>(id: S, payload: P) -> Iq {
        Iq {
            from: None,
            to: None,
            id: Some(id.into()),
            payload: IqType::Set(payload.into()),
        }
    }

    /// Creates an empty `result` answering the given id.
    pub fn empty_result<S: Into<String>>(to: Option<Jid>, id: S) -> Iq {
        Iq {
            from: None,
            to,
            id: Some(id.into()),
            payload: IqType::Result(None),
        }
    }

    /// Creates a `result` carrying a payload.
    pub fn from_result<S: Into<String>, P: IqResultPayload>(id: S, payload: Option<P>) -> Iq {
        Iq {
            from: None,
            to: None,
            id: Some(id.into()),
            payload: IqType::Result(payload.map(Into::into)),
        }
    }

    /// Creates an `error` answering the given id.
    pub fn from_error<S: Into<String>>(id: S, error: StanzaError) -> Iq {
        Iq {
            from: None,
            to: None,
            id: Some(id.into()),
            payload: IqType::Error(error),
        }
    }

    /// Sets the recipient.
    pub fn with_to(mut self, to: Jid) -> Iq {
        self.to = Some(to);
        self
    }

    /// Sets the sender.
    pub fn with_from(mut self, from: Jid) -> Iq {
        self.from = Some(from);
        self
    }
}

impl TryFrom<Element> for Iq {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Iq, Error> {
        let mut elem = crate::util::check_element(elem, "iq", ns::JABBER_CLIENT)?;
        let from = get_attr!(elem, "from", Option);
        let to = get_attr!(elem, "to", Option);
        let id: Option<String> = elem.attr("id").map(String::from);
        let type_ = match elem.attr("type") {
            Some(type_) => type_.to_owned(),
            None => return Err(Error::ParseError("Iq element requires a 'type' attribute.")),
        };

        let error_payload = elem.take_child("error", ns::JABBER_CLIENT);
        let first_child = {
            let mut children = elem.children();
            children.next().cloned()
        };

        let payload = match type_.as_str() {
            "get" => IqType::Get(
                first_child.ok_or(Error::ParseError("Iq get missing a payload element."))?,
            ),
            "set" => IqType::Set(
                first_child.ok_or(Error::ParseError("Iq set missing a payload element."))?,
            ),
            "result" => IqType::Result(first_child),
            "error" => IqType::Error(
                error_payload
                    .map(StanzaError::try_from)
                    .transpose()
                    .map_err(Error::hide_type_mismatch)?
                    .ok_or(Error::ParseError("Iq error missing an error element."))?,
            ),
            _ => return Err(Error::ParseError("Unknown value for 'type' attribute.")),
        };

        Ok(Iq {
            from,
            to,
            id,
            payload,
        })
    }
}

impl From<Iq> for Element {
    fn from(iq: Iq) -> Element {
        let mut elem = Element::builder("iq", ns::JABBER_CLIENT)
            .attr("from", iq.from)
            .attr("to", iq.to)
            .attr("id", iq.id)
            .attr("type", iq.payload.type_attr())
            .build();
        match iq.payload {
            IqType::Get(payload) | IqType::Set(payload) => {
                elem.append_child(payload);
            }
            IqType::Result(Some(payload)) => {
                elem.append_child(payload);
            }
            IqType::Result(None) => (),
            IqType::Error(error) => {
                elem.append_child(error.into());
            }
        }
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ping::Ping;
    use crate::stanza_error::{DefinedCondition, ErrorType};

    #[test]
    fn test_get_roundtrip() {
        let iq = Iq::from_get("ping-1", Ping).with_to("component.example.com".parse().unwrap());
        let elem: Element = iq.into();
        assert_eq!(elem.attr("type"), Some("get"));
        assert_eq!(elem.attr("id"), Some("ping-1"));
        let iq = Iq::try_from(elem).unwrap();
        match iq.payload {
            IqType::Get(payload) => assert!(payload.is("ping", ns::PING)),
            _ => panic!(),
        }
    }

    #[test]
    fn test_empty_result() {
        let elem: Element = "<iq xmlns='jabber:client' type='result' id='a'/>".parse().unwrap();
        let iq = Iq::try_from(elem).unwrap();
        assert!(matches!(iq.payload, IqType::Result(None)));
    }

    #[test]
    fn test_error() {
        let elem: Element = "<iq xmlns='jabber:client' type='error' id='b' from='a@b'>\
             <query xmlns='jabber:iq:version'/>\
             <error type='cancel'><service-unavailable xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/></error>\
             </iq>"
            .parse()
            .unwrap();
        let iq = Iq::try_from(elem).unwrap();
        match iq.payload {
            IqType::Error(error) => {
                assert_eq!(error.type_, ErrorType::Cancel);
                assert_eq!(
                    error.defined_condition,
                    DefinedCondition::ServiceUnavailable
                );
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_missing_type() {
        let elem: Element = "<iq xmlns='jabber:client' id='c'/>".parse().unwrap();
        assert!(Iq::try_from(elem).is_err());
    }
}
