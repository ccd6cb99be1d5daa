// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use jid::Jid;

use crate::element::Element;
use crate::error::Error;
use crate::ns;

generate_attribute!(
    /// The action the sender should take on receiving this error.
    ErrorType, "type", {
        /// Retry after providing credentials.
        Auth => "auth",

        /// Do not retry, the error is unrecoverable.
        Cancel => "cancel",

        /// Proceed, the condition was only a warning.
        Continue => "continue",

        /// Retry after changing the data sent.
        Modify => "modify",

        /// Retry after waiting.
        Wait => "wait",
    }, Default = Cancel
);

generate_attribute!(
    /// The RFC 6120 §8.3.3 defined condition carried in the error.
    DefinedCondition, "condition", {
        /// The sender has sent a stanza containing XML that does not conform
        /// to the appropriate schema.
        BadRequest => "bad-request",

        /// Access cannot be granted because an existing resource exists with
        /// the same name or address.
        Conflict => "conflict",

        /// The feature represented in the XML stanza is not implemented by
        /// the intended recipient or an intermediate server.
        FeatureNotImplemented => "feature-not-implemented",

        /// The requesting entity does not possess the necessary permissions.
        Forbidden => "forbidden",

        /// The recipient or server can no longer be contacted at this
        /// address.
        Gone => "gone",

        /// The server has experienced a misconfiguration or other internal
        /// error.
        InternalServerError => "internal-server-error",

        /// The addressed JID or item requested cannot be found.
        ItemNotFound => "item-not-found",

        /// The stanza provided a malformed JID.
        JidMalformed => "jid-malformed",

        /// The recipient or server understands the request but refuses it.
        NotAcceptable => "not-acceptable",

        /// The recipient or server does not allow any entity to perform the
        /// action.
        NotAllowed => "not-allowed",

        /// The sender needs to provide credentials before being allowed to
        /// perform the action.
        NotAuthorized => "not-authorized",

        /// The entity has violated some local service policy.
        PolicyViolation => "policy-violation",

        /// The intended recipient is temporarily unavailable.
        RecipientUnavailable => "recipient-unavailable",

        /// The recipient or server is redirecting requests for this
        /// information to another entity.
        Redirect => "redirect",

        /// The requesting entity is not authorized to access the requested
        /// service because registration is required.
        RegistrationRequired => "registration-required",

        /// A remote server or service specified as part or all of the JID of
        /// the intended recipient does not exist.
        RemoteServerNotFound => "remote-server-not-found",

        /// A remote server could not be contacted within a reasonable amount
        /// of time.
        RemoteServerTimeout => "remote-server-timeout",

        /// The server or recipient lacks the system resources necessary to
        /// service the request.
        ResourceConstraint => "resource-constraint",

        /// The server or recipient does not currently provide the requested
        /// service.
        ServiceUnavailable => "service-unavailable",

        /// The requesting entity is not authorized to access the requested
        /// service because a subscription is required.
        SubscriptionRequired => "subscription-required",

        /// The error condition is not one of those defined by the other
        /// conditions in this list.
        UndefinedCondition => "undefined-condition",

        /// The recipient or server understood the request but was not
        /// expecting it at this time.
        UnexpectedRequest => "unexpected-request",
    }, Default = UndefinedCondition
);

/// The `<error/>` child of a `type='error'` stanza.
#[derive(Debug, Clone, PartialEq)]
pub struct StanzaError {
    /// The action the sender should take.
    pub type_: ErrorType,
    /// The entity which generated the error, when not the addressed one.
    pub by: Option<Jid>,
    /// The defined condition.
    pub defined_condition: DefinedCondition,
    /// Optional human-readable description.
    pub text: Option<String>,
    /// Legacy numeric code attribute, still emitted by MUC services for
    /// conditions like nickname conflict (409).
    pub code: Option<u16>,
}

impl StanzaError {
    /// Creates a stanza error with a condition and optional text.
    pub fn new(
        type_: ErrorType,
        defined_condition: DefinedCondition,
        text: Option<String>,
    ) -> StanzaError {
        StanzaError {
            type_,
            by: None,
            defined_condition,
            text,
            code: None,
        }
    }

    /// A one-line human-readable description, preferring the server text.
    pub fn describe(&self) -> String {
        match self.text {
            Some(ref text) => format!("{} ({})", text, self.defined_condition),
            None => self.defined_condition.to_string(),
        }
    }
}

impl TryFrom<Element> for StanzaError {
    type Error = Error;

    fn try_from(elem: Element) -> Result<StanzaError, Error> {
        let elem = crate::util::check_element(elem, "error", ns::JABBER_CLIENT)?;
        let type_ = get_attr!(elem, "type", Default);
        let by = get_attr!(elem, "by", Option);
        let code = get_attr!(elem, "code", Option);
        let mut defined_condition = DefinedCondition::default();
        let mut text = None;
        for child in elem.children() {
            if child.ns() != ns::XMPP_STANZAS {
                continue;
            }
            if child.name() == "text" {
                text = Some(child.text());
            } else if let Ok(condition) = child.name().parse() {
                defined_condition = condition;
            }
        }
        Ok(StanzaError {
            type_,
            by,
            defined_condition,
            text,
            code,
        })
    }
}

impl From<StanzaError> for Element {
    fn from(error: StanzaError) -> Element {
        let mut elem = Element::builder("error", ns::JABBER_CLIENT)
            .attr("type", error.type_)
            .attr("by", error.by)
            .attr("code", error.code)
            .build();
        elem.append_child(Element::bare(
            error.defined_condition.to_string(),
            ns::XMPP_STANZAS,
        ));
        if let Some(text) = error.text {
            let mut text_elem = Element::bare("text", ns::XMPP_STANZAS);
            text_elem.append_text_node(text);
            elem.append_child(text_elem);
        }
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let elem: Element = "<error xmlns='jabber:client' type='cancel' code='409'>\
             <conflict xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/>\
             <text xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'>That nickname is taken</text>\
             </error>"
            .parse()
            .unwrap();
        let error = StanzaError::try_from(elem).unwrap();
        assert_eq!(error.type_, ErrorType::Cancel);
        assert_eq!(error.defined_condition, DefinedCondition::Conflict);
        assert_eq!(error.code, Some(409));
        assert_eq!(error.describe(), "That nickname is taken (conflict)");
    }

    #[test]
    fn test_unknown_condition_is_undefined() {
        let elem: Element = "<error xmlns='jabber:client' type='wait'>\
             <some-future-condition xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/>\
             </error>"
            .parse()
            .unwrap();
        let error = StanzaError::try_from(elem).unwrap();
        assert_eq!(error.defined_condition, DefinedCondition::UndefinedCondition);
    }

    #[test]
    fn test_serialize() {
        let error = StanzaError::new(
            ErrorType::Cancel,
            DefinedCondition::ServiceUnavailable,
            None,
        );
        let elem: Element = error.into();
        assert!(elem.has_child("service-unavailable", ns::XMPP_STANZAS));
        assert_eq!(elem.attr("type"), Some("cancel"));
    }
}
