// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use jid::Jid;

use crate::data_forms::DataForm;
use crate::element::Element;
use crate::error::Error;
use crate::iq::{IqGetPayload, IqResultPayload};
use crate::ns;

/// A `disco#info` query, optionally scoped to a node (used to verify
/// entity-capability hashes).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiscoInfoQuery {
    /// The node to query.
    pub node: Option<String>,
}

impl IqGetPayload for DiscoInfoQuery {}

impl TryFrom<Element> for DiscoInfoQuery {
    type Error = Error;

    fn try_from(elem: Element) -> Result<DiscoInfoQuery, Error> {
        let elem = crate::util::check_element(elem, "query", ns::DISCO_INFO)?;
        Ok(DiscoInfoQuery {
            node: elem.attr("node").map(String::from),
        })
    }
}

impl From<DiscoInfoQuery> for Element {
    fn from(query: DiscoInfoQuery) -> Element {
        Element::builder("query", ns::DISCO_INFO)
            .attr("node", query.node)
            .build()
    }
}

/// An identity advertised in a `disco#info` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The category, e.g. `client`.
    pub category: String,
    /// The type within the category, e.g. `console`.
    pub type_: String,
    /// Optional language of the name.
    pub lang: Option<String>,
    /// Optional human-readable name.
    pub name: Option<String>,
}

impl Identity {
    /// Creates an identity without language or name.
    pub fn new<C: Into<String>, T: Into<String>>(category: C, type_: T) -> Identity {
        Identity {
            category: category.into(),
            type_: type_.into(),
            lang: None,
            name: None,
        }
    }
}

impl TryFrom<Element> for Identity {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Identity, Error> {
        let elem = crate::util::check_element(elem, "identity", ns::DISCO_INFO)?;
        let category = get_attr!(elem, "category", Required);
        let type_ = get_attr!(elem, "type", Required);
        let lang = elem.attr("xml:lang").map(String::from);
        let name = elem.attr("name").map(String::from);
        Ok(Identity {
            category,
            type_,
            lang,
            name,
        })
    }
}

impl From<Identity> for Element {
    fn from(identity: Identity) -> Element {
        Element::builder("identity", ns::DISCO_INFO)
            .attr("category", identity.category)
            .attr("type", identity.type_)
            .attr("xml:lang", identity.lang)
            .attr("name", identity.name)
            .build()
    }
}

/// A feature variable advertised in a `disco#info` result.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Feature {
    /// The feature namespace.
    pub var: String,
}

impl Feature {
    /// Creates a feature.
    pub fn new<S: Into<String>>(var: S) -> Feature {
        Feature { var: var.into() }
    }
}

/// A `disco#info` result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiscoInfoResult {
    /// The node this result describes.
    pub node: Option<String>,
    /// The advertised identities.
    pub identities: Vec<Identity>,
    /// The advertised features.
    pub features: Vec<Feature>,
    /// Service-info extension forms.
    pub extensions: Vec<DataForm>,
}

impl IqResultPayload for DiscoInfoResult {}

impl DiscoInfoResult {
    /// Whether the given feature var is advertised.
    pub fn has_feature(&self, var: &str) -> bool {
        self.features.iter().any(|feature| feature.var == var)
    }
}

impl TryFrom<Element> for DiscoInfoResult {
    type Error = Error;

    fn try_from(elem: Element) -> Result<DiscoInfoResult, Error> {
        let elem = crate::util::check_element(elem, "query", ns::DISCO_INFO)?;
        let node = elem.attr("node").map(String::from);
        let mut identities = Vec::new();
        let mut features = Vec::new();
        let mut extensions = Vec::new();
        for child in elem.children() {
            if child.is("identity", ns::DISCO_INFO) {
                identities
                    .push(Identity::try_from(child.clone()).map_err(Error::hide_type_mismatch)?);
            } else if child.is("feature", ns::DISCO_INFO) {
                match child.attr("var") {
                    Some(var) => features.push(Feature::new(var)),
                    None => {
                        return Err(Error::ParseError(
                            "Required attribute 'var' missing on feature.",
                        ))
                    }
                }
            } else if child.is("x", ns::DATA_FORMS) {
                extensions
                    .push(DataForm::try_from(child.clone()).map_err(Error::hide_type_mismatch)?);
            }
        }
        Ok(DiscoInfoResult {
            node,
            identities,
            features,
            extensions,
        })
    }
}

impl From<DiscoInfoResult> for Element {
    fn from(result: DiscoInfoResult) -> Element {
        let mut elem = Element::builder("query", ns::DISCO_INFO)
            .attr("node", result.node)
            .build();
        for identity in result.identities {
            elem.append_child(identity.into());
        }
        for feature in result.features {
            elem.append_child(
                Element::builder("feature", ns::DISCO_INFO)
                    .attr("var", feature.var)
                    .build(),
            );
        }
        for extension in result.extensions {
            elem.append_child(extension.into());
        }
        elem
    }
}

/// A `disco#items` query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiscoItemsQuery {
    /// The node to list.
    pub node: Option<String>,
}

impl IqGetPayload for DiscoItemsQuery {}

impl TryFrom<Element> for DiscoItemsQuery {
    type Error = Error;

    fn try_from(elem: Element) -> Result<DiscoItemsQuery, Error> {
        let elem = crate::util::check_element(elem, "query", ns::DISCO_ITEMS)?;
        Ok(DiscoItemsQuery {
            node: elem.attr("node").map(String::from),
        })
    }
}

impl From<DiscoItemsQuery> for Element {
    fn from(query: DiscoItemsQuery) -> Element {
        Element::builder("query", ns::DISCO_ITEMS)
            .attr("node", query.node)
            .build()
    }
}

/// One item of a `disco#items` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoItem {
    /// The item address.
    pub jid: Jid,
    /// Optional node within the entity.
    pub node: Option<String>,
    /// Optional display name.
    pub name: Option<String>,
}

/// A `disco#items` result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiscoItemsResult {
    /// The node this result lists.
    pub node: Option<String>,
    /// The items.
    pub items: Vec<DiscoItem>,
}

impl IqResultPayload for DiscoItemsResult {}

impl TryFrom<Element> for DiscoItemsResult {
    type Error = Error;

    fn try_from(elem: Element) -> Result<DiscoItemsResult, Error> {
        let elem = crate::util::check_element(elem, "query", ns::DISCO_ITEMS)?;
        let node = elem.attr("node").map(String::from);
        let mut items = Vec::new();
        for child in elem.children() {
            if child.is("item", ns::DISCO_ITEMS) {
                items.push(DiscoItem {
                    jid: get_attr!(child, "jid", Required),
                    node: child.attr("node").map(String::from),
                    name: child.attr("name").map(String::from),
                });
            }
        }
        Ok(DiscoItemsResult { node, items })
    }
}

impl From<DiscoItemsResult> for Element {
    fn from(result: DiscoItemsResult) -> Element {
        let mut elem = Element::builder("query", ns::DISCO_ITEMS)
            .attr("node", result.node)
            .build();
        for item in result.items {
            elem.append_child(
                Element::builder("item", ns::DISCO_ITEMS)
                    .attr("jid", item.jid)
                    .attr("node", item.node)
                    .attr("name", item.name)
                    .build(),
            );
        }
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_info() {
        let elem: Element = "<query xmlns='http://jabber.org/protocol/disco#info'>\
             <identity category='client' type='pc'/>\
             <feature var='http://jabber.org/protocol/disco#info'/>\
             <feature var='http://jabber.org/protocol/muc'/>\
             </query>"
            .parse()
            .unwrap();
        let info = DiscoInfoResult::try_from(elem).unwrap();
        assert_eq!(info.identities.len(), 1);
        assert!(info.has_feature(ns::MUC));
        assert!(!info.has_feature(ns::CAPS));
    }

    #[test]
    fn test_feature_missing_var() {
        let elem: Element =
            "<query xmlns='http://jabber.org/protocol/disco#info'><feature/></query>"
                .parse()
                .unwrap();
        assert!(DiscoInfoResult::try_from(elem).is_err());
    }

    #[test]
    fn test_items_roundtrip() {
        let result = DiscoItemsResult {
            node: Some("http://jabber.org/protocol/commands".to_owned()),
            items: vec![DiscoItem {
                jid: "mine@ex.com".parse().unwrap(),
                node: Some("http://jabber.org/protocol/rc#set-status".to_owned()),
                name: Some("Change client status".to_owned()),
            }],
        };
        let elem: Element = result.clone().into();
        assert_eq!(DiscoItemsResult::try_from(elem).unwrap(), result);
    }
}
