// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use jid::BareJid;

use crate::element::Element;
use crate::error::Error;
use crate::iq::{IqGetPayload, IqResultPayload, IqSetPayload};
use crate::ns;

generate_attribute!(
    /// The state of your mutual subscription with a contact.
    Subscription, "subscription", {
        /// The user doesn't have any subscription to this contact's
        /// presence, and neither does this contact.
        None => "none",

        /// Only this contact has a subscription with you, not the opposite.
        From => "from",

        /// Only you have a subscription with this contact, not the opposite.
        To => "to",

        /// Both you and your contact are subscribed to each other's
        /// presence.
        Both => "both",

        /// In a roster set, this asks the server to remove this contact
        /// item from your roster.
        Remove => "remove",
    }, Default = None
);

generate_attribute!(
    /// The sub-state of subscription with a contact.
    Ask, "ask", {
        /// Pending out sub-state: a subscribe request was sent.
        Subscribe => "subscribe",
    }
);

/// Contact from the user's contact list.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// JID of this contact.
    pub jid: BareJid,

    /// Name of this contact.
    pub name: Option<String>,

    /// Subscription status of this contact.
    pub subscription: Subscription,

    /// Indicates "Pending Out" sub-states for this contact.
    pub ask: Option<Ask>,

    /// Groups this contact is part of.
    pub groups: Vec<String>,
}

impl Item {
    /// Creates a roster item for a roster set.
    pub fn new(jid: BareJid, name: Option<String>, group: Option<String>) -> Item {
        Item {
            jid,
            name,
            subscription: Subscription::None,
            ask: None,
            groups: group.into_iter().collect(),
        }
    }

    /// Creates the item of a removal roster set.
    pub fn remove(jid: BareJid) -> Item {
        Item {
            jid,
            name: None,
            subscription: Subscription::Remove,
            ask: None,
            groups: Vec::new(),
        }
    }
}

impl TryFrom<Element> for Item {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Item, Error> {
        let elem = crate::util::check_element(elem, "item", ns::ROSTER)?;
        let jid = get_attr!(elem, "jid", Required);
        let name = elem.attr("name").map(String::from);
        let subscription = get_attr!(elem, "subscription", Default);
        let ask = get_attr!(elem, "ask", Option);
        let mut groups = Vec::new();
        for child in elem.children() {
            if child.is("group", ns::ROSTER) {
                groups.push(child.text());
            }
        }
        Ok(Item {
            jid,
            name,
            subscription,
            ask,
            groups,
        })
    }
}

impl From<Item> for Element {
    fn from(item: Item) -> Element {
        let mut elem = Element::builder("item", ns::ROSTER)
            .attr("jid", item.jid)
            .attr("name", item.name)
            .attr(
                "subscription",
                match item.subscription {
                    Subscription::None => None,
                    subscription => Some(subscription.to_string()),
                },
            )
            .attr("ask", item.ask)
            .build();
        for group in item.groups {
            elem.append_child(Element::bare("group", ns::ROSTER))
                .append_text_node(group);
        }
        elem
    }
}

/// The contact list of the user.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Roster {
    /// Version of the contact list.
    ///
    /// This is an opaque string that should only be sent back to the server
    /// on a new connection, if this client is storing the contact list
    /// between connections.
    pub ver: Option<String>,

    /// List of the contacts of the user.
    pub items: Vec<Item>,
}

impl IqGetPayload for Roster {}
impl IqSetPayload for Roster {}
impl IqResultPayload for Roster {}

impl TryFrom<Element> for Roster {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Roster, Error> {
        let elem = crate::util::check_element(elem, "query", ns::ROSTER)?;
        let ver = elem.attr("ver").map(String::from);
        let mut items = Vec::new();
        for child in elem.children() {
            if child.is("item", ns::ROSTER) {
                items.push(Item::try_from(child.clone()).map_err(Error::hide_type_mismatch)?);
            }
        }
        Ok(Roster { ver, items })
    }
}

impl From<Roster> for Element {
    fn from(roster: Roster) -> Element {
        let mut elem = Element::builder("query", ns::ROSTER)
            .attr("ver", roster.ver)
            .build();
        for item in roster.items {
            elem.append_child(item.into());
        }
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get() {
        let elem: Element = "<query xmlns='jabber:iq:roster'/>".parse().unwrap();
        let roster = Roster::try_from(elem).unwrap();
        assert!(roster.ver.is_none());
        assert!(roster.items.is_empty());
    }

    #[test]
    fn test_result() {
        let elem: Element = "<query xmlns='jabber:iq:roster' ver='ver11'>\
             <item jid='romeo@example.net' name='Romeo' subscription='both'><group>Friends</group></item>\
             <item jid='mercutio@example.com' name='Mercutio' subscription='from'/>\
             <item jid='contact@example.org' subscription='none' ask='subscribe' name='MyContact'/>\
             </query>"
            .parse()
            .unwrap();
        let roster = Roster::try_from(elem).unwrap();
        assert_eq!(roster.ver.as_deref(), Some("ver11"));
        assert_eq!(roster.items.len(), 3);
        assert_eq!(
            roster.items[0].jid,
            BareJid::new("romeo@example.net").unwrap()
        );
        assert_eq!(roster.items[0].subscription, Subscription::Both);
        assert_eq!(roster.items[0].ask, None);
        assert_eq!(roster.items[0].groups, vec!["Friends".to_owned()]);
        assert_eq!(roster.items[2].subscription, Subscription::None);
        assert_eq!(roster.items[2].ask, Some(Ask::Subscribe));
    }

    #[test]
    fn test_remove() {
        let elem: Element = "<query xmlns='jabber:iq:roster'>\
             <item jid='nurse@example.com' subscription='remove'/></query>"
            .parse()
            .unwrap();
        let roster = Roster::try_from(elem).unwrap();
        assert_eq!(roster.items[0].subscription, Subscription::Remove);
    }

    #[test]
    fn test_item_missing_jid() {
        let elem: Element = "<query xmlns='jabber:iq:roster'><item/></query>"
            .parse()
            .unwrap();
        assert!(Roster::try_from(elem).is_err());
    }

    #[test]
    fn test_serialize_set() {
        let item = Item::new(
            BareJid::new("alice@example.com").unwrap(),
            Some("Alice".to_owned()),
            Some("Friends".to_owned()),
        );
        let elem: Element = Roster {
            ver: None,
            items: vec![item],
        }
        .into();
        let item = elem.get_child("item", ns::ROSTER).unwrap();
        assert_eq!(item.attr("jid"), Some("alice@example.com"));
        assert_eq!(item.attr("subscription"), None);
        assert_eq!(item.get_child("group", ns::ROSTER).unwrap().text(), "Friends");
    }
}
