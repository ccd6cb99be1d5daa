// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use jid::BareJid;

use super::user::{Affiliation, Role};
use crate::element::Element;
use crate::error::Error;
use crate::iq::{IqGetPayload, IqResultPayload, IqSetPayload};
use crate::ns;

/// A `muc#admin` query changing or listing occupant state: kicks and role
/// changes address occupants by nick, bans and affiliation changes by bare
/// JID.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MucAdminQuery {
    /// The items to change or the listed items.
    pub items: Vec<AdminItem>,
}

/// One item of a [`MucAdminQuery`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdminItem {
    /// The target's bare JID, for affiliation changes.
    pub jid: Option<BareJid>,
    /// The target's nick, for role changes.
    pub nick: Option<String>,
    /// The affiliation to grant.
    pub affiliation: Option<Affiliation>,
    /// The role to grant.
    pub role: Option<Role>,
    /// Why the change is made.
    pub reason: Option<String>,
}

impl MucAdminQuery {
    /// A single-item query.
    pub fn single(item: AdminItem) -> MucAdminQuery {
        MucAdminQuery { items: vec![item] }
    }
}

impl IqGetPayload for MucAdminQuery {}
impl IqSetPayload for MucAdminQuery {}
impl IqResultPayload for MucAdminQuery {}

impl TryFrom<Element> for MucAdminQuery {
    type Error = Error;

    fn try_from(elem: Element) -> Result<MucAdminQuery, Error> {
        let elem = crate::util::check_element(elem, "query", ns::MUC_ADMIN)?;
        let mut items = Vec::new();
        for child in elem.children() {
            if !child.is("item", ns::MUC_ADMIN) {
                continue;
            }
            items.push(AdminItem {
                jid: get_attr!(child, "jid", Option),
                nick: child.attr("nick").map(String::from),
                affiliation: get_attr!(child, "affiliation", Option),
                role: get_attr!(child, "role", Option),
                reason: child.get_child("reason", ns::MUC_ADMIN).map(Element::text),
            });
        }
        Ok(MucAdminQuery { items })
    }
}

impl From<MucAdminQuery> for Element {
    fn from(query: MucAdminQuery) -> Element {
        let mut elem = Element::bare("query", ns::MUC_ADMIN);
        for item in query.items {
            let mut child = Element::builder("item", ns::MUC_ADMIN)
                .attr("jid", item.jid)
                .attr("nick", item.nick)
                .attr("affiliation", item.affiliation)
                .attr("role", item.role)
                .build();
            if let Some(reason) = item.reason {
                child
                    .append_child(Element::bare("reason", ns::MUC_ADMIN))
                    .append_text_node(reason);
            }
            elem.append_child(child);
        }
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kick() {
        let query = MucAdminQuery::single(AdminItem {
            nick: Some("pistol".to_owned()),
            role: Some(Role::None),
            reason: Some("Avaunt".to_owned()),
            ..AdminItem::default()
        });
        let elem: Element = query.clone().into();
        let item = elem.get_child("item", ns::MUC_ADMIN).unwrap();
        assert_eq!(item.attr("nick"), Some("pistol"));
        assert_eq!(item.attr("role"), Some("none"));
        assert_eq!(MucAdminQuery::try_from(elem).unwrap(), query);
    }

    #[test]
    fn test_ban() {
        let query = MucAdminQuery::single(AdminItem {
            jid: Some("earlofcambridge@shakespeare.lit".parse().unwrap()),
            affiliation: Some(Affiliation::Outcast),
            ..AdminItem::default()
        });
        let elem: Element = query.into();
        let item = elem.get_child("item", ns::MUC_ADMIN).unwrap();
        assert_eq!(item.attr("affiliation"), Some("outcast"));
    }
}
