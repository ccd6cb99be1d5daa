// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The local view of the contact list.
//!
//! Entries live in an arena of stable indices; the buddylist is a flat,
//! lazily rebuilt view of indices ordered group by group.  Group
//! membership is a name on the entry, not a pointer, so removing either
//! side never dangles.

use std::collections::HashSet;

use jid::{BareJid, FullJid};

use causerie_stanza::muc::{Affiliation, Role};

/// Presence status of a resource (or of our own session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// No resource online.
    #[default]
    Offline,
    /// Online and available.
    Available,
    /// Free for chat.
    FreeForChat,
    /// Do not disturb.
    DoNotDisturb,
    /// Extended away.
    NotAvailable,
    /// Away.
    Away,
    /// Connected but invisible to contacts.
    Invisible,
}

impl Status {
    /// One-character form used by status lines and history files.
    pub fn to_char(self) -> char {
        match self {
            Status::Offline => '_',
            Status::Available => 'o',
            Status::FreeForChat => 'f',
            Status::DoNotDisturb => 'd',
            Status::NotAvailable => 'n',
            Status::Away => 'a',
            Status::Invisible => 'i',
        }
    }

    /// Inverse of [`Status::to_char`], case-insensitive.
    pub fn from_char(c: char) -> Option<Status> {
        Some(match c.to_ascii_lowercase() {
            '_' => Status::Offline,
            'o' => Status::Available,
            'f' => Status::FreeForChat,
            'd' => Status::DoNotDisturb,
            'n' => Status::NotAvailable,
            'a' => Status::Away,
            'i' => Status::Invisible,
            _ => return None,
        })
    }
}

/// Mutual presence subscription state, with the pending flag kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subscription {
    /// No subscription either way.
    #[default]
    None,
    /// They see our presence.
    From,
    /// We see their presence.
    To,
    /// Both directions.
    Both,
}

/// Chat-state capability of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatStateSupport {
    /// Nothing known yet; a first message will probe.
    #[default]
    Unknown,
    /// We probed and are waiting for evidence.
    Probed,
    /// The peer advertises chat states.
    Ok,
    /// The peer does not support chat states.
    Unsupported,
}

/// The chat state we last sent to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutChatState {
    /// `<active/>`
    Active,
    /// `<composing/>`
    Composing,
    /// `<paused/>`
    Paused,
}

/// Per-resource chat-state record.
#[derive(Debug, Clone, Default)]
pub struct ChatStates {
    /// Whether the peer handles chat states.
    pub support: ChatStateSupport,
    /// Last state we sent.
    pub last_sent: Option<OutChatState>,
    /// Last state we received, as the raw element name.
    pub last_rcvd: Option<String>,
}

/// PGP-related data learnt from a resource's presence.
#[derive(Debug, Clone, Default)]
pub struct PgpData {
    /// Key id the contact signs with.
    pub sign_key_id: Option<String>,
    /// Whether the last signature verified.
    pub last_sig_ok: Option<bool>,
}

/// One online resource of a contact, or one room occupant.
#[derive(Debug, Clone)]
pub struct Resource {
    /// The resource name (or occupant nick).
    pub name: String,
    /// Presence priority.
    pub priority: i8,
    /// Availability.
    pub status: Status,
    /// Free-text status message.
    pub status_msg: Option<String>,
    /// When the status last changed.
    pub updated_at: i64,
    /// Room role, when this is an occupant.
    pub role: Role,
    /// Room affiliation, when this is an occupant.
    pub affiliation: Affiliation,
    /// The occupant's real JID, when the room discloses it.
    pub real_jid: Option<FullJid>,
    /// Chat-state tracking record.
    pub chat_states: ChatStates,
    /// Entity-capability hash (base64 `ver`) advertised by this resource.
    pub caps_ver: Option<String>,
    /// PGP signature data.
    pub pgp: PgpData,
}

impl Resource {
    fn new(name: &str) -> Resource {
        Resource {
            name: name.to_owned(),
            priority: 0,
            status: Status::Offline,
            status_msg: None,
            updated_at: 0,
            role: Role::None,
            affiliation: Affiliation::None,
            real_jid: None,
            chat_states: ChatStates::default(),
            caps_ver: None,
            pgp: PgpData::default(),
        }
    }
}

/// Display flags on an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryFlags {
    /// Unread message pending.
    pub msg_pending: bool,
    /// Group folded (or buddy hidden).
    pub hidden: bool,
    /// Keep in the buddylist regardless of filters.
    pub lock: bool,
    /// Same, requested by the user.
    pub user_lock: bool,
}

/// Payload of a user (or gateway) entry.
#[derive(Debug, Clone, Default)]
pub struct UserData {
    /// Gateways/transports (no localpart in the JID) get agent type.
    pub agent: bool,
    /// Subscription state.
    pub subscription: Subscription,
    /// An outbound subscribe is pending.
    pub pending: bool,
    /// The entry is confirmed by the server roster, not a local
    /// placeholder.
    pub on_server: bool,
    /// Online resources, unordered; the current one is computed.
    pub resources: Vec<Resource>,
}

/// Print policy for room joins/leaves.
pub use crate::muc::PrintStatusPolicy;

/// Payload of a room entry.
#[derive(Debug, Clone, Default)]
pub struct RoomData {
    /// Our nickname in the room (stored even while outside).
    pub nickname: Option<String>,
    /// The room topic.
    pub topic: Option<String>,
    /// Join/leave print policy override.
    pub print_status: PrintStatusPolicy,
    /// Occupants, present only while we are inside.
    pub resources: Vec<Resource>,
}

/// The per-variant payload of a roster entry.
#[derive(Debug, Clone)]
pub enum EntryData {
    /// A chat contact or gateway.
    User(UserData),
    /// A multi-user chat room.
    Room(RoomData),
    /// A grouping container; members are entries naming this group.
    Group,
    /// A synthetic buffer, e.g. the status log.
    Special,
}

/// Bit mask used to filter entry kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMask(pub u8);

impl TypeMask {
    /// Users.
    pub const USER: TypeMask = TypeMask(1);
    /// Gateways.
    pub const AGENT: TypeMask = TypeMask(1 << 1);
    /// Rooms.
    pub const ROOM: TypeMask = TypeMask(1 << 2);
    /// Groups.
    pub const GROUP: TypeMask = TypeMask(1 << 3);
    /// Special buffers.
    pub const SPECIAL: TypeMask = TypeMask(1 << 4);
    /// Everything.
    pub const ALL: TypeMask = TypeMask(0x1f);

    /// Unions two masks.
    pub fn union(self, other: TypeMask) -> TypeMask {
        TypeMask(self.0 | other.0)
    }

    fn matches(self, entry: &Entry) -> bool {
        let bit = match &entry.data {
            EntryData::User(user) if user.agent => TypeMask::AGENT,
            EntryData::User(_) => TypeMask::USER,
            EntryData::Room(_) => TypeMask::ROOM,
            EntryData::Group => TypeMask::GROUP,
            EntryData::Special => TypeMask::SPECIAL,
        };
        self.0 & bit.0 != 0
    }
}

impl std::ops::BitOr for TypeMask {
    type Output = TypeMask;

    fn bitor(self, other: TypeMask) -> TypeMask {
        self.union(other)
    }
}

/// A roster entry.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Bare JID for users/rooms/specials; the group name for groups.
    pub jid: String,
    /// Display name.
    pub name: String,
    /// Group this entry belongs to; empty means no group.
    pub group: String,
    /// Display flags.
    pub flags: EntryFlags,
    /// Priority used to order unread-jump targets.
    pub ui_priority: i32,
    /// The variant payload.
    pub data: EntryData,
}

impl Entry {
    /// The resources, for users and rooms; empty otherwise.
    pub fn resources(&self) -> &[Resource] {
        match &self.data {
            EntryData::User(user) => &user.resources,
            EntryData::Room(room) => &room.resources,
            _ => &[],
        }
    }

    fn resources_mut(&mut self) -> Option<&mut Vec<Resource>> {
        match &mut self.data {
            EntryData::User(user) => Some(&mut user.resources),
            EntryData::Room(room) => Some(&mut room.resources),
            _ => None,
        }
    }

    /// The highest-priority resource, ties broken by most recent update.
    pub fn current_resource(&self) -> Option<&Resource> {
        self.resources()
            .iter()
            .max_by_key(|resource| (resource.priority, resource.updated_at))
    }

    /// Effective status: the current resource's, or offline without any.
    pub fn status(&self) -> Status {
        self.current_resource()
            .map(|resource| resource.status)
            .unwrap_or(Status::Offline)
    }

    /// A room entry with any resource means "we are inside".
    pub fn inside_room(&self) -> bool {
        matches!(&self.data, EntryData::Room(room) if !room.resources.is_empty())
    }
}

/// Stable index of an entry.
pub type EntryKey = usize;

/// The identifier of the synthetic status buffer.
pub const STATUS_BUFFER_ID: &str = "[status]";

/// The contact-list model.
pub struct Roster {
    entries: Vec<Option<Entry>>,
    /// Flat display view: group headers followed by their members.
    buddylist: Vec<EntryKey>,
    buddylist_dirty: bool,
    /// Cursor into the buddylist.
    pub current: Option<EntryKey>,
    /// Previous cursor, for jump-back.
    pub alternate: Option<EntryKey>,
    /// Hide contacts with no online resource.
    pub hide_offline: bool,
    /// Bare JIDs with unread messages not (yet) on the roster; applied
    /// when the entry appears.
    unread_jids: HashSet<String>,
}

fn bare_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

impl Default for Roster {
    fn default() -> Self {
        Roster::new()
    }
}

impl Roster {
    /// Creates a roster holding only the status buffer.
    pub fn new() -> Roster {
        let mut roster = Roster {
            entries: Vec::new(),
            buddylist: Vec::new(),
            buddylist_dirty: true,
            current: None,
            alternate: None,
            hide_offline: false,
            unread_jids: HashSet::new(),
        };
        roster.insert(Entry {
            jid: STATUS_BUFFER_ID.to_owned(),
            name: STATUS_BUFFER_ID.to_owned(),
            group: String::new(),
            flags: EntryFlags {
                lock: true,
                ..EntryFlags::default()
            },
            ui_priority: 0,
            data: EntryData::Special,
        });
        roster
    }

    fn insert(&mut self, entry: Entry) -> EntryKey {
        self.buddylist_dirty = true;
        match self.entries.iter().position(Option::is_none) {
            Some(index) => {
                self.entries[index] = Some(entry);
                index
            }
            None => {
                self.entries.push(Some(entry));
                self.entries.len() - 1
            }
        }
    }

    /// Looks up an entry by key.
    pub fn get(&self, key: EntryKey) -> Option<&Entry> {
        self.entries.get(key).and_then(Option::as_ref)
    }

    /// Mutable lookup by key.
    pub fn get_mut(&mut self, key: EntryKey) -> Option<&mut Entry> {
        self.buddylist_dirty = true;
        self.entries.get_mut(key).and_then(Option::as_mut)
    }

    /// Finds a non-group entry by bare JID (case-insensitive).
    pub fn find(&self, jid: &str) -> Option<EntryKey> {
        self.entries.iter().position(|slot| {
            matches!(slot, Some(entry) if !matches!(entry.data, EntryData::Group) && bare_eq(&entry.jid, jid))
        })
    }

    /// Finds an entry by display name.
    pub fn find_by_name(&self, name: &str) -> Option<EntryKey> {
        self.entries.iter().position(|slot| {
            matches!(slot, Some(entry) if !matches!(entry.data, EntryData::Group) && entry.name == name)
        })
    }

    /// Finds a group entry by name.
    pub fn find_group(&self, name: &str) -> Option<EntryKey> {
        self.entries.iter().position(|slot| {
            matches!(slot, Some(entry) if matches!(entry.data, EntryData::Group) && entry.jid == name)
        })
    }

    /// Ensures a group entry exists.
    pub fn add_group(&mut self, name: &str) -> EntryKey {
        if let Some(key) = self.find_group(name) {
            return key;
        }
        self.insert(Entry {
            jid: name.to_owned(),
            name: name.to_owned(),
            group: name.to_owned(),
            flags: EntryFlags::default(),
            ui_priority: 0,
            data: EntryData::Group,
        })
    }

    /// Adds or updates a user/agent/room entry.  An existing entry keeps
    /// its resources; name, group, subscription and server-confirmation
    /// are refreshed.
    #[allow(clippy::too_many_arguments)]
    pub fn add_user(
        &mut self,
        jid: &BareJid,
        name: Option<&str>,
        group: &str,
        data: EntryData,
        on_server: bool,
    ) -> EntryKey {
        if !group.is_empty() {
            self.add_group(group);
        }
        let bare = jid.to_string();
        let display = name.unwrap_or(bare.as_str()).to_owned();
        if let Some(key) = self.find(&bare) {
            let msg_pending = self.unread_jids.remove(&bare.to_ascii_lowercase());
            if let Some(entry) = self.get_mut(key) {
                entry.name = display;
                entry.group = group.to_owned();
                if let (EntryData::User(old), EntryData::User(new)) = (&mut entry.data, data) {
                    old.agent = new.agent;
                    old.subscription = new.subscription;
                    old.pending = new.pending;
                    old.on_server = on_server || new.on_server;
                }
                if msg_pending {
                    entry.flags.msg_pending = true;
                }
            }
            self.propagate_msg_flag(group);
            return key;
        }
        let msg_pending = self.unread_jids.remove(&bare.to_ascii_lowercase());
        let mut entry = Entry {
            jid: bare,
            name: display,
            group: group.to_owned(),
            flags: EntryFlags::default(),
            ui_priority: 0,
            data,
        };
        if let EntryData::User(user) = &mut entry.data {
            user.on_server = on_server;
        }
        entry.flags.msg_pending = msg_pending;
        let key = self.insert(entry);
        self.propagate_msg_flag(group);
        key
    }

    /// Deletes an entry in response to a server push (or a room purge).
    pub fn del_user(&mut self, jid: &str) {
        if let Some(key) = self.find(jid) {
            let group = self.get(key).map(|entry| entry.group.clone());
            if self.current == Some(key) {
                self.current = None;
            }
            if self.alternate == Some(key) {
                self.alternate = None;
            }
            self.entries[key] = None;
            self.buddylist_dirty = true;
            if let Some(group) = group {
                self.gc_group(&group);
                self.propagate_msg_flag(&group);
            }
        }
    }

    fn gc_group(&mut self, group: &str) {
        if group.is_empty() {
            return;
        }
        let in_use = self
            .entries
            .iter()
            .flatten()
            .any(|entry| !matches!(entry.data, EntryData::Group) && entry.group == group);
        if !in_use {
            if let Some(key) = self.find_group(group) {
                self.entries[key] = None;
                self.buddylist_dirty = true;
            }
        }
    }

    /// Applies a presence update to a resource, creating it as needed.
    /// An offline status removes the resource instead.
    #[allow(clippy::too_many_arguments)]
    pub fn set_status(
        &mut self,
        jid: &str,
        resource_name: &str,
        priority: i8,
        status: Status,
        status_msg: Option<String>,
        timestamp: i64,
        role: Role,
        affiliation: Affiliation,
        real_jid: Option<FullJid>,
    ) -> Option<EntryKey> {
        let key = self.find(jid)?;
        let entry = self.entries.get_mut(key)?.as_mut()?;
        let resources = entry.resources_mut()?;
        if status == Status::Offline {
            resources.retain(|resource| resource.name != resource_name);
            self.buddylist_dirty = true;
            return Some(key);
        }
        let resource = match resources
            .iter_mut()
            .find(|resource| resource.name == resource_name)
        {
            Some(resource) => resource,
            None => {
                resources.push(Resource::new(resource_name));
                resources.last_mut().unwrap()
            }
        };
        resource.priority = priority;
        resource.status = status;
        resource.status_msg = status_msg;
        resource.updated_at = timestamp;
        resource.role = role;
        resource.affiliation = affiliation;
        if real_jid.is_some() {
            resource.real_jid = real_jid;
        }
        self.buddylist_dirty = true;
        Some(key)
    }

    /// Removes all resources (used on disconnect and room leave).
    pub fn del_all_resources(&mut self, jid: &str) {
        if let Some(key) = self.find(jid) {
            if let Some(entry) = self.get_mut(key) {
                if let Some(resources) = entry.resources_mut() {
                    resources.clear();
                }
            }
        }
    }

    /// Mutable access to one resource record, creating an empty one when
    /// it doesn't exist yet.  A record created this way still reads as
    /// offline until presence arrives; it only carries bookkeeping like
    /// chat-state support learnt from messages.
    pub fn touch_resource(&mut self, jid: &str, resource: &str) -> Option<&mut Resource> {
        let key = self.find(jid)?;
        let resources = self.entries.get_mut(key)?.as_mut()?.resources_mut()?;
        if !resources.iter().any(|r| r.name == resource) {
            resources.push(Resource::new(resource));
        }
        resources.iter_mut().find(|r| r.name == resource)
    }

    /// Mutable access to one resource record.
    pub fn resource_mut(&mut self, jid: &str, resource: &str) -> Option<&mut Resource> {
        let key = self.find(jid)?;
        self.entries
            .get_mut(key)?
            .as_mut()?
            .resources_mut()?
            .iter_mut()
            .find(|r| r.name == resource)
    }

    /// Sets or clears the unread flag, keeping the group flag equal to
    /// the OR of its members' flags and maintaining the offline unread
    /// set for entries that later disappear.
    pub fn msg_setflag(&mut self, jid: &str, value: bool) {
        let Some(key) = self.find(jid) else {
            if value {
                self.unread_jids.insert(jid.to_ascii_lowercase());
            } else {
                self.unread_jids.remove(&jid.to_ascii_lowercase());
            }
            return;
        };
        let group = {
            let Some(entry) = self.get_mut(key) else { return };
            entry.flags.msg_pending = value;
            entry.group.clone()
        };
        self.propagate_msg_flag(&group);
    }

    fn propagate_msg_flag(&mut self, group: &str) {
        if group.is_empty() {
            return;
        }
        let pending = self
            .entries
            .iter()
            .flatten()
            .any(|entry| {
                !matches!(entry.data, EntryData::Group)
                    && entry.group == group
                    && entry.flags.msg_pending
            });
        if let Some(key) = self.find_group(group) {
            if let Some(entry) = self.get_mut(key) {
                entry.flags.msg_pending = pending;
            }
        }
    }

    /// Registers a bare JID as unread before it exists on the roster.
    pub fn unread_jid_add(&mut self, jid: &str) {
        self.unread_jids.insert(jid.to_ascii_lowercase());
    }

    /// All entries with the unread flag, plus the offline unread set.
    pub fn unread_jids(&self) -> Vec<String> {
        let mut jids: Vec<String> = self
            .entries
            .iter()
            .flatten()
            .filter(|entry| {
                entry.flags.msg_pending && !matches!(entry.data, EntryData::Group)
            })
            .map(|entry| entry.jid.clone())
            .collect();
        jids.extend(self.unread_jids.iter().cloned());
        jids.sort();
        jids.dedup();
        jids
    }

    /// Iterates over entries matching the mask.
    pub fn iter_type(&self, mask: TypeMask) -> impl Iterator<Item = (EntryKey, &Entry)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(key, slot)| slot.as_ref().map(|entry| (key, entry)))
            .filter(move |(_, entry)| mask.matches(entry))
    }

    /// Iterates over the members of a group.
    pub fn group_members(&self, group: &str) -> impl Iterator<Item = (EntryKey, &Entry)> {
        let group = group.to_owned();
        self.iter_type(TypeMask::ALL).filter(move |(_, entry)| {
            !matches!(entry.data, EntryData::Group) && entry.group == group
        })
    }

    /// The flattened visible view, rebuilding it first if stale.
    pub fn buddylist(&mut self) -> &[EntryKey] {
        if self.buddylist_dirty {
            self.build_buddylist();
        }
        &self.buddylist
    }

    fn visible(&self, entry: &Entry) -> bool {
        if entry.flags.lock || entry.flags.user_lock || entry.flags.msg_pending {
            return true;
        }
        match &entry.data {
            EntryData::User(user) => {
                !(self.hide_offline
                    && user.resources.is_empty())
            }
            _ => true,
        }
    }

    fn build_buddylist(&mut self) {
        let mut view = Vec::new();
        // Ungrouped entries first, then each group header with its
        // members, all in insertion order.
        let mut groups: Vec<String> = Vec::new();
        for entry in self.entries.iter().flatten() {
            if matches!(entry.data, EntryData::Group) && !groups.contains(&entry.jid) {
                groups.push(entry.jid.clone());
            }
        }
        for (key, entry) in self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(key, slot)| slot.as_ref().map(|entry| (key, entry)))
        {
            if matches!(entry.data, EntryData::Group) || !entry.group.is_empty() {
                continue;
            }
            if self.visible(entry) {
                view.push(key);
            }
        }
        for group in &groups {
            let Some(group_key) = self.find_group(group) else { continue };
            let folded = self
                .get(group_key)
                .map(|entry| entry.flags.hidden)
                .unwrap_or(false);
            view.push(group_key);
            if folded {
                continue;
            }
            for (key, entry) in self
                .entries
                .iter()
                .enumerate()
                .filter_map(|(key, slot)| slot.as_ref().map(|entry| (key, entry)))
            {
                if matches!(entry.data, EntryData::Group) || &entry.group != group {
                    continue;
                }
                if self.visible(entry) {
                    view.push(key);
                }
            }
        }
        self.buddylist = view;
        self.buddylist_dirty = false;
        if let Some(current) = self.current {
            if !self.buddylist.contains(&current) {
                self.current = self.buddylist.first().copied();
            }
        } else {
            self.current = self.buddylist.first().copied();
        }
    }

    /// Moves the cursor, remembering the previous position.
    pub fn set_current(&mut self, key: EntryKey) {
        if self.current != Some(key) {
            self.alternate = self.current;
            self.current = Some(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_data(subscription: Subscription, pending: bool) -> EntryData {
        EntryData::User(UserData {
            agent: false,
            subscription,
            pending,
            on_server: true,
            resources: Vec::new(),
        })
    }

    fn bare(s: &str) -> BareJid {
        BareJid::new(s).unwrap()
    }

    #[test]
    fn test_add_find_remove() {
        let mut roster = Roster::new();
        let before: Vec<String> = roster
            .iter_type(TypeMask::ALL)
            .map(|(_, e)| e.jid.clone())
            .collect();
        roster.add_user(
            &bare("alice@example.com"),
            Some("Alice"),
            "Friends",
            user_data(Subscription::Both, false),
            true,
        );
        assert!(roster.find("alice@example.com").is_some());
        assert!(roster.find("ALICE@example.com").is_some());
        assert!(roster.find_group("Friends").is_some());
        roster.del_user("alice@example.com");
        assert!(roster.find("alice@example.com").is_none());
        // The empty group is garbage collected with its last member.
        assert!(roster.find_group("Friends").is_none());
        let after: Vec<String> = roster
            .iter_type(TypeMask::ALL)
            .map(|(_, e)| e.jid.clone())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_duplicate_add_updates() {
        let mut roster = Roster::new();
        let k1 = roster.add_user(
            &bare("bob@example.com"),
            None,
            "",
            user_data(Subscription::From, true),
            true,
        );
        let k2 = roster.add_user(
            &bare("bob@example.com"),
            Some("Bob"),
            "",
            user_data(Subscription::Both, false),
            true,
        );
        assert_eq!(k1, k2);
        let entry = roster.get(k1).unwrap();
        assert_eq!(entry.name, "Bob");
        match &entry.data {
            EntryData::User(user) => {
                assert_eq!(user.subscription, Subscription::Both);
                assert!(!user.pending);
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_resource_priority_selection() {
        let mut roster = Roster::new();
        roster.add_user(
            &bare("alice@ex"),
            None,
            "",
            user_data(Subscription::Both, false),
            true,
        );
        roster
            .set_status("alice@ex", "desk", 5, Status::Available, None, 10,
                        Role::None, Affiliation::None, None)
            .unwrap();
        roster
            .set_status("alice@ex", "mob", 3, Status::Away, None, 20,
                        Role::None, Affiliation::None, None)
            .unwrap();
        let key = roster.find("alice@ex").unwrap();
        let entry = roster.get(key).unwrap();
        assert_eq!(entry.current_resource().unwrap().name, "desk");
        assert_eq!(entry.status(), Status::Available);
        // Same priority: most recently updated wins.
        roster
            .set_status("alice@ex", "mob", 5, Status::Away, None, 30,
                        Role::None, Affiliation::None, None)
            .unwrap();
        let entry = roster.get(key).unwrap();
        assert_eq!(entry.current_resource().unwrap().name, "mob");
    }

    #[test]
    fn test_offline_removes_resource() {
        let mut roster = Roster::new();
        roster.add_user(&bare("a@b"), None, "", user_data(Subscription::To, false), true);
        roster
            .set_status("a@b", "r1", 0, Status::Available, None, 0,
                        Role::None, Affiliation::None, None)
            .unwrap();
        roster
            .set_status("a@b", "r1", 0, Status::Offline, None, 1,
                        Role::None, Affiliation::None, None)
            .unwrap();
        let key = roster.find("a@b").unwrap();
        let entry = roster.get(key).unwrap();
        assert!(entry.resources().is_empty());
        assert_eq!(entry.status(), Status::Offline);
    }

    #[test]
    fn test_group_msg_flag_follows_members() {
        let mut roster = Roster::new();
        roster.add_user(&bare("a@b"), None, "G", user_data(Subscription::Both, false), true);
        roster.add_user(&bare("c@d"), None, "G", user_data(Subscription::Both, false), true);
        roster.msg_setflag("a@b", true);
        let group = roster.find_group("G").unwrap();
        assert!(roster.get(group).unwrap().flags.msg_pending);
        roster.msg_setflag("a@b", false);
        assert!(!roster.get(group).unwrap().flags.msg_pending);
        roster.msg_setflag("a@b", true);
        roster.msg_setflag("c@d", true);
        roster.msg_setflag("a@b", false);
        // Still pending through the other member.
        assert!(roster.get(group).unwrap().flags.msg_pending);
    }

    #[test]
    fn test_unread_mark_survives_late_add() {
        let mut roster = Roster::new();
        roster.unread_jid_add("carol@ex");
        assert!(roster.unread_jids().contains(&"carol@ex".to_owned()));
        let key = roster.add_user(&bare("carol@ex"), None, "", user_data(Subscription::None, false), true);
        assert!(roster.get(key).unwrap().flags.msg_pending);
        // Consumed from the offline set once applied.
        roster.msg_setflag("carol@ex", false);
        assert!(roster.unread_jids().is_empty());
    }

    #[test]
    fn test_buddylist_offline_filter() {
        let mut roster = Roster::new();
        roster.add_user(&bare("on@ex"), None, "", user_data(Subscription::Both, false), true);
        roster.add_user(&bare("off@ex"), None, "", user_data(Subscription::Both, false), true);
        roster
            .set_status("on@ex", "r", 0, Status::Available, None, 0,
                        Role::None, Affiliation::None, None)
            .unwrap();
        roster.hide_offline = true;
        roster.buddylist_dirty = true;
        let visible: Vec<String> = roster
            .buddylist()
            .to_vec()
            .into_iter()
            .filter_map(|key| roster.get(key).map(|entry| entry.jid.clone()))
            .collect();
        assert!(visible.contains(&"on@ex".to_owned()));
        assert!(!visible.contains(&"off@ex".to_owned()));
        // Unread beats the filter.
        roster.msg_setflag("off@ex", true);
        let visible: Vec<String> = roster
            .buddylist()
            .to_vec()
            .into_iter()
            .filter_map(|key| roster.get(key).map(|entry| entry.jid.clone()))
            .collect();
        assert!(visible.contains(&"off@ex".to_owned()));
    }

    #[test]
    fn test_group_fold_hides_members() {
        let mut roster = Roster::new();
        roster.add_user(&bare("a@b"), None, "G", user_data(Subscription::Both, false), true);
        let group = roster.find_group("G").unwrap();
        roster.get_mut(group).unwrap().flags.hidden = true;
        let view = roster.buddylist().to_vec();
        assert!(view.contains(&group));
        assert!(!view.contains(&roster.find("a@b").unwrap()));
    }

    #[test]
    fn test_current_alternate() {
        let mut roster = Roster::new();
        let a = roster.add_user(&bare("a@b"), None, "", user_data(Subscription::Both, false), true);
        let c = roster.add_user(&bare("c@d"), None, "", user_data(Subscription::Both, false), true);
        roster.set_current(a);
        roster.set_current(c);
        assert_eq!(roster.current, Some(c));
        assert_eq!(roster.alternate, Some(a));
    }
}
