// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The session aggregate: every piece of client state, the stanza
//! dispatcher and the timer hook.
//!
//! The session is sans-io.  Inbound elements are injected with
//! [`Session::handle_element`], outbound stanzas pile up in a transmit
//! queue the driver flushes to the socket, and all timer work happens in
//! [`Session::tick`].  Handlers never block and never recurse into the
//! driver loop.

use std::collections::{HashMap, VecDeque};

use jid::{BareJid, FullJid, Jid};

use causerie_stanza::element::Element;
use causerie_stanza::iq::Iq;
use causerie_stanza::{ns, Stanza};

use crate::bookmarks::BookmarksStore;
use crate::buffers::Buffers;
use crate::caps::CapsCache;
use crate::config::SessionConfig;
use crate::crypto::{NoOtr, NoPgp, OtrEngine, PgpEngine};
use crate::error::Error;
use crate::event::Event;
use crate::events::{EventContext, EventRegistry};
use crate::hbuf::{HistoryBuffer, LineFlags, Position};
use crate::histolog::{HistoLog, HistoryEntry, MessageKind};
use crate::iq::{IqCallback, IqContext, IqCorrelator};
use crate::roster::{Roster, Status, STATUS_BUFFER_ID};

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnState {
    /// No transport.
    #[default]
    Disconnected,
    /// Transport being established.
    Connecting,
    /// Stream open, authentication in progress.
    Authenticating,
    /// Authenticated and resource-bound.
    Bound,
    /// Shutting down on purpose.
    Disconnecting,
}

pub(crate) struct ComposeState {
    pub jid: String,
    pub since: i64,
    pub paused_sent: bool,
}

/// The owned aggregate the driver loop and all handlers borrow.
pub struct Session {
    /// Static configuration.
    pub config: SessionConfig,
    pub(crate) state: ConnState,
    pub(crate) bound_jid: Option<FullJid>,
    /// The contact list.
    pub roster: Roster,
    pub(crate) buffers: Buffers,
    pub(crate) iq: IqCorrelator,
    pub(crate) events: EventRegistry,
    pub(crate) caps: CapsCache,
    pub(crate) bookmarks: BookmarksStore,
    pub(crate) histolog: HistoLog,
    pub(crate) pgp: Box<dyn PgpEngine>,
    pub(crate) otr: Box<dyn OtrEngine>,

    // Presence engine state.
    pub(crate) wanted_status: (Status, Option<String>),
    pub(crate) current_status: (Status, Option<String>),
    pub(crate) autoaway_saved: Option<(Status, Option<String>)>,
    pub(crate) last_activity: i64,
    pub(crate) last_use: i64,

    // Chat-state engine state.
    pub(crate) compose: Option<ComposeState>,

    // Receipt tracking: message id to bare JID.
    pub(crate) pending_receipts: HashMap<String, String>,

    /// The buffer the UI is displaying; messages landing elsewhere raise
    /// the unread flag.
    pub(crate) active_buffer: Option<String>,
    pub(crate) display_width: usize,

    out: VecDeque<Element>,
    ui: VecDeque<Event>,
}

impl Session {
    /// Builds a session from its configuration.  The unread-state file,
    /// when configured, is consulted right away so unread marks survive
    /// restarts even for contacts not on the roster yet.
    pub fn new(config: SessionConfig) -> Session {
        let mut histolog = HistoLog::new(
            config.history_dir.clone(),
            config.load_logs && config.history_dir.is_some(),
        );
        histolog.ignore_status = config.logging_ignore_status;
        histolog.max_age_days = config.max_history_age;
        let mut roster = Roster::new();
        if let Some(state_file) = &config.state_file {
            for jid in HistoLog::load_state(state_file) {
                roster.unread_jid_add(&jid);
            }
        }
        Session {
            config,
            state: ConnState::Disconnected,
            bound_jid: None,
            roster,
            buffers: Buffers::new(),
            iq: IqCorrelator::new(),
            events: EventRegistry::new(),
            caps: CapsCache::new(),
            bookmarks: BookmarksStore::new(),
            histolog,
            pgp: Box::new(NoPgp),
            otr: Box::new(NoOtr),
            wanted_status: (Status::Available, None),
            current_status: (Status::Offline, None),
            autoaway_saved: None,
            last_activity: 0,
            last_use: 0,
            compose: None,
            pending_receipts: HashMap::new(),
            active_buffer: None,
            display_width: 80,
            out: VecDeque::new(),
            ui: VecDeque::new(),
        }
    }

    /// Replaces the PGP engine.
    pub fn set_pgp_engine(&mut self, engine: Box<dyn PgpEngine>) {
        self.pgp = engine;
    }

    /// Replaces the OTR engine.
    pub fn set_otr_engine(&mut self, engine: Box<dyn OtrEngine>) {
        self.otr = engine;
    }

    /// The lifecycle state.
    pub fn state(&self) -> ConnState {
        self.state
    }

    /// The bound full JID while online.
    pub fn bound_jid(&self) -> Option<&FullJid> {
        self.bound_jid.as_ref()
    }

    /// Whether stanzas can be sent right now.
    pub fn is_online(&self) -> bool {
        self.state == ConnState::Bound
    }

    // ---- wire plumbing -------------------------------------------------

    /// Queues a stanza for transmission.
    pub(crate) fn send_element<E: Into<Element>>(&mut self, element: E) {
        self.out.push_back(element.into());
    }

    /// Takes everything queued for the socket.
    pub fn take_outgoing(&mut self) -> Vec<Element> {
        self.out.drain(..).collect()
    }

    pub(crate) fn push_ui(&mut self, event: Event) {
        self.ui.push_back(event);
    }

    /// Takes the pending UI events.
    pub fn take_events(&mut self) -> Vec<Event> {
        self.ui.drain(..).collect()
    }

    /// Sends a raw, already-formed stanza (the `rawxml send` verb).
    pub fn send_raw_xml(&mut self, xml: &str) -> Result<(), Error> {
        let element: Element = xml
            .parse()
            .map_err(|e: causerie_stanza::Error| Error::from(e))?;
        self.send_element(element);
        Ok(())
    }

    /// Allocates a stanza id and registers its callback.
    pub(crate) fn send_query(
        &mut self,
        prefix: &str,
        build: impl FnOnce(String) -> Iq,
        now: i64,
        timeout: i64,
        callback: IqCallback,
    ) {
        let id = self.iq.next_id(Some(prefix));
        self.iq.register(id.clone(), now, timeout, callback);
        let iq = build(id);
        self.send_element(iq);
    }

    // ---- buffers and logging -------------------------------------------

    /// Appends a line to a conversation buffer, replaying the on-disk
    /// history the first time the buffer is opened.  Raises the unread
    /// flag when the buffer is not the active one or is locked.
    pub(crate) fn write_buffer(
        &mut self,
        bjid: &str,
        text: &str,
        timestamp: i64,
        flags: LineFlags,
        nick_len: usize,
        now: i64,
    ) {
        self.ensure_buffer(bjid, now);
        let width = self.display_width;
        let max_blocks = self.config.max_history_blocks;
        let mut created = false;
        let buffer = self.buffers.get_or_create(bjid, &mut created);
        let locked = buffer.append(text, timestamp, flags, width, max_blocks, nick_len);
        let is_active = self
            .active_buffer
            .as_deref()
            .map(|active| active.eq_ignore_ascii_case(bjid))
            .unwrap_or(false);
        if flags.contains(LineFlags::IN) && (locked || !is_active) {
            self.roster.msg_setflag(bjid, true);
        }
        self.push_ui(Event::BufferUpdated(bjid.to_owned()));
    }

    /// Creates the buffer if needed and replays history into it.
    pub(crate) fn ensure_buffer(&mut self, bjid: &str, now: i64) {
        let mut created = false;
        let width = self.display_width;
        let max_blocks = self.config.max_history_blocks;
        {
            let _ = self.buffers.get_or_create(bjid, &mut created);
        }
        if !created || !self.histolog.load_logs {
            return;
        }
        if bjid == STATUS_BUFFER_ID {
            return;
        }
        let room = self
            .roster
            .find(bjid)
            .and_then(|key| self.roster.get(key))
            .map(|entry| entry.inside_room() || matches!(entry.data, crate::roster::EntryData::Room(_)))
            .unwrap_or(false);
        if room && !self.config.load_muc_logs {
            return;
        }
        // Shared history via symlinked files.
        let source = self.histolog.log_jid_alias(bjid).unwrap_or_else(|| bjid.to_owned());
        let entries = self.histolog.read_history(&source, now);
        if entries.is_empty() {
            return;
        }
        let buffer = match self.buffers.get_mut(bjid) {
            Some(buffer) => buffer,
            None => return,
        };
        for entry in entries {
            match entry {
                HistoryEntry::Message {
                    kind,
                    timestamp,
                    text,
                } => {
                    let flags = match kind {
                        MessageKind::Send => LineFlags::OUT,
                        MessageKind::Recv => LineFlags::IN,
                        MessageKind::Info => LineFlags::INFO,
                    };
                    buffer.append(&text, timestamp, flags, width, max_blocks, 0);
                }
                HistoryEntry::Status { .. } => {
                    // Replayed status lines only matter for the log files
                    // themselves.
                }
            }
        }
    }

    /// Writes one line to the status buffer and the log facade.
    pub(crate) fn log_line(&mut self, flags: LineFlags, text: &str, now: i64) {
        log::info!("{}", text);
        self.write_buffer(
            STATUS_BUFFER_ID,
            text,
            now,
            flags | LineFlags::SPECIAL,
            0,
            now,
        );
    }

    // ---- UI-side operations --------------------------------------------

    /// Tells the session which buffer the UI shows; clears its unread
    /// flag.
    pub fn set_active_buffer(&mut self, bjid: Option<&str>, _now: i64) {
        self.active_buffer = bjid.map(str::to_owned);
        if let Some(bjid) = bjid {
            self.roster.msg_setflag(bjid, false);
            if let Some(key) = self.roster.find(bjid) {
                self.roster.set_current(key);
            }
        }
    }

    /// Updates the wrap width and re-wraps every buffer.
    pub fn set_display_width(&mut self, width: usize) {
        if self.display_width != width {
            self.display_width = width;
            self.buffers.rebuild_all(width);
        }
    }

    /// Read access to a conversation buffer.
    pub fn buffer(&self, bjid: &str) -> Option<&HistoryBuffer> {
        self.buffers.get(bjid)
    }

    /// Mutable access for scroll operations.
    pub fn buffer_mut(&mut self, bjid: &str) -> Option<&mut HistoryBuffer> {
        self.buffers.get_mut(bjid)
    }

    /// Opens (creating and replaying if needed) a buffer explicitly.
    pub fn open_buffer(&mut self, bjid: &str, now: i64) {
        self.ensure_buffer(bjid, now);
    }

    /// Purges a buffer on explicit close.
    pub fn close_buffer(&mut self, bjid: &str) {
        self.buffers.purge(bjid);
    }

    /// Scrolls a buffer up by `rows`, locking the view.
    pub fn buffer_scroll_up(&mut self, bjid: &str, rows: usize) -> Result<(), Error> {
        let buffer = self.buffers.get_mut(bjid).ok_or(Error::NoSuchBuddy)?;
        let anchor = buffer.top;
        buffer.top = buffer.scroll_back(anchor, rows);
        buffer.locked = buffer.top.is_some();
        Ok(())
    }

    /// Scrolls down, unlocking when the tail comes back into view.
    pub fn buffer_scroll_down(&mut self, bjid: &str, rows: usize, window: usize) -> Result<(), Error> {
        let buffer = self.buffers.get_mut(bjid).ok_or(Error::NoSuchBuddy)?;
        match buffer.top {
            Some(top) => match buffer.scroll_forward(top, rows, window) {
                Some(position) => buffer.top = Some(position),
                None => buffer.unlock(),
            },
            None => {}
        }
        Ok(())
    }

    /// Jumps to the top of a buffer.
    pub fn buffer_top(&mut self, bjid: &str) -> Result<(), Error> {
        let buffer = self.buffers.get_mut(bjid).ok_or(Error::NoSuchBuddy)?;
        buffer.top = buffer.first_position();
        buffer.locked = buffer.top.is_some();
        Ok(())
    }

    /// Jumps back to the tail.
    pub fn buffer_bottom(&mut self, bjid: &str) -> Result<(), Error> {
        let buffer = self.buffers.get_mut(bjid).ok_or(Error::NoSuchBuddy)?;
        buffer.unlock();
        Ok(())
    }

    /// Clears a buffer's display.
    pub fn buffer_clear(&mut self, bjid: &str) -> Result<(), Error> {
        let buffer = self.buffers.get_mut(bjid).ok_or(Error::NoSuchBuddy)?;
        buffer.clear();
        Ok(())
    }

    /// Searches for `needle` from the current anchor.
    pub fn buffer_search(
        &mut self,
        bjid: &str,
        direction: i32,
        needle: &str,
    ) -> Result<Option<Position>, Error> {
        let buffer = self.buffers.get_mut(bjid).ok_or(Error::NoSuchBuddy)?;
        let hit = buffer.search(buffer.top, direction, needle);
        if let Some(position) = hit {
            buffer.top = Some(position);
            buffer.locked = true;
        }
        Ok(hit)
    }

    /// Jumps to the first line at or after a date.
    pub fn buffer_date(&mut self, bjid: &str, timestamp: i64) -> Result<(), Error> {
        let buffer = self.buffers.get_mut(bjid).ok_or(Error::NoSuchBuddy)?;
        if let Some(position) = buffer.jump_date(timestamp) {
            buffer.top = Some(position);
            buffer.locked = true;
        }
        Ok(())
    }

    /// Jumps to a percentage position.
    pub fn buffer_percent(&mut self, bjid: &str, percent: usize) -> Result<(), Error> {
        let buffer = self.buffers.get_mut(bjid).ok_or(Error::NoSuchBuddy)?;
        if let Some(position) = buffer.jump_percent(percent) {
            buffer.top = Some(position);
            buffer.locked = true;
        }
        Ok(())
    }

    /// Resolves a pending event by id.
    pub fn event_resolve(&mut self, id: &str, context: EventContext) -> bool {
        EventRegistry::resolve(self, id, context)
    }

    /// Records user activity (keypresses), feeding autoaway.
    pub fn user_activity(&mut self, now: i64) {
        self.last_activity = now;
        crate::presence::autoaway_activity(self, now);
    }

    /// Writes the unread-state file; call on shutdown.
    pub fn save_state(&self) {
        if let Some(path) = &self.config.state_file {
            let unread = self.roster.unread_jids();
            if let Err(e) = HistoLog::save_state(path, &unread) {
                log::error!("cannot write state file: {}", e);
            }
        }
    }

    // ---- lifecycle -----------------------------------------------------

    pub(crate) fn set_state(&mut self, state: ConnState) {
        self.state = state;
    }

    /// Runs the post-bind sequence: initial roster fetch, private
    /// storage fetches, and the first presence broadcast.
    pub fn on_bound(&mut self, jid: FullJid, now: i64) {
        self.state = ConnState::Bound;
        self.bound_jid = Some(jid.clone());
        self.log_line(
            LineFlags::INFO,
            &format!("Connected to the server as {}", jid),
            now,
        );
        crate::iq::request_roster(self, now);
        crate::bookmarks::request_bookmarks(self, now);
        crate::bookmarks::request_rosternotes(self, now);
        let wanted = self.wanted_status.clone();
        crate::presence::announce_status(self, wanted.0, wanted.1, now);
        self.push_ui(Event::Online(jid));
    }

    /// Tears the session state down after the transport went away.
    /// `fatal_auth` suppresses the reconnect hint in the event.
    pub fn on_disconnected(&mut self, reason: Option<String>, now: i64) {
        if self.state == ConnState::Disconnected {
            return;
        }
        self.state = ConnState::Disconnected;
        self.bound_jid = None;
        if let Some(reason) = &reason {
            self.log_line(LineFlags::ERR, &format!("Disconnected: {}", reason), now);
        } else {
            self.log_line(LineFlags::INFO, "Disconnected", now);
        }
        // Every contact is now unknown; wanted status survives for the
        // next connection.
        let jids: Vec<String> = self
            .roster
            .iter_type(crate::roster::TypeMask::USER | crate::roster::TypeMask::AGENT | crate::roster::TypeMask::ROOM)
            .map(|(_, entry)| entry.jid.clone())
            .collect();
        for jid in jids {
            self.roster.del_all_resources(&jid);
        }
        self.current_status = (Status::Offline, None);
        // Pending requests will never be answered: give every callback a
        // synthetic timeout.  Pending events stay for user inspection.
        for callback in self.iq.drain() {
            callback(self, IqContext::Timeout);
        }
        self.push_ui(Event::Disconnected(reason));
        self.push_ui(Event::RosterUpdated);
    }

    // ---- inbound dispatch ----------------------------------------------

    /// Entry point for every stanza-level element read from the stream.
    pub fn handle_element(&mut self, element: Element, now: i64) {
        if element.is("error", ns::STREAM) {
            let text = element
                .get_child("text", ns::XMPP_STREAMS)
                .map(|child| child.text())
                .unwrap_or_else(|| "stream error".to_owned());
            self.log_line(LineFlags::ERR, &format!("Stream error: {}", text), now);
            return;
        }
        match Stanza::try_from(element) {
            Ok(Stanza::Message(message)) => crate::message::handle_message(self, message, now),
            Ok(Stanza::Presence(presence)) => crate::presence::handle_presence(self, presence, now),
            Ok(Stanza::Iq(iq)) => crate::iq::handle_iq(self, iq, now),
            Err(e) => {
                // A single bad stanza never aborts the session.
                log::debug!("dropping unparseable stanza: {}", e);
            }
        }
    }

    /// Coarse timer hook; the driver calls this about once a second.
    pub fn tick(&mut self, now: i64) {
        for callback in self.iq.sweep(now) {
            callback(self, IqContext::Timeout);
        }
        EventRegistry::sweep(self, now);
        crate::presence::autoaway_check(self, now);
        crate::chatstates::compose_tick(self, now);
    }

    // ---- roster operations (the add/del/rename/move verbs) -------------

    /// Adds a contact: roster set plus subscription request.
    pub fn add_contact(&mut self, jid: &BareJid, name: Option<&str>, now: i64) {
        crate::iq::roster_set(self, jid, name, None, false, now);
        // Ask for their presence right away.
        let presence = causerie_stanza::presence::Presence {
            from: None,
            to: Some(Jid::from(jid.clone())),
            id: None,
            type_: causerie_stanza::presence::Type::Subscribe,
            show: None,
            status: None,
            priority: 0,
            payloads: Vec::new(),
        };
        self.send_element(presence);
    }

    /// Deletes a contact: the server push coming back removes it from
    /// the local model.
    pub fn del_contact(&mut self, jid: &BareJid, now: i64) {
        crate::iq::roster_set(self, jid, None, None, true, now);
    }

    /// Renames a contact and pushes the change.
    pub fn rename_contact(&mut self, jid: &BareJid, new_name: &str, now: i64) {
        if let Some(key) = self.roster.find(jid.as_str()) {
            let group = {
                let entry = match self.roster.get_mut(key) {
                    Some(entry) => entry,
                    None => return,
                };
                entry.name = new_name.to_owned();
                entry.group.clone()
            };
            crate::iq::roster_set(self, jid, Some(new_name), Some(&group), false, now);
            self.push_ui(Event::RosterUpdated);
        }
    }

    // ---- status and messaging verbs ------------------------------------

    /// Sets and broadcasts our status (the `status` verb).
    pub fn set_status(&mut self, status: Status, message: Option<String>, now: i64) {
        crate::presence::set_status(self, status, message, now);
    }

    /// Sends a directed status to one JID (the `status_to` verb).
    pub fn status_to(&mut self, to: Jid, status: Status, message: Option<String>, now: i64) {
        crate::presence::send_status_to(self, to, status, message, now);
    }

    /// Sends a message to a JID (the `say`/`say_to`/`msay send` verbs).
    pub fn say_to(&mut self, to: Jid, text: &str, now: i64) -> Result<(), Error> {
        crate::message::say_to(self, to, text, now)
    }

    /// Subscription management (the `authorization` verbs).
    pub fn authorization(&mut self, to: Jid, verb: crate::presence::AuthVerb) {
        crate::presence::authorization(self, to, verb);
    }

    /// Input-line hook for typing notifications.
    pub fn set_composing(&mut self, to: &str, typing: bool, now: i64) {
        crate::chatstates::set_composing(self, to, typing, now);
    }

    // ---- room verbs ----------------------------------------------------

    /// Joins a room (the `room join` verb).
    pub fn room_join(
        &mut self,
        room: &BareJid,
        nick: Option<&str>,
        password: Option<&str>,
        now: i64,
    ) -> Result<(), Error> {
        crate::muc::join(self, room, nick, password, now)
    }

    /// Leaves a room (the `room leave` verb).
    pub fn room_leave(&mut self, room: &str, message: Option<&str>, now: i64) {
        crate::muc::leave(self, room, message, now);
    }

    /// Changes our nickname (the `room nick` verb).
    pub fn room_nick(&mut self, room: &str, nick: &str, now: i64) {
        crate::muc::change_nick(self, room, nick, now);
    }

    /// Sets the topic (the `room topic` verb).
    pub fn room_topic(&mut self, room: &str, topic: &str, now: i64) -> Result<(), Error> {
        crate::muc::set_topic(self, room, topic, now)
    }

    /// Invites somebody (the `room invite` verb).
    pub fn room_invite(&mut self, room: &str, who: Jid, reason: Option<&str>) -> Result<(), Error> {
        crate::muc::invite(self, room, who, reason)
    }

    /// Kicks an occupant (the `room kick` verb).
    pub fn room_kick(
        &mut self,
        room: &str,
        nick: &str,
        reason: Option<&str>,
        now: i64,
    ) -> Result<(), Error> {
        crate::muc::kick(self, room, nick, reason, now)
    }

    /// Bans a JID (the `room ban` verb).
    pub fn room_ban(
        &mut self,
        room: &str,
        who: BareJid,
        reason: Option<&str>,
        now: i64,
    ) -> Result<(), Error> {
        crate::muc::ban(self, room, who, reason, now)
    }

    /// Grants a role (the `room role` verb).
    pub fn room_role(
        &mut self,
        room: &str,
        nick: &str,
        role: causerie_stanza::muc::Role,
        reason: Option<&str>,
        now: i64,
    ) -> Result<(), Error> {
        crate::muc::set_role(self, room, nick, role, reason, now)
    }

    /// Grants an affiliation (the `room affil` verb).
    pub fn room_affil(
        &mut self,
        room: &str,
        who: BareJid,
        affiliation: causerie_stanza::muc::Affiliation,
        reason: Option<&str>,
        now: i64,
    ) -> Result<(), Error> {
        crate::muc::set_affiliation(self, room, who, affiliation, reason, now)
    }

    /// Sends a private message to an occupant (the `room privmsg` verb).
    pub fn room_privmsg(
        &mut self,
        room: &str,
        nick: &str,
        text: &str,
        now: i64,
    ) -> Result<(), Error> {
        crate::muc::send_private_message(self, room, nick, text, now)
    }

    /// Destroys a room we own (the `room destroy` verb).
    pub fn room_destroy(&mut self, room: &str, reason: Option<&str>, now: i64) -> Result<(), Error> {
        crate::muc::destroy(self, room, reason, now)
    }

    /// Prints the occupant list (the `room names` verb).
    pub fn room_names(&mut self, room: &str, now: i64) {
        crate::muc::names(self, room, now);
    }

    /// Prints what is known about one occupant (the `room whois` verb).
    pub fn room_whois(&mut self, room: &str, nick: &str, now: i64) {
        crate::muc::whois(self, room, nick, now);
    }

    /// Accepts the default config of a new room (the `room unlock` verb).
    pub fn room_unlock(&mut self, room: &str, now: i64) -> Result<(), Error> {
        crate::muc::unlock(self, room, now)
    }

    /// Forgets a room entry kept after leaving (the `room remove` verb).
    pub fn room_remove(&mut self, room: &str) -> Result<(), Error> {
        let key = self.roster.find(room).ok_or(Error::NoSuchBuddy)?;
        if let Some(entry) = self.roster.get(key) {
            if entry.inside_room() {
                return Err(Error::NoSuchBuddy);
            }
        }
        self.roster.del_user(room);
        self.buffers.purge(room);
        self.push_ui(Event::RosterUpdated);
        Ok(())
    }

    // ---- requests and storage ------------------------------------------

    /// Software-version query (the `request version` verb).
    pub fn request_version(&mut self, to: Jid, now: i64) {
        crate::iq::request_version(self, to, now);
    }

    /// Entity-time query (the `request time` verb).
    pub fn request_time(&mut self, to: Jid, now: i64) {
        crate::iq::request_time(self, to, now);
    }

    /// Last-activity query (the `request last` verb).
    pub fn request_last(&mut self, to: Jid, now: i64) {
        crate::iq::request_last(self, to, now);
    }

    /// vCard query (the `request vcard` verb).
    pub fn request_vcard(&mut self, to: Jid, now: i64) {
        crate::iq::request_vcard(self, to, now);
    }

    /// Adds or replaces a conference bookmark.
    pub fn set_bookmark(&mut self, conference: causerie_stanza::bookmarks::Conference, now: i64) {
        crate::bookmarks::set_bookmark(self, conference, now);
    }

    /// Removes a conference bookmark.
    pub fn del_bookmark(&mut self, room: &BareJid, now: i64) {
        crate::bookmarks::del_bookmark(self, room, now);
    }

    /// Sets (or clears, with empty text) a roster note.
    pub fn set_rosternote(&mut self, jid: &str, text: &str, now: i64) {
        crate::bookmarks::set_note(self, jid, text, now);
    }

    /// The pending events, as `(id, description)` pairs.
    pub fn pending_events(&self) -> Vec<(String, String)> {
        self.events.list()
    }

    /// Moves a contact to another group and pushes the change.
    pub fn move_contact(&mut self, jid: &BareJid, new_group: &str, now: i64) {
        if let Some(key) = self.roster.find(jid.as_str()) {
            let name = {
                let entry = match self.roster.get_mut(key) {
                    Some(entry) => entry,
                    None => return,
                };
                if !new_group.is_empty() {
                    entry.group = new_group.to_owned();
                } else {
                    entry.group.clear();
                }
                entry.name.clone()
            };
            if !new_group.is_empty() {
                self.roster.add_group(new_group);
            }
            crate::iq::roster_set(self, jid, Some(&name), Some(new_group), false, now);
            self.push_ui(Event::RosterUpdated);
        }
    }
}
