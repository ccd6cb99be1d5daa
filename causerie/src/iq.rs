// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Correlation of outgoing IQ requests with their answers.
//!
//! Every request gets a fresh decimal id and an absolute expiry; a coarse
//! sweep fires the callback with a timeout context for anything the
//! server never answered.  Callbacks run exactly once and the record is
//! removed before the callback is invoked, so a callback may freely issue
//! new requests.

use causerie_stanza::iq::Iq;

use crate::session::Session;

/// Requests without an explicit timeout expire after this many seconds.
pub const IQS_MAX_TIMEOUT: i64 = 600;

/// Why an IQ callback is being invoked.
pub enum IqContext<'a> {
    /// The server answered with `type='result'`.
    Result(&'a Iq),
    /// The server answered with `type='error'`.
    Error(&'a Iq),
    /// No answer arrived before the deadline (or the session closed).
    Timeout,
}

/// Callback bound at request creation.
pub type IqCallback = Box<dyn FnOnce(&mut Session, IqContext) + Send>;

struct PendingIq {
    id: String,
    expires: i64,
    callback: IqCallback,
}

/// The in-flight request table.
#[derive(Default)]
pub struct IqCorrelator {
    pending: Vec<PendingIq>,
    counter: u64,
}

impl IqCorrelator {
    /// Creates an empty table.
    pub fn new() -> IqCorrelator {
        IqCorrelator::default()
    }

    /// Allocates a fresh id, optionally prefixed for readability.  Ids
    /// increase monotonically; on wraparound a candidate colliding with a
    /// live record is skipped.
    pub fn next_id(&mut self, prefix: Option<&str>) -> String {
        loop {
            self.counter = self.counter.wrapping_add(1);
            let id = match prefix {
                Some(prefix) => format!("{}_{}", prefix, self.counter),
                None => self.counter.to_string(),
            };
            if !self.pending.iter().any(|pending| pending.id == id) {
                return id;
            }
        }
    }

    /// Registers a request.  `timeout` of zero uses the default cap.
    pub fn register(&mut self, id: String, now: i64, timeout: i64, callback: IqCallback) {
        let timeout = if timeout > 0 { timeout } else { IQS_MAX_TIMEOUT };
        self.pending.push(PendingIq {
            id,
            expires: now + timeout,
            callback,
        });
    }

    /// Removes and returns the callback for an answered id.
    pub fn take(&mut self, id: &str) -> Option<IqCallback> {
        let index = self.pending.iter().position(|pending| pending.id == id)?;
        Some(self.pending.remove(index).callback)
    }

    /// Removes and returns the callbacks of every expired record.
    pub fn sweep(&mut self, now: i64) -> Vec<IqCallback> {
        let mut expired = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].expires <= now {
                expired.push(self.pending.remove(index).callback);
            } else {
                index += 1;
            }
        }
        expired
    }

    /// Removes and returns every callback; used on disconnect, where each
    /// gets a synthetic timeout context.
    pub fn drain(&mut self) -> Vec<IqCallback> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|pending| pending.callback)
            .collect()
    }

    /// Number of requests still in flight.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// ---- inbound dispatch and the server-facing responders -----------------

use chrono::{Local, Offset, Utc};
use jid::Jid;

use causerie_stanza::commands::{Action, Command, CommandStatus};
use causerie_stanza::data_forms::DataForm;
use causerie_stanza::disco::{DiscoItem, DiscoItemsQuery, DiscoItemsResult};
use causerie_stanza::iq::IqType;
use causerie_stanza::last::LastActivity;
use causerie_stanza::ns;
use causerie_stanza::ping::Ping;
use causerie_stanza::roster::{Item as RosterItem, Roster as RosterQuery, Subscription as WireSub};
use causerie_stanza::stanza_error::{DefinedCondition, ErrorType, StanzaError};
use causerie_stanza::time::{TimeQuery, TimeResult};
use causerie_stanza::version::{VersionQuery, VersionResult};
use causerie_stanza::Element;

use crate::caps::{CLIENT_NAME, CLIENT_VERSION};
use crate::event::Event;
use crate::hbuf::LineFlags;
use crate::roster::{EntryData, UserData};

/// Routes an inbound IQ: answers to our requests go to their callbacks,
/// server pushes and queries get handled or refused here.
pub(crate) fn handle_iq(session: &mut Session, iq: Iq, now: i64) {
    match &iq.payload {
        IqType::Result(_) => {
            let Some(id) = iq.id.clone() else {
                log::debug!("dropping result iq without an id");
                return;
            };
            match session.iq.take(&id) {
                Some(callback) => callback(session, IqContext::Result(&iq)),
                None => log::debug!("unexpected iq result (id {})", id),
            }
        }
        IqType::Error(_) => {
            let Some(id) = iq.id.clone() else {
                log::debug!("dropping error iq without an id");
                return;
            };
            match session.iq.take(&id) {
                Some(callback) => callback(session, IqContext::Error(&iq)),
                None => {
                    // Not ours; derive a line for the status buffer.
                    if let IqType::Error(error) = &iq.payload {
                        session.log_line(
                            LineFlags::ERR,
                            &format!("Received unexpected error: {}", error.describe()),
                            now,
                        );
                    }
                }
            }
        }
        IqType::Get(payload) => handle_iq_get(session, &iq, payload.clone(), now),
        IqType::Set(payload) => handle_iq_set(session, &iq, payload.clone(), now),
    }
}

fn refuse(session: &mut Session, iq: &Iq, condition: DefinedCondition) {
    let Some(id) = iq.id.clone() else { return };
    let error = StanzaError::new(ErrorType::Cancel, condition, None);
    let mut answer = Iq::from_error(id, error);
    answer.to = iq.from.clone();
    session.send_element(answer);
}

fn handle_iq_get(session: &mut Session, iq: &Iq, payload: Element, now: i64) {
    let Some(id) = iq.id.clone() else { return };
    let to = iq.from.clone();
    if payload.is("ping", ns::PING) && Ping::try_from(payload.clone()).is_ok() {
        session.send_element(Iq::empty_result(to, id));
    } else if payload.is("query", ns::VERSION) {
        let os = if session.config.iq_version_hide_os {
            None
        } else {
            Some(std::env::consts::OS.to_owned())
        };
        let result = VersionResult {
            name: CLIENT_NAME.to_owned(),
            version: CLIENT_VERSION.to_owned(),
            os,
        };
        let mut answer = Iq::from_result(id, Some(result));
        answer.to = to;
        session.send_element(answer);
    } else if payload.is("time", ns::TIME) {
        let tzo = Local::now().offset().fix();
        let result = TimeResult {
            tzo,
            utc: Utc::now(),
        };
        let mut answer = Iq::from_result(id, Some(result));
        answer.to = to;
        session.send_element(answer);
    } else if payload.is("query", ns::LAST) {
        let result = LastActivity {
            seconds: Some((now - session.last_use).max(0) as u64),
            status: None,
        };
        let mut answer = Iq::from_result(id, Some(result));
        answer.to = to;
        session.send_element(answer);
    } else if payload.is("query", ns::DISCO_INFO) {
        let node = payload.attr("node").map(String::from);
        let mut answer = Iq::from_result(id, Some(session.caps.own_info(node.as_deref())));
        answer.to = to;
        session.send_element(answer);
    } else if payload.is("query", ns::DISCO_ITEMS) {
        let node = DiscoItemsQuery::try_from(payload.clone())
            .ok()
            .and_then(|query| query.node);
        let mut result = DiscoItemsResult {
            node: node.clone(),
            items: Vec::new(),
        };
        if node.as_deref() == Some(ns::COMMANDS) {
            if let Some(own) = session.bound_jid.clone() {
                for (node, name) in [
                    (ns::RC_SET_STATUS, "Change client status"),
                    (ns::RC_LEAVE_GROUPCHATS, "Leave groupchat(s)"),
                ] {
                    result.items.push(DiscoItem {
                        jid: Jid::from(own.clone()),
                        node: Some(node.to_owned()),
                        name: Some(name.to_owned()),
                    });
                }
            }
        }
        let mut answer = Iq::from_result(id, Some(result));
        answer.to = to;
        session.send_element(answer);
    } else {
        refuse(session, iq, DefinedCondition::ServiceUnavailable);
    }
}

fn handle_iq_set(session: &mut Session, iq: &Iq, payload: Element, now: i64) {
    if payload.is("query", ns::ROSTER) {
        // Roster pushes only come from our own account.
        let from_ok = match &iq.from {
            None => true,
            Some(from) => from.to_bare() == session.config.jid,
        };
        if !from_ok {
            refuse(session, iq, DefinedCondition::NotAllowed);
            return;
        }
        if let Ok(query) = RosterQuery::try_from(payload) {
            apply_roster(session, query, now);
        }
        if let Some(id) = iq.id.clone() {
            session.send_element(Iq::empty_result(iq.from.clone(), id));
        }
    } else if payload.is("command", ns::COMMANDS) {
        handle_adhoc_command(session, iq, payload, now);
    } else {
        refuse(session, iq, DefinedCondition::FeatureNotImplemented);
    }
}

/// Applies a roster result or push to the local model (scenario: the
/// initial fetch and every later server push take the same path).
pub(crate) fn apply_roster(session: &mut Session, query: RosterQuery, now: i64) {
    for item in query.items {
        let bare = item.jid.to_string();
        if item.subscription == WireSub::Remove {
            session.roster.del_user(&bare);
            session.log_line(
                LineFlags::INFO,
                &format!("Buddy <{}> has been removed from the roster", bare),
                now,
            );
            continue;
        }
        let (subscription, pending) = crate::presence::apply_subscription(&item);
        let group = item.groups.first().cloned().unwrap_or_default();
        // No localpart means a gateway rather than a person.
        let agent = item.jid.node().is_none();
        session.roster.add_user(
            &item.jid,
            item.name.as_deref(),
            &group,
            EntryData::User(UserData {
                agent,
                subscription,
                pending,
                on_server: true,
                resources: Vec::new(),
            }),
            true,
        );
    }
    session.push_ui(Event::RosterUpdated);
}

/// Requests the roster after binding.
pub(crate) fn request_roster(session: &mut Session, now: i64) {
    session.send_query(
        "roster",
        |id| {
            Iq::from_get(
                id,
                RosterQuery {
                    ver: None,
                    items: Vec::new(),
                },
            )
        },
        now,
        0,
        Box::new(move |session, context| match context {
            IqContext::Result(iq) => {
                if let IqType::Result(Some(payload)) = &iq.payload {
                    if let Ok(query) = RosterQuery::try_from(payload.clone()) {
                        apply_roster(session, query, now);
                    }
                }
            }
            IqContext::Error(_) | IqContext::Timeout => {
                session.log_line(LineFlags::ERR, "Unable to retrieve the roster", now);
            }
        }),
    );
}

/// Sends a roster set (add, rename, move, or remove).
pub(crate) fn roster_set(
    session: &mut Session,
    jid: &jid::BareJid,
    name: Option<&str>,
    group: Option<&str>,
    remove: bool,
    now: i64,
) {
    let item = if remove {
        RosterItem::remove(jid.clone())
    } else {
        RosterItem::new(
            jid.clone(),
            name.map(str::to_owned),
            group.filter(|group| !group.is_empty()).map(str::to_owned),
        )
    };
    let query = RosterQuery {
        ver: None,
        items: vec![item],
    };
    session.send_query(
        "roster",
        move |id| Iq::from_set(id, query),
        now,
        0,
        Box::new(|_session, context| {
            if let IqContext::Error(iq) = context {
                if let IqType::Error(error) = &iq.payload {
                    log::error!("roster update failed: {}", error.describe());
                }
            }
        }),
    );
}

/// Issues a software-version request (the `request version` verb).
pub(crate) fn request_version(session: &mut Session, to: Jid, now: i64) {
    let target = to.clone();
    session.send_query(
        "version",
        move |id| Iq::from_get(id, VersionQuery).with_to(to),
        now,
        90,
        Box::new(move |session, context| match context {
            IqContext::Result(iq) => {
                if let IqType::Result(Some(payload)) = &iq.payload {
                    if let Ok(version) = VersionResult::try_from(payload.clone()) {
                        let os = version
                            .os
                            .map(|os| format!(" ({})", os))
                            .unwrap_or_default();
                        session.log_line(
                            LineFlags::INFO,
                            &format!(
                                "Version from <{}>: {} {}{}",
                                target, version.name, version.version, os
                            ),
                            now,
                        );
                    }
                }
            }
            IqContext::Error(iq) => {
                if let IqType::Error(error) = &iq.payload {
                    session.log_line(
                        LineFlags::ERR,
                        &format!("Version request to <{}> failed: {}", target, error.describe()),
                        now,
                    );
                }
            }
            IqContext::Timeout => {
                session.log_line(
                    LineFlags::INFO,
                    &format!("No version reply from <{}>", target),
                    now,
                );
            }
        }),
    );
}

/// Issues an entity-time request (the `request time` verb).
pub(crate) fn request_time(session: &mut Session, to: Jid, now: i64) {
    let target = to.clone();
    session.send_query(
        "time",
        move |id| Iq::from_get(id, TimeQuery).with_to(to),
        now,
        90,
        Box::new(move |session, context| match context {
            IqContext::Result(iq) => {
                if let IqType::Result(Some(payload)) = &iq.payload {
                    if let Ok(time) = TimeResult::try_from(payload.clone()) {
                        session.log_line(
                            LineFlags::INFO,
                            &format!(
                                "Time from <{}>: {} (offset {})",
                                target,
                                time.utc.format("%Y-%m-%d %H:%M:%S UTC"),
                                time.tzo
                            ),
                            now,
                        );
                    }
                }
            }
            IqContext::Error(iq) => {
                if let IqType::Error(error) = &iq.payload {
                    session.log_line(
                        LineFlags::ERR,
                        &format!("Time request to <{}> failed: {}", target, error.describe()),
                        now,
                    );
                }
            }
            IqContext::Timeout => {
                session.log_line(
                    LineFlags::INFO,
                    &format!("No time reply from <{}>", target),
                    now,
                );
            }
        }),
    );
}

/// Issues a last-activity request (the `request last` verb).
pub(crate) fn request_last(session: &mut Session, to: Jid, now: i64) {
    let target = to.clone();
    session.send_query(
        "last",
        move |id| Iq::from_get(id, LastActivity::default()).with_to(to),
        now,
        90,
        Box::new(move |session, context| match context {
            IqContext::Result(iq) => {
                if let IqType::Result(Some(payload)) = &iq.payload {
                    if let Ok(last) = LastActivity::try_from(payload.clone()) {
                        let seconds = last.seconds.unwrap_or(0);
                        let status = last
                            .status
                            .map(|status| format!(" ({})", status))
                            .unwrap_or_default();
                        session.log_line(
                            LineFlags::INFO,
                            &format!(
                                "Last activity from <{}>: {} seconds ago{}",
                                target, seconds, status
                            ),
                            now,
                        );
                    }
                }
            }
            IqContext::Error(iq) => {
                if let IqType::Error(error) = &iq.payload {
                    session.log_line(
                        LineFlags::ERR,
                        &format!("Last request to <{}> failed: {}", target, error.describe()),
                        now,
                    );
                }
            }
            IqContext::Timeout => {
                session.log_line(
                    LineFlags::INFO,
                    &format!("No last-activity reply from <{}>", target),
                    now,
                );
            }
        }),
    );
}

/// Issues a vcard-temp request and prints the common fields.
pub(crate) fn request_vcard(session: &mut Session, to: Jid, now: i64) {
    let target = to.clone();
    session.send_query(
        "vcard",
        // A hand-assembled get: the vCard schema is too loose to type.
        move |id| Iq {
            from: None,
            to: Some(to),
            id: Some(id),
            payload: IqType::Get(Element::bare("vCard", "vcard-temp")),
        },
        now,
        90,
        Box::new(move |session, context| match context {
            IqContext::Result(iq) => {
                if let IqType::Result(Some(payload)) = &iq.payload {
                    if payload.is("vCard", "vcard-temp") {
                        session.log_line(
                            LineFlags::INFO,
                            &format!("vCard from <{}>:", target),
                            now,
                        );
                        for child in payload.children() {
                            let value = child.text();
                            if !value.trim().is_empty() {
                                session.log_line(
                                    LineFlags::INFO,
                                    &format!("  {}: {}", child.name(), value.trim()),
                                    now,
                                );
                            }
                        }
                    }
                }
            }
            IqContext::Error(iq) => {
                if let IqType::Error(error) = &iq.payload {
                    session.log_line(
                        LineFlags::ERR,
                        &format!("vCard request to <{}> failed: {}", target, error.describe()),
                        now,
                    );
                }
            }
            IqContext::Timeout => {
                session.log_line(
                    LineFlags::INFO,
                    &format!("No vCard reply from <{}>", target),
                    now,
                );
            }
        }),
    );
}

fn handle_adhoc_command(session: &mut Session, iq: &Iq, payload: Element, now: i64) {
    let allowed = session.config.allow_remote_control
        && match &iq.from {
            Some(from) => from.to_bare() == session.config.jid,
            None => true,
        };
    if !allowed {
        refuse(session, iq, DefinedCondition::Forbidden);
        return;
    }
    let Ok(command) = Command::try_from(payload) else {
        refuse(session, iq, DefinedCondition::BadRequest);
        return;
    };
    let Some(id) = iq.id.clone() else { return };
    let to = iq.from.clone();

    if command.action == Some(Action::Cancel) {
        let answer = Command {
            node: command.node,
            sessionid: command.sessionid,
            action: None,
            status: Some(CommandStatus::Canceled),
            form: None,
            note: None,
        };
        let mut answer = Iq::from_result(id, Some(answer));
        answer.to = to;
        session.send_element(answer);
        return;
    }

    match command.node.as_str() {
        ns::RC_SET_STATUS => {
            if let Some(form) = &command.form {
                // Submitted form: apply the chosen status.
                let chosen = form
                    .fields
                    .iter()
                    .find(|field| field.var.as_deref() == Some("status"))
                    .and_then(|field| field.values.first().cloned());
                if let Some(chosen) = chosen {
                    let status = match chosen.as_str() {
                        "online" => crate::roster::Status::Available,
                        "chat" => crate::roster::Status::FreeForChat,
                        "away" => crate::roster::Status::Away,
                        "xa" => crate::roster::Status::NotAvailable,
                        "dnd" => crate::roster::Status::DoNotDisturb,
                        "invisible" => crate::roster::Status::Invisible,
                        _ => crate::roster::Status::Available,
                    };
                    crate::presence::set_status(session, status, None, now);
                }
                let answer = Command {
                    node: command.node,
                    sessionid: command.sessionid,
                    action: None,
                    status: Some(CommandStatus::Completed),
                    form: None,
                    note: Some("Status has been changed".to_owned()),
                };
                let mut answer = Iq::from_result(id, Some(answer));
                answer.to = to;
                session.send_element(answer);
            } else {
                // First stage: offer the form.
                let form = DataForm {
                    type_: causerie_stanza::data_forms::DataFormType::Form,
                    form_type: None,
                    fields: vec![causerie_stanza::data_forms::Field {
                        var: Some("status".to_owned()),
                        type_: Some("list-single".to_owned()),
                        values: vec!["online".to_owned()],
                    }],
                };
                let answer = Command {
                    node: command.node,
                    sessionid: Some(format!("rc-{}", now)),
                    action: None,
                    status: Some(CommandStatus::Executing),
                    form: Some(form),
                    note: None,
                };
                let mut answer = Iq::from_result(id, Some(answer));
                answer.to = to;
                session.send_element(answer);
            }
        }
        ns::RC_LEAVE_GROUPCHATS => {
            let rooms: Vec<String> = session
                .roster
                .iter_type(crate::roster::TypeMask::ROOM)
                .filter(|(_, entry)| entry.inside_room())
                .map(|(_, entry)| entry.jid.clone())
                .collect();
            for room in rooms {
                crate::muc::leave(session, &room, Some("Requested by remote control"), now);
            }
            let answer = Command {
                node: command.node,
                sessionid: command.sessionid,
                action: None,
                status: Some(CommandStatus::Completed),
                form: None,
                note: Some("Groupchats have been left".to_owned()),
            };
            let mut answer = Iq::from_result(id, Some(answer));
            answer.to = to;
            session.send_element(answer);
        }
        _ => {
            refuse(session, iq, DefinedCondition::ItemNotFound);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> IqCallback {
        Box::new(|_, _| ())
    }

    #[test]
    fn test_ids_are_unique_and_monotonic() {
        let mut correlator = IqCorrelator::new();
        let a = correlator.next_id(None);
        let b = correlator.next_id(Some("version"));
        assert_ne!(a, b);
        assert_eq!(a, "1");
        assert_eq!(b, "version_2");
    }

    #[test]
    fn test_take_removes() {
        let mut correlator = IqCorrelator::new();
        let id = correlator.next_id(None);
        correlator.register(id.clone(), 0, 90, noop());
        assert_eq!(correlator.len(), 1);
        assert!(correlator.take(&id).is_some());
        assert!(correlator.take(&id).is_none());
        assert!(correlator.is_empty());
    }

    #[test]
    fn test_sweep_fires_once() {
        let mut correlator = IqCorrelator::new();
        let id = correlator.next_id(None);
        correlator.register(id, 0, 90, noop());
        assert!(correlator.sweep(89).is_empty());
        assert_eq!(correlator.sweep(91).len(), 1);
        // A later sweep finds nothing: the record is gone.
        assert!(correlator.sweep(200).is_empty());
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let mut correlator = IqCorrelator::new();
        let id = correlator.next_id(None);
        correlator.register(id, 100, 0, noop());
        assert!(correlator.sweep(100 + IQS_MAX_TIMEOUT - 1).is_empty());
        assert_eq!(correlator.sweep(100 + IQS_MAX_TIMEOUT).len(), 1);
    }
}
