// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! End-to-end session scenarios, driven without a socket: stanzas are
//! injected as parsed elements and the transmit queue is inspected.

use jid::BareJid;

use causerie::roster::{ChatStateSupport, EntryData, Subscription, STATUS_BUFFER_ID};
use causerie::stanza::ns;
use causerie::stanza::Element;
use causerie::{EventContext, Session, SessionBuilder, SessionConfig, Status};

fn config() -> SessionConfig {
    SessionBuilder::new(BareJid::new("me@example.net").unwrap(), "secret").build()
}

fn online(config: SessionConfig, now: i64) -> Session {
    let mut session = Session::new(config);
    session.on_bound("me@example.net/causerie".parse().unwrap(), now);
    session.take_outgoing();
    session.take_events();
    session
}

fn inject(session: &mut Session, xml: &str, now: i64) {
    let element: Element = xml.parse().unwrap();
    session.handle_element(element, now);
}

fn find_with_child<'a>(
    outgoing: &'a [Element],
    name: &str,
    namespace: &str,
) -> Option<&'a Element> {
    outgoing
        .iter()
        .find(|element| element.get_child(name, namespace).is_some())
}

fn status_buffer_text(session: &Session) -> String {
    session
        .buffer(STATUS_BUFFER_ID)
        .map(|buffer| buffer.persistent_texts().join("\n"))
        .unwrap_or_default()
}

#[test]
fn s1_roster_population() {
    let mut session = Session::new(config());
    session.on_bound("me@example.net/causerie".parse().unwrap(), 100);
    let outgoing = session.take_outgoing();
    let roster_iq = find_with_child(&outgoing, "query", ns::ROSTER).expect("roster request");
    let id = roster_iq.attr("id").unwrap();

    inject(
        &mut session,
        &format!(
            "<iq xmlns='jabber:client' type='result' id='{}'>\
             <query xmlns='jabber:iq:roster'>\
             <item jid='alice@ex' name='Alice' subscription='both'/>\
             <item jid='bob@ex' subscription='from' ask='subscribe'/>\
             </query></iq>",
            id
        ),
        101,
    );

    let alice = session.roster.find("alice@ex").expect("alice on roster");
    match &session.roster.get(alice).unwrap().data {
        EntryData::User(user) => {
            assert_eq!(user.subscription, Subscription::Both);
            assert!(!user.pending);
            assert!(user.on_server);
        }
        _ => panic!("alice should be a user entry"),
    }
    let bob = session.roster.find("bob@ex").expect("bob on roster");
    match &session.roster.get(bob).unwrap().data {
        EntryData::User(user) => {
            assert_eq!(user.subscription, Subscription::From);
            assert!(user.pending);
        }
        _ => panic!("bob should be a user entry"),
    }
    assert_eq!(session.roster.get(alice).unwrap().name, "Alice");
    // The buddylist view includes both contacts.
    let view = session.roster.buddylist().to_vec();
    assert!(view.contains(&alice));
    assert!(view.contains(&bob));
    assert!(session
        .take_events()
        .iter()
        .any(|event| matches!(event, causerie::Event::RosterUpdated)));
}

#[test]
fn s2_chatstate_probe_and_reply() {
    let mut session = online(config(), 100);
    inject(
        &mut session,
        "<message xmlns='jabber:client' from='alice@ex/desk' type='chat'>\
         <body>hi</body>\
         <active xmlns='http://jabber.org/protocol/chatstates'/></message>",
        101,
    );

    // Support is now proven for that resource.
    let key = session.roster.find("alice@ex").unwrap();
    let resource = session
        .roster
        .get(key)
        .unwrap()
        .resources()
        .iter()
        .find(|resource| resource.name == "desk")
        .expect("resource recorded");
    assert_eq!(resource.chat_states.support, ChatStateSupport::Ok);

    // The message landed in Alice's buffer, unhighlighted.
    let buffer = session.buffer("alice@ex").unwrap();
    let rows = buffer.get_lines(None, 10);
    assert_eq!(rows.last().unwrap().text, "hi");
    assert!(rows
        .last()
        .unwrap()
        .flags
        .contains(causerie::hbuf::LineFlags::IN));
    assert!(!rows
        .last()
        .unwrap()
        .flags
        .contains(causerie::hbuf::LineFlags::HIGHLIGHT));

    // The next outgoing message carries an <active/> child.
    session
        .say_to("alice@ex".parse().unwrap(), "hello back", 102)
        .unwrap();
    let outgoing = session.take_outgoing();
    let message = find_with_child(&outgoing, "body", ns::JABBER_CLIENT).expect("message sent");
    assert!(message.get_child("active", ns::CHATSTATES).is_some());
}

#[test]
fn s3_unread_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let state_file = dir.path().join("state");
    let base = SessionBuilder::new(BareJid::new("me@example.net").unwrap(), "secret")
        .state_file(&state_file)
        .history_dir(dir.path())
        .build();

    let mut session = online(base.clone(), 100);
    inject(
        &mut session,
        "<message xmlns='jabber:client' from='carol@ex' type='chat'>\
         <body>psst</body></message>",
        101,
    );
    // Carol was not on the roster; a placeholder entry carries the flag.
    assert!(session.roster.unread_jids().contains(&"carol@ex".to_owned()));
    session.on_disconnected(None, 102);
    session.save_state();

    // Restart: the state file seeds the unread set before any roster.
    let mut session = Session::new(base);
    assert!(session.roster.unread_jids().contains(&"carol@ex".to_owned()));
    session.on_bound("me@example.net/causerie".parse().unwrap(), 200);
    let outgoing = session.take_outgoing();
    let id = find_with_child(&outgoing, "query", ns::ROSTER)
        .unwrap()
        .attr("id")
        .unwrap()
        .to_owned();
    // The roster comes back without Carol; the mark survives.
    inject(
        &mut session,
        &format!(
            "<iq xmlns='jabber:client' type='result' id='{}'>\
             <query xmlns='jabber:iq:roster'>\
             <item jid='alice@ex' subscription='both'/></query></iq>",
            id
        ),
        201,
    );
    assert!(session.roster.unread_jids().contains(&"carol@ex".to_owned()));
    // Carol later appears through a roster push; the flag is applied.
    inject(
        &mut session,
        "<iq xmlns='jabber:client' type='set' id='push1'>\
         <query xmlns='jabber:iq:roster'>\
         <item jid='carol@ex' subscription='to'/></query></iq>",
        202,
    );
    let carol = session.roster.find("carol@ex").unwrap();
    assert!(session.roster.get(carol).unwrap().flags.msg_pending);
}

#[test]
fn s5_muc_join_conflict() {
    let mut session = online(config(), 100);
    session
        .room_join(
            &BareJid::new("foo@conf").unwrap(),
            Some("alice"),
            None,
            101,
        )
        .unwrap();
    let outgoing = session.take_outgoing();
    let join = find_with_child(&outgoing, "x", ns::MUC).expect("join presence");
    assert_eq!(join.attr("to"), Some("foo@conf/alice"));

    inject(
        &mut session,
        "<presence xmlns='jabber:client' from='foo@conf/alice' type='error'>\
         <error type='cancel' code='409'>\
         <conflict xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/></error></presence>",
        102,
    );

    let key = session.roster.find("foo@conf").unwrap();
    let entry = session.roster.get(key).unwrap();
    assert!(entry.resources().is_empty());
    match &entry.data {
        EntryData::Room(room) => assert_eq!(room.nickname, None),
        _ => panic!("foo@conf should be a room"),
    }
    let buffer = session.buffer("foo@conf").unwrap();
    assert!(buffer
        .persistent_texts()
        .iter()
        .any(|line| line.contains("already in use")));
}

#[test]
fn muc_join_and_topic() {
    let mut session = online(config(), 100);
    session
        .room_join(&BareJid::new("foo@conf").unwrap(), Some("alice"), None, 101)
        .unwrap();
    session.take_outgoing();

    inject(
        &mut session,
        "<presence xmlns='jabber:client' from='foo@conf/alice'>\
         <x xmlns='http://jabber.org/protocol/muc#user'>\
         <item affiliation='member' role='participant'/>\
         <status code='110'/></x></presence>",
        102,
    );
    let key = session.roster.find("foo@conf").unwrap();
    assert!(session.roster.get(key).unwrap().inside_room());
    assert!(session
        .take_events()
        .iter()
        .any(|event| matches!(event, causerie::Event::RoomJoined(room) if room == "foo@conf")));

    inject(
        &mut session,
        "<presence xmlns='jabber:client' from='foo@conf/bob'>\
         <x xmlns='http://jabber.org/protocol/muc#user'>\
         <item affiliation='none' role='participant'/></x></presence>",
        103,
    );
    inject(
        &mut session,
        "<message xmlns='jabber:client' from='foo@conf/bob' type='groupchat'>\
         <subject>hbuf internals</subject></message>",
        104,
    );
    let entry = session.roster.get(key).unwrap();
    match &entry.data {
        EntryData::Room(room) => assert_eq!(room.topic.as_deref(), Some("hbuf internals")),
        _ => panic!(),
    }

    // A room message mentioning our nick is highlighted.
    inject(
        &mut session,
        "<message xmlns='jabber:client' from='foo@conf/bob' type='groupchat'>\
         <body>alice: ping</body></message>",
        105,
    );
    let buffer = session.buffer("foo@conf").unwrap();
    let rows = buffer.get_lines(None, 50);
    let line = rows.last().unwrap();
    assert_eq!(line.text, "bob> alice: ping");
    assert!(line.flags.contains(causerie::hbuf::LineFlags::HIGHLIGHT));
    assert_eq!(line.nick_len, "bob>".len());
}

#[test]
fn s6_iq_timeout_fires_once() {
    let mut session = online(config(), 0);
    session.request_version("bob@ex/mob".parse().unwrap(), 0);
    let outgoing = session.take_outgoing();
    assert!(find_with_child(&outgoing, "query", ns::VERSION).is_some());

    session.tick(89);
    assert!(!status_buffer_text(&session).contains("No version reply"));
    session.tick(91);
    let text = status_buffer_text(&session);
    assert_eq!(text.matches("No version reply").count(), 1);
    session.tick(200);
    let text = status_buffer_text(&session);
    assert_eq!(text.matches("No version reply").count(), 1);
}

#[test]
fn iq_result_resolves_callback() {
    let mut session = online(config(), 0);
    session.request_version("bob@ex/mob".parse().unwrap(), 0);
    let outgoing = session.take_outgoing();
    let id = find_with_child(&outgoing, "query", ns::VERSION)
        .unwrap()
        .attr("id")
        .unwrap()
        .to_owned();
    inject(
        &mut session,
        &format!(
            "<iq xmlns='jabber:client' type='result' id='{}' from='bob@ex/mob'>\
             <query xmlns='jabber:iq:version'>\
             <name>mcabber</name><version>1.1.2</version></query></iq>",
            id
        ),
        5,
    );
    assert!(status_buffer_text(&session).contains("mcabber 1.1.2"));
    // A later sweep has nothing left to fire.
    session.tick(300);
    assert_eq!(
        status_buffer_text(&session)
            .matches("No version reply")
            .count(),
        0
    );
}

#[test]
fn chatstates_never_repeat() {
    let mut session = online(config(), 100);
    // Prove support first.
    inject(
        &mut session,
        "<message xmlns='jabber:client' from='alice@ex/desk' type='chat'>\
         <active xmlns='http://jabber.org/protocol/chatstates'/>\
         <body>yo</body></message>",
        100,
    );
    session.take_outgoing();

    session.set_composing("alice@ex", true, 101);
    session.set_composing("alice@ex", true, 102);
    session.set_composing("alice@ex", true, 103);
    let outgoing = session.take_outgoing();
    let composing: Vec<_> = outgoing
        .iter()
        .filter(|element| element.get_child("composing", ns::CHATSTATES).is_some())
        .collect();
    assert_eq!(composing.len(), 1);

    // The compose timeout produces exactly one paused.
    session.tick(110);
    session.tick(111);
    let outgoing = session.take_outgoing();
    let paused: Vec<_> = outgoing
        .iter()
        .filter(|element| element.get_child("paused", ns::CHATSTATES).is_some())
        .collect();
    assert_eq!(paused.len(), 1);

    // Leaving compose goes back to active, once.
    session.set_composing("alice@ex", false, 115);
    let outgoing = session.take_outgoing();
    let active: Vec<_> = outgoing
        .iter()
        .filter(|element| element.get_child("active", ns::CHATSTATES).is_some())
        .collect();
    assert_eq!(active.len(), 1);
}

#[test]
fn autoaway_saves_and_restores() {
    let config = SessionBuilder::new(BareJid::new("me@example.net").unwrap(), "secret")
        .autoaway(300)
        .build();
    let mut session = online(config, 1000);
    session.user_activity(1000);
    session.take_outgoing();
    session.take_events();

    // Not yet idle.
    session.tick(1200);
    assert!(session.take_outgoing().is_empty());

    // Idle long enough: exactly one away broadcast.
    session.tick(1301);
    let outgoing = session.take_outgoing();
    assert_eq!(outgoing.len(), 1);
    let presence = &outgoing[0];
    assert_eq!(
        presence.get_child("show", ns::JABBER_CLIENT).unwrap().text(),
        "away"
    );
    // The next tick does not repeat it.
    session.tick(1302);
    assert!(session.take_outgoing().is_empty());

    // First activity restores the saved status, once.
    session.user_activity(1400);
    let outgoing = session.take_outgoing();
    assert_eq!(outgoing.len(), 1);
    assert!(outgoing[0].get_child("show", ns::JABBER_CLIENT).is_none());
    session.user_activity(1401);
    assert!(session.take_outgoing().is_empty());
}

#[test]
fn subscription_request_creates_event() {
    let mut session = online(config(), 100);
    inject(
        &mut session,
        "<presence xmlns='jabber:client' from='dave@ex' type='subscribe'/>",
        101,
    );
    let pending = session.pending_events();
    assert_eq!(pending.len(), 1);
    let (id, description) = pending[0].clone();
    assert!(description.contains("dave@ex"));

    // Accepting answers with <presence type='subscribed'/>.
    assert!(session.event_resolve(&id, EventContext::Accept));
    let outgoing = session.take_outgoing();
    let answer = outgoing
        .iter()
        .find(|element| element.attr("type") == Some("subscribed"))
        .expect("subscribed answer");
    assert_eq!(answer.attr("to"), Some("dave@ex"));
    assert!(session.pending_events().is_empty());
    // Resolving again fails: the event is gone.
    assert!(!session.event_resolve(&id, EventContext::Accept));
}

#[test]
fn bookmarks_roundtrip_and_autojoin() {
    let mut session = Session::new(config());
    session.on_bound("me@example.net/causerie".parse().unwrap(), 100);
    let outgoing = session.take_outgoing();
    let bookmarks_id = outgoing
        .iter()
        .filter_map(|element| {
            let query = element.get_child("query", ns::PRIVATE)?;
            query.get_child("storage", ns::BOOKMARKS)?;
            element.attr("id").map(str::to_owned)
        })
        .next()
        .expect("bookmark fetch");

    inject(
        &mut session,
        &format!(
            "<iq xmlns='jabber:client' type='result' id='{}'>\
             <query xmlns='jabber:iq:private'>\
             <storage xmlns='storage:bookmarks'>\
             <conference jid='tavern@conf.ex' autojoin='1'><nick>rosencrantz</nick></conference>\
             <conference jid='quiet@conf.ex'/>\
             </storage></query></iq>",
            bookmarks_id
        ),
        101,
    );

    // The autojoin bookmark triggered a join with its nick.
    let outgoing = session.take_outgoing();
    let join = find_with_child(&outgoing, "x", ns::MUC).expect("autojoin presence");
    assert_eq!(join.attr("to"), Some("tavern@conf.ex/rosencrantz"));
    // The non-autojoin one did not.
    assert!(!outgoing
        .iter()
        .any(|element| element.attr("to") == Some("quiet@conf.ex")));

    // A mutation pushes the whole document back.
    session.del_bookmark(&BareJid::new("quiet@conf.ex").unwrap(), 102);
    let outgoing = session.take_outgoing();
    let push = outgoing
        .iter()
        .find(|element| element.get_child("query", ns::PRIVATE).is_some())
        .expect("bookmark push");
    let storage = push
        .get_child("query", ns::PRIVATE)
        .unwrap()
        .get_child("storage", ns::BOOKMARKS)
        .unwrap();
    let remaining: Vec<_> = storage.children().collect();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].attr("jid"), Some("tavern@conf.ex"));
}

#[test]
fn server_iq_get_version_answered() {
    let mut session = online(config(), 100);
    inject(
        &mut session,
        "<iq xmlns='jabber:client' type='get' id='v1' from='alice@ex/desk'>\
         <query xmlns='jabber:iq:version'/></iq>",
        101,
    );
    let outgoing = session.take_outgoing();
    let answer = find_with_child(&outgoing, "query", ns::VERSION).expect("version answer");
    assert_eq!(answer.attr("type"), Some("result"));
    assert_eq!(answer.attr("id"), Some("v1"));
    assert_eq!(answer.attr("to"), Some("alice@ex/desk"));
    let name = answer
        .get_child("query", ns::VERSION)
        .unwrap()
        .get_child("name", ns::VERSION)
        .unwrap()
        .text();
    assert_eq!(name, "causerie");
}

#[test]
fn unknown_iq_get_is_refused() {
    let mut session = online(config(), 100);
    inject(
        &mut session,
        "<iq xmlns='jabber:client' type='get' id='x1' from='alice@ex/desk'>\
         <query xmlns='urn:example:unknown'/></iq>",
        101,
    );
    let outgoing = session.take_outgoing();
    let answer = outgoing
        .iter()
        .find(|element| element.attr("id") == Some("x1"))
        .expect("error answer");
    assert_eq!(answer.attr("type"), Some("error"));
    assert!(answer
        .get_child("error", ns::JABBER_CLIENT)
        .unwrap()
        .has_child("service-unavailable", ns::XMPP_STANZAS));
}

#[test]
fn block_unsubscribed_drops_strangers() {
    let config = SessionBuilder::new(BareJid::new("me@example.net").unwrap(), "secret")
        .tweak(|config| config.block_unsubscribed = true)
        .build();
    let mut session = online(config, 100);
    inject(
        &mut session,
        "<message xmlns='jabber:client' from='spam@ex' type='chat'>\
         <body>buy now</body></message>",
        101,
    );
    assert!(session.buffer("spam@ex").is_none());
}

#[test]
fn disconnect_cancels_pending_iqs() {
    let mut session = online(config(), 0);
    session.request_version("bob@ex".parse().unwrap(), 0);
    session.take_outgoing();
    // Also park a user event; it must survive the disconnect.
    inject(
        &mut session,
        "<presence xmlns='jabber:client' from='dave@ex' type='subscribe'/>",
        1,
    );
    session.on_disconnected(Some("connection reset".to_owned()), 2);
    // The pending IQ got a synthetic timeout right away.
    assert!(status_buffer_text(&session).contains("No version reply"));
    assert_eq!(session.pending_events().len(), 1);
}

#[test]
fn inbound_receipt_request_is_acked() {
    let mut session = online(config(), 100);
    inject(
        &mut session,
        "<message xmlns='jabber:client' from='alice@ex/desk' type='chat' id='m77'>\
         <body>did you get this?</body>\
         <request xmlns='urn:xmpp:receipts'/></message>",
        101,
    );
    let outgoing = session.take_outgoing();
    let ack = find_with_child(&outgoing, "received", ns::RECEIPTS).expect("receipt ack");
    assert_eq!(
        ack.get_child("received", ns::RECEIPTS).unwrap().attr("id"),
        Some("m77")
    );
}

#[test]
fn delayed_message_keeps_original_timestamp() {
    let mut session = online(config(), 1_600_000_000);
    inject(
        &mut session,
        "<message xmlns='jabber:client' from='alice@ex/desk' type='chat'>\
         <body>offline msg</body>\
         <delay xmlns='urn:xmpp:delay' stamp='2020-01-02T03:04:05Z'/></message>",
        1_600_000_000,
    );
    let buffer = session.buffer("alice@ex").unwrap();
    let rows = buffer.get_lines(None, 10);
    assert_eq!(rows.last().unwrap().timestamp, 1_577_934_245);
}

#[test]
fn status_to_sends_directed_presence() {
    let mut session = online(config(), 100);
    session.status_to(
        "alice@ex".parse().unwrap(),
        Status::DoNotDisturb,
        Some("focus".to_owned()),
        101,
    );
    let outgoing = session.take_outgoing();
    let presence = outgoing
        .iter()
        .find(|element| element.attr("to") == Some("alice@ex"))
        .expect("directed presence");
    assert_eq!(
        presence.get_child("show", ns::JABBER_CLIENT).unwrap().text(),
        "dnd"
    );
    assert_eq!(
        presence
            .get_child("status", ns::JABBER_CLIENT)
            .unwrap()
            .text(),
        "focus"
    );
    // A directed status does not change the broadcast one.
    assert!(session.is_online());
}
