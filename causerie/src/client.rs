// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The driver loop: one task owning the socket, the session state and
//! the coarse timer.
//!
//! Everything interesting happens inside [`Session`]; this wrapper only
//! moves bytes between the socket and the session, runs the one-second
//! tick, schedules keep-alive pings, and arms the reconnect timer.

use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval, Instant, Interval, MissedTickBehavior};

use causerie_stanza::iq::Iq;
use causerie_stanza::ping::Ping;
use causerie_stanza::xmlstream::{Packet, XmlStream};

use crate::config::SessionConfig;
use crate::connect::{connect, Transport};
use crate::error::Error;
use crate::event::Event;
use crate::hbuf::LineFlags;
use crate::iq::IqContext;
use crate::login::login;
use crate::session::{ConnState, Session};

/// A connected (or connecting, or idle) client.
pub struct Client {
    session: Session,
    stream: Option<XmlStream<Transport>>,
    reconnect_at: Option<Instant>,
    tick: Interval,
    last_ping: i64,
}

fn now_ts() -> i64 {
    Utc::now().timestamp()
}

impl Client {
    /// Builds a client; nothing is connected yet.
    pub fn new(config: SessionConfig) -> Client {
        let mut tick = interval(Duration::from_secs(1));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Client {
            session: Session::new(config),
            stream: None,
            reconnect_at: None,
            tick,
            last_ping: 0,
        }
    }

    /// The session, for issuing operations and reading state.
    pub fn session(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Read-only session access.
    pub fn session_ref(&self) -> &Session {
        &self.session
    }

    /// Connects and authenticates; the `connect` verb.
    pub async fn connect(&mut self) -> Result<(), Error> {
        if self.stream.is_some() {
            return Ok(());
        }
        let now = now_ts();
        self.reconnect_at = None;
        self.session.set_state(ConnState::Connecting);
        let transport = match connect(&self.session.config).await {
            Ok(transport) => transport,
            Err(e) => {
                self.connection_lost(Some(e.to_string()), now);
                return Err(e);
            }
        };
        self.session.set_state(ConnState::Authenticating);
        match login(transport, &self.session.config).await {
            Ok((jid, stream)) => {
                self.stream = Some(stream);
                self.last_ping = now;
                self.session.on_bound(jid, now);
                Ok(())
            }
            Err(e) => {
                if let Error::Auth(auth) = &e {
                    // A bad password never retries by itself.
                    self.session.set_state(ConnState::Disconnected);
                    self.session.push_ui(Event::AuthFailed(auth.to_string()));
                } else {
                    self.connection_lost(Some(e.to_string()), now);
                }
                Err(e)
            }
        }
    }

    /// Closes the stream politely; the `disconnect` verb.
    pub async fn disconnect(&mut self) {
        let now = now_ts();
        self.reconnect_at = None;
        if let Some(mut stream) = self.stream.take() {
            // Announce unavailability, then the stream footer.
            crate::presence::announce_status(
                &mut self.session,
                crate::roster::Status::Offline,
                None,
                now,
            );
            self.session.set_state(ConnState::Disconnecting);
            for element in self.session.take_outgoing() {
                let _ = stream.send_stanza(&element).await;
            }
            let _ = stream.close().await;
        }
        self.session.on_disconnected(None, now);
        self.session.save_state();
    }

    fn connection_lost(&mut self, reason: Option<String>, now: i64) {
        self.stream = None;
        self.session.on_disconnected(reason, now);
        if self.session.config.auto_connect {
            let delay = self.session.config.reconnect_delay.max(1) as u64;
            self.reconnect_at = Some(Instant::now() + Duration::from_secs(delay));
            self.session.log_line(
                LineFlags::INFO,
                &format!("Reconnecting in {} seconds", delay),
                now,
            );
        }
    }

    async fn flush_outgoing(&mut self) -> Result<(), Error> {
        let outgoing = self.session.take_outgoing();
        if outgoing.is_empty() {
            return Ok(());
        }
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };
        for element in outgoing {
            stream.send_stanza(&element).await?;
        }
        Ok(())
    }

    fn keepalive(&mut self, now: i64) {
        let interval = self.session.config.ping_interval;
        if interval <= 0 || !self.session.is_online() {
            return;
        }
        if now - self.last_ping < interval {
            return;
        }
        self.last_ping = now;
        let id = self.session.iq.next_id(Some("ping"));
        self.session.iq.register(
            id.clone(),
            now,
            60,
            Box::new(|session, context| {
                if matches!(context, IqContext::Timeout) && session.is_online() {
                    log::warn!("keep-alive ping went unanswered");
                }
            }),
        );
        self.session.send_element(Iq::from_get(id, Ping));
    }

    /// Runs one step of the main loop and returns the UI events it
    /// produced.  Call this repeatedly; it multiplexes the socket and the
    /// coarse timer and never blocks longer than one tick.
    pub async fn wait_for_events(&mut self) -> Vec<Event> {
        enum Step {
            Packet(Result<Option<Packet>, causerie_stanza::Error>),
            Tick,
        }

        // Flush whatever synchronous operations queued up since the last
        // step.
        if let Err(e) = self.flush_outgoing().await {
            self.connection_lost(Some(e.to_string()), now_ts());
        }

        let step = match self.stream.as_mut() {
            Some(stream) => {
                tokio::select! {
                    packet = stream.next_packet() => Step::Packet(packet),
                    _ = self.tick.tick() => Step::Tick,
                }
            }
            None => {
                self.tick.tick().await;
                Step::Tick
            }
        };

        let now = now_ts();
        match step {
            Step::Packet(Ok(Some(Packet::Stanza(element)))) => {
                self.session.handle_element(element, now);
            }
            Step::Packet(Ok(Some(Packet::StreamStart(_)))) => {}
            Step::Packet(Ok(Some(Packet::StreamEnd))) => {
                self.stream = None;
                self.connection_lost(Some("stream closed by peer".to_owned()), now);
            }
            Step::Packet(Ok(None)) => {
                self.stream = None;
                self.connection_lost(Some("connection closed".to_owned()), now);
            }
            Step::Packet(Err(e)) => {
                self.stream = None;
                self.connection_lost(Some(e.to_string()), now);
            }
            Step::Tick => {
                self.session.tick(now);
                self.keepalive(now);
                if self.stream.is_none() {
                    if let Some(when) = self.reconnect_at {
                        if Instant::now() >= when {
                            self.reconnect_at = None;
                            let _ = self.connect().await;
                        }
                    }
                }
            }
        }

        if let Err(e) = self.flush_outgoing().await {
            self.connection_lost(Some(e.to_string()), now_ts());
        }
        self.session.take_events()
    }
}
