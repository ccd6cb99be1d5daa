// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::path::PathBuf;

use jid::BareJid;

use crate::muc::PrintStatusPolicy;

/// How the TCP connection is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// No TLS at all.
    Plaintext,
    /// TLS-from-the-start on the legacy port (default 5223).
    LegacySsl,
    /// STARTTLS upgrade on the standard port (default 5222).
    StartTls,
}

/// Per-contact encryption settings.
#[derive(Debug, Clone, Default)]
pub struct ContactCrypto {
    /// Key id used to encrypt to this contact.
    pub pgp_key_id: Option<String>,
    /// Refuse to send when encryption fails.
    pub force: bool,
    /// Never encrypt to this contact.
    pub disabled: bool,
}

/// Everything the session needs to know before connecting.  Built with
/// [`SessionBuilder`]; the option names follow the classic console-client
/// settings they came from.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Our account.
    pub jid: BareJid,
    /// Account password.
    pub password: String,
    /// Server host override; defaults to the JID domain.
    pub server: Option<String>,
    /// Port override.
    pub port: Option<u16>,
    /// Transport protection.
    pub tls: TlsMode,
    /// Pinned SHA-1 fingerprint of the server certificate, hex encoded.
    pub ssl_fingerprint: Option<String>,
    /// Accept certificates the backend rejects (self-signed and such).
    pub ssl_ignore_checks: bool,
    /// Preferred resource.
    pub resource: String,
    /// Presence priority.
    pub priority: i8,
    /// Reconnect automatically after a lost connection.
    pub auto_connect: bool,
    /// Delay before an automatic reconnect, seconds.
    pub reconnect_delay: i64,
    /// Keep-alive ping interval, seconds; 0 disables.
    pub ping_interval: i64,
    /// Directory for per-contact history files; `None` disables logging.
    pub history_dir: Option<PathBuf>,
    /// Load existing logs into buffers on first open.
    pub load_logs: bool,
    /// Skip status lines when writing history.
    pub logging_ignore_status: bool,
    /// Also replay logs for MUC buffers.
    pub load_muc_logs: bool,
    /// Ignore history entries older than this many days; 0 keeps all.
    pub max_history_age: u32,
    /// Per-buffer cap on 8 KiB history blocks; 0 means unbounded.
    pub max_history_blocks: usize,
    /// Path of the unread-state file.
    pub state_file: Option<PathBuf>,
    /// Seconds of idleness before switching to away; 0 disables.
    pub autoaway: i64,
    /// Status message used when autoaway triggers.
    pub message_autoaway: String,
    /// Seconds of compose silence before sending `paused`.
    pub composing_timeout: i64,
    /// Disable outgoing chat states entirely.
    pub disable_chatstates: bool,
    /// Drop messages from senders we are not subscribed to.
    pub block_unsubscribed: bool,
    /// Default nickname for MUC joins, before falling back to the JID
    /// local part.
    pub default_nickname: Option<String>,
    /// Default join/leave printing policy for rooms.
    pub muc_print_status: PrintStatusPolicy,
    /// Answer `jabber:iq:version` with OS information.
    pub iq_version_hide_os: bool,
    /// Allow XEP-0146 remote control commands from our own account.
    pub allow_remote_control: bool,
    /// Request XEP-0184 receipts for outgoing messages.
    pub request_receipts: bool,
    /// Per-contact encryption settings, keyed by bare JID.
    pub crypto: HashMap<String, ContactCrypto>,
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    config: SessionConfig,
}

impl SessionBuilder {
    /// Starts from an account address and password.
    pub fn new(jid: BareJid, password: impl Into<String>) -> SessionBuilder {
        SessionBuilder {
            config: SessionConfig {
                jid,
                password: password.into(),
                server: None,
                port: None,
                tls: TlsMode::StartTls,
                ssl_fingerprint: None,
                ssl_ignore_checks: false,
                resource: "causerie".to_owned(),
                priority: 0,
                auto_connect: false,
                reconnect_delay: 60,
                ping_interval: 120,
                history_dir: None,
                load_logs: true,
                logging_ignore_status: false,
                load_muc_logs: false,
                max_history_age: 0,
                max_history_blocks: 8,
                state_file: None,
                autoaway: 0,
                message_autoaway: "Auto away status (idle)".to_owned(),
                composing_timeout: 6,
                disable_chatstates: false,
                block_unsubscribed: false,
                default_nickname: None,
                muc_print_status: PrintStatusPolicy::Default,
                iq_version_hide_os: false,
                allow_remote_control: false,
                request_receipts: true,
                crypto: HashMap::new(),
            },
        }
    }

    /// Overrides the server host.
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.config.server = Some(server.into());
        self
    }

    /// Overrides the port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = Some(port);
        self
    }

    /// Selects the transport protection.
    pub fn tls(mut self, tls: TlsMode) -> Self {
        self.config.tls = tls;
        self
    }

    /// Pins the server certificate to a hex SHA-1 fingerprint.
    pub fn ssl_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.config.ssl_fingerprint = Some(fingerprint.into());
        self
    }

    /// Sets the resource.
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.config.resource = resource.into();
        self
    }

    /// Enables automatic reconnection.
    pub fn auto_connect(mut self, enabled: bool) -> Self {
        self.config.auto_connect = enabled;
        self
    }

    /// Enables history logging under the given directory.
    pub fn history_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.history_dir = Some(dir.into());
        self
    }

    /// Sets the unread-state file.
    pub fn state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.state_file = Some(path.into());
        self
    }

    /// Sets the autoaway idle timeout in seconds.
    pub fn autoaway(mut self, seconds: i64) -> Self {
        self.config.autoaway = seconds;
        self
    }

    /// Sets the per-buffer block cap.
    pub fn max_history_blocks(mut self, blocks: usize) -> Self {
        self.config.max_history_blocks = blocks;
        self
    }

    /// Sets the default MUC nickname.
    pub fn default_nickname(mut self, nick: impl Into<String>) -> Self {
        self.config.default_nickname = Some(nick.into());
        self
    }

    /// Direct access for the less common knobs.
    pub fn tweak(mut self, f: impl FnOnce(&mut SessionConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Finishes the configuration.
    pub fn build(self) -> SessionConfig {
        self.config
    }
}
