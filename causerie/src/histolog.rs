// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! On-disk history files, one per bare JID, and the unread-state file.
//!
//! Line format: `TI yyyymmddThh:mm:ssZ LLL payload`, where `T` is `M`
//! (message) or `S` (status), `I` is the direction/status character and
//! `LLL` is the zero-padded count of continuation lines following
//! verbatim.  Writes are append-open-close; reads honour the configured
//! maximum age and follow symlinked files to an alias JID.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::roster::Status;

/// How a stored message line relates to us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// We sent it.
    Send,
    /// We received it.
    Recv,
    /// Locally generated information.
    Info,
}

impl MessageKind {
    fn to_char(self) -> char {
        match self {
            MessageKind::Send => 'S',
            MessageKind::Recv => 'R',
            MessageKind::Info => 'I',
        }
    }

    fn from_char(c: char) -> Option<MessageKind> {
        Some(match c {
            'S' => MessageKind::Send,
            'R' => MessageKind::Recv,
            'I' => MessageKind::Info,
            _ => return None,
        })
    }
}

/// One entry replayed from a history file.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    /// A stored message.
    Message {
        /// Direction.
        kind: MessageKind,
        /// Unix timestamp, second precision.
        timestamp: i64,
        /// The text, continuation lines joined with newlines.
        text: String,
    },
    /// A stored status change.
    Status {
        /// The status at that time.
        status: Status,
        /// Unix timestamp.
        timestamp: i64,
        /// The status message.
        text: String,
    },
}

/// The history-file subsystem.
pub struct HistoLog {
    root: Option<PathBuf>,
    /// Whether new lines are written at all.
    pub enabled: bool,
    /// Whether buffers replay their file on first open.
    pub load_logs: bool,
    /// Skip status lines on write.
    pub ignore_status: bool,
    /// Entries older than this many days are skipped on read; 0 loads
    /// everything.
    pub max_age_days: u32,
}

fn to_iso8601(timestamp: i64) -> String {
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(when) => when.format("%Y%m%dT%H:%M:%SZ").to_string(),
        None => "19700101T00:00:00Z".to_owned(),
    }
}

fn from_iso8601(stamp: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(stamp, "%Y%m%dT%H:%M:%SZ")
        .ok()
        .map(|naive| naive.and_utc().timestamp())
}

impl HistoLog {
    /// Creates the subsystem; `root` of `None` disables files entirely.
    pub fn new(root: Option<PathBuf>, load_logs: bool) -> HistoLog {
        HistoLog {
            enabled: root.is_some(),
            root,
            load_logs,
            ignore_status: false,
            max_age_days: 0,
        }
    }

    fn file_for(&self, bjid: &str) -> Option<PathBuf> {
        self.root
            .as_ref()
            .map(|root| root.join(bjid.to_ascii_lowercase()))
    }

    /// Follows a symlink chain from this JID's file to the JID whose
    /// history is shared, bounded against link loops.
    pub fn log_jid_alias(&self, bjid: &str) -> Option<String> {
        let mut path = self.file_for(bjid)?;
        let mut alias = None;
        for _ in 0..8 {
            let meta = std::fs::symlink_metadata(&path).ok()?;
            if !meta.file_type().is_symlink() {
                break;
            }
            let target = std::fs::read_link(&path).ok()?;
            let target = target.file_name()?.to_str()?.to_owned();
            path = self.file_for(&target)?;
            alias = Some(target);
        }
        alias
    }

    fn write_line(
        &self,
        bjid: &str,
        timestamp: i64,
        kind_char: char,
        info_char: char,
        data: &str,
    ) {
        if !self.enabled {
            return;
        }
        let Some(path) = self.file_for(bjid) else { return };
        let extra = data.matches('\n').count();
        let line = format!(
            "{}{} {} {:03} {}\n",
            kind_char,
            info_char,
            to_iso8601(timestamp),
            extra,
            data
        );
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(e) = result {
            log::error!("unable to write history for <{}>: {}", bjid, e);
        }
    }

    /// Appends a message line.
    pub fn write_message(&self, bjid: &str, timestamp: i64, kind: MessageKind, text: &str) {
        self.write_line(bjid, timestamp, 'M', kind.to_char(), text);
    }

    /// Appends a status line.
    pub fn write_status(&self, bjid: &str, timestamp: i64, status: Status, text: &str) {
        if self.ignore_status {
            return;
        }
        self.write_line(
            bjid,
            timestamp,
            'S',
            status.to_char().to_ascii_uppercase(),
            text,
        );
    }

    /// Replays a JID's history file.  Unparseable lines are reported once
    /// and skipped; entries older than the age limit are filtered out.
    pub fn read_history(&self, bjid: &str, now: i64) -> Vec<HistoryEntry> {
        let mut entries = Vec::new();
        if !self.load_logs {
            return entries;
        }
        let Some(path) = self.file_for(bjid) else {
            return entries;
        };
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(_) => return entries,
        };
        let mut start_time = 0i64;
        if self.max_age_days > 0 {
            start_time = now - i64::from(self.max_age_days) * 86_400;
        }
        let mut reader = BufReader::new(file).lines();
        let mut reported = false;
        while let Some(line) = reader.next() {
            let Ok(line) = line else { break };
            match parse_line(&line, &mut reader) {
                Some(entry) => {
                    let timestamp = match &entry {
                        HistoryEntry::Message { timestamp, .. } => *timestamp,
                        HistoryEntry::Status { timestamp, .. } => *timestamp,
                    };
                    if start_time != 0 {
                        if timestamp > start_time {
                            // From now on, load everything.
                            start_time = 0;
                        } else {
                            continue;
                        }
                    }
                    entries.push(entry);
                }
                None => {
                    if !reported {
                        log::error!("error in history file format ({})", bjid);
                        reported = true;
                    }
                }
            }
        }
        entries
    }

    /// Writes the unread-state file: one bare JID per line.  An empty
    /// set removes the file.
    pub fn save_state(path: &Path, unread: &[String]) -> io::Result<()> {
        if unread.is_empty() {
            match std::fs::remove_file(path) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
                Err(e) => return Err(e),
            }
        }
        let mut file = File::create(path)?;
        for jid in unread {
            writeln!(file, "{}", jid)?;
        }
        Ok(())
    }

    /// Reads the unread-state file back.
    pub fn load_state(path: &Path) -> Vec<String> {
        let mut jids = Vec::new();
        let Ok(mut file) = File::open(path) else {
            return jids;
        };
        let mut content = String::new();
        if file.read_to_string(&mut content).is_err() {
            return jids;
        }
        for line in content.lines() {
            let jid = line.trim();
            if jid.is_empty() {
                continue;
            }
            if !jid.contains('@') {
                log::error!("invalid JID in state file, corrupted file?");
                break;
            }
            jids.push(jid.to_owned());
        }
        jids
    }
}

fn parse_line(
    line: &str,
    reader: &mut io::Lines<BufReader<File>>,
) -> Option<HistoryEntry> {
    let bytes = line.as_bytes();
    if bytes.len() < 26 {
        return None;
    }
    let kind = bytes[0] as char;
    let info = bytes[1] as char;
    if bytes[2] != b' ' || bytes[11] != b'T' || bytes[20] != b'Z' || bytes[21] != b' ' {
        return None;
    }
    let timestamp = from_iso8601(&line[3..21])?;
    // The continuation count is written with three digits but may grow a
    // fourth.
    let (count_field, payload) = if bytes[25] == b' ' {
        (&line[22..25], &line[26..])
    } else if bytes.len() > 26 && bytes[26] == b' ' {
        (&line[22..26], &line[27..])
    } else {
        return None;
    };
    let extra: usize = count_field.parse().ok()?;
    let mut text = payload.to_owned();
    for _ in 0..extra {
        let continuation = reader.next()?.ok()?;
        text.push('\n');
        text.push_str(&continuation);
    }
    match kind {
        'M' => Some(HistoryEntry::Message {
            kind: MessageKind::from_char(info)?,
            timestamp,
            text,
        }),
        'S' => Some(HistoryEntry::Status {
            status: Status::from_char(info)?,
            timestamp,
            text,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, HistoLog) {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoLog::new(Some(dir.path().to_path_buf()), true);
        (dir, log)
    }

    #[test]
    fn test_message_roundtrip() {
        let (_dir, log) = setup();
        log.write_message("alice@example.com", 1_600_000_000, MessageKind::Recv, "hello there");
        log.write_message("alice@example.com", 1_600_000_060, MessageKind::Send, "hi\nsecond line");
        let entries = log.read_history("alice@example.com", 1_600_100_000);
        assert_eq!(
            entries,
            vec![
                HistoryEntry::Message {
                    kind: MessageKind::Recv,
                    timestamp: 1_600_000_000,
                    text: "hello there".to_owned(),
                },
                HistoryEntry::Message {
                    kind: MessageKind::Send,
                    timestamp: 1_600_000_060,
                    text: "hi\nsecond line".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_status_line() {
        let (_dir, log) = setup();
        log.write_status("bob@ex.org", 1_600_000_000, Status::Away, "afk");
        let entries = log.read_history("bob@ex.org", 1_600_100_000);
        assert_eq!(
            entries,
            vec![HistoryEntry::Status {
                status: Status::Away,
                timestamp: 1_600_000_000,
                text: "afk".to_owned(),
            }]
        );
    }

    #[test]
    fn test_jid_is_lowercased() {
        let (dir, log) = setup();
        log.write_message("Alice@Example.Com", 0, MessageKind::Recv, "x");
        assert!(dir.path().join("alice@example.com").exists());
    }

    #[test]
    fn test_bad_lines_are_skipped() {
        let (dir, log) = setup();
        let path = dir.path().join("c@d.e");
        std::fs::write(
            &path,
            "garbage line\nMR 20200913T12:26:40Z 000 good\nXY nonsense\n",
        )
        .unwrap();
        let entries = log.read_history("c@d.e", 2_000_000_000);
        assert_eq!(entries.len(), 1);
        match &entries[0] {
            HistoryEntry::Message { text, .. } => assert_eq!(text, "good"),
            _ => panic!(),
        }
    }

    #[test]
    fn test_max_age_filter() {
        let (_dir, log) = {
            let (dir, mut log) = setup();
            log.max_age_days = 1;
            (dir, log)
        };
        let now = 1_600_200_000;
        log.write_message("old@ex", now - 3 * 86_400, MessageKind::Recv, "ancient");
        log.write_message("old@ex", now - 3600, MessageKind::Recv, "recent");
        let entries = log.read_history("old@ex", now);
        assert_eq!(entries.len(), 1);
        match &entries[0] {
            HistoryEntry::Message { text, .. } => assert_eq!(text, "recent"),
            _ => panic!(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_alias() {
        let (dir, log) = setup();
        log.write_message("real@ex", 100, MessageKind::Recv, "shared");
        std::os::unix::fs::symlink(
            dir.path().join("real@ex"),
            dir.path().join("alias@ex"),
        )
        .unwrap();
        assert_eq!(log.log_jid_alias("alias@ex"), Some("real@ex".to_owned()));
        assert_eq!(log.log_jid_alias("real@ex"), None);
    }

    #[test]
    fn test_state_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");
        let jids = vec!["carol@ex".to_owned(), "dave@ex".to_owned()];
        HistoLog::save_state(&path, &jids).unwrap();
        assert_eq!(HistoLog::load_state(&path), jids);
        HistoLog::save_state(&path, &[]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(to_iso8601(1_600_000_000), "20200913T12:26:40Z");
        assert_eq!(from_iso8601("20200913T12:26:40Z"), Some(1_600_000_000));
    }
}
