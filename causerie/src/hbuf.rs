// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! History buffer: the per-conversation scrollback store.
//!
//! Persistent lines are appended contiguously into fixed-size character
//! blocks; rendered continuation lines reference slices of the same block
//! and are regenerated whenever the display width changes.  Retention is
//! driven purely by the block cap; the view anchor (`top`, `cleared`,
//! `locked`) never keeps data alive.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Write};
use std::ops::BitOr;
use std::path::Path;

/// A message must fit in one block, so this shouldn't be too small.
pub const BLOCK_SIZE: usize = 8192;

/// Prefix flags carried by each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineFlags(pub u16);

impl LineFlags {
    /// Incoming message.
    pub const IN: LineFlags = LineFlags(1);
    /// Outgoing message.
    pub const OUT: LineFlags = LineFlags(1 << 1);
    /// Local information line.
    pub const INFO: LineFlags = LineFlags(1 << 2);
    /// Error report.
    pub const ERR: LineFlags = LineFlags(1 << 3);
    /// Line should be highlighted (own nick in a room and such).
    pub const HIGHLIGHT: LineFlags = LineFlags(1 << 4);
    /// Body was PGP encrypted on the wire.
    pub const PGP_CRYPT: LineFlags = LineFlags(1 << 5);
    /// Body was OTR encrypted on the wire.
    pub const OTR_CRYPT: LineFlags = LineFlags(1 << 6);
    /// Line belongs to a special (status) buffer.
    pub const SPECIAL: LineFlags = LineFlags(1 << 7);
    /// Wrapped continuation of the previous line.
    pub const CONT: LineFlags = LineFlags(1 << 8);

    /// Whether all bits of `other` are set.
    pub fn contains(self, other: LineFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for LineFlags {
    type Output = LineFlags;

    fn bitor(self, other: LineFlags) -> LineFlags {
        LineFlags(self.0 | other.0)
    }
}

/// An opaque position within a buffer: a persistent line plus a wrap
/// offset.  Positions survive rebuilds; a wrap offset past the new
/// continuation count clamps to the last row of that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    seq: u64,
    wrap: u32,
}

/// A line as handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLine {
    /// The text slice of this row.
    pub text: String,
    /// Timestamp of the persistent line this row belongs to.
    pub timestamp: i64,
    /// Prefix flags; continuation rows carry [`LineFlags::CONT`].
    pub flags: LineFlags,
    /// Byte length of the MUC nick prefix, zero elsewhere.
    pub nick_len: usize,
    /// The row's position handle.
    pub position: Position,
}

struct Block {
    id: u64,
    data: String,
}

#[derive(Clone)]
struct Line {
    seq: u64,
    wrap: u32,
    timestamp: i64,
    flags: LineFlags,
    nick_len: usize,
    block: u64,
    start: usize,
    end: usize,
}

/// The scrollback store for one conversation.
pub struct HistoryBuffer {
    blocks: VecDeque<Block>,
    lines: VecDeque<Line>,
    next_block_id: u64,
    next_seq: u64,
    /// Suppress display until the next append.
    pub cleared: bool,
    /// First row to display; `None` shows the tail.
    pub top: Option<Position>,
    /// The view is scrolled up; appends must not move the anchor.
    pub locked: bool,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        HistoryBuffer::new()
    }
}

impl HistoryBuffer {
    /// Creates an empty buffer.
    pub fn new() -> HistoryBuffer {
        HistoryBuffer {
            blocks: VecDeque::new(),
            lines: VecDeque::new(),
            next_block_id: 0,
            next_seq: 0,
            cleared: false,
            top: None,
            locked: false,
        }
    }

    fn block_text(&self, id: u64, start: usize, end: usize) -> &str {
        match self.blocks.iter().find(|block| block.id == id) {
            Some(block) => &block.data[start..end],
            None => "",
        }
    }

    /// Appends one message.  Embedded newlines split the text into several
    /// persistent lines; each persistent line is wrapped to `width`
    /// columns (0 disables wrapping).  Returns `true` when the buffer was
    /// locked at the time, so the caller can raise an unread mark instead
    /// of following the tail.
    pub fn append(
        &mut self,
        text: &str,
        timestamp: i64,
        flags: LineFlags,
        width: usize,
        max_blocks: usize,
        nick_len: usize,
    ) -> bool {
        for piece in text.split('\n') {
            self.append_persistent(piece, timestamp, flags, width, max_blocks, nick_len);
        }
        self.cleared = false;
        self.locked
    }

    fn append_persistent(
        &mut self,
        text: &str,
        timestamp: i64,
        flags: LineFlags,
        width: usize,
        max_blocks: usize,
        nick_len: usize,
    ) {
        let text = if text.len() >= BLOCK_SIZE {
            "[ERR:LINE_TOO_LONG]"
        } else {
            text
        };

        let need_new_block = match self.blocks.back() {
            Some(block) => block.data.len() + text.len() > BLOCK_SIZE,
            None => true,
        };
        if need_new_block {
            self.blocks.push_back(Block {
                id: self.next_block_id,
                data: String::with_capacity(BLOCK_SIZE),
            });
            self.next_block_id += 1;
            if max_blocks != 0 {
                while self.blocks.len() > max_blocks {
                    let dropped = match self.blocks.pop_front() {
                        Some(block) => block.id,
                        None => break,
                    };
                    while matches!(self.lines.front(), Some(line) if line.block == dropped) {
                        self.lines.pop_front();
                    }
                }
            }
        }

        let block = match self.blocks.back_mut() {
            Some(block) => block,
            None => return,
        };
        let start = block.data.len();
        block.data.push_str(text);
        let end = block.data.len();
        let block_id = block.id;

        let seq = self.next_seq;
        self.next_seq += 1;
        self.lines.push_back(Line {
            seq,
            wrap: 0,
            timestamp,
            flags,
            nick_len,
            block: block_id,
            start,
            end,
        });
        let index = self.lines.len() - 1;
        self.wrap_line_at(index, width);
    }

    /// Splits the persistent line at `index` according to `width`,
    /// inserting continuation rows right after it.
    fn wrap_line_at(&mut self, index: usize, width: usize) {
        if width == 0 {
            return;
        }
        let (block, mut start, end, seq, timestamp, flags, nick_len) = {
            let line = &self.lines[index];
            (
                line.block,
                line.start,
                line.end,
                line.seq,
                line.timestamp,
                line.flags,
                line.nick_len,
            )
        };
        let mut wrap = 0u32;
        let mut insert_at = index + 1;
        loop {
            let slice = self.block_text(block, start, end).to_owned();
            let break_at = match wrap_point(&slice, width) {
                Some(offset) => start + offset,
                None => break,
            };
            // Close the current row at the break point.
            {
                let rows = self.lines.make_contiguous();
                rows[insert_at - 1].end = break_at;
            }
            wrap += 1;
            self.lines.insert(
                insert_at,
                Line {
                    seq,
                    wrap,
                    timestamp,
                    flags: flags | LineFlags::CONT,
                    nick_len,
                    block,
                    start: break_at,
                    end,
                },
            );
            start = break_at;
            insert_at += 1;
        }
    }

    /// Discards all continuation rows and re-runs the wrap algorithm.
    /// Idempotent for a given width; persistent content and order are
    /// untouched.
    pub fn rebuild(&mut self, width: usize) {
        let mut persistent: VecDeque<Line> = VecDeque::new();
        for line in self.lines.iter() {
            if line.wrap == 0 {
                let mut line = line.clone();
                // Re-extend to the full slice; the end may have been
                // trimmed by an earlier wrap.
                line.end = self
                    .lines
                    .iter()
                    .filter(|l| l.seq == line.seq)
                    .map(|l| l.end)
                    .max()
                    .unwrap_or(line.end);
                persistent.push_back(line);
            }
        }
        self.lines = persistent;
        if width != 0 {
            let mut index = 0;
            while index < self.lines.len() {
                if self.lines[index].wrap == 0 {
                    self.wrap_line_at(index, width);
                }
                index += 1;
            }
        }
    }

    /// Number of rendered rows.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the buffer holds no rows.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of blocks currently retained.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    fn index_of(&self, position: Position) -> Option<usize> {
        // Clamp the wrap offset to the line's current continuation count.
        let mut best = None;
        for (index, line) in self.lines.iter().enumerate() {
            if line.seq == position.seq && line.wrap <= position.wrap {
                best = Some(index);
            }
        }
        best
    }

    fn rendered_at(&self, index: usize) -> RenderedLine {
        let line = &self.lines[index];
        RenderedLine {
            text: self.block_text(line.block, line.start, line.end).to_owned(),
            timestamp: line.timestamp,
            flags: line.flags,
            nick_len: line.nick_len,
            position: Position {
                seq: line.seq,
                wrap: line.wrap,
            },
        }
    }

    /// Returns up to `n` rendered rows starting at `from` (or at the row
    /// which leaves exactly `n` rows to the tail, when `from` is `None`).
    pub fn get_lines(&self, from: Option<Position>, n: usize) -> Vec<RenderedLine> {
        let start = match from {
            Some(position) => match self.index_of(position) {
                Some(index) => index,
                None => return Vec::new(),
            },
            None => self.lines.len().saturating_sub(n),
        };
        (start..self.lines.len())
            .take(n)
            .map(|index| self.rendered_at(index))
            .collect()
    }

    /// The position `n` rows above `from` (or above the tail).
    pub fn scroll_back(&self, from: Option<Position>, n: usize) -> Option<Position> {
        let anchor = match from {
            Some(position) => self.index_of(position)?,
            None => self.lines.len(),
        };
        let index = anchor.saturating_sub(n);
        if self.lines.is_empty() {
            return None;
        }
        let line = &self.lines[index.min(self.lines.len() - 1)];
        Some(Position {
            seq: line.seq,
            wrap: line.wrap,
        })
    }

    /// The position `n` rows below `from`; `None` when that runs past the
    /// point where the tail fits the window (bottom clamp).
    pub fn scroll_forward(
        &self,
        from: Position,
        n: usize,
        window_rows: usize,
    ) -> Option<Position> {
        let index = self.index_of(from)? + n;
        if index + window_rows >= self.lines.len() {
            return None;
        }
        let line = &self.lines[index];
        Some(Position {
            seq: line.seq,
            wrap: line.wrap,
        })
    }

    /// The position of the first row.
    pub fn first_position(&self) -> Option<Position> {
        self.lines.front().map(|line| Position {
            seq: line.seq,
            wrap: line.wrap,
        })
    }

    /// Linear substring search over persistent lines, upwards
    /// (`direction < 0`) or downwards from `from`; the anchor row itself
    /// is excluded.
    pub fn search(&self, from: Option<Position>, direction: i32, needle: &str) -> Option<Position> {
        let anchor = match from {
            Some(position) => self.index_of(position)?,
            None => self.lines.len().saturating_sub(1),
        };
        let matches = |line: &Line| {
            line.wrap == 0
                && self
                    .block_text(line.block, line.start, line.end)
                    .contains(needle)
        };
        if direction < 0 {
            for index in (0..anchor).rev() {
                if matches(&self.lines[index]) {
                    return Some(Position {
                        seq: self.lines[index].seq,
                        wrap: 0,
                    });
                }
            }
        } else {
            for index in anchor + 1..self.lines.len() {
                if matches(&self.lines[index]) {
                    return Some(Position {
                        seq: self.lines[index].seq,
                        wrap: 0,
                    });
                }
            }
        }
        None
    }

    /// The first line whose timestamp is at or after `t`.
    pub fn jump_date(&self, t: i64) -> Option<Position> {
        self.lines
            .iter()
            .find(|line| line.wrap == 0 && line.timestamp >= t)
            .map(|line| Position {
                seq: line.seq,
                wrap: 0,
            })
    }

    /// The line at `percent`% of the buffer.
    pub fn jump_percent(&self, percent: usize) -> Option<Position> {
        if self.lines.is_empty() {
            return None;
        }
        let index = (percent.min(100) * self.lines.len() / 100).min(self.lines.len() - 1);
        // Snap back to the owning persistent line.
        let seq = self.lines[index].seq;
        Some(Position { seq, wrap: 0 })
    }

    /// Writes the persistent text content to `path`.
    pub fn dump(&self, path: &Path) -> io::Result<()> {
        let mut file = File::create(path)?;
        for line in self.lines.iter() {
            if line.wrap != 0 {
                continue;
            }
            writeln!(
                file,
                "{}",
                self.block_text(line.block, line.start, line.end)
            )?;
        }
        Ok(())
    }

    /// Drops everything and marks the buffer cleared.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.lines.clear();
        self.top = None;
        self.locked = false;
        self.cleared = true;
    }

    /// Re-anchors to the tail and unlocks.
    pub fn unlock(&mut self) {
        self.locked = false;
        self.top = None;
    }

    /// The persistent text rows, for tests and dumps.
    pub fn persistent_texts(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter(|line| line.wrap == 0)
            .map(|line| self.block_text(line.block, line.start, line.end).to_owned())
            .collect()
    }

    /// The rendered text rows in display order.
    pub fn rendered_texts(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| self.block_text(line.block, line.start, line.end).to_owned())
            .collect()
    }
}

/// Picks the byte offset to break `text` at so the first row shows at
/// most `width` characters: the last whitespace at or before the limit
/// when there is one, the exact limit otherwise.  `None` when it fits.
fn wrap_point(text: &str, width: usize) -> Option<usize> {
    if text.chars().count() <= width {
        return None;
    }
    let mut hard_break = text.len();
    let mut last_space = None;
    for (count, (offset, c)) in text.char_indices().enumerate() {
        if count == width {
            hard_break = offset;
            break;
        }
        if c == ' ' || c == '\t' {
            last_space = Some(offset);
        }
    }
    // Break after the whitespace so it stays on the first row.
    match last_space {
        Some(offset) => Some(offset + 1),
        None => Some(hard_break),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(buffer: &HistoryBuffer) -> Vec<String> {
        buffer.rendered_texts()
    }

    #[test]
    fn test_wrap_at_space() {
        let mut buffer = HistoryBuffer::new();
        let line = "a".repeat(30) + " " + &"b".repeat(29); // 60 chars, space at 31
        buffer.append(&line, 0, LineFlags::IN, 40, 0, 0);
        let rows = texts(&buffer);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].chars().count() <= 40);
        assert!(rows[0].ends_with(' '));
        assert_eq!(rows[1], "b".repeat(29));
        let rendered = buffer.get_lines(None, 10);
        assert!(!rendered[0].flags.contains(LineFlags::CONT));
        assert!(rendered[1].flags.contains(LineFlags::CONT));
    }

    #[test]
    fn test_wrap_no_space_breaks_hard() {
        let mut buffer = HistoryBuffer::new();
        buffer.append(&"x".repeat(50), 0, LineFlags::IN, 20, 0, 0);
        let rows = texts(&buffer);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].chars().count(), 20);
        assert_eq!(rows[1].chars().count(), 20);
        assert_eq!(rows[2].chars().count(), 10);
    }

    #[test]
    fn test_rebuild_is_pure_and_idempotent() {
        let mut buffer = HistoryBuffer::new();
        buffer.append("the quick brown fox jumps over the lazy dog", 1, LineFlags::IN, 40, 0, 0);
        buffer.append("pack my box with five dozen liquor jugs", 2, LineFlags::OUT, 40, 0, 0);
        let persistent_before = buffer.persistent_texts();
        let rows_40 = texts(&buffer);

        buffer.rebuild(20);
        let rows_20 = texts(&buffer);
        assert!(rows_20.len() > rows_40.len());

        buffer.rebuild(40);
        assert_eq!(texts(&buffer), rows_40);
        buffer.rebuild(40);
        assert_eq!(texts(&buffer), rows_40);
        assert_eq!(buffer.persistent_texts(), persistent_before);
    }

    #[test]
    fn test_append_matches_rebuild() {
        // Wrapping is a pure function of persistent content and width:
        // appending at width W must equal appending unwrapped then
        // rebuilding at W.
        let lines = [
            "one short",
            "a considerably longer line which will certainly need wrapping somewhere",
            "nospacesatallinthisratherlongtokenwhichbreakshard",
        ];
        let mut incremental = HistoryBuffer::new();
        let mut bulk = HistoryBuffer::new();
        for (i, line) in lines.iter().enumerate() {
            incremental.append(line, i as i64, LineFlags::IN, 24, 0, 0);
            bulk.append(line, i as i64, LineFlags::IN, 0, 0, 0);
        }
        bulk.rebuild(24);
        assert_eq!(texts(&incremental), texts(&bulk));
    }

    #[test]
    fn test_block_cap_drops_oldest() {
        let mut buffer = HistoryBuffer::new();
        let chunk = "y".repeat(BLOCK_SIZE / 2);
        for i in 0..20 {
            buffer.append(&chunk, i, LineFlags::IN, 0, 3, 0);
            assert!(buffer.block_count() <= 3);
        }
        // Only lines referencing retained blocks survive.
        let first = buffer.get_lines(None, 1000);
        assert!(first.len() < 20);
        for row in &first {
            assert_eq!(row.text.len(), BLOCK_SIZE / 2);
        }
    }

    #[test]
    fn test_newline_splits_persistent() {
        let mut buffer = HistoryBuffer::new();
        buffer.append("first\nsecond", 7, LineFlags::IN, 0, 0, 0);
        assert_eq!(buffer.persistent_texts(), vec!["first", "second"]);
        let rendered = buffer.get_lines(None, 10);
        assert!(!rendered[1].flags.contains(LineFlags::CONT));
    }

    #[test]
    fn test_oversized_line_replaced() {
        let mut buffer = HistoryBuffer::new();
        buffer.append(&"z".repeat(BLOCK_SIZE + 10), 0, LineFlags::IN, 0, 0, 0);
        assert_eq!(buffer.persistent_texts(), vec!["[ERR:LINE_TOO_LONG]"]);
    }

    #[test]
    fn test_search_both_directions() {
        let mut buffer = HistoryBuffer::new();
        buffer.append("alpha", 1, LineFlags::IN, 0, 0, 0);
        buffer.append("beta", 2, LineFlags::IN, 0, 0, 0);
        buffer.append("alpha again", 3, LineFlags::IN, 0, 0, 0);
        let hit = buffer.search(None, -1, "alpha").unwrap();
        let rows = buffer.get_lines(Some(hit), 1);
        assert_eq!(rows[0].text, "alpha");
        let hit = buffer.search(Some(hit), 1, "alpha").unwrap();
        let rows = buffer.get_lines(Some(hit), 1);
        assert_eq!(rows[0].text, "alpha again");
        assert!(buffer.search(None, 1, "gamma").is_none());
    }

    #[test]
    fn test_jump_date_and_percent() {
        let mut buffer = HistoryBuffer::new();
        for i in 0..10 {
            buffer.append(&format!("line {}", i), i * 100, LineFlags::IN, 0, 0, 0);
        }
        let hit = buffer.jump_date(450).unwrap();
        assert_eq!(buffer.get_lines(Some(hit), 1)[0].text, "line 5");
        let hit = buffer.jump_percent(0).unwrap();
        assert_eq!(buffer.get_lines(Some(hit), 1)[0].text, "line 0");
        let hit = buffer.jump_percent(100).unwrap();
        assert_eq!(buffer.get_lines(Some(hit), 1)[0].text, "line 9");
    }

    #[test]
    fn test_cleared_resets_on_append() {
        let mut buffer = HistoryBuffer::new();
        buffer.append("hello", 0, LineFlags::IN, 0, 0, 0);
        buffer.clear();
        assert!(buffer.cleared);
        assert!(buffer.is_empty());
        buffer.append("fresh", 1, LineFlags::IN, 0, 0, 0);
        assert!(!buffer.cleared);
        assert_eq!(buffer.persistent_texts(), vec!["fresh"]);
    }

    #[test]
    fn test_locked_append_reports() {
        let mut buffer = HistoryBuffer::new();
        buffer.append("one", 0, LineFlags::IN, 0, 0, 0);
        buffer.locked = true;
        buffer.top = buffer.first_position();
        assert!(buffer.append("two", 1, LineFlags::IN, 0, 0, 0));
        buffer.unlock();
        assert!(!buffer.locked);
        assert_eq!(buffer.top, None);
    }

    #[test]
    fn test_position_survives_rebuild() {
        let mut buffer = HistoryBuffer::new();
        buffer.append("a rather long line which wraps at narrow widths easily", 0, LineFlags::IN, 16, 0, 0);
        buffer.append("tail", 1, LineFlags::IN, 16, 0, 0);
        let hit = buffer.search(None, -1, "rather").unwrap();
        buffer.rebuild(60);
        let rows = buffer.get_lines(Some(hit), 1);
        assert!(rows[0].text.contains("rather"));
    }

    #[test]
    fn test_scroll_bottom_clamp() {
        let mut buffer = HistoryBuffer::new();
        for i in 0..10 {
            buffer.append(&format!("l{}", i), i, LineFlags::IN, 0, 0, 0);
        }
        let top = buffer.scroll_back(None, 8).unwrap();
        // Moving down far enough that the remainder fits the window
        // resolves to "follow the tail".
        assert!(buffer.scroll_forward(top, 5, 5).is_none());
        let next = buffer.scroll_forward(top, 2, 5).unwrap();
        assert_eq!(buffer.get_lines(Some(next), 1)[0].text, "l4");
    }
}
