// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streaming side-effect tag parser.
//!
//! The LLM child's only observable output is text, so side effects arrive
//! as `<<TAG>> … <<END_TAG>>` pairs embedded in the stream. This parser
//! accumulates chunks in a bounded buffer and extracts only *complete*
//! pairs, in stream order, removing each match in place. Partial tags
//! stay pending across any chunking of the input, which makes the set of
//! extracted effects independent of how the stream was split.

/// Payload cap for file writes and shell commands.
pub const FILE_PAYLOAD_LIMIT: usize = 1024 * 1024;

/// Payload cap for direct messages and broadcasts.
pub const MESSAGE_PAYLOAD_LIMIT: usize = 64 * 1024;

/// Buffer size that triggers a trim.
const BUFFER_TRIM_THRESHOLD: usize = 256 * 1024;

/// Buffer size retained after a trim.
const BUFFER_TRIM_TARGET: usize = 128 * 1024;

/// A side effect requested by the LLM stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    WriteFile { path: String, content: String },
    RunCommand { command: String },
    SendMessage { to: String, content: String },
    Broadcast { content: String },
}

/// Parser diagnostics surfaced to the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamNote {
    /// The buffer grew past its threshold and was cut back.
    BufferTrimmed { dropped_bytes: usize },
    /// Opening markers were still pending at final flush.
    OrphanTags { tags: Vec<&'static str> },
    /// A complete tag carried a payload over its limit; the tag was
    /// dropped without executing.
    OversizedPayload {
        tag: &'static str,
        size: usize,
        limit: usize,
    },
}

/// Either an effect to execute or a diagnostic to audit, in stream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    Effect(SideEffect),
    Note(StreamNote),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    WriteFile,
    RunCommand,
    SendMessage,
    Broadcast,
}

impl TagKind {
    const ALL: [TagKind; 4] = [
        TagKind::WriteFile,
        TagKind::RunCommand,
        TagKind::SendMessage,
        TagKind::Broadcast,
    ];

    /// Marker scanned for when reporting orphans.
    fn open_marker(&self) -> &'static str {
        match self {
            TagKind::WriteFile => "<<WRITE_FILE",
            TagKind::RunCommand => "<<RUN_COMMAND",
            TagKind::SendMessage => "<<SEND_MESSAGE",
            TagKind::Broadcast => "<<BROADCAST",
        }
    }

    /// Literal prefix of the opening tag, up to the attribute value (when
    /// the tag has one).
    fn open_prefix(&self) -> &'static str {
        match self {
            TagKind::WriteFile => "<<WRITE_FILE path=\"",
            TagKind::RunCommand => "<<RUN_COMMAND>>",
            TagKind::SendMessage => "<<SEND_MESSAGE to=\"",
            TagKind::Broadcast => "<<BROADCAST>>",
        }
    }

    fn has_attribute(&self) -> bool {
        matches!(self, TagKind::WriteFile | TagKind::SendMessage)
    }

    fn close_tag(&self) -> &'static str {
        match self {
            TagKind::WriteFile => "<<END_WRITE>>",
            TagKind::RunCommand => "<<END_COMMAND>>",
            TagKind::SendMessage => "<<END_MESSAGE>>",
            TagKind::Broadcast => "<<END_BROADCAST>>",
        }
    }

    fn payload_limit(&self) -> usize {
        match self {
            TagKind::WriteFile | TagKind::RunCommand => FILE_PAYLOAD_LIMIT,
            TagKind::SendMessage | TagKind::Broadcast => MESSAGE_PAYLOAD_LIMIT,
        }
    }
}

/// A complete tag located in the buffer.
struct CompleteTag {
    kind: TagKind,
    start: usize,
    end: usize,
    attribute: Option<String>,
    payload_start: usize,
    payload_end: usize,
}

/// Find the first complete occurrence of `kind` at or after the start of
/// `buf`. Openers with malformed attributes are skipped; openers whose
/// attribute or closer has not arrived yet yield `None`.
fn find_complete(buf: &str, kind: TagKind) -> Option<CompleteTag> {
    let mut from = 0;
    loop {
        let start = from + buf[from..].find(kind.open_prefix())?;
        let after_prefix = start + kind.open_prefix().len();

        let (attribute, payload_start) = if kind.has_attribute() {
            // Attribute runs to the next quote, then the tag must close
            // with `>>` immediately.
            let Some(quote_rel) = buf[after_prefix..].find('"') else {
                return None; // attribute still streaming in
            };
            let quote_abs = after_prefix + quote_rel;
            let rest = &buf[quote_abs + 1..];
            if rest.len() < 2 {
                return None; // `>>` not here yet
            }
            if !rest.starts_with(">>") {
                // Malformed opener; leave it as inert text and look for
                // the next occurrence.
                from = after_prefix;
                continue;
            }
            (
                Some(buf[after_prefix..quote_abs].to_string()),
                quote_abs + 3,
            )
        } else {
            (None, after_prefix)
        };

        let close_rel = buf[payload_start..].find(kind.close_tag())?;
        let payload_end = payload_start + close_rel;
        return Some(CompleteTag {
            kind,
            start,
            end: payload_end + kind.close_tag().len(),
            attribute,
            payload_start,
            payload_end,
        });
    }
}

/// Strip exactly one leading and one trailing newline from a file payload.
/// The tag markers usually sit on their own lines; the newlines belonging
/// to the markers are not part of the file content.
fn strip_payload_newlines(payload: &str) -> &str {
    let payload = payload.strip_prefix('\n').unwrap_or(payload);
    payload.strip_suffix('\n').unwrap_or(payload)
}

/// Pull-based tag lexer over a bounded in-memory buffer.
#[derive(Debug, Default)]
pub struct TagStream {
    buf: String,
}

impl TagStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently buffered (pending text and partial tags).
    pub fn pending_bytes(&self) -> usize {
        self.buf.len()
    }

    /// Append a chunk and extract every complete tag, in stream order.
    pub fn push(&mut self, chunk: &str) -> Vec<StreamItem> {
        self.buf.push_str(chunk);
        let mut items = self.scan();
        if let Some(note) = self.trim_if_oversized() {
            items.push(StreamItem::Note(note));
        }
        items
    }

    /// Final flush: extract what remains, then report any orphaned
    /// opening markers left in the buffer.
    pub fn finish(&mut self) -> Vec<StreamItem> {
        let mut items = self.scan();
        let orphans: Vec<&'static str> = TagKind::ALL
            .iter()
            .filter(|k| self.buf.contains(k.open_marker()))
            .map(|k| k.open_marker())
            .collect();
        if !orphans.is_empty() {
            items.push(StreamItem::Note(StreamNote::OrphanTags { tags: orphans }));
        }
        self.buf.clear();
        items
    }

    fn scan(&mut self) -> Vec<StreamItem> {
        let mut items = Vec::new();
        loop {
            let earliest = TagKind::ALL
                .iter()
                .filter_map(|kind| find_complete(&self.buf, *kind))
                .min_by_key(|tag| tag.start);
            let Some(tag) = earliest else {
                break;
            };

            let payload = &self.buf[tag.payload_start..tag.payload_end];
            let limit = tag.kind.payload_limit();
            let item = if payload.len() > limit {
                StreamItem::Note(StreamNote::OversizedPayload {
                    tag: tag.kind.open_marker(),
                    size: payload.len(),
                    limit,
                })
            } else {
                let effect = match tag.kind {
                    TagKind::WriteFile => SideEffect::WriteFile {
                        path: tag.attribute.clone().unwrap_or_default(),
                        content: strip_payload_newlines(payload).to_string(),
                    },
                    TagKind::RunCommand => SideEffect::RunCommand {
                        command: payload.trim().to_string(),
                    },
                    TagKind::SendMessage => SideEffect::SendMessage {
                        to: tag.attribute.clone().unwrap_or_default(),
                        content: payload.trim().to_string(),
                    },
                    TagKind::Broadcast => SideEffect::Broadcast {
                        content: payload.trim().to_string(),
                    },
                };
                StreamItem::Effect(effect)
            };
            items.push(item);
            self.buf.replace_range(tag.start..tag.end, "");
        }
        items
    }

    /// Cut the buffer back to the trim target, preferring the last `<<`
    /// marker as the cut point so a trailing partial tag survives.
    fn trim_if_oversized(&mut self) -> Option<StreamNote> {
        if self.buf.len() <= BUFFER_TRIM_THRESHOLD {
            return None;
        }
        let floor = self.buf.len() - BUFFER_TRIM_TARGET;
        let marker = self.buf.rfind("<<").unwrap_or(floor);
        let mut cut = marker.max(floor);
        while !self.buf.is_char_boundary(cut) {
            cut += 1;
        }
        self.buf.drain(..cut);
        Some(StreamNote::BufferTrimmed { dropped_bytes: cut })
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
