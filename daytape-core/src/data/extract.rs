//! Streaming extraction of a single day's array from a monolithic document.
//!
//! A per-ticker document looks like `{"ticker": "T", "days": {"YYYY-MM-DD": [...], ...}}`
//! and can run to many megabytes. [`DayExtractor`] is fed the document chunk by
//! chunk and returns the requested day's array as soon as its closing bracket
//! arrives, without parsing anything else.
//!
//! States: `SeekingKey → SeekingColonAndBracket → ScanningArray → Done`.
//!
//! The array scan counts `[` and `]` bytes only. It is not string-aware, so a
//! payload with unescaped brackets inside string values would end the scan
//! early (or late) and the final parse would report `MalformedPayload`.

use super::error::{LoadError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use tracing::{debug, trace};

/// Buffer and chunking limits for the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Bytes requested per read from the underlying stream.
    pub chunk_size: usize,
    /// Buffer size that triggers trimming.
    pub max_buffer: usize,
    /// Bytes kept from the end of the buffer while the key is still unmatched.
    pub retain_tail: usize,
    /// Bytes kept before the opening bracket while the array is being scanned.
    pub scan_margin: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024,
            max_buffer: 1_000_000,
            retain_tail: 200_000,
            scan_margin: 1000,
        }
    }
}

/// Scanner state. All offsets index into the extractor's current buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    SeekingKey,
    SeekingColonAndBracket {
        key_start: usize,
        cursor: usize,
        colon_seen: bool,
    },
    ScanningArray {
        start: usize,
        cursor: usize,
        depth: u32,
    },
    Done,
}

/// Incremental day-array scanner.
#[derive(Debug)]
pub struct DayExtractor {
    date: String,
    needle: Vec<u8>,
    buffer: Vec<u8>,
    search_from: usize,
    state: ScanState,
    bytes_seen: u64,
    opts: ExtractOptions,
}

impl DayExtractor {
    pub fn new(date: &str, opts: ExtractOptions) -> Self {
        let needle = format!("\"{date}\"").into_bytes();
        let opts = ExtractOptions {
            chunk_size: opts.chunk_size.max(1),
            retain_tail: opts.retain_tail.max(needle.len()),
            max_buffer: opts.max_buffer.max(opts.retain_tail.max(needle.len())),
            ..opts
        };
        Self {
            date: date.to_string(),
            needle,
            buffer: Vec::new(),
            search_from: 0,
            state: ScanState::SeekingKey,
            bytes_seen: 0,
            opts,
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    /// Name of the current state, for diagnostics.
    pub fn state_name(&self) -> &'static str {
        match self.state {
            ScanState::SeekingKey => "seeking_key",
            ScanState::SeekingColonAndBracket { .. } => "seeking_colon_and_bracket",
            ScanState::ScanningArray { .. } => "scanning_array",
            ScanState::Done => "done",
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == ScanState::Done
    }

    /// Bytes currently held in memory.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes fed so far.
    pub fn bytes_seen(&self) -> u64 {
        self.bytes_seen
    }

    /// Feed the next chunk.
    ///
    /// Returns `Ok(Some(array))` exactly once, when the day's array closes.
    /// Chunks fed after that are ignored.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Option<Value>> {
        if self.state == ScanState::Done {
            return Ok(None);
        }
        self.buffer.extend_from_slice(chunk);
        self.bytes_seen += chunk.len() as u64;

        loop {
            match self.state {
                ScanState::SeekingKey => {
                    let Some(pos) = find(&self.buffer[self.search_from..], &self.needle) else {
                        // Keep enough of the tail to match a key split across chunks.
                        self.search_from = self.buffer.len().saturating_sub(self.needle.len() - 1);
                        self.trim_unmatched();
                        return Ok(None);
                    };
                    let key_start = self.search_from + pos;
                    trace!(date = %self.date, offset = key_start, "candidate key");
                    self.state = ScanState::SeekingColonAndBracket {
                        key_start,
                        cursor: key_start + self.needle.len(),
                        colon_seen: false,
                    };
                }
                ScanState::SeekingColonAndBracket {
                    key_start,
                    cursor,
                    colon_seen,
                } => {
                    let mut colon_seen = colon_seen;
                    let mut next = None;
                    let mut rejected = false;
                    for (i, &b) in self.buffer.iter().enumerate().skip(cursor) {
                        match b {
                            b' ' | b'\t' | b'\n' | b'\r' => {}
                            b':' if !colon_seen => colon_seen = true,
                            b'[' if colon_seen => {
                                next = Some(i);
                                break;
                            }
                            _ => {
                                rejected = true;
                                break;
                            }
                        }
                    }
                    if let Some(start) = next {
                        debug!(date = %self.date, offset = start, "day array opened");
                        self.state = ScanState::ScanningArray {
                            start,
                            cursor: start + 1,
                            depth: 1,
                        };
                    } else if rejected {
                        // The date occurred somewhere other than as the key of an array.
                        trace!(date = %self.date, offset = key_start, "rejected candidate key");
                        self.search_from = key_start + 1;
                        self.state = ScanState::SeekingKey;
                    } else {
                        self.state = ScanState::SeekingColonAndBracket {
                            key_start,
                            cursor: self.buffer.len(),
                            colon_seen,
                        };
                        if self.buffer.len() > self.opts.max_buffer {
                            self.retain_from(key_start);
                        }
                        return Ok(None);
                    }
                }
                ScanState::ScanningArray {
                    start,
                    cursor,
                    depth,
                } => {
                    let mut depth = depth;
                    for i in cursor..self.buffer.len() {
                        match self.buffer[i] {
                            b'[' => depth += 1,
                            b']' => {
                                depth -= 1;
                                if depth == 0 {
                                    self.state = ScanState::Done;
                                    return self.parse_span(start, i).map(Some);
                                }
                            }
                            _ => {}
                        }
                    }
                    self.state = ScanState::ScanningArray {
                        start,
                        cursor: self.buffer.len(),
                        depth,
                    };
                    if self.buffer.len() > self.opts.max_buffer {
                        self.retain_from(start.saturating_sub(self.opts.scan_margin));
                    }
                    return Ok(None);
                }
                ScanState::Done => return Ok(None),
            }
        }
    }

    /// The error describing why the stream ended without producing the day.
    pub fn end_of_stream(&self) -> LoadError {
        match self.state {
            ScanState::ScanningArray { .. } => LoadError::ExtractionIncomplete {
                date: self.date.clone(),
                bytes_scanned: self.bytes_seen,
            },
            ScanState::Done => LoadError::MalformedPayload(format!(
                "day {} was already extracted from this stream",
                self.date
            )),
            _ => LoadError::NotFound(format!(
                "day {} not found in stream ({} bytes scanned)",
                self.date, self.bytes_seen
            )),
        }
    }

    fn parse_span(&mut self, start: usize, end: usize) -> Result<Value> {
        let span = &self.buffer[start..=end];
        debug!(
            date = %self.date,
            span_bytes = span.len(),
            bytes_seen = self.bytes_seen,
            "day array closed"
        );
        let parsed = serde_json::from_slice(span).map_err(|e| {
            LoadError::MalformedPayload(format!("extracted array for {}: {e}", self.date))
        });
        self.buffer = Vec::new();
        parsed
    }

    fn trim_unmatched(&mut self) {
        if self.buffer.len() > self.opts.max_buffer {
            let keep_from = self.buffer.len() - self.opts.retain_tail;
            self.retain_from(keep_from);
        }
    }

    /// Drop every buffered byte before `keep_from` and shift stored offsets.
    fn retain_from(&mut self, keep_from: usize) {
        if keep_from == 0 {
            return;
        }
        self.buffer.drain(..keep_from);
        self.search_from = self.search_from.saturating_sub(keep_from);
        self.state = match self.state {
            ScanState::SeekingColonAndBracket {
                key_start,
                cursor,
                colon_seen,
            } => ScanState::SeekingColonAndBracket {
                key_start: key_start - keep_from,
                cursor: cursor - keep_from,
                colon_seen,
            },
            ScanState::ScanningArray {
                start,
                cursor,
                depth,
            } => ScanState::ScanningArray {
                start: start - keep_from,
                cursor: cursor - keep_from,
                depth,
            },
            other => other,
        };
        debug!(
            date = %self.date,
            dropped = keep_from,
            buffered = self.buffer.len(),
            state = self.state_name(),
            "trimmed extractor buffer"
        );
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Pull `reader` in `opts.chunk_size` reads until the day's array closes.
pub fn extract_day<R: Read>(mut reader: R, date: &str, opts: &ExtractOptions) -> Result<Value> {
    let mut extractor = DayExtractor::new(date, opts.clone());
    let mut chunk = vec![0u8; extractor.opts.chunk_size];
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        if let Some(day) = extractor.feed(&chunk[..n])? {
            return Ok(day);
        }
    }
    Err(extractor.end_of_stream())
}
