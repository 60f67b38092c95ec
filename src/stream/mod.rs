//! Incremental assembly of streamed chat replies
//!
//! The backend answers `POST /chat` with a chunked body of newline-separated
//! lines, a subset of which are `data:<json>` frames carrying an optional
//! `chunk` field to append. Transport chunks arrive with no alignment to
//! line boundaries, so the assembler keeps the unterminated tail of the
//! decoded text and re-splits it once the next chunk arrives — a frame that
//! straddles two chunks is reassembled intact.

use serde::Deserialize;

/// Payload of one `data:` frame.
#[derive(Debug, Deserialize)]
struct Frame {
    #[serde(default)]
    chunk: Option<String>,
    #[serde(default)]
    done: bool,
}

/// Turns a sequence of transport chunks into one growing text value.
#[derive(Debug, Default)]
pub struct Assembler {
    /// Decoded text not yet terminated by a newline.
    remainder: String,
    full_text: String,
    done: bool,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transport chunk. Bytes are decoded lossily (malformed
    /// sequences become replacement characters, never an error), complete
    /// lines are split off, and each well-formed `data:` frame appends its
    /// `chunk` payload to the full text. `on_snapshot` runs after every
    /// appended payload with the text assembled so far.
    ///
    /// Unparseable frames are dropped one line at a time; lines without the
    /// `data:` prefix are ignored.
    pub fn push(&mut self, bytes: &[u8], mut on_snapshot: impl FnMut(&str)) {
        self.remainder.push_str(&String::from_utf8_lossy(bytes));

        while let Some(pos) = self.remainder.find('\n') {
            let line = self.remainder[..pos].trim().to_string();
            self.remainder = self.remainder[pos + 1..].to_string();

            let Some(payload) = line.strip_prefix("data:") else {
                continue;
            };

            match serde_json::from_str::<Frame>(payload.trim()) {
                Ok(frame) => {
                    if let Some(chunk) = frame.chunk {
                        self.full_text.push_str(&chunk);
                        on_snapshot(&self.full_text);
                    }
                    if frame.done {
                        self.done = true;
                    }
                }
                Err(err) => {
                    tracing::debug!(%err, line = %line, "dropping malformed stream frame");
                }
            }
        }
    }

    /// Text assembled from every frame seen so far.
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// True once a `data:{"done": true}` terminator frame was seen.
    pub fn is_done(&self) -> bool {
        self.done
    }
}
