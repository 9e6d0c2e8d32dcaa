//! Separator-aware overlapping text splitter.
//!
//! Goals:
//! - Split raw documents into bounded segments that avoid mid-word cuts
//!   wherever the text allows.
//! - Carry an overlap between consecutive segments so context survives the
//!   chunk boundary.
//! - Stay fully deterministic: same input and parameters produce identical
//!   output, which is what makes re-indexing idempotent.
//!
//! Separators are tried in descending granularity: paragraph break, line
//! break, sentence end, word gap. A hard character cut is the last resort
//! when no separator fits inside the size budget. Sizes are in bytes of
//! UTF-8; all cuts land on character boundaries.

use tracing::trace;

use crate::config::ChunkingConfig;
use crate::errors::ConfigError;

/// Separator patterns in descending granularity.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Validated splitter; construct once, reuse across documents.
#[derive(Clone, Copy, Debug)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// Creates a splitter from validated chunking parameters.
    ///
    /// # Errors
    /// Returns [`ConfigError::OutOfRange`] unless `chunk_size > 0` and
    /// `chunk_overlap < chunk_size`.
    pub fn new(cfg: ChunkingConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            size: cfg.chunk_size,
            overlap: cfg.chunk_overlap,
        })
    }

    /// Returns a lazy, restartable iterator over the chunks of `text`.
    ///
    /// The iterator borrows the input and is `Clone`, so a fresh pass can be
    /// started at any time. Empty input yields no chunks.
    pub fn split<'a>(&self, text: &'a str) -> Chunks<'a> {
        trace!(len = text.len(), size = self.size, "chunker::split");
        Chunks {
            text,
            pos: 0,
            size: self.size,
            overlap: self.overlap,
        }
    }
}

/// Iterator over chunk slices of a single document.
#[derive(Clone, Debug)]
pub struct Chunks<'a> {
    text: &'a str,
    pos: usize,
    size: usize,
    overlap: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.pos >= self.text.len() {
            return None;
        }

        // Tail fits entirely: emit and finish.
        if self.text.len() - self.pos <= self.size {
            let out = &self.text[self.pos..];
            self.pos = self.text.len();
            return Some(out);
        }

        // Window end, pulled back to a character boundary.
        let mut window_end = self.pos + self.size;
        while !self.text.is_char_boundary(window_end) {
            window_end -= 1;
        }
        let window = &self.text[self.pos..window_end];

        // Coarsest separator that still leaves a non-empty chunk wins;
        // otherwise hard cut at the window end.
        let mut split_end = window_end;
        for sep in SEPARATORS {
            if let Some(at) = window.rfind(sep) {
                if at > 0 {
                    split_end = self.pos + at + sep.len();
                    break;
                }
            }
        }

        let out = &self.text[self.pos..split_end];

        // Step back by the overlap, but always move forward.
        let mut next = split_end.saturating_sub(self.overlap).max(self.pos + 1);
        while next < self.text.len() && !self.text.is_char_boundary(next) {
            next += 1;
        }
        self.pos = next;

        Some(out)
    }
}
