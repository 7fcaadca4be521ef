//! Incremental parser for streamed server-sent events
//!
//! Accumulates raw bytes from the response stream and extracts complete
//! `data:` payload lines as they arrive. Event payloads never split
//! across `data:` lines in this API, so line framing is sufficient.

use crate::errors::{ArchitectError, Result};

/// Maximum buffer size (1MB)
pub const MAX_BUFFER_SIZE: usize = 1_048_576;

/// Incremental SSE line parser
#[derive(Debug)]
pub struct SseParser {
    /// Accumulation buffer holding the current incomplete line
    buffer: Vec<u8>,

    /// Maximum buffer size
    max_buffer_size: usize,
}

impl SseParser {
    /// Create new parser with default settings
    pub fn new() -> Self {
        Self::with_capacity(MAX_BUFFER_SIZE)
    }

    /// Create parser with custom buffer capacity
    pub fn with_capacity(max_buffer_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            max_buffer_size,
        }
    }

    /// Add bytes and return every complete `data:` payload they finish.
    ///
    /// Non-data lines (blank event separators, `event:` fields) are
    /// dropped. Payloads are returned in arrival order.
    pub fn add_bytes(&mut self, bytes: &[u8]) -> Result<Vec<String>> {
        if self.buffer.len() + bytes.len() > self.max_buffer_size {
            return Err(ArchitectError::StreamingError(format!(
                "Buffer overflow: {} bytes exceeds maximum {}",
                self.buffer.len() + bytes.len(),
                self.max_buffer_size
            )));
        }

        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(payload) = Self::data_payload(&line) {
                payloads.push(payload);
            }
        }

        Ok(payloads)
    }

    /// Drain a trailing unterminated line at end of stream
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line: Vec<u8> = self.buffer.drain(..).collect();
        Self::data_payload(&line)
    }

    /// Get current buffer size
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn data_payload(line: &[u8]) -> Option<String> {
        let text = String::from_utf8_lossy(line);
        let trimmed = text.trim_end_matches(['\n', '\r']);
        let payload = trimmed.strip_prefix("data:")?.trim_start();
        if payload.is_empty() {
            None
        } else {
            Some(payload.to_string())
        }
    }
}

impl Default for SseParser {
    fn default() -> Self {
        Self::new()
    }
}
