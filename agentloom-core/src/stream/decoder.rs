use tracing::debug;

use super::event::StreamEvent;

const DATA_PREFIX: &[u8] = b"data: ";

/// Incremental decoder for newline-delimited `data: <json>` frames.
///
/// Bytes are buffered until a `\n` arrives, so neither a frame nor a UTF-8
/// sequence split across network chunks is ever parsed early. Lines without
/// the `data: ` prefix and payloads that are not valid JSON are dropped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    skipped: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every event completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let Some(last_newline) = self.buffer.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };

        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);

        complete
            .split(|b| *b == b'\n')
            .filter_map(|line| self.decode_line(line))
            .collect()
    }

    /// Flush a trailing frame that was not newline-terminated.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let line = std::mem::take(&mut self.buffer);
        self.decode_line(&line).into_iter().collect()
    }

    /// Bytes held back waiting for the end of their line.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// `data:` lines dropped because their payload did not parse.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<StreamEvent> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let payload = line.strip_prefix(DATA_PREFIX)?;
        let text = String::from_utf8_lossy(payload);

        match StreamEvent::parse(&text) {
            Ok(event) => Some(event),
            Err(e) => {
                self.skipped += 1;
                debug!("Skipping malformed stream frame: {}", e);
                None
            }
        }
    }
}
