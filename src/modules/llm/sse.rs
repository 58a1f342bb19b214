//! Incremental decoder for upstream `text/event-stream` bodies.
//!
//! Network chunks do not respect line boundaries (or UTF-8 boundaries), so
//! bytes are buffered until a full line is available.

/// Payload that ends an OpenAI-style stream
pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the `data:` payloads of every completed line
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if let Some(data) = data_payload(&line[..line.len() - 1]) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flush a trailing line that arrived without a newline
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buf);
        data_payload(&line)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.strip_suffix('\r').unwrap_or(&line);
    // Comments (`:`), `event:`/`id:`/`retry:` fields and blank separators carry no data
    let data = line.strip_prefix("data:")?;
    Some(data.strip_prefix(' ').unwrap_or(data).to_string())
}
