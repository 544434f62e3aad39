use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode one record as a self-delimited line: its JSON rendering plus a
/// trailing newline. The line is the unit of transfer, so a reader never
/// observes a partial record.
pub fn encode_line<T: Serialize>(record: &T) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    Ok(line)
}

/// Incremental reader for newline-delimited JSON records.
///
/// Feed it raw bytes in whatever chunks the transport delivers: complete
/// lines decode into records, the trailing partial line stays buffered,
/// and a malformed line is logged and dropped without affecting the rest
/// of the stream.
#[derive(Debug)]
pub struct LineDecoder<T> {
    buffer: Vec<u8>,
    _record: PhantomData<T>,
}

impl<T> Default for LineDecoder<T> {
    fn default() -> Self {
        LineDecoder {
            buffer: Vec::new(),
            _record: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> LineDecoder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<T> {
        self.buffer.extend_from_slice(bytes);
        let mut records = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(record) = decode(&line[..line.len() - 1]) {
                records.push(record);
            }
        }
        records
    }

    /// Decode whatever is left in the buffer as a final, unterminated line
    pub fn finish(mut self) -> Option<T> {
        let line = std::mem::take(&mut self.buffer);
        decode(&line)
    }
}

fn decode<T: DeserializeOwned>(line: &[u8]) -> Option<T> {
    if line.iter().all(|b| b.is_ascii_whitespace()) {
        return None;
    }
    match serde_json::from_slice(line) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!("Dropping malformed stream line: {}", e);
            None
        }
    }
}
