use async_stream::try_stream;
use futures::{Stream, StreamExt};
use log::debug;
use std::char::REPLACEMENT_CHARACTER;

/// Marker that opens every frame line on the wire.
pub const FRAME_PREFIX: &str = "data: ";
const LINE_DELIMITER: char = '\n';

/// Incremental decoder turning raw body bytes into frame payloads.
///
/// Bytes are decoded as UTF-8 with a carry-over buffer, so a multi-byte
/// character split across two reads is reassembled instead of replaced.
/// Text is then split on line breaks: complete lines starting with
/// [`FRAME_PREFIX`] are returned without the prefix, every other line is
/// dropped, and the trailing partial line waits for the next read.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Undecoded bytes of an incomplete trailing UTF-8 sequence
    pending: Vec<u8>,
    /// Decoded text not yet terminated by a line break
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            pending: Vec::with_capacity(4),
            buffer: String::with_capacity(1024),
        }
    }

    /// Feeds one transport buffer and returns the payloads of every frame it completed.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.decode(bytes);

        let mut payloads = Vec::new();
        while let Some(line_end) = self.buffer.find(LINE_DELIMITER) {
            let line = &self.buffer[..line_end];
            let line = line.strip_suffix('\r').unwrap_or(line);
            if let Some(payload) = line.strip_prefix(FRAME_PREFIX) {
                payloads.push(payload.to_string());
            } else if !line.is_empty() {
                debug!("[Frames] skipping non-frame line: {line}");
            }
            self.buffer.drain(..=line_end);
        }
        payloads
    }

    /// Ends decoding. An unterminated trailing line can never be a complete
    /// frame and is discarded; returns how many bytes were thrown away.
    pub fn finish(self) -> usize {
        let discarded = self.buffer.len() + self.pending.len();
        if discarded > 0 {
            debug!("[Frames] discarding {discarded} bytes of unterminated input at end of stream");
        }
        discarded
    }

    fn decode(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&self.pending[..valid]) {
                        self.buffer.push_str(text);
                    }
                    match e.error_len() {
                        // Incomplete sequence at the end: keep it for the next read.
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                        Some(invalid) => {
                            self.buffer.push(REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + invalid);
                        }
                    }
                }
            }
        }
    }
}

/// Turns a body of byte buffers into a stream of frame payloads.
///
/// Transport errors are passed through unchanged and end the stream.
pub fn frames<S, B, E>(body: S) -> impl Stream<Item = Result<String, E>> + Send
where
    S: Stream<Item = Result<B, E>> + Send,
    B: AsRef<[u8]> + Send,
    E: Send,
{
    try_stream! {
        futures::pin_mut!(body);
        let mut decoder = FrameDecoder::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            for payload in decoder.push(chunk.as_ref()) {
                yield payload;
            }
        }

        decoder.finish();
    }
}
