//! Streaming response line decoder.
//!
//! Wire format (numeric result codes, `ATV0`):
//! ```text
//! <CR><LF>+CSQ: 15,99<CR><LF>0<CR>
//! <CR><LF>>␠                        ← send prompt, no terminator
//! ```
//!
//! Bytes are accumulated until a CR and yielded as one line with LF and
//! NUL removed.  Blank lines never leave the decoder.  The send prompt
//! `"> "` is yielded as soon as it is complete because the modem never
//! terminates it.  A line longer than [`LINE_CAPACITY`] is dropped whole
//! and decoding resumes at the next CR.

use log::warn;

/// Maximum response line length (bytes).
pub const LINE_CAPACITY: usize = 512;

/// Prompt emitted by the modem when it is ready for raw payload bytes.
pub const SEND_PROMPT: &str = "> ";

/// One decoded response line.
pub type Line = heapless::String<LINE_CAPACITY>;

/// Decoder state machine.
enum DecoderState {
    /// Accumulating bytes of the current line.
    Collecting,
    /// The current line overflowed; skip until the next CR.
    Discarding,
}

/// Byte-at-a-time line assembler.
pub struct LineDecoder {
    state: DecoderState,
    buf: heapless::Vec<u8, LINE_CAPACITY>,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Collecting,
            buf: heapless::Vec::new(),
        }
    }

    /// Feed one byte.  Returns `Some(line)` when a non-empty line completes.
    pub fn push(&mut self, byte: u8) -> Option<Line> {
        match self.state {
            DecoderState::Discarding => {
                if byte == b'\r' {
                    self.state = DecoderState::Collecting;
                }
                None
            }
            DecoderState::Collecting => match byte {
                b'\r' => self.take_line(),
                b'\n' | 0 => None,
                _ => {
                    if self.buf.push(byte).is_err() {
                        warn!("LINK: response line exceeds {} bytes, dropped", LINE_CAPACITY);
                        self.buf.clear();
                        self.state = DecoderState::Discarding;
                        return None;
                    }
                    if self.buf.as_slice() == SEND_PROMPT.as_bytes() {
                        return self.take_line();
                    }
                    None
                }
            },
        }
    }

    /// Drop any partial line (e.g. after a hardware reset).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.state = DecoderState::Collecting;
    }

    fn take_line(&mut self) -> Option<Line> {
        if self.buf.is_empty() {
            return None;
        }
        let mut line = Line::new();
        match core::str::from_utf8(&self.buf) {
            Ok(text) => {
                // Same capacity as `buf`, cannot overflow.
                let _ = line.push_str(text);
            }
            Err(_) => warn!("LINK: non-UTF-8 response line dropped"),
        }
        self.buf.clear();
        if line.is_empty() { None } else { Some(line) }
    }
}
