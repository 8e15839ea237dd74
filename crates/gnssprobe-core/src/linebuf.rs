/// Total size of the sniffing buffer; one slot stays reserved as terminator,
/// so a line holds at most `LINE_CAPACITY - 1` bytes.
pub const LINE_CAPACITY: usize = 80;

const SENTENCE_START: u8 = b'$';
const LINE_END: u8 = b'\n';

/// Bounded buffer holding the sentence currently on the wire.
///
/// `$` restarts the buffer, bytes past capacity are dropped until the next
/// restart, and `\n` hands the finished line out and empties the buffer.
pub struct LineBuffer {
    buf: [u8; LINE_CAPACITY],
    len: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self {
            buf: [0; LINE_CAPACITY],
            len: 0,
        }
    }

    /// Feed one byte; `on_line` runs with the completed line (including the
    /// trailing `\n` when it fit) before the buffer is cleared.
    pub fn feed<F: FnOnce(&[u8])>(&mut self, byte: u8, on_line: F) {
        if byte == SENTENCE_START {
            self.clear();
        }
        self.push(byte);

        if byte == LINE_END {
            on_line(self.as_bytes());
            self.clear();
        }
    }

    /// Append if there is room; returns whether the byte was kept.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.len >= LINE_CAPACITY - 1 {
            return false;
        }
        self.buf[self.len] = byte;
        self.len += 1;
        true
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte-wise substring search.
pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}
