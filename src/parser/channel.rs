/// Reassembles arbitrarily fragmented output into complete lines.
///
/// Process output arrives in chunks cut wherever the pipe buffer happened to
/// fill, so a line can be split across any number of fragments. One
/// accumulator is kept per output channel; after every ingestion it holds at
/// most one unterminated partial line.
///
/// Line endings are normalized while ingesting: `\r\n` and a bare `\r` both
/// become `\n`. A `\r` that ends a fragment is withheld until the next
/// fragment (or [`finalize`](Self::finalize)) decides whether it was half of
/// a `\r\n` pair, so fragmentation never changes the produced lines.
#[derive(Debug, Default)]
pub struct LineAccumulator {
    pending: String,
}

impl LineAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment, normalizing line endings.
    pub fn ingest(&mut self, data: &str) {
        let mut held_cr = self.pending.ends_with('\r');
        if held_cr {
            self.pending.pop();
        }

        for ch in data.chars() {
            match ch {
                '\n' => {
                    // Completes a \r\n pair or stands alone; either way one ending.
                    self.pending.push('\n');
                    held_cr = false;
                }
                '\r' => {
                    if held_cr {
                        // The previous \r was a bare ending.
                        self.pending.push('\n');
                    }
                    held_cr = true;
                }
                _ => {
                    if held_cr {
                        self.pending.push('\n');
                        held_cr = false;
                    }
                    self.pending.push(ch);
                }
            }
        }

        if held_cr {
            self.pending.push('\r');
        }
    }

    /// Pop the next complete line, including its trailing `\n`.
    pub fn next_line(&mut self) -> Option<String> {
        let idx = self.pending.find('\n')?;
        let rest = self.pending.split_off(idx + 1);
        Some(std::mem::replace(&mut self.pending, rest))
    }

    /// Take the unterminated remainder, if any. A withheld trailing `\r`
    /// counts as a line ending at this point. Complete lines should be
    /// drained with [`next_line`](Self::next_line) first.
    pub fn finalize(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let mut rest = std::mem::take(&mut self.pending);
        if rest.ends_with('\r') {
            rest.pop();
            rest.push('\n');
        }
        Some(rest)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Discard any buffered partial line.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
