//! Shared utilities

use is_terminal::IsTerminal;
use minus::Pager;
use std::io::{self, Write};

/// `Write` adapter feeding a `minus` pager
///
/// A write may end in the middle of a multi-byte character; the incomplete tail is
/// held back until the next write completes it.
pub struct PagerWriter {
    pager: Pager,
    pending: Vec<u8>,
}

impl PagerWriter {
    /// A writer and the pager handle to pass to `minus::page_all` once output is done
    pub fn paged() -> (Self, Pager) {
        let pager = Pager::new();
        let writer = PagerWriter {
            pager: pager.clone(),
            pending: Vec::new(),
        };

        (writer, pager)
    }

    /// Page only when a person is looking at stdout
    pub fn should_page(no_pager: bool) -> bool {
        !no_pager && io::stdout().is_terminal()
    }
}

impl Write for PagerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);

        let valid_up_to = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(error) if error.error_len().is_none() => error.valid_up_to(),
            Err(error) => return Err(io::Error::new(io::ErrorKind::InvalidData, error)),
        };

        let complete = self.pending.drain(..valid_up_to).collect::<Vec<_>>();
        let text = String::from_utf8(complete)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.pager.push_str(text).map_err(io::Error::other)?;

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
