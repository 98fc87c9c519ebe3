//! In-memory transport double for the engine unit tests.

use std::io::{self, Cursor, Read, Write};

use nbd_transport::Transport;

/// Scripted transport: reads come from a canned buffer, writes and
/// shutdowns are recorded for later assertions.
#[derive(Debug)]
pub(crate) struct MemoryTransport {
    reader: Cursor<Vec<u8>>,
    writes: Vec<u8>,
    shutdowns: usize,
}

impl MemoryTransport {
    pub(crate) fn new(input: &[u8]) -> Self {
        Self {
            reader: Cursor::new(input.to_vec()),
            writes: Vec::new(),
            shutdowns: 0,
        }
    }

    pub(crate) fn writes(&self) -> &[u8] {
        &self.writes
    }

    pub(crate) fn shutdowns(&self) -> usize {
        self.shutdowns
    }
}

impl Read for MemoryTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl Write for MemoryTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for MemoryTransport {
    fn shutdown(&mut self) -> io::Result<()> {
        self.shutdowns += 1;
        Ok(())
    }
}
