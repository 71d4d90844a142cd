use std::collections::VecDeque;
use std::io;

/// Encode collaborator supplying one raw AAC access unit at a time.
///
/// Typically backed by a hardware or software AAC-LC encoder draining its
/// output queue. Units carry no ADTS header.
pub trait AccessUnitSource {
    /// Next encoded access unit, or `None` once the encoder is drained.
    fn next_access_unit(&mut self) -> io::Result<Option<Vec<u8>>>;
}

impl AccessUnitSource for VecDeque<Vec<u8>> {
    fn next_access_unit(&mut self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.pop_front())
    }
}
