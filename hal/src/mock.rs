//! # Scripted Transport
//!
//! In-memory [`DeviceControl`] for tests. Every command is recorded with its
//! encoded bytes, and replies are served from a queue in submission order.
//! When the queue is empty a command succeeds with no data, which is how a
//! device acknowledges an UNMAP.

use crate::{cdb_from_slice, Cdb, Completion, DataTransfer, DeviceControl, Direction, HalResult, TransportError};
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::time::Duration;

/// A command as seen by the scripted device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    /// Command descriptor block
    pub cdb: Cdb,
    /// Data phase direction
    pub direction: Direction,
    /// Outbound payload (empty unless `direction` is `ToDevice`)
    pub data_out: Vec<u8>,
    /// Inbound buffer length offered by the caller
    pub data_in_len: usize,
    /// Timeout requested for the command
    pub timeout: Duration,
}

impl RecordedCommand {
    /// Operation code (first CDB byte)
    #[inline]
    pub fn opcode(&self) -> u8 {
        self.cdb[0]
    }
}

/// Scripted reply for one command
#[derive(Debug, Clone)]
enum Reply {
    /// Succeed, copying the bytes into an inbound buffer
    Data(Vec<u8>),
    /// Fail with the given error
    Fail(TransportError),
}

/// Fake device that records commands and replays scripted responses
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: VecDeque<Reply>,
    commands: Vec<RecordedCommand>,
}

impl ScriptedTransport {
    /// Create a transport with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply carrying `data`
    pub fn push_data(&mut self, data: &[u8]) -> &mut Self {
        self.replies.push_back(Reply::Data(data.to_vec()));
        self
    }

    /// Queue a successful reply without data
    pub fn push_ok(&mut self) -> &mut Self {
        self.replies.push_back(Reply::Data(Vec::new()));
        self
    }

    /// Queue a failure
    pub fn push_error(&mut self, error: TransportError) -> &mut Self {
        self.replies.push_back(Reply::Fail(error));
        self
    }

    /// Commands executed so far, oldest first
    #[inline]
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Commands executed with the given operation code
    pub fn commands_with_opcode(&self, opcode: u8) -> impl Iterator<Item = &RecordedCommand> {
        self.commands.iter().filter(move |cmd| cmd.opcode() == opcode)
    }

    /// Scripted replies not yet consumed
    #[inline]
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }
}

impl DeviceControl for ScriptedTransport {
    fn execute(
        &mut self,
        cdb: &[u8],
        transfer: DataTransfer<'_>,
        timeout: Duration,
    ) -> HalResult<Completion> {
        let cdb = cdb_from_slice(cdb)?;
        let direction = transfer.direction();
        let data_in_len = match &transfer {
            DataTransfer::FromDevice(buf) => buf.len(),
            _ => 0,
        };
        let data_out = match &transfer {
            DataTransfer::ToDevice(buf) => buf.to_vec(),
            _ => Vec::new(),
        };

        self.commands.push(RecordedCommand {
            cdb,
            direction,
            data_out,
            data_in_len,
            timeout,
        });

        match self.replies.pop_front() {
            Some(Reply::Fail(error)) => Err(error),
            Some(Reply::Data(data)) => {
                let mut residual = 0;
                if let DataTransfer::FromDevice(buf) = transfer {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    residual = (buf.len() - n) as u32;
                }
                Ok(Completion { residual })
            }
            None => Ok(Completion::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_data_and_records() {
        let mut dev = ScriptedTransport::new();
        dev.push_data(&[0xAA, 0xBB]);

        let mut reply = [0u8; 4];
        let completion = dev
            .execute(&[0x12, 1, 0xb0, 0, 4, 0], DataTransfer::FromDevice(&mut reply), Duration::from_secs(60))
            .unwrap();

        assert_eq!(reply, [0xAA, 0xBB, 0, 0]);
        assert_eq!(completion.residual, 2);

        let cmd = &dev.commands()[0];
        assert_eq!(cmd.opcode(), 0x12);
        assert_eq!(cmd.direction, Direction::FromDevice);
        assert_eq!(cmd.data_in_len, 4);
        assert_eq!(cmd.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_scripted_failure() {
        let mut dev = ScriptedTransport::new();
        dev.push_ok().push_error(TransportError::Timeout);

        let payload = [1u8, 2, 3];
        assert!(dev.execute(&[0x42], DataTransfer::ToDevice(&payload), Duration::ZERO).is_ok());
        assert_eq!(
            dev.execute(&[0x42], DataTransfer::ToDevice(&payload), Duration::ZERO),
            Err(TransportError::Timeout)
        );
        // Script exhausted: further commands succeed
        assert!(dev.execute(&[0x42], DataTransfer::None, Duration::ZERO).is_ok());

        assert_eq!(dev.commands_with_opcode(0x42).count(), 3);
        assert_eq!(dev.commands()[0].data_out, payload);
        assert_eq!(dev.pending_replies(), 0);
    }
}
