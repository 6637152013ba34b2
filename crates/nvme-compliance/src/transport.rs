//! Seams to the device under test.
//!
//! The compliance core never talks to hardware directly: register accesses go through a
//! [`RegisterTransport`], admin commands through a [`CommandTransport`]. Real deployments back
//! these with a BAR0 mapping and an admin queue pair; tests use the simulators in [`crate::sim`].

use crate::error::{CommandOutcome, TransportError};

/// Byte-addressed access to the controller register space.
///
/// Accesses are little-endian and `width` is between 1 and 8 bytes. Implementations perform
/// exactly one device access per call and never retry.
pub trait RegisterTransport {
    fn read(&mut self, offset: u64, width: usize) -> Result<u64, TransportError>;
    fn write(&mut self, offset: u64, width: usize, value: u64) -> Result<(), TransportError>;
}

/// Admin commands that carry a queue identifier in CDW10 bits 15:0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AdminOpcode {
    DeleteIoSq = 0x00,
    DeleteIoCq = 0x04,
}

/// A queue-identifier-bearing admin command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueIdCommand {
    pub opcode: AdminOpcode,
    pub qid: u32,
}

impl QueueIdCommand {
    pub fn delete_io_sq(qid: u32) -> Self {
        QueueIdCommand {
            opcode: AdminOpcode::DeleteIoSq,
            qid,
        }
    }

    pub fn delete_io_cq(qid: u32) -> Self {
        QueueIdCommand {
            opcode: AdminOpcode::DeleteIoCq,
            qid,
        }
    }
}

/// Completion status field (CQE DW3 bits 31:17, phase tag excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub status: u16,
}

impl Completion {
    pub const SUCCESS: Completion = Completion::new(0, 0x00, false);
    pub const INVALID_FIELD: Completion = Completion::new(0, 0x02, true);
    pub const INVALID_QID: Completion = Completion::new(1, 0x01, true);
    pub const INVALID_QUEUE_DELETION: Completion = Completion::new(1, 0x0c, true);

    pub const fn new(sct: u8, sc: u8, dnr: bool) -> Self {
        let mut status = (sc as u16) << 1;
        status |= ((sct & 0x7) as u16) << 9;
        if dnr {
            status |= 1 << 14;
        }
        Completion { status }
    }

    pub fn sc(&self) -> u8 {
        (self.status >> 1) as u8
    }

    pub fn sct(&self) -> u8 {
        ((self.status >> 9) & 0x7) as u8
    }

    pub fn dnr(&self) -> bool {
        self.status & (1 << 14) != 0
    }

    pub fn outcome(&self) -> CommandOutcome {
        match (self.sct(), self.sc()) {
            (0, 0x00) => CommandOutcome::Accepted,
            (1, 0x01) => CommandOutcome::InvalidQueueId,
            _ => CommandOutcome::Other,
        }
    }
}

/// Submits a single admin command and reaps its completion.
pub trait CommandTransport {
    fn submit(&mut self, command: &QueueIdCommand) -> Result<Completion, TransportError>;
}

/// I/O queue creation, owned by the controller lifecycle manager.
pub trait QueueLifecycle {
    /// Creates an I/O completion queue and its paired submission queue, both with id `qid`.
    fn create_io_queue_pair(&mut self, qid: u16, entries: u16)
        -> Result<Completion, TransportError>;
}
