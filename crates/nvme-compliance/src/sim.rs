//! In-memory stand-ins for the device under test.
//!
//! [`SimRegisterFile`] is a BAR0 register space that honours the RO masks of a register map, and
//! [`SimQueueController`] is an admin command endpoint that tracks I/O queue ids. Both behave
//! like a compliant controller by default and expose knobs to inject the defects the compliance
//! passes are meant to catch.

use std::collections::BTreeSet;
use std::ops::Range;

use tracing::trace;

use crate::error::{DescriptorError, TransportError};
use crate::regs::{RegisterMap, NATIVE_ACCESS_WIDTH};
use crate::transport::{
    AdminOpcode, Completion, CommandTransport, QueueIdCommand, QueueLifecycle, RegisterTransport,
};

/// Largest register space [`SimRegisterFile::from_map`] will allocate: the 4 KiB of controller
/// registers plus doorbells for every I/O queue pair with a 4-byte stride.
pub const MAX_SIM_EXTENT: u64 = 0x1_0000;

/// Byte-addressed register space with per-bit write protection.
#[derive(Debug, Clone)]
pub struct SimRegisterFile {
    bytes: Vec<u8>,
    read_only: Vec<u8>,
    read_faults: BTreeSet<u64>,
    write_faults: BTreeSet<u64>,
    reads: usize,
    writes: usize,
}

impl SimRegisterFile {
    /// A register space of `len` bytes, all zero and all writable.
    pub fn new(len: usize) -> Self {
        SimRegisterFile {
            bytes: vec![0; len],
            read_only: vec![0; len],
            read_faults: BTreeSet::new(),
            write_faults: BTreeSet::new(),
            reads: 0,
            writes: 0,
        }
    }

    /// A compliant device for `map`: every register holds its default value and its RO bits
    /// ignore writes.
    ///
    /// Maps reaching past [`MAX_SIM_EXTENT`] are rejected.
    pub fn from_map(map: &RegisterMap) -> Result<Self, DescriptorError> {
        let extent = map.extent();
        let len = usize::try_from(extent)
            .ok()
            .filter(|_| extent <= MAX_SIM_EXTENT)
            .ok_or(DescriptorError::ExtentTooLarge {
                extent,
                limit: MAX_SIM_EXTENT,
            })?;

        let mut sim = SimRegisterFile::new(len);
        for (_, reg) in map.iter() {
            for chunk in reg.chunks() {
                let mask = chunk.width_mask();
                // Bounded by `extent`, which fits in `len`.
                let start = chunk.offset as usize;
                let end = start + chunk.width;
                let default = reg.default_value().chunk(chunk.index) & mask;
                let read_only = reg.read_only_mask().chunk(chunk.index) & mask;
                sim.bytes[start..end].copy_from_slice(&default.to_le_bytes()[..chunk.width]);
                sim.read_only[start..end].copy_from_slice(&read_only.to_le_bytes()[..chunk.width]);
            }
        }
        Ok(sim)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Sets the raw contents at `offset`, ignoring write protection.
    pub fn poke(&mut self, offset: u64, width: usize, value: u64) -> Result<(), TransportError> {
        let range = self
            .range(offset, width)
            .map_err(|reason| TransportError::write(offset, width, reason))?;
        self.bytes[range].copy_from_slice(&value.to_le_bytes()[..width]);
        Ok(())
    }

    /// Raw contents at `offset`, without counting as a device access.
    pub fn peek(&self, offset: u64, width: usize) -> Result<u64, TransportError> {
        let range = self
            .range(offset, width)
            .map_err(|reason| TransportError::read(offset, width, reason))?;
        let mut buf = [0u8; NATIVE_ACCESS_WIDTH];
        buf[..width].copy_from_slice(&self.bytes[range]);
        Ok(u64::from_le_bytes(buf))
    }

    /// Makes the bits of `mask` at `offset` writable, as a defective device would. Bits past the
    /// end of the register space are ignored.
    pub fn leak_ro_bits(&mut self, offset: u64, mask: u64) {
        let Ok(start) = usize::try_from(offset) else {
            return;
        };
        for (i, byte) in mask.to_le_bytes().iter().enumerate() {
            let Some(at) = start.checked_add(i) else {
                break;
            };
            if let Some(ro) = self.read_only.get_mut(at) {
                *ro &= !byte;
            }
        }
    }

    /// Fails every read whose range covers `offset`.
    pub fn fail_reads_at(&mut self, offset: u64) {
        self.read_faults.insert(offset);
    }

    /// Fails every write whose range covers `offset`.
    pub fn fail_writes_at(&mut self, offset: u64) {
        self.write_faults.insert(offset);
    }

    /// Number of reads the transport has served.
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Number of writes the transport has accepted.
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn range(&self, offset: u64, width: usize) -> Result<Range<usize>, &'static str> {
        if width == 0 || width > NATIVE_ACCESS_WIDTH {
            return Err("unsupported access width");
        }
        let start = usize::try_from(offset).map_err(|_| "offset out of range")?;
        match start.checked_add(width) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            _ => Err("access beyond end of register space"),
        }
    }
}

fn covers(faults: &BTreeSet<u64>, range: &Range<usize>) -> bool {
    faults
        .range(range.start as u64..range.end as u64)
        .next()
        .is_some()
}

impl RegisterTransport for SimRegisterFile {
    fn read(&mut self, offset: u64, width: usize) -> Result<u64, TransportError> {
        let range = self
            .range(offset, width)
            .map_err(|reason| TransportError::read(offset, width, reason))?;
        if covers(&self.read_faults, &range) {
            return Err(TransportError::read(offset, width, "injected read failure"));
        }

        self.reads += 1;
        let mut buf = [0u8; NATIVE_ACCESS_WIDTH];
        buf[..width].copy_from_slice(&self.bytes[range]);
        Ok(u64::from_le_bytes(buf))
    }

    fn write(&mut self, offset: u64, width: usize, value: u64) -> Result<(), TransportError> {
        let range = self
            .range(offset, width)
            .map_err(|reason| TransportError::write(offset, width, reason))?;
        if covers(&self.write_faults, &range) {
            return Err(TransportError::write(offset, width, "injected write failure"));
        }

        self.writes += 1;
        trace!(offset, width, value, "register write");
        let incoming = value.to_le_bytes();
        for (i, at) in range.enumerate() {
            let ro = self.read_only[at];
            self.bytes[at] = (self.bytes[at] & ro) | (incoming[i] & !ro);
        }
        Ok(())
    }
}

/// Admin command endpoint tracking the I/O queues that exist on the controller.
#[derive(Debug, Clone)]
pub struct SimQueueController {
    max_queues: u16,
    io_cqs: BTreeSet<u16>,
    io_sqs: BTreeSet<u16>,
    accept_any_qid: bool,
    submitted: usize,
}

impl SimQueueController {
    /// A controller supporting I/O queue ids `1..=max_queues`.
    pub fn new(max_queues: u16) -> Self {
        SimQueueController {
            max_queues,
            io_cqs: BTreeSet::new(),
            io_sqs: BTreeSet::new(),
            accept_any_qid: false,
            submitted: 0,
        }
    }

    /// Defect: report success for deletes of queues that do not exist.
    pub fn accept_any_qid(mut self) -> Self {
        self.accept_any_qid = true;
        self
    }

    pub fn io_sqs(&self) -> impl Iterator<Item = u16> + '_ {
        self.io_sqs.iter().copied()
    }

    pub fn io_cqs(&self) -> impl Iterator<Item = u16> + '_ {
        self.io_cqs.iter().copied()
    }

    /// Commands submitted so far.
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    fn in_range(&self, qid: u32) -> Option<u16> {
        let qid = u16::try_from(qid).ok()?;
        (qid != 0 && qid <= self.max_queues).then_some(qid)
    }
}

impl CommandTransport for SimQueueController {
    fn submit(&mut self, command: &QueueIdCommand) -> Result<Completion, TransportError> {
        self.submitted += 1;
        let removed = match (command.opcode, self.in_range(command.qid)) {
            (AdminOpcode::DeleteIoSq, Some(qid)) => self.io_sqs.remove(&qid),
            // A CQ cannot be deleted while an SQ still posts to it.
            (AdminOpcode::DeleteIoCq, Some(qid)) if self.io_sqs.contains(&qid) => {
                return Ok(Completion::INVALID_QUEUE_DELETION);
            }
            (AdminOpcode::DeleteIoCq, Some(qid)) => self.io_cqs.remove(&qid),
            _ => false,
        };

        if removed || self.accept_any_qid {
            Ok(Completion::SUCCESS)
        } else {
            Ok(Completion::INVALID_QID)
        }
    }
}

impl QueueLifecycle for SimQueueController {
    fn create_io_queue_pair(
        &mut self,
        qid: u16,
        entries: u16,
    ) -> Result<Completion, TransportError> {
        let Some(qid) = self.in_range(u32::from(qid)) else {
            return Ok(Completion::INVALID_QID);
        };
        if entries < 2 || self.io_cqs.contains(&qid) || self.io_sqs.contains(&qid) {
            return Ok(Completion::INVALID_FIELD);
        }
        self.io_cqs.insert(qid);
        self.io_sqs.insert(qid);
        Ok(Completion::SUCCESS)
    }
}
