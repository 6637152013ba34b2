use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::regs::RegisterId;

/// Direction of a failed register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Read => f.write_str("read"),
            AccessKind::Write => f.write_str("write"),
        }
    }
}

/// I/O failure reported by a register or command transport.
///
/// Always fatal to the current pass. Nothing in this crate retries a transport operation: the
/// device state after a failed probe write is unknown, so the pass must stop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{op} of {width} bytes at offset {offset:#x} failed: {reason}")]
pub struct TransportError {
    pub op: AccessKind,
    pub offset: u64,
    pub width: usize,
    pub reason: String,
}

impl TransportError {
    pub fn read(offset: u64, width: usize, reason: impl Into<String>) -> Self {
        TransportError {
            op: AccessKind::Read,
            offset,
            width,
            reason: reason.into(),
        }
    }

    pub fn write(offset: u64, width: usize, reason: impl Into<String>) -> Self {
        TransportError {
            op: AccessKind::Write,
            offset,
            width,
            reason: reason.into(),
        }
    }
}

/// Which check observed a register mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Plain read of the reset value.
    Defaults,
    /// Re-check after writing the RO bits as 1.
    WriteOnes,
    /// Re-check after writing the RO bits as 0.
    WriteZeros,
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probe::Defaults => f.write_str("default value check"),
            Probe::WriteOnes => f.write_str("after writing 1s"),
            Probe::WriteZeros => f.write_str("after writing 0s"),
        }
    }
}

/// Classification of a command completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Accepted,
    InvalidQueueId,
    Other,
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Accepted => f.write_str("success"),
            CommandOutcome::InvalidQueueId => f.write_str("invalid queue identifier"),
            CommandOutcome::Other => f.write_str("unexpected status"),
        }
    }
}

/// A device behaved differently from what the register set or command set mandates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComplianceError {
    /// Masked RO bits differ from their mandated default.
    ///
    /// `bit` is relative to `chunk`; native-width registers only have chunk 0.
    #[error(
        "{desc} RO bit #{bit} has incorrect value ({probe}, chunk {chunk}: expected {expected:#x}, read {actual:#x})"
    )]
    Register {
        register: RegisterId,
        desc: String,
        chunk: usize,
        expected: u64,
        actual: u64,
        bit: u32,
        probe: Probe,
    },

    /// A command carrying queue identifier `qid` completed with the wrong status.
    #[error("QID {qid}: expected {expected}, controller reported {actual} (status {code:#06x})")]
    Identifier {
        qid: u32,
        expected: CommandOutcome,
        actual: CommandOutcome,
        code: u16,
    },
}

/// Errors returned by a register compliance pass.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("register {register} ({desc}): {source}")]
    Transport {
        register: RegisterId,
        desc: String,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    Compliance(#[from] ComplianceError),

    #[error("register {0} is not in the register map")]
    UnknownRegister(RegisterId),
}

/// Errors returned by a queue identifier probe run.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("{phase} phase, QID {qid}: {source}")]
    Transport {
        phase: String,
        qid: u32,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    Compliance(#[from] ComplianceError),
}

/// A register descriptor or register map that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("{desc}: register size must be non-zero")]
    ZeroSize { desc: String },

    #[error(
        "{desc}: unsupported register size {size} (expected 1, 2, 4 or 8 bytes, or a multiple of 8)"
    )]
    UnsupportedWidth { desc: String, size: usize },

    #[error("{desc}: offset {offset:#x} is not aligned to {align} bytes")]
    UnalignedOffset {
        desc: String,
        offset: u64,
        align: usize,
    },

    #[error("{desc}: offset {offset:#x} + size {size} overflows the register space")]
    OffsetOverflow {
        desc: String,
        offset: u64,
        size: usize,
    },

    #[error("duplicate register id {0}")]
    DuplicateId(RegisterId),

    #[error("register map extends to {extent:#x}, past the {limit:#x}-byte simulated space")]
    ExtentTooLarge { extent: u64, limit: u64 },
}

/// Errors while loading a register map description.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid register map JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown specification revision {0:?} (expected \"1.0b\" or \"1.1\")")]
    UnknownRevision(String),

    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("register {desc} has no revision and the map declares no default revision")]
    MissingRevision { desc: String },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}
