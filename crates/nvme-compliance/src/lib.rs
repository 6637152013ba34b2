//! NVMe controller compliance checks.
//!
//! This crate verifies two things about a controller under test:
//! - its BAR0 control/status registers: RO fields that are not implementation specific hold their
//!   mandated default values and cannot be changed by writes ([`ComplianceValidator`]);
//! - its queue identifier validation: commands naming a queue id outside the range that exists are
//!   rejected, without sweeping the whole 16-bit id space ([`boundary_ids`], [`scenario`]).
//!
//! The device itself is reached only through the [`RegisterTransport`], [`CommandTransport`] and
//! [`QueueLifecycle`] traits. [`sim`] provides in-memory implementations with fault injection.

pub mod boundary;
pub mod config;
pub mod ctlspc;
pub mod error;
pub mod regs;
pub mod scenario;
pub mod sim;
pub mod transport;
pub mod validator;

pub use boundary::{boundary_ids, illegal_queue_ids, MAX_IOQ_ID};
pub use error::{
    CommandOutcome, ComplianceError, ConfigError, DescriptorError, Probe, ScenarioError,
    TransportError, ValidationError,
};
pub use regs::{
    BitPattern, RegisterDescriptor, RegisterId, RegisterMap, RegisterShape, SpecRevision,
};
pub use scenario::{InvalidQidScenario, QidProbe};
pub use transport::{
    AdminOpcode, Completion, CommandTransport, QueueIdCommand, QueueLifecycle, RegisterTransport,
};
pub use validator::{offending_bit_pos, ComplianceValidator};
