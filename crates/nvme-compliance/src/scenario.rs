//! Queue identifier validation probes.
//!
//! A probe run submits one queue-id-bearing admin command per boundary identifier and checks
//! that the controller accepts exactly the ids expected to exist and rejects every other one with
//! Invalid Queue Identifier.

use tracing::{info, trace};

use crate::boundary::{boundary_ids, is_notable_id, MAX_IOQ_ID};
use crate::error::{CommandOutcome, ComplianceError, ScenarioError};
use crate::transport::{AdminOpcode, CommandTransport, QueueIdCommand, QueueLifecycle};

/// One sweep of queue identifiers through a single admin command.
#[derive(Debug, Clone, Copy)]
pub struct QidProbe<'a> {
    /// Label used in logs, e.g. `"1st"`.
    pub phase: &'a str,
    pub opcode: AdminOpcode,
    /// Ceiling of the identifier space; controls which ids are logged verbosely.
    pub max_id: u32,
    /// Ids that must complete successfully.
    pub accepted: &'a [u32],
}

impl QidProbe<'_> {
    /// Submits a command for every id in `ids`, in order, stopping at the first transport failure
    /// or wrongly classified completion.
    pub fn run<T>(&self, transport: &mut T, ids: &[u32]) -> Result<(), ScenarioError>
    where
        T: CommandTransport + ?Sized,
    {
        for &qid in ids {
            if is_notable_id(qid, self.max_id) {
                info!(phase = self.phase, qid, opcode = ?self.opcode, "sending command");
            } else {
                trace!(phase = self.phase, qid, opcode = ?self.opcode, "sending command");
            }

            let completion = transport
                .submit(&QueueIdCommand {
                    opcode: self.opcode,
                    qid,
                })
                .map_err(|source| ScenarioError::Transport {
                    phase: self.phase.to_string(),
                    qid,
                    source,
                })?;

            let expected = if self.accepted.contains(&qid) {
                CommandOutcome::Accepted
            } else {
                CommandOutcome::InvalidQueueId
            };
            let actual = completion.outcome();
            if actual != expected {
                return Err(ComplianceError::Identifier {
                    qid,
                    expected,
                    actual,
                    code: completion.status,
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Delete I/O Submission Queue with invalid queue identifiers.
///
/// With no I/O queues in existence, every boundary id must be rejected. After creating the I/O
/// CQ/SQ pair `io_queue_id`, deleting that SQ must succeed, and afterwards every boundary id above
/// it must be rejected again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidQidScenario {
    pub max_id: u32,
    pub io_queue_id: u16,
    pub io_queue_entries: u16,
}

impl Default for InvalidQidScenario {
    fn default() -> Self {
        InvalidQidScenario {
            max_id: MAX_IOQ_ID,
            io_queue_id: 1,
            io_queue_entries: 2,
        }
    }
}

impl InvalidQidScenario {
    pub fn run<T>(&self, device: &mut T) -> Result<(), ScenarioError>
    where
        T: CommandTransport + QueueLifecycle + ?Sized,
    {
        let qid = u32::from(self.io_queue_id);

        info!("issue DeleteIOSQ traversing through all combinations of DW10.QID");
        QidProbe {
            phase: "1st",
            opcode: AdminOpcode::DeleteIoSq,
            max_id: self.max_id,
            accepted: &[],
        }
        .run(device, &boundary_ids(qid, self.max_id))?;

        info!(qid, entries = self.io_queue_entries, "create IOCQ/IOSQ pair");
        let created = device
            .create_io_queue_pair(self.io_queue_id, self.io_queue_entries)
            .map_err(|source| ScenarioError::Transport {
                phase: "create".to_string(),
                qid,
                source,
            })?;
        if created.outcome() != CommandOutcome::Accepted {
            return Err(ComplianceError::Identifier {
                qid,
                expected: CommandOutcome::Accepted,
                actual: created.outcome(),
                code: created.status,
            }
            .into());
        }

        info!(qid, "send DeleteIOSQ and expect success");
        let deleted = [qid];
        QidProbe {
            phase: "2nd",
            opcode: AdminOpcode::DeleteIoSq,
            max_id: self.max_id,
            accepted: &deleted,
        }
        .run(device, &deleted)?;

        info!("again issue DeleteIOSQ through all combinations of DW10.QID");
        QidProbe {
            phase: "2nd",
            opcode: AdminOpcode::DeleteIoSq,
            max_id: self.max_id,
            accepted: &[],
        }
        .run(device, &boundary_ids(qid + 1, self.max_id))
    }
}
