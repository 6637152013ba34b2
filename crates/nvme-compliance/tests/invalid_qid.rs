use nvme_compliance::sim::SimQueueController;
use nvme_compliance::{
    boundary_ids, AdminOpcode, CommandOutcome, CommandTransport, Completion, ComplianceError,
    InvalidQidScenario, QidProbe, QueueIdCommand, QueueLifecycle, ScenarioError, TransportError,
    MAX_IOQ_ID,
};

/// Fails the command transport once `remaining` commands have been reaped.
struct FlakyAdminQueue {
    inner: SimQueueController,
    remaining: usize,
}

impl CommandTransport for FlakyAdminQueue {
    fn submit(&mut self, command: &QueueIdCommand) -> Result<Completion, TransportError> {
        if self.remaining == 0 {
            return Err(TransportError::read(0x1004, 4, "admin CQ reap timed out"));
        }
        self.remaining -= 1;
        self.inner.submit(command)
    }
}

#[test]
fn compliant_controller_passes_the_scenario() {
    let mut ctrl = SimQueueController::new(64);
    InvalidQidScenario::default().run(&mut ctrl).unwrap();

    // The CQ of the pair is left behind; its SQ was deleted.
    assert_eq!(ctrl.io_sqs().count(), 0);
    assert_eq!(ctrl.io_cqs().collect::<Vec<_>>(), vec![1]);
    assert_eq!(
        ctrl.submitted(),
        boundary_ids(1, MAX_IOQ_ID).len() + 1 + boundary_ids(2, MAX_IOQ_ID).len()
    );
}

#[test]
fn only_the_existing_queue_is_accepted() {
    let max_id = 16;
    let mut ctrl = SimQueueController::new(16);
    assert_eq!(ctrl.create_io_queue_pair(1, 2).unwrap(), Completion::SUCCESS);

    let ids = boundary_ids(1, max_id);
    assert_eq!(ids[0], 1);
    QidProbe {
        phase: "only",
        opcode: AdminOpcode::DeleteIoSq,
        max_id,
        accepted: &[1],
    }
    .run(&mut ctrl, &ids)
    .unwrap();
    assert_eq!(ctrl.submitted(), ids.len());
}

#[test]
fn accepting_a_missing_queue_is_reported() {
    let mut ctrl = SimQueueController::new(64).accept_any_qid();
    let err = InvalidQidScenario::default().run(&mut ctrl).unwrap_err();

    match err {
        ScenarioError::Compliance(ComplianceError::Identifier {
            qid,
            expected,
            actual,
            code,
        }) => {
            assert_eq!(qid, 1);
            assert_eq!(expected, CommandOutcome::InvalidQueueId);
            assert_eq!(actual, CommandOutcome::Accepted);
            assert_eq!(code, Completion::SUCCESS.status);
        }
        other => panic!("expected an identifier mismatch, got {other:?}"),
    }
    assert_eq!(ctrl.submitted(), 1);
}

#[test]
fn queue_creation_failure_stops_the_scenario() {
    // No I/O queues supported at all: creating QID 1 is refused.
    let mut ctrl = SimQueueController::new(0);
    let err = InvalidQidScenario::default().run(&mut ctrl).unwrap_err();
    assert!(matches!(
        err,
        ScenarioError::Compliance(ComplianceError::Identifier {
            qid: 1,
            expected: CommandOutcome::Accepted,
            actual: CommandOutcome::InvalidQueueId,
            ..
        })
    ));
}

#[test]
fn transport_failure_is_propagated() {
    let mut queue = FlakyAdminQueue {
        inner: SimQueueController::new(64),
        remaining: 3,
    };
    let err = QidProbe {
        phase: "1st",
        opcode: AdminOpcode::DeleteIoSq,
        max_id: MAX_IOQ_ID,
        accepted: &[],
    }
    .run(&mut queue, &boundary_ids(1, MAX_IOQ_ID))
    .unwrap_err();

    match err {
        ScenarioError::Transport { phase, qid, source } => {
            assert_eq!(phase, "1st");
            assert_eq!(qid, boundary_ids(1, MAX_IOQ_ID)[3]);
            assert_eq!(source.offset, 0x1004);
        }
        other => panic!("expected a transport error, got {other:?}"),
    }
    assert_eq!(queue.inner.submitted(), 3);
}

/// Admin queue whose Create I/O CQ/SQ path is unreachable.
struct NoCreateQueue(SimQueueController);

impl CommandTransport for NoCreateQueue {
    fn submit(&mut self, command: &QueueIdCommand) -> Result<Completion, TransportError> {
        self.0.submit(command)
    }
}

impl QueueLifecycle for NoCreateQueue {
    fn create_io_queue_pair(
        &mut self,
        _qid: u16,
        _entries: u16,
    ) -> Result<Completion, TransportError> {
        Err(TransportError::write(0x1000, 4, "admin SQ doorbell write rejected"))
    }
}

#[test]
fn creation_transport_failure_names_the_queue() {
    let mut queue = NoCreateQueue(SimQueueController::new(64));
    let err = InvalidQidScenario::default().run(&mut queue).unwrap_err();

    assert!(
        matches!(&err, ScenarioError::Transport { phase, qid: 1, .. } if phase == "create"),
        "{err:?}"
    );
    assert_eq!(
        err.to_string(),
        "create phase, QID 1: write of 4 bytes at offset 0x1000 failed: admin SQ doorbell write rejected"
    );
}

#[test]
fn delete_cq_sweep_uses_the_same_classification() {
    let mut ctrl = SimQueueController::new(8);
    QidProbe {
        phase: "cq",
        opcode: AdminOpcode::DeleteIoCq,
        max_id: 8,
        accepted: &[],
    }
    .run(&mut ctrl, &boundary_ids(0, 8))
    .unwrap();
}
