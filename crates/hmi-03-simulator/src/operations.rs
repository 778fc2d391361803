//! Simulated file operation queue.
//!
//! Each tick moves `pending` to `running` at 0 %, then adds a random step
//! below 30 % until the operation completes at 100 %. Terminal operations
//! are kept untouched, up to [`MAX_FINISHED_OPERATIONS`]; older ones are
//! dropped oldest first.

use std::sync::Arc;

use chrono::Utc;
use hmi_01_uns_registry::seed::{metric_tags, METRICS_PLC_PATH};
use hmi_01_uns_registry::PathRegistry;
use parking_lot::RwLock;
use serde_json::json;
use shared_bus::{EventPublisher, HmiEvent};
use shared_types::{FileOperation, NewFileOperation, OperationStatus};
use tracing::{debug, info};
use uuid::Uuid;

use crate::random::RandomSource;

/// Upper bound of a single progress step, in percent.
pub const MAX_PROGRESS_STEP: f64 = 30.0;

/// Completed or failed operations retained for clients.
pub const MAX_FINISHED_OPERATIONS: usize = 50;

pub struct OperationQueue {
    operations: RwLock<Vec<FileOperation>>,
    registry: Arc<PathRegistry>,
    publisher: Arc<dyn EventPublisher>,
    rng: Arc<dyn RandomSource>,
}

impl OperationQueue {
    pub fn new(
        registry: Arc<PathRegistry>,
        publisher: Arc<dyn EventPublisher>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            operations: RwLock::new(Vec::new()),
            registry,
            publisher,
            rng,
        }
    }

    /// Queue preloaded with one running sync and one pending backup.
    pub fn seeded(
        registry: Arc<PathRegistry>,
        publisher: Arc<dyn EventPublisher>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        let queue = Self::new(registry, publisher, rng);
        let now = Utc::now();
        let seed = [
            ("SYNC_CHANGES", METRICS_PLC_PATH.to_string(), OperationStatus::Running, 75),
            ("BACKUP_DIR", format!("{METRICS_PLC_PATH}/FileSystem"), OperationStatus::Pending, 0),
        ];
        queue.operations.write().extend(seed.into_iter().map(
            |(kind, target, status, progress)| FileOperation {
                id: Uuid::new_v4(),
                kind: kind.to_string(),
                target,
                status,
                progress,
                metadata: json!({}),
                created_at: now,
                updated_at: now,
            },
        ));
        queue
    }

    /// Operations in creation order.
    pub fn list(&self) -> Vec<FileOperation> {
        self.operations.read().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<FileOperation> {
        self.operations.read().iter().find(|op| op.id == id).cloned()
    }

    /// Queue a new pending operation and push `OPERATION_CREATED`.
    pub async fn create(&self, request: NewFileOperation) -> FileOperation {
        let now = Utc::now();
        let operation = FileOperation {
            id: Uuid::new_v4(),
            kind: request.kind,
            target: request.target,
            status: OperationStatus::Pending,
            progress: 0,
            metadata: request.metadata.unwrap_or_else(|| json!({})),
            created_at: now,
            updated_at: now,
        };
        {
            let mut operations = self.operations.write();
            operations.push(operation.clone());
            prune_finished(&mut operations);
        }
        info!(id = %operation.id, kind = %operation.kind, target = %operation.target, "Operation queued");

        self.refresh_queue_tags();
        self.publisher
            .publish(HmiEvent::OperationCreated(operation.clone()))
            .await;
        operation
    }

    /// Advance every non-terminal operation one step and push an
    /// `OPERATION_UPDATED` for each. Returns the changed operations.
    pub async fn advance(&self) -> Vec<FileOperation> {
        let now = Utc::now();
        let changed: Vec<FileOperation> = {
            let mut operations = self.operations.write();
            let changed = operations
                .iter_mut()
                .filter_map(|op| self.step(op, now).then(|| op.clone()))
                .collect();
            prune_finished(&mut operations);
            changed
        };

        if !changed.is_empty() {
            self.refresh_queue_tags();
        }
        for op in &changed {
            debug!(id = %op.id, status = ?op.status, progress = op.progress, "Operation advanced");
            self.publisher
                .publish(HmiEvent::OperationUpdated(op.clone()))
                .await;
        }
        changed
    }

    fn step(&self, op: &mut FileOperation, now: chrono::DateTime<Utc>) -> bool {
        match op.status {
            OperationStatus::Pending => {
                op.status = OperationStatus::Running;
                op.progress = 0;
            }
            OperationStatus::Running => {
                let next = f64::from(op.progress) + self.rng.next_unit() * MAX_PROGRESS_STEP;
                if next >= 100.0 {
                    op.progress = 100;
                    op.status = OperationStatus::Completed;
                } else {
                    op.progress = next.floor() as u8;
                }
            }
            OperationStatus::Completed | OperationStatus::Failed => return false,
        }
        op.updated_at = now;
        true
    }

    fn refresh_queue_tags(&self) {
        let (pending, running) = {
            let operations = self.operations.read();
            let count = |status| operations.iter().filter(|op| op.status == status).count();
            (count(OperationStatus::Pending), count(OperationStatus::Running))
        };
        self.registry
            .update_tag_value(metric_tags::PENDING_OPERATIONS, pending.to_string(), None);
        self.registry
            .update_tag_value(metric_tags::RUNNING_OPERATIONS, running.to_string(), None);
    }
}

fn is_finished(op: &FileOperation) -> bool {
    matches!(op.status, OperationStatus::Completed | OperationStatus::Failed)
}

/// Drop the oldest finished operations beyond the retention limit.
fn prune_finished(operations: &mut Vec<FileOperation>) {
    let finished = operations.iter().filter(|op| is_finished(op)).count();
    let mut excess = finished.saturating_sub(MAX_FINISHED_OPERATIONS);
    if excess == 0 {
        return;
    }
    debug!(dropped = excess, "Pruning finished operations");
    operations.retain(|op| {
        if excess > 0 && is_finished(op) {
            excess -= 1;
            false
        } else {
            true
        }
    });
}
