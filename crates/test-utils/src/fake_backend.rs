use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fanout::errors::{FanoutError, Result};
use fanout::exec::{Completion, TaskSpec, WorkerBackend};
use fanout::sched::{TaskId, WorkerId};

/// One observable interaction between the scheduler and the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeEvent {
    Dispatch(TaskId),
    WaitAny,
}

/// A fake worker backend that:
/// - records every dispatch and every `wait_any` call, in order
/// - queues a completion per dispatch, drained FIFO by `wait_any`
/// - returns scripted exit codes per attempt (tasks with no script succeed).
pub struct FakeBackend {
    outcomes: HashMap<TaskId, VecDeque<i32>>,
    pending: VecDeque<Completion>,
    events: Arc<Mutex<Vec<FakeEvent>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            outcomes: HashMap::new(),
            pending: VecDeque::new(),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script exit codes for successive attempts of `task`. Attempts beyond
    /// the scripted ones succeed.
    pub fn script(&mut self, task: TaskId, codes: impl IntoIterator<Item = i32>) {
        self.outcomes.insert(task, codes.into_iter().collect());
    }

    /// Shared handle to the event log; keep a clone before handing the
    /// backend to the scheduler.
    pub fn events(&self) -> Arc<Mutex<Vec<FakeEvent>>> {
        Arc::clone(&self.events)
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerBackend for FakeBackend {
    fn dispatch(
        &mut self,
        worker: WorkerId,
        task: TaskSpec,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        self.events.lock().unwrap().push(FakeEvent::Dispatch(task.id));

        let return_code = self
            .outcomes
            .get_mut(&task.id)
            .and_then(|codes| codes.pop_front())
            .unwrap_or(0);

        self.pending.push_back(Completion {
            worker,
            task: task.id,
            return_code,
            hostname: "fake-node".to_string(),
            elapsed: Duration::ZERO,
        });

        Box::pin(async { Ok(()) })
    }

    fn wait_any(&mut self) -> Pin<Box<dyn Future<Output = Result<Completion>> + Send + '_>> {
        self.events.lock().unwrap().push(FakeEvent::WaitAny);

        let next = self
            .pending
            .pop_front()
            .ok_or_else(|| FanoutError::Backend("wait_any called with no pending completions".into()));

        Box::pin(async move { next })
    }

    fn worker_node(&self, _worker: WorkerId) -> String {
        "fake-node".to_string()
    }
}

/// Dispatches in the order they happened.
pub fn dispatch_order(events: &[FakeEvent]) -> Vec<TaskId> {
    events
        .iter()
        .filter_map(|e| match e {
            FakeEvent::Dispatch(id) => Some(*id),
            FakeEvent::WaitAny => None,
        })
        .collect()
}

/// Highest number of simultaneously busy workers implied by the event log.
pub fn peak_busy(events: &[FakeEvent]) -> usize {
    let mut busy = 0usize;
    let mut peak = 0usize;
    for e in events {
        match e {
            FakeEvent::Dispatch(_) => {
                busy += 1;
                peak = peak.max(busy);
            }
            FakeEvent::WaitAny => busy = busy.saturating_sub(1),
        }
    }
    peak
}
