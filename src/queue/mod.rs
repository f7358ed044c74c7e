use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;

use crate::expander::Job;

// the work queue shared by the seeder and every worker.
//
// `outstanding` counts jobs that were pushed but not yet completed, including
// the ones a worker is currently holding. The queue is drained once seeding
// has finished and that count reaches zero; until then an empty queue only
// means the workers have to wait for feedback.
pub struct WorkQueue {
    state: Mutex<QueueState>,
    jobs_ready: Notify,
    space_ready: Notify,
    capacity: usize,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<Job>,
    outstanding: usize,
    seeding_done: bool,
}

impl QueueState {
    fn drained(&self) -> bool {
        self.seeding_done && self.outstanding == 0
    }
}

impl WorkQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            jobs_ready: Notify::new(),
            space_ready: Notify::new(),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Pushes a wordlist job, waiting while `capacity` jobs are already pending.
    pub async fn push_seed(&self, job: Job) {
        loop {
            let space = self.space_ready.notified();
            tokio::pin!(space);
            space.as_mut().enable();
            {
                let mut state = self.lock();
                if state.pending.len() < self.capacity {
                    state.pending.push_back(job);
                    state.outstanding += 1;
                    drop(state);
                    self.jobs_ready.notify_one();
                    return;
                }
            }
            space.await;
        }
    }

    /// Pushes a recursive job. Never waits: the caller is a worker and the
    /// only consumers of this queue are workers.
    pub fn push_feedback(&self, job: Job) {
        {
            let mut state = self.lock();
            state.pending.push_back(job);
            state.outstanding += 1;
        }
        self.jobs_ready.notify_one();
    }

    /// Waits for the next job. `None` means the run is over.
    pub async fn pop(&self) -> Option<Job> {
        loop {
            let ready = self.jobs_ready.notified();
            tokio::pin!(ready);
            ready.as_mut().enable();
            {
                let mut state = self.lock();
                if let Some(job) = state.pending.pop_front() {
                    drop(state);
                    self.space_ready.notify_one();
                    return Some(job);
                }
                if state.drained() {
                    return None;
                }
            }
            ready.await;
        }
    }

    /// Marks one popped job as done. Feedback for that job must already be
    /// pushed.
    pub fn complete(&self) {
        let drained = {
            let mut state = self.lock();
            state.outstanding = state.outstanding.saturating_sub(1);
            state.drained()
        };
        if drained {
            self.jobs_ready.notify_waiters();
        }
    }

    pub fn finish_seeding(&self) {
        let drained = {
            let mut state = self.lock();
            state.seeding_done = true;
            state.drained()
        };
        if drained {
            self.jobs_ready.notify_waiters();
        }
    }

    #[cfg(test)]
    pub(crate) fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.lock().pending.len()
    }
}
