//! Virtual-time timers for the inspector's deferred work.
//!
//! Nothing runs on its own thread. The host advances the clock (usually
//! from the pre-tick hook) and the inspector runs whatever came due.
//! `schedule` replaces any pending timer of the same kind (debounce);
//! `enqueue` never does.

use si_core::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    TreeSelection,
    PasteSettle,
    Import,
    Search,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Read the tree's selection back into the selection model.
    TreeSelection,
    /// Select freshly pasted clones.
    PasteSettle(Vec<ObjectId>),
    /// Apply a file whose text has been read.
    Import { name: String, text: String },
    /// Run a tree search.
    Search(String),
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        match self {
            Task::TreeSelection => TaskKind::TreeSelection,
            Task::PasteSettle(_) => TaskKind::PasteSettle,
            Task::Import { .. } => TaskKind::Import,
            Task::Search(_) => TaskKind::Search,
        }
    }
}

#[derive(Debug, Clone)]
struct Timer {
    due: u64,
    seq: u64,
    task: Task,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now: u64,
    next_seq: u64,
    pending: Vec<Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in ms.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Run `task` after `delay_ms`, cancelling any pending task of the same
    /// kind.
    pub fn schedule(&mut self, task: Task, delay_ms: u64) {
        self.cancel(task.kind());
        self.enqueue(task, delay_ms);
    }

    /// Run `task` after `delay_ms` alongside anything already pending.
    pub fn enqueue(&mut self, task: Task, delay_ms: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Timer {
            due: self.now.saturating_add(delay_ms),
            seq,
            task,
        });
    }

    pub fn cancel(&mut self, kind: TaskKind) {
        self.pending.retain(|t| t.task.kind() != kind);
    }

    pub fn is_pending(&self, kind: TaskKind) -> bool {
        self.pending.iter().any(|t| t.task.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Move the clock to `now` (never backwards) and take every task that
    /// is due, in due-time then scheduling order.
    pub fn advance_to(&mut self, now: u64) -> Vec<Task> {
        self.now = self.now.max(now);
        let (mut due, rest): (Vec<Timer>, Vec<Timer>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|t| t.due <= self.now);
        self.pending = rest;
        due.sort_by_key(|t| (t.due, t.seq));
        due.into_iter().map(|t| t.task).collect()
    }

    /// Advance by `ms` from the current time.
    pub fn advance_by(&mut self, ms: u64) -> Vec<Task> {
        let target = self.now.saturating_add(ms);
        self.advance_to(target)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
