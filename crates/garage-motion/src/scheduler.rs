//! Render-cycle deferral.
//!
//! Some activations must wait until the host has rendered new children. The
//! [`RenderScheduler`] contract queues a task for "after the next render
//! cycle" and hands back a handle that can cancel it. [`FrameQueue`] is the
//! headless implementation; the host calls [`FrameQueue::flush`] once per
//! rendered frame.

use std::cell::RefCell;
use std::collections::BTreeMap;

use tracing::trace;

use crate::types::TaskId;

/// Deferred task.
pub type Task = Box<dyn FnOnce()>;

pub trait RenderScheduler {
    /// Run `task` after the next render cycle.
    fn schedule(&self, task: Task) -> TaskId;

    /// Cancel a queued task; returns false if it already ran or never existed.
    fn cancel(&self, id: TaskId) -> bool;

    fn pending_count(&self) -> usize;
}

/// FIFO queue flushed by the host after each render.
#[derive(Default)]
pub struct FrameQueue {
    tasks: RefCell<BTreeMap<TaskId, Task>>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every task queued before this call, in scheduling order.
    ///
    /// Tasks scheduled while flushing wait for the next flush. A task
    /// cancelled by an earlier task in the same flush does not run.
    pub fn flush(&self) -> usize {
        let ids: Vec<TaskId> = self.tasks.borrow().keys().copied().collect();
        let mut ran = 0;
        for id in ids {
            let task = self.tasks.borrow_mut().remove(&id);
            if let Some(task) = task {
                trace!(task = %id, "running deferred task");
                task();
                ran += 1;
            }
        }
        ran
    }
}

impl RenderScheduler for FrameQueue {
    fn schedule(&self, task: Task) -> TaskId {
        let id = TaskId::new();
        self.tasks.borrow_mut().insert(id, task);
        id
    }

    fn cancel(&self, id: TaskId) -> bool {
        let removed = self.tasks.borrow_mut().remove(&id);
        removed.is_some()
    }

    fn pending_count(&self) -> usize {
        self.tasks.borrow().len()
    }
}

static_assertions::assert_not_impl_any!(FrameQueue: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_flush_runs_in_order() {
        let queue = FrameQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = log.clone();
            queue.schedule(Box::new(move || log.borrow_mut().push(i)));
        }
        assert_eq!(queue.pending_count(), 3);
        assert_eq!(queue.flush(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert_eq!(queue.flush(), 0);
    }

    #[test]
    fn test_cancel() {
        let queue = FrameQueue::new();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        let id = queue.schedule(Box::new(move || flag.set(true)));
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        queue.flush();
        assert!(!ran.get());
    }

    #[test]
    fn test_task_scheduled_during_flush_waits() {
        let queue = Rc::new(FrameQueue::new());
        let ran = Rc::new(Cell::new(0));
        let (q, counter) = (queue.clone(), ran.clone());
        queue.schedule(Box::new(move || {
            counter.set(counter.get() + 1);
            let counter = counter.clone();
            q.schedule(Box::new(move || counter.set(counter.get() + 10)));
        }));

        assert_eq!(queue.flush(), 1);
        assert_eq!(ran.get(), 1);
        assert_eq!(queue.flush(), 1);
        assert_eq!(ran.get(), 11);
    }

    #[test]
    fn test_task_cancelled_by_earlier_task() {
        let queue = Rc::new(FrameQueue::new());
        let ran = Rc::new(Cell::new(false));
        let victim = Rc::new(Cell::new(None));

        let (q, slot) = (queue.clone(), victim.clone());
        queue.schedule(Box::new(move || {
            if let Some(id) = slot.get() {
                q.cancel(id);
            }
        }));
        let flag = ran.clone();
        victim.set(Some(queue.schedule(Box::new(move || flag.set(true)))));

        assert_eq!(queue.flush(), 1);
        assert!(!ran.get());
    }
}
