//! Thread-safe function queue bound to the UI-owning thread.
//!
//! Any thread may [`Dispatcher::submit`] a task. Tasks only ever run inside
//! [`DispatchQueue::run_pending`], which the event loop calls on the thread
//! that created the queue. Submitting never blocks and never runs the task
//! inline; the platform waker is poked so the loop comes around to drain.
//!
//! Once the queue closes (shutdown task ran, `close` was called, or the
//! queue was dropped) every queued and future task is dropped unrun.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use tracing::debug;

/// An owned, single-shot closure executed against the UI-thread context.
pub type Task<C> = Box<dyn FnOnce(&mut C) + Send + 'static>;

/// Platform primitive that wakes the UI event loop so it drains the queue.
///
/// Idle source on GTK, main dispatch queue on Cocoa, thread message on
/// Win32, or an `EventLoopProxy` user event under winit.
pub trait UiWaker: Send + Sync {
    fn wake(&self);
}

impl<F> UiWaker for F
where
    F: Fn() + Send + Sync,
{
    fn wake(&self) {
        self()
    }
}

enum Envelope<C: ?Sized> {
    Task(Task<C>),
    /// Runs like a task, then closes the queue.
    Shutdown(Task<C>),
}

struct Shared {
    /// Cleared once a shutdown task is queued; later submissions are refused.
    accepting: AtomicBool,
    /// Set once the queue has drained for the last time.
    closed: AtomicBool,
    waker: Box<dyn UiWaker>,
}

/// Sending half. Cheap to clone and safe to share across threads.
pub struct Dispatcher<C: ?Sized> {
    tx: Sender<Envelope<C>>,
    shared: Arc<Shared>,
}

impl<C: ?Sized> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Receiving half, owned by the UI thread.
pub struct DispatchQueue<C: ?Sized> {
    rx: Receiver<Envelope<C>>,
    shared: Arc<Shared>,
    ui_thread: ThreadId,
}

/// Create a queue bound to the calling thread.
pub fn channel<C: ?Sized + 'static>(
    waker: impl UiWaker + 'static,
) -> (Dispatcher<C>, DispatchQueue<C>) {
    let (tx, rx) = mpsc::channel();
    let shared = Arc::new(Shared {
        accepting: AtomicBool::new(true),
        closed: AtomicBool::new(false),
        waker: Box::new(waker),
    });
    (
        Dispatcher {
            tx,
            shared: Arc::clone(&shared),
        },
        DispatchQueue {
            rx,
            shared,
            ui_thread: thread::current().id(),
        },
    )
}

impl<C: ?Sized + 'static> Dispatcher<C> {
    /// Queue `task` for the UI thread. Fire-and-forget: there is no
    /// completion signal, and a task submitted after shutdown is dropped.
    pub fn submit(&self, task: impl FnOnce(&mut C) + Send + 'static) {
        self.send(Envelope::Task(Box::new(task)));
    }

    /// Queue a final task. Tasks already queued run first; anything queued
    /// after it is dropped once it has run.
    pub fn shutdown(&self, task: impl FnOnce(&mut C) + Send + 'static) {
        if self.shared.accepting.swap(false, Ordering::AcqRel) {
            self.push(Envelope::Shutdown(Box::new(task)));
        } else {
            debug!("dispatch queue already shutting down, final task dropped");
        }
    }

    /// Whether new submissions are still accepted.
    pub fn is_accepting(&self) -> bool {
        self.shared.accepting.load(Ordering::Acquire) && !self.is_closed()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    fn send(&self, envelope: Envelope<C>) {
        if !self.is_accepting() {
            debug!("dispatch queue closed, task dropped");
            return;
        }
        self.push(envelope);
    }

    fn push(&self, envelope: Envelope<C>) {
        // A send error hands the task back; dropping it here releases it.
        if self.tx.send(envelope).is_err() {
            debug!("UI loop gone, task dropped");
            return;
        }
        self.shared.waker.wake();
    }
}

impl<C: ?Sized + 'static> DispatchQueue<C> {
    /// Run every task queued so far against `ctx`. Returns how many ran.
    ///
    /// Must be called on the thread that created the queue.
    pub fn run_pending(&self, ctx: &mut C) -> usize {
        debug_assert_eq!(
            thread::current().id(),
            self.ui_thread,
            "dispatch queue drained off the UI thread"
        );

        let mut ran = 0;
        while !self.is_closed() {
            match self.rx.try_recv() {
                Ok(Envelope::Task(task)) => {
                    task(ctx);
                    ran += 1;
                }
                Ok(Envelope::Shutdown(task)) => {
                    task(ctx);
                    ran += 1;
                    self.close();
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        ran
    }

    /// Stop accepting work and drop everything still queued. Returns the
    /// number of tasks released without running. Idempotent.
    pub fn close(&self) -> usize {
        self.shared.accepting.store(false, Ordering::Release);
        self.shared.closed.store(true, Ordering::Release);

        let mut dropped = 0;
        while let Ok(envelope) = self.rx.try_recv() {
            drop(envelope);
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "dispatch queue closed with pending tasks");
        }
        dropped
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    pub fn ui_thread(&self) -> ThreadId {
        self.ui_thread
    }
}

impl<C: ?Sized> Drop for DispatchQueue<C> {
    fn drop(&mut self) {
        self.shared.accepting.store(false, Ordering::Release);
        self.shared.closed.store(true, Ordering::Release);
        while self.rx.try_recv().is_ok() {}
    }
}

// =============================================================================
// TESTS
// =============================================================================
