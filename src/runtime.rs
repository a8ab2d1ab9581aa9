use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::effect::EffectBody;
use crate::store::{DepStore, TargetId};

pub(crate) type Job = Box<dyn FnOnce()>;

/// Reactivity context: the dependency store, the active-subscriber
/// stack and the deferred-work queues.
///
/// Cheap to clone (shared inner). A program normally constructs one;
/// tests construct a fresh one each for isolation. Nothing in the crate
/// touches implicit global state.
#[derive(Clone)]
pub struct Runtime {
	inner: Rc<RuntimeInner>,
}

struct RuntimeInner {
	store: RefCell<DepStore>,
	stack: RefCell<Vec<Weak<EffectBody>>>,
	microtasks: RefCell<VecDeque<Job>>,
	timers: RefCell<VecDeque<Job>>,
	next_target: Cell<u64>,
}

impl Default for Runtime {
	fn default() -> Self {
		Runtime::new()
	}
}

impl Runtime {
	pub fn new() -> Self {
		Runtime {
			inner: Rc::new(RuntimeInner {
				store: RefCell::new(DepStore::new()),
				stack: RefCell::new(Vec::new()),
				microtasks: RefCell::new(VecDeque::new()),
				timers: RefCell::new(VecDeque::new()),
				next_target: Cell::new(0),
			}),
		}
	}

	pub(crate) fn mint_target(&self) -> TargetId {
		let id = self.inner.next_target.get();
		self.inner.next_target.set(id + 1);
		TargetId(id)
	}

	pub(crate) fn active(&self) -> Option<Rc<EffectBody>> {
		self.inner.stack.borrow().last().and_then(Weak::upgrade)
	}

	pub(crate) fn push_active(&self, effect: Weak<EffectBody>) {
		self.inner.stack.borrow_mut().push(effect);
	}

	pub(crate) fn pop_active(&self) {
		self.inner.stack.borrow_mut().pop();
	}

	/// Run `f` with dependency tracking suspended: reads inside do not
	/// register the ambient subscriber. Tracking resumes afterwards.
	pub fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
		// A dangling weak masks the stack top without naming an effect.
		let _guard = ActiveGuard::new(self, Weak::new());
		f()
	}

	/// Register that the ambient subscriber read `key` of `target`.
	/// No-op without an ambient subscriber.
	pub(crate) fn track(&self, target: TargetId, key: &str) {
		let Some(active) = self.active() else { return };
		if active.is_stopped() {
			return;
		}
		let set = self.inner.store.borrow_mut().dep_set(target, key);
		if set.insert(&active) {
			trace!(id = target.0, key, "track");
			active.record_dep(set);
		}
	}

	/// Notify everything that read `key` of `target`, in first-read
	/// order. Subscribers currently executing are skipped; re-running
	/// them here would recurse without bound (`obj.count++`).
	pub(crate) fn trigger(&self, target: TargetId, key: &str) {
		let subscribers = self.inner.store.borrow().snapshot(target, key);
		if subscribers.is_empty() {
			return;
		}
		trace!(id = target.0, key, count = subscribers.len(), "trigger");
		for subscriber in subscribers {
			if subscriber.is_running() {
				continue;
			}
			subscriber.notify();
		}
	}

	pub(crate) fn enqueue_microtask(&self, job: Job) {
		self.inner.microtasks.borrow_mut().push_back(job);
	}

	pub(crate) fn enqueue_timer(&self, job: Job) {
		self.inner.timers.borrow_mut().push_back(job);
	}

	/// Drain deferred work. Microtasks run before timer jobs, and the
	/// microtask queue is revisited after every timer job, so work
	/// enqueued while draining still runs in the same flush.
	pub fn flush(&self) {
		trace!("flush");
		loop {
			let job = self.inner.microtasks.borrow_mut().pop_front();
			if let Some(job) = job {
				job();
				continue;
			}
			let job = self.inner.timers.borrow_mut().pop_front();
			match job {
				Some(job) => job(),
				None => break,
			}
		}
	}

	pub(crate) fn remove_target(&self, target: TargetId) {
		self.inner.store.borrow_mut().remove_target(target);
	}
}

/// Restores the active-subscriber stack even if the guarded scope
/// unwinds, so a caught panic does not poison tracking.
pub(crate) struct ActiveGuard {
	rt: Runtime,
}

impl ActiveGuard {
	pub(crate) fn new(rt: &Runtime, effect: Weak<EffectBody>) -> Self {
		rt.push_active(effect);
		ActiveGuard { rt: rt.clone() }
	}
}

impl Drop for ActiveGuard {
	fn drop(&mut self) {
		self.rt.pop_active();
	}
}
