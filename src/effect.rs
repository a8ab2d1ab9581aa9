use std::cell::{Cell, RefCell};
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::trace;

use crate::runtime::{ActiveGuard, Runtime};
use crate::scheduler::{Rerun, Schedule};
use crate::store::DepSet;

/// Options for [`Runtime::effect_with`].
#[derive(Default)]
pub struct EffectOptions {
	/// Do not run on registration; the caller invokes [`Effect::run`]
	/// manually. Used by derived values, which must not compute until
	/// first read.
	pub lazy: bool,
	/// Intercepts re-runs caused by writes: `trigger` hands the
	/// scheduler a [`Rerun`] instead of re-running synchronously.
	pub scheduler: Option<Rc<dyn Schedule>>,
}

/// A re-runnable unit of reactive computation. Dependencies are
/// re-discovered on every run; dropping the handle detaches it from
/// every dependency set.
pub struct Effect {
	body: Rc<EffectBody>,
}

pub(crate) struct EffectBody {
	rt: Runtime,
	func: RefCell<Box<dyn FnMut()>>,
	deps: RefCell<SmallVec<[Rc<DepSet>; 4]>>,
	scheduler: Option<Rc<dyn Schedule>>,
	stopped: Cell<bool>,
	running: Cell<bool>,
}

impl Runtime {
	/// Register a subscriber and run it once to discover dependencies.
	pub fn effect(&self, func: impl FnMut() + 'static) -> Effect {
		self.effect_with(func, EffectOptions::default())
	}

	pub fn effect_with(&self, func: impl FnMut() + 'static, options: EffectOptions) -> Effect {
		let body = Rc::new(EffectBody {
			rt: self.clone(),
			func: RefCell::new(Box::new(func)),
			deps: RefCell::new(SmallVec::new()),
			scheduler: options.scheduler,
			stopped: Cell::new(false),
			running: Cell::new(false),
		});
		if !options.lazy {
			body.run();
		}
		Effect { body }
	}
}

impl Effect {
	/// Run the wrapped function now, re-collecting dependencies.
	/// No-op on a stopped effect.
	pub fn run(&self) {
		self.body.run();
	}

	/// Detach from every dependency set and ignore all future
	/// triggers. Idempotent.
	pub fn stop(&self) {
		self.body.stop();
	}

	/// Deferred re-run handle, as handed to schedulers.
	pub fn rerun(&self) -> Rerun {
		Rerun::new(Rc::downgrade(&self.body))
	}
}

impl EffectBody {
	pub(crate) fn run(self: &Rc<Self>) {
		if self.stopped.get() || self.running.get() {
			return;
		}
		// Cleanup before the run, not after: subscriptions left over
		// from a branch the previous run took must not outlive it.
		self.cleanup();
		let _active = ActiveGuard::new(&self.rt, Rc::downgrade(self));
		let _running = RunningGuard::new(self);
		(*self.func.borrow_mut())();
	}

	fn cleanup(&self) {
		let deps = std::mem::take(&mut *self.deps.borrow_mut());
		let ptr: *const EffectBody = self;
		for set in deps {
			set.remove(ptr);
		}
	}

	pub(crate) fn record_dep(&self, set: Rc<DepSet>) {
		self.deps.borrow_mut().push(set);
	}

	/// Ask the subscriber to re-run: through its scheduler if it has
	/// one, synchronously otherwise.
	pub(crate) fn notify(self: &Rc<Self>) {
		if self.stopped.get() {
			return;
		}
		match &self.scheduler {
			Some(scheduler) => scheduler.schedule(Rerun::new(Rc::downgrade(self))),
			None => self.run(),
		}
	}

	pub(crate) fn stop(&self) {
		if self.stopped.replace(true) {
			return;
		}
		trace!("effect stopped");
		self.cleanup();
	}

	pub(crate) fn is_running(&self) -> bool {
		self.running.get()
	}

	pub(crate) fn is_stopped(&self) -> bool {
		self.stopped.get()
	}
}

impl Drop for EffectBody {
	fn drop(&mut self) {
		self.cleanup();
	}
}

struct RunningGuard<'a>(&'a EffectBody);

impl<'a> RunningGuard<'a> {
	fn new(body: &'a EffectBody) -> Self {
		body.running.set(true);
		RunningGuard(body)
	}
}

impl Drop for RunningGuard<'_> {
	fn drop(&mut self) {
		self.0.running.set(false);
	}
}
