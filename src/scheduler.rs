use std::rc::Weak;

use crate::effect::EffectBody;
use crate::runtime::Runtime;

/// Deferred re-run handle for one subscriber.
///
/// `trigger` hands this to a scheduler instead of re-running the
/// subscriber itself; the scheduler decides whether, when and how the
/// re-run actually happens.
#[derive(Clone)]
pub struct Rerun {
	body: Weak<EffectBody>,
}

impl Rerun {
	pub(crate) fn new(body: Weak<EffectBody>) -> Self {
		Rerun { body }
	}

	/// Invoking a dead or stopped subscriber is a no-op.
	pub fn invoke(&self) {
		if let Some(body) = self.body.upgrade() {
			body.run();
		}
	}
}

/// Re-run strategy. Built-in strategies cover synchronous,
/// microtask-deferred and timer-deferred execution; [`SchedulerFn`]
/// adapts any closure.
pub trait Schedule {
	fn schedule(&self, rerun: Rerun);
}

/// Closure adapter: `SchedulerFn(|rerun| ...)`.
pub struct SchedulerFn<F>(pub F);

impl<F> Schedule for SchedulerFn<F>
where
	F: Fn(Rerun),
{
	fn schedule(&self, rerun: Rerun) {
		(self.0)(rerun)
	}
}

/// Runs the subscriber immediately, same as having no scheduler.
pub struct Sync;

impl Schedule for Sync {
	fn schedule(&self, rerun: Rerun) {
		rerun.invoke()
	}
}

/// Defers the re-run onto the runtime's microtask queue; it runs at
/// the next [`Runtime::flush`], before any timer job.
pub struct Microtask(pub Runtime);

impl Schedule for Microtask {
	fn schedule(&self, rerun: Rerun) {
		self.0.enqueue_microtask(Box::new(move || rerun.invoke()));
	}
}

/// Defers the re-run onto the runtime's timer queue; it runs at the
/// next [`Runtime::flush`], after the microtask queue drains.
pub struct Timer(pub Runtime);

impl Schedule for Timer {
	fn schedule(&self, rerun: Rerun) {
		self.0.enqueue_timer(Box::new(move || rerun.invoke()));
	}
}
