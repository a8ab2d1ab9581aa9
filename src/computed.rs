use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::Rc;

use crate::effect::{Effect, EffectOptions};
use crate::runtime::Runtime;
use crate::scheduler::{Rerun, SchedulerFn};
use crate::store::{TargetId, VALUE_KEY};
use crate::value::Value;

/// Cached, lazily recomputed derived value.
///
/// The getter is wrapped in a lazy subscriber whose scheduler only
/// marks the cache dirty; recomputation waits for the next read, so a
/// dirty period costs at most one recomputation no matter how many
/// writes or reads happen inside it.
pub struct Computed {
	body: Rc<ComputedBody>,
}

struct ComputedBody {
	rt: Runtime,
	id: TargetId,
	cache: Rc<RefCell<Option<Value>>>,
	dirty: Rc<Cell<bool>>,
	effect: Effect,
}

impl Clone for Computed {
	fn clone(&self) -> Self {
		Computed {
			body: self.body.clone(),
		}
	}
}

impl Runtime {
	/// Derived read-only value. The getter does not run until the first
	/// [`Computed::get`].
	pub fn computed(&self, getter: impl Fn() -> Value + 'static) -> Computed {
		let id = self.mint_target();
		let cache: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
		let dirty = Rc::new(Cell::new(true));

		// Invalidate-only scheduler: flip the dirty flag and, on the
		// clean-to-dirty edge, tell dependents of `.value` that the
		// cached result is stale.
		let scheduler = {
			let rt = self.clone();
			let dirty = dirty.clone();
			move |_rerun: Rerun| {
				if !dirty.replace(true) {
					rt.trigger(id, VALUE_KEY);
				}
			}
		};

		let effect = self.effect_with(
			{
				let cache = cache.clone();
				move || {
					*cache.borrow_mut() = Some(getter());
				}
			},
			EffectOptions {
				lazy: true,
				scheduler: Some(Rc::new(SchedulerFn(scheduler))),
			},
		);

		Computed {
			body: Rc::new(ComputedBody {
				rt: self.clone(),
				id,
				cache,
				dirty,
				effect,
			}),
		}
	}
}

impl Computed {
	/// Read the derived value, recomputing only if dirty. Registers the
	/// ambient subscriber against the synthetic `value` key, so outer
	/// subscribers depend on the result rather than on its inputs.
	pub fn get(&self) -> Value {
		if self.body.dirty.replace(false) {
			self.body.effect.run();
		}
		self.body.rt.track(self.body.id, VALUE_KEY);
		self.body.cache.borrow().clone().unwrap_or(Value::Unit)
	}
}

impl Drop for ComputedBody {
	fn drop(&mut self) {
		self.rt.remove_target(self.id);
	}
}

impl Debug for Computed {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &*self.body.cache.borrow() {
			Some(value) => value.fmt(f),
			None => write!(f, "<pending>"),
		}
	}
}
