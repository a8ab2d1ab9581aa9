use std::cell::RefCell;
use std::rc::Rc;

use crate::effect::{Effect, EffectOptions};
use crate::reactive::Reactive;
use crate::refs::Ref;
use crate::runtime::Runtime;
use crate::scheduler::{Microtask, Rerun, Schedule, SchedulerFn, Timer};
use crate::value::Value;

/// When a watch callback (or a deferred effect) is delivered.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Flush {
	/// Synchronously, inside the triggering write.
	#[default]
	Sync,
	/// On the runtime's microtask queue, at the next [`Runtime::flush`].
	Post,
	/// On the runtime's timer queue, after all microtasks.
	Pre,
}

#[derive(Default)]
pub struct WatchOptions {
	/// Fire once with `(initial, None)` before any change.
	pub immediate: bool,
	/// Traverse the whole source tree so every nested key is tracked,
	/// and fire on every trigger (nested mutation may not change the
	/// top-level reference).
	pub deep: bool,
	pub flush: Flush,
}

/// Tagged watch source. The shape is decided at construction time, so
/// an unsupported source is unrepresentable rather than a silent no-op.
#[derive(Clone)]
pub enum WatchSource {
	Ref(Ref),
	Object(Reactive),
	Getter(Rc<dyn Fn() -> Value>),
	Many(Vec<WatchSource>),
}

impl From<Ref> for WatchSource {
	fn from(source: Ref) -> Self {
		WatchSource::Ref(source)
	}
}

impl From<Reactive> for WatchSource {
	fn from(source: Reactive) -> Self {
		WatchSource::Object(source)
	}
}

impl From<Vec<WatchSource>> for WatchSource {
	fn from(sources: Vec<WatchSource>) -> Self {
		WatchSource::Many(sources)
	}
}

impl WatchSource {
	pub fn getter(f: impl Fn() -> Value + 'static) -> Self {
		WatchSource::Getter(Rc::new(f))
	}

	/// Current value of the source, read with tracking. A plain object
	/// source tracks nothing by itself; only traversal under `deep`
	/// establishes dependencies on its keys.
	fn read(&self) -> Value {
		match self {
			WatchSource::Ref(source) => source.get(),
			WatchSource::Object(source) => Value::Object(source.clone()),
			WatchSource::Getter(getter) => getter(),
			WatchSource::Many(sources) => {
				let items = sources.iter().map(WatchSource::read).collect();
				Value::list(items)
			}
		}
	}
}

/// Visit every reachable key so each one is tracked. The seen list
/// guards against reference cycles.
fn traverse(value: &Value, seen: &mut Vec<*const ()>) {
	match value {
		Value::Object(object) => {
			let ptr = object.body_ptr();
			if seen.contains(&ptr) {
				return;
			}
			seen.push(ptr);
			for key in object.keys() {
				traverse(&object.get(key.as_ref()), seen);
			}
		}
		Value::List(items) => {
			let ptr = Rc::as_ptr(items) as *const ();
			if seen.contains(&ptr) {
				return;
			}
			seen.push(ptr);
			for item in items.borrow().iter() {
				traverse(item, seen);
			}
		}
		_ => {}
	}
}

/// Stops the underlying subscriber when asked; dropping the handle
/// stops it as well.
pub struct WatchHandle {
	effect: Effect,
}

impl WatchHandle {
	pub fn stop(&self) {
		self.effect.stop();
	}
}

type WatchCallback = Rc<RefCell<dyn FnMut(Value, Option<Value>)>>;

impl Runtime {
	/// Watch a source and call `callback(new, old)` when it changes.
	/// See [`WatchOptions`] for immediate/deep/flush behavior.
	pub fn watch(
		&self,
		source: impl Into<WatchSource>,
		callback: impl FnMut(Value, Option<Value>) + 'static,
		options: WatchOptions,
	) -> WatchHandle {
		let WatchOptions {
			immediate,
			deep,
			flush,
		} = options;
		let source = source.into();
		// Deep and multi-source watches fire on every trigger: nested
		// mutation keeps the top-level identity, and the element list
		// is rebuilt per read.
		let always_fire = deep || matches!(source, WatchSource::Many(_));

		let slot: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
		let old: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
		let callback: WatchCallback = Rc::new(RefCell::new(callback));

		let scheduler = {
			let rt = self.clone();
			let slot = slot.clone();
			let old = old.clone();
			let callback = callback.clone();
			move |rerun: Rerun| {
				// Re-read through the subscriber so dependencies stay
				// fresh, then compare against the previous snapshot.
				rerun.invoke();
				let new_value = slot.borrow().clone().unwrap_or(Value::Unit);
				let changed = match &*old.borrow() {
					Some(previous) => *previous != new_value,
					None => true,
				};
				if !changed && !always_fire {
					return;
				}
				let previous = old.borrow_mut().take();
				*old.borrow_mut() = Some(if deep {
					new_value.deep_clone()
				} else {
					new_value.clone()
				});
				deliver(&rt, flush, callback.clone(), new_value, previous);
			}
		};

		let effect = self.effect_with(
			{
				let slot = slot.clone();
				let source = source.clone();
				move || {
					let value = source.read();
					if deep {
						traverse(&value, &mut Vec::new());
					}
					*slot.borrow_mut() = Some(value);
				}
			},
			EffectOptions {
				lazy: true,
				scheduler: Some(Rc::new(SchedulerFn(scheduler))),
			},
		);

		// Initial read establishes dependencies and the first snapshot.
		effect.run();
		let initial = slot.borrow().clone().unwrap_or(Value::Unit);
		*old.borrow_mut() = Some(if deep {
			initial.deep_clone()
		} else {
			initial.clone()
		});
		if immediate {
			(*callback.borrow_mut())(initial, None);
		}

		WatchHandle { effect }
	}

	/// Self-sourcing watch: `f` both establishes dependencies by
	/// reading reactive state and performs the side effect. Any
	/// dependency change re-runs `f` in full, per the flush rules.
	pub fn watch_effect(&self, f: impl FnMut() + 'static, flush: Flush) -> WatchHandle {
		let scheduler: Option<Rc<dyn Schedule>> = match flush {
			Flush::Sync => None,
			Flush::Post => Some(Rc::new(Microtask(self.clone()))),
			Flush::Pre => Some(Rc::new(Timer(self.clone()))),
		};
		let effect = self.effect_with(
			f,
			EffectOptions {
				lazy: false,
				scheduler,
			},
		);
		WatchHandle { effect }
	}
}

fn deliver(rt: &Runtime, flush: Flush, callback: WatchCallback, new: Value, old: Option<Value>) {
	match flush {
		Flush::Sync => (*callback.borrow_mut())(new, old),
		Flush::Post => rt.enqueue_microtask(Box::new(move || (*callback.borrow_mut())(new, old))),
		Flush::Pre => rt.enqueue_timer(Box::new(move || (*callback.borrow_mut())(new, old))),
	}
}
