use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use fxhash::FxHashMap;

use crate::runtime::Runtime;
use crate::store::{Key, TargetId};
use crate::value::Value;

/// Observed key-value object, the explicit-accessor rendition of a
/// reactive proxy: reads through [`Reactive::get`] register the ambient
/// subscriber, writes through [`Reactive::set`] notify it.
///
/// Handles are cheap clones of one shared object; nested objects are
/// stored as handles too, so repeated reads of a nested property return
/// the same identity.
pub struct Reactive {
	body: Rc<ObjectBody>,
}

struct ObjectBody {
	rt: Runtime,
	id: TargetId,
	slots: RefCell<FxHashMap<Key, Value>>,
}

impl Clone for Reactive {
	fn clone(&self) -> Self {
		Reactive {
			body: self.body.clone(),
		}
	}
}

impl Runtime {
	/// New empty observed object. See also the `reactive!` literal
	/// macro.
	pub fn reactive(&self) -> Reactive {
		Reactive {
			body: Rc::new(ObjectBody {
				rt: self.clone(),
				id: self.mint_target(),
				slots: RefCell::new(FxHashMap::default()),
			}),
		}
	}
}

impl Reactive {
	/// Read a property. Missing keys read as [`Value::Unit`], never an
	/// error. Registers the ambient subscriber for this key.
	pub fn get(&self, key: &str) -> Value {
		let value = self
			.body
			.slots
			.borrow()
			.get(key)
			.cloned()
			.unwrap_or(Value::Unit);
		self.body.rt.track(self.body.id, key);
		value
	}

	/// Write a property. Subscribers are notified only when the value
	/// actually changed under [`Value`] equality; a missing slot counts
	/// as [`Value::Unit`].
	pub fn set(&self, key: &str, value: impl Into<Value>) {
		let value = value.into();
		let old = {
			let mut slots = self.body.slots.borrow_mut();
			match slots.get_mut(key) {
				Some(slot) => std::mem::replace(slot, value.clone()),
				None => {
					slots.insert(Rc::from(key), value.clone());
					Value::Unit
				}
			}
		};
		if old != value {
			self.body.rt.trigger(self.body.id, key);
		}
	}

	/// Read-modify-write through get/set: the explicit form of
	/// `obj.count++`. Inside a subscriber the read registers it and the
	/// write skips it, so it will not retrigger itself.
	pub fn update(&self, key: &str, f: impl FnOnce(Value) -> Value) {
		let value = f(self.get(key));
		self.set(key, value);
	}

	/// Current property names, untracked. Order is unspecified.
	pub fn keys(&self) -> Vec<Rc<str>> {
		self.body.slots.borrow().keys().cloned().collect()
	}

	/// Identity comparison: do both handles name the same object?
	pub fn same_object(&self, other: &Reactive) -> bool {
		Rc::ptr_eq(&self.body, &other.body)
	}

	pub fn runtime(&self) -> &Runtime {
		&self.body.rt
	}

	pub(crate) fn body_ptr(&self) -> *const () {
		Rc::as_ptr(&self.body) as *const ()
	}

	/// Detached structural copy, built without tracking.
	pub(crate) fn snapshot(&self) -> Reactive {
		let copy = self.body.rt.reactive();
		{
			let slots = self.body.slots.borrow();
			let mut copy_slots = copy.body.slots.borrow_mut();
			for (key, value) in slots.iter() {
				copy_slots.insert(key.clone(), value.deep_clone());
			}
		}
		copy
	}
}

impl Drop for ObjectBody {
	fn drop(&mut self) {
		// The store must not outlive the object it indexes.
		self.rt.remove_target(self.id);
	}
}

impl Debug for Reactive {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let slots = self.body.slots.borrow();
		f.debug_map().entries(slots.iter()).finish()
	}
}
