use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use crate::runtime::Runtime;
use crate::store::{TargetId, VALUE_KEY};
use crate::value::Value;

/// Scalar-wrapping observed value: one synthetic `value` slot with
/// tracked reads and change-detecting writes.
pub struct Ref {
	body: Rc<RefBody>,
}

struct RefBody {
	rt: Runtime,
	id: TargetId,
	value: RefCell<Value>,
}

impl Clone for Ref {
	fn clone(&self) -> Self {
		Ref {
			body: self.body.clone(),
		}
	}
}

impl Runtime {
	pub fn ref_value(&self, value: impl Into<Value>) -> Ref {
		Ref {
			body: Rc::new(RefBody {
				rt: self.clone(),
				id: self.mint_target(),
				value: RefCell::new(value.into()),
			}),
		}
	}
}

impl Ref {
	/// Read the value, registering the ambient subscriber.
	pub fn get(&self) -> Value {
		let value = self.body.value.borrow().clone();
		self.body.rt.track(self.body.id, VALUE_KEY);
		value
	}

	/// Write the value; notifies only on an actual change.
	pub fn set(&self, value: impl Into<Value>) {
		let value = value.into();
		let changed = {
			let mut slot = self.body.value.borrow_mut();
			let changed = *slot != value;
			if changed {
				*slot = value;
			}
			changed
		};
		if changed {
			self.body.rt.trigger(self.body.id, VALUE_KEY);
		}
	}

	/// Read-modify-write through get/set.
	pub fn update(&self, f: impl FnOnce(Value) -> Value) {
		let value = f(self.get());
		self.set(value);
	}
}

impl Drop for RefBody {
	fn drop(&mut self) {
		self.rt.remove_target(self.id);
	}
}

impl Debug for Ref {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.body.value.borrow().fmt(f)
	}
}
