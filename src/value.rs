use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use crate::reactive::Reactive;

/// Dynamic value stored in observed objects and refs.
///
/// Scalars compare by value; floats use plain `==`, so a NaN write over
/// NaN counts as a change, exactly like `!==`. Lists and objects
/// compare by reference identity.
#[derive(Clone)]
pub enum Value {
	Unit,
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(Rc<str>),
	List(Rc<RefCell<Vec<Value>>>),
	Object(Reactive),
}

impl Value {
	pub fn list(items: Vec<Value>) -> Value {
		Value::List(Rc::new(RefCell::new(items)))
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Value::Int(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_float(&self) -> Option<f64> {
		match self {
			Value::Float(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(value) => Some(value.as_ref()),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<Rc<RefCell<Vec<Value>>>> {
		match self {
			Value::List(items) => Some(items.clone()),
			_ => None,
		}
	}

	pub fn as_object(&self) -> Option<Reactive> {
		match self {
			Value::Object(object) => Some(object.clone()),
			_ => None,
		}
	}

	/// Structural snapshot detached from the reactive graph. Used by
	/// deep watch to keep an old value that in-place mutation of the
	/// watched object cannot reach.
	pub fn deep_clone(&self) -> Value {
		match self {
			Value::List(items) => {
				let items = items.borrow().iter().map(Value::deep_clone).collect();
				Value::list(items)
			}
			Value::Object(object) => Value::Object(object.snapshot()),
			other => other.clone(),
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Value) -> bool {
		match (self, other) {
			(Value::Unit, Value::Unit) => true,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::Int(a), Value::Int(b)) => a == b,
			(Value::Float(a), Value::Float(b)) => a == b,
			(Value::Str(a), Value::Str(b)) => a == b,
			(Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
			(Value::Object(a), Value::Object(b)) => a.same_object(b),
			_ => false,
		}
	}
}

impl Debug for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Unit => write!(f, "()"),
			Value::Bool(value) => value.fmt(f),
			Value::Int(value) => value.fmt(f),
			Value::Float(value) => value.fmt(f),
			Value::Str(value) => value.fmt(f),
			Value::List(items) => items.borrow().fmt(f),
			Value::Object(object) => object.fmt(f),
		}
	}
}

impl From<()> for Value {
	fn from(_: ()) -> Value {
		Value::Unit
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Value {
		Value::Bool(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Value {
		Value::Int(value.into())
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Value {
		Value::Int(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Value {
		Value::Float(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Value {
		Value::Str(Rc::from(value))
	}
}

impl From<String> for Value {
	fn from(value: String) -> Value {
		Value::Str(Rc::from(value))
	}
}

impl From<Vec<Value>> for Value {
	fn from(items: Vec<Value>) -> Value {
		Value::list(items)
	}
}

impl From<Reactive> for Value {
	fn from(object: Reactive) -> Value {
		Value::Object(object)
	}
}
