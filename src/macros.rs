pub use enclose::*;

/// Build a reactive object literal. Nested braces become nested
/// objects; any other value position takes a single token or a
/// parenthesized expression convertible into [`crate::Value`].
///
/// ```ignore
/// let o = reactive!(rt, { a: 1, b: { c: 2 } });
/// ```
#[macro_export]
macro_rules! reactive {
	($rt:expr, { $($key:ident : $value:tt),* $(,)? }) => {{
		let object = ($rt).reactive();
		$({
			let value = $crate::reactive!(@value object, $value);
			object.set(stringify!($key), value);
		})*
		object
	}};
	(@value $parent:ident, { $($inner:tt)* }) => {
		$crate::Value::Object($crate::reactive!($parent.runtime(), { $($inner)* }))
	};
	(@value $parent:ident, $value:expr) => {
		$crate::Value::from($value)
	};
}

/// Register an effect over clones of the listed handles:
///
/// ```ignore
/// let e = effect!(rt, (obj, log) { log.borrow_mut().push(obj.get("a")); });
/// ```
#[macro_export]
macro_rules! effect {
	($rt:expr, ( $($capture:tt)* ) $($body:tt)*) => {
		($rt).effect($crate::macros::enclose!(($( $capture )*) move || $($body)*))
	};
	($rt:expr, $($body:tt)*) => {
		($rt).effect(move || $($body)*)
	};
}
