use std::cell::RefCell;
use std::rc::{Rc, Weak};

use fxhash::FxHashMap;

use crate::effect::EffectBody;

/// Property name inside an observed object.
pub(crate) type Key = Rc<str>;

/// Synthetic key used by `Ref` and `Computed`.
pub(crate) const VALUE_KEY: &str = "value";

/// Identity of an observed object within one runtime. Minted from a
/// runtime counter; never reused while the runtime lives.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct TargetId(pub(crate) u64);

/// Ordered set of subscribers for one (target, key) pair.
///
/// Vec-backed so that notification order is first-read insertion order,
/// which `trigger` exposes as a contract.
pub(crate) struct DepSet {
	subscribers: RefCell<Vec<Weak<EffectBody>>>,
}

impl DepSet {
	fn new() -> Rc<Self> {
		Rc::new(DepSet {
			subscribers: RefCell::new(Vec::new()),
		})
	}

	/// Returns false if the subscriber is already present.
	pub(crate) fn insert(&self, effect: &Rc<EffectBody>) -> bool {
		let mut subscribers = self.subscribers.borrow_mut();
		if subscribers
			.iter()
			.any(|weak| weak.as_ptr() == Rc::as_ptr(effect))
		{
			return false;
		}
		subscribers.push(Rc::downgrade(effect));
		true
	}

	pub(crate) fn remove(&self, effect: *const EffectBody) {
		self.subscribers
			.borrow_mut()
			.retain(|weak| weak.as_ptr() != effect);
	}

	fn snapshot(&self) -> Vec<Rc<EffectBody>> {
		self.subscribers
			.borrow()
			.iter()
			.filter_map(Weak::upgrade)
			.collect()
	}
}

/// Two-level dependency store: target identity -> property key ->
/// ordered subscriber set. Storage only; the run/skip decisions live in
/// the runtime's `trigger`.
pub(crate) struct DepStore {
	targets: FxHashMap<TargetId, FxHashMap<Key, Rc<DepSet>>>,
}

impl DepStore {
	pub(crate) fn new() -> Self {
		DepStore {
			targets: FxHashMap::default(),
		}
	}

	pub(crate) fn dep_set(&mut self, target: TargetId, key: &str) -> Rc<DepSet> {
		let keys = self.targets.entry(target).or_default();
		if let Some(set) = keys.get(key) {
			return set.clone();
		}
		let set = DepSet::new();
		keys.insert(Rc::from(key), set.clone());
		set
	}

	/// Missing target/key reads as an empty set. The copy decouples the
	/// notification loop from subscribers mutating the set as they
	/// clean up and re-track.
	pub(crate) fn snapshot(&self, target: TargetId, key: &str) -> Vec<Rc<EffectBody>> {
		self.targets
			.get(&target)
			.and_then(|keys| keys.get(key))
			.map(|set| set.snapshot())
			.unwrap_or_default()
	}

	/// Called when the observed object's last handle is dropped.
	pub(crate) fn remove_target(&mut self, target: TargetId) {
		self.targets.remove(&target);
	}
}
