use core::{
	borrow::Borrow,
	hash::{BuildHasher, Hash},
};
use hashbrown::{
	hash_map::{DefaultHashBuilder, Entry},
	HashMap,
};
use num_traits::{CheckedAdd, CheckedSub, One, Zero};

/// A [`HashMap`] that counts how often each key was inserted.
///
/// Entries whose count dropped to zero are "weak": they stay in the map until [`RcHashMap::drain_weak`],
/// but [`RcHashMap::iter_strong`] skips them.
#[derive(Debug)]
pub struct RcHashMap<K, C, V, S = DefaultHashBuilder>(HashMap<K, (C, V), S>)
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero,
	S: BuildHasher;
impl<K, C, V, S> Default for RcHashMap<K, C, V, S>
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero + Copy,
	S: Default + BuildHasher,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<K, C, V, S> RcHashMap<K, C, V, S>
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero + Copy,
	S: BuildHasher,
{
	#[must_use]
	pub fn new() -> Self
	where
		S: Default,
	{
		Self(HashMap::with_hasher(S::default()))
	}

	/// Increments the count for `k`, or inserts the value produced by `v` with a count of one.
	///
	/// A weak entry is revived without calling `v`.
	pub fn increment_or_insert_with<F: FnOnce() -> V>(&mut self, k: K, v: F) -> Result<&mut V, CountSaturatedError> {
		match self.0.entry(k) {
			Entry::Occupied(occupied) => {
				let (c, v) = occupied.into_mut();
				*c = c.checked_add(&C::one()).ok_or(CountSaturatedError)?;
				Ok(v)
			}
			Entry::Vacant(vacant) => {
				let (_, v) = vacant.insert((C::one(), v()));
				Ok(v)
			}
		}
	}

	/// Decrements the count for `k` and returns the remaining count along with the value.
	///
	/// The entry is kept even if the count reaches zero.
	pub fn weak_decrement<Q: ?Sized>(&mut self, k: &Q) -> Result<Option<(C, &mut V)>, CountSaturatedError>
	where
		K: Borrow<Q>,
		Q: Eq + Hash,
	{
		match self.0.get_mut(k) {
			Some((c, v)) => {
				*c = c.checked_sub(&C::one()).ok_or(CountSaturatedError)?;
				Ok(Some((*c, v)))
			}
			None => Ok(None),
		}
	}

	pub fn iter_strong(&self) -> impl Iterator<Item = (&K, &V)> {
		self.0.iter().filter(|(_, (c, _))| !c.is_zero()).map(|(k, (_, v))| (k, v))
	}

	/// Removes all entries with a count of zero.
	pub fn drain_weak(&mut self) -> Vec<(K, V)> {
		self.remove_where(|_, c| c.is_zero())
	}

	/// Removes all entries matching `predicate`, regardless of their count.
	pub fn remove_where(&mut self, mut predicate: impl FnMut(&K, C) -> bool) -> Vec<(K, V)> {
		self.0.extract_if(|k, (c, _)| predicate(k, *c)).map(|(k, (_, v))| (k, v)).collect()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountSaturatedError;
