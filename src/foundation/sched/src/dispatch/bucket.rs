use cadence_util::{debug::type_id::NamedTypeId, mem::hash::FxHashMap};
use derive_where::derive_where;
use thiserror::Error;

use crate::order::index::ExecutionIndex;

// === Errors === //

#[derive(Debug, Copy, Clone, Error)]
pub enum RemoveError {
	#[error("no bucket exists for behavior type {0}")]
	UnknownType(NamedTypeId),

	#[error("the bucket for behavior type {0} does not contain the instance being removed")]
	MissingItem(NamedTypeId),
}

// === Bucket === //

/// All items of one type within one store.
#[derive(Debug, Clone)]
pub struct Bucket<T> {
	ty: NamedTypeId,
	order: i32,
	items: Vec<T>,
}

impl<T> Bucket<T> {
	const INITIAL_CAPACITY: usize = 16;

	fn new(ty: NamedTypeId, order: i32) -> Self {
		Self {
			ty,
			order,
			items: Vec::with_capacity(Self::INITIAL_CAPACITY),
		}
	}

	pub fn ty(&self) -> NamedTypeId {
		self.ty
	}

	pub fn order(&self) -> i32 {
		self.order
	}

	pub fn items(&self) -> &[T] {
		&self.items
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

// === BucketStore === //

/// Items grouped into per-type buckets, with buckets kept sorted by execution index.
///
/// Buckets are never removed as a side effect of removing items. Empty buckets linger until
/// [`clear_unused_slots`](Self::clear_unused_slots) is called so that churn does not pay for
/// shifting the bucket list on every removal.
#[derive(Debug)]
#[derive_where(Default)]
pub struct BucketStore<T> {
	/// Sorted ascending by `order`. Buckets with equal orders keep their creation order.
	buckets: Vec<Bucket<T>>,

	/// Position of every type's bucket in `buckets`.
	positions: FxHashMap<NamedTypeId, usize>,
}

impl<T: PartialEq> BucketStore<T> {
	/// Above this many buckets, insertion finds existing buckets through `positions` rather than
	/// scanning.
	pub const LOOKUP_THRESHOLD: usize = 64;

	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, ty: NamedTypeId, item: T, order: &ExecutionIndex) {
		if self.buckets.len() > Self::LOOKUP_THRESHOLD {
			if let Some(&at) = self.positions.get(&ty) {
				self.buckets[at].items.push(item);
				return;
			}
		}

		let order = order.get(ty);
		let mut insert_at = self.buckets.len();

		for (at, bucket) in self.buckets.iter_mut().enumerate() {
			if bucket.ty == ty {
				bucket.items.push(item);
				return;
			}

			if bucket.order > order {
				insert_at = at;
				break;
			}
		}

		let mut bucket = Bucket::new(ty, order);
		bucket.items.push(item);
		self.buckets.insert(insert_at, bucket);
		self.reindex_from(insert_at);
	}

	pub fn remove(&mut self, ty: NamedTypeId, item: &T) -> Result<(), RemoveError> {
		let &at = self
			.positions
			.get(&ty)
			.ok_or(RemoveError::UnknownType(ty))?;

		let items = &mut self.buckets[at].items;
		let index = items
			.iter()
			.position(|candidate| candidate == item)
			.ok_or(RemoveError::MissingItem(ty))?;

		items.swap_remove(index);
		Ok(())
	}

	pub fn contains(&self, ty: NamedTypeId, item: &T) -> bool {
		self.positions
			.get(&ty)
			.is_some_and(|&at| self.buckets[at].items.contains(item))
	}
}

impl<T> BucketStore<T> {
	/// Removes every empty bucket while keeping the remaining buckets in order. Returns the number
	/// of buckets removed.
	pub fn clear_unused_slots(&mut self) -> usize {
		let old_len = self.buckets.len();
		self.buckets.retain(|bucket| !bucket.items.is_empty());

		let removed = old_len - self.buckets.len();
		if removed > 0 {
			self.positions.clear();
			self.reindex_from(0);
		}

		removed
	}

	fn reindex_from(&mut self, start: usize) {
		for (at, bucket) in self.buckets.iter().enumerate().skip(start) {
			self.positions.insert(bucket.ty, at);
		}
	}

	pub fn buckets(&self) -> &[Bucket<T>] {
		&self.buckets
	}

	pub fn bucket_count(&self) -> usize {
		self.buckets.len()
	}

	pub fn empty_bucket_count(&self) -> usize {
		self.buckets.iter().filter(|bucket| bucket.is_empty()).count()
	}

	/// The total number of items across every bucket.
	pub fn len(&self) -> usize {
		self.buckets.iter().map(Bucket::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.buckets.iter().all(Bucket::is_empty)
	}

	/// Iterates every item, bucket by bucket, in execution order.
	pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
		self.buckets.iter().flat_map(|bucket| bucket.items.iter())
	}

	pub fn for_each(&self, f: impl FnMut(&T)) {
		self.iter().for_each(f);
	}
}

#[cfg(test)]
mod test {
	use crate::order::index::OrderEntry;

	use super::*;

	struct Early;
	struct Middle;
	struct Late;
	struct Unordered;

	fn id<T: 'static>() -> NamedTypeId {
		NamedTypeId::of::<T>()
	}

	fn order() -> ExecutionIndex {
		ExecutionIndex::from_entries([
			OrderEntry {
				ty: id::<Early>(),
				index: -10,
			},
			OrderEntry {
				ty: id::<Late>(),
				index: 10,
			},
		])
	}

	fn assert_sorted<T>(store: &BucketStore<T>) {
		let orders = store.buckets().iter().map(Bucket::order).collect::<Vec<_>>();
		assert!(orders.windows(2).all(|w| w[0] <= w[1]), "{orders:?}");
	}

	fn bucket_types<T>(store: &BucketStore<T>) -> Vec<NamedTypeId> {
		store.buckets().iter().map(Bucket::ty).collect()
	}

	#[test]
	fn buckets_follow_execution_index() {
		let order = order();
		let mut store = BucketStore::new();

		store.add(id::<Late>(), 1, &order);
		store.add(id::<Middle>(), 2, &order);
		store.add(id::<Early>(), 3, &order);
		store.add(id::<Late>(), 4, &order);
		store.add(id::<Early>(), 5, &order);

		assert_sorted(&store);
		assert_eq!(bucket_types(&store), [id::<Early>(), id::<Middle>(), id::<Late>()]);
		assert_eq!(store.iter().copied().collect::<Vec<_>>(), [3, 5, 2, 1, 4]);
	}

	#[test]
	fn equal_indices_keep_creation_order() {
		let order = order();
		let mut store = BucketStore::new();

		store.add(id::<Unordered>(), 1, &order);
		store.add(id::<Middle>(), 2, &order);
		store.add(id::<Unordered>(), 3, &order);

		assert_eq!(bucket_types(&store), [id::<Unordered>(), id::<Middle>()]);
	}

	#[test]
	fn removal_leaves_empty_bucket_until_compaction() {
		let order = order();
		let mut store = BucketStore::new();

		store.add(id::<Early>(), 1, &order);
		store.add(id::<Middle>(), 2, &order);
		store.add(id::<Late>(), 3, &order);

		store.remove(id::<Middle>(), &2).unwrap();
		assert_eq!(store.bucket_count(), 3);
		assert_eq!(store.empty_bucket_count(), 1);
		assert!(!store.contains(id::<Middle>(), &2));

		assert_eq!(store.clear_unused_slots(), 1);
		assert_eq!(bucket_types(&store), [id::<Early>(), id::<Late>()]);

		// Lookups still resolve after positions shift.
		store.remove(id::<Late>(), &3).unwrap();
		assert!(store.contains(id::<Early>(), &1));
	}

	#[test]
	fn compaction_is_idempotent() {
		let order = order();
		let mut store = BucketStore::new();

		store.add(id::<Early>(), 1, &order);
		store.add(id::<Late>(), 2, &order);
		store.remove(id::<Early>(), &1).unwrap();

		assert_eq!(store.clear_unused_slots(), 1);
		let once = bucket_types(&store);
		assert_eq!(store.clear_unused_slots(), 0);
		assert_eq!(bucket_types(&store), once);
	}

	#[test]
	fn removal_errors_are_reported() {
		let order = order();
		let mut store = BucketStore::new();
		store.add(id::<Early>(), 1, &order);

		assert!(matches!(
			store.remove(id::<Late>(), &1),
			Err(RemoveError::UnknownType(_))
		));
		assert!(matches!(
			store.remove(id::<Early>(), &2),
			Err(RemoveError::MissingItem(_))
		));
		assert_eq!(store.len(), 1);
	}

	#[test]
	fn reused_empty_bucket_keeps_its_slot() {
		let order = order();
		let mut store = BucketStore::new();

		store.add(id::<Middle>(), 1, &order);
		store.add(id::<Late>(), 2, &order);
		store.remove(id::<Middle>(), &1).unwrap();
		store.add(id::<Middle>(), 3, &order);

		assert_eq!(store.bucket_count(), 2);
		assert_eq!(store.iter().copied().collect::<Vec<_>>(), [3, 2]);
	}

	#[test]
	fn large_stores_stay_sorted() {
		// Enough distinct types to cross the lookup threshold.
		struct Tagged<const N: usize>;

		macro_rules! add_tagged {
			($store:expr, $index:expr; $($n:literal)*) => {$(
				$store.add(NamedTypeId::of::<Tagged<$n>>(), $n, $index);
			)*};
		}

		let order = order();
		let mut store = BucketStore::new();
		add_tagged!(store, &order;
			0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19
			20 21 22 23 24 25 26 27 28 29 30 31 32 33 34 35 36 37 38 39
			40 41 42 43 44 45 46 47 48 49 50 51 52 53 54 55 56 57 58 59
			60 61 62 63 64 65 66 67 68 69 70
		);
		assert!(store.bucket_count() > BucketStore::<usize>::LOOKUP_THRESHOLD);

		store.add(id::<Late>(), 100, &order);
		store.add(id::<Early>(), 101, &order);
		add_tagged!(store, &order; 5 64 70);

		assert_sorted(&store);
		assert_eq!(store.buckets()[0].ty(), id::<Early>());
		assert_eq!(store.buckets().last().map(Bucket::ty), Some(id::<Late>()));
		assert_eq!(store.len(), 76);
		assert!(store.contains(NamedTypeId::of::<Tagged<64>>(), &64));
	}
}
