use std::borrow::Cow;

use cadence_util::{
	debug::type_id::NamedTypeId,
	mem::hash::{fx_map_with_capacity, FxHashMap},
};

// === ExecutionIndex === //

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct OrderEntry {
	pub ty: NamedTypeId,
	pub index: i32,
}

/// The resolved execution index of every behavior type.
///
/// Types absent from the table have an implicit index of `0`. The table is immutable once built
/// and is meant to be shared (e.g. behind an `Arc`) for the rest of the process.
#[derive(Debug, Clone, Default)]
pub struct ExecutionIndex {
	/// Sorted ascending by `index`. Equal indices keep their insertion order.
	entries: Vec<OrderEntry>,
	lookup: FxHashMap<NamedTypeId, i32>,
}

impl ExecutionIndex {
	pub const DEFAULT_INDEX: i32 = 0;

	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a table from `entries`. If a type appears more than once, its first entry wins.
	pub fn from_entries(entries: impl IntoIterator<Item = OrderEntry>) -> Self {
		let entries = entries.into_iter();
		let mut lookup = fx_map_with_capacity(entries.size_hint().0);

		let mut entries = entries
			.filter(|entry| {
				if lookup.contains_key(&entry.ty) {
					log::warn!("Duplicate execution order entry for {}; ignoring it.", entry.ty);
					return false;
				}

				lookup.insert(entry.ty, entry.index);
				true
			})
			.collect::<Vec<_>>();

		entries.sort_by_key(|entry| entry.index);

		Self { entries, lookup }
	}

	pub fn get(&self, ty: NamedTypeId) -> i32 {
		self.lookup
			.get(&ty)
			.copied()
			.unwrap_or(Self::DEFAULT_INDEX)
	}

	pub fn get_of<T: ?Sized + 'static>(&self) -> i32 {
		self.get(NamedTypeId::of::<T>())
	}

	/// Whether the table stores an explicit entry for `ty`.
	pub fn contains(&self, ty: NamedTypeId) -> bool {
		self.lookup.contains_key(&ty)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// The stored entries in execution order.
	pub fn sorted(&self) -> &[OrderEntry] {
		&self.entries
	}

	// === Records === //

	/// Produces the name-keyed form of this table. Entries at the default index are omitted since
	/// they are indistinguishable from absent ones.
	pub fn to_records(&self) -> Vec<OrderRecord> {
		self.entries
			.iter()
			.filter(|entry| entry.index != Self::DEFAULT_INDEX)
			.map(|entry| OrderRecord {
				type_name: Cow::Borrowed(entry.ty.name()),
				index: entry.index,
			})
			.collect()
	}

	/// Rebuilds a table from its name-keyed form. Records naming types unknown to `names` are
	/// skipped.
	pub fn from_records<'a>(
		records: impl IntoIterator<Item = &'a OrderRecord>,
		names: &TypeNames,
	) -> Self {
		Self::from_entries(records.into_iter().filter_map(|record| {
			let Some(ty) = names.find(&record.type_name) else {
				log::warn!(
					"Execution order record names unknown type {:?}; ignoring it.",
					record.type_name,
				);
				return None;
			};

			Some(OrderEntry {
				ty,
				index: record.index,
			})
		}))
	}
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OrderRecord {
	pub type_name: Cow<'static, str>,
	pub index: i32,
}

// === TypeNames === //

/// A lookup from fully qualified type names back to type identities.
#[derive(Debug, Clone, Default)]
pub struct TypeNames {
	by_name: FxHashMap<&'static str, NamedTypeId>,
}

impl TypeNames {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, ty: NamedTypeId) -> Self {
		self.insert(ty);
		self
	}

	pub fn with_type<T: ?Sized + 'static>(self) -> Self {
		self.with(NamedTypeId::of::<T>())
	}

	pub fn insert(&mut self, ty: NamedTypeId) {
		self.by_name.insert(ty.name(), ty);
	}

	pub fn find(&self, name: &str) -> Option<NamedTypeId> {
		self.by_name.get(name).copied()
	}

	pub fn len(&self) -> usize {
		self.by_name.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_name.is_empty()
	}
}

impl FromIterator<NamedTypeId> for TypeNames {
	fn from_iter<I: IntoIterator<Item = NamedTypeId>>(iter: I) -> Self {
		let mut names = Self::new();
		for ty in iter {
			names.insert(ty);
		}
		names
	}
}

#[cfg(test)]
mod test {
	use super::*;

	struct Input;
	struct Physics;
	struct Camera;

	fn entry<T: 'static>(index: i32) -> OrderEntry {
		OrderEntry {
			ty: NamedTypeId::of::<T>(),
			index,
		}
	}

	#[test]
	fn unknown_types_default_to_zero() {
		let index = ExecutionIndex::from_entries([entry::<Input>(-5)]);

		assert_eq!(index.get_of::<Input>(), -5);
		assert_eq!(index.get_of::<Camera>(), 0);
		assert!(!index.contains(NamedTypeId::of::<Camera>()));
	}

	#[test]
	fn entries_are_sorted_stably() {
		let index = ExecutionIndex::from_entries([
			entry::<Camera>(10),
			entry::<Input>(-1),
			entry::<Physics>(10),
		]);

		let order = index.sorted().iter().map(|e| e.ty).collect::<Vec<_>>();
		assert_eq!(
			order,
			[
				NamedTypeId::of::<Input>(),
				NamedTypeId::of::<Camera>(),
				NamedTypeId::of::<Physics>(),
			]
		);
	}

	#[test]
	fn first_duplicate_wins() {
		let index = ExecutionIndex::from_entries([
			entry::<Camera>(4),
			entry::<Input>(1),
			entry::<Camera>(-9),
		]);

		assert_eq!(index.len(), 2);
		assert_eq!(index.get_of::<Camera>(), 4);
		assert_eq!(
			index.sorted().iter().map(|e| e.index).collect::<Vec<_>>(),
			[1, 4]
		);
	}

	#[test]
	fn records_skip_zero_and_unknown_types() {
		let index = ExecutionIndex::from_entries([
			entry::<Input>(-3),
			entry::<Physics>(0),
			entry::<Camera>(7),
		]);

		let records = index.to_records();
		assert_eq!(records.len(), 2);
		assert_eq!(records[0].index, -3);
		assert_eq!(records[1].index, 7);

		// `Camera` is not known to the name table.
		let names = [NamedTypeId::of::<Input>(), NamedTypeId::of::<Physics>()]
			.into_iter()
			.collect::<TypeNames>();
		assert_eq!(names.len(), 2);
		let rebuilt = ExecutionIndex::from_records(&records, &names);

		assert_eq!(rebuilt.len(), 1);
		assert_eq!(rebuilt.get_of::<Input>(), -3);
		assert_eq!(rebuilt.get_of::<Camera>(), 0);
	}
}
