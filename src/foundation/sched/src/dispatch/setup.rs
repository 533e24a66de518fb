use std::borrow::Cow;

use cadence_util::{debug::type_id::NamedTypeId, mem::hash::FxHashMap};

use crate::order::index::TypeNames;

use super::{
	behavior::{Behavior, Instance},
	phase::SetupFlags,
};

// === SetupTable === //

/// Per-type setup flags.
///
/// The first instance of a type created through [`instantiate`](Self::instantiate) decides the
/// flags of every later one, so [`Behavior::setup`] is asked once per type rather than once per
/// instance. Flags can also be declared up front or loaded from records.
#[derive(Debug, Clone, Default)]
pub struct SetupTable {
	flags: FxHashMap<NamedTypeId, SetupFlags>,
}

impl SetupTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn declare(&mut self, ty: NamedTypeId, flags: SetupFlags) -> Option<SetupFlags> {
		self.flags.insert(ty, flags)
	}

	pub fn with<B: Behavior>(mut self, flags: SetupFlags) -> Self {
		self.declare(NamedTypeId::of::<B>(), flags);
		self
	}

	pub fn get(&self, ty: NamedTypeId) -> Option<SetupFlags> {
		self.flags.get(&ty).copied()
	}

	pub fn get_of<B: Behavior>(&self) -> Option<SetupFlags> {
		self.get(NamedTypeId::of::<B>())
	}

	pub fn len(&self) -> usize {
		self.flags.len()
	}

	pub fn is_empty(&self) -> bool {
		self.flags.is_empty()
	}

	/// The cached flags for `B`, computed from `behavior` on first use.
	pub fn flags_for<B: Behavior>(&mut self, behavior: &B) -> SetupFlags {
		*self
			.flags
			.entry(NamedTypeId::of::<B>())
			.or_insert_with(|| behavior.setup())
	}

	/// Creates an instance using the cached flags for its type.
	pub fn instantiate<B: Behavior>(&mut self, behavior: B) -> Instance {
		let flags = self.flags_for(&behavior);
		Instance::with_flags(behavior, flags)
	}

	// === Records === //

	/// Produces the name-keyed form of this table, sorted by type name.
	pub fn to_records(&self) -> Vec<SetupRecord> {
		let mut records = self
			.flags
			.iter()
			.map(|(ty, flags)| SetupRecord {
				type_name: Cow::Borrowed(ty.name()),
				flags: flags.bits(),
			})
			.collect::<Vec<_>>();

		records.sort_by(|a, b| a.type_name.cmp(&b.type_name));
		records
	}

	/// Rebuilds a table from its name-keyed form. Records naming unknown types or carrying
	/// unknown flag bits are skipped.
	pub fn from_records<'a>(
		records: impl IntoIterator<Item = &'a SetupRecord>,
		names: &TypeNames,
	) -> Self {
		let mut table = Self::new();

		for record in records {
			let Some(ty) = names.find(&record.type_name) else {
				log::warn!(
					"Setup record names unknown type {:?}; ignoring it.",
					record.type_name,
				);
				continue;
			};

			let Some(flags) = SetupFlags::from_bits(record.flags) else {
				log::warn!(
					"Setup record for {ty} has unknown flag bits {:#x}; ignoring it.",
					record.flags,
				);
				continue;
			};

			table.declare(ty, flags);
		}

		table
	}
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SetupRecord {
	pub type_name: Cow<'static, str>,
	pub flags: u32,
}
