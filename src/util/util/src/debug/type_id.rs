use std::{any::TypeId, borrow::Borrow, fmt};

use derive_where::derive_where;

/// A [`TypeId`] which remembers the name of the type it was created from.
///
/// Equality, ordering, and hashing only consider the underlying [`TypeId`]; the name is carried
/// around for diagnostics and for matching against name-keyed records.
#[derive(Copy, Clone)]
#[derive_where(Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NamedTypeId {
	id: TypeId,
	#[derive_where(skip)]
	name: &'static str,
}

impl fmt::Debug for NamedTypeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TypeId<{}>", self.name)
	}
}

impl fmt::Display for NamedTypeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.short_name())
	}
}

impl NamedTypeId {
	pub fn of<T: ?Sized + 'static>() -> Self {
		Self {
			id: TypeId::of::<T>(),
			name: std::any::type_name::<T>(),
		}
	}

	pub fn raw(self) -> TypeId {
		self.id
	}

	/// The fully qualified type name, as reported by [`std::any::type_name`].
	pub fn name(self) -> &'static str {
		self.name
	}

	/// The type name with its module path stripped. Generic arguments are kept as-is.
	pub fn short_name(self) -> &'static str {
		let base_end = self.name.find('<').unwrap_or(self.name.len());
		let start = self.name[..base_end].rfind("::").map_or(0, |idx| idx + 2);
		&self.name[start..]
	}
}

impl Borrow<TypeId> for NamedTypeId {
	fn borrow(&self) -> &TypeId {
		&self.id
	}
}

impl From<NamedTypeId> for TypeId {
	fn from(id: NamedTypeId) -> Self {
		id.raw()
	}
}
