use std::{
	fmt, hash,
	marker::PhantomData,
	ops::{Index, IndexMut},
};

// === `CEnum` === //

pub type VariantIter<T> = std::iter::Copied<std::slice::Iter<'static, T>>;

/// A closed, field-less enum whose variants can be enumerated and used as dense array indices.
pub trait CEnum: 'static + Sized + fmt::Debug + Copy + hash::Hash + Eq + Ord {
	const COUNT: usize;
	const VARIANTS: &'static [Self];

	type Array<T>: AsRef<[T]> + AsMut<[T]>;

	fn new_array<T, F>(gen: F) -> Self::Array<T>
	where
		F: FnMut(usize) -> T;

	fn index(self) -> usize;

	fn try_from_index(index: usize) -> Option<Self> {
		Self::VARIANTS.get(index).copied()
	}

	fn variants() -> VariantIter<Self> {
		Self::VARIANTS.iter().copied()
	}
}

#[doc(hidden)]
pub mod macro_internal {
	pub use std::{array::from_fn, primitive::usize};
}

#[macro_export]
macro_rules! c_enum {
	(@count) => { 0 };
	(@count $head:ident $($tail:ident)*) => { 1 + $crate::c_enum!(@count $($tail)*) };
	($(
		$(#[$attr_meta:meta])*
		$vis:vis enum $name:ident {
			$(
				$(#[$field_meta:meta])*
				$field:ident
			),*
			$(,)?
		}
	)*) => {$(
		$(#[$attr_meta])*
		#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
		$vis enum $name {
			$(
				$(#[$field_meta])*
				$field
			),*
		}

		impl $crate::mem::c_enum::CEnum for $name {
			const COUNT: $crate::mem::c_enum::macro_internal::usize =
				$crate::c_enum!(@count $($field)*);

			const VARIANTS: &'static [Self] = &[
				$(Self::$field),*
			];

			type Array<T> = [T; $crate::c_enum!(@count $($field)*)];

			fn new_array<T, F>(gen: F) -> Self::Array<T>
			where
				F: ::std::ops::FnMut($crate::mem::c_enum::macro_internal::usize) -> T,
			{
				$crate::mem::c_enum::macro_internal::from_fn(gen)
			}

			fn index(self) -> $crate::mem::c_enum::macro_internal::usize {
				self as $crate::mem::c_enum::macro_internal::usize
			}
		}
	)*};
}

pub use c_enum;

// === `CEnumMap` === //

/// A dense map with exactly one value per variant of `K`.
pub struct CEnumMap<K: CEnum, V> {
	_ty: PhantomData<fn(K) -> K>,
	map: K::Array<V>,
}

impl<K: CEnum, V: fmt::Debug> fmt::Debug for CEnumMap<K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.iter()).finish()
	}
}

impl<K: CEnum, V: Default> Default for CEnumMap<K, V> {
	fn default() -> Self {
		Self::from_fn(|_| V::default())
	}
}

impl<K: CEnum, V> CEnumMap<K, V> {
	pub fn from_fn(mut gen: impl FnMut(K) -> V) -> Self {
		Self {
			_ty: PhantomData,
			map: K::new_array(|i| gen(K::VARIANTS[i])),
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
		K::variants().zip(self.map.as_ref().iter())
	}

	pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut V)> + '_ {
		K::variants().zip(self.map.as_mut().iter_mut())
	}

	pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
		self.map.as_ref().iter()
	}

	pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
		self.map.as_mut().iter_mut()
	}
}

impl<K: CEnum, V> Index<K> for CEnumMap<K, V> {
	type Output = V;

	fn index(&self, index: K) -> &Self::Output {
		&self.map.as_ref()[index.index()]
	}
}

impl<K: CEnum, V> IndexMut<K> for CEnumMap<K, V> {
	fn index_mut(&mut self, index: K) -> &mut Self::Output {
		&mut self.map.as_mut()[index.index()]
	}
}

#[cfg(test)]
mod test {
	use super::*;

	c_enum! {
		enum Step {
			First,
			Second,
			Third,
		}
	}

	#[test]
	fn variants_are_dense() {
		assert_eq!(Step::COUNT, 3);
		assert_eq!(Step::Third.index(), 2);
		assert_eq!(Step::try_from_index(1), Some(Step::Second));
		assert_eq!(Step::try_from_index(3), None);
	}

	#[test]
	fn map_indexes_by_variant() {
		let mut map = CEnumMap::<Step, u32>::from_fn(|step| step.index() as u32 * 10);
		map[Step::Second] += 1;

		assert_eq!(map[Step::First], 0);
		assert_eq!(map[Step::Second], 11);
		assert_eq!(
			map.iter().map(|(k, _)| k).collect::<Vec<_>>(),
			[Step::First, Step::Second, Step::Third],
		);
	}
}
