use std::hash::BuildHasherDefault;

// === Hash Maps === //

pub type FxHashBuilder = BuildHasherDefault<fxhash::FxHasher>;
pub type FxHashMap<K, V> = hashbrown::HashMap<K, V, FxHashBuilder>;

pub fn fx_map_with_capacity<K, V>(capacity: usize) -> FxHashMap<K, V> {
	FxHashMap::with_capacity_and_hasher(capacity, FxHashBuilder::default())
}
