use cadence_util::{
	debug::type_id::NamedTypeId,
	mem::hash::{fx_map_with_capacity, FxHashMap},
};
use thiserror::Error;

use super::{
	descriptor::{Directive, TypeDescriptor},
	index::{ExecutionIndex, OrderEntry},
};

// === Errors === //

#[derive(Debug, Clone, Error)]
pub enum OrderError {
	#[error(
		"execution order directives did not settle within {passes} passes because the \
		 before/after chain {} is cyclic",
		format_types(cycle)
	)]
	Cycle {
		passes: u32,
		cycle: Vec<NamedTypeId>,
	},

	#[error("behavior type {0} cannot be placed after its targets without overflowing the index range")]
	Contradictory(NamedTypeId),

	#[error("behavior type {0} was declared more than once")]
	DuplicateType(NamedTypeId),
}

fn format_types(types: &[NamedTypeId]) -> String {
	types
		.iter()
		.map(|ty| ty.short_name())
		.collect::<Vec<_>>()
		.join(" -> ")
}

// === OrderResolver === //

/// Turns per-type priorities and before/after directives into an [`ExecutionIndex`].
///
/// Resolution relaxes every directive repeatedly until a full pass leaves all indices unchanged.
/// Relaxation only ever moves the type declaring a directive, so some acyclic sets (e.g. a type
/// squeezed between two pinned neighbors) never settle. If no fixed point is reached within
/// [`max_passes`](Self::with_max_passes) passes, the directive graph is searched for a cycle.
/// Cycles fail resolution. Acyclic graphs are finished with a longest-path pass in topological
/// order, which is free to push targets as well.
#[derive(Debug, Clone)]
pub struct OrderResolver {
	descriptors: Vec<TypeDescriptor>,
	slots: FxHashMap<NamedTypeId, usize>,
	max_passes: u32,
}

impl Default for OrderResolver {
	fn default() -> Self {
		Self::new()
	}
}

impl OrderResolver {
	pub const DEFAULT_MAX_PASSES: u32 = 10_000;

	pub fn new() -> Self {
		Self {
			descriptors: Vec::new(),
			slots: FxHashMap::default(),
			max_passes: Self::DEFAULT_MAX_PASSES,
		}
	}

	pub fn with_max_passes(mut self, max_passes: u32) -> Self {
		self.max_passes = max_passes;
		self
	}

	pub fn with(mut self, descriptor: TypeDescriptor) -> Result<Self, OrderError> {
		self.declare(descriptor)?;
		Ok(self)
	}

	pub fn declare(&mut self, descriptor: TypeDescriptor) -> Result<&mut Self, OrderError> {
		let ty = descriptor.ty();
		if self.slots.contains_key(&ty) {
			return Err(OrderError::DuplicateType(ty));
		}

		self.slots.insert(ty, self.descriptors.len());
		self.descriptors.push(descriptor);
		Ok(self)
	}

	pub fn descriptors(&self) -> &[TypeDescriptor] {
		&self.descriptors
	}

	pub fn resolve(&self) -> Result<ExecutionIndex, OrderError> {
		// Seed every type with its explicit priority. Types that only ever appear as directive
		// targets get an implicit slot at the default priority.
		let mut types = self
			.descriptors
			.iter()
			.map(TypeDescriptor::ty)
			.collect::<Vec<_>>();

		let mut indices = self
			.descriptors
			.iter()
			.map(TypeDescriptor::priority)
			.collect::<Vec<_>>();

		let mut slots = fx_map_with_capacity(types.len());
		slots.extend(self.slots.iter().map(|(&ty, &slot)| (ty, slot)));

		let mut constraints = Vec::new();
		for (me, descriptor) in self.descriptors.iter().enumerate() {
			for &directive in descriptor.directives() {
				let target = directive.target();
				let target = *slots.entry(target).or_insert_with(|| {
					types.push(target);
					indices.push(ExecutionIndex::DEFAULT_INDEX);
					types.len() - 1
				});

				constraints.push((me, directive, target));
			}
		}

		// Relax until stable.
		let mut passes = 0;
		loop {
			if passes >= self.max_passes {
				let edges = precedence_edges(types.len(), &constraints);

				if let Some(cycle) = find_cycle(&edges) {
					return Err(OrderError::Cycle {
						passes: self.max_passes,
						cycle: cycle.into_iter().map(|slot| types[slot]).collect(),
					});
				}

				log::debug!(
					"Directives for {} type(s) did not settle within {passes} passes; \
					 finishing with a topological pass.",
					types.len(),
				);

				push_apart(&edges, &mut indices)
					.map_err(|slot| OrderError::Contradictory(types[slot]))?;
				break;
			}
			passes += 1;

			if !relax_pass(&constraints, &mut indices) {
				break;
			}
		}

		log::trace!(
			"Resolved execution order for {} type(s) in {passes} pass(es).",
			types.len(),
		);

		// Types at the default index without any directive carry no information.
		let entries = types
			.iter()
			.zip(&indices)
			.enumerate()
			.filter(|&(slot, (_, &index))| {
				index != ExecutionIndex::DEFAULT_INDEX
					|| self
						.descriptors
						.get(slot)
						.is_some_and(TypeDescriptor::has_directives)
			})
			.map(|(_, (&ty, &index))| OrderEntry { ty, index })
			.collect::<Vec<_>>();

		Ok(ExecutionIndex::from_entries(entries))
	}
}

/// Runs one pass over every constraint, moving only the declaring type. Returns whether any
/// index changed.
fn relax_pass(constraints: &[(usize, Directive, usize)], indices: &mut [i32]) -> bool {
	let mut changed = false;

	for &(me, directive, target) in constraints {
		let target_index = indices[target];

		match directive {
			Directive::RunsBefore(_) if target_index <= indices[me] => {
				indices[me] = target_index.saturating_sub(1);
				changed = true;
			}
			Directive::RunsAfter(_) if indices[me] <= target_index => {
				indices[me] = target_index.saturating_add(1);
				changed = true;
			}
			_ => {}
		}
	}

	changed
}

// === Graph fallback === //

/// Builds the "must run strictly earlier than" adjacency list of every slot.
fn precedence_edges(slot_count: usize, constraints: &[(usize, Directive, usize)]) -> Vec<Vec<usize>> {
	let mut edges = vec![Vec::new(); slot_count];

	for &(me, directive, target) in constraints {
		match directive {
			Directive::RunsBefore(_) => edges[me].push(target),
			Directive::RunsAfter(_) => edges[target].push(me),
		}
	}

	edges
}

/// Finds one cycle in the graph, returning its slots in edge order. Self-loops count.
fn find_cycle(edges: &[Vec<usize>]) -> Option<Vec<usize>> {
	#[derive(Copy, Clone, Eq, PartialEq)]
	enum Mark {
		Unvisited,
		OnPath,
		Done,
	}

	let mut marks = vec![Mark::Unvisited; edges.len()];
	let mut path = Vec::<(usize, usize)>::new();

	for root in 0..edges.len() {
		if marks[root] != Mark::Unvisited {
			continue;
		}

		marks[root] = Mark::OnPath;
		path.push((root, 0));

		while let Some((node, cursor)) = path.last_mut() {
			let node = *node;
			let Some(&next) = edges[node].get(*cursor) else {
				marks[node] = Mark::Done;
				path.pop();
				continue;
			};
			*cursor += 1;

			match marks[next] {
				Mark::Unvisited => {
					marks[next] = Mark::OnPath;
					path.push((next, 0));
				}
				Mark::OnPath => {
					let start = path
						.iter()
						.position(|&(slot, _)| slot == next)
						.unwrap_or(0);

					return Some(path[start..].iter().map(|&(slot, _)| slot).collect());
				}
				Mark::Done => {}
			}
		}
	}

	None
}

/// Raises indices along an acyclic graph, in topological order, until every edge points to a
/// strictly greater index. Indices are never lowered. Fails with the offending slot if an index
/// would leave the `i32` range.
fn push_apart(edges: &[Vec<usize>], indices: &mut [i32]) -> Result<(), usize> {
	let mut in_degree = vec![0usize; edges.len()];
	for &target in edges.iter().flatten() {
		in_degree[target] += 1;
	}

	let mut ready = (0..edges.len())
		.filter(|&slot| in_degree[slot] == 0)
		.collect::<Vec<_>>();

	while let Some(slot) = ready.pop() {
		for &target in &edges[slot] {
			let floor = indices[slot].checked_add(1).ok_or(target)?;
			if indices[target] < floor {
				indices[target] = floor;
			}

			in_degree[target] -= 1;
			if in_degree[target] == 0 {
				ready.push(target);
			}
		}
	}

	Ok(())
}

#[cfg(test)]
mod test {
	use super::*;

	struct A;
	struct B;
	struct C;
	struct D;

	fn id<T: 'static>() -> NamedTypeId {
		NamedTypeId::of::<T>()
	}

	fn assert_satisfied(resolver: &OrderResolver, index: &ExecutionIndex) {
		for descriptor in resolver.descriptors() {
			let me = index.get(descriptor.ty());
			for &directive in descriptor.directives() {
				let target = index.get(directive.target());
				match directive {
					Directive::RunsBefore(_) => assert!(me < target, "{directive:?} violated"),
					Directive::RunsAfter(_) => assert!(me > target, "{directive:?} violated"),
				}
			}
		}
	}

	#[test]
	fn runs_after_bumps_past_target() {
		let resolver = OrderResolver::new()
			.with(TypeDescriptor::of::<A>())
			.unwrap()
			.with(TypeDescriptor::of::<B>().runs_after::<A>())
			.unwrap();

		let index = resolver.resolve().unwrap();
		assert_eq!(index.get_of::<A>(), 0);
		assert_eq!(index.get_of::<B>(), 1);
		assert_satisfied(&resolver, &index);
	}

	#[test]
	fn chains_and_priorities_are_satisfied() {
		let resolver = OrderResolver::new()
			.with(TypeDescriptor::of::<A>().with_priority(5).runs_before::<B>())
			.unwrap()
			.with(TypeDescriptor::of::<B>().runs_before::<C>())
			.unwrap()
			.with(TypeDescriptor::of::<C>().with_priority(-10))
			.unwrap()
			.with(TypeDescriptor::of::<D>().runs_after::<A>().runs_before::<C>())
			.unwrap();

		let index = resolver.resolve().unwrap();
		assert_satisfied(&resolver, &index);
		assert_eq!(index.get_of::<C>(), -10);
	}

	#[test]
	fn undeclared_targets_sit_at_zero() {
		let resolver = OrderResolver::new()
			.with(TypeDescriptor::of::<A>().runs_before::<B>())
			.unwrap();

		let index = resolver.resolve().unwrap();
		assert_eq!(index.get_of::<A>(), -1);
		assert_eq!(index.get_of::<B>(), 0);
	}

	#[test]
	fn mutual_directives_are_a_cycle() {
		let resolver = OrderResolver::new()
			.with_max_passes(100)
			.with(TypeDescriptor::of::<A>().runs_before::<B>())
			.unwrap()
			.with(TypeDescriptor::of::<B>().runs_before::<A>())
			.unwrap();

		match resolver.resolve() {
			Err(OrderError::Cycle { passes, cycle }) => {
				assert_eq!(passes, 100);
				assert_eq!(cycle.len(), 2);
				assert!(cycle.contains(&id::<A>()) && cycle.contains(&id::<B>()));
			}
			other => panic!("expected a cycle error, got {other:?}"),
		}
	}

	#[test]
	fn self_reference_is_a_cycle() {
		let resolver = OrderResolver::new()
			.with(TypeDescriptor::of::<A>().runs_after::<A>())
			.unwrap();

		match resolver.resolve() {
			Err(OrderError::Cycle { cycle, .. }) => assert_eq!(cycle, [id::<A>()]),
			other => panic!("expected a cycle error, got {other:?}"),
		}
	}

	#[test]
	fn longer_cycles_name_every_member() {
		let resolver = OrderResolver::new()
			.with_max_passes(50)
			.with(TypeDescriptor::of::<A>().runs_before::<B>())
			.unwrap()
			.with(TypeDescriptor::of::<B>().runs_before::<C>())
			.unwrap()
			.with(TypeDescriptor::of::<C>().runs_before::<A>())
			.unwrap()
			.with(TypeDescriptor::of::<D>().runs_after::<A>())
			.unwrap();

		let Err(OrderError::Cycle { cycle, .. }) = resolver.resolve() else {
			panic!("expected a cycle error");
		};

		assert_eq!(cycle.len(), 3);
		assert!(!cycle.contains(&id::<D>()));
	}

	#[test]
	fn pinned_neighbors_are_pushed_apart() {
		// `A` alone cannot fit strictly between `B` and `C` while both sit at zero, so `C` has to
		// move as well.
		let resolver = OrderResolver::new()
			.with(TypeDescriptor::of::<B>())
			.unwrap()
			.with(TypeDescriptor::of::<C>())
			.unwrap()
			.with(TypeDescriptor::of::<A>().runs_after::<B>().runs_before::<C>())
			.unwrap();

		let index = resolver.resolve().unwrap();
		assert_satisfied(&resolver, &index);
	}

	#[test]
	fn diamonds_resolve() {
		let resolver = OrderResolver::new()
			.with_max_passes(200)
			.with(TypeDescriptor::of::<B>())
			.unwrap()
			.with(TypeDescriptor::of::<C>().runs_after::<B>())
			.unwrap()
			.with(TypeDescriptor::of::<A>().runs_after::<B>().runs_before::<C>())
			.unwrap();

		let index = resolver.resolve().unwrap();
		assert_satisfied(&resolver, &index);
		assert!(index.get_of::<B>() < index.get_of::<A>());
		assert!(index.get_of::<A>() < index.get_of::<C>());
	}

	#[test]
	fn overflowing_bounds_are_contradictory() {
		let resolver = OrderResolver::new()
			.with_max_passes(10)
			.with(TypeDescriptor::of::<B>().with_priority(i32::MAX))
			.unwrap()
			.with(TypeDescriptor::of::<A>().runs_after::<B>())
			.unwrap();

		assert!(matches!(
			resolver.resolve(),
			Err(OrderError::Contradictory(ty)) if ty == id::<A>()
		));
	}

	#[test]
	fn random_acyclic_sets_are_satisfied() {
		struct Tagged<const N: usize>;

		let types = [
			id::<Tagged<0>>(),
			id::<Tagged<1>>(),
			id::<Tagged<2>>(),
			id::<Tagged<3>>(),
			id::<Tagged<4>>(),
			id::<Tagged<5>>(),
			id::<Tagged<6>>(),
			id::<Tagged<7>>(),
		];

		let mut rng = 0x9e37_79b9_u32;
		let mut next = move |bound: u32| {
			rng ^= rng << 13;
			rng ^= rng >> 17;
			rng ^= rng << 5;
			rng % bound
		};

		for _ in 0..200 {
			// A hidden rank per type. Directives only ever point from a lower rank to a higher
			// one, so the set is acyclic.
			let mut rank = (0..types.len()).collect::<Vec<_>>();
			for i in (1..rank.len()).rev() {
				rank.swap(i, next(i as u32 + 1) as usize);
			}

			let mut descriptors = types
				.iter()
				.map(|&ty| TypeDescriptor::new(ty).with_priority(next(7) as i32 - 3))
				.collect::<Vec<_>>();

			for early in 0..types.len() {
				for late in 0..types.len() {
					if rank[early] >= rank[late] || next(3) != 0 {
						continue;
					}

					if next(2) == 0 {
						let desc = descriptors[early].clone();
						descriptors[early] = desc.with_directive(Directive::RunsBefore(types[late]));
					} else {
						let desc = descriptors[late].clone();
						descriptors[late] = desc.with_directive(Directive::RunsAfter(types[early]));
					}
				}
			}

			let mut resolver = OrderResolver::new().with_max_passes(64);
			for at in 0..descriptors.len() {
				// Shuffle declaration order as well.
				let pick = next((descriptors.len() - at) as u32) as usize + at;
				descriptors.swap(at, pick);
				resolver.declare(descriptors[at].clone()).unwrap();
			}

			let index = resolver.resolve().unwrap();
			assert_satisfied(&resolver, &index);
		}
	}

	#[test]
	fn rejects_duplicates() {
		let mut resolver = OrderResolver::new();
		resolver.declare(TypeDescriptor::of::<A>()).unwrap();

		assert!(matches!(
			resolver.declare(TypeDescriptor::of::<A>().with_priority(3)),
			Err(OrderError::DuplicateType(ty)) if ty == id::<A>()
		));
	}

	#[test]
	fn drops_uninteresting_types() {
		let resolver = OrderResolver::new()
			.with(TypeDescriptor::of::<A>())
			.unwrap()
			.with(TypeDescriptor::of::<B>().with_priority(2))
			.unwrap();

		let index = resolver.resolve().unwrap();
		assert!(!index.contains(id::<A>()));
		assert!(index.contains(id::<B>()));
		assert_eq!(index.len(), 1);
	}
}
