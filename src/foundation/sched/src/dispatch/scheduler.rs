use std::{ops::AddAssign, sync::Arc};

use cadence_util::{
	debug::error::{ErrorFormatExt, ResultExt},
	mem::c_enum::CEnumMap,
};

use crate::order::index::ExecutionIndex;

use super::{
	behavior::{Instance, PhaseCx},
	bucket::BucketStore,
	command::{Command, CommandKind, CommandQueue},
	config::{GcFrequency, SchedulerConfig},
	phase::{Phase, SetupFlags},
};

// === DispatchReport === //

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DispatchReport {
	/// Callbacks that ran to completion.
	pub invoked: usize,

	/// Instances that were not active and so were not called.
	pub skipped: usize,

	/// Callbacks that returned an error, panicked, or could not be borrowed.
	pub faulted: usize,
}

impl AddAssign for DispatchReport {
	fn add_assign(&mut self, rhs: Self) {
		self.invoked += rhs.invoked;
		self.skipped += rhs.skipped;
		self.faulted += rhs.faulted;
	}
}

// === Scheduler === //

/// Dispatches phase callbacks to every registered instance in execution order.
///
/// Registration changes are queued and applied in one place: the start of
/// [`on_early_update`](Self::on_early_update). The host must call the five phase entry points
/// once per frame, in [`Phase`] order.
#[derive(Debug)]
pub struct Scheduler {
	order: Arc<ExecutionIndex>,
	stores: CEnumMap<Phase, BucketStore<Instance>>,
	queue: CommandQueue,
	config: SchedulerConfig,
	frame: u64,

	/// Set by any removal, cleared by compaction. Lets compaction skip frames with nothing to do.
	may_need_gc: bool,
}

impl Scheduler {
	pub fn new(order: Arc<ExecutionIndex>) -> Self {
		Self::with_config(order, SchedulerConfig::default())
	}

	pub fn with_config(order: Arc<ExecutionIndex>, config: SchedulerConfig) -> Self {
		Self {
			order,
			stores: CEnumMap::default(),
			queue: CommandQueue::new(),
			config,
			frame: 0,
			may_need_gc: false,
		}
	}

	// === Configuration === //

	pub fn config(&self) -> &SchedulerConfig {
		&self.config
	}

	pub fn is_enabled(&self) -> bool {
		self.config.enabled
	}

	pub fn set_enabled(&mut self, enabled: bool) {
		self.config.enabled = enabled;
	}

	pub fn set_gc_frequency(&mut self, gc_frequency: GcFrequency) {
		self.config.gc_frequency = gc_frequency;
	}

	pub fn set_block_mutation_queue(&mut self, block: bool) {
		self.config.block_mutation_queue = block;
	}

	pub fn order(&self) -> &ExecutionIndex {
		&self.order
	}

	/// The number of frames run since creation. The first frame is frame `1`.
	pub fn frame(&self) -> u64 {
		self.frame
	}

	// === Registration === //

	/// Queues `instance` for dispatch in `phases`. Returns `false` without queueing anything if the
	/// instance has already been destroyed.
	pub fn register(&mut self, instance: &Instance, phases: SetupFlags) -> bool {
		self.queue.push_add(instance, phases)
	}

	pub fn register_default(&mut self, instance: &Instance) -> bool {
		self.register(instance, instance.phases())
	}

	/// Queues the removal of `instance` from `phases`. This is queued even if the instance has
	/// already been destroyed.
	pub fn unregister(&mut self, instance: &Instance, phases: SetupFlags) {
		self.queue.push_remove(instance, phases);
	}

	pub fn unregister_default(&mut self, instance: &Instance) {
		self.unregister(instance, instance.phases());
	}

	/// Whether `instance` is currently in any phase's store. Queued commands are not considered.
	pub fn is_registered(&self, instance: &Instance) -> bool {
		self.stores
			.values()
			.any(|store| store.contains(instance.ty(), instance))
	}

	pub fn pending_commands(&self) -> usize {
		self.queue.len()
	}

	pub fn store(&self, phase: Phase) -> &BucketStore<Instance> {
		&self.stores[phase]
	}

	// === Phase entry points === //

	pub fn on_early_update(&mut self) -> DispatchReport {
		if !self.config.enabled {
			return DispatchReport::default();
		}

		self.frame += 1;

		if !self.config.block_mutation_queue {
			self.drain_commands();
		}

		if self.may_need_gc && self.config.gc_frequency.is_due(self.frame) {
			self.clear_unused_slots();
		}

		self.dispatch(Phase::EarlyUpdate)
	}

	pub fn on_pre_update(&mut self) -> DispatchReport {
		self.dispatch_if_enabled(Phase::PreUpdate)
	}

	pub fn on_update(&mut self) -> DispatchReport {
		self.dispatch_if_enabled(Phase::Update)
	}

	pub fn on_fixed_update(&mut self) -> DispatchReport {
		self.dispatch_if_enabled(Phase::FixedUpdate)
	}

	pub fn on_late_update(&mut self) -> DispatchReport {
		self.dispatch_if_enabled(Phase::LateUpdate)
	}

	/// Runs every phase entry point once, in frame order.
	pub fn run_frame(&mut self) -> DispatchReport {
		let mut report = self.on_early_update();
		report += self.on_pre_update();
		report += self.on_update();
		report += self.on_fixed_update();
		report += self.on_late_update();
		report
	}

	/// Reclaims every empty bucket in every phase right away. Returns the number of buckets
	/// removed.
	pub fn clear_unused_slots(&mut self) -> usize {
		let reclaimed = self
			.stores
			.values_mut()
			.map(BucketStore::clear_unused_slots)
			.sum();

		self.may_need_gc = false;

		log::debug!(
			"Reclaimed {reclaimed} empty bucket(s) on frame {}.",
			self.frame
		);

		reclaimed
	}

	// === Internals === //

	fn drain_commands(&mut self) {
		while let Some(Command {
			kind,
			instance,
			phases,
		}) = self.queue.pop()
		{
			log::trace!("Applying {kind:?} of {} in {phases:?}.", instance.ty());

			match kind {
				CommandKind::Add => {
					if !instance.is_valid() {
						log::debug!(
							"{} was destroyed before its registration was applied; dropping it.",
							instance.ty(),
						);
						continue;
					}

					for phase in phases.phases() {
						self.stores[phase].add(instance.ty(), instance.clone(), &self.order);
					}
				}
				CommandKind::Remove => {
					for phase in phases.phases() {
						self.stores[phase]
							.remove(instance.ty(), &instance)
							.log_warn();
					}

					self.may_need_gc = true;
				}
			}
		}
	}

	fn dispatch_if_enabled(&mut self, phase: Phase) -> DispatchReport {
		if !self.config.enabled {
			return DispatchReport::default();
		}

		self.dispatch(phase)
	}

	fn dispatch(&mut self, phase: Phase) -> DispatchReport {
		let mut report = DispatchReport::default();

		// Stores are only borrowed immutably here; callbacks reach the queue through `cx`.
		let store = &self.stores[phase];
		let mut cx = PhaseCx::new(&mut self.queue, phase, self.frame);

		for instance in store.iter() {
			if !instance.is_active() {
				report.skipped += 1;
				continue;
			}

			match instance.invoke(&mut cx) {
				Ok(()) => report.invoked += 1,
				Err(fault) => {
					fault.log();
					report.faulted += 1;
				}
			}
		}

		report
	}
}
