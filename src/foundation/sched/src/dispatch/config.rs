// === GcFrequency === //

/// How often (in frames) empty buckets are reclaimed.
///
/// The cadence is always a power of two so that it can be checked with a mask against the frame
/// counter.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub struct GcFrequency(Option<u32>);

impl GcFrequency {
	pub const DISABLED: Self = Self(None);
	pub const EVERY_FRAME: Self = Self(Some(1));

	/// Rounds `frames` up to the next power of two. Zero is treated as one and negative values
	/// disable compaction entirely.
	pub fn new(frames: i32) -> Self {
		match u32::try_from(frames) {
			Ok(frames) => Self(Some(
				frames
					.max(1)
					.checked_next_power_of_two()
					.unwrap_or(1 << (u32::BITS - 1)),
			)),
			Err(_) => Self::DISABLED,
		}
	}

	pub fn frames(self) -> Option<u32> {
		self.0
	}

	pub fn is_enabled(self) -> bool {
		self.0.is_some()
	}

	/// Whether `frame` falls on the cadence.
	pub fn is_due(self, frame: u64) -> bool {
		self.0
			.is_some_and(|frames| frame & (u64::from(frames) - 1) == 0)
	}
}

impl Default for GcFrequency {
	fn default() -> Self {
		Self(Some(1 << 10))
	}
}

// === SchedulerConfig === //

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SchedulerConfig {
	pub gc_frequency: GcFrequency,

	/// Hold queued registration changes instead of applying them at the drain point.
	pub block_mutation_queue: bool,

	/// A disabled scheduler ignores every phase entry point.
	pub enabled: bool,
}

impl Default for SchedulerConfig {
	fn default() -> Self {
		Self {
			gc_frequency: GcFrequency::default(),
			block_mutation_queue: false,
			enabled: true,
		}
	}
}

impl SchedulerConfig {
	pub fn with_gc_frequency(mut self, gc_frequency: GcFrequency) -> Self {
		self.gc_frequency = gc_frequency;
		self
	}

	pub fn with_block_mutation_queue(mut self, block: bool) -> Self {
		self.block_mutation_queue = block;
		self
	}

	pub fn with_enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;
		self
	}
}
