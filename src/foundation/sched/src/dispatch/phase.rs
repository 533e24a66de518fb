use bitflags::bitflags;
use cadence_util::mem::c_enum::{c_enum, CEnum};

// === Phase === //

c_enum! {
	/// A point in the frame at which one batch of callbacks fires. Variants are declared in the
	/// order in which a frame runs them.
	pub enum Phase {
		EarlyUpdate,
		PreUpdate,
		Update,
		FixedUpdate,
		LateUpdate,
	}
}

impl Phase {
	pub fn flag(self) -> SetupFlags {
		match self {
			Phase::EarlyUpdate => SetupFlags::EARLY_UPDATE,
			Phase::PreUpdate => SetupFlags::PRE_UPDATE,
			Phase::Update => SetupFlags::UPDATE,
			Phase::FixedUpdate => SetupFlags::FIXED_UPDATE,
			Phase::LateUpdate => SetupFlags::LATE_UPDATE,
		}
	}

	pub fn callback_name(self) -> &'static str {
		match self {
			Phase::EarlyUpdate => "on_early_update",
			Phase::PreUpdate => "on_pre_update",
			Phase::Update => "on_update",
			Phase::FixedUpdate => "on_fixed_update",
			Phase::LateUpdate => "on_late_update",
		}
	}
}

// === SetupFlags === //

bitflags! {
	/// The phases a behavior participates in, plus per-instance dispatch options.
	#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Default)]
	pub struct SetupFlags: u32 {
		const EARLY_UPDATE = 1 << 0;
		const PRE_UPDATE = 1 << 1;
		const UPDATE = 1 << 2;
		const FIXED_UPDATE = 1 << 3;
		const LATE_UPDATE = 1 << 4;

		/// Dispatch to the instance without checking whether it is alive and enabled.
		const NO_SAFETY_CHECKS = 1 << 5;

		const PHASES = Self::EARLY_UPDATE.bits()
			| Self::PRE_UPDATE.bits()
			| Self::UPDATE.bits()
			| Self::FIXED_UPDATE.bits()
			| Self::LATE_UPDATE.bits();
	}
}

impl SetupFlags {
	pub fn has_phase(self, phase: Phase) -> bool {
		self.contains(phase.flag())
	}

	/// The phase-membership part of these flags.
	pub fn phase_mask(self) -> Self {
		self & Self::PHASES
	}

	/// Iterates the phases set in these flags, in frame order.
	pub fn phases(self) -> impl Iterator<Item = Phase> {
		Phase::variants().filter(move |&phase| self.has_phase(phase))
	}
}

impl From<Phase> for SetupFlags {
	fn from(phase: Phase) -> Self {
		phase.flag()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn phases_follow_frame_order() {
		let flags = SetupFlags::LATE_UPDATE | SetupFlags::EARLY_UPDATE | SetupFlags::NO_SAFETY_CHECKS;

		assert_eq!(
			flags.phases().collect::<Vec<_>>(),
			[Phase::EarlyUpdate, Phase::LateUpdate],
		);
		assert_eq!(
			flags.phase_mask(),
			SetupFlags::LATE_UPDATE | SetupFlags::EARLY_UPDATE
		);
	}

	#[test]
	fn every_phase_has_a_distinct_flag() {
		let all = Phase::variants().fold(SetupFlags::empty(), |acc, phase| {
			assert!(!acc.intersects(phase.flag()));
			acc | phase.flag()
		});

		assert_eq!(all, SetupFlags::PHASES);
		assert_eq!(Phase::COUNT, 5);
	}
}
