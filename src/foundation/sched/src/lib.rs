#![allow(clippy::new_without_default)]

pub mod dispatch;
pub mod order;

pub mod prelude {
	pub use crate::{
		dispatch::{
			behavior::{Behavior, Instance, PhaseCx},
			config::{GcFrequency, SchedulerConfig},
			phase::{Phase, SetupFlags},
			scheduler::{DispatchReport, Scheduler},
			setup::SetupTable,
		},
		order::{
			descriptor::TypeDescriptor,
			index::{ExecutionIndex, TypeNames},
			resolver::{OrderError, OrderResolver},
		},
	};
}
