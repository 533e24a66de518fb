use cadence_sched::prelude::*;

use self::actors::{
	CameraFollow, FlakySensor, InputSampler, Particle, ParticleEmitter, PlayerController,
	WorldRef,
};

pub mod actors;
pub mod world;

pub fn resolve_order() -> Result<ExecutionIndex, OrderError> {
	OrderResolver::new()
		.with(TypeDescriptor::of::<InputSampler>().with_priority(-100))?
		.with(TypeDescriptor::of::<FlakySensor>())?
		.with(TypeDescriptor::of::<PlayerController>().runs_after::<InputSampler>())?
		.with(TypeDescriptor::of::<ParticleEmitter>().runs_before::<Particle>())?
		.with(TypeDescriptor::of::<Particle>().runs_after::<PlayerController>())?
		.with(TypeDescriptor::of::<CameraFollow>().runs_after::<PlayerController>())?
		.resolve()
}

pub fn make_scene(world: &WorldRef, setups: &mut SetupTable) -> Vec<Instance> {
	vec![
		setups.instantiate(CameraFollow {
			world: world.clone(),
			stiffness: 0.2,
		}),
		setups.instantiate(ParticleEmitter {
			world: world.clone(),
			interval: 4,
			lifetime: 10,
			live: Vec::new(),
		}),
		setups.instantiate(PlayerController {
			world: world.clone(),
			speed: 3.0,
		}),
		setups.instantiate(FlakySensor {
			fail_every: 45,
			readings: 0,
		}),
		setups.instantiate(InputSampler {
			world: world.clone(),
			half_period: 30,
		}),
	]
}
