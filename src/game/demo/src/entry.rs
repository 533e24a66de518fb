use std::{cell::RefCell, env, rc::Rc, str::FromStr, sync::Arc};

use anyhow::Context;
use cadence_sched::prelude::*;

use crate::game::{self, actors::FlakySensor, world::World};

// === Settings === //

#[derive(Debug, Copy, Clone)]
struct Settings {
	frames: u64,
	gc_frequency: GcFrequency,
}

impl Settings {
	const DEFAULT_FRAMES: u64 = 120;
	const DEFAULT_GC_FREQUENCY: i32 = 16;

	fn from_env() -> anyhow::Result<Self> {
		Ok(Self {
			frames: env_or("CADENCE_FRAMES", Self::DEFAULT_FRAMES)?,
			gc_frequency: GcFrequency::new(env_or(
				"CADENCE_GC_FREQUENCY",
				Self::DEFAULT_GC_FREQUENCY,
			)?),
		})
	}
}

fn env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
	T: FromStr,
	T::Err: std::error::Error + Send + Sync + 'static,
{
	match env::var(name) {
		Ok(value) => value
			.trim()
			.parse()
			.with_context(|| format!("failed to parse {name}={value:?}")),
		Err(env::VarError::NotPresent) => Ok(default),
		Err(err) => Err(err).with_context(|| format!("failed to read {name}")),
	}
}

// === Entry === //

pub fn main_inner() -> anyhow::Result<()> {
	let settings = Settings::from_env()?;
	log::info!("Running {} frame(s) with {:?}.", settings.frames, settings.gc_frequency);

	// Resolve the execution order
	let order = game::resolve_order().context("failed to resolve the behavior execution order")?;

	for record in order.to_records() {
		log::debug!("{} runs at index {}.", record.type_name, record.index);
	}

	// Create the scheduler and the initial scene
	let mut scheduler = Scheduler::with_config(
		Arc::new(order),
		SchedulerConfig::default().with_gc_frequency(settings.gc_frequency),
	);

	let world = Rc::new(RefCell::new(World::default()));
	let mut setups = SetupTable::new();
	let scene = game::make_scene(&world, &mut setups);

	for instance in &scene {
		scheduler.register_default(instance);
	}

	for record in setups.to_records() {
		log::debug!("{} participates in {:#07b}.", record.type_name, record.flags);
	}

	// Drive the frame loop
	let mut totals = DispatchReport::default();
	for _ in 0..settings.frames {
		totals += scheduler.run_frame();
	}

	let readings = scene
		.iter()
		.find_map(|instance| {
			instance
				.with_behavior(|sensor: &mut FlakySensor| sensor.readings)
				.ok()
		})
		.unwrap_or_default();

	let world = world.borrow();
	log::info!(
		"Finished on frame {}: {} callback(s) ran, {} skipped, {} faulted.",
		scheduler.frame(),
		totals.invoked,
		totals.skipped,
		totals.faulted,
	);
	log::info!(
		"Player ended at {:.2} with the camera at {:.2}; {} particle(s) spawned, {} still alive.",
		world.player_pos,
		world.camera_pos,
		world.particles_spawned,
		world.particles_alive,
	);
	log::info!("The sensor produced {readings} reading(s).");

	Ok(())
}
