use std::{cell::RefCell, rc::Rc};

use anyhow::Context;
use cadence_sched::prelude::*;

use super::world::World;

pub type WorldRef = Rc<RefCell<World>>;

// === InputSampler === //

/// Alternates between pushing right and pushing left every `half_period` frames.
pub struct InputSampler {
	pub world: WorldRef,
	pub half_period: u64,
}

impl Behavior for InputSampler {
	fn setup(&self) -> SetupFlags {
		SetupFlags::EARLY_UPDATE
	}

	fn on_early_update(&mut self, cx: &mut PhaseCx<'_>) -> anyhow::Result<()> {
		let forward = (cx.frame() / self.half_period.max(1)) % 2 == 0;
		self.world.borrow_mut().input = if forward { 1.0 } else { -1.0 };
		Ok(())
	}
}

// === FlakySensor === //

/// Fails every `fail_every` frames. Its faults are reported without disturbing anything else.
pub struct FlakySensor {
	pub fail_every: u64,
	pub readings: u64,
}

impl Behavior for FlakySensor {
	fn setup(&self) -> SetupFlags {
		SetupFlags::PRE_UPDATE
	}

	fn on_pre_update(&mut self, cx: &mut PhaseCx<'_>) -> anyhow::Result<()> {
		if cx.frame() % self.fail_every.max(1) == 0 {
			return Err(anyhow::anyhow!("no reply after {} reading(s)", self.readings))
				.context("sensor timed out");
		}

		self.readings += 1;
		Ok(())
	}
}

// === PlayerController === //

pub struct PlayerController {
	pub world: WorldRef,
	pub speed: f32,
}

impl PlayerController {
	pub const FIXED_DT: f32 = 1.0 / 60.0;
}

impl Behavior for PlayerController {
	fn setup(&self) -> SetupFlags {
		SetupFlags::UPDATE | SetupFlags::FIXED_UPDATE
	}

	fn on_update(&mut self, _cx: &mut PhaseCx<'_>) -> anyhow::Result<()> {
		let mut world = self.world.borrow_mut();
		world.player_vel = world.input * self.speed;
		Ok(())
	}

	fn on_fixed_update(&mut self, _cx: &mut PhaseCx<'_>) -> anyhow::Result<()> {
		let mut world = self.world.borrow_mut();
		world.player_pos += world.player_vel * Self::FIXED_DT;
		Ok(())
	}
}

// === Particles === //

pub struct Particle {
	pub age: u32,
}

impl Behavior for Particle {
	fn setup(&self) -> SetupFlags {
		SetupFlags::UPDATE
	}

	fn on_update(&mut self, _cx: &mut PhaseCx<'_>) -> anyhow::Result<()> {
		self.age += 1;
		Ok(())
	}
}

/// Spawns a particle every `interval` frames and retires each one `lifetime` frames later.
pub struct ParticleEmitter {
	pub world: WorldRef,
	pub interval: u64,
	pub lifetime: u64,
	pub live: Vec<(Instance, u64)>,
}

impl Behavior for ParticleEmitter {
	fn setup(&self) -> SetupFlags {
		SetupFlags::UPDATE
	}

	fn on_update(&mut self, cx: &mut PhaseCx<'_>) -> anyhow::Result<()> {
		let frame = cx.frame();

		self.live.retain(|(particle, expires_at)| {
			if *expires_at > frame {
				return true;
			}

			particle.destroy();
			cx.unregister_default(particle);
			false
		});

		if frame % self.interval.max(1) == 0 {
			let particle = Instance::new(Particle { age: 0 });
			cx.register_default(&particle);
			self.live.push((particle, frame + self.lifetime));
			self.world.borrow_mut().particles_spawned += 1;
		}

		self.world.borrow_mut().particles_alive = self.live.len() as u32;
		Ok(())
	}
}

// === CameraFollow === //

pub struct CameraFollow {
	pub world: WorldRef,
	pub stiffness: f32,
}

impl Behavior for CameraFollow {
	fn setup(&self) -> SetupFlags {
		SetupFlags::LATE_UPDATE
	}

	fn on_late_update(&mut self, _cx: &mut PhaseCx<'_>) -> anyhow::Result<()> {
		let mut world = self.world.borrow_mut();
		world.camera_pos += (world.player_pos - world.camera_pos) * self.stiffness;
		Ok(())
	}
}
