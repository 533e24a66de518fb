/// State shared by every demo behavior.
#[derive(Debug, Clone, Default)]
pub struct World {
	/// Horizontal input in `[-1, 1]`, sampled at the start of every frame.
	pub input: f32,
	pub player_vel: f32,
	pub player_pos: f32,
	pub camera_pos: f32,
	pub particles_spawned: u32,
	pub particles_alive: u32,
}
