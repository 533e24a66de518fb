use std::collections::VecDeque;

use super::{behavior::Instance, phase::SetupFlags};

// === Command === //

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum CommandKind {
	Add,
	Remove,
}

/// A deferred registration change. The phase mask is captured when the command is enqueued so
/// that a removal still knows where to look after the instance has been destroyed.
#[derive(Debug, Clone)]
pub struct Command {
	pub kind: CommandKind,
	pub instance: Instance,
	pub phases: SetupFlags,
}

// === CommandQueue === //

#[derive(Debug, Default)]
pub struct CommandQueue {
	commands: VecDeque<Command>,
}

impl CommandQueue {
	pub const INITIAL_CAPACITY: usize = 256;

	pub fn new() -> Self {
		Self {
			commands: VecDeque::with_capacity(Self::INITIAL_CAPACITY),
		}
	}

	/// Enqueues an addition unless the instance is already invalid. Returns whether a command
	/// was enqueued.
	pub fn push_add(&mut self, instance: &Instance, phases: SetupFlags) -> bool {
		if !instance.is_valid() {
			log::warn!(
				"{} was destroyed but is still being registered for dispatch; ignoring it.",
				instance.ty(),
			);
			return false;
		}

		self.commands.push_back(Command {
			kind: CommandKind::Add,
			instance: instance.clone(),
			phases: phases.phase_mask(),
		});
		true
	}

	pub fn push_remove(&mut self, instance: &Instance, phases: SetupFlags) {
		self.commands.push_back(Command {
			kind: CommandKind::Remove,
			instance: instance.clone(),
			phases: phases.phase_mask(),
		});
	}

	pub fn pop(&mut self) -> Option<Command> {
		self.commands.pop_front()
	}

	pub fn len(&self) -> usize {
		self.commands.len()
	}

	pub fn is_empty(&self) -> bool {
		self.commands.is_empty()
	}
}
