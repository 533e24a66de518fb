use std::{
	any::Any,
	cell::{Cell, RefCell},
	fmt,
	panic::{catch_unwind, AssertUnwindSafe},
	rc::Rc,
};

use cadence_util::debug::{
	error::{panic_message, AnyhowErrorBoxed},
	type_id::NamedTypeId,
};
use thiserror::Error;

use super::{
	command::CommandQueue,
	phase::{Phase, SetupFlags},
};

// === Behavior === //

/// A type whose instances receive per-frame phase callbacks.
///
/// Every callback defaults to doing nothing. Which callbacks actually get dispatched is decided
/// by [`setup`](Behavior::setup), not by which methods happen to be overridden.
pub trait Behavior: AsAny + 'static {
	/// The phases this behavior participates in and its dispatch options.
	fn setup(&self) -> SetupFlags;

	fn on_early_update(&mut self, cx: &mut PhaseCx<'_>) -> anyhow::Result<()> {
		let _ = cx;
		Ok(())
	}

	fn on_pre_update(&mut self, cx: &mut PhaseCx<'_>) -> anyhow::Result<()> {
		let _ = cx;
		Ok(())
	}

	fn on_update(&mut self, cx: &mut PhaseCx<'_>) -> anyhow::Result<()> {
		let _ = cx;
		Ok(())
	}

	fn on_fixed_update(&mut self, cx: &mut PhaseCx<'_>) -> anyhow::Result<()> {
		let _ = cx;
		Ok(())
	}

	fn on_late_update(&mut self, cx: &mut PhaseCx<'_>) -> anyhow::Result<()> {
		let _ = cx;
		Ok(())
	}
}

/// Downcasting support for boxed behaviors. Implemented for every `'static` type.
pub trait AsAny {
	fn as_any(&self) -> &dyn Any;

	fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}
}

fn run_phase(behavior: &mut dyn Behavior, cx: &mut PhaseCx<'_>) -> anyhow::Result<()> {
	match cx.phase() {
		Phase::EarlyUpdate => behavior.on_early_update(cx),
		Phase::PreUpdate => behavior.on_pre_update(cx),
		Phase::Update => behavior.on_update(cx),
		Phase::FixedUpdate => behavior.on_fixed_update(cx),
		Phase::LateUpdate => behavior.on_late_update(cx),
	}
}

// === PhaseCx === //

/// The context handed to every phase callback.
///
/// Registration changes requested here are queued and only take effect at the next drain point,
/// so the stores being iterated are never mutated mid-dispatch.
pub struct PhaseCx<'a> {
	queue: &'a mut CommandQueue,
	phase: Phase,
	frame: u64,
}

impl<'a> PhaseCx<'a> {
	pub(crate) fn new(queue: &'a mut CommandQueue, phase: Phase, frame: u64) -> Self {
		Self {
			queue,
			phase,
			frame,
		}
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn frame(&self) -> u64 {
		self.frame
	}

	pub fn register(&mut self, instance: &Instance, phases: SetupFlags) {
		self.queue.push_add(instance, phases);
	}

	pub fn register_default(&mut self, instance: &Instance) {
		self.register(instance, instance.phases());
	}

	pub fn unregister(&mut self, instance: &Instance, phases: SetupFlags) {
		self.queue.push_remove(instance, phases);
	}

	pub fn unregister_default(&mut self, instance: &Instance) {
		self.unregister(instance, instance.phases());
	}
}

// === Guarded callbacks === //

thread_local! {
	static GUARD_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Whether the current thread is inside a phase callback whose panics are caught and reported by
/// the scheduler. Panic hooks can use this to stay quiet about panics that are already handled.
pub fn is_in_guarded_callback() -> bool {
	GUARD_DEPTH.with(|depth| depth.get() > 0)
}

fn guarded<R>(f: impl FnOnce() -> R) -> std::thread::Result<R> {
	GUARD_DEPTH.with(|depth| depth.set(depth.get() + 1));
	let result = catch_unwind(AssertUnwindSafe(f));
	GUARD_DEPTH.with(|depth| depth.set(depth.get() - 1));
	result
}

// === Instance === //

#[derive(Debug, Copy, Clone, Error)]
pub enum AccessError {
	#[error("{actual} cannot be accessed as {requested}")]
	WrongType {
		requested: NamedTypeId,
		actual: NamedTypeId,
	},

	#[error("{0} is already borrowed")]
	Borrowed(NamedTypeId),
}

#[derive(Debug, Error)]
pub enum CallbackFault {
	#[error("{ty}::{} failed", phase.callback_name())]
	Failed {
		ty: NamedTypeId,
		phase: Phase,
		#[source]
		error: AnyhowErrorBoxed,
	},

	#[error("{ty}::{} panicked: {message}", phase.callback_name())]
	Panicked {
		ty: NamedTypeId,
		phase: Phase,
		message: String,
	},

	#[error("{ty}::{} was skipped because the behavior is already borrowed", phase.callback_name())]
	Reentrant { ty: NamedTypeId, phase: Phase },
}

/// A shared handle to one live behavior object.
///
/// Handles compare by identity. The host drives the instance's lifecycle through
/// [`destroy`](Self::destroy) and [`set_enabled`](Self::set_enabled); the scheduler only reads
/// that state.
#[derive(Clone)]
pub struct Instance {
	inner: Rc<InstanceInner>,
}

struct InstanceInner {
	ty: NamedTypeId,
	flags: SetupFlags,
	alive: Cell<bool>,
	enabled: Cell<bool>,
	behavior: RefCell<Box<dyn Behavior>>,
}

impl fmt::Debug for Instance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Instance")
			.field("ty", &self.inner.ty)
			.field("flags", &self.inner.flags)
			.field("alive", &self.inner.alive.get())
			.field("enabled", &self.inner.enabled.get())
			.finish_non_exhaustive()
	}
}

impl PartialEq for Instance {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl Eq for Instance {}

impl Instance {
	pub fn new<B: Behavior>(behavior: B) -> Self {
		let flags = behavior.setup();
		Self::with_flags(behavior, flags)
	}

	/// Creates an instance whose flags override the ones its behavior declares.
	pub fn with_flags<B: Behavior>(behavior: B, flags: SetupFlags) -> Self {
		Self {
			inner: Rc::new(InstanceInner {
				ty: NamedTypeId::of::<B>(),
				flags,
				alive: Cell::new(true),
				enabled: Cell::new(true),
				behavior: RefCell::new(Box::new(behavior)),
			}),
		}
	}

	pub fn ty(&self) -> NamedTypeId {
		self.inner.ty
	}

	pub fn flags(&self) -> SetupFlags {
		self.inner.flags
	}

	pub fn phases(&self) -> SetupFlags {
		self.inner.flags.phase_mask()
	}

	/// Whether the host still considers this object alive.
	pub fn is_valid(&self) -> bool {
		self.inner.alive.get()
	}

	pub fn destroy(&self) {
		self.inner.alive.set(false);
	}

	pub fn is_enabled(&self) -> bool {
		self.inner.enabled.get()
	}

	pub fn set_enabled(&self, enabled: bool) {
		self.inner.enabled.set(enabled);
	}

	/// Whether a dispatch pass should invoke this instance's callbacks.
	pub fn is_active(&self) -> bool {
		self.inner.flags.contains(SetupFlags::NO_SAFETY_CHECKS)
			|| (self.inner.alive.get() && self.inner.enabled.get())
	}

	/// Runs `f` on the behavior if it is a `B`. Fails if the behavior has a different type or is
	/// already borrowed, e.g. because it is running a callback right now.
	pub fn with_behavior<B: Behavior, R>(
		&self,
		f: impl FnOnce(&mut B) -> R,
	) -> Result<R, AccessError> {
		let ty = self.inner.ty;
		let mut behavior = self
			.inner
			.behavior
			.try_borrow_mut()
			.map_err(|_| AccessError::Borrowed(ty))?;

		let behavior: &mut dyn Behavior = &mut **behavior;
		let behavior = behavior
			.as_any_mut()
			.downcast_mut::<B>()
			.ok_or(AccessError::WrongType {
				requested: NamedTypeId::of::<B>(),
				actual: ty,
			})?;

		Ok(f(behavior))
	}

	pub(crate) fn invoke(&self, cx: &mut PhaseCx<'_>) -> Result<(), CallbackFault> {
		let ty = self.inner.ty;
		let phase = cx.phase();

		let Ok(mut behavior) = self.inner.behavior.try_borrow_mut() else {
			return Err(CallbackFault::Reentrant { ty, phase });
		};

		match guarded(|| run_phase(&mut **behavior, cx)) {
			Ok(Ok(())) => Ok(()),
			Ok(Err(error)) => Err(CallbackFault::Failed {
				ty,
				phase,
				error: error.into(),
			}),
			Err(payload) => Err(CallbackFault::Panicked {
				ty,
				phase,
				message: panic_message(&*payload).into_owned(),
			}),
		}
	}
}
