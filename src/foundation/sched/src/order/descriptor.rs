use cadence_util::debug::type_id::NamedTypeId;
use smallvec::SmallVec;

// === Directive === //

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum Directive {
	/// The declaring type must run strictly before the target.
	RunsBefore(NamedTypeId),

	/// The declaring type must run strictly after the target.
	RunsAfter(NamedTypeId),
}

impl Directive {
	pub fn target(self) -> NamedTypeId {
		match self {
			Directive::RunsBefore(target) | Directive::RunsAfter(target) => target,
		}
	}
}

// === TypeDescriptor === //

/// The ordering-relevant declaration of a single behavior type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
	ty: NamedTypeId,
	priority: i32,
	directives: SmallVec<[Directive; 2]>,
}

impl TypeDescriptor {
	pub fn new(ty: NamedTypeId) -> Self {
		Self {
			ty,
			priority: 0,
			directives: SmallVec::new(),
		}
	}

	pub fn of<T: ?Sized + 'static>() -> Self {
		Self::new(NamedTypeId::of::<T>())
	}

	pub fn with_priority(mut self, priority: i32) -> Self {
		self.priority = priority;
		self
	}

	pub fn runs_before<T: ?Sized + 'static>(self) -> Self {
		self.with_directive(Directive::RunsBefore(NamedTypeId::of::<T>()))
	}

	pub fn runs_after<T: ?Sized + 'static>(self) -> Self {
		self.with_directive(Directive::RunsAfter(NamedTypeId::of::<T>()))
	}

	pub fn with_directive(mut self, directive: Directive) -> Self {
		self.directives.push(directive);
		self
	}

	pub fn ty(&self) -> NamedTypeId {
		self.ty
	}

	pub fn priority(&self) -> i32 {
		self.priority
	}

	pub fn directives(&self) -> &[Directive] {
		&self.directives
	}

	pub fn has_directives(&self) -> bool {
		!self.directives.is_empty()
	}
}
