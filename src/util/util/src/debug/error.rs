//! Error reporting built off the Rust standard library [Error] trait.

use std::{any::Any, borrow::Cow, error::Error, fmt};

use derive_where::derive_where;

// === Error formatting === //

pub trait ErrorFormatExt: Error {
	fn format_error(&self) -> FormattedError<Self> {
		FormattedError(self)
	}

	fn log(&self) {
		log::error!("{}", self.format_error());
	}

	fn log_warn(&self) {
		log::warn!("{}", self.format_error());
	}
}

impl<T: ?Sized + Error> ErrorFormatExt for T {}

#[derive_where(Copy, Clone)]
pub struct FormattedError<'a, T: ?Sized>(pub &'a T);

impl<T: ?Sized + Error> fmt::Display for FormattedError<'_, T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let target = self.0;

		// Write context
		write!(f, "Error: {}", target)?;

		// Write cause chain
		let mut cause_iter = target.source();
		if cause_iter.is_some() {
			writeln!(f, "\n\nCaused by:")?;
		}

		while let Some(cause) = cause_iter {
			for line in cause.to_string().lines() {
				writeln!(f, "\t{}", line)?;
			}
			cause_iter = cause.source();
		}

		Ok(())
	}
}

// === Result extensions === //

pub trait ResultExt {
	type Success;

	/// Logs the error at `error` level and discards it.
	fn log(self) -> Option<Self::Success>;

	/// Logs the error at `warn` level and discards it.
	fn log_warn(self) -> Option<Self::Success>;
}

impl<T, E: Error> ResultExt for Result<T, E> {
	type Success = T;

	fn log(self) -> Option<T> {
		match self {
			Ok(val) => Some(val),
			Err(err) => {
				err.log();
				None
			}
		}
	}

	fn log_warn(self) -> Option<T> {
		match self {
			Ok(val) => Some(val),
			Err(err) => {
				err.log_warn();
				None
			}
		}
	}
}

// === Anyhow === //

pub type AnyhowErrorBoxed = Box<AnyhowErrorInner>;
pub type AnyhowErrorInner = dyn Error + Send + Sync + 'static;

pub fn format_anyhow(error: &anyhow::Error) -> FormattedError<'_, AnyhowErrorInner> {
	FormattedError(&**error)
}

// === Panics === //

/// Extracts the message from a payload caught by [`std::panic::catch_unwind`].
pub fn panic_message(payload: &(dyn Any + Send)) -> Cow<'_, str> {
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		Cow::Borrowed(*msg)
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		Cow::Borrowed(msg.as_str())
	} else {
		Cow::Borrowed("<non-string panic payload>")
	}
}

#[cfg(test)]
mod test {
	use std::panic;

	use super::*;

	#[derive(Debug)]
	struct Outer(Inner);

	#[derive(Debug)]
	struct Inner;

	impl fmt::Display for Outer {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			f.write_str("outer failed")
		}
	}

	impl Error for Outer {
		fn source(&self) -> Option<&(dyn Error + 'static)> {
			Some(&self.0)
		}
	}

	impl fmt::Display for Inner {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			f.write_str("inner failed")
		}
	}

	impl Error for Inner {}

	#[test]
	fn formats_cause_chain() {
		let formatted = Outer(Inner).format_error().to_string();
		assert!(formatted.starts_with("Error: outer failed"));
		assert!(formatted.contains("Caused by:"));
		assert!(formatted.contains("\tinner failed"));
	}

	#[test]
	fn formats_anyhow_context() {
		let err = anyhow::Error::new(Inner).context("while ticking");
		let formatted = format_anyhow(&err).to_string();
		assert!(formatted.starts_with("Error: while ticking"));
		assert!(formatted.contains("inner failed"));
	}

	#[test]
	fn logged_results_become_options() {
		assert_eq!(Ok::<_, Inner>(3).log_warn(), Some(3));
		assert_eq!(Err::<u32, _>(Outer(Inner)).log(), None);
		assert_eq!(Err::<u32, _>(Inner).log_warn(), None);
	}

	#[test]
	fn extracts_panic_messages() {
		let payload = panic::catch_unwind(|| panic!("boom {}", 42)).unwrap_err();
		assert_eq!(panic_message(&*payload), "boom 42");

		let payload = panic::catch_unwind(|| panic!("static")).unwrap_err();
		assert_eq!(panic_message(&*payload), "static");
	}
}
