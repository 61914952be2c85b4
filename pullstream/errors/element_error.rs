use std::{error::Error, fmt, panic::Location};

use colored::Colorize;

/// A plain message used as the source when an [`ElementError`] is built from a string
/// rather than from an existing [`Error`].
#[derive(Debug)]
struct MessageErr(String);

impl fmt::Display for MessageErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for MessageErr {}

/// An error raised while pulling a single element through a pipeline: a `func`/`predicate`/`when`
/// failure, or an error surfaced from a source iterator. Captures the call site it was created at
/// (mirroring how panics report their origin) so `Catch` failures are still
/// traceable once swallowed, and supports downcasting so `catch` can match on concrete error types.
pub struct ElementError {
    inner: Box<dyn Error + Send + Sync + 'static>,
    location: &'static Location<'static>,
}

impl ElementError {
    /// Wrap an existing error, capturing the caller's location.
    #[track_caller]
    pub fn new<E: Error + Send + Sync + 'static>(err: E) -> Self {
        ElementError {
            inner: Box::new(err),
            location: Location::caller(),
        }
    }

    /// Build an error from a plain message, capturing the caller's location.
    #[track_caller]
    pub fn from_message<S: Into<String>>(message: S) -> Self {
        ElementError::new(MessageErr(message.into()))
    }

    /// The location the error was created at.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Whether the wrapped error is of concrete type `E`.
    pub fn is<E: Error + 'static>(&self) -> bool {
        self.inner.downcast_ref::<E>().is_some()
    }

    /// Downcast the wrapped error to concrete type `E`.
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// Render with the location on one line and the message on the next, optionally colorized.
    pub fn fmt_as_str(&self, colored: bool) -> String {
        let loc = format!("{}", self.location);
        format!(
            "{}\n{}",
            if colored {
                loc.yellow().to_string()
            } else {
                loc
            },
            if colored {
                self.inner.to_string().red().to_string()
            } else {
                self.inner.to_string()
            }
        )
    }
}

impl fmt::Display for ElementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fmt_as_str(true))
    }
}

impl fmt::Debug for ElementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fmt_as_str(true))
    }
}

impl Error for ElementError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

/// Any ordinary error can become an [`ElementError`] at the point a `func`/predicate propagates
/// it with `?`.
impl<E: Error + Send + Sync + 'static> From<E> for ElementError {
    #[track_caller]
    fn from(err: E) -> Self {
        ElementError::new(err)
    }
}
