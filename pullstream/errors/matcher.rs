use std::error::Error;

use super::element_error::ElementError;

/// A single concrete error type to match against, built with [`ErrorMatcher::of`].
pub struct ErrorMatcher {
    matches: Box<dyn Fn(&ElementError) -> bool + Send + Sync>,
}

impl ErrorMatcher {
    /// Match [`ElementError`]s whose wrapped error downcasts to `E`.
    pub fn of<E: Error + 'static>() -> Self {
        ErrorMatcher {
            matches: Box::new(|err| err.is::<E>()),
        }
    }

    fn matches(&self, err: &ElementError) -> bool {
        (self.matches)(err)
    }
}

/// The set of error types a `Catch` node is willing to consider suppressing.
pub enum ErrorClasses {
    /// Match every [`ElementError`].
    All,
    /// Match only errors whose concrete type is one of these.
    OneOf(Vec<ErrorMatcher>),
}

impl ErrorClasses {
    /// Whether `err`'s concrete type is one of the configured classes.
    pub fn matches(&self, err: &ElementError) -> bool {
        match self {
            ErrorClasses::All => true,
            ErrorClasses::OneOf(matchers) => matchers.iter().any(|m| m.matches(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use rstest::*;

    use super::*;

    #[derive(Debug)]
    struct FooErr;
    impl fmt::Display for FooErr {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "foo")
        }
    }
    impl Error for FooErr {}

    #[derive(Debug)]
    struct BarErr;
    impl fmt::Display for BarErr {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "bar")
        }
    }
    impl Error for BarErr {}

    #[rstest]
    fn test_all_matches_everything() {
        assert!(ErrorClasses::All.matches(&ElementError::new(FooErr)));
    }

    #[rstest]
    fn test_one_of_matches_only_listed_types() {
        let classes = ErrorClasses::OneOf(vec![ErrorMatcher::of::<FooErr>()]);
        assert!(classes.matches(&ElementError::new(FooErr)));
        assert!(!classes.matches(&ElementError::new(BarErr)));
    }
}
