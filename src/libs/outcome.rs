use crate::libs::error::Error;

/// Result of a repository operation whose execution errors are absorbed.
///
/// `Empty` means the statement ran but matched nothing; `Failed` carries the
/// error that was already logged. Neither is ever raised to the caller.
#[derive(Debug)]
pub enum Outcome<T> {
    Done(T),
    Empty,
    Failed(Error),
}

impl<T> Outcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Outcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Done(value) => Outcome::Done(f(value)),
            Outcome::Empty => Outcome::Empty,
            Outcome::Failed(e) => Outcome::Failed(e),
        }
    }
}

impl<T> Outcome<Vec<T>> {
    /// The rows, or an empty vector for `Empty` and `Failed`.
    pub fn into_vec(self) -> Vec<T> {
        self.ok().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_failed_are_distinct() {
        let empty: Outcome<Vec<i32>> = Outcome::Empty;
        let failed: Outcome<Vec<i32>> = Outcome::Failed(Error::NotConnected);
        assert!(empty.is_empty() && !empty.is_failed());
        assert!(failed.is_failed() && failed.error().is_some());
        assert!(empty.into_vec().is_empty());
        assert!(failed.into_vec().is_empty());
    }

    #[test]
    fn map_transforms_done_only() {
        assert_eq!(Outcome::Done(2).map(|v| v * 2).ok(), Some(4));
        assert!(Outcome::<i32>::Empty.map(|v| v * 2).is_empty());
    }
}
