//! Assertion capability
//!
//! A fresh [`Assert`] is handed to every test body and hook. Each predicate
//! returns `Ok(&Assert)` when it holds, so checks chain with `?`:
//!
//! ```
//! use proctor::{Assert, AssertionFailure};
//!
//! fn check(a: &Assert) -> Result<(), AssertionFailure> {
//!     a.are_equal(3, 1 + 2)?.is_between(5, 1, 10)?;
//!     Ok(())
//! }
//!
//! assert!(check(&Assert::new()).is_ok());
//! ```
//!
//! A failing predicate returns an [`AssertionFailure`] whose message reads
//!
//! ```text
//! Test assertion failed
//! Expected:	3
//! But was:	4
//! ```

use crate::error::AssertionFailure;
use crate::state::State;
use regex::Regex;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::Debug;

/// Result of a predicate, `Ok` carries the `Assert` back for chaining
pub type AssertResult<'a> = Result<&'a Assert, AssertionFailure>;

const DEFAULT_MESSAGE: &str = "Test assertion failed";

/// Comparison predicates raising structured failures
#[derive(Debug, Clone, Default)]
pub struct Assert {
    message: Option<String>,
}

impl Assert {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same predicates, reporting `message` instead of the default header
    pub fn because(&self, message: impl Into<String>) -> Assert {
        Assert {
            message: Some(message.into()),
        }
    }

    // ------------------------------------------------------------------
    // Explicit markers
    // ------------------------------------------------------------------

    /// Mark the test as failed
    pub fn fail(&self, message: &str) -> AssertResult<'_> {
        Err(self.marker(message, "Test marked as failure", State::Failure))
    }

    /// Mark the test as passed, ending it early
    pub fn pass(&self, message: &str) -> AssertResult<'_> {
        Err(self.marker(message, "Test marked as passed", State::Success))
    }

    /// Mark the test as inconclusive
    pub fn inconclusive(&self, message: &str) -> AssertResult<'_> {
        Err(self.marker(message, "Test marked as inconclusive", State::Inconclusive))
    }

    // ------------------------------------------------------------------
    // Equality
    // ------------------------------------------------------------------

    pub fn are_equal<T: PartialEq + Debug>(&self, expected: T, actual: T) -> AssertResult<'_> {
        self.ensure(expected == actual, "", || (show(&expected), show(&actual)))
    }

    pub fn are_not_equal<T: PartialEq + Debug>(&self, expected: T, actual: T) -> AssertResult<'_> {
        self.ensure(expected != actual, "Not ", || (show(&expected), show(&actual)))
    }

    pub fn are_sequences_equal<T: PartialEq + Debug>(
        &self,
        expected: &[T],
        actual: &[T],
    ) -> AssertResult<'_> {
        self.ensure(expected == actual, "", || {
            (join_items(expected), join_items(actual))
        })
    }

    pub fn are_sequences_not_equal<T: PartialEq + Debug>(
        &self,
        expected: &[T],
        actual: &[T],
    ) -> AssertResult<'_> {
        self.ensure(expected != actual, "Not ", || {
            (join_items(expected), join_items(actual))
        })
    }

    // ------------------------------------------------------------------
    // Types and nullness
    // ------------------------------------------------------------------

    pub fn is_instance_of<T: Any>(&self, value: &dyn Any) -> AssertResult<'_> {
        self.ensure(value.is::<T>(), "Instance of ", || {
            (std::any::type_name::<T>().to_string(), "another type".to_string())
        })
    }

    pub fn is_not_instance_of<T: Any>(&self, value: &dyn Any) -> AssertResult<'_> {
        self.ensure(!value.is::<T>(), "Not instance of ", || {
            let name = std::any::type_name::<T>().to_string();
            (name.clone(), name)
        })
    }

    pub fn is_none<T: Debug>(&self, value: &Option<T>) -> AssertResult<'_> {
        self.ensure(value.is_none(), "", || ("None".to_string(), show(value)))
    }

    pub fn is_some<T: Debug>(&self, value: &Option<T>) -> AssertResult<'_> {
        self.ensure(value.is_some(), "Not ", || ("None".to_string(), show(value)))
    }

    pub fn is_zero<T: Default + PartialEq + Debug>(&self, value: T) -> AssertResult<'_> {
        let zero = T::default();
        self.ensure(value == zero, "", || (show(&zero), show(&value)))
    }

    pub fn is_not_zero<T: Default + PartialEq + Debug>(&self, value: T) -> AssertResult<'_> {
        let zero = T::default();
        self.ensure(value != zero, "Not ", || (show(&zero), show(&value)))
    }

    pub fn is_empty<C: Emptiness + Debug + ?Sized>(&self, value: &C) -> AssertResult<'_> {
        self.ensure(value.is_empty_value(), "Empty: ", || {
            (value.kind().to_string(), show(value))
        })
    }

    pub fn is_not_empty<C: Emptiness + Debug + ?Sized>(&self, value: &C) -> AssertResult<'_> {
        self.ensure(!value.is_empty_value(), "Non-empty: ", || {
            (value.kind().to_string(), show(value))
        })
    }

    // ------------------------------------------------------------------
    // Ordering
    // ------------------------------------------------------------------

    pub fn is_greater_than<T: PartialOrd + Debug>(&self, value: T, bound: T) -> AssertResult<'_> {
        self.ensure(value > bound, "Greater than ", || (show(&bound), show(&value)))
    }

    pub fn is_not_greater_than<T: PartialOrd + Debug>(
        &self,
        value: T,
        bound: T,
    ) -> AssertResult<'_> {
        self.ensure(value <= bound, "Not greater than ", || {
            (show(&bound), show(&value))
        })
    }

    pub fn is_greater_than_or_equal<T: PartialOrd + Debug>(
        &self,
        value: T,
        bound: T,
    ) -> AssertResult<'_> {
        self.ensure(value >= bound, "Greater than or equal to ", || {
            (show(&bound), show(&value))
        })
    }

    pub fn is_not_greater_than_or_equal<T: PartialOrd + Debug>(
        &self,
        value: T,
        bound: T,
    ) -> AssertResult<'_> {
        self.ensure(value < bound, "Not greater than or equal to ", || {
            (show(&bound), show(&value))
        })
    }

    pub fn is_less_than<T: PartialOrd + Debug>(&self, value: T, bound: T) -> AssertResult<'_> {
        self.ensure(value < bound, "Less than ", || (show(&bound), show(&value)))
    }

    pub fn is_not_less_than<T: PartialOrd + Debug>(&self, value: T, bound: T) -> AssertResult<'_> {
        self.ensure(value >= bound, "Not less than ", || (show(&bound), show(&value)))
    }

    pub fn is_less_than_or_equal<T: PartialOrd + Debug>(
        &self,
        value: T,
        bound: T,
    ) -> AssertResult<'_> {
        self.ensure(value <= bound, "Less than or equal to ", || {
            (show(&bound), show(&value))
        })
    }

    pub fn is_not_less_than_or_equal<T: PartialOrd + Debug>(
        &self,
        value: T,
        bound: T,
    ) -> AssertResult<'_> {
        self.ensure(value > bound, "Not less than or equal to ", || {
            (show(&bound), show(&value))
        })
    }

    /// Inclusive range check
    pub fn is_between<T: PartialOrd + Debug>(&self, value: T, lower: T, upper: T) -> AssertResult<'_> {
        self.ensure(value >= lower && value <= upper, "Between: ", || {
            (format!("{:?} and {:?}", lower, upper), show(&value))
        })
    }

    pub fn is_not_between<T: PartialOrd + Debug>(
        &self,
        value: T,
        lower: T,
        upper: T,
    ) -> AssertResult<'_> {
        self.ensure(value < lower || value > upper, "Not between: ", || {
            (format!("{:?} and {:?}", lower, upper), show(&value))
        })
    }

    // ------------------------------------------------------------------
    // Strings and membership
    // ------------------------------------------------------------------

    pub fn starts_with(&self, value: &str, prefix: &str) -> AssertResult<'_> {
        self.ensure(value.starts_with(prefix), "Starts with: ", || {
            (prefix.to_string(), value.to_string())
        })
    }

    pub fn does_not_start_with(&self, value: &str, prefix: &str) -> AssertResult<'_> {
        self.ensure(!value.starts_with(prefix), "Does not start with: ", || {
            (prefix.to_string(), value.to_string())
        })
    }

    pub fn ends_with(&self, value: &str, suffix: &str) -> AssertResult<'_> {
        self.ensure(value.ends_with(suffix), "Ends with: ", || {
            (suffix.to_string(), value.to_string())
        })
    }

    pub fn does_not_end_with(&self, value: &str, suffix: &str) -> AssertResult<'_> {
        self.ensure(!value.ends_with(suffix), "Does not end with: ", || {
            (suffix.to_string(), value.to_string())
        })
    }

    pub fn is_match(&self, value: &str, pattern: &str) -> AssertResult<'_> {
        let regex = self.compile(pattern)?;
        self.ensure(regex.is_match(value), "Matches: ", || {
            (pattern.to_string(), value.to_string())
        })
    }

    pub fn is_not_match(&self, value: &str, pattern: &str) -> AssertResult<'_> {
        let regex = self.compile(pattern)?;
        self.ensure(!regex.is_match(value), "Does not match: ", || {
            (pattern.to_string(), value.to_string())
        })
    }

    /// Substring check
    pub fn contains(&self, value: &str, needle: &str) -> AssertResult<'_> {
        self.ensure(value.contains(needle), "Contains: ", || {
            (needle.to_string(), value.to_string())
        })
    }

    pub fn does_not_contain(&self, value: &str, needle: &str) -> AssertResult<'_> {
        self.ensure(!value.contains(needle), "Does not contain: ", || {
            (needle.to_string(), value.to_string())
        })
    }

    /// Slice membership check
    pub fn contains_item<T: PartialEq + Debug>(&self, items: &[T], item: &T) -> AssertResult<'_> {
        self.ensure(items.contains(item), "Contains: ", || {
            (show(item), join_items(items))
        })
    }

    pub fn does_not_contain_item<T: PartialEq + Debug>(
        &self,
        items: &[T],
        item: &T,
    ) -> AssertResult<'_> {
        self.ensure(!items.contains(item), "Does not contain: ", || {
            (show(item), join_items(items))
        })
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn ensure<F>(&self, holds: bool, prefix: &str, describe: F) -> AssertResult<'_>
    where
        F: FnOnce() -> (String, String),
    {
        if holds {
            return Ok(self);
        }

        let (expected, actual) = describe();
        let header = self.message.as_deref().unwrap_or(DEFAULT_MESSAGE);
        let padding = " ".repeat(prefix.chars().count());
        Err(AssertionFailure::new(
            format!(
                "{}\nExpected:\t{}{}\nBut was:\t{}{}",
                header, prefix, expected, padding, actual
            ),
            State::Failure,
        ))
    }

    fn marker(&self, message: &str, fallback: &str, state: State) -> AssertionFailure {
        let message = if message.trim().is_empty() {
            self.message.as_deref().unwrap_or(fallback)
        } else {
            message
        };
        AssertionFailure::new(message, state)
    }

    fn compile(&self, pattern: &str) -> Result<Regex, AssertionFailure> {
        Regex::new(pattern).map_err(|e| {
            let header = self.message.as_deref().unwrap_or(DEFAULT_MESSAGE);
            AssertionFailure::new(
                format!("{}\nInvalid pattern '{}': {}", header, pattern, e),
                State::Failure,
            )
        })
    }
}

fn show<T: Debug + ?Sized>(value: &T) -> String {
    format!("{:?}", value)
}

fn join_items<T: Debug>(items: &[T]) -> String {
    items.iter().map(show).collect::<Vec<_>>().join(", ")
}

/// Values that can be checked for emptiness
pub trait Emptiness {
    fn is_empty_value(&self) -> bool;

    /// Short label used in failure messages
    fn kind(&self) -> &'static str;
}

impl Emptiness for str {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn kind(&self) -> &'static str {
        "string"
    }
}

impl Emptiness for String {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn kind(&self) -> &'static str {
        "string"
    }
}

impl<T> Emptiness for [T] {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn kind(&self) -> &'static str {
        "slice"
    }
}

impl<T> Emptiness for Vec<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn kind(&self) -> &'static str {
        "vec"
    }
}

impl<T> Emptiness for Option<T> {
    fn is_empty_value(&self) -> bool {
        self.is_none()
    }

    fn kind(&self) -> &'static str {
        "option"
    }
}

impl<K, V, S> Emptiness for HashMap<K, V, S> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn kind(&self) -> &'static str {
        "map"
    }
}

impl<T, S> Emptiness for HashSet<T, S> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn kind(&self) -> &'static str {
        "set"
    }
}

impl<K, V> Emptiness for BTreeMap<K, V> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn kind(&self) -> &'static str {
        "map"
    }
}

impl<T> Emptiness for BTreeSet<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn kind(&self) -> &'static str {
        "set"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_equal_passes_and_chains() {
        let a = Assert::new();
        assert!(a.are_equal(1, 1).and_then(|a| a.are_not_equal("x", "y")).is_ok());
    }

    #[test]
    fn test_equal_failure_message() {
        let err = Assert::new().are_equal(3, 4).unwrap_err();
        assert_eq!(err.message(), "Test assertion failed\nExpected:\t3\nBut was:\t4");
        assert_eq!(err.state(), State::Failure);
    }

    #[test]
    fn test_prefix_pads_actual_line() {
        let err = Assert::new().are_not_equal(2, 2).unwrap_err();
        assert_eq!(err.message(), "Test assertion failed\nExpected:\tNot 2\nBut was:\t    2");
    }

    #[test]
    fn test_because_replaces_header() {
        let err = Assert::new()
            .because("totals differ")
            .are_equal(10, 11)
            .unwrap_err();
        assert!(err.message().starts_with("totals differ\n"));
    }

    #[test]
    fn test_markers_carry_state() {
        let a = Assert::new();
        assert_eq!(a.fail("").unwrap_err().state(), State::Failure);
        assert_eq!(a.pass("done early").unwrap_err().state(), State::Success);
        assert_eq!(a.inconclusive("").unwrap_err().state(), State::Inconclusive);
        assert_eq!(a.fail("").unwrap_err().message(), "Test marked as failure");
        assert_eq!(a.pass("done early").unwrap_err().message(), "done early");
    }

    #[test]
    fn test_sequences() {
        let a = Assert::new();
        assert!(a.are_sequences_equal(&[1, 2], &[1, 2]).is_ok());
        assert!(a.are_sequences_not_equal(&[1, 2], &[1, 2, 3]).is_ok());

        let err = a.are_sequences_equal(&[1, 2], &[2, 1]).unwrap_err();
        assert!(err.message().contains("Expected:\t1, 2"));
        assert!(err.message().contains("But was:\t2, 1"));
    }

    #[test]
    fn test_instance_of() {
        let a = Assert::new();
        let value: Box<dyn Any> = Box::new(5_u32);
        assert!(a.is_instance_of::<u32>(value.as_ref()).is_ok());
        assert!(a.is_instance_of::<String>(value.as_ref()).is_err());
        assert!(a.is_not_instance_of::<String>(value.as_ref()).is_ok());
    }

    #[test]
    fn test_nullness_and_zero() {
        let a = Assert::new();
        assert!(a.is_none::<i32>(&None).is_ok());
        assert!(a.is_some(&Some(1)).is_ok());
        assert!(a.is_none(&Some(1)).is_err());
        assert!(a.is_zero(0.0_f64).is_ok());
        assert!(a.is_not_zero(3_i64).is_ok());
        assert!(a.is_zero(1_u8).is_err());
    }

    #[test]
    fn test_emptiness() {
        let a = Assert::new();
        assert!(a.is_empty("").is_ok());
        assert!(a.is_empty(&Vec::<i32>::new()).is_ok());
        assert!(a.is_not_empty(&vec![1]).is_ok());
        let err = a.is_empty("abc").unwrap_err();
        assert!(err.message().contains("Expected:\tEmpty: string"));
    }

    #[test]
    fn test_ordering() {
        let a = Assert::new();
        assert!(a.is_greater_than(5, 3).is_ok());
        assert!(a.is_greater_than(3, 3).is_err());
        assert!(a.is_greater_than_or_equal(3, 3).is_ok());
        assert!(a.is_not_greater_than(3, 3).is_ok());
        assert!(a.is_not_greater_than_or_equal(2, 3).is_ok());
        assert!(a.is_less_than(1, 2).is_ok());
        assert!(a.is_not_less_than(2, 2).is_ok());
        assert!(a.is_less_than_or_equal(2, 2).is_ok());
        assert!(a.is_not_less_than_or_equal(3, 2).is_ok());
        assert!(a.is_between(2, 1, 5).is_ok());
        assert!(a.is_between(5, 1, 5).is_ok());
        assert!(a.is_not_between(6, 1, 5).is_ok());
        assert!(a.is_not_between(3, 1, 5).is_err());
    }

    #[test]
    fn test_strings() {
        let a = Assert::new();
        assert!(a.starts_with("proctor", "pro").is_ok());
        assert!(a.does_not_start_with("proctor", "tor").is_ok());
        assert!(a.ends_with("proctor", "tor").is_ok());
        assert!(a.does_not_end_with("proctor", "pro").is_ok());
        assert!(a.contains("hello world", "lo w").is_ok());
        assert!(a.does_not_contain("hello", "z").is_ok());
    }

    #[test]
    fn test_patterns() {
        let a = Assert::new();
        assert!(a.is_match("12345", r"^\d+$").is_ok());
        assert!(a.is_match("12a", r"^\d+$").is_err());
        assert!(a.is_not_match("12a", r"^\d+$").is_ok());

        let err = a.is_match("x", "(").unwrap_err();
        assert!(err.message().contains("Invalid pattern '('"));
    }

    #[test]
    fn test_membership() {
        let a = Assert::new();
        assert!(a.contains_item(&[1, 2, 3], &2).is_ok());
        assert!(a.does_not_contain_item(&[1, 2, 3], &4).is_ok());
        let err = a.contains_item(&["a", "b"], &"c").unwrap_err();
        assert!(err.message().contains("Contains: \"c\""));
    }
}
