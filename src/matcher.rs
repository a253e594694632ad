//! Verification code extraction from message text.
//!
//! The client runs a [`Matcher`] over each message's `body + body_preview`
//! and keeps the first hit. [`OtpMatcher::six_digit`] is the default.
//!
//! # Example
//!
//! ```
//! use mailpool_client::matcher::{FirstOf, LabeledCodeMatcher, Matcher, OtpMatcher};
//!
//! let otp = OtpMatcher::six_digit();
//! assert_eq!(otp.find_match("Your code is 123456.").as_deref(), Some("123456"));
//!
//! // Prefer a labelled alphanumeric code, fall back to any 6 digits
//! let matcher = FirstOf::new()
//!     .or(LabeledCodeMatcher::new(4, 8))
//!     .or(OtpMatcher::six_digit());
//! assert_eq!(matcher.find_match("Order 991234. Code: K7Q2ZX").as_deref(), Some("K7Q2ZX"));
//! ```

use regex::Regex;
use std::borrow::Cow;
use std::sync::Arc;

/// Extracts a verification code from text.
///
/// # Example
///
/// ```
/// use mailpool_client::matcher::Matcher;
/// use std::borrow::Cow;
///
/// struct LastLine;
///
/// impl Matcher for LastLine {
///     fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
///         text.lines().last().map(Cow::Borrowed)
///     }
///
///     fn description(&self) -> &str {
///         "last line"
///     }
/// }
///
/// assert_eq!(LastLine.find_match("a\nb").as_deref(), Some("b"));
/// ```
pub trait Matcher: Send + Sync {
    /// Returns the extracted value, borrowing from `text` when possible.
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>>;

    /// Human-readable description, used in log fields.
    fn description(&self) -> &str;
}

impl<M: Matcher + ?Sized> Matcher for Arc<M> {
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        (**self).find_match(text)
    }

    fn description(&self) -> &str {
        (**self).description()
    }
}

impl<M: Matcher + ?Sized> Matcher for Box<M> {
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        (**self).find_match(text)
    }

    fn description(&self) -> &str {
        (**self).description()
    }
}

/// Regex matcher returning the first capture group.
///
/// ```
/// use mailpool_client::matcher::{Matcher, RegexMatcher};
///
/// let matcher = RegexMatcher::new(r"PIN:\s*(\d+)").unwrap();
/// assert_eq!(matcher.find_match("PIN: 0042").as_deref(), Some("0042"));
/// ```
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
    description: String,
}

impl RegexMatcher {
    /// Compiles `pattern`; it must contain at least one capture group.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Self::with_description(pattern, format!("regex pattern: {pattern}"))
    }

    /// Like [`new`](Self::new) with a custom description.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid.
    pub fn with_description(
        pattern: &str,
        description: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            description: description.into(),
        })
    }
}

impl Matcher for RegexMatcher {
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| Cow::Borrowed(m.as_str()))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Standalone numeric codes.
///
/// ```
/// use mailpool_client::matcher::{Matcher, OtpMatcher};
///
/// let otp = OtpMatcher::six_digit();
/// assert_eq!(otp.find_match("<b>654321</b>").as_deref(), Some("654321"));
/// assert_eq!(otp.find_match("ref 1234567"), None);
/// ```
#[derive(Debug, Clone)]
pub struct OtpMatcher {
    inner: RegexMatcher,
}

impl OtpMatcher {
    /// Exactly six digits bounded by non-word characters.
    #[must_use]
    pub fn six_digit() -> Self {
        Self::n_digit(6)
    }

    /// Exactly `digits` digits bounded by non-word characters.
    ///
    /// # Panics
    ///
    /// Panics if `digits` is 0.
    #[must_use]
    pub fn n_digit(digits: usize) -> Self {
        assert!(digits > 0, "digits must be > 0");
        let pattern = format!(r"\b(\d{{{digits}}})\b");
        Self {
            inner: RegexMatcher::with_description(&pattern, format!("{digits}-digit code"))
                .expect("valid regex"),
        }
    }
}

impl Default for OtpMatcher {
    fn default() -> Self {
        Self::six_digit()
    }
}

impl Matcher for OtpMatcher {
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        self.inner.find_match(text)
    }

    fn description(&self) -> &str {
        self.inner.description()
    }
}

/// Alphanumeric codes that follow a "code" label.
///
/// Recognises `code`, `verification code`, `otp`, `pin` and `验证码`
/// (case-insensitive), then up to 20 characters that are neither uppercase
/// letters nor digits, then an uppercase/digit token of `min..=max`
/// characters containing at least one digit.
///
/// ```
/// use mailpool_client::matcher::{LabeledCodeMatcher, Matcher};
///
/// let m = LabeledCodeMatcher::new(4, 8);
/// assert_eq!(m.find_match("Your verification code is: A1B2C3").as_deref(), Some("A1B2C3"));
/// assert_eq!(m.find_match("验证码：8842"), Some("8842".into()));
/// assert_eq!(m.find_match("code: HELLO"), None);
/// ```
#[derive(Debug, Clone)]
pub struct LabeledCodeMatcher {
    regex: Regex,
    description: String,
}

impl LabeledCodeMatcher {
    /// Codes between `min` and `max` characters long.
    ///
    /// # Panics
    ///
    /// Panics if `min` is 0 or greater than `max`.
    #[must_use]
    pub fn new(min: usize, max: usize) -> Self {
        assert!(min > 0 && min <= max, "need 0 < min <= max");
        let pattern = format!(
            r"(?i:verification code|code|otp|pin|验证码)[^A-Z0-9]{{1,20}}([A-Z0-9]{{{min},{max}}})\b"
        );
        Self {
            regex: Regex::new(&pattern).expect("valid regex"),
            description: format!("labelled {min}-{max} character code"),
        }
    }
}

impl Matcher for LabeledCodeMatcher {
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .find(|code| code.bytes().any(|b| b.is_ascii_digit()))
            .map(Cow::Borrowed)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Tries several matchers in order and returns the first hit.
#[derive(Default)]
pub struct FirstOf {
    matchers: Vec<Box<dyn Matcher>>,
    description: String,
}

impl FirstOf {
    /// Empty combinator; matches nothing until matchers are added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a matcher with lower priority than the ones already added.
    #[must_use]
    pub fn or(mut self, matcher: impl Matcher + 'static) -> Self {
        if !self.description.is_empty() {
            self.description.push_str(" | ");
        }
        self.description.push_str(matcher.description());
        self.matchers.push(Box::new(matcher));
        self
    }
}

impl Matcher for FirstOf {
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        self.matchers.iter().find_map(|m| m.find_match(text))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl std::fmt::Debug for FirstOf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirstOf")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Matcher backed by a closure.
///
/// ```
/// use mailpool_client::matcher::{ClosureMatcher, Matcher};
/// use std::borrow::Cow;
///
/// let matcher = ClosureMatcher::new(
///     |text| {
///         text.lines()
///             .find(|line| line.starts_with("Code:"))
///             .map(|line| Cow::Owned(line.trim_start_matches("Code:").trim().to_string()))
///     },
///     "code line extractor",
/// );
///
/// assert_eq!(matcher.find_match("Hello\nCode: ABC123\nThanks").as_deref(), Some("ABC123"));
/// ```
pub struct ClosureMatcher<F>
where
    F: for<'a> Fn(&'a str) -> Option<Cow<'a, str>> + Send + Sync,
{
    matcher_fn: F,
    description: String,
}

impl<F> ClosureMatcher<F>
where
    F: for<'a> Fn(&'a str) -> Option<Cow<'a, str>> + Send + Sync,
{
    /// Wraps `matcher_fn` with a description.
    #[must_use]
    pub fn new(matcher_fn: F, description: impl Into<String>) -> Self {
        Self {
            matcher_fn,
            description: description.into(),
        }
    }
}

impl<F> Matcher for ClosureMatcher<F>
where
    F: for<'a> Fn(&'a str) -> Option<Cow<'a, str>> + Send + Sync,
{
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        (self.matcher_fn)(text)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl<F> std::fmt::Debug for ClosureMatcher<F>
where
    F: for<'a> Fn(&'a str) -> Option<Cow<'a, str>> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureMatcher")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
