pub mod builder;

use std::{
    collections::LinkedList,
    fmt::{Debug, Display},
};

pub use builder::DiagnosticBuilder;

/// A byte range into the translation unit that was handed to the front end.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    start: usize,
    length: usize,
}

impl From<std::ops::Range<usize>> for Span {
    fn from(value: std::ops::Range<usize>) -> Self {
        Self {
            start: value.start,
            length: value.len(),
        }
    }
}

impl From<Span> for std::ops::Range<usize> {
    fn from(val: Span) -> Self {
        val.start..val.excl_end()
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.excl_end())
    }
}

impl Span {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn excl_end(&self) -> usize {
        self.start + self.length
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

// WARNING: Don't change the order of these (Error codes will change)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    /// This is an internal code that should never be used for actual diagnostics.
    Unspecified = 0,
    SyntaxError,
    MissingToken,
    Unimplemented,
    UnresolvedBaseType,
}

impl Code {
    /// Get a unique numeric code for this `Code`
    fn as_code(&self) -> u32 {
        *self as u32
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:0>4x}", self.as_code())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    code: Code,
    message: String,
    main_span: (Span, Option<String>),
    additional_spans: Vec<(Span, Option<String>)>,
}

impl Diagnostic {
    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn message(&self) -> &String {
        &self.message
    }

    pub fn main_span(&self) -> &Span {
        &self.main_span.0
    }

    pub fn main_span_message(&self) -> Option<&String> {
        self.main_span.1.as_ref()
    }

    pub fn additional_spans(&self) -> impl Iterator<Item = (&Span, Option<&String>)> {
        self.additional_spans.iter().map(|(s, m)| (s, m.as_ref()))
    }

    pub fn additional_spans_len(&self) -> usize {
        self.additional_spans.len()
    }
}

/// Specifies the possibles types of diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// For recoverable diagnostics. (cfr. warnings)
    Rec,
    /// For non-recoverable diagnostics. (cfr. errors)
    Err,
}

/// A result combining a value with aggregated diagnostics.
///
/// Can be in one of three states:
/// - _ok_: The result contains a value and has no diagnostics. Corresponds to `Result::Ok`.
/// - _rec_: recoverable: The result contains a (recovered) value and has only diagnostics of the
///   kind [`DiagnosticKind::Rec`].
/// - _err_: non-recoverable: The result does not contain a value and has at least one diagnostic of
///   the kind [`DiagnosticKind::Err`].
///
/// A lowered translation unit with a few unsupported type specifiers is _rec_; a translation unit
/// with a syntax error is _err_ and never reaches the function declaration walk.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult<T> {
    value: Option<T>,
    diagnostics: LinkedList<(DiagnosticKind, Diagnostic)>,
}

impl<T> AggregateResult<T> {
    /// Creates an `AggregateResult` in an _ok_ state containing the specified value.
    ///
    /// # Examples
    ///
    /// ```
    /// # use fdecl_lib::diagnostic::*;
    /// let res = AggregateResult::new_ok(2);
    ///
    /// assert!(res.is_ok());
    /// assert_eq!(res.value(), Some(&2));
    /// assert!(res.diagnostics().next().is_none());
    /// ```
    pub fn new_ok(value: T) -> Self {
        Self {
            value: Some(value),
            diagnostics: LinkedList::new(),
        }
    }

    /// Creates an `AggregateResult` in a _rec_ state containing the specified value and diagnostic.
    ///
    /// # Examples
    ///
    /// ```
    /// # use fdecl_lib::diagnostic::*;
    /// # let diagnostic = DiagnosticBuilder::new(Span::default()).build_unimplemented("");
    /// let res = AggregateResult::new_rec("hi", diagnostic.clone());
    ///
    /// assert!(res.is_rec());
    /// assert_eq!(res.value(), Some(&"hi"));
    /// let mut diags = res.diagnostics();
    /// assert_eq!(diags.next(), Some((DiagnosticKind::Rec, &diagnostic)));
    /// assert!(diags.next().is_none());
    /// ```
    pub fn new_rec(value: T, diagnostic: Diagnostic) -> Self {
        Self {
            value: Some(value),
            diagnostics: LinkedList::from([(DiagnosticKind::Rec, diagnostic)]),
        }
    }

    /// Creates an `AggregateResult` in an _err_ state containing the specified diagnostic.
    pub fn new_err(diagnostic: Diagnostic) -> Self {
        Self {
            value: None,
            diagnostics: LinkedList::from([(DiagnosticKind::Err, diagnostic)]),
        }
    }

    /// Returns `true` if the result is in an _ok_ state.
    pub fn is_ok(&self) -> bool {
        self.value.is_some() && self.diagnostics.is_empty()
    }

    /// Returns `true` if the result is in a _rec_ state.
    pub fn is_rec(&self) -> bool {
        self.value.is_some() && !self.diagnostics.is_empty()
    }

    /// Returns `true` if the result is in an _err_ state.
    pub fn is_err(&self) -> bool {
        self.value.is_none()
    }

    /// Returns the contained value for _ok_ and _rec_ results.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Converts from `AggregateResult<T>` to `Option<T>`, returning `Some(T)` for _ok_ and _rec_
    /// results, and consuming `self`.
    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Returns an iterator over the diagnostics for _rec_ and _err_ results.
    pub fn diagnostics(&self) -> impl Iterator<Item = (DiagnosticKind, &Diagnostic)> {
        self.diagnostics.iter().map(|(dt, d)| (*dt, d))
    }

    /// Returns a consuming iterator over the diagnostics for _rec_ and _err_ results.
    pub fn into_diagnostics(self) -> impl Iterator<Item = (DiagnosticKind, Diagnostic)> {
        self.diagnostics.into_iter()
    }

    /// Adds a recoverable diagnostic to the result.
    ///
    /// An _ok_ result will become a _rec_ result.
    pub fn add_rec_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics
            .push_back((DiagnosticKind::Rec, diagnostic));
    }

    /// Adds a non-recoverable diagnostic to the result.
    ///
    /// The result will become an _err_ result, dropping a contained value.
    pub fn add_err(&mut self, diagnostic: Diagnostic) {
        self.value = None;
        self.diagnostics
            .push_back((DiagnosticKind::Err, diagnostic));
    }

    /// Maps an `AggregateResult<T>` to `AggregateResult<U>` by applying a function to a
    /// contained value, leaving diagnostics untouched.
    #[must_use]
    pub fn map<U, F>(self, op: F) -> AggregateResult<U>
    where
        F: FnOnce(T) -> U,
    {
        AggregateResult {
            value: self.value.map(op),
            diagnostics: self.diagnostics,
        }
    }

    /// Calls `op` if the result has a value, aggregating the diagnostics of `self` with the result
    /// returned by `op`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use fdecl_lib::diagnostic::*;
    /// # let diagnostic = DiagnosticBuilder::new(0..3).build_syntax_error("int");
    /// let err = AggregateResult::<u8>::new_err(diagnostic);
    /// let mut called = false;
    /// let res = err.and_then(|v| {
    ///     called = true;
    ///     AggregateResult::new_ok(v + 1)
    /// });
    ///
    /// assert!(!called);
    /// assert!(res.is_err());
    /// ```
    #[must_use]
    pub fn and_then<U, F>(mut self, op: F) -> AggregateResult<U>
    where
        F: FnOnce(T) -> AggregateResult<U>,
    {
        match self.value {
            Some(t) => {
                let mut other = op(t);
                self.diagnostics.append(&mut other.diagnostics);
                other.diagnostics = self.diagnostics;
                other
            }
            None => AggregateResult {
                value: None,
                diagnostics: self.diagnostics,
            },
        }
    }

    /// Zips the values of `self` and `other`, aggregating their diagnostics.
    ///
    /// If either `self` or `other` is in an _err_ state, the returned result will be in an _err_
    /// state as well.
    pub fn zip<U>(mut self, mut other: AggregateResult<U>) -> AggregateResult<(T, U)> {
        AggregateResult {
            value: self.value.zip(other.value),
            diagnostics: {
                self.diagnostics.append(&mut other.diagnostics);
                self.diagnostics
            },
        }
    }

    /// Add `self` to `other`, combining their values using `f`, and aggregating their diagnostics.
    ///
    /// If `self` is _err_, `other` becomes _err_ too.
    ///
    /// # Examples
    ///
    /// ```
    /// # use fdecl_lib::diagnostic::*;
    /// # let diagnostic = DiagnosticBuilder::new(0..3).build_unimplemented("typeof");
    /// let mut all = AggregateResult::new_ok(vec![1]);
    /// AggregateResult::new_ok(2).add_to(&mut all, |all, v| all.push(v));
    /// AggregateResult::new_rec(3, diagnostic).add_to(&mut all, |all, v| all.push(v));
    ///
    /// assert!(all.is_rec());
    /// assert_eq!(all.value(), Some(&vec![1, 2, 3]));
    /// ```
    pub fn add_to<U, F>(mut self, other: &mut AggregateResult<U>, f: F)
    where
        F: FnOnce(&mut U, T),
    {
        if let Some((u, t)) = other.value.as_mut().zip(self.value) {
            f(u, t);
        } else {
            other.value = None;
        }
        other.diagnostics.append(&mut self.diagnostics);
    }
}
