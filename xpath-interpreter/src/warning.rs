//! Non-fatal diagnostics (spec.md §7 "Warnings"): a subscribable channel,
//! separate from the `Result<T, SpannedError>` path so a warning never
//! aborts evaluation. Grounded on the teacher's preference for explicit,
//! injectable collaborators over global state (spec.md §9 "Global mutable
//! state") — a [`WarningChannel`] is owned by a [`crate::context::DynamicContext`]
//! rather than a process-wide singleton, and subscribers are plain
//! closures rather than a trait object hierarchy.

use std::rc::Rc;

use xpath_ast::span::Span;

/// How urgent a warning is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Deprecation,
}

/// What a warning is about (spec.md §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Deprecation,
    Compatibility,
    Performance,
    TypeCoercion,
    BehaviorChange,
}

/// One non-fatal diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    pub source_range: Option<Span>,
}

impl Warning {
    pub fn new(severity: Severity, category: Category, message: impl Into<String>) -> Self {
        Warning {
            severity,
            category,
            message: message.into(),
            source_range: None,
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.source_range = Some(span);
        self
    }
}

/// A subscribable channel of [`Warning`]s. Cloning shares the same
/// subscriber list (it's an `Rc` of interior-mutable state), so a
/// [`crate::context::DynamicContext`] can cheaply carry one through
/// `for`/`let`-introduced sub-contexts without losing subscribers
/// registered on the root.
#[derive(Clone, Default)]
pub struct WarningChannel {
    subscribers: Rc<std::cell::RefCell<Vec<Rc<dyn Fn(&Warning)>>>>,
}

impl WarningChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked for every warning emitted from this
    /// point on.
    pub fn subscribe(&self, listener: impl Fn(&Warning) + 'static) {
        self.subscribers.borrow_mut().push(Rc::new(listener));
    }

    /// Emit a warning to every current subscriber. Also surfaced through
    /// `tracing::warn!` so a host that only attaches a `tracing` subscriber
    /// still sees these (spec.md SPEC_FULL §3 "Logging").
    pub fn emit(&self, warning: Warning) {
        tracing::warn!(category = ?warning.category, severity = ?warning.severity, "{}", warning.message);
        for subscriber in self.subscribers.borrow().iter() {
            subscriber(&warning);
        }
    }
}

impl std::fmt::Debug for WarningChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarningChannel")
            .field("subscriber_count", &self.subscribers.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_see_emitted_warnings() {
        let channel = WarningChannel::new();
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        channel.subscribe(move |w| seen_clone.borrow_mut().push(w.message.clone()));
        channel.emit(Warning::new(Severity::Warning, Category::TypeCoercion, "untyped atomic promoted to xs:double"));
        assert_eq!(seen.borrow().as_slice(), ["untyped atomic promoted to xs:double"]);
    }

    #[test]
    fn cloned_channel_shares_subscribers() {
        let channel = WarningChannel::new();
        let seen = Rc::new(std::cell::RefCell::new(0));
        let seen_clone = seen.clone();
        channel.subscribe(move |_| *seen_clone.borrow_mut() += 1);
        let shadowed = channel.clone();
        shadowed.emit(Warning::new(Severity::Info, Category::Performance, "cache disabled"));
        assert_eq!(*seen.borrow(), 1);
    }
}
