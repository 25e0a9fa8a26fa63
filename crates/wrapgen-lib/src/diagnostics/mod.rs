//! Diagnostics collection and the scoped-sink log.
//!
//! Data errors are accumulated, not thrown: every error recorded while a
//! class's sink is installed on the [`Log`] lands both in that class's own
//! error bucket and in the run-wide collection that gates output at end of
//! translation unit.

mod message;


use std::cell::{Ref, RefCell};
use std::rc::Rc;

pub use message::{Diagnostic, Severity};

/// Collection of diagnostic messages.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, message: Diagnostic) {
        self.0.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.0.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.0.iter().filter(|d| d.is_warning()).count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_warning())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A diagnostics collection shared between the log and its owner.
pub type SharedDiagnostics = Rc<RefCell<Diagnostics>>;

pub fn shared_diagnostics() -> SharedDiagnostics {
    Rc::new(RefCell::new(Diagnostics::new()))
}

struct LogInner {
    base: RefCell<Diagnostics>,
    sinks: RefCell<Vec<SharedDiagnostics>>,
}

/// The run-wide log: a base collection plus a pushdown stack of scoped
/// sinks. Recording an error appends it to the base collection and to the
/// innermost installed sink, so validation running under a class's
/// [`LogGuard`] fills that class's error bucket.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct Log {
    inner: Rc<LogInner>,
}

impl Default for Log {
    fn default() -> Self {
        Self::new()
    }
}

impl Log {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(LogInner {
                base: RefCell::new(Diagnostics::new()),
                sinks: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn error(&self, message: impl Into<String>) {
        let diagnostic = Diagnostic::error(message);
        log::error!("{diagnostic}");
        if let Some(sink) = self.inner.sinks.borrow().last() {
            sink.borrow_mut().push(diagnostic.clone());
        }
        self.inner.base.borrow_mut().push(diagnostic);
    }

    pub fn warn(&self, message: impl Into<String>) {
        let diagnostic = Diagnostic::warning(message);
        log::warn!("{diagnostic}");
        self.inner.base.borrow_mut().push(diagnostic);
    }

    /// Install `sink` as the innermost scoped sink until the guard drops.
    #[must_use = "the sink is removed when the guard drops"]
    pub fn capture(&self, sink: SharedDiagnostics) -> LogGuard {
        self.inner.sinks.borrow_mut().push(sink);
        LogGuard {
            log: self.clone(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.inner.base.borrow().has_errors()
    }

    pub fn diagnostics(&self) -> Ref<'_, Diagnostics> {
        self.inner.base.borrow()
    }

    pub fn take(&self) -> Diagnostics {
        self.inner.base.take()
    }
}

/// Removes the innermost sink on drop.
pub struct LogGuard {
    log: Log,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        self.log.inner.sinks.borrow_mut().pop();
    }
}
