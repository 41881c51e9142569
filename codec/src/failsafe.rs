//! Failsafe construction wrapper and per-call decode context.
//!
//! Both decoders route every nested construction through
//! [`DecodeContext::construct`]. On failure the wrapper appends a frame naming
//! the failing fragment and constructor. In strict mode the error is returned;
//! in failsafe mode the full chain is logged, recorded as a [`Diagnostic`], and
//! the fragment is replaced by absence so the caller continues with siblings.

use std::cell::{Cell, RefCell};

use crate::error::{Error, ErrorKind, Result};
use crate::options::DecodeOptions;
use crate::registry::Registry;

/// How serious a recorded diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Tolerated irregularity; nothing was dropped.
    Warning,
    /// A fragment was dropped.
    Error,
}

/// A problem tolerated during a failsafe decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Failure category.
    pub kind: ErrorKind,
    /// Rendered message including the causal chain.
    pub message: String,
}

/// Per-call decoder state: mode, registry, depth and collected diagnostics.
///
/// Created fresh for each decode call and never shared between calls.
pub(crate) struct DecodeContext<'r> {
    pub(crate) options: DecodeOptions,
    pub(crate) registry: &'r Registry,
    depth: Cell<usize>,
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl<'r> DecodeContext<'r> {
    pub(crate) fn new(registry: &'r Registry, options: DecodeOptions) -> Self {
        Self {
            options,
            registry,
            depth: Cell::new(0),
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn failsafe(&self) -> bool {
        self.options.failsafe
    }

    pub(crate) fn stripped(&self) -> bool {
        self.options.stripped
    }

    /// Records a tolerated irregularity.
    pub(crate) fn warn(&self, kind: ErrorKind, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(kind = kind.as_str(), "{}", message);
        self.diagnostics.borrow_mut().push(Diagnostic {
            severity: Severity::Warning,
            kind,
            message,
        });
    }

    /// Records a dropped fragment.
    pub(crate) fn dropped(&self, err: &Error) {
        tracing::error!("{}: {}", err.kind(), err);
        self.diagnostics.borrow_mut().push(Diagnostic {
            severity: Severity::Error,
            kind: err.kind(),
            message: err.to_string(),
        });
    }

    /// Strict mode returns `err`; failsafe mode records it as a warning.
    pub(crate) fn tolerate(&self, err: Error) -> Result<()> {
        if self.failsafe() {
            self.warn(err.kind(), err.to_string());
            Ok(())
        } else {
            Err(err)
        }
    }

    /// Strict mode returns `err`; failsafe mode records the drop.
    pub(crate) fn skip(&self, err: Error) -> Result<()> {
        if self.failsafe() {
            self.dropped(&err);
            Ok(())
        } else {
            Err(err)
        }
    }

    /// Runs `constructor` on an optional input.
    ///
    /// Absent input yields `Ok(None)`. A failure gets the frame
    /// `Failed to construct {label} using {name}!` and is then returned
    /// (strict) or logged and replaced by `None` (failsafe).
    pub(crate) fn construct<I, T>(
        &self,
        input: Option<I>,
        label: impl FnOnce(&I) -> String,
        name: &str,
        constructor: impl FnOnce(I) -> Result<T>,
    ) -> Result<Option<T>> {
        let Some(input) = input else {
            return Ok(None);
        };
        let frame = format!("Failed to construct {} using {}!", label(&input), name);
        match self.descend(|| constructor(input)) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                let err = err.context(frame);
                if self.failsafe() {
                    self.dropped(&err);
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Like [`construct`](Self::construct) for a mandatory input: failures are
    /// always returned, with the frame attached, so the enclosing
    /// construction fails.
    pub(crate) fn construct_mandatory<I, T>(
        &self,
        input: I,
        label: impl FnOnce(&I) -> String,
        name: &str,
        constructor: impl FnOnce(I) -> Result<T>,
    ) -> Result<T> {
        let frame = format!("Failed to construct {} using {}!", label(&input), name);
        self.descend(|| constructor(input))
            .map_err(|err| err.context(frame))
    }

    /// Runs `f` one nesting level deeper, failing once `max_depth` is passed.
    pub(crate) fn descend<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let depth = self.depth.get() + 1;
        if depth > self.options.max_depth {
            return Err(Error::malformed(format!(
                "nesting depth exceeds the limit of {}",
                self.options.max_depth
            )));
        }
        self.depth.set(depth);
        let result = f();
        self.depth.set(depth - 1);
        result
    }

    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics.into_inner()
    }
}
