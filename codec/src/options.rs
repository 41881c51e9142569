//! Immutable per-call codec configuration.
//!
//! Every decode or encode call takes its mode explicitly; nothing is stored
//! on shared state, so concurrent calls with different modes never interfere.

/// Default bound on input nesting depth during decoding. See
/// [`DecodeOptions::max_depth`] for the unit.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Decoder configuration: {failsafe, strict} x {full, stripped} plus the
/// recursion bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Log and skip defective fragments instead of aborting.
    pub failsafe: bool,
    /// Skip qualifiers, extensions, embedded data specifications and nested
    /// child collections.
    pub stripped: bool,
    /// Maximum nesting depth accepted from the input, counted in syntax
    /// levels rather than entities: every JSON object or array and every
    /// XML element is one level. A nested collection costs two (the element
    /// and its `value` container), so the default admits about thirty
    /// nested collections.
    pub max_depth: usize,
}

impl DecodeOptions {
    /// Failsafe, full decoding.
    #[must_use]
    pub const fn failsafe() -> Self {
        Self {
            failsafe: true,
            stripped: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Strict, full decoding.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            failsafe: false,
            stripped: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Returns a copy with the stripped flag set.
    #[must_use]
    pub const fn with_stripped(mut self, stripped: bool) -> Self {
        self.stripped = stripped;
        self
    }

    /// Returns a copy with a different depth bound.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::failsafe()
    }
}

/// Encoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Omit the same attributes a stripped decoder skips.
    pub stripped: bool,
    /// Indent the output.
    pub pretty: bool,
}

impl EncodeOptions {
    /// Full, indented output.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stripped: false,
            pretty: true,
        }
    }

    /// Returns a copy with the stripped flag set.
    #[must_use]
    pub const fn with_stripped(mut self, stripped: bool) -> Self {
        self.stripped = stripped;
        self
    }

    /// Returns a copy with indentation switched on or off.
    #[must_use]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self::new()
    }
}
