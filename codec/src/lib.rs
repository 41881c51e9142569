//! Asset Administration Shell 3.0 metamodel codec.
//!
//! This crate maps the AAS metamodel between a typed in-memory object graph
//! and its two exchange formats: JSON, decoded bottom-up, and XML in the
//! `https://admin-shell.io/aas/3/0` namespace, decoded top-down.
//!
//! # Modes
//!
//! Every call takes its configuration explicitly:
//!
//! | Option | Effect |
//! |--------|--------|
//! | `failsafe` | defective fragments are logged, recorded as diagnostics and dropped |
//! | strict | the first defect aborts the call with a causal error |
//! | `stripped` | qualifiers, extensions, embedded data specifications and nested children are skipped |
//! | `max_depth` | bound on nesting depth of the input |
//!
//! # Entry Point
//!
//! ```
//! use aas_codec::{decode_fragment, encode_fragment, DecodeOptions, EncodeOptions, Format, Selector};
//!
//! let input = r#"{"modelType":"Property","idShort":"Temperature","valueType":"xs:double","value":"23.5"}"#;
//! let fragment = decode_fragment(Format::Json, input.as_bytes(), Selector::SubmodelElement, &DecodeOptions::strict())?;
//!
//! let mut output = Vec::new();
//! encode_fragment(Format::Json, &fragment, &mut output, &EncodeOptions::new().with_pretty(false))?;
//! assert_eq!(String::from_utf8(output)?, input);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod environment;
pub mod error;
pub mod failsafe;
pub mod fragment;
pub mod json;
pub mod model;
pub mod options;
pub mod reference;
pub mod registry;
pub mod store;
pub mod xml;

use std::fmt;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

pub use environment::{Environment, Group};
pub use error::{Error, ErrorKind, Result};
pub use failsafe::{Diagnostic, Severity};
pub use fragment::{Fragment, LangStringKind, Selector};
pub use options::{DecodeOptions, EncodeOptions, DEFAULT_MAX_DEPTH};
pub use registry::{ModelType, Registry, Token};
pub use store::{read_into, ObjectStore, ResolveError, Resolved};

use failsafe::DecodeContext;

/// One of the two exchange formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// The JSON serialization.
    Json,
    /// The XML serialization.
    Xml,
}

impl Format {
    /// Both formats.
    pub const ALL: [Format; 2] = [Format::Json, Format::Xml];

    /// Lower-case name, also the usual file extension.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }

    /// The format a file extension (case-insensitive) suggests.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|format| format.as_str() == extension)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::invalid_enum("Format", name))
    }
}

/// A decoder bound to a constructor registry and a mode.
///
/// Each call creates its own context, so one decoder may be shared across
/// threads.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'r> {
    registry: &'r Registry,
    options: DecodeOptions,
}

impl Decoder<'static> {
    /// A decoder using the standard registry.
    #[must_use]
    pub fn new(options: DecodeOptions) -> Self {
        Self::with_registry(Registry::standard(), options)
    }
}

impl<'r> Decoder<'r> {
    /// A decoder consulting `registry` after each discriminated entity is
    /// built.
    #[must_use]
    pub fn with_registry(registry: &'r Registry, options: DecodeOptions) -> Self {
        Self { registry, options }
    }

    /// The mode this decoder runs in.
    #[must_use]
    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    /// Decodes a whole document. Failsafe diagnostics are attached to the
    /// returned environment.
    ///
    /// # Errors
    ///
    /// In strict mode, the first defect with its context frames. In both
    /// modes, `MalformedDocument` for unreadable syntax or excessive nesting,
    /// `MissingNamespace` for an XML root outside the AAS namespace and `Io`
    /// for reader failures.
    pub fn decode_document<R: Read>(&self, format: Format, reader: R) -> Result<Environment> {
        let ctx = DecodeContext::new(self.registry, self.options);
        tracing::debug!(%format, failsafe = self.options.failsafe, stripped = self.options.stripped, "decoding document");
        let mut env = match format {
            Format::Json => json::decode_document(&ctx, reader)?,
            Format::Xml => xml::decode_document(&ctx, reader)?,
        };
        env.diagnostics = ctx.into_diagnostics();
        Ok(env)
    }

    /// Decodes a single fragment of the selected kind.
    ///
    /// # Errors
    ///
    /// As [`decode_document`](Self::decode_document). A fragment whose root
    /// cannot be built fails in failsafe mode too, since there is nothing to
    /// return in its place.
    pub fn decode_fragment<R: Read>(&self, format: Format, reader: R, selector: Selector) -> Result<Fragment> {
        let ctx = DecodeContext::new(self.registry, self.options);
        match format {
            Format::Json => json::decode_fragment(&ctx, reader, selector),
            Format::Xml => xml::decode_fragment(&ctx, reader, selector),
        }
    }
}

/// Decodes a document with the standard registry.
///
/// # Errors
///
/// See [`Decoder::decode_document`].
pub fn decode_document<R: Read>(format: Format, reader: R, options: &DecodeOptions) -> Result<Environment> {
    Decoder::new(*options).decode_document(format, reader)
}

/// Decodes a fragment with the standard registry.
///
/// # Errors
///
/// See [`Decoder::decode_fragment`].
pub fn decode_fragment<R: Read>(
    format: Format,
    reader: R,
    selector: Selector,
    options: &DecodeOptions,
) -> Result<Fragment> {
    Decoder::new(*options).decode_fragment(format, reader, selector)
}

/// Encodes a document.
///
/// # Errors
///
/// Returns `Io` if the writer fails.
pub fn encode_document<W: Write>(format: Format, env: &Environment, writer: W, options: &EncodeOptions) -> Result<()> {
    match format {
        Format::Json => json::encode_document(env, writer, options),
        Format::Xml => xml::encode_document(env, writer, options),
    }
}

/// Encodes a single fragment.
///
/// # Errors
///
/// Returns `Io` if the writer fails.
pub fn encode_fragment<W: Write>(format: Format, fragment: &Fragment, writer: W, options: &EncodeOptions) -> Result<()> {
    match format {
        Format::Json => json::encode_fragment(fragment, writer, options),
        Format::Xml => xml::encode_fragment(fragment, writer, options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_from_paths() {
        assert_eq!(Format::from_path(Path::new("env.JSON")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("a/b/env.xml")), Some(Format::Xml));
        assert_eq!(Format::from_path(Path::new("env.aasx")), None);
        assert_eq!("Xml".parse::<Format>().ok(), Some(Format::Xml));
    }

    #[test]
    fn decoder_attaches_diagnostics() {
        let input = r#"{"submodels":[{"modelType":"Submodel","id":"urn:a"},{"modelType":"Submodel","id":"urn:a"}]}"#;
        let env = Decoder::new(DecodeOptions::failsafe()).decode_document(Format::Json, input.as_bytes());
        let env = env.ok();
        assert_eq!(env.as_ref().map(Environment::len), Some(1));
        let kinds: Vec<ErrorKind> = env
            .map(|e| e.diagnostics.into_iter().map(|d| d.kind).collect())
            .unwrap_or_default();
        assert!(kinds.contains(&ErrorKind::DuplicateIdentifier));
    }
}
