//! Typed codec errors with causal context frames.
//!
//! A failing constructor produces an [`Error`] of a fixed [`ErrorKind`]. As the
//! error unwinds through enclosing constructors each of them appends a frame
//! via [`Error::context`], so the rendered message reads innermost cause first:
//!
//! ```text
//! aas:qualifier on line 12 has no child aas:valueType!
//!  -> Failed to construct aas:qualifier on line 12 using construct_qualifier!
//! ```

use std::fmt;

/// The closed set of failure categories the codec reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A mandatory key is absent from a text-format mapping.
    MissingRequiredAttribute,
    /// A mandatory child element is absent from a markup element.
    MissingRequiredChild,
    /// A value has the wrong shape or the wrong entity kind for its position.
    TypeMismatch,
    /// A discriminator or element tag names no known entity kind.
    UnknownDiscriminator,
    /// An enumeration token is not one of the canonical tokens.
    InvalidEnumValue,
    /// A literal does not match the grammar of its declared datatype.
    InvalidLiteral,
    /// A second Identifiable reuses an already seen identifier.
    DuplicateIdentifier,
    /// A model reference's key chain addresses a different kind than expected.
    /// Only ever reported as a diagnostic.
    ReferenceTargetKindMismatch,
    /// The markup root lacks the AAS namespace.
    MissingNamespace,
    /// The input is not well-formed or exceeds structural limits.
    MalformedDocument,
    /// Reading or writing the underlying stream failed.
    Io,
}

impl ErrorKind {
    /// Returns the kind name used in diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingRequiredAttribute => "MissingRequiredAttribute",
            Self::MissingRequiredChild => "MissingRequiredChild",
            Self::TypeMismatch => "TypeMismatch",
            Self::UnknownDiscriminator => "UnknownDiscriminator",
            Self::InvalidEnumValue => "InvalidEnumValue",
            Self::InvalidLiteral => "InvalidLiteral",
            Self::DuplicateIdentifier => "DuplicateIdentifier",
            Self::ReferenceTargetKindMismatch => "ReferenceTargetKindMismatch",
            Self::MissingNamespace => "MissingNamespace",
            Self::MalformedDocument => "MalformedDocument",
            Self::Io => "Io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A codec error: a kind, the innermost message and the context frames
/// collected while unwinding.
#[derive(Debug, thiserror::Error)]
#[error("{message}{}", render_frames(.frames))]
pub struct Error {
    kind: ErrorKind,
    message: String,
    frames: Vec<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

fn render_frames(frames: &[String]) -> String {
    frames.iter().map(|frame| format!("\n -> {frame}")).collect()
}

/// Shorthand for results carrying a codec [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            frames: Vec::new(),
            source: None,
        }
    }

    /// `MissingRequiredAttribute` for a text-format mapping.
    pub fn missing_attribute(owner: &str, key: &str) -> Self {
        Self::new(
            ErrorKind::MissingRequiredAttribute,
            format!("{owner} has no attribute {key}!"),
        )
    }

    /// `MissingRequiredChild` for a markup element.
    pub fn missing_child(owner: &str, tag: &str) -> Self {
        Self::new(
            ErrorKind::MissingRequiredChild,
            format!("{owner} has no child {tag}!"),
        )
    }

    /// `TypeMismatch` between what a position expects and what was found.
    pub fn type_mismatch(expected: &str, found: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("expected {expected}, but found {found}"),
        )
    }

    /// `UnknownDiscriminator` for an entity kind name or tag.
    pub fn unknown_discriminator(category: &str, name: &str) -> Self {
        Self::new(
            ErrorKind::UnknownDiscriminator,
            format!("{name} is not a valid {category}!"),
        )
    }

    /// `InvalidEnumValue` for a token outside an enumeration.
    pub fn invalid_enum(enumeration: &str, token: &str) -> Self {
        Self::new(
            ErrorKind::InvalidEnumValue,
            format!("{token:?} is not a valid {enumeration}"),
        )
    }

    /// `InvalidLiteral` for text outside a datatype grammar.
    pub fn invalid_literal(datatype: &str, text: &str) -> Self {
        Self::new(
            ErrorKind::InvalidLiteral,
            format!("{text:?} is not a valid {datatype} literal"),
        )
    }

    /// `DuplicateIdentifier` for an id already seen in the same document.
    pub fn duplicate_identifier(id: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateIdentifier,
            format!("identifier {id:?} is already in use"),
        )
    }

    /// `MalformedDocument` for input that cannot be parsed or nests too deep.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedDocument, message)
    }

    /// Attaches an underlying error as the source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Appends a context frame; frames render after the message in push order.
    #[must_use]
    pub fn context(mut self, frame: impl Into<String>) -> Self {
        self.frames.push(frame.into());
        self
    }

    /// The failure category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The innermost message without frames.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The context frames, innermost first.
    #[must_use]
    pub fn frames(&self) -> &[String] {
        &self.frames
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        let kind = if err.is_io() {
            ErrorKind::Io
        } else {
            ErrorKind::MalformedDocument
        };
        Self::new(kind, err.to_string()).with_source(err)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(io) => Self::new(ErrorKind::Io, io.to_string()),
            other => Self::malformed(other.to_string()).with_source(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_render_innermost_first() {
        let err = Error::missing_child("aas:qualifier on line 3", "aas:valueType")
            .context("Failed to construct aas:qualifier on line 3 using construct_qualifier!")
            .context("Failed to construct aas:property on line 1 using construct_property!");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredChild);
        assert_eq!(
            err.to_string(),
            "aas:qualifier on line 3 has no child aas:valueType!\n \
             -> Failed to construct aas:qualifier on line 3 using construct_qualifier!\n \
             -> Failed to construct aas:property on line 1 using construct_property!"
        );
    }

    #[test]
    fn json_syntax_error_is_malformed() {
        let err: Error = match serde_json::from_str::<serde_json::Value>("{") {
            Err(e) => e.into(),
            Ok(_) => unreachable!("truncated input parsed"),
        };
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);
    }
}
