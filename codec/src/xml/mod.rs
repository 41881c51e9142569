//! The XML serialization of AAS 3.0.
//!
//! Decoding is top-down over a parsed element tree; every element of
//! interest lives in the [`AAS_NAMESPACE`]. Entity tags are the lowerCamel
//! form of the model type name (`submodelElementList`).

use std::io::{Read, Write};

use crate::environment::Environment;
use crate::error::Result;
use crate::failsafe::DecodeContext;
use crate::fragment::{Fragment, Selector};
use crate::options::EncodeOptions;
use crate::registry::{ModelType, Token};

mod de;
mod ser;
mod tree;

pub use tree::AAS_NAMESPACE;

/// `SubmodelElementList` -> `submodelElementList`
pub(crate) fn tag_of(kind: ModelType) -> String {
    let name = kind.as_str();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// The model type an AAS element's tag names, if any.
pub(crate) fn kind_of_tag(element: &tree::Element) -> Option<ModelType> {
    if !element.aas {
        return None;
    }
    ModelType::ALL
        .iter()
        .copied()
        .find(|kind| tag_of(*kind) == element.local)
}

pub(crate) fn decode_document<R: Read>(ctx: &DecodeContext<'_>, reader: R) -> Result<Environment> {
    de::document(ctx, reader)
}

pub(crate) fn decode_fragment<R: Read>(
    ctx: &DecodeContext<'_>,
    reader: R,
    selector: Selector,
) -> Result<Fragment> {
    de::fragment(ctx, reader, selector)
}

/// Writes `env` as an XML document rooted at `aas:environment`.
///
/// # Errors
///
/// Returns `Io` if the writer fails.
pub fn encode_document<W: Write>(env: &Environment, writer: W, options: &EncodeOptions) -> Result<()> {
    ser::write(&ser::document(env, options), writer, options)
}

/// Writes a single fragment as an XML document rooted at its default tag.
///
/// # Errors
///
/// Returns `Io` if the writer fails.
pub fn encode_fragment<W: Write>(fragment: &Fragment, writer: W, options: &EncodeOptions) -> Result<()> {
    ser::write(&ser::fragment(fragment, options), writer, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_lower_camel() {
        assert_eq!(tag_of(ModelType::SubmodelElementList), "submodelElementList");
        assert_eq!(tag_of(ModelType::DataSpecificationIec61360), "dataSpecificationIec61360");
        assert_eq!(tag_of(ModelType::AssetAdministrationShell), "assetAdministrationShell");
    }
}
