//! The JSON serialization of AAS 3.0.
//!
//! Decoding is bottom-up (see [`de`]); encoding walks the model with one
//! function per kind (see [`ser`]).

use std::io::{Read, Write};

use crate::environment::Environment;
use crate::error::Result;
use crate::failsafe::DecodeContext;
use crate::fragment::{Fragment, Selector};
use crate::options::EncodeOptions;

mod de;
mod ser;

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

/// Writes `env` as a JSON document.
///
/// # Errors
///
/// Returns `Io` if the writer fails.
pub fn encode_document<W: Write>(env: &Environment, writer: W, options: &EncodeOptions) -> Result<()> {
    write(&ser::document(env, options), writer, options)
}

/// Writes a single fragment as JSON.
///
/// # Errors
///
/// Returns `Io` if the writer fails.
pub fn encode_fragment<W: Write>(fragment: &Fragment, writer: W, options: &EncodeOptions) -> Result<()> {
    write(&ser::fragment(fragment, options), writer, options)
}

/// The JSON value a fragment encodes to.
#[must_use]
pub fn to_value(fragment: &Fragment, options: &EncodeOptions) -> serde_json::Value {
    ser::fragment(fragment, options)
}

fn write<W: Write>(value: &serde_json::Value, writer: W, options: &EncodeOptions) -> Result<()> {
    if options.pretty {
        serde_json::to_writer_pretty(writer, value)?;
    } else {
        serde_json::to_writer(writer, value)?;
    }
    Ok(())
}
