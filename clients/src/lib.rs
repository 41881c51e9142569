//! Shared command-line plumbing for the AAS client binaries.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use aas_codec::{DecodeOptions, EncodeOptions, DEFAULT_MAX_DEPTH};
use clap::Args;
use tracing_subscriber::EnvFilter;

/// Decode and encode mode flags.
#[derive(Args, Debug, Clone, Copy)]
pub struct ModeArgs {
    /// Abort on the first defect instead of dropping defective fragments.
    #[arg(long)]
    pub strict: bool,

    /// Skip qualifiers, extensions, embedded data specifications and nested children.
    #[arg(long)]
    pub stripped: bool,

    /// Maximum nesting depth accepted in the input.
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Write compact output instead of indented output.
    #[arg(long)]
    pub compact: bool,
}

impl ModeArgs {
    /// The decode options these flags select.
    #[must_use]
    pub fn decode_options(&self) -> DecodeOptions {
        let base = if self.strict {
            DecodeOptions::strict()
        } else {
            DecodeOptions::failsafe()
        };
        base.with_stripped(self.stripped).with_max_depth(self.max_depth)
    }

    /// The encode options these flags select.
    #[must_use]
    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions::new()
            .with_stripped(self.stripped)
            .with_pretty(!self.compact)
    }
}

/// Installs a stderr subscriber. `RUST_LOG` wins; otherwise `warn`, or
/// `debug` with `-v`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(strict: bool, stripped: bool, compact: bool) -> ModeArgs {
        ModeArgs {
            strict,
            stripped,
            max_depth: 8,
            compact,
        }
    }

    #[test]
    fn flags_map_onto_options() {
        let decode = mode(true, true, false).decode_options();
        assert!(!decode.failsafe);
        assert!(decode.stripped);
        assert_eq!(decode.max_depth, 8);

        let encode = mode(false, false, true).encode_options();
        assert!(!encode.stripped);
        assert!(!encode.pretty);
        assert!(mode(false, false, false).decode_options().failsafe);
    }
}
