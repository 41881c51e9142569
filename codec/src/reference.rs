//! Reference & key codec: format-independent construction of references.
//!
//! Both decoders parse the wire shape (variant discriminator, key chain,
//! optional referred semantic id) themselves and hand the parts to this
//! module, which decides the variant and the addressed entity kind.
//!
//! The two formats differ in how a model reference's target is fixed:
//!
//! - [`TargetPolicy::Inferred`] (text format): the kind of the last key,
//!   whatever the caller expected;
//! - [`TargetPolicy::Declared`] (markup format): the kind of the last key if
//!   it is a subtype of the expected kind, otherwise the expected kind.
//!
//! A last key that does not match the expected kind is never fatal; it is
//! reported as a `ReferenceTargetKindMismatch` diagnostic.

use crate::error::{Error, ErrorKind, Result};
use crate::failsafe::DecodeContext;
use crate::model::{ExternalReference, Key, KeyType, ModelReference, Reference, ReferenceTypes};

/// How a decoded model reference's target kind is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TargetPolicy {
    /// Take the kind from the key chain.
    Inferred,
    /// Fall back to the caller's expected kind on mismatch.
    Declared,
}

/// The wire parts of a reference.
pub(crate) struct ReferenceParts {
    pub(crate) reference_type: ReferenceTypes,
    pub(crate) keys: Vec<Key>,
    pub(crate) referred_semantic_id: Option<Reference>,
}

/// Renders a key chain as `Kind=value / Kind=value` for diagnostics.
#[must_use]
pub fn key_chain(keys: &[Key]) -> String {
    keys.iter()
        .map(|key| format!("{}={}", key.kind, key.value))
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Builds a reference of either variant; model references expect any
/// Referable.
pub(crate) fn reference(ctx: &DecodeContext<'_>, parts: ReferenceParts, policy: TargetPolicy) -> Reference {
    match parts.reference_type {
        ReferenceTypes::ExternalReference => Reference::External(external(parts)),
        ReferenceTypes::ModelReference => {
            Reference::Model(model(ctx, parts, KeyType::Referable, policy))
        }
    }
}

/// Builds an external reference, rejecting the model variant.
pub(crate) fn external_reference(parts: ReferenceParts) -> Result<ExternalReference> {
    if parts.reference_type != ReferenceTypes::ExternalReference {
        return Err(Error::type_mismatch(
            ReferenceTypes::ExternalReference.as_str(),
            parts.reference_type,
        ));
    }
    Ok(external(parts))
}

/// Builds a model reference addressing `expected`, rejecting the external
/// variant.
pub(crate) fn model_reference(
    ctx: &DecodeContext<'_>,
    parts: ReferenceParts,
    expected: KeyType,
    policy: TargetPolicy,
) -> Result<ModelReference> {
    if parts.reference_type != ReferenceTypes::ModelReference {
        return Err(Error::type_mismatch(
            ReferenceTypes::ModelReference.as_str(),
            parts.reference_type,
        ));
    }
    Ok(model(ctx, parts, expected, policy))
}

fn external(parts: ReferenceParts) -> ExternalReference {
    ExternalReference {
        keys: parts.keys,
        referred_semantic_id: parts.referred_semantic_id.map(Box::new),
    }
}

fn model(
    ctx: &DecodeContext<'_>,
    parts: ReferenceParts,
    expected: KeyType,
    policy: TargetPolicy,
) -> ModelReference {
    let inferred = parts
        .keys
        .last()
        .map(|key| key.kind)
        .filter(|kind| kind.is_referable());
    let target = match inferred {
        Some(kind) if kind.is_subtype_of(expected) => kind,
        Some(kind) => {
            ctx.warn(
                ErrorKind::ReferenceTargetKindMismatch,
                format!(
                    "type {} of last key of reference to {} does not match reference type {}",
                    kind,
                    key_chain(&parts.keys),
                    expected
                ),
            );
            match policy {
                TargetPolicy::Inferred => kind,
                TargetPolicy::Declared => expected,
            }
        }
        None => expected,
    };
    ModelReference {
        keys: parts.keys,
        target,
        referred_semantic_id: parts.referred_semantic_id.map(Box::new),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DecodeOptions;
    use crate::registry::Registry;

    fn parts(reference_type: ReferenceTypes, keys: Vec<Key>) -> ReferenceParts {
        ReferenceParts {
            reference_type,
            keys,
            referred_semantic_id: None,
        }
    }

    #[test]
    fn submodel_key_inferred_under_referable() {
        let registry = Registry::new();
        let ctx = DecodeContext::new(&registry, DecodeOptions::strict());
        for policy in [TargetPolicy::Inferred, TargetPolicy::Declared] {
            let built = reference(
                &ctx,
                parts(
                    ReferenceTypes::ModelReference,
                    vec![Key::new(KeyType::Submodel, "urn:sm")],
                ),
                policy,
            );
            match built {
                Reference::Model(r) => assert_eq!(r.target, KeyType::Submodel),
                Reference::External(_) => panic!("expected a model reference"),
            }
        }
        assert!(ctx.into_diagnostics().is_empty());
    }

    #[test]
    fn mismatch_is_a_diagnostic_only() {
        let registry = Registry::new();
        let ctx = DecodeContext::new(&registry, DecodeOptions::strict());
        let keys = vec![
            Key::new(KeyType::Submodel, "urn:sm"),
            Key::new(KeyType::Property, "p"),
        ];
        let inferred = model_reference(
            &ctx,
            parts(ReferenceTypes::ModelReference, keys.clone()),
            KeyType::Submodel,
            TargetPolicy::Inferred,
        );
        let declared = model_reference(
            &ctx,
            parts(ReferenceTypes::ModelReference, keys),
            KeyType::Submodel,
            TargetPolicy::Declared,
        );
        assert_eq!(inferred.ok().map(|r| r.target), Some(KeyType::Property));
        assert_eq!(declared.ok().map(|r| r.target), Some(KeyType::Submodel));
        let diagnostics = ctx.into_diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics
            .iter()
            .all(|d| d.kind == ErrorKind::ReferenceTargetKindMismatch));
    }

    #[test]
    fn variant_is_checked() {
        let registry = Registry::new();
        let ctx = DecodeContext::new(&registry, DecodeOptions::failsafe());
        let err = model_reference(
            &ctx,
            parts(ReferenceTypes::ExternalReference, Vec::new()),
            KeyType::Submodel,
            TargetPolicy::Declared,
        )
        .err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::TypeMismatch));
        assert!(external_reference(parts(ReferenceTypes::ModelReference, Vec::new())).is_err());
    }

    #[test]
    fn key_chain_rendering() {
        let keys = vec![
            Key::new(KeyType::Submodel, "urn:sm"),
            Key::new(KeyType::Property, "p"),
        ];
        assert_eq!(key_chain(&keys), "Submodel=urn:sm / Property=p");
    }
}
