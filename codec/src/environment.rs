//! The document level: three ordered groups of Identifiables.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::failsafe::{DecodeContext, Diagnostic};
use crate::model::{AssetAdministrationShell, ConceptDescription, ModelObject, Submodel};
use crate::registry::ModelType;

/// The named top-level groups of a document, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    /// `assetAdministrationShells`
    AssetAdministrationShells,
    /// `submodels`
    Submodels,
    /// `conceptDescriptions`
    ConceptDescriptions,
}

impl Group {
    /// Every group in canonical order.
    pub const ALL: [Group; 3] = [
        Group::AssetAdministrationShells,
        Group::Submodels,
        Group::ConceptDescriptions,
    ];

    /// Group name in both formats.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AssetAdministrationShells => "assetAdministrationShells",
            Self::Submodels => "submodels",
            Self::ConceptDescriptions => "conceptDescriptions",
        }
    }

    /// The entity kind this group holds.
    #[must_use]
    pub fn model_type(self) -> ModelType {
        match self {
            Self::AssetAdministrationShells => ModelType::AssetAdministrationShell,
            Self::Submodels => ModelType::Submodel,
            Self::ConceptDescriptions => ModelType::ConceptDescription,
        }
    }
}

/// A decoded document.
///
/// `identifiers` holds every id that made it into one of the groups; an
/// entity dropped in failsafe mode never enters it. `diagnostics` lists the
/// problems a failsafe decode tolerated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    /// Shells in document order.
    pub asset_administration_shells: Vec<AssetAdministrationShell>,
    /// Submodels in document order.
    pub submodels: Vec<Submodel>,
    /// Concept descriptions in document order.
    pub concept_descriptions: Vec<ConceptDescription>,
    /// Identifiers seen.
    pub identifiers: BTreeSet<String>,
    /// Tolerated problems, in the order they were met.
    pub diagnostics: Vec<Diagnostic>,
}

impl Environment {
    /// An empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an Identifiable to the group of its kind.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateIdentifier` if the id is already present and
    /// `TypeMismatch` if `object` is not an Identifiable.
    pub fn add(&mut self, object: impl Into<ModelObject>) -> Result<()> {
        let object = object.into();
        let id = match object.as_identifiable() {
            Some(identifiable) => identifiable.id().to_owned(),
            None => return Err(Error::type_mismatch("Identifiable", object.model_type())),
        };
        if self.identifiers.contains(&id) {
            return Err(Error::duplicate_identifier(&id));
        }
        match object {
            ModelObject::AssetAdministrationShell(shell) => {
                self.asset_administration_shells.push(shell);
            }
            ModelObject::Submodel(submodel) => self.submodels.push(submodel),
            ModelObject::ConceptDescription(concept) => self.concept_descriptions.push(concept),
            other => return Err(Error::type_mismatch("Identifiable", other.model_type())),
        }
        self.identifiers.insert(id);
        Ok(())
    }

    /// Number of Identifiables over all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.asset_administration_shells.len()
            + self.submodels.len()
            + self.concept_descriptions.len()
    }

    /// True when all groups are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when both environments hold equal groups, ignoring diagnostics.
    #[must_use]
    pub fn same_content(&self, other: &Environment) -> bool {
        self.asset_administration_shells == other.asset_administration_shells
            && self.submodels == other.submodels
            && self.concept_descriptions == other.concept_descriptions
    }

    /// Adds a decoded entity found under `group`, applying the mode's rules
    /// for misplaced, non-Identifiable and duplicate entities.
    pub(crate) fn insert(
        &mut self,
        ctx: &DecodeContext<'_>,
        group: Group,
        object: ModelObject,
    ) -> Result<()> {
        let kind = object.model_type();
        if object.as_identifiable().is_some() && kind != group.model_type() {
            let err = Error::type_mismatch(group.model_type().as_str(), kind)
                .context(format!("found {kind} in {}", group.as_str()));
            if ctx.failsafe() {
                ctx.warn(
                    err.kind(),
                    format!(
                        "{} found in {}, but it is a {kind}; nevertheless using it",
                        describe(&object),
                        group.as_str()
                    ),
                );
            } else {
                return Err(err);
            }
        }
        match self.add(object) {
            Ok(()) => Ok(()),
            Err(err) => ctx.skip(err.context(format!("Failed to add entity to {}!", group.as_str()))),
        }
    }
}

fn describe(object: &ModelObject) -> String {
    match object.as_identifiable() {
        Some(identifiable) => format!("{}[{}]", object.model_type(), identifiable.id()),
        None => object.model_type().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{Identification, Property, ElementAttributes, DataTypeDefXsd};
    use crate::options::DecodeOptions;
    use crate::registry::Registry;

    fn submodel(id: &str) -> Submodel {
        Submodel::new(Identification::new(id))
    }

    #[test]
    fn add_rejects_duplicates() {
        let mut env = Environment::new();
        assert!(env.add(submodel("urn:a")).is_ok());
        let err = env.add(submodel("urn:a")).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::DuplicateIdentifier));
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn add_rejects_non_identifiables() {
        let mut env = Environment::new();
        let property = Property::new(ElementAttributes::named("p"), DataTypeDefXsd::Int);
        let err = env
            .add(ModelObject::SubmodelElement(property.into()))
            .err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::TypeMismatch));
        assert!(env.is_empty());
    }

    #[test]
    fn misplaced_entity_is_kept_in_failsafe_mode() {
        let registry = Registry::new();
        let ctx = DecodeContext::new(&registry, DecodeOptions::failsafe());
        let mut env = Environment::new();
        let inserted = env.insert(&ctx, Group::ConceptDescriptions, submodel("urn:a").into());
        assert!(inserted.is_ok());
        assert_eq!(env.submodels.len(), 1);
        assert_eq!(ctx.into_diagnostics().len(), 1);
    }

    #[test]
    fn misplaced_entity_fails_in_strict_mode() {
        let registry = Registry::new();
        let ctx = DecodeContext::new(&registry, DecodeOptions::strict());
        let mut env = Environment::new();
        let err = env
            .insert(&ctx, Group::ConceptDescriptions, submodel("urn:a").into())
            .err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::TypeMismatch));
        assert!(env.identifiers.is_empty());
    }
}
