//! The AAS 3.0 metamodel as typed Rust data.
//!
//! Concrete kinds compose capability bundles ([`ReferableAttributes`],
//! [`Identification`], [`SemanticAttributes`], [`ElementAttributes`]) and
//! expose them through the capability traits ([`Referable`],
//! [`Identifiable`], [`HasSemantics`], [`Qualifiable`], [`HasExtension`],
//! [`HasDataSpecification`], [`HasKind`]). Codecs are written against the
//! traits, never against an inheritance chain.

pub mod base;
pub mod datatypes;
pub mod elements;
pub mod identifiable;
pub mod kinds;

pub use base::{
    AdministrativeInformation, DataSpecificationContent, DataSpecificationIec61360,
    ElementAttributes, EmbeddedDataSpecification, ExternalReference, Extension,
    HasDataSpecification, HasExtension, HasKind, HasSemantics, Identifiable, Identification, Key,
    LangString, LangStringSet, LevelType, ModelReference, Qualifiable, Qualifier, Referable,
    ReferableAttributes, Reference, SemanticAttributes, ValueList, ValueReferencePair,
};
pub use datatypes::{
    DataTypeDefXsd, Date, DateTime, Decimal, Duration, GDay, GMonth, GMonthDay, GYear,
    GYearMonth, Time, Value,
};
pub use elements::{
    AnnotatedRelationshipElement, BasicEventElement, Blob, Capability, Entity, File,
    MultiLanguageProperty, Operation, Property, Range, ReferenceElement, RelationshipElement,
    SubmodelElement, SubmodelElementCollection, SubmodelElementList,
};
pub use identifiable::{
    AssetAdministrationShell, AssetInformation, ConceptDescription, Resource, SpecificAssetId,
    Submodel,
};
pub use kinds::{
    AssetKind, DataTypeIec61360, Direction, EntityType, KeyType, ModellingKind, QualifierKind,
    ReferenceTypes, StateOfEvent,
};

use crate::registry::ModelType;

/// Any entity that carries a discriminator on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelObject {
    /// An asset administration shell.
    AssetAdministrationShell(AssetAdministrationShell),
    /// A submodel.
    Submodel(Submodel),
    /// A concept description.
    ConceptDescription(ConceptDescription),
    /// A submodel element.
    SubmodelElement(SubmodelElement),
    /// IEC 61360 data specification content.
    DataSpecificationIec61360(DataSpecificationIec61360),
}

impl ModelObject {
    /// Discriminator of the concrete kind.
    #[must_use]
    pub fn model_type(&self) -> ModelType {
        match self {
            Self::AssetAdministrationShell(_) => ModelType::AssetAdministrationShell,
            Self::Submodel(_) => ModelType::Submodel,
            Self::ConceptDescription(_) => ModelType::ConceptDescription,
            Self::SubmodelElement(element) => element.model_type(),
            Self::DataSpecificationIec61360(_) => ModelType::DataSpecificationIec61360,
        }
    }

    /// The object as an Identifiable, if it is one.
    #[must_use]
    pub fn as_identifiable(&self) -> Option<&dyn Identifiable> {
        match self {
            Self::AssetAdministrationShell(shell) => Some(shell),
            Self::Submodel(submodel) => Some(submodel),
            Self::ConceptDescription(concept) => Some(concept),
            Self::SubmodelElement(_) | Self::DataSpecificationIec61360(_) => None,
        }
    }

    /// The object as a Referable, if it is one.
    #[must_use]
    pub fn as_referable(&self) -> Option<&dyn Referable> {
        match self {
            Self::AssetAdministrationShell(shell) => Some(shell),
            Self::Submodel(submodel) => Some(submodel),
            Self::ConceptDescription(concept) => Some(concept),
            Self::SubmodelElement(element) => Some(element),
            Self::DataSpecificationIec61360(_) => None,
        }
    }
}

impl From<AssetAdministrationShell> for ModelObject {
    fn from(shell: AssetAdministrationShell) -> Self {
        Self::AssetAdministrationShell(shell)
    }
}

impl From<Submodel> for ModelObject {
    fn from(submodel: Submodel) -> Self {
        Self::Submodel(submodel)
    }
}

impl From<ConceptDescription> for ModelObject {
    fn from(concept: ConceptDescription) -> Self {
        Self::ConceptDescription(concept)
    }
}

impl From<SubmodelElement> for ModelObject {
    fn from(element: SubmodelElement) -> Self {
        Self::SubmodelElement(element)
    }
}

impl From<DataSpecificationIec61360> for ModelObject {
    fn from(content: DataSpecificationIec61360) -> Self {
        Self::DataSpecificationIec61360(content)
    }
}
