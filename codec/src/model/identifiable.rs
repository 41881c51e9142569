//! Identifiable entities and their asset-side helpers.

use super::base::{
    element_capabilities, ElementAttributes, EmbeddedDataSpecification, HasDataSpecification,
    HasKind, HasSemantics, Identifiable, Identification, ModelReference, Referable,
    ReferableAttributes, Reference, SemanticAttributes,
};
use super::elements::SubmodelElement;
use super::kinds::{AssetKind, ModellingKind};

/// An asset administration shell.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetAdministrationShell {
    /// Referable attributes.
    pub referable: ReferableAttributes,
    /// Identifiable attributes.
    pub identification: Identification,
    /// Embedded data specifications.
    pub embedded_data_specifications: Vec<EmbeddedDataSpecification>,
    /// Shell this one was derived from.
    pub derived_from: Option<ModelReference>,
    /// The represented asset.
    pub asset_information: AssetInformation,
    /// Submodels of this shell.
    pub submodels: Vec<ModelReference>,
}

impl AssetAdministrationShell {
    /// A shell without submodels.
    #[must_use]
    pub fn new(identification: Identification, asset_information: AssetInformation) -> Self {
        Self {
            referable: ReferableAttributes::default(),
            identification,
            embedded_data_specifications: Vec::new(),
            derived_from: None,
            asset_information,
            submodels: Vec::new(),
        }
    }
}

/// Information about the asset a shell represents.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetInformation {
    /// Type, instance or not applicable.
    pub asset_kind: AssetKind,
    /// Global asset id.
    pub global_asset_id: Option<String>,
    /// Specific asset ids.
    pub specific_asset_ids: Vec<SpecificAssetId>,
    /// Asset type.
    pub asset_type: Option<String>,
    /// Thumbnail.
    pub default_thumbnail: Option<Resource>,
}

impl AssetInformation {
    /// Asset information with only a kind.
    #[must_use]
    pub fn new(asset_kind: AssetKind) -> Self {
        Self {
            asset_kind,
            global_asset_id: None,
            specific_asset_ids: Vec::new(),
            asset_type: None,
            default_thumbnail: None,
        }
    }
}

/// A domain-specific asset identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecificAssetId {
    /// Semantic attributes.
    pub semantics: SemanticAttributes,
    /// Identifier name.
    pub name: String,
    /// Identifier value.
    pub value: String,
    /// Subject the identifier is meaningful to.
    pub external_subject_id: Option<Reference>,
}

impl SpecificAssetId {
    /// A specific asset id without semantics.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            semantics: SemanticAttributes::default(),
            name: name.into(),
            value: value.into(),
            external_subject_id: None,
        }
    }
}

impl HasSemantics for SpecificAssetId {
    fn semantics(&self) -> &SemanticAttributes {
        &self.semantics
    }
}

/// A file resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Path or URI.
    pub path: String,
    /// MIME type.
    pub content_type: Option<String>,
}

/// A submodel.
#[derive(Debug, Clone, PartialEq)]
pub struct Submodel {
    /// Shared attributes.
    pub attributes: ElementAttributes,
    /// Identifiable attributes.
    pub identification: Identification,
    /// Template or instance.
    pub kind: ModellingKind,
    /// Top-level elements.
    pub submodel_elements: Vec<SubmodelElement>,
}

impl Submodel {
    /// An empty instance submodel.
    #[must_use]
    pub fn new(identification: Identification) -> Self {
        Self {
            attributes: ElementAttributes::default(),
            identification,
            kind: ModellingKind::Instance,
            submodel_elements: Vec::new(),
        }
    }
}

element_capabilities!(Submodel);

impl HasKind for Submodel {
    fn kind(&self) -> ModellingKind {
        self.kind
    }
}

/// A concept description.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptDescription {
    /// Referable attributes.
    pub referable: ReferableAttributes,
    /// Identifiable attributes.
    pub identification: Identification,
    /// Embedded data specifications.
    pub embedded_data_specifications: Vec<EmbeddedDataSpecification>,
    /// External concepts this one is a case of.
    pub is_case_of: Vec<Reference>,
}

impl ConceptDescription {
    /// A concept description without content.
    #[must_use]
    pub fn new(identification: Identification) -> Self {
        Self {
            referable: ReferableAttributes::default(),
            identification,
            embedded_data_specifications: Vec::new(),
            is_case_of: Vec::new(),
        }
    }
}

macro_rules! identifiable_capabilities {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Referable for $ty {
                fn referable(&self) -> &ReferableAttributes {
                    &self.referable
                }
            }

            impl HasDataSpecification for $ty {
                fn embedded_data_specifications(&self) -> &[EmbeddedDataSpecification] {
                    &self.embedded_data_specifications
                }
            }
        )+
    };
}

identifiable_capabilities!(AssetAdministrationShell, ConceptDescription);

impl Identifiable for AssetAdministrationShell {
    fn identification(&self) -> &Identification {
        &self.identification
    }
}

impl Identifiable for Submodel {
    fn identification(&self) -> &Identification {
        &self.identification
    }
}

impl Identifiable for ConceptDescription {
    fn identification(&self) -> &Identification {
        &self.identification
    }
}
