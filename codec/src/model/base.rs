//! Capability bundles, capability traits and the helper fragments shared by
//! every entity kind.

use super::datatypes::{DataTypeDefXsd, Value};
use super::kinds::{DataTypeIec61360, KeyType, ModellingKind, QualifierKind, ReferenceTypes};

// =============================================================================
// Capability traits
// =============================================================================

/// An entity addressable by a short name inside its parent.
pub trait Referable {
    /// The Referable attribute bundle.
    fn referable(&self) -> &ReferableAttributes;

    /// Short name, unique among siblings.
    fn id_short(&self) -> Option<&str> {
        self.referable().id_short.as_deref()
    }
}

/// A Referable with a globally unique identifier.
pub trait Identifiable: Referable {
    /// The Identifiable attribute bundle.
    fn identification(&self) -> &Identification;

    /// Global identifier.
    fn id(&self) -> &str {
        &self.identification().id
    }
}

/// An entity with a semantic definition.
pub trait HasSemantics {
    /// The semantic attribute bundle.
    fn semantics(&self) -> &SemanticAttributes;
}

/// An entity constrained by qualifiers.
pub trait Qualifiable {
    /// Qualifiers in insertion order.
    fn qualifiers(&self) -> &[Qualifier];
}

/// An entity carrying name/value extensions.
pub trait HasExtension {
    /// Extensions in insertion order.
    fn extensions(&self) -> &[Extension];
}

impl<T: Referable + ?Sized> HasExtension for T {
    fn extensions(&self) -> &[Extension] {
        &self.referable().extensions
    }
}

/// An entity with embedded data specifications.
pub trait HasDataSpecification {
    /// Embedded data specifications in insertion order.
    fn embedded_data_specifications(&self) -> &[EmbeddedDataSpecification];
}

/// An entity that is either a template or an instance.
pub trait HasKind {
    /// Modelling kind; absent on the wire means `Instance`.
    fn kind(&self) -> ModellingKind;
}

// =============================================================================
// Attribute bundles
// =============================================================================

/// Referable attributes; extensions are folded in since every Referable has
/// them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferableAttributes {
    /// Short name.
    pub id_short: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// Display name.
    pub display_name: Option<LangStringSet>,
    /// Description.
    pub description: Option<LangStringSet>,
    /// Extensions.
    pub extensions: Vec<Extension>,
}

impl ReferableAttributes {
    /// Attributes carrying only a short name.
    #[must_use]
    pub fn named(id_short: impl Into<String>) -> Self {
        Self {
            id_short: Some(id_short.into()),
            ..Self::default()
        }
    }
}

/// Identifiable attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identification {
    /// Global identifier.
    pub id: String,
    /// Version information.
    pub administration: Option<AdministrativeInformation>,
}

impl Identification {
    /// Identification without administrative information.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            administration: None,
        }
    }
}

/// HasSemantics attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SemanticAttributes {
    /// Primary semantic definition.
    pub semantic_id: Option<Reference>,
    /// Further semantic definitions.
    pub supplemental_semantic_ids: Vec<Reference>,
}

/// The bundle shared by Submodels and all submodel elements: Referable,
/// HasSemantics, Qualifiable and HasDataSpecification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementAttributes {
    /// Referable attributes.
    pub referable: ReferableAttributes,
    /// Semantic attributes.
    pub semantics: SemanticAttributes,
    /// Qualifiers.
    pub qualifiers: Vec<Qualifier>,
    /// Embedded data specifications.
    pub embedded_data_specifications: Vec<EmbeddedDataSpecification>,
}

impl ElementAttributes {
    /// Attributes carrying only a short name.
    #[must_use]
    pub fn named(id_short: impl Into<String>) -> Self {
        Self {
            referable: ReferableAttributes::named(id_short),
            ..Self::default()
        }
    }
}

impl Referable for ElementAttributes {
    fn referable(&self) -> &ReferableAttributes {
        &self.referable
    }
}

impl HasSemantics for ElementAttributes {
    fn semantics(&self) -> &SemanticAttributes {
        &self.semantics
    }
}

impl Qualifiable for ElementAttributes {
    fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }
}

impl HasDataSpecification for ElementAttributes {
    fn embedded_data_specifications(&self) -> &[EmbeddedDataSpecification] {
        &self.embedded_data_specifications
    }
}

/// Implements the element capability traits for a struct with an
/// `attributes: ElementAttributes` field.
macro_rules! element_capabilities {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::model::Referable for $ty {
                fn referable(&self) -> &$crate::model::ReferableAttributes {
                    &self.attributes.referable
                }
            }

            impl $crate::model::HasSemantics for $ty {
                fn semantics(&self) -> &$crate::model::SemanticAttributes {
                    &self.attributes.semantics
                }
            }

            impl $crate::model::Qualifiable for $ty {
                fn qualifiers(&self) -> &[$crate::model::Qualifier] {
                    &self.attributes.qualifiers
                }
            }

            impl $crate::model::HasDataSpecification for $ty {
                fn embedded_data_specifications(
                    &self,
                ) -> &[$crate::model::EmbeddedDataSpecification] {
                    &self.attributes.embedded_data_specifications
                }
            }
        )+
    };
}

pub(crate) use element_capabilities;

// =============================================================================
// Keys and references
// =============================================================================

/// One step of a reference's key chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    /// Kind of the addressed entity.
    pub kind: KeyType,
    /// Identifier, short name or list index.
    pub value: String,
}

impl Key {
    /// Creates a key.
    pub fn new(kind: KeyType, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// A pointer to an entity inside or outside the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    /// Points outside the model; keys are opaque.
    External(ExternalReference),
    /// Points into the model; resolvable against an object store.
    Model(ModelReference),
}

/// A reference to something outside the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalReference {
    /// Key chain.
    pub keys: Vec<Key>,
    /// Semantic id of the referenced entity.
    pub referred_semantic_id: Option<Box<Reference>>,
}

/// A reference into the model whose terminal entity kind is known.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReference {
    /// Key chain, starting at an Identifiable.
    pub keys: Vec<Key>,
    /// Kind of the addressed entity.
    pub target: KeyType,
    /// Semantic id of the referenced entity.
    pub referred_semantic_id: Option<Box<Reference>>,
}

impl ExternalReference {
    /// An external reference from a key chain.
    #[must_use]
    pub fn new(keys: Vec<Key>) -> Self {
        Self {
            keys,
            referred_semantic_id: None,
        }
    }
}

impl ModelReference {
    /// A model reference with an explicit target kind.
    #[must_use]
    pub fn new(keys: Vec<Key>, target: KeyType) -> Self {
        Self {
            keys,
            target,
            referred_semantic_id: None,
        }
    }

    /// A model reference whose target kind is the kind of its last key,
    /// falling back to `Referable`.
    #[must_use]
    pub fn from_keys(keys: Vec<Key>) -> Self {
        let target = keys
            .last()
            .map(|key| key.kind)
            .filter(|kind| kind.is_referable())
            .unwrap_or(KeyType::Referable);
        Self::new(keys, target)
    }
}

impl Reference {
    /// Variant discriminator.
    #[must_use]
    pub fn reference_type(&self) -> ReferenceTypes {
        match self {
            Self::External(_) => ReferenceTypes::ExternalReference,
            Self::Model(_) => ReferenceTypes::ModelReference,
        }
    }

    /// Key chain.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        match self {
            Self::External(r) => &r.keys,
            Self::Model(r) => &r.keys,
        }
    }

    /// Semantic id of the referenced entity.
    #[must_use]
    pub fn referred_semantic_id(&self) -> Option<&Reference> {
        match self {
            Self::External(r) => r.referred_semantic_id.as_deref(),
            Self::Model(r) => r.referred_semantic_id.as_deref(),
        }
    }

    /// Shorthand for an external reference with a single `GlobalReference` key.
    pub fn global(value: impl Into<String>) -> Self {
        Self::External(ExternalReference::new(vec![Key::new(
            KeyType::GlobalReference,
            value,
        )]))
    }
}

impl From<ModelReference> for Reference {
    fn from(reference: ModelReference) -> Self {
        Self::Model(reference)
    }
}

impl From<ExternalReference> for Reference {
    fn from(reference: ExternalReference) -> Self {
        Self::External(reference)
    }
}

// =============================================================================
// Helper fragments
// =============================================================================

/// One localized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangString {
    /// BCP 47 language tag.
    pub language: String,
    /// Text in that language.
    pub text: String,
}

impl LangString {
    /// Creates a localized text.
    pub fn new(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
        }
    }
}

/// Localized texts in insertion order.
pub type LangStringSet = Vec<LangString>;

/// A typed constraint on an element.
#[derive(Debug, Clone, PartialEq)]
pub struct Qualifier {
    /// Semantic attributes.
    pub semantics: SemanticAttributes,
    /// Level at which the qualifier applies.
    pub kind: QualifierKind,
    /// Qualifier type name.
    pub qualifier_type: String,
    /// Datatype of `value`.
    pub value_type: DataTypeDefXsd,
    /// Typed value.
    pub value: Option<Value>,
    /// Reference to the value's semantic id.
    pub value_id: Option<Reference>,
}

impl Qualifier {
    /// A concept qualifier without value.
    pub fn new(qualifier_type: impl Into<String>, value_type: DataTypeDefXsd) -> Self {
        Self {
            semantics: SemanticAttributes::default(),
            kind: QualifierKind::default(),
            qualifier_type: qualifier_type.into(),
            value_type,
            value: None,
            value_id: None,
        }
    }
}

impl HasSemantics for Qualifier {
    fn semantics(&self) -> &SemanticAttributes {
        &self.semantics
    }
}

/// A name/value extension.
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    /// Semantic attributes.
    pub semantics: SemanticAttributes,
    /// Extension name.
    pub name: String,
    /// Datatype of `value`; `xs:string` when absent.
    pub value_type: Option<DataTypeDefXsd>,
    /// Typed value.
    pub value: Option<Value>,
    /// Model entities this extension relates to.
    pub refers_to: Vec<ModelReference>,
}

impl Extension {
    /// An extension with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            semantics: SemanticAttributes::default(),
            name: name.into(),
            value_type: None,
            value: None,
            refers_to: Vec::new(),
        }
    }

    /// The datatype values are parsed with.
    #[must_use]
    pub fn effective_value_type(&self) -> DataTypeDefXsd {
        self.value_type.unwrap_or(DataTypeDefXsd::String)
    }
}

impl HasSemantics for Extension {
    fn semantics(&self) -> &SemanticAttributes {
        &self.semantics
    }
}

/// Version information of an Identifiable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdministrativeInformation {
    /// Embedded data specifications.
    pub embedded_data_specifications: Vec<EmbeddedDataSpecification>,
    /// Version.
    pub version: Option<String>,
    /// Revision; only meaningful with a version.
    pub revision: Option<String>,
    /// Creator.
    pub creator: Option<Reference>,
    /// Template the entity was derived from.
    pub template_id: Option<String>,
}

impl HasDataSpecification for AdministrativeInformation {
    fn embedded_data_specifications(&self) -> &[EmbeddedDataSpecification] {
        &self.embedded_data_specifications
    }
}

/// A data specification embedded into an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedDataSpecification {
    /// The data specification template.
    pub data_specification: Reference,
    /// Content following that template.
    pub data_specification_content: DataSpecificationContent,
}

/// Content of an embedded data specification.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSpecificationContent {
    /// IEC 61360 content.
    Iec61360(DataSpecificationIec61360),
}

/// IEC 61360 data specification content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSpecificationIec61360 {
    /// Preferred name.
    pub preferred_name: LangStringSet,
    /// Short name.
    pub short_name: Option<LangStringSet>,
    /// Unit.
    pub unit: Option<String>,
    /// Unit id.
    pub unit_id: Option<Reference>,
    /// Source of definition.
    pub source_of_definition: Option<String>,
    /// Symbol.
    pub symbol: Option<String>,
    /// Data type.
    pub data_type: Option<DataTypeIec61360>,
    /// Definition.
    pub definition: Option<LangStringSet>,
    /// Value format.
    pub value_format: Option<String>,
    /// Permitted values.
    pub value_list: Option<ValueList>,
    /// Fixed value.
    pub value: Option<String>,
    /// Level types.
    pub level_type: Option<LevelType>,
}

/// Permitted values of a data specification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueList {
    /// Value/id pairs.
    pub value_reference_pairs: Vec<ValueReferencePair>,
}

/// One permitted value with its semantic id.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueReferencePair {
    /// Value.
    pub value: String,
    /// Semantic id of the value.
    pub value_id: Option<Reference>,
}

/// Which of min/nom/typ/max a value describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelType {
    /// Minimum.
    pub min: bool,
    /// Nominal.
    pub nom: bool,
    /// Typical.
    pub typ: bool,
    /// Maximum.
    pub max: bool,
}
