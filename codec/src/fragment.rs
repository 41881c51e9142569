//! Construct selectors and decoded fragments.
//!
//! Callers that receive partial payloads (one entity in a request body, a
//! lone reference) name what they expect with a [`Selector`] and get a
//! [`Fragment`] back.

use crate::model::{
    AdministrativeInformation, AssetInformation, EmbeddedDataSpecification, Extension, Key,
    LangStringSet, ModelObject, Qualifier, Reference, Resource, SpecificAssetId, ValueList,
    ValueReferencePair,
};
use crate::registry::token_enum;

token_enum! {
    /// Every fragment kind that can be decoded on its own.
    pub enum Selector as "Selector" {
        /// Key
        Key => "Key",
        /// Reference of either variant
        Reference => "Reference",
        /// ModelReference
        ModelReference => "ModelReference",
        /// ExternalReference
        ExternalReference => "ExternalReference",
        /// AdministrativeInformation
        AdministrativeInformation => "AdministrativeInformation",
        /// Qualifier
        Qualifier => "Qualifier",
        /// Extension
        Extension => "Extension",
        /// AnnotatedRelationshipElement
        AnnotatedRelationshipElement => "AnnotatedRelationshipElement",
        /// BasicEventElement
        BasicEventElement => "BasicEventElement",
        /// Blob
        Blob => "Blob",
        /// Capability
        Capability => "Capability",
        /// Entity
        Entity => "Entity",
        /// File
        File => "File",
        /// Resource
        Resource => "Resource",
        /// MultiLanguageProperty
        MultiLanguageProperty => "MultiLanguageProperty",
        /// Operation
        Operation => "Operation",
        /// Property
        Property => "Property",
        /// Range
        Range => "Range",
        /// ReferenceElement
        ReferenceElement => "ReferenceElement",
        /// RelationshipElement
        RelationshipElement => "RelationshipElement",
        /// SubmodelElementCollection
        SubmodelElementCollection => "SubmodelElementCollection",
        /// SubmodelElementList
        SubmodelElementList => "SubmodelElementList",
        /// AssetAdministrationShell
        AssetAdministrationShell => "AssetAdministrationShell",
        /// AssetInformation
        AssetInformation => "AssetInformation",
        /// SpecificAssetId
        SpecificAssetId => "SpecificAssetId",
        /// Submodel
        Submodel => "Submodel",
        /// ValueReferencePair
        ValueReferencePair => "ValueReferencePair",
        /// ConceptDescription
        ConceptDescription => "ConceptDescription",
        /// Any data element
        DataElement => "DataElement",
        /// Any submodel element
        SubmodelElement => "SubmodelElement",
        /// ValueList
        ValueList => "ValueList",
        /// MultiLanguageNameType
        MultiLanguageNameType => "MultiLanguageNameType",
        /// MultiLanguageTextType
        MultiLanguageTextType => "MultiLanguageTextType",
        /// DefinitionTypeIec61360
        DefinitionTypeIec61360 => "DefinitionTypeIec61360",
        /// PreferredNameTypeIec61360
        PreferredNameTypeIec61360 => "PreferredNameTypeIec61360",
        /// ShortNameTypeIec61360
        ShortNameTypeIec61360 => "ShortNameTypeIec61360",
        /// EmbeddedDataSpecification
        EmbeddedDataSpecification => "EmbeddedDataSpecification",
        /// Any data specification content
        DataSpecificationContent => "DataSpecificationContent",
        /// DataSpecificationIec61360
        DataSpecificationIec61360 => "DataSpecificationIec61360",
    }
}

impl Selector {
    /// The lang string flavour this selector names, if any.
    #[must_use]
    pub fn lang_string_kind(self) -> Option<LangStringKind> {
        match self {
            Self::MultiLanguageNameType => Some(LangStringKind::NameType),
            Self::MultiLanguageTextType => Some(LangStringKind::TextType),
            Self::DefinitionTypeIec61360 => Some(LangStringKind::DefinitionIec61360),
            Self::PreferredNameTypeIec61360 => Some(LangStringKind::PreferredNameIec61360),
            Self::ShortNameTypeIec61360 => Some(LangStringKind::ShortNameIec61360),
            _ => None,
        }
    }
}

/// Flavours of lang string sets; they differ in the markup tags used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LangStringKind {
    /// Display names.
    NameType,
    /// Descriptions and multi-language property values.
    TextType,
    /// IEC 61360 definitions.
    DefinitionIec61360,
    /// IEC 61360 preferred names.
    PreferredNameIec61360,
    /// IEC 61360 short names.
    ShortNameIec61360,
}

impl LangStringKind {
    /// Markup tag of one entry.
    #[must_use]
    pub fn entry_tag(self) -> &'static str {
        match self {
            Self::NameType => "langStringNameType",
            Self::TextType => "langStringTextType",
            Self::DefinitionIec61360 => "langStringDefinitionTypeIec61360",
            Self::PreferredNameIec61360 => "langStringPreferredNameTypeIec61360",
            Self::ShortNameIec61360 => "langStringShortNameTypeIec61360",
        }
    }

    /// Markup tag of the set when written as a standalone fragment.
    #[must_use]
    pub fn set_tag(self) -> &'static str {
        match self {
            Self::NameType => "displayName",
            Self::TextType => "description",
            Self::DefinitionIec61360 => "definition",
            Self::PreferredNameIec61360 => "preferredName",
            Self::ShortNameIec61360 => "shortName",
        }
    }
}

/// A decoded fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// A key.
    Key(Key),
    /// A reference.
    Reference(Reference),
    /// Administrative information.
    AdministrativeInformation(AdministrativeInformation),
    /// A qualifier.
    Qualifier(Qualifier),
    /// An extension.
    Extension(Extension),
    /// A resource.
    Resource(Resource),
    /// Asset information.
    AssetInformation(AssetInformation),
    /// A specific asset id.
    SpecificAssetId(SpecificAssetId),
    /// A value reference pair.
    ValueReferencePair(ValueReferencePair),
    /// A value list.
    ValueList(ValueList),
    /// A lang string set of the given flavour.
    LangStringSet(LangStringKind, LangStringSet),
    /// An embedded data specification.
    EmbeddedDataSpecification(EmbeddedDataSpecification),
    /// Any discriminated entity, including data specification content.
    Object(ModelObject),
}

impl From<ModelObject> for Fragment {
    fn from(object: ModelObject) -> Self {
        Self::Object(object)
    }
}

impl From<Reference> for Fragment {
    fn from(reference: Reference) -> Self {
        Self::Reference(reference)
    }
}
