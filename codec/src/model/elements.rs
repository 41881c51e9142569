//! Submodel elements.

use super::base::{element_capabilities, ElementAttributes, LangStringSet, ModelReference, Reference};
use super::datatypes::{DataTypeDefXsd, DateTime, Duration, Value};
use super::identifiable::SpecificAssetId;
use super::kinds::{Direction, EntityType, KeyType, StateOfEvent};
use crate::registry::ModelType;

/// Any of the fourteen concrete submodel element kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmodelElement {
    /// Property.
    Property(Property),
    /// MultiLanguageProperty.
    MultiLanguageProperty(MultiLanguageProperty),
    /// Range.
    Range(Range),
    /// Blob.
    Blob(Blob),
    /// File.
    File(File),
    /// ReferenceElement.
    ReferenceElement(ReferenceElement),
    /// Capability.
    Capability(Capability),
    /// RelationshipElement.
    RelationshipElement(RelationshipElement),
    /// AnnotatedRelationshipElement.
    AnnotatedRelationshipElement(AnnotatedRelationshipElement),
    /// Entity.
    Entity(Entity),
    /// Operation.
    Operation(Operation),
    /// BasicEventElement.
    BasicEventElement(BasicEventElement),
    /// SubmodelElementCollection.
    SubmodelElementCollection(SubmodelElementCollection),
    /// SubmodelElementList.
    SubmodelElementList(SubmodelElementList),
}

impl SubmodelElement {
    /// The shared attribute bundle.
    #[must_use]
    pub fn attributes(&self) -> &ElementAttributes {
        match self {
            Self::Property(e) => &e.attributes,
            Self::MultiLanguageProperty(e) => &e.attributes,
            Self::Range(e) => &e.attributes,
            Self::Blob(e) => &e.attributes,
            Self::File(e) => &e.attributes,
            Self::ReferenceElement(e) => &e.attributes,
            Self::Capability(e) => &e.attributes,
            Self::RelationshipElement(e) => &e.attributes,
            Self::AnnotatedRelationshipElement(e) => &e.attributes,
            Self::Entity(e) => &e.attributes,
            Self::Operation(e) => &e.attributes,
            Self::BasicEventElement(e) => &e.attributes,
            Self::SubmodelElementCollection(e) => &e.attributes,
            Self::SubmodelElementList(e) => &e.attributes,
        }
    }

    /// Mutable access to the shared attribute bundle.
    pub fn attributes_mut(&mut self) -> &mut ElementAttributes {
        match self {
            Self::Property(e) => &mut e.attributes,
            Self::MultiLanguageProperty(e) => &mut e.attributes,
            Self::Range(e) => &mut e.attributes,
            Self::Blob(e) => &mut e.attributes,
            Self::File(e) => &mut e.attributes,
            Self::ReferenceElement(e) => &mut e.attributes,
            Self::Capability(e) => &mut e.attributes,
            Self::RelationshipElement(e) => &mut e.attributes,
            Self::AnnotatedRelationshipElement(e) => &mut e.attributes,
            Self::Entity(e) => &mut e.attributes,
            Self::Operation(e) => &mut e.attributes,
            Self::BasicEventElement(e) => &mut e.attributes,
            Self::SubmodelElementCollection(e) => &mut e.attributes,
            Self::SubmodelElementList(e) => &mut e.attributes,
        }
    }

    /// Discriminator of the concrete kind.
    #[must_use]
    pub fn model_type(&self) -> ModelType {
        match self {
            Self::Property(_) => ModelType::Property,
            Self::MultiLanguageProperty(_) => ModelType::MultiLanguageProperty,
            Self::Range(_) => ModelType::Range,
            Self::Blob(_) => ModelType::Blob,
            Self::File(_) => ModelType::File,
            Self::ReferenceElement(_) => ModelType::ReferenceElement,
            Self::Capability(_) => ModelType::Capability,
            Self::RelationshipElement(_) => ModelType::RelationshipElement,
            Self::AnnotatedRelationshipElement(_) => ModelType::AnnotatedRelationshipElement,
            Self::Entity(_) => ModelType::Entity,
            Self::Operation(_) => ModelType::Operation,
            Self::BasicEventElement(_) => ModelType::BasicEventElement,
            Self::SubmodelElementCollection(_) => ModelType::SubmodelElementCollection,
            Self::SubmodelElementList(_) => ModelType::SubmodelElementList,
        }
    }

    /// Key type addressing this element.
    #[must_use]
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Property(_) => KeyType::Property,
            Self::MultiLanguageProperty(_) => KeyType::MultiLanguageProperty,
            Self::Range(_) => KeyType::Range,
            Self::Blob(_) => KeyType::Blob,
            Self::File(_) => KeyType::File,
            Self::ReferenceElement(_) => KeyType::ReferenceElement,
            Self::Capability(_) => KeyType::Capability,
            Self::RelationshipElement(_) => KeyType::RelationshipElement,
            Self::AnnotatedRelationshipElement(_) => KeyType::AnnotatedRelationshipElement,
            Self::Entity(_) => KeyType::Entity,
            Self::Operation(_) => KeyType::Operation,
            Self::BasicEventElement(_) => KeyType::BasicEventElement,
            Self::SubmodelElementCollection(_) => KeyType::SubmodelElementCollection,
            Self::SubmodelElementList(_) => KeyType::SubmodelElementList,
        }
    }

    /// True for Property, MultiLanguageProperty, Range, Blob, File and
    /// ReferenceElement.
    #[must_use]
    pub fn is_data_element(&self) -> bool {
        self.key_type().is_subtype_of(KeyType::DataElement)
    }

    /// Child elements addressable by short name or index, if this kind
    /// nests any.
    #[must_use]
    pub fn children(&self) -> &[SubmodelElement] {
        match self {
            Self::SubmodelElementCollection(e) => &e.value,
            Self::SubmodelElementList(e) => &e.value,
            Self::Entity(e) => &e.statements,
            Self::AnnotatedRelationshipElement(e) => &e.annotations,
            _ => &[],
        }
    }
}

impl super::Referable for SubmodelElement {
    fn referable(&self) -> &super::ReferableAttributes {
        &self.attributes().referable
    }
}

impl super::HasSemantics for SubmodelElement {
    fn semantics(&self) -> &super::SemanticAttributes {
        &self.attributes().semantics
    }
}

impl super::Qualifiable for SubmodelElement {
    fn qualifiers(&self) -> &[super::Qualifier] {
        &self.attributes().qualifiers
    }
}

impl super::HasDataSpecification for SubmodelElement {
    fn embedded_data_specifications(&self) -> &[super::EmbeddedDataSpecification] {
        &self.attributes().embedded_data_specifications
    }
}

/// A typed single value.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Shared attributes.
    pub attributes: ElementAttributes,
    /// Datatype of `value`.
    pub value_type: DataTypeDefXsd,
    /// Typed value.
    pub value: Option<Value>,
    /// Semantic id of the value.
    pub value_id: Option<Reference>,
}

impl Property {
    /// A property without value.
    #[must_use]
    pub fn new(attributes: ElementAttributes, value_type: DataTypeDefXsd) -> Self {
        Self {
            attributes,
            value_type,
            value: None,
            value_id: None,
        }
    }
}

/// A localized text value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiLanguageProperty {
    /// Shared attributes.
    pub attributes: ElementAttributes,
    /// Localized value.
    pub value: Option<LangStringSet>,
    /// Semantic id of the value.
    pub value_id: Option<Reference>,
}

/// A typed interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    /// Shared attributes.
    pub attributes: ElementAttributes,
    /// Datatype of both bounds.
    pub value_type: DataTypeDefXsd,
    /// Lower bound.
    pub min: Option<Value>,
    /// Upper bound.
    pub max: Option<Value>,
}

/// Inline binary content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blob {
    /// Shared attributes.
    pub attributes: ElementAttributes,
    /// Content bytes.
    pub value: Option<Vec<u8>>,
    /// MIME type.
    pub content_type: String,
}

/// A pointer to a file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct File {
    /// Shared attributes.
    pub attributes: ElementAttributes,
    /// Path or URI.
    pub value: Option<String>,
    /// MIME type.
    pub content_type: String,
}

/// A reference-valued element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceElement {
    /// Shared attributes.
    pub attributes: ElementAttributes,
    /// Referenced entity.
    pub value: Option<Reference>,
}

/// A capability marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Capability {
    /// Shared attributes.
    pub attributes: ElementAttributes,
}

/// A relationship between two entities.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipElement {
    /// Shared attributes.
    pub attributes: ElementAttributes,
    /// Subject.
    pub first: Reference,
    /// Object.
    pub second: Reference,
}

/// A relationship carrying data elements as annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRelationshipElement {
    /// Shared attributes.
    pub attributes: ElementAttributes,
    /// Subject.
    pub first: Reference,
    /// Object.
    pub second: Reference,
    /// Annotations; data elements only.
    pub annotations: Vec<SubmodelElement>,
}

/// An asset-related entity with statements about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Shared attributes.
    pub attributes: ElementAttributes,
    /// Statements.
    pub statements: Vec<SubmodelElement>,
    /// Co-managed or self-managed.
    pub entity_type: EntityType,
    /// Global asset id.
    pub global_asset_id: Option<String>,
    /// Specific asset ids.
    pub specific_asset_ids: Vec<SpecificAssetId>,
}

/// An operation signature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Operation {
    /// Shared attributes.
    pub attributes: ElementAttributes,
    /// Input variables.
    pub input_variables: Vec<SubmodelElement>,
    /// Output variables.
    pub output_variables: Vec<SubmodelElement>,
    /// In-output variables.
    pub inoutput_variables: Vec<SubmodelElement>,
}

/// An event source or sink.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicEventElement {
    /// Shared attributes.
    pub attributes: ElementAttributes,
    /// Observed entity.
    pub observed: ModelReference,
    /// Input or output.
    pub direction: Direction,
    /// On or off.
    pub state: StateOfEvent,
    /// Message topic.
    pub message_topic: Option<String>,
    /// Message broker.
    pub message_broker: Option<ModelReference>,
    /// Time of the last update.
    pub last_update: Option<DateTime>,
    /// Minimum interval between events.
    pub min_interval: Option<Duration>,
    /// Maximum interval between events.
    pub max_interval: Option<Duration>,
}

/// A set of named elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmodelElementCollection {
    /// Shared attributes.
    pub attributes: ElementAttributes,
    /// Children.
    pub value: Vec<SubmodelElement>,
}

/// A list of elements of one kind.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmodelElementList {
    /// Shared attributes.
    pub attributes: ElementAttributes,
    /// Whether element order is significant.
    pub order_relevant: bool,
    /// Semantic id every element shares.
    pub semantic_id_list_element: Option<Reference>,
    /// Kind every element has.
    pub type_value_list_element: KeyType,
    /// Datatype every Property or Range element has.
    pub value_type_list_element: Option<DataTypeDefXsd>,
    /// Elements.
    pub value: Vec<SubmodelElement>,
}

impl SubmodelElementList {
    /// An empty, order-relevant list of the given kind.
    #[must_use]
    pub fn new(attributes: ElementAttributes, type_value_list_element: KeyType) -> Self {
        Self {
            attributes,
            order_relevant: true,
            semantic_id_list_element: None,
            type_value_list_element,
            value_type_list_element: None,
            value: Vec::new(),
        }
    }
}

element_capabilities!(
    Property,
    MultiLanguageProperty,
    Range,
    Blob,
    File,
    ReferenceElement,
    Capability,
    RelationshipElement,
    AnnotatedRelationshipElement,
    Entity,
    Operation,
    BasicEventElement,
    SubmodelElementCollection,
    SubmodelElementList,
);

macro_rules! into_element {
    ($($variant:ident),+ $(,)?) => {
        $(
            impl From<$variant> for SubmodelElement {
                fn from(element: $variant) -> Self {
                    Self::$variant(element)
                }
            }
        )+
    };
}

into_element!(
    Property,
    MultiLanguageProperty,
    Range,
    Blob,
    File,
    ReferenceElement,
    Capability,
    RelationshipElement,
    AnnotatedRelationshipElement,
    Entity,
    Operation,
    BasicEventElement,
    SubmodelElementCollection,
    SubmodelElementList,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HasExtension, Referable};

    #[test]
    fn data_element_classification() {
        let property: SubmodelElement =
            Property::new(ElementAttributes::named("p"), DataTypeDefXsd::Int).into();
        assert!(property.is_data_element());
        let collection: SubmodelElement = SubmodelElementCollection::default().into();
        assert!(!collection.is_data_element());
        assert_eq!(property.id_short(), Some("p"));
        assert!(property.extensions().is_empty());
    }

    #[test]
    fn children_of_nesting_kinds() {
        let inner: SubmodelElement = Capability::default().into();
        let collection: SubmodelElement = SubmodelElementCollection {
            attributes: ElementAttributes::named("c"),
            value: vec![inner.clone()],
        }
        .into();
        assert_eq!(collection.children(), &[inner][..]);
        assert!(SubmodelElement::from(Capability::default()).children().is_empty());
    }
}
