//! Enumerations of the metamodel and their canonical tokens.

use crate::registry::token_enum;

token_enum! {
    /// Whether an element is a template or an instance.
    pub enum ModellingKind as "ModellingKind" {
        /// Template
        Template => "Template",
        /// Instance
        Instance => "Instance",
    }
}

impl Default for ModellingKind {
    fn default() -> Self {
        Self::Instance
    }
}

token_enum! {
    /// Kind of the asset an administration shell represents.
    pub enum AssetKind as "AssetKind" {
        /// Type
        Type => "Type",
        /// Instance
        Instance => "Instance",
        /// NotApplicable
        NotApplicable => "NotApplicable",
    }
}

token_enum! {
    /// Level at which a qualifier applies.
    pub enum QualifierKind as "QualifierKind" {
        /// ValueQualifier
        ValueQualifier => "ValueQualifier",
        /// ConceptQualifier
        ConceptQualifier => "ConceptQualifier",
        /// TemplateQualifier
        TemplateQualifier => "TemplateQualifier",
    }
}

impl Default for QualifierKind {
    fn default() -> Self {
        Self::ConceptQualifier
    }
}

token_enum! {
    /// Direction of a basic event element.
    pub enum Direction as "Direction" {
        /// input
        Input => "input",
        /// output
        Output => "output",
    }
}

token_enum! {
    /// Whether a basic event element is active.
    pub enum StateOfEvent as "StateOfEvent" {
        /// on
        On => "on",
        /// off
        Off => "off",
    }
}

token_enum! {
    /// Reference variant discriminator.
    pub enum ReferenceTypes as "ReferenceTypes" {
        /// ExternalReference
        ExternalReference => "ExternalReference",
        /// ModelReference
        ModelReference => "ModelReference",
    }
}

token_enum! {
    /// Self-managed or co-managed entity.
    pub enum EntityType as "EntityType" {
        /// CoManagedEntity
        CoManagedEntity => "CoManagedEntity",
        /// SelfManagedEntity
        SelfManagedEntity => "SelfManagedEntity",
    }
}

token_enum! {
    /// Type of a key inside a reference's key chain.
    pub enum KeyType as "KeyTypes" {
        /// AnnotatedRelationshipElement
        AnnotatedRelationshipElement => "AnnotatedRelationshipElement",
        /// AssetAdministrationShell
        AssetAdministrationShell => "AssetAdministrationShell",
        /// BasicEventElement
        BasicEventElement => "BasicEventElement",
        /// Blob
        Blob => "Blob",
        /// Capability
        Capability => "Capability",
        /// ConceptDescription
        ConceptDescription => "ConceptDescription",
        /// DataElement
        DataElement => "DataElement",
        /// Entity
        Entity => "Entity",
        /// EventElement
        EventElement => "EventElement",
        /// File
        File => "File",
        /// FragmentReference
        FragmentReference => "FragmentReference",
        /// GlobalReference
        GlobalReference => "GlobalReference",
        /// Identifiable
        Identifiable => "Identifiable",
        /// MultiLanguageProperty
        MultiLanguageProperty => "MultiLanguageProperty",
        /// Operation
        Operation => "Operation",
        /// Property
        Property => "Property",
        /// Range
        Range => "Range",
        /// Referable
        Referable => "Referable",
        /// ReferenceElement
        ReferenceElement => "ReferenceElement",
        /// RelationshipElement
        RelationshipElement => "RelationshipElement",
        /// Submodel
        Submodel => "Submodel",
        /// SubmodelElement
        SubmodelElement => "SubmodelElement",
        /// SubmodelElementCollection
        SubmodelElementCollection => "SubmodelElementCollection",
        /// SubmodelElementList
        SubmodelElementList => "SubmodelElementList",
    }
}

impl KeyType {
    /// True if this key type names a Referable kind, concrete or abstract.
    /// `GlobalReference` and `FragmentReference` point outside the model.
    #[must_use]
    pub fn is_referable(self) -> bool {
        !matches!(self, Self::GlobalReference | Self::FragmentReference)
    }

    /// The direct abstract supertype, following the metamodel hierarchy.
    #[must_use]
    pub fn parent(self) -> Option<KeyType> {
        match self {
            Self::Referable | Self::GlobalReference | Self::FragmentReference => None,
            Self::Identifiable | Self::SubmodelElement => Some(Self::Referable),
            Self::AssetAdministrationShell | Self::Submodel | Self::ConceptDescription => {
                Some(Self::Identifiable)
            }
            Self::DataElement
            | Self::EventElement
            | Self::Capability
            | Self::Entity
            | Self::Operation
            | Self::RelationshipElement
            | Self::SubmodelElementCollection
            | Self::SubmodelElementList => Some(Self::SubmodelElement),
            Self::Blob
            | Self::File
            | Self::MultiLanguageProperty
            | Self::Property
            | Self::Range
            | Self::ReferenceElement => Some(Self::DataElement),
            Self::BasicEventElement => Some(Self::EventElement),
            Self::AnnotatedRelationshipElement => Some(Self::RelationshipElement),
        }
    }

    /// True if `self` equals `other` or inherits from it.
    #[must_use]
    pub fn is_subtype_of(self, other: KeyType) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == other {
                return true;
            }
            current = kind.parent();
        }
        false
    }
}

token_enum! {
    /// Data types of the IEC 61360 data specification.
    pub enum DataTypeIec61360 as "DataTypeIec61360" {
        /// DATE
        Date => "DATE",
        /// STRING
        String => "STRING",
        /// STRING_TRANSLATABLE
        StringTranslatable => "STRING_TRANSLATABLE",
        /// INTEGER_MEASURE
        IntegerMeasure => "INTEGER_MEASURE",
        /// INTEGER_COUNT
        IntegerCount => "INTEGER_COUNT",
        /// INTEGER_CURRENCY
        IntegerCurrency => "INTEGER_CURRENCY",
        /// REAL_MEASURE
        RealMeasure => "REAL_MEASURE",
        /// REAL_COUNT
        RealCount => "REAL_COUNT",
        /// REAL_CURRENCY
        RealCurrency => "REAL_CURRENCY",
        /// BOOLEAN
        Boolean => "BOOLEAN",
        /// IRI
        Iri => "IRI",
        /// IRDI
        Irdi => "IRDI",
        /// RATIONAL
        Rational => "RATIONAL",
        /// RATIONAL_MEASURE
        RationalMeasure => "RATIONAL_MEASURE",
        /// TIME
        Time => "TIME",
        /// TIMESTAMP
        Timestamp => "TIMESTAMP",
        /// HTML
        Html => "HTML",
        /// BLOB
        Blob => "BLOB",
        /// FILE
        File => "FILE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Token;

    #[test]
    fn tokens_round_trip() {
        for kind in KeyType::ALL {
            assert_eq!(KeyType::from_token(kind.as_str()).ok(), Some(*kind));
        }
        for kind in DataTypeIec61360::ALL {
            assert_eq!(kind.as_str().parse::<DataTypeIec61360>().ok(), Some(*kind));
        }
        assert_eq!(KeyType::ALL.len(), 24);
        assert_eq!(DataTypeIec61360::ALL.len(), 19);
    }

    #[test]
    fn tokens_are_case_sensitive() {
        assert!("Input".parse::<Direction>().is_err());
        assert!("input".parse::<Direction>().is_ok());
        assert!("template".parse::<ModellingKind>().is_err());
    }

    #[test]
    fn key_type_hierarchy() {
        assert!(KeyType::Submodel.is_subtype_of(KeyType::Referable));
        assert!(KeyType::Submodel.is_subtype_of(KeyType::Identifiable));
        assert!(KeyType::Property.is_subtype_of(KeyType::DataElement));
        assert!(KeyType::Property.is_subtype_of(KeyType::SubmodelElement));
        assert!(KeyType::BasicEventElement.is_subtype_of(KeyType::EventElement));
        assert!(!KeyType::Submodel.is_subtype_of(KeyType::SubmodelElement));
        assert!(!KeyType::GlobalReference.is_subtype_of(KeyType::Referable));
        assert!(!KeyType::Entity.is_subtype_of(KeyType::DataElement));
    }

    #[test]
    fn defaults() {
        assert_eq!(ModellingKind::default(), ModellingKind::Instance);
        assert_eq!(QualifierKind::default(), QualifierKind::ConceptQualifier);
    }
}
