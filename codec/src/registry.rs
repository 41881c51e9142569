//! Capability & type registry.
//!
//! Two kinds of static tables live here:
//!
//! - bijective token maps for every enumeration the formats carry, generated
//!   by [`token_enum!`] and exposed through the [`Token`] trait;
//! - the constructor table: a [`Registry`] maps each discriminated entity kind
//!   ([`ModelType`]) to an optional caller-supplied constructor that refines or
//!   replaces what the decoders build by default.
//!
//! A registry is read-only once built and is shared by reference across calls.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};
use crate::model::{KeyType, ModelObject};

/// An enumeration with one canonical wire token per variant.
pub trait Token: Copy + Sized + 'static {
    /// Enumeration name used in diagnostics.
    const ENUMERATION: &'static str;
    /// Every variant, in declaration order.
    const ALL: &'static [Self];

    /// The canonical token of this variant.
    fn token(self) -> &'static str;

    /// Looks up the variant for a canonical token.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEnumValue` if `token` matches no variant exactly.
    fn from_token(token: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|variant| variant.token() == token)
            .ok_or_else(|| Error::invalid_enum(Self::ENUMERATION, token))
    }
}

/// Declares an enumeration together with its canonical token table.
macro_rules! token_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident as $enumeration:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $token:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $crate::registry::Token for $name {
            const ENUMERATION: &'static str = $enumeration;
            const ALL: &'static [Self] = &[$(Self::$variant,)+];

            fn token(self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)+
                }
            }
        }

        impl $name {
            /// Returns the canonical wire token.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                $crate::registry::Token::token(self)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::Error;

            fn from_str(token: &str) -> ::std::result::Result<Self, Self::Err> {
                <Self as $crate::registry::Token>::from_token(token)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use token_enum;

token_enum! {
    /// Discriminator of every entity kind that self-describes on the wire:
    /// the text format's `modelType` value.
    pub enum ModelType as "modelType" {
        /// `AssetAdministrationShell`
        AssetAdministrationShell => "AssetAdministrationShell",
        /// `Submodel`
        Submodel => "Submodel",
        /// `ConceptDescription`
        ConceptDescription => "ConceptDescription",
        /// `AnnotatedRelationshipElement`
        AnnotatedRelationshipElement => "AnnotatedRelationshipElement",
        /// `BasicEventElement`
        BasicEventElement => "BasicEventElement",
        /// `Blob`
        Blob => "Blob",
        /// `Capability`
        Capability => "Capability",
        /// `Entity`
        Entity => "Entity",
        /// `File`
        File => "File",
        /// `MultiLanguageProperty`
        MultiLanguageProperty => "MultiLanguageProperty",
        /// `Operation`
        Operation => "Operation",
        /// `Property`
        Property => "Property",
        /// `Range`
        Range => "Range",
        /// `ReferenceElement`
        ReferenceElement => "ReferenceElement",
        /// `RelationshipElement`
        RelationshipElement => "RelationshipElement",
        /// `SubmodelElementCollection`
        SubmodelElementCollection => "SubmodelElementCollection",
        /// `SubmodelElementList`
        SubmodelElementList => "SubmodelElementList",
        /// `DataSpecificationIec61360`
        DataSpecificationIec61360 => "DataSpecificationIec61360",
    }
}

impl ModelType {
    /// The key type addressing entities of this kind, if any.
    #[must_use]
    pub fn key_type(self) -> Option<KeyType> {
        let key = match self {
            Self::AssetAdministrationShell => KeyType::AssetAdministrationShell,
            Self::Submodel => KeyType::Submodel,
            Self::ConceptDescription => KeyType::ConceptDescription,
            Self::AnnotatedRelationshipElement => KeyType::AnnotatedRelationshipElement,
            Self::BasicEventElement => KeyType::BasicEventElement,
            Self::Blob => KeyType::Blob,
            Self::Capability => KeyType::Capability,
            Self::Entity => KeyType::Entity,
            Self::File => KeyType::File,
            Self::MultiLanguageProperty => KeyType::MultiLanguageProperty,
            Self::Operation => KeyType::Operation,
            Self::Property => KeyType::Property,
            Self::Range => KeyType::Range,
            Self::ReferenceElement => KeyType::ReferenceElement,
            Self::RelationshipElement => KeyType::RelationshipElement,
            Self::SubmodelElementCollection => KeyType::SubmodelElementCollection,
            Self::SubmodelElementList => KeyType::SubmodelElementList,
            Self::DataSpecificationIec61360 => return None,
        };
        Some(key)
    }

    /// Name of the default constructor, used in context frames
    /// (`construct_basic_event_element`).
    #[must_use]
    pub fn constructor_name(self) -> String {
        let mut name = String::from("construct");
        for c in self.as_str().chars() {
            if c.is_ascii_uppercase() {
                name.push('_');
                name.push(c.to_ascii_lowercase());
            } else {
                name.push(c);
            }
        }
        name
    }

    /// True for the fourteen concrete submodel element kinds.
    #[must_use]
    pub fn is_submodel_element(self) -> bool {
        self.key_type()
            .is_some_and(|key| key.is_subtype_of(KeyType::SubmodelElement))
    }
}

/// A caller-supplied constructor for one entity kind.
///
/// It receives the object the decoder built by default and returns the object
/// to use instead, or an error that is handled like any construction failure.
pub type Constructor = Arc<dyn Fn(ModelObject) -> Result<ModelObject> + Send + Sync>;

/// Constructor table consulted by both decoders after building each
/// discriminated entity.
#[derive(Clone, Default)]
pub struct Registry {
    constructors: HashMap<ModelType, Constructor>,
}

impl Registry {
    /// A registry with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared default registry.
    #[must_use]
    pub fn standard() -> &'static Registry {
        static STANDARD: OnceLock<Registry> = OnceLock::new();
        STANDARD.get_or_init(Registry::new)
    }

    /// Installs a constructor for `kind`, replacing any previous one.
    #[must_use]
    pub fn with_constructor<F>(mut self, kind: ModelType, constructor: F) -> Self
    where
        F: Fn(ModelObject) -> Result<ModelObject> + Send + Sync + 'static,
    {
        self.constructors.insert(kind, Arc::new(constructor));
        self
    }

    /// Runs the constructor registered for the object's kind, if any.
    ///
    /// # Errors
    ///
    /// Propagates the constructor's error, or returns `TypeMismatch` if the
    /// constructor produced an object of a different kind.
    pub fn construct(&self, object: ModelObject) -> Result<ModelObject> {
        let kind = object.model_type();
        let Some(constructor) = self.constructors.get(&kind) else {
            return Ok(object);
        };
        let built = constructor(object)?;
        if built.model_type() != kind {
            return Err(Error::type_mismatch(kind.as_str(), built.model_type()));
        }
        Ok(built)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&ModelType> = self.constructors.keys().collect();
        kinds.sort();
        f.debug_struct("Registry").field("constructors", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn model_type_tokens_are_bijective() {
        let mut seen = std::collections::HashSet::new();
        for kind in ModelType::ALL {
            assert!(seen.insert(kind.as_str()), "duplicate token {kind}");
            assert_eq!(kind.as_str().parse::<ModelType>().ok(), Some(*kind));
        }
        assert_eq!(ModelType::ALL.len(), 18);
    }

    #[test]
    fn unknown_token_is_invalid_enum_value() {
        let err = "Propertyy".parse::<ModelType>().err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::InvalidEnumValue));
    }

    #[test]
    fn submodel_element_kinds() {
        let count = ModelType::ALL
            .iter()
            .filter(|kind| kind.is_submodel_element())
            .count();
        assert_eq!(count, 14);
        assert!(!ModelType::Submodel.is_submodel_element());
        assert!(!ModelType::DataSpecificationIec61360.is_submodel_element());
    }

    #[test]
    fn constructor_names() {
        assert_eq!(
            ModelType::AssetAdministrationShell.constructor_name(),
            "construct_asset_administration_shell"
        );
        assert_eq!(
            ModelType::DataSpecificationIec61360.constructor_name(),
            "construct_data_specification_iec61360"
        );
    }

    #[test]
    fn override_must_keep_the_kind() {
        let registry = Registry::new().with_constructor(ModelType::Capability, |_| {
            Ok(ModelObject::SubmodelElement(
                crate::model::Property::new(
                    crate::model::ElementAttributes::named("p"),
                    crate::model::DataTypeDefXsd::String,
                )
                .into(),
            ))
        });
        let capability = ModelObject::SubmodelElement(crate::model::Capability::default().into());
        let err = registry.construct(capability).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::TypeMismatch));
    }
}
