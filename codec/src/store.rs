//! An in-memory store of Identifiables, and model reference resolution
//! against it.

use std::collections::btree_map::{self, BTreeMap};
use std::collections::BTreeSet;

use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::model::{KeyType, ModelObject, ModelReference, Referable, SubmodelElement};

/// Identifiables keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectStore {
    objects: BTreeMap<String, ModelObject>,
}

fn identifier(object: &ModelObject) -> Result<String> {
    object
        .as_identifiable()
        .map(|identifiable| identifiable.id().to_owned())
        .ok_or_else(|| Error::type_mismatch("Identifiable", object.model_type()))
}

impl ObjectStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an Identifiable.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateIdentifier` if the id is taken and `TypeMismatch`
    /// if `object` is not an Identifiable.
    pub fn add(&mut self, object: impl Into<ModelObject>) -> Result<()> {
        let object = object.into();
        let id = identifier(&object)?;
        match self.objects.entry(id) {
            btree_map::Entry::Occupied(entry) => Err(Error::duplicate_identifier(entry.key())),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(object);
                Ok(())
            }
        }
    }

    /// The Identifiable with this id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ModelObject> {
        self.objects.get(id)
    }

    /// Removes and returns the Identifiable with this id.
    pub fn discard(&mut self, id: &str) -> Option<ModelObject> {
        self.objects.remove(id)
    }

    /// True if an Identifiable with this id is stored.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    /// Number of stored Identifiables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True for an empty store.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Stored objects in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelObject> {
        self.objects.values()
    }

    /// The stored objects as a document, grouped by kind.
    #[must_use]
    pub fn to_environment(&self) -> Environment {
        let mut env = Environment::new();
        for object in self.objects.values() {
            // ids are unique and every stored object is Identifiable
            let _ = env.add(object.clone());
        }
        env
    }
}

impl<'s> IntoIterator for &'s ObjectStore {
    type Item = &'s ModelObject;
    type IntoIter = btree_map::Values<'s, String, ModelObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.values()
    }
}

/// Moves the entities of a decoded document into `store`.
///
/// An id already in the store is replaced when `replace_existing` is set,
/// otherwise kept (and the new object dropped) when `ignore_existing` is set.
/// Returns the ids taken from `env`.
///
/// # Errors
///
/// Returns `DuplicateIdentifier` for an id already in the store when neither
/// flag is set. Objects moved before the failure stay in the store.
pub fn read_into(
    store: &mut ObjectStore,
    env: Environment,
    replace_existing: bool,
    ignore_existing: bool,
) -> Result<BTreeSet<String>> {
    let mut read = BTreeSet::new();
    let objects = env
        .asset_administration_shells
        .into_iter()
        .map(ModelObject::from)
        .chain(env.submodels.into_iter().map(ModelObject::from))
        .chain(env.concept_descriptions.into_iter().map(ModelObject::from));
    for object in objects {
        let id = identifier(&object)?;
        if store.contains(&id) {
            if replace_existing {
                store.discard(&id);
            } else if ignore_existing {
                tracing::info!("skipping {id}, an Identifiable with this id is already in the store");
                continue;
            } else {
                return Err(Error::duplicate_identifier(&id)
                    .context("Identifiable already exists in the given object store"));
            }
        }
        store.add(object)?;
        read.insert(id);
    }
    Ok(read)
}

// =============================================================================
// Resolution
// =============================================================================

/// Why a model reference could not be followed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The reference has no keys.
    #[error("reference has no keys")]
    NoKeys,
    /// No Identifiable with the first key's value.
    #[error("could not resolve identifier {0}")]
    UnknownIdentifier(String),
    /// The object reached so far has no children.
    #[error("{0} has no children to look up {1} in")]
    NotANamespace(String, String),
    /// No child carries the key's short name.
    #[error("{parent} has no child {id_short}")]
    NoSuchChild {
        /// Description of the parent.
        parent: String,
        /// The short name looked up.
        id_short: String,
    },
    /// A list key that is not a valid index.
    #[error("{index} is not a valid index into {list}")]
    InvalidIndex {
        /// Description of the list.
        list: String,
        /// The key value.
        index: String,
    },
    /// The resolved object is not of the reference's target kind.
    #[error("resolved object is a {found}, but the reference addresses a {expected}")]
    UnexpectedKind {
        /// The reference's target kind.
        expected: KeyType,
        /// Kind of the resolved object.
        found: KeyType,
    },
}

/// The object a model reference points to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'s> {
    /// A stored Identifiable.
    Identifiable(&'s ModelObject),
    /// A submodel element nested in a stored submodel.
    Element(&'s SubmodelElement),
}

impl<'s> Resolved<'s> {
    /// Key type of the resolved object.
    #[must_use]
    pub fn key_type(&self) -> Option<KeyType> {
        match self {
            Self::Identifiable(object) => object.model_type().key_type(),
            Self::Element(element) => Some(element.key_type()),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Identifiable(object) => object
                .as_identifiable()
                .map_or_else(
                    || object.model_type().to_string(),
                    |i| format!("{}[{}]", object.model_type(), i.id()),
                ),
            Self::Element(element) => format!(
                "{}[{}]",
                element.model_type(),
                element.id_short().unwrap_or_default()
            ),
        }
    }

    fn children(self) -> &'s [SubmodelElement] {
        match self {
            Self::Identifiable(ModelObject::Submodel(submodel)) => &submodel.submodel_elements,
            Self::Identifiable(_) => &[],
            Self::Element(element) => element.children(),
        }
    }
}

impl ModelReference {
    /// Follows the key chain inside `store`.
    ///
    /// The first key's value is looked up as an id; every further key
    /// selects a child by short name, or by decimal index inside a
    /// [`SubmodelElementList`](crate::model::SubmodelElementList).
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] naming the step that failed, or
    /// `UnexpectedKind` if the object found is not a subtype of
    /// [`target`](Self::target).
    pub fn resolve<'s>(&self, store: &'s ObjectStore) -> Result<Resolved<'s>, ResolveError> {
        let (first, rest) = self.keys.split_first().ok_or(ResolveError::NoKeys)?;
        let mut current = store
            .get(&first.value)
            .map(Resolved::Identifiable)
            .ok_or_else(|| ResolveError::UnknownIdentifier(first.value.clone()))?;
        for key in rest {
            current = step(current, &key.value)?;
        }
        match current.key_type() {
            Some(found) if !found.is_subtype_of(self.target) => Err(ResolveError::UnexpectedKind {
                expected: self.target,
                found,
            }),
            _ => Ok(current),
        }
    }
}

fn step<'s>(current: Resolved<'s>, value: &str) -> Result<Resolved<'s>, ResolveError> {
    let children = current.children();
    let is_list = matches!(current, Resolved::Element(SubmodelElement::SubmodelElementList(_)));
    if children.is_empty() && !is_list {
        return Err(ResolveError::NotANamespace(current.describe(), value.to_owned()));
    }
    let child = if is_list {
        let index = value.parse::<usize>().map_err(|_| ResolveError::InvalidIndex {
            list: current.describe(),
            index: value.to_owned(),
        })?;
        children.get(index)
    } else {
        children.iter().find(|child| child.id_short() == Some(value))
    };
    child.map(Resolved::Element).ok_or_else(|| ResolveError::NoSuchChild {
        parent: current.describe(),
        id_short: value.to_owned(),
    })
}
