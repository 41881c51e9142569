//! Bottom-up JSON decoding.
//!
//! The input is parsed into a [`serde_json::Value`] and folded post-order
//! into a [`Node`] tree. Every completed object passes through [`hook`],
//! innermost first: objects carrying a `modelType` are constructed on the
//! spot, so a constructor always sees its children already typed. Fragments
//! without a discriminator (references, qualifiers, lang strings, ...) stay
//! raw until the enclosing constructor builds them at the point of use.

use std::collections::BTreeMap;
use std::io::Read;

use base64::Engine as _;
use serde_json::Value as Json;

use crate::environment::{Environment, Group};
use crate::error::{Error, ErrorKind, Result};
use crate::failsafe::DecodeContext;
use crate::fragment::{Fragment, Selector};
use crate::model::{
    AdministrativeInformation, AnnotatedRelationshipElement, AssetAdministrationShell,
    AssetInformation, BasicEventElement, Blob, Capability, ConceptDescription,
    DataSpecificationContent, DataSpecificationIec61360, DataTypeDefXsd, DateTime, Duration,
    ElementAttributes, EmbeddedDataSpecification, Entity, ExternalReference, Extension, File,
    Identification, Key, KeyType, LangString, LangStringSet, LevelType, ModelObject, ModelReference,
    MultiLanguageProperty, Operation, Property, Qualifier, Range, ReferableAttributes, Reference,
    ReferenceElement, RelationshipElement, Resource, SemanticAttributes, SpecificAssetId,
    Submodel, SubmodelElement, SubmodelElementCollection, SubmodelElementList, Value, ValueList,
    ValueReferencePair,
};
use crate::reference::{self, ReferenceParts, TargetPolicy};
use crate::registry::{ModelType, Token};

/// A JSON value after the fold: objects with a known `modelType` are
/// replaced by the entity built from them.
#[derive(Debug)]
pub(crate) enum Node {
    /// A discriminated object whose construction failed and was already
    /// reported; its parent drops it without a second diagnostic.
    Dropped,
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<Node>),
    Map(BTreeMap<String, Node>),
    Object(Box<ModelObject>),
}

impl Node {
    fn describe(&self) -> String {
        match self {
            Self::Dropped => "dropped object".to_owned(),
            Self::Null => "null".to_owned(),
            Self::Bool(_) => "boolean".to_owned(),
            Self::Number(n) => format!("number {n}"),
            Self::String(_) => "string".to_owned(),
            Self::Array(_) => "array".to_owned(),
            Self::Map(fields) => match fields.get("modelType") {
                Some(Self::String(name)) => format!("unconverted {name} object"),
                _ => "object without modelType".to_owned(),
            },
            Self::Object(object) => object.model_type().to_string(),
        }
    }
}

// =============================================================================
// Fold and hook
// =============================================================================

fn fold(ctx: &DecodeContext<'_>, value: Json) -> Result<Node> {
    match value {
        Json::Null => Ok(Node::Null),
        Json::Bool(b) => Ok(Node::Bool(b)),
        Json::Number(n) => Ok(Node::Number(n)),
        Json::String(s) => Ok(Node::String(s)),
        Json::Array(items) => ctx.descend(|| {
            items
                .into_iter()
                .map(|item| fold(ctx, item))
                .collect::<Result<Vec<_>>>()
                .map(Node::Array)
        }),
        Json::Object(map) => ctx.descend(|| {
            let fields = fold_map(ctx, map)?;
            hook(ctx, fields)
        }),
    }
}

fn fold_map(
    ctx: &DecodeContext<'_>,
    map: serde_json::Map<String, Json>,
) -> Result<BTreeMap<String, Node>> {
    map.into_iter()
        .map(|(key, value)| Ok((key, fold(ctx, value)?)))
        .collect()
}

/// Called once per completed object. Objects without a discriminator are
/// returned unchanged; a failed construction is reported here and leaves
/// [`Node::Dropped`] behind in failsafe mode.
fn hook(ctx: &DecodeContext<'_>, mut fields: BTreeMap<String, Node>) -> Result<Node> {
    match build(ctx, &mut fields) {
        Ok(Some(object)) => Ok(Node::Object(Box::new(object))),
        Ok(None) => Ok(Node::Map(fields)),
        Err(err) => {
            ctx.skip(err)?;
            Ok(Node::Dropped)
        }
    }
}

fn build(
    ctx: &DecodeContext<'_>,
    fields: &mut BTreeMap<String, Node>,
) -> Result<Option<ModelObject>> {
    let name = match fields.get("modelType") {
        None => return Ok(None),
        Some(Node::String(name)) => name.clone(),
        Some(other) => {
            ctx.warn(
                ErrorKind::TypeMismatch,
                format!("JSON object has unexpected format of modelType: {}", other.describe()),
            );
            return Ok(None);
        }
    };
    let kind = name
        .parse::<ModelType>()
        .map_err(|_| Error::unknown_discriminator("modelType", &name))?;
    let label = label(kind, fields);
    tracing::debug!(kind = kind.as_str(), "constructing {}", label);
    let mut object = Fields {
        owner: label.clone(),
        map: std::mem::take(fields),
    };
    let built = construct_object(ctx, kind, &mut object)
        .and_then(|default| ctx.registry.construct(default));
    *fields = object.map;
    built.map(Some).map_err(|err| {
        err.context(format!(
            "Failed to construct {label} using {}!",
            kind.constructor_name()
        ))
    })
}

fn label(kind: ModelType, fields: &BTreeMap<String, Node>) -> String {
    match fields.get("idShort").or_else(|| fields.get("id")) {
        Some(Node::String(name)) => format!("{kind}[{name}]"),
        _ => kind.to_string(),
    }
}

// =============================================================================
// Field access
// =============================================================================

/// The fields of one object, consumed by its constructor.
struct Fields {
    owner: String,
    map: BTreeMap<String, Node>,
}

impl Fields {
    fn new(owner: &str, node: Node) -> Result<Self> {
        match node {
            Node::Map(map) => Ok(Self {
                owner: owner.to_owned(),
                map,
            }),
            other => Err(Error::type_mismatch(
                &format!("{owner} object"),
                other.describe(),
            )),
        }
    }

    fn take(&mut self, key: &str) -> Option<Node> {
        self.map.remove(key)
    }

    fn require(&mut self, key: &str) -> Result<Node> {
        self.take(key)
            .ok_or_else(|| Error::missing_attribute(&self.owner, key))
    }

    fn string(&mut self, key: &str) -> Result<Option<String>> {
        self.take(key).map(|node| string(node, key)).transpose()
    }

    fn require_string(&mut self, key: &str) -> Result<String> {
        string(self.require(key)?, key)
    }

    fn token<T: Token>(&mut self, key: &str) -> Result<Option<T>> {
        self.string(key)?
            .map(|token| T::from_token(&token))
            .transpose()
    }

    fn require_token<T: Token>(&mut self, key: &str) -> Result<T> {
        T::from_token(&self.require_string(key)?)
    }

    fn boolean(&mut self, key: &str) -> Result<Option<bool>> {
        match self.take(key) {
            None => Ok(None),
            Some(Node::Bool(b)) => Ok(Some(b)),
            Some(other) => Err(Error::type_mismatch(
                &format!("boolean in {key}"),
                other.describe(),
            )),
        }
    }

    fn require_boolean(&mut self, key: &str) -> Result<bool> {
        self.boolean(key)?
            .ok_or_else(|| Error::missing_attribute(&self.owner, key))
    }

    /// An absent array is empty.
    fn array(&mut self, key: &str) -> Result<Vec<Node>> {
        match self.take(key) {
            None => Ok(Vec::new()),
            Some(node) => array(node, key),
        }
    }

    fn value(&mut self, key: &str, data_type: DataTypeDefXsd) -> Result<Option<Value>> {
        self.string(key)?
            .map(|text| Value::parse(data_type, &text))
            .transpose()
    }

    fn path(&self, key: &str) -> String {
        format!("{}.{}", self.owner, key)
    }
}

fn string(node: Node, key: &str) -> Result<String> {
    match node {
        Node::String(s) => Ok(s),
        other => Err(Error::type_mismatch(
            &format!("string in {key}"),
            other.describe(),
        )),
    }
}

fn array(node: Node, key: &str) -> Result<Vec<Node>> {
    match node {
        Node::Array(items) => Ok(items),
        other => Err(Error::type_mismatch(
            &format!("array in {key}"),
            other.describe(),
        )),
    }
}

/// Builds an optional helper fragment through the failsafe wrapper.
fn optional<T>(
    ctx: &DecodeContext<'_>,
    f: &mut Fields,
    key: &str,
    name: &str,
    constructor: impl FnOnce(Node) -> Result<T>,
) -> Result<Option<T>> {
    let path = f.path(key);
    ctx.construct(f.take(key), |_| path, name, constructor)
}

/// Builds a mandatory helper fragment; failure fails the caller.
fn mandatory<T>(
    ctx: &DecodeContext<'_>,
    f: &mut Fields,
    key: &str,
    name: &str,
    constructor: impl FnOnce(Node) -> Result<T>,
) -> Result<T> {
    let node = f.require(key)?;
    let path = f.path(key);
    ctx.construct_mandatory(node, |_| path, name, constructor)
}

/// Builds each item of an array attribute through the failsafe wrapper,
/// keeping the ones that succeed.
fn list<T>(
    ctx: &DecodeContext<'_>,
    f: &mut Fields,
    key: &str,
    name: &str,
    mut constructor: impl FnMut(Node) -> Result<T>,
) -> Result<Vec<T>> {
    let path = f.path(key);
    let mut built = Vec::new();
    for (index, item) in f.array(key)?.into_iter().enumerate() {
        let label = |_: &Node| format!("{path}[{index}]");
        if let Some(value) = ctx.construct(Some(item), label, name, &mut constructor)? {
            built.push(value);
        }
    }
    Ok(built)
}

/// Collects the already constructed submodel elements of an array
/// attribute. Anything else is dropped (failsafe) or fails (strict).
fn elements(
    ctx: &DecodeContext<'_>,
    f: &mut Fields,
    key: &str,
    accept: impl Fn(&SubmodelElement) -> bool,
    expected: &str,
) -> Result<Vec<SubmodelElement>> {
    let path = f.path(key);
    let mut built = Vec::new();
    for item in f.array(key)? {
        let found = match item {
            Node::Object(object) => match *object {
                ModelObject::SubmodelElement(element) if accept(&element) => {
                    built.push(element);
                    continue;
                }
                other => other.model_type().to_string(),
            },
            Node::Dropped => continue,
            other => other.describe(),
        };
        ctx.skip(Error::new(
            ErrorKind::TypeMismatch,
            format!("expected {expected} in {path}, but found {found}"),
        ))?;
    }
    Ok(built)
}

fn element_node(node: Node, key: &str) -> Result<SubmodelElement> {
    match node {
        Node::Object(object) => match *object {
            ModelObject::SubmodelElement(element) => Ok(element),
            other => Err(Error::type_mismatch(
                &format!("SubmodelElement in {key}"),
                other.model_type(),
            )),
        },
        other => Err(Error::type_mismatch(
            &format!("SubmodelElement in {key}"),
            other.describe(),
        )),
    }
}

// =============================================================================
// Helper constructors (no discriminator)
// =============================================================================

fn key(node: Node) -> Result<Key> {
    let mut f = Fields::new("Key", node)?;
    Ok(Key {
        kind: f.require_token("type")?,
        value: f.require_string("value")?,
    })
}

fn reference_parts(ctx: &DecodeContext<'_>, node: Node) -> Result<ReferenceParts> {
    let mut f = Fields::new("Reference", node)?;
    let reference_type = f.require_token("type")?;
    let keys = array(f.require("keys")?, "keys")?
        .into_iter()
        .map(key)
        .collect::<Result<Vec<_>>>()?;
    let referred_semantic_id = optional(ctx, &mut f, "referredSemanticId", "construct_reference", |n| {
        reference(ctx, n)
    })?;
    Ok(ReferenceParts {
        reference_type,
        keys,
        referred_semantic_id,
    })
}

fn reference(ctx: &DecodeContext<'_>, node: Node) -> Result<Reference> {
    let parts = reference_parts(ctx, node)?;
    Ok(reference::reference(ctx, parts, TargetPolicy::Inferred))
}

fn model_reference(ctx: &DecodeContext<'_>, node: Node, expected: KeyType) -> Result<ModelReference> {
    let parts = reference_parts(ctx, node)?;
    reference::model_reference(ctx, parts, expected, TargetPolicy::Inferred)
}

fn external_reference(ctx: &DecodeContext<'_>, node: Node) -> Result<ExternalReference> {
    reference::external_reference(reference_parts(ctx, node)?)
}

fn lang_string(node: Node) -> Result<LangString> {
    let mut f = Fields::new("LangString", node)?;
    Ok(LangString {
        language: f.require_string("language")?,
        text: f.require_string("text")?,
    })
}

fn lang_string_set(ctx: &DecodeContext<'_>, node: Node) -> Result<LangStringSet> {
    let mut set = Vec::new();
    for (index, item) in array(node, "lang string set")?.into_iter().enumerate() {
        let label = |_: &Node| format!("LangString[{index}]");
        if let Some(entry) = ctx.construct(Some(item), label, "construct_lang_string", lang_string)? {
            set.push(entry);
        }
    }
    Ok(set)
}

fn semantics(ctx: &DecodeContext<'_>, f: &mut Fields) -> Result<SemanticAttributes> {
    Ok(SemanticAttributes {
        semantic_id: optional(ctx, f, "semanticId", "construct_reference", |n| reference(ctx, n))?,
        supplemental_semantic_ids: list(ctx, f, "supplementalSemanticIds", "construct_reference", |n| {
            reference(ctx, n)
        })?,
    })
}

fn qualifier(ctx: &DecodeContext<'_>, node: Node) -> Result<Qualifier> {
    let mut f = Fields::new("Qualifier", node)?;
    let semantics = semantics(ctx, &mut f)?;
    let value_type = f.require_token("valueType")?;
    Ok(Qualifier {
        semantics,
        kind: f.token("kind")?.unwrap_or_default(),
        qualifier_type: f.require_string("type")?,
        value_type,
        value: f.value("value", value_type)?,
        value_id: optional(ctx, &mut f, "valueId", "construct_reference", |n| reference(ctx, n))?,
    })
}

fn extension(ctx: &DecodeContext<'_>, node: Node) -> Result<Extension> {
    let mut f = Fields::new("Extension", node)?;
    let mut extension = Extension::new(f.require_string("name")?);
    extension.semantics = semantics(ctx, &mut f)?;
    extension.value_type = f.token("valueType")?;
    extension.value = f.value("value", extension.effective_value_type())?;
    extension.refers_to = list(ctx, &mut f, "refersTo", "construct_model_reference", |n| {
        model_reference(ctx, n, KeyType::Referable)
    })?;
    Ok(extension)
}

fn administrative_information(
    ctx: &DecodeContext<'_>,
    node: Node,
) -> Result<AdministrativeInformation> {
    let mut f = Fields::new("AdministrativeInformation", node)?;
    let mut administration = AdministrativeInformation {
        embedded_data_specifications: embedded_data_specifications(ctx, &mut f)?,
        version: f.string("version")?,
        ..AdministrativeInformation::default()
    };
    let revision = f.string("revision")?;
    if administration.version.is_some() {
        administration.revision = revision;
    } else if revision.is_some() {
        ctx.warn(
            ErrorKind::MissingRequiredAttribute,
            "Ignoring 'revision' attribute of AdministrativeInformation object due to missing 'version'",
        );
    }
    administration.creator = optional(ctx, &mut f, "creator", "construct_reference", |n| reference(ctx, n))?;
    administration.template_id = f.string("templateId")?;
    Ok(administration)
}

fn embedded_data_specifications(
    ctx: &DecodeContext<'_>,
    f: &mut Fields,
) -> Result<Vec<EmbeddedDataSpecification>> {
    if ctx.stripped() {
        return Ok(Vec::new());
    }
    list(ctx, f, "embeddedDataSpecifications", "construct_embedded_data_specification", |n| {
        embedded_data_specification(ctx, n)
    })
}

fn embedded_data_specification(
    ctx: &DecodeContext<'_>,
    node: Node,
) -> Result<EmbeddedDataSpecification> {
    let mut f = Fields::new("EmbeddedDataSpecification", node)?;
    Ok(EmbeddedDataSpecification {
        data_specification: mandatory(ctx, &mut f, "dataSpecification", "construct_reference", |n| {
            reference(ctx, n)
        })?,
        data_specification_content: data_specification_content(f.require("dataSpecificationContent")?)?,
    })
}

fn data_specification_content(node: Node) -> Result<DataSpecificationContent> {
    match node {
        Node::Object(object) => match *object {
            ModelObject::DataSpecificationIec61360(content) => {
                Ok(DataSpecificationContent::Iec61360(content))
            }
            other => Err(Error::type_mismatch("DataSpecificationContent", other.model_type())),
        },
        other => Err(Error::type_mismatch("DataSpecificationContent", other.describe())),
    }
}

fn value_reference_pair(ctx: &DecodeContext<'_>, node: Node) -> Result<ValueReferencePair> {
    let mut f = Fields::new("ValueReferencePair", node)?;
    Ok(ValueReferencePair {
        value: f.require_string("value")?,
        value_id: optional(ctx, &mut f, "valueId", "construct_reference", |n| reference(ctx, n))?,
    })
}

fn value_list(ctx: &DecodeContext<'_>, node: Node) -> Result<ValueList> {
    let mut f = Fields::new("ValueList", node)?;
    if !f.map.contains_key("valueReferencePairs") {
        return Err(Error::missing_attribute("ValueList", "valueReferencePairs"));
    }
    Ok(ValueList {
        value_reference_pairs: list(ctx, &mut f, "valueReferencePairs", "construct_value_reference_pair", |n| {
            value_reference_pair(ctx, n)
        })?,
    })
}

fn level_type(node: Node) -> Result<LevelType> {
    let mut f = Fields::new("LevelType", node)?;
    Ok(LevelType {
        min: f.require_boolean("min")?,
        nom: f.require_boolean("nom")?,
        typ: f.require_boolean("typ")?,
        max: f.require_boolean("max")?,
    })
}

fn resource(node: Node) -> Result<Resource> {
    let mut f = Fields::new("Resource", node)?;
    Ok(Resource {
        path: f.require_string("path")?,
        content_type: f.string("contentType")?,
    })
}

fn specific_asset_id(ctx: &DecodeContext<'_>, node: Node) -> Result<SpecificAssetId> {
    let mut f = Fields::new("SpecificAssetId", node)?;
    let mut id = SpecificAssetId::new(f.require_string("name")?, f.require_string("value")?);
    id.semantics = semantics(ctx, &mut f)?;
    id.external_subject_id =
        optional(ctx, &mut f, "externalSubjectId", "construct_reference", |n| reference(ctx, n))?;
    Ok(id)
}

fn specific_asset_ids(ctx: &DecodeContext<'_>, f: &mut Fields) -> Result<Vec<SpecificAssetId>> {
    list(ctx, f, "specificAssetIds", "construct_specific_asset_id", |n| {
        specific_asset_id(ctx, n)
    })
}

fn asset_information(ctx: &DecodeContext<'_>, node: Node) -> Result<AssetInformation> {
    let mut f = Fields::new("AssetInformation", node)?;
    let mut info = AssetInformation::new(f.require_token("assetKind")?);
    info.global_asset_id = f.string("globalAssetId")?;
    info.specific_asset_ids = specific_asset_ids(ctx, &mut f)?;
    info.asset_type = f.string("assetType")?;
    info.default_thumbnail = optional(ctx, &mut f, "defaultThumbnail", "construct_resource", resource)?;
    Ok(info)
}

fn operation_variable(node: Node) -> Result<SubmodelElement> {
    let mut f = Fields::new("OperationVariable", node)?;
    element_node(f.require("value")?, "value")
}

// =============================================================================
// Discriminated constructors
// =============================================================================

fn referable(ctx: &DecodeContext<'_>, f: &mut Fields) -> Result<ReferableAttributes> {
    Ok(ReferableAttributes {
        id_short: f.string("idShort")?,
        category: f.string("category")?,
        display_name: optional(ctx, f, "displayName", "construct_lang_string_set", |n| {
            lang_string_set(ctx, n)
        })?,
        description: optional(ctx, f, "description", "construct_lang_string_set", |n| {
            lang_string_set(ctx, n)
        })?,
        extensions: if ctx.stripped() {
            Vec::new()
        } else {
            list(ctx, f, "extensions", "construct_extension", |n| extension(ctx, n))?
        },
    })
}

fn identification(ctx: &DecodeContext<'_>, f: &mut Fields) -> Result<Identification> {
    Ok(Identification {
        id: f.require_string("id")?,
        administration: optional(ctx, f, "administration", "construct_administrative_information", |n| {
            administrative_information(ctx, n)
        })?,
    })
}

fn element_attributes(ctx: &DecodeContext<'_>, f: &mut Fields) -> Result<ElementAttributes> {
    Ok(ElementAttributes {
        referable: referable(ctx, f)?,
        semantics: semantics(ctx, f)?,
        qualifiers: if ctx.stripped() {
            Vec::new()
        } else {
            list(ctx, f, "qualifiers", "construct_qualifier", |n| qualifier(ctx, n))?
        },
        embedded_data_specifications: embedded_data_specifications(ctx, f)?,
    })
}

fn construct_object(ctx: &DecodeContext<'_>, kind: ModelType, f: &mut Fields) -> Result<ModelObject> {
    Ok(match kind {
        ModelType::AssetAdministrationShell => asset_administration_shell(ctx, f)?.into(),
        ModelType::Submodel => submodel(ctx, f)?.into(),
        ModelType::ConceptDescription => concept_description(ctx, f)?.into(),
        ModelType::DataSpecificationIec61360 => data_specification_iec61360(ctx, f)?.into(),
        element => ModelObject::SubmodelElement(submodel_element(ctx, element, f)?),
    })
}

fn asset_administration_shell(
    ctx: &DecodeContext<'_>,
    f: &mut Fields,
) -> Result<AssetAdministrationShell> {
    let referable = referable(ctx, f)?;
    let identification = identification(ctx, f)?;
    let asset_information = mandatory(ctx, f, "assetInformation", "construct_asset_information", |n| {
        asset_information(ctx, n)
    })?;
    let mut shell = AssetAdministrationShell::new(identification, asset_information);
    shell.referable = referable;
    shell.embedded_data_specifications = embedded_data_specifications(ctx, f)?;
    shell.derived_from = optional(ctx, f, "derivedFrom", "construct_model_reference", |n| {
        model_reference(ctx, n, KeyType::AssetAdministrationShell)
    })?;
    if !ctx.stripped() {
        shell.submodels = list(ctx, f, "submodels", "construct_model_reference", |n| {
            model_reference(ctx, n, KeyType::Submodel)
        })?;
    }
    Ok(shell)
}

fn submodel(ctx: &DecodeContext<'_>, f: &mut Fields) -> Result<Submodel> {
    let attributes = element_attributes(ctx, f)?;
    let mut submodel = Submodel::new(identification(ctx, f)?);
    submodel.attributes = attributes;
    submodel.kind = f.token("kind")?.unwrap_or_default();
    if !ctx.stripped() {
        submodel.submodel_elements = elements(ctx, f, "submodelElements", |_| true, "SubmodelElement")?;
    }
    Ok(submodel)
}

fn concept_description(ctx: &DecodeContext<'_>, f: &mut Fields) -> Result<ConceptDescription> {
    let referable = referable(ctx, f)?;
    let mut concept = ConceptDescription::new(identification(ctx, f)?);
    concept.referable = referable;
    concept.embedded_data_specifications = embedded_data_specifications(ctx, f)?;
    concept.is_case_of = list(ctx, f, "isCaseOf", "construct_reference", |n| reference(ctx, n))?;
    Ok(concept)
}

fn data_specification_iec61360(
    ctx: &DecodeContext<'_>,
    f: &mut Fields,
) -> Result<DataSpecificationIec61360> {
    let set = |f: &mut Fields, key: &str| {
        optional(ctx, f, key, "construct_lang_string_set", |n| lang_string_set(ctx, n))
    };
    Ok(DataSpecificationIec61360 {
        preferred_name: mandatory(ctx, f, "preferredName", "construct_lang_string_set", |n| {
            lang_string_set(ctx, n)
        })?,
        short_name: set(f, "shortName")?,
        unit: f.string("unit")?,
        unit_id: optional(ctx, f, "unitId", "construct_reference", |n| reference(ctx, n))?,
        source_of_definition: f.string("sourceOfDefinition")?,
        symbol: f.string("symbol")?,
        data_type: f.token("dataType")?,
        definition: set(f, "definition")?,
        value_format: f.string("valueFormat")?,
        value_list: optional(ctx, f, "valueList", "construct_value_list", |n| value_list(ctx, n))?,
        value: f.string("value")?,
        level_type: optional(ctx, f, "levelType", "construct_level_type", level_type)?,
    })
}

fn submodel_element(
    ctx: &DecodeContext<'_>,
    kind: ModelType,
    f: &mut Fields,
) -> Result<SubmodelElement> {
    let attributes = element_attributes(ctx, f)?;
    let element: SubmodelElement = match kind {
        ModelType::Property => {
            let value_type = f.require_token("valueType")?;
            Property {
                attributes,
                value_type,
                value: f.value("value", value_type)?,
                value_id: optional(ctx, f, "valueId", "construct_reference", |n| reference(ctx, n))?,
            }
            .into()
        }
        ModelType::MultiLanguageProperty => MultiLanguageProperty {
            attributes,
            value: optional(ctx, f, "value", "construct_lang_string_set", |n| {
                lang_string_set(ctx, n)
            })?,
            value_id: optional(ctx, f, "valueId", "construct_reference", |n| reference(ctx, n))?,
        }
        .into(),
        ModelType::Range => {
            let value_type = f.require_token("valueType")?;
            Range {
                attributes,
                value_type,
                min: f.value("min", value_type)?,
                max: f.value("max", value_type)?,
            }
            .into()
        }
        ModelType::Blob => Blob {
            attributes,
            value: f
                .string("value")?
                .map(|text| {
                    base64::engine::general_purpose::STANDARD
                        .decode(&text)
                        .map_err(|e| Error::invalid_literal("xs:base64Binary", &text).with_source(e))
                })
                .transpose()?,
            content_type: f.require_string("contentType")?,
        }
        .into(),
        ModelType::File => File {
            attributes,
            value: f.string("value")?,
            content_type: f.require_string("contentType")?,
        }
        .into(),
        ModelType::ReferenceElement => ReferenceElement {
            attributes,
            value: optional(ctx, f, "value", "construct_reference", |n| reference(ctx, n))?,
        }
        .into(),
        ModelType::Capability => Capability { attributes }.into(),
        ModelType::RelationshipElement => RelationshipElement {
            attributes,
            first: mandatory(ctx, f, "first", "construct_reference", |n| reference(ctx, n))?,
            second: mandatory(ctx, f, "second", "construct_reference", |n| reference(ctx, n))?,
        }
        .into(),
        ModelType::AnnotatedRelationshipElement => AnnotatedRelationshipElement {
            attributes,
            first: mandatory(ctx, f, "first", "construct_reference", |n| reference(ctx, n))?,
            second: mandatory(ctx, f, "second", "construct_reference", |n| reference(ctx, n))?,
            annotations: if ctx.stripped() {
                Vec::new()
            } else {
                elements(ctx, f, "annotations", SubmodelElement::is_data_element, "DataElement")?
            },
        }
        .into(),
        ModelType::Entity => Entity {
            attributes,
            statements: if ctx.stripped() {
                Vec::new()
            } else {
                elements(ctx, f, "statements", |_| true, "SubmodelElement")?
            },
            entity_type: f.require_token("entityType")?,
            global_asset_id: f.string("globalAssetId")?,
            specific_asset_ids: specific_asset_ids(ctx, f)?,
        }
        .into(),
        ModelType::Operation => Operation {
            attributes,
            input_variables: list(ctx, f, "inputVariables", "construct_operation_variable", operation_variable)?,
            output_variables: list(ctx, f, "outputVariables", "construct_operation_variable", operation_variable)?,
            inoutput_variables: list(ctx, f, "inoutputVariables", "construct_operation_variable", operation_variable)?,
        }
        .into(),
        ModelType::BasicEventElement => BasicEventElement {
            attributes,
            observed: mandatory(ctx, f, "observed", "construct_model_reference", |n| {
                model_reference(ctx, n, KeyType::Referable)
            })?,
            direction: f.require_token("direction")?,
            state: f.require_token("state")?,
            message_topic: f.string("messageTopic")?,
            message_broker: optional(ctx, f, "messageBroker", "construct_model_reference", |n| {
                model_reference(ctx, n, KeyType::Referable)
            })?,
            last_update: f.string("lastUpdate")?.map(|t| t.parse::<DateTime>()).transpose()?,
            min_interval: f.string("minInterval")?.map(|t| t.parse::<Duration>()).transpose()?,
            max_interval: f.string("maxInterval")?.map(|t| t.parse::<Duration>()).transpose()?,
        }
        .into(),
        ModelType::SubmodelElementCollection => SubmodelElementCollection {
            attributes,
            value: if ctx.stripped() {
                Vec::new()
            } else {
                elements(ctx, f, "value", |_| true, "SubmodelElement")?
            },
        }
        .into(),
        ModelType::SubmodelElementList => {
            let type_value_list_element: KeyType = f.require_token("typeValueListElement")?;
            if !type_value_list_element.is_subtype_of(KeyType::SubmodelElement) {
                return Err(Error::type_mismatch(
                    "a SubmodelElement kind in typeValueListElement",
                    type_value_list_element,
                ));
            }
            let mut list = SubmodelElementList::new(attributes, type_value_list_element);
            list.order_relevant = f.boolean("orderRelevant")?.unwrap_or(true);
            list.semantic_id_list_element =
                optional(ctx, f, "semanticIdListElement", "construct_reference", |n| reference(ctx, n))?;
            list.value_type_list_element = f.token("valueTypeListElement")?;
            if !ctx.stripped() {
                list.value = elements(
                    ctx,
                    f,
                    "value",
                    |e| e.key_type().is_subtype_of(type_value_list_element),
                    type_value_list_element.as_str(),
                )?;
            }
            list.into()
        }
        other => return Err(Error::type_mismatch("SubmodelElement", other)),
    };
    Ok(element)
}

// =============================================================================
// Entry points
// =============================================================================

fn parse<R: Read>(reader: R) -> Result<Json> {
    Ok(serde_json::from_reader(reader)?)
}

/// Decodes a whole document.
pub(crate) fn document<R: Read>(ctx: &DecodeContext<'_>, reader: R) -> Result<Environment> {
    let Json::Object(root) = parse(reader)? else {
        return Err(Error::malformed("document root is not a JSON object"));
    };
    let mut root = ctx.descend(|| fold_map(ctx, root))?;
    let mut env = Environment::new();
    for group in Group::ALL {
        let items = match root.remove(group.as_str()) {
            None => continue,
            Some(Node::Array(items)) => items,
            Some(other) => {
                ctx.warn(
                    ErrorKind::TypeMismatch,
                    format!("{} is {}, not an array; skipped", group.as_str(), other.describe()),
                );
                continue;
            }
        };
        for item in items {
            match item {
                Node::Object(object) => env.insert(ctx, group, *object)?,
                Node::Dropped => {}
                other => ctx.skip(
                    Error::type_mismatch(group.model_type().as_str(), other.describe())
                        .context(format!("Failed to add entity to {}!", group.as_str())),
                )?,
            }
        }
    }
    Ok(env)
}

/// Decodes a single fragment of the selected kind.
pub(crate) fn fragment<R: Read>(
    ctx: &DecodeContext<'_>,
    reader: R,
    selector: Selector,
) -> Result<Fragment> {
    let json = parse(reader)?;
    if let Some(accept) = object_selector(selector) {
        let Json::Object(map) = json else {
            return Err(Error::type_mismatch(&format!("{selector} object"), "non-object"));
        };
        let object = ctx.descend(|| {
            let mut fields = fold_map(ctx, map)?;
            build(ctx, &mut fields)?
                .ok_or_else(|| Error::missing_attribute(selector.as_str(), "modelType"))
        })?;
        if !accept(object.model_type()) {
            return Err(Error::type_mismatch(selector.as_str(), object.model_type()));
        }
        return Ok(Fragment::Object(object));
    }
    let node = match json {
        Json::Object(map) => ctx.descend(|| fold_map(ctx, map).map(Node::Map))?,
        other => fold(ctx, other)?,
    };
    helper_fragment(ctx, node, selector)
}

/// For selectors naming discriminated entities, the kinds they accept.
fn object_selector(selector: Selector) -> Option<fn(ModelType) -> bool> {
    let accept: fn(ModelType) -> bool = match selector {
        Selector::SubmodelElement => ModelType::is_submodel_element,
        Selector::DataElement => |kind| {
            kind.key_type()
                .is_some_and(|key| key.is_subtype_of(KeyType::DataElement))
        },
        Selector::DataSpecificationContent | Selector::DataSpecificationIec61360 => {
            |kind| kind == ModelType::DataSpecificationIec61360
        }
        Selector::AnnotatedRelationshipElement => |kind| kind == ModelType::AnnotatedRelationshipElement,
        Selector::BasicEventElement => |kind| kind == ModelType::BasicEventElement,
        Selector::Blob => |kind| kind == ModelType::Blob,
        Selector::Capability => |kind| kind == ModelType::Capability,
        Selector::Entity => |kind| kind == ModelType::Entity,
        Selector::File => |kind| kind == ModelType::File,
        Selector::MultiLanguageProperty => |kind| kind == ModelType::MultiLanguageProperty,
        Selector::Operation => |kind| kind == ModelType::Operation,
        Selector::Property => |kind| kind == ModelType::Property,
        Selector::Range => |kind| kind == ModelType::Range,
        Selector::ReferenceElement => |kind| kind == ModelType::ReferenceElement,
        Selector::RelationshipElement => |kind| kind == ModelType::RelationshipElement,
        Selector::SubmodelElementCollection => |kind| kind == ModelType::SubmodelElementCollection,
        Selector::SubmodelElementList => |kind| kind == ModelType::SubmodelElementList,
        Selector::AssetAdministrationShell => |kind| kind == ModelType::AssetAdministrationShell,
        Selector::Submodel => |kind| kind == ModelType::Submodel,
        Selector::ConceptDescription => |kind| kind == ModelType::ConceptDescription,
        _ => return None,
    };
    Some(accept)
}

fn helper_fragment(ctx: &DecodeContext<'_>, node: Node, selector: Selector) -> Result<Fragment> {
    if let Some(kind) = selector.lang_string_kind() {
        return Ok(Fragment::LangStringSet(kind, lang_string_set(ctx, node)?));
    }
    Ok(match selector {
        Selector::Key => Fragment::Key(key(node)?),
        Selector::Reference => Fragment::Reference(reference(ctx, node)?),
        Selector::ModelReference => {
            Fragment::Reference(model_reference(ctx, node, KeyType::Referable)?.into())
        }
        Selector::ExternalReference => Fragment::Reference(external_reference(ctx, node)?.into()),
        Selector::AdministrativeInformation => {
            Fragment::AdministrativeInformation(administrative_information(ctx, node)?)
        }
        Selector::Qualifier => Fragment::Qualifier(qualifier(ctx, node)?),
        Selector::Extension => Fragment::Extension(extension(ctx, node)?),
        Selector::Resource => Fragment::Resource(resource(node)?),
        Selector::AssetInformation => Fragment::AssetInformation(asset_information(ctx, node)?),
        Selector::SpecificAssetId => Fragment::SpecificAssetId(specific_asset_id(ctx, node)?),
        Selector::ValueReferencePair => {
            Fragment::ValueReferencePair(value_reference_pair(ctx, node)?)
        }
        Selector::ValueList => Fragment::ValueList(value_list(ctx, node)?),
        Selector::EmbeddedDataSpecification => {
            Fragment::EmbeddedDataSpecification(embedded_data_specification(ctx, node)?)
        }
        other => return Err(Error::type_mismatch(other.as_str(), node.describe())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QualifierKind, Referable};
    use crate::options::DecodeOptions;
    use crate::registry::Registry;

    fn decode(text: &str, options: DecodeOptions) -> Result<Environment> {
        let registry = Registry::new();
        let ctx = DecodeContext::new(&registry, options);
        document(&ctx, text.as_bytes())
    }

    #[test]
    fn plain_objects_are_left_alone() {
        let registry = Registry::new();
        let ctx = DecodeContext::new(&registry, DecodeOptions::strict());
        let node = fold(&ctx, serde_json::json!({"a": {"b": 1}})).ok();
        assert!(matches!(node, Some(Node::Map(_))));
    }

    #[test]
    fn nested_objects_are_built_first() {
        let text = r#"{"submodels": [{
            "modelType": "Submodel", "id": "urn:sm",
            "submodelElements": [{
                "modelType": "SubmodelElementCollection", "idShort": "c",
                "value": [{"modelType": "Capability", "idShort": "cap"}]
            }]
        }]}"#;
        let env = decode(text, DecodeOptions::strict()).ok();
        let env = env.as_ref();
        let element = env.and_then(|e| e.submodels.first()).and_then(|s| s.submodel_elements.first());
        let child = element.and_then(|e| e.children().first());
        assert_eq!(child.and_then(|c| c.id_short()), Some("cap"));
    }

    #[test]
    fn qualifier_defaults() {
        let registry = Registry::new();
        let ctx = DecodeContext::new(&registry, DecodeOptions::strict());
        let node = fold(&ctx, serde_json::json!({"type": "unit", "valueType": "xs:string"}));
        let built = node.and_then(|n| qualifier(&ctx, n)).ok();
        assert_eq!(built.as_ref().map(|q| q.kind), Some(QualifierKind::ConceptQualifier));
        assert_eq!(built.and_then(|q| q.value), None);
    }

    #[test]
    fn bad_qualifier_is_dropped_in_failsafe_mode() {
        let text = r#"{"submodels": [{
            "modelType": "Submodel", "id": "urn:sm",
            "qualifiers": [
                {"type": "a", "valueType": "xs:int", "value": "1"},
                {"type": "b", "valueType": "xs:int", "value": "one"}
            ]
        }]}"#;
        let env = decode(text, DecodeOptions::failsafe()).ok();
        let qualifiers = env
            .as_ref()
            .and_then(|e| e.submodels.first())
            .map(|s| s.attributes.qualifiers.len());
        assert_eq!(qualifiers, Some(1));
        let err = decode(text, DecodeOptions::strict()).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::InvalidLiteral));
    }

    #[test]
    fn revision_without_version_is_ignored() {
        let registry = Registry::new();
        let ctx = DecodeContext::new(&registry, DecodeOptions::strict());
        let node = fold(&ctx, serde_json::json!({"revision": "2"}));
        let built = node.and_then(|n| administrative_information(&ctx, n)).ok();
        assert_eq!(built.map(|a| a.revision), Some(None));
        assert_eq!(ctx.into_diagnostics().len(), 1);
    }

    #[test]
    fn list_children_must_match_the_declared_kind() {
        let text = r#"{"submodels": [{
            "modelType": "Submodel", "id": "urn:sm",
            "submodelElements": [{
                "modelType": "SubmodelElementList", "idShort": "l",
                "typeValueListElement": "Property",
                "value": [
                    {"modelType": "Property", "valueType": "xs:int", "value": "1"},
                    {"modelType": "Capability"}
                ]
            }]
        }]}"#;
        let env = decode(text, DecodeOptions::failsafe()).ok();
        let children = env
            .as_ref()
            .and_then(|e| e.submodels.first())
            .and_then(|s| s.submodel_elements.first())
            .map(|l| l.children().len());
        assert_eq!(children, Some(1));
    }

    #[test]
    fn a_failed_child_is_reported_once() {
        let text = r#"{"submodels": [{
            "modelType": "Submodel", "id": "urn:sm",
            "submodelElements": [{
                "modelType": "SubmodelElementCollection", "idShort": "c",
                "value": [
                    {"modelType": "Property", "idShort": "bad", "valueType": "xs:int", "value": "one"},
                    {"modelType": "Capability", "idShort": "cap"}
                ]
            }]
        }]}"#;
        let registry = Registry::new();
        let ctx = DecodeContext::new(&registry, DecodeOptions::failsafe());
        let env = document(&ctx, text.as_bytes()).ok();
        let children = env
            .as_ref()
            .and_then(|e| e.submodels.first())
            .and_then(|s| s.submodel_elements.first())
            .map(|c| c.children().len());
        assert_eq!(children, Some(1));
        let kinds: Vec<_> = ctx.into_diagnostics().iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![ErrorKind::InvalidLiteral]);
    }

    #[test]
    fn non_array_group_is_skipped() {
        let env = decode(r#"{"submodels": {}}"#, DecodeOptions::strict()).ok();
        assert_eq!(env.map(|e| e.is_empty()), Some(true));
    }
}
