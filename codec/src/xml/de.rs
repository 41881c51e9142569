//! Top-down XML decoding.
//!
//! Each constructor receives its element and searches the level directly
//! below it for the children it needs. Nested constructions go through the
//! failsafe wrapper, so a failure deep in the tree unwinds with one frame
//! per enclosing element:
//!
//! ```text
//! aas:qualifier on line 12 has no child aas:valueType!
//!  -> Failed to construct aas:qualifier on line 12 using construct_qualifier!
//!  -> Failed to construct aas:submodel on line 4 using construct_submodel!
//! ```

use std::io::Read;

use crate::environment::{Environment, Group};
use crate::error::{Error, ErrorKind, Result};
use crate::failsafe::DecodeContext;
use crate::fragment::{Fragment, LangStringKind, Selector};
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

use super::tree::{self, Element, AAS_NAMESPACE};
use super::{kind_of_tag, tag_of};

// =============================================================================
// Child access
// =============================================================================

fn label(element: &&Element) -> String {
    element.label()
}

fn text(parent: &Element, tag: &str) -> Option<String> {
    parent.child(tag).and_then(Element::text).map(str::to_owned)
}

/// Like [`text`], but a present empty element yields `Some("")`.
fn text_or_empty(parent: &Element, tag: &str) -> Option<String> {
    parent
        .child(tag)
        .map(|child| child.text().unwrap_or_default().to_owned())
}

fn require_text(parent: &Element, tag: &str) -> Result<String> {
    parent.require(tag)?.require_text().map(str::to_owned)
}

fn token<T: Token>(parent: &Element, tag: &str) -> Result<Option<T>> {
    text(parent, tag).map(|t| T::from_token(&t)).transpose()
}

fn require_token<T: Token>(parent: &Element, tag: &str) -> Result<T> {
    T::from_token(&require_text(parent, tag)?)
}

fn boolean(element: &Element) -> Result<bool> {
    match element.require_text()? {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(Error::invalid_literal("xs:boolean", other)),
    }
}

/// An empty element is a value only for datatypes whose grammar admits the
/// empty string; otherwise it reads as absent.
fn value(parent: &Element, tag: &str, data_type: DataTypeDefXsd) -> Result<Option<Value>> {
    let Some(text) = text_or_empty(parent, tag) else {
        return Ok(None);
    };
    match Value::parse(data_type, &text) {
        Err(_) if text.is_empty() => Ok(None),
        parsed => parsed.map(Some),
    }
}

/// Builds an optional child through the failsafe wrapper.
fn optional<'e, T>(
    ctx: &DecodeContext<'_>,
    parent: &'e Element,
    tag: &str,
    name: &str,
    constructor: impl FnOnce(&'e Element) -> Result<T>,
) -> Result<Option<T>> {
    ctx.construct(parent.child(tag), label, name, constructor)
}

/// Builds a mandatory child; failure fails the caller in both modes.
fn mandatory<'e, T>(
    ctx: &DecodeContext<'_>,
    parent: &'e Element,
    tag: &str,
    name: &str,
    constructor: impl FnOnce(&'e Element) -> Result<T>,
) -> Result<T> {
    ctx.construct_mandatory(parent.require(tag)?, label, name, constructor)
}

/// The children of `parent` carrying `tag`. Others fail (strict) or are
/// skipped with a warning (failsafe).
fn expect_tag<'e>(ctx: &DecodeContext<'_>, parent: &'e Element, tag: &str) -> Result<Vec<&'e Element>> {
    let mut matching = Vec::new();
    for child in &parent.children {
        if child.is(tag) {
            matching.push(child);
            continue;
        }
        ctx.tolerate(Error::new(
            ErrorKind::TypeMismatch,
            format!(
                "{}, child of {}, doesn't match the expected tag aas:{tag}!",
                child.label(),
                parent.label()
            ),
        ))?;
    }
    Ok(matching)
}

/// Builds every `tag` child of `parent`, keeping the ones that succeed.
fn multiple<'e, T>(
    ctx: &DecodeContext<'_>,
    parent: &'e Element,
    tag: &str,
    name: &str,
    mut constructor: impl FnMut(&'e Element) -> Result<T>,
) -> Result<Vec<T>> {
    let mut built = Vec::new();
    for child in expect_tag(ctx, parent, tag)? {
        if let Some(value) = ctx.construct(Some(child), label, name, &mut constructor)? {
            built.push(value);
        }
    }
    Ok(built)
}

/// [`multiple`] on the items of an optional list element.
fn wrapped<'e, T>(
    ctx: &DecodeContext<'_>,
    parent: &'e Element,
    list: &str,
    item: &str,
    name: &str,
    constructor: impl FnMut(&'e Element) -> Result<T>,
) -> Result<Vec<T>> {
    match parent.child(list) {
        Some(list) => multiple(ctx, list, item, name, constructor),
        None => Ok(Vec::new()),
    }
}

// =============================================================================
// Helper constructors
// =============================================================================

fn key(element: &Element) -> Result<Key> {
    Ok(Key {
        kind: require_token(element, "type")?,
        value: require_text(element, "value")?,
    })
}

fn reference_parts(ctx: &DecodeContext<'_>, element: &Element) -> Result<ReferenceParts> {
    let reference_type = require_token(element, "type")?;
    let keys = multiple(ctx, element.require("keys")?, "key", "construct_key", key)?;
    let referred_semantic_id = optional(ctx, element, "referredSemanticId", "construct_reference", |e| {
        reference(ctx, e)
    })?;
    Ok(ReferenceParts {
        reference_type,
        keys,
        referred_semantic_id,
    })
}

fn reference(ctx: &DecodeContext<'_>, element: &Element) -> Result<Reference> {
    let parts = reference_parts(ctx, element)?;
    Ok(reference::reference(ctx, parts, TargetPolicy::Declared))
}

fn model_reference(ctx: &DecodeContext<'_>, element: &Element, expected: KeyType) -> Result<ModelReference> {
    let parts = reference_parts(ctx, element)?;
    reference::model_reference(ctx, parts, expected, TargetPolicy::Declared)
        .map_err(|err| err.context(format!("{} is not a model reference", element.label())))
}

fn external_reference(ctx: &DecodeContext<'_>, element: &Element) -> Result<ExternalReference> {
    reference::external_reference(reference_parts(ctx, element)?)
}

fn lang_string_set(ctx: &DecodeContext<'_>, element: &Element, kind: LangStringKind) -> Result<LangStringSet> {
    multiple(ctx, element, kind.entry_tag(), "construct_lang_string", |entry| {
        Ok(LangString {
            language: require_text(entry, "language")?,
            text: require_text(entry, "text")?,
        })
    })
}

fn optional_lang_strings(
    ctx: &DecodeContext<'_>,
    parent: &Element,
    tag: &str,
    kind: LangStringKind,
) -> Result<Option<LangStringSet>> {
    optional(ctx, parent, tag, "construct_lang_string_set", |e| lang_string_set(ctx, e, kind))
}

fn semantics(ctx: &DecodeContext<'_>, element: &Element) -> Result<SemanticAttributes> {
    Ok(SemanticAttributes {
        semantic_id: optional(ctx, element, "semanticId", "construct_reference", |e| reference(ctx, e))?,
        supplemental_semantic_ids: wrapped(
            ctx,
            element,
            "supplementalSemanticIds",
            "reference",
            "construct_reference",
            |e| reference(ctx, e),
        )?,
    })
}

fn qualifier(ctx: &DecodeContext<'_>, element: &Element) -> Result<Qualifier> {
    let mut qualifier = Qualifier::new(require_text(element, "type")?, require_token(element, "valueType")?);
    if let Some(kind) = token(element, "kind")? {
        qualifier.kind = kind;
    }
    qualifier.value = value(element, "value", qualifier.value_type)?;
    qualifier.value_id = optional(ctx, element, "valueId", "construct_reference", |e| reference(ctx, e))?;
    qualifier.semantics = semantics(ctx, element)?;
    Ok(qualifier)
}

fn extension(ctx: &DecodeContext<'_>, element: &Element) -> Result<Extension> {
    let mut extension = Extension::new(require_text(element, "name")?);
    extension.value_type = token(element, "valueType")?;
    extension.value = value(element, "value", extension.effective_value_type())?;
    extension.refers_to = wrapped(ctx, element, "refersTo", "reference", "construct_model_reference", |e| {
        model_reference(ctx, e, KeyType::Referable)
    })?;
    extension.semantics = semantics(ctx, element)?;
    Ok(extension)
}

fn administrative_information(ctx: &DecodeContext<'_>, element: &Element) -> Result<AdministrativeInformation> {
    let mut administration = AdministrativeInformation {
        version: text(element, "version"),
        template_id: text(element, "templateId"),
        ..AdministrativeInformation::default()
    };
    let revision = text(element, "revision");
    if administration.version.is_some() {
        administration.revision = revision;
    } else if revision.is_some() {
        ctx.warn(
            ErrorKind::MissingRequiredChild,
            format!("Ignoring aas:revision of {} due to missing aas:version", element.label()),
        );
    }
    administration.creator = optional(ctx, element, "creator", "construct_reference", |e| reference(ctx, e))?;
    administration.embedded_data_specifications = embedded_data_specifications(ctx, element)?;
    Ok(administration)
}

fn embedded_data_specifications(ctx: &DecodeContext<'_>, element: &Element) -> Result<Vec<EmbeddedDataSpecification>> {
    if ctx.stripped() {
        return Ok(Vec::new());
    }
    wrapped(
        ctx,
        element,
        "embeddedDataSpecifications",
        "embeddedDataSpecification",
        "construct_embedded_data_specification",
        |e| embedded_data_specification(ctx, e),
    )
}

fn embedded_data_specification(ctx: &DecodeContext<'_>, element: &Element) -> Result<EmbeddedDataSpecification> {
    let content = element.require("dataSpecificationContent")?;
    let mut inner = content.children.iter();
    let Some(first) = inner.next() else {
        return Err(Error::new(
            ErrorKind::MissingRequiredChild,
            format!("{} has no data specification!", content.label()),
        ));
    };
    if inner.next().is_some() {
        ctx.warn(
            ErrorKind::TypeMismatch,
            format!("{} has more than one data specification, using the first one...", content.label()),
        );
    }
    Ok(EmbeddedDataSpecification {
        data_specification: mandatory(ctx, element, "dataSpecification", "construct_reference", |e| {
            reference(ctx, e)
        })?,
        data_specification_content: ctx.construct_mandatory(
            first,
            label,
            "construct_data_specification_content",
            |e| data_specification_content(ctx, e),
        )?,
    })
}

fn data_specification_content(ctx: &DecodeContext<'_>, element: &Element) -> Result<DataSpecificationContent> {
    if !element.is(&tag_of(ModelType::DataSpecificationIec61360)) {
        return Err(Error::unknown_discriminator("DataSpecificationContent", &element.label()));
    }
    match entity(ctx, ModelType::DataSpecificationIec61360, element)? {
        ModelObject::DataSpecificationIec61360(content) => Ok(DataSpecificationContent::Iec61360(content)),
        other => Err(Error::type_mismatch("DataSpecificationContent", other.model_type())),
    }
}

fn value_reference_pair(ctx: &DecodeContext<'_>, element: &Element) -> Result<ValueReferencePair> {
    Ok(ValueReferencePair {
        value: require_text(element, "value")?,
        value_id: optional(ctx, element, "valueId", "construct_reference", |e| reference(ctx, e))?,
    })
}

fn value_list(ctx: &DecodeContext<'_>, element: &Element) -> Result<ValueList> {
    Ok(ValueList {
        value_reference_pairs: multiple(
            ctx,
            element.require("valueReferencePairs")?,
            "valueReferencePair",
            "construct_value_reference_pair",
            |e| value_reference_pair(ctx, e),
        )?,
    })
}

fn level_type(element: &Element) -> Result<LevelType> {
    Ok(LevelType {
        min: boolean(element.require("min")?)?,
        nom: boolean(element.require("nom")?)?,
        typ: boolean(element.require("typ")?)?,
        max: boolean(element.require("max")?)?,
    })
}

fn resource(element: &Element) -> Result<Resource> {
    Ok(Resource {
        path: require_text(element, "path")?,
        content_type: text(element, "contentType"),
    })
}

fn specific_asset_id(ctx: &DecodeContext<'_>, element: &Element) -> Result<SpecificAssetId> {
    let mut id = SpecificAssetId::new(require_text(element, "name")?, require_text(element, "value")?);
    id.external_subject_id =
        optional(ctx, element, "externalSubjectId", "construct_reference", |e| reference(ctx, e))?;
    id.semantics = semantics(ctx, element)?;
    Ok(id)
}

fn specific_asset_ids(ctx: &DecodeContext<'_>, element: &Element) -> Result<Vec<SpecificAssetId>> {
    wrapped(ctx, element, "specificAssetIds", "specificAssetId", "construct_specific_asset_id", |e| {
        specific_asset_id(ctx, e)
    })
}

fn asset_information(ctx: &DecodeContext<'_>, element: &Element) -> Result<AssetInformation> {
    let mut info = AssetInformation::new(require_token(element, "assetKind")?);
    info.global_asset_id = text(element, "globalAssetId");
    info.specific_asset_ids = specific_asset_ids(ctx, element)?;
    info.asset_type = text(element, "assetType");
    info.default_thumbnail = optional(ctx, element, "defaultThumbnail", "construct_resource", resource)?;
    Ok(info)
}

fn operation_variable(ctx: &DecodeContext<'_>, element: &Element) -> Result<SubmodelElement> {
    let value = element.require("value")?;
    let mut inner = value.children.iter();
    let Some(first) = inner.next() else {
        return Err(Error::new(
            ErrorKind::MissingRequiredChild,
            format!("{} has no submodel element!", value.label()),
        ));
    };
    if inner.next().is_some() {
        ctx.warn(
            ErrorKind::TypeMismatch,
            format!("{} has more than one submodel element, using the first one...", value.label()),
        );
    }
    submodel_element(ctx, first)
}

// =============================================================================
// Discriminated entities
// =============================================================================

fn referable(ctx: &DecodeContext<'_>, element: &Element) -> Result<ReferableAttributes> {
    Ok(ReferableAttributes {
        id_short: text(element, "idShort"),
        category: text(element, "category"),
        display_name: optional_lang_strings(ctx, element, "displayName", LangStringKind::NameType)?,
        description: optional_lang_strings(ctx, element, "description", LangStringKind::TextType)?,
        extensions: if ctx.stripped() {
            Vec::new()
        } else {
            wrapped(ctx, element, "extensions", "extension", "construct_extension", |e| extension(ctx, e))?
        },
    })
}

fn identification(ctx: &DecodeContext<'_>, element: &Element) -> Result<Identification> {
    Ok(Identification {
        id: require_text(element, "id")?,
        administration: optional(
            ctx,
            element,
            "administration",
            "construct_administrative_information",
            |e| administrative_information(ctx, e),
        )?,
    })
}

fn element_attributes(ctx: &DecodeContext<'_>, element: &Element) -> Result<ElementAttributes> {
    Ok(ElementAttributes {
        referable: referable(ctx, element)?,
        semantics: semantics(ctx, element)?,
        qualifiers: if ctx.stripped() {
            Vec::new()
        } else {
            wrapped(ctx, element, "qualifiers", "qualifier", "construct_qualifier", |e| qualifier(ctx, e))?
        },
        embedded_data_specifications: embedded_data_specifications(ctx, element)?,
    })
}

/// Builds a discriminated entity of a known kind and hands it to the
/// registry.
fn entity(ctx: &DecodeContext<'_>, kind: ModelType, element: &Element) -> Result<ModelObject> {
    tracing::debug!(kind = kind.as_str(), "constructing {}", element.label());
    let object = match kind {
        ModelType::AssetAdministrationShell => asset_administration_shell(ctx, element)?.into(),
        ModelType::Submodel => submodel(ctx, element)?.into(),
        ModelType::ConceptDescription => concept_description(ctx, element)?.into(),
        ModelType::DataSpecificationIec61360 => data_specification_iec61360(ctx, element)?.into(),
        element_kind => ModelObject::SubmodelElement(element_of_kind(ctx, element_kind, element)?),
    };
    ctx.registry.construct(object)
}

fn asset_administration_shell(ctx: &DecodeContext<'_>, element: &Element) -> Result<AssetAdministrationShell> {
    let identification = identification(ctx, element)?;
    let asset_information = mandatory(ctx, element, "assetInformation", "construct_asset_information", |e| {
        asset_information(ctx, e)
    })?;
    let mut shell = AssetAdministrationShell::new(identification, asset_information);
    if !ctx.stripped() {
        shell.submodels = wrapped(ctx, element, "submodels", "reference", "construct_model_reference", |e| {
            model_reference(ctx, e, KeyType::Submodel)
        })?;
    }
    shell.derived_from = optional(ctx, element, "derivedFrom", "construct_model_reference", |e| {
        model_reference(ctx, e, KeyType::AssetAdministrationShell)
    })?;
    shell.referable = referable(ctx, element)?;
    shell.embedded_data_specifications = embedded_data_specifications(ctx, element)?;
    Ok(shell)
}

fn submodel(ctx: &DecodeContext<'_>, element: &Element) -> Result<Submodel> {
    let mut submodel = Submodel::new(identification(ctx, element)?);
    submodel.kind = token(element, "kind")?.unwrap_or_default();
    if !ctx.stripped() {
        submodel.submodel_elements = elements(ctx, element, "submodelElements", |_| true, "SubmodelElement")?;
    }
    submodel.attributes = element_attributes(ctx, element)?;
    Ok(submodel)
}

fn concept_description(ctx: &DecodeContext<'_>, element: &Element) -> Result<ConceptDescription> {
    let mut concept = ConceptDescription::new(identification(ctx, element)?);
    concept.is_case_of = wrapped(ctx, element, "isCaseOf", "reference", "construct_reference", |e| {
        reference(ctx, e)
    })?;
    concept.referable = referable(ctx, element)?;
    concept.embedded_data_specifications = embedded_data_specifications(ctx, element)?;
    Ok(concept)
}

fn data_specification_iec61360(ctx: &DecodeContext<'_>, element: &Element) -> Result<DataSpecificationIec61360> {
    Ok(DataSpecificationIec61360 {
        preferred_name: mandatory(ctx, element, "preferredName", "construct_lang_string_set", |e| {
            lang_string_set(ctx, e, LangStringKind::PreferredNameIec61360)
        })?,
        short_name: optional_lang_strings(ctx, element, "shortName", LangStringKind::ShortNameIec61360)?,
        unit: text(element, "unit"),
        unit_id: optional(ctx, element, "unitId", "construct_reference", |e| reference(ctx, e))?,
        source_of_definition: text(element, "sourceOfDefinition"),
        symbol: text(element, "symbol"),
        data_type: token(element, "dataType")?,
        definition: optional_lang_strings(ctx, element, "definition", LangStringKind::DefinitionIec61360)?,
        value_format: text(element, "valueFormat"),
        value_list: optional(ctx, element, "valueList", "construct_value_list", |e| value_list(ctx, e))?,
        value: text(element, "value"),
        level_type: optional(ctx, element, "levelType", "construct_level_type", level_type)?,
    })
}

/// Dispatches on the element's tag over the fourteen element kinds.
fn submodel_element(ctx: &DecodeContext<'_>, element: &Element) -> Result<SubmodelElement> {
    let kind = kind_of_tag(element)
        .filter(|kind| kind.is_submodel_element())
        .ok_or_else(|| Error::unknown_discriminator("SubmodelElement", &element.label()))?;
    match entity(ctx, kind, element)? {
        ModelObject::SubmodelElement(built) => Ok(built),
        other => Err(Error::type_mismatch("SubmodelElement", other.model_type())),
    }
}

/// Builds the submodel elements below the optional list element `tag`,
/// dropping (failsafe) or rejecting (strict) those `accept` refuses.
fn elements(
    ctx: &DecodeContext<'_>,
    parent: &Element,
    tag: &str,
    accept: impl Fn(&SubmodelElement) -> bool,
    expected: &str,
) -> Result<Vec<SubmodelElement>> {
    let Some(list) = parent.child(tag) else {
        return Ok(Vec::new());
    };
    let mut built = Vec::new();
    for child in &list.children {
        let name = kind_of_tag(child)
            .map_or_else(|| "construct_submodel_element".to_owned(), ModelType::constructor_name);
        let Some(element) = ctx.construct(Some(child), label, &name, |e| submodel_element(ctx, e))?
        else {
            continue;
        };
        if accept(&element) {
            built.push(element);
        } else {
            ctx.skip(Error::new(
                ErrorKind::TypeMismatch,
                format!(
                    "expected {expected} in {}, but found {} ({})",
                    list.label(),
                    element.model_type(),
                    child.label()
                ),
            ))?;
        }
    }
    Ok(built)
}

fn duration(element: &Element, tag: &str) -> Result<Option<Duration>> {
    text(element, tag).map(|t| t.parse::<Duration>()).transpose()
}

fn element_of_kind(ctx: &DecodeContext<'_>, kind: ModelType, element: &Element) -> Result<SubmodelElement> {
    let built: SubmodelElement = match kind {
        ModelType::Property => {
            let value_type = require_token(element, "valueType")?;
            Property {
                value: value(element, "value", value_type)?,
                value_id: optional(ctx, element, "valueId", "construct_reference", |e| reference(ctx, e))?,
                attributes: element_attributes(ctx, element)?,
                value_type,
            }
            .into()
        }
        ModelType::MultiLanguageProperty => MultiLanguageProperty {
            value: optional_lang_strings(ctx, element, "value", LangStringKind::TextType)?,
            value_id: optional(ctx, element, "valueId", "construct_reference", |e| reference(ctx, e))?,
            attributes: element_attributes(ctx, element)?,
        }
        .into(),
        ModelType::Range => {
            let value_type = require_token(element, "valueType")?;
            Range {
                min: value(element, "min", value_type)?,
                max: value(element, "max", value_type)?,
                attributes: element_attributes(ctx, element)?,
                value_type,
            }
            .into()
        }
        ModelType::Blob => {
            let content_type = require_text(element, "contentType")?;
            let value = match text_or_empty(element, "value") {
                Some(text) => match Value::parse(DataTypeDefXsd::Base64Binary, &text)? {
                    Value::Base64Binary(bytes) => Some(bytes),
                    other => return Err(Error::type_mismatch("xs:base64Binary", other.data_type())),
                },
                None => None,
            };
            Blob {
                value,
                content_type,
                attributes: element_attributes(ctx, element)?,
            }
            .into()
        }
        ModelType::File => File {
            content_type: require_text(element, "contentType")?,
            value: text(element, "value"),
            attributes: element_attributes(ctx, element)?,
        }
        .into(),
        ModelType::ReferenceElement => ReferenceElement {
            value: optional(ctx, element, "value", "construct_reference", |e| reference(ctx, e))?,
            attributes: element_attributes(ctx, element)?,
        }
        .into(),
        ModelType::Capability => Capability {
            attributes: element_attributes(ctx, element)?,
        }
        .into(),
        ModelType::RelationshipElement => RelationshipElement {
            first: mandatory(ctx, element, "first", "construct_reference", |e| reference(ctx, e))?,
            second: mandatory(ctx, element, "second", "construct_reference", |e| reference(ctx, e))?,
            attributes: element_attributes(ctx, element)?,
        }
        .into(),
        ModelType::AnnotatedRelationshipElement => AnnotatedRelationshipElement {
            first: mandatory(ctx, element, "first", "construct_reference", |e| reference(ctx, e))?,
            second: mandatory(ctx, element, "second", "construct_reference", |e| reference(ctx, e))?,
            annotations: if ctx.stripped() {
                Vec::new()
            } else {
                elements(ctx, element, "annotations", SubmodelElement::is_data_element, "DataElement")?
            },
            attributes: element_attributes(ctx, element)?,
        }
        .into(),
        ModelType::Entity => Entity {
            entity_type: require_token(element, "entityType")?,
            global_asset_id: text(element, "globalAssetId"),
            specific_asset_ids: specific_asset_ids(ctx, element)?,
            statements: if ctx.stripped() {
                Vec::new()
            } else {
                elements(ctx, element, "statements", |_| true, "SubmodelElement")?
            },
            attributes: element_attributes(ctx, element)?,
        }
        .into(),
        ModelType::Operation => {
            let variables = |tag: &str| {
                wrapped(ctx, element, tag, "operationVariable", "construct_operation_variable", |e| {
                    operation_variable(ctx, e)
                })
            };
            Operation {
                input_variables: variables("inputVariables")?,
                output_variables: variables("outputVariables")?,
                inoutput_variables: variables("inoutputVariables")?,
                attributes: element_attributes(ctx, element)?,
            }
            .into()
        }
        ModelType::BasicEventElement => BasicEventElement {
            observed: mandatory(ctx, element, "observed", "construct_model_reference", |e| {
                model_reference(ctx, e, KeyType::Referable)
            })?,
            direction: require_token(element, "direction")?,
            state: require_token(element, "state")?,
            message_topic: text(element, "messageTopic"),
            message_broker: optional(ctx, element, "messageBroker", "construct_model_reference", |e| {
                model_reference(ctx, e, KeyType::Referable)
            })?,
            last_update: text(element, "lastUpdate").map(|t| t.parse::<DateTime>()).transpose()?,
            min_interval: duration(element, "minInterval")?,
            max_interval: duration(element, "maxInterval")?,
            attributes: element_attributes(ctx, element)?,
        }
        .into(),
        ModelType::SubmodelElementCollection => SubmodelElementCollection {
            value: if ctx.stripped() {
                Vec::new()
            } else {
                elements(ctx, element, "value", |_| true, "SubmodelElement")?
            },
            attributes: element_attributes(ctx, element)?,
        }
        .into(),
        ModelType::SubmodelElementList => {
            let type_value_list_element: KeyType = require_token(element, "typeValueListElement")?;
            if !type_value_list_element.is_subtype_of(KeyType::SubmodelElement) {
                return Err(Error::type_mismatch(
                    "a SubmodelElement kind in aas:typeValueListElement",
                    type_value_list_element,
                ));
            }
            let mut list = SubmodelElementList::new(element_attributes(ctx, element)?, type_value_list_element);
            if let Some(order_relevant) = element.child("orderRelevant") {
                list.order_relevant = boolean(order_relevant)?;
            }
            list.semantic_id_list_element =
                optional(ctx, element, "semanticIdListElement", "construct_reference", |e| reference(ctx, e))?;
            list.value_type_list_element = token(element, "valueTypeListElement")?;
            if !ctx.stripped() {
                list.value = elements(
                    ctx,
                    element,
                    "value",
                    |e| e.key_type().is_subtype_of(type_value_list_element),
                    type_value_list_element.as_str(),
                )?;
            }
            list.into()
        }
        other => return Err(Error::type_mismatch("SubmodelElement", other)),
    };
    Ok(built)
}

// =============================================================================
// Entry points
// =============================================================================

/// Reads and parses the input, requiring the AAS namespace on the root.
fn root<R: Read>(ctx: &DecodeContext<'_>, mut reader: R) -> Result<Element> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let source = String::from_utf8(bytes).map_err(|e| Error::malformed(e.to_string()).with_source(e))?;
    let root = tree::parse(&source, ctx.options.max_depth)?;
    if !root.aas {
        return Err(Error::new(
            ErrorKind::MissingNamespace,
            format!(
                "The following required namespaces are not declared: {AAS_NAMESPACE} \
                 - Is the input document of an older version?"
            ),
        ));
    }
    Ok(root)
}

/// Decodes a whole document.
pub(crate) fn document<R: Read>(ctx: &DecodeContext<'_>, reader: R) -> Result<Environment> {
    let root = root(ctx, reader)?;
    if !root.is("environment") {
        return Err(Error::malformed(format!(
            "expected aas:environment as document root, but found {}",
            root.label()
        )));
    }
    let mut env = Environment::new();
    for list in &root.children {
        let Some(group) = Group::ALL.into_iter().find(|group| list.is(group.as_str())) else {
            ctx.tolerate(Error::new(
                ErrorKind::TypeMismatch,
                format!("Unexpected top-level list {}!", list.label()),
            ))?;
            continue;
        };
        let kind = group.model_type();
        let name = kind.constructor_name();
        for child in expect_tag(ctx, list, &tag_of(kind))? {
            if let Some(object) = ctx.construct(Some(child), label, &name, |e| entity(ctx, kind, e))? {
                env.insert(ctx, group, object)?;
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
    let root = root(ctx, reader)?;
    let root = &root;
    if let Some(kind) = selector.lang_string_kind() {
        let set = ctx.construct_mandatory(root, label, "construct_lang_string_set", |e| {
            lang_string_set(ctx, e, kind)
        })?;
        return Ok(Fragment::LangStringSet(kind, set));
    }
    let name = format!("construct_{}", snake(selector.as_str()));
    ctx.construct_mandatory(root, label, &name, |e| selected(ctx, e, selector))
}

fn selected(ctx: &DecodeContext<'_>, element: &Element, selector: Selector) -> Result<Fragment> {
    Ok(match selector {
        Selector::Key => Fragment::Key(key(element)?),
        Selector::Reference => Fragment::Reference(reference(ctx, element)?),
        Selector::ModelReference => {
            Fragment::Reference(model_reference(ctx, element, KeyType::Referable)?.into())
        }
        Selector::ExternalReference => Fragment::Reference(external_reference(ctx, element)?.into()),
        Selector::AdministrativeInformation => {
            Fragment::AdministrativeInformation(administrative_information(ctx, element)?)
        }
        Selector::Qualifier => Fragment::Qualifier(qualifier(ctx, element)?),
        Selector::Extension => Fragment::Extension(extension(ctx, element)?),
        Selector::Resource => Fragment::Resource(resource(element)?),
        Selector::AssetInformation => Fragment::AssetInformation(asset_information(ctx, element)?),
        Selector::SpecificAssetId => Fragment::SpecificAssetId(specific_asset_id(ctx, element)?),
        Selector::ValueReferencePair => Fragment::ValueReferencePair(value_reference_pair(ctx, element)?),
        Selector::ValueList => Fragment::ValueList(value_list(ctx, element)?),
        Selector::EmbeddedDataSpecification => {
            Fragment::EmbeddedDataSpecification(embedded_data_specification(ctx, element)?)
        }
        Selector::DataSpecificationContent => {
            let content = if element.is("dataSpecificationContent") {
                element.children.first().ok_or_else(|| {
                    Error::new(
                        ErrorKind::MissingRequiredChild,
                        format!("{} has no data specification!", element.label()),
                    )
                })?
            } else {
                element
            };
            match data_specification_content(ctx, content)? {
                DataSpecificationContent::Iec61360(content) => Fragment::Object(content.into()),
            }
        }
        Selector::SubmodelElement => Fragment::Object(submodel_element(ctx, element)?.into()),
        Selector::DataElement => {
            let is_data_element = kind_of_tag(element)
                .and_then(ModelType::key_type)
                .is_some_and(|key| key.is_subtype_of(KeyType::DataElement));
            if !is_data_element {
                return Err(Error::unknown_discriminator("DataElement", &element.label()));
            }
            Fragment::Object(submodel_element(ctx, element)?.into())
        }
        other => {
            let Ok(kind) = other.as_str().parse::<ModelType>() else {
                return Err(Error::type_mismatch(other.as_str(), element.label()));
            };
            let expected = tag_of(kind);
            if !element.is(&expected) {
                return Err(Error::type_mismatch(&format!("aas:{expected}"), element.label()));
            }
            Fragment::Object(entity(ctx, kind, element)?)
        }
    })
}

/// `SpecificAssetId` -> `specific_asset_id`
fn snake(name: &str) -> String {
    let mut snake = String::new();
    for (index, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if index > 0 {
                snake.push('_');
            }
            snake.push(c.to_ascii_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Referable, ReferenceTypes};
    use crate::options::DecodeOptions;
    use crate::registry::Registry;

    fn xml(body: &str) -> String {
        format!(r#"<aas:environment xmlns:aas="{AAS_NAMESPACE}">{body}</aas:environment>"#)
    }

    fn decode(text: &str, options: DecodeOptions) -> Result<Environment> {
        let registry = Registry::new();
        let ctx = DecodeContext::new(&registry, options);
        document(&ctx, text.as_bytes())
    }

    #[test]
    fn missing_namespace_is_fatal_in_both_modes() {
        let text = "<environment><submodels/></environment>";
        for options in [DecodeOptions::strict(), DecodeOptions::failsafe()] {
            let err = decode(text, options).err();
            assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::MissingNamespace));
        }
    }

    #[test]
    fn missing_child_names_the_line() {
        let text = xml(
            "\n<aas:submodels>\n<aas:submodel>\n<aas:idShort>sm</aas:idShort>\n</aas:submodel>\n</aas:submodels>",
        );
        let err = decode(&text, DecodeOptions::strict()).err();
        let err = err.as_ref();
        assert_eq!(err.map(Error::kind), Some(ErrorKind::MissingRequiredChild));
        assert_eq!(err.map(Error::message), Some("aas:submodel on line 3 has no child aas:id!"));
        assert_eq!(
            err.map(|e| e.frames().to_vec()),
            Some(vec!["Failed to construct aas:submodel on line 3 using construct_submodel!".to_owned()])
        );
        let env = decode(&text, DecodeOptions::failsafe()).ok();
        assert_eq!(env.map(|e| e.is_empty()), Some(true));
    }

    #[test]
    fn references_use_the_declared_kind() {
        let text = xml(
            "<aas:assetAdministrationShells><aas:assetAdministrationShell>\
             <aas:id>urn:aas</aas:id>\
             <aas:assetInformation><aas:assetKind>Instance</aas:assetKind></aas:assetInformation>\
             <aas:submodels><aas:reference><aas:type>ModelReference</aas:type><aas:keys>\
             <aas:key><aas:type>Submodel</aas:type><aas:value>urn:sm</aas:value></aas:key>\
             <aas:key><aas:type>Property</aas:type><aas:value>p</aas:value></aas:key>\
             </aas:keys></aas:reference></aas:submodels>\
             </aas:assetAdministrationShell></aas:assetAdministrationShells>",
        );
        let registry = Registry::new();
        let ctx = DecodeContext::new(&registry, DecodeOptions::strict());
        let env = document(&ctx, text.as_bytes()).ok();
        let target = env
            .as_ref()
            .and_then(|e| e.asset_administration_shells.first())
            .and_then(|s| s.submodels.first())
            .map(|r| r.target);
        assert_eq!(target, Some(KeyType::Submodel));
        let diagnostics = ctx.into_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, ErrorKind::ReferenceTargetKindMismatch);
    }

    #[test]
    fn empty_value_element() {
        let text = xml(
            "<aas:submodels><aas:submodel><aas:id>urn:sm</aas:id><aas:submodelElements>\
             <aas:property><aas:idShort>n</aas:idShort><aas:valueType>xs:int</aas:valueType><aas:value/></aas:property>\
             <aas:property><aas:idShort>s</aas:idShort><aas:valueType>xs:string</aas:valueType><aas:value></aas:value></aas:property>\
             </aas:submodelElements></aas:submodel></aas:submodels>",
        );
        let registry = Registry::new();
        let ctx = DecodeContext::new(&registry, DecodeOptions::strict());
        let env = document(&ctx, text.as_bytes()).ok();
        let values: Vec<_> = env
            .iter()
            .flat_map(|e| e.submodels.iter())
            .flat_map(|s| s.submodel_elements.iter())
            .map(|e| match e {
                SubmodelElement::Property(p) => p.value.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![None, Some(Value::String(String::new()))]);
        assert!(ctx.into_diagnostics().is_empty());
    }

    #[test]
    fn unknown_element_tag() {
        let text = xml(
            "<aas:submodels><aas:submodel><aas:id>urn:sm</aas:id><aas:submodelElements>\
             <aas:property><aas:idShort>p</aas:idShort><aas:valueType>xs:int</aas:valueType><aas:value>7</aas:value></aas:property>\
             <aas:gizmo/>\
             </aas:submodelElements></aas:submodel></aas:submodels>",
        );
        let err = decode(&text, DecodeOptions::strict()).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::UnknownDiscriminator));
        let env = decode(&text, DecodeOptions::failsafe()).ok();
        let elements = env.as_ref().and_then(|e| e.submodels.first()).map(|s| &s.submodel_elements);
        assert_eq!(elements.map(Vec::len), Some(1));
        let property = elements.and_then(|e| e.first());
        assert_eq!(property.and_then(|p| p.id_short()), Some("p"));
    }

    #[test]
    fn unexpected_top_level_list() {
        let text = xml("<aas:submodels1/>");
        assert_eq!(
            decode(&text, DecodeOptions::strict()).err().map(|e| e.kind()),
            Some(ErrorKind::TypeMismatch)
        );
        assert!(decode(&text, DecodeOptions::failsafe()).is_ok_and(|env| env.is_empty()));
    }

    #[test]
    fn reference_fragment() {
        let text = format!(
            r#"<aas:semanticId xmlns:aas="{AAS_NAMESPACE}"><aas:type>ExternalReference</aas:type><aas:keys><aas:key><aas:type>GlobalReference</aas:type><aas:value>urn:x</aas:value></aas:key></aas:keys></aas:semanticId>"#
        );
        let registry = Registry::new();
        let ctx = DecodeContext::new(&registry, DecodeOptions::failsafe());
        let fragment = fragment(&ctx, text.as_bytes(), Selector::Reference).ok();
        let reference_type = match fragment {
            Some(Fragment::Reference(r)) => Some(r.reference_type()),
            _ => None,
        };
        assert_eq!(reference_type, Some(ReferenceTypes::ExternalReference));
    }

    #[test]
    fn snake_names() {
        assert_eq!(snake("SpecificAssetId"), "specific_asset_id");
        assert_eq!(snake("Key"), "key");
    }
}
