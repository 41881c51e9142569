//! JSON encoding: one visitor function per concrete kind.
//!
//! Absent optional attributes and empty collections are omitted. Keys are
//! emitted in schema order (`modelType` first), which `serde_json`'s
//! `preserve_order` keeps on output.

use base64::Engine as _;
use serde_json::{Map, Value as Json};

use crate::environment::{Environment, Group};
use crate::fragment::Fragment;
use crate::model::{
    AdministrativeInformation, AssetAdministrationShell, AssetInformation, ConceptDescription,
    DataSpecificationContent, DataSpecificationIec61360, ElementAttributes,
    EmbeddedDataSpecification, Extension, Identification, Key, LangString, LevelType,
    ModelObject, ModelReference, ModellingKind, Qualifier, ReferableAttributes, Reference,
    Resource, SemanticAttributes, SpecificAssetId, Submodel, SubmodelElement, ValueList,
    ValueReferencePair,
};
use crate::options::EncodeOptions;

type Object = Map<String, Json>;

fn put(map: &mut Object, key: &str, value: impl Into<Json>) {
    map.insert(key.to_owned(), value.into());
}

fn put_str(map: &mut Object, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        put(map, key, value);
    }
}

fn put_list<T>(map: &mut Object, key: &str, items: &[T], encode: impl Fn(&T) -> Json) {
    if !items.is_empty() {
        put(map, key, Json::Array(items.iter().map(encode).collect()));
    }
}

// =============================================================================
// Helper fragments
// =============================================================================

fn key(key: &Key) -> Json {
    let mut map = Object::new();
    put(&mut map, "type", key.kind.as_str());
    put(&mut map, "value", key.value.as_str());
    Json::Object(map)
}

/// Encodes a reference of either variant.
pub(crate) fn reference(reference: &Reference) -> Json {
    let mut map = Object::new();
    put(&mut map, "type", reference.reference_type().as_str());
    if let Some(semantic_id) = reference.referred_semantic_id() {
        put(&mut map, "referredSemanticId", self::reference(semantic_id));
    }
    put(
        &mut map,
        "keys",
        Json::Array(reference.keys().iter().map(key).collect()),
    );
    Json::Object(map)
}

fn model_reference(model: &ModelReference) -> Json {
    reference(&Reference::Model(model.clone()))
}

fn lang_string_set(set: &[LangString]) -> Json {
    Json::Array(
        set.iter()
            .map(|entry| {
                let mut map = Object::new();
                put(&mut map, "language", entry.language.as_str());
                put(&mut map, "text", entry.text.as_str());
                Json::Object(map)
            })
            .collect(),
    )
}

fn semantics(map: &mut Object, semantics: &SemanticAttributes) {
    if let Some(semantic_id) = &semantics.semantic_id {
        put(map, "semanticId", reference(semantic_id));
    }
    put_list(map, "supplementalSemanticIds", &semantics.supplemental_semantic_ids, reference);
}

fn qualifier(qualifier: &Qualifier) -> Json {
    let mut map = Object::new();
    semantics(&mut map, &qualifier.semantics);
    put(&mut map, "kind", qualifier.kind.as_str());
    put(&mut map, "type", qualifier.qualifier_type.as_str());
    put(&mut map, "valueType", qualifier.value_type.as_str());
    if let Some(value) = &qualifier.value {
        put(&mut map, "value", value.render());
    }
    if let Some(value_id) = &qualifier.value_id {
        put(&mut map, "valueId", reference(value_id));
    }
    Json::Object(map)
}

fn extension(extension: &Extension) -> Json {
    let mut map = Object::new();
    semantics(&mut map, &extension.semantics);
    put(&mut map, "name", extension.name.as_str());
    if let Some(value_type) = extension.value_type {
        put(&mut map, "valueType", value_type.as_str());
    }
    if let Some(value) = &extension.value {
        put(&mut map, "value", value.render());
    }
    put_list(&mut map, "refersTo", &extension.refers_to, model_reference);
    Json::Object(map)
}

fn administrative_information(admin: &AdministrativeInformation, opts: &EncodeOptions) -> Json {
    let mut map = Object::new();
    embedded_data_specifications(&mut map, &admin.embedded_data_specifications, opts);
    put_str(&mut map, "version", admin.version.as_deref());
    put_str(&mut map, "revision", admin.revision.as_deref());
    if let Some(creator) = &admin.creator {
        put(&mut map, "creator", reference(creator));
    }
    put_str(&mut map, "templateId", admin.template_id.as_deref());
    Json::Object(map)
}

fn embedded_data_specifications(
    map: &mut Object,
    specifications: &[EmbeddedDataSpecification],
    opts: &EncodeOptions,
) {
    if !opts.stripped {
        put_list(map, "embeddedDataSpecifications", specifications, embedded_data_specification);
    }
}

fn embedded_data_specification(specification: &EmbeddedDataSpecification) -> Json {
    let mut map = Object::new();
    put(&mut map, "dataSpecification", reference(&specification.data_specification));
    put(
        &mut map,
        "dataSpecificationContent",
        data_specification_content(&specification.data_specification_content),
    );
    Json::Object(map)
}

fn data_specification_content(content: &DataSpecificationContent) -> Json {
    match content {
        DataSpecificationContent::Iec61360(iec) => data_specification_iec61360(iec),
    }
}

fn data_specification_iec61360(iec: &DataSpecificationIec61360) -> Json {
    let mut map = Object::new();
    put(&mut map, "modelType", "DataSpecificationIec61360");
    put(&mut map, "preferredName", lang_string_set(&iec.preferred_name));
    if let Some(short_name) = &iec.short_name {
        put(&mut map, "shortName", lang_string_set(short_name));
    }
    put_str(&mut map, "unit", iec.unit.as_deref());
    if let Some(unit_id) = &iec.unit_id {
        put(&mut map, "unitId", reference(unit_id));
    }
    put_str(&mut map, "sourceOfDefinition", iec.source_of_definition.as_deref());
    put_str(&mut map, "symbol", iec.symbol.as_deref());
    if let Some(data_type) = iec.data_type {
        put(&mut map, "dataType", data_type.as_str());
    }
    if let Some(definition) = &iec.definition {
        put(&mut map, "definition", lang_string_set(definition));
    }
    put_str(&mut map, "valueFormat", iec.value_format.as_deref());
    if let Some(value_list) = &iec.value_list {
        put(&mut map, "valueList", self::value_list(value_list));
    }
    put_str(&mut map, "value", iec.value.as_deref());
    if let Some(level_type) = &iec.level_type {
        put(&mut map, "levelType", self::level_type(level_type));
    }
    Json::Object(map)
}

fn value_reference_pair(pair: &ValueReferencePair) -> Json {
    let mut map = Object::new();
    put(&mut map, "value", pair.value.as_str());
    if let Some(value_id) = &pair.value_id {
        put(&mut map, "valueId", reference(value_id));
    }
    Json::Object(map)
}

fn value_list(list: &ValueList) -> Json {
    let mut map = Object::new();
    put(
        &mut map,
        "valueReferencePairs",
        Json::Array(list.value_reference_pairs.iter().map(value_reference_pair).collect()),
    );
    Json::Object(map)
}

fn level_type(level: &LevelType) -> Json {
    let mut map = Object::new();
    put(&mut map, "min", level.min);
    put(&mut map, "nom", level.nom);
    put(&mut map, "typ", level.typ);
    put(&mut map, "max", level.max);
    Json::Object(map)
}

fn resource(resource: &Resource) -> Json {
    let mut map = Object::new();
    put(&mut map, "path", resource.path.as_str());
    put_str(&mut map, "contentType", resource.content_type.as_deref());
    Json::Object(map)
}

fn specific_asset_id(id: &SpecificAssetId) -> Json {
    let mut map = Object::new();
    semantics(&mut map, &id.semantics);
    put(&mut map, "name", id.name.as_str());
    put(&mut map, "value", id.value.as_str());
    if let Some(subject) = &id.external_subject_id {
        put(&mut map, "externalSubjectId", reference(subject));
    }
    Json::Object(map)
}

fn asset_information(info: &AssetInformation) -> Json {
    let mut map = Object::new();
    put(&mut map, "assetKind", info.asset_kind.as_str());
    put_str(&mut map, "globalAssetId", info.global_asset_id.as_deref());
    put_list(&mut map, "specificAssetIds", &info.specific_asset_ids, specific_asset_id);
    put_str(&mut map, "assetType", info.asset_type.as_deref());
    if let Some(thumbnail) = &info.default_thumbnail {
        put(&mut map, "defaultThumbnail", resource(thumbnail));
    }
    Json::Object(map)
}

// =============================================================================
// Discriminated entities
// =============================================================================

fn referable(map: &mut Object, referable: &ReferableAttributes, opts: &EncodeOptions) {
    if !opts.stripped {
        put_list(map, "extensions", &referable.extensions, extension);
    }
    put_str(map, "category", referable.category.as_deref());
    put_str(map, "idShort", referable.id_short.as_deref());
    if let Some(display_name) = &referable.display_name {
        put(map, "displayName", lang_string_set(display_name));
    }
    if let Some(description) = &referable.description {
        put(map, "description", lang_string_set(description));
    }
}

fn identification(map: &mut Object, identification: &Identification, opts: &EncodeOptions) {
    if let Some(admin) = &identification.administration {
        put(map, "administration", administrative_information(admin, opts));
    }
    put(map, "id", identification.id.as_str());
}

/// HasSemantics, Qualifiable and HasDataSpecification parts of the bundle.
fn element_tail(map: &mut Object, attributes: &ElementAttributes, opts: &EncodeOptions) {
    semantics(map, &attributes.semantics);
    if !opts.stripped {
        put_list(map, "qualifiers", &attributes.qualifiers, qualifier);
    }
    embedded_data_specifications(map, &attributes.embedded_data_specifications, opts);
}

fn asset_administration_shell(shell: &AssetAdministrationShell, opts: &EncodeOptions) -> Json {
    let mut map = Object::new();
    put(&mut map, "modelType", "AssetAdministrationShell");
    referable(&mut map, &shell.referable, opts);
    identification(&mut map, &shell.identification, opts);
    embedded_data_specifications(&mut map, &shell.embedded_data_specifications, opts);
    if let Some(derived_from) = &shell.derived_from {
        put(&mut map, "derivedFrom", model_reference(derived_from));
    }
    put(&mut map, "assetInformation", asset_information(&shell.asset_information));
    if !opts.stripped {
        put_list(&mut map, "submodels", &shell.submodels, model_reference);
    }
    Json::Object(map)
}

fn submodel(submodel: &Submodel, opts: &EncodeOptions) -> Json {
    let mut map = Object::new();
    put(&mut map, "modelType", "Submodel");
    referable(&mut map, &submodel.attributes.referable, opts);
    identification(&mut map, &submodel.identification, opts);
    if submodel.kind == ModellingKind::Template {
        put(&mut map, "kind", submodel.kind.as_str());
    }
    element_tail(&mut map, &submodel.attributes, opts);
    if !opts.stripped {
        put_list(&mut map, "submodelElements", &submodel.submodel_elements, |e| {
            submodel_element(e, opts)
        });
    }
    Json::Object(map)
}

fn concept_description(concept: &ConceptDescription, opts: &EncodeOptions) -> Json {
    let mut map = Object::new();
    put(&mut map, "modelType", "ConceptDescription");
    referable(&mut map, &concept.referable, opts);
    identification(&mut map, &concept.identification, opts);
    embedded_data_specifications(&mut map, &concept.embedded_data_specifications, opts);
    put_list(&mut map, "isCaseOf", &concept.is_case_of, reference);
    Json::Object(map)
}

fn operation_variable(element: &SubmodelElement, opts: &EncodeOptions) -> Json {
    let mut map = Object::new();
    put(&mut map, "value", submodel_element(element, opts));
    Json::Object(map)
}

/// Encodes a submodel element.
pub(crate) fn submodel_element(element: &SubmodelElement, opts: &EncodeOptions) -> Json {
    let mut map = Object::new();
    put(&mut map, "modelType", element.model_type().as_str());
    referable(&mut map, &element.attributes().referable, opts);
    element_tail(&mut map, element.attributes(), opts);
    let children = |map: &mut Object, key: &str, items: &[SubmodelElement]| {
        if !opts.stripped {
            put_list(map, key, items, |e| submodel_element(e, opts));
        }
    };
    match element {
        SubmodelElement::Property(p) => {
            put(&mut map, "valueType", p.value_type.as_str());
            if let Some(value) = &p.value {
                put(&mut map, "value", value.render());
            }
            if let Some(value_id) = &p.value_id {
                put(&mut map, "valueId", reference(value_id));
            }
        }
        SubmodelElement::MultiLanguageProperty(p) => {
            if let Some(value) = &p.value {
                put(&mut map, "value", lang_string_set(value));
            }
            if let Some(value_id) = &p.value_id {
                put(&mut map, "valueId", reference(value_id));
            }
        }
        SubmodelElement::Range(r) => {
            put(&mut map, "valueType", r.value_type.as_str());
            if let Some(min) = &r.min {
                put(&mut map, "min", min.render());
            }
            if let Some(max) = &r.max {
                put(&mut map, "max", max.render());
            }
        }
        SubmodelElement::Blob(b) => {
            if let Some(value) = &b.value {
                put(&mut map, "value", base64::engine::general_purpose::STANDARD.encode(value));
            }
            put(&mut map, "contentType", b.content_type.as_str());
        }
        SubmodelElement::File(f) => {
            put_str(&mut map, "value", f.value.as_deref());
            put(&mut map, "contentType", f.content_type.as_str());
        }
        SubmodelElement::ReferenceElement(r) => {
            if let Some(value) = &r.value {
                put(&mut map, "value", reference(value));
            }
        }
        SubmodelElement::Capability(_) => {}
        SubmodelElement::RelationshipElement(r) => {
            put(&mut map, "first", reference(&r.first));
            put(&mut map, "second", reference(&r.second));
        }
        SubmodelElement::AnnotatedRelationshipElement(r) => {
            put(&mut map, "first", reference(&r.first));
            put(&mut map, "second", reference(&r.second));
            children(&mut map, "annotations", &r.annotations);
        }
        SubmodelElement::Entity(e) => {
            children(&mut map, "statements", &e.statements);
            put(&mut map, "entityType", e.entity_type.as_str());
            put_str(&mut map, "globalAssetId", e.global_asset_id.as_deref());
            put_list(&mut map, "specificAssetIds", &e.specific_asset_ids, specific_asset_id);
        }
        SubmodelElement::Operation(o) => {
            let variables = |e: &SubmodelElement| operation_variable(e, opts);
            put_list(&mut map, "inputVariables", &o.input_variables, variables);
            put_list(&mut map, "outputVariables", &o.output_variables, variables);
            put_list(&mut map, "inoutputVariables", &o.inoutput_variables, variables);
        }
        SubmodelElement::BasicEventElement(e) => {
            put(&mut map, "observed", model_reference(&e.observed));
            put(&mut map, "direction", e.direction.as_str());
            put(&mut map, "state", e.state.as_str());
            put_str(&mut map, "messageTopic", e.message_topic.as_deref());
            if let Some(broker) = &e.message_broker {
                put(&mut map, "messageBroker", model_reference(broker));
            }
            if let Some(last_update) = &e.last_update {
                put(&mut map, "lastUpdate", last_update.to_string());
            }
            if let Some(min_interval) = &e.min_interval {
                put(&mut map, "minInterval", min_interval.to_string());
            }
            if let Some(max_interval) = &e.max_interval {
                put(&mut map, "maxInterval", max_interval.to_string());
            }
        }
        SubmodelElement::SubmodelElementCollection(c) => {
            children(&mut map, "value", &c.value);
        }
        SubmodelElement::SubmodelElementList(l) => {
            put(&mut map, "orderRelevant", l.order_relevant);
            if let Some(semantic_id) = &l.semantic_id_list_element {
                put(&mut map, "semanticIdListElement", reference(semantic_id));
            }
            put(&mut map, "typeValueListElement", l.type_value_list_element.as_str());
            if let Some(value_type) = l.value_type_list_element {
                put(&mut map, "valueTypeListElement", value_type.as_str());
            }
            children(&mut map, "value", &l.value);
        }
    }
    Json::Object(map)
}

fn object(object: &ModelObject, opts: &EncodeOptions) -> Json {
    match object {
        ModelObject::AssetAdministrationShell(shell) => asset_administration_shell(shell, opts),
        ModelObject::Submodel(s) => submodel(s, opts),
        ModelObject::ConceptDescription(concept) => concept_description(concept, opts),
        ModelObject::SubmodelElement(element) => submodel_element(element, opts),
        ModelObject::DataSpecificationIec61360(iec) => data_specification_iec61360(iec),
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Encodes a document; only non-empty groups are emitted.
pub(crate) fn document(env: &Environment, opts: &EncodeOptions) -> Json {
    let mut map = Object::new();
    for group in Group::ALL {
        match group {
            Group::AssetAdministrationShells => put_list(
                &mut map,
                group.as_str(),
                &env.asset_administration_shells,
                |shell| asset_administration_shell(shell, opts),
            ),
            Group::Submodels => {
                put_list(&mut map, group.as_str(), &env.submodels, |s| submodel(s, opts));
            }
            Group::ConceptDescriptions => put_list(
                &mut map,
                group.as_str(),
                &env.concept_descriptions,
                |concept| concept_description(concept, opts),
            ),
        }
    }
    Json::Object(map)
}

/// Encodes a single fragment.
pub(crate) fn fragment(fragment: &Fragment, opts: &EncodeOptions) -> Json {
    match fragment {
        Fragment::Key(k) => key(k),
        Fragment::Reference(r) => reference(r),
        Fragment::AdministrativeInformation(admin) => administrative_information(admin, opts),
        Fragment::Qualifier(q) => qualifier(q),
        Fragment::Extension(e) => extension(e),
        Fragment::Resource(r) => resource(r),
        Fragment::AssetInformation(info) => asset_information(info),
        Fragment::SpecificAssetId(id) => specific_asset_id(id),
        Fragment::ValueReferencePair(pair) => value_reference_pair(pair),
        Fragment::ValueList(list) => value_list(list),
        Fragment::LangStringSet(_, set) => lang_string_set(set),
        Fragment::EmbeddedDataSpecification(eds) => embedded_data_specification(eds),
        Fragment::Object(o) => object(o, opts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DataTypeDefXsd, Key, KeyType, Property, QualifierKind, SubmodelElementList, Value,
    };

    #[test]
    fn reference_key_order() {
        let reference = Reference::Model(ModelReference::from_keys(vec![Key::new(
            KeyType::Submodel,
            "urn:sm",
        )]));
        let text = serde_json::to_string(&self::reference(&reference)).ok();
        assert_eq!(
            text.as_deref(),
            Some(r#"{"type":"ModelReference","keys":[{"type":"Submodel","value":"urn:sm"}]}"#)
        );
    }

    #[test]
    fn qualifier_kind_is_always_written() {
        let q = Qualifier::new("unit", DataTypeDefXsd::String);
        let json = qualifier(&q);
        assert_eq!(json["kind"], QualifierKind::ConceptQualifier.as_str());
        assert!(json.get("value").is_none());
    }

    #[test]
    fn list_elements_keep_the_id_short_they_have() {
        let mut list = SubmodelElementList::new(ElementAttributes::named("l"), KeyType::Property);
        let mut property = Property::new(ElementAttributes::named("p"), DataTypeDefXsd::Int);
        property.value = Some(Value::Int(1));
        list.value.push(property.into());
        list.value.push(Property::new(ElementAttributes::default(), DataTypeDefXsd::Int).into());
        let json = submodel_element(&list.into(), &EncodeOptions::new());
        assert_eq!(json["idShort"], "l");
        assert_eq!(json["orderRelevant"], true);
        assert_eq!(json["value"][0]["idShort"], "p");
        assert_eq!(json["value"][0]["value"], "1");
        assert!(json["value"][1].get("idShort").is_none());
    }

    #[test]
    fn empty_groups_are_omitted() {
        let json = document(&Environment::new(), &EncodeOptions::new());
        assert_eq!(json, Json::Object(Object::new()));
    }
}
