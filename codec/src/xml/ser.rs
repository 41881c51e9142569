//! XML encoding.
//!
//! The model is first lowered to a [`Node`] tree in schema order, then
//! written as `quick-xml` events. Every tag carries the `aas:` prefix; the
//! root declares the namespace both as default and under that prefix.

use std::io::Write;

use base64::Engine as _;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::environment::{Environment, Group};
use crate::error::Result;
use crate::fragment::{Fragment, LangStringKind};
use crate::model::{
    AdministrativeInformation, AssetAdministrationShell, AssetInformation, ConceptDescription,
    DataSpecificationContent, DataSpecificationIec61360, ElementAttributes,
    EmbeddedDataSpecification, Extension, Identification, Key, LangString, LevelType,
    ModelObject, ModelReference, ModellingKind, Qualifier, ReferableAttributes, Reference,
    Resource, SemanticAttributes, SpecificAssetId, Submodel, SubmodelElement, ValueList,
    ValueReferencePair,
};
use crate::options::EncodeOptions;
use crate::registry::ModelType;

use super::tag_of;
use super::tree::AAS_NAMESPACE;

/// An element about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Node {
    tag: String,
    text: Option<String>,
    children: Vec<Node>,
}

impl Node {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: None,
            children: Vec::new(),
        }
    }

    fn leaf(tag: &str, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(tag)
        }
    }

    fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    fn text(&mut self, tag: &str, text: impl Into<String>) {
        self.push(Self::leaf(tag, text));
    }

    fn opt_text(&mut self, tag: &str, text: Option<&str>) {
        if let Some(text) = text {
            self.text(tag, text);
        }
    }

    fn opt(&mut self, child: Option<Node>) {
        if let Some(child) = child {
            self.push(child);
        }
    }

    /// Appends `<tag>` wrapping one child per item; nothing for no items.
    fn list<T>(&mut self, tag: &str, items: &[T], encode: impl Fn(&T) -> Node) {
        if !items.is_empty() {
            let mut list = Node::new(tag);
            list.children = items.iter().map(encode).collect();
            self.push(list);
        }
    }

    /// This node under another tag.
    fn renamed(mut self, tag: &str) -> Self {
        tag.clone_into(&mut self.tag);
        self
    }
}

// =============================================================================
// Helper fragments
// =============================================================================

fn key(key: &Key) -> Node {
    let mut node = Node::new("key");
    node.text("type", key.kind.as_str());
    node.text("value", key.value.as_str());
    node
}

fn reference(tag: &str, reference: &Reference) -> Node {
    let mut node = Node::new(tag);
    node.text("type", reference.reference_type().as_str());
    node.opt(
        reference
            .referred_semantic_id()
            .map(|semantic_id| self::reference("referredSemanticId", semantic_id)),
    );
    let mut keys = Node::new("keys");
    keys.children = reference.keys().iter().map(self::key).collect();
    node.push(keys);
    node
}

fn model_reference(tag: &str, model: &ModelReference) -> Node {
    reference(tag, &Reference::Model(model.clone()))
}

fn references(node: &mut Node, tag: &str, items: &[Reference]) {
    node.list(tag, items, |r| reference("reference", r));
}

fn lang_string_set(tag: &str, kind: LangStringKind, set: &[LangString]) -> Node {
    let mut node = Node::new(tag);
    for entry in set {
        let mut item = Node::new(kind.entry_tag());
        item.text("language", entry.language.as_str());
        item.text("text", entry.text.as_str());
        node.push(item);
    }
    node
}

fn semantics(node: &mut Node, semantics: &SemanticAttributes) {
    node.opt(semantics.semantic_id.as_ref().map(|id| reference("semanticId", id)));
    references(node, "supplementalSemanticIds", &semantics.supplemental_semantic_ids);
}

fn qualifier(qualifier: &Qualifier) -> Node {
    let mut node = Node::new("qualifier");
    semantics(&mut node, &qualifier.semantics);
    node.text("kind", qualifier.kind.as_str());
    node.text("type", qualifier.qualifier_type.as_str());
    node.text("valueType", qualifier.value_type.as_str());
    node.opt_text("value", qualifier.value.as_ref().map(|v| v.render()).as_deref());
    node.opt(qualifier.value_id.as_ref().map(|id| reference("valueId", id)));
    node
}

fn extension(extension: &Extension) -> Node {
    let mut node = Node::new("extension");
    semantics(&mut node, &extension.semantics);
    node.text("name", extension.name.as_str());
    node.opt_text("valueType", extension.value_type.map(|t| t.as_str()));
    node.opt_text("value", extension.value.as_ref().map(|v| v.render()).as_deref());
    node.list("refersTo", &extension.refers_to, |r| model_reference("reference", r));
    node
}

fn administrative_information(admin: &AdministrativeInformation, opts: &EncodeOptions) -> Node {
    let mut node = Node::new("administration");
    embedded_data_specifications(&mut node, &admin.embedded_data_specifications, opts);
    node.opt_text("version", admin.version.as_deref());
    node.opt_text("revision", admin.revision.as_deref());
    node.opt(admin.creator.as_ref().map(|c| reference("creator", c)));
    node.opt_text("templateId", admin.template_id.as_deref());
    node
}

fn embedded_data_specifications(node: &mut Node, specifications: &[EmbeddedDataSpecification], opts: &EncodeOptions) {
    if !opts.stripped {
        node.list("embeddedDataSpecifications", specifications, embedded_data_specification);
    }
}

fn embedded_data_specification(specification: &EmbeddedDataSpecification) -> Node {
    let mut node = Node::new("embeddedDataSpecification");
    node.push(reference("dataSpecification", &specification.data_specification));
    let mut content = Node::new("dataSpecificationContent");
    content.push(data_specification_content(&specification.data_specification_content));
    node.push(content);
    node
}

fn data_specification_content(content: &DataSpecificationContent) -> Node {
    match content {
        DataSpecificationContent::Iec61360(iec) => data_specification_iec61360(iec),
    }
}

fn data_specification_iec61360(iec: &DataSpecificationIec61360) -> Node {
    let mut node = Node::new(tag_of(ModelType::DataSpecificationIec61360));
    node.push(lang_string_set(
        "preferredName",
        LangStringKind::PreferredNameIec61360,
        &iec.preferred_name,
    ));
    node.opt(
        iec.short_name
            .as_ref()
            .map(|set| lang_string_set("shortName", LangStringKind::ShortNameIec61360, set)),
    );
    node.opt_text("unit", iec.unit.as_deref());
    node.opt(iec.unit_id.as_ref().map(|id| reference("unitId", id)));
    node.opt_text("sourceOfDefinition", iec.source_of_definition.as_deref());
    node.opt_text("symbol", iec.symbol.as_deref());
    node.opt_text("dataType", iec.data_type.map(|t| t.as_str()));
    node.opt(
        iec.definition
            .as_ref()
            .map(|set| lang_string_set("definition", LangStringKind::DefinitionIec61360, set)),
    );
    node.opt_text("valueFormat", iec.value_format.as_deref());
    node.opt(iec.value_list.as_ref().map(value_list));
    node.opt_text("value", iec.value.as_deref());
    node.opt(iec.level_type.as_ref().map(level_type));
    node
}

fn value_reference_pair(pair: &ValueReferencePair) -> Node {
    let mut node = Node::new("valueReferencePair");
    node.text("value", pair.value.as_str());
    node.opt(pair.value_id.as_ref().map(|id| reference("valueId", id)));
    node
}

fn value_list(list: &ValueList) -> Node {
    let mut node = Node::new("valueList");
    let mut pairs = Node::new("valueReferencePairs");
    pairs.children = list.value_reference_pairs.iter().map(value_reference_pair).collect();
    node.push(pairs);
    node
}

fn level_type(level: &LevelType) -> Node {
    let mut node = Node::new("levelType");
    for (tag, set) in [("min", level.min), ("nom", level.nom), ("typ", level.typ), ("max", level.max)] {
        node.text(tag, if set { "true" } else { "false" });
    }
    node
}

fn resource(resource: &Resource) -> Node {
    let mut node = Node::new("resource");
    node.text("path", resource.path.as_str());
    node.opt_text("contentType", resource.content_type.as_deref());
    node
}

fn specific_asset_id(id: &SpecificAssetId) -> Node {
    let mut node = Node::new("specificAssetId");
    semantics(&mut node, &id.semantics);
    node.text("name", id.name.as_str());
    node.text("value", id.value.as_str());
    node.opt(id.external_subject_id.as_ref().map(|s| reference("externalSubjectId", s)));
    node
}

fn asset_information(info: &AssetInformation) -> Node {
    let mut node = Node::new("assetInformation");
    node.text("assetKind", info.asset_kind.as_str());
    node.opt_text("globalAssetId", info.global_asset_id.as_deref());
    node.list("specificAssetIds", &info.specific_asset_ids, specific_asset_id);
    node.opt_text("assetType", info.asset_type.as_deref());
    node.opt(info.default_thumbnail.as_ref().map(|r| resource(r).renamed("defaultThumbnail")));
    node
}

// =============================================================================
// Discriminated entities
// =============================================================================

fn referable(node: &mut Node, referable: &ReferableAttributes, opts: &EncodeOptions) {
    if !opts.stripped {
        node.list("extensions", &referable.extensions, extension);
    }
    node.opt_text("category", referable.category.as_deref());
    node.opt_text("idShort", referable.id_short.as_deref());
    node.opt(
        referable
            .display_name
            .as_ref()
            .map(|set| lang_string_set("displayName", LangStringKind::NameType, set)),
    );
    node.opt(
        referable
            .description
            .as_ref()
            .map(|set| lang_string_set("description", LangStringKind::TextType, set)),
    );
}

fn identification(node: &mut Node, identification: &Identification, opts: &EncodeOptions) {
    node.opt(
        identification
            .administration
            .as_ref()
            .map(|admin| administrative_information(admin, opts)),
    );
    node.text("id", identification.id.as_str());
}

fn element_tail(node: &mut Node, attributes: &ElementAttributes, opts: &EncodeOptions) {
    semantics(node, &attributes.semantics);
    if !opts.stripped {
        node.list("qualifiers", &attributes.qualifiers, qualifier);
    }
    embedded_data_specifications(node, &attributes.embedded_data_specifications, opts);
}

fn asset_administration_shell(shell: &AssetAdministrationShell, opts: &EncodeOptions) -> Node {
    let mut node = Node::new(tag_of(ModelType::AssetAdministrationShell));
    referable(&mut node, &shell.referable, opts);
    identification(&mut node, &shell.identification, opts);
    embedded_data_specifications(&mut node, &shell.embedded_data_specifications, opts);
    node.opt(shell.derived_from.as_ref().map(|r| model_reference("derivedFrom", r)));
    node.push(asset_information(&shell.asset_information));
    if !opts.stripped {
        node.list("submodels", &shell.submodels, |r| model_reference("reference", r));
    }
    node
}

fn submodel(submodel: &Submodel, opts: &EncodeOptions) -> Node {
    let mut node = Node::new(tag_of(ModelType::Submodel));
    referable(&mut node, &submodel.attributes.referable, opts);
    identification(&mut node, &submodel.identification, opts);
    if submodel.kind == ModellingKind::Template {
        node.text("kind", submodel.kind.as_str());
    }
    element_tail(&mut node, &submodel.attributes, opts);
    if !opts.stripped {
        node.list("submodelElements", &submodel.submodel_elements, |e| {
            submodel_element(e, opts)
        });
    }
    node
}

fn concept_description(concept: &ConceptDescription, opts: &EncodeOptions) -> Node {
    let mut node = Node::new(tag_of(ModelType::ConceptDescription));
    referable(&mut node, &concept.referable, opts);
    identification(&mut node, &concept.identification, opts);
    embedded_data_specifications(&mut node, &concept.embedded_data_specifications, opts);
    references(&mut node, "isCaseOf", &concept.is_case_of);
    node
}

fn operation_variable(element: &SubmodelElement, opts: &EncodeOptions) -> Node {
    let mut value = Node::new("value");
    value.push(submodel_element(element, opts));
    let mut node = Node::new("operationVariable");
    node.push(value);
    node
}

fn submodel_element(element: &SubmodelElement, opts: &EncodeOptions) -> Node {
    let mut node = Node::new(tag_of(element.model_type()));
    referable(&mut node, &element.attributes().referable, opts);
    element_tail(&mut node, element.attributes(), opts);
    let children = |node: &mut Node, tag: &str, items: &[SubmodelElement]| {
        if !opts.stripped {
            node.list(tag, items, |e| submodel_element(e, opts));
        }
    };
    match element {
        SubmodelElement::Property(p) => {
            node.text("valueType", p.value_type.as_str());
            node.opt_text("value", p.value.as_ref().map(|v| v.render()).as_deref());
            node.opt(p.value_id.as_ref().map(|id| reference("valueId", id)));
        }
        SubmodelElement::MultiLanguageProperty(p) => {
            node.opt(
                p.value
                    .as_ref()
                    .map(|set| lang_string_set("value", LangStringKind::TextType, set)),
            );
            node.opt(p.value_id.as_ref().map(|id| reference("valueId", id)));
        }
        SubmodelElement::Range(r) => {
            node.text("valueType", r.value_type.as_str());
            node.opt_text("min", r.min.as_ref().map(|v| v.render()).as_deref());
            node.opt_text("max", r.max.as_ref().map(|v| v.render()).as_deref());
        }
        SubmodelElement::Blob(b) => {
            if let Some(value) = &b.value {
                node.text("value", base64::engine::general_purpose::STANDARD.encode(value));
            }
            node.text("contentType", b.content_type.as_str());
        }
        SubmodelElement::File(f) => {
            node.opt_text("value", f.value.as_deref());
            node.text("contentType", f.content_type.as_str());
        }
        SubmodelElement::ReferenceElement(r) => {
            node.opt(r.value.as_ref().map(|v| reference("value", v)));
        }
        SubmodelElement::Capability(_) => {}
        SubmodelElement::RelationshipElement(r) => {
            node.push(reference("first", &r.first));
            node.push(reference("second", &r.second));
        }
        SubmodelElement::AnnotatedRelationshipElement(r) => {
            node.push(reference("first", &r.first));
            node.push(reference("second", &r.second));
            children(&mut node, "annotations", &r.annotations);
        }
        SubmodelElement::Entity(e) => {
            children(&mut node, "statements", &e.statements);
            node.text("entityType", e.entity_type.as_str());
            node.opt_text("globalAssetId", e.global_asset_id.as_deref());
            node.list("specificAssetIds", &e.specific_asset_ids, specific_asset_id);
        }
        SubmodelElement::Operation(o) => {
            let variable = |e: &SubmodelElement| operation_variable(e, opts);
            node.list("inputVariables", &o.input_variables, variable);
            node.list("outputVariables", &o.output_variables, variable);
            node.list("inoutputVariables", &o.inoutput_variables, variable);
        }
        SubmodelElement::BasicEventElement(e) => {
            node.push(model_reference("observed", &e.observed));
            node.text("direction", e.direction.as_str());
            node.text("state", e.state.as_str());
            node.opt_text("messageTopic", e.message_topic.as_deref());
            node.opt(e.message_broker.as_ref().map(|r| model_reference("messageBroker", r)));
            node.opt_text("lastUpdate", e.last_update.as_ref().map(ToString::to_string).as_deref());
            node.opt_text("minInterval", e.min_interval.as_ref().map(ToString::to_string).as_deref());
            node.opt_text("maxInterval", e.max_interval.as_ref().map(ToString::to_string).as_deref());
        }
        SubmodelElement::SubmodelElementCollection(c) => {
            children(&mut node, "value", &c.value);
        }
        SubmodelElement::SubmodelElementList(l) => {
            node.text("orderRelevant", if l.order_relevant { "true" } else { "false" });
            node.opt(
                l.semantic_id_list_element
                    .as_ref()
                    .map(|id| reference("semanticIdListElement", id)),
            );
            node.text("typeValueListElement", l.type_value_list_element.as_str());
            node.opt_text("valueTypeListElement", l.value_type_list_element.map(|t| t.as_str()));
            children(&mut node, "value", &l.value);
        }
    }
    node
}

fn object(object: &ModelObject, opts: &EncodeOptions) -> Node {
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

/// Lowers a document; only non-empty groups are emitted.
pub(crate) fn document(env: &Environment, opts: &EncodeOptions) -> Node {
    let mut node = Node::new("environment");
    for group in Group::ALL {
        let tag = group.as_str();
        match group {
            Group::AssetAdministrationShells => node.list(tag, &env.asset_administration_shells, |shell| {
                asset_administration_shell(shell, opts)
            }),
            Group::Submodels => node.list(tag, &env.submodels, |s| submodel(s, opts)),
            Group::ConceptDescriptions => node.list(tag, &env.concept_descriptions, |concept| {
                concept_description(concept, opts)
            }),
        }
    }
    node
}

/// Lowers a single fragment, rooted at its default tag.
pub(crate) fn fragment(fragment: &Fragment, opts: &EncodeOptions) -> Node {
    match fragment {
        Fragment::Key(k) => key(k),
        Fragment::Reference(r) => reference("reference", r),
        Fragment::AdministrativeInformation(admin) => administrative_information(admin, opts),
        Fragment::Qualifier(q) => qualifier(q),
        Fragment::Extension(e) => extension(e),
        Fragment::Resource(r) => resource(r),
        Fragment::AssetInformation(info) => asset_information(info),
        Fragment::SpecificAssetId(id) => specific_asset_id(id),
        Fragment::ValueReferencePair(pair) => value_reference_pair(pair),
        Fragment::ValueList(list) => value_list(list),
        Fragment::LangStringSet(kind, set) => lang_string_set(kind.set_tag(), *kind, set),
        Fragment::EmbeddedDataSpecification(eds) => embedded_data_specification(eds),
        Fragment::Object(o) => object(o, opts),
    }
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &Node, root: bool) -> Result<()> {
    let name = format!("aas:{}", node.tag);
    let mut start = BytesStart::new(name.as_str());
    if root {
        start.push_attribute(("xmlns", AAS_NAMESPACE));
        start.push_attribute(("xmlns:aas", AAS_NAMESPACE));
    }
    let text = node.text.as_deref().filter(|text| !text.is_empty());
    if node.children.is_empty() && text.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    if let Some(text) = text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in &node.children {
        write_node(writer, child, false)?;
    }
    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
    Ok(())
}

/// Writes `root` as a complete document.
pub(crate) fn write<W: Write>(root: &Node, writer: W, opts: &EncodeOptions) -> Result<()> {
    let mut writer = if opts.pretty {
        Writer::new_with_indent(writer, b' ', 2)
    } else {
        Writer::new(writer)
    };
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    write_node(&mut writer, root, true)?;
    if opts.pretty {
        writer.get_mut().write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataTypeDefXsd, KeyType, Property, SubmodelElementList, Value};

    fn render(node: &Node) -> String {
        let mut out = Vec::new();
        let written = write(node, &mut out, &EncodeOptions::new().with_pretty(false));
        assert!(written.is_ok());
        String::from_utf8(out).unwrap_or_default()
    }

    #[test]
    fn fragment_root_declares_the_namespace() {
        let text = render(&key(&Key::new(KeyType::Submodel, "urn:sm")));
        assert_eq!(
            text,
            format!(
                "<?xml version=\"1.0\" encoding=\"utf-8\"?><aas:key xmlns=\"{AAS_NAMESPACE}\" xmlns:aas=\"{AAS_NAMESPACE}\"><aas:type>Submodel</aas:type><aas:value>urn:sm</aas:value></aas:key>"
            )
        );
    }

    #[test]
    fn empty_value_is_an_empty_element() {
        let mut property = Property::new(ElementAttributes::named("p"), DataTypeDefXsd::String);
        property.value = Some(Value::String(String::new()));
        let text = render(&submodel_element(&property.into(), &EncodeOptions::new()));
        assert!(text.contains("<aas:value/>"));
        assert!(text.contains("<aas:idShort>p</aas:idShort>"));
    }

    #[test]
    fn text_is_escaped() {
        let text = render(&resource(&Resource {
            path: "a<b&c".to_owned(),
            content_type: None,
        }));
        assert!(text.contains("<aas:path>a&lt;b&amp;c</aas:path>"));
    }

    #[test]
    fn list_children_write_only_a_present_id_short() {
        let mut list = SubmodelElementList::new(ElementAttributes::named("l"), KeyType::Property);
        list.value.push(Property::new(ElementAttributes::named("p"), DataTypeDefXsd::Int).into());
        list.value.push(Property::new(ElementAttributes::default(), DataTypeDefXsd::Int).into());
        let node = submodel_element(&list.into(), &EncodeOptions::new());
        let value = node.children.iter().find(|c| c.tag == "value");
        let first = value.and_then(|v| v.children.first());
        assert_eq!(first.map(|c| c.tag.as_str()), Some("property"));
        assert!(first.is_some_and(|c| c.children.iter().any(|g| g.tag == "idShort")));
        let second = value.and_then(|v| v.children.get(1));
        assert!(second.is_some_and(|c| c.children.iter().all(|g| g.tag != "idShort")));
    }
}
