//! Failsafe and strict behaviour of both decoders on defective input, the
//! constructor registry and the reference target policies.

use aas_codec::model::{KeyType, ModelObject, QualifierKind, Referable, SubmodelElement};
use aas_codec::{
    decode_document, decode_fragment, encode_fragment, DecodeOptions, Decoder, EncodeOptions, Environment,
    ErrorKind, Format, Fragment, ModelType, Registry, Selector, Severity,
};
use aas_codec::xml::AAS_NAMESPACE;

fn xml(body: &str) -> String {
    format!("<aas:environment xmlns:aas=\"{AAS_NAMESPACE}\">{body}</aas:environment>")
}

fn kinds(env: &Environment) -> Vec<(Severity, ErrorKind)> {
    env.diagnostics.iter().map(|d| (d.severity, d.kind)).collect()
}

// =============================================================================
// Fragments
// =============================================================================

#[test]
fn property_fragment_in_both_formats() {
    let json = r#"{"modelType":"Property","idShort":"Temperature","valueType":"xs:double","value":"23.5"}"#;
    let fragment = decode_fragment(Format::Json, json.as_bytes(), Selector::Property, &DecodeOptions::strict());
    let Ok(fragment) = fragment else {
        panic!("{fragment:?}");
    };

    let mut out = Vec::new();
    let encoded = encode_fragment(Format::Xml, &fragment, &mut out, &EncodeOptions::new().with_pretty(false));
    assert!(encoded.is_ok());
    let expected = format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?><aas:property xmlns=\"{AAS_NAMESPACE}\" xmlns:aas=\"{AAS_NAMESPACE}\">\
         <aas:idShort>Temperature</aas:idShort><aas:valueType>xs:double</aas:valueType><aas:value>23.5</aas:value>\
         </aas:property>"
    );
    assert_eq!(String::from_utf8_lossy(&out), expected);

    let back = decode_fragment(Format::Xml, out.as_slice(), Selector::SubmodelElement, &DecodeOptions::strict());
    assert_eq!(back.ok(), Some(fragment));
}

#[test]
fn fragment_selector_must_match() {
    let json = r#"{"modelType":"Capability","idShort":"c"}"#;
    let err = decode_fragment(Format::Json, json.as_bytes(), Selector::DataElement, &DecodeOptions::failsafe()).err();
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::TypeMismatch));
}

#[test]
fn broken_fragment_root_fails_in_failsafe_mode() {
    let text = format!("<aas:qualifier xmlns:aas=\"{AAS_NAMESPACE}\"><aas:type>t</aas:type></aas:qualifier>");
    let err = decode_fragment(Format::Xml, text.as_bytes(), Selector::Qualifier, &DecodeOptions::failsafe()).err();
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::MissingRequiredChild));
}

#[test]
fn lang_string_fragment() {
    let json = r#"[{"language":"en","text":"Pump"},{"language":"de","text":"Pumpe"}]"#;
    let fragment =
        decode_fragment(Format::Json, json.as_bytes(), Selector::MultiLanguageNameType, &DecodeOptions::strict());
    match fragment {
        Ok(Fragment::LangStringSet(_, set)) => assert_eq!(set.len(), 2),
        other => panic!("unexpected {other:?}"),
    }
}

// =============================================================================
// Missing mandatory children
// =============================================================================

const BROKEN_QUALIFIER: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>
<aas:environment xmlns:aas=\"https://admin-shell.io/aas/3/0\">
  <aas:submodels>
    <aas:submodel>
      <aas:id>urn:example:sm</aas:id>
      <aas:qualifiers>
        <aas:qualifier>
          <aas:type>broken</aas:type>
        </aas:qualifier>
        <aas:qualifier>
          <aas:kind>TemplateQualifier</aas:kind>
          <aas:type>ok</aas:type>
          <aas:valueType>xs:int</aas:valueType>
          <aas:value>3</aas:value>
        </aas:qualifier>
      </aas:qualifiers>
    </aas:submodel>
  </aas:submodels>
</aas:environment>
";

#[test]
fn strict_mode_reports_the_causal_chain() {
    let err = decode_document(Format::Xml, BROKEN_QUALIFIER.as_bytes(), &DecodeOptions::strict()).err();
    let Some(err) = err else {
        panic!("strict decoding accepted a qualifier without valueType");
    };
    assert_eq!(err.kind(), ErrorKind::MissingRequiredChild);
    assert_eq!(err.message(), "aas:qualifier on line 7 has no child aas:valueType!");
    assert_eq!(
        err.frames().first().map(String::as_str),
        Some("Failed to construct aas:qualifier on line 7 using construct_qualifier!")
    );
    assert_eq!(
        err.frames().last().map(String::as_str),
        Some("Failed to construct aas:submodel on line 4 using construct_submodel!")
    );
}

#[test]
fn failsafe_mode_keeps_the_siblings() {
    let env = decode_document(Format::Xml, BROKEN_QUALIFIER.as_bytes(), &DecodeOptions::failsafe());
    let Ok(env) = env else {
        panic!("{env:?}");
    };
    let qualifiers = &env.submodels[0].attributes.qualifiers;
    assert_eq!(qualifiers.len(), 1);
    assert_eq!(qualifiers[0].qualifier_type, "ok");
    assert_eq!(qualifiers[0].kind, QualifierKind::TemplateQualifier);
    assert_eq!(kinds(&env), vec![(Severity::Error, ErrorKind::MissingRequiredChild)]);
}

// =============================================================================
// Duplicates and unknown discriminators
// =============================================================================

#[test]
fn duplicate_identifiers() {
    let json = r#"{"conceptDescriptions":[
        {"modelType":"ConceptDescription","id":"urn:cd","idShort":"first"},
        {"modelType":"ConceptDescription","id":"urn:cd","idShort":"second"}]}"#;
    let markup = xml(
        "<aas:conceptDescriptions>\
         <aas:conceptDescription><aas:idShort>first</aas:idShort><aas:id>urn:cd</aas:id></aas:conceptDescription>\
         <aas:conceptDescription><aas:idShort>second</aas:idShort><aas:id>urn:cd</aas:id></aas:conceptDescription>\
         </aas:conceptDescriptions>",
    );
    for (format, text) in [(Format::Json, json.to_owned()), (Format::Xml, markup)] {
        let err = decode_document(format, text.as_bytes(), &DecodeOptions::strict()).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::DuplicateIdentifier), "{format}");

        let env = decode_document(format, text.as_bytes(), &DecodeOptions::failsafe());
        let Ok(env) = env else {
            panic!("{format}: {env:?}");
        };
        assert_eq!(env.concept_descriptions.len(), 1);
        assert_eq!(env.concept_descriptions[0].id_short(), Some("first"));
        assert_eq!(kinds(&env), vec![(Severity::Error, ErrorKind::DuplicateIdentifier)]);
    }
}

#[test]
fn unknown_model_type() {
    let json = r#"{"submodels":[{"modelType":"Submodel","id":"urn:sm","submodelElements":[
        {"modelType":"Gizmo","idShort":"g"},
        {"modelType":"Capability","idShort":"c"}]}]}"#;
    let err = decode_document(Format::Json, json.as_bytes(), &DecodeOptions::strict()).err();
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::UnknownDiscriminator));

    let env = decode_document(Format::Json, json.as_bytes(), &DecodeOptions::failsafe());
    let Ok(env) = env else {
        panic!("{env:?}");
    };
    let elements = &env.submodels[0].submodel_elements;
    assert_eq!(elements.len(), 1);
    assert_eq!(elements[0].model_type(), ModelType::Capability);
    assert_eq!(kinds(&env), vec![(Severity::Error, ErrorKind::UnknownDiscriminator)]);
}

#[test]
fn missing_namespace_is_fatal() {
    let text = "<environment xmlns=\"https://admin-shell.io/aas/2/0\"/>";
    for options in [DecodeOptions::strict(), DecodeOptions::failsafe()] {
        let err = decode_document(Format::Xml, text.as_bytes(), &options).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::MissingNamespace));
    }
}

#[test]
fn non_array_group_is_skipped_with_a_warning() {
    let json = r#"{"submodels":{"modelType":"Submodel","id":"urn:sm"}}"#;
    let env = decode_document(Format::Json, json.as_bytes(), &DecodeOptions::strict());
    let Ok(env) = env else {
        panic!("{env:?}");
    };
    assert!(env.is_empty());
    assert_eq!(kinds(&env), vec![(Severity::Warning, ErrorKind::TypeMismatch)]);
}

#[test]
fn malformed_syntax() {
    for format in Format::ALL {
        for options in [DecodeOptions::strict(), DecodeOptions::failsafe()] {
            let err = decode_document(format, "{<".as_bytes(), &options).err();
            assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::MalformedDocument), "{format}");
        }
    }
}

// =============================================================================
// Depth limit
// =============================================================================

fn nested_json(levels: usize) -> String {
    let mut element = r#"{"modelType":"Property","idShort":"leaf","valueType":"xs:int"}"#.to_owned();
    for level in 0..levels {
        element = format!(r#"{{"modelType":"SubmodelElementCollection","idShort":"c{level}","value":[{element}]}}"#);
    }
    format!(r#"{{"submodels":[{{"modelType":"Submodel","id":"urn:sm","submodelElements":[{element}]}}]}}"#)
}

fn nested_xml(levels: usize) -> String {
    let mut element =
        "<aas:property><aas:idShort>leaf</aas:idShort><aas:valueType>xs:int</aas:valueType></aas:property>".to_owned();
    for level in 0..levels {
        element = format!(
            "<aas:submodelElementCollection><aas:idShort>c{level}</aas:idShort><aas:value>{element}</aas:value></aas:submodelElementCollection>"
        );
    }
    xml(&format!(
        "<aas:submodels><aas:submodel><aas:id>urn:sm</aas:id><aas:submodelElements>{element}</aas:submodelElements></aas:submodel></aas:submodels>"
    ))
}

#[test]
fn depth_limit_applies_in_both_modes() {
    for (format, shallow, deep) in [
        (Format::Json, nested_json(20), nested_json(40)),
        (Format::Xml, nested_xml(20), nested_xml(40)),
    ] {
        let env = decode_document(format, shallow.as_bytes(), &DecodeOptions::strict());
        assert_eq!(env.map(|e| e.len()).ok(), Some(1), "{format}");

        for options in [DecodeOptions::strict(), DecodeOptions::failsafe()] {
            let err = decode_document(format, deep.as_bytes(), &options).err();
            assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::MalformedDocument), "{format}");
        }
        let err = decode_document(format, shallow.as_bytes(), &DecodeOptions::failsafe().with_max_depth(10)).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::MalformedDocument), "{format}");
    }
}

#[test]
fn depth_counts_syntax_levels_not_entities() {
    for (format, text) in [(Format::Json, nested_json(20)), (Format::Xml, nested_xml(20))] {
        let tight = DecodeOptions::strict().with_max_depth(40);
        let err = decode_document(format, text.as_bytes(), &tight).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::MalformedDocument), "{format}");

        let roomy = DecodeOptions::strict().with_max_depth(50);
        let env = decode_document(format, text.as_bytes(), &roomy);
        assert_eq!(env.map(|e| e.len()).ok(), Some(1), "{format}");
    }
}

// =============================================================================
// Registry
// =============================================================================

fn category(object: ModelObject) -> aas_codec::Result<ModelObject> {
    match object {
        ModelObject::SubmodelElement(SubmodelElement::Property(mut property)) => {
            property.attributes.referable.category = Some("OVERRIDDEN".to_owned());
            Ok(ModelObject::SubmodelElement(property.into()))
        }
        other => Ok(other),
    }
}

fn rejecting(object: ModelObject) -> aas_codec::Result<ModelObject> {
    match &object {
        ModelObject::SubmodelElement(element) if element.id_short() == Some("bad") => Err(aas_codec::Error::new(
            ErrorKind::TypeMismatch,
            "property bad is not allowed here",
        )),
        _ => Ok(object),
    }
}

const TWO_PROPERTIES_JSON: &str = r#"{"submodels":[{"modelType":"Submodel","id":"urn:sm","submodelElements":[
    {"modelType":"Property","idShort":"bad","valueType":"xs:int"},
    {"modelType":"Property","idShort":"good","valueType":"xs:int"}]}]}"#;

fn two_properties_xml() -> String {
    xml("<aas:submodels><aas:submodel><aas:id>urn:sm</aas:id><aas:submodelElements>\
         <aas:property><aas:idShort>bad</aas:idShort><aas:valueType>xs:int</aas:valueType></aas:property>\
         <aas:property><aas:idShort>good</aas:idShort><aas:valueType>xs:int</aas:valueType></aas:property>\
         </aas:submodelElements></aas:submodel></aas:submodels>")
}

#[test]
fn registry_override_replaces_the_default() {
    let registry = Registry::new().with_constructor(ModelType::Property, category);
    for (format, text) in [(Format::Json, TWO_PROPERTIES_JSON.to_owned()), (Format::Xml, two_properties_xml())] {
        let env = Decoder::with_registry(&registry, DecodeOptions::strict()).decode_document(format, text.as_bytes());
        let Ok(env) = env else {
            panic!("{format}: {env:?}");
        };
        let categories: Vec<Option<&str>> = env.submodels[0]
            .submodel_elements
            .iter()
            .map(|e| e.attributes().referable.category.as_deref())
            .collect();
        assert_eq!(categories, vec![Some("OVERRIDDEN"), Some("OVERRIDDEN")], "{format}");
    }
}

#[test]
fn registry_rejection_is_a_construction_failure() {
    let registry = Registry::new().with_constructor(ModelType::Property, rejecting);
    for (format, text) in [(Format::Json, TWO_PROPERTIES_JSON.to_owned()), (Format::Xml, two_properties_xml())] {
        let err = Decoder::with_registry(&registry, DecodeOptions::strict())
            .decode_document(format, text.as_bytes())
            .err();
        assert_eq!(err.as_ref().map(|e| e.kind()), Some(ErrorKind::TypeMismatch), "{format}");
        assert!(err.is_some_and(|e| e.frames().iter().any(|f| f.contains("construct_property"))));

        let env = Decoder::with_registry(&registry, DecodeOptions::failsafe()).decode_document(format, text.as_bytes());
        let names: Vec<Option<String>> = env
            .map(|env| {
                env.submodels[0]
                    .submodel_elements
                    .iter()
                    .map(|e| e.id_short().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default();
        assert_eq!(names, vec![Some("good".to_owned())], "{format}");
    }
}

// =============================================================================
// Reference target policy
// =============================================================================

#[test]
fn text_infers_and_markup_declares_the_target() {
    let json = r#"{"assetAdministrationShells":[{"modelType":"AssetAdministrationShell","id":"urn:aas",
        "assetInformation":{"assetKind":"Instance"},
        "submodels":[{"type":"ModelReference","keys":[
            {"type":"Submodel","value":"urn:sm"},{"type":"Property","value":"p"}]}]}]}"#;
    let markup = xml(
        "<aas:assetAdministrationShells><aas:assetAdministrationShell><aas:id>urn:aas</aas:id>\
         <aas:assetInformation><aas:assetKind>Instance</aas:assetKind></aas:assetInformation>\
         <aas:submodels><aas:reference><aas:type>ModelReference</aas:type><aas:keys>\
         <aas:key><aas:type>Submodel</aas:type><aas:value>urn:sm</aas:value></aas:key>\
         <aas:key><aas:type>Property</aas:type><aas:value>p</aas:value></aas:key>\
         </aas:keys></aas:reference></aas:submodels>\
         </aas:assetAdministrationShell></aas:assetAdministrationShells>",
    );
    for (format, text, target) in [
        (Format::Json, json.to_owned(), KeyType::Property),
        (Format::Xml, markup, KeyType::Submodel),
    ] {
        let env = decode_document(format, text.as_bytes(), &DecodeOptions::strict());
        let Ok(env) = env else {
            panic!("{format}: {env:?}");
        };
        assert_eq!(env.asset_administration_shells[0].submodels[0].target, target, "{format}");
        assert_eq!(kinds(&env), vec![(Severity::Warning, ErrorKind::ReferenceTargetKindMismatch)]);
    }
}
