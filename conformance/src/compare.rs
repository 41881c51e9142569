//! Content comparison of two decoded environments.

use std::collections::BTreeMap;

use aas_codec::model::Identifiable;
use aas_codec::Environment;

/// Lists, per group, the ids present on only one side and the ids whose
/// entities differ. Empty when both environments hold the same content.
pub fn differences(left: &Environment, right: &Environment) -> Vec<String> {
    let mut found = Vec::new();
    group(
        "assetAdministrationShells",
        &left.asset_administration_shells,
        &right.asset_administration_shells,
        &mut found,
    );
    group("submodels", &left.submodels, &right.submodels, &mut found);
    group(
        "conceptDescriptions",
        &left.concept_descriptions,
        &right.concept_descriptions,
        &mut found,
    );
    found
}

fn group<T: Identifiable + PartialEq>(name: &str, left: &[T], right: &[T], found: &mut Vec<String>) {
    let by_id = |items: &'_ [T]| -> BTreeMap<String, usize> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| (item.id().to_owned(), index))
            .collect()
    };
    let left_ids = by_id(left);
    let right_ids = by_id(right);
    let before = found.len();
    for (id, &index) in &left_ids {
        match right_ids.get(id) {
            None => found.push(format!("{name}: {id} only on the left")),
            Some(&other) if left[index] != right[other] => found.push(format!("{name}: {id} differs")),
            Some(_) => {}
        }
    }
    for id in right_ids.keys().filter(|id| !left_ids.contains_key(*id)) {
        found.push(format!("{name}: {id} only on the right"));
    }
    if found.len() == before && left.iter().map(|i| i.id()).ne(right.iter().map(|i| i.id())) {
        found.push(format!("{name}: same entities in a different order"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aas_codec::model::{ConceptDescription, Identification, Submodel};

    fn env(submodels: &[&str]) -> Environment {
        let mut env = Environment::new();
        for id in submodels {
            let added = env.add(Submodel::new(Identification::new(*id)));
            assert!(added.is_ok());
        }
        env
    }

    #[test]
    fn equal_environments_have_no_differences() {
        assert!(differences(&env(&["urn:a", "urn:b"]), &env(&["urn:a", "urn:b"])).is_empty());
    }

    #[test]
    fn one_sided_and_changed_ids() {
        let left = env(&["urn:a", "urn:b"]);
        let mut right = env(&["urn:b", "urn:c"]);
        right.submodels[0].kind = aas_codec::model::ModellingKind::Template;
        assert_eq!(
            differences(&left, &right),
            vec![
                "submodels: urn:a only on the left".to_owned(),
                "submodels: urn:b differs".to_owned(),
                "submodels: urn:c only on the right".to_owned(),
            ]
        );
    }

    #[test]
    fn order_matters() {
        let found = differences(&env(&["urn:a", "urn:b"]), &env(&["urn:b", "urn:a"]));
        assert_eq!(found.len(), 1);

        let mut left = Environment::new();
        assert!(left.add(ConceptDescription::new(Identification::new("urn:cd"))).is_ok());
        assert_eq!(
            differences(&left, &Environment::new()),
            vec!["conceptDescriptions: urn:cd only on the left".to_owned()]
        );
    }
}
