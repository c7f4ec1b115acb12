use std::collections::BTreeMap;

use super::{is_pool_property, DeclaredProperty, PropertyMap, PropertyMode};

/// Rebuild declared properties from what was observed.
///
/// Declared names always come back, with the observed value. Names nobody declared come back
/// according to `mode`, and only if they were overridden on the resource itself and aren't pool
/// properties. Names in `ignored` are handled by dedicated attributes and never come back.
///
/// When declared value equals the parsable one, the parsable one is kept (`4096` rather than
/// `4K`). Declared names that weren't observed at all are left as declared. Output is sorted by
/// name.
pub fn synthesize_declared(
    observed: &PropertyMap,
    declared: &[DeclaredProperty],
    ignored: &[&str],
    mode: PropertyMode,
) -> Vec<DeclaredProperty> {
    let defined: BTreeMap<&str, &str> =
        declared.iter().map(|p| (p.name.as_str(), p.value.as_str())).collect();

    let mut synthesized: BTreeMap<&str, &str> = BTreeMap::new();
    for (name, property) in observed {
        let name = name.as_str();
        if ignored.contains(&name) {
            continue;
        }
        let raw = property.raw_value.as_ref().map(String::as_str);
        match defined.get(name) {
            Some(&value) if raw == Some(value) => {
                synthesized.insert(name, value);
            },
            Some(_) => {
                synthesized.insert(name, &property.value);
            },
            None => {
                let eligible = match mode {
                    PropertyMode::Defined => false,
                    PropertyMode::Native => !name.contains(':'),
                    PropertyMode::All => true,
                };
                if eligible && property.source.is_override() && !is_pool_property(name) {
                    synthesized.insert(name, &property.value);
                }
            },
        }
    }

    for (name, value) in defined {
        if !ignored.contains(&name) {
            synthesized.entry(name).or_insert(value);
        }
    }

    synthesized.into_iter().map(|(name, value)| DeclaredProperty::new(name, value)).collect()
}
