//! Default attributes for newly created disease entries.

use endo_model::{AttrSet, Disease, DiseaseEntry, ScopeDef};

/// Seeds `entry` with the default attributes declared by `disease`.
///
/// Single-select scopes keep only the last declared default. Returns the
/// number of labels selected.
pub fn apply_defaults(disease: &Disease, entry: &mut DiseaseEntry) -> usize {
    let mut applied = 0;
    for section in &disease.sections {
        let scopes = std::iter::once((None, section.as_scope())).chain(
            section
                .subsections
                .iter()
                .map(|sub| (Some(sub.name.as_str()), sub.as_scope())),
        );
        for (subsection, scope) in scopes {
            if scope.default_attrs.is_empty() {
                continue;
            }
            let target = entry
                .sections
                .entry(section.name.clone())
                .or_default()
                .scope_mut(subsection);
            applied += seed_scope(target.attrs, &scope);
        }
    }
    if applied > 0 {
        tracing::debug!(disease = %disease.name, applied, "applied default attributes");
    }
    applied
}

fn seed_scope(attrs: &mut AttrSet, scope: &ScopeDef<'_>) -> usize {
    if scope.multi {
        for label in scope.default_attrs {
            attrs.insert(label.as_str());
        }
        return scope.default_attrs.len();
    }
    match scope.default_attrs.last() {
        Some(last) => {
            if scope.default_attrs.len() > 1 {
                tracing::debug!(
                    scope = scope.name,
                    kept = %last,
                    "several defaults in a single-select scope, keeping the last"
                );
            }
            attrs.clear();
            attrs.insert(last.as_str());
            1
        }
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use endo_model::{SectionDef, SubsectionDef};

    fn disease() -> Disease {
        let mut single = SectionDef::new("Base");
        single.default_attrs = vec!["Clean".to_string(), "Slough".to_string()];

        let mut multi = SectionDef::new("Features");
        multi.multi = true;
        multi.default_attrs = vec!["Round".to_string(), "Deep".to_string()];
        let mut sub = SubsectionDef::new("Edge");
        sub.default_attrs = vec!["Regular".to_string()];
        multi.subsections.push(sub);

        let mut disease = Disease::new("Ulcer");
        disease.sections = vec![SectionDef::new("Size"), single, multi];
        disease
    }

    #[test]
    fn test_single_select_keeps_last_default() {
        let mut entry = DiseaseEntry::default();
        apply_defaults(&disease(), &mut entry);
        let base = &entry.sections["Base"];
        assert_eq!(base.attrs.iter().collect::<Vec<_>>(), vec!["Slough"]);
    }

    #[test]
    fn test_multi_select_keeps_all_defaults() {
        let mut entry = DiseaseEntry::default();
        let applied = apply_defaults(&disease(), &mut entry);
        assert_eq!(applied, 4);
        let features = &entry.sections["Features"];
        assert_eq!(features.attrs.iter().collect::<Vec<_>>(), vec!["Round", "Deep"]);
        assert!(features.subsections["Edge"].attrs.contains("Regular"));
    }

    #[test]
    fn test_sections_without_defaults_are_not_created() {
        let mut entry = DiseaseEntry::default();
        apply_defaults(&disease(), &mut entry);
        assert!(!entry.sections.contains_key("Size"));
    }
}
