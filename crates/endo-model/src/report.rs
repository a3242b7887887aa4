//! Mutable report state.
//!
//! The report mirrors the schema: location → disease → section →
//! subsection. Serialization follows the persisted report document format,
//! so a report written by one session can be loaded by another.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::frames::{self, FrameSpan};
use crate::pattern::{self, PatternToken};

/// Ordered set of selected attribute labels.
///
/// Persisted as an object mapping each label to `true`; entries with a
/// falsy value are dropped when reading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrSet(Vec<String>);

impl AttrSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns true if `label` is selected.
    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|l| l == label)
    }

    /// Selects `label`. Returns false if it was already selected.
    pub fn insert(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        if self.contains(&label) {
            return false;
        }
        self.0.push(label);
        true
    }

    /// Deselects `label`. Returns false if it was not selected.
    pub fn remove(&mut self, label: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|l| l != label);
        self.0.len() != before
    }

    /// Deselects everything.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Selected labels in selection order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for AttrSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = AttrSet::new();
        for label in iter {
            set.insert(label);
        }
        set
    }
}

impl Serialize for AttrSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for label in &self.0 {
            map.serialize_entry(label, &true)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttrSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AttrSetVisitor;

        impl<'de> Visitor<'de> for AttrSetVisitor {
            type Value = AttrSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of attribute labels to booleans")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<AttrSet, A::Error> {
                let mut set = AttrSet::new();
                while let Some((label, value)) =
                    access.next_entry::<String, serde_json::Value>()?
                {
                    if is_truthy(&value) {
                        set.insert(label);
                    }
                }
                Ok(set)
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<AttrSet, E> {
                Ok(AttrSet::new())
            }
        }

        deserializer.deserialize_any(AttrSetVisitor)
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Marker for the `"type": "group"` tag of persisted input groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupTag {
    #[default]
    #[serde(rename = "group")]
    Group,
}

/// Stored values for one input-pattern attribute.
///
/// `values` is positional against `pattern`: one slot per token, with text
/// positions left empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputGroup {
    #[serde(rename = "type")]
    pub tag: GroupTag,
    /// The pattern source text; identity for re-association.
    pub raw_key: String,
    pub pattern: Vec<PatternToken>,
    #[serde(default)]
    pub values: Vec<String>,
}

impl InputGroup {
    /// Creates a group with all slots empty.
    pub fn new(raw_key: impl Into<String>, pattern: Vec<PatternToken>) -> Self {
        let values = vec![String::new(); pattern.len()];
        Self {
            tag: GroupTag::Group,
            raw_key: raw_key.into(),
            pattern,
            values,
        }
    }

    /// Sets the value of the `ordinal`-th input box. Returns false if the
    /// pattern has no such box.
    pub fn set_box_value(&mut self, ordinal: usize, value: impl Into<String>) -> bool {
        let Some(pos) = pattern::box_position(&self.pattern, ordinal) else {
            return false;
        };
        if self.values.len() < self.pattern.len() {
            self.values.resize(self.pattern.len(), String::new());
        }
        self.values[pos] = value.into();
        true
    }

    /// Value of the `ordinal`-th input box.
    pub fn box_value(&self, ordinal: usize) -> Option<&str> {
        let pos = pattern::box_position(&self.pattern, ordinal)?;
        Some(self.values.get(pos).map_or("", String::as_str))
    }

    /// Values of the input boxes only, in order.
    pub fn box_values(&self) -> Vec<&str> {
        self.pattern
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_box())
            .map(|(idx, _)| self.values.get(idx).map_or("", String::as_str))
            .collect()
    }

    /// Returns true if any box holds a non-blank value.
    pub fn has_any_value(&self) -> bool {
        pattern::has_box_value(&self.pattern, &self.values)
    }

    /// Display label, empty when no box has a value.
    pub fn label(&self) -> String {
        pattern::render_label(&self.pattern, &self.values)
    }

    /// Replaces the pattern, carrying each box value to the box that stands
    /// for the same keyword occurrence in the source text.
    ///
    /// A stored pattern may hold a keyword inside a literal token (older
    /// tokenizers left `int_box,` as text). Such keywords still count as an
    /// occurrence, so values after them keep their place.
    pub fn realign(&mut self, pattern: Vec<PatternToken>) {
        if self.pattern.is_empty() {
            self.values.resize(pattern.len(), String::new());
            self.pattern = pattern;
            return;
        }

        let mut carried = BTreeMap::new();
        let mut occurrence = 0;
        for (idx, token) in self.pattern.iter().enumerate() {
            match token {
                PatternToken::Text { value } => occurrence += pattern::keyword_count(value),
                _ => {
                    if let Some(value) = self.values.get(idx) {
                        carried.insert(occurrence, value.clone());
                    }
                    occurrence += 1;
                }
            }
        }

        let mut values = vec![String::new(); pattern.len()];
        let box_slots = pattern.iter().enumerate().filter(|(_, t)| t.is_box());
        for (ordinal, (idx, _)) in box_slots.enumerate() {
            if let Some(value) = carried.remove(&ordinal) {
                values[idx] = value;
            }
        }
        self.values = values;
        self.pattern = pattern;
    }
}

/// Free-form input entry from older report files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl PlainInput {
    /// Display text: the label if present, otherwise the value, trimmed.
    pub fn text(&self) -> &str {
        self.label
            .as_deref()
            .filter(|l| !l.is_empty())
            .or(self.value.as_deref())
            .unwrap_or("")
            .trim()
    }
}

/// One entry of a scope's `inputs` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputEntry {
    Group(InputGroup),
    Plain(PlainInput),
}

impl InputEntry {
    /// Display text; empty groups and blank plain entries render empty.
    pub fn display_text(&self) -> String {
        match self {
            InputEntry::Group(group) => group.label(),
            InputEntry::Plain(plain) => plain.text().to_string(),
        }
    }

    /// Returns true if this entry carries content.
    pub fn has_content(&self) -> bool {
        match self {
            InputEntry::Group(group) => group.has_any_value(),
            InputEntry::Plain(plain) => !plain.text().is_empty(),
        }
    }

    /// The group, if this is an input group.
    pub fn as_group(&self) -> Option<&InputGroup> {
        match self {
            InputEntry::Group(group) => Some(group),
            InputEntry::Plain(_) => None,
        }
    }
}

/// Selections within a subsection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsectionEntry {
    #[serde(default)]
    pub attrs: AttrSet,
    #[serde(default)]
    pub inputs: Vec<InputEntry>,
}

/// Selections within a section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionEntry {
    #[serde(default)]
    pub attrs: AttrSet,
    #[serde(default)]
    pub inputs: Vec<InputEntry>,
    #[serde(default)]
    pub subsections: BTreeMap<String, SubsectionEntry>,
}

/// Mutable access to the attrs and inputs of one scope.
pub struct ScopeEntryMut<'a> {
    pub attrs: &'a mut AttrSet,
    pub inputs: &'a mut Vec<InputEntry>,
}

impl SectionEntry {
    /// Returns the section scope, or the named subsection scope (created on
    /// demand).
    pub fn scope_mut(&mut self, subsection: Option<&str>) -> ScopeEntryMut<'_> {
        match subsection {
            None => ScopeEntryMut {
                attrs: &mut self.attrs,
                inputs: &mut self.inputs,
            },
            Some(name) => {
                let sub = self.subsections.entry(name.to_string()).or_default();
                ScopeEntryMut {
                    attrs: &mut sub.attrs,
                    inputs: &mut sub.inputs,
                }
            }
        }
    }

    /// Selected attributes of the section or the named subsection.
    pub fn attrs(&self, subsection: Option<&str>) -> Option<&AttrSet> {
        match subsection {
            None => Some(&self.attrs),
            Some(name) => self.subsections.get(name).map(|s| &s.attrs),
        }
    }
}

/// Returns true if any attribute or input entry carries content.
pub fn scope_has_content(attrs: &AttrSet, inputs: &[InputEntry]) -> bool {
    !attrs.is_empty() || inputs.iter().any(InputEntry::has_content)
}

impl SubsectionEntry {
    /// Returns true if anything is selected or filled in.
    pub fn has_content(&self) -> bool {
        scope_has_content(&self.attrs, &self.inputs)
    }
}

impl SectionEntry {
    /// Returns true if the section or any subsection has content.
    pub fn has_content(&self) -> bool {
        scope_has_content(&self.attrs, &self.inputs)
            || self.subsections.values().any(SubsectionEntry::has_content)
    }

    /// Returns true if `label` is selected at the section level or in any
    /// of its subsections.
    pub fn has_attr_anywhere(&self, label: &str) -> bool {
        self.attrs.contains(label) || self.subsections.values().any(|s| s.attrs.contains(label))
    }

    /// Removes input groups whose boxes are all empty, at every level.
    pub fn prune_empty_groups(&mut self) -> usize {
        let mut removed = prune_groups(&mut self.inputs);
        for sub in self.subsections.values_mut() {
            removed += prune_groups(&mut sub.inputs);
        }
        removed
    }
}

fn prune_groups(inputs: &mut Vec<InputEntry>) -> usize {
    let before = inputs.len();
    inputs.retain(|entry| match entry {
        InputEntry::Group(group) => group.has_any_value(),
        InputEntry::Plain(_) => true,
    });
    before - inputs.len()
}

/// A disease added at a location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseEntry {
    #[serde(default)]
    pub sections: BTreeMap<String, SectionEntry>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub sublocations: Vec<String>,
    /// Single sub-location from older files; folded into `sublocations`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sublocation: Option<String>,
    #[serde(default, deserialize_with = "deserialize_frame")]
    pub start_frame: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_frame")]
    pub end_frame: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_frame")]
    pub segmentation_frame: Option<i64>,
}

/// Frame fields arrive as numbers, as text typed into a frame box, or null.
/// Text without a leading integer reads as unset.
fn deserialize_frame<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFrame {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<RawFrame>::deserialize(deserializer)? {
        Some(RawFrame::Int(n)) => Some(n),
        Some(RawFrame::Float(f)) if f.is_finite() => Some(f.trunc() as i64),
        Some(RawFrame::Text(text)) => frames::parse_frame(&text),
        Some(RawFrame::Float(_)) | None => None,
    })
}

impl DiseaseEntry {
    /// Frame span, when both start and end are set.
    pub fn frame_span(&self) -> Option<FrameSpan> {
        Some(FrameSpan::new(self.start_frame?, self.end_frame?))
    }

    /// Folds the legacy single `sublocation` into the list.
    pub fn normalize_sublocations(&mut self) {
        if let Some(legacy) = self.sublocation.take() {
            if self.sublocations.is_empty() && !legacy.is_empty() {
                self.sublocations.push(legacy);
            }
        }
    }

    /// Returns true if `key` is a chosen sub-location.
    pub fn has_sublocation(&self, key: &str) -> bool {
        self.sublocations.iter().any(|s| s == key)
    }
}

/// Diseases reported at one location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEntry {
    #[serde(default)]
    pub diseases: IndexMap<String, DiseaseEntry>,
}

/// Reference to the disease currently being edited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivePointer {
    pub loc: String,
    pub disease: String,
}

impl ActivePointer {
    pub fn new(loc: impl Into<String>, disease: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            disease: disease.into(),
        }
    }
}

/// The whole report, keyed by location. Locations and their diseases keep
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    pub locations: IndexMap<String, LocationEntry>,
}

impl Report {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a disease entry.
    pub fn disease(&self, loc: &str, disease: &str) -> Option<&DiseaseEntry> {
        self.locations.get(loc)?.diseases.get(disease)
    }

    /// Mutable lookup of a disease entry.
    pub fn disease_mut(&mut self, loc: &str, disease: &str) -> Option<&mut DiseaseEntry> {
        self.locations.get_mut(loc)?.diseases.get_mut(disease)
    }

    /// Returns true if the disease is present at the location.
    pub fn contains(&self, pointer: &ActivePointer) -> bool {
        self.disease(&pointer.loc, &pointer.disease).is_some()
    }

    /// Removes a disease, dropping the location when it becomes empty.
    pub fn remove_disease(&mut self, loc: &str, disease: &str) -> Option<DiseaseEntry> {
        let location = self.locations.get_mut(loc)?;
        let removed = location.diseases.shift_remove(disease);
        if location.diseases.is_empty() {
            self.locations.shift_remove(loc);
        }
        removed
    }

    /// Every (location, disease) pair in insertion order.
    pub fn pointers(&self) -> impl Iterator<Item = ActivePointer> + '_ {
        self.locations.iter().flat_map(|(loc, entry)| {
            entry
                .diseases
                .keys()
                .map(move |name| ActivePointer::new(loc.clone(), name.clone()))
        })
    }

    /// First (location, disease) pair, if any.
    pub fn first_pointer(&self) -> Option<ActivePointer> {
        self.pointers().next()
    }

    /// Returns true if no location holds a disease.
    pub fn is_empty(&self) -> bool {
        self.locations.values().all(|l| l.diseases.is_empty())
    }

    /// Number of disease entries across all locations.
    pub fn disease_count(&self) -> usize {
        self.locations.values().map(|l| l.diseases.len()).sum()
    }

    /// Drops locations that hold no diseases.
    pub fn drop_empty_locations(&mut self) {
        self.locations.retain(|_, entry| !entry.diseases.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::tokenize;

    #[test]
    fn attr_set_keeps_order_and_uniqueness() {
        let mut set = AttrSet::new();
        assert!(set.insert("Yes"));
        assert!(set.insert("Granular"));
        assert!(!set.insert("Yes"));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["Yes", "Granular"]);
        assert!(set.remove("Yes"));
        assert!(!set.remove("Yes"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn attr_set_serializes_as_true_map() {
        let set: AttrSet = ["Velvety", "Granular"].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"Velvety":true,"Granular":true}"#);
        let back: AttrSet =
            serde_json::from_str(r#"{"Velvety":true,"Granular":false,"Flat":1}"#).unwrap();
        assert_eq!(back.iter().collect::<Vec<_>>(), vec!["Velvety", "Flat"]);
    }

    #[test]
    fn input_group_box_addressing() {
        let mut group = InputGroup::new("int_box mm from alphanum_box", tokenize("int_box mm from alphanum_box"));
        assert!(!group.has_any_value());
        assert!(group.set_box_value(0, "12"));
        assert!(group.set_box_value(1, "left"));
        assert!(!group.set_box_value(2, "x"));
        assert_eq!(group.box_values(), vec!["12", "left"]);
        assert_eq!(group.label(), "12 mm from left");
        assert_eq!(group.values, vec!["12", "", "", "left"]);
    }

    #[test]
    fn input_group_realign_pads_and_truncates() {
        let mut group = InputGroup::new("int_box", tokenize("int_box"));
        group.set_box_value(0, "3");
        group.realign(tokenize("int_box cm"));
        assert_eq!(group.values, vec!["3", ""]);
        group.realign(Vec::new());
        assert!(group.values.is_empty());
    }

    #[test]
    fn input_group_realign_follows_keyword_occurrence() {
        // Stored by a tokenizer that kept "int_box," as literal text.
        let mut group = InputGroup {
            tag: GroupTag::Group,
            raw_key: "int_box, int_box mm".to_string(),
            pattern: vec![
                PatternToken::text("int_box,"),
                PatternToken::IntBox,
                PatternToken::text("mm"),
            ],
            values: vec![String::new(), "7".to_string(), String::new()],
        };
        group.realign(tokenize("int_box, int_box mm"));
        assert_eq!(group.box_values(), vec!["", "7"]);
        assert_eq!(group.label(), ", 7 mm");

        let mut wrapped = InputGroup {
            tag: GroupTag::Group,
            raw_key: "Size (int_box) alphanum_box".to_string(),
            pattern: vec![
                PatternToken::text("Size"),
                PatternToken::text("(int_box)"),
                PatternToken::AlphanumBox,
            ],
            values: vec![String::new(), String::new(), "antrum".to_string()],
        };
        wrapped.realign(tokenize("Size (int_box) alphanum_box"));
        assert_eq!(wrapped.box_values(), vec!["", "antrum"]);
    }

    #[test]
    fn input_entries_deserialize_both_shapes() {
        let json = r#"[
            {"type":"group","rawKey":"int_box cm","pattern":[{"type":"int_box"},{"type":"text","value":"cm"}],"values":["4",""]},
            {"label":"free note"}
        ]"#;
        let entries: Vec<InputEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].display_text(), "4 cm");
        assert_eq!(entries[1].display_text(), "free note");
        assert!(entries.iter().all(InputEntry::has_content));
    }

    #[test]
    fn section_prunes_empty_groups() {
        let mut section = SectionEntry::default();
        section
            .inputs
            .push(InputEntry::Group(InputGroup::new("int_box", tokenize("int_box"))));
        section
            .scope_mut(Some("Depth"))
            .inputs
            .push(InputEntry::Group(InputGroup::new("float_box", tokenize("float_box"))));
        assert!(!section.has_content());
        assert_eq!(section.prune_empty_groups(), 2);
    }

    #[test]
    fn remove_disease_drops_empty_location() {
        let mut report = Report::new();
        report
            .locations
            .entry("Stomach".to_string())
            .or_default()
            .diseases
            .insert("Ulcer".to_string(), DiseaseEntry::default());
        assert!(!report.is_empty());
        assert!(report.remove_disease("Stomach", "Ulcer").is_some());
        assert!(report.locations.is_empty());
        assert!(report.remove_disease("Stomach", "Ulcer").is_none());
    }

    #[test]
    fn legacy_sublocation_is_folded() {
        let mut entry: DiseaseEntry =
            serde_json::from_str(r#"{"sections":{},"sublocation":"Lower"}"#).unwrap();
        entry.normalize_sublocations();
        assert_eq!(entry.sublocations, vec!["Lower"]);
        assert!(entry.sublocation.is_none());
    }

    #[test]
    fn disease_entry_frame_span() {
        let entry = DiseaseEntry {
            start_frame: Some(10),
            end_frame: Some(34),
            ..Default::default()
        };
        assert_eq!(entry.frame_span().unwrap().frame_count(), 25);
        assert!(DiseaseEntry::default().frame_span().is_none());
    }

    #[test]
    fn frame_fields_accept_numbers_text_and_null() {
        let entry: DiseaseEntry = serde_json::from_str(
            r#"{"startFrame":"120","endFrame":"180abc","segmentationFrame":null}"#,
        )
        .unwrap();
        assert_eq!(entry.start_frame, Some(120));
        assert_eq!(entry.end_frame, Some(180));
        assert_eq!(entry.segmentation_frame, None);

        let entry: DiseaseEntry =
            serde_json::from_str(r#"{"startFrame":7,"endFrame":"","segmentationFrame":12.0}"#)
                .unwrap();
        assert_eq!(entry.start_frame, Some(7));
        assert_eq!(entry.end_frame, None);
        assert_eq!(entry.segmentation_frame, Some(12));
    }

    #[test]
    fn pointers_follow_insertion_order() {
        let report: Report = serde_json::from_str(
            r#"{"Stomach":{"diseases":{"Ulcer":{},"Erosion":{}}},"Esophagus":{"diseases":{"Varices":{}}}}"#,
        )
        .unwrap();
        let pointers: Vec<_> = report.pointers().collect();
        assert_eq!(
            pointers,
            vec![
                ActivePointer::new("Stomach", "Ulcer"),
                ActivePointer::new("Stomach", "Erosion"),
                ActivePointer::new("Esophagus", "Varices"),
            ]
        );
        assert_eq!(report.first_pointer(), Some(ActivePointer::new("Stomach", "Ulcer")));

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.find("Stomach").unwrap() < json.find("Esophagus").unwrap());
    }
}
