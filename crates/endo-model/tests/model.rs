use endo_model::pattern::tokenize;
use endo_model::{
    AttributePattern, Condition, InputEntry, InputGroup, PatternToken, Report, ReportDocument,
};
use proptest::prelude::*;

fn word() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("int_box".to_string()),
        Just("FLOAT_BOX".to_string()),
        Just("alphanum_box".to_string()),
        Just("int_box:int_box".to_string()),
        "[a-zA-Z/:=()]{1,6}",
    ]
}

proptest! {
    #[test]
    fn tokenizing_is_deterministic(words in prop::collection::vec(word(), 0..8)) {
        let raw = words.join(" ");
        prop_assert_eq!(tokenize(&raw), tokenize(&raw));
    }

    #[test]
    fn tokens_preserve_non_whitespace_text(words in prop::collection::vec(word(), 0..8)) {
        let raw = words.join(" ");
        let rebuilt: String = tokenize(&raw)
            .iter()
            .map(|t| match t {
                PatternToken::Text { value } => value.to_lowercase(),
                other => other.box_kind().map(|k| k.keyword().to_string()).unwrap_or_default(),
            })
            .collect();
        let expected: String = raw.split_whitespace().collect::<String>().to_lowercase();
        prop_assert_eq!(rebuilt, expected);
    }

    #[test]
    fn condition_parsing_never_panics(text in ".{0,60}") {
        let parsed = Condition::parse(&text);
        if text.trim().is_empty() {
            prop_assert!(parsed.is_always());
        }
    }
}

#[test]
fn input_group_survives_document_round_trip() {
    let pattern = AttributePattern::parse("int_box mm from alphanum_box");
    let mut group = InputGroup::new(pattern.raw.clone(), pattern.tokens.clone());
    group.set_box_value(0, "12");
    group.set_box_value(1, "left");

    let mut report = Report::new();
    let entry = report
        .locations
        .entry("Esophagus".to_string())
        .or_default()
        .diseases
        .entry("Stricture".to_string())
        .or_default();
    entry
        .sections
        .entry("Size".to_string())
        .or_default()
        .inputs
        .push(InputEntry::Group(group));

    let doc = ReportDocument::new(report);
    let text = doc.to_json_string().unwrap();
    let back = ReportDocument::from_json_str(&text).unwrap();

    let inputs = &back.report.disease("Esophagus", "Stricture").unwrap().sections["Size"].inputs;
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].display_text(), "12 mm from left");
    assert_eq!(back, doc);
}
