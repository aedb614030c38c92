//! Property tests for the template compiler.
//!
//! Compilation must be a pure function of its input: the same rulebook text
//! always yields byte-identical pattern sources, and the template and pattern
//! lists always stay aligned one-to-one.

use proptest::prelude::*;
use rulebook_policy::{CompiledTemplates, Keyword, Policy, PolicySettings, RulebookSource, TemplateKind};

/// Placeholder tokens paired with a value each one must accept
const SAMPLES: &[(&str, &str)] = &[
    ("<url>", "http://h/p"),
    ("<variable_name>", "user_id"),
    ("<integer_value>", "-42"),
    ("<json_path>", "data.items[0].id"),
    ("<JSON_path>", "meta.total"),
    ("<expected_status_code>", "201"),
    ("<method>", "PATCH"),
    ("<header_name>", "X-Trace-Id"),
];

fn rulebook_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z<>_#*. 0-9-]{0,40}",
        (0..SAMPLES.len(), "[a-z]{1,8}").prop_map(|(i, word)| format!("{word} {}", SAMPLES[i].0)),
        Just("# comment".to_string()),
        Just(String::new()),
    ]
}

proptest! {
    #[test]
    fn prop_compilation_is_deterministic(lines in proptest::collection::vec(rulebook_line(), 0..20)) {
        let text = lines.join("\n");
        let a = Policy::compile(
            &RulebookSource::present(text.clone()),
            &RulebookSource::present(text.clone()),
            PolicySettings::default(),
        );
        let b = Policy::compile(
            &RulebookSource::present(text.clone()),
            &RulebookSource::present(text),
            PolicySettings::default(),
        );
        let sources_a: Vec<&str> = a.step_patterns().iter().map(|p| p.source()).collect();
        let sources_b: Vec<&str> = b.step_patterns().iter().map(|p| p.source()).collect();
        prop_assert_eq!(sources_a, sources_b);
        prop_assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn prop_templates_and_patterns_stay_aligned(lines in proptest::collection::vec(rulebook_line(), 0..20)) {
        for kind in [TemplateKind::Step, TemplateKind::Assertion] {
            let compiled = CompiledTemplates::compile(lines.iter().map(String::as_str), kind);
            prop_assert_eq!(compiled.templates().len(), compiled.patterns().len());
            for (template, pattern) in compiled.templates().iter().zip(compiled.patterns()) {
                prop_assert_eq!(template.as_str(), pattern.template());
            }
        }
    }

    #[test]
    fn prop_substituted_line_matches_its_template(
        word in "[a-z]{1,8}".prop_filter("not a keyword", |w| w.parse::<Keyword>().is_err()),
        index in 0..SAMPLES.len(),
    ) {
        let (token, value) = SAMPLES[index];
        let compiled = CompiledTemplates::compile([format!("{word} {token}").as_str()], TemplateKind::Assertion);
        prop_assert_eq!(compiled.len(), 1);
        let line = format!("Then {word} {value}");
        prop_assert!(compiled.matches(&line), "{} should match {}", line, compiled.patterns()[0].source());
    }
}

#[test]
fn missing_sources_fall_back_to_empty_lists() {
    let policy = Policy::compile(
        &RulebookSource::Absent,
        &RulebookSource::present("status <expected_status_code>"),
        PolicySettings::default(),
    );
    assert!(policy.step_templates().is_empty());
    assert!(policy.step_patterns().is_empty());
    assert_eq!(policy.assertion_patterns().len(), 1);
}
