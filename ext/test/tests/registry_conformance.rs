//! Registry-based conformance tests
//!
//! Proves that the config-driven path (`ReasonRegistry::load_rule_set()`) produces
//! identical responses to the hand-built path (`RuleSetBuilder`), and that both reject
//! the same configuration mistakes.
//!
//! Run with: cargo test -p verdict-test --test registry_conformance --features verdict-test/registry

#![cfg(feature = "registry")]

use serde_json::json;
use verdict::{
    ConfigError, ProblemBuilder, Reason, ReasonRegistry, ReasonRegistryBuilder, RuleBuilder, RuleSet,
    RuleSetConfig, StatusCode, StringMatchSpec, ValidationError,
};
use verdict_test::{ConflictError, NotFoundError, OutcomeSpec, ReasonSpec};

fn registry() -> ReasonRegistry {
    verdict_test::register(ReasonRegistryBuilder::new()).build()
}

fn load(config: serde_json::Value) -> Result<RuleSet, ConfigError> {
    let config: RuleSetConfig = serde_json::from_value(config).expect("config shape");
    registry().load_rule_set(config)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builder ↔ Config equivalence
// ═══════════════════════════════════════════════════════════════════════════════

fn built() -> RuleSet {
    RuleSet::builder()
        .rule(
            RuleBuilder::when_error::<ValidationError>()
                .named("validation")
                .problem(ProblemBuilder::default().validation_errors()),
        )
        .rule(
            RuleBuilder::when_error_with_metadata_matching::<ConflictError>(
                "version",
                StringMatchSpec::Prefix("v".into()).to_matcher().unwrap(),
            )
            .named("versioned conflict")
            .header_with("X-Version", |ctx| {
                ctx.metadata("version").first().and_then(|v| v.as_str().map(str::to_owned))
            })
            .problem(
                ProblemBuilder::new(StatusCode::CONFLICT)
                    .problem_type("https://errors.example.com/version")
                    .title("Version conflict")
                    .detail_with(|ctx| {
                        Ok(ctx.first_reason::<ConflictError>().ok().map(|r| r.message().to_owned()))
                    })
                    .extension("retryable", true),
            ),
        )
        .rule(
            RuleBuilder::when_error::<NotFoundError>()
                .named("not found")
                .problem(ProblemBuilder::new(StatusCode::NOT_FOUND)),
        )
        .rule(RuleBuilder::when_success().named("created").respond(StatusCode::CREATED))
        .rule(
            RuleBuilder::when_failure()
                .named("fallback")
                .header("Cache-Control", "no-store")
                .problem(ProblemBuilder::default()),
        )
        .build()
        .unwrap()
}

fn loaded() -> RuleSet {
    load(json!({
        "rules": [
            {
                "name": "validation",
                "when": { "type": "error", "kind": "validation" },
                "problem": { "validation": "typed" }
            },
            {
                "name": "versioned conflict",
                "when": { "type": "error", "kind": "conflict", "metadata": { "key": "version", "value": { "prefix": "v" } } },
                "headers": [ { "name": "X-Version", "value": { "from": "metadata", "key": "version" } } ],
                "problem": {
                    "status": 409,
                    "type": "https://errors.example.com/version",
                    "title": "Version conflict",
                    "detail": { "from": "message", "kind": "conflict" },
                    "extensions": [ { "name": "retryable", "value": true } ]
                }
            },
            {
                "name": "not found",
                "when": { "type": "error", "kind": "not_found" },
                "problem": { "status": 404 }
            },
            {
                "name": "created",
                "when": { "type": "success" },
                "respond": { "status": 201 }
            },
            {
                "name": "fallback",
                "when": { "type": "failure" },
                "headers": [ { "name": "Cache-Control", "value": "no-store" } ],
                "problem": {}
            }
        ]
    }))
    .unwrap()
}

fn outcomes() -> Vec<(&'static str, OutcomeSpec)> {
    vec![
        ("empty success", OutcomeSpec::ok()),
        ("valued success", OutcomeSpec::ok_with(json!({"id": 3}))),
        (
            "validation",
            OutcomeSpec::failure(vec![ReasonSpec::new("validation", "bad").with_field_error("name", "required")]),
        ),
        (
            "versioned conflict",
            OutcomeSpec::failure(vec![ReasonSpec::new("conflict", "stale write").with_metadata("version", "v7")]),
        ),
        (
            "unversioned conflict",
            OutcomeSpec::failure(vec![ReasonSpec::new("conflict", "stale write").with_metadata("version", 7)]),
        ),
        ("not found", OutcomeSpec::failure(vec![ReasonSpec::new("not_found", "no order 9")])),
        (
            "mixed reasons",
            OutcomeSpec::failure(vec![
                ReasonSpec::new("unauthorized", "expired"),
                ReasonSpec::new("not_found", "no order 9"),
            ]),
        ),
        ("generic", OutcomeSpec::failure(vec![ReasonSpec::new("error", "boom")])),
    ]
}

#[test]
fn test_builder_and_config_agree() {
    let built = built();
    let loaded = loaded();
    assert_eq!(built.len(), loaded.len());

    for (name, outcome) in outcomes() {
        let a = outcome.map_with(&built).unwrap().unwrap();
        let b = outcome.map_with(&loaded).unwrap().unwrap();
        assert_eq!(a, b, "outcome '{name}' maps differently via config");
    }
}

#[test]
fn test_traces_agree() {
    let built = built();
    let loaded = loaded();

    for (name, outcome) in outcomes() {
        let a = outcome.trace_with(&built).unwrap();
        let b = outcome.trace_with(&loaded).unwrap();
        assert_eq!(a.matched_rule(), b.matched_rule(), "outcome '{name}'");
        assert_eq!(a.used_default, b.used_default, "outcome '{name}'");
        let names = |t: &verdict::EvalTrace| t.steps.iter().map(|s| s.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&a), names(&b), "outcome '{name}'");
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builder ↔ Config rejection parity
// ═══════════════════════════════════════════════════════════════════════════════

fn assert_same_root(built: Result<RuleSet, ConfigError>, loaded: Result<RuleSet, ConfigError>) {
    let built = built.expect_err("builder accepted");
    let loaded = loaded.expect_err("config accepted");
    assert_eq!(built.root(), loaded.root());
    assert_eq!(built.to_string(), loaded.to_string());
}

#[test]
fn test_missing_response_parity() {
    assert_same_root(
        RuleSet::builder().rule(RuleBuilder::when_failure().named("r")).build(),
        load(json!({ "rules": [ { "name": "r", "when": { "type": "failure" } } ] })),
    );
}

#[test]
fn test_invalid_header_parity() {
    assert_same_root(
        RuleSet::builder()
            .rule(RuleBuilder::when_failure().header("Bad Header", "x").respond(StatusCode::BAD_REQUEST))
            .build(),
        load(json!({
            "rules": [ { "when": { "type": "failure" }, "headers": [ { "name": "Bad Header", "value": "x" } ], "respond": { "status": 400 } } ]
        })),
    );
}

#[test]
fn test_duplicate_extension_parity() {
    assert_same_root(
        RuleSet::builder()
            .rule(RuleBuilder::when_failure().problem(ProblemBuilder::default().extension("a", 1).extension("a", 2)))
            .build(),
        load(json!({
            "rules": [ { "when": { "type": "failure" }, "problem": { "extensions": [ { "name": "a", "value": 1 }, { "name": "a", "value": 2 } ] } } ]
        })),
    );
}

#[test]
fn test_reserved_errors_parity() {
    assert_same_root(
        RuleSet::builder()
            .rule(RuleBuilder::when_failure().problem(ProblemBuilder::default().validation_errors().extension("errors", 1)))
            .build(),
        load(json!({
            "rules": [ { "when": { "type": "failure" }, "problem": { "validation": "typed", "extensions": [ { "name": "errors", "value": 1 } ] } } ]
        })),
    );
}

#[test]
fn test_too_many_rules_parity() {
    let count = verdict::MAX_RULES + 1;
    let mut builder = RuleSet::builder();
    for _ in 0..count {
        builder = builder.rule(RuleBuilder::when_failure().respond(StatusCode::BAD_REQUEST));
    }
    let rules: Vec<_> = (0..count)
        .map(|_| json!({ "when": { "type": "failure" }, "respond": { "status": 400 } }))
        .collect();
    assert_same_root(builder.build(), load(json!({ "rules": rules })));
}

#[test]
fn test_unknown_kind_is_config_only() {
    let err = load(json!({ "rules": [ { "when": { "type": "error", "kind": "teapot" }, "respond": { "status": 418 } } ] }))
        .unwrap_err();
    assert!(matches!(err.root(), ConfigError::UnknownKind { name, available } if name == "teapot" && available.len() == 5));
}
