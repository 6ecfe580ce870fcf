//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against the verdict engine. A fixture is a rule set
//! config (the same shape `ReasonRegistry::load_rule_set` accepts) plus cases, each an
//! outcome and the response it must map to.
//!
//! ```yaml
//! name: not-found
//! description: error kinds select their rule
//! config:
//!   rules:
//!     - when: { type: error, kind: not_found }
//!       problem: { status: 404 }
//! cases:
//!   - name: missing order
//!     outcome:
//!       errors: [{ kind: not_found, message: order 7 }]
//!     expect:
//!       status: 404
//!       body: { type: "https://tools.ietf.org/html/rfc7231#section-6.5.4", title: Not Found, status: 404 }
//! ```

use crate::{register, OutcomeSpec, TestError};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use verdict::{ConfigError, HttpResponse, MappingError, ReasonRegistry, ReasonRegistryBuilder, RuleSet};

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Raw rule set config, loaded through the registry.
    pub config: Value,
    #[serde(default)]
    pub cases: Vec<TestCase>,
    /// Expected configuration error, matched against the error's message.
    #[serde(default)]
    pub expect_error: Option<String>,
}

/// Test case
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub outcome: OutcomeSpec,
    pub expect: Expect,
}

/// What the mapped response must look like. Unset fields are not checked.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expect {
    #[serde(default)]
    pub status: Option<u16>,
    /// Headers that must be present with exactly these values, in order.
    #[serde(default)]
    pub headers: BTreeMap<String, HeaderExpect>,
    #[serde(default)]
    pub absent_headers: Vec<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Expected body, compared as JSON.
    #[serde(default)]
    pub body: Option<Value>,
    /// The response must have no body.
    #[serde(default)]
    pub no_body: bool,
    /// Mapping must fail; matched against the error's message.
    #[serde(default)]
    pub error: Option<String>,
}

/// One header value or an ordered list of values.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HeaderExpect {
    One(String),
    Many(Vec<String>),
}

impl HeaderExpect {
    fn values(&self) -> Vec<&str> {
        match self {
            Self::One(v) => vec![v.as_str()],
            Self::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    /// Mismatches; empty when the case passed.
    pub failures: Vec<String>,
}

impl CaseResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The registry fixtures are loaded with: core kinds plus the test domain.
#[must_use]
pub fn registry() -> ReasonRegistry {
    register(ReasonRegistryBuilder::new()).build()
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Load the fixture's rule set.
    pub fn load(&self, registry: &ReasonRegistry) -> Result<RuleSet, ConfigError> {
        registry.load_rule_set_value(self.config.clone())
    }

    /// Run all test cases and return results
    ///
    /// # Panics
    ///
    /// Panics if the config fails to load when no error was expected, or loads when one was.
    pub fn run(&self) -> Vec<CaseResult> {
        let loaded = self.load(&registry());
        let rules = match (&self.expect_error, loaded) {
            (None, Ok(rules)) => rules,
            (None, Err(e)) => panic!("Fixture '{}': config failed to load: {e}", self.name),
            (Some(expected), Ok(_)) => {
                panic!("Fixture '{}': expected config error containing {expected:?}", self.name)
            }
            (Some(expected), Err(e)) => {
                let message = e.to_string();
                let failures = if message.contains(expected.as_str()) {
                    Vec::new()
                } else {
                    vec![format!("expected config error containing {expected:?}, got {message:?}")]
                };
                return vec![CaseResult {
                    case_name: "config".to_owned(),
                    failures,
                }];
            }
        };

        self.cases
            .iter()
            .map(|case| CaseResult {
                case_name: case.name.clone(),
                failures: case.check(&rules),
            })
            .collect()
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        for result in self.run() {
            assert!(
                result.passed(),
                "Fixture '{}' case '{}' failed:\n  {}",
                self.name,
                result.case_name,
                result.failures.join("\n  ")
            );
        }
    }
}

impl TestCase {
    fn check(&self, rules: &RuleSet) -> Vec<String> {
        match self.outcome.map_with(rules) {
            Ok(mapped) => self.expect.check(mapped),
            Err(TestError::UnknownKind { kind }) => vec![format!("unknown reason kind {kind:?} in outcome")],
            Err(TestError::Mapping(e)) => vec![format!("outcome could not be built: {e}")],
        }
    }
}

impl Expect {
    fn check(&self, mapped: Result<HttpResponse, MappingError>) -> Vec<String> {
        let response = match (mapped, &self.error) {
            (Ok(response), None) => response,
            (Ok(response), Some(expected)) => {
                return vec![format!(
                    "expected mapping error containing {expected:?}, got status {}",
                    response.status()
                )];
            }
            (Err(e), None) => return vec![format!("mapping failed: {e}")],
            (Err(e), Some(expected)) => {
                let message = e.to_string();
                return if message.contains(expected.as_str()) {
                    Vec::new()
                } else {
                    vec![format!("expected mapping error containing {expected:?}, got {message:?}")]
                };
            }
        };

        let mut failures = Vec::new();
        if let Some(status) = self.status {
            if response.status().as_u16() != status {
                failures.push(format!("status: expected {status}, got {}", response.status().as_u16()));
            }
        }
        for (name, expected) in &self.headers {
            let actual = response.header_values(name);
            if actual != expected.values() {
                failures.push(format!("header {name}: expected {:?}, got {actual:?}", expected.values()));
            }
        }
        for name in &self.absent_headers {
            if let Some(value) = response.header(name) {
                failures.push(format!("header {name}: expected absent, got {value:?}"));
            }
        }
        if let Some(content_type) = &self.content_type {
            if response.content_type() != Some(content_type.as_str()) {
                failures.push(format!(
                    "content type: expected {content_type:?}, got {:?}",
                    response.content_type()
                ));
            }
        }
        if self.no_body && response.body().is_some() {
            failures.push("expected no body".to_owned());
        }
        if let Some(expected) = &self.body {
            match response.body().map(|b| serde_json::from_slice::<Value>(b)) {
                Some(Ok(actual)) if &actual == expected => {}
                Some(Ok(actual)) => failures.push(format!("body: expected {expected}, got {actual}")),
                Some(Err(e)) => failures.push(format!("body is not JSON: {e}")),
                None => failures.push(format!("body: expected {expected}, got none")),
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r"
name: inline
config:
  rules:
    - when: { type: error, kind: conflict }
      headers: [{ name: X-Kind, value: conflict }]
      respond: { status: 409 }
cases:
  - name: conflict
    outcome: { errors: [{ kind: conflict, message: stale }] }
    expect: { status: 409, headers: { x-kind: conflict }, no_body: true }
  - name: wrong expectation
    outcome: { errors: [{ kind: conflict }] }
    expect: { status: 400 }
  - name: unmatched
    outcome: { errors: [{ kind: error }] }
    expect: { error: no rule matched }
";

    #[test]
    fn test_run_reports_each_case() {
        let fixture = Fixture::from_yaml(FIXTURE).unwrap();
        let results = fixture.run();
        assert_eq!(results.len(), 3);
        assert!(results[0].passed(), "{:?}", results[0].failures);
        assert!(!results[1].passed());
        assert_eq!(results[1].failures, vec!["status: expected 400, got 409"]);
        assert!(results[2].passed(), "{:?}", results[2].failures);
    }

    #[test]
    fn test_expected_config_error() {
        let fixture = Fixture::from_yaml(
            r"
name: bad
config: { rules: [{ when: { type: error, kind: gone }, respond: { status: 410 } }] }
expect_error: unknown reason kind
",
        )
        .unwrap();
        let results = fixture.run();
        assert_eq!(results.len(), 1);
        assert!(results[0].passed());
    }

    #[test]
    fn test_multi_document() {
        let fixtures = Fixture::from_yaml_multi("name: a\nconfig: {}\n---\nname: b\nconfig: {}\n").unwrap();
        assert_eq!(fixtures.len(), 2);
        assert_eq!(fixtures[1].name, "b");
    }
}
