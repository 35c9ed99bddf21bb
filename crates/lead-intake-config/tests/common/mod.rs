// crates/lead-intake-config/tests/common/mod.rs
// ============================================================================
// Module: Config Test Fixtures
// Description: Environment maps and TOML snippets shared by config tests.
// ============================================================================

#![allow(dead_code, reason = "Each test binary uses a different subset of fixtures.")]

use std::collections::BTreeMap;

/// Environment with every remote credential the HTTP backends need.
pub fn credential_env() -> BTreeMap<String, String> {
    [
        ("TEXTMAGIC_API_KEY", "tm-key"),
        ("TEXTMAGIC_USERNAME", "tm-user"),
        ("AIRTABLE_API_KEY", "at-key"),
        ("AIRTABLE_BASE_ID", "appBase"),
        ("AIRTABLE_PARTIAL_TABLE", "Partial Signups"),
        ("AIRTABLE_R2E_TABLE", "Registered"),
        ("SHORTIO_API_KEY", "sh-key"),
        ("SHORTIO_DOMAIN", "go.example.test"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

/// Turns a map into an environment lookup closure.
pub fn lookup(env: BTreeMap<String, String>) -> impl Fn(&str) -> Option<String> {
    move |key| env.get(key).cloned()
}

/// Returns an error message or panics when the result is `Ok`.
pub fn error_message<T>(result: Result<T, lead_intake_config::ConfigError>) -> String {
    match result {
        Ok(_) => panic!("expected config error"),
        Err(err) => err.to_string(),
    }
}
