use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    // Matches `{{ env.VAR }}` and `{{ env.VAR | default("fallback") }}`
    Regex::new(r#"\{\{\s*env\.([A-Za-z0-9_]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#)
        .expect("placeholder pattern is valid")
});

/// Expand `{{ env.VAR }}` placeholders in a raw TOML string
///
/// An unset variable is an error unless the placeholder carries a
/// `| default("fallback")` clause. TOML comment lines are passed through
/// unchanged so commented-out examples do not have to resolve.
pub fn expand_env(input: &str) -> Result<String, String> {
    let mut missing: Vec<String> = Vec::new();

    let lines: Vec<String> = input
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                return line.to_string();
            }
            PLACEHOLDER
                .replace_all(line, |caps: &Captures<'_>| {
                    let name = &caps[1];
                    std::env::var(name).unwrap_or_else(|_| {
                        caps.get(2).map_or_else(
                            || {
                                missing.push(name.to_string());
                                String::new()
                            },
                            |default| default.as_str().to_string(),
                        )
                    })
                })
                .into_owned()
        })
        .collect();

    if let Some(name) = missing.first() {
        return Err(format!("environment variable not found: `{name}`"));
    }

    let mut output = lines.join("\n");
    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}
