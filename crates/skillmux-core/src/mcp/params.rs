//! Parameter resolution and `{{NAME}}` placeholder substitution.
//!
//! Resolution order per declared parameter:
//! 1. `default` of the form `{{ENV:VAR}}` reads `VAR` (unset counts as no default)
//! 2. a literal `default` is used as-is
//! 3. optional parameters without a default are omitted, leaving the placeholder
//! 4. required parameters without a default are prompted for

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use crate::env::Environment;
use crate::error::{Error, Result};

use super::spec::{McpServerEntry, McpServerSpec, ParameterSpec};

/// `{{NAME}}` placeholder inside a template string.
static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([A-Za-z_][A-Za-z0-9_]*)\}\}").expect("Invalid regex pattern")
});

/// Whole-string `{{ENV:VAR}}` default.
static ENV_DEFAULT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{\{ENV:([A-Za-z_][A-Za-z0-9_]*)\}\}$").expect("Invalid regex pattern")
});

/// A single value the user must supply.
#[derive(Debug, Clone, Copy)]
pub struct PromptRequest<'a> {
    pub server: &'a str,
    pub name: &'a str,
    pub spec: &'a ParameterSpec,
}

/// Asks the user for a required parameter value.
///
/// Implementations return [`Error::Cancelled`] when the user interrupts the prompt.
pub trait ParameterPrompter: Send + Sync {
    fn prompt(&self, request: &PromptRequest<'_>) -> Result<String>;
}

/// Prompter for non-interactive runs: every prompt is a missing-parameter error.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl ParameterPrompter for NoPrompt {
    fn prompt(&self, request: &PromptRequest<'_>) -> Result<String> {
        Err(Error::MissingParameter {
            server: request.server.to_string(),
            parameter: request.name.to_string(),
        })
    }
}

/// Resolve a value for every declared parameter of `spec`.
///
/// Optional parameters with no default are absent from the returned map.
pub fn resolve_parameters(
    spec: &McpServerSpec,
    env: &dyn Environment,
    prompter: &dyn ParameterPrompter,
) -> Result<BTreeMap<String, String>> {
    let mut values = BTreeMap::new();

    for (name, param) in &spec.parameters {
        if let Some(value) = resolve_default(param.default.as_deref(), env) {
            values.insert(name.clone(), value);
            continue;
        }
        if !param.required {
            debug!(server = %spec.name, parameter = %name, "optional parameter left unresolved");
            continue;
        }
        let value = prompter.prompt(&PromptRequest {
            server: &spec.name,
            name,
            spec: param,
        })?;
        values.insert(name.clone(), value);
    }

    Ok(values)
}

/// Literal default, or the environment value an `{{ENV:VAR}}` default points at.
fn resolve_default(default: Option<&str>, env: &dyn Environment) -> Option<String> {
    let default = default?;
    match ENV_DEFAULT_REGEX.captures(default) {
        Some(caps) => env.var(&caps[1]),
        None => Some(default.to_string()),
    }
}

/// Render `spec` into an entry, replacing `{{KEY}}` tokens with `params` values.
///
/// Tokens without a value are kept verbatim.
pub fn apply_params(spec: &McpServerSpec, params: &BTreeMap<String, String>) -> McpServerEntry {
    McpServerEntry {
        command: substitute(&spec.command, params),
        args: spec
            .args
            .iter()
            .map(|arg| substitute(arg, params))
            .collect(),
        env: spec
            .env
            .iter()
            .map(|(key, value)| (key.clone(), substitute(value, params)))
            .collect(),
        cwd: spec.cwd.as_deref().map(|cwd| substitute(cwd, params)),
    }
}

/// Single-pass replacement, so substituted values are never re-scanned.
pub fn substitute(template: &str, params: &BTreeMap<String, String>) -> String {
    PLACEHOLDER_REGEX
        .replace_all(template, |caps: &Captures<'_>| match params.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::env::MapEnv;

    struct FixedPrompter {
        value: &'static str,
        calls: AtomicUsize,
    }

    impl FixedPrompter {
        fn new(value: &'static str) -> Self {
            Self {
                value,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ParameterPrompter for FixedPrompter {
        fn prompt(&self, _request: &PromptRequest<'_>) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.value.to_string())
        }
    }

    struct CancellingPrompter;

    impl ParameterPrompter for CancellingPrompter {
        fn prompt(&self, _request: &PromptRequest<'_>) -> Result<String> {
            Err(Error::Cancelled)
        }
    }

    fn github_spec() -> McpServerSpec {
        McpServerSpec::new("github", "npx")
            .with_args(["-y", "server-github", "--org={{ORG}}"])
            .with_env("GITHUB_TOKEN", "{{TOKEN}}")
    }

    #[test]
    fn test_env_default_resolves_without_prompt() {
        let spec = github_spec().with_parameter(
            "TOKEN",
            ParameterSpec::required("token").with_default("{{ENV:GH_TOKEN}}"),
        );
        let env = MapEnv::new().with("GH_TOKEN", "secret");
        let prompter = FixedPrompter::new("typed");

        let params = resolve_parameters(&spec, &env, &prompter).unwrap();

        assert_eq!(params["TOKEN"], "secret");
        assert_eq!(prompter.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unset_env_default_falls_through_to_prompt() {
        let spec = github_spec().with_parameter(
            "TOKEN",
            ParameterSpec::required("token").with_default("{{ENV:GH_TOKEN}}"),
        );
        let prompter = FixedPrompter::new("typed");

        let params = resolve_parameters(&spec, &MapEnv::new(), &prompter).unwrap();

        assert_eq!(params["TOKEN"], "typed");
        assert_eq!(prompter.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_literal_default_used() {
        let spec = github_spec().with_parameter(
            "ORG",
            ParameterSpec::required("org").with_default("acme"),
        );
        let params = resolve_parameters(&spec, &MapEnv::new(), &NoPrompt).unwrap();
        assert_eq!(params["ORG"], "acme");
    }

    #[test]
    fn test_optional_without_default_is_omitted() {
        let spec = github_spec().with_parameter("ORG", ParameterSpec::optional("org"));
        let prompter = FixedPrompter::new("typed");

        let params = resolve_parameters(&spec, &MapEnv::new(), &prompter).unwrap();

        assert!(params.is_empty());
        assert_eq!(prompter.calls.load(Ordering::SeqCst), 0);
        let entry = apply_params(&spec, &params);
        assert_eq!(entry.args[2], "--org={{ORG}}");
    }

    #[test]
    fn test_no_prompt_reports_missing_parameter() {
        let spec = github_spec().with_parameter("TOKEN", ParameterSpec::required("token"));
        let err = resolve_parameters(&spec, &MapEnv::new(), &NoPrompt).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingParameter { ref server, ref parameter }
                if server == "github" && parameter == "TOKEN"
        ));
    }

    #[test]
    fn test_cancellation_propagates() {
        let spec = github_spec().with_parameter("TOKEN", ParameterSpec::required("token"));
        let err = resolve_parameters(&spec, &MapEnv::new(), &CancellingPrompter).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_apply_params_substitutes_command_args_and_env() {
        let spec = github_spec();
        let params = BTreeMap::from([
            ("ORG".to_string(), "acme".to_string()),
            ("TOKEN".to_string(), "t0k".to_string()),
        ]);

        let entry = apply_params(&spec, &params);

        assert_eq!(entry.command, "npx");
        assert_eq!(entry.args, vec!["-y", "server-github", "--org=acme"]);
        assert_eq!(entry.env["GITHUB_TOKEN"], "t0k");
    }

    #[test]
    fn test_apply_params_is_idempotent() {
        let spec = github_spec();
        let params = BTreeMap::from([("ORG".to_string(), "acme".to_string())]);

        let once = apply_params(&spec, &params);
        let as_spec = McpServerSpec {
            command: once.command.clone(),
            args: once.args.clone(),
            env: once.env.clone(),
            ..spec.clone()
        };
        let twice = apply_params(&as_spec, &params);

        assert_eq!(once, twice);
        assert_eq!(twice.env["GITHUB_TOKEN"], "{{TOKEN}}");
    }

    #[test]
    fn test_substitute_does_not_rescan_values() {
        let params = BTreeMap::from([
            ("A".to_string(), "{{B}}".to_string()),
            ("B".to_string(), "b".to_string()),
        ]);
        assert_eq!(substitute("x={{A}}", &params), "x={{B}}");
    }

    #[test]
    fn test_env_sentinel_is_not_a_placeholder() {
        let params = BTreeMap::from([("ENV".to_string(), "nope".to_string())]);
        assert_eq!(substitute("{{ENV:HOME}}", &params), "{{ENV:HOME}}");
    }
}
