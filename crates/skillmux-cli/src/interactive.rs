//! Interactive flow for `mcp setup`.
//!
//! Runs when setup is invoked without `--agent`. Uses dialoguer for terminal UI prompts.

use std::io::{self, Write};

use anyhow::Result;
use console::style;
use dialoguer::{Input, MultiSelect, Password, Select, theme::ColorfulTheme};

use skillmux_core::client::AgentKind;
use skillmux_core::generator::GeneratorRegistry;
use skillmux_core::mcp::{ParameterPrompter, PromptRequest};
use skillmux_core::types::{ConfigMode, Scope};

/// Pre-filled values from CLI args that skip prompts.
#[derive(Debug, Clone, Default)]
pub struct PrefilledOptions {
    /// Configuration scope - if Some, skip scope prompt
    pub scope: Option<Scope>,
    /// Target agents - if Some, skip agent selection
    pub agents: Option<Vec<String>>,
    /// Config mode - if Some, skip mode prompt
    pub mode: Option<ConfigMode>,
}

/// Choices collected by the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupChoices {
    pub scope: Scope,
    pub agents: Vec<String>,
    /// Only asked when a generator-backed agent is selected.
    pub mode: Option<ConfigMode>,
}

/// Interactive flow for collecting setup choices.
pub struct InteractiveFlow<'a, W: Write = io::Stdout> {
    /// Used to tell which agents have a bundled agent-config format
    registry: &'a GeneratorRegistry,
    /// Agents preselected in the agent list
    detected: Vec<AgentKind>,
    prefilled: PrefilledOptions,
    /// Output writer (for testing)
    writer: W,
    theme: ColorfulTheme,
}

impl<'a> InteractiveFlow<'a, io::Stdout> {
    pub fn new(
        registry: &'a GeneratorRegistry,
        detected: Vec<AgentKind>,
        prefilled: PrefilledOptions,
    ) -> Self {
        Self {
            registry,
            detected,
            prefilled,
            writer: io::stdout(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl<'a, W: Write> InteractiveFlow<'a, W> {
    /// Create a new interactive flow with custom writer (for testing).
    #[cfg(test)]
    pub fn with_writer(
        registry: &'a GeneratorRegistry,
        detected: Vec<AgentKind>,
        prefilled: PrefilledOptions,
        writer: W,
    ) -> Self {
        Self {
            registry,
            detected,
            prefilled,
            writer,
            theme: ColorfulTheme::default(),
        }
    }

    /// Flow:
    /// 1. Select scope if not provided
    /// 2. Select agents if not provided (detected agents are preselected)
    /// 3. Select config mode when any selected agent is generator-backed
    pub fn collect(&mut self) -> Result<SetupChoices> {
        self.print_header()?;

        let scope = self.prompt_scope()?;
        let agents = self.prompt_agents()?;
        if agents.is_empty() {
            anyhow::bail!("No agents selected");
        }

        let mode = if agents.iter().any(|agent| self.registry.supports(agent)) {
            Some(self.prompt_mode()?)
        } else {
            None
        };

        let choices = SetupChoices {
            scope,
            agents,
            mode,
        };
        self.print_summary(&choices)?;
        Ok(choices)
    }

    fn print_header(&mut self) -> Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", style("  skillmux MCP Setup").bold().cyan())?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn prompt_scope(&self) -> Result<Scope> {
        if let Some(scope) = self.prefilled.scope {
            return Ok(scope);
        }

        let options = [
            "Local    - This project only",
            "Global   - User-wide, every project",
        ];
        let selection = Select::with_theme(&self.theme)
            .with_prompt("Configuration scope")
            .items(&options)
            .default(0)
            .interact_opt()?
            .ok_or(skillmux_core::Error::Cancelled)?;

        Ok(match selection {
            0 => Scope::Local,
            _ => Scope::Global,
        })
    }

    fn prompt_agents(&self) -> Result<Vec<String>> {
        if let Some(agents) = &self.prefilled.agents {
            return Ok(agents.clone());
        }

        let labels: Vec<String> = AgentKind::ALL
            .iter()
            .map(|kind| {
                if self.registry.supports(kind.id()) {
                    format!("{} (agent config)", kind.display_name())
                } else {
                    kind.display_name().to_string()
                }
            })
            .collect();
        let defaults: Vec<bool> = AgentKind::ALL
            .iter()
            .map(|kind| self.detected.contains(kind))
            .collect();

        let selections = MultiSelect::with_theme(&self.theme)
            .with_prompt("Agents to configure (space to toggle, enter to confirm)")
            .items(&labels)
            .defaults(&defaults)
            .interact_opt()?
            .ok_or(skillmux_core::Error::Cancelled)?;

        Ok(selections
            .iter()
            .map(|&i| AgentKind::ALL[i].id().to_string())
            .collect())
    }

    fn prompt_mode(&self) -> Result<ConfigMode> {
        if let Some(mode) = self.prefilled.mode {
            return Ok(mode);
        }

        let options = [
            "Agent config  - Custom agent bundling servers and usage instructions",
            "MCP JSON      - Plain server registrations only",
        ];
        let selection = Select::with_theme(&self.theme)
            .with_prompt("Config format for agents that support it")
            .items(&options)
            .default(0)
            .interact_opt()?
            .ok_or(skillmux_core::Error::Cancelled)?;

        Ok(match selection {
            0 => ConfigMode::AgentConfig,
            _ => ConfigMode::McpJson,
        })
    }

    fn print_summary(&mut self, choices: &SetupChoices) -> Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", style("  Summary").bold())?;
        writeln!(self.writer, "  ───────────────────────────")?;
        writeln!(self.writer, "  Scope:    {}", style(choices.scope).green())?;
        writeln!(
            self.writer,
            "  Agents:   {}",
            style(choices.agents.join(", ")).green()
        )?;
        if let Some(mode) = choices.mode {
            writeln!(self.writer, "  Mode:     {}", style(mode).green())?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

/// Prompts on the terminal for required parameters that have no default.
#[derive(Default)]
pub struct DialoguerPrompter {
    theme: ColorfulTheme,
}

impl ParameterPrompter for DialoguerPrompter {
    fn prompt(&self, request: &PromptRequest<'_>) -> skillmux_core::Result<String> {
        let spec = request.spec;
        if !spec.description.is_empty() {
            eprintln!("  {}", style(&spec.description).dim());
        }
        if let Some(example) = &spec.example {
            eprintln!("  {} {}", style("e.g.").dim(), style(example).dim());
        }

        let label = format!("{} ({})", request.name, request.server);
        let value = if spec.sensitive {
            Password::with_theme(&self.theme)
                .with_prompt(label)
                .interact()
        } else {
            let input = Input::<String>::with_theme(&self.theme).with_prompt(label);
            // An unset `{{ENV:VAR}}` default is the only way a defaulted value gets here.
            let input = match spec.default.as_deref() {
                Some(default) if !default.starts_with("{{ENV:") => {
                    input.with_initial_text(default)
                }
                _ => input,
            };
            input.interact_text()
        };

        value.map_err(prompt_error)
    }
}

/// Interrupted terminal reads are cancellations; anything else is a prompt failure.
fn prompt_error(err: dialoguer::Error) -> skillmux_core::Error {
    match err {
        dialoguer::Error::IO(source) if source.kind() == io::ErrorKind::Interrupted => {
            skillmux_core::Error::Cancelled
        }
        other => skillmux_core::Error::Prompt(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefilled_options_default() {
        let prefilled = PrefilledOptions::default();

        assert!(prefilled.scope.is_none());
        assert!(prefilled.agents.is_none());
        assert!(prefilled.mode.is_none());
    }

    #[test]
    fn test_prefilled_skips_prompts() {
        let registry = GeneratorRegistry::with_default_generators();
        let prefilled = PrefilledOptions {
            scope: Some(Scope::Global),
            agents: Some(vec!["kiro".to_string(), "cursor".to_string()]),
            mode: Some(ConfigMode::McpJson),
        };

        let mut output = Vec::new();
        let choices = {
            let mut flow =
                InteractiveFlow::with_writer(&registry, Vec::new(), prefilled, &mut output);
            flow.collect().unwrap()
        };

        assert_eq!(choices.scope, Scope::Global);
        assert_eq!(choices.agents, vec!["kiro", "cursor"]);
        assert_eq!(choices.mode, Some(ConfigMode::McpJson));

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("kiro, cursor"));
        assert!(printed.contains("mcp-json"));
    }

    #[test]
    fn test_mode_not_asked_without_generator_agents() {
        let registry = GeneratorRegistry::with_default_generators();
        let prefilled = PrefilledOptions {
            scope: Some(Scope::Local),
            agents: Some(vec!["cursor".to_string(), "claude".to_string()]),
            mode: None,
        };

        let mut output = Vec::new();
        let choices = {
            let mut flow =
                InteractiveFlow::with_writer(&registry, Vec::new(), prefilled, &mut output);
            flow.collect().unwrap()
        };

        assert_eq!(choices.mode, None);
        assert!(!String::from_utf8(output).unwrap().contains("Mode:"));
    }

    #[test]
    fn test_empty_agent_selection_fails() {
        let registry = GeneratorRegistry::with_default_generators();
        let prefilled = PrefilledOptions {
            scope: Some(Scope::Local),
            agents: Some(Vec::new()),
            mode: None,
        };

        let mut output = Vec::new();
        let mut flow = InteractiveFlow::with_writer(&registry, Vec::new(), prefilled, &mut output);

        let err = flow.collect().unwrap_err();
        assert!(err.to_string().contains("No agents selected"));
    }

    #[test]
    fn test_interrupted_prompt_maps_to_cancelled() {
        let err = prompt_error(dialoguer::Error::IO(io::Error::new(
            io::ErrorKind::Interrupted,
            "ctrl-c",
        )));
        assert!(err.is_cancelled());

        let err = prompt_error(dialoguer::Error::IO(io::Error::other("tty gone")));
        assert!(!err.is_cancelled());
        assert!(err.to_string().contains("tty gone"));
    }
}
