//! skillmux - wire skill MCP dependencies into coding agents
//!
//! Usage:
//!   skillmux mcp setup                     # Interactive setup wizard
//!   skillmux mcp setup --agent cursor,kiro # Non-interactive setup
//!   skillmux mcp deps --with-mcp           # Add servers missing for installed skills
//!   skillmux agents                        # List supported agents

mod interactive;

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use skillmux_core::client::{AgentKind, detect_agents};
use skillmux_core::config::{AgentConfigStore, Settings};
use skillmux_core::context::HostContext;
use skillmux_core::generator::GeneratorRegistry;
use skillmux_core::mcp::{
    McpDependencyCheckResult, McpDependencyInfo, NoPrompt, ParameterPrompter, ServerLookup,
    check_dependencies, collect_dependencies, derive_allowed_tools,
};
use skillmux_core::orchestration::{
    Configurator, InstalledServers, Route, SetupReport, SetupRequest,
};
use skillmux_core::skills::{DirectorySkillSource, Skill, SkillSource};
use skillmux_core::types::{ConfigMode, Scope};

use crate::interactive::{DialoguerPrompter, InteractiveFlow, PrefilledOptions};

/// Conventional exit status for a run interrupted by the user.
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser)]
#[command(name = "skillmux")]
#[command(about = "Wire skill MCP dependencies into coding agents", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage MCP server registrations
    Mcp(McpArgs),

    /// List supported agents and whether they are detected
    Agents {
        /// Show user-wide config paths
        #[arg(short = 'g', long)]
        global: bool,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
    /// Only show issues (non-zero exit if problems)
    Quiet,
}

#[derive(Args)]
struct McpArgs {
    #[command(subcommand)]
    command: McpSubcommand,
}

#[derive(Subcommand)]
enum McpSubcommand {
    /// Register the skillmux server and skill dependencies with agents
    ///
    /// Without --agent, runs an interactive wizard when attached to a terminal.
    Setup(SetupArgs),

    /// Check which skill MCP dependencies each agent is missing
    Deps(DepsArgs),
}

#[derive(Args)]
struct TargetArgs {
    /// Agents to configure; '*' expands to every detected agent
    #[arg(short, long = "agent", value_name = "AGENT", value_delimiter = ',')]
    agents: Vec<String>,

    /// Use user-wide config files instead of the project's
    #[arg(short = 'g', long)]
    global: bool,

    /// Write bundled agent configs for agents that support them
    #[arg(long, conflicts_with = "mcp_json")]
    agent_config: bool,

    /// Write plain MCP server registrations for every agent
    #[arg(long)]
    mcp_json: bool,

    /// Never prompt; required parameters must resolve from defaults
    #[arg(short = 'y', long)]
    yes: bool,
}

impl TargetArgs {
    fn mode(&self) -> Option<ConfigMode> {
        if self.agent_config {
            Some(ConfigMode::AgentConfig)
        } else if self.mcp_json {
            Some(ConfigMode::McpJson)
        } else {
            None
        }
    }

    fn scope(&self, settings: &Settings) -> Scope {
        if self.global {
            Scope::Global
        } else {
            settings.defaults.scope
        }
    }
}

#[derive(Args)]
struct SetupArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Output format
    #[arg(short, long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Args)]
struct DepsArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Configure missing servers instead of only reporting them
    #[arg(long)]
    with_mcp: bool,

    /// Output format
    #[arg(short, long, default_value = "table")]
    format: OutputFormat,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run_cli(cli.command) {
        Ok(code) => code,
        Err(err) if is_cancelled(&err) => {
            eprintln!("{}", style("Setup cancelled.").yellow());
            ExitCode::from(EXIT_CANCELLED)
        }
        Err(err) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "skillmux=debug,info"
    } else {
        "skillmux=info,warn"
    };
    let filter = EnvFilter::try_from_env("SKILLMUX_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .init();
}

fn is_cancelled(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<skillmux_core::Error>()
            .is_some_and(skillmux_core::Error::is_cancelled)
    })
}

fn run_cli(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Mcp(args) => match args.command {
            McpSubcommand::Setup(args) => run_setup(args),
            McpSubcommand::Deps(args) => run_deps(args),
        },
        Commands::Agents { global, format } => run_agents(global, format),
    }
}

// =============================================================================
// mcp setup
// =============================================================================

fn run_setup(args: SetupArgs) -> Result<ExitCode> {
    let ctx = HostContext::from_process()?;
    let settings = Settings::load_for(&ctx)?;
    let registry = GeneratorRegistry::with_default_generators();
    let detected = detect_agents(&ctx);
    let target = &args.target;

    let interactive = target.agents.is_empty() && !target.yes && io::stdin().is_terminal();
    let (scope, agents, mode) = if interactive {
        let prefilled = PrefilledOptions {
            scope: target.global.then_some(Scope::Global),
            agents: None,
            mode: target.mode(),
        };
        let choices = InteractiveFlow::new(&registry, detected, prefilled).collect()?;
        (choices.scope, choices.agents, choices.mode)
    } else {
        let agents = expand_agents(&target.agents, &settings.defaults.agents, &detected);
        let mode = target.mode().or(settings.defaults.config_mode);
        (target.scope(&settings), agents, mode)
    };
    if agents.is_empty() {
        anyhow::bail!(
            "No agents to configure. Pass --agent <id> or set defaults.agents in skillmux.toml"
        );
    }

    let skills = load_skills(&settings, &ctx, scope)?;
    let dependencies = collect_dependencies(&skills);
    let allowed_tools = derive_allowed_tools(&skills, &dependencies);

    let dialoguer = DialoguerPrompter::default();
    let prompter = select_prompter(target.yes, &dialoguer);
    let configurator = Configurator::new(&ctx, scope, &registry, &settings.bridge, prompter);
    let report = configurator.setup(SetupRequest {
        agents: &agents,
        mode,
        dependencies: &dependencies,
        allowed_tools: Some(&allowed_tools),
    })?;

    match args.format {
        OutputFormat::Table => print_setup_table(&report),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&setup_json(&report))?);
        }
        OutputFormat::Quiet => print_failures(&report),
    }

    Ok(report_exit_code(&report))
}

// =============================================================================
// mcp deps
// =============================================================================

fn run_deps(args: DepsArgs) -> Result<ExitCode> {
    let ctx = HostContext::from_process()?;
    let settings = Settings::load_for(&ctx)?;
    let target = &args.target;
    let scope = target.scope(&settings);

    let agents = expand_agents(&target.agents, &settings.defaults.agents, &detect_agents(&ctx));
    if agents.is_empty() {
        anyhow::bail!("No agents to check. Pass --agent <id> or set defaults.agents");
    }

    let skills = load_skills(&settings, &ctx, scope)?;
    let dependencies = collect_dependencies(&skills);

    let store = AgentConfigStore::new(ctx.clone(), scope);
    let registry = GeneratorRegistry::with_default_generators();
    let checks = check_agents(
        &agents,
        &dependencies,
        &InstalledServers::new(&store, &registry),
    );
    let incomplete = incomplete_agents(&checks);
    let check_failed = checks.iter().any(|(_, result)| result.is_err());

    if incomplete.is_empty() || !args.with_mcp {
        match args.format {
            OutputFormat::Table => {
                print_checks_table(&checks);
                if !incomplete.is_empty() {
                    println!();
                    println!("Run `skillmux mcp deps --with-mcp` to configure the missing servers.");
                }
            }
            OutputFormat::Json => {
                let output = serde_json::json!({ "agents": checks_json(&checks) });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Quiet => print_missing(&checks),
        }
        return Ok(if incomplete.is_empty() && !check_failed {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let allowed_tools = derive_allowed_tools(&skills, &dependencies);
    let dialoguer = DialoguerPrompter::default();
    let prompter = select_prompter(target.yes, &dialoguer);
    let configurator = Configurator::new(&ctx, scope, &registry, &settings.bridge, prompter);
    let report = configurator.configure_dependencies(SetupRequest {
        agents: &incomplete,
        mode: target.mode().or(settings.defaults.config_mode),
        dependencies: &dependencies,
        allowed_tools: Some(&allowed_tools),
    })?;

    match args.format {
        OutputFormat::Table => {
            print_checks_table(&checks);
            println!();
            print_setup_table(&report);
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "agents": checks_json(&checks),
                "setup": setup_json(&report),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Quiet => {
            print_check_errors(&checks);
            print_failures(&report);
        }
    }

    if check_failed && report.configured.is_empty() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(report_exit_code(&report))
}

/// Dependency check outcome for one agent.
type AgentCheck = (String, skillmux_core::Result<McpDependencyCheckResult>);

/// Check every agent, recording a failed lookup against that agent only.
fn check_agents(
    agents: &[String],
    dependencies: &[McpDependencyInfo],
    lookup: &dyn ServerLookup,
) -> Vec<AgentCheck> {
    agents
        .iter()
        .map(|agent| {
            let result = check_dependencies(agent, dependencies, lookup);
            if let Err(err) = &result {
                warn!("Failed to check {}: {}", agent, err);
            }
            (agent.clone(), result)
        })
        .collect()
}

/// Agents whose check succeeded and found missing servers.
fn incomplete_agents(checks: &[AgentCheck]) -> Vec<String> {
    checks
        .iter()
        .filter(|(_, result)| matches!(result, Ok(check) if !check.all_configured))
        .map(|(agent, _)| agent.clone())
        .collect()
}

// =============================================================================
// agents
// =============================================================================

fn run_agents(global: bool, format: OutputFormat) -> Result<ExitCode> {
    let ctx = HostContext::from_process()?;
    let registry = GeneratorRegistry::with_default_generators();
    let scope = if global { Scope::Global } else { Scope::Local };

    match format {
        OutputFormat::Table => {
            println!(
                "{:<16} {:<18} {:<11} {:<10} {:<9} Config",
                "Agent", "Aliases", "Key", "Generator", "Detected"
            );
            println!("{}", "-".repeat(90));
            for kind in AgentKind::ALL {
                let aliases = if kind.aliases().is_empty() {
                    "-".to_string()
                } else {
                    kind.aliases().join(", ")
                };
                let path = kind
                    .config_path(scope, &ctx)
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|_| "-".to_string());
                println!(
                    "{:<16} {:<18} {:<11} {:<10} {:<9} {}",
                    kind.id(),
                    aliases,
                    kind.schema().key(),
                    yes_no(registry.supports(kind.id())),
                    yes_no(kind.is_detected(&ctx)),
                    path
                );
            }
        }
        OutputFormat::Json => {
            let output: Vec<_> = AgentKind::ALL
                .iter()
                .map(|kind| {
                    serde_json::json!({
                        "id": kind.id(),
                        "name": kind.display_name(),
                        "aliases": kind.aliases(),
                        "key": kind.schema().key(),
                        "generator": registry.supports(kind.id()),
                        "detected": kind.is_detected(&ctx),
                        "config_path": kind.config_path(scope, &ctx).ok(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Quiet => {
            for kind in detect_agents(&ctx) {
                println!("{}", kind.id());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

// =============================================================================
// Output
// =============================================================================

fn print_setup_table(report: &SetupReport) {
    if report.is_empty() {
        println!("Nothing to configure.");
        return;
    }

    for outcome in &report.configured {
        let route = match outcome.route {
            Route::Generator => "agent config",
            Route::RawConfig => "mcp config",
        };
        println!("✓ {} ({})", outcome.agent, route);
        for server in &outcome.added {
            println!("  + {}", server);
        }
        for server in &outcome.skipped {
            println!("  • {} already configured", server);
        }
        for path in &outcome.written_files {
            println!("    {}", style(path.display()).dim());
        }
    }
    print_failures(report);

    let attempted = report.configured.len() + report.failed.len();
    println!();
    println!(
        "Configured {} of {} agent(s)",
        report.configured.len(),
        attempted
    );
}

fn print_failures(report: &SetupReport) {
    for failure in &report.failed {
        println!("✗ {}: {}", failure.agent, failure.error);
    }
}

fn print_checks_table(checks: &[AgentCheck]) {
    for (agent, result) in checks {
        let result = match result {
            Ok(result) => result,
            Err(err) => {
                println!("✗ {}: check failed: {}", agent, err);
                continue;
            }
        };
        if result.all_configured {
            println!("✓ {}: all MCP dependencies configured", agent);
            continue;
        }
        println!("✗ {}: {} missing", agent, result.missing.len());
        for dep in &result.missing {
            println!("  - {} (needed by: {})", dep.server_name, dep.needed_by.join(", "));
        }
    }
}

fn print_missing(checks: &[AgentCheck]) {
    for (agent, result) in checks {
        if let Ok(result) = result {
            for dep in &result.missing {
                println!("{}: {}", agent, dep.server_name);
            }
        }
    }
    print_check_errors(checks);
}

fn print_check_errors(checks: &[AgentCheck]) {
    for (agent, result) in checks {
        if let Err(err) = result {
            eprintln!("{}: {}", agent, err);
        }
    }
}

fn setup_json(report: &SetupReport) -> serde_json::Value {
    let configured: Vec<_> = report
        .configured
        .iter()
        .map(|outcome| {
            serde_json::json!({
                "agent": outcome.agent,
                "route": match outcome.route {
                    Route::Generator => "agent-config",
                    Route::RawConfig => "mcp-json",
                },
                "added": outcome.added,
                "skipped": outcome.skipped,
                "files": outcome.written_files,
            })
        })
        .collect();
    let failed: Vec<_> = report
        .failed
        .iter()
        .map(|failure| {
            serde_json::json!({
                "agent": failure.agent,
                "error": failure.error.to_string(),
            })
        })
        .collect();
    serde_json::json!({ "configured": configured, "failed": failed })
}

fn checks_json(checks: &[AgentCheck]) -> serde_json::Value {
    let agents: Vec<_> = checks
        .iter()
        .map(|(agent, result)| match result {
            Ok(result) => serde_json::json!({
                "agent": agent,
                "all_configured": result.all_configured,
                "configured": result.configured,
                "missing": result.missing.iter().map(missing_json).collect::<Vec<_>>(),
            }),
            Err(err) => serde_json::json!({
                "agent": agent,
                "error": err.to_string(),
            }),
        })
        .collect();
    serde_json::Value::Array(agents)
}

fn missing_json(dep: &McpDependencyInfo) -> serde_json::Value {
    serde_json::json!({
        "server": dep.server_name,
        "needed_by": dep.needed_by,
    })
}

// =============================================================================
// Helpers
// =============================================================================

/// Expand `*` to the detected agents and canonicalize aliases, keeping first occurrences.
///
/// With no agents requested the configured defaults apply, then every detected agent.
fn expand_agents(requested: &[String], defaults: &[String], detected: &[AgentKind]) -> Vec<String> {
    let requested = if requested.is_empty() {
        defaults
    } else {
        requested
    };

    let mut expanded: Vec<String> = Vec::new();
    let mut push = |agent: String| {
        if !expanded.contains(&agent) {
            expanded.push(agent);
        }
    };

    if requested.is_empty() {
        detected.iter().for_each(|kind| push(kind.id().to_string()));
    }
    for agent in requested {
        let agent = agent.trim();
        if agent == "*" {
            detected.iter().for_each(|kind| push(kind.id().to_string()));
        } else if !agent.is_empty() {
            let canonical = AgentKind::parse(agent).map(AgentKind::id).unwrap_or(agent);
            push(canonical.to_string());
        }
    }
    expanded
}

fn load_skills(settings: &Settings, ctx: &HostContext, scope: Scope) -> Result<Vec<Skill>> {
    let source = DirectorySkillSource::new(settings.skill_dirs(ctx, scope));
    Ok(source.load()?)
}

/// Prompt only when a terminal is attached and `--yes` was not given.
fn select_prompter(yes: bool, dialoguer: &DialoguerPrompter) -> &dyn ParameterPrompter {
    if yes || !io::stdin().is_terminal() {
        &NoPrompt
    } else {
        dialoguer
    }
}

fn report_exit_code(report: &SetupReport) -> ExitCode {
    if report.is_total_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
