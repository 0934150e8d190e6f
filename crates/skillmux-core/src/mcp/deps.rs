//! MCP server dependencies declared by installed skills.
//!
//! Collection deduplicates by server name (first declared spec wins) and checking is
//! presence-only: a server already registered under the same key counts as configured
//! regardless of its contents.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::Result;
use crate::skills::Skill;

use super::spec::{McpServerSpec, WILDCARD_TOOL};

/// One required server aggregated across skills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct McpDependencyInfo {
    pub server_name: String,
    /// Skill names in first-seen order, without duplicates.
    pub needed_by: Vec<String>,
    pub spec: McpServerSpec,
}

/// Partition of dependencies into configured and missing for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct McpDependencyCheckResult {
    pub all_configured: bool,
    pub missing: Vec<McpDependencyInfo>,
    pub configured: Vec<String>,
}

/// Presence lookup of server keys in an agent's configuration.
pub trait ServerLookup {
    fn has_server(&self, agent: &str, server: &str) -> Result<bool>;
}

/// Union of servers required by `skills`, in first-seen order.
pub fn collect_dependencies(skills: &[Skill]) -> Vec<McpDependencyInfo> {
    let mut deps: Vec<McpDependencyInfo> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for skill in skills {
        let skill_name = skill.name();
        for server in &skill.metadata.requires_mcp_servers {
            match index.get(&server.name) {
                Some(&pos) => {
                    let dep = &mut deps[pos];
                    if !dep.needed_by.iter().any(|name| name == skill_name) {
                        dep.needed_by.push(skill_name.to_string());
                    }
                }
                None => {
                    index.insert(server.name.clone(), deps.len());
                    deps.push(McpDependencyInfo {
                        server_name: server.name.clone(),
                        needed_by: vec![skill_name.to_string()],
                        spec: server.clone(),
                    });
                }
            }
        }
    }

    deps
}

/// Which of `dependencies` are already registered for `agent`.
pub fn check_dependencies(
    agent: &str,
    dependencies: &[McpDependencyInfo],
    lookup: &dyn ServerLookup,
) -> Result<McpDependencyCheckResult> {
    let mut missing = Vec::new();
    let mut configured = Vec::new();

    for dep in dependencies {
        if lookup.has_server(agent, &dep.server_name)? {
            configured.push(dep.server_name.clone());
        } else {
            missing.push(dep.clone());
        }
    }

    Ok(McpDependencyCheckResult {
        all_configured: missing.is_empty(),
        missing,
        configured,
    })
}

/// Tool restriction for one server after combining every dependent skill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerTools {
    All,
    Only(Vec<String>),
}

impl ServerTools {
    /// Tool list as carried in bundle configs; `All` becomes the wildcard entry.
    pub fn to_tool_list(&self) -> Vec<String> {
        match self {
            Self::All => vec![WILDCARD_TOOL.to_string()],
            Self::Only(tools) => tools.clone(),
        }
    }
}

/// Per-server allow-list derived from the `@server/tool` entries of dependent skills.
///
/// A skill without `allowed-tools`, or without any entry scoped to the server, grants
/// every tool, and one such skill makes the whole server unrestricted.
pub fn derive_allowed_tools(
    skills: &[Skill],
    dependencies: &[McpDependencyInfo],
) -> BTreeMap<String, ServerTools> {
    let by_name: HashMap<&str, &Skill> = skills.iter().map(|s| (s.name(), s)).collect();
    let mut result = BTreeMap::new();

    for dep in dependencies {
        let mut named: Vec<String> = Vec::new();
        let mut wildcard = false;

        for skill_name in &dep.needed_by {
            let scoped = by_name
                .get(skill_name.as_str())
                .and_then(|skill| skill.metadata.allowed_tools.as_deref())
                .map(|tools| scoped_tools(tools, &dep.server_name))
                .unwrap_or_default();

            if scoped.is_empty() || scoped.iter().any(|tool| tool == WILDCARD_TOOL) {
                wildcard = true;
                break;
            }
            for tool in scoped {
                if !named.contains(&tool) {
                    named.push(tool);
                }
            }
        }

        let tools = if wildcard {
            ServerTools::All
        } else {
            ServerTools::Only(named)
        };
        result.insert(dep.server_name.clone(), tools);
    }

    result
}

/// Tool names from `@server/tool` entries that target `server`.
fn scoped_tools(allowed: &[String], server: &str) -> Vec<String> {
    allowed
        .iter()
        .filter_map(|entry| entry.strip_prefix('@'))
        .filter_map(|entry| entry.split_once('/'))
        .filter(|(name, tool)| *name == server && !tool.is_empty())
        .map(|(_, tool)| tool.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::skills::SkillMetadata;

    fn skill(name: &str, servers: &[McpServerSpec]) -> Skill {
        let mut meta = SkillMetadata::new(name);
        for server in servers {
            meta = meta.requires(server.clone());
        }
        Skill::new(meta)
    }

    struct Configured(HashSet<&'static str>);

    impl ServerLookup for Configured {
        fn has_server(&self, _agent: &str, server: &str) -> Result<bool> {
            Ok(self.0.contains(server))
        }
    }

    #[test]
    fn test_collect_merges_needed_by_in_first_seen_order() {
        let fs = McpServerSpec::new("fs", "npx");
        let gh = McpServerSpec::new("gh", "npx");
        let skills = vec![skill("A", &[fs.clone()]), skill("B", &[fs, gh])];

        let deps = collect_dependencies(&skills);

        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].server_name, "fs");
        assert_eq!(deps[0].needed_by, vec!["A", "B"]);
        assert_eq!(deps[1].server_name, "gh");
        assert_eq!(deps[1].needed_by, vec!["B"]);
    }

    #[test]
    fn test_collect_keeps_first_spec() {
        let first = McpServerSpec::new("fs", "npx").with_args(["first"]);
        let second = McpServerSpec::new("fs", "uvx").with_args(["second"]);
        let skills = vec![skill("A", &[first.clone()]), skill("B", &[second])];

        let deps = collect_dependencies(&skills);

        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].spec, first);
    }

    #[test]
    fn test_collect_does_not_duplicate_skill_name() {
        let fs = McpServerSpec::new("fs", "npx");
        let skills = vec![skill("A", &[fs.clone(), fs])];

        let deps = collect_dependencies(&skills);

        assert_eq!(deps[0].needed_by, vec!["A"]);
    }

    #[test]
    fn test_check_partitions_by_presence() {
        let skills = vec![skill(
            "B",
            &[McpServerSpec::new("fs", "npx"), McpServerSpec::new("gh", "npx")],
        )];
        let deps = collect_dependencies(&skills);
        let lookup = Configured(HashSet::from(["fs"]));

        let result = check_dependencies("claude", &deps, &lookup).unwrap();

        assert!(!result.all_configured);
        assert_eq!(result.configured, vec!["fs"]);
        assert_eq!(result.missing.len(), 1);
        assert_eq!(result.missing[0].server_name, "gh");
    }

    #[test]
    fn test_check_empty_is_all_configured() {
        let lookup = Configured(HashSet::new());
        let result = check_dependencies("claude", &[], &lookup).unwrap();
        assert!(result.all_configured);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_derive_allowed_tools_named() {
        let gh = McpServerSpec::new("github", "npx");
        let a = Skill::new(
            SkillMetadata::new("A")
                .requires(gh.clone())
                .allowed_tools(["@github/create_issue", "Read"]),
        );
        let b = Skill::new(
            SkillMetadata::new("B")
                .requires(gh)
                .allowed_tools(["@github/list_issues", "@github/create_issue"]),
        );
        let skills = vec![a, b];
        let deps = collect_dependencies(&skills);

        let tools = derive_allowed_tools(&skills, &deps);

        assert_eq!(
            tools["github"],
            ServerTools::Only(vec!["create_issue".to_string(), "list_issues".to_string()])
        );
    }

    #[test]
    fn test_derive_allowed_tools_unrestricted_skill_forces_wildcard() {
        let gh = McpServerSpec::new("github", "npx");
        let a = Skill::new(
            SkillMetadata::new("A")
                .requires(gh.clone())
                .allowed_tools(["@github/create_issue"]),
        );
        let b = Skill::new(SkillMetadata::new("B").requires(gh));
        let skills = vec![a, b];
        let deps = collect_dependencies(&skills);

        let tools = derive_allowed_tools(&skills, &deps);

        assert_eq!(tools["github"], ServerTools::All);
    }

    #[test]
    fn test_derive_allowed_tools_unscoped_restriction_is_wildcard() {
        let fs = McpServerSpec::new("fs", "npx");
        let a = Skill::new(
            SkillMetadata::new("A")
                .requires(fs)
                .allowed_tools(["@github/create_issue"]),
        );
        let skills = vec![a];
        let deps = collect_dependencies(&skills);

        let tools = derive_allowed_tools(&skills, &deps);

        assert_eq!(tools["fs"], ServerTools::All);
        assert_eq!(tools["fs"].to_tool_list(), vec!["*"]);
    }
}
