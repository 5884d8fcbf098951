//! Agent-kind selection priority (spec §4.E "Factory & router"): explicit
//! queue-message hint, then forge-issue `engine:<kind>[:<provider>]` labels,
//! then system defaults. Pure function: no I/O, so the priority law in
//! spec §8 ("the result depends only on the leftmost-present input") is
//! directly testable.

use warden_types::AgentConfig;

/// One resolved selection, before the registry turns it into a `Strategy`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentSelection {
    pub kind: String,
    pub provider: Option<String>,
}

/// System defaults, the lowest-priority input (spec §4.E).
#[derive(Clone, Debug)]
pub struct SystemDefaults {
    pub agent_kind: String,
    pub provider: Option<String>,
}

/// Parses a forge-issue label of the form `engine:<kind>` or
/// `engine:<kind>:<provider>`. Returns `None` for labels that don't match.
pub fn parse_engine_label(label: &str) -> Option<AgentSelection> {
    let rest = label.strip_prefix("engine:")?;
    let mut parts = rest.splitn(2, ':');
    let kind = parts.next()?.trim();
    if kind.is_empty() {
        return None;
    }
    let provider = parts.next().map(str::trim).filter(|s| !s.is_empty());
    Some(AgentSelection {
        kind: kind.to_string(),
        provider: provider.map(String::from),
    })
}

/// Selects the agent kind/provider for a request (spec §4.E priority order):
/// (a) the queue message's explicit hint, (b) the first matching
/// `engine:<kind>[:<provider>]` forge-issue label, (c) system defaults.
pub fn select_agent(
    explicit_hint: Option<&AgentSelection>,
    forge_labels: &[String],
    defaults: &SystemDefaults,
) -> AgentSelection {
    if let Some(hint) = explicit_hint {
        return hint.clone();
    }
    if let Some(sel) = forge_labels.iter().find_map(|l| parse_engine_label(l)) {
        return sel;
    }
    AgentSelection {
        kind: defaults.agent_kind.clone(),
        provider: defaults.provider.clone(),
    }
}

/// Builds an `AgentConfig` from a resolved selection plus model/limits the
/// caller already knows (max turns, timeout), filling in the model from
/// system defaults when unset.
pub fn build_agent_config(
    selection: &AgentSelection,
    model: Option<String>,
    max_turns: Option<u32>,
    timeout_secs: Option<u64>,
) -> AgentConfig {
    AgentConfig {
        kind: selection.kind.clone(),
        provider: selection.provider.clone(),
        model,
        max_turns,
        timeout_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> SystemDefaults {
        SystemDefaults {
            agent_kind: "claude-code".into(),
            provider: Some("anthropic".into()),
        }
    }

    #[test]
    fn parses_kind_only_label() {
        let sel = parse_engine_label("engine:codex").unwrap();
        assert_eq!(sel.kind, "codex");
        assert!(sel.provider.is_none());
    }

    #[test]
    fn parses_kind_and_provider_label() {
        let sel = parse_engine_label("engine:claude-code:anthropic").unwrap();
        assert_eq!(sel.kind, "claude-code");
        assert_eq!(sel.provider.as_deref(), Some("anthropic"));
    }

    #[test]
    fn non_engine_labels_ignored() {
        assert!(parse_engine_label("bug").is_none());
        assert!(parse_engine_label("priority:high").is_none());
    }

    /// **Scenario**: explicit hint wins over labels and defaults.
    #[test]
    fn explicit_hint_has_highest_priority() {
        let hint = AgentSelection {
            kind: "codex".into(),
            provider: None,
        };
        let sel = select_agent(
            Some(&hint),
            &["engine:aider:openai".to_string()],
            &defaults(),
        );
        assert_eq!(sel.kind, "codex");
    }

    /// **Scenario**: with no hint, the first matching label wins over defaults.
    #[test]
    fn label_wins_over_defaults_without_hint() {
        let sel = select_agent(None, &["bug".to_string(), "engine:aider:openai".to_string()], &defaults());
        assert_eq!(sel.kind, "aider");
        assert_eq!(sel.provider.as_deref(), Some("openai"));
    }

    /// **Scenario**: with neither hint nor label, defaults are used.
    #[test]
    fn falls_back_to_defaults() {
        let sel = select_agent(None, &["bug".to_string()], &defaults());
        assert_eq!(sel.kind, "claude-code");
        assert_eq!(sel.provider.as_deref(), Some("anthropic"));
    }

    /// **Scenario**: router priority law (spec §8) — changing a lower-priority
    /// input without changing the highest-priority present input doesn't
    /// alter the result.
    #[test]
    fn priority_law_lower_inputs_dont_affect_result_when_higher_present() {
        let hint = AgentSelection {
            kind: "codex".into(),
            provider: None,
        };
        let a = select_agent(Some(&hint), &["engine:aider".to_string()], &defaults());
        let mut other_defaults = defaults();
        other_defaults.agent_kind = "something-else".into();
        let b = select_agent(Some(&hint), &["engine:other".to_string()], &other_defaults);
        assert_eq!(a, b);
    }
}
