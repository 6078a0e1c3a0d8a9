//! Agent name to HTTP path resolution.

/// Resolve an agent display name to its HTTP path segment.
///
/// Lowercases the name, then drops every character outside `[a-z0-9]`.
/// Pure, total, and deterministic over any input. Distinct display names can
/// collide ("My Agent" and "MyAgent!" both resolve to "myagent"); the
/// function does not disambiguate, registries are expected to refuse
/// colliding registrations.
pub fn agent_path(agent_name: &str) -> String {
    agent_name
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}
