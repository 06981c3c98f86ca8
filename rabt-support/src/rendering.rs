//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format resolution chains, type lists,
//! dependency reports and "did you mean?" suggestions.

/// Renders a resolution chain as a readable string.
///
/// # Examples
/// ```
/// use rabt_support::rendering::render_chain;
///
/// let chain = vec!["UserService", "UserRepo", "UserService"];
/// assert_eq!(render_chain(&chain), "UserService → UserRepo → UserService");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    render_list(chain, " → ")
}

/// Joins identifiers with the given separator.
///
/// ```
/// use rabt_support::rendering::render_list;
///
/// assert_eq!(render_list(&["Reader", "Writer"], " & "), "Reader & Writer");
/// assert_eq!(render_list::<&str>(&[], ", "), "");
/// ```
pub fn render_list<S: AsRef<str>>(items: &[S], separator: &str) -> String {
    items
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Renders one line of a dependency report.
///
/// ```
/// use rabt_support::rendering::render_dependency_line;
///
/// assert_eq!(render_dependency_line("A", &["B", "C"]), "A → B, C");
/// assert_eq!(render_dependency_line::<&str>("C", &[]), "C (no dependencies)");
/// ```
pub fn render_dependency_line<S: AsRef<str>>(node: &str, dependencies: &[S]) -> String {
    if dependencies.is_empty() {
        format!("{node} (no dependencies)")
    } else {
        format!("{node} → {}", render_list(dependencies, ", "))
    }
}

/// Strips namespace prefixes from an identifier.
///
/// Both `\` and `::` separators are understood, so identifiers ported from
/// other ecosystems shorten the same way as Rust paths.
///
/// ```
/// use rabt_support::rendering::short_name;
///
/// assert_eq!(short_name("App\\Services\\Mailer"), "Mailer");
/// assert_eq!(short_name("app::services::Mailer"), "Mailer");
/// assert_eq!(short_name("Mailer"), "Mailer");
/// ```
pub fn short_name(identifier: &str) -> &str {
    let after_backslash = identifier.rsplit('\\').next().unwrap_or(identifier);
    after_backslash.rsplit("::").next().unwrap_or(after_backslash)
}

/// Generates "did you mean?" suggestions from registered identifiers.
///
/// Candidates are scored by substring containment first, then by shared
/// prefix of the short names. Only the best `max_suggestions` are returned.
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    let requested_short = short_name(requested).to_lowercase();

    if requested_short.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter(|&&name| name != requested)
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();
            let name_short = short_name(name).to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 100));
            }

            if name_short.contains(&requested_short) || requested_short.contains(&name_short) {
                return Some((name, 80));
            }

            let common = name_short
                .chars()
                .zip(requested_short.chars())
                .take_while(|(a, b)| a == b)
                .count();

            (common >= 3).then_some((name, common * 10))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_rendering() {
        assert_eq!(render_chain(&["A", "B", "A"]), "A → B → A");
        assert_eq!(render_chain(&["A"]), "A");
    }

    #[test]
    fn suggest_finds_substring() {
        let available = vec!["App\\Logger", "App\\FileLogger", "App\\Mailer"];
        let suggestions = suggest_similar("Logger", &available, 3);
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions.iter().all(|s| s.contains("Logger")));
    }

    #[test]
    fn suggest_by_prefix() {
        let available = vec!["Database", "Cache"];
        let suggestions = suggest_similar("Datastore", &available, 3);
        assert_eq!(suggestions, vec!["Database".to_string()]);
    }

    #[test]
    fn suggest_skips_exact_and_unrelated() {
        let available = vec!["Mailer", "Queue"];
        assert!(suggest_similar("Mailer", &available, 3).is_empty());
        assert!(suggest_similar("XyzAbc", &available, 3).is_empty());
    }

    #[test]
    fn suggest_respects_limit() {
        let available = vec!["UserRepo", "UserService", "UserCache"];
        assert_eq!(suggest_similar("User", &available, 2).len(), 2);
    }
}
