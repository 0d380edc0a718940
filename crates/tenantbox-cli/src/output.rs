//! Formatted output helpers for CLI commands.

use std::fmt::Write;

use tenantbox_common::types::{LifecycleState, UserIdentity};

/// Formats identity/state rows as an aligned table with a header.
#[must_use]
pub fn format_table(rows: &[(UserIdentity, LifecycleState)]) -> String {
    let width = rows
        .iter()
        .map(|(identity, _)| identity.as_str().len())
        .max()
        .unwrap_or(0)
        .max("IDENTITY".len());

    let mut out = format!("{:<width$}  STATE\n", "IDENTITY");
    for (identity, state) in rows {
        let _ = writeln!(out, "{:<width$}  {state}", identity.as_str());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> UserIdentity {
        UserIdentity::parse(raw).unwrap()
    }

    #[test]
    fn table_has_header_and_rows() {
        let table = format_table(&[
            (id("alice"), LifecycleState::Running),
            (id("bob"), LifecycleState::Stopped),
        ]);
        assert_eq!(
            table,
            "IDENTITY  STATE\nalice     running\nbob       stopped\n"
        );
    }

    #[test]
    fn long_identities_widen_the_column() {
        let table = format_table(&[(id("a-very-long-user"), LifecycleState::Running)]);
        assert!(table.starts_with("IDENTITY          STATE\n"));
        assert!(table.contains("a-very-long-user  running"));
    }
}
