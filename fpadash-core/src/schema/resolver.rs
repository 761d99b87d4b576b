//! Column detection: exact names first, then substrings, then numeric fallback

use crate::reader::Table;
use tracing::debug;

/// How to recognise one logical column among a table's headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPattern {
    /// Exact, case-sensitive header names in priority order
    pub aliases: Vec<String>,
    /// Substring groups tried in order; every needle of a group must appear
    /// in the lowercased header. Needles are stored lowercased.
    pub contains: Vec<Vec<String>>,
    /// Fall back to the first numeric column not excluded
    pub numeric_fallback: bool,
}

impl ColumnPattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Add one substring group (all needles must be present)
    pub fn contains<I, S>(mut self, needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group: Vec<String> = needles
            .into_iter()
            .map(|n| n.into().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        if !group.is_empty() {
            self.contains.push(group);
        }
        self
    }

    pub fn numeric_fallback(mut self) -> Self {
        self.numeric_fallback = true;
        self
    }

    /// Put extra aliases ahead of the existing ones
    pub fn prepend_aliases(&mut self, extra: &[String]) {
        let mut aliases = extra.to_vec();
        aliases.extend(self.aliases.drain(..));
        self.aliases = aliases;
    }

    /// Find the first matching column. `exclude` only filters the numeric
    /// fallback stage.
    pub fn resolve<'t>(&self, table: &'t Table, exclude: &[&str]) -> Option<&'t str> {
        if let Some(col) = table
            .columns
            .iter()
            .find(|c| self.aliases.iter().any(|a| a == *c))
        {
            debug!(sheet = %table.name, column = %col, "exact header match");
            return Some(col.as_str());
        }

        for group in &self.contains {
            if let Some(col) = table.columns.iter().find(|c| {
                let lower = c.to_lowercase();
                group.iter().all(|needle| lower.contains(needle.as_str()))
            }) {
                debug!(
                    sheet = %table.name,
                    column = %col,
                    needles = ?group,
                    "substring header match"
                );
                return Some(col.as_str());
            }
        }

        if self.numeric_fallback {
            let found = table
                .columns
                .iter()
                .enumerate()
                .find(|(idx, c)| !exclude.contains(&c.as_str()) && table.is_numeric_column(*idx))
                .map(|(_, c)| c.as_str());
            if let Some(col) = found {
                debug!(sheet = %table.name, column = %col, "numeric column fallback");
            }
            return found;
        }

        None
    }
}

/// Exact match against `candidates`, then a case-insensitive substring match
/// on `fallback_substring`. `None` when nothing matches.
pub fn resolve_column<'t>(
    table: &'t Table,
    candidates: &[&str],
    fallback_substring: &str,
) -> Option<&'t str> {
    ColumnPattern::new()
        .aliases(candidates.iter().copied())
        .contains([fallback_substring])
        .resolve(table, &[])
}

/// [`resolve_column`] plus a last resort: the first numeric column other
/// than `exclude` (usually the period column).
pub fn resolve_numeric_column<'t>(
    table: &'t Table,
    candidates: &[&str],
    fallback_substring: &str,
    exclude: Option<&str>,
) -> Option<&'t str> {
    let exclude: Vec<&str> = exclude.into_iter().collect();
    ColumnPattern::new()
        .aliases(candidates.iter().copied())
        .contains([fallback_substring])
        .numeric_fallback()
        .resolve(table, &exclude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Value;

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        Table::new(
            "Receitas",
            columns.iter().map(|c| c.to_string()).collect(),
            rows,
        )
    }

    #[test]
    fn test_exact_match_wins_over_substring() {
        let t = table(&["Mês de referência", "Ms", "Valor"], vec![]);
        assert_eq!(resolve_column(&t, &["Ms", "Mês"], "mês"), Some("Ms"));
    }

    #[test]
    fn test_exact_match_is_case_sensitive() {
        let t = table(&["ms", "Valor"], vec![]);
        assert_eq!(resolve_column(&t, &["Ms"], "zzz"), None);
    }

    #[test]
    fn test_first_candidate_in_column_order() {
        // Column order decides, not candidate order
        let t = table(&["Mes", "Ms"], vec![]);
        assert_eq!(resolve_column(&t, &["Ms", "Mes"], "x"), Some("Mes"));
    }

    #[test]
    fn test_substring_fallback_is_case_insensitive() {
        let t = table(&["Segmento", "MÊS CONTÁBIL"], vec![]);
        assert_eq!(resolve_column(&t, &["Ms"], "mês"), Some("MÊS CONTÁBIL"));
    }

    #[test]
    fn test_not_found_is_none() {
        let t = table(&["A", "B"], vec![]);
        assert_eq!(resolve_column(&t, &["Ms"], "mes"), None);
    }

    #[test]
    fn test_numeric_fallback_skips_excluded_column() {
        let t = table(
            &["Ms", "Nota", "Consultoria PJ"],
            vec![
                vec![Value::Number(1.0), Value::from("x"), Value::Number(10.0)],
                vec![Value::Number(2.0), Value::Empty, Value::Number(12.0)],
            ],
        );
        assert_eq!(
            resolve_numeric_column(&t, &["Valor"], "valor", Some("Ms")),
            Some("Consultoria PJ")
        );
        assert_eq!(resolve_numeric_column(&t, &["Valor"], "valor", None), Some("Ms"));
        assert_eq!(resolve_column(&t, &["Valor"], "valor"), None);
    }

    #[test]
    fn test_all_needles_required() {
        let pattern = ColumnPattern::new().contains(["net", "margin"]);
        let t = table(&["Gross Margin", "Net Income", "Net Margin %"], vec![]);
        assert_eq!(pattern.resolve(&t, &[]), Some("Net Margin %"));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let t = table(&["Período", "Mes", "Month"], vec![]);
        let first = resolve_column(&t, &["Month", "Mes"], "mes");
        for _ in 0..10 {
            assert_eq!(resolve_column(&t, &["Month", "Mes"], "mes"), first);
        }
        assert_eq!(first, Some("Mes"));
    }

    #[test]
    fn test_prepend_aliases() {
        let mut pattern = ColumnPattern::new().aliases(["Ms"]);
        pattern.prepend_aliases(&["Competência".to_string()]);
        assert_eq!(pattern.aliases, vec!["Competência", "Ms"]);
    }
}
