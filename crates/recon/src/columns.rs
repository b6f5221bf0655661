//! Heuristic column detection for spreadsheets whose headers vary between
//! exports ("Timesheet Owner Name", "Time Sheet Owner Name", "Employee Name"...).

use serde::Deserialize;

use crate::error::ReconError;
use crate::model::Table;

/// One predicate tried against a header.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRule {
    /// Header equals the value (after trimming).
    Exact(String),
    /// Header equals the value ignoring ASCII case.
    IgnoreCase(String),
    /// Header contains every keyword, ignoring case.
    ContainsAll(Vec<String>),
}

impl ColumnRule {
    pub fn matches(&self, header: &str) -> bool {
        let header = header.trim();
        match self {
            Self::Exact(name) => header == name.trim(),
            Self::IgnoreCase(name) => header.eq_ignore_ascii_case(name.trim()),
            Self::ContainsAll(keywords) => {
                let lower = header.to_lowercase();
                !keywords.is_empty() && keywords.iter().all(|k| lower.contains(&k.to_lowercase()))
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Exact(name) | Self::IgnoreCase(name) => name.clone(),
            Self::ContainsAll(keywords) => format!("<header containing {}>", keywords.join(" + ")),
        }
    }
}

/// Ranked rules; the first rule that matches any header wins, and within a
/// rule the leftmost matching header wins.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ColumnResolver {
    rules: Vec<ColumnRule>,
}

impl ColumnResolver {
    pub fn new(rules: Vec<ColumnRule>) -> Self {
        Self { rules }
    }

    /// Resolver that only accepts `name` verbatim.
    pub fn exact(name: impl Into<String>) -> Self {
        Self::new(vec![ColumnRule::Exact(name.into())])
    }

    pub fn employee_name() -> Self {
        Self::new(vec![
            ColumnRule::Exact("Timesheet Owner Name".into()),
            ColumnRule::Exact("Time Sheet Owner Name".into()),
            ColumnRule::Exact("Employee Name".into()),
            ColumnRule::IgnoreCase("timesheet owner name".into()),
            ColumnRule::IgnoreCase("time sheet owner name".into()),
            ColumnRule::ContainsAll(vec!["employee".into(), "name".into()]),
            ColumnRule::ContainsAll(vec!["owner".into(), "name".into()]),
            ColumnRule::IgnoreCase("name".into()),
        ])
    }

    pub fn employee_id() -> Self {
        Self::new(vec![
            ColumnRule::Exact("Employee ID".into()),
            ColumnRule::IgnoreCase("employee id".into()),
            ColumnRule::ContainsAll(vec!["employee".into(), "id".into()]),
            ColumnRule::IgnoreCase("id".into()),
        ])
    }

    pub fn rules(&self) -> &[ColumnRule] {
        &self.rules
    }

    pub fn resolve<S: AsRef<str>>(&self, headers: &[S]) -> Option<String> {
        self.rules.iter().find_map(|rule| {
            headers
                .iter()
                .map(|h| h.as_ref())
                .find(|h| rule.matches(h))
                .map(|h| h.trim().to_string())
        })
    }

    /// Resolve against a table, failing with `MissingColumn` named after the
    /// highest-ranked rule.
    pub fn require(&self, dataset: &str, table: &Table) -> Result<String, ReconError> {
        self.resolve(table.columns()).ok_or_else(|| {
            let wanted = self
                .rules
                .first()
                .map(ColumnRule::describe)
                .unwrap_or_else(|| "<no rules>".into());
            ReconError::missing_column(dataset, wanted)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranked_rules_prefer_exact_header() {
        let headers = ["Employee Name", "Timesheet Owner Name", "Hours"];
        assert_eq!(
            ColumnResolver::employee_name().resolve(&headers).as_deref(),
            Some("Timesheet Owner Name")
        );
    }

    #[test]
    fn falls_back_to_keywords() {
        let headers = ["Dept", "EMPLOYEE FULL NAME"];
        assert_eq!(
            ColumnResolver::employee_name().resolve(&headers).as_deref(),
            Some("EMPLOYEE FULL NAME")
        );
    }

    #[test]
    fn id_resolution() {
        let headers = ["Name", "Emp. Number", "employee_id"];
        assert_eq!(
            ColumnResolver::employee_id().resolve(&headers).as_deref(),
            Some("employee_id")
        );
    }

    #[test]
    fn leftmost_header_wins_within_rule() {
        let r = ColumnResolver::new(vec![ColumnRule::ContainsAll(vec!["name".into()])]);
        assert_eq!(r.resolve(&["First Name", "Last Name"]).as_deref(), Some("First Name"));
    }

    #[test]
    fn require_reports_missing_column() {
        let t = Table::new(["Hours", "Office"]);
        let err = ColumnResolver::employee_id().require("employees", &t).unwrap_err();
        assert_eq!(err.to_string(), "dataset 'employees': missing column 'Employee ID'");
    }

    #[test]
    fn rules_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Probe {
            name: ColumnResolver,
        }
        let probe: Probe = toml::from_str(
            r#"name = [{ exact = "Owner" }, { contains_all = ["owner", "name"] }]"#,
        )
        .unwrap();
        assert_eq!(probe.name.rules().len(), 2);
        assert!(probe.name.rules()[1].matches("Timesheet owner name"));
    }
}
