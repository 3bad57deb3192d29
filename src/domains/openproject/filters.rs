//! Filter Builder.
//!
//! Translates optional scalar tool parameters into OpenProject filter clauses.
//! Clauses are emitted in the order the builder methods are called, so every
//! tool produces a stable field order. OpenProject combines them with AND.

use serde::Serialize;
use serde::ser::{SerializeMap, SerializeStruct, Serializer};

/// Filter operators understood by the OpenProject query language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// `=`: field equals one of the values.
    Equals,
    /// `o`: status is open.
    Open,
    /// `c`: status is closed.
    Closed,
}

impl FilterOperator {
    /// Wire representation of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::Open => "o",
            Self::Closed => "c",
        }
    }

    /// Unary operators take no values.
    pub fn is_unary(self) -> bool {
        matches!(self, Self::Open | Self::Closed)
    }
}

/// A single filter clause: `{field: {operator, values}}` on the wire.
///
/// `values` is empty exactly when the operator is unary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    field: String,
    operator: FilterOperator,
    values: Vec<String>,
}

impl FilterClause {
    /// `field = value`.
    pub fn equals(field: impl Into<String>, value: impl ToString) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::Equals,
            values: vec![value.to_string()],
        }
    }

    /// A clause with a unary operator. Returns `None` for binary operators.
    pub fn unary(field: impl Into<String>, operator: FilterOperator) -> Option<Self> {
        operator.is_unary().then(|| Self {
            field: field.into(),
            operator,
            values: Vec::new(),
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl Serialize for FilterClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Condition<'a>(&'a FilterClause);

        impl Serialize for Condition<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut state = serializer.serialize_struct("Condition", 2)?;
                state.serialize_field("operator", self.0.operator.as_str())?;
                state.serialize_field("values", &self.0.values)?;
                state.end()
            }
        }

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &Condition(self))?;
        map.end()
    }
}

/// Encode clauses as the JSON value of OpenProject's `filters` query parameter.
pub fn encode_filters(clauses: &[FilterClause]) -> String {
    // A Vec of string-keyed maps cannot fail to serialize.
    serde_json::to_string(clauses).unwrap_or_else(|_| "[]".to_string())
}

/// Builder accumulating clauses from optional tool parameters.
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    clauses: Vec<FilterClause>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `field = id` when the identifier is present.
    pub fn id(mut self, field: &str, id: Option<u64>) -> Self {
        if let Some(id) = id {
            self.clauses.push(FilterClause::equals(field, id));
        }
        self
    }

    /// Adds `field = value` when the value is present.
    pub fn value(mut self, field: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.clauses.push(FilterClause::equals(field, value));
        }
        self
    }

    /// Adds `field = value` only when `enabled` is set.
    pub fn flag(mut self, field: &str, enabled: bool, value: &str) -> Self {
        if enabled {
            self.clauses.push(FilterClause::equals(field, value));
        }
        self
    }

    /// Work package status: `"open"` → `o`, `"closed"` → `c`, anything else
    /// (including absence) adds nothing.
    pub fn status(mut self, status: Option<&str>) -> Self {
        let operator = match status {
            Some("open") => Some(FilterOperator::Open),
            Some("closed") => Some(FilterOperator::Closed),
            _ => None,
        };
        if let Some(clause) = operator.and_then(|op| FilterClause::unary("status", op)) {
            self.clauses.push(clause);
        }
        self
    }

    /// Finish the builder.
    ///
    /// Returns `None` when nothing was added: "no filter argument" and "empty
    /// filter list" are different requests to OpenProject.
    pub fn build(self) -> Option<Vec<FilterClause>> {
        if self.clauses.is_empty() {
            None
        } else {
            Some(self.clauses)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder_yields_no_filter() {
        assert_eq!(FilterBuilder::new().build(), None);
        assert_eq!(
            FilterBuilder::new().id("project", None).status(None).build(),
            None
        );
    }

    #[test]
    fn test_identifier_emits_equals_clause() {
        let filters = FilterBuilder::new().id("project", Some(5)).build().unwrap();
        assert_eq!(filters, vec![FilterClause::equals("project", "5")]);
        assert_eq!(filters[0].operator(), FilterOperator::Equals);
        assert_eq!(filters[0].values(), ["5".to_string()]);
    }

    #[test]
    fn test_status_mapping() {
        let open = FilterBuilder::new().status(Some("open")).build().unwrap();
        assert_eq!(open[0].field(), "status");
        assert_eq!(open[0].operator(), FilterOperator::Open);
        assert!(open[0].values().is_empty());

        let closed = FilterBuilder::new().status(Some("closed")).build().unwrap();
        assert_eq!(closed[0].operator(), FilterOperator::Closed);

        assert_eq!(FilterBuilder::new().status(Some("all")).build(), None);
        assert_eq!(FilterBuilder::new().status(Some("OPEN")).build(), None);
    }

    #[test]
    fn test_clause_count_matches_present_parameters() {
        let ids = [None, Some(3u64)];
        let statuses = [None, Some("open"), Some("closed"), Some("any")];

        for project in ids {
            for user in ids {
                for status in statuses {
                    let expected = usize::from(project.is_some())
                        + usize::from(user.is_some())
                        + usize::from(matches!(status, Some("open") | Some("closed")));

                    let built = FilterBuilder::new()
                        .id("project", project)
                        .id("principal", user)
                        .status(status)
                        .build();

                    assert_eq!(built.as_ref().map_or(0, Vec::len), expected);
                }
            }
        }
    }

    #[test]
    fn test_field_order_is_stable() {
        let filters = FilterBuilder::new()
            .id("work_package", Some(9))
            .id("user", Some(2))
            .build()
            .unwrap();
        let fields: Vec<_> = filters.iter().map(FilterClause::field).collect();
        assert_eq!(fields, ["work_package", "user"]);
    }

    #[test]
    fn test_flag_only_when_enabled() {
        assert_eq!(FilterBuilder::new().flag("active", false, "t").build(), None);
        let filters = FilterBuilder::new().flag("active", true, "t").build().unwrap();
        assert_eq!(filters, vec![FilterClause::equals("active", "t")]);
    }

    #[test]
    fn test_unary_rejects_binary_operator() {
        assert!(FilterClause::unary("status", FilterOperator::Equals).is_none());
    }

    #[test]
    fn test_wire_encoding() {
        let filters = FilterBuilder::new()
            .id("project", Some(5))
            .status(Some("open"))
            .build()
            .unwrap();
        assert_eq!(
            encode_filters(&filters),
            r#"[{"project":{"operator":"=","values":["5"]}},{"status":{"operator":"o","values":[]}}]"#
        );
    }
}
