//! Pipeline stage definitions.
//!
//! Operations serialize with a `type` tag and camelCase fields so that the
//! same JSON travels between the report builder, templates and the CLI.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::input::Value;

/// One stage of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Operation {
    /// Keep rows matching a predicate.
    Filter(FilterStage),
    /// Partition rows by a composite key and reduce each partition.
    GroupBy(GroupByStage),
    /// Derive a field from two input fields.
    Calculate(CalculateStage),
    /// Reorder rows.
    Sort(SortStage),
    /// Derive a field from a condition.
    Conditional(ConditionalStage),
    /// A stage type this engine does not know. Executing it is fatal.
    #[serde(other)]
    Unknown,
}

impl Operation {
    /// Short name of the stage kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Filter(_) => "filter",
            Operation::GroupBy(_) => "groupBy",
            Operation::Calculate(_) => "calculate",
            Operation::Sort(_) => "sort",
            Operation::Conditional(_) => "conditional",
            Operation::Unknown => "unknown",
        }
    }

    pub fn as_group_by(&self) -> Option<&GroupByStage> {
        match self {
            Operation::GroupBy(stage) => Some(stage),
            _ => None,
        }
    }

    pub fn as_group_by_mut(&mut self) -> Option<&mut GroupByStage> {
        match self {
            Operation::GroupBy(stage) => Some(stage),
            _ => None,
        }
    }

    /// Describe why the stage cannot run, if its configuration is incomplete.
    pub fn config_issue(&self) -> Option<String> {
        match self {
            Operation::Filter(stage) => stage.config_issue(),
            Operation::GroupBy(stage) => stage.config_issue(),
            Operation::Calculate(stage) => stage.config_issue(),
            Operation::Sort(stage) => {
                if stage.field.trim().is_empty() {
                    Some("sort field is missing".to_string())
                } else {
                    None
                }
            }
            Operation::Conditional(stage) => stage.config_issue(),
            Operation::Unknown => None,
        }
    }

    /// Get a human-readable description of the operation.
    pub fn description(&self) -> String {
        match self {
            Operation::Filter(stage) => {
                match stage.operator {
                    Some(op) => format!("Filter '{}' {:?}", stage.field, op),
                    None => format!("Filter '{}' (no operator)", stage.field),
                }
            }
            Operation::GroupBy(stage) => {
                let fields: Vec<&str> = stage
                    .group_fields
                    .iter()
                    .map(|g| g.source_field.as_str())
                    .collect();
                let aggs: Vec<String> = stage
                    .aggregations
                    .iter()
                    .map(AggregationSpec::label)
                    .collect();
                if fields.is_empty() {
                    format!("Totals: {}", aggs.join(", "))
                } else {
                    format!("Group by {}: {}", fields.join(", "), aggs.join(", "))
                }
            }
            Operation::Calculate(stage) => {
                format!("Calculate '{}' = {}", stage.result_alias, stage.formula)
            }
            Operation::Sort(stage) => {
                format!("Sort by '{}' {:?}", stage.field, stage.direction)
            }
            Operation::Conditional(stage) => {
                format!(
                    "Conditional '{}' ({} condition(s))",
                    stage.result_alias,
                    stage.conditions.len()
                )
            }
            Operation::Unknown => "Unknown stage".to_string(),
        }
    }
}

// =============================================================================
// FILTER
// =============================================================================

/// Filter predicate operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    /// Case-insensitive substring match.
    Contains,
    GreaterThan,
    LessThan,
    /// Inclusive range.
    Between,
    In,
    IsEmpty,
    IsNotEmpty,
}

/// Right-hand side of a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    List(Vec<Value>),
    Range {
        #[serde(default)]
        min: Value,
        #[serde(default)]
        max: Value,
    },
    Scalar(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterStage {
    #[serde(default)]
    pub field: String,
    /// Unset while the stage is still being configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<FilterOperator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FilterValue>,
}

impl FilterStage {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Option<FilterValue>) -> Self {
        Self {
            field: field.into(),
            operator: Some(operator),
            value,
        }
    }

    fn config_issue(&self) -> Option<String> {
        if self.field.trim().is_empty() {
            return Some("filter field is missing".to_string());
        }
        let Some(operator) = self.operator else {
            return Some("filter operator is missing".to_string());
        };
        match (operator, &self.value) {
            (FilterOperator::IsEmpty | FilterOperator::IsNotEmpty, _) => None,
            (FilterOperator::Between, Some(FilterValue::Range { min, max }))
                if !min.is_null() && !max.is_null() =>
            {
                None
            }
            (FilterOperator::Between, _) => Some("between needs min and max".to_string()),
            (FilterOperator::In, Some(FilterValue::List(_))) => None,
            (FilterOperator::In, _) => Some("in needs a list of values".to_string()),
            (_, Some(FilterValue::Scalar(_))) => None,
            (op, _) => Some(format!("{:?} needs a single value", op)),
        }
    }
}

// =============================================================================
// GROUP BY
// =============================================================================

/// Date bucketing applied to a group field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeGranularity {
    Day,
    Month,
    Quarter,
    Year,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupFieldSpec {
    #[serde(default)]
    pub source_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_granularity: Option<TimeGranularity>,
    /// Output column name; falls back to the source field when empty.
    #[serde(default)]
    pub alias: String,
}

impl GroupFieldSpec {
    pub fn new(source_field: impl Into<String>) -> Self {
        let source_field = source_field.into();
        Self {
            alias: source_field.clone(),
            source_field,
            time_granularity: None,
        }
    }

    pub fn with_granularity(mut self, granularity: TimeGranularity) -> Self {
        self.time_granularity = Some(granularity);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Inactive entries (no source field) are ignored by the engine.
    pub fn is_active(&self) -> bool {
        !self.source_field.trim().is_empty()
    }

    pub fn output_name(&self) -> &str {
        if self.alias.trim().is_empty() {
            &self.source_field
        } else {
            &self.alias
        }
    }

    /// Same source field and same granularity.
    pub fn duplicates(&self, other: &GroupFieldSpec) -> bool {
        self.source_field == other.source_field && self.time_granularity == other.time_granularity
    }
}

/// Aggregation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Median,
    DistinctCount,
    CountTrue,
    CountFalse,
    PercentTrue,
    PercentFalse,
    Any,
    First,
    PercentOfTotal,
}

impl AggregationFunction {
    /// Functions that reduce a numeric list and drop zeros by default.
    pub fn is_numeric_reduction(&self) -> bool {
        matches!(
            self,
            AggregationFunction::Sum
                | AggregationFunction::Avg
                | AggregationFunction::Min
                | AggregationFunction::Max
                | AggregationFunction::Median
        )
    }

    /// Functions that need no source field.
    pub fn needs_source(&self) -> bool {
        !matches!(self, AggregationFunction::Count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationSpec {
    #[serde(default)]
    pub source_field: String,
    /// Unset while the aggregation is still being configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<AggregationFunction>,
    #[serde(default)]
    pub alias: String,
    /// Keep zero-valued entries in numeric reductions. Falls back to the
    /// engine default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_zeros: Option<bool>,
}

impl AggregationSpec {
    pub fn new(
        source_field: impl Into<String>,
        function: AggregationFunction,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            source_field: source_field.into(),
            function: Some(function),
            alias: alias.into(),
            include_zeros: None,
        }
    }

    pub fn with_include_zeros(mut self, include: bool) -> Self {
        self.include_zeros = Some(include);
        self
    }

    /// Same source field and same function.
    pub fn same_measure(&self, other: &AggregationSpec) -> bool {
        self.function.is_some()
            && self.source_field == other.source_field
            && self.function == other.function
    }

    fn label(&self) -> String {
        match self.function {
            Some(function) => format!("{:?}({})", function, self.source_field),
            None => format!("?({})", self.source_field),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "ascending")]
    Asc,
    #[serde(alias = "descending")]
    Desc,
}

/// Explicit ordering of grouped output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupByStage {
    #[serde(default)]
    pub group_fields: Vec<GroupFieldSpec>,
    #[serde(default)]
    pub aggregations: Vec<AggregationSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortSpec>,
}

impl GroupByStage {
    pub fn new(group_fields: Vec<GroupFieldSpec>, aggregations: Vec<AggregationSpec>) -> Self {
        Self {
            group_fields,
            aggregations,
            sort_by: None,
        }
    }

    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by = Some(SortSpec {
            field: field.into(),
            direction,
        });
        self
    }

    /// Group fields that take part in the composite key.
    pub fn active_group_fields(&self) -> impl Iterator<Item = &GroupFieldSpec> {
        self.group_fields.iter().filter(|g| g.is_active())
    }

    fn config_issue(&self) -> Option<String> {
        if self.active_group_fields().next().is_none() && self.aggregations.is_empty() {
            return Some("group by needs a group field or an aggregation".to_string());
        }

        let keys: HashSet<&str> = self.active_group_fields().map(|g| g.output_name()).collect();
        let mut seen = HashSet::new();
        for agg in &self.aggregations {
            let Some(function) = agg.function else {
                return Some(format!("aggregation on '{}' has no function", agg.source_field));
            };
            if function.needs_source() && agg.source_field.trim().is_empty() {
                return Some(format!("{:?} aggregation has no source field", function));
            }
            if agg.alias.trim().is_empty() {
                return Some(format!("{} aggregation has no alias", agg.label()));
            }
            if keys.contains(agg.alias.as_str()) {
                return Some(format!(
                    "aggregation alias '{}' collides with a group field",
                    agg.alias
                ));
            }
            if !seen.insert(agg.alias.as_str()) {
                return Some(format!("duplicate aggregation alias '{}'", agg.alias));
            }
        }

        None
    }
}

// =============================================================================
// CALCULATE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateStage {
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub result_alias: String,
    #[serde(default)]
    pub input_fields: Vec<String>,
}

impl CalculateStage {
    pub fn new(
        formula: impl Into<String>,
        result_alias: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self {
            formula: formula.into(),
            result_alias: result_alias.into(),
            input_fields: vec![left.into(), right.into()],
        }
    }

    fn config_issue(&self) -> Option<String> {
        if self.formula.trim().is_empty() {
            Some("formula is missing".to_string())
        } else if self.result_alias.trim().is_empty() {
            Some("result alias is missing".to_string())
        } else if self.input_fields.len() != 2
            || self.input_fields.iter().any(|f| f.trim().is_empty())
        {
            Some("calculate needs exactly two input fields".to_string())
        } else {
            None
        }
    }
}

// =============================================================================
// SORT
// =============================================================================

/// Comparator used by a sort stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortValueType {
    Number,
    Date,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortStage {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
    /// Declared comparator; inferred from the column when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<SortValueType>,
}

impl SortStage {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
            value_type: None,
        }
    }

    pub fn with_value_type(mut self, value_type: SortValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }
}

// =============================================================================
// CONDITIONAL
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    GreaterThan,
    LessThan,
    Equals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default)]
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<ConditionOperator>,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub then_value: Value,
    #[serde(default)]
    pub else_value: Value,
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<Value>,
        then_value: impl Into<Value>,
        else_value: impl Into<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: Some(operator),
            value: value.into(),
            then_value: then_value.into(),
            else_value: else_value.into(),
        }
    }
}

/// Derives `result_alias` from the **first** condition only.
///
/// Further conditions are accepted so that saved templates round-trip, but
/// they are never evaluated; the engine reports them as a warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalStage {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub result_alias: String,
}

impl ConditionalStage {
    pub fn new(conditions: Vec<Condition>, result_alias: impl Into<String>) -> Self {
        Self {
            conditions,
            result_alias: result_alias.into(),
        }
    }

    fn config_issue(&self) -> Option<String> {
        match self.conditions.first() {
            None => Some("conditional has no conditions".to_string()),
            Some(_) if self.result_alias.trim().is_empty() => {
                Some("result alias is missing".to_string())
            }
            Some(c) if c.field.trim().is_empty() => Some("condition field is missing".to_string()),
            Some(c) if c.operator.is_none() => Some("condition operator is missing".to_string()),
            Some(_) => None,
        }
    }
}
