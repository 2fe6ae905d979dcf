//! Interactive editing policy for operation lists.
//!
//! New grouping and aggregation requests are merged into the first GroupBy
//! stage instead of appending a second one, since re-grouping already grouped
//! rows produces wrong aggregates.

use serde::{Deserialize, Serialize};

use crate::pipeline::{AggregationSpec, GroupByStage, GroupFieldSpec, Operation, TimeGranularity};

/// An edit to an operation list.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposeRequest {
    /// Add a group field to the first GroupBy, creating one if needed.
    AddGroupField(GroupFieldSpec),
    /// Add an aggregation to the first GroupBy, creating one if needed.
    AddAggregation(AggregationSpec),
    /// Append a stage. A GroupBy merges into an existing one.
    Append(Operation),
    Remove(usize),
    Replace(usize, Operation),
    Move { from: usize, to: usize },
}

/// Group fields sharing a source field and granularity within one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroupField {
    pub source_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_granularity: Option<TimeGranularity>,
    /// Positions within `groupFields`.
    pub positions: Vec<usize>,
}

/// Result of applying a [`ComposeRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub operations: Vec<Operation>,
    /// Index of the GroupBy stage the request was merged into, if any.
    pub merged_into: Option<usize>,
    /// Duplicate group fields of the first GroupBy stage after the edit.
    pub duplicates: Vec<DuplicateGroupField>,
}

/// Apply `request` to a copy of `pipeline`.
pub fn compose(pipeline: &[Operation], request: ComposeRequest) -> Composition {
    let mut operations = pipeline.to_vec();
    let mut merged_into = None;

    match request {
        ComposeRequest::AddGroupField(spec) => {
            let index = first_group_by_or_insert(&mut operations);
            if let Some(stage) = operations[index].as_group_by_mut() {
                stage.group_fields.push(spec);
            }
            merged_into = Some(index);
        }
        ComposeRequest::AddAggregation(spec) => {
            let index = first_group_by_or_insert(&mut operations);
            if let Some(stage) = operations[index].as_group_by_mut() {
                merge_aggregation(stage, spec);
            }
            merged_into = Some(index);
        }
        ComposeRequest::Append(Operation::GroupBy(incoming)) => {
            match first_group_by(&operations) {
                Some(index) => {
                    if let Some(stage) = operations[index].as_group_by_mut() {
                        merge_stage(stage, incoming);
                    }
                    merged_into = Some(index);
                }
                None => operations.push(Operation::GroupBy(incoming)),
            }
        }
        ComposeRequest::Append(operation) => operations.push(operation),
        ComposeRequest::Remove(index) => {
            if index < operations.len() {
                operations.remove(index);
            }
        }
        ComposeRequest::Replace(index, operation) => {
            if let Some(slot) = operations.get_mut(index) {
                *slot = operation;
            }
        }
        ComposeRequest::Move { from, to } => {
            if from < operations.len() && to < operations.len() {
                let operation = operations.remove(from);
                operations.insert(to, operation);
            }
        }
    }

    let duplicates = first_group_by(&operations)
        .map(|index| duplicate_group_fields(&operations[index]))
        .unwrap_or_default();

    Composition {
        operations,
        merged_into,
        duplicates,
    }
}

/// Duplicate group fields in a GroupBy stage; empty for other stages.
pub fn duplicate_group_fields(operation: &Operation) -> Vec<DuplicateGroupField> {
    let Some(stage) = operation.as_group_by() else {
        return Vec::new();
    };

    let mut duplicates: Vec<DuplicateGroupField> = Vec::new();
    for (position, field) in stage.group_fields.iter().enumerate() {
        if !field.is_active() {
            continue;
        }
        if let Some(existing) = duplicates.iter_mut().find(|d| {
            d.source_field == field.source_field && d.time_granularity == field.time_granularity
        }) {
            existing.positions.push(position);
        } else {
            duplicates.push(DuplicateGroupField {
                source_field: field.source_field.clone(),
                time_granularity: field.time_granularity,
                positions: vec![position],
            });
        }
    }

    duplicates.retain(|d| d.positions.len() > 1);
    duplicates
}

fn first_group_by(operations: &[Operation]) -> Option<usize> {
    operations.iter().position(|op| op.as_group_by().is_some())
}

fn first_group_by_or_insert(operations: &mut Vec<Operation>) -> usize {
    match first_group_by(operations) {
        Some(index) => index,
        None => {
            operations.push(Operation::GroupBy(GroupByStage::default()));
            operations.len() - 1
        }
    }
}

fn merge_stage(target: &mut GroupByStage, incoming: GroupByStage) {
    target.group_fields.extend(incoming.group_fields);
    for aggregation in incoming.aggregations {
        merge_aggregation(target, aggregation);
    }
    if target.sort_by.is_none() {
        target.sort_by = incoming.sort_by;
    }
}

/// Add an aggregation unless the same measure exists, keeping aliases unique.
fn merge_aggregation(stage: &mut GroupByStage, mut spec: AggregationSpec) {
    if stage.aggregations.iter().any(|a| a.same_measure(&spec)) {
        return;
    }
    spec.alias = unique_alias(stage, &spec.alias);
    stage.aggregations.push(spec);
}

/// Aliases must not repeat and must not shadow a group field column.
fn unique_alias(stage: &GroupByStage, alias: &str) -> String {
    let taken = |candidate: &str| {
        stage.aggregations.iter().any(|a| a.alias == candidate)
            || stage.active_group_fields().any(|g| g.output_name() == candidate)
    };
    if !taken(alias) {
        return alias.to_string();
    }
    (2..)
        .map(|n| format!("{}_{}", alias, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| alias.to_string())
}

/// Stateful wrapper around [`compose`] for an editing session.
#[derive(Debug, Clone, Default)]
pub struct OperationComposer {
    operations: Vec<Operation>,
    duplicates: Vec<DuplicateGroupField>,
}

impl OperationComposer {
    pub fn new(operations: Vec<Operation>) -> Self {
        let duplicates = first_group_by(&operations)
            .map(|index| duplicate_group_fields(&operations[index]))
            .unwrap_or_default();
        Self {
            operations,
            duplicates,
        }
    }

    /// Apply a request, returning the index of the stage it merged into.
    pub fn apply(&mut self, request: ComposeRequest) -> Option<usize> {
        let composition = compose(&self.operations, request);
        self.operations = composition.operations;
        self.duplicates = composition.duplicates;
        composition.merged_into
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Duplicate group fields flagged for the user.
    pub fn duplicates(&self) -> &[DuplicateGroupField] {
        &self.duplicates
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::AggregationFunction;

    #[test]
    fn test_unique_alias_suffix() {
        let mut stage = GroupByStage::new(
            vec![],
            vec![
                AggregationSpec::new("A", AggregationFunction::Sum, "Total"),
                AggregationSpec::new("B", AggregationFunction::Sum, "Total_2"),
            ],
        );
        assert_eq!(unique_alias(&stage, "Total"), "Total_3");
        assert_eq!(unique_alias(&stage, "Other"), "Other");

        merge_aggregation(&mut stage, AggregationSpec::new("A", AggregationFunction::Sum, "Again"));
        assert_eq!(stage.aggregations.len(), 2);
    }

    #[test]
    fn test_alias_never_shadows_group_field() {
        let mut stage = GroupByStage::new(
            vec![GroupFieldSpec::new("Status")],
            vec![AggregationSpec::new("Amount", AggregationFunction::Sum, "Total")],
        );
        merge_aggregation(&mut stage, AggregationSpec::new("Amount", AggregationFunction::Avg, "Status"));
        assert_eq!(stage.aggregations[1].alias, "Status_2");
        assert!(Operation::GroupBy(stage).config_issue().is_none());
    }

    #[test]
    fn test_inactive_fields_not_duplicates() {
        let op = Operation::GroupBy(GroupByStage::new(
            vec![GroupFieldSpec::new(""), GroupFieldSpec::new("")],
            vec![],
        ));
        assert!(duplicate_group_fields(&op).is_empty());
    }
}
