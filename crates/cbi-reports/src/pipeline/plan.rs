//! Builder ordering.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use cbi_core::errors::PlanError;
use cbi_core::Table;

use crate::builders::ReportBuilder;

/// Builders in an order where every builder runs after the writers of its
/// dependencies.
#[derive(Clone)]
pub struct ExecutionPlan {
    builders: Vec<Arc<dyn ReportBuilder>>,
}

/// One line of `ExecutionPlan::describe`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PlannedBuilder {
    pub name: &'static str,
    pub dependencies: Vec<&'static str>,
    pub outputs: Vec<&'static str>,
}

impl ExecutionPlan {
    /// Validate the builder set and order it topologically.
    ///
    /// Ties are broken by registration order.
    pub fn resolve(builders: Vec<Box<dyn ReportBuilder>>) -> Result<Self, PlanError> {
        let mut writers: BTreeMap<Table, usize> = BTreeMap::new();
        for (index, builder) in builders.iter().enumerate() {
            for &table in builder.outputs() {
                if table.is_source() {
                    return Err(PlanError::WritesSourceTable {
                        builder: builder.name().to_string(),
                        table: table.as_str().to_string(),
                    });
                }
                if let Some(&first) = writers.get(&table) {
                    return Err(PlanError::DuplicateWriter {
                        table: table.as_str().to_string(),
                        first: builders[first].name().to_string(),
                        second: builder.name().to_string(),
                    });
                }
                writers.insert(table, index);
            }
        }

        let mut in_degree = vec![0usize; builders.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); builders.len()];
        for (index, builder) in builders.iter().enumerate() {
            let mut upstream = BTreeSet::new();
            for &table in builder.dependencies() {
                if table.is_source() {
                    continue;
                }
                match writers.get(&table) {
                    Some(&writer) => {
                        upstream.insert(writer);
                    }
                    None => {
                        return Err(PlanError::UnknownDependency {
                            builder: builder.name().to_string(),
                            table: table.as_str().to_string(),
                        })
                    }
                }
            }
            in_degree[index] = upstream.len();
            for writer in upstream {
                dependents[writer].push(index);
            }
        }

        let mut ready: BTreeSet<usize> = (0..builders.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(builders.len());
        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &dependent in &dependents[next] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() < builders.len() {
            let placed: BTreeSet<usize> = order.iter().copied().collect();
            return Err(PlanError::Cycle {
                builders: builders
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !placed.contains(i))
                    .map(|(_, b)| b.name().to_string())
                    .collect(),
            });
        }

        let mut slots: Vec<Option<Arc<dyn ReportBuilder>>> =
            builders.into_iter().map(|b| Some(Arc::from(b))).collect();
        let builders = order
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect();
        Ok(Self { builders })
    }

    pub fn builders(&self) -> &[Arc<dyn ReportBuilder>] {
        &self.builders
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.builders.iter().map(|b| b.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    pub fn describe(&self) -> Vec<PlannedBuilder> {
        self.builders
            .iter()
            .map(|b| PlannedBuilder {
                name: b.name(),
                dependencies: b.dependencies().iter().map(|t| t.as_str()).collect(),
                outputs: b.outputs().iter().map(|t| t.as_str()).collect(),
            })
            .collect()
    }
}

impl std::fmt::Debug for ExecutionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionPlan")
            .field("builders", &self.names())
            .finish()
    }
}
