// SPDX-License-Identifier: Apache-2.0

//! Parameter bindings grouped by the clause that produced them.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::value::Value;

/// Clause group a bound parameter belongs to.
///
/// Groups are ordered the way their placeholders appear in rendered SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
    Select,
    From,
    Where,
    Order,
    Union,
}

/// Bound parameter values collected from a query tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Bindings {
    groups: BTreeMap<BindingKind, Vec<Value>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: BindingKind, value: Value) {
        self.groups.entry(kind).or_default().push(value);
    }

    pub fn extend(&mut self, kind: BindingKind, values: impl IntoIterator<Item = Value>) {
        let group = self.groups.entry(kind).or_default();
        group.extend(values);
    }

    /// Replaces a whole group, dropping it when `values` is empty.
    pub fn set(&mut self, kind: BindingKind, values: Vec<Value>) {
        if values.is_empty() {
            self.groups.remove(&kind);
        } else {
            self.groups.insert(kind, values);
        }
    }

    pub fn get(&self, kind: BindingKind) -> &[Value] {
        self.groups.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (BindingKind, &[Value])> {
        self.groups
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(kind, values)| (*kind, values.as_slice()))
    }

    /// All values in placeholder order.
    pub fn flatten(&self) -> Vec<Value> {
        self.groups.values().flatten().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
