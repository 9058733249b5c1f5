//! Rule Evaluator

use crate::{RuleCatalog, RuleDefinition};
use sensor_facts::FactSet;

/// Match a fact set against every rule, returning the triggered rules in
/// catalog order. Rules are independent; none inhibits another.
pub fn evaluate<'c>(facts: &FactSet, catalog: &'c RuleCatalog) -> Vec<&'c RuleDefinition> {
    catalog.iter().filter(|rule| rule.matches(facts)).collect()
}
