use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::ItemId;

/// Single `key <comparison> value` gate on a transport, e.g. `woodcutting >= 12`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub key: String,
    pub comparison: String,
    pub value: String,
}

impl Requirement {
    pub fn new(key: &str, comparison: &str, value: &str) -> Self {
        Self { key: key.to_string(), comparison: comparison.to_string(), value: value.to_string() }
    }
}

/// What the agent currently carries and has unlocked.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentProfile {
    /// Carried or worn item ids.
    pub items: BTreeSet<ItemId>,
    /// Skill levels, quest states, diary flags and similar.
    pub values: HashMap<String, Value>,
}

impl AgentProfile {
    pub fn with_items<I: IntoIterator<Item = ItemId>>(items: I) -> Self {
        Self { items: items.into_iter().collect(), values: HashMap::new() }
    }

    pub fn set(&mut self, key: &str, value: Value) -> &mut Self {
        self.values.insert(key.to_string(), value);
        self
    }

    pub fn has_any_item_set(&self, sets: &[BTreeSet<ItemId>]) -> bool {
        sets.is_empty() || sets.iter().any(|set| set.iter().all(|id| self.items.contains(id)))
    }

    /// Union of both profiles, used for "after visiting the bank" planning.
    pub fn merged(&self, other: &AgentProfile) -> AgentProfile {
        let mut out = self.clone();
        out.items.extend(other.items.iter().copied());
        for (k, v) in &other.values {
            out.values.entry(k.clone()).or_insert_with(|| v.clone());
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct RequirementEvaluator<'a> {
    profile: &'a AgentProfile,
}

impl<'a> RequirementEvaluator<'a> {
    pub fn new(profile: &'a AgentProfile) -> Self {
        Self { profile }
    }

    pub fn satisfies_all(&self, reqs: &[Requirement]) -> bool {
        reqs.iter().all(|r| self.satisfies_one(r))
    }

    fn satisfies_one(&self, r: &Requirement) -> bool {
        let key = r.key.trim();
        let op = r.comparison.trim();
        if key.is_empty() || op.is_empty() {
            return false;
        }
        let Some(have) = self.profile.values.get(key) else { return false };
        eval(have, &r.value, op)
    }
}

fn eval(lhs: &Value, rhs_str: &str, op: &str) -> bool {
    match op {
        "==" | "=" => eq(lhs, rhs_str),
        "!=" => !eq(lhs, rhs_str) && value_to_scalar_string(lhs).is_some(),
        ">=" => cmp_rel(lhs, rhs_str, |a, b| a >= b),
        ">" => cmp_rel(lhs, rhs_str, |a, b| a > b),
        "<=" => cmp_rel(lhs, rhs_str, |a, b| a <= b),
        "<" => cmp_rel(lhs, rhs_str, |a, b| a < b),
        _ => false,
    }
}

fn eq(lhs: &Value, rhs_str: &str) -> bool {
    if let (Some(a), Some(b)) = (value_to_f64(lhs), parse_str_to_f64(rhs_str)) {
        return a == b;
    }
    match value_to_scalar_string(lhs) {
        Some(ls) => ls.eq_ignore_ascii_case(rhs_str.trim()),
        None => false,
    }
}

fn cmp_rel<F: Fn(f64, f64) -> bool>(lhs: &Value, rhs_str: &str, f: F) -> bool {
    match (value_to_f64(lhs), parse_str_to_f64(rhs_str)) {
        (Some(a), Some(b)) => f(a, b),
        _ => false,
    }
}

fn value_to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_str_to_f64(s),
        _ => None,
    }
}

fn parse_str_to_f64(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok()
}

fn value_to_scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile() -> AgentProfile {
        let mut p = AgentProfile::with_items([772, 995]);
        p.set("woodcutting", json!(45)).set("quest:fairytale_ii", json!("started")).set("members", json!(true));
        p
    }

    #[test]
    fn numeric_relations() {
        let p = profile();
        let ev = RequirementEvaluator::new(&p);
        assert!(ev.satisfies_all(&[Requirement::new("woodcutting", ">=", "42")]));
        assert!(!ev.satisfies_all(&[Requirement::new("woodcutting", ">=", "57")]));
        assert!(ev.satisfies_all(&[Requirement::new("woodcutting", "<", "57")]));
        assert!(ev.satisfies_all(&[Requirement::new("woodcutting", " == ", " 45 ")]));
    }

    #[test]
    fn string_and_bool_equality() {
        let p = profile();
        let ev = RequirementEvaluator::new(&p);
        assert!(ev.satisfies_all(&[Requirement::new("quest:fairytale_ii", "==", "STARTED")]));
        assert!(ev.satisfies_all(&[Requirement::new("quest:fairytale_ii", "!=", "finished")]));
        assert!(ev.satisfies_all(&[Requirement::new("members", "=", "true")]));
    }

    #[test]
    fn missing_key_or_bad_operator_fails() {
        let p = profile();
        let ev = RequirementEvaluator::new(&p);
        assert!(!ev.satisfies_all(&[Requirement::new("agility", ">=", "1")]));
        assert!(!ev.satisfies_all(&[Requirement::new("woodcutting", "??", "1")]));
        assert!(!ev.satisfies_all(&[Requirement::new("quest:fairytale_ii", ">", "1")]));
        assert!(ev.satisfies_all(&[]));
    }

    #[test]
    fn item_sets_any_one_suffices() {
        let p = profile();
        let staff: BTreeSet<ItemId> = [772].into_iter().collect();
        let lunar: BTreeSet<ItemId> = [9084].into_iter().collect();
        assert!(p.has_any_item_set(&[lunar.clone(), staff]));
        assert!(!p.has_any_item_set(&[lunar]));
        assert!(p.has_any_item_set(&[]));
    }

    #[test]
    fn merged_profile_unions_items() {
        let carried = AgentProfile::with_items([1]);
        let bank = AgentProfile::with_items([2, 3]);
        let m = carried.merged(&bank);
        assert_eq!(m.items.len(), 3);
    }
}
