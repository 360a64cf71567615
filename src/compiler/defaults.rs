//! Priority merge of default-value tiers

use crate::model::Defaults;

/// Merge tiers given in ascending priority
///
/// Absent and empty tiers contribute nothing. On a key collision the later
/// tier wins; nested values are replaced whole, never merged.
pub fn merge<'a, I>(tiers: I) -> Defaults
where
    I: IntoIterator<Item = Option<&'a Defaults>>,
{
    let mut merged = Defaults::new();
    for tier in tiers.into_iter().flatten() {
        for (key, value) in tier {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn defaults(pairs: &[(&str, Value)]) -> Defaults {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_merge_priority() {
        let a = defaults(&[("x", json!("a")), ("y", json!("a")), ("z", json!("a"))]);
        let b = defaults(&[("y", json!("b")), ("z", json!("b"))]);
        let c = defaults(&[("z", json!("c"))]);

        let merged = merge([Some(&a), Some(&b), Some(&c)]);
        assert_eq!(merged["x"], json!("a"));
        assert_eq!(merged["y"], json!("b"));
        assert_eq!(merged["z"], json!("c"));
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_merge_all_absent_or_empty() {
        assert!(merge([None, None]).is_empty());
        let empty = Defaults::new();
        assert!(merge([Some(&empty), None, Some(&empty)]).is_empty());
        assert!(merge(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_merge_skips_absent_tiers() {
        let block = defaults(&[("language", json!("JavaScript"))]);
        let merged = merge([None, Some(&block), None]);
        assert_eq!(merged["language"], json!("JavaScript"));
    }

    #[test]
    fn test_merge_is_shallow() {
        let low = defaults(&[("style", json!({"tone": "gentle", "length": "short"}))]);
        let high = defaults(&[("style", json!({"tone": "strict"}))]);

        let merged = merge([Some(&low), Some(&high)]);
        assert_eq!(merged["style"], json!({"tone": "strict"}));
    }
}
