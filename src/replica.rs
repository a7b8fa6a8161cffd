// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

use crate::store::StoreInfo;

const REPLICA_BASE_SCORE: f64 = 100.0;

/// Scores how distinct `other`'s location is from `stores` over an ordered
/// label hierarchy. Earlier labels dominate: each level carries a weight of
/// `100^(levels below it)`, and within a level the contribution shrinks as
/// more stores share the candidate's value there. `other` itself is skipped
/// when it appears in `stores`; a store missing a label contributes nothing
/// at that level.
///
/// Higher is better. The score is deterministic and strictly decreases when
/// one more store moves into the candidate's location at any level.
pub fn distinct_score(labels: &[String], stores: &[StoreInfo], other: &StoreInfo) -> f64 {
    let mut score = 0.0;
    for (level, label) in labels.iter().enumerate() {
        let weight = REPLICA_BASE_SCORE.powi((labels.len() - level - 1) as i32);
        let value = other.get_label_value(label);
        if value.is_empty() {
            continue;
        }
        let sharing = stores
            .iter()
            .filter(|s| s.id() != other.id() && s.get_label_value(label) == value)
            .count();
        score += weight / (1.0 + sharing as f64);
    }
    score
}
