// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

use lazy_static::lazy_static;
use prometheus::*;

lazy_static! {
    pub static ref FILTER_COUNTER_VEC: IntCounterVec = register_int_counter_vec!(
        "pd_schedule_filter",
        "Total number of stores rejected by scheduling filters.",
        &["action", "store", "type"]
    )
    .unwrap();
}
