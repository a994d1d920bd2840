use crate::stats::StatTuple;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct SaveHostsRequest {
    #[serde(default)]
    pub hosts: String,
}

pub(super) type StatsResult = BTreeMap<String, u64>;

pub(super) fn stats_result(snapshot: Vec<StatTuple>) -> StatsResult {
    snapshot.into_iter().map(|t| (t.key, t.value)).collect()
}
