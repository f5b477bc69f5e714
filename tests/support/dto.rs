use std::collections::HashSet;
use std::ops::RangeInclusive;

use docset::SetEntry;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, SetEntry)]
pub struct Dto {
    #[set_entry(id)]
    pub id: String,
    pub value: String,
}

impl Dto {
    pub fn new(id: &str, value: &str) -> Self {
        Self {
            id: id.to_string(),
            value: value.to_string(),
        }
    }
}

/// `Dto("id_i", "value_i")` for every `i` in `range`.
pub fn dtos(range: RangeInclusive<u32>) -> HashSet<Dto> {
    range
        .map(|i| Dto::new(&format!("id_{}", i), &format!("value_{}", i)))
        .collect()
}
