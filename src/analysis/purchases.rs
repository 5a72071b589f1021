use std::collections::HashMap;

use crate::api::models::PurchaseDto;

use super::items::is_excluded;

#[derive(Debug, Clone, PartialEq)]
pub struct ItemTiming {
    pub item_key: String,
    pub average_time_seconds: f64,
}

/// Accumulates purchase timestamps per item across sampled matches.
#[derive(Debug, Default)]
pub struct PurchaseTracker {
    // first-seen order, used to keep equal averages deterministic
    order: Vec<String>,
    times: HashMap<String, Vec<f64>>,
}

impl PurchaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one purchase; recipes and teleport scrolls are ignored.
    pub fn add_purchase(&mut self, item_key: &str, time_seconds: f64) {
        if is_excluded(item_key) {
            return;
        }
        match self.times.get_mut(item_key) {
            Some(times) => times.push(time_seconds),
            None => {
                self.order.push(item_key.to_string());
                self.times.insert(item_key.to_string(), vec![time_seconds]);
            }
        }
    }

    pub fn add_log(&mut self, log: &[PurchaseDto]) {
        for event in log {
            self.add_purchase(&event.key, event.time);
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Mean purchase time per item, ascending by time.
    pub fn timings(&self) -> Vec<ItemTiming> {
        let mut timings: Vec<ItemTiming> = self
            .order
            .iter()
            .filter_map(|key| {
                let times = self.times.get(key)?;
                if times.is_empty() {
                    return None;
                }
                Some(ItemTiming {
                    item_key: key.clone(),
                    average_time_seconds: times.iter().sum::<f64>() / times.len() as f64,
                })
            })
            .collect();

        timings.sort_by(|a, b| a.average_time_seconds.total_cmp(&b.average_time_seconds));
        timings
    }
}
