//! Trailing time window and the aggregation pipeline built from it

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use contracts::JoinConfig;
use mongodb::bson::{doc, Document};

/// `[now - minutes, now]`, optionally restricted to one vehicle
///
/// The upper bound is implicit; only `ts >= lower_bound` is filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWindow {
    pub lower_bound: DateTime<Utc>,
    pub vehicle_id: Option<i32>,
}

impl QueryWindow {
    pub fn trailing(now: DateTime<Utc>, minutes: u32, vehicle_id: Option<i32>) -> Self {
        Self {
            lower_bound: now - Duration::minutes(i64::from(minutes)),
            vehicle_id,
        }
    }

    /// Lower bound in the same textual form as record timestamps
    ///
    /// Records store `ts` as fixed-width RFC 3339 strings, so string
    /// comparison orders them chronologically.
    pub fn lower_bound_text(&self) -> String {
        self.lower_bound
            .to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// `$match` filter for this window
    pub fn filter_document(&self) -> Document {
        let mut filter = doc! { "ts": { "$gte": self.lower_bound_text() } };
        if let Some(vehicle_id) = self.vehicle_id {
            filter.insert("vehicleid", vehicle_id);
        }
        filter
    }
}

/// Stages selecting the window's documents, joined when configured
pub fn selection_stages(window: &QueryWindow, join: Option<&JoinConfig>) -> Vec<Document> {
    let mut stages = vec![doc! { "$match": window.filter_document() }];
    if let Some(join) = join {
        stages.push(doc! {
            "$lookup": {
                "from": join.collection.as_str(),
                "localField": join.local_field.as_str(),
                "foreignField": join.foreign_field.as_str(),
                "as": join.as_field.as_str(),
            }
        });
        // inner-join semantics: drop rows without a counterpart
        let mut matched = Document::new();
        matched.insert(join.as_field.clone(), doc! { "$ne": [] });
        stages.push(doc! { "$match": matched });
    }
    stages
}

/// Server-side average pipeline
pub fn average_pipeline(window: &QueryWindow, join: Option<&JoinConfig>) -> Vec<Document> {
    let mut stages = selection_stages(window, join);
    stages.push(doc! {
        "$group": {
            "_id": null,
            "avg_speed": { "$avg": "$drivingspeed" },
        }
    });
    stages
}

/// Arithmetic mean, 0.0 for no samples
pub fn average_speed(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}
