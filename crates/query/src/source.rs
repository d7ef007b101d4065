//! Average speed sources

use config_loader::MongoCredentials;
use contracts::{ContractError, JoinConfig, QueryMode};
use dispatcher::mongo_client;
use mongodb::bson::{doc, Bson, Document};
use mongodb::Collection;
use tracing::{debug, instrument};

use crate::window::{average_pipeline, average_speed, selection_stages, QueryWindow};

/// Something that can average `drivingspeed` over a window
#[trait_variant::make(SpeedSource: Send)]
pub trait LocalSpeedSource {
    /// Collection name (used for logging/metrics)
    fn collection(&self) -> &str;

    /// Average speed in the window; 0.0 when no document matches
    async fn average_speed(&self, window: &QueryWindow) -> Result<f64, ContractError>;
}

/// Aggregation against a MongoDB collection
pub struct MongoSpeedSource {
    collection: Collection<Document>,
    mode: QueryMode,
    join: Option<JoinConfig>,
}

impl MongoSpeedSource {
    pub async fn connect(
        credentials: &MongoCredentials,
        collection: &str,
        mode: QueryMode,
        join: Option<JoinConfig>,
    ) -> Result<Self, ContractError> {
        let client = mongo_client(credentials, "agri-loadgen-query")
            .await
            .map_err(|e| ContractError::query(collection, e.to_string()))?;
        Ok(Self {
            collection: client
                .database(&credentials.database)
                .collection::<Document>(collection),
            mode,
            join,
        })
    }

    async fn server_average(&self, window: &QueryWindow) -> mongodb::error::Result<f64> {
        let pipeline = average_pipeline(window, self.join.as_ref());
        let mut cursor = self.collection.aggregate(pipeline).await?;
        let group = if cursor.advance().await? {
            Some(cursor.deserialize_current()?)
        } else {
            None
        };
        Ok(group_average(group.as_ref()))
    }

    async fn client_average(&self, window: &QueryWindow) -> mongodb::error::Result<f64> {
        let projection = doc! { "_id": 0, "drivingspeed": 1 };
        let mut cursor = match &self.join {
            Some(join) => {
                let mut stages = selection_stages(window, Some(join));
                stages.push(doc! { "$project": projection });
                self.collection.aggregate(stages).await?
            }
            None => {
                self.collection
                    .find(window.filter_document())
                    .projection(projection)
                    .await?
            }
        };

        let mut speeds = Vec::new();
        while cursor.advance().await? {
            let document = cursor.deserialize_current()?;
            if let Some(speed) = document.get("drivingspeed").and_then(numeric) {
                speeds.push(speed);
            }
        }
        debug!(documents = speeds.len(), "Fetched window documents");
        Ok(average_speed(&speeds))
    }
}

impl SpeedSource for MongoSpeedSource {
    fn collection(&self) -> &str {
        self.collection.name()
    }

    #[instrument(
        name = "mongo_average_speed",
        skip(self, window),
        fields(collection = %self.collection.name(), mode = ?self.mode)
    )]
    async fn average_speed(&self, window: &QueryWindow) -> Result<f64, ContractError> {
        let result = match self.mode {
            QueryMode::Aggregate => self.server_average(window).await,
            QueryMode::Client => self.client_average(window).await,
        };
        result.map_err(|e| ContractError::query(self.collection.name(), e.to_string()))
    }
}

/// `$group` 结果转平均值；空窗口没有结果文档，`$avg` 无数值时为 null
fn group_average(group: Option<&Document>) -> f64 {
    group
        .and_then(|doc| doc.get("avg_speed"))
        .and_then(numeric)
        .unwrap_or(0.0)
}

fn numeric(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(v) => Some(*v),
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        _ => None,
    }
}
