use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::repository::TrainRepository;
use crate::search::TrainQuery;
use crate::train::Train;
use crate::{CoreError, CoreResult};

/// Read side of the train table.
#[derive(Clone)]
pub struct TrainCatalog {
    trains: Arc<dyn TrainRepository>,
}

impl TrainCatalog {
    pub fn new(trains: Arc<dyn TrainRepository>) -> Self {
        Self { trains }
    }

    pub async fn search(&self, query: &TrainQuery) -> CoreResult<Vec<Train>> {
        let trains = self.trains.find_trains(query).await.map_err(|e| {
            warn!("Train search failed: {}", e);
            e
        })?;
        debug!(
            "Train search from={:?} to={:?} returned {} trains",
            query.from_fragment(),
            query.to_fragment(),
            trains.len()
        );
        Ok(trains)
    }

    pub async fn get(&self, train_id: Uuid) -> CoreResult<Train> {
        self.trains
            .find_train(train_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Train {} not found", train_id)))
    }
}
