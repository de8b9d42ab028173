//! SeaORM-backed station table

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;

use crate::entities::{prelude::Stations, stations};
use crate::errors::RepositoryResult;
use crate::models::Station;
use crate::stations::StationDirectory;

pub struct StationSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl StationSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Insert or rename the station with `station.code`
    pub async fn upsert(&self, station: &Station) -> RepositoryResult<()> {
        let active_model = stations::ActiveModel {
            code: Set(station.code.clone()),
            name: Set(station.name.clone()),
        };

        Stations::insert(active_model)
            .on_conflict(
                OnConflict::column(stations::Column::Code)
                    .update_column(stations::Column::Name)
                    .to_owned(),
            )
            .exec(&*self.connection)
            .await?;
        Ok(())
    }

    pub async fn list(&self) -> RepositoryResult<Vec<Station>> {
        let models = Stations::find()
            .order_by_asc(stations::Column::Code)
            .all(&*self.connection)
            .await?;
        Ok(models
            .into_iter()
            .map(|m| Station::new(m.name, m.code))
            .collect())
    }
}

#[async_trait]
impl StationDirectory for StationSeaOrmRepository {
    async fn code_for_name(&self, name: &str) -> RepositoryResult<Option<String>> {
        let model = Stations::find()
            .filter(stations::Column::Name.eq(name.trim()))
            .one(&*self.connection)
            .await?;
        Ok(model.map(|m| m.code))
    }

    async fn name_for_code(&self, code: &str) -> RepositoryResult<Option<String>> {
        let model = Stations::find_by_id(code.trim().to_string())
            .one(&*self.connection)
            .await?;
        Ok(model.map(|m| m.name))
    }
}
