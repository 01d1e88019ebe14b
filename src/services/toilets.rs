//! Toilet service: CRUD, nearby search and the delete cascade.
//!
//! Lists are returned as lazy streams. The database hit list is computed
//! up front, each DTO (with its aggregated rating) is assembled only when
//! the consumer polls for it.

use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ToiletConfig;
use crate::error::{AppError, Result};
use crate::models::{
    CreateToiletRequest, Distance, GeoPoint, NearbyQuery, RatingSummary, Toilet, ToiletResponse,
    UpdateToiletRequest,
};
use crate::services::{DatabaseService, StorageService};

#[derive(Debug, Clone)]
pub struct ToiletService {
    db: Arc<DatabaseService>,
    storage: Arc<StorageService>,
    config: ToiletConfig,
    base_url: Arc<str>,
}

impl ToiletService {
    pub fn new(
        db: Arc<DatabaseService>,
        storage: Arc<StorageService>,
        config: &ToiletConfig,
        base_url: &str,
    ) -> Self {
        Self {
            db,
            storage,
            config: config.clone(),
            base_url: Arc::from(base_url),
        }
    }

    /// Persist a new toilet; the DTO carries a zero rating
    pub fn create(&self, request: CreateToiletRequest) -> Result<ToiletResponse> {
        let toilet = Toilet::new(request)?;
        self.db.insert_toilet(&toilet)?;

        info!(id = %toilet.id, title = %toilet.title, "Created toilet");
        Ok(ToiletResponse::assemble(
            &toilet,
            RatingSummary::default(),
            &self.base_url,
            None,
        ))
    }

    /// Load the stored document or signal "not found"
    pub fn find(&self, id: Uuid) -> Result<Toilet> {
        self.db.get_toilet(id)?.ok_or(AppError::ToiletNotFound(id))
    }

    pub fn get(&self, id: Uuid) -> Result<ToiletResponse> {
        let toilet = self.find(id)?;
        self.assemble(&toilet, None)
    }

    pub fn update(&self, id: Uuid, request: UpdateToiletRequest) -> Result<ToiletResponse> {
        let toilet = self.db.update_toilet(id, |t| t.apply(request))?;

        info!(id = %id, "Updated toilet");
        self.assemble(&toilet, None)
    }

    /// Moderation switch used by the admin API
    pub fn set_approval(&self, id: Uuid, approved: bool) -> Result<ToiletResponse> {
        let toilet = self.db.update_toilet(id, |t| {
            t.approved = approved;
            t.updated_at = chrono::Utc::now();
            Ok(())
        })?;

        info!(id = %id, approved, "Changed toilet approval");
        self.assemble(&toilet, None)
    }

    /// Toilets awaiting approval
    pub fn pending(&self) -> Result<Vec<ToiletResponse>> {
        self.db
            .pending_toilets()?
            .iter()
            .map(|t| self.assemble(t, None))
            .collect()
    }

    /// Nearby search when a position is given, otherwise the newest toilets.
    ///
    /// Results come ordered by ascending distance and carry their distance
    /// in meters.
    pub fn search(
        &self,
        query: &NearbyQuery,
    ) -> Result<impl Stream<Item = Result<ToiletResponse>> + Send + 'static> {
        let limit = self.config.result_limit(query.max_toilets_to_load);

        let hits = match (query.lon, query.lat) {
            (Some(lon), Some(lat)) => {
                let center = GeoPoint::new(lon, lat)?;
                let radius = self.radius(query)?;
                self.get_nearby(center, radius, limit)?
                    .into_iter()
                    .map(|(toilet, distance)| (toilet, Some(distance)))
                    .collect()
            }
            (None, None) => self
                .db
                .list_toilets(limit)?
                .into_iter()
                .map(|toilet| (toilet, None))
                .collect(),
            _ => {
                return Err(AppError::validation(
                    "lon and lat must be given together",
                ))
            }
        };

        Ok(self.into_stream(hits))
    }

    /// Delegate to the database near-query, converting the radius to meters
    pub fn get_nearby(
        &self,
        center: GeoPoint,
        radius: Distance,
        max_count: usize,
    ) -> Result<Vec<(Toilet, f64)>> {
        self.db.find_toilets_near(
            center,
            radius.to_meters(),
            max_count,
            self.config.nearby_only_approved,
        )
    }

    fn radius(&self, query: &NearbyQuery) -> Result<Distance> {
        match (query.radius_in_km, query.radius_in_miles) {
            (Some(_), Some(_)) => Err(AppError::validation(
                "use either radiusInKm or radiusInMiles, not both",
            )),
            (Some(km), None) => Distance::kilometers(km),
            (None, Some(miles)) => Distance::miles(miles),
            (None, None) => Distance::kilometers(self.config.default_radius_km),
        }
    }

    fn into_stream(
        &self,
        hits: Vec<(Toilet, Option<f64>)>,
    ) -> impl Stream<Item = Result<ToiletResponse>> + Send + 'static {
        let db = Arc::clone(&self.db);
        let base_url = Arc::clone(&self.base_url);

        stream::iter(hits).map(move |(toilet, distance)| {
            let rating = db.rating_summary(toilet.id)?;
            Ok(ToiletResponse::assemble(&toilet, rating, &base_url, distance))
        })
    }

    fn assemble(&self, toilet: &Toilet, distance: Option<f64>) -> Result<ToiletResponse> {
        let rating = self.db.rating_summary(toilet.id)?;
        Ok(ToiletResponse::assemble(
            toilet,
            rating,
            &self.base_url,
            distance,
        ))
    }

    /// Delete a toilet with its comments, ratings and images.
    ///
    /// Database records go in one batch; blob files are removed afterwards
    /// and a failure there only leaves an orphaned file behind.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let (toilet, images) = self.db.delete_toilet_cascade(id)?;

        for meta in &images {
            if let Err(e) = self.storage.delete(meta.id, meta.extension()).await {
                warn!(toilet_id = %id, image_id = %meta.id, error = %e, "Failed to delete image blob");
            }
        }

        info!(id = %id, title = %toilet.title, images = images.len(), "Deleted toilet");
        Ok(())
    }
}
