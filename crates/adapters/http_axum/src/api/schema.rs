//! Characteristic schema endpoint.

use axum::Json;

use occupancy_timer_domain::characteristic::{self, Characteristic};

/// `GET /api/schema` — every characteristic an accessory may expose.
pub async fn get() -> Json<&'static [Characteristic]> {
    Json(&characteristic::ALL)
}
