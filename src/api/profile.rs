use axum::extract::State;
use axum::Json;

use crate::models::Profile;
use crate::state::AppState;

/// GET /api/profile - the profile rendered on the landing page.
pub async fn get_profile(State(state): State<AppState>) -> Json<Profile> {
    Json(state.profile.as_ref().clone())
}
