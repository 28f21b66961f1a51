use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use petstore_core::Entity;
use petstore_infra::Versioned;
use petstore_pets::{Pet, PetChanges, PetId};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_pets).post(create_pet))
        .route("/:id", get(get_pet).put(update_pet).delete(delete_pet))
}

pub async fn list_pets(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.pets.list() {
        Ok(pets) => (StatusCode::OK, Json(pets)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_pet(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PetId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.pets.read(&id) {
        Ok(versioned) => tagged(StatusCode::OK, versioned),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_pet(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::PetCreateRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let pet = match Pet::create(PetId::generate(), body.name, Utc::now()) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.pets.create(pet) {
        Ok(versioned) => tagged(StatusCode::CREATED, versioned),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_pet(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<dto::PetUpdateRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let id: PetId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let changes = match PetChanges::new(body.name) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .pets
        .update(&id, &changes, dto::if_match(&headers), Utc::now())
    {
        Ok(versioned) => tagged(StatusCode::OK, versioned),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_pet(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PetId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.pets.delete(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Entity body plus its `ETag` header.
fn tagged(status: StatusCode, versioned: Versioned<Pet>) -> axum::response::Response {
    match dto::etag_header(&versioned.etag) {
        Ok(header) => (status, header, Json(versioned.entity)).into_response(),
        Err(e) => {
            tracing::error!(id = %versioned.entity.id(), "could not render entity tag");
            errors::domain_error_to_response(e)
        }
    }
}
