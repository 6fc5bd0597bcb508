// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Procurement handlers for signed-in users.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tender_core::ProcurementId;

use super::{parse_fz_number, parse_id};
use crate::dto::{parse_date, ProcurementDto};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, Paging, ValidatedJson};
use crate::state::AppState;

/// Filters for the list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListFilter {
    /// Comma-separated id list, e.g. `ids=1,2,3`.
    pub ids: Option<String>,
}

impl ListFilter {
    /// Parses the id list, `None` when no filter was given.
    pub fn parse_ids(&self) -> ApiResult<Option<Vec<ProcurementId>>> {
        let Some(raw) = self.ids.as_deref() else {
            return Ok(None);
        };

        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(parse_id)
            .collect::<ApiResult<Vec<_>>>()
            .map(Some)
    }
}

/// GET /api/v1/procurements
///
/// Paged list in id order; `?ids=` restricts it to the given ids.
pub async fn list_procurements(
    State(state): State<AppState>,
    Paging(page): Paging,
    Query(filter): Query<ListFilter>,
) -> ApiResult<impl IntoResponse> {
    let result = match filter.parse_ids()? {
        Some(ids) => state.procurements().load_by_id_list(&ids, page).await?,
        None => state.procurements().load_all(page).await?,
    };
    Ok(Json(result))
}

/// GET /api/v1/procurements/{id}
pub async fn get_procurement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let record = state.procurements().load_by_id(Some(id)).await?;
    Ok(Json(record))
}

/// GET /api/v1/procurements/fz/{fz_number}
pub async fn list_by_fz_number(
    State(state): State<AppState>,
    Path(fz_number): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let fz_number = parse_fz_number(&fz_number)?;
    let records = state.procurements().load_list_by_fz_number(fz_number).await?;
    Ok(Json(records))
}

/// GET /api/v1/procurements/created-before/{date}
///
/// Records created strictly before the start of `date` (UTC).
pub async fn list_created_before(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Paging(page): Paging,
) -> ApiResult<impl IntoResponse> {
    let date = parse_date(date.trim()).map_err(ApiError::bad_request)?;
    let result = state
        .procurements()
        .load_created_before_date(date, page)
        .await?;
    Ok(Json(result))
}

/// POST /api/v1/procurements
pub async fn create_procurement(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ValidatedJson(dto): ValidatedJson<ProcurementDto>,
) -> ApiResult<impl IntoResponse> {
    let record = dto.into_procurement()?;
    let saved = state.procurements().save(record).await?;

    tracing::debug!(user = %ctx.user_id, id = ?saved.id, "Created by user");
    Ok((StatusCode::CREATED, Json(saved)))
}

/// PUT /api/v1/procurements/{id}
///
/// Replaces every field of an existing record; the creation instant is kept.
pub async fn replace_procurement(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<ProcurementDto>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let record = dto.into_procurement()?.with_id(id);
    let saved = state.procurements().save(record).await?;

    tracing::debug!(user = %ctx.user_id, id = %id, "Replaced by user");
    Ok(Json(saved))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids() {
        let filter = ListFilter {
            ids: Some("3, 1,,2".into()),
        };
        let ids = filter.parse_ids().unwrap().unwrap();
        assert_eq!(
            ids,
            vec![ProcurementId::new(3), ProcurementId::new(1), ProcurementId::new(2)]
        );

        assert!(ListFilter::default().parse_ids().unwrap().is_none());
        assert_eq!(
            ListFilter { ids: Some(String::new()) }.parse_ids().unwrap(),
            Some(vec![])
        );
        assert!(ListFilter { ids: Some("1,x".into()) }.parse_ids().is_err());
    }
}
