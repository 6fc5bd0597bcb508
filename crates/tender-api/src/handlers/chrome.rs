// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Browser extension endpoints.
//!
//! The extension scrapes procurement pages and does not know storage ids, so
//! it addresses records by `(uin, fz_number)`.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use super::parse_fz_number;
use crate::dto::ProcurementDto;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, ValidatedJson};
use crate::state::AppState;

/// POST /v1/chrome/procurements
///
/// Inserts the record, or replaces the one sharing its business key.
pub async fn upsert_procurement(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ValidatedJson(dto): ValidatedJson<ProcurementDto>,
) -> ApiResult<impl IntoResponse> {
    let record = dto.into_procurement()?;
    let saved = state.procurements().save_by_business_key(record).await?;

    tracing::debug!(
        user = %ctx.user_id,
        id = ?saved.id,
        uin = %saved.uin,
        fz_number = saved.fz_number,
        "Upserted from extension"
    );
    Ok(Json(saved))
}

/// GET /v1/chrome/procurements/{fz_number}/{uin}
pub async fn lookup_procurement(
    State(state): State<AppState>,
    Path((fz_number, uin)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let fz_number = parse_fz_number(&fz_number)?;
    let uin = uin.trim();
    if uin.is_empty() {
        return Err(ApiError::bad_request("UIN must not be blank"));
    }

    let record = state
        .procurements()
        .load_by_business_key(uin, fz_number)
        .await?;
    Ok(Json(record))
}
