// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::quote_request::CreateQuoteRequestDto;
use crate::application::dto::quote_response::{
    OfferListResponseDto, OfferResponseDto, PolicyResponseDto, QuoteResponseDto,
};
use crate::application::use_cases::quote_workflow::QuoteWorkflow;
use crate::presentation::errors::AppError;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

/// 创建报价请求，抓取作业异步执行
pub async fn create_quote(
    Extension(workflow): Extension<Arc<QuoteWorkflow>>,
    Json(payload): Json<CreateQuoteRequestDto>,
) -> Result<(StatusCode, Json<QuoteResponseDto>), AppError> {
    let quote = workflow.create_quote(payload).await?;
    Ok((StatusCode::ACCEPTED, Json(QuoteResponseDto::from(&quote))))
}

/// 报价列表，最便宜的在前
pub async fn list_offers(
    Extension(workflow): Extension<Arc<QuoteWorkflow>>,
    Path(quote_id): Path<Uuid>,
) -> Result<Json<OfferListResponseDto>, AppError> {
    let (quote, offers) = workflow.list_offers(quote_id).await?;
    Ok(Json(OfferListResponseDto {
        quote_id: quote.id,
        status: quote.status.to_string(),
        offers: offers.iter().map(OfferResponseDto::from).collect(),
    }))
}

pub async fn approve_offer(
    Extension(workflow): Extension<Arc<QuoteWorkflow>>,
    Path((quote_id, offer_id)): Path<(Uuid, Uuid)>,
) -> Result<(StatusCode, Json<PolicyResponseDto>), AppError> {
    let policy = workflow.approve(quote_id, offer_id).await?;
    Ok((StatusCode::CREATED, Json(PolicyResponseDto::from(&policy))))
}
