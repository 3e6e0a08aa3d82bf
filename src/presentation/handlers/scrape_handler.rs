// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::quote_request::{DeadJobsQueryDto, ScrapeAllRequestDto};
use crate::application::dto::quote_response::{JobResponseDto, TargetResponseDto};
use crate::application::use_cases::scrape_use_case::ScrapeUseCase;
use crate::presentation::errors::AppError;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const DEFAULT_DEAD_JOBS_LIMIT: u64 = 50;

pub async fn list_targets(
    Extension(use_case): Extension<Arc<ScrapeUseCase>>,
) -> Result<Json<Vec<TargetResponseDto>>, AppError> {
    let targets = use_case.list_targets().await?;
    Ok(Json(targets.iter().map(TargetResponseDto::from).collect()))
}

/// 入队一次全量抓取，请求体可省略
pub async fn scrape_all(
    Extension(use_case): Extension<Arc<ScrapeUseCase>>,
    payload: Option<Json<ScrapeAllRequestDto>>,
) -> Result<(StatusCode, Json<JobResponseDto>), AppError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let job = use_case.enqueue_all(request.force).await?;
    Ok((StatusCode::ACCEPTED, Json(JobResponseDto::from(&job))))
}

pub async fn scrape_target(
    Extension(use_case): Extension<Arc<ScrapeUseCase>>,
    Path(target_id): Path<Uuid>,
) -> Result<(StatusCode, Json<JobResponseDto>), AppError> {
    let job = use_case.enqueue_target(target_id).await?;
    Ok((StatusCode::ACCEPTED, Json(JobResponseDto::from(&job))))
}

/// 死信作业，最近变更的在前
pub async fn dead_jobs(
    Extension(use_case): Extension<Arc<ScrapeUseCase>>,
    Query(query): Query<DeadJobsQueryDto>,
) -> Result<Json<Vec<JobResponseDto>>, AppError> {
    query.validate()?;
    let jobs = use_case
        .dead_jobs(query.limit.unwrap_or(DEFAULT_DEAD_JOBS_LIMIT))
        .await?;
    Ok(Json(jobs.iter().map(JobResponseDto::from).collect()))
}
