// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::TestContext;
use chrono::{Duration, Utc};
use quotrs::config::settings::ScheduleSettings;
use quotrs::domain::models::job::{
    CleanupOldDataPayload, EnrichDataPayload, JobStatus, JobType, Lane, ScrapeAllPayload,
    ScrapeQuotePayload, ScrapeTargetPayload,
};
use quotrs::domain::repositories::job_repository::{JobRepository, StuckReset};
use quotrs::queue::job_queue::QueueError;
use quotrs::queue::scheduler::RetryOutcome;
use uuid::Uuid;

#[tokio::test]
async fn test_job_types_land_in_their_lanes() {
    let ctx = TestContext::new().await;

    let quote = ctx
        .scheduler
        .enqueue(&ScrapeQuotePayload {
            quote_id: Uuid::new_v4(),
        })
        .await
        .unwrap();
    let target = ctx
        .scheduler
        .enqueue(&ScrapeTargetPayload {
            target_id: Uuid::new_v4(),
        })
        .await
        .unwrap();
    let enrich = ctx
        .scheduler
        .enqueue(&EnrichDataPayload {
            target_id: Uuid::new_v4(),
        })
        .await
        .unwrap();

    assert_eq!(quote.queue, Lane::Critical);
    assert_eq!(target.queue, Lane::Default);
    assert_eq!(enrich.queue, Lane::Low);
    assert_eq!(quote.max_attempts, 3);
}

#[tokio::test]
async fn test_low_lane_still_drains_when_alone() {
    let ctx = TestContext::new().await;
    let enrich = ctx
        .scheduler
        .enqueue(&EnrichDataPayload {
            target_id: Uuid::new_v4(),
        })
        .await
        .unwrap();

    let job = ctx.queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    assert_eq!(job.id, enrich.id);
    assert_eq!(job.status, JobStatus::Active);
    assert_eq!(job.attempt_count, 1);
    assert!(ctx.queue.dequeue(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delayed_job_waits_for_run_at() {
    let ctx = TestContext::new().await;
    ctx.scheduler
        .enqueue_in(&ScrapeAllPayload { force: false }, Duration::hours(1))
        .await
        .unwrap();

    assert!(ctx.queue.dequeue(Uuid::new_v4()).await.unwrap().is_none());
    assert!(ctx.queue.has_queued(JobType::ScrapeAll).await.unwrap());
}

#[tokio::test]
async fn test_out_of_range_delay_is_rejected() {
    let ctx = TestContext::new().await;
    let far = Duration::try_days(1_000_000_000).unwrap();

    let err = ctx
        .scheduler
        .enqueue_in(&ScrapeAllPayload { force: false }, far)
        .await
        .unwrap_err();
    assert!(matches!(err, QueueError::Schedule(_)));

    let schedule = ScheduleSettings {
        cleanup_every_hours: -5,
        ..Default::default()
    };
    let err = ctx.scheduler.schedule_periodic_jobs(&schedule).await.unwrap_err();
    assert!(matches!(err, QueueError::Schedule(_)));
    assert!(!ctx.queue.has_queued(JobType::ScrapeAll).await.unwrap());
}

#[tokio::test]
async fn test_retry_then_dead_letter() {
    let ctx = TestContext::with_max_attempts(2).await;
    ctx.scheduler
        .enqueue(&ScrapeTargetPayload {
            target_id: Uuid::new_v4(),
        })
        .await
        .unwrap();

    let job = ctx.queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    let outcome = ctx
        .scheduler
        .retry(job.clone(), "connection reset".to_string())
        .await
        .unwrap();
    let RetryOutcome::Requeued(run_at) = outcome else {
        panic!("first failure should be retried");
    };
    assert!(run_at > Utc::now());

    let stored = ctx.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Queued);
    assert_eq!(stored.last_error.as_deref(), Some("connection reset"));

    // Pretend the backoff elapsed
    let mut stored = stored;
    stored.run_at = (Utc::now() - Duration::seconds(1)).fixed_offset();
    ctx.jobs.update(&stored).await.unwrap();

    let job = ctx.queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    assert_eq!(job.attempt_count, 2);
    let outcome = ctx
        .scheduler
        .retry(job.clone(), "connection reset".to_string())
        .await
        .unwrap();
    assert_eq!(outcome, RetryOutcome::Buried);

    let dead = ctx.queue.list_dead(10).await.unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].id, job.id);
    assert!(ctx.queue.dequeue(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_periodic_jobs_are_not_duplicated_on_restart() {
    let ctx = TestContext::new().await;
    let schedule = ScheduleSettings::default();

    ctx.scheduler.schedule_periodic_jobs(&schedule).await.unwrap();
    ctx.scheduler.schedule_periodic_jobs(&schedule).await.unwrap();

    assert_eq!(ctx.jobs.count_queued(JobType::ScrapeAll).await.unwrap(), 1);
    assert_eq!(ctx.jobs.count_queued(JobType::CleanupOldData).await.unwrap(), 1);

    let cleanup = ctx
        .scheduler
        .schedule_next(&CleanupOldDataPayload { days_old: 30 }, Duration::hours(1))
        .await
        .unwrap();
    assert!(cleanup.is_none());
}

#[tokio::test]
async fn test_stuck_jobs_are_requeued() {
    let ctx = TestContext::new().await;
    ctx.scheduler
        .enqueue(&ScrapeTargetPayload {
            target_id: Uuid::new_v4(),
        })
        .await
        .unwrap();

    let mut job = ctx.queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    job.started_at = Some((Utc::now() - Duration::hours(2)).fixed_offset());
    ctx.jobs.update(&job).await.unwrap();

    let reset = ctx.queue.reset_stuck(Duration::minutes(30)).await.unwrap();
    assert_eq!(reset, StuckReset { requeued: 1, dead: 0 });

    let redelivered = ctx.queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    assert_eq!(redelivered.id, job.id);
    assert_eq!(redelivered.attempt_count, 2);
}

#[tokio::test]
async fn test_stuck_job_without_attempts_left_is_dead_lettered() {
    let ctx = TestContext::with_max_attempts(2).await;
    ctx.scheduler
        .enqueue(&ScrapeTargetPayload {
            target_id: Uuid::new_v4(),
        })
        .await
        .unwrap();

    // The worker hangs on every delivery
    for expected in [StuckReset { requeued: 1, dead: 0 }, StuckReset { requeued: 0, dead: 1 }] {
        let mut job = ctx.queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
        job.started_at = Some((Utc::now() - Duration::hours(2)).fixed_offset());
        ctx.jobs.update(&job).await.unwrap();

        let reset = ctx.queue.reset_stuck(Duration::minutes(30)).await.unwrap();
        assert_eq!(reset, expected);
    }

    assert!(ctx.queue.dequeue(Uuid::new_v4()).await.unwrap().is_none());
    let dead = ctx.queue.list_dead(10).await.unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].attempt_count, 2);
    assert!(dead[0]
        .last_error
        .as_deref()
        .unwrap()
        .contains("did not finish"));

    // A fresh active job is left alone
    ctx.scheduler
        .enqueue(&ScrapeTargetPayload {
            target_id: Uuid::new_v4(),
        })
        .await
        .unwrap();
    ctx.queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    let reset = ctx.queue.reset_stuck(Duration::minutes(30)).await.unwrap();
    assert_eq!(reset, StuckReset::default());
}
