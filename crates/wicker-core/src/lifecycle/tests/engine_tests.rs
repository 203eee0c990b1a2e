use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::lifecycle::engine::SharedStageEngine;
use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::{LifecycleStage, StageCallback};

fn recording_callback(recorder: Arc<StdMutex<Vec<i64>>>, value: i64) -> StageCallback {
    Box::new(move || {
        Box::pin(async move {
            recorder.lock().unwrap().push(value);
            Ok(())
        })
    })
}

fn failing_callback(message: &'static str) -> StageCallback {
    Box::new(move || Box::pin(async move { Err(message.into()) }))
}

#[tokio::test]
async fn test_prioritized_callbacks_run_in_ascending_priority_order() {
    let engine = SharedStageEngine::new();
    let recorder = Arc::new(StdMutex::new(Vec::new()));

    // Registered out of order on purpose
    for priority in [3, 1, 2] {
        engine
            .register(
                LifecycleStage::Bootstrap,
                Some(priority),
                recording_callback(recorder.clone(), priority),
            )
            .await
            .unwrap();
    }

    engine.run(LifecycleStage::Bootstrap).await.unwrap();
    assert_eq!(*recorder.lock().unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_equal_priorities_preserve_registration_order() {
    let engine = SharedStageEngine::new();
    let recorder = Arc::new(StdMutex::new(Vec::new()));

    for value in [10, 20, 30] {
        engine
            .register(
                LifecycleStage::Ready,
                Some(5),
                recording_callback(recorder.clone(), value),
            )
            .await
            .unwrap();
    }

    engine.run(LifecycleStage::Ready).await.unwrap();
    assert_eq!(*recorder.lock().unwrap(), vec![10, 20, 30]);
}

#[tokio::test]
async fn test_prioritized_run_before_unprioritized() {
    let engine = SharedStageEngine::new();
    let recorder = Arc::new(StdMutex::new(Vec::new()));

    engine
        .register(LifecycleStage::PreInit, None, recording_callback(recorder.clone(), 100))
        .await
        .unwrap();
    engine
        .register(LifecycleStage::PreInit, Some(1), recording_callback(recorder.clone(), 1))
        .await
        .unwrap();

    engine.run(LifecycleStage::PreInit).await.unwrap();
    assert_eq!(*recorder.lock().unwrap(), vec![1, 100]);
}

#[tokio::test]
async fn test_unprioritized_batch_all_complete() {
    let engine = SharedStageEngine::new();
    let first = Arc::new(AtomicBool::new(false));
    let second = Arc::new(AtomicBool::new(false));

    for flag in [first.clone(), second.clone()] {
        engine
            .register(
                LifecycleStage::PostConfig,
                None,
                Box::new(move || {
                    Box::pin(async move {
                        flag.store(true, Ordering::SeqCst);
                        Ok(())
                    })
                }),
            )
            .await
            .unwrap();
    }

    engine.run(LifecycleStage::PostConfig).await.unwrap();
    // Joint completion is the guarantee; relative order is not
    assert!(first.load(Ordering::SeqCst));
    assert!(second.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_late_registration_rejected_once_stage_closed() {
    let engine = SharedStageEngine::new();
    engine.run(LifecycleStage::Bootstrap).await.unwrap();

    let result = engine
        .register(LifecycleStage::Bootstrap, None, Box::new(|| Box::pin(async { Ok(()) })))
        .await;
    assert!(matches!(
        result,
        Err(LifecycleError::LateRegistration { stage: LifecycleStage::Bootstrap })
    ));
    // The dropped callback must never be queued
    assert_eq!(engine.pending_count(LifecycleStage::Bootstrap).await, 0);
}

#[tokio::test]
async fn test_running_a_closed_stage_is_an_error() {
    let engine = SharedStageEngine::new();
    engine.run(LifecycleStage::Ready).await.unwrap();
    assert!(matches!(
        engine.run(LifecycleStage::Ready).await,
        Err(LifecycleError::StageClosed { stage: LifecycleStage::Ready })
    ));
}

#[tokio::test]
async fn test_stages_close_independently() {
    let engine = SharedStageEngine::new();
    engine.run(LifecycleStage::PreInit).await.unwrap();

    assert!(engine.is_closed(LifecycleStage::PreInit).await);
    assert!(!engine.is_closed(LifecycleStage::PostConfig).await);

    // Later stages still accept registrations
    engine
        .register(LifecycleStage::PostConfig, None, Box::new(|| Box::pin(async { Ok(()) })))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reset_reopens_stages_with_empty_pending_lists() {
    let engine = SharedStageEngine::new();
    let recorder = Arc::new(StdMutex::new(Vec::new()));

    engine
        .register(LifecycleStage::Bootstrap, None, recording_callback(recorder.clone(), 1))
        .await
        .unwrap();
    engine.run(LifecycleStage::Bootstrap).await.unwrap();

    engine.reset().await;
    assert!(!engine.is_closed(LifecycleStage::Bootstrap).await);
    assert_eq!(engine.pending_count(LifecycleStage::Bootstrap).await, 0);

    // Register and run again after the reset
    engine
        .register(LifecycleStage::Bootstrap, None, recording_callback(recorder.clone(), 2))
        .await
        .unwrap();
    engine.run(LifecycleStage::Bootstrap).await.unwrap();
    assert_eq!(*recorder.lock().unwrap(), vec![1, 2]);
}

#[tokio::test]
async fn test_prioritized_failure_stops_the_ordered_sequence() {
    let engine = SharedStageEngine::new();
    let recorder = Arc::new(StdMutex::new(Vec::new()));

    engine
        .register(LifecycleStage::Bootstrap, Some(1), failing_callback("boom"))
        .await
        .unwrap();
    engine
        .register(LifecycleStage::Bootstrap, Some(2), recording_callback(recorder.clone(), 2))
        .await
        .unwrap();

    let err = engine.run(LifecycleStage::Bootstrap).await.unwrap_err();
    assert!(matches!(err, LifecycleError::CallbackFailed { stage: LifecycleStage::Bootstrap, .. }));
    assert!(recorder.lock().unwrap().is_empty(), "later prioritized callback must not run");
}

#[tokio::test]
async fn test_batch_failures_are_aggregated_after_all_complete() {
    let engine = SharedStageEngine::new();
    let survivor = Arc::new(AtomicBool::new(false));

    engine
        .register(LifecycleStage::Ready, None, failing_callback("first failure"))
        .await
        .unwrap();
    engine
        .register(LifecycleStage::Ready, None, failing_callback("second failure"))
        .await
        .unwrap();
    let flag = survivor.clone();
    engine
        .register(
            LifecycleStage::Ready,
            None,
            Box::new(move || {
                Box::pin(async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                })
            }),
        )
        .await
        .unwrap();

    let err = engine.run(LifecycleStage::Ready).await.unwrap_err();
    match err {
        LifecycleError::BatchFailed { stage, failures } => {
            assert_eq!(stage, LifecycleStage::Ready);
            assert_eq!(failures.len(), 2);
        }
        other => panic!("expected BatchFailed, got {:?}", other),
    }
    // One callback's failure does not cancel its siblings
    assert!(survivor.load(Ordering::SeqCst));
}
