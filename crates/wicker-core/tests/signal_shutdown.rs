//! End-to-end signal handling: a real SIGTERM delivered right after
//! bootstrap must run both shutdown stages, tear the kernel down
//! completely, and reach the fail-fast path.
//!
//! Kept in its own test binary: the raised signal is process-wide and must
//! not reach listeners installed by unrelated tests.

#![cfg(unix)]

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use wicker_core::{
    ApplicationDefinition, BootstrapOptions, Kernel, LifecycleStage, RecordingFatalHandler,
    ServiceContext, ServiceInstance, service_fn,
};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sigterm_runs_shutdown_stages_then_teardown_and_fail_fast() {
    let fatal = Arc::new(RecordingFatalHandler::new());
    let kernel = Kernel::with_fatal_handler(fatal.clone());
    let recorder: Arc<StdMutex<Vec<LifecycleStage>>> = Arc::new(StdMutex::new(Vec::new()));

    let stages = recorder.clone();
    let app = ApplicationDefinition::new("signal-demo").service(
        "probe",
        service_fn(move |context: ServiceContext| {
            let stages = stages.clone();
            async move {
                for stage in [LifecycleStage::ShutdownStart, LifecycleStage::ShutdownComplete] {
                    let stages = stages.clone();
                    context
                        .lifecycle
                        .attach(stage, None, move || async move {
                            // Exhaust the cooperative budget; the listener
                            // task must still finish its teardown
                            for _ in 0..256 {
                                tokio::task::yield_now().await;
                            }
                            stages.lock().unwrap().push(stage);
                            Ok(())
                        })
                        .await;
                }
                let instance: ServiceInstance = Arc::new(());
                Ok(instance)
            }
        }),
    );

    kernel.bootstrap(app, BootstrapOptions::new()).await.unwrap();

    // The OS handler is registered before bootstrap returns, so raising
    // immediately must never hit the default disposition
    unsafe {
        libc::raise(libc::SIGTERM);
    }

    let mut escalated = false;
    for _ in 0..500 {
        if fatal.fatal_count() > 0 {
            escalated = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(escalated, "fail-fast never ran after SIGTERM");
    assert_eq!(fatal.messages(), vec!["terminated by signal".to_string()]);
    assert_eq!(
        *recorder.lock().unwrap(),
        vec![LifecycleStage::ShutdownStart, LifecycleStage::ShutdownComplete]
    );
    assert!(!kernel.is_active().await);
    assert!(kernel.events().await.is_none());
}
