use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use rstest::rstest;

use crate::core::client::{MockSubmitterFactory, MockTransactionSigner, TransactionSubmitter};
use crate::tests::common::{endpoints, test_account, transfer_template, FaultySigner, RecordingFactory};
use crate::types::RunPlan;
use crate::worker::recorder::{output_path, read_records};
use crate::worker::{DispatchError, Dispatcher, WorkerError};
use txbench_sdk::{verify_transaction, RpcError};

fn dispatcher(plan: RunPlan, factory: Arc<RecordingFactory>) -> Dispatcher {
    let account = test_account();
    let template = transfer_template(account.address());
    Dispatcher::new(plan, template, Arc::new(account), factory)
}

#[tokio::test]
async fn hundred_transactions_over_four_workers() {
    let factory = Arc::new(RecordingFactory::default());
    let plan = RunPlan::new(100, 4, 0, endpoints(4)).unwrap();

    let report = dispatcher(plan, factory.clone()).run().await.unwrap();

    let connections = factory.connections();
    assert_eq!(connections.len(), 4);
    for (worker, submitter) in connections.iter().enumerate() {
        let start = 25 * worker as u32;
        assert_eq!(submitter.nonces(), (start..start + 25).collect::<Vec<_>>());
    }
    assert_eq!(report.emitted(), 100);
    assert_eq!(report.submitted(), 100);
    assert_eq!(report.workers.iter().map(|w| w.worker).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    assert!(report.is_complete());
}

#[tokio::test]
async fn remainder_is_dropped() {
    let factory = Arc::new(RecordingFactory::default());
    let plan = RunPlan::new(10, 3, 0, endpoints(1)).unwrap();

    let report = dispatcher(plan, factory.clone()).run().await.unwrap();

    assert_eq!(report.emitted(), 9);
    assert_eq!(report.total_transactions, 10);
    let sent: usize = factory.connections().iter().map(|s| s.nonces().len()).sum();
    assert_eq!(sent, 9);
}

#[rstest]
#[case(5, 2)]
#[case(3, 3)]
#[case(2, 5)]
#[tokio::test]
async fn workers_are_bound_round_robin(#[case] workers: u32, #[case] endpoint_count: usize) {
    let factory = Arc::new(RecordingFactory::default());
    let endpoints = endpoints(endpoint_count);
    let plan = RunPlan::new(u64::from(workers) * 2, workers, 0, endpoints.clone()).unwrap();

    let report = dispatcher(plan, factory.clone()).run().await.unwrap();

    let connections = factory.connections();
    assert_eq!(connections.len(), workers as usize);
    for (worker, submitter) in connections.iter().enumerate() {
        assert_eq!(submitter.endpoint(), endpoints[worker % endpoint_count]);
        assert_eq!(report.workers[worker].endpoint, endpoints[worker % endpoint_count]);
    }
}

#[tokio::test]
async fn rejected_sends_still_consume_nonces() {
    let factory = Arc::new(RecordingFactory::rejecting_every(3));
    let plan = RunPlan::new(30, 2, 100, endpoints(1)).unwrap();

    let report = dispatcher(plan, factory.clone()).run().await.unwrap();

    for (worker, submitter) in factory.connections().iter().enumerate() {
        let nonces = submitter.nonces();
        let start = 100 + 15 * worker as u32;
        assert_eq!(nonces, (start..start + 15).collect::<Vec<_>>());
    }
    assert_eq!(report.emitted(), 30);
    assert_eq!(report.failed(), 10);
    assert_eq!(report.submitted(), 20);
    for worker in &report.workers {
        assert_eq!(worker.consumed(), 15);
    }
}

#[tokio::test(start_paused = true)]
async fn aggregate_rate_converges_to_target() {
    let factory = Arc::new(RecordingFactory::default());
    let plan = RunPlan::new(400, 4, 0, endpoints(2)).unwrap().with_rate(100);

    let report = dispatcher(plan, factory).run().await.unwrap();

    assert_eq!(report.submitted(), 400);
    let elapsed = report.elapsed.as_secs_f64();
    assert!((3.9..=4.1).contains(&elapsed), "run took {elapsed}s");
    assert!((95..=105).contains(&report.tps()), "measured {} tps", report.tps());
}

#[tokio::test(start_paused = true)]
async fn unlimited_rate_never_sleeps() {
    let factory = Arc::new(RecordingFactory::default());
    let plan = RunPlan::new(2_000, 2, 0, endpoints(1)).unwrap().with_rate(0);

    let report = dispatcher(plan, factory).run().await.unwrap();

    assert_eq!(report.submitted(), 2_000);
    assert!(report.elapsed < Duration::from_millis(10), "run took {:?}", report.elapsed);
}

#[tokio::test]
async fn persisted_records_match_their_hashes() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(RecordingFactory::default());
    let plan = RunPlan::new(12, 3, 7, endpoints(1))
        .unwrap()
        .with_submission(false)
        .with_persistence(Some(dir.path().to_path_buf()));

    let report = dispatcher(plan, factory.clone()).run().await.unwrap();

    assert!(factory.connections().is_empty());
    assert_eq!(report.recorded(), 12);
    for worker in 0..3u32 {
        let records = read_records(&output_path(dir.path(), worker)).unwrap();
        assert_eq!(records.len(), 4);
        for (record, nonce) in records.iter().zip(7 + 4 * worker..) {
            let tx = record.transaction().unwrap();
            assert_eq!(tx.nonce(), nonce);
            assert_eq!(tx.hash().unwrap(), record.hash);
            assert!(verify_transaction(&tx).unwrap());
        }
    }
}

#[tokio::test(start_paused = true)]
async fn signing_fault_cancels_every_worker() {
    let factory = Arc::new(RecordingFactory::default());
    let account = test_account();
    let template = transfer_template(account.address());
    let signer = Arc::new(FaultySigner { account, poisoned_nonce: 5 });
    let plan = RunPlan::new(300, 3, 0, endpoints(3)).unwrap().with_rate(30);

    let err = Dispatcher::new(plan, template, signer, factory.clone()).run().await.unwrap_err();

    assert_matches!(err, DispatchError::Fatal(WorkerError::Sign { worker: 0, nonce: 5, .. }));
    for submitter in factory.connections() {
        assert!(submitter.nonces().len() < 100, "{} kept sending after the fault", submitter.endpoint());
    }
}

#[tokio::test]
async fn unwritable_output_aborts_only_that_worker() {
    let dir = tempfile::tempdir().unwrap();
    // A directory squatting on the output path makes the open fail.
    std::fs::create_dir(output_path(dir.path(), 1)).unwrap();
    let factory = Arc::new(RecordingFactory::default());
    let plan = RunPlan::new(30, 3, 0, endpoints(1)).unwrap().with_persistence(Some(dir.path().to_path_buf()));

    let report = dispatcher(plan, factory).run().await.unwrap();

    assert_eq!(report.aborted.len(), 1);
    assert_eq!(report.aborted[0].worker, 1);
    assert_eq!(report.workers.iter().map(|w| w.worker).collect::<Vec<_>>(), vec![0, 2]);
    assert!(report.workers.iter().all(|w| w.recorded == 10 && !w.cancelled));
    assert!(!report.is_complete());
}

#[tokio::test]
async fn external_cancellation_stops_workers() {
    let factory = Arc::new(RecordingFactory::default());
    let plan = RunPlan::new(100, 2, 0, endpoints(1)).unwrap();
    let dispatcher = dispatcher(plan, factory.clone());
    dispatcher.cancellation_token().cancel();

    let report = dispatcher.run().await.unwrap();

    assert!(report.workers.iter().all(|w| w.cancelled));
    assert_eq!(report.emitted(), 0);
    assert!(!report.is_complete());
}

#[tokio::test]
async fn connection_failure_is_reported_before_spawning() {
    let mut factory = MockSubmitterFactory::new();
    factory
        .expect_connect()
        .times(1)
        .returning(|endpoint| Err(RpcError::InvalidEndpoint(endpoint.to_string())));
    let mut signer = MockTransactionSigner::new();
    signer.expect_sign_transaction().never();
    let plan = RunPlan::new(10, 2, 0, endpoints(1)).unwrap();

    let err = Dispatcher::new(plan, transfer_template(test_account().address()), Arc::new(signer), Arc::new(factory))
        .run()
        .await
        .unwrap_err();

    assert_matches!(err, DispatchError::Connect { worker: 0, .. });
}
