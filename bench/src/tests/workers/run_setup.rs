use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use txbench_sdk::{Address, Param, Payload};

use crate::config::{BenchConfig, ConfigError};
use crate::core::client::MockSubmitterFactory;
use crate::error::BenchError;
use crate::tests::common::{test_account, RecordingFactory};
use crate::types::PlanError;
use crate::worker::build_dispatcher;

const CONTRACT: &str = "0x00000000000000000000000000000000000000c0";
const RECIPIENT: &str = "0x00000000000000000000000000000000000000d0";

fn config(overrides: serde_json::Value) -> BenchConfig {
    let mut base = json!({
        "Wallet": "wallet.dat",
        "Contract": CONTRACT,
        "To": RECIPIENT,
        "Amount": 5,
        "Rpc": ["http://127.0.0.1:20336"],
        "TxNum": 10,
        "TxFactor": 4,
        "RoutineNum": 4,
        "TPS": 40,
        "SendTx": true
    });
    if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
        base.extend(overrides.clone());
    }
    serde_json::from_value(base).unwrap()
}

#[tokio::test(start_paused = true)]
async fn builds_contract_transfer_plan() {
    let account = test_account();
    let sender = account.address();
    let factory = Arc::new(RecordingFactory::default());

    let dispatcher = build_dispatcher(&config(json!({})), Arc::new(account), factory.clone()).unwrap();
    let plan = dispatcher.plan();
    assert_eq!(plan.total_transactions, 40);
    assert_eq!(plan.transactions_per_worker(), 10);
    assert_eq!(plan.rate_per_worker(), 10);

    let report = dispatcher.run().await.unwrap();
    assert_eq!(report.submitted(), 40);
    let first = factory.connections()[0].nonces();
    assert_eq!(first, (0..10).collect::<Vec<_>>());

    let contract: Address = CONTRACT.parse().unwrap();
    let recipient: Address = RECIPIENT.parse().unwrap();
    let template = crate::core::TransactionFactory::from_config(&config(json!({}))).unwrap().template(sender).unwrap();
    assert_eq!(
        template.body.payload,
        Payload::Invoke {
            contract,
            method: "transfer".to_string(),
            args: vec![Param::Address(sender), Param::Address(recipient), Param::Int(5)],
        }
    );
}

#[test]
fn rate_below_worker_count_is_rejected() {
    let err = build_dispatcher(&config(json!({ "TPS": 3 })), Arc::new(test_account()), Arc::new(MockSubmitterFactory::new()))
        .err()
        .unwrap();
    assert_matches!(err, BenchError::Config(ConfigError::RateBelowWorkerCount { tps: 3, workers: 4 }));
}

#[test]
fn wrapping_nonces_are_rejected() {
    let overrides = json!({ "StartNonce": u32::MAX - 10, "TxNum": 40, "TxFactor": 1 });
    let err = build_dispatcher(&config(overrides), Arc::new(test_account()), Arc::new(MockSubmitterFactory::new()))
        .err()
        .unwrap();
    assert_matches!(err, BenchError::Plan(PlanError::NonceOverflow { .. }));
}

#[test]
fn missing_contract_is_rejected() {
    let err = build_dispatcher(&config(json!({ "Contract": null })), Arc::new(test_account()), Arc::new(RecordingFactory::default()))
        .err()
        .unwrap();
    assert_matches!(err, BenchError::Config(ConfigError::MissingContract));
}
