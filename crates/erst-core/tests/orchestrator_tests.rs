//! End-to-end replay branches over snapshot sources and the mock simulator.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use stellar_xdr::curr::{
    AccountEntry, AccountEntryExt, AccountId, Hash, LedgerEntry, LedgerEntryChange,
    LedgerEntryChanges, LedgerEntryData, LedgerEntryExt, Limits, PublicKey, SequenceNumber,
    String32, Thresholds, TransactionMeta, TransactionMetaV2, TransactionResult,
    TransactionResultExt, TransactionResultMeta, TransactionResultPair, TransactionResultResult,
    Uint256, VecM, WriteXdr,
};

use erst_core::{
    BranchSpec, ErrorKind, MockSimulator, ReplayInputs, ReplayOrchestrator, SimulationError,
};
use erst_ledger_keys::{encode_key, ledger_key_for};
use erst_state_fetcher::{EntryFetcher, FetcherConfig, LedgerEntrySource, SnapshotSource};
use erst_types::{
    CancellationToken, Network, RecordKey, ReplayRequest, ReplayResponse, Target, TransactionHash,
    TransactionRecord,
};

fn account(id: u8) -> LedgerEntry {
    LedgerEntry {
        last_modified_ledger_seq: 7,
        data: LedgerEntryData::Account(AccountEntry {
            account_id: AccountId(PublicKey::PublicKeyTypeEd25519(Uint256([id; 32]))),
            balance: 1_000,
            seq_num: SequenceNumber(1),
            num_sub_entries: 0,
            inflation_dest: None,
            flags: 0,
            home_domain: String32::default(),
            thresholds: Thresholds([1, 0, 0, 0]),
            signers: VecM::default(),
            ext: AccountEntryExt::V0,
        }),
        ext: LedgerEntryExt::V0,
    }
}

fn key_of(id: u8) -> RecordKey {
    encode_key(&ledger_key_for(&account(id))).unwrap()
}

fn b64(bytes: Vec<u8>) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// A transaction whose metadata touches accounts 1 and 2.
fn transaction() -> TransactionRecord {
    let meta = TransactionResultMeta {
        result: TransactionResultPair {
            transaction_hash: Hash([0; 32]),
            result: TransactionResult {
                fee_charged: 100,
                result: TransactionResultResult::TxSuccess(VecM::default()),
                ext: TransactionResultExt::V0,
            },
        },
        fee_processing: LedgerEntryChanges(VecM::default()),
        tx_apply_processing: TransactionMeta::V2(TransactionMetaV2 {
            tx_changes_before: LedgerEntryChanges(
                vec![LedgerEntryChange::State(account(1))].try_into().unwrap(),
            ),
            operations: VecM::default(),
            tx_changes_after: LedgerEntryChanges(
                vec![LedgerEntryChange::Updated(account(2))].try_into().unwrap(),
            ),
        }),
    };

    TransactionRecord {
        hash: TransactionHash::new("ab".repeat(32)),
        envelope_xdr: "AAAAAg==".to_string(),
        result_xdr: String::new(),
        result_meta_xdr: b64(meta.to_xdr(Limits::none()).unwrap()),
        ledger: Some(51_000_000),
    }
}

fn snapshot_fetcher(tag: &str) -> Arc<EntryFetcher> {
    let entries: HashMap<_, _> = [1u8, 2]
        .into_iter()
        .map(|id| (key_of(id), format!("{tag}-{id}")))
        .collect();
    let source = Arc::new(SnapshotSource::from_entries(entries));
    Arc::new(EntryFetcher::new(source, FetcherConfig::default()).unwrap())
}

fn inputs() -> Arc<ReplayInputs> {
    Arc::new(ReplayInputs::from_transaction(&transaction()).unwrap())
}

fn network_branch(network: Network, tag: &str, inputs: Arc<ReplayInputs>) -> BranchSpec {
    BranchSpec::new(Target::Network(network), snapshot_fetcher(tag), inputs)
}

struct FailingSource;

#[async_trait::async_trait]
impl LedgerEntrySource for FailingSource {
    async fn fetch_batch(&self, _keys: &[RecordKey]) -> anyhow::Result<HashMap<RecordKey, String>> {
        anyhow::bail!("rpc unavailable")
    }
}

#[test]
fn test_inputs_extract_keys_once() {
    let inputs = ReplayInputs::from_transaction(&transaction()).unwrap();
    let keys: Vec<_> = inputs.keys.iter().cloned().collect();
    let mut expected = vec![key_of(1), key_of(2)];
    expected.sort();
    assert_eq!(keys, expected);
}

#[test]
fn test_inputs_reject_undecodable_meta() {
    let mut tx = transaction();
    tx.result_meta_xdr = "AAAA".to_string();
    let err = ReplayInputs::from_transaction(&tx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn test_single_branch_passes_fetched_entries_and_network() {
    let sim = Arc::new(MockSimulator::new());
    let orchestrator = ReplayOrchestrator::new(sim.clone());
    let cancel = CancellationToken::new();

    let response = orchestrator
        .replay_single(&cancel, network_branch(Network::Testnet, "testnet", inputs()))
        .await
        .unwrap();
    assert!(response.status.is_success());

    let requests = sim.requests();
    let request = &requests[0];
    assert_eq!(request.network, Some(Network::Testnet));
    assert_eq!(request.wasm_path, None);
    assert_eq!(request.envelope_xdr, "AAAAAg==");
    assert_eq!(request.ledger_entries.len(), 2);
    assert_eq!(request.ledger_entries[&key_of(1)], "testnet-1");
}

#[tokio::test]
async fn test_override_wins_over_fetched_entry() {
    let sim = Arc::new(MockSimulator::new());
    let orchestrator = ReplayOrchestrator::new(sim.clone());

    let mut overrides = HashMap::new();
    overrides.insert(key_of(2), "manual".to_string());
    let inputs = Arc::new(
        ReplayInputs::from_transaction(&transaction())
            .unwrap()
            .with_overrides(overrides),
    );

    orchestrator
        .replay_single(
            &CancellationToken::new(),
            network_branch(Network::Testnet, "testnet", inputs),
        )
        .await
        .unwrap();

    let requests = sim.requests();
    let request = &requests[0];
    assert_eq!(request.ledger_entries[&key_of(1)], "testnet-1");
    assert_eq!(request.ledger_entries[&key_of(2)], "manual");
}

#[tokio::test]
async fn test_wasm_target_sets_wasm_path() {
    let sim = Arc::new(MockSimulator::new());
    let orchestrator = ReplayOrchestrator::new(sim.clone());
    let wasm = PathBuf::from("/tmp/build/token.wasm");
    let branch = BranchSpec::new(Target::Wasm(wasm.clone()), snapshot_fetcher("local"), inputs());

    orchestrator
        .replay_single(&CancellationToken::new(), branch)
        .await
        .unwrap();

    let requests = sim.requests();
    let request = &requests[0];
    assert_eq!(request.wasm_path, Some(wasm));
    assert_eq!(request.network, None);
}

#[tokio::test]
async fn test_primary_failure_does_not_hide_compare_result() {
    let sim = Arc::new(MockSimulator::with_handler(|req: &ReplayRequest| {
        if req.network == Some(Network::Mainnet) {
            Err(SimulationError::Engine {
                message: "host trapped".to_string(),
                stderr: String::new(),
            })
        } else {
            Ok(ReplayResponse::success().with_events(["e1"]))
        }
    }));
    let orchestrator = ReplayOrchestrator::new(sim);
    let inputs = inputs();

    let outcome = orchestrator
        .replay_pair(
            &CancellationToken::new(),
            network_branch(Network::Mainnet, "mainnet", inputs.clone()),
            network_branch(Network::Testnet, "testnet", inputs),
        )
        .await;

    let err = outcome.primary.as_ref().unwrap_err();
    assert_eq!(err.branch, "primary:mainnet");
    assert_eq!(err.kind(), ErrorKind::Simulation);
    assert_eq!(outcome.compare.as_ref().unwrap().events, vec!["e1"]);
    assert!(outcome.comparison().is_none());
}

#[tokio::test]
async fn test_fetch_failure_is_attributed_to_its_branch() {
    let orchestrator = ReplayOrchestrator::new(Arc::new(MockSimulator::new()));
    let inputs = inputs();
    let broken = Arc::new(EntryFetcher::new(Arc::new(FailingSource), FetcherConfig::default()).unwrap());

    let results = orchestrator
        .replay(
            &CancellationToken::new(),
            vec![
                network_branch(Network::Testnet, "testnet", inputs.clone()),
                BranchSpec::new(Target::Network(Network::Futurenet), broken, inputs),
            ],
        )
        .await;

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    let err = results[1].as_ref().unwrap_err();
    assert_eq!(err.branch, "compare:futurenet");
    assert_eq!(err.kind(), ErrorKind::Fetch);
}

#[tokio::test]
async fn test_results_keep_input_order() {
    // The first branch is the slowest; results must still come back first.
    let sim = Arc::new(MockSimulator::with_handler(|req: &ReplayRequest| {
        if req.network == Some(Network::Mainnet) {
            std::thread::sleep(Duration::from_millis(100));
        }
        Ok(ReplayResponse::success().with_logs([req
            .network
            .map(|n| n.to_string())
            .unwrap_or_default()]))
    }));
    let orchestrator = ReplayOrchestrator::new(sim);
    let inputs = inputs();

    let results = orchestrator
        .replay(
            &CancellationToken::new(),
            vec![
                network_branch(Network::Mainnet, "mainnet", inputs.clone()),
                network_branch(Network::Testnet, "testnet", inputs.clone()),
                network_branch(Network::Futurenet, "futurenet", inputs),
            ],
        )
        .await;

    let logs: Vec<_> = results
        .iter()
        .map(|r| r.as_ref().unwrap().logs[0].clone())
        .collect();
    assert_eq!(logs, vec!["mainnet", "testnet", "futurenet"]);
}

#[tokio::test]
async fn test_matching_pair_has_no_differences() {
    let orchestrator = ReplayOrchestrator::new(Arc::new(MockSimulator::with_handler(|_| {
        Ok(ReplayResponse::success()
            .with_events(["e1", "e2"])
            .with_logs(["l1"]))
    })));
    let inputs = inputs();

    let outcome = orchestrator
        .replay_pair(
            &CancellationToken::new(),
            network_branch(Network::Mainnet, "mainnet", inputs.clone()),
            network_branch(Network::Testnet, "testnet", inputs),
        )
        .await;

    let diff = outcome.comparison().unwrap();
    assert!(!diff.has_differences());
    assert_eq!(diff.summary, "No differences found");
}

#[tokio::test]
async fn test_cancel_stops_both_branches() {
    let sim = Arc::new(MockSimulator::new().with_delay(Duration::from_secs(30)));
    let orchestrator = ReplayOrchestrator::new(sim);
    let cancel = CancellationToken::new();
    let inputs = inputs();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator.replay_pair(
            &cancel,
            network_branch(Network::Mainnet, "mainnet", inputs.clone()),
            network_branch(Network::Testnet, "testnet", inputs),
        ),
    )
    .await
    .expect("cancellation should finish both branches promptly");

    assert_eq!(outcome.primary.unwrap_err().kind(), ErrorKind::Cancelled);
    assert_eq!(outcome.compare.unwrap_err().kind(), ErrorKind::Cancelled);
}

#[tokio::test]
async fn test_pre_cancelled_token_never_reaches_simulator() {
    let sim = Arc::new(MockSimulator::new());
    let orchestrator = ReplayOrchestrator::new(sim.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = orchestrator
        .replay_single(&cancel, network_branch(Network::Testnet, "testnet", inputs()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(sim.call_count(), 0);
}

#[tokio::test]
async fn test_panicking_branch_becomes_internal_error() {
    let sim = Arc::new(MockSimulator::with_handler(|req: &ReplayRequest| {
        if req.network == Some(Network::Testnet) {
            panic!("simulator exploded");
        }
        Ok(ReplayResponse::success())
    }));
    let orchestrator = ReplayOrchestrator::new(sim);
    let inputs = inputs();

    let outcome = orchestrator
        .replay_pair(
            &CancellationToken::new(),
            network_branch(Network::Mainnet, "mainnet", inputs.clone()),
            network_branch(Network::Testnet, "testnet", inputs),
        )
        .await;

    assert!(outcome.primary.is_ok());
    let err = outcome.compare.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(err.to_string().contains("simulator exploded"));
}
