//! Version dispatch over `TransactionMeta`.
//!
//! Each metadata version lays its change lists out differently. Every version
//! gets one function that returns its lists in application order; supporting a
//! new version means adding one function and one match arm.

use stellar_xdr::curr::{
    LedgerEntryChanges, OperationMeta, TransactionMeta, TransactionMetaV1, TransactionMetaV2,
    TransactionMetaV3, TransactionMetaV4,
};

/// Metadata version number (`0..=4`).
pub fn meta_version(meta: &TransactionMeta) -> u32 {
    match meta {
        TransactionMeta::V0(_) => 0,
        TransactionMeta::V1(_) => 1,
        TransactionMeta::V2(_) => 2,
        TransactionMeta::V3(_) => 3,
        TransactionMeta::V4(_) => 4,
    }
}

/// All change lists carried by `meta`, in application order.
pub fn change_lists(meta: &TransactionMeta) -> Vec<&LedgerEntryChanges> {
    match meta {
        TransactionMeta::V0(ops) => v0_lists(ops),
        TransactionMeta::V1(v1) => v1_lists(v1),
        TransactionMeta::V2(v2) => v2_lists(v2),
        TransactionMeta::V3(v3) => v3_lists(v3),
        TransactionMeta::V4(v4) => v4_lists(v4),
    }
}

fn v0_lists(ops: &[OperationMeta]) -> Vec<&LedgerEntryChanges> {
    ops.iter().map(|op| &op.changes).collect()
}

fn v1_lists(v1: &TransactionMetaV1) -> Vec<&LedgerEntryChanges> {
    let mut lists = Vec::with_capacity(v1.operations.len() + 1);
    lists.push(&v1.tx_changes);
    lists.extend(v1.operations.iter().map(|op| &op.changes));
    lists
}

fn v2_lists(v2: &TransactionMetaV2) -> Vec<&LedgerEntryChanges> {
    let mut lists = Vec::with_capacity(v2.operations.len() + 2);
    lists.push(&v2.tx_changes_before);
    lists.extend(v2.operations.iter().map(|op| &op.changes));
    lists.push(&v2.tx_changes_after);
    lists
}

fn v3_lists(v3: &TransactionMetaV3) -> Vec<&LedgerEntryChanges> {
    let mut lists = Vec::with_capacity(v3.operations.len() + 2);
    lists.push(&v3.tx_changes_before);
    lists.extend(v3.operations.iter().map(|op| &op.changes));
    lists.push(&v3.tx_changes_after);
    lists
}

// Same shape as V3; operation metas are `OperationMetaV2` here.
fn v4_lists(v4: &TransactionMetaV4) -> Vec<&LedgerEntryChanges> {
    let mut lists = Vec::with_capacity(v4.operations.len() + 2);
    lists.push(&v4.tx_changes_before);
    lists.extend(v4.operations.iter().map(|op| &op.changes));
    lists.push(&v4.tx_changes_after);
    lists
}
