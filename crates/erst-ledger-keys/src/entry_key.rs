//! Ledger entry → ledger key derivation.

use stellar_xdr::curr::{
    LedgerEntry, LedgerEntryData, LedgerKey, LedgerKeyAccount, LedgerKeyClaimableBalance,
    LedgerKeyConfigSetting, LedgerKeyContractCode, LedgerKeyContractData, LedgerKeyData,
    LedgerKeyLiquidityPool, LedgerKeyOffer, LedgerKeyTrustLine, LedgerKeyTtl, Limits, WriteXdr,
};

use erst_types::RecordKey;

/// Build the key identifying `entry` in the ledger.
///
/// The key is the identity subset of the entry payload, e.g. an account's id
/// or a contract data entry's (contract, key, durability).
pub fn ledger_key_for(entry: &LedgerEntry) -> LedgerKey {
    match &entry.data {
        LedgerEntryData::Account(a) => LedgerKey::Account(LedgerKeyAccount {
            account_id: a.account_id.clone(),
        }),
        LedgerEntryData::Trustline(t) => LedgerKey::Trustline(LedgerKeyTrustLine {
            account_id: t.account_id.clone(),
            asset: t.asset.clone(),
        }),
        LedgerEntryData::Offer(o) => LedgerKey::Offer(LedgerKeyOffer {
            seller_id: o.seller_id.clone(),
            offer_id: o.offer_id,
        }),
        LedgerEntryData::Data(d) => LedgerKey::Data(LedgerKeyData {
            account_id: d.account_id.clone(),
            data_name: d.data_name.clone(),
        }),
        LedgerEntryData::ClaimableBalance(c) => {
            LedgerKey::ClaimableBalance(LedgerKeyClaimableBalance {
                balance_id: c.balance_id.clone(),
            })
        }
        LedgerEntryData::LiquidityPool(p) => LedgerKey::LiquidityPool(LedgerKeyLiquidityPool {
            liquidity_pool_id: p.liquidity_pool_id.clone(),
        }),
        LedgerEntryData::ContractData(c) => LedgerKey::ContractData(LedgerKeyContractData {
            contract: c.contract.clone(),
            key: c.key.clone(),
            durability: c.durability,
        }),
        LedgerEntryData::ContractCode(c) => LedgerKey::ContractCode(LedgerKeyContractCode {
            hash: c.hash.clone(),
        }),
        LedgerEntryData::ConfigSetting(s) => LedgerKey::ConfigSetting(LedgerKeyConfigSetting {
            config_setting_id: s.discriminant(),
        }),
        LedgerEntryData::Ttl(t) => LedgerKey::Ttl(LedgerKeyTtl {
            key_hash: t.key_hash.clone(),
        }),
    }
}

/// Canonical encoding of a ledger key. `None` if the key cannot be serialized.
pub fn encode_key(key: &LedgerKey) -> Option<RecordKey> {
    key.to_xdr(Limits::none())
        .ok()
        .map(|bytes| RecordKey::from_xdr_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stellar_xdr::curr::{
        ContractCodeEntry, ContractCodeEntryExt, Hash, LedgerEntryExt, ReadXdr, TtlEntry,
    };

    fn code_entry(hash: [u8; 32]) -> LedgerEntry {
        LedgerEntry {
            last_modified_ledger_seq: 10,
            data: LedgerEntryData::ContractCode(ContractCodeEntry {
                ext: ContractCodeEntryExt::V0,
                hash: Hash(hash),
                code: vec![0u8, 97, 115, 109].try_into().unwrap(),
            }),
            ext: LedgerEntryExt::V0,
        }
    }

    #[test]
    fn test_contract_code_key_uses_hash_only() {
        let a = ledger_key_for(&code_entry([7; 32]));
        let mut other = code_entry([7; 32]);
        other.last_modified_ledger_seq = 99;
        assert_eq!(a, ledger_key_for(&other));

        match a {
            LedgerKey::ContractCode(k) => assert_eq!(k.hash, Hash([7; 32])),
            other => panic!("unexpected key {:?}", other),
        }
    }

    #[test]
    fn test_ttl_key() {
        let entry = LedgerEntry {
            last_modified_ledger_seq: 1,
            data: LedgerEntryData::Ttl(TtlEntry {
                key_hash: Hash([3; 32]),
                live_until_ledger_seq: 500,
            }),
            ext: LedgerEntryExt::V0,
        };
        assert_eq!(
            ledger_key_for(&entry),
            LedgerKey::Ttl(LedgerKeyTtl {
                key_hash: Hash([3; 32])
            })
        );
    }

    #[test]
    fn test_encoded_key_decodes_back() {
        let key = ledger_key_for(&code_entry([1; 32]));
        let encoded = encode_key(&key).unwrap();
        let bytes = encoded.to_xdr_bytes().unwrap();
        assert_eq!(LedgerKey::from_xdr(bytes, Limits::none()).unwrap(), key);
    }
}
