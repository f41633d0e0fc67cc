//! minimal spendable-output tracking backing `constructSpendableAction` and
//! `ingest`; the wire format of an external transaction is intentionally
//! opaque JSON here, only the address-matching logic is load-bearing

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Output {
    pub recipient: [u8; 32],
    pub amount: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpendableOutput {
    pub output: Output,
    pub source_tx: [u8; 32],
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExternalTransaction {
    pub tx_id: [u8; 32],
    pub outputs: Vec<Output>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedAction {
    pub tx_id: [u8; 32],
    pub bytes: Vec<u8>,
}

#[derive(Default)]
pub struct Ledger {
    spendable: Vec<SpendableOutput>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_spendable(&self) -> u64 {
        self.spendable.iter().map(|s| s.output.amount).sum()
    }

    /// record outputs from a serialized external transaction that are
    /// addressed to `own_address`
    pub fn ingest(&mut self, raw: &[u8], own_address: [u8; 32]) -> Result<usize> {
        let tx: ExternalTransaction =
            serde_json::from_slice(raw).map_err(|e| Error::Serialization(e.to_string()))?;

        let mut recorded = 0;
        for output in tx.outputs {
            if output.recipient == own_address {
                self.spendable.push(SpendableOutput {
                    output,
                    source_tx: tx.tx_id,
                });
                recorded += 1;
            }
        }
        Ok(recorded)
    }

    /// select inputs to cover `outputs`, failing with `InsufficientFunds`
    /// if the wallet cannot cover them
    pub fn select_inputs(&mut self, outputs: &[Output]) -> Result<Vec<SpendableOutput>> {
        let needed: u64 = outputs.iter().map(|o| o.amount).sum();
        let mut selected = Vec::new();
        let mut covered = 0u64;

        self.spendable.sort_by(|a, b| b.output.amount.cmp(&a.output.amount));
        while covered < needed {
            match self.spendable.pop() {
                Some(candidate) => {
                    covered += candidate.output.amount;
                    selected.push(candidate);
                }
                None => return Err(Error::InsufficientFunds),
            }
        }
        Ok(selected)
    }
}

pub fn transaction_id(outputs: &[Output], data: Option<&[u8]>) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"gateway-wallet/tx/v1");
    for output in outputs {
        hasher.update(output.recipient);
        hasher.update(output.amount.to_le_bytes());
    }
    if let Some(data) = data {
        hasher.update(data);
    }
    hasher.finalize().into()
}
