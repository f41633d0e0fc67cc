//! memory augmentation: before invoking the model, pull the top-k vault
//! entries relevant to the incoming prompt into the prompt preamble,
//! bounded by a token budget

use gateway_vault::Vault;

/// crude token estimate (whitespace-delimited words); good enough to bound
/// a preamble without pulling in a real tokenizer
fn estimate_tokens(s: &str) -> usize {
    s.split_whitespace().count()
}

pub struct MemoryBudget {
    pub max_tokens: usize,
    pub top_k: usize,
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self { max_tokens: 512, top_k: 5 }
    }
}

/// returns a preamble string built from the vault search hits for `query`,
/// greedily including hits (highest score first) until the token budget
/// would be exceeded
pub async fn augment(vault: &Vault, query: &str, budget: &MemoryBudget) -> Option<String> {
    let hits = vault.search(query, budget.top_k).await;
    if hits.is_empty() {
        return None;
    }

    let mut preamble = String::from("relevant documents:\n");
    let mut used = estimate_tokens(&preamble);

    for hit in hits {
        let Some(snippet) = hit.snippet else { continue };
        let line = format!("- {}: {}\n", hit.path, snippet);
        let cost = estimate_tokens(&line);
        if used + cost > budget.max_tokens {
            break;
        }
        preamble.push_str(&line);
        used += cost;
    }

    if preamble == "relevant documents:\n" {
        None
    } else {
        Some(preamble)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_vault::{MemoryStorageAdapter, Vault};
    use std::sync::Arc;

    async fn solo_wallet() -> Arc<gateway_wallet::Wallet> {
        crate::test_support::solo_wallet().await
    }

    #[tokio::test]
    async fn augment_includes_matching_snippet_within_budget() {
        let wallet = solo_wallet().await;
        let storage = Arc::new(MemoryStorageAdapter::new());
        let vault = Vault::new(wallet, storage, None, [1u8; 32]);
        vault.initialize_vault("v1").await.unwrap();
        vault.upload_document("journal/one.md", b"remember to renew the lease", 0).await.unwrap();

        let preamble = augment(&vault, "lease", &MemoryBudget::default()).await;
        assert!(preamble.unwrap().contains("renew the lease"));
    }

    #[tokio::test]
    async fn augment_returns_none_when_nothing_matches() {
        let wallet = solo_wallet().await;
        let storage = Arc::new(MemoryStorageAdapter::new());
        let vault = Vault::new(wallet, storage, None, [2u8; 32]);
        vault.initialize_vault("v1").await.unwrap();

        let preamble = augment(&vault, "anything", &MemoryBudget::default()).await;
        assert!(preamble.is_none());
    }
}
