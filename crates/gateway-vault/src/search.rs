//! pluggable vault search; the default backend is a substring match over
//! the path and any decrypted content the caller has cached

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchHit {
    pub path: String,
    pub score: u32,
    pub snippet: Option<String>,
    pub storage_ref: String,
}

/// one document as seen by a search backend: its path, storage ref, and
/// content if the caller happens to have it decrypted already
pub struct Searchable<'a> {
    pub path: &'a str,
    pub storage_ref: &'a str,
    pub content: Option<&'a str>,
}

pub trait SearchBackend: Send + Sync {
    fn search(&self, documents: &[Searchable<'_>], query: &str, limit: usize) -> Vec<SearchHit>;
}

pub struct SubstringSearch;

impl SearchBackend for SubstringSearch {
    fn search(&self, documents: &[Searchable<'_>], query: &str, limit: usize) -> Vec<SearchHit> {
        let needle = query.to_lowercase();
        let mut hits = Vec::new();

        for doc in documents {
            let path_hit = doc.path.to_lowercase().contains(&needle);
            let content_match = doc.content.and_then(|content| {
                let lower = content.to_lowercase();
                lower.find(&needle).map(|at| (content, at))
            });

            if !path_hit && content_match.is_none() {
                continue;
            }

            let score = match (path_hit, content_match.is_some()) {
                (true, true) => 2,
                _ => 1,
            };
            let snippet = content_match.map(|(content, at)| {
                let start = at.saturating_sub(20);
                let end = (at + needle.len() + 20).min(content.len());
                content[start..end].to_string()
            });

            hits.push(SearchHit {
                path: doc.path.to_string(),
                score,
                snippet,
                storage_ref: doc.storage_ref.to_string(),
            });
        }

        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(limit);
        hits
    }
}
