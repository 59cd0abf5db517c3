use std::collections::HashMap;

use super::Passage;

pub const K1: f64 = 1.5;
pub const B: f64 = 0.75;
pub const DELTA: f64 = 1.0;

/// BM25+ over a fixed corpus of pre-tokenized documents.
///
/// `idf(t) = ln((N + 1) / df(t))`. Terms absent from the corpus contribute nothing, while a
/// known term adds at least `DELTA * idf` to every document, including those that lack it.
pub struct Bm25Plus {
	term_freqs: Vec<HashMap<String, usize>>,
	doc_lens: Vec<usize>,
	avgdl: f64,
	idf: HashMap<String, f64>,
}
impl Bm25Plus {
	pub fn new(corpus: &[Vec<String>]) -> Self {
		let mut term_freqs = Vec::with_capacity(corpus.len());
		let mut doc_lens = Vec::with_capacity(corpus.len());
		let mut doc_freqs = HashMap::<String, usize>::new();

		for doc in corpus {
			let mut freqs = HashMap::<String, usize>::new();

			for token in doc {
				*freqs.entry(token.clone()).or_default() += 1;
			}
			for token in freqs.keys() {
				*doc_freqs.entry(token.clone()).or_default() += 1;
			}

			doc_lens.push(doc.len());
			term_freqs.push(freqs);
		}

		let n = corpus.len() as f64;
		let total_len = doc_lens.iter().sum::<usize>() as f64;
		let avgdl = if corpus.is_empty() { 0.0 } else { total_len / n };
		let idf = doc_freqs
			.into_iter()
			.map(|(term, df)| (term, ((n + 1.0) / df as f64).ln()))
			.collect();

		Self { term_freqs, doc_lens, avgdl, idf }
	}

	pub fn scores(&self, query: &[String]) -> Vec<f64> {
		let mut scores = vec![0.0; self.term_freqs.len()];

		for term in query {
			let Some(idf) = self.idf.get(term) else {
				continue;
			};

			for (i, freqs) in self.term_freqs.iter().enumerate() {
				let tf = freqs.get(term).copied().unwrap_or_default() as f64;
				let norm = self.length_norm(self.doc_lens[i]);

				scores[i] += idf * (DELTA + (tf * (K1 + 1.0)) / (K1 * norm + tf));
			}
		}

		scores
	}

	fn length_norm(&self, doc_len: usize) -> f64 {
		if self.avgdl == 0.0 {
			return 1.0;
		}

		1.0 - B + B * doc_len as f64 / self.avgdl
	}
}

/// Case-folded whitespace tokens.
pub fn tokenize(text: &str) -> Vec<String> {
	text.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Re-orders `candidates` by BM25+ against `keywords` and keeps the best `k`.
///
/// With no keywords the vector order is kept as is. Equal scores keep their vector order.
pub fn rank(candidates: Vec<Passage>, keywords: &[String], k: usize) -> Vec<Passage> {
	if candidates.is_empty() {
		return Vec::new();
	}
	if keywords.is_empty() {
		tracing::warn!(k, "No ranking keywords. Keeping vector order.");

		return candidates.into_iter().take(k).collect();
	}

	let query = tokenize(&keywords.join(" "));
	let corpus =
		candidates.iter().map(|passage| tokenize(&passage.ranking_text())).collect::<Vec<_>>();
	let scores = Bm25Plus::new(&corpus).scores(&query);
	let mut order = (0..candidates.len()).collect::<Vec<_>>();

	order.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]));

	tracing::debug!(
		candidates = candidates.len(),
		k,
		top_score = order.first().map(|i| scores[*i]).unwrap_or_default(),
		"Lexical re-rank finished."
	);

	let mut slots = candidates.into_iter().map(Some).collect::<Vec<_>>();

	order.into_iter().take(k).filter_map(|i| slots[i].take()).collect()
}
