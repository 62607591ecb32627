//! Query resolution
//!
//! One call to [`Engine::ask`] runs a question through keyword overrides, the
//! filter chain, embedding, index search and selection, then records the
//! result in the caller's [`SessionMemory`].

use crate::config::EngineConfig;
use crate::overrides::{find_override, OverrideTrigger};
use kbquery_core::{Answer, Error, FilterChain, KnowledgeStore, QueryContext, Record, Result, SessionMemory};
use kbquery_similarity::{Embedder, Outcome, Scored, Selector};
use kbquery_storage::{load_store, KnowledgeSource};
use rand::Rng;
use serde::Serialize;

/// Result of one question
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    Answer { record: Record, score: f32 },
    Canned { text: String },
    NoMatch,
    LowConfidence { best_score: f32 },
}

impl Reply {
    /// Answers and canned replies; these are the replies kept in history.
    pub fn is_success(&self) -> bool {
        matches!(self, Reply::Answer { .. } | Reply::Canned { .. })
    }

    pub fn record(&self) -> Option<&Record> {
        match self {
            Reply::Answer { record, .. } => Some(record),
            _ => None,
        }
    }
}

pub struct Engine<E> {
    store: KnowledgeStore,
    config: EngineConfig,
    chain: FilterChain,
    selector: Selector,
    embedder: E,
}

impl<E: std::fmt::Debug> std::fmt::Debug for Engine<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("records", &self.store.len())
            .field("chain", &self.chain)
            .field("selector", &self.selector)
            .field("embedder", &self.embedder)
            .finish()
    }
}

impl<E: Embedder> Engine<E> {
    pub fn new(store: KnowledgeStore, config: EngineConfig, embedder: E) -> Result<Self> {
        config.validate()?;
        let selector = config.selector()?;
        let chain = FilterChain::from_config(&config.filters, &config.keywords);
        tracing::info!(
            records = store.len(),
            metric = ?config.metric,
            threshold = config.threshold,
            pool = selector.pool_size(),
            stages = ?chain.stage_names(),
            model = embedder.model_name(),
            "engine ready"
        );
        Ok(Self {
            store,
            config,
            chain,
            selector,
            embedder,
        })
    }

    /// Load the knowledge base with the configured schema.
    pub fn from_source(source: &KnowledgeSource, config: EngineConfig, embedder: E) -> Result<Self> {
        let store = load_store(source, &config.schema);
        Self::new(store, config, embedder)
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Answer `query` for one session.
    ///
    /// Only embedding failures and dimension mismatches are errors. An empty
    /// query is `NoMatch` and leaves the session untouched.
    pub fn ask<R: Rng + ?Sized>(&self, query: &str, session: &mut SessionMemory, rng: &mut R) -> Result<Reply> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Reply::NoMatch);
        }

        if let Some(hit) = find_override(&self.config.overrides, OverrideTrigger::BeforeRetrieval, query) {
            tracing::debug!(keywords = ?hit.keywords, "override before retrieval");
            return Ok(canned(query, &hit.reply, session));
        }

        let ctx = QueryContext::detect(query, &self.config.keywords);
        let mut candidates = self.chain.apply(&self.store, &ctx, session);
        if candidates.is_empty() {
            tracing::debug!(query, "no candidate survived filtering");
            return Ok(Reply::NoMatch);
        }
        if self.config.tie_break_by_id {
            // index search is stable, so equal scores come back in this order
            candidates.sort_by(|a, b| a.id().as_str().cmp(b.id().as_str()));
        }

        let texts: Vec<&str> = candidates.iter().map(|r| r.search_text()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;
        if vectors.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "{} returned {} vectors for {} texts",
                self.embedder.model_name(),
                vectors.len(),
                texts.len()
            )));
        }
        let query_vector = self.embedder.embed(query)?;

        let index = self.config.index.build(self.config.metric, vectors)?;
        let k = self.selector.pool_size().min(candidates.len());
        let scored: Vec<Scored<&Record>> = index
            .search(&query_vector, k)?
            .into_iter()
            .map(|(pos, score)| Scored::new(candidates[pos], score))
            .collect();

        match self.selector.select(scored, &self.config.metric, rng) {
            Outcome::NoMatch => Ok(Reply::NoMatch),
            Outcome::LowConfidence { best_score } => {
                tracing::debug!(best_score, threshold = self.selector.threshold(), "low confidence");
                Ok(Reply::LowConfidence { best_score })
            }
            Outcome::Answer { item, score } => {
                if let Some(hit) = find_override(&self.config.overrides, OverrideTrigger::OnConfidentMatch, query) {
                    tracing::debug!(keywords = ?hit.keywords, replaced = %item.id(), "override on confident match");
                    return Ok(canned(query, &hit.reply, session));
                }
                session.record_shown(item.id().clone());
                session.append_history(
                    query,
                    Answer::Record {
                        id: item.id().clone(),
                        display: item.display().clone(),
                        score,
                    },
                );
                Ok(Reply::Answer {
                    record: item.clone(),
                    score,
                })
            }
        }
    }

    /// The text a user sees for `reply`.
    pub fn render(&self, reply: &Reply) -> String {
        match reply {
            Reply::Answer { record, .. } => self
                .config
                .answer_field
                .as_deref()
                .and_then(|field| record.field_text(field))
                .map(|text| text.into_owned())
                .unwrap_or_else(|| record.search_text().to_string()),
            Reply::Canned { text } => text.clone(),
            Reply::NoMatch => self.config.messages.no_match.clone(),
            Reply::LowConfidence { .. } => self.config.messages.low_confidence.clone(),
        }
    }
}

fn canned(query: &str, text: &str, session: &mut SessionMemory) -> Reply {
    session.append_history(
        query,
        Answer::Canned {
            text: text.to_string(),
        },
    );
    Reply::Canned {
        text: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::KeywordOverride;
    use crate::presets;
    use kbquery_core::{RecordSchema, Vector};
    use kbquery_similarity::{HashEmbedder, IndexKind, Metric};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::collections::HashMap;

    /// Returns fixed vectors per text; unknown text is the origin.
    #[derive(Debug, Default)]
    struct FixedEmbedder {
        vectors: HashMap<String, Vec<f32>>,
    }

    impl FixedEmbedder {
        fn with(mut self, text: &str, v: &[f32]) -> Self {
            self.vectors.insert(text.to_string(), v.to_vec());
            self
        }
    }

    impl Embedder for FixedEmbedder {
        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "fixed"
        }

        fn embed(&self, text: &str) -> Result<Vector> {
            Ok(Vector::new(
                self.vectors.get(text).cloned().unwrap_or_else(|| vec![0.0, 0.0]),
            ))
        }
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "failing"
        }

        fn embed(&self, _text: &str) -> Result<Vector> {
            Err(Error::Embedding("model offline".to_string()))
        }
    }

    /// Returns one vector too many from a batch.
    struct PaddingEmbedder;

    impl Embedder for PaddingEmbedder {
        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "padding"
        }

        fn embed(&self, _text: &str) -> Result<Vector> {
            Ok(Vector::new(vec![1.0, 0.0]))
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>> {
            let mut vectors: Vec<Vector> = texts.iter().map(|_| Vector::new(vec![2.0, 0.0])).collect();
            vectors.push(Vector::new(vec![1.0, 0.0]));
            Ok(vectors)
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn heritage_store() -> KnowledgeStore {
        KnowledgeStore::from_raw(
            &RecordSchema::heritage(),
            vec![
                json!({"이름": "범어사 삼층석탑", "시대": "통일신라", "종류": "유형문화유산", "주소": "부산 금정구 청룡동"}),
                json!({"이름": "동래야류", "시대": "조선", "종류": "무형유산", "주소": "부산 동래구 온천동"}),
                json!({"이름": "강서 가락동 고분", "시대": "가야", "종류": "유형문화유산", "주소": "부산 강서구 대저동"}),
                json!({"이름": "부민동 임시수도 정부청사", "시대": "근대", "종류": "유형문화유산", "주소": "부산 서구 부민동"}),
            ],
        )
    }

    #[test]
    fn test_empty_knowledge_base() {
        let engine = Engine::new(KnowledgeStore::empty(), presets::plain_text(), HashEmbedder::default()).unwrap();
        let mut session = SessionMemory::new();
        let reply = engine.ask("아무거나", &mut session, &mut rng()).unwrap();
        assert_eq!(reply, Reply::NoMatch);
        assert!(session.is_empty());
    }

    #[test]
    fn test_single_sentence_answer() {
        let store = KnowledgeStore::from_sentences(["부산 면적은 770km²"]);
        let engine = Engine::new(store, presets::plain_text(), HashEmbedder::default()).unwrap();
        let mut session = SessionMemory::new();

        let reply = engine.ask("부산 면적", &mut session, &mut rng()).unwrap();
        match &reply {
            Reply::Answer { record, score } => {
                assert_eq!(record.search_text(), "부산 면적은 770km²");
                assert!(*score <= presets::HASHED_DISTANCE_THRESHOLD);
            }
            other => panic!("expected answer, got {:?}", other),
        }
        assert_eq!(engine.render(&reply), "부산 면적은 770km²");
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_low_confidence_leaves_session() {
        let store = KnowledgeStore::from_sentences(["far away"]);
        let embedder = FixedEmbedder::default().with("far away", &[30.0, 0.0]);
        let engine = Engine::new(store, presets::plain_text(), embedder).unwrap();
        let mut session = SessionMemory::new();

        let reply = engine.ask("question", &mut session, &mut rng()).unwrap();
        assert_eq!(reply, Reply::LowConfidence { best_score: 900.0 });
        assert!(session.is_empty());
        assert_eq!(engine.render(&reply), crate::config::DEFAULT_LOW_CONFIDENCE_MESSAGE);
    }

    #[test]
    fn test_history_most_recent_first() {
        let store = KnowledgeStore::from_sentences(["A", "B", "C"]);
        let embedder = FixedEmbedder::default()
            .with("A", &[1.0, 0.0])
            .with("B", &[0.0, 1.0])
            .with("C", &[5.0, 5.0])
            .with("qa", &[1.0, 0.0])
            .with("qb", &[0.0, 1.0])
            .with("qc", &[5.0, 5.0]);
        let engine = Engine::new(store, presets::plain_text(), embedder).unwrap();
        let mut session = SessionMemory::new();
        for q in ["qa", "qb", "qc"] {
            assert!(engine.ask(q, &mut session, &mut rng()).unwrap().is_success());
        }
        let order: Vec<&str> = session.history().iter().map(|h| h.query.as_str()).collect();
        assert_eq!(order, vec!["qc", "qb", "qa"]);
        assert_eq!(session.shown().len(), 3);

        session.reset();
        assert!(session.is_empty());
    }

    #[test]
    fn test_exclusion_never_repeats() {
        let engine = Engine::new(heritage_store(), presets::heritage(), HashEmbedder::default()).unwrap();
        let mut session = SessionMemory::new();
        let mut seen = Vec::new();
        for _ in 0..4 {
            let reply = engine.ask("유형문화유산 알려줘", &mut session, &mut rng()).unwrap();
            match reply {
                Reply::Answer { record, .. } => {
                    assert!(!seen.contains(&record.id().clone()));
                    seen.push(record.id().clone());
                }
                Reply::NoMatch => break,
                other => panic!("unexpected {:?}", other),
            }
        }
        // three tangible items, then nothing new
        assert_eq!(seen.len(), 3);
        assert_eq!(
            engine.ask("유형문화유산 알려줘", &mut session, &mut rng()).unwrap(),
            Reply::NoMatch
        );
    }

    #[test]
    fn test_region_precedence_end_to_end() {
        let engine = Engine::new(heritage_store(), presets::heritage(), HashEmbedder::default()).unwrap();

        let mut session = SessionMemory::new();
        let reply = engine.ask("강서구 문화유산", &mut session, &mut rng()).unwrap();
        assert_eq!(reply.record().unwrap().id().as_str(), "강서 가락동 고분");

        let mut session = SessionMemory::new();
        let reply = engine.ask("서구 문화유산", &mut session, &mut rng()).unwrap();
        assert_eq!(reply.record().unwrap().id().as_str(), "부민동 임시수도 정부청사");
    }

    #[test]
    fn test_era_filter() {
        let engine = Engine::new(heritage_store(), presets::heritage(), HashEmbedder::default()).unwrap();
        let mut session = SessionMemory::new();
        let reply = engine.ask("조선시대 유산", &mut session, &mut rng()).unwrap();
        assert_eq!(reply.record().unwrap().id().as_str(), "동래야류");
    }

    #[test]
    fn test_before_retrieval_override() {
        let store = KnowledgeStore::from_sentences(["부산 인구는 약 325만 명"]);
        let engine = Engine::new(store, presets::population(), HashEmbedder::default()).unwrap();
        let mut session = SessionMemory::new();

        let reply = engine.ask("부산 면적은?", &mut session, &mut rng()).unwrap();
        assert_eq!(
            reply,
            Reply::Canned {
                text: presets::BUSAN_AREA_REPLY.to_string()
            }
        );
        assert_eq!(session.history().len(), 1);
        assert!(session.shown().is_empty());
    }

    #[test]
    fn test_confident_match_override() {
        let store = KnowledgeStore::from_sentences(["부산 인구는 약 325만 명"]);
        let engine = Engine::new(store, presets::population(), HashEmbedder::default()).unwrap();
        let mut session = SessionMemory::new();

        let reply = engine.ask("전국 인구는 약 몇 명이야", &mut session, &mut rng()).unwrap();
        assert_eq!(engine.render(&reply), presets::NATIONWIDE_POPULATION_REPLY);
        assert!(session.shown().is_empty());

        let reply = engine.ask("부산 인구", &mut session, &mut rng()).unwrap();
        assert!(matches!(reply, Reply::Answer { .. }));
    }

    #[test]
    fn test_district_containing_city_name_is_answered() {
        let store = KnowledgeStore::from_sentences(["해운대구 인구는 38만 명", "부산 인구는 약 325만 명"]);
        let engine = Engine::new(store, presets::population(), HashEmbedder::default()).unwrap();
        let mut session = SessionMemory::new();

        let reply = engine.ask("해운대구 인구", &mut session, &mut rng()).unwrap();
        match &reply {
            Reply::Answer { record, .. } => assert_eq!(record.search_text(), "해운대구 인구는 38만 명"),
            other => panic!("expected answer, got {:?}", other),
        }
        assert_eq!(session.shown().len(), 1);
    }

    #[test]
    fn test_unrelated_query_is_low_confidence() {
        let store = KnowledgeStore::from_sentences(["부산 인구는 약 325만 명"]);
        let engine = Engine::new(store, presets::population(), HashEmbedder::default()).unwrap();
        let mut session = SessionMemory::new();

        let reply = engine.ask("the quick brown fox", &mut session, &mut rng()).unwrap();
        assert!(matches!(reply, Reply::LowConfidence { .. }), "got {:?}", reply);
        assert_eq!(
            engine.render(&reply),
            "질문이 잘 이해되지 않습니다. 다른 방식으로 질문해주세요."
        );
        assert!(session.is_empty());
    }

    #[test]
    fn test_search_keyword_and_answer_field() {
        let raw = vec![
            json!({"search": "부산 계절별 강수량", "full": "부산의 여름 강수량은 약 750mm입니다."}),
            json!({"search": "부산 연평균 기온", "full": "부산의 연평균 기온은 약 14.7도입니다."}),
        ];
        let store = KnowledgeStore::from_raw(&RecordSchema::search_full(), raw);
        let engine = Engine::new(store, presets::search_full(), HashEmbedder::default()).unwrap();
        let mut session = SessionMemory::new();
        let reply = engine.ask("부산 계절별 기온", &mut session, &mut rng()).unwrap();
        assert_eq!(engine.render(&reply), "부산의 여름 강수량은 약 750mm입니다.");
    }

    #[test]
    fn test_embedding_failure_is_error() {
        let store = KnowledgeStore::from_sentences(["a"]);
        let engine = Engine::new(store, presets::plain_text(), FailingEmbedder).unwrap();
        let mut session = SessionMemory::new();
        let err = engine.ask("a", &mut session, &mut rng()).unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert!(session.is_empty());
    }

    #[test]
    fn test_batch_length_mismatch_is_error() {
        let store = KnowledgeStore::from_sentences(["a", "b"]);
        let engine = Engine::new(store, presets::plain_text(), PaddingEmbedder).unwrap();
        let mut session = SessionMemory::new();
        let err = engine.ask("a", &mut session, &mut rng()).unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert!(session.is_empty());
    }

    #[test]
    fn test_exact_ties_break_by_id() {
        let store = KnowledgeStore::from_raw(
            &RecordSchema::heritage(),
            vec![
                json!({"이름": "다대포 객사", "시대": "조선"}),
                json!({"이름": "가덕도 척화비", "시대": "조선"}),
                json!({"이름": "나무 장승", "시대": "조선"}),
            ],
        );
        // every vector is the origin, so all cosine scores tie at zero
        let engine = Engine::new(store, presets::heritage(), FixedEmbedder::default()).unwrap();
        for seed in 0..20 {
            let mut session = SessionMemory::new();
            let reply = engine.ask("문화유산", &mut session, &mut StdRng::seed_from_u64(seed)).unwrap();
            assert_eq!(reply.record().unwrap().id().as_str(), "가덕도 척화비");
        }

        let mut config = presets::heritage();
        config.tie_break_by_id = false;
        let store = engine.store().clone();
        let engine = Engine::new(store, config, FixedEmbedder::default()).unwrap();
        let reply = engine.ask("문화유산", &mut SessionMemory::new(), &mut rng()).unwrap();
        assert_eq!(reply.record().unwrap().id().as_str(), "다대포 객사");
    }

    #[test]
    fn test_empty_query_is_no_match() {
        let store = KnowledgeStore::from_sentences(["a"]);
        let engine = Engine::new(store, presets::plain_text(), HashEmbedder::default()).unwrap();
        let mut session = SessionMemory::new();
        assert_eq!(engine.ask("   ", &mut session, &mut rng()).unwrap(), Reply::NoMatch);
        assert!(session.is_empty());
    }

    #[test]
    fn test_pool_draws_among_ties() {
        let store = KnowledgeStore::from_sentences(["t1", "t2", "t3", "other"]);
        let embedder = FixedEmbedder::default()
            .with("t1", &[1.0, 0.0])
            .with("t2", &[1.0, 0.0])
            .with("t3", &[1.0, 0.0])
            .with("other", &[9.0, 9.0])
            .with("q", &[1.0, 0.0]);
        let mut config = presets::plain_text().with_pool_size(10);
        config.index = IndexKind::Matrix;
        let engine = Engine::new(store, config, embedder).unwrap();

        let mut picked = std::collections::HashSet::new();
        for seed in 0..200 {
            let mut session = SessionMemory::new();
            let reply = engine.ask("q", &mut session, &mut StdRng::seed_from_u64(seed)).unwrap();
            let id = reply.record().unwrap().id().as_str().to_string();
            assert_ne!(id, "other");
            picked.insert(id);
        }
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn test_wide_epsilon_draws_from_whole_pool() {
        let mut config = presets::heritage().with_pool_size(20);
        config.tie_epsilon = Some(2.0);
        let engine = Engine::new(heritage_store(), config, HashEmbedder::default()).unwrap();

        let mut picked = std::collections::HashSet::new();
        for seed in 0..100 {
            let mut session = SessionMemory::new();
            let reply = engine.ask("부산 문화유산", &mut session, &mut StdRng::seed_from_u64(seed)).unwrap();
            picked.insert(reply.record().unwrap().id().as_str().to_string());
        }
        assert_eq!(picked.len(), 4);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = presets::plain_text().with_pool_size(0);
        assert!(Engine::new(KnowledgeStore::empty(), config, HashEmbedder::default()).is_err());
    }

    #[test]
    fn test_overrides_in_config_order() {
        let mut config = EngineConfig::for_metric(Metric::Cosine);
        config.overrides = vec![
            KeywordOverride::new(OverrideTrigger::BeforeRetrieval, ["날씨"], "first"),
            KeywordOverride::new(OverrideTrigger::BeforeRetrieval, ["날씨"], "second"),
        ];
        let engine = Engine::new(KnowledgeStore::empty(), config, HashEmbedder::default()).unwrap();
        let reply = engine.ask("오늘 날씨", &mut SessionMemory::new(), &mut rng()).unwrap();
        assert_eq!(reply, Reply::Canned { text: "first".to_string() });
    }
}
