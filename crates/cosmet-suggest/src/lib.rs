pub mod classifier;
pub mod fallback;

pub use classifier::{
    parse_reply, ClassifierConfig, ClassifyError, HttpClassifier, ParsedReply, TaxonClassifier,
};
pub use fallback::fallback_rank;

use chrono::{DateTime, Utc};
use cosmet_core::contracts::{SuggestFailureKind, SuggestTarget, SuggestionCandidate, TaxonCandidate};
use cosmet_prefilter::Prefilter;
use cosmet_storage::{InventoryStore, StorageError};
use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("classifier call timed out after {0:?}")]
    ClassifierTimeout(Duration),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SuggestError {
    pub fn failure_kind(&self) -> SuggestFailureKind {
        match self {
            Self::ClassifierTimeout(_) => SuggestFailureKind::Timeout,
            Self::Storage(_) => SuggestFailureKind::ProviderError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionSource {
    Classifier,
    Fallback,
    /// Both the classifier and the fallback ranker agreed there is no match.
    None,
}

/// Counters for one suggestion request. Swallowed classifier noise (malformed
/// entries, hallucinated ids) surfaces here instead of disappearing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SuggestReport {
    pub offered: usize,
    pub narrowed: usize,
    pub raw_candidates: usize,
    pub dropped_malformed: usize,
    pub dropped_unknown_ids: usize,
    pub fallback_used: bool,
    pub audit_records: usize,
}

#[derive(Debug)]
pub struct SuggestOutcome {
    pub candidates: Vec<SuggestionCandidate>,
    /// Audit record ids, parallel to `candidates`; the caller needs these to
    /// confirm or override a suggestion later.
    pub record_ids: Vec<i64>,
    pub source: SuggestionSource,
    pub report: SuggestReport,
}

/// Category suggestion pipeline: narrow the leaf set with keyword rules, ask
/// the external classifier within that set, discard ids it was never offered,
/// and fall through to the deterministic ranker when nothing survives. Every
/// emitted candidate gets an audit row.
pub struct SuggestionPipeline<C> {
    classifier: C,
    prefilter: Prefilter,
    top_k: usize,
}

impl<C: TaxonClassifier> SuggestionPipeline<C> {
    pub fn new(classifier: C, prefilter: Prefilter, top_k: usize) -> Self {
        Self {
            classifier,
            prefilter,
            top_k,
        }
    }

    pub fn suggest_category(
        &self,
        leaves: &[TaxonCandidate],
        store: &InventoryStore,
        user_id: i64,
        item_id: Option<i64>,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<SuggestOutcome, SuggestError> {
        let mut report = SuggestReport {
            offered: leaves.len(),
            ..SuggestReport::default()
        };

        let narrowed = self.prefilter.narrow(leaves, text);
        report.narrowed = narrowed.len();

        // Timeout propagates untouched so the caller can surface a retryable
        // error; other classifier failures degrade to an empty list.
        let raw = match self.classifier.classify(&narrowed, text, self.top_k) {
            Ok(candidates) => candidates,
            Err(ClassifyError::Timeout(bound)) => {
                return Err(SuggestError::ClassifierTimeout(bound));
            }
            Err(ClassifyError::Transport(reason)) => {
                tracing::warn!(%reason, "classifier call failed, falling back");
                Vec::new()
            }
        };
        report.raw_candidates = raw.len();

        // Ids the classifier was never offered are hallucinations: expected
        // noise, filtered rather than reported.
        let offered_ids = narrowed.iter().map(|c| c.id).collect::<BTreeSet<_>>();
        let mut validated = Vec::with_capacity(raw.len());
        for candidate in raw {
            if offered_ids.contains(&candidate.taxon_id) {
                validated.push(candidate);
            } else {
                tracing::warn!(taxon_id = candidate.taxon_id, "classifier suggested an id outside the offered set");
                report.dropped_unknown_ids += 1;
            }
        }

        let (candidates, source) = if validated.is_empty() {
            report.fallback_used = true;
            let ranked = fallback_rank(&narrowed, text, self.top_k);
            if ranked.is_empty() {
                (ranked, SuggestionSource::None)
            } else {
                (ranked, SuggestionSource::Fallback)
            }
        } else {
            (validated, SuggestionSource::Classifier)
        };

        let mut record_ids = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let record_id = store.insert_suggestion(
                user_id,
                item_id,
                SuggestTarget::Category,
                Some(candidate.taxon_id),
                now,
            )?;
            record_ids.push(record_id);
        }
        // A no-match request still leaves a trace in the audit trail.
        if candidates.is_empty() {
            store.insert_suggestion(user_id, item_id, SuggestTarget::Category, None, now)?;
            report.audit_records = 1;
        } else {
            report.audit_records = record_ids.len();
        }

        Ok(SuggestOutcome {
            candidates,
            record_ids,
            source,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct ScriptedClassifier {
        result: Result<Vec<SuggestionCandidate>, ClassifyError>,
    }

    impl TaxonClassifier for ScriptedClassifier {
        fn classify(
            &self,
            _candidates: &[TaxonCandidate],
            _text: &str,
            _top_k: usize,
        ) -> Result<Vec<SuggestionCandidate>, ClassifyError> {
            match &self.result {
                Ok(candidates) => Ok(candidates.clone()),
                Err(ClassifyError::Timeout(bound)) => Err(ClassifyError::Timeout(*bound)),
                Err(ClassifyError::Transport(reason)) => {
                    Err(ClassifyError::Transport(reason.clone()))
                }
            }
        }
    }

    fn pipeline(
        result: Result<Vec<SuggestionCandidate>, ClassifyError>,
    ) -> SuggestionPipeline<ScriptedClassifier> {
        SuggestionPipeline::new(ScriptedClassifier { result }, Prefilter::default(), 3)
    }

    fn leaves() -> Vec<TaxonCandidate> {
        vec![
            TaxonCandidate::new(1, "マスカラ", "メイクアップ > アイメイク > マスカラ"),
            TaxonCandidate::new(2, "アイライナー", "メイクアップ > アイメイク > アイライナー"),
            TaxonCandidate::new(3, "口紅", "メイクアップ > リップ > 口紅"),
            TaxonCandidate::new(4, "化粧水", "スキンケア > 保湿ケア > 化粧水"),
        ]
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_771_840_800, 0).single().expect("valid ts")
    }

    #[test]
    fn classifier_result_is_audited_per_candidate() {
        let pipeline = pipeline(Ok(vec![SuggestionCandidate::new(
            4,
            "スキンケア > 保湿ケア > 化粧水",
            0.9,
        )]));
        let store = InventoryStore::open_in_memory().expect("db");
        let outcome = pipeline
            .suggest_category(&leaves(), &store, 7, None, "無印良品 化粧水", now())
            .expect("suggest");

        assert_eq!(outcome.source, SuggestionSource::Classifier);
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.record_ids.len(), 1);
        assert_eq!(outcome.report.audit_records, 1);
        assert!(!outcome.report.fallback_used);

        let record = store
            .suggestion(outcome.record_ids[0])
            .expect("load")
            .expect("exists");
        assert_eq!(record.suggested_taxon_id, Some(4));
        assert!(!record.accepted);
    }

    #[test]
    fn hallucinated_ids_are_filtered_then_fallback_runs() {
        // 999 was never offered; after filtering nothing remains, so the
        // deterministic ranker takes over.
        let pipeline = pipeline(Ok(vec![SuggestionCandidate::new(999, "偽のパス", 0.99)]));
        let store = InventoryStore::open_in_memory().expect("db");
        let outcome = pipeline
            .suggest_category(&leaves(), &store, 7, None, "マスカラ 資生堂", now())
            .expect("suggest");

        assert_eq!(outcome.report.dropped_unknown_ids, 1);
        assert!(outcome.report.fallback_used);
        assert_eq!(outcome.source, SuggestionSource::Fallback);
        assert_eq!(outcome.candidates[0].taxon_id, 1);
    }

    #[test]
    fn prefilter_bounds_the_offered_set() {
        let pipeline = pipeline(Ok(Vec::new()));
        let store = InventoryStore::open_in_memory().expect("db");
        let outcome = pipeline
            .suggest_category(&leaves(), &store, 7, None, "マスカラ 資生堂", now())
            .expect("suggest");

        assert_eq!(outcome.report.offered, 4);
        assert_eq!(outcome.report.narrowed, 1);
    }

    #[test]
    fn transport_failure_degrades_to_fallback() {
        let pipeline = pipeline(Err(ClassifyError::Transport("boom".to_string())));
        let store = InventoryStore::open_in_memory().expect("db");
        let outcome = pipeline
            .suggest_category(&leaves(), &store, 7, None, "リップスティック", now())
            .expect("suggest");

        assert_eq!(outcome.source, SuggestionSource::Fallback);
        assert_eq!(outcome.candidates[0].taxon_id, 3);
    }

    #[test]
    fn timeout_propagates_and_writes_no_audit_rows() {
        let pipeline = pipeline(Err(ClassifyError::Timeout(Duration::from_secs(25))));
        let store = InventoryStore::open_in_memory().expect("db");
        let result = pipeline.suggest_category(&leaves(), &store, 7, None, "マスカラ", now());

        assert!(matches!(result, Err(SuggestError::ClassifierTimeout(_))));
        assert_eq!(
            result.unwrap_err().failure_kind(),
            SuggestFailureKind::Timeout
        );
        assert_eq!(
            store
                .suggestion_acceptance(SuggestTarget::Category)
                .expect("acceptance"),
            (0, 0)
        );
        assert!(store.suggestion(1).expect("load").is_none());
    }

    #[test]
    fn agreed_no_match_is_a_valid_outcome_with_one_audit_row() {
        let pipeline = pipeline(Ok(Vec::new()));
        let store = InventoryStore::open_in_memory().expect("db");
        let outcome = pipeline
            .suggest_category(&leaves(), &store, 7, None, "謎のノベルティグッズ", now())
            .expect("suggest");

        assert_eq!(outcome.source, SuggestionSource::None);
        assert!(outcome.candidates.is_empty());
        assert!(outcome.record_ids.is_empty());
        assert_eq!(outcome.report.audit_records, 1);

        let record = store.suggestion(1).expect("load").expect("exists");
        assert_eq!(record.suggested_taxon_id, None);
    }
}
