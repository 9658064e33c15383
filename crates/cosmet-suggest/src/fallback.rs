use cosmet_core::contracts::{SuggestionCandidate, TaxonCandidate};

/// Synonym groups worth a strong (+3) hit when the group matches both the
/// item text and the candidate's name or breadcrumb.
const STRONG_GROUPS: &[&[&str]] = &[
    &["マスカラ", "mascara"],
    &["化粧水", "ローション", "トナー", "toner", "lotion"],
    &["口紅", "リップスティック", "lipstick"],
    &["クレンジングオイル", "cleansing oil"],
];

/// Category-indicative single tokens, +1 each when present on both sides.
const WEAK_TOKENS: &[&str] = &[
    "アイライナー",
    "アイシャドウ",
    "アイブロウ",
    "ファンデーション",
    "コンシーラー",
    "フェイスパウダー",
    "チーク",
    "グロス",
    "リップ",
    "乳液",
    "美容液",
    "クリーム",
    "洗顔",
    "日焼け止め",
    "シャンプー",
    "コンディショナー",
    "トリートメント",
    "ヘアオイル",
    "香水",
    "ネイル",
];

/// Deterministic keyword ranker used when the external classifier yields no
/// validated candidate. Pure function of its inputs: identical calls return
/// identical ordered output.
pub fn fallback_rank(
    candidates: &[TaxonCandidate],
    text: &str,
    top_k: usize,
) -> Vec<SuggestionCandidate> {
    let haystack = text.to_lowercase();

    let mut scored = candidates
        .iter()
        .filter_map(|candidate| {
            let score = score_candidate(candidate, &haystack);
            (score > 0).then_some((score, candidate))
        })
        .collect::<Vec<_>>();

    // sort_by is stable: ties keep input order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(top_k)
        .map(|(score, candidate)| {
            let confidence = (f64::from(score) / 5.0).min(0.9);
            SuggestionCandidate::new(candidate.id, candidate.path.clone(), confidence)
        })
        .collect()
}

fn score_candidate(candidate: &TaxonCandidate, haystack: &str) -> u32 {
    let label = format!("{} {}", candidate.name, candidate.path).to_lowercase();
    let mut score = 0;

    for group in STRONG_GROUPS {
        let in_text = group.iter().any(|word| haystack.contains(&word.to_lowercase()));
        let in_label = group.iter().any(|word| label.contains(&word.to_lowercase()));
        if in_text && in_label {
            score += 3;
        }
    }

    for token in WEAK_TOKENS {
        let token = token.to_lowercase();
        if haystack.contains(&token) && label.contains(&token) {
            score += 1;
        }
    }

    score
}
