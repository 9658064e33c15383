use cosmet_core::contracts::TaxonCandidate;

/// One narrowing rule: if any trigger occurs in the item text, keep only the
/// candidates whose name or breadcrumb contains one of the target labels.
#[derive(Debug, Clone)]
pub struct PrefilterRule {
    pub triggers: Vec<String>,
    pub targets: Vec<String>,
}

impl PrefilterRule {
    pub fn new<T, U>(triggers: &[T], targets: &[U]) -> Self
    where
        T: AsRef<str>,
        U: AsRef<str>,
    {
        Self {
            triggers: triggers.iter().map(|t| t.as_ref().to_string()).collect(),
            targets: targets.iter().map(|t| t.as_ref().to_string()).collect(),
        }
    }
}

/// Keyword-rule candidate narrowing ahead of the external classifier. Rules
/// are ordered and mutually exclusive: the first rule whose trigger occurs in
/// the text wins, later rules are never consulted. A correct hit shrinks the
/// classifier's choice to a handful of leaves and bounds the payload.
#[derive(Debug, Clone)]
pub struct Prefilter {
    rules: Vec<PrefilterRule>,
}

impl Prefilter {
    pub fn new(rules: Vec<PrefilterRule>) -> Self {
        Self { rules }
    }

    pub fn narrow(&self, candidates: &[TaxonCandidate], text: &str) -> Vec<TaxonCandidate> {
        let haystack = text.to_lowercase();
        for rule in &self.rules {
            let triggered = rule
                .triggers
                .iter()
                .any(|trigger| haystack.contains(&trigger.to_lowercase()));
            if !triggered {
                continue;
            }

            // Once a rule fires, its target subset is the answer, even when
            // that subset is empty.
            return candidates
                .iter()
                .filter(|candidate| {
                    let name = candidate.name.to_lowercase();
                    let path = candidate.path.to_lowercase();
                    rule.targets.iter().any(|target| {
                        let target = target.to_lowercase();
                        name.contains(&target) || path.contains(&target)
                    })
                })
                .cloned()
                .collect();
        }
        candidates.to_vec()
    }
}

impl Default for Prefilter {
    fn default() -> Self {
        Self::new(vec![
            PrefilterRule::new(&["マスカラ", "mascara"], &["マスカラ"]),
            PrefilterRule::new(
                &["化粧水", "ローション", "トナー", "toner", "lotion"],
                &["化粧水"],
            ),
            PrefilterRule::new(&["口紅", "リップスティック", "lipstick"], &["口紅"]),
            PrefilterRule::new(
                &["クレンジングオイル", "cleansing oil"],
                &["クレンジングオイル"],
            ),
            PrefilterRule::new(
                &["ファンデーション", "ファンデ", "foundation"],
                &["ファンデーション"],
            ),
            PrefilterRule::new(&["アイシャドウ", "eyeshadow"], &["アイシャドウ"]),
            PrefilterRule::new(&["シャンプー", "shampoo"], &["シャンプー"]),
            PrefilterRule::new(
                &["香水", "オードパルファム", "オードトワレ", "perfume"],
                &["香水"],
            ),
        ])
    }
}
