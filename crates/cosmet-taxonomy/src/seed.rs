use crate::{TaxonomyError, TaxonomyStore};
use cosmet_core::shelf_life::ShelfLifeRule;

struct Seeder {
    store: TaxonomyStore,
    next_id: i64,
}

impl Seeder {
    fn add(
        &mut self,
        name: &str,
        parent: Option<i64>,
        rule: ShelfLifeRule,
    ) -> Result<i64, TaxonomyError> {
        let id = self.next_id;
        self.next_id += 1;
        self.store.insert(id, name, parent, rule)?;
        Ok(id)
    }

    fn add_leaves(
        &mut self,
        parent: i64,
        rule: ShelfLifeRule,
        names: &[&str],
    ) -> Result<(), TaxonomyError> {
        for name in names {
            self.add(name, Some(parent), rule)?;
        }
        Ok(())
    }
}

/// Default three-level category tree: main categories, subcategories and
/// product types, with shelf-life rules per subtree. Opened mascara turns
/// fast; lip products keep for over a year; skincare is rounded to the end
/// of the month the way the packaging-date guidance reads.
pub fn seed_default() -> Result<TaxonomyStore, TaxonomyError> {
    let twelve = ShelfLifeRule::same_day(12);
    let mascara_rule = ShelfLifeRule::same_day(6);
    let lip_rule = ShelfLifeRule::same_day(18);
    let skincare_rule = ShelfLifeRule::end_of_month(6);
    let haircare_rule = ShelfLifeRule::same_day(12);
    let fragrance_rule = ShelfLifeRule::same_day(24);

    let mut seeder = Seeder {
        store: TaxonomyStore::new(),
        next_id: 1,
    };

    let makeup = seeder.add("メイクアップ", None, twelve)?;
    let skincare = seeder.add("スキンケア", None, skincare_rule)?;
    let haircare = seeder.add("ヘアケア", None, haircare_rule)?;
    let fragrance = seeder.add("フレグランス", None, fragrance_rule)?;

    let face = seeder.add("ベースメイク", Some(makeup), twelve)?;
    seeder.add_leaves(
        face,
        twelve,
        &[
            "ファンデーション",
            "コンシーラー",
            "BBクリーム",
            "CCクリーム",
            "フェイスパウダー",
            "プライマー",
        ],
    )?;

    let eye = seeder.add("アイメイク", Some(makeup), twelve)?;
    seeder.add("アイシャドウ", Some(eye), twelve)?;
    seeder.add("アイライナー", Some(eye), ShelfLifeRule::same_day(6))?;
    seeder.add("マスカラ", Some(eye), mascara_rule)?;
    seeder.add("アイブロウ", Some(eye), twelve)?;

    let lip = seeder.add("リップ", Some(makeup), lip_rule)?;
    seeder.add_leaves(
        lip,
        lip_rule,
        &[
            "口紅",
            "リップグロス",
            "リップティント",
            "リップライナー",
            "リップバーム",
        ],
    )?;

    let cheek = seeder.add("チーク", Some(makeup), twelve)?;
    seeder.add_leaves(
        cheek,
        twelve,
        &["パウダーチーク", "クリームチーク", "チークティント"],
    )?;

    let cleansers = seeder.add("クレンジング・洗顔", Some(skincare), skincare_rule)?;
    seeder.add_leaves(
        cleansers,
        skincare_rule,
        &[
            "クレンジングオイル",
            "クレンジングフォーム",
            "クレンジングジェル",
            "ミセラーウォーター",
            "洗顔料",
        ],
    )?;

    let moisturizers = seeder.add("保湿ケア", Some(skincare), skincare_rule)?;
    seeder.add_leaves(
        moisturizers,
        skincare_rule,
        &[
            "化粧水",
            "乳液",
            "フェイスクリーム",
            "フェイスオイル",
            "美容オイル",
        ],
    )?;

    let treatments = seeder.add("美容液・トリートメント", Some(skincare), skincare_rule)?;
    seeder.add_leaves(
        treatments,
        skincare_rule,
        &["美容液", "アンプル", "セラム", "アイクリーム", "ニキビケア"],
    )?;

    let masks = seeder.add("パック・マスク", Some(skincare), skincare_rule)?;
    seeder.add_leaves(
        masks,
        skincare_rule,
        &[
            "シートマスク",
            "クレイマスク",
            "ジェルマスク",
            "スリーピングマスク",
        ],
    )?;

    let shampoo = seeder.add("シャンプー・コンディショナー", Some(haircare), haircare_rule)?;
    seeder.add_leaves(
        shampoo,
        haircare_rule,
        &["シャンプー", "コンディショナー", "スカルプケア"],
    )?;

    let styling = seeder.add("スタイリング剤", Some(haircare), haircare_rule)?;
    seeder.add_leaves(
        styling,
        haircare_rule,
        &["ヘアワックス", "ヘアスプレー", "ヘアジェル", "ヘアオイル"],
    )?;

    let hair_treatments = seeder.add("トリートメント", Some(haircare), haircare_rule)?;
    seeder.add_leaves(
        hair_treatments,
        haircare_rule,
        &["ヘアマスク", "ヘアパック", "ヘアエッセンス"],
    )?;

    let perfume = seeder.add("香水", Some(fragrance), fragrance_rule)?;
    seeder.add_leaves(
        perfume,
        fragrance_rule,
        &["オードパルファム", "オードトワレ", "ソリッドパフューム"],
    )?;

    let body_mist = seeder.add("ボディミスト", Some(fragrance), fragrance_rule)?;
    seeder.add_leaves(body_mist, fragrance_rule, &["ボディミスト", "ルームスプレー"])?;

    Ok(seeder.store)
}
