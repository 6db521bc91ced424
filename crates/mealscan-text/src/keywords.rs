//! Built-in English keyword hints and compound-dish rules.
//!
//! Keywords are matched against lower-cased captions, so every key here is
//! lower-case. Entries are scanned in table order, which fixes the order of
//! detected identifiers.

pub const KEYWORD_TABLE: &[(&str, &str)] = &[
    ("croissant", "クロワッサン"),
    ("yogurt", "プレーンヨーグルト"),
    ("strawberry", "イチゴ"),
    ("raspberry", "ラズベリー"),
    ("berries", "ラズベリー"),
    ("toast", "トースト"),
    ("jam", "ジャム"),
    ("milk", "牛乳"),
    ("cereal", "シリアル"),
    ("boiled egg", "ゆで卵"),
    ("pancake", "パンケーキ"),
    ("french toast", "フレンチトースト"),
    ("bread", "食パン"),
    ("baguette", "バゲット"),
    ("rice", "ごはん"),
    ("chicken", "鶏肉"),
    ("spinach", "ほうれん草"),
    ("egg", "卵"),
    ("natto", "納豆"),
    ("miso soup", "味噌汁"),
    ("soup", "味噌汁"),
    ("salmon", "鮭"),
    ("fish", "鮭"),
    ("tofu", "豆腐"),
    ("pasta", "パスタ"),
    ("spaghetti", "パスタ"),
    ("steak", "ステーキ"),
    ("hamburger", "ハンバーグ"),
    ("burger", "ハンバーグ"),
    ("curry", "カレーライス"),
    ("ramen", "ラーメン"),
    ("noodle", "ラーメン"),
    ("dumpling", "餃子"),
    ("gyoza", "餃子"),
    ("fried rice", "炒飯"),
    ("sandwich", "サンドイッチ"),
    ("katsudon", "カツ丼"),
    ("oyakodon", "親子丼"),
    ("gyudon", "牛丼"),
    ("beef bowl", "牛丼"),
    ("tempura", "天ぷら"),
    ("grilled fish", "焼き魚"),
    ("shrimp", "エビチリ"),
    ("tomato", "トマト"),
    ("broccoli", "ブロッコリー"),
    ("carrot", "人参"),
    ("cucumber", "きゅうり"),
    ("onion", "玉ねぎ"),
    ("potato", "じゃがいも"),
    ("salad", "サラダ"),
    ("banana", "バナナ"),
    ("apple", "リンゴ"),
    ("avocado", "アボカド"),
    ("chocolate", "チョコレート"),
    ("cookie", "クッキー"),
    ("ice cream", "アイスクリーム"),
    ("donut", "ドーナツ"),
    ("chips", "ポテトチップス"),
    ("pizza", "ピザ"),
    ("coffee", "コーヒー"),
];

/// A dish inferred from co-occurring keywords: every group must have at
/// least one keyword present in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundRule {
    pub groups: Vec<Vec<String>>,
    pub target: String,
}

impl CompoundRule {
    pub fn new(groups: &[&[&str]], target: impl Into<String>) -> Self {
        let groups = groups
            .iter()
            .map(|g| g.iter().map(|k| k.to_lowercase()).collect())
            .collect();
        Self { groups, target: target.into() }
    }

    /// True when every group is satisfied. `contains` decides what "present" means.
    pub fn applies<F>(&self, contains: F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        !self.groups.is_empty() && self.groups.iter().all(|group| group.iter().any(|k| contains(k)))
    }
}

pub fn default_rules() -> Vec<CompoundRule> {
    vec![
        CompoundRule::new(&[&["rice", "bowl"], &["egg"], &["chicken", "meat"]], "親子丼"),
        CompoundRule::new(&[&["rice", "bowl"], &["egg"], &["pork", "cutlet"]], "カツ丼"),
    ]
}
