//! Browsing groups for manual selection when detection finds nothing.
use crate::catalog::FoodCatalog;

pub struct FoodCategory {
    pub name: &'static str,
    pub foods: &'static [&'static str],
}

pub const FOOD_CATEGORIES: &[FoodCategory] = &[
    FoodCategory {
        name: "朝食",
        foods: &[
            "クロワッサン", "プレーンヨーグルト", "イチゴ", "ラズベリー", "トースト", "ジャム", "牛乳", "シリアル",
            "ゆで卵", "パンケーキ", "フレンチトースト", "メロンパン", "あんぱん", "食パン", "バゲット",
            "クロワワッサンサンド",
        ],
    },
    FoodCategory {
        name: "昼食・夕食",
        foods: &[
            "ごはん", "鶏肉", "ほうれん草", "卵", "納豆", "味噌汁", "鮭", "豆腐", "パスタ", "ステーキ", "ハンバーグ",
            "カレーライス", "ラーメン", "餃子", "炒飯", "サンドイッチ", "ツナサンド", "ハムチーズサンド", "ミックスサンド",
            "カツ丼", "親子丼", "牛丼", "天ぷら", "ざるそば", "うどん", "焼き魚", "煮物", "ほうれん草のおひたし",
            "豚の角煮", "麻婆豆腐", "エビチリ", "青椒肉絲", "回鍋肉", "春巻き", "小籠包", "焼きそば", "お好み焼き",
            "たこ焼き", "茶碗蒸し", "冷奴", "味噌カツ", "手羽先の唐揚げ", "鶏肉の照り焼き", "肉じゃが", "魚の煮付け",
        ],
    },
    FoodCategory {
        name: "お店の弁当・惣菜",
        foods: &["フライドポテト", "ハンバーガー", "カニクリームコロッケ", "鶏の唐揚げ", "豚の生姜焼き"],
    },
    FoodCategory {
        name: "野菜・フルーツ",
        foods: &[
            "トマト", "ブロッコリー", "人参", "きゅうり", "玉ねぎ", "じゃがいも", "ピーマン", "海藻サラダ", "サラダ",
            "バナナ", "リンゴ", "アボカド",
        ],
    },
    FoodCategory { name: "飲み物", foods: &["コーヒー", "オレンジジュース", "コーンスープ", "酸辣湯"] },
    FoodCategory {
        name: "その他",
        foods: &[
            "オリーブ", "メープルシロップ", "サラダチキン", "プロテインバー", "アーモンド", "ピーナッツ", "くるみ",
            "カシューナッツ", "ポテトサラダ", "シーザーサラダ", "豆腐サラダ", "チキンサラダ",
        ],
    },
    FoodCategory {
        name: "おやつ",
        foods: &[
            "チョコレート", "クッキー", "ビスケット", "和菓子（大福、団子、羊羹など）", "ドーナツ", "アイスクリーム",
            "ジェラート", "カステラ", "パウンドケーキ", "チーズ", "クラッカー", "エナジーバー", "グラノーラバー",
            "ゼリー", "ドライフルーツ", "ポップコーン", "グミ", "ポテトチップス", "スナック", "飴",
        ],
    },
];

pub fn category_names() -> Vec<&'static str> { FOOD_CATEGORIES.iter().map(|c| c.name).collect() }

/// Sorted, de-duplicated foods of the chosen categories (all when none are
/// chosen) that exist in `catalog`. Unknown category names are ignored.
pub fn manual_options<S: AsRef<str>>(selected: &[S], catalog: &FoodCatalog) -> Vec<String> {
    let chosen = FOOD_CATEGORIES
        .iter()
        .filter(|c| selected.is_empty() || selected.iter().any(|s| s.as_ref() == c.name));
    let mut foods: Vec<String> = chosen
        .flat_map(|c| c.foods.iter())
        .filter(|f| catalog.contains(f))
        .map(|f| f.to_string())
        .collect();
    foods.sort();
    foods.dedup();
    foods
}
