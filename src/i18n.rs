//! Static locale catalogs for the terminal chrome.
//!
//! Consumes only [`Language`] from the data layer; strings match the
//! locales the journal supports (English, Traditional Chinese, Japanese).

use crate::models::Language;

/// Translated labels for the UI chrome.
#[derive(Debug, Clone, Copy)]
pub struct Messages {
    pub app_title: &'static str,
    pub timeline: &'static str,
    pub detail: &'static str,
    pub filter: &'static str,
    pub load_more: &'static str,
    pub no_selection: &'static str,
    pub missing_tag: &'static str,
    pub archived: &'static str,
    pub help: &'static str,
}

const EN: Messages = Messages {
    app_title: "Timeline",
    timeline: "Timeline",
    detail: "Detail",
    filter: "Filter",
    load_more: "Load more",
    no_selection: "Select a story to see its detail",
    missing_tag: "tag not found",
    archived: "archived",
    help: "Tab: switch panel | j/k: navigate | m: load more | q: quit",
};

const ZH_TW: Messages = Messages {
    app_title: "時間軸",
    timeline: "時間軸",
    detail: "詳細",
    filter: "篩選",
    load_more: "載入更多",
    no_selection: "選擇一則故事以檢視詳細內容",
    missing_tag: "找不到標籤",
    archived: "已封存",
    help: "Tab: 切換面板 | j/k: 移動 | m: 載入更多 | q: 離開",
};

const JA: Messages = Messages {
    app_title: "タイムライン",
    timeline: "タイムライン",
    detail: "詳細",
    filter: "フィルター",
    load_more: "もっと読み込む",
    no_selection: "ストーリーを選択すると詳細が表示されます",
    missing_tag: "タグが見つかりません",
    archived: "アーカイブ済み",
    help: "Tab: パネル切替 | j/k: 移動 | m: 追加読み込み | q: 終了",
};

/// Returns the catalog for the given language.
pub fn messages(lang: Language) -> &'static Messages {
    match lang {
        Language::En => &EN,
        Language::ZhTw => &ZH_TW,
        Language::Ja => &JA,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_language_has_a_catalog() {
        for lang in [Language::En, Language::ZhTw, Language::Ja] {
            let m = messages(lang);
            assert!(!m.timeline.is_empty());
            assert!(!m.help.is_empty());
        }
    }

    #[test]
    fn english_is_the_default_catalog() {
        assert_eq!(messages(Language::default()).app_title, "Timeline");
    }
}
