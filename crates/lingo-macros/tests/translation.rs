use lingo_macros::Translation;
use lingo_types::language::LanguageCode;
use serde::{Deserialize, Serialize};

// generated code refers to crate::translation
pub mod translation {
    pub use lingo_dal::translation::*;
}

use translation::{resolve, translated_fields, Translated, Translation as _};

#[derive(Debug, Clone, Serialize, Deserialize, Translation)]
pub struct ArticleTranslation {
    pub id: i64,
    #[spec(language_code)]
    pub lang: LanguageCode,
    #[translate]
    pub headline: String,
    #[translate]
    pub short_summary: Option<String>,
    pub created_at: time::PrimitiveDateTime,
}

pub struct Article {
    translations: Option<Vec<ArticleTranslation>>,
}

impl Translated for Article {
    type Translation = ArticleTranslation;

    fn translations(&self) -> Option<&[ArticleTranslation]> {
        self.translations.as_deref()
    }
}

fn article_translation(lang: LanguageCode, headline: &str) -> ArticleTranslation {
    ArticleTranslation {
        id: 1,
        lang,
        headline: headline.to_string(),
        short_summary: None,
        created_at: time::PrimitiveDateTime::MIN,
    }
}

#[test]
fn test_allow_list() {
    assert_eq!(
        ArticleTranslation::TRANSLATABLE_FIELDS,
        &["headline", "short_summary"]
    );
}

#[test]
fn test_fields() {
    let t = article_translation(LanguageCode::RuRu, "Новости");
    assert_eq!(t.language_code(), LanguageCode::RuRu);
    let fields = t.fields();
    assert_eq!(
        fields,
        ArticleTranslationFields {
            headline: "Новости".to_string(),
            short_summary: None,
        }
    );
    let json = serde_json::to_value(&fields).unwrap();
    assert_eq!(json, serde_json::json!({"headline": "Новости", "shortSummary": null}));
}

#[test]
fn test_resolve() {
    let translations = vec![
        article_translation(LanguageCode::EnUs, "News"),
        article_translation(LanguageCode::RuRu, "Новости"),
    ];
    let found = resolve(&translations, Some(LanguageCode::EnUs)).unwrap();
    assert_eq!(found.headline, "News");
    assert!(resolve(&translations, None).is_none());
    assert!(resolve(&translations[..1], Some(LanguageCode::RuRu)).is_none());

    let article = Article {
        translations: Some(translations),
    };
    let fields = translated_fields(&article, Some(LanguageCode::RuRu)).unwrap();
    assert_eq!(fields.headline, "Новости");

    let unloaded = Article { translations: None };
    assert!(translated_fields(&unloaded, Some(LanguageCode::RuRu)).is_none());
}
