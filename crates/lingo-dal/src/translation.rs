//! Language resolution for entities with per-language translation rows.
//!
//! Projection is a pure function of the entity and an explicitly passed
//! language code. There is no fallback: a missing language yields no
//! translated fields at all.

use lingo_types::language::LanguageCode;

/// A per-language row. Usually derived with `#[derive(Translation)]`.
pub trait Translation {
    /// Struct holding exactly the translatable fields.
    type Fields: Clone;

    /// Static allow-list of translatable field names.
    const TRANSLATABLE_FIELDS: &'static [&'static str];

    fn language_code(&self) -> LanguageCode;

    fn fields(&self) -> Self::Fields;
}

/// An entity owning translation rows.
pub trait Translated {
    type Translation: Translation;

    /// `None` when translations were not loaded.
    fn translations(&self) -> Option<&[Self::Translation]>;
}

pub fn resolve<T: Translation>(translations: &[T], language: Option<LanguageCode>) -> Option<&T> {
    let language = language?;
    translations.iter().find(|t| t.language_code() == language)
}

pub fn translated_fields<E: Translated>(
    entity: &E,
    language: Option<LanguageCode>,
) -> Option<<E::Translation as Translation>::Fields> {
    entity
        .translations()
        .and_then(|translations| resolve(translations, language))
        .map(Translation::fields)
}
