mod translation;

/// Derives `Translation` for a per-language row.
///
/// Fields marked `#[translate]` form the static allow-list and are collected
/// into a generated `<Name>Fields` struct. Exactly one field must be marked
/// `#[spec(language_code)]`.
#[proc_macro_derive(Translation, attributes(translate, spec))]
pub fn translation(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    translation::translation(input)
}
