use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Field, Fields, Ident};

const TRANSLATE: &str = "translate";
const SPEC: &str = "spec";
const SPEC_LANGUAGE_CODE: &str = "language_code";

fn is_translatable(f: &Field) -> bool {
    f.attrs.iter().any(|a| a.path().is_ident(TRANSLATE))
}

fn is_language_code(f: &Field) -> syn::Result<bool> {
    for attr in &f.attrs {
        if attr.path().is_ident(SPEC) {
            let kind: Ident = attr.parse_args()?;
            if kind == SPEC_LANGUAGE_CODE {
                return Ok(true);
            }
            return Err(syn::Error::new_spanned(
                kind,
                format!("Unknown spec, expected {SPEC_LANGUAGE_CODE}"),
            ));
        }
    }
    Ok(false)
}

fn expand(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let vis = &input.vis;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Translation can be derived only for struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Translation can be derived only for struct",
            ))
        }
    };

    let mut language_code: Option<&Ident> = None;
    for f in fields {
        if is_language_code(f)? {
            if language_code.is_some() {
                return Err(syn::Error::new_spanned(
                    f,
                    "Only one field can be marked as language_code",
                ));
            }
            language_code = f.ident.as_ref();
        }
    }
    let language_code = language_code.ok_or_else(|| {
        syn::Error::new_spanned(name, "Missing field marked #[spec(language_code)]")
    })?;

    let translatable = fields.iter().filter(|f| is_translatable(f)).collect::<Vec<_>>();
    if translatable.is_empty() {
        return Err(syn::Error::new_spanned(
            name,
            "At least one field must be marked #[translate]",
        ));
    }

    // named fields only, checked above
    let idents = translatable
        .iter()
        .filter_map(|f| f.ident.as_ref())
        .collect::<Vec<_>>();
    let types = translatable.iter().map(|f| &f.ty);
    let names = idents.iter().map(|i| i.to_string());

    let fields_name = format_ident!("{}Fields", name);

    Ok(quote! {
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        #vis struct #fields_name {
            #(pub #idents: #types,)*
        }

        impl crate::translation::Translation for #name {
            type Fields = #fields_name;

            const TRANSLATABLE_FIELDS: &'static [&'static str] = &[#(#names),*];

            fn language_code(&self) -> lingo_types::language::LanguageCode {
                self.#language_code
            }

            fn fields(&self) -> Self::Fields {
                #fields_name {
                    #(#idents: self.#idents.clone(),)*
                }
            }
        }
    })
}

pub fn translation(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
