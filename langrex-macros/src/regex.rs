use langrex_automata::{parse_pattern_with, SyntaxOptions};
use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{Attribute, LitStr, Meta};

#[cfg(feature = "dot")]
use langrex_automata::{Limits, Nfa};
#[cfg(feature = "dot")]
use std::fs::File;
#[cfg(feature = "dot")]
use syn::{Expr, ExprLit, Lit, MetaNameValue};

pub(crate) struct RegexInput {
    attrs: Vec<Attribute>,
    pattern: LitStr,
}

impl Parse for RegexInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let pattern = input.parse()?;
        Ok(Self { attrs, pattern })
    }
}

impl RegexInput {
    pub fn compile(self) -> TokenStream {
        let mut errors = vec![];
        let mut options = SyntaxOptions::new();
        #[cfg(feature = "dot")]
        let mut graph = None;

        for i in self.attrs {
            let attr = i.meta.clone();
            match attr {
                Meta::Path(path) if path.is_ident("xor") => {
                    options = options.with_xor(true);
                }
                Meta::Path(path) if path.is_ident("separated_repeat") => {
                    options = options.with_separated_repeat(true);
                }
                #[cfg(feature = "dot")]
                Meta::NameValue(MetaNameValue {
                    path,
                    value:
                        Expr::Lit(ExprLit {
                            lit: Lit::Str(s), ..
                        }),
                    ..
                }) if path.is_ident("graph") => {
                    graph = Some(s);
                }
                i => errors.push(syn::Error::new_spanned(i, "unexpected attribute")),
            }
        }

        let source = self.pattern.value();
        match parse_pattern_with(&source, &options) {
            Ok(_pattern) => {
                #[cfg(feature = "dot")]
                if let Some(path) = graph {
                    let path = path.value();
                    let nfa = Nfa::build(&_pattern, &Limits::default())
                        .unwrap_or_else(|e| panic!("can't compile pattern for graphing: {e}"));
                    let mut f = File::create(&path).unwrap_or_else(|e| {
                        panic!("can't open dot file for graphing at {path}: {e}")
                    });
                    nfa.output_dot(&mut f)
                        .unwrap_or_else(|e| panic!("failed while graphing at {path}: {e}"));
                }
            }
            Err(e) => errors.push(syn::Error::new(
                self.pattern.span(),
                format!("invalid pattern: {e}"),
            )),
        }

        if !errors.is_empty() {
            let errors = errors.into_iter().map(syn::Error::into_compile_error);
            return quote!({
                #(#errors)*
                ::core::unreachable!()
            });
        }

        let xor = options.xor();
        let separated_repeat = options.separated_repeat();
        let pattern = self.pattern;
        quote!({
            static REGEX: ::std::sync::OnceLock<::langrex::Regex> = ::std::sync::OnceLock::new();
            REGEX.get_or_init(|| ::langrex::__private::validated(#pattern, #xor, #separated_repeat))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(input: TokenStream) -> String {
        syn::parse2::<RegexInput>(input).unwrap().compile().to_string()
    }

    #[test]
    fn valid_pattern() {
        let out = expand(quote!("(?hello)(world)"));
        assert!(out.contains("validated"));
        assert!(out.contains("OnceLock"));
        assert!(!out.contains("compile_error"));
    }

    #[test]
    fn options_are_passed_on() {
        let out = expand(quote!(#[xor] #[separated_repeat] "a^b%c"));
        assert!(out.contains("true , true"));
    }

    #[test]
    fn syntax_errors_are_reported() {
        let out = expand(quote!("a|"));
        assert!(out.contains("compile_error"));
        assert!(out.contains("missing an operand"));

        let out = expand(quote!("a%b"));
        assert!(out.contains("not enabled"));
    }

    #[test]
    fn unknown_attributes() {
        let out = expand(quote!(#[case_insensitive] "a"));
        assert!(out.contains("unexpected attribute"));
    }
}
