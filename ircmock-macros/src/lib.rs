//! Procedural macros for ircmock
//!
//! This crate provides the `#[ircmock::test]` attribute macro, which runs an
//! async test on tokio with a fresh [`Harness`] per test.
//!
//! # Example
//!
//! ```rust,ignore
//! use ircmock::prelude::*;
//!
//! #[ircmock::test]
//! async fn my_test(harness: Harness) {
//!     let client = harness.create_client("irc.example", "bot", ClientOptions::default());
//!     assert_eq!(harness.find_client("irc.example", "bot"), Some(client));
//! }
//! ```
//!
//! [`Harness`]: https://docs.rs/ircmock/latest/ircmock/harness/struct.Harness.html

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input, FnArg, Ident, ItemFn, Lit, Pat, Token, Type,
};

/// Configuration options for the test macro.
#[derive(Default)]
struct TestConfig {
    /// Flavor for tokio runtime ("current_thread" or "multi_thread")
    flavor: Option<String>,
    /// Install a tracing subscriber before the test body runs
    trace: bool,
    /// Whether the injected harness keeps a bus history (default: true)
    history: Option<bool>,
}

impl Parse for TestConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut config = TestConfig::default();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "flavor" => {
                    let lit: Lit = input.parse()?;
                    match lit {
                        Lit::Str(s) if matches!(s.value().as_str(), "current_thread" | "multi_thread") => {
                            config.flavor = Some(s.value());
                        }
                        other => {
                            return Err(syn::Error::new_spanned(
                                other,
                                "flavor must be \"current_thread\" or \"multi_thread\"",
                            ));
                        }
                    }
                }
                "trace" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Bool(b) = lit {
                        config.trace = b.value();
                    }
                }
                "history" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Bool(b) = lit {
                        config.history = Some(b.value());
                    }
                }
                _ => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {ident}"),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(config)
    }
}

/// Determines if a function parameter is requesting a Harness.
fn is_harness_param(arg: &FnArg) -> bool {
    if let FnArg::Typed(pat_type) = arg {
        if let Type::Path(type_path) = &*pat_type.ty {
            if let Some(segment) = type_path.path.segments.last() {
                return segment.ident == "Harness";
            }
        }
    }
    false
}

/// Extracts the parameter name from a function argument.
fn get_param_name(arg: &FnArg) -> Option<&Pat> {
    if let FnArg::Typed(pat_type) = arg {
        Some(&pat_type.pat)
    } else {
        None
    }
}

/// Test attribute macro for async tests against the mock IRC client.
///
/// Runs the test on a tokio runtime. A `harness: Harness` parameter
/// receives a fresh harness, so no client, lookup or bus listener leaks in
/// from another test.
///
/// # Configuration Options
///
/// - `flavor = "multi_thread"` - Tokio runtime flavor
/// - `trace = true` - Install a `tracing` fmt subscriber (honours `RUST_LOG`)
/// - `history = false` - Injected harness keeps no bus history
///
/// ```rust,ignore
/// #[ircmock::test(trace = true)]
/// async fn test_traced(harness: Harness) {
///     harness.create_client("irc.example", "bot", ClientOptions::default());
/// }
/// ```
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let config = parse_macro_input!(attr as TestConfig);
    let input = parse_macro_input!(item as ItemFn);

    expand_test(&config, &input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_test(config: &TestConfig, input: &ItemFn) -> syn::Result<TokenStream2> {
    let name = &input.sig.ident;
    let body = &input.block;
    let attrs = &input.attrs;
    let vis = &input.vis;

    if input.sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            &input.sig,
            "test function must be async",
        ));
    }

    for arg in &input.sig.inputs {
        if !is_harness_param(arg) {
            return Err(syn::Error::new_spanned(
                arg,
                "only a `Harness` parameter can be injected",
            ));
        }
    }
    if input.sig.inputs.len() > 1 {
        return Err(syn::Error::new_spanned(
            &input.sig.inputs,
            "at most one `Harness` parameter can be injected",
        ));
    }

    let harness_init = match input.sig.inputs.first().and_then(get_param_name) {
        Some(harness_name) => {
            let history = config.history.unwrap_or(true);
            quote! {
                let #harness_name = ::ircmock::harness::Harness::builder()
                    .history(#history)
                    .build();
            }
        }
        None => quote! {},
    };

    let trace_init = if config.trace {
        quote! { ::ircmock::__private::init_tracing(); }
    } else {
        quote! {}
    };

    let flavor_attr = match config.flavor.as_deref() {
        Some("multi_thread") => quote! { #[::tokio::test(flavor = "multi_thread")] },
        _ => quote! { #[::tokio::test] },
    };

    Ok(quote! {
        #flavor_attr
        #(#attrs)*
        #vis async fn #name() {
            #trace_init
            #harness_init
            #body
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{expand_test, TestConfig};
    use syn::ItemFn;

    #[::core::prelude::v1::test]
    fn test_config_parse_empty() {
        let config: TestConfig = syn::parse_str("").unwrap();
        assert!(config.flavor.is_none());
        assert!(!config.trace);
        assert!(config.history.is_none());
    }

    #[::core::prelude::v1::test]
    fn test_config_parse_multiple() {
        let config: TestConfig =
            syn::parse_str("flavor = \"multi_thread\", trace = true, history = false").unwrap();
        assert_eq!(config.flavor, Some("multi_thread".to_string()));
        assert!(config.trace);
        assert_eq!(config.history, Some(false));
    }

    #[::core::prelude::v1::test]
    fn test_config_rejects_unknown() {
        assert!(syn::parse_str::<TestConfig>("start_paused = true").is_err());
        assert!(syn::parse_str::<TestConfig>("flavor = \"local\"").is_err());
    }

    #[::core::prelude::v1::test]
    fn test_expand_injects_harness() {
        let input: ItemFn = syn::parse_str("async fn t(harness: Harness) {}").unwrap();
        let out = expand_test(&TestConfig::default(), &input).unwrap().to_string();
        assert!(out.contains("Harness :: builder"));
        assert!(out.contains("tokio :: test"));
    }

    #[::core::prelude::v1::test]
    fn test_expand_rejects_sync_fn() {
        let input: ItemFn = syn::parse_str("fn t() {}").unwrap();
        assert!(expand_test(&TestConfig::default(), &input).is_err());
    }

    #[::core::prelude::v1::test]
    fn test_expand_rejects_other_params() {
        let input: ItemFn = syn::parse_str("async fn t(n: u32) {}").unwrap();
        assert!(expand_test(&TestConfig::default(), &input).is_err());
    }
}
