use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, FnArg, Ident, ItemFn, Pat};

/// Argument names a handler may declare.
const BINDABLE: [&str; 10] = [
    "app", "endpoint", "request", "method", "values", "params", "args", "form", "headers",
    "account",
];

fn slot_name(ident: &Ident) -> String {
    ident.to_string().trim_start_matches('_').to_string()
}

/// Turn a function into an endpoint handler constructor.
///
/// Each parameter is bound by name from the request context:
/// `app: &App`, `endpoint: &Endpoint`, `request: &RequestContext`,
/// `method: &Method`, `values`/`params`/`args`/`form`/`headers: &MultiMap`,
/// `account: Option<&Account>`. A leading underscore is ignored.
///
/// The function is replaced by `fn name() -> nasse::dispatcher::Handler`,
/// which also records the module path and name for path derivation.
#[proc_macro_attribute]
pub fn handler(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        let attr = proc_macro2::TokenStream::from(attr);
        return syn::Error::new_spanned(attr, "#[handler] takes no arguments")
            .to_compile_error()
            .into();
    }
    let input = parse_macro_input!(item as ItemFn);
    if let Some(asyncness) = &input.sig.asyncness {
        return syn::Error::new_spanned(asyncness, "handlers are synchronous functions")
            .to_compile_error()
            .into();
    }

    let attrs = &input.attrs;
    let fn_vis = &input.vis;
    let fn_name = &input.sig.ident;
    let inner_name = format_ident!("__nasse_{}", fn_name);
    let mut inner_sig = input.sig.clone();
    inner_sig.ident = inner_name.clone();
    let block = &input.block;

    let mut names = Vec::new();
    let mut bindings = Vec::new();
    let mut call_args = Vec::new();
    for arg in &input.sig.inputs {
        let ident = match arg {
            FnArg::Typed(typed) => match typed.pat.as_ref() {
                Pat::Ident(pat) => pat.ident.clone(),
                other => {
                    return syn::Error::new_spanned(other, "handler parameters must be plain names")
                        .to_compile_error()
                        .into();
                }
            },
            FnArg::Receiver(receiver) => {
                return syn::Error::new_spanned(receiver, "handlers cannot take self")
                    .to_compile_error()
                    .into();
            }
        };
        let slot = slot_name(&ident);
        if !BINDABLE.contains(&slot.as_str()) {
            return syn::Error::new_spanned(
                &ident,
                format!(
                    "`{}` is not a bindable handler argument, expected one of: {}",
                    ident,
                    BINDABLE.join(", ")
                ),
            )
            .to_compile_error()
            .into();
        }
        let accessor = format_ident!("{}", slot);
        let local = format_ident!("__nasse_arg_{}", slot);
        bindings.push(quote! {
            let #local = match __args.#accessor() {
                ::core::result::Result::Ok(value) => value,
                ::core::result::Result::Err(err) => {
                    return ::nasse::response::Outcome::from(
                        ::nasse::response::Exception::from(err),
                    );
                }
            };
        });
        call_args.push(local);
        names.push(slot);
    }

    let name_str = fn_name.to_string();
    let expanded = quote! {
        #(#attrs)*
        #fn_vis fn #fn_name() -> ::nasse::dispatcher::Handler {
            #inner_sig #block

            ::nasse::dispatcher::Handler::new(
                &[#(#names),*],
                |__args: &::nasse::dispatcher::Arguments<'_, '_>| {
                    #(#bindings)*
                    ::nasse::response::Outcome::from(#inner_name(#(#call_args),*))
                },
            )
            .located(::core::module_path!(), #name_str)
        }
    };
    TokenStream::from(expanded)
}
