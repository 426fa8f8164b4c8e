use crate::path_validation::validate_path;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::{
    Attribute, FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Token, Type,
    parse_macro_input,
};

const ROUTE_ATTRS: [&str; 3] = ["get", "put", "post"];
const PARAM_ATTRS: [&str; 2] = ["query", "body"];

/// `#[controller("/prefix")]` or `#[controller("/prefix", prototype)]`
struct ControllerArgs {
    prefix: LitStr,
    prototype: bool,
}

impl Parse for ControllerArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let prefix: LitStr = input.parse()?;
        let mut prototype = false;

        while !input.is_empty() {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            let scope: Ident = input.parse()?;
            match scope.to_string().as_str() {
                "prototype" => prototype = true,
                "singleton" => prototype = false,
                _ => {
                    return Err(syn::Error::new(
                        scope.span(),
                        "expected `singleton` or `prototype`",
                    ));
                }
            }
        }

        Ok(Self { prefix, prototype })
    }
}

enum Binding {
    Query(LitStr),
    Body,
    None,
}

/// One routed method, as read from its attributes
struct RouteInfo {
    verb: Ident,
    path: LitStr,
    method: Ident,
    has_self: bool,
    params: Vec<(Binding, Type)>,
}

fn has_name(attr: &Attribute, names: &[&str]) -> bool {
    attr.path()
        .get_ident()
        .is_some_and(|ident| names.contains(&ident.to_string().as_str()))
}

/// Read and strip the route attributes of one method.
fn extract_route(method: &mut ImplItemFn) -> syn::Result<Option<RouteInfo>> {
    let mut mapping: Option<(Ident, LitStr)> = None;

    for attr in method.attrs.iter().filter(|attr| has_name(attr, &ROUTE_ATTRS)) {
        if mapping.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "a method can be mapped to one route only",
            ));
        }
        let verb = attr.path().require_ident()?.clone();
        let path: LitStr = attr.parse_args()?;
        validate_path("route", &path.value(), path.span())?;
        mapping = Some((verb, path));
    }

    let Some((verb, path)) = mapping else {
        return Ok(None);
    };
    method.attrs.retain(|attr| !has_name(attr, &ROUTE_ATTRS));

    let sig = &mut method.sig;
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "routed methods are synchronous",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "routed methods cannot be generic",
        ));
    }

    let mut has_self = false;
    let mut params = Vec::new();

    for input in sig.inputs.iter_mut() {
        match input {
            FnArg::Receiver(receiver) => {
                if receiver.reference.is_none() {
                    return Err(syn::Error::new_spanned(
                        receiver,
                        "routed methods take `&self` or `&mut self`",
                    ));
                }
                has_self = true;
            }
            FnArg::Typed(arg) => {
                let mut binding = Binding::None;
                for attr in arg.attrs.iter().filter(|attr| has_name(attr, &PARAM_ATTRS)) {
                    if !matches!(binding, Binding::None) {
                        return Err(syn::Error::new_spanned(
                            attr,
                            "a parameter binds from one source only",
                        ));
                    }
                    binding = if attr.path().is_ident("query") {
                        Binding::Query(attr.parse_args()?)
                    } else {
                        attr.meta.require_path_only()?;
                        Binding::Body
                    };
                }
                arg.attrs.retain(|attr| !has_name(attr, &PARAM_ATTRS));
                params.push((binding, (*arg.ty).clone()));
            }
        }
    }

    Ok(Some(RouteInfo {
        verb,
        path,
        method: sig.ident.clone(),
        has_self,
        params,
    }))
}

/// `.route(...)` call registering one method on the descriptor
fn route_tokens(route: &RouteInfo) -> TokenStream2 {
    let RouteInfo {
        verb,
        path,
        method,
        has_self,
        params,
    } = route;

    let names: Vec<Ident> = (0..params.len())
        .map(|index| format_ident!("__arg{}", index))
        .collect();
    let types = params.iter().map(|(_, ty)| ty);
    let bindings = params.iter().map(|(binding, _)| match binding {
        Binding::Query(name) => quote! { ::sprig_core::Param::query(#name) },
        Binding::Body => quote! { ::sprig_core::Param::body() },
        Binding::None => quote! { ::sprig_core::Param::none() },
    });

    let (receiver, call) = if *has_self {
        let receiver = format_ident!("controller");
        let call = quote! { #receiver.#method(#(#names),*) };
        (receiver, call)
    } else {
        (format_ident!("_controller"), quote! { Self::#method(#(#names),*) })
    };

    quote! {
        .route(
            ::sprig_core::RouteMetadata::#verb(#path),
            vec![#(#bindings),*],
            |#receiver: &mut Self, (#(#names,)*): (#(#types,)*)| #call,
        )
    }
}

pub fn controller_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ControllerArgs);
    let mut input = parse_macro_input!(item as ItemImpl);

    if let Err(err) = validate_path("controller", &args.prefix.value(), args.prefix.span()) {
        return err.to_compile_error().into();
    }
    if let Some((_, path, _)) = &input.trait_ {
        return syn::Error::new_spanned(path, "#[controller] goes on an inherent impl block")
            .to_compile_error()
            .into();
    }
    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(&input.generics, "controllers cannot be generic")
            .to_compile_error()
            .into();
    }

    let mut routes = Vec::new();
    for item in input.items.iter_mut() {
        if let ImplItem::Fn(method) = item {
            match extract_route(method) {
                Ok(Some(route)) => routes.push(route),
                Ok(None) => {}
                Err(err) => return err.to_compile_error().into(),
            }
        }
    }

    let self_ty = &input.self_ty;
    let prefix = &args.prefix;
    let scope = if args.prototype {
        quote! { .prototype() }
    } else {
        TokenStream2::new()
    };
    let route_calls = routes.iter().map(route_tokens);

    let expanded = quote! {
        #input

        impl #self_ty {
            /// Controller declaration built from the route attributes
            pub fn descriptor() -> ::sprig_core::ControllerDescriptor<Self> {
                ::sprig_core::ControllerDescriptor::<Self>::new(#prefix)
                    #scope
                    #(#route_calls)*
            }
        }
    };

    TokenStream::from(expanded)
}
