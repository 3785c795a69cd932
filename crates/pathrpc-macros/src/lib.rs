//! pathrpc-macros - Procedural macros for pathrpc services
//!
//! This crate provides:
//! - `#[rpc_service]` - Generate the `Service` method table from an inherent impl
//! - `#[rpc(..)]` - Rename or skip a single method inside an `#[rpc_service]` impl

use darling::FromMeta;
use darling::ast::NestedMeta;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use syn::{
    Expr, FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, Lit, Meta, ReturnType, Type, Visibility,
    parse_macro_input,
};

/// Generate a `pathrpc::Service` implementation from an inherent impl block
///
/// Every `pub` method with the shape
/// `(&self, &mut CallContext | &CallContext, A | &A, &mut R) -> Result<(), E>`
/// becomes a routable method named after the function in PascalCase. Other
/// methods are left alone. `A = ()` takes no arguments and `R = ()` sends an
/// empty reply. `E` must convert into `anyhow::Error`.
///
/// # Example
///
/// ```ignore
/// use pathrpc::prelude::*;
///
/// #[derive(Default)]
/// struct Arith {
///     greeter: Greeter,
/// }
///
/// #[rpc_service(embed(greeter = Greeter))]
/// impl Arith {
///     pub fn add(&self, _ctx: &mut CallContext, args: Args, reply: &mut Sum) -> HandlerResult {
///         reply.c = args.a + args.b;
///         Ok(())
///     }
///
///     #[rpc(name = "Multiply")]
///     pub fn mul(&self, _ctx: &CallContext, args: &Args, reply: &mut Sum) -> Result<(), RpcError> {
///         reply.c = args.a * args.b;
///         Ok(())
///     }
/// }
/// ```
///
/// Options: `name = "Type"` overrides the registered type name, and
/// `embed(field = Type, ..)` promotes the methods of embedded services in the
/// listed order after the impl's own methods.
#[proc_macro_attribute]
pub fn rpc_service(attr: TokenStream, item: TokenStream) -> TokenStream {
    let item = parse_macro_input!(item as ItemImpl);
    match expand(attr.into(), item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.write_errors().into(),
    }
}

/// Marker consumed by `#[rpc_service]`
///
/// `#[rpc(name = "Name")]` registers the method under `Name`; `#[rpc(skip)]`
/// keeps a matching `pub` method off the wire. On its own it does nothing.
#[proc_macro_attribute]
pub fn rpc(_attr: TokenStream, item: TokenStream) -> TokenStream {
    item
}

/// Options of `#[rpc_service(..)]`
#[derive(Debug, Default, FromMeta)]
struct ServiceOpts {
    /// Registered type name, defaults to the impl's type name
    #[darling(default)]
    name: Option<String>,

    /// Embedded services promoted into this one
    #[darling(default)]
    embed: Embeds,
}

/// Options of `#[rpc(..)]` on a method
#[derive(Debug, Default, FromMeta)]
struct MethodOpts {
    #[darling(default)]
    name: Option<String>,

    #[darling(default)]
    skip: bool,
}

/// `embed(field = Type, ..)` in declaration order
#[derive(Debug, Default)]
struct Embeds(Vec<(Ident, Type)>);

impl FromMeta for Embeds {
    fn from_list(items: &[NestedMeta]) -> darling::Result<Self> {
        let mut embeds = Vec::with_capacity(items.len());
        let mut errors = darling::Error::accumulator();
        for item in items {
            let NestedMeta::Meta(Meta::NameValue(pair)) = item else {
                errors.push(darling::Error::custom("expected `field = Type`").with_span(item));
                continue;
            };
            let Some(field) = pair.path.get_ident() else {
                errors.push(darling::Error::custom("expected a field name").with_span(&pair.path));
                continue;
            };
            match embed_type(&pair.value) {
                Ok(ty) => embeds.push((field.clone(), ty)),
                Err(err) => errors.push(err),
            }
        }
        errors.finish_with(Self(embeds))
    }
}

fn embed_type(value: &Expr) -> darling::Result<Type> {
    match value {
        Expr::Path(path) => Ok(Type::Path(syn::TypePath {
            qself: path.qself.clone(),
            path: path.path.clone(),
        })),
        Expr::Lit(lit) => match &lit.lit {
            Lit::Str(text) => text.parse().map_err(darling::Error::from),
            other => Err(darling::Error::unexpected_lit_type(other)),
        },
        other => Err(darling::Error::custom("expected a type").with_span(other)),
    }
}

/// Expand `#[rpc_service]` applied to `item`
fn expand(attr: TokenStream2, mut item: ItemImpl) -> darling::Result<TokenStream2> {
    let opts = ServiceOpts::from_list(&NestedMeta::parse_meta_list(attr)?)?;

    if let Some((_, path, _)) = &item.trait_ {
        return Err(
            darling::Error::custom("#[rpc_service] must be placed on an inherent impl")
                .with_span(path),
        );
    }

    let type_name = match &opts.name {
        Some(name) => name.clone(),
        None => self_type_name(&item.self_ty)?,
    };

    let mut errors = darling::Error::accumulator();
    let mut registrations = Vec::new();
    for impl_item in &mut item.items {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };
        let Some(method_opts) = errors.handle(take_rpc_attr(method)) else {
            continue;
        };
        if method_opts.skip {
            continue;
        }
        match MethodShape::of(method) {
            Some(shape) => {
                let name = method_opts
                    .name
                    .unwrap_or_else(|| to_pascal_case(&method.sig.ident.to_string()));
                registrations.push(shape.registration(&method.sig.ident, &name));
            }
            None if method_opts.name.is_some() => errors.push(
                darling::Error::custom(
                    "#[rpc] method must be `pub fn(&self, ctx, args, reply: &mut R) -> Result<(), E>`",
                )
                .with_span(&method.sig),
            ),
            None => {}
        }
    }
    errors.finish()?;

    let embeds = opts.embed.0.iter().map(|(field, ty)| {
        quote! {
            ::pathrpc::MethodSink::<Self>::embed::<#ty>(sink, |svc: &Self| &svc.#field);
        }
    });

    let self_ty = &item.self_ty;
    let (impl_generics, _, where_clause) = item.generics.split_for_impl();
    Ok(quote! {
        #item

        impl #impl_generics ::pathrpc::Service for #self_ty #where_clause {
            const NAME: &'static str = #type_name;

            fn methods<__Sink: ::pathrpc::MethodSink<Self>>(sink: &mut __Sink) {
                #(#registrations)*
                #(#embeds)*
            }
        }
    })
}

/// Remove every `#[rpc(..)]` attribute from `method` and merge their options
fn take_rpc_attr(method: &mut ImplItemFn) -> darling::Result<MethodOpts> {
    let mut opts = MethodOpts::default();
    let mut result = Ok(());
    method.attrs.retain(|attr| {
        if !attr.path().is_ident("rpc") {
            return true;
        }
        match MethodOpts::from_meta(&attr.meta) {
            Ok(parsed) => {
                opts.skip |= parsed.skip;
                if parsed.name.is_some() {
                    opts.name = parsed.name;
                }
            }
            Err(err) => result = Err(err),
        }
        false
    });
    result.map(|()| opts)
}

fn self_type_name(ty: &Type) -> darling::Result<String> {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .ok_or_else(|| darling::Error::custom("expected a named type").with_span(ty)),
        other => Err(darling::Error::custom(
            "#[rpc_service] needs a named type; set `name = \"..\"`",
        )
        .with_span(other)),
    }
}

/// Argument and reply types of a routable method
#[derive(Debug)]
struct MethodShape {
    ctx_mut: bool,
    args: Type,
    args_by_ref: bool,
    reply: Type,
}

impl MethodShape {
    /// Shape of `method`, or `None` when it is not routable
    fn of(method: &ImplItemFn) -> Option<Self> {
        if !matches!(method.vis, Visibility::Public(_)) {
            return None;
        }
        let sig = &method.sig;
        if sig.asyncness.is_some() || !sig.generics.params.is_empty() || !returns_result(&sig.output) {
            return None;
        }

        let mut inputs = sig.inputs.iter();
        match inputs.next()? {
            FnArg::Receiver(receiver) if receiver.reference.is_some() && receiver.mutability.is_none() => {}
            _ => return None,
        }
        let ctx = typed(inputs.next()?)?;
        let args = typed(inputs.next()?)?;
        let reply = typed(inputs.next()?)?;
        if inputs.next().is_some() {
            return None;
        }

        let Type::Reference(ctx) = ctx else {
            return None;
        };
        if last_ident(&ctx.elem)? != "CallContext" {
            return None;
        }

        let Type::Reference(reply) = reply else {
            return None;
        };
        reply.mutability?;

        let (args, args_by_ref) = match args {
            Type::Reference(inner) if inner.mutability.is_none() => ((*inner.elem).clone(), true),
            Type::Reference(_) => return None,
            other => (other.clone(), false),
        };

        Some(Self {
            ctx_mut: ctx.mutability.is_some(),
            args,
            args_by_ref,
            reply: (*reply.elem).clone(),
        })
    }

    fn reply_kind(&self) -> TokenStream2 {
        let kind = if is_unit(&self.reply) {
            format_ident!("None")
        } else if is_container(&self.reply) {
            format_ident!("Container")
        } else {
            format_ident!("Value")
        };
        quote!(::pathrpc::ReplyKind::#kind)
    }

    /// Tokens registering this method with the sink under `name`
    fn registration(&self, method: &Ident, name: &str) -> TokenStream2 {
        let args = &self.args;
        let reply = &self.reply;
        let reply_kind = self.reply_kind();
        let ctx = if self.ctx_mut {
            quote!(ctx)
        } else {
            quote!(&*ctx)
        };
        let (register, args_ty) = if self.args_by_ref {
            (format_ident!("by_ref"), quote!(&#args))
        } else {
            (format_ident!("by_value"), args.to_token_stream())
        };
        quote! {
            ::pathrpc::MethodSink::<Self>::#register(
                sink,
                #name,
                #reply_kind,
                |svc: &Self, ctx: &mut ::pathrpc::CallContext, args: #args_ty, reply: &mut #reply| {
                    Self::#method(svc, #ctx, args, reply).map_err(::core::convert::Into::into)
                },
            );
        }
    }
}

fn typed(arg: &FnArg) -> Option<&Type> {
    match arg {
        FnArg::Typed(pat) => Some(&pat.ty),
        FnArg::Receiver(_) => None,
    }
}

fn last_ident(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) => path.path.segments.last().map(|segment| segment.ident.to_string()),
        _ => None,
    }
}

fn returns_result(output: &ReturnType) -> bool {
    match output {
        ReturnType::Type(_, ty) => matches!(
            last_ident(ty).as_deref(),
            Some("Result" | "HandlerResult" | "RpcResult")
        ),
        ReturnType::Default => false,
    }
}

fn is_unit(ty: &Type) -> bool {
    matches!(ty, Type::Tuple(tuple) if tuple.elems.is_empty())
}

/// Maps, sequences and arrays encode as empty collections when untouched
fn is_container(ty: &Type) -> bool {
    match ty {
        Type::Array(_) => true,
        Type::Path(_) => matches!(
            last_ident(ty).as_deref(),
            Some("Vec" | "VecDeque" | "HashMap" | "BTreeMap" | "HashSet" | "BTreeSet")
        ),
        _ => false,
    }
}

/// Convert a snake_case identifier to PascalCase
fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut upper = true;
    for c in s.trim_start_matches("r#").chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            result.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            result.push(c);
        }
    }
    result
}
