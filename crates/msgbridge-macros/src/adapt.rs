//! Implementation of the `adapt!` macro.
//!
//! Accepted forms:
//!
//! ```text
//! adapt!(|a: &Item, n: u32| -> Item { ... })
//! adapt!(move |a: &Item| { ... })
//! adapt!(restock as fn(&Item, u32) -> Item)
//! adapt!(method Inventory::add as fn(&mut Inventory, Item) -> usize)
//! ```

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::{Expr, ExprClosure, Pat, ReturnType, Token, Type, TypeBareFn, TypeReference, parse_macro_input};

pub fn adapt_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as AdaptInput);

    match adapt_inner(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

enum AdaptInput {
    /// A closure with typed parameters
    Closure(ExprClosure),
    /// Any callable with an explicit signature
    Cast { callable: Expr, signature: TypeBareFn },
    /// A method: the first signature parameter is the receiver
    Method {
        owner: syn::Path,
        method: syn::Ident,
        signature: TypeBareFn,
    },
}

impl Parse for AdaptInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let fork = input.fork();
        if fork.parse::<syn::Ident>().is_ok_and(|ident| ident == "method") && starts_path(&fork) {
            input.parse::<syn::Ident>()?;
            let mut owner: syn::Path = input.parse()?;
            let Some(last) = owner.segments.pop() else {
                return Err(input.error("expected `Type::method`"));
            };
            if owner.segments.is_empty() {
                return Err(syn::Error::new_spanned(&owner, "expected `Type::method`"));
            }
            // drop the trailing `::` left by the pop
            let owner = syn::Path {
                leading_colon: owner.leading_colon,
                segments: owner.segments.iter().cloned().collect(),
            };
            let method = last.into_value().ident;
            input.parse::<Token![as]>()?;
            let signature: TypeBareFn = input.parse()?;
            return Ok(AdaptInput::Method {
                owner,
                method,
                signature,
            });
        }

        let expr: Expr = input.parse()?;
        match expr {
            Expr::Closure(closure) => Ok(AdaptInput::Closure(closure)),
            Expr::Cast(cast) => match *cast.ty {
                Type::BareFn(signature) => Ok(AdaptInput::Cast {
                    callable: *cast.expr,
                    signature,
                }),
                other => Err(syn::Error::new_spanned(other, "expected a `fn(..) -> T` signature")),
            },
            other => Err(syn::Error::new_spanned(
                other,
                "expected a closure, `callable as fn(..) -> T`, or `method Type::name as fn(&Type, ..) -> T`",
            )),
        }
    }
}

fn starts_path(input: ParseStream) -> bool {
    input.peek(syn::Ident)
        || input.peek(Token![::])
        || input.peek(Token![crate])
        || input.peek(Token![self])
        || input.peek(Token![Self])
        || input.peek(Token![super])
}

/// Everything the expansion needs, independent of the input form.
struct Adaptation {
    callable: TokenStream2,
    params: Vec<Type>,
    returns: Type,
    receiver: Option<Receiver>,
}

struct Receiver {
    owner: syn::Path,
    mutable: bool,
}

fn return_type(output: &ReturnType) -> Type {
    match output {
        ReturnType::Default => syn::parse_quote!(()),
        ReturnType::Type(_, ty) => (**ty).clone(),
    }
}

fn adapt_inner(input: AdaptInput) -> syn::Result<TokenStream2> {
    let adaptation = match input {
        AdaptInput::Closure(closure) => {
            let mut params = Vec::with_capacity(closure.inputs.len());
            for pat in &closure.inputs {
                match pat {
                    Pat::Type(typed) => params.push((*typed.ty).clone()),
                    other => {
                        return Err(syn::Error::new_spanned(
                            other,
                            "adapted closure parameters need a type annotation",
                        ));
                    }
                }
            }
            Adaptation {
                returns: return_type(&closure.output),
                callable: quote!(#closure),
                params,
                receiver: None,
            }
        }
        AdaptInput::Cast { callable, signature } => Adaptation {
            callable: quote!(#callable),
            params: signature.inputs.iter().map(|arg| arg.ty.clone()).collect(),
            returns: return_type(&signature.output),
            receiver: None,
        },
        AdaptInput::Method {
            owner,
            method,
            signature,
        } => {
            let mut inputs = signature.inputs.iter();
            let receiver = match inputs.next().map(|arg| &arg.ty) {
                Some(Type::Reference(TypeReference { mutability, elem, .. })) => {
                    check_receiver(&owner, elem)?;
                    Receiver {
                        owner: owner.clone(),
                        mutable: mutability.is_some(),
                    }
                }
                _ => {
                    return Err(syn::Error::new_spanned(
                        &signature,
                        "the first parameter of a method signature must be `&Type` or `&mut Type`",
                    ));
                }
            };
            Adaptation {
                callable: quote!(#owner::#method),
                params: inputs.map(|arg| arg.ty.clone()).collect(),
                returns: return_type(&signature.output),
                receiver: Some(receiver),
            }
        }
    };

    Ok(expand(adaptation))
}

fn check_receiver(owner: &syn::Path, elem: &Type) -> syn::Result<()> {
    let matches = match elem {
        Type::Path(path) => path.qself.is_none() && path.path.segments.last() == owner.segments.last(),
        _ => false,
    };
    if matches {
        Ok(())
    } else {
        Err(syn::Error::new_spanned(
            elem,
            format!(
                "receiver type does not match `{}`",
                quote!(#owner).to_string().replace(' ', "")
            ),
        ))
    }
}

fn expand(adaptation: Adaptation) -> TokenStream2 {
    let Adaptation {
        callable,
        params,
        returns,
        receiver,
    } = adaptation;
    let arity = params.len();

    let slots: Vec<_> = (0..arity).map(|i| format_ident!("__slot{}", i)).collect();
    let boundaries: Vec<_> = (0..arity).map(|i| format_ident!("__boundary{}", i)).collect();
    let args: Vec<_> = (0..arity).map(|i| format_ident!("__arg{}", i)).collect();
    let indices: Vec<_> = (0..arity).collect();

    let (split_slots, receiver_binding, receiver_pass, with_receiver) = match &receiver {
        Some(Receiver { owner, mutable }) => {
            let access = if *mutable {
                quote!(::msgbridge::adapt::receiver_mut::<#owner>(__receiver)?)
            } else {
                quote!(::msgbridge::adapt::receiver_ref::<#owner>(__receiver)?)
            };
            (
                quote!(let (__receiver, __args) = __ctx.receiver_and_args()?;),
                quote!(let __this = #access;),
                quote!(__this,),
                quote!(.with_receiver(::std::any::type_name::<#owner>())),
            )
        }
        None => (quote!(let __args = __ctx.args_mut();), quote!(), quote!(), quote!()),
    };

    let native = syn::Ident::new("__native", Span::call_site());

    quote! {
        {
            let #native = #callable;
            ::msgbridge::NativeFn::adapted(
                ::msgbridge::Signature::new(
                    ::std::vec![#(::msgbridge::ParamInfo::of::<#params>()),*],
                    ::msgbridge::ParamInfo::of::<#returns>(),
                )
                #with_receiver,
                move |__ctx: &mut ::msgbridge::CallContext<'_>|
                    -> ::std::result::Result<(), ::msgbridge::NativeError>
                {
                    #(::msgbridge::adapt::assert_param::<#params>();)*
                    ::msgbridge::adapt::assert_return::<#returns>();

                    __ctx.check_arity(#arity)?;
                    let __cx = __ctx.conversion();
                    let __ret = {
                        #split_slots
                        let __actual = __args.len();
                        let [#(#slots),*] = __args else {
                            return ::std::result::Result::Err(::msgbridge::NativeError::ArgumentCount {
                                expected: #arity,
                                actual: __actual,
                            });
                        };
                        #receiver_binding
                        #(
                            let mut #boundaries = ::msgbridge::adapt::boundary::<#params>(#slots, &__cx)
                                .map_err(|e| ::msgbridge::NativeError::argument(#indices, e))?;
                        )*
                        #(
                            let #args = ::msgbridge::adapt::unwrap_arg::<#params>(&mut #boundaries)
                                .map_err(|e| ::msgbridge::NativeError::argument(#indices, e))?;
                        )*
                        ::msgbridge::adapt::wrap_return::<#returns>(#native(#receiver_pass #(#args),*))?
                    };
                    __ctx.set_return(__ret);
                    ::std::result::Result::Ok(())
                },
            )
        }
    }
}
