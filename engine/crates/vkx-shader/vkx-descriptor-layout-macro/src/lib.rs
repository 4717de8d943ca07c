use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, Meta, parse_macro_input};

/// 为结构体实现 DescriptorLayout 派生宏
///
/// 每个字段对应一个 binding，字段类型无意义，一般写 `()`。
///
/// 支持的属性：
/// - binding: 绑定点编号，必填
/// - descriptor_type: 描述符类型（如 UNIFORM_BUFFER, COMBINED_IMAGE_SAMPLER），默认 UNIFORM_BUFFER
/// - count: 描述符数量，默认 1
/// - stage: 着色器阶段（如 "VERTEX | FRAGMENT"），默认 VERTEX | FRAGMENT
/// - flags: 描述符绑定标志（如 PARTIALLY_BOUND），默认为空
#[proc_macro_derive(DescriptorLayout, attributes(binding, descriptor_type, count, stage, flags))]
pub fn derive_descriptor_layout(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input).unwrap_or_else(|e| e.to_compile_error()).into()
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let struct_name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => return Err(syn::Error::new_spanned(input, "DescriptorLayout only supports named fields")),
        },
        _ => return Err(syn::Error::new_spanned(input, "DescriptorLayout only supports structs")),
    };

    let mut method_names = Vec::new();
    let mut item_exprs = Vec::new();
    for field in fields {
        let field_name = field.ident.as_ref().unwrap();
        let binding = get_binding_value(&field.attrs)?
            .ok_or_else(|| syn::Error::new_spanned(field, "missing #[binding = N] attribute"))?;
        let descriptor_type = get_descriptor_type(&field.attrs)?;
        let count = get_count_value(&field.attrs);
        let stage = get_stage_value(&field.attrs)?;
        let flags = get_flags_value(&field.attrs)?;

        // 去掉前后缀下划线，`_ubo` 生成 `ubo()`
        let trimmed = field_name.to_string().trim_matches('_').to_string();
        method_names.push(syn::Ident::new(&trimmed, field_name.span()));
        item_exprs.push(quote! {
            ::vkx_descriptor_layout_trait::DescriptorBindingItem {
                name: #trimmed,
                binding: #binding,
                descriptor_type: #descriptor_type,
                stage_flags: #stage,
                count: #count,
                flags: #flags,
            }
        });
    }

    Ok(quote! {
        impl #struct_name {
            #(
                pub fn #method_names() -> &'static ::vkx_descriptor_layout_trait::DescriptorBindingItem {
                    static ITEM: std::sync::OnceLock<::vkx_descriptor_layout_trait::DescriptorBindingItem> =
                        std::sync::OnceLock::new();
                    ITEM.get_or_init(|| #item_exprs)
                }
            )*
        }

        impl ::vkx_descriptor_layout_trait::DescriptorBindingLayout for #struct_name {
            fn get_shader_bindings() -> Vec<::vkx_descriptor_layout_trait::DescriptorBindingItem> {
                vec![#(#item_exprs),*]
            }
        }
    })
}

/// 读取字符串形式的属性值，例如 `#[stage = "VERTEX"]`
fn get_str_attr(attrs: &[Attribute], name: &str) -> syn::Result<Option<String>> {
    for attr in attrs {
        if !attr.path().is_ident(name) {
            continue;
        }
        if let Meta::NameValue(meta) = &attr.meta
            && let syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(lit_str),
                ..
            }) = &meta.value
        {
            return Ok(Some(lit_str.value()));
        }
        return Err(syn::Error::new_spanned(attr, format!("expected #[{name} = \"...\"]")));
    }
    Ok(None)
}

/// 将 `A | B` 形式的字符串展开为 `::ash::vk::<ty>::A | ::ash::vk::<ty>::B`
fn flags_expr(ty: &str, value: &str) -> syn::Result<syn::Expr> {
    let expr = value
        .split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("::ash::vk::{ty}::{s}"))
        .collect::<Vec<_>>()
        .join(" | ");
    if expr.is_empty() {
        return syn::parse_str(&format!("::ash::vk::{ty}::empty()"));
    }
    syn::parse_str(&expr)
}

/// 属性格式示例：#[binding = 0]
fn get_binding_value(attrs: &[Attribute]) -> syn::Result<Option<u32>> {
    for attr in attrs {
        if !attr.path().is_ident("binding") {
            continue;
        }
        if let Meta::NameValue(meta) = &attr.meta
            && let syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Int(lit_int),
                ..
            }) = &meta.value
        {
            return lit_int.base10_parse().map(Some);
        }
        return Err(syn::Error::new_spanned(attr, "expected #[binding = N]"));
    }
    Ok(None)
}

/// 属性格式示例：#[descriptor_type = "UNIFORM_BUFFER"]
fn get_descriptor_type(attrs: &[Attribute]) -> syn::Result<syn::Expr> {
    match get_str_attr(attrs, "descriptor_type")? {
        Some(ty) => syn::parse_str(&format!("::ash::vk::DescriptorType::{}", ty.trim())),
        None => Ok(syn::parse_quote!(::ash::vk::DescriptorType::UNIFORM_BUFFER)),
    }
}

/// 属性格式示例：#[count = 1]，也可以是常量表达式
fn get_count_value(attrs: &[Attribute]) -> syn::Expr {
    for attr in attrs {
        if attr.path().is_ident("count")
            && let Meta::NameValue(meta) = &attr.meta
        {
            return meta.value.clone();
        }
    }
    syn::parse_quote!(1)
}

/// 属性格式示例：#[stage = "VERTEX | FRAGMENT"]
fn get_stage_value(attrs: &[Attribute]) -> syn::Result<syn::Expr> {
    match get_str_attr(attrs, "stage")? {
        Some(stage) => flags_expr("ShaderStageFlags", &stage),
        None => Ok(syn::parse_quote!(::ash::vk::ShaderStageFlags::VERTEX | ::ash::vk::ShaderStageFlags::FRAGMENT)),
    }
}

/// 属性格式示例：#[flags = "PARTIALLY_BOUND | UPDATE_AFTER_BIND"]
fn get_flags_value(attrs: &[Attribute]) -> syn::Result<syn::Expr> {
    match get_str_attr(attrs, "flags")? {
        Some(flags) => flags_expr("DescriptorBindingFlags", &flags),
        None => Ok(syn::parse_quote!(::ash::vk::DescriptorBindingFlags::empty())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(expr: &syn::Expr) -> String {
        quote!(#expr).to_string()
    }

    #[test]
    fn stage_splits_on_pipe_without_spaces() {
        let attrs: Vec<Attribute> = vec![syn::parse_quote!(#[stage = "VERTEX|COMPUTE"])];
        let expr = get_stage_value(&attrs).unwrap();
        let expected: syn::Expr =
            syn::parse_quote!(::ash::vk::ShaderStageFlags::VERTEX | ::ash::vk::ShaderStageFlags::COMPUTE);
        assert_eq!(tokens(&expr), tokens(&expected));
    }

    #[test]
    fn defaults_apply_when_attrs_missing() {
        let attrs: Vec<Attribute> = vec![];
        assert_eq!(get_binding_value(&attrs).unwrap(), None);
        let ty = get_descriptor_type(&attrs).unwrap();
        let expected: syn::Expr = syn::parse_quote!(::ash::vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(tokens(&ty), tokens(&expected));
        let count = get_count_value(&attrs);
        assert_eq!(tokens(&count), "1");
    }

    #[test]
    fn missing_binding_is_an_error() {
        let input: DeriveInput = syn::parse_quote! {
            struct Broken {
                #[descriptor_type = "STORAGE_IMAGE"]
                _image: (),
            }
        };
        let err = expand(&input).unwrap_err();
        assert!(err.to_string().contains("binding"));
    }

    #[test]
    fn tuple_struct_is_rejected() {
        let input: DeriveInput = syn::parse_quote!(
            struct Tuple(());
        );
        assert!(expand(&input).is_err());
    }

    #[test]
    fn expand_generates_accessor_without_underscores() {
        let input: DeriveInput = syn::parse_quote! {
            struct Layout {
                #[binding = 3]
                #[descriptor_type = "STORAGE_BUFFER"]
                #[stage = "COMPUTE"]
                _instances_: (),
            }
        };
        let out = expand(&input).unwrap().to_string();
        assert!(out.contains("fn instances ()"));
        assert!(out.contains("STORAGE_BUFFER"));
    }
}
