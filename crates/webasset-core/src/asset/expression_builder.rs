//! Translation of asset mapping filters into binding queries.
//!
//! Asset mappings are stored as discovery bindings, so a filter written
//! against mapping fields (`uuid`, `glob`, `targetName`, `webPath`) has to be
//! rewritten against binding fields before the discovery can run it. The
//! rewritten filter is always conjoined onto a fixed clause that restricts
//! the search to enabled asset bindings.

use std::str::FromStr;

use crate::binding::{BindingDescriptor, BindingState};
use crate::error::ExprError;
use crate::expr::{Criterion, Expr};

use super::{AssetMapping, BINDING_TYPE, PATH_PARAMETER, QUERY_SUFFIX, TARGET_PARAMETER};

/// Fields of [`AssetMapping`] that filters may refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingField {
    Uuid,
    TargetName,
    Glob,
    WebPath,
}

/// Where a mapping field lives on a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindingField {
    /// A top-level binding field
    Field(&'static str),
    /// An entry of the binding's parameter values
    Parameter(&'static str),
}

impl MappingField {
    fn binding_field(self) -> BindingField {
        match self {
            MappingField::Uuid => BindingField::Field(BindingDescriptor::UUID),
            MappingField::TargetName => BindingField::Parameter(TARGET_PARAMETER),
            MappingField::Glob => BindingField::Field(BindingDescriptor::QUERY),
            MappingField::WebPath => BindingField::Parameter(PATH_PARAMETER),
        }
    }
}

impl FromStr for MappingField {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            AssetMapping::UUID => Ok(MappingField::Uuid),
            AssetMapping::TARGET_NAME => Ok(MappingField::TargetName),
            AssetMapping::GLOB => Ok(MappingField::Glob),
            AssetMapping::WEB_PATH => Ok(MappingField::WebPath),
            other => Err(ExprError::UnknownField(other.to_string())),
        }
    }
}

/// Builds binding queries from asset mapping filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct BindingExpressionBuilder;

impl BindingExpressionBuilder {
    pub fn new() -> Self {
        Self
    }

    /// The clause every asset binding query starts with.
    pub fn default_expression() -> Expr {
        Expr::same(BindingDescriptor::STATE, BindingState::Enabled.as_str())
            .and_same(BindingDescriptor::TYPE_NAME, BINDING_TYPE)
            .and_ends_with(BindingDescriptor::QUERY, QUERY_SUFFIX)
    }

    /// Translate an optional mapping filter into a binding query.
    ///
    /// Without a filter the result is exactly [`Self::default_expression`].
    /// Otherwise the translated filter is conjoined onto it as one nested
    /// clause that keeps the filter's own and/or structure.
    pub fn build_expression(&self, expr: Option<&Expr>) -> Result<Expr, ExprError> {
        let base = Self::default_expression();
        match expr {
            None => Ok(base),
            Some(expr) => Ok(base.and_x(translate(expr)?)),
        }
    }
}

fn translate(expr: &Expr) -> Result<Expr, ExprError> {
    match expr {
        Expr::And(items) => Ok(Expr::And(
            items.iter().map(translate).collect::<Result<_, _>>()?,
        )),
        Expr::Or(items) => Ok(Expr::Or(
            items.iter().map(translate).collect::<Result<_, _>>()?,
        )),
        Expr::Field { field, criterion } => {
            let mapping_field: MappingField = field.parse()?;
            match mapping_field.binding_field() {
                BindingField::Field(name) if mapping_field == MappingField::Glob => {
                    Ok(Expr::field(name, append_query_suffix(field, criterion)?))
                }
                BindingField::Field(name) => Ok(Expr::field(name, criterion.clone())),
                BindingField::Parameter(key) => Ok(Expr::key(
                    BindingDescriptor::PARAMETER_VALUES,
                    key,
                    criterion.clone(),
                )),
            }
        }
        Expr::Key { field, .. } => Err(ExprError::KeyAccessNotSupported(field.clone())),
    }
}

/// Globs are stored with [`QUERY_SUFFIX`] appended, so every comparison
/// that pins the end of the glob must carry the suffix as well.
fn append_query_suffix(field: &str, criterion: &Criterion) -> Result<Criterion, ExprError> {
    let suffixed = |value: &serde_json::Value| match value.as_str() {
        Some(s) => Ok(serde_json::Value::String(format!("{s}{QUERY_SUFFIX}"))),
        None => Err(ExprError::NonStringOperand {
            field: field.to_string(),
        }),
    };

    Ok(match criterion {
        Criterion::Same(v) => Criterion::Same(suffixed(v)?),
        Criterion::Equals(v) => Criterion::Equals(suffixed(v)?),
        Criterion::NotSame(v) => Criterion::NotSame(suffixed(v)?),
        Criterion::NotEquals(v) => Criterion::NotEquals(suffixed(v)?),
        Criterion::EndsWith(s) => Criterion::EndsWith(format!("{s}{QUERY_SUFFIX}")),
        Criterion::StartsWith(s) => Criterion::StartsWith(s.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> BindingExpressionBuilder {
        BindingExpressionBuilder::new()
    }

    fn mandatory() -> Expr {
        Expr::same(BindingDescriptor::STATE, "enabled")
            .and_same(BindingDescriptor::TYPE_NAME, BINDING_TYPE)
            .and_ends_with(BindingDescriptor::QUERY, "{,/**}")
    }

    #[test]
    fn build_default_expression() {
        assert_eq!(builder().build_expression(None).unwrap(), mandatory());
    }

    #[test]
    fn build_expression_with_custom_criteria() {
        let expr1 = Expr::starts_with(AssetMapping::UUID, "abcd")
            .or_same(AssetMapping::TARGET_NAME, "local")
            .or_x(
                Expr::same(AssetMapping::GLOB, "/path").and_same(AssetMapping::WEB_PATH, "css"),
            );

        let expr2 = mandatory().and_x(
            Expr::starts_with(BindingDescriptor::UUID, "abcd")
                .or_key_same(
                    BindingDescriptor::PARAMETER_VALUES,
                    TARGET_PARAMETER,
                    "local",
                )
                .or_x(
                    Expr::same(BindingDescriptor::QUERY, "/path{,/**}").and_key_same(
                        BindingDescriptor::PARAMETER_VALUES,
                        PATH_PARAMETER,
                        "css",
                    ),
                ),
        );

        assert_eq!(builder().build_expression(Some(&expr1)).unwrap(), expr2);
    }

    #[test]
    fn target_name_becomes_keyed_parameter() {
        let expr1 = Expr::same(AssetMapping::TARGET_NAME, "local");
        let expr2 = mandatory().and_key_same(
            BindingDescriptor::PARAMETER_VALUES,
            TARGET_PARAMETER,
            "local",
        );
        assert_eq!(builder().build_expression(Some(&expr1)).unwrap(), expr2);
    }

    #[test]
    fn append_default_query_suffix_for_same() {
        let expr1 = Expr::same(AssetMapping::GLOB, "/path");
        let expr2 = mandatory().and_same(BindingDescriptor::QUERY, "/path{,/**}");
        assert_eq!(builder().build_expression(Some(&expr1)).unwrap(), expr2);
    }

    #[test]
    fn append_default_query_suffix_for_equals() {
        let expr1 = Expr::equals(AssetMapping::GLOB, "/path");
        let expr2 = mandatory().and_equals(BindingDescriptor::QUERY, "/path{,/**}");
        assert_eq!(builder().build_expression(Some(&expr1)).unwrap(), expr2);
    }

    #[test]
    fn append_default_query_suffix_for_not_same() {
        let expr1 = Expr::not_same(AssetMapping::GLOB, "/path");
        let expr2 = mandatory().and_not_same(BindingDescriptor::QUERY, "/path{,/**}");
        assert_eq!(builder().build_expression(Some(&expr1)).unwrap(), expr2);
    }

    #[test]
    fn append_default_query_suffix_for_not_equals() {
        let expr1 = Expr::not_equals(AssetMapping::GLOB, "/path");
        let expr2 = mandatory().and_not_equals(BindingDescriptor::QUERY, "/path{,/**}");
        assert_eq!(builder().build_expression(Some(&expr1)).unwrap(), expr2);
    }

    #[test]
    fn append_default_query_suffix_for_ends_with() {
        let expr1 = Expr::ends_with(AssetMapping::GLOB, ".css");
        let expr2 = mandatory().and_ends_with(BindingDescriptor::QUERY, ".css{,/**}");
        assert_eq!(builder().build_expression(Some(&expr1)).unwrap(), expr2);
    }

    #[test]
    fn starts_with_on_glob_is_unchanged() {
        let expr1 = Expr::starts_with(AssetMapping::GLOB, "/app");
        let expr2 = mandatory().and_starts_with(BindingDescriptor::QUERY, "/app");
        assert_eq!(builder().build_expression(Some(&expr1)).unwrap(), expr2);
    }

    #[test]
    fn equal_inputs_build_equal_outputs() {
        let input = Expr::same(AssetMapping::WEB_PATH, "/css").and_starts_with(AssetMapping::UUID, "ab");
        let a = builder().build_expression(Some(&input.clone())).unwrap();
        let b = builder().build_expression(Some(&input)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_field_fails() {
        let expr = Expr::same("installerName", "copy");
        assert_eq!(
            builder().build_expression(Some(&expr)).unwrap_err(),
            ExprError::UnknownField("installerName".to_string())
        );
    }

    #[test]
    fn unknown_field_nested_in_disjunction_fails() {
        let expr = Expr::same(AssetMapping::GLOB, "/a").or_same("bogus", "x");
        assert!(matches!(
            builder().build_expression(Some(&expr)),
            Err(ExprError::UnknownField(field)) if field == "bogus"
        ));
    }

    #[test]
    fn key_access_on_mapping_field_fails() {
        let expr = Expr::key_same(AssetMapping::WEB_PATH, "x", "y");
        assert_eq!(
            builder().build_expression(Some(&expr)).unwrap_err(),
            ExprError::KeyAccessNotSupported(AssetMapping::WEB_PATH.to_string())
        );
    }

    #[test]
    fn non_string_glob_operand_fails() {
        let expr = Expr::same(AssetMapping::GLOB, 42);
        assert!(matches!(
            builder().build_expression(Some(&expr)),
            Err(ExprError::NonStringOperand { .. })
        ));
    }

    #[test]
    fn mapping_fields_parse_from_their_names() {
        assert_eq!("uuid".parse::<MappingField>(), Ok(MappingField::Uuid));
        assert_eq!("glob".parse::<MappingField>(), Ok(MappingField::Glob));
        assert_eq!(
            "targetName".parse::<MappingField>(),
            Ok(MappingField::TargetName)
        );
        assert_eq!("webPath".parse::<MappingField>(), Ok(MappingField::WebPath));
    }
}
