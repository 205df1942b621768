//! Operator attribute schemas and the construction-time validator.
//!
//! Checks are structural: a value is accepted only when its variant matches
//! the declared kind. An integral float is not an integer and `1` is not a
//! boolean unless the attribute opts into integer-as-boolean.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use core_types::{Backend, DataType};
use derive_more::From;
use tracing::warn;

use crate::types::OpError;
use crate::Registry;

/// Attribute arguments as supplied by the operator front end
pub type AttrMap = HashMap<String, AttrValue>;

/// A dynamically-typed attribute value
#[derive(Debug, Clone, PartialEq, From)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Type(DataType),
    List(Vec<AttrValue>),
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(v.into())
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(v: Vec<i64>) -> Self {
        AttrValue::List(v.into_iter().map(AttrValue::Int).collect())
    }
}

impl From<Vec<Vec<i64>>> for AttrValue {
    fn from(v: Vec<Vec<i64>>) -> Self {
        AttrValue::List(v.into_iter().map(AttrValue::from).collect())
    }
}

impl AttrValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_dtype(&self) -> Option<DataType> {
        match self {
            AttrValue::Type(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int_list(&self) -> Option<Vec<i64>> {
        match self {
            AttrValue::List(items) => items.iter().map(AttrValue::as_int).collect(),
            _ => None,
        }
    }

    pub fn as_int_list_list(&self) -> Option<Vec<Vec<i64>>> {
        match self {
            AttrValue::List(items) => items.iter().map(AttrValue::as_int_list).collect(),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Float(v) => write!(f, "{v:?}"),
            AttrValue::Bool(v) => write!(f, "{v}"),
            AttrValue::Str(v) => write!(f, "{v:?}"),
            AttrValue::Type(v) => write!(f, "{v}"),
            AttrValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Value kind an attribute is declared with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttrKind {
    Int,
    Float,
    Bool,
    Str,
    IntList,
    IntListList,
    TypeRef,
}

impl AttrKind {
    /// Structural match, recursing into list elements
    pub fn matches(self, value: &AttrValue) -> bool {
        match (self, value) {
            (AttrKind::Int, AttrValue::Int(_))
            | (AttrKind::Float, AttrValue::Float(_))
            | (AttrKind::Bool, AttrValue::Bool(_))
            | (AttrKind::Str, AttrValue::Str(_))
            | (AttrKind::TypeRef, AttrValue::Type(_)) => true,
            (AttrKind::IntList, AttrValue::List(items)) => {
                items.iter().all(|v| AttrKind::Int.matches(v))
            }
            (AttrKind::IntListList, AttrValue::List(items)) => {
                items.iter().all(|v| AttrKind::IntList.matches(v))
            }
            _ => false,
        }
    }
}

impl fmt::Display for AttrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttrKind::Int => "integer",
            AttrKind::Float => "float",
            AttrKind::Bool => "boolean",
            AttrKind::Str => "string",
            AttrKind::IntList => "list of integers",
            AttrKind::IntListList => "list of integer lists",
            AttrKind::TypeRef => "type",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Requirement {
    Required,
    Optional(AttrValue),
}

/// Declaration of one attribute
#[derive(Debug, Clone, PartialEq)]
pub struct AttrSpec {
    name:          Arc<str>,
    kinds:         Vec<AttrKind>,
    requirement:   Requirement,
    int_as_bool:   bool,
    allowed_types: Option<Vec<DataType>>,
}

impl AttrSpec {
    pub fn required(name: &str, kind: AttrKind) -> Self {
        Self {
            name: name.into(),
            kinds: vec![kind],
            requirement: Requirement::Required,
            int_as_bool: false,
            allowed_types: None,
        }
    }

    pub fn optional(name: &str, kind: AttrKind, default: impl Into<AttrValue>) -> Self {
        Self {
            requirement: Requirement::Optional(default.into()),
            ..Self::required(name, kind)
        }
    }

    /// Also accept values of `kind`. The first declared kind is the one
    /// reported in errors.
    pub fn or_kind(mut self, kind: AttrKind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    /// Accept the integers 0 and 1 for a boolean attribute
    pub fn int_as_bool(mut self) -> Self {
        self.int_as_bool = true;
        self
    }

    /// Restrict a type-reference attribute to the given element types
    pub fn allowed_types(mut self, types: impl IntoIterator<Item = DataType>) -> Self {
        self.allowed_types = Some(types.into_iter().collect());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AttrKind {
        self.kinds[0]
    }

    pub fn kinds(&self) -> &[AttrKind] {
        &self.kinds
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    pub fn is_required(&self) -> bool {
        matches!(self.requirement, Requirement::Required)
    }

    /// Normalized value, or `None` if `value` does not fit this declaration
    fn check(&self, value: &AttrValue) -> Option<AttrValue> {
        if self.int_as_bool && self.kinds.contains(&AttrKind::Bool) {
            if let AttrValue::Int(i @ (0 | 1)) = value {
                return Some(AttrValue::Bool(*i == 1));
            }
        }
        if !self.kinds.iter().any(|k| k.matches(value)) {
            return None;
        }
        if let (Some(allowed), AttrValue::Type(dt)) = (&self.allowed_types, value) {
            if !allowed.contains(dt) {
                return None;
            }
        }
        Some(value.clone())
    }
}

/// Ordered attribute declarations of one operator.
///
/// Identical for every backend the operator is registered on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeSchema {
    specs: Vec<AttrSpec>,
}

impl AttributeSchema {
    pub fn new(specs: Vec<AttrSpec>) -> Self {
        Self { specs }
    }

    pub fn specs(&self) -> &[AttrSpec] {
        &self.specs
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&AttrSpec> {
        self.specs.iter().find(|s| s.name() == name)
    }

    /// Reject repeated names and defaults that fail their own declaration
    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        for (i, spec) in self.specs.iter().enumerate() {
            if self.specs[..i].iter().any(|s| s.name == spec.name) {
                return Err(format!("attribute `{}` declared twice", spec.name));
            }
            if let Requirement::Optional(default) = &spec.requirement {
                if spec.check(default).is_none() {
                    return Err(format!(
                        "default {} of `{}` is not a valid {}",
                        default, spec.name, spec.kind()
                    ));
                }
            }
        }
        Ok(())
    }

    /// Check `values` against this schema and fill in defaults.
    ///
    /// Fail-fast: required presence is checked first, then each attribute's
    /// kind, both in declaration order. The first violation is returned.
    pub fn validate(&self, op: &str, values: &AttrMap) -> Result<Attributes, OpError> {
        if let Some(missing) = self
            .specs
            .iter()
            .find(|s| s.is_required() && !values.contains_key(s.name()))
        {
            return Err(missing_attr(op, missing));
        }

        let mut entries = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            let value = match (values.get(spec.name()), &spec.requirement) {
                (Some(given), _) => spec.check(given).ok_or_else(|| OpError::AttributeTypeError {
                    op: op.to_string(),
                    attribute: spec.name().to_string(),
                    expected: spec.kind(),
                    actual: given.clone(),
                })?,
                (None, Requirement::Optional(default)) => {
                    spec.check(default).unwrap_or_else(|| default.clone())
                }
                (None, Requirement::Required) => return Err(missing_attr(op, spec)),
            };
            entries.push((spec.name.clone(), value));
        }

        for key in values.keys().filter(|k| self.get(k).is_none()) {
            warn!(op, attribute = %key, "dropping undeclared attribute");
        }

        Ok(Attributes { entries })
    }
}

fn missing_attr(op: &str, spec: &AttrSpec) -> OpError {
    OpError::MissingRequiredAttribute {
        op: op.to_string(),
        attribute: spec.name().to_string(),
    }
}

/// Validated attributes in schema order, defaults filled in
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attributes {
    entries: Vec<(Arc<str>, AttrValue)>,
}

impl Attributes {
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.entries.iter().find(|(n, _)| &**n == name).map(|(_, v)| v)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(AttrValue::as_int)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(AttrValue::as_float)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(AttrValue::as_bool)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttrValue::as_str)
    }

    pub fn dtype(&self, name: &str) -> Option<DataType> {
        self.get(name).and_then(AttrValue::as_dtype)
    }

    pub fn int_list(&self, name: &str) -> Option<Vec<i64>> {
        self.get(name).and_then(AttrValue::as_int_list)
    }

    pub fn int_list_list(&self, name: &str) -> Option<Vec<Vec<i64>>> {
        self.get(name).and_then(AttrValue::as_int_list_list)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(n, v)| (&**n, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validate constructor attributes of `name` as registered for `backend`
pub fn validate(
    registry: &Registry,
    name: &str,
    backend: Backend,
    values: &AttrMap,
) -> Result<Attributes, OpError> {
    let record = registry
        .lookup(name, backend)
        .first()
        .ok_or_else(|| OpError::UnregisteredOperator {
            op: name.to_string(),
            backend,
        })?;
    record.schema().validate(name, values)
}
