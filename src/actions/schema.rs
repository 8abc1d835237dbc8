//! Argument schemas derived from ABI types.
//!
//! Every ABI type maps onto one of three primitive kinds, optionally wrapped
//! in arrays. The validator only checks JSON shape; precise range and format
//! checks happen when arguments are ABI-encoded.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::actions::types::AbiParam;

/// Name of the optional field carrying native value (wei) for a call.
pub const TRANSACTION_VALUE_FIELD: &str = "transactionValue";

/// Primitive kind of an action argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "camelCase")]
pub enum FieldSchema {
    Bool,
    Number,
    String,
    ArrayOf(Box<FieldSchema>),
}

impl FieldSchema {
    /// Map an ABI type string onto a schema.
    pub fn from_abi_type(ty: &str) -> Self {
        let ty = ty.trim();
        if let Some(open) = ty.rfind('[') {
            if ty.ends_with(']') {
                return FieldSchema::ArrayOf(Box::new(FieldSchema::from_abi_type(&ty[..open])));
            }
        }
        if ty == "bool" {
            FieldSchema::Bool
        } else if is_numeric_type(ty) {
            FieldSchema::Number
        } else {
            FieldSchema::String
        }
    }

    /// Human-readable kind used in descriptions.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldSchema::Bool => "bool",
            FieldSchema::Number => "numeric",
            FieldSchema::String => "string",
            FieldSchema::ArrayOf(inner) => inner.kind_name(),
        }
    }

    /// Check that `value` has the JSON shape this schema expects.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match (self, value) {
            (FieldSchema::Bool, Value::Bool(_)) => Ok(()),
            (FieldSchema::Bool, Value::String(s)) if s == "true" || s == "false" => Ok(()),
            (FieldSchema::Number, Value::Number(_)) => Ok(()),
            (FieldSchema::Number, Value::String(s)) if is_numeric_literal(s) => Ok(()),
            (FieldSchema::String, Value::String(_) | Value::Number(_) | Value::Array(_)) => Ok(()),
            (FieldSchema::ArrayOf(inner), Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| format!("element {i}: {e}"))?;
                }
                Ok(())
            }
            (FieldSchema::ArrayOf(inner), _) => {
                Err(format!("expected an array of {} values", inner.kind_name()))
            }
            (schema, _) => Err(format!("expected a {} value", schema.kind_name())),
        }
    }
}

fn is_numeric_type(ty: &str) -> bool {
    let unsigned = ty.strip_prefix('u').unwrap_or(ty);
    if let Some(bits) = unsigned.strip_prefix("int") {
        return bits.chars().all(|c| c.is_ascii_digit());
    }
    unsigned.starts_with("fixed")
}

/// Decimal (optionally signed, optionally fractional) or `0x` hex literal.
fn is_numeric_literal(s: &str) -> bool {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    let digits = s.strip_prefix('-').unwrap_or(s);
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let frac = parts.next();
    !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && frac.map_or(true, |f| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()))
}

/// One named input of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    pub name: String,
    pub abi_type: String,
    pub schema: FieldSchema,
    pub description: String,
}

impl SchemaField {
    /// Build the field for the `index`-th ABI input. Unnamed inputs become `arg{index}`.
    pub fn from_param(index: usize, param: &AbiParam) -> Self {
        let name = if param.name.trim().is_empty() {
            format!("arg{index}")
        } else {
            param.name.clone()
        };
        let schema = FieldSchema::from_abi_type(&param.kind);
        let descriptor = if matches!(schema, FieldSchema::ArrayOf(_)) {
            "array"
        } else {
            "a"
        };
        let description = format!("{descriptor} {} input called {name}", schema.kind_name());
        Self {
            name,
            abi_type: param.canonical_type(),
            schema,
            description,
        }
    }
}

/// The full argument schema of an action, in ABI declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentSchema {
    pub fields: Vec<SchemaField>,
    /// Whether `transactionValue` may be supplied.
    pub transaction_value: bool,
}

impl ArgumentSchema {
    /// Validate an argument map. Unknown keys are ignored.
    pub fn validate(&self, args: &Map<String, Value>) -> Result<(), String> {
        for field in &self.fields {
            match args.get(&field.name) {
                None | Some(Value::Null) => {
                    return Err(format!("missing argument `{}`", field.name));
                }
                Some(value) => field
                    .schema
                    .validate(value)
                    .map_err(|e| format!("invalid argument `{}`: {e}", field.name))?,
            }
        }

        match args.get(TRANSACTION_VALUE_FIELD) {
            None | Some(Value::Null) => Ok(()),
            Some(_) if !self.transaction_value => Err(format!(
                "`{TRANSACTION_VALUE_FIELD}` is not accepted by this action"
            )),
            Some(value) => FieldSchema::Number
                .validate(value)
                .map_err(|e| format!("invalid argument `{TRANSACTION_VALUE_FIELD}`: {e}")),
        }
    }

    /// Validate `args` and return them positionally, in ABI declaration order.
    pub fn order_arguments<'a>(&self, args: &'a Map<String, Value>) -> Result<Vec<&'a Value>, String> {
        self.validate(args)?;
        self.fields
            .iter()
            .map(|field| {
                args.get(&field.name)
                    .ok_or_else(|| format!("missing argument `{}`", field.name))
            })
            .collect()
    }
}
