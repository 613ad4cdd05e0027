use crate::cred_def::CredentialDefinition;
use crate::error::Error;
use crate::identifiers::{CredentialDefinitionId, RevocationRegistryDefinitionId, SchemaId};
use crate::schema::Schema;
use crate::utils::attr_common_view;
use crate::AnonCredsResult;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

lazy_static! {
    /// Unqualified identifiers, the only ones `schema_issuer_did` and `issuer_did` compare against
    static ref LEGACY_IDENTIFIER: Regex =
        Regex::new("^[1-9A-HJ-NP-Za-km-z]{21,22}$").expect("valid legacy identifier regex");
}

/// A restriction over the tags of the credential answering a referent.
///
/// The JSON form is a query object: plain `"tag": "value"` pairs must all
/// match, `"$and"`, `"$or"` and `"$not"` combine nested queries, and a tag
/// may compare with `{"$neq": value}` or `{"$in": [values]}`. A JSON list
/// matches when any of its entries does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    /// Every query must match
    And(Vec<Query>),
    /// At least one query must match
    Or(Vec<Query>),
    /// The query must not match
    Not(Box<Query>),
    /// The tag equals the value
    Eq(String, String),
    /// The tag differs from the value
    Neq(String, String),
    /// The tag equals one of the values
    In(String, Vec<String>),
}

impl Query {
    /// Require `tag` to equal `value`
    pub fn equal(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq(tag.into(), value.into())
    }

    /// Require `tag` to differ from `value`
    pub fn not_equal(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Neq(tag.into(), value.into())
    }

    /// Require `tag` to equal one of `values`
    pub fn any_of<I, S>(tag: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::In(tag.into(), values.into_iter().map(Into::into).collect())
    }

    /// Negate this query
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// An empty `$and` or `$or` places no restriction
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::And(q) | Self::Or(q) if q.is_empty())
    }

    /// Evaluate against a credential. Unknown tags are an `Input` error
    pub(crate) fn matches(&self, ctx: &RestrictionContext<'_>) -> AnonCredsResult<bool> {
        match self {
            Self::Eq(tag, value) => ctx.tag_matches(tag, value),
            Self::Neq(tag, value) => Ok(!ctx.tag_matches(tag, value)?),
            Self::In(tag, values) => {
                for value in values {
                    if ctx.tag_matches(tag, value)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::And(queries) => {
                for q in queries {
                    if !q.matches(ctx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Or(queries) if queries.is_empty() => Ok(true),
            Self::Or(queries) => {
                for q in queries {
                    if q.matches(ctx)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Not(q) => Ok(!q.matches(ctx)?),
        }
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Object(map) => Self::from_map(map),
            Value::Array(list) => list
                .into_iter()
                .map(Self::from_value)
                .collect::<Result<_, _>>()
                .map(Self::Or),
            other => Err(format!("expected a query object or list, found {}", other)),
        }
    }

    fn from_map(map: Map<String, Value>) -> Result<Self, String> {
        let mut queries = map
            .into_iter()
            .map(|(key, value)| Self::from_entry(key, value))
            .collect::<Result<Vec<_>, _>>()?;
        if queries.len() == 1 {
            Ok(queries.remove(0))
        } else {
            Ok(Self::And(queries))
        }
    }

    fn from_entry(key: String, value: Value) -> Result<Self, String> {
        if key.starts_with('$') {
            return match (key.as_str(), value) {
                ("$and", Value::Array(list)) => list
                    .into_iter()
                    .map(Self::from_value)
                    .collect::<Result<_, _>>()
                    .map(Self::And),
                ("$or", Value::Array(list)) => list
                    .into_iter()
                    .map(Self::from_value)
                    .collect::<Result<_, _>>()
                    .map(Self::Or),
                ("$not", value @ Value::Object(_)) => Self::from_value(value).map(Self::negate),
                (op, _) => Err(format!("invalid operand for '{}'", op)),
            };
        }
        match value {
            Value::String(value) => Ok(Self::Eq(key, value)),
            Value::Object(ops) => {
                let mut ops = ops.into_iter();
                match (ops.next(), ops.next()) {
                    (Some((op, Value::String(value))), None) if op == "$neq" => {
                        Ok(Self::Neq(key, value))
                    }
                    (Some((op, Value::Array(values))), None) if op == "$in" => values
                        .into_iter()
                        .map(|v| match v {
                            Value::String(s) => Ok(s),
                            other => Err(format!("'$in' expects strings, found {}", other)),
                        })
                        .collect::<Result<_, _>>()
                        .map(|values| Self::In(key, values)),
                    (Some((op, _)), None) => {
                        Err(format!("unsupported operator '{}' for tag '{}'", op, key))
                    }
                    _ => Err(format!("tag '{}' needs exactly one operator", key)),
                }
            }
            other => Err(format!("invalid value for tag '{}': {}", key, other)),
        }
    }

    fn to_value(&self) -> Value {
        let entry = |key: &str, value: Value| {
            let mut map = Map::new();
            map.insert(key.to_owned(), value);
            Value::Object(map)
        };
        match self {
            Self::And(q) => entry("$and", Value::Array(q.iter().map(Self::to_value).collect())),
            Self::Or(q) => entry("$or", Value::Array(q.iter().map(Self::to_value).collect())),
            Self::Not(q) => entry("$not", q.to_value()),
            Self::Eq(tag, value) => entry(tag, Value::String(value.clone())),
            Self::Neq(tag, value) => entry(tag, entry("$neq", Value::String(value.clone()))),
            Self::In(tag, values) => entry(
                tag,
                entry(
                    "$in",
                    Value::Array(values.iter().cloned().map(Value::String).collect()),
                ),
            ),
        }
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(s)
    }
}

impl<'de> Deserialize<'de> for Query {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(d)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

/// What is known about the credential a restriction is checked against
pub(crate) struct RestrictionContext<'a> {
    pub schema_id: &'a SchemaId,
    pub schema: &'a Schema,
    pub cred_def_id: &'a CredentialDefinitionId,
    pub cred_def: &'a CredentialDefinition,
    pub rev_reg_id: Option<&'a RevocationRegistryDefinitionId>,
    /// Revealed raw values, by attribute common view
    pub attr_values: BTreeMap<String, &'a str>,
}

impl RestrictionContext<'_> {
    fn tag_matches(&self, tag: &str, value: &str) -> AnonCredsResult<bool> {
        let matched = match tag {
            "schema_id" => self.schema_id.as_str() == value,
            "schema_issuer_id" => self.schema.issuer_id.as_str() == value,
            "schema_issuer_did" => legacy_matches(self.schema.issuer_id.as_str(), value),
            "schema_name" => self.schema.name == value,
            "schema_version" => self.schema.version == value,
            "issuer_id" => self.cred_def.issuer_id.as_str() == value,
            "issuer_did" => legacy_matches(self.cred_def.issuer_id.as_str(), value),
            "cred_def_id" => self.cred_def_id.as_str() == value,
            "rev_reg_id" => self.rev_reg_id.map(|r| r.as_str()) == Some(value),
            _ => {
                let attr = tag
                    .strip_prefix("attr::")
                    .ok_or_else(|| Error::input(format!("unknown restriction tag '{}'", tag)))?;
                if let Some(name) = attr.strip_suffix("::marker") {
                    self.cred_def.attribute_index(name).is_some()
                } else if let Some(name) = attr.strip_suffix("::value") {
                    // an unrevealed value cannot be checked
                    match self.attr_values.get(&attr_common_view(name)) {
                        Some(raw) => *raw == value,
                        None => self.cred_def.attribute_index(name).is_some(),
                    }
                } else {
                    return Err(Error::input(format!("unknown restriction tag '{}'", tag)));
                }
            }
        };
        if !matched {
            log::debug!("restriction '{}' = '{}' is not met", tag, value);
        }
        Ok(matched)
    }
}

fn legacy_matches(actual: &str, value: &str) -> bool {
    LEGACY_IDENTIFIER.is_match(actual) && actual == value
}
