use crate::error::Error;
use crate::identifiers::IssuerId;
use crate::utils::{attr_common_view, deserialize_indexset, serialize_indexset};
use crate::AnonCredsResult;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// The ordered, unique attribute names of a schema
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AttributeNames(
    #[serde(
        serialize_with = "serialize_indexset",
        deserialize_with = "deserialize_indexset"
    )]
    pub IndexSet<String>,
);

impl AttributeNames {
    /// Collect attribute names, duplicates and empty names are rejected
    pub fn new<I, S>(names: I) -> AnonCredsResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = IndexSet::new();
        for name in names {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(Error::input("empty attribute name"));
            }
            if !set.insert(name.clone()) {
                return Err(Error::input(format!("duplicate attribute name '{}'", name)));
            }
        }
        if set.is_empty() {
            return Err(Error::input("attribute names are empty"));
        }
        Ok(Self(set))
    }

    /// The number of attributes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// There are no attributes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The position of `name` in the schema order. Names compare
    /// case insensitively, ignoring spaces
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.get_index_of(name).or_else(|| {
            let name = attr_common_view(name);
            self.0.iter().position(|n| attr_common_view(n) == name)
        })
    }

    /// Iterate the names in schema order
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}

/// A credential schema
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Friendly name
    pub name: String,
    /// The schema version
    pub version: String,
    /// The attributes signed into credentials of this schema
    pub attr_names: AttributeNames,
    /// The issuer that published the schema
    pub issuer_id: IssuerId,
}

impl Schema {
    /// Create a new schema
    pub fn new<I, S>(issuer_id: IssuerId, name: &str, version: &str, attr_names: I) -> AnonCredsResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if name.trim().is_empty() {
            return Err(Error::input("empty schema name"));
        }
        if version.trim().is_empty() {
            return Err(Error::input("empty schema version"));
        }
        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
            attr_names: AttributeNames::new(attr_names)?,
            issuer_id,
        })
    }

    /// Check a deserialized schema
    pub fn validate(&self) -> AnonCredsResult<()> {
        if self.attr_names.is_empty() {
            return Err(Error::input("attribute names are empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> IssuerId {
        IssuerId::new("did:example:issuer").unwrap()
    }

    #[test]
    fn schema_json() {
        let schema = Schema::new(issuer(), "gvt", "1.0", ["name", "age"]).unwrap();
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["attrNames"], serde_json::json!(["name", "age"]));
        assert_eq!(json["issuerId"], "did:example:issuer");
        let back: Schema = serde_json::from_value(json).unwrap();
        assert_eq!(back, schema);
        assert_eq!(back.attr_names.index_of("age"), Some(1));
        assert_eq!(back.attr_names.index_of("A ge"), Some(1));
        assert_eq!(back.attr_names.index_of("height"), None);
    }

    #[test]
    fn invalid_attribute_names() {
        assert!(Schema::new(issuer(), "gvt", "1.0", Vec::<String>::new()).is_err());
        assert!(Schema::new(issuer(), "gvt", "1.0", ["age", "age"]).is_err());
        assert!(Schema::new(issuer(), "", "1.0", ["age"]).is_err());
        let json = r#"{"name":"gvt","version":"1.0","attrNames":["a","a"],"issuerId":"i"}"#;
        assert!(serde_json::from_str::<Schema>(json).is_err());
    }
}
