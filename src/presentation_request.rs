mod interval;
mod restriction;

pub use interval::*;
pub use restriction::*;

use crate::error::Error;
use crate::nonce::Nonce;
use crate::AnonCredsResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A verifier's request for a presentation
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PresentationRequest {
    /// The nonce the presentation must be bound to
    pub nonce: Nonce,
    /// Friendly name
    pub name: String,
    /// Request version
    pub version: String,
    /// Attributes to reveal, keep hidden or self attest, by referent
    #[serde(default)]
    pub requested_attributes: BTreeMap<String, AttributeInfo>,
    /// Predicates to prove, by referent
    #[serde(default)]
    pub requested_predicates: BTreeMap<String, PredicateInfo>,
    /// Applies to every referent without its own interval
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub non_revoked: Option<NonRevokedInterval>,
    /// Request format version
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ver: Option<String>,
}

impl PresentationRequest {
    /// Check the referents are well formed
    pub fn validate(&self) -> AnonCredsResult<()> {
        if self.requested_attributes.is_empty() && self.requested_predicates.is_empty() {
            return Err(Error::input(
                "presentation request has no attributes or predicates",
            ));
        }
        for (referent, info) in &self.requested_attributes {
            match (&info.name, &info.names) {
                (Some(name), None) if !name.is_empty() => {}
                (None, Some(names)) if !names.is_empty() && names.iter().all(|n| !n.is_empty()) => {
                    let unique = names.iter().collect::<HashSet<_>>();
                    if unique.len() != names.len() {
                        return Err(Error::input(format!(
                            "requested attribute '{}' repeats a name",
                            referent
                        )));
                    }
                }
                _ => {
                    return Err(Error::input(format!(
                        "requested attribute '{}' needs exactly one of a name or a non empty list of names",
                        referent
                    )))
                }
            }
        }
        for (referent, info) in &self.requested_predicates {
            if info.name.is_empty() {
                return Err(Error::input(format!(
                    "requested predicate '{}' has no attribute name",
                    referent
                )));
            }
            if self.requested_attributes.contains_key(referent) {
                return Err(Error::input(format!(
                    "referent '{}' is both an attribute and a predicate",
                    referent
                )));
            }
        }
        Ok(())
    }

    /// The interval for a referent: its own, else the request's
    pub(crate) fn interval_for(&self, own: Option<&NonRevokedInterval>) -> Option<NonRevokedInterval> {
        own.or(self.non_revoked.as_ref()).copied()
    }

    /// The strictest interval over the referents one credential answers.
    /// `None` when no bounded interval applies, so non-revocation is not required
    pub(crate) fn strictest_interval<'r>(
        &self,
        attr_referents: impl IntoIterator<Item = &'r str>,
        pred_referents: impl IntoIterator<Item = &'r str>,
    ) -> Option<NonRevokedInterval> {
        let attrs = attr_referents
            .into_iter()
            .filter_map(|r| self.requested_attributes.get(r))
            .map(|info| self.interval_for(info.non_revoked.as_ref()));
        let preds = pred_referents
            .into_iter()
            .filter_map(|r| self.requested_predicates.get(r))
            .map(|info| self.interval_for(info.non_revoked.as_ref()));
        let mut strictest: Option<NonRevokedInterval> = None;
        for interval in attrs.chain(preds).flatten() {
            match strictest.as_mut() {
                Some(s) => s.compare_and_set(&interval),
                None => strictest = Some(interval),
            }
        }
        strictest.filter(|i| !i.is_unbounded())
    }
}

/// A requested attribute, or group of attributes from one credential
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttributeInfo {
    /// A single attribute name
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    /// Several attribute names revealed from the same credential
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub names: Option<Vec<String>>,
    /// Credentials that may satisfy the attribute
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub restrictions: Option<Query>,
    /// Non-revocation interval for this attribute
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub non_revoked: Option<NonRevokedInterval>,
}

impl AttributeInfo {
    /// A single attribute
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// An attribute group
    pub fn group<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Some(names.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Every requested name
    pub fn names(&self) -> Vec<&str> {
        match (&self.name, &self.names) {
            (Some(name), _) => vec![name.as_str()],
            (None, Some(names)) => names.iter().map(String::as_str).collect(),
            (None, None) => Vec::new(),
        }
    }

    /// Whether this is a `names` group
    pub fn is_group(&self) -> bool {
        self.name.is_none() && self.names.is_some()
    }

    /// Restrictions that actually constrain something
    pub(crate) fn restrictions(&self) -> Option<&Query> {
        self.restrictions.as_ref().filter(|r| !r.is_empty())
    }
}

/// Comparison operators of a predicate
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum PredicateType {
    /// Greater than or equal
    #[serde(rename = ">=")]
    GE,
    /// Less than or equal
    #[serde(rename = "<=")]
    LE,
    /// Greater than
    #[serde(rename = ">")]
    GT,
    /// Less than
    #[serde(rename = "<")]
    LT,
}

impl PredicateType {
    /// The inclusive `(lower, upper)` bounds a value must lie in
    pub fn bounds(&self, p_value: i32) -> (Option<i64>, Option<i64>) {
        let v = i64::from(p_value);
        match self {
            Self::GE => (Some(v), None),
            Self::GT => (Some(v + 1), None),
            Self::LE => (None, Some(v)),
            Self::LT => (None, Some(v - 1)),
        }
    }

    /// Whether `value` satisfies the predicate
    pub fn is_satisfied(&self, value: i64, p_value: i32) -> bool {
        let (lower, upper) = self.bounds(p_value);
        lower.map_or(true, |l| value >= l) && upper.map_or(true, |u| value <= u)
    }
}

impl Display for PredicateType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::GE => ">=",
            Self::LE => "<=",
            Self::GT => ">",
            Self::LT => "<",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PredicateType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">=" | "GE" => Ok(Self::GE),
            "<=" | "LE" => Ok(Self::LE),
            ">" | "GT" => Ok(Self::GT),
            "<" | "LT" => Ok(Self::LT),
            _ => Err(Error::input(format!("unknown predicate type '{}'", s))),
        }
    }
}

/// A requested predicate over one attribute
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PredicateInfo {
    /// The attribute name
    pub name: String,
    /// The comparison
    pub p_type: PredicateType,
    /// The threshold
    pub p_value: i32,
    /// Credentials that may satisfy the predicate
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub restrictions: Option<Query>,
    /// Non-revocation interval for this predicate
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub non_revoked: Option<NonRevokedInterval>,
}

impl PredicateInfo {
    /// Create a new predicate
    pub fn new(name: impl Into<String>, p_type: PredicateType, p_value: i32) -> Self {
        Self {
            name: name.into(),
            p_type,
            p_value,
            restrictions: None,
            non_revoked: None,
        }
    }

    /// Restrictions that actually constrain something
    pub(crate) fn restrictions(&self) -> Option<&Query> {
        self.restrictions.as_ref().filter(|r| !r.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = r#"{
        "nonce": "123432421212",
        "name": "proof_req_1",
        "version": "0.1",
        "requested_attributes": {
            "attr1_referent": {"name": "name", "restrictions": {"schema_name": "gvt"}},
            "attr2_referent": {"names": ["name", "height"]}
        },
        "requested_predicates": {
            "predicate1_referent": {"name": "age", "p_type": ">=", "p_value": 18}
        },
        "non_revoked": {"from": 0, "to": 100}
    }"#;

    #[test]
    fn request_json() {
        let req: PresentationRequest = serde_json::from_str(REQUEST).unwrap();
        req.validate().unwrap();
        assert_eq!(req.nonce.as_str(), "123432421212");
        assert_eq!(req.requested_attributes["attr2_referent"].names(), vec!["name", "height"]);
        assert!(req.requested_attributes["attr2_referent"].is_group());
        assert_eq!(
            req.requested_attributes["attr1_referent"].restrictions(),
            Some(&Query::equal("schema_name", "gvt"))
        );
        let pred = &req.requested_predicates["predicate1_referent"];
        assert_eq!(pred.p_type, PredicateType::GE);
        assert_eq!(
            req.interval_for(None),
            Some(NonRevokedInterval::new(Some(0), Some(100)))
        );
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["requested_predicates"]["predicate1_referent"]["p_type"], ">=");
    }

    #[test]
    fn strictest_interval_over_referents() {
        let mut req: PresentationRequest = serde_json::from_str(REQUEST).unwrap();
        req.requested_attributes
            .get_mut("attr1_referent")
            .unwrap()
            .non_revoked = Some(NonRevokedInterval::new(Some(20), Some(150)));
        assert_eq!(
            req.strictest_interval(["attr1_referent"], ["predicate1_referent"]),
            Some(NonRevokedInterval::new(Some(20), Some(100)))
        );
        assert_eq!(
            req.strictest_interval(["attr1_referent"], Vec::<&str>::new()),
            Some(NonRevokedInterval::new(Some(20), Some(150)))
        );

        req.non_revoked = None;
        assert_eq!(req.strictest_interval(["attr2_referent"], ["predicate1_referent"]), None);
        req.non_revoked = Some(NonRevokedInterval::default());
        assert_eq!(req.strictest_interval(["attr2_referent"], Vec::<&str>::new()), None);
    }

    #[test]
    fn malformed_attributes() {
        let mut req: PresentationRequest = serde_json::from_str(REQUEST).unwrap();
        req.requested_attributes
            .insert("bad".into(), AttributeInfo::default());
        assert!(req.validate().is_err());

        let mut req: PresentationRequest = serde_json::from_str(REQUEST).unwrap();
        req.requested_attributes
            .insert("dup".into(), AttributeInfo::group(["age", "age"]));
        assert!(req.validate().is_err());
    }

    #[test]
    fn predicate_bounds() {
        assert!(PredicateType::GE.is_satisfied(18, 18));
        assert!(!PredicateType::GE.is_satisfied(17, 18));
        assert!(!PredicateType::GT.is_satisfied(18, 18));
        assert!(PredicateType::LT.is_satisfied(17, 18));
        assert!(PredicateType::LE.is_satisfied(i64::from(i32::MIN), i32::MIN));
        assert!(!PredicateType::LE.is_satisfied(-5, -6));
        assert_eq!(PredicateType::LT.bounds(i32::MIN), (None, Some(i64::from(i32::MIN) - 1)));
        assert_eq!("<=".parse::<PredicateType>().unwrap(), PredicateType::LE);
    }
}
