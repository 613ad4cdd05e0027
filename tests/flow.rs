use anoncreds_engine::prelude::*;
use lazy_static::lazy_static;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use std::collections::{BTreeSet, HashMap};

mod util;

use util::{presentation_request, setup, IssuerSetup, RegistrySetup};

const GVT_ATTRS: &[&str] = &["name", "sex", "age", "height", "address"];
const GVT_VALUES: &[(&str, &str)] = &[
    ("name", "Alex"),
    ("sex", "male"),
    ("age", "28"),
    ("height", "175"),
    ("address", "1 Main St"),
];

lazy_static! {
    static ref GVT: IssuerSetup = IssuerSetup::new("gvt", GVT_ATTRS, false);
}

fn gvt_request() -> PresentationRequest {
    presentation_request(json!({
        "requested_attributes": {
            "attr1_referent": {"name": "name", "restrictions": {"schema_name": "gvt"}},
            "attr2_referent": {"names": ["sex", "height"]},
            "attr3_referent": {"name": "address"},
            "attr4_referent": {"name": "phone"}
        },
        "requested_predicates": {
            "predicate1_referent": {"name": "age", "p_type": ">=", "p_value": 18}
        }
    }))
}

fn present_gvt(
    pres_req: &PresentationRequest,
    issuer: &IssuerSetup,
    credential: &Credential,
    link_secret: &LinkSecret,
) -> AnonCredsResult<Presentation> {
    let mut present = PresentCredentials::default();
    let mut add = present.add_credential(credential, None, None);
    add.add_requested_attribute("attr1_referent", true);
    add.add_requested_attribute("attr2_referent", true);
    add.add_requested_attribute("attr3_referent", false);
    add.add_requested_predicate("predicate1_referent");
    let self_attested = HashMap::from([("attr4_referent".to_string(), "8-800-300".to_string())]);
    Prover::create_presentation(
        pres_req,
        present,
        Some(self_attested),
        link_secret,
        &issuer.schemas(),
        &issuer.cred_defs(),
    )
}

/// Write `value` to JSON and read it back, checking nothing is lost
fn round_trip<T: Serialize + DeserializeOwned>(value: &T) -> T {
    let json = serde_json::to_string(value).unwrap();
    let back: T = serde_json::from_str(&json).unwrap();
    assert_eq!(
        serde_json::to_value(&back).unwrap(),
        serde_json::from_str::<serde_json::Value>(&json).unwrap()
    );
    back
}

#[test]
fn issue_present_and_verify() {
    setup();
    let issuer = &*GVT;
    let link_secret = Prover::create_link_secret().unwrap();
    let credential = issuer.issue(&link_secret, GVT_VALUES, None, None).unwrap();
    assert_eq!(credential.values.get("age").unwrap().raw, "28");

    let pres_req = gvt_request();
    let presentation = present_gvt(&pres_req, issuer, &credential, &link_secret).unwrap();

    let requested = &presentation.requested_proof;
    assert_eq!(requested.revealed_attrs["attr1_referent"].raw, "Alex");
    assert_eq!(
        requested.revealed_attrs["attr1_referent"].encoded,
        encode_credential_attribute("Alex")
    );
    let group = &requested.revealed_attr_groups["attr2_referent"];
    assert_eq!(group.values["sex"].raw, "male");
    assert_eq!(group.values["height"].encoded, "175");
    assert_eq!(requested.unrevealed_attrs["attr3_referent"].sub_proof_index, 0);
    assert_eq!(requested.self_attested_attrs["attr4_referent"], "8-800-300");
    assert_eq!(requested.predicates["predicate1_referent"].sub_proof_index, 0);
    assert_eq!(presentation.identifiers.len(), 1);
    assert_eq!(presentation.identifiers[0].timestamp, None);
    // hidden values stay out of the presentation
    assert!(!presentation.proof.proofs[0].revealed_attrs.contains_key("age"));
    assert!(!presentation.proof.proofs[0].revealed_attrs.contains_key("address"));

    let valid = Verifier::verify_presentation(
        &presentation,
        &pres_req,
        &issuer.schemas(),
        &issuer.cred_defs(),
        None,
        None,
        None,
    )
    .unwrap();
    assert!(valid);

    // survives a JSON round trip between holder and verifier
    let json = serde_json::to_string(&presentation).unwrap();
    let received: Presentation = serde_json::from_str(&json).unwrap();
    assert!(Verifier::verify_presentation(
        &received,
        &pres_req,
        &issuer.schemas(),
        &issuer.cred_defs(),
        None,
        None,
        None,
    )
    .unwrap());
}

#[test]
fn nonce_mismatch_is_not_satisfied() {
    setup();
    let issuer = &*GVT;
    let link_secret = Prover::create_link_secret().unwrap();
    let credential = issuer.issue(&link_secret, GVT_VALUES, None, None).unwrap();
    let pres_req = gvt_request();
    let presentation = present_gvt(&pres_req, issuer, &credential, &link_secret).unwrap();

    let mut other = pres_req.clone();
    other.nonce = Verifier::generate_nonce();
    let valid = Verifier::verify_presentation(
        &presentation,
        &other,
        &issuer.schemas(),
        &issuer.cred_defs(),
        None,
        None,
        None,
    )
    .unwrap();
    assert!(!valid);
}

#[test]
fn tampered_revealed_value_is_rejected() {
    setup();
    let issuer = &*GVT;
    let link_secret = Prover::create_link_secret().unwrap();
    let credential = issuer.issue(&link_secret, GVT_VALUES, None, None).unwrap();
    let pres_req = gvt_request();
    let mut presentation = present_gvt(&pres_req, issuer, &credential, &link_secret).unwrap();

    let forged = encode_credential_attribute("Bob");
    let info = presentation
        .requested_proof
        .revealed_attrs
        .get_mut("attr1_referent")
        .unwrap();
    info.raw = "Bob".to_string();
    info.encoded = forged.clone();
    presentation.proof.proofs[0]
        .revealed_attrs
        .insert("name".to_string(), forged);

    let err = Verifier::verify_presentation(
        &presentation,
        &pres_req,
        &issuer.schemas(),
        &issuer.cred_defs(),
        None,
        None,
        None,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProofRejected);
}

#[test]
fn revealed_values_compare_without_leading_zeros() {
    setup();
    let issuer = &*GVT;
    let link_secret = Prover::create_link_secret().unwrap();
    let credential = issuer.issue(&link_secret, GVT_VALUES, None, None).unwrap();
    let pres_req = gvt_request();
    let presentation = present_gvt(&pres_req, issuer, &credential, &link_secret).unwrap();
    let verify = |presentation: &Presentation| {
        Verifier::verify_presentation(
            presentation,
            &pres_req,
            &issuer.schemas(),
            &issuer.cred_defs(),
            None,
            None,
            None,
        )
    };

    let mut padded = presentation.clone();
    padded
        .requested_proof
        .revealed_attr_groups
        .get_mut("attr2_referent")
        .unwrap()
        .values
        .get_mut("height")
        .unwrap()
        .encoded = "00175".to_string();
    assert!(verify(&padded).unwrap());

    let mut changed = presentation;
    changed
        .requested_proof
        .revealed_attr_groups
        .get_mut("attr2_referent")
        .unwrap()
        .values
        .get_mut("height")
        .unwrap()
        .encoded = "00176".to_string();
    assert_eq!(verify(&changed).unwrap_err().kind(), ErrorKind::ProofRejected);
}

#[test]
fn missing_schema_is_an_input_error() {
    setup();
    let issuer = &*GVT;
    let link_secret = Prover::create_link_secret().unwrap();
    let credential = issuer.issue(&link_secret, GVT_VALUES, None, None).unwrap();
    let pres_req = gvt_request();
    let presentation = present_gvt(&pres_req, issuer, &credential, &link_secret).unwrap();

    let err = Verifier::verify_presentation(
        &presentation,
        &pres_req,
        &HashMap::new(),
        &issuer.cred_defs(),
        None,
        None,
        None,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn restrictions_across_two_issuers() {
    setup();
    let gvt = IssuerSetup::new("gvt", GVT_ATTRS, false);
    let xyz = IssuerSetup::new("xyz", &["status", "period"], false);
    let link_secret = Prover::create_link_secret().unwrap();
    let gvt_cred = gvt.issue(&link_secret, GVT_VALUES, None, None).unwrap();
    let xyz_cred = xyz
        .issue(&link_secret, &[("status", "partial"), ("period", "8")], None, None)
        .unwrap();

    let pres_req = presentation_request(json!({
        "requested_attributes": {
            "name_referent": {"name": "name", "restrictions": {"cred_def_id": gvt.cred_def_id.to_string()}},
            "status_referent": {"name": "status", "restrictions": [
                {"cred_def_id": "creddef:unknown"},
                {"schema_name": "xyz", "attr::status::value": "partial"}
            ]}
        },
        "requested_predicates": {
            "period_referent": {"name": "period", "p_type": ">", "p_value": 5}
        }
    }));

    let mut present = PresentCredentials::default();
    present
        .add_credential(&gvt_cred, None, None)
        .add_requested_attribute("name_referent", true);
    let mut add = present.add_credential(&xyz_cred, None, None);
    add.add_requested_attribute("status_referent", true);
    add.add_requested_predicate("period_referent");

    let schemas = HashMap::from([
        (gvt.schema_id.clone(), &gvt.schema),
        (xyz.schema_id.clone(), &xyz.schema),
    ]);
    let cred_defs = HashMap::from([
        (gvt.cred_def_id.clone(), &gvt.cred_def),
        (xyz.cred_def_id.clone(), &xyz.cred_def),
    ]);
    let presentation =
        Prover::create_presentation(&pres_req, present, None, &link_secret, &schemas, &cred_defs)
            .unwrap();
    assert_eq!(presentation.identifiers.len(), 2);
    assert_eq!(presentation.requested_proof.revealed_attrs["status_referent"].sub_proof_index, 1);
    assert!(
        Verifier::verify_presentation(&presentation, &pres_req, &schemas, &cred_defs, None, None, None)
            .unwrap()
    );

    // the same proof checked against a stricter request is not satisfied
    let mut stricter = pres_req.clone();
    stricter
        .requested_attributes
        .get_mut("name_referent")
        .unwrap()
        .restrictions = Some(Query::equal("cred_def_id", xyz.cred_def_id.to_string()));
    assert!(
        !Verifier::verify_presentation(&presentation, &stricter, &schemas, &cred_defs, None, None, None)
            .unwrap()
    );
}

#[test]
fn query_operators_in_restrictions() {
    setup();
    let issuer = &*GVT;
    let link_secret = Prover::create_link_secret().unwrap();
    let credential = issuer.issue(&link_secret, GVT_VALUES, None, None).unwrap();

    let pres_req = presentation_request(json!({
        "requested_attributes": {
            "attr1_referent": {"name": "name", "restrictions": {"$and": [
                {"schema_name": {"$in": ["passport", "gvt"]}},
                {"schema_version": {"$neq": "2.0"}},
                {"$not": {"issuer_id": "did:example:other"}}
            ]}}
        },
        "requested_predicates": {
            "predicate1_referent": {"name": "age", "p_type": ">=", "p_value": 18, "restrictions": {"$or": [
                {"cred_def_id": "creddef:unknown"},
                {"attr::age::marker": "1"}
            ]}}
        }
    }));
    let present = |pres_req: &PresentationRequest| {
        let mut present = PresentCredentials::default();
        let mut add = present.add_credential(&credential, None, None);
        add.add_requested_attribute("attr1_referent", true);
        add.add_requested_predicate("predicate1_referent");
        Prover::create_presentation(
            pres_req,
            present,
            None,
            &link_secret,
            &issuer.schemas(),
            &issuer.cred_defs(),
        )
    };
    let presentation = present(&pres_req).unwrap();
    assert!(Verifier::verify_presentation(
        &presentation,
        &pres_req,
        &issuer.schemas(),
        &issuer.cred_defs(),
        None,
        None,
        None
    )
    .unwrap());

    // a negated restriction the credential matches
    for negated in [
        Query::equal("schema_name", "gvt").negate(),
        Query::equal("attr::name::value", "Alex").negate(),
        Query::not_equal("cred_def_id", issuer.cred_def_id.to_string()),
    ] {
        let mut refused = pres_req.clone();
        refused
            .requested_attributes
            .get_mut("attr1_referent")
            .unwrap()
            .restrictions = Some(negated);
        let err = present(&refused).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
        assert!(!Verifier::verify_presentation(
            &presentation,
            &refused,
            &issuer.schemas(),
            &issuer.cred_defs(),
            None,
            None,
            None
        )
        .unwrap());
    }

    let mut refused = pres_req.clone();
    refused
        .requested_predicates
        .get_mut("predicate1_referent")
        .unwrap()
        .restrictions = Some(Query::any_of("schema_name", ["passport", "xyz"]));
    assert_eq!(present(&refused).unwrap_err().kind(), ErrorKind::Input);
}

#[test]
fn builder_refuses_unmet_restrictions_and_unanswered_referents() {
    setup();
    let issuer = &*GVT;
    let link_secret = Prover::create_link_secret().unwrap();
    let credential = issuer.issue(&link_secret, GVT_VALUES, None, None).unwrap();

    let pres_req = presentation_request(json!({
        "requested_attributes": {
            "attr1_referent": {"name": "name", "restrictions": {"schema_name": "passport"}},
            "attr2_referent": {"name": "sex"}
        }
    }));

    let mut present = PresentCredentials::default();
    present
        .add_credential(&credential, None, None)
        .add_requested_attribute("attr1_referent", true);
    let err = Prover::create_presentation(
        &pres_req,
        present,
        Some(HashMap::from([("attr2_referent".to_string(), "male".to_string())])),
        &link_secret,
        &issuer.schemas(),
        &issuer.cred_defs(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);

    let mut present = PresentCredentials::default();
    present
        .add_credential(&credential, None, None)
        .add_requested_attribute("attr2_referent", false);
    let err = Prover::create_presentation(
        &pres_req,
        present,
        None,
        &link_secret,
        &issuer.schemas(),
        &issuer.cred_defs(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);

    // a restricted attribute cannot be self attested
    let err = Prover::create_presentation(
        &pres_req,
        PresentCredentials::default(),
        Some(HashMap::from([
            ("attr1_referent".to_string(), "Alex".to_string()),
            ("attr2_referent".to_string(), "male".to_string()),
        ])),
        &link_secret,
        &issuer.schemas(),
        &issuer.cred_defs(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn credentials_with_different_link_secrets_are_rejected() {
    setup();
    let gvt = IssuerSetup::new("gvt", GVT_ATTRS, false);
    let xyz = IssuerSetup::new("xyz", &["status", "period"], false);
    let link_secret = Prover::create_link_secret().unwrap();
    let other_secret = Prover::create_link_secret().unwrap();
    let gvt_cred = gvt.issue(&link_secret, GVT_VALUES, None, None).unwrap();
    let xyz_cred = xyz
        .issue(&other_secret, &[("status", "partial"), ("period", "8")], None, None)
        .unwrap();

    let pres_req = presentation_request(json!({
        "requested_attributes": {
            "name_referent": {"name": "name"},
            "status_referent": {"name": "status"}
        }
    }));
    let mut present = PresentCredentials::default();
    present
        .add_credential(&gvt_cred, None, None)
        .add_requested_attribute("name_referent", true);
    present
        .add_credential(&xyz_cred, None, None)
        .add_requested_attribute("status_referent", true);
    let schemas = HashMap::from([
        (gvt.schema_id.clone(), &gvt.schema),
        (xyz.schema_id.clone(), &xyz.schema),
    ]);
    let cred_defs = HashMap::from([
        (gvt.cred_def_id.clone(), &gvt.cred_def),
        (xyz.cred_def_id.clone(), &xyz.cred_def),
    ]);
    let presentation =
        Prover::create_presentation(&pres_req, present, None, &link_secret, &schemas, &cred_defs)
            .unwrap();
    let err =
        Verifier::verify_presentation(&presentation, &pres_req, &schemas, &cred_defs, None, None, None)
            .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProofRejected);
}

#[test]
fn objects_read_back_from_json_drive_every_step() {
    setup();
    let issuer = IssuerSetup::new("gvt", GVT_ATTRS, true);
    let registry = RegistrySetup::new(&issuer, 5);
    let list_100 = registry.status_list(&issuer, 100);

    let cred_def: CredentialDefinition = round_trip(&issuer.cred_def);
    assert_eq!(cred_def, issuer.cred_def);
    let cred_def_private: CredentialDefinitionPrivate = round_trip(&issuer.cred_def_private);
    let key_proof: KeyCorrectnessProof = round_trip(&issuer.key_proof);
    assert_eq!(key_proof, issuer.key_proof);
    let reg_def_private: RevocationRegistryDefinitionPrivate =
        round_trip(&registry.rev_reg_private);

    let link_secret = Prover::create_link_secret().unwrap();
    let offer = Issuer::create_credential_offer(
        issuer.schema_id.clone(),
        issuer.cred_def_id.clone(),
        &key_proof,
    )
    .unwrap();
    let offer: CredentialOffer = round_trip(&offer);
    let (request, metadata) = Prover::create_credential_request(
        Some("holder entropy"),
        None,
        &cred_def,
        &link_secret,
        "default",
        &offer,
    )
    .unwrap();
    let request: CredentialRequest = round_trip(&request);
    let metadata: CredentialRequestMetadata = round_trip(&metadata);

    let mut make = MakeCredentialValues::default();
    for (name, raw) in GVT_VALUES {
        make.add_raw(*name, *raw).unwrap();
    }
    let config = CredentialRevocationConfig {
        rev_reg_def_id: &registry.rev_reg_def_id,
        reg_def: &registry.rev_reg_def,
        reg_def_private: &reg_def_private,
        status_list: &list_100,
        registry_idx: 1,
    };
    let mut credential = Issuer::create_credential(
        &cred_def,
        &cred_def_private,
        &offer,
        &request,
        make.into(),
        Some(config),
    )
    .unwrap();
    Prover::process_credential(
        &mut credential,
        &metadata,
        &link_secret,
        &cred_def,
        Some(&registry.rev_reg_def),
    )
    .unwrap();
    let credential: Credential = round_trip(&credential);
    assert_eq!(credential.rev_reg_index(), Some(1));

    let state: RevocationState = round_trip(&registry.state(&list_100, 1, None).unwrap());
    assert!(state.verify(&registry.rev_reg_def));

    let mut pres_req = gvt_request();
    pres_req.non_revoked = Some(NonRevokedInterval::new(Some(0), Some(100)));
    let mut present = PresentCredentials::default();
    let mut add = present.add_credential(&credential, Some(state.timestamp), Some(&state));
    add.add_requested_attribute("attr1_referent", true);
    add.add_requested_attribute("attr2_referent", true);
    add.add_requested_attribute("attr3_referent", false);
    add.add_requested_predicate("predicate1_referent");
    let self_attested = HashMap::from([("attr4_referent".to_string(), "8-800-300".to_string())]);
    let cred_defs = HashMap::from([(issuer.cred_def_id.clone(), &cred_def)]);
    let presentation = Prover::create_presentation(
        &pres_req,
        present,
        Some(self_attested),
        &link_secret,
        &issuer.schemas(),
        &cred_defs,
    )
    .unwrap();
    assert_eq!(presentation.identifiers[0].timestamp, Some(100));
    assert!(Verifier::verify_presentation(
        &presentation,
        &pres_req,
        &issuer.schemas(),
        &cred_defs,
        Some(&registry.rev_reg_defs()),
        Some(vec![&list_100]),
        None,
    )
    .unwrap());

    let revoke = |list: &RevocationStatusList, index: u32, timestamp: u64| {
        Issuer::update_revocation_status_list(
            &registry.rev_reg_def,
            &reg_def_private,
            list,
            None,
            Some(BTreeSet::from([index])),
            Some(timestamp),
        )
        .unwrap()
    };
    let list_110 = revoke(&list_100, 3, 110);
    let list_120 = revoke(&list_110, 4, 120);
    let mut delta: RevocationRegistryDelta = round_trip(
        &RevocationRegistryDelta::from_status_lists(Some(&list_100), &list_110).unwrap(),
    );
    delta
        .merge(&RevocationRegistryDelta::from_status_lists(Some(&list_110), &list_120).unwrap())
        .unwrap();
    assert_eq!(delta.revoked, BTreeSet::from([3, 4]));
    assert_eq!(
        delta,
        RevocationRegistryDelta::from_status_lists(Some(&list_100), &list_120).unwrap()
    );
}
