use anoncreds_engine::prelude::*;
use serde_json::json;

mod util;

use util::{presentation_request, setup, IssuerSetup};

fn predicate_request(p_type: &str, p_value: i32) -> PresentationRequest {
    presentation_request(json!({
        "requested_predicates": {
            "age_referent": {"name": "age", "p_type": p_type, "p_value": p_value}
        }
    }))
}

fn prove(
    issuer: &IssuerSetup,
    credential: &Credential,
    link_secret: &LinkSecret,
    pres_req: &PresentationRequest,
) -> AnonCredsResult<Presentation> {
    let mut present = PresentCredentials::default();
    present
        .add_credential(credential, None, None)
        .add_requested_predicate("age_referent");
    Prover::create_presentation(
        pres_req,
        present,
        None,
        link_secret,
        &issuer.schemas(),
        &issuer.cred_defs(),
    )
}

fn holder_aged(age: &str) -> (IssuerSetup, LinkSecret, Credential) {
    let issuer = IssuerSetup::new("gvt", &["name", "age"], false);
    let link_secret = Prover::create_link_secret().unwrap();
    let credential = issuer
        .issue(&link_secret, &[("name", "Alex"), ("age", age)], None, None)
        .unwrap();
    (issuer, link_secret, credential)
}

#[test]
fn satisfied_predicates_verify() {
    setup();
    let (issuer, link_secret, credential) = holder_aged("28");
    for (p_type, p_value) in [(">=", 18), (">=", 28), (">", 27), ("<=", 28), ("<", 65)] {
        let pres_req = predicate_request(p_type, p_value);
        let presentation = prove(&issuer, &credential, &link_secret, &pres_req).unwrap();
        let proof = &presentation.proof.proofs[0];
        assert!(proof.revealed_attrs.is_empty());
        assert_eq!(proof.predicates.len(), 1);
        assert_eq!(proof.predicates[0].attr_name, "age");
        assert!(
            Verifier::verify_presentation(
                &presentation,
                &pres_req,
                &issuer.schemas(),
                &issuer.cred_defs(),
                None,
                None,
                None,
            )
            .unwrap(),
            "{} {}",
            p_type,
            p_value
        );
    }
}

#[test]
fn underage_holder_cannot_prove() {
    setup();
    let (issuer, link_secret, credential) = holder_aged("17");
    let pres_req = predicate_request(">=", 18);
    let err = prove(&issuer, &credential, &link_secret, &pres_req).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProofRejected);

    let pres_req = predicate_request(">", 17);
    let err = prove(&issuer, &credential, &link_secret, &pres_req).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProofRejected);
}

#[test]
fn negative_values_and_thresholds() {
    setup();
    let (issuer, link_secret, credential) = holder_aged("-5");
    let pres_req = predicate_request(">=", -10);
    let presentation = prove(&issuer, &credential, &link_secret, &pres_req).unwrap();
    assert!(Verifier::verify_presentation(
        &presentation,
        &pres_req,
        &issuer.schemas(),
        &issuer.cred_defs(),
        None,
        None,
        None,
    )
    .unwrap());

    let err = prove(&issuer, &credential, &link_secret, &predicate_request("<", -5)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProofRejected);
}

#[test]
fn non_integer_attribute_is_an_input_error() {
    setup();
    let (issuer, link_secret, credential) = holder_aged("twenty");
    let err = prove(&issuer, &credential, &link_secret, &predicate_request(">=", 18)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn proof_for_another_threshold_is_not_satisfied() {
    setup();
    let (issuer, link_secret, credential) = holder_aged("28");
    let pres_req = predicate_request(">=", 18);
    let presentation = prove(&issuer, &credential, &link_secret, &pres_req).unwrap();

    let mut stricter = pres_req.clone();
    stricter
        .requested_predicates
        .get_mut("age_referent")
        .unwrap()
        .p_value = 30;
    assert!(!Verifier::verify_presentation(
        &presentation,
        &stricter,
        &issuer.schemas(),
        &issuer.cred_defs(),
        None,
        None,
        None,
    )
    .unwrap());
}

#[test]
fn forged_threshold_is_rejected() {
    setup();
    let (issuer, link_secret, credential) = holder_aged("28");
    let pres_req = predicate_request(">=", 18);
    let mut presentation = prove(&issuer, &credential, &link_secret, &pres_req).unwrap();

    // claim the proof was for a higher bound than it was made for
    presentation.proof.proofs[0].predicates[0].p_value = 30;
    let mut forged_req = pres_req.clone();
    forged_req
        .requested_predicates
        .get_mut("age_referent")
        .unwrap()
        .p_value = 30;
    let err = Verifier::verify_presentation(
        &presentation,
        &forged_req,
        &issuer.schemas(),
        &issuer.cred_defs(),
        None,
        None,
        None,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProofRejected);
}
