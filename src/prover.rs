use crate::cred_def::CredentialDefinition;
use crate::credential::{
    Credential, CredentialOffer, CredentialRequest, CredentialRequestMetadata, CredentialSignature,
};
use crate::error::Error;
use crate::identifiers::{CredentialDefinitionId, SchemaId};
use crate::knox::ps;
use crate::link_secret::LinkSecret;
use crate::presentation::{PresentCredentials, Presentation};
use crate::presentation_request::PresentationRequest;
use crate::revocation_registry::{
    RevocationRegistryDefinition, RevocationState, RevocationStatusList, TailsFileReader,
};
use crate::schema::Schema;
use crate::AnonCredsResult;
use log::debug;
use rand_core::OsRng;
use std::collections::HashMap;
use std::path::Path;

/// Holder operations
pub struct Prover;

impl Prover {
    /// Create a new link secret
    pub fn create_link_secret() -> AnonCredsResult<LinkSecret> {
        debug!("create_link_secret");
        Ok(LinkSecret::new())
    }

    /// Blind the link secret for the issuer of `offer`. Exactly one of
    /// `entropy` and `prover_did` identifies the request
    pub fn create_credential_request(
        entropy: Option<&str>,
        prover_did: Option<&str>,
        cred_def: &CredentialDefinition,
        link_secret: &LinkSecret,
        link_secret_id: &str,
        offer: &CredentialOffer,
    ) -> AnonCredsResult<(CredentialRequest, CredentialRequestMetadata)> {
        debug!(
            "create_credential_request: cred_def_id = {}, link_secret_id = {}",
            offer.cred_def_id, link_secret_id
        );
        cred_def.validate()?;
        if cred_def.schema_id != offer.schema_id {
            return Err(Error::input(
                "credential offer is for a different schema than the credential definition",
            ));
        }
        offer
            .key_correctness_proof
            .verify(&cred_def.value.primary)?;

        let (blinded_ms, blinding) = ps::Prover::new_blind_signature_context(
            &[(CredentialDefinition::LINK_SECRET_INDEX, link_secret.0)],
            &cred_def.value.primary,
            offer.nonce.as_scalar(),
            OsRng,
        )?;
        let request = CredentialRequest {
            entropy: entropy.map(str::to_string),
            prover_did: prover_did.map(str::to_string),
            cred_def_id: offer.cred_def_id.clone(),
            blinded_ms,
            nonce: offer.nonce.clone(),
        };
        request.validate()?;
        let metadata = CredentialRequestMetadata {
            link_secret_blinding_data: blinding,
            nonce: offer.nonce.clone(),
            link_secret_name: link_secret_id.to_string(),
        };
        Ok((request, metadata))
    }

    /// Remove the request blinding from an issued credential and check the
    /// signature and any revocation witness
    pub fn process_credential(
        credential: &mut Credential,
        metadata: &CredentialRequestMetadata,
        link_secret: &LinkSecret,
        cred_def: &CredentialDefinition,
        rev_reg_def: Option<&RevocationRegistryDefinition>,
    ) -> AnonCredsResult<()> {
        debug!(
            "process_credential: cred_def_id = {}, rev_reg_id = {:?}",
            credential.cred_def_id, credential.rev_reg_id
        );
        credential.validate()?;
        let signature = match credential.signature {
            CredentialSignature::Blinded(s) => s.to_unblinded(metadata.link_secret_blinding_data),
            CredentialSignature::Unblinded(_) => {
                return Err(Error::input("credential is already processed"))
            }
        };
        let messages = credential.messages(cred_def, link_secret.0)?;
        if signature.verify(&cred_def.value.primary, &messages).unwrap_u8() != 1 {
            return Err(Error::unexpected("credential signature is invalid"));
        }

        if let Some(info) = &credential.rev_reg {
            let def = rev_reg_def.ok_or_else(|| {
                Error::input("a revocable credential needs its registry definition")
            })?;
            if def.value.public_keys.accum_key != info.accum_key {
                return Err(Error::input(
                    "credential was issued from another revocation registry",
                ));
            }
            if !info
                .witness
                .verify(info.element(), info.accum_key, info.accumulator)
            {
                return Err(Error::unexpected("credential revocation witness is invalid"));
            }
        }
        credential.signature = CredentialSignature::Unblinded(signature);
        Ok(())
    }

    /// Compute the witness of `rev_reg_idx` against `rev_status_list`, reading
    /// the tails from `tails_path` when it cannot be advanced from `rev_state`
    pub fn create_or_update_revocation_state<P: AsRef<Path>>(
        tails_path: P,
        rev_reg_def: &RevocationRegistryDefinition,
        rev_status_list: &RevocationStatusList,
        rev_reg_idx: u32,
        rev_state: Option<&RevocationState>,
        old_rev_status_list: Option<&RevocationStatusList>,
    ) -> AnonCredsResult<RevocationState> {
        debug!(
            "create_or_update_revocation_state: tails_path = {}, index = {}, timestamp = {}, incremental = {}",
            tails_path.as_ref().display(),
            rev_reg_idx,
            rev_status_list.timestamp(),
            rev_state.is_some()
        );
        let mut reader = TailsFileReader::new(tails_path);
        RevocationState::create_or_update(
            rev_reg_def,
            rev_status_list,
            rev_reg_idx,
            &mut reader,
            rev_state,
            old_rev_status_list,
        )
    }

    /// Prove the credentials in `credentials` satisfy `pres_req`
    pub fn create_presentation(
        pres_req: &PresentationRequest,
        credentials: PresentCredentials<'_>,
        self_attested: Option<HashMap<String, String>>,
        link_secret: &LinkSecret,
        schemas: &HashMap<SchemaId, &Schema>,
        cred_defs: &HashMap<CredentialDefinitionId, &CredentialDefinition>,
    ) -> AnonCredsResult<Presentation> {
        debug!(
            "create_presentation: request = {}, credentials = {}, self_attested = {}",
            pres_req.name,
            credentials.len(),
            self_attested.as_ref().map_or(0, HashMap::len)
        );
        Presentation::create(
            pres_req,
            credentials,
            self_attested.unwrap_or_default(),
            link_secret,
            schemas,
            cred_defs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cred_def::{CredentialDefinitionConfig, SignatureType};
    use crate::credential::MakeCredentialValues;
    use crate::error::ErrorKind;
    use crate::identifiers::IssuerId;
    use crate::issuer::Issuer;

    fn setup() -> (
        CredentialDefinition,
        crate::cred_def::CredentialDefinitionPrivate,
        CredentialOffer,
    ) {
        let issuer_id = IssuerId::new("did:example:issuer").unwrap();
        let schema = Schema::new(issuer_id.clone(), "gvt", "1.0", ["name", "age"]).unwrap();
        let schema_id = SchemaId::new("schema:gvt").unwrap();
        let (cred_def, private, proof) = Issuer::create_credential_definition(
            schema_id.clone(),
            &schema,
            issuer_id,
            "default",
            SignatureType::PS,
            CredentialDefinitionConfig::new(false),
        )
        .unwrap();
        let offer = Issuer::create_credential_offer(
            schema_id,
            CredentialDefinitionId::new("creddef:gvt").unwrap(),
            &proof,
        )
        .unwrap();
        (cred_def, private, offer)
    }

    #[test]
    fn request_identity_is_exclusive() {
        let (cred_def, _, offer) = setup();
        let ls = Prover::create_link_secret().unwrap();
        let both = Prover::create_credential_request(
            Some("entropy"),
            Some("did:sov:prover"),
            &cred_def,
            &ls,
            "default",
            &offer,
        );
        assert_eq!(both.unwrap_err().kind(), ErrorKind::Input);
        let neither =
            Prover::create_credential_request(None, None, &cred_def, &ls, "default", &offer);
        assert_eq!(neither.unwrap_err().kind(), ErrorKind::Input);
        let (request, metadata) = Prover::create_credential_request(
            None,
            Some("did:sov:prover"),
            &cred_def,
            &ls,
            "default",
            &offer,
        )
        .unwrap();
        assert_eq!(request.nonce, offer.nonce);
        assert_eq!(metadata.link_secret_name, "default");
    }

    #[test]
    fn process_and_reject_wrong_link_secret() {
        let (cred_def, private, offer) = setup();
        let ls = Prover::create_link_secret().unwrap();
        let (request, metadata) = Prover::create_credential_request(
            Some("entropy"),
            None,
            &cred_def,
            &ls,
            "default",
            &offer,
        )
        .unwrap();
        let mut values = MakeCredentialValues::default();
        values.add_raw("name", "Alex").unwrap();
        values.add_raw("age", "28").unwrap();
        let issued = Issuer::create_credential(
            &cred_def,
            &private,
            &offer,
            &request,
            values.into(),
            None,
        )
        .unwrap();

        let mut wrong = issued.clone();
        let other = LinkSecret::new();
        let err =
            Prover::process_credential(&mut wrong, &metadata, &other, &cred_def, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert_eq!(wrong, issued);

        let mut cred = issued;
        Prover::process_credential(&mut cred, &metadata, &ls, &cred_def, None).unwrap();
        let messages = cred.messages(&cred_def, ls.0).unwrap();
        let signature = cred.unblinded_signature().unwrap();
        assert_eq!(
            signature.verify(&cred_def.value.primary, &messages).unwrap_u8(),
            1
        );
        assert_eq!(
            Prover::process_credential(&mut cred, &metadata, &ls, &cred_def, None)
                .unwrap_err()
                .kind(),
            ErrorKind::Input
        );
    }

    #[test]
    fn tampered_key_correctness_proof() {
        let (cred_def, _, offer) = setup();
        let (other_def, _, _) = setup();
        let ls = LinkSecret::new();
        let err = Prover::create_credential_request(
            Some("entropy"),
            None,
            &other_def,
            &ls,
            "default",
            &offer,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
        assert!(Prover::create_credential_request(
            Some("entropy"),
            None,
            &cred_def,
            &ls,
            "default",
            &offer
        )
        .is_ok());
    }
}
