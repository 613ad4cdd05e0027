#![allow(dead_code)]

use anoncreds_engine::prelude::*;
use std::collections::HashMap;
use tempfile::TempDir;

pub const ISSUER_ID: &str = "did:example:issuer";

pub fn setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A schema and credential definition owned by one issuer
pub struct IssuerSetup {
    pub issuer_id: IssuerId,
    pub schema_id: SchemaId,
    pub schema: Schema,
    pub cred_def_id: CredentialDefinitionId,
    pub cred_def: CredentialDefinition,
    pub cred_def_private: CredentialDefinitionPrivate,
    pub key_proof: KeyCorrectnessProof,
}

impl IssuerSetup {
    pub fn new(name: &str, attrs: &[&str], support_revocation: bool) -> Self {
        let issuer_id = IssuerId::new(ISSUER_ID).unwrap();
        let schema =
            Issuer::create_schema(issuer_id.clone(), name, "1.0", attrs.iter().copied()).unwrap();
        let schema_id = SchemaId::new(format!("schema:{}:1.0", name)).unwrap();
        let cred_def_id = CredentialDefinitionId::new(format!("creddef:{}", name)).unwrap();
        let (cred_def, cred_def_private, key_proof) = Issuer::create_credential_definition(
            schema_id.clone(),
            &schema,
            issuer_id.clone(),
            "default",
            SignatureType::PS,
            CredentialDefinitionConfig::new(support_revocation),
        )
        .unwrap();
        Self {
            issuer_id,
            schema_id,
            schema,
            cred_def_id,
            cred_def,
            cred_def_private,
            key_proof,
        }
    }

    /// Run offer, request, issue and process for `values`
    pub fn issue(
        &self,
        link_secret: &LinkSecret,
        values: &[(&str, &str)],
        revocation: Option<CredentialRevocationConfig<'_>>,
        rev_reg_def: Option<&RevocationRegistryDefinition>,
    ) -> AnonCredsResult<Credential> {
        let offer = Issuer::create_credential_offer(
            self.schema_id.clone(),
            self.cred_def_id.clone(),
            &self.key_proof,
        )?;
        let (request, metadata) = Prover::create_credential_request(
            Some("holder entropy"),
            None,
            &self.cred_def,
            link_secret,
            "default",
            &offer,
        )?;
        let mut make = MakeCredentialValues::default();
        for (name, raw) in values {
            make.add_raw(*name, *raw)?;
        }
        let mut credential = Issuer::create_credential(
            &self.cred_def,
            &self.cred_def_private,
            &offer,
            &request,
            make.into(),
            revocation,
        )?;
        Prover::process_credential(
            &mut credential,
            &metadata,
            link_secret,
            &self.cred_def,
            rev_reg_def,
        )?;
        Ok(credential)
    }

    pub fn schemas(&self) -> HashMap<SchemaId, &Schema> {
        HashMap::from([(self.schema_id.clone(), &self.schema)])
    }

    pub fn cred_defs(&self) -> HashMap<CredentialDefinitionId, &CredentialDefinition> {
        HashMap::from([(self.cred_def_id.clone(), &self.cred_def)])
    }
}

/// A revocation registry with its tails in a temporary directory
pub struct RegistrySetup {
    pub rev_reg_def_id: RevocationRegistryDefinitionId,
    pub rev_reg_def: RevocationRegistryDefinition,
    pub rev_reg_private: RevocationRegistryDefinitionPrivate,
    pub tails_dir: TempDir,
}

impl RegistrySetup {
    pub fn new(issuer: &IssuerSetup, max_cred_num: u32) -> Self {
        let tails_dir = tempfile::tempdir().unwrap();
        let mut writer = TailsFileWriter::new(Some(tails_dir.path().to_path_buf()));
        let (rev_reg_def, rev_reg_private) = Issuer::create_revocation_registry_def(
            &issuer.cred_def,
            issuer.cred_def_id.clone(),
            issuer.issuer_id.clone(),
            "default",
            RegistryType::VB20_ACCUM,
            max_cred_num,
            &mut writer,
        )
        .unwrap();
        Self {
            rev_reg_def_id: RevocationRegistryDefinitionId::new(format!(
                "revreg:{}",
                issuer.cred_def_id
            ))
            .unwrap(),
            rev_reg_def,
            rev_reg_private,
            tails_dir,
        }
    }

    pub fn status_list(&self, issuer: &IssuerSetup, timestamp: u64) -> RevocationStatusList {
        Issuer::create_revocation_status_list(
            self.rev_reg_def_id.clone(),
            &self.rev_reg_def,
            &self.rev_reg_private,
            issuer.issuer_id.clone(),
            true,
            Some(timestamp),
        )
        .unwrap()
    }

    pub fn config<'a>(
        &'a self,
        status_list: &'a RevocationStatusList,
        registry_idx: u32,
    ) -> CredentialRevocationConfig<'a> {
        CredentialRevocationConfig {
            rev_reg_def_id: &self.rev_reg_def_id,
            reg_def: &self.rev_reg_def,
            reg_def_private: &self.rev_reg_private,
            status_list,
            registry_idx,
        }
    }

    pub fn state(
        &self,
        list: &RevocationStatusList,
        index: u32,
        prev: Option<(&RevocationState, &RevocationStatusList)>,
    ) -> AnonCredsResult<RevocationState> {
        Prover::create_or_update_revocation_state(
            &self.rev_reg_def.value.tails_location,
            &self.rev_reg_def,
            list,
            index,
            prev.map(|(s, _)| s),
            prev.map(|(_, l)| l),
        )
    }

    pub fn rev_reg_defs(&self) -> HashMap<RevocationRegistryDefinitionId, &RevocationRegistryDefinition> {
        HashMap::from([(self.rev_reg_def_id.clone(), &self.rev_reg_def)])
    }
}

/// A request with a fresh nonce from the JSON body of the other fields
pub fn presentation_request(mut body: serde_json::Value) -> PresentationRequest {
    body["nonce"] = serde_json::Value::String(Verifier::generate_nonce().as_str().to_owned());
    body["name"] = "proof request".into();
    body["version"] = "1.0".into();
    serde_json::from_value(body).unwrap()
}
