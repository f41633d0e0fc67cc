//! team (group-encrypted) vaults: same storage model as the per-user
//! vault, but each document's content key is wrapped once per member
//! instead of being derived straight from the owner's key

use std::collections::BTreeMap;
use std::sync::Arc;

use gateway_audit::AuditChain;
use gateway_identity::{Certificate, IdentityGate};
use gateway_primitives::hash::hash;
use gateway_primitives::{aead, random_bytes};
use gateway_session::SessionManager;
use gateway_wallet::{Counterparty, ProtocolTag, Wallet};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{Error, Result};
use crate::index::normalize_path;
use crate::storage::StorageAdapter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Owner,
    Admin,
    Member,
}

impl Role {
    fn can_manage_members(self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }
}

#[derive(Clone, Debug)]
pub struct Member {
    pub key: [u8; 32],
    pub role: Role,
    pub cert_serial: String,
}

#[derive(Clone, Debug)]
pub struct Team {
    pub team_id: String,
    pub name: String,
    pub owner_key: [u8; 32],
    pub members: Vec<Member>,
    pub parent_team_id: Option<String>,
}

impl Team {
    pub fn new(team_id: String, name: String, owner_key: [u8; 32], owner_cert_serial: String) -> Self {
        Self {
            team_id,
            name,
            owner_key,
            members: vec![Member { key: owner_key, role: Role::Owner, cert_serial: owner_cert_serial }],
            parent_team_id: None,
        }
    }

    /// a sub-team requires the creator to already be a member of the parent
    pub fn new_sub_team(
        team_id: String,
        name: String,
        owner_key: [u8; 32],
        owner_cert_serial: String,
        parent: &Team,
    ) -> Result<Self> {
        if !parent.members.iter().any(|m| m.key == owner_key) {
            return Err(Error::NotPermitted(hex::encode(owner_key)));
        }
        let mut team = Self::new(team_id, name, owner_key, owner_cert_serial);
        team.parent_team_id = Some(parent.team_id.clone());
        Ok(team)
    }

    fn role_of(&self, key: [u8; 32]) -> Option<Role> {
        self.members.iter().find(|m| m.key == key).map(|m| m.role)
    }

    fn owner_count(&self) -> usize {
        self.members.iter().filter(|m| m.role == Role::Owner).count()
    }
}

#[derive(Clone, Debug)]
pub struct TeamDocument {
    pub path: String,
    pub content_hash: [u8; 32],
    /// wrapped content key, one entry per member who may read
    pub header: BTreeMap<[u8; 32], Vec<u8>>,
    pub storage_ref: String,
    pub created_at: u64,
    pub created_by: [u8; 32],
    pub size: u64,
}

pub struct TeamVault {
    wallet: Arc<Wallet>,
    storage: Arc<dyn StorageAdapter>,
    identity_gate: Arc<IdentityGate>,
    session_manager: Option<Arc<SessionManager>>,
    audit: Option<Arc<AuditChain>>,
    tag: ProtocolTag,
    team: RwLock<Team>,
    documents: RwLock<BTreeMap<String, TeamDocument>>,
}

fn wrap_tag() -> ProtocolTag {
    ProtocolTag::new(gateway_wallet::SecurityLevel::Elevated, "team-vault")
}

impl TeamVault {
    pub fn new(
        wallet: Arc<Wallet>,
        storage: Arc<dyn StorageAdapter>,
        identity_gate: Arc<IdentityGate>,
        session_manager: Option<Arc<SessionManager>>,
        audit: Option<Arc<AuditChain>>,
        team: Team,
    ) -> Self {
        Self {
            wallet,
            storage,
            identity_gate,
            session_manager,
            audit,
            tag: wrap_tag(),
            team: RwLock::new(team),
            documents: RwLock::new(BTreeMap::new()),
        }
    }

    async fn wrap(&self, content_key: &[u8; 32], member_key: [u8; 32]) -> Result<Vec<u8>> {
        let secret = self
            .wallet
            .derive_shared_secret("team-vault", &self.tag, "team-wrap", Some(&Counterparty::Key(member_key)))
            .await?;
        Ok(aead::seal(&secret, content_key)?)
    }

    async fn unwrap(&self, wrapped: &[u8], member_key: [u8; 32]) -> Result<[u8; 32]> {
        let secret = self
            .wallet
            .derive_shared_secret("team-vault", &self.tag, "team-wrap", Some(&Counterparty::Key(member_key)))
            .await?;
        let opened = aead::open(&secret, wrapped)?;
        opened.try_into().map_err(|_| Error::CorruptHeader)
    }

    async fn audit_action(&self, action: &str, user_key: &[u8], input: &[u8], output: &[u8], timestamp: u64) {
        if let Some(audit) = &self.audit {
            let _ = audit
                .create_entry(timestamp, action, user_key, input, output, BTreeMap::new())
                .await;
        }
    }

    pub async fn add_member(
        &self,
        subject_cert: &Certificate,
        role: Role,
        by_whom: [u8; 32],
        now_ms: u64,
    ) -> Result<()> {
        {
            let team = self.team.read().await;
            let by_whom_role = team.role_of(by_whom).ok_or_else(|| Error::NotPermitted(hex::encode(by_whom)))?;
            if !by_whom_role.can_manage_members() {
                return Err(Error::NotPermitted(hex::encode(by_whom)));
            }
        }

        let verified = self.identity_gate.verify(subject_cert, now_ms).await?;
        if !verified.verified {
            return Err(Error::NotPermitted(hex::encode(subject_cert.subject)));
        }

        let mut team = self.team.write().await;
        team.members.retain(|m| m.key != subject_cert.subject);
        team.members.push(Member { key: subject_cert.subject, role, cert_serial: subject_cert.serial.clone() });
        let team_id = team.team_id.clone();
        drop(team);

        self.audit_action("team.add_member", &by_whom, subject_cert.subject.as_slice(), &[], now_ms).await;
        info!(team_id, member = %hex::encode(subject_cert.subject), "team member added");
        Ok(())
    }

    /// atomic: removes the member, enforces at least one remaining owner,
    /// and re-keys every document so the removed member's wrapped entry is
    /// dropped. re-keying every document (rather than only the ones
    /// `byWhom` still needs to read) is a deliberate simplification: the
    /// wallet derives wrap secrets for any counterparty key without needing
    /// that member online, so eager rotation costs nothing extra here.
    pub async fn remove_member(&self, member_key: [u8; 32], by_whom: [u8; 32], now_ms: u64) -> Result<()> {
        {
            let team = self.team.read().await;
            let by_whom_role = team.role_of(by_whom).ok_or_else(|| Error::NotPermitted(hex::encode(by_whom)))?;
            if !by_whom_role.can_manage_members() {
                return Err(Error::NotPermitted(hex::encode(by_whom)));
            }
            if !team.members.iter().any(|m| m.key == member_key) {
                return Err(Error::UnknownMember(hex::encode(member_key)));
            }
        }

        let mut team = self.team.write().await;
        let removed_role = team.role_of(member_key);
        if removed_role == Some(Role::Owner) && team.owner_count() <= 1 {
            return Err(Error::LastOwner(team.team_id.clone()));
        }
        team.members.retain(|m| m.key != member_key);
        let remaining: Vec<[u8; 32]> = team.members.iter().map(|m| m.key).collect();
        let team_id = team.team_id.clone();
        drop(team);

        let mut documents = self.documents.write().await;
        for document in documents.values_mut() {
            if !document.header.contains_key(&member_key) {
                continue;
            }
            let content_key = self.rewrap_excluding(document, member_key).await?;
            let mut new_header = BTreeMap::new();
            for key in &remaining {
                new_header.insert(*key, self.wrap(&content_key, *key).await?);
            }
            document.header = new_header;
        }
        drop(documents);

        if let Some(session_manager) = &self.session_manager {
            session_manager.invalidate_all_for_user(member_key).await;
        }

        self.audit_action("team.remove_member", &by_whom, member_key.as_slice(), &[], now_ms).await;
        info!(team_id, member = %hex::encode(member_key), "team member removed");
        Ok(())
    }

    /// recover a document's content key via any member whose wrap entry is
    /// still present besides the one being removed
    async fn rewrap_excluding(&self, document: &TeamDocument, excluded: [u8; 32]) -> Result<[u8; 32]> {
        let (reader, wrapped) = document
            .header
            .iter()
            .find(|(key, _)| **key != excluded)
            .ok_or_else(|| Error::UnknownMember("no remaining reader".into()))?;
        self.unwrap(wrapped, *reader).await
    }

    /// a revoked certificate is treated as an immediate member removal,
    /// and any session tied to that identity is invalidated
    pub async fn revoke_certificate(&self, serial: &str, by_whom: [u8; 32], now_ms: u64) -> Result<()> {
        let member_key = {
            let team = self.team.read().await;
            team.members
                .iter()
                .find(|m| m.cert_serial == serial)
                .map(|m| m.key)
                .ok_or_else(|| Error::UnknownMember(serial.to_string()))?
        };
        self.remove_member(member_key, by_whom, now_ms).await
    }

    pub async fn upload_document(
        &self,
        path: &str,
        content: &[u8],
        created_by: [u8; 32],
        now_ms: u64,
    ) -> Result<TeamDocument> {
        let normalized = normalize_path(path)?;
        let members: Vec<[u8; 32]> = self.team.read().await.members.iter().map(|m| m.key).collect();

        let content_key: [u8; 32] = random_bytes();
        let ciphertext = aead::seal(&content_key, content)?;
        let storage_ref = self.storage.upload(&ciphertext, BTreeMap::new()).await?;

        let mut header = BTreeMap::new();
        for member_key in &members {
            header.insert(*member_key, self.wrap(&content_key, *member_key).await?);
        }

        let document = TeamDocument {
            path: normalized.clone(),
            content_hash: hash(content),
            header,
            storage_ref,
            created_at: now_ms,
            created_by,
            size: content.len() as u64,
        };

        self.documents.write().await.insert(normalized.clone(), document.clone());
        self.audit_action("team.document_write", &created_by, &document.content_hash, &[], now_ms).await;
        Ok(document)
    }

    pub async fn read_document(&self, path: &str, reader: [u8; 32], now_ms: u64) -> Result<Vec<u8>> {
        let normalized = normalize_path(path)?;
        if self.team.read().await.role_of(reader).is_none() {
            return Err(Error::NotPermitted(hex::encode(reader)));
        }

        let document = self
            .documents
            .read()
            .await
            .get(&normalized)
            .cloned()
            .ok_or_else(|| Error::NotFound(normalized.clone()))?;

        let wrapped = document.header.get(&reader).ok_or_else(|| Error::NotPermitted(hex::encode(reader)))?;
        let content_key = self.unwrap(wrapped, reader).await?;

        let (ciphertext, _) = self
            .storage
            .download(&document.storage_ref)
            .await?
            .ok_or_else(|| Error::NotFound(document.storage_ref.clone()))?;

        let plaintext = aead::open(&content_key, &ciphertext)?;
        self.audit_action("team.document_read", &reader, &document.content_hash, &[], now_ms).await;
        Ok(plaintext)
    }

    pub async fn member_role(&self, key: [u8; 32]) -> Option<Role> {
        self.team.read().await.role_of(key)
    }
}
