//! An in-memory identity service.
//!
//! Mirrors the remote's observable rules closely enough to exercise the
//! reconcilers: names are unique per account, deleting a policy that still
//! has attachments or non-default versions conflicts, and missing things are
//! `NoSuchEntity`. It makes no attempt at eventual consistency.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::arn::{CallerIdentity, PolicyArn};
use crate::policy::PolicyDocument;
use crate::principal::{Principal, PrincipalKind};
use crate::service::{IdentityService, PolicyVersion, ServiceError};

/// Account id reported by default.
pub const MEMORY_ACCOUNT: &str = "123456789012";

#[derive(Debug)]
struct StoredPolicy {
    document: PolicyDocument,
    versions: Vec<PolicyVersion>,
}

#[derive(Debug, Default)]
struct State {
    users: HashSet<String>,
    roles: HashSet<String>,
    policies: BTreeMap<PolicyArn, StoredPolicy>,
    attachments: HashSet<(Principal, PolicyArn)>,
    calls: HashMap<&'static str, usize>,
    failures: HashMap<&'static str, ServiceError>,
}

impl State {
    /// Count the call, then return the injected failure for it, if any.
    fn enter(&mut self, op: &'static str) -> Result<(), ServiceError> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.get(op) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn principal_exists(&self, principal: &Principal) -> bool {
        match principal.kind {
            PrincipalKind::User => self.users.contains(&principal.name),
            PrincipalKind::Role => self.roles.contains(&principal.name),
        }
    }

    fn require_principal(&self, principal: &Principal) -> Result<(), ServiceError> {
        if self.principal_exists(principal) {
            Ok(())
        } else {
            Err(ServiceError::NoSuchEntity(format!(
                "The {} with name {} cannot be found.",
                principal.kind, principal.name
            )))
        }
    }

    fn require_policy(&mut self, arn: &PolicyArn) -> Result<&mut StoredPolicy, ServiceError> {
        self.policies
            .get_mut(arn)
            .ok_or_else(|| ServiceError::NoSuchEntity(format!("Policy {arn} does not exist.")))
    }
}

/// A fake [`IdentityService`] backed by a few collections.
#[derive(Debug)]
pub struct MemoryIdentityService {
    identity: CallerIdentity,
    state: Mutex<State>,
}

impl Default for MemoryIdentityService {
    fn default() -> Self {
        Self::new(CallerIdentity::new(MEMORY_ACCOUNT, None))
    }
}

impl MemoryIdentityService {
    /// An empty account.
    pub fn new(identity: CallerIdentity) -> Self {
        Self {
            identity,
            state: Default::default(),
        }
    }

    /// Add a user to the account.
    pub fn with_user<S: Into<String>>(mut self, name: S) -> Self {
        self.state.get_mut().users.insert(name.into());
        self
    }

    /// Add a role to the account.
    pub fn with_role<S: Into<String>>(mut self, name: S) -> Self {
        self.state.get_mut().roles.insert(name.into());
        self
    }

    /// Make every call to `op` (the trait method name) fail with `error`.
    pub async fn fail_on(&self, op: &'static str, error: ServiceError) {
        self.state.lock().await.failures.insert(op, error);
    }

    /// Stop failing calls to `op`.
    pub async fn clear_failure(&self, op: &'static str) {
        self.state.lock().await.failures.remove(op);
    }

    /// How many times `op` has been called.
    pub async fn call_count(&self, op: &str) -> usize {
        self.state.lock().await.calls.get(op).copied().unwrap_or(0)
    }

    /// Whether a policy with that identifier exists.
    pub async fn policy_exists(&self, arn: &PolicyArn) -> bool {
        self.state.lock().await.policies.contains_key(arn)
    }

    /// The stored document of a policy.
    pub async fn policy_document(&self, arn: &PolicyArn) -> Option<PolicyDocument> {
        self.state
            .lock()
            .await
            .policies
            .get(arn)
            .map(|p| p.document.clone())
    }

    /// Whether the pair is attached.
    pub async fn is_attached(&self, principal: &Principal, arn: &PolicyArn) -> bool {
        self.state
            .lock()
            .await
            .attachments
            .contains(&(principal.to_owned(), arn.to_owned()))
    }

    /// Every attached pair, sorted for stable comparisons.
    pub async fn attachments(&self) -> Vec<(String, String)> {
        let mut pairs = self
            .state
            .lock()
            .await
            .attachments
            .iter()
            .map(|(p, a)| (p.to_string(), a.to_string()))
            .collect::<Vec<_>>();
        pairs.sort();
        pairs
    }

    /// Store a new default version of a policy, demoting the current one.
    /// Simulates edits made outside this tool.
    pub async fn push_policy_version(&self, arn: &PolicyArn) -> Result<String, ServiceError> {
        let mut state = self.state.lock().await;
        let policy = state.require_policy(arn)?;
        for v in policy.versions.iter_mut() {
            v.is_default = false;
        }
        let id = format!("v{}", policy.versions.len() + 1);
        policy.versions.push(PolicyVersion::new(id.to_owned(), true));
        Ok(id)
    }
}

#[async_trait]
impl IdentityService for MemoryIdentityService {
    async fn caller_identity(&self) -> Result<CallerIdentity, ServiceError> {
        self.state.lock().await.enter("caller_identity")?;
        Ok(self.identity.clone())
    }

    async fn get_principal(&self, principal: &Principal) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state.enter("get_principal")?;
        state.require_principal(principal)
    }

    async fn list_attached_policies(
        &self,
        principal: &Principal,
    ) -> Result<Vec<PolicyArn>, ServiceError> {
        let mut state = self.state.lock().await;
        state.enter("list_attached_policies")?;
        state.require_principal(principal)?;
        let mut arns = state
            .attachments
            .iter()
            .filter(|(p, _)| p == principal)
            .map(|(_, a)| a.to_owned())
            .collect::<Vec<_>>();
        arns.sort();
        Ok(arns)
    }

    async fn create_policy(
        &self,
        name: &str,
        document: &PolicyDocument,
    ) -> Result<PolicyArn, ServiceError> {
        let mut state = self.state.lock().await;
        state.enter("create_policy")?;
        let arn = self.identity.policy_arn(name);
        if state.policies.contains_key(&arn) {
            return Err(ServiceError::EntityAlreadyExists(format!(
                "A policy called {name} already exists. Duplicate names are not allowed."
            )));
        }
        state.policies.insert(
            arn.to_owned(),
            StoredPolicy {
                document: document.to_owned(),
                versions: vec![PolicyVersion::new("v1", true)],
            },
        );
        Ok(arn)
    }

    async fn attach_policy(
        &self,
        principal: &Principal,
        arn: &PolicyArn,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state.enter("attach_policy")?;
        state.require_principal(principal)?;
        state.require_policy(arn)?;
        state
            .attachments
            .insert((principal.to_owned(), arn.to_owned()));
        Ok(())
    }

    async fn detach_policy(
        &self,
        principal: &Principal,
        arn: &PolicyArn,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state.enter("detach_policy")?;
        state.require_principal(principal)?;
        if state
            .attachments
            .remove(&(principal.to_owned(), arn.to_owned()))
        {
            Ok(())
        } else {
            Err(ServiceError::NoSuchEntity(format!(
                "Policy {arn} was not found."
            )))
        }
    }

    async fn list_policy_versions(
        &self,
        arn: &PolicyArn,
    ) -> Result<Vec<PolicyVersion>, ServiceError> {
        let mut state = self.state.lock().await;
        state.enter("list_policy_versions")?;
        Ok(state.require_policy(arn)?.versions.clone())
    }

    async fn delete_policy_version(
        &self,
        arn: &PolicyArn,
        version_id: &str,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state.enter("delete_policy_version")?;
        let policy = state.require_policy(arn)?;
        let idx = policy
            .versions
            .iter()
            .position(|v| v.version_id == version_id)
            .ok_or_else(|| {
                ServiceError::NoSuchEntity(format!("Policy version {version_id} does not exist."))
            })?;
        if policy.versions[idx].is_default {
            return Err(ServiceError::DeleteConflict(
                "Cannot delete the default version of a policy.".to_owned(),
            ));
        }
        policy.versions.remove(idx);
        Ok(())
    }

    async fn delete_policy(&self, arn: &PolicyArn) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state.enter("delete_policy")?;
        let attached = state.attachments.iter().any(|(_, a)| a == arn);
        let policy = state.require_policy(arn)?;
        if attached {
            return Err(ServiceError::DeleteConflict(
                "Cannot delete a policy attached to entities.".to_owned(),
            ));
        }
        if policy.versions.len() > 1 {
            return Err(ServiceError::DeleteConflict(
                "This policy has more than one version.".to_owned(),
            ));
        }
        state.policies.remove(arn);
        Ok(())
    }
}
