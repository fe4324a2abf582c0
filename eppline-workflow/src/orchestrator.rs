//! Runs a chain's steps strictly in order.
//!
//! The first failing step stops the chain. Registry objects created by
//! earlier steps are left in place: there is no compensation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use eppline_core::{Caller, CanonicalDomain, DomainContact, Fault, LocalStateSync, ProviderId};

use crate::chain::{Chain, ChainContext, RoleContact, Step};
use crate::error::ChainError;
use crate::gateway::RegistryGateway;
use crate::resolver::ContactResolver;

pub struct Orchestrator {
    gateway: Arc<RegistryGateway>,
    resolver: Arc<ContactResolver>,
    local: Arc<dyn LocalStateSync>,
}

impl Orchestrator {
    pub fn new(
        gateway: Arc<RegistryGateway>,
        resolver: Arc<ContactResolver>,
        local: Arc<dyn LocalStateSync>,
    ) -> Self {
        Self {
            gateway,
            resolver,
            local,
        }
    }

    pub fn gateway(&self) -> &RegistryGateway {
        &self.gateway
    }

    /// Execute `chain` and return the final context.
    pub async fn execute(&self, chain: Chain) -> Result<ChainContext, ChainError> {
        let Chain {
            id,
            kind,
            steps,
            mut context,
        } = chain;
        info!(chain = %kind, chain_id = %id, subject = %context.subject, steps = steps.len(), "chain started");

        for (index, step) in steps.into_iter().enumerate() {
            let name = step.name();
            debug!(chain = %kind, chain_id = %id, step = name, index, "step started");
            context = match self.run_step(step, context).await {
                Ok(next) => next,
                Err(fault) => {
                    warn!(
                        chain = %kind,
                        chain_id = %id,
                        step = name,
                        kind = %fault.kind(),
                        error = %fault,
                        "chain stopped"
                    );
                    if index > 0 {
                        warn!(
                            chain = %kind,
                            chain_id = %id,
                            completed = index,
                            "earlier registry side effects are not rolled back"
                        );
                    }
                    return Err(ChainError::new(kind, name, fault));
                }
            };
        }

        info!(chain = %kind, chain_id = %id, subject = %context.subject, "chain completed");
        Ok(context)
    }

    /// Query a domain at its registry on behalf of `caller`.
    ///
    /// Admins and the owner of the local row get the privileged view, and
    /// their reads refresh that row. Anyone else gets the public view and
    /// local state is left alone.
    pub async fn info_domain(&self, name: &str, caller: &Caller) -> Result<CanonicalDomain, Fault> {
        let (_, zone, fqdn) = self.gateway.locate(name)?;
        let row = self
            .local
            .find_domain(&fqdn, &zone)
            .await?
            .filter(|row| caller.may_act_for(row.owner));
        let privileged = caller.admin || row.is_some();

        let mut domain = self.gateway.info_domain(&fqdn, privileged).await?;
        domain.zone = zone;
        if let Some(row) = row {
            self.local.synchronise_domain(&domain, row.id).await?;
            info!(domain = %domain.name, local_id = %row.id, "refreshed local domain from registry");
        }
        Ok(domain)
    }

    async fn run_step(&self, step: Step, mut ctx: ChainContext) -> Result<ChainContext, Fault> {
        match step {
            Step::EnsureRegistrant { person, force } => {
                let provider = self.target_registry(&mut ctx)?;
                let contact = self
                    .resolver
                    .resolve_or_create(&provider, person, &ctx.caller, force)
                    .await?;
                ctx.registrant = Some(contact);
            }
            Step::EnsureContact {
                role,
                person,
                force,
            } => {
                let provider = self.target_registry(&mut ctx)?;
                let contact = self
                    .resolver
                    .resolve_or_create(&provider, person, &ctx.caller, force)
                    .await?;
                ctx.contacts.push(RoleContact { role, contact });
            }
            Step::CreateDomain(spec) => {
                let registrant = ctx
                    .registrant
                    .as_ref()
                    .map(|c| c.handle.clone())
                    .ok_or_else(|| Fault::Internal("create-domain without a registrant".into()))?;
                let contacts: Vec<DomainContact> = ctx
                    .contacts
                    .iter()
                    .map(|c| DomainContact {
                        role: c.role,
                        handle: c.contact.handle.clone(),
                    })
                    .collect();
                let domain = self
                    .gateway
                    .create_domain(&spec, &registrant, &contacts)
                    .await?;
                ctx.registry = Some(domain.registry.clone());
                ctx.domain = Some(domain);
            }
            Step::CreateHost(spec) => {
                let host = self.gateway.create_host(&spec).await?;
                ctx.registry = Some(host.registry.clone());
                ctx.host = Some(host);
            }
            Step::CheckDomains { provider, names } => {
                ctx.availability = self.gateway.check_domains(&provider, &names).await?;
            }
            Step::PersistLocalState => {
                let id = if let Some(domain) = &ctx.domain {
                    let owner = ctx
                        .registrant
                        .as_ref()
                        .and_then(|r| r.owner)
                        .unwrap_or(ctx.caller.account);
                    self.local.persist_domain_creation(domain, owner).await?
                } else if let Some(host) = &ctx.host {
                    self.local.persist_host_creation(host).await?
                } else {
                    return Err(Fault::Internal("nothing to persist".into()));
                };
                ctx.local_id = Some(id);
            }
        }
        Ok(ctx)
    }

    /// Registry serving the chain's subject, resolved once and remembered.
    fn target_registry(&self, ctx: &mut ChainContext) -> Result<ProviderId, Fault> {
        if let Some(provider) = &ctx.registry {
            return Ok(provider.clone());
        }
        let (profile, _, _) = self.gateway.locate(&ctx.subject)?;
        ctx.registry = Some(profile.id.clone());
        Ok(profile.id.clone())
    }
}
