use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::draft::{DraftQuote, StepUpdate};
use crate::domain::finalize::{Margin, OptionId};
use crate::errors::{ApplicationError, DomainError};
use crate::options::{create_option, finalize, select_option, OptionRequest};
use crate::pricing::{DraftPricer, PriceBreakdown, PricingInput};
use crate::store::DraftStore;

/// Wizard-facing entry point. Every draft change made through a session is
/// logged and sent to the audit sink.
pub struct DraftSession<P, S, A> {
    pricer: P,
    store: S,
    audit_sink: A,
    currency: String,
}

impl<P, S, A> DraftSession<P, S, A>
where
    P: DraftPricer,
    S: DraftStore,
    A: AuditSink,
{
    pub fn new(pricer: P, store: S, audit_sink: A, currency: impl Into<String>) -> Self {
        Self { pricer, store, audit_sink, currency: currency.into() }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn update(
        &self,
        draft: &DraftQuote,
        update: StepUpdate,
        audit: &AuditContext,
    ) -> DraftQuote {
        let step = update.step_number();
        let next = draft.apply(update);
        info!(
            event_name = "wizard.step_updated",
            correlation_id = %audit.correlation_id,
            request_id = %draft.request_id.0,
            step,
            total_teu = %next.total_teu,
            "draft step updated"
        );
        self.audit_sink.emit(
            success(audit, "wizard.step_updated", AuditCategory::Wizard)
                .with_metadata("step", step.to_string()),
        );
        next
    }

    pub fn price(
        &self,
        draft: &DraftQuote,
        margin: Margin,
        container_quantities: BTreeMap<String, u32>,
    ) -> PriceBreakdown {
        self.pricer.price(
            &PricingInput::new(draft, margin, &self.currency).with_quantities(container_quantities),
        )
    }

    pub fn create_option(
        &self,
        draft: &DraftQuote,
        request: OptionRequest,
        audit: &AuditContext,
    ) -> Result<(DraftQuote, OptionId), DomainError> {
        let name = request.name.clone();
        let result = create_option(draft, &self.pricer, &self.currency, request);
        match &result {
            Ok((_, option_id)) => {
                info!(
                    event_name = "option.created",
                    correlation_id = %audit.correlation_id,
                    request_id = %draft.request_id.0,
                    option_id = %option_id,
                    "quote option created"
                );
                self.audit_sink.emit(
                    success(audit, "option.created", AuditCategory::Option)
                        .with_metadata("option_id", option_id.to_string())
                        .with_metadata("name", name),
                );
            }
            Err(error) => self.rejected(audit, "option.rejected", AuditCategory::Option, error),
        }
        result
    }

    pub fn select_option(
        &self,
        draft: &DraftQuote,
        option_id: &OptionId,
        audit: &AuditContext,
    ) -> Result<DraftQuote, DomainError> {
        let result = select_option(draft, option_id);
        match &result {
            Ok(_) => self.audit_sink.emit(
                success(audit, "option.selected", AuditCategory::Option)
                    .with_metadata("option_id", option_id.to_string()),
            ),
            Err(error) => self.rejected(audit, "option.rejected", AuditCategory::Option, error),
        }
        result
    }

    pub fn finalize(
        &self,
        draft: &DraftQuote,
        margin: Margin,
        container_quantities: BTreeMap<String, u32>,
        audit: &AuditContext,
    ) -> Result<(DraftQuote, PriceBreakdown), DomainError> {
        let result = finalize(draft, &self.pricer, &self.currency, margin, container_quantities);
        match &result {
            Ok((_, breakdown)) => {
                info!(
                    event_name = "pricing.finalized",
                    correlation_id = %audit.correlation_id,
                    request_id = %draft.request_id.0,
                    grand_total = %breakdown.grand_total,
                    currency = %breakdown.currency,
                    "draft finalized"
                );
                self.audit_sink.emit(
                    success(audit, "pricing.finalized", AuditCategory::Pricing)
                        .with_metadata("grand_total", breakdown.grand_total.to_string()),
                );
            }
            Err(error) => {
                self.rejected(audit, "pricing.finalize_rejected", AuditCategory::Pricing, error)
            }
        }
        result
    }

    pub fn save(
        &self,
        draft: &DraftQuote,
        audit: &AuditContext,
    ) -> Result<DraftQuote, ApplicationError> {
        let saved = match self.store.save(draft) {
            Ok(saved) => saved,
            Err(error) => {
                self.audit_sink.emit(
                    AuditEvent::new(
                        audit,
                        "draft.save_failed",
                        AuditCategory::Persistence,
                        AuditOutcome::Failed,
                    )
                    .with_metadata("error", error.to_string()),
                );
                return Err(error);
            }
        };

        let draft_id = saved.id.as_ref().map(|id| id.0.as_str()).unwrap_or("unknown");
        info!(
            event_name = "persistence.draft_saved",
            correlation_id = %audit.correlation_id,
            request_id = %draft.request_id.0,
            draft_id,
            first_save = !draft.is_saved(),
            "draft saved"
        );
        self.audit_sink.emit(
            success(audit, "draft.saved", AuditCategory::Persistence)
                .with_metadata("draft_id", draft_id),
        );
        Ok(saved)
    }

    fn rejected(
        &self,
        audit: &AuditContext,
        event_type: &str,
        category: AuditCategory,
        error: &DomainError,
    ) {
        warn!(
            event_name = event_type,
            correlation_id = %audit.correlation_id,
            request_id = %audit.request_id.0,
            error = %error,
            "draft action rejected"
        );
        self.audit_sink.emit(
            AuditEvent::new(audit, event_type, category, AuditOutcome::Rejected)
                .with_metadata("error", error.to_string()),
        );
    }
}

fn success(audit: &AuditContext, event_type: &str, category: AuditCategory) -> AuditEvent {
    AuditEvent::new(audit, event_type, category, AuditOutcome::Success)
}
