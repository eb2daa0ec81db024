pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod options;
pub mod pricing;
pub mod recap;
pub mod session;
pub mod store;
pub mod wizard;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, NoopAuditSink};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::container::{total_teu, ContainerType};
pub use domain::draft::{DraftId, DraftQuote, StepUpdate};
pub use domain::finalize::{Margin, MarginType, OptionId, QuoteOption};
pub use errors::{ApplicationError, DomainError};
pub use options::{create_option, finalize, select_option, OptionRequest};
pub use pricing::{
    price_draft, DeterministicDraftPricer, DraftPricer, PriceBreakdown, PricingInput, RecapLine,
};
pub use recap::{RecapError, RecapRenderer};
pub use session::DraftSession;
pub use store::{DraftStore, InMemoryDraftStore};
pub use wizard::{validate_draft, validate_step, StepValidation, WizardStep};
