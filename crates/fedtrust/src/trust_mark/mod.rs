//! Trust marks: templates, issued records, verified marks and the issuer.
//!
//! A trust mark is a signed, time-bounded attestation that a subject
//! entity holds some federation-defined property. The issuer keeps one
//! [`TrustMarkSpec`] per mark id, records every mark it creates in an
//! attestation store as a [`TrustMarkRecord`], and hands back a compact
//! token with `typ: trust-mark+jwt`.

pub mod issuer;
pub mod message;
pub mod record;
pub mod spec;

pub use issuer::{TrustMarkIssuer, TrustMarkIssuerConfig};
pub use message::TrustMark;
pub use record::TrustMarkRecord;
pub use spec::TrustMarkSpec;
