//! SPF record parsing and flattening.
//!
//! [`parse`] turns a record into [`Mechanism`]s. [`Flattener`] inlines every
//! `include` / `redirect` target through an injected [`LookupTxt`] resolver,
//! never issuing more than [`LOOKUP_LIMIT`] TXT queries per record tree.

mod budget;
mod error;
mod flatten;
mod mechanism;
mod parser;
mod resolver;
mod types;
mod validate;

pub use budget::{LOOKUP_LIMIT, LookupBudget, LookupFailure};
pub use error::SpfError;
pub use flatten::Flattener;
pub use mechanism::{Mechanism, MechanismKind, Qualifier, render_record};
pub use parser::parse;
pub use resolver::{LookupTxt, ResolverChoice};
pub use types::{FlattenOptions, FlattenResult, VerifyReport};
pub use validate::{validate, validate_mechanisms};
