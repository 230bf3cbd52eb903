#![forbid(unsafe_code)]
//! spf_flatten — parse, flatten and verify SPF records

pub mod spf;
pub use spf::{
    FlattenOptions,
    FlattenResult,
    Flattener,
    LOOKUP_LIMIT,
    LookupBudget,
    LookupFailure,
    LookupTxt,
    Mechanism,
    MechanismKind,
    Qualifier,
    ResolverChoice,
    SpfError,
    VerifyReport,
    parse,
    render_record,
    validate,
    validate_mechanisms,
};
