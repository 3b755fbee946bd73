//! CLI command implementations.

pub(crate) mod aliases;
pub(crate) mod expand;
pub(crate) mod validate;

pub(crate) use aliases::AddAliasesArgs;
pub(crate) use expand::ExpandArgs;
pub(crate) use validate::ValidateArgs;
