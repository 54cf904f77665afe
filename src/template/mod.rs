//! Template sources and the contract they must satisfy
//!
//! A template is a source file declaring one placeholder type, such as
//! `StackTemplate`, written against a placeholder element type. The store
//! caches the raw sources per kind; the contract is checked after parsing.

mod contract;
mod store;

pub use contract::{check as check_contract, ContractError, RENDER_TRAIT};
pub use store::{fallback_stub, TemplateCopy, TemplateOrigin, TemplateStore};
