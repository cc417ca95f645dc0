//! Point Checks
//!
//! Two narrow checks answered from the contract outline alone: whether a
//! derived contract overrides `_mint`, and whether a public entry
//! point lacks the `onlyOwner` guard. Each produces one human-readable
//! result line.

use contract_guard_core::ToolResult;

use super::address::validate_address;
use crate::services::engine::outline::ContractKind;
use crate::services::engine::{ContractModel, ModelCache};

pub const MINT_SIGNATURE: &str = "_mint(address,uint256)";
pub const OWNER_MODIFIER: &str = "onlyOwner";

/// Entry points that are never reported as unprotected.
pub const UNPROTECTED_WHITELIST: [&str; 1] = ["balanceOf(address)"];

pub const ALL_GOOD: &str = "Check result -> All good!";
pub const SKIPPED_NO_ADDRESS: &str = "Check result -> Skipped: no valid contract address";
pub const SKIPPED_LOAD_FAILED: &str = "Check result -> Skipped: contract could not be loaded";

/// Report the first derived contract that declares its own `_mint`.
pub fn mint_check(model: &ContractModel) -> String {
    model
        .contracts
        .iter()
        .filter(|c| c.kind == ContractKind::Contract && !c.bases.is_empty())
        .find(|c| c.declared(MINT_SIGNATURE).is_some())
        .map(|c| format!("Check result -> Error: {} overrides the _mint function", c.name))
        .unwrap_or_else(|| ALL_GOOD.to_string())
}

/// Report the first entry point without `onlyOwner`, whatever its mutability.
pub fn unprotected_func(model: &ContractModel) -> String {
    model
        .contracts
        .iter()
        .filter(|c| c.kind == ContractKind::Contract)
        .flat_map(|c| c.functions.iter())
        .find(|f| {
            f.is_implemented
                && f.is_entry_point()
                && !f.is_constructor
                && !UNPROTECTED_WHITELIST.contains(&f.signature.as_str())
                && !f.has_modifier(OWNER_MODIFIER)
        })
        .map(|f| format!("Check result -> Error: {} is unprotected", f.signature))
        .unwrap_or_else(|| ALL_GOOD.to_string())
}

async fn check_message(
    cache: &mut ModelCache,
    address: Option<&str>,
    check: fn(&ContractModel) -> String,
) -> String {
    let Some(address) = validate_address(address) else {
        return SKIPPED_NO_ADDRESS.to_string();
    };
    match cache.get(address).await {
        Some(model) => check(&model),
        None => SKIPPED_LOAD_FAILED.to_string(),
    }
}

pub async fn run_mint_check(cache: &mut ModelCache, address: Option<&str>) -> ToolResult {
    ToolResult::MintCheck {
        message: check_message(cache, address, mint_check).await,
    }
}

pub async fn run_unprotected_func(cache: &mut ModelCache, address: Option<&str>) -> ToolResult {
    ToolResult::UnprotectedFunc {
        message: check_message(cache, address, unprotected_func).await,
    }
}
