//! # Bridge Settlement Protocol
//!
//! Two asymmetric phases. An intent only bumps a counter; the request
//! itself (caller, reference, transferred amount) lives in the transaction
//! log. A settlement changes nothing: the accepted call is the attestation.
//! Settlements are not deduplicated.

use super::bump;
use crate::domain::{ContractError, GlobalState};

/// Count a bridge intent. Returns the new total.
pub fn record_bridge_intent(global: &mut GlobalState) -> Result<u64, ContractError> {
    bump(&mut global.total_bridge_intents, "total_bridge_intents")?;
    Ok(global.total_bridge_intents)
}
