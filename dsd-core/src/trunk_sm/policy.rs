//! Grant policy guards: data/enc toggles, allow/block lists, IDEN-trust
//! gating.

use std::collections::HashSet;

use crate::grant::GrantEvent;
use crate::iden::IdenTable;

#[derive(Debug, Clone, Default)]
pub struct Policy {
    pub tune_data_calls: bool,
    pub tune_enc_calls: bool,
    pub allow_list: Option<HashSet<u32>>,
    pub block_list: HashSet<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyVerdict {
    Allow,
    BlockData,
    BlockEncrypted,
    BlockTargetNotAllowed,
    BlockTargetBlocked,
    BlockUnresolvedIden,
}

impl Policy {
    /// Evaluate a grant against data/enc toggles, allow/block lists, and
    /// IDEN trust, in that order (matching the guard order in the
    /// transition table).
    pub fn evaluate(&self, grant: &GrantEvent, iden_table: &IdenTable) -> PolicyVerdict {
        if grant.is_data_call() && !self.tune_data_calls {
            return PolicyVerdict::BlockData;
        }
        if grant.is_encrypted() && !self.tune_enc_calls {
            return PolicyVerdict::BlockEncrypted;
        }
        if self.block_list.contains(&grant.target_id) {
            return PolicyVerdict::BlockTargetBlocked;
        }
        if let Some(allow) = &self.allow_list {
            if !allow.contains(&grant.target_id) {
                return PolicyVerdict::BlockTargetNotAllowed;
            }
        }
        if iden_table.resolve_channel_id(grant.channel_id).is_err() {
            return PolicyVerdict::BlockUnresolvedIden;
        }
        PolicyVerdict::Allow
    }
}
