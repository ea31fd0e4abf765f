//! Transaction classification, derived once at broadcast time.

use serde::{Deserialize, Serialize};
use vela_types::AccountAddress;

/// What kind of transaction this is, derived by the broadcast pipeline so
/// downstream consumers (tracker side effects, history UI) never re-parse
/// calldata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxExtra {
    /// Plain native-token transfer.
    pub simple: bool,
    /// Any call into a contract.
    pub contract_interaction: bool,
    /// ERC-20 style fungible token interaction.
    pub token20: bool,
    /// ERC-721/1155 style NFT interaction.
    pub token_nft: bool,
    /// The contract involved, when `contract_interaction`.
    pub contract_address: Option<AccountAddress>,
    /// Derived method name, e.g. "transfer".
    pub method: Option<String>,
}
