use serde_json::{json, Value};
use starknet::core::types::Felt;

/// Constructor arguments of the `MyERC1155` contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc1155Constructor {
    pub token_uri: String,
    pub recipient: Felt,
    pub token_ids: Vec<u64>,
    pub values: Vec<u64>,
}

impl Erc1155Constructor {
    /// The fixed initial mint: four token ids with increasing supplies, all
    /// minted to `recipient`.
    pub fn initial_mint(recipient: Felt) -> Self {
        Self {
            token_uri: "niceToken".to_string(),
            recipient,
            token_ids: vec![1, 2, 3, 4],
            values: vec![100, 200, 300, 400],
        }
    }

    /// Named arguments for [`Abi::encode_constructor`](crate::calldata::Abi::encode_constructor).
    pub fn to_args(&self) -> Value {
        json!({
            "token_uri": self.token_uri,
            "recipient": format!("{:#x}", self.recipient),
            "token_ids": self.token_ids,
            "values": self.values,
        })
    }
}
