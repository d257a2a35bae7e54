use serde_json::Value;
use starknet::core::{
    types::{Call, Felt},
    utils::get_selector_from_name,
};

use crate::{calldata::Abi, error::CalldataError};

/// Local handle to a deployed contract. `A` is whatever the handle is bound
/// to; `()` until [`ContractHandle::connect`] attaches an account.
#[derive(Debug, Clone)]
pub struct ContractHandle<A = ()> {
    abi: Abi,
    address: Felt,
    account: A,
}

impl ContractHandle {
    pub fn new(abi: Abi, address: Felt) -> Self {
        Self {
            abi,
            address,
            account: (),
        }
    }
}

impl<A> ContractHandle<A> {
    pub fn connect<B>(self, account: B) -> ContractHandle<B> {
        ContractHandle {
            abi: self.abi,
            address: self.address,
            account,
        }
    }

    pub fn address(&self) -> Felt {
        self.address
    }

    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    pub fn account(&self) -> &A {
        &self.account
    }

    /// Builds an invoke call for `function`, encoding `args` against the ABI.
    pub fn call(&self, function: &str, args: &Value) -> Result<Call, CalldataError> {
        let calldata = self.abi.encode_function(function, args)?;
        let selector = get_selector_from_name(function)
            .map_err(|_| CalldataError::InvalidFunctionName(function.to_string()))?;

        Ok(Call {
            to: self.address,
            selector,
            calldata,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn erc1155_abi() -> Abi {
        Abi::from_value(&json!([
            {"type": "function", "name": "balance_of", "inputs": [
                {"name": "account", "type": "core::starknet::contract_address::ContractAddress"},
                {"name": "token_id", "type": "core::integer::u256"}
            ], "outputs": [{"type": "core::integer::u256"}], "state_mutability": "view"}
        ]))
        .unwrap()
    }

    #[test]
    fn connect_keeps_address_and_binds_account() {
        let handle = ContractHandle::new(erc1155_abi(), Felt::from(0xc0ffee_u64)).connect("owner");

        assert_eq!(handle.address(), Felt::from(0xc0ffee_u64));
        assert_eq!(*handle.account(), "owner");
    }

    #[test]
    fn call_targets_contract_with_selector_and_calldata() {
        let handle = ContractHandle::new(erc1155_abi(), Felt::from(0x99_u64));
        let call = handle
            .call("balance_of", &json!({"account": "0x1", "token_id": 4}))
            .unwrap();

        assert_eq!(call.to, Felt::from(0x99_u64));
        assert_eq!(call.selector, get_selector_from_name("balance_of").unwrap());
        assert_eq!(call.calldata, vec![Felt::ONE, Felt::from(4_u64), Felt::ZERO]);
    }

    #[test]
    fn call_to_unknown_function_fails() {
        let handle = ContractHandle::new(erc1155_abi(), Felt::ONE);
        assert!(matches!(
            handle.call("mint", &json!({})),
            Err(CalldataError::MissingFunction(_))
        ));
    }
}
