//! Client-side primitives for the benchmarked chain: addresses, transactions, signing accounts, wallet files and
//! the node JSON-RPC client.

pub mod account;
pub mod address;
pub mod rpc;
pub mod transaction;
pub mod wallet;

pub use account::{verify_transaction, Account, SignError};
pub use address::{Address, AddressError};
pub use rpc::{PreExecResult, RpcClient, RpcError};
pub use starknet_types_core::felt::Felt;
pub use transaction::{CodecError, DeployMetadata, Param, Payload, Signature, Transaction, TxHash};
pub use wallet::{Wallet, WalletAccount, WalletError};

/// Native asset contracts.
pub mod native {
    use crate::address::Address;

    pub const ONT_CONTRACT: Address = Address::native(1);
    pub const ONG_CONTRACT: Address = Address::native(2);

    /// ONG amounts are expressed in units of 10^-9.
    pub const ONG_DECIMALS_FACTOR: u64 = 1_000_000_000;
}
