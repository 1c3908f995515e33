use thiserror::Error;
use txbench_sdk::native::{ONG_CONTRACT, ONG_DECIMALS_FACTOR, ONT_CONTRACT};
use txbench_sdk::{Address, AddressError, Param, Transaction};

use crate::config::{BenchConfig, Token};

/// Contract method moving contract tokens.
pub const TRANSFER_METHOD: &str = "transfer";

#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("Invalid {field} address: {source}")]
    InvalidAddress {
        field: &'static str,
        #[source]
        source: AddressError,
    },
    #[error("A contract address is required for contract token transfers")]
    MissingContract,
    #[error("Amount {amount} overflows once scaled to native units")]
    AmountOverflow { amount: u64 },
}

/// Builds the single unsigned template every worker derives its transactions from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionFactory {
    token: Token,
    contract: Option<Address>,
    to: Address,
    amount: u64,
    gas_price: u64,
    gas_limit: u64,
}

impl TransactionFactory {
    pub fn new(token: Token, contract: Option<Address>, to: Address, amount: u64, gas_price: u64, gas_limit: u64) -> Self {
        Self { token, contract, to, amount, gas_price, gas_limit }
    }

    pub fn from_config(config: &BenchConfig) -> Result<Self, FactoryError> {
        let to = parse_address("To", &config.to)?;
        let contract = match config.contract.as_deref().map(str::trim) {
            Some(contract) if !contract.is_empty() => Some(parse_address("Contract", contract)?),
            _ => None,
        };
        Ok(Self::new(config.token, contract, to, config.amount, config.gas_price, config.gas_limit))
    }

    /// Unsigned template sending `amount` from `sender` to the configured recipient.
    pub fn template(&self, sender: Address) -> Result<Transaction, FactoryError> {
        let tx = match self.token {
            Token::Ont => {
                Transaction::new_transfer(self.gas_price, self.gas_limit, ONT_CONTRACT, sender, self.to, self.amount)
            }
            Token::Ong => {
                let amount = self
                    .amount
                    .checked_mul(ONG_DECIMALS_FACTOR)
                    .ok_or(FactoryError::AmountOverflow { amount: self.amount })?;
                Transaction::new_transfer(self.gas_price, self.gas_limit, ONG_CONTRACT, sender, self.to, amount)
            }
            Token::Oep4 => {
                let contract = self.contract.ok_or(FactoryError::MissingContract)?;
                let args = vec![Param::Address(sender), Param::Address(self.to), Param::Int(u128::from(self.amount))];
                Transaction::new_invoke(self.gas_price, self.gas_limit, contract, TRANSFER_METHOD, args)
            }
        };
        Ok(tx)
    }
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, FactoryError> {
    value.parse().map_err(|source| FactoryError::InvalidAddress { field, source })
}
