// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::AppError;
use crate::domain::model::TxnReceipt;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::Signer;
use alloy::signers::local::PrivateKeySigner;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Wallet/account seam. All user-interactive operations live here; a
/// declined prompt surfaces as `AppError::UserCancelled`, distinguishable
/// from real failures without any string matching downstream.
pub trait WalletProvider: Send + Sync {
    fn address(&self) -> Address;

    /// EIP-191 personal-sign over a UTF-8 message; returns the 65-byte
    /// signature as a 0x-prefixed hex string.
    fn sign_message(
        &self,
        message: &str,
    ) -> impl Future<Output = Result<String, AppError>> + Send;

    fn send_transaction(
        &self,
        to: Address,
        calldata: Bytes,
        value: U256,
    ) -> impl Future<Output = Result<B256, AppError>> + Send;

    fn wait_for_receipt(
        &self,
        hash: B256,
    ) -> impl Future<Output = Result<TxnReceipt, AppError>> + Send;
}

/// Local private-key wallet over an alloy filler provider (gas, nonce and
/// chain id filled automatically, transaction signed locally).
pub struct LocalWallet {
    provider: DynProvider,
    signer: PrivateKeySigner,
    receipt_poll: Duration,
    receipt_timeout: Duration,
}

impl LocalWallet {
    pub fn connect(
        rpc_url: &str,
        signer: PrivateKeySigner,
        receipt_poll: Duration,
        receipt_timeout: Duration,
    ) -> Result<Self, AppError> {
        let url =
            Url::parse(rpc_url).map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(url)
            .erased();

        Ok(Self {
            provider,
            signer,
            receipt_poll,
            receipt_timeout,
        })
    }
}

impl WalletProvider for LocalWallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign_message(&self, message: &str) -> Result<String, AppError> {
        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| AppError::from_wallet_failure(e.to_string()))?;
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }

    async fn send_transaction(
        &self,
        to: Address,
        calldata: Bytes,
        value: U256,
    ) -> Result<B256, AppError> {
        let req = TransactionRequest::default()
            .with_from(self.signer.address())
            .with_to(to)
            .with_input(calldata)
            .with_value(value);

        let pending = self
            .provider
            .send_transaction(req)
            .await
            .map_err(|e| AppError::from_wallet_failure(e.to_string()))?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TxnReceipt, AppError> {
        let started = std::time::Instant::now();
        loop {
            if started.elapsed() >= self.receipt_timeout {
                return Err(AppError::TimedOut("Receipt wait".to_string()));
            }

            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(rcpt)) => {
                    return Ok(TxnReceipt {
                        hash,
                        success: rcpt.status(),
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(
                        target: "wallet",
                        error = %e,
                        hash = %format!("{:#x}", hash),
                        "Receipt lookup error; retrying"
                    );
                }
            }

            tokio::time::sleep(self.receipt_poll).await;
        }
    }
}
