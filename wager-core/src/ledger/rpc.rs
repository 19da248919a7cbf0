use crate::config::WagerConfig;
use crate::error::{CoreError, Result, TransferError};
use crate::ledger::{Ledger, Signer, TransferMessage};
use crate::types::{Amount, EscrowReceipt};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Where a submitted transaction stands on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationState {
    Pending,
    Confirmed,
    Failed(String),
}

/// Interpret one entry of a `getSignatureStatuses` result.
pub fn parse_signature_status(status: &Value) -> ConfirmationState {
    if status.is_null() {
        return ConfirmationState::Pending;
    }

    if let Some(err) = status.get("err").filter(|e| !e.is_null()) {
        return ConfirmationState::Failed(err.to_string());
    }

    match status.get("confirmationStatus").and_then(Value::as_str) {
        Some("confirmed") | Some("finalized") => ConfirmationState::Confirmed,
        _ => ConfirmationState::Pending,
    }
}

/// JSON-RPC ledger client.
pub struct RpcLedger {
    client: reqwest::Client,
    rpc_url: String,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl RpcLedger {
    pub fn new(config: &WagerConfig) -> Result<Self> {
        if config.ledger_rpc_url.is_empty() {
            return Err(CoreError::config("Ledger RPC URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CoreError::internal(format!("Failed to create RPC client: {}", e)))?;

        Ok(Self {
            client,
            rpc_url: config.ledger_rpc_url.clone(),
            confirmation_timeout: config.confirmation_timeout,
            poll_interval: config.confirmation_poll_interval,
        })
    }

    async fn call(&self, method: &str, params: Value) -> std::result::Result<Value, TransferError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        tracing::debug!("Ledger RPC {} -> {}", method, self.rpc_url);

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransferError::network(format!("{} failed: {}", method, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::network(format!(
                "{} returned HTTP {}",
                method,
                status.as_u16()
            )));
        }

        let response: RpcResponse = response
            .json()
            .await
            .map_err(|e| TransferError::network(format!("Invalid {} response: {}", method, e)))?;

        if let Some(err) = response.error {
            return Err(TransferError::network(format!(
                "{} error {}: {}",
                method, err.code, err.message
            )));
        }

        response
            .result
            .ok_or_else(|| TransferError::network(format!("{} returned no result", method)))
    }

    async fn latest_blockhash(&self) -> std::result::Result<String, TransferError> {
        let result = self
            .call("getLatestBlockhash", json!([{ "commitment": "confirmed" }]))
            .await?;

        result
            .pointer("/value/blockhash")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| TransferError::network("getLatestBlockhash returned no blockhash"))
    }

    async fn send_transaction(&self, encoded: String) -> std::result::Result<String, TransferError> {
        let result = self
            .call(
                "sendTransaction",
                json!([encoded, { "encoding": "base64", "preflightCommitment": "confirmed" }]),
            )
            .await?;

        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| TransferError::network("sendTransaction returned no signature"))
    }

    async fn poll_until_confirmed(&self, signature: &str) -> std::result::Result<(), TransferError> {
        loop {
            let result = self
                .call("getSignatureStatuses", json!([[signature]]))
                .await?;
            let status = result.pointer("/value/0").cloned().unwrap_or(Value::Null);

            match parse_signature_status(&status) {
                ConfirmationState::Confirmed => return Ok(()),
                ConfirmationState::Failed(reason) => {
                    return Err(TransferError::network(format!(
                        "Transaction {} failed: {}",
                        signature, reason
                    )))
                }
                ConfirmationState::Pending => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }

    async fn confirm(&self, signature: &str) -> std::result::Result<(), TransferError> {
        tokio::time::timeout(self.confirmation_timeout, self.poll_until_confirmed(signature))
            .await
            .map_err(|_| {
                TransferError::network(format!(
                    "Transaction {} not confirmed within {}s",
                    signature,
                    self.confirmation_timeout.as_secs()
                ))
            })?
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn escrow_transfer(
        &self,
        signer: Option<&dyn Signer>,
        escrow_account: &str,
        amount: Amount,
    ) -> std::result::Result<EscrowReceipt, TransferError> {
        let signer = signer.ok_or(TransferError::NotConnected)?;

        if amount.is_zero() {
            return Err(TransferError::rejected("Transfer amount must be positive"));
        }

        let recent_blockhash = self.latest_blockhash().await?;
        let message = TransferMessage {
            from: signer.public_key(),
            to: escrow_account.to_string(),
            lamports: amount.to_lamports(),
            recent_blockhash,
        };

        let signed = signer.sign(&message).await?;
        let signature = self.send_transaction(signed.encode()).await?;
        if signature != signed.signature() {
            tracing::warn!(
                "Ledger returned signature {} for transaction signed as {}",
                signature,
                signed.signature()
            );
        }
        tracing::info!(
            "Submitted escrow transfer of {} to {}: {}",
            amount,
            escrow_account,
            signature
        );

        self.confirm(&signature).await?;
        tracing::info!("Escrow transfer {} confirmed", signature);

        Ok(EscrowReceipt::new(signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::MnemonicSigner;
    use crate::ledger::wire;
    use crate::DEFAULT_ESCROW_ACCOUNT;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn rpc_result(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": result }))
    }

    async fn mount(server: &MockServer, rpc_method: &str, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(response)
            .mount(server)
            .await;
    }

    async fn mount_blockhash(server: &MockServer) -> String {
        let blockhash = wire::encode_key(&[6u8; 32]);
        mount(
            server,
            "getLatestBlockhash",
            rpc_result(json!({
                "context": { "slot": 1 },
                "value": { "blockhash": blockhash, "lastValidBlockHeight": 100 }
            })),
        )
        .await;
        blockhash
    }

    fn ledger_for(server: &MockServer) -> RpcLedger {
        let mut config = WagerConfig::default();
        config.ledger_rpc_url = server.uri();
        config.confirmation_poll_interval = Duration::from_millis(10);
        config.confirmation_timeout = Duration::from_millis(300);
        RpcLedger::new(&config).unwrap()
    }

    fn status(value: Value) -> ResponseTemplate {
        rpc_result(json!({ "context": { "slot": 2 }, "value": [value] }))
    }

    async fn methods_called(server: &MockServer) -> Vec<String> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|request| {
                let body: Value = request.body_json().unwrap();
                body["method"].as_str().unwrap().to_string()
            })
            .collect()
    }

    #[test]
    fn test_parse_signature_status() {
        assert_eq!(
            parse_signature_status(&Value::Null),
            ConfirmationState::Pending
        );
        assert_eq!(
            parse_signature_status(&json!({ "err": null, "confirmationStatus": "processed" })),
            ConfirmationState::Pending
        );
        assert_eq!(
            parse_signature_status(&json!({ "err": null, "confirmationStatus": "finalized" })),
            ConfirmationState::Confirmed
        );
        assert!(matches!(
            parse_signature_status(&json!({ "err": { "InstructionError": [0, "Custom"] } })),
            ConfirmationState::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_signer_is_not_connected() {
        let ledger = RpcLedger::new(&WagerConfig::default()).unwrap();
        let result = ledger
            .escrow_transfer(None, "escrow", Amount::from_lamports(1))
            .await;
        assert_eq!(result, Err(TransferError::NotConnected));
    }

    #[tokio::test]
    async fn test_transfer_submits_signed_system_transfer() {
        let server = MockServer::start().await;
        let signer = MnemonicSigner::from_mnemonic("alice", TEST_MNEMONIC).unwrap();
        let blockhash = mount_blockhash(&server).await;

        let expected = signer
            .sign(&TransferMessage {
                from: signer.public_key(),
                to: DEFAULT_ESCROW_ACCOUNT.to_string(),
                lamports: 100_000_000,
                recent_blockhash: blockhash,
            })
            .await
            .unwrap();

        mount(&server, "sendTransaction", rpc_result(json!(expected.signature()))).await;
        mount(
            &server,
            "getSignatureStatuses",
            status(json!({ "slot": 2, "confirmations": 1, "err": null, "confirmationStatus": "confirmed" })),
        )
        .await;

        let receipt = ledger_for(&server)
            .escrow_transfer(
                Some(&signer as &dyn Signer),
                DEFAULT_ESCROW_ACCOUNT,
                Amount::from_lamports(100_000_000),
            )
            .await
            .unwrap();

        assert_eq!(receipt.as_str(), expected.signature());
        assert_eq!(
            methods_called(&server).await,
            vec!["getLatestBlockhash", "sendTransaction", "getSignatureStatuses"]
        );

        let requests = server.received_requests().await.unwrap();
        let send: Value = requests[1].body_json().unwrap();
        assert_eq!(send["params"][0], json!(expected.encode()));
        assert_eq!(send["params"][1]["encoding"], "base64");

        let raw = STANDARD.decode(send["params"][0].as_str().unwrap()).unwrap();
        let payer = wire::decode_key(&signer.public_key(), "payer").unwrap();
        let escrow = wire::decode_key(DEFAULT_ESCROW_ACCOUNT, "escrow").unwrap();
        assert_eq!(raw[0], 1);
        assert_eq!(&raw[65 + 4..65 + 36], &payer);
        assert_eq!(&raw[65 + 36..65 + 68], &escrow);
        assert_eq!(&raw[65 + 142..65 + 150], &100_000_000u64.to_le_bytes());
    }

    #[tokio::test]
    async fn test_failed_transaction_is_network_error() {
        let server = MockServer::start().await;
        let signer = MnemonicSigner::from_mnemonic("alice", TEST_MNEMONIC).unwrap();
        mount_blockhash(&server).await;
        mount(&server, "sendTransaction", rpc_result(json!("sig"))).await;
        mount(
            &server,
            "getSignatureStatuses",
            status(json!({ "err": { "InstructionError": [0, { "Custom": 1 }] }, "confirmationStatus": "processed" })),
        )
        .await;

        let result = ledger_for(&server)
            .escrow_transfer(Some(&signer as &dyn Signer), DEFAULT_ESCROW_ACCOUNT, Amount::from_lamports(5))
            .await;

        match result {
            Err(TransferError::Network(message)) => assert!(message.contains("failed")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unconfirmed_transaction_times_out() {
        let server = MockServer::start().await;
        let signer = MnemonicSigner::from_mnemonic("alice", TEST_MNEMONIC).unwrap();
        mount_blockhash(&server).await;
        mount(&server, "sendTransaction", rpc_result(json!("sig"))).await;
        mount(&server, "getSignatureStatuses", status(Value::Null)).await;

        let result = ledger_for(&server)
            .escrow_transfer(Some(&signer as &dyn Signer), DEFAULT_ESCROW_ACCOUNT, Amount::from_lamports(5))
            .await;

        match result {
            Err(TransferError::Network(message)) => assert!(message.contains("not confirmed")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_submission_is_not_polled() {
        let server = MockServer::start().await;
        let signer = MnemonicSigner::from_mnemonic("alice", TEST_MNEMONIC).unwrap();
        mount_blockhash(&server).await;
        mount(
            &server,
            "sendTransaction",
            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32002, "message": "Transaction simulation failed" }
            })),
        )
        .await;

        let result = ledger_for(&server)
            .escrow_transfer(Some(&signer as &dyn Signer), DEFAULT_ESCROW_ACCOUNT, Amount::from_lamports(5))
            .await;

        assert!(matches!(result, Err(TransferError::Network(_))));
        assert_eq!(
            methods_called(&server).await,
            vec!["getLatestBlockhash", "sendTransaction"]
        );
    }

    #[tokio::test]
    async fn test_unreachable_rpc_and_zero_amount() {
        let server = MockServer::start().await;
        mount(&server, "getLatestBlockhash", ResponseTemplate::new(503)).await;
        let signer = MnemonicSigner::from_mnemonic("alice", TEST_MNEMONIC).unwrap();
        let ledger = ledger_for(&server);

        assert!(matches!(
            ledger
                .escrow_transfer(Some(&signer as &dyn Signer), DEFAULT_ESCROW_ACCOUNT, Amount::from_lamports(5))
                .await,
            Err(TransferError::Network(_))
        ));

        assert!(matches!(
            ledger
                .escrow_transfer(Some(&signer as &dyn Signer), DEFAULT_ESCROW_ACCOUNT, Amount::ZERO)
                .await,
            Err(TransferError::Rejected(_))
        ));
        assert_eq!(methods_called(&server).await, vec!["getLatestBlockhash"]);
    }
}
