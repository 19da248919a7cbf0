//! In-memory ledger, gateway and signer that record every call.

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use wager_core::{
    AcceptWagerRequest, Ack, Amount, CreateWagerRequest, EscrowReceipt, FinishWagerRequest,
    GatewayError, Ledger, SignedTransfer, Signer, TransferError, TransferMessage, WagerGateway,
    WagerIdentity, WagerStatus,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    QueryStatus(WagerIdentity),
    Transfer { escrow: String, amount: Amount },
    Create(CreateWagerRequest),
    Accept(AcceptWagerRequest),
    Finish(FinishWagerRequest),
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub struct FakeSigner {
    public_key: String,
}

impl FakeSigner {
    pub fn new(public_key: &str) -> Self {
        Self {
            public_key: public_key.to_string(),
        }
    }
}

#[async_trait]
impl Signer for FakeSigner {
    fn public_key(&self) -> String {
        self.public_key.clone()
    }

    async fn sign(&self, _message: &TransferMessage) -> Result<SignedTransfer, TransferError> {
        Ok(SignedTransfer::new([0u8; 64], Vec::new()))
    }
}

pub struct FakeLedger {
    results: Mutex<VecDeque<Result<EscrowReceipt, TransferError>>>,
    log: CallLog,
}

impl FakeLedger {
    pub fn new(log: CallLog) -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            log,
        }
    }

    pub fn then(self, result: Result<EscrowReceipt, TransferError>) -> Self {
        self.results.lock().unwrap().push_back(result);
        self
    }
}

#[async_trait]
impl Ledger for FakeLedger {
    async fn escrow_transfer(
        &self,
        signer: Option<&dyn Signer>,
        escrow_account: &str,
        amount: Amount,
    ) -> Result<EscrowReceipt, TransferError> {
        if signer.is_none() {
            return Err(TransferError::NotConnected);
        }
        self.log.lock().unwrap().push(Call::Transfer {
            escrow: escrow_account.to_string(),
            amount,
        });
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(EscrowReceipt::new("receipt")))
    }
}

pub struct FakeGateway {
    statuses: Mutex<VecDeque<Result<WagerStatus, GatewayError>>>,
    create: Mutex<Option<Result<Ack, GatewayError>>>,
    accept: Mutex<Option<Result<Ack, GatewayError>>>,
    finish: Mutex<Option<Result<Ack, GatewayError>>>,
    log: CallLog,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::with_log(Arc::new(Mutex::new(Vec::new())))
    }

    pub fn with_log(log: CallLog) -> Self {
        Self {
            statuses: Mutex::new(VecDeque::new()),
            create: Mutex::new(None),
            accept: Mutex::new(None),
            finish: Mutex::new(None),
            log,
        }
    }

    /// Queue a status reply. The last queued status repeats.
    pub fn with_status(self, status: Result<WagerStatus, GatewayError>) -> Self {
        self.statuses.lock().unwrap().push_back(status);
        self
    }

    pub fn with_create(self, result: Result<Ack, GatewayError>) -> Self {
        *self.create.lock().unwrap() = Some(result);
        self
    }

    pub fn with_accept(self, result: Result<Ack, GatewayError>) -> Self {
        *self.accept.lock().unwrap() = Some(result);
        self
    }

    pub fn with_finish(self, result: Result<Ack, GatewayError>) -> Self {
        *self.finish.lock().unwrap() = Some(result);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    fn ack_or_default(slot: &Mutex<Option<Result<Ack, GatewayError>>>) -> Result<Ack, GatewayError> {
        slot.lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Ack(json!({ "ok": true }))))
    }
}

#[async_trait]
impl WagerGateway for FakeGateway {
    async fn query_status(&self, identity: &WagerIdentity) -> Result<WagerStatus, GatewayError> {
        self.log
            .lock()
            .unwrap()
            .push(Call::QueryStatus(identity.clone()));
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap_or(Ok(WagerStatus::NotFound))
        } else {
            statuses.front().cloned().unwrap_or(Ok(WagerStatus::NotFound))
        }
    }

    async fn create_wager(&self, request: &CreateWagerRequest) -> Result<Ack, GatewayError> {
        self.log.lock().unwrap().push(Call::Create(request.clone()));
        Self::ack_or_default(&self.create)
    }

    async fn accept_wager(&self, request: &AcceptWagerRequest) -> Result<Ack, GatewayError> {
        self.log.lock().unwrap().push(Call::Accept(request.clone()));
        Self::ack_or_default(&self.accept)
    }

    async fn finish_wager(&self, request: &FinishWagerRequest) -> Result<Ack, GatewayError> {
        self.log.lock().unwrap().push(Call::Finish(request.clone()));
        Self::ack_or_default(&self.finish)
    }
}
