use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base units per whole ledger unit (lamports per SOL).
pub const LAMPORTS_PER_UNIT: u64 = 1_000_000_000;

/// Natural key of a wager record at the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WagerIdentity {
    game_website_host: String,
    game_id: String,
}

impl WagerIdentity {
    pub fn new(game_website_host: impl Into<String>, game_id: impl Into<String>) -> Result<Self> {
        let identity = Self {
            game_website_host: game_website_host.into(),
            game_id: game_id.into(),
        };
        identity.validate()?;
        Ok(identity)
    }

    pub fn game_website_host(&self) -> &str {
        &self.game_website_host
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn validate(&self) -> Result<()> {
        if self.game_website_host.trim().is_empty() {
            return Err(CoreError::config("Game website host cannot be empty"));
        }
        if self.game_id.trim().is_empty() {
            return Err(CoreError::config("Game ID cannot be empty"));
        }
        Ok(())
    }
}

impl fmt::Display for WagerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.game_website_host, self.game_id)
    }
}

/// Backend-owned status of a wager, as observed by polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WagerStatus {
    NotFound,
    AwaitingSecondParty,
    Accepted,
    Finished,
}

impl WagerStatus {
    /// Map a backend `status_game` value. Unknown values yield `None`.
    pub fn from_status_game(value: &str) -> Option<Self> {
        match value {
            "player_one_has_bet" => Some(Self::AwaitingSecondParty),
            "player_two_has_bet" | "accepted" => Some(Self::Accepted),
            "game_finished" | "finished" => Some(Self::Finished),
            _ => None,
        }
    }
}

impl fmt::Display for WagerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not found",
            Self::AwaitingSecondParty => "awaiting second party",
            Self::Accepted => "accepted",
            Self::Finished => "finished",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Solo,
    #[default]
    Multiplayer,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solo => "solo",
            Self::Multiplayer => "multiplayer",
        }
    }
}

impl std::str::FromStr for GameType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "solo" => Ok(Self::Solo),
            "multiplayer" | "multi" => Ok(Self::Multiplayer),
            _ => Err(CoreError::config(format!("Unknown game type: {}", s))),
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Devnet,
    Mainnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Devnet => "devnet",
            Self::Mainnet => "mainnet",
        }
    }
}

impl std::str::FromStr for Network {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "devnet" => Ok(Self::Devnet),
            "mainnet" | "mainnet-beta" => Ok(Self::Mainnet),
            _ => Err(CoreError::config(format!("Unknown network: {}", s))),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quantity in the ledger's base unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_lamports(lamports: u64) -> Self {
        Self(lamports)
    }

    /// Convert whole ledger units (e.g. `0.1`) to base units, rounding to the nearest lamport.
    pub fn from_units(units: f64) -> Result<Self> {
        if !units.is_finite() || units < 0.0 {
            return Err(CoreError::config(format!("Invalid amount: {}", units)));
        }
        let lamports = (units * LAMPORTS_PER_UNIT as f64).round();
        if lamports > u64::MAX as f64 {
            return Err(CoreError::config(format!("Amount too large: {}", units)));
        }
        Ok(Self(lamports as u64))
    }

    pub fn to_lamports(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Amount {
    /// Decimal whole units without trailing zeros, e.g. `0.1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / LAMPORTS_PER_UNIT;
        let frac = self.0 % LAMPORTS_PER_UNIT;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let frac = format!("{:09}", frac);
        write!(f, "{}.{}", whole, frac.trim_end_matches('0'))
    }
}

/// Proof-of-payment token returned by the ledger. Never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EscrowReceipt(String);

impl EscrowReceipt {
    pub fn new(signature: impl Into<String>) -> Self {
        Self(signature.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EscrowReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend acknowledgement, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ack(pub serde_json::Value);

impl Ack {
    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }
}

/// Which side of a wager a participant escrowed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerRole {
    PlayerOne,
    PlayerTwo,
}

impl PlayerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlayerOne => "player_one",
            Self::PlayerTwo => "player_two",
        }
    }
}

impl std::str::FromStr for PlayerRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "player_one" => Ok(Self::PlayerOne),
            "player_two" => Ok(Self::PlayerTwo),
            _ => Err(CoreError::internal(format!("Unknown player role: {}", s))),
        }
    }
}

impl fmt::Display for PlayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
