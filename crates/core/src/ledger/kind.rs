//! Ledger movement kinds.
//!
//! Kinds are stored as free text. Known values map to dedicated variants; any
//! other value is kept verbatim in [`MovementKind::Unknown`] so legacy rows are
//! never dropped.

use serde::{Deserialize, Serialize};

/// Direction a movement moves cash in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Cash comes into the point.
    Inflow,
    /// Cash leaves the point.
    Outflow,
}

/// Kind of a ledger movement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MovementKind {
    /// `SALDO_INICIAL`: already represented by the initial balance row.
    InitialBalance,
    /// `AJUSTE`: manual adjustment, trusted as signed.
    Adjustment,
    /// `CAMBIO_DIVISA`: one leg of a currency exchange.
    CurrencyExchange,
    /// `INGRESO`
    Income,
    /// `VENTA`
    Sale,
    /// `SALDO`
    Balance,
    /// `TRANSFERENCIA_ENTRANTE`
    TransferIncoming,
    /// `TRANSFERENCIA_ENTRADA`
    TransferIn,
    /// `TRANSFERENCIA_RECIBIDA`
    TransferReceived,
    /// `TRANSFERENCIA_DEVOLUCION`
    TransferReturn,
    /// `EGRESO`
    Expense,
    /// `COMPRA`
    Purchase,
    /// `TRANSFERENCIA_SALIENTE`
    TransferOutgoing,
    /// `TRANSFERENCIA_SALIDA`
    TransferOut,
    /// `TRANSFERENCIA_ENVIADA`
    TransferSent,
    /// Any other stored value, kept as written.
    Unknown(String),
}

impl MovementKind {
    /// Parses a stored kind. Matching ignores case and surrounding whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "SALDO_INICIAL" => Self::InitialBalance,
            "AJUSTE" => Self::Adjustment,
            "CAMBIO_DIVISA" => Self::CurrencyExchange,
            "INGRESO" => Self::Income,
            "VENTA" => Self::Sale,
            "SALDO" => Self::Balance,
            "TRANSFERENCIA_ENTRANTE" => Self::TransferIncoming,
            "TRANSFERENCIA_ENTRADA" => Self::TransferIn,
            "TRANSFERENCIA_RECIBIDA" => Self::TransferReceived,
            "TRANSFERENCIA_DEVOLUCION" => Self::TransferReturn,
            "EGRESO" => Self::Expense,
            "COMPRA" => Self::Purchase,
            "TRANSFERENCIA_SALIENTE" => Self::TransferOutgoing,
            "TRANSFERENCIA_SALIDA" => Self::TransferOut,
            "TRANSFERENCIA_ENVIADA" => Self::TransferSent,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    /// Stored representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::InitialBalance => "SALDO_INICIAL",
            Self::Adjustment => "AJUSTE",
            Self::CurrencyExchange => "CAMBIO_DIVISA",
            Self::Income => "INGRESO",
            Self::Sale => "VENTA",
            Self::Balance => "SALDO",
            Self::TransferIncoming => "TRANSFERENCIA_ENTRANTE",
            Self::TransferIn => "TRANSFERENCIA_ENTRADA",
            Self::TransferReceived => "TRANSFERENCIA_RECIBIDA",
            Self::TransferReturn => "TRANSFERENCIA_DEVOLUCION",
            Self::Expense => "EGRESO",
            Self::Purchase => "COMPRA",
            Self::TransferOutgoing => "TRANSFERENCIA_SALIENTE",
            Self::TransferOut => "TRANSFERENCIA_SALIDA",
            Self::TransferSent => "TRANSFERENCIA_ENVIADA",
            Self::Unknown(raw) => raw,
        }
    }

    /// Direction for kinds in the fixed income and expense sets.
    ///
    /// Returns `None` for initial balance, adjustment, currency exchange and
    /// unknown kinds, whose sign is decided elsewhere.
    #[must_use]
    pub const fn fixed_direction(&self) -> Option<Direction> {
        match self {
            Self::Income
            | Self::Sale
            | Self::Balance
            | Self::TransferIncoming
            | Self::TransferIn
            | Self::TransferReceived
            | Self::TransferReturn => Some(Direction::Inflow),
            Self::Expense
            | Self::Purchase
            | Self::TransferOutgoing
            | Self::TransferOut
            | Self::TransferSent => Some(Direction::Outflow),
            Self::InitialBalance | Self::Adjustment | Self::CurrencyExchange | Self::Unknown(_) => {
                None
            }
        }
    }
}

impl From<&str> for MovementKind {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MovementKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MovementKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
