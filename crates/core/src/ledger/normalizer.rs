//! Movement sign normalization.
//!
//! Legacy rows were persisted with inconsistent signs, so the stored amount is
//! not trusted directly. [`normalize`] maps (kind, amount, description) to the
//! signed delta applied to a running cash balance.
//!
//! Every rule that reads the free-text description lives in this module.

use rust_decimal::Decimal;

use super::kind::{Direction, MovementKind};

const BANK_MARKER: &[u8] = b"banco";
const BANK_MARKER_ABBREVIATION: &str = "bco";

const EXCHANGE_OUTFLOW_PREFIX: &str = "egreso por cambio";
const EXCHANGE_INFLOW_PREFIX: &str = "ingreso por cambio";

const OUTFLOW_MARKERS: [&str; 4] = ["SALIDA", "SALIENTE", "EGRESO", "COMPRA"];
const INFLOW_MARKERS: [&str; 5] = ["ENTRADA", "ENTRANTE", "INGRESO", "VENTA", "DEVOLUCION"];

/// Returns the signed delta a movement contributes to the cash balance.
///
/// Rule order matters:
/// 1. `SALDO_INICIAL` contributes nothing.
/// 2. `AJUSTE` is applied as stored.
/// 3. `CAMBIO_DIVISA` takes its sign from the description prefix, falling back
///    to the stored sign.
/// 4. Kinds in the fixed income/expense sets get `+|amount|` / `-|amount|`.
/// 5. Unknown kinds are matched by substring; if nothing matches the stored
///    amount is returned unchanged.
#[must_use]
pub fn normalize(kind: &MovementKind, amount: Decimal, description: Option<&str>) -> Decimal {
    match kind {
        MovementKind::InitialBalance => Decimal::ZERO,
        MovementKind::Adjustment => amount,
        MovementKind::CurrencyExchange => apply(exchange_direction(description), amount),
        MovementKind::Unknown(raw) => apply(guess_direction(raw), amount),
        known => apply(known.fixed_direction(), amount),
    }
}

/// Returns true when the description marks the movement as a bank-bucket
/// movement (`banco` / `bancos`, any case). Bank movements never touch cash.
#[must_use]
pub fn is_bank_movement(description: Option<&str>) -> bool {
    description.is_some_and(|text| text.to_lowercase().contains("banco"))
}

/// Rewrites free text so it can go into the description of a cash movement.
///
/// Every `banco` (any case) becomes `bco`, so operator-supplied text such as
/// a bank name in a note or guide number never moves a cash movement into the
/// bank bucket.
#[must_use]
pub fn cash_description(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut at = 0;
    while at + BANK_MARKER.len() <= bytes.len() {
        if bytes[at..at + BANK_MARKER.len()].eq_ignore_ascii_case(BANK_MARKER) {
            // The marker is ASCII, so both ends fall on char boundaries.
            out.push_str(&text[copied..at]);
            out.push_str(BANK_MARKER_ABBREVIATION);
            at += BANK_MARKER.len();
            copied = at;
        } else {
            at += 1;
        }
    }
    out.push_str(&text[copied..]);
    out
}

fn apply(direction: Option<Direction>, amount: Decimal) -> Decimal {
    match direction {
        Some(Direction::Inflow) => amount.abs(),
        Some(Direction::Outflow) => -amount.abs(),
        None => amount,
    }
}

fn exchange_direction(description: Option<&str>) -> Option<Direction> {
    let text = description?.trim().to_lowercase();
    if text.starts_with(EXCHANGE_OUTFLOW_PREFIX) {
        Some(Direction::Outflow)
    } else if text.starts_with(EXCHANGE_INFLOW_PREFIX) {
        Some(Direction::Inflow)
    } else {
        None
    }
}

fn guess_direction(raw_kind: &str) -> Option<Direction> {
    let kind = raw_kind.to_uppercase();
    if OUTFLOW_MARKERS.iter().any(|marker| kind.contains(marker)) {
        Some(Direction::Outflow)
    } else if INFLOW_MARKERS.iter().any(|marker| kind.contains(marker)) {
        Some(Direction::Inflow)
    } else {
        None
    }
}
