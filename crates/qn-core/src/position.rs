//! Long/short position.

use serde::{Deserialize, Serialize};

/// Side of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    /// Buyer of the instrument; for swaps, payer of the fixed leg.
    Long,
    /// Seller of the instrument; for swaps, receiver of the fixed leg.
    Short,
}

impl Position {
    /// +1 for long, −1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Position::Long => 1.0,
            Position::Short => -1.0,
        }
    }
}
