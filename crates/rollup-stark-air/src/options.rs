//! Proof Options Configuration
//!
//! Configurable parameters for STARK proof generation that affect
//! security level, proof size, and proving/verification time.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use winter_air::FieldExtension;

/// Errors that can occur when validating proof options
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("num_queries must be between 1 and 255, got {0}")]
    InvalidNumQueries(usize),
    #[error("blowup_factor must be a power of two in 2..=128, got {0}")]
    InvalidBlowupFactor(usize),
    #[error("blowup_factor {actual} is below the {required} required by the AIR")]
    BlowupTooSmall { actual: usize, required: usize },
    #[error("grinding_factor must be at most 32, got {0}")]
    InvalidGrindingFactor(u32),
    #[error("fri_folding_factor must be one of 2, 4, 8, 16, got {0}")]
    InvalidFriFoldingFactor(usize),
}

/// Options for proof generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOptions {
    /// Number of FRI queries (higher = more security, slower verification)
    pub num_queries: usize,

    /// Blowup factor for the low-degree extension. Must be a power of 2 and at
    /// least the constraint-degree requirement of the AIR being proven.
    pub blowup_factor: usize,

    /// Grinding factor for proof-of-work
    pub grinding_factor: u32,

    /// Field extension used for the composition and DEEP polynomials
    #[serde(with = "extension_degree")]
    pub field_extension: FieldExtension,

    /// FRI folding factor
    pub fri_folding_factor: usize,
}

impl Default for ProofOptions {
    fn default() -> Self {
        Self {
            num_queries: 28,
            blowup_factor: 8,
            grinding_factor: 16,
            field_extension: FieldExtension::None,
            fri_folding_factor: 8,
        }
    }
}

impl ProofOptions {
    /// Options for fast proving in tests and simulations (low security)
    ///
    /// Keeps a blowup of 8 since the degree-7 Rescue constraints need it.
    pub fn fast() -> Self {
        Self {
            num_queries: 16,
            blowup_factor: 8,
            grinding_factor: 0,
            field_extension: FieldExtension::None,
            fri_folding_factor: 8,
        }
    }

    /// Create options optimized for security (~128 bits)
    pub fn secure() -> Self {
        Self {
            num_queries: 40,
            blowup_factor: 16,
            grinding_factor: 20,
            field_extension: FieldExtension::Quadratic,
            fri_folding_factor: 8,
        }
    }

    /// Validate proof options for internal consistency
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.num_queries == 0 || self.num_queries > 255 {
            return Err(OptionsError::InvalidNumQueries(self.num_queries));
        }
        if self.blowup_factor < 2 || self.blowup_factor > 128 || !self.blowup_factor.is_power_of_two() {
            return Err(OptionsError::InvalidBlowupFactor(self.blowup_factor));
        }
        if self.grinding_factor > 32 {
            return Err(OptionsError::InvalidGrindingFactor(self.grinding_factor));
        }
        if !matches!(self.fri_folding_factor, 2 | 4 | 8 | 16) {
            return Err(OptionsError::InvalidFriFoldingFactor(self.fri_folding_factor));
        }
        Ok(())
    }

    /// Validate and check the blowup against an AIR's minimum
    pub fn validate_for_blowup(&self, required: usize) -> Result<(), OptionsError> {
        self.validate()?;
        if self.blowup_factor < required {
            return Err(OptionsError::BlowupTooSmall {
                actual: self.blowup_factor,
                required,
            });
        }
        Ok(())
    }

    /// Estimate the security level in bits without panicking
    pub fn try_security_level(&self) -> Result<usize, OptionsError> {
        self.validate()?;

        let query_security = self.num_queries * self.blowup_factor.ilog2() as usize;
        let extension_bonus = match self.field_extension {
            FieldExtension::None => 0,
            FieldExtension::Quadratic => 10,
            FieldExtension::Cubic => 20,
        };

        Ok(query_security + self.grinding_factor as usize + extension_bonus)
    }

    /// Convert to Winterfell ProofOptions without panicking
    pub fn try_to_winterfell(&self) -> Result<winter_air::ProofOptions, OptionsError> {
        self.validate()?;
        Ok(winter_air::ProofOptions::new(
            self.num_queries,
            self.blowup_factor,
            self.grinding_factor,
            self.field_extension,
            self.fri_folding_factor,
            31, // FRI max remainder polynomial degree
        ))
    }
}

/// Serde adapter storing the field extension as its degree (1, 2 or 3)
mod extension_degree {
    use serde::{Deserialize, Deserializer, Serializer};
    use winter_air::FieldExtension;

    pub fn serialize<S: Serializer>(ext: &FieldExtension, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(ext.degree() as u8)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FieldExtension, D::Error> {
        match u8::deserialize(deserializer)? {
            1 => Ok(FieldExtension::None),
            2 => Ok(FieldExtension::Quadratic),
            3 => Ok(FieldExtension::Cubic),
            other => Err(serde::de::Error::custom(format!(
                "unsupported field extension degree {other}"
            ))),
        }
    }
}
