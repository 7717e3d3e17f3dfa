//! Rollup configuration and circuit data

use std::fmt;
use std::sync::Arc;

use rollup_stark_air::ProofOptions;
use rollup_stark_inner::{
    decode_raw, HashProofSystem, InnerProofSystem, ProofKind, RawInnerProof, VerificationKeySet,
};
use serde::{Deserialize, Serialize};

use crate::air::MIN_BLOWUP_FACTOR;
use crate::error::{BatchError, BatchResult, TreeError};

/// Largest supported tree depth; indices must fit a `u64` with room for `1 << depth`.
pub const MAX_TREE_DEPTH: usize = 63;

/// Depths of the three state trees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDepths {
    /// Note-commitment tree
    pub data: usize,
    /// Nullifier tree; a nullifier's index is its first limb modulo `2^nullifier`
    pub nullifier: usize,
    /// Tree of historical data roots, one leaf per batch
    pub roots: usize,
}

impl Default for TreeDepths {
    fn default() -> Self {
        Self {
            data: 32,
            nullifier: 63,
            roots: 28,
        }
    }
}

impl TreeDepths {
    /// Small trees for tests and local simulation
    pub fn testing() -> Self {
        Self {
            data: 8,
            nullifier: 24,
            roots: 8,
        }
    }

    pub fn validate(&self) -> Result<(), TreeError> {
        for depth in [self.data, self.nullifier, self.roots] {
            if depth == 0 || depth > MAX_TREE_DEPTH {
                return Err(TreeError::InvalidDepth(depth));
            }
        }
        Ok(())
    }
}

/// Static parameters of a rollup circuit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupConfig {
    pub depths: TreeDepths,

    /// Widths a circuit exists for, each a power of two
    pub supported_widths: Vec<usize>,

    /// Options used when proving
    pub proof_options: ProofOptions,
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            depths: TreeDepths::default(),
            supported_widths: vec![1, 2, 4, 8, 16, 32],
            proof_options: ProofOptions::default(),
        }
    }
}

impl RollupConfig {
    /// Configuration for tests and local simulation (low security)
    pub fn testing() -> Self {
        Self {
            depths: TreeDepths::testing(),
            supported_widths: vec![1, 2, 4, 8],
            proof_options: ProofOptions::fast(),
        }
    }

    /// Set custom proof options
    pub fn with_options(mut self, options: ProofOptions) -> Self {
        self.proof_options = options;
        self
    }

    pub fn validate(&self) -> BatchResult<()> {
        self.depths
            .validate()
            .map_err(|e| BatchError::InvalidConfig(e.to_string()))?;

        if self.supported_widths.is_empty() {
            return Err(BatchError::InvalidConfig(
                "at least one width must be supported".to_string(),
            ));
        }
        if let Some(&width) = self
            .supported_widths
            .iter()
            .find(|w| **w == 0 || !w.is_power_of_two())
        {
            return Err(BatchError::InvalidConfig(format!(
                "width {width} is not a power of two"
            )));
        }
        if self.supported_widths.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(BatchError::InvalidConfig(
                "supported widths must be strictly increasing".to_string(),
            ));
        }

        self.proof_options
            .validate_for_blowup(MIN_BLOWUP_FACTOR)
            .map_err(|e| BatchError::InvalidConfig(e.to_string()))
    }

    /// Largest supported width
    pub fn max_width(&self) -> usize {
        self.supported_widths.iter().copied().max().unwrap_or(0)
    }

    /// Smallest supported width that holds `requested` proofs
    pub fn resolve_width(&self, requested: usize) -> Option<usize> {
        crate::assembler::resolve_width(requested, &self.supported_widths)
    }

    pub fn supports_width(&self, width: usize) -> bool {
        self.supported_widths.contains(&width)
    }

    /// Option sets a verifier accepts: the configured one and the presets
    pub fn acceptable_options(&self) -> Vec<ProofOptions> {
        let mut options = vec![self.proof_options.clone()];
        for preset in [ProofOptions::default(), ProofOptions::fast(), ProofOptions::secure()] {
            if !options.contains(&preset) {
                options.push(preset);
            }
        }
        options
    }
}

/// Everything needed to assemble, prove and verify batches for one circuit
#[derive(Clone)]
pub struct RollupCircuitData {
    pub config: RollupConfig,
    pub verification_keys: VerificationKeySet,
    /// Proof of the null transaction, placed in every unused slot
    pub padding_proof: RawInnerProof,
    pub inner_system: Arc<dyn InnerProofSystem>,
}

impl fmt::Debug for RollupCircuitData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RollupCircuitData")
            .field("config", &self.config)
            .field("verification_keys", &self.verification_keys)
            .field("padding_proof", &self.padding_proof.kind)
            .finish_non_exhaustive()
    }
}

impl RollupCircuitData {
    pub fn new(
        config: RollupConfig,
        verification_keys: VerificationKeySet,
        padding_proof: RawInnerProof,
        inner_system: Arc<dyn InnerProofSystem>,
    ) -> BatchResult<Self> {
        config.validate()?;

        if !verification_keys.is_consistent() {
            return Err(BatchError::InvalidConfig(
                "verification key set does not match proof kinds".to_string(),
            ));
        }

        if padding_proof.kind != ProofKind::JoinSplit {
            return Err(BatchError::InvalidPaddingProof(format!(
                "declared as {} proof",
                padding_proof.kind
            )));
        }
        let decoded = decode_raw(&padding_proof)
            .map_err(|e| BatchError::InvalidPaddingProof(e.to_string()))?;
        if !decoded.record.is_zero_effect() {
            return Err(BatchError::InvalidPaddingProof(
                "padding transaction has effects".to_string(),
            ));
        }
        if !inner_system.verify(&padding_proof.data, verification_keys.for_kind(ProofKind::JoinSplit)) {
            return Err(BatchError::InvalidPaddingProof(
                "padding proof does not verify".to_string(),
            ));
        }

        Ok(Self {
            config,
            verification_keys,
            padding_proof,
            inner_system,
        })
    }

    /// Circuit data backed by the hash-commitment mock proof system
    pub fn with_mock_system(config: RollupConfig) -> BatchResult<(Self, Arc<HashProofSystem>)> {
        let system = Arc::new(HashProofSystem::new());
        let data = Self::new(
            config,
            system.verification_keys().clone(),
            system.padding_proof(),
            system.clone(),
        )?;
        Ok((data, system))
    }
}
