//! Rollup proof serialization
//!
//! JSON for inspection and a compact binary format for transport. The binary
//! form stores the proof bytes once; the result is decoded back out of their
//! public-input prefix.

use serde::{Deserialize, Serialize};

use crate::codec::decode_proof_bytes;
use crate::error::SerializationError;
use crate::prover::{RollupProof, RollupProofMetadata};

const HASH_LEN: usize = 32;

/// Versioned envelope around a rollup proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableRollupProof {
    /// Format version
    pub version: u8,

    pub proof: RollupProof,
}

impl SerializableRollupProof {
    /// Current format version
    pub const VERSION: u8 = 1;

    pub fn new(proof: RollupProof) -> Self {
        Self {
            version: Self::VERSION,
            proof,
        }
    }

    pub fn into_proof(self) -> RollupProof {
        self.proof
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, SerializationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self, SerializationError> {
        let envelope: Self = serde_json::from_str(json)?;
        if envelope.version != Self::VERSION {
            return Err(SerializationError::UnsupportedVersion(envelope.version));
        }
        Ok(envelope)
    }

    /// Serialize to the compact binary format
    ///
    /// `version (1) | proof length (u32 BE) | proof bytes | proof hash (32) |
    /// batch id (u64) | width (u32) | real txs (u32) | proving time (u64) |
    /// trace length (u64) | proof size (u64) | version string length (u8) | version string`,
    /// integers little-endian unless noted.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializationError> {
        let proof = &self.proof;
        let metadata = &proof.metadata;

        let hash = hex::decode(&proof.proof_hash)
            .map_err(|e| SerializationError::InvalidHash(e.to_string()))?;
        if hash.len() != HASH_LEN {
            return Err(SerializationError::InvalidHash(format!(
                "expected {HASH_LEN} bytes, got {}",
                hash.len()
            )));
        }
        let proof_len = u32::try_from(proof.proof_bytes.len())
            .map_err(|_| SerializationError::InvalidMetadata("proof too large".to_string()))?;
        let width = u32::try_from(metadata.width)
            .map_err(|_| SerializationError::InvalidMetadata("width too large".to_string()))?;
        let num_real = u32::try_from(metadata.num_real_txs)
            .map_err(|_| SerializationError::InvalidMetadata("too many transactions".to_string()))?;
        let prover_version = metadata.prover_version.as_bytes();
        let version_len = u8::try_from(prover_version.len())
            .map_err(|_| SerializationError::InvalidMetadata("prover version too long".to_string()))?;

        let mut bytes = Vec::with_capacity(1 + 4 + proof.proof_bytes.len() + HASH_LEN + 45);
        bytes.push(self.version);
        bytes.extend_from_slice(&proof_len.to_be_bytes());
        bytes.extend_from_slice(&proof.proof_bytes);
        bytes.extend_from_slice(&hash);

        bytes.extend_from_slice(&metadata.batch_id.to_le_bytes());
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&num_real.to_le_bytes());
        bytes.extend_from_slice(&metadata.proving_time_ms.to_le_bytes());
        bytes.extend_from_slice(&(metadata.trace_length as u64).to_le_bytes());
        bytes.extend_from_slice(&(metadata.proof_size as u64).to_le_bytes());
        bytes.push(version_len);
        bytes.extend_from_slice(prover_version);

        Ok(bytes)
    }

    /// Deserialize from the compact binary format
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SerializationError> {
        let mut reader = Reader::new(bytes);

        let version = reader.u8()?;
        if version != Self::VERSION {
            return Err(SerializationError::UnsupportedVersion(version));
        }

        let proof_len = u32::from_be_bytes(reader.array()?) as usize;
        let proof_bytes = reader.take(proof_len)?.to_vec();
        let proof_hash = hex::encode(reader.take(HASH_LEN)?);

        let batch_id = u64::from_le_bytes(reader.array()?);
        let width = u32::from_le_bytes(reader.array()?) as usize;
        let num_real_txs = u32::from_le_bytes(reader.array()?) as usize;
        let proving_time_ms = u64::from_le_bytes(reader.array()?);
        let trace_length = u64::from_le_bytes(reader.array()?) as usize;
        let proof_size = u64::from_le_bytes(reader.array()?) as usize;
        let version_len = reader.u8()? as usize;
        let prover_version = String::from_utf8(reader.take(version_len)?.to_vec())
            .map_err(|e| SerializationError::InvalidMetadata(e.to_string()))?;

        let result = decode_proof_bytes(&proof_bytes)?;

        Ok(Self {
            version,
            proof: RollupProof {
                proof_bytes,
                proof_hash,
                result,
                metadata: RollupProofMetadata {
                    batch_id,
                    width,
                    num_real_txs,
                    proving_time_ms,
                    trace_length,
                    proof_size,
                    prover_version,
                },
            },
        })
    }
}

/// Bounds-checked cursor over a byte slice
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], SerializationError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(SerializationError::Truncated {
                needed: self.pos.saturating_add(len),
                actual: self.bytes.len(),
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], SerializationError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, SerializationError> {
        Ok(self.take(1)?[0])
    }
}
