//! Rescue-Prime Hash Function
//!
//! Rescue-Prime over Goldilocks with a state of 12 elements:
//! - Rate: 8 elements
//! - Capacity: 4 elements
//! - Rounds: 7, S-box x^7
//!
//! One round is `s <- MDS * s^7 + C1[r]` followed by `s <- (MDS * s)^(1/7) + C2[r]`.
//! Written that way, a round can be checked inside an AIR as the degree-7 relation
//! `(next - C2[r])^7 == MDS * (MDS * cur^7 + C1[r])`, see [`round_residual`].
//!
//! Round constants are derived from SHA-256 under a fixed domain tag.

use std::sync::OnceLock;

use winter_math::FieldElement;

use crate::digest::{Digest, DIGEST_SIZE};
use crate::field::{felt_from_bytes_le, felt_from_u64, Felt, FELT_ZERO};
use crate::hash::Hash256;

/// Number of rounds in Rescue-Prime
pub const NUM_ROUNDS: usize = 7;

/// State width (rate + capacity)
pub const STATE_WIDTH: usize = 12;

/// Rate (absorb/squeeze size)
pub const RATE: usize = 8;

/// Capacity (security portion)
pub const CAPACITY: usize = 4;

/// S-box exponent (alpha)
pub const ALPHA: u64 = 7;

/// Inverse S-box exponent: alpha * alpha_inv = 1 (mod p - 1)
pub const ALPHA_INV: u64 = 10540996611094048183;

/// Domain tag for round-constant derivation
const ARK_DOMAIN: &[u8] = b"ROLLUP_STARK_RESCUE_ARK_V1";

/// First row of the circulant MDS matrix
const MDS_FIRST_ROW: [u64; STATE_WIDTH] = [7, 23, 8, 26, 13, 10, 9, 7, 6, 22, 21, 8];

/// Circulant MDS matrix: `MDS[i][j] = MDS_FIRST_ROW[(j - i) mod 12]`
pub const MDS: [[u64; STATE_WIDTH]; STATE_WIDTH] = circulant(MDS_FIRST_ROW);

/// Rescue state type
pub type RescueState = [Felt; STATE_WIDTH];

/// Round constants: `[2 * round]` is C1 (forward half), `[2 * round + 1]` is C2
pub type RoundConstants = [[Felt; STATE_WIDTH]; 2 * NUM_ROUNDS];

const fn circulant(row: [u64; STATE_WIDTH]) -> [[u64; STATE_WIDTH]; STATE_WIDTH] {
    let mut m = [[0u64; STATE_WIDTH]; STATE_WIDTH];
    let mut i = 0;
    while i < STATE_WIDTH {
        let mut j = 0;
        while j < STATE_WIDTH {
            m[i][j] = row[(j + STATE_WIDTH - i) % STATE_WIDTH];
            j += 1;
        }
        i += 1;
    }
    m
}

/// Round constants, derived once per process
pub fn round_constants() -> &'static RoundConstants {
    static CONSTANTS: OnceLock<RoundConstants> = OnceLock::new();
    CONSTANTS.get_or_init(|| {
        let mut constants = [[FELT_ZERO; STATE_WIDTH]; 2 * NUM_ROUNDS];
        for (step, row) in constants.iter_mut().enumerate() {
            for (i, c) in row.iter_mut().enumerate() {
                let tag = Hash256::sha256_with_domain(ARK_DOMAIN, &[step as u8, i as u8]);
                *c = felt_from_bytes_le(&tag.as_bytes()[..8]);
            }
        }
        constants
    })
}

/// Create a zero state
pub fn state_zero() -> RescueState {
    [FELT_ZERO; STATE_WIDTH]
}

/// Forward S-box (x^7), generic so AIR code can share it
#[inline]
pub fn sbox<E: FieldElement>(x: E) -> E {
    let x2 = x * x;
    let x4 = x2 * x2;
    x4 * x2 * x
}

/// Inverse S-box (x^alpha_inv)
#[inline]
pub fn sbox_inv(x: Felt) -> Felt {
    x.exp(ALPHA_INV)
}

/// Multiply a state by the MDS matrix
pub fn mds_multiply<E: FieldElement<BaseField = Felt>>(state: &[E; STATE_WIDTH]) -> [E; STATE_WIDTH] {
    let mut result = [E::ZERO; STATE_WIDTH];
    for (out, row) in result.iter_mut().zip(MDS.iter()) {
        for (&coeff, &s) in row.iter().zip(state.iter()) {
            *out += E::from(felt_from_u64(coeff)) * s;
        }
    }
    result
}

/// Apply round `round` of the permutation in place
pub fn apply_round(state: &mut RescueState, round: usize) {
    let ark = round_constants();

    for s in state.iter_mut() {
        *s = sbox(*s);
    }
    *state = mds_multiply(state);
    for (s, &c) in state.iter_mut().zip(ark[2 * round].iter()) {
        *s += c;
    }

    *state = mds_multiply(state);
    for (s, &c) in state.iter_mut().zip(ark[2 * round + 1].iter()) {
        *s = sbox_inv(*s) + c;
    }
}

/// Residual of the round relation between two consecutive states
///
/// Evaluates `(next - C2)^7 - MDS * (MDS * cur^7 + C1)` element-wise; all zero iff
/// `next` is round `r` applied to `cur`. The constants are passed in so an AIR can
/// feed them from periodic columns.
pub fn round_residual<E: FieldElement<BaseField = Felt>>(
    cur: &[E],
    next: &[E],
    c1: &[E],
    c2: &[E],
    result: &mut [E],
) {
    let mut forward = [E::ZERO; STATE_WIDTH];
    for (f, &x) in forward.iter_mut().zip(cur.iter()) {
        *f = sbox(x);
    }
    let mut mixed = mds_multiply(&forward);
    for (m, &c) in mixed.iter_mut().zip(c1.iter()) {
        *m += c;
    }
    let expected = mds_multiply(&mixed);

    for i in 0..STATE_WIDTH {
        result[i] = sbox(next[i] - c2[i]) - expected[i];
    }
}

/// Apply the full Rescue-Prime permutation
pub fn rescue_permutation(state: &mut RescueState) {
    for round in 0..NUM_ROUNDS {
        apply_round(state, round);
    }
}

/// Hash a sequence of field elements with the Rescue-Prime sponge
pub fn rescue_hash(input: &[Felt]) -> Digest {
    let mut state = state_zero();

    // Length in the first capacity element for domain separation
    state[RATE] = felt_from_u64(input.len() as u64);

    for chunk in input.chunks(RATE) {
        for (s, &elem) in state.iter_mut().zip(chunk.iter()) {
            *s += elem;
        }
        rescue_permutation(&mut state);
    }

    if input.is_empty() {
        rescue_permutation(&mut state);
    }

    [state[0], state[1], state[2], state[3]]
}

/// Sponge state for a Merkle node before the permutation
///
/// Identical to what [`rescue_hash`] absorbs for an 8-element input.
pub fn node_input_state(left: &Digest, right: &Digest) -> RescueState {
    let mut state = state_zero();
    state[..DIGEST_SIZE].copy_from_slice(left);
    state[DIGEST_SIZE..RATE].copy_from_slice(right);
    state[RATE] = felt_from_u64(RATE as u64);
    state
}

/// Hash two digests (Merkle tree nodes)
pub fn rescue_hash_pair(left: &Digest, right: &Digest) -> Digest {
    let mut state = node_input_state(left, right);
    rescue_permutation(&mut state);
    [state[0], state[1], state[2], state[3]]
}
