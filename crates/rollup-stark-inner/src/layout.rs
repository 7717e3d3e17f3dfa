//! Fixed public-input layout shared by every inner proof kind

/// Number of assets with a fee slot in the rollup
pub const NUM_ASSETS: usize = 4;

/// Number of public field elements exposed by an inner proof
pub const NUM_INNER_PUBLIC_INPUTS: usize = 30;

/// Element offsets within the inner public-input vector
pub mod inner_pi {
    pub const PROOF_KIND: usize = 0;
    pub const PUBLIC_INPUT: usize = 1;
    pub const PUBLIC_OUTPUT: usize = 2;
    pub const ASSET_ID: usize = 3;
    pub const NEW_NOTE1: usize = 4;
    pub const NEW_NOTE2: usize = 8;
    pub const NULLIFIER1: usize = 12;
    pub const NULLIFIER2: usize = 16;
    pub const INPUT_OWNER: usize = 20;
    pub const OUTPUT_OWNER: usize = 24;
    pub const TX_FEE: usize = 28;
    pub const INTERACTION_NONCE: usize = 29;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_dense() {
        use inner_pi::*;
        let spans = [
            (PROOF_KIND, 1),
            (PUBLIC_INPUT, 1),
            (PUBLIC_OUTPUT, 1),
            (ASSET_ID, 1),
            (NEW_NOTE1, 4),
            (NEW_NOTE2, 4),
            (NULLIFIER1, 4),
            (NULLIFIER2, 4),
            (INPUT_OWNER, 4),
            (OUTPUT_OWNER, 4),
            (TX_FEE, 1),
            (INTERACTION_NONCE, 1),
        ];
        let mut next = 0;
        for (start, len) in spans {
            assert_eq!(start, next, "gap or overlap at offset {start}");
            next += len;
        }
        assert_eq!(next, NUM_INNER_PUBLIC_INPUTS);
    }
}
