use meridian_core::{hash_blake3, merkle_root, Hash};

/// Compute state root from key-value pairs
/// Uses sorted keys for determinism
pub fn compute_state_root<'a, I>(entries: I) -> Hash
where
    I: IntoIterator<Item = (&'a [u8], &'a [u8])>,
{
    let mut sorted: Vec<_> = entries.into_iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    // Length-prefix the key so ("ab","c") and ("a","bc") hash apart
    let leaves: Vec<Hash> = sorted
        .iter()
        .map(|(k, v)| {
            let mut data = Vec::with_capacity(8 + k.len() + v.len());
            data.extend_from_slice(&(k.len() as u64).to_be_bytes());
            data.extend_from_slice(k);
            data.extend_from_slice(v);
            hash_blake3(&data)
        })
        .collect();

    merkle_root(&leaves)
}
