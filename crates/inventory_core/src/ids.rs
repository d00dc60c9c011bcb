use rand::{rngs::StdRng, Rng, SeedableRng};
use shared::domain::{Product, ProductId};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SKU_BASE_LEN: usize = 6;
const SKU_FALLBACK_BASE: &str = "PRD";
const RANDOM_SUFFIX_LEN: usize = 4;

/// Issues product ids and SKUs.
///
/// Ids are `p_<stamp><rand>` where `stamp` is a base-36 millisecond value that
/// strictly increases for every id this generator hands out, and is bumped
/// further while the candidate is already present in the live list.
pub struct IdGenerator {
    rng: StdRng,
    last_stamp: i64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            last_stamp: 0,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            last_stamp: 0,
        }
    }

    pub fn product_id(&mut self, now_millis: i64, live: &[Product]) -> ProductId {
        let mut stamp = now_millis.max(self.last_stamp + 1).max(0);
        loop {
            // The suffix has a fixed width, so distinct stamps never produce
            // equal ids.
            let candidate = format!(
                "p_{}{}",
                to_base36(stamp as u64),
                self.random_base36(RANDOM_SUFFIX_LEN)
            );
            if !live.iter().any(|p| p.id.as_str() == candidate) {
                self.last_stamp = stamp;
                return ProductId(candidate);
            }
            stamp += 1;
        }
    }

    /// Up to six uppercase alphanumerics from `name` (or `PRD`), a dash and a
    /// random four character suffix. Not unique.
    pub fn sku(&mut self, name: &str) -> String {
        let suffix = self.random_base36(RANDOM_SUFFIX_LEN).to_ascii_uppercase();
        format!("{}-{suffix}", sku_base(name))
    }

    fn random_base36(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| char::from(BASE36[self.rng.random_range(0..BASE36.len())]))
            .collect()
    }
}

pub fn sku_base(name: &str) -> String {
    let base: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(SKU_BASE_LEN)
        .collect::<String>()
        .to_ascii_uppercase();
    if base.is_empty() {
        SKU_FALLBACK_BASE.to_string()
    } else {
        base
    }
}

pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
#[path = "tests/ids_tests.rs"]
mod tests;
