use std::sync::atomic::{AtomicU64, Ordering};

const TMP_PREFIX: &str = "tmp-";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Id for an item created locally before the store has assigned one.
pub(crate) fn make_tmp_id() -> String {
    let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut buf = [0u8; 4];
    // The counter alone keeps ids distinct within one page.
    let _ = getrandom::getrandom(&mut buf);
    format!("{TMP_PREFIX}{n}-{:08x}", u32::from_le_bytes(buf))
}

pub(crate) fn is_tmp_id(id: &str) -> bool {
    id.starts_with(TMP_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tmp_ids_are_distinct_and_recognised() {
        let a = make_tmp_id();
        let b = make_tmp_id();
        assert_ne!(a, b);
        assert!(is_tmp_id(&a));
        assert!(!is_tmp_id("clx1abc"));
    }
}
