//! Storage key derivation for relayed files.
//!
//! A key keeps every "."-delimited segment of the requested filename after the first, and
//! replaces the first segment with `{unix_seconds}_{index}`. The batch index keeps keys
//! distinct when several files of one batch are relayed within the same second.

/// Derive the object key for `filename` at position `index` of a batch, at time `now_secs`.
///
/// ```
/// use ossrelay::relay::naming::timestamped_object_key;
///
/// assert_eq!(timestamped_object_key("ComfyUI_00001_.png", 3, 1_700_000_000), "1700000000_3.png");
/// assert_eq!(timestamped_object_key("mesh.draco.glb", 0, 1_700_000_000), "1700000000_0.draco.glb");
/// assert_eq!(timestamped_object_key("", 1, 1_700_000_000), "1700000000_1");
/// ```
pub fn timestamped_object_key(filename: &str, index: usize, now_secs: i64) -> String {
    let token = format!("{now_secs}_{index}");

    match filename.split_once('.') {
        Some((_, extensions)) => format!("{token}.{extensions}"),
        None => token,
    }
}

/// [`timestamped_object_key`] evaluated at the current wall-clock second.
pub fn object_key_for(filename: &str, index: usize) -> String {
    timestamped_object_key(filename, index, chrono::Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_extension_chain_is_preserved() {
        let filenames = ["a.png", "ComfyUI_00001_.png", "scene.v2.final.glb", "archive.tar.gz", "a..b"];

        for filename in filenames {
            let key = timestamped_object_key(filename, 0, NOW);
            let original: Vec<&str> = filename.split('.').skip(1).collect();
            let derived: Vec<&str> = key.split('.').skip(1).collect();
            assert_eq!(original, derived, "extensions of {filename} changed in {key}");
        }
    }

    #[test]
    fn test_base_name_is_replaced() {
        assert_eq!(timestamped_object_key("photo.jpeg", 7, NOW), "1700000000_7.jpeg");
    }

    #[test]
    fn test_distinct_indices_give_distinct_keys_within_one_second() {
        let keys: Vec<String> = (0..50).map(|i| timestamped_object_key("same.png", i, NOW)).collect();

        let mut deduped = keys.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), keys.len());
    }

    #[test]
    fn test_filename_without_extension() {
        assert_eq!(timestamped_object_key("README", 2, NOW), "1700000000_2");
    }

    #[test]
    fn test_empty_filename() {
        assert_eq!(timestamped_object_key("", 0, NOW), "1700000000_0");
    }

    #[test]
    fn test_leading_dot_keeps_extension() {
        assert_eq!(timestamped_object_key(".png", 0, NOW), "1700000000_0.png");
    }

    #[test]
    fn test_object_key_for_uses_current_time() {
        let before = chrono::Utc::now().timestamp();
        let key = object_key_for("a.png", 4);
        let after = chrono::Utc::now().timestamp();

        let (token, ext) = key.split_once('.').unwrap();
        let (secs, index) = token.split_once('_').unwrap();
        let secs: i64 = secs.parse().unwrap();

        assert!(before <= secs && secs <= after);
        assert_eq!(index, "4");
        assert_eq!(ext, "png");
    }
}
