//! WBI request signing for the signed space search endpoint.
//!
//! The provider publishes two rotating keys through the nav endpoint; a
//! fixed permutation of their concatenation yields the mixin key, and each
//! signed request carries `wts` (unix seconds) and `w_rid`, the MD5 of the
//! sorted, percent-encoded query followed by the mixin key.

const MIXIN_KEY_ENC_TAB: [usize; 64] = [
    46, 47, 18, 2, 53, 8, 23, 32, 15, 50, 10, 31, 58, 3, 45, 35, 27, 43, 5, 49, 33, 9, 42, 19, 29,
    28, 14, 39, 12, 38, 41, 13, 37, 48, 7, 16, 24, 55, 40, 61, 26, 17, 0, 1, 60, 51, 30, 4, 22, 25,
    54, 21, 56, 59, 6, 63, 57, 62, 11, 36, 20, 34, 44, 52,
];

/// Characters the provider strips from values before signing.
const STRIPPED_CHARS: [char; 5] = ['!', '\'', '(', ')', '*'];

/// Derive the 32-character mixin key from the image and sub keys.
pub fn mixin_key(img_key: &str, sub_key: &str) -> String {
    let raw: Vec<char> = img_key.chars().chain(sub_key.chars()).collect();
    MIXIN_KEY_ENC_TAB
        .iter()
        .filter_map(|&i| raw.get(i))
        .take(32)
        .collect()
}

/// Extract a key from a nav image URL (`…/wbi/<key>.png`).
pub fn key_from_url(url: &str) -> Option<String> {
    let file = url.rsplit('/').next()?;
    let key = file.split('.').next()?;
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

/// Sign query parameters, returning the sorted parameters with `wts` and `w_rid`.
pub fn sign(params: &[(String, String)], mixin_key: &str, wts: i64) -> Vec<(String, String)> {
    let mut signed: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (k.clone(), v.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect()))
        .collect();
    signed.push(("wts".to_string(), wts.to_string()));
    signed.sort_by(|a, b| a.0.cmp(&b.0));

    let query = signed
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    let w_rid = format!("{:x}", md5::compute(format!("{}{}", query, mixin_key)));

    signed.push(("w_rid".to_string(), w_rid));
    signed
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMG_KEY: &str = "7cd084941338484aae1ad9425b84077c";
    const SUB_KEY: &str = "4932caff0ff746eab6f01bf08b70ac45";

    #[test]
    fn test_mixin_key() {
        assert_eq!(
            mixin_key(IMG_KEY, SUB_KEY),
            "ea1db124af3c7062474693fa704f4ff8"
        );
    }

    #[test]
    fn test_mixin_key_short_input() {
        assert!(mixin_key("abc", "def").len() <= 6);
    }

    #[test]
    fn test_key_from_url() {
        assert_eq!(
            key_from_url("https://i0.hdslb.com/bfs/wbi/7cd084941338484aae1ad9425b84077c.png"),
            Some(IMG_KEY.to_string())
        );
        assert_eq!(key_from_url("https://example.com/"), None);
    }

    #[test]
    fn test_sign_known_vector() {
        let params = vec![
            ("foo".to_string(), "114".to_string()),
            ("bar".to_string(), "514".to_string()),
            ("zab".to_string(), "1919810".to_string()),
        ];
        let signed = sign(&params, &mixin_key(IMG_KEY, SUB_KEY), 1702204169);

        let keys: Vec<&str> = signed.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["bar", "foo", "wts", "zab", "w_rid"]);
        assert_eq!(signed[4].1, "8f6f2b5b3d485fe1886cec6a0be8c5d4");
    }

    #[test]
    fn test_sign_strips_reserved_chars() {
        let params = vec![("keyword".to_string(), "(hello)!*".to_string())];
        let signed = sign(&params, "k", 1);
        assert_eq!(signed[0].1, "hello");
    }
}
