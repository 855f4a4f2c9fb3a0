use crate::config::types::ChannelMode;
use std::collections::HashSet;

pub const BROADBAND_PREFIXES: [&str; 3] = ["LH", "BH", "HH"];
pub const SHORT_PERIOD_PREFIXES: [&str; 2] = ["EH", "SH"];

/// Temporary deployments conventionally get 1-2 character codes starting with X, Y or Z.
pub fn is_temporary_network(code: &str) -> bool {
    let code = code.trim();
    let len = code.chars().count();
    (1..=2).contains(&len)
        && code
            .chars()
            .next()
            .map(|c| matches!(c.to_ascii_uppercase(), 'X' | 'Y' | 'Z'))
            .unwrap_or(false)
}

/// Normalises, deduplicates and filters candidate networks, preserving order.
/// Temporary codes survive only when allow-listed.
pub fn included_networks(candidates: &[String], allow_temporary: &[String]) -> Vec<String> {
    let allowed: HashSet<String> = allow_temporary.iter().map(|c| normalize(c)).collect();
    let mut seen = HashSet::new();

    candidates
        .iter()
        .map(|c| normalize(c))
        .filter(|code| !code.is_empty())
        .filter(|code| seen.insert(code.clone()))
        .filter(|code| !is_temporary_network(code) || allowed.contains(code))
        .collect()
}

/// Channel prefixes from the allow-list that the mode permits, in allow-list order.
pub fn included_channel_prefixes(allow_list: &[String], mode: ChannelMode) -> Vec<String> {
    let mut seen = HashSet::new();

    allow_list
        .iter()
        .map(|p| normalize(p))
        .filter(|prefix| match mode {
            ChannelMode::Broadband => BROADBAND_PREFIXES.contains(&prefix.as_str()),
            ChannelMode::All => {
                BROADBAND_PREFIXES.contains(&prefix.as_str())
                    || SHORT_PERIOD_PREFIXES.contains(&prefix.as_str())
            }
        })
        .filter(|prefix| seen.insert(prefix.clone()))
        .collect()
}

pub(crate) fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_temporary_heuristic() {
        for code in ["X", "Y", "Z", "XO", "Y7", "ZP", "xq"] {
            assert!(is_temporary_network(code), "{} should be temporary", code);
        }
        for code in ["OK", "US", "N4", "TA", "IU", "O2", "XYZ", "", "AX"] {
            assert!(!is_temporary_network(code), "{} should be permanent", code);
        }
    }

    #[test]
    fn test_heuristic_over_all_two_letter_codes() {
        let alphabet: Vec<char> = ('A'..='Z').chain('0'..='9').collect();
        for &first in &alphabet {
            let single = first.to_string();
            assert_eq!(is_temporary_network(&single), matches!(first, 'X' | 'Y' | 'Z'));
            for &second in &alphabet {
                let code: String = [first, second].iter().collect();
                let included = included_networks(&[code.clone()], &[]);
                if matches!(first, 'X' | 'Y' | 'Z') {
                    assert!(included.is_empty(), "{} not excluded", code);
                    let allowed = included_networks(&[code.clone()], &[code.clone()]);
                    assert_eq!(allowed, vec![code.clone()]);
                } else {
                    assert_eq!(included, vec![code.clone()]);
                }
            }
        }
    }

    #[test]
    fn test_allow_list_keeps_y7_but_not_xq() {
        let included = included_networks(&codes(&["OK", "Y7", "XQ", "US"]), &codes(&["Y7", "ZP"]));
        assert_eq!(included, codes(&["OK", "Y7", "US"]));
    }

    #[test]
    fn test_networks_are_normalized_and_deduplicated() {
        let included = included_networks(&codes(&[" ok", "OK", "us ", "zp"]), &codes(&["Zp"]));
        assert_eq!(included, codes(&["OK", "US", "ZP"]));
    }

    #[test]
    fn test_channel_modes() {
        let allow = codes(&["LH", "BH", "HH", "EH", "SH"]);
        assert_eq!(
            included_channel_prefixes(&allow, ChannelMode::All),
            codes(&["LH", "BH", "HH", "EH", "SH"])
        );
        assert_eq!(
            included_channel_prefixes(&allow, ChannelMode::Broadband),
            codes(&["LH", "BH", "HH"])
        );
        assert!(included_channel_prefixes(&codes(&["EH"]), ChannelMode::Broadband).is_empty());
        assert!(included_channel_prefixes(&codes(&["HN"]), ChannelMode::All).is_empty());
    }
}
