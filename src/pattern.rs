//! Suffix-anchored recognizer for place names missing from the dictionary.
//!
//! A run of one to four Han characters followed by a geographic suffix
//! (山, 江, 州, 关, ...) is taken as a candidate place token.

use regex::Regex;

/// Characters that end a place name: mountains, rivers, lakes, prefectures,
/// passes, fords, etc.
pub const GEO_SUFFIXES: &[char] = &[
    '山', '江', '河', '湖', '川', '州', '郡', '县', '城', '关', '岭', '湾', '溪', '谷', '岛', '原',
    '津',
];

/// Build the candidate regex: `[一-龥]{1,4}(?:山|江|...)`.
pub fn build_suffix_regex() -> String {
    let alts: Vec<String> = GEO_SUFFIXES.iter().map(|c| c.to_string()).collect();
    format!("[一-龥]{{1,4}}(?:{})", alts.join("|"))
}

pub struct PatternMatcher {
    re_candidate: Regex,
}

impl PatternMatcher {
    pub fn new() -> Self {
        PatternMatcher {
            re_candidate: Regex::new(&build_suffix_regex()).expect("candidate regex"),
        }
    }

    /// Candidates in left-to-right order. After each hit the scan resumes at
    /// the next suffix character inside it, so every suffix position can
    /// open a new candidate: `华山黄河` yields `华山黄河` and `山黄河`.
    pub fn find_candidates(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut pos = 0;
        while let Some(m) = self.re_candidate.find_at(text, pos) {
            let hit = m.as_str();
            out.push(hit.to_string());
            // A hit ends in a suffix and has at least one prefix char, so a
            // suffix after the first char always exists.
            pos = hit
                .char_indices()
                .skip(1)
                .find(|(_, c)| GEO_SUFFIXES.contains(c))
                .map_or(m.end(), |(i, _)| m.start() + i);
        }
        out
    }
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_candidate() {
        let pm = PatternMatcher::new();
        assert_eq!(pm.find_candidates("敬亭山"), vec!["敬亭山"]);
    }

    #[test]
    fn test_punctuation_breaks_runs() {
        let pm = PatternMatcher::new();
        let c = pm.find_candidates("独坐敬亭山。孤帆远影碧空尽，唯见长江天际流。");
        assert_eq!(c, vec!["独坐敬亭山", "唯见长江"]);
    }

    #[test]
    fn test_suffix_closes_longest_prefix() {
        let pm = PatternMatcher::new();
        let c = pm.find_candidates("泰山河");
        assert_eq!(c, vec!["泰山河", "山河"]);
        let c = pm.find_candidates("岳州城");
        assert_eq!(c, vec!["岳州城", "州城"]);
        let c = pm.find_candidates("黄州，庐山");
        assert_eq!(c, vec!["黄州", "庐山"]);
    }

    #[test]
    fn test_overlapping_hits() {
        let pm = PatternMatcher::new();
        // 州 and 城 each open a candidate of their own.
        let c = pm.find_candidates("苏州城外寒山");
        assert_eq!(c, vec!["苏州城", "州城外寒山", "城外寒山"]);
    }

    #[test]
    fn test_inner_suffix_opens_candidate() {
        let pm = PatternMatcher::new();
        assert_eq!(pm.find_candidates("华山黄河"), vec!["华山黄河", "山黄河"]);
    }

    #[test]
    fn test_lone_suffix_is_not_a_candidate() {
        let pm = PatternMatcher::new();
        assert!(pm.find_candidates("山").is_empty());
        assert!(pm.find_candidates("，江。").is_empty());
        assert!(pm.find_candidates("").is_empty());
    }
}
