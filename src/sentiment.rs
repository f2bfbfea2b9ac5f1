//! Sentiment scoring: an external base polarity adjusted by fixed emotional
//! keyword dimensions, plus thematic tagging.

use std::collections::BTreeMap;

use poem_types::SentimentLabel;
use tracing::warn;

use crate::services::PolarityScorer;

/// Texts shorter than this (in chars) are scored neutral without analysis.
const MIN_TEXT_CHARS: usize = 5;
const NEUTRAL_SCORE: f64 = 0.5;
const EMOTION_HIT_SCORE: f64 = 0.2;
const THEME_HIT_SCORE: f64 = 0.1;
/// How much of a dimension's keyword score moves the base score.
const ADJUST_FACTOR: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    Uplift,
    Depress,
    RecordOnly,
}

struct EmotionDimension {
    name: &'static str,
    keywords: &'static [&'static str],
    weight: f64,
    effect: Effect,
}

const EMOTIONS: &[EmotionDimension] = &[
    EmotionDimension {
        name: "bold",
        keywords: &["壮志", "豪情", "激昂", "雄心", "豪迈", "气吞万里", "气势磅礴", "英雄", "慷慨"],
        weight: 0.8,
        effect: Effect::Uplift,
    },
    EmotionDimension {
        name: "delicate",
        keywords: &["柔情", "细腻", "温柔", "轻盈", "娇羞", "纤细", "温婉", "含蓄", "委婉"],
        weight: 0.6,
        effect: Effect::RecordOnly,
    },
    EmotionDimension {
        name: "melancholic",
        keywords: &["哀愁", "悲伤", "惆怅", "凄凉", "寂寞", "孤独", "伤感", "悲凉", "萧瑟"],
        weight: 0.2,
        effect: Effect::Depress,
    },
    EmotionDimension {
        name: "positive",
        keywords: &["希望", "光明", "美好", "温暖", "快乐", "喜悦", "激动", "振奋", "欢欣"],
        weight: 0.9,
        effect: Effect::Uplift,
    },
    EmotionDimension {
        name: "negative",
        keywords: &["绝望", "黑暗", "痛苦", "悲观", "失落", "压抑", "无助", "哀叹"],
        weight: 0.1,
        effect: Effect::Depress,
    },
];

const THEMES: &[(&str, &[&str])] = &[
    ("war", &["战", "战地", "战亡", "征", "破", "军", "兵", "将"]),
    ("nature", &["山", "水", "云", "雨", "雪", "风", "月", "天", "地"]),
    ("season", &["春", "夏", "秋", "冬", "初春", "初夏", "晚秋"]),
    ("emotion", &["思", "怀", "志", "感", "意", "心", "情"]),
    ("history", &["汉", "唐", "宋", "志", "续", "古", "今"]),
];

/// Score recorded for one emotional dimension or theme.
#[derive(Debug, Clone, PartialEq)]
pub enum DimensionScore {
    Emotion { keyword_score: f64, weight: f64 },
    Theme(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentimentResult {
    pub base_score: f64,
    pub label: SentimentLabel,
    pub dimensions: BTreeMap<String, DimensionScore>,
}

impl SentimentResult {
    fn neutral() -> Self {
        SentimentResult {
            base_score: NEUTRAL_SCORE,
            label: SentimentLabel::Neutral,
            dimensions: BTreeMap::new(),
        }
    }
}

pub fn label_for(score: f64) -> SentimentLabel {
    if score > 0.7 {
        SentimentLabel::Positive
    } else if score > 0.4 {
        SentimentLabel::PositiveNeutral
    } else if score > 0.3 {
        SentimentLabel::Neutral
    } else if score > 0.1 {
        SentimentLabel::NegativeNeutral
    } else {
        SentimentLabel::Negative
    }
}

/// Total non-overlapping occurrences of all keywords.
fn keyword_hits(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().map(|k| text.matches(k).count()).sum()
}

pub struct SentimentScorer<'a> {
    polarity: &'a dyn PolarityScorer,
}

impl<'a> SentimentScorer<'a> {
    pub fn new(polarity: &'a dyn PolarityScorer) -> Self {
        SentimentScorer { polarity }
    }

    pub fn score(&self, text: &str) -> SentimentResult {
        if text.chars().count() < MIN_TEXT_CHARS {
            return SentimentResult::neutral();
        }

        let mut base = match self.polarity.score(text) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "polarity scorer failed, using neutral base score");
                NEUTRAL_SCORE
            }
        };
        let mut dimensions = BTreeMap::new();

        for dim in EMOTIONS {
            let keyword_score = keyword_hits(text, dim.keywords) as f64 * EMOTION_HIT_SCORE;
            if keyword_score <= 0.0 {
                continue;
            }
            dimensions.insert(
                dim.name.to_string(),
                DimensionScore::Emotion {
                    keyword_score,
                    weight: dim.weight,
                },
            );
            match dim.effect {
                Effect::Uplift => base += keyword_score * ADJUST_FACTOR,
                Effect::Depress => base -= keyword_score * ADJUST_FACTOR,
                Effect::RecordOnly => {}
            }
        }

        for (theme, keywords) in THEMES {
            let theme_score = keyword_hits(text, keywords) as f64 * THEME_HIT_SCORE;
            if theme_score > 0.0 {
                dimensions.insert(theme.to_string(), DimensionScore::Theme(theme_score));
            }
        }

        let base_score = base.clamp(0.0, 1.0);
        SentimentResult {
            base_score,
            label: label_for(base_score),
            dimensions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};

    struct Fixed(f64);

    impl PolarityScorer for Fixed {
        fn score(&self, _text: &str) -> Result<f64> {
            Ok(self.0)
        }
    }

    struct Broken;

    impl PolarityScorer for Broken {
        fn score(&self, _text: &str) -> Result<f64> {
            Err(Error::service("polarity", "model missing"))
        }
    }

    #[test]
    fn test_short_text_is_neutral() {
        let scorer = SentimentScorer::new(&Fixed(0.99));
        for text in ["", "悲", " 愁苦", "绝望痛"] {
            let r = scorer.score(text);
            assert_eq!(r.base_score, 0.5, "{text}");
            assert_eq!(r.label, SentimentLabel::Neutral);
            assert!(r.dimensions.is_empty());
        }
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(label_for(0.71), SentimentLabel::Positive);
        assert_eq!(label_for(0.7), SentimentLabel::PositiveNeutral);
        assert_eq!(label_for(0.41), SentimentLabel::PositiveNeutral);
        assert_eq!(label_for(0.4), SentimentLabel::Neutral);
        assert_eq!(label_for(0.3), SentimentLabel::NegativeNeutral);
        assert_eq!(label_for(0.1), SentimentLabel::Negative);
        assert_eq!(label_for(0.0), SentimentLabel::Negative);
    }

    #[test]
    fn test_uplifting_keywords_raise_score() {
        let scorer = SentimentScorer::new(&Fixed(0.5));
        // 英雄 twice → keyword_score 0.4 → +0.04
        let r = scorer.score("赠友 英雄出少年，英雄何处寻");
        assert!((r.base_score - 0.54).abs() < 1e-9, "{}", r.base_score);
        match &r.dimensions["bold"] {
            DimensionScore::Emotion {
                keyword_score,
                weight,
            } => {
                assert!((keyword_score - 0.4).abs() < 1e-9);
                assert_eq!(*weight, 0.8);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_depressive_keywords_lower_score() {
        let scorer = SentimentScorer::new(&Fixed(0.5));
        let r = scorer.score("夜坐 孤独惆怅到天明");
        // 孤独 + 惆怅 → 0.4 → -0.04
        assert!((r.base_score - 0.46).abs() < 1e-9);
        assert!(r.dimensions.contains_key("melancholic"));
    }

    #[test]
    fn test_delicate_only_records() {
        let scorer = SentimentScorer::new(&Fixed(0.5));
        let r = scorer.score("春闺 柔情似水佳期如梦");
        assert_eq!(r.base_score, 0.5);
        assert!(r.dimensions.contains_key("delicate"));
    }

    #[test]
    fn test_themes_recorded_without_adjustment() {
        let scorer = SentimentScorer::new(&Fixed(0.5));
        let r = scorer.score("秋夕 秋风秋雨");
        assert_eq!(r.base_score, 0.5);
        match &r.dimensions["season"] {
            DimensionScore::Theme(s) => assert!((s - 0.3).abs() < 1e-9),
            other => panic!("unexpected {other:?}"),
        }
        assert!(r.dimensions.contains_key("nature"));
        assert!(!r.dimensions.contains_key("war"));
    }

    #[test]
    fn test_score_is_clamped() {
        let scorer = SentimentScorer::new(&Fixed(0.98));
        let r = scorer.score("壮志豪情激昂雄心豪迈英雄慷慨希望光明");
        assert_eq!(r.base_score, 1.0);
        assert_eq!(r.label, SentimentLabel::Positive);

        let scorer = SentimentScorer::new(&Fixed(0.02));
        let r = scorer.score("绝望黑暗痛苦悲观失落压抑无助哀叹");
        assert_eq!(r.base_score, 0.0);
        assert_eq!(r.label, SentimentLabel::Negative);
    }

    #[test]
    fn test_failed_polarity_uses_neutral_base() {
        let scorer = SentimentScorer::new(&Broken);
        let r = scorer.score("登高 无边落木萧萧下");
        assert_eq!(r.base_score, 0.5);
        assert_eq!(r.label, SentimentLabel::PositiveNeutral);
    }
}
