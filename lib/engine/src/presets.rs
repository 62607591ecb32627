//! Ready-made configurations for the bundled knowledge-base shapes

use crate::config::{EngineConfig, Messages};
use crate::overrides::{KeywordOverride, OverrideTrigger};
use kbquery_core::{CategoryRule, FieldRef, FieldVocabulary, KeywordTables, RecordSchema, TagKind};
use kbquery_core::{Error, Result};
use kbquery_similarity::Metric;

pub const BUSAN_DISTRICTS: [&str; 14] = [
    "동래구", "사하구", "금정구", "서구", "북구", "수영구", "부산진구", "강서구",
    "남구", "영도구", "기장군", "사상구", "해운대구", "동구",
];

pub const HISTORICAL_ERAS: [&str; 11] = [
    "선사", "삼국", "가야", "신라", "통일신라", "고려", "조선", "대한제국",
    "일제강점기", "근대", "현대",
];

/// Words that make a population question nationwide
pub const NATIONWIDE_TAGS: [&str; 20] = [
    "시도", "전국", "대한민국", "우리나라",
    "경기도", "서울", "경상남도", "경상북도", "대구",
    "충청남도", "인천", "전라남도", "전북특별자치도", "충청북도",
    "강원도", "대전", "광주", "울산", "제주도", "세종",
];

pub const BUSAN_AREA_REPLY: &str = "부산 구군별 면적 순위를 비교하겠습니다. 단위는 제곱미터입니다.\n\n\
기장군 21.8만, 강서구 18.0만, 금정구 6.5만, 해운대구 5.1만,\n\
사하구 4.1만, 북구 3.9만, 사상구 3.6만, 부산진구 3.0만, 남구 2.7만,\n\
동래구 1.7만, 영도구 1.4만, 서구 1.4만, 연제구 1.2만, 수영구 1.0만,\n\
동구 1.0만, 중구 0.3만입니다.\n\n총 면적은 77001만 제곱미터입니다.";

pub const NATIONWIDE_POPULATION_REPLY: &str = "경기도 1,369.9만 명, 서울 933.6만 명, 부산 325.9만 명, \
경상남도 321.9만 명, 경상북도 252.3만 명, 대구 236.0만 명, \
충청남도 213.6만 명, 인천 303.1만 명, 전라남도 178.5만 명, \
전북특별자치도 173.4만 명, 충청북도 159.1만 명, 강원도 151.3만 명, \
대전 143.9만 명, 광주 140.2만 명, 울산 109.5만 명, 제주도 66.8만 명, \
세종 39.2만 명 순서입니다.";

/// Distance threshold for the presets. [`HashEmbedder`] vectors have unit
/// length, so squared distances fall in `[0, 4]` and unrelated text lands
/// around 1.8 to 2.0. A model with unnormalized output needs its own value,
/// e.g. [`Metric::default_threshold`].
///
/// [`HashEmbedder`]: kbquery_similarity::HashEmbedder
pub const HASHED_DISTANCE_THRESHOLD: f32 = 1.5;

pub const PRESET_NAMES: [&str; 5] = ["plain_text", "search_full", "heritage", "faq", "population"];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// One sentence per line, best match by distance.
pub fn plain_text() -> EngineConfig {
    EngineConfig::for_metric(Metric::SquaredEuclidean).with_threshold(HASHED_DISTANCE_THRESHOLD)
}

/// Records with a `search` sentence and a longer `full` answer. Season
/// questions only consider records that talk about seasons.
pub fn search_full() -> EngineConfig {
    EngineConfig {
        schema: RecordSchema::search_full(),
        keywords: KeywordTables {
            search_keywords: strings(&["계절"]),
            ..Default::default()
        },
        answer_field: Some("full".to_string()),
        ..plain_text()
    }
}

/// Cultural-heritage records filtered by category, district and era, never
/// repeating an item within a session.
pub fn heritage() -> EngineConfig {
    let mut config = EngineConfig::for_metric(Metric::Cosine);
    config.schema = RecordSchema::heritage();
    config.keywords = KeywordTables {
        categories: vec![
            CategoryRule::new(["유형문화유산"]),
            CategoryRule::new(["무형유산", "무형문화유산"]),
        ],
        regions: strings(&BUSAN_DISTRICTS),
        fields: vec![FieldVocabulary::new(
            "era",
            FieldRef::Tag(TagKind::Era),
            HISTORICAL_ERAS,
        )],
        search_keywords: Vec::new(),
    };
    config.filters.exclude_shown = true;
    config.tie_break_by_id = true;
    // whatever survives filtering is answered
    config.threshold = -1.0;
    config.messages = Messages {
        no_match: "더 이상 조건에 맞는 새로운 문화유산을 찾을 수 없습니다.".to_string(),
        ..Messages::default()
    };
    config
}

/// Category-keyed question/answer pairs, matched on the question.
pub fn faq() -> EngineConfig {
    EngineConfig {
        schema: RecordSchema::faq(),
        answer_field: Some("answer".to_string()),
        ..EngineConfig::for_metric(Metric::Cosine)
    }
}

/// District statistics with hand-written area and nationwide replies.
pub fn population() -> EngineConfig {
    EngineConfig {
        overrides: vec![
            KeywordOverride::new(OverrideTrigger::BeforeRetrieval, ["면적"], BUSAN_AREA_REPLY),
            KeywordOverride::new(
                OverrideTrigger::OnConfidentMatch,
                NATIONWIDE_TAGS,
                NATIONWIDE_POPULATION_REPLY,
            )
            .shadowed_by(BUSAN_DISTRICTS),
        ],
        messages: Messages {
            low_confidence: "질문이 잘 이해되지 않습니다. 다른 방식으로 질문해주세요.".to_string(),
            ..Messages::default()
        },
        ..plain_text()
    }
}

pub fn by_name(name: &str) -> Result<EngineConfig> {
    match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "plain_text" | "plain" | "text" => Ok(plain_text()),
        "search_full" | "search" => Ok(search_full()),
        "heritage" => Ok(heritage()),
        "faq" => Ok(faq()),
        "population" => Ok(population()),
        other => Err(Error::InvalidConfig(format!(
            "unknown preset '{}', expected one of {:?}",
            other, PRESET_NAMES
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbquery_core::FilterChain;

    #[test]
    fn test_all_presets_validate() {
        for name in PRESET_NAMES {
            let config = by_name(name).unwrap();
            config.validate().unwrap_or_else(|e| panic!("{}: {}", name, e));
        }
        assert!(matches!(by_name("nope"), Err(Error::InvalidConfig(_))));
        assert!(by_name("Search-Full").is_ok());
    }

    #[test]
    fn test_heritage_chain_order() {
        let config = heritage();
        let chain = FilterChain::from_config(&config.filters, &config.keywords);
        assert_eq!(
            chain.stage_names(),
            vec!["exclusion", "category", "region", "era", "search_keyword"]
        );
    }

    #[test]
    fn test_population_overrides() {
        let config = population();
        assert_eq!(config.overrides[0].when, OverrideTrigger::BeforeRetrieval);
        assert!(config.overrides[0].triggered_by("부산 면적 알려줘"));
        assert!(config.overrides[1].triggered_by("전국 인구 순위"));
        assert!(!config.overrides[1].triggered_by("해운대구 인구"));
        assert!(config.overrides[1].triggered_by("대구 인구"));
    }

    #[test]
    fn test_distance_presets_use_hashed_threshold() {
        for config in [plain_text(), search_full(), population()] {
            assert_eq!(config.metric, Metric::SquaredEuclidean);
            assert_eq!(config.threshold, HASHED_DISTANCE_THRESHOLD);
        }
        assert!(heritage().tie_break_by_id);
        assert!(!plain_text().tie_break_by_id);
    }
}
