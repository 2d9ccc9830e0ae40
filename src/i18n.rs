use serde::{Deserialize, Serialize};

/// 智能体回答与报告占位文本使用的目标语言
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetLanguage {
    #[serde(rename = "ko")]
    #[default]
    Korean,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "ru")]
    Russian,
}

impl std::fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetLanguage::Korean => write!(f, "ko"),
            TargetLanguage::English => write!(f, "en"),
            TargetLanguage::Chinese => write!(f, "zh"),
            TargetLanguage::Japanese => write!(f, "ja"),
            TargetLanguage::German => write!(f, "de"),
            TargetLanguage::French => write!(f, "fr"),
            TargetLanguage::Russian => write!(f, "ru"),
        }
    }
}

impl std::str::FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ko" | "korean" | "한국어" => Ok(TargetLanguage::Korean),
            "en" | "english" => Ok(TargetLanguage::English),
            "zh" | "chinese" | "中文" => Ok(TargetLanguage::Chinese),
            "ja" | "japanese" | "日本語" => Ok(TargetLanguage::Japanese),
            "de" | "german" | "deutsch" => Ok(TargetLanguage::German),
            "fr" | "french" | "français" => Ok(TargetLanguage::French),
            "ru" | "russian" | "русский" => Ok(TargetLanguage::Russian),
            _ => Err(format!("Unknown target language: {}", s)),
        }
    }
}

impl TargetLanguage {
    /// 获取语言的描述性名称
    pub fn display_name(&self) -> &'static str {
        match self {
            TargetLanguage::Korean => "한국어",
            TargetLanguage::English => "English",
            TargetLanguage::Chinese => "中文",
            TargetLanguage::Japanese => "日本語",
            TargetLanguage::German => "Deutsch",
            TargetLanguage::French => "Français",
            TargetLanguage::Russian => "Русский",
        }
    }

    /// 在英文提示词中引用该语言时使用的名称
    pub fn english_name(&self) -> &'static str {
        match self {
            TargetLanguage::Korean => "Korean",
            TargetLanguage::English => "English",
            TargetLanguage::Chinese => "Chinese",
            TargetLanguage::Japanese => "Japanese",
            TargetLanguage::German => "German",
            TargetLanguage::French => "French",
            TargetLanguage::Russian => "Russian",
        }
    }

    /// 报告中某个智能体缺少笔记时使用的占位文本
    pub fn insufficient_data(&self) -> &'static str {
        match self {
            TargetLanguage::Korean => "데이터가 충분하지 않습니다.",
            TargetLanguage::English => "Insufficient data.",
            TargetLanguage::Chinese => "数据不足。",
            TargetLanguage::Japanese => "データが不足しています。",
            TargetLanguage::German => "Unzureichende Daten.",
            TargetLanguage::French => "Données insuffisantes.",
            TargetLanguage::Russian => "Недостаточно данных.",
        }
    }
}
