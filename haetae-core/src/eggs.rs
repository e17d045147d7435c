//! Scripted easter-egg definitions.
//!
//! Each egg binds a narrative payload to a delay and an audience. The
//! session arms a one-shot timer per egg at login; the trigger engine's
//! fired-id set keeps delivery at-most-once even across re-arming.

use chrono::DateTime;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::records::Message;

/// Incident revealed by the sinkhole egg.
pub const SINKHOLE_INCIDENT_ID: &str = "inc-sinkhole-001";
/// Companion notice fired together with the incident (badge pairing).
pub const SINKHOLE_NOTICE_ID: &str = "noti-sinkhole-alert";
/// Delay between login and the sinkhole reveal.
pub const SINKHOLE_DELAY_MS: u64 = 30_000;
/// Toast text shown when the sinkhole fires.
pub const SINKHOLE_TOAST_TITLE: &str = "긴급 공지 발생";
pub const SINKHOLE_TOAST_BODY: &str = "서울시 강남구 역삼동 강남역 사거리 대규모 싱크홀 발생";

/// Fallback delay for eggs that do not configure one.
pub const DEFAULT_EGG_DELAY_MS: u64 = 60_000;

/// Display names that never receive the ordinary-agent eggs.
pub const NAMED_AGENT_NAMES: [&str; 8] = [
    "박홍림", "최요원", "류재관", "김솔음", "해금", "고영은", "장허운", "강준호",
];

#[must_use]
pub fn is_named_agent(name: &str) -> bool {
    NAMED_AGENT_NAMES.contains(&name)
}

/// Who an egg may fire for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EggAudience {
    /// Only synthesized / unlisted agents.
    Ordinary,
    /// Everyone.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    #[default]
    Default,
    Destructive,
}

/// Presentation payload a shell renders; the core only carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToastSpec {
    #[serde(default)]
    pub title: Option<String>,
    pub description: String,
    #[serde(default)]
    pub variant: ToastVariant,
    #[serde(default)]
    pub class_name: Option<String>,
}

impl ToastSpec {
    #[must_use]
    pub fn urgent(title: &str, description: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            description: description.to_string(),
            variant: ToastVariant::Destructive,
            class_name: None,
        }
    }
}

/// A delayed one-shot narrative delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EasterEgg {
    pub id: String,
    pub delay_ms: u64,
    pub audience: EggAudience,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub toast: Option<ToastSpec>,
}

/// The built-in egg catalog. Currently a single entry: the haunted
/// "don't come here" message delivered to ordinary agents a minute in.
#[must_use]
pub fn builtin_eggs() -> &'static [EasterEgg] {
    static EGGS: Lazy<Vec<EasterEgg>> = Lazy::new(|| {
        vec![EasterEgg {
            id: "msg-haunted-001".to_string(),
            delay_ms: DEFAULT_EGG_DELAY_MS,
            audience: EggAudience::Ordinary,
            message: Some(Message {
                id: "msg-haunted-001".to_string(),
                sender_id: "unknown".to_string(),
                sender_name: "■■■".to_string(),
                sender_department: "현장탐사반".to_string(),
                receiver_id: String::new(),
                title: "오지마".to_string(),
                content: "지사로 오지마 여기 지금 분위기 이상해 오ㅈㅣㅁㅏㅏㅏㅏ ㅏㅏㅏㅏㅏㅏㅏㅏ"
                    .to_string(),
                created_at: DateTime::parse_from_rfc3339("1900-05-04T00:00:00+00:00")
                    .expect("fixed egg timestamp parses")
                    .with_timezone(&chrono::Utc),
                is_read: false,
                trigger: None,
            }),
            toast: Some(ToastSpec {
                title: None,
                description: "■■■ 쪽지가 도착했습니다".to_string(),
                variant: ToastVariant::Destructive,
                class_name: Some("bg-black text-white border-red-900".to_string()),
            }),
        }]
    });
    &EGGS
}
