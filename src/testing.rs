//! Fixtures shared by unit tests.

use chrono::{TimeZone, Utc};

use crate::consistency::ROOT_UDI;
use crate::parsing::model::{
    Client, Hal, HalRecord, Hardware, ParsedSubmission, Question, QuestionTarget, Software, Summary,
};
use crate::values::{Properties, TypedValue};

pub fn s(value: &str) -> TypedValue {
    TypedValue::Str(value.to_string())
}

pub fn i(value: i64) -> TypedValue {
    TypedValue::Int(value)
}

/// HAL record whose `info.parent` names `parent`.
pub fn record(id: i64, udi: &str, parent: Option<&str>, props: &[(&str, TypedValue)]) -> HalRecord {
    let mut properties: Properties = props
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect();
    if let Some(parent) = parent {
        properties.insert("info.parent".to_string(), s(parent));
    }
    HalRecord {
        id,
        udi: udi.to_string(),
        parent: None,
        properties,
    }
}

pub fn root_record(id: i64, props: &[(&str, TypedValue)]) -> HalRecord {
    record(id, ROOT_UDI, None, props)
}

pub fn submission(devices: Vec<HalRecord>) -> ParsedSubmission {
    ParsedSubmission {
        summary: Summary {
            live_cd: false,
            system_id: "f982bb1ab536469cebfd6eaadcea0ffc".to_string(),
            distribution: "Ubuntu".to_string(),
            distroseries: "8.04".to_string(),
            architecture: "i386".to_string(),
            private: false,
            contactable: false,
            date_created: Utc.with_ymd_and_hms(2008, 4, 1, 10, 0, 0).unwrap(),
            client: Client {
                name: "hwtest".to_string(),
                version: "0.9".to_string(),
                plugins: Vec::new(),
            },
        },
        hardware: Hardware {
            hal: Hal {
                version: "0.5.11".to_string(),
                devices,
            },
            processors: Vec::new(),
            aliases: Vec::new(),
        },
        software: Software::default(),
        questions: Vec::new(),
    }
}

pub fn question_targeting(ids: &[i64]) -> Question {
    Question {
        name: "detected_network_controllers".to_string(),
        plugin: None,
        targets: ids
            .iter()
            .map(|id| QuestionTarget {
                id: *id,
                drivers: Vec::new(),
            })
            .collect(),
        answer: None,
        answer_choices: Vec::new(),
        command: None,
        comment: None,
    }
}
