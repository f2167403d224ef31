//! Widget frame DTOs.
//!
//! # Design
//! A LaMetric indicator widget displays a list of frames. The JSON shape of a
//! frame decides its kind (`text`, `goalData` or `chartData`), so `Frame` is
//! untagged. `Client::update_widget` accepts any serializable value, so raw
//! `serde_json::Value` frames keep working for shapes not modelled here.

use serde::{Deserialize, Serialize};

/// One screen of a widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Frame {
    Goal {
        #[serde(rename = "goalData")]
        goal_data: GoalData,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<u32>,
    },
    Sparkline {
        #[serde(rename = "chartData")]
        chart_data: Vec<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<u32>,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<u32>,
    },
}

/// Progress towards a goal, rendered as a bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalData {
    pub start: i64,
    pub current: i64,
    pub end: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Frame {
    pub fn text(text: impl Into<String>) -> Self {
        Frame::Text {
            text: text.into(),
            icon: None,
            index: None,
        }
    }

    pub fn goal(goal_data: GoalData) -> Self {
        Frame::Goal {
            goal_data,
            icon: None,
            index: None,
        }
    }

    pub fn sparkline(chart_data: Vec<i64>) -> Self {
        Frame::Sparkline {
            chart_data,
            index: None,
        }
    }

    /// Set the icon (e.g. `"i120"` or `"a2867"`). Sparkline frames have no
    /// icon and are returned unchanged.
    pub fn with_icon(mut self, new_icon: impl Into<String>) -> Self {
        match &mut self {
            Frame::Goal { icon, .. } | Frame::Text { icon, .. } => *icon = Some(new_icon.into()),
            Frame::Sparkline { .. } => {}
        }
        self
    }

    pub fn with_index(mut self, new_index: u32) -> Self {
        match &mut self {
            Frame::Goal { index, .. } | Frame::Sparkline { index, .. } | Frame::Text { index, .. } => {
                *index = Some(new_index)
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_frame_serializes_without_unset_fields() {
        let frame = Frame::text("Hello").with_icon("i120");
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({"text": "Hello", "icon": "i120"})
        );
    }

    #[test]
    fn goal_frame_uses_camel_case_key() {
        let frame = Frame::goal(GoalData {
            start: 0,
            current: 50,
            end: 100,
            unit: Some("%".to_string()),
        })
        .with_index(1);
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({"goalData": {"start": 0, "current": 50, "end": 100, "unit": "%"}, "index": 1})
        );
    }

    #[test]
    fn sparkline_ignores_icon() {
        let frame = Frame::sparkline(vec![1, 5, 3]).with_icon("i1");
        assert_eq!(serde_json::to_value(&frame).unwrap(), json!({"chartData": [1, 5, 3]}));
    }

    #[test]
    fn frames_deserialize_by_shape() {
        let frames: Vec<Frame> = serde_json::from_value(json!([
            {"text": "hi", "index": 0},
            {"goalData": {"start": 0, "current": 1, "end": 2}},
            {"chartData": [4, 2]}
        ]))
        .unwrap();
        assert!(matches!(frames[0], Frame::Text { index: Some(0), .. }));
        assert!(matches!(frames[1], Frame::Goal { .. }));
        assert!(matches!(frames[2], Frame::Sparkline { .. }));
    }
}
