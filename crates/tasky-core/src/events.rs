//! Human-readable projection of a task's event log.

use serde::Serialize;

use crate::coerce::format_instant;
use crate::schema::OpKind;
use crate::task::{AttrValue, Event};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventLine {
    pub text: String,
    pub when: String,
}

pub fn render(events: &[Event]) -> Vec<EventLine> {
    events
        .iter()
        .map(|event| EventLine {
            text: describe(event),
            when: format_instant(event.timestamp),
        })
        .collect()
}

pub fn describe(event: &Event) -> String {
    let value = display_value(event.value.as_ref());
    match event.kind {
        OpKind::Set => format!("{} changed {} to {}", event.actor, event.attribute, value),
        OpKind::Append => format!("{} added {} to {}", event.actor, value, event.attribute),
        OpKind::Remove => format!("{} removed {} from {}", event.actor, value, event.attribute),
    }
}

fn display_value(value: Option<&AttrValue>) -> String {
    match value {
        None => "none".to_string(),
        Some(AttrValue::Instant(ts)) => format_instant(*ts),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use regex::Regex;

    fn event(kind: OpKind, attribute: &str, value: Option<AttrValue>) -> Event {
        Event {
            kind,
            timestamp: 1_650_000_000,
            actor: "alice".to_string(),
            attribute: attribute.to_string(),
            value,
        }
    }

    #[test]
    fn due_values_render_as_display_time() {
        let ts = Local
            .with_ymd_and_hms(2022, 3, 5, 18, 0, 0)
            .single()
            .expect("local time")
            .timestamp();
        let line = describe(&event(OpKind::Set, "due", Some(AttrValue::Instant(ts))));
        assert_eq!(line, "alice changed due to 18:00 05/03/22");
        let pattern = Regex::new(r"^alice changed due to \d{2}:\d{2} \d{2}/\d{2}/\d{2}$").unwrap();
        assert!(pattern.is_match(&line));
    }

    #[test]
    fn each_kind_has_its_own_phrase() {
        let lines: Vec<String> = render(&[
            event(OpKind::Append, "tags", Some(AttrValue::Text("urgent".to_string()))),
            event(OpKind::Remove, "tags", Some(AttrValue::Text("errand".to_string()))),
            event(OpKind::Set, "project", None),
            event(OpKind::Set, "rank", Some(AttrValue::Number(2.5))),
        ])
        .into_iter()
        .map(|line| line.text)
        .collect();
        assert_eq!(
            lines,
            vec![
                "alice added urgent to tags",
                "alice removed errand from tags",
                "alice changed project to none",
                "alice changed rank to 2.5",
            ]
        );
    }

    #[test]
    fn when_uses_event_timestamp() {
        let lines = render(&[event(OpKind::Set, "project", None)]);
        assert_eq!(lines[0].when, format_instant(1_650_000_000));
    }
}
