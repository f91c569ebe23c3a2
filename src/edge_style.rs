use serde::Serialize;

use crate::types::RelationshipKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentAxis {
    /// Left/right sides; partners on the same rank.
    Horizontal,
    /// Top/bottom sides; edges that cross ranks.
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ArrowHead {
    ArrowClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub color: &'static str,
    pub stroke_width: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash_pattern: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrow: Option<ArrowHead>,
    pub animated: bool,
    pub attachment_axis: AttachmentAxis,
}

impl EdgeStyle {
    pub fn has_arrow(&self) -> bool {
        self.arrow.is_some()
    }

    pub fn is_dashed(&self) -> bool {
        self.dash_pattern.is_some()
    }
}

pub const DEFAULT_COLOR: &str = "#b1b1b7";

pub fn resolve(kind: &RelationshipKind, same_rank: bool) -> EdgeStyle {
    let attachment_axis = if same_rank {
        AttachmentAxis::Horizontal
    } else {
        AttachmentAxis::Vertical
    };
    let plain = EdgeStyle {
        color: DEFAULT_COLOR,
        stroke_width: 1,
        dash_pattern: None,
        arrow: None,
        animated: false,
        attachment_axis,
    };

    match kind {
        RelationshipKind::Married => EdgeStyle {
            color: "black",
            stroke_width: 3,
            ..plain
        },
        RelationshipKind::Divorced => EdgeStyle {
            color: "black",
            stroke_width: 2,
            dash_pattern: Some("5 5"),
            ..plain
        },
        RelationshipKind::ParentChild => EdgeStyle {
            color: "blue",
            arrow: Some(ArrowHead::ArrowClosed),
            animated: true,
            ..plain
        },
        RelationshipKind::Siblings => EdgeStyle {
            color: "green",
            ..plain
        },
        RelationshipKind::Other(_) => plain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn married_is_thick_black() {
        let style = resolve(&RelationshipKind::Married, true);
        assert_eq!(style.color, "black");
        assert_eq!(style.stroke_width, 3);
        assert!(!style.has_arrow());
        assert!(!style.animated);
        assert_eq!(style.attachment_axis, AttachmentAxis::Horizontal);
    }

    #[test]
    fn divorced_is_dashed() {
        let style = resolve(&RelationshipKind::Divorced, true);
        assert_eq!(style.dash_pattern, Some("5 5"));
        assert_eq!(style.stroke_width, 2);
        assert!(style.is_dashed());
    }

    #[test]
    fn parent_child_has_animated_arrow() {
        let style = resolve(&RelationshipKind::ParentChild, false);
        assert_eq!(style.color, "blue");
        assert_eq!(style.arrow, Some(ArrowHead::ArrowClosed));
        assert!(style.animated);
        assert_eq!(style.attachment_axis, AttachmentAxis::Vertical);
    }

    #[test]
    fn siblings_and_unknown() {
        assert_eq!(resolve(&RelationshipKind::Siblings, true).color, "green");
        let other = resolve(&RelationshipKind::Other("cousins".into()), false);
        assert_eq!(other.color, DEFAULT_COLOR);
        assert_eq!(other.stroke_width, 1);
        assert!(!other.has_arrow());
    }

    #[test]
    fn axis_follows_rank_flag_not_kind() {
        let style = resolve(&RelationshipKind::Married, false);
        assert_eq!(style.attachment_axis, AttachmentAxis::Vertical);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_string(&resolve(&RelationshipKind::ParentChild, false)).unwrap();
        assert_eq!(
            json,
            r#"{"color":"blue","strokeWidth":1,"arrow":"arrowClosed","animated":true,"attachmentAxis":"vertical"}"#
        );
    }
}
