use super::ast::{AttachmentMatch, FieldFilter, FilterExpr, FilterOperator};
use crate::models::Message;

/// Returns the entries matching `filter`, in index order.
///
/// Filter logic:
/// - Same-field OR: attachment:pdf attachment:image → (pdf OR image)
/// - Cross-field AND: role:user attachment:pdf → (user AND pdf)
/// - Explicit operators override defaults
///
/// Operators are evaluated left to right without precedence.
pub fn apply_filters<'a>(entries: &'a [Message], filter: &FilterExpr) -> Vec<&'a Message> {
    entries.iter().filter(|entry| matches_filter(entry, filter)).collect()
}

pub fn matches_filter(entry: &Message, filter: &FilterExpr) -> bool {
    let Some((first, rest)) = filter.filters.split_first() else {
        return true;
    };

    let mut result = matches_field(entry, first);
    for (operator, next) in filter.operators.iter().zip(rest) {
        let next = matches_field(entry, next);
        result = match operator {
            FilterOperator::And => result && next,
            FilterOperator::Or => result || next,
        };
    }
    result
}

fn matches_field(entry: &Message, filter: &FieldFilter) -> bool {
    match filter {
        FieldFilter::Role(role) => entry.role == *role,
        FieldFilter::Attachment(AttachmentMatch::Any) => entry.attachment.is_some(),
        FieldFilter::Attachment(AttachmentMatch::Kind(kind)) => entry.attachment == *kind,
        // Assistant turns carry no serial and never match.
        FieldFilter::Serial(serial) => entry.serial.is_some_and(|n| serial.contains(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::parse_filter;
    use crate::identity::{Identity, IdentitySource};
    use crate::models::{AttachmentKind, Role};
    use crate::tree::NodeId;

    fn entry(id: &str, role: Role, attachment: AttachmentKind, serial: Option<u32>) -> Message {
        Message {
            identity: Identity::new(id),
            identity_source: IdentitySource::Durable,
            role,
            preview: format!("preview {id}"),
            full_text: String::new(),
            attachment,
            serial,
            source: NodeId(0),
        }
    }

    fn sample() -> Vec<Message> {
        vec![
            entry("u1", Role::User, AttachmentKind::Image, Some(1)),
            entry("a1", Role::Assistant, AttachmentKind::None, None),
            entry("u2", Role::User, AttachmentKind::Pdf, Some(2)),
            entry("a2", Role::Assistant, AttachmentKind::Code, None),
            entry("u3", Role::User, AttachmentKind::None, Some(3)),
        ]
    }

    fn ids(query: &str) -> Vec<String> {
        let entries = sample();
        let filter = parse_filter(query).unwrap();
        apply_filters(&entries, &filter).iter().map(|m| m.identity.to_string()).collect()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        assert_eq!(ids("").len(), 5);
    }

    #[test]
    fn test_role_filter() {
        assert_eq!(ids("role:assistant"), vec!["a1", "a2"]);
    }

    #[test]
    fn test_attachment_any_and_none() {
        assert_eq!(ids("attachment:any"), vec!["u1", "u2", "a2"]);
        assert_eq!(ids("attachment:none"), vec!["a1", "u3"]);
    }

    #[test]
    fn test_same_field_or_cross_field_and() {
        assert_eq!(ids("attachment:image attachment:code"), vec!["u1", "a2"]);
        assert_eq!(ids("role:user attachment:pdf"), vec!["u2"]);
    }

    #[test]
    fn test_explicit_or_across_fields() {
        assert_eq!(ids("role:assistant OR serial:3"), vec!["a1", "a2", "u3"]);
    }

    #[test]
    fn test_serial_never_matches_assistant() {
        assert_eq!(ids("serial:1..3"), vec!["u1", "u2", "u3"]);
        assert_eq!(ids("serial:2"), vec!["u2"]);
    }

    #[test]
    fn test_left_to_right_evaluation() {
        // (user OR assistant) AND pdf
        assert_eq!(ids("role:user OR role:assistant AND attachment:pdf"), vec!["u2"]);
    }
}
