//! Message body rendering for voting sessions

use crate::vote_store::{VoterRecord, VotingSession};

/// Render the message body for a session
///
/// The title, a blank line, then one `glyph: mention, mention` line per
/// choice that has voters.
pub fn render_session_text(session: &VotingSession) -> String {
    let mut text = format!("{}\n\n", session.title);

    for (label, voters) in &session.votes {
        if voters.is_empty() {
            continue;
        }

        let mentions: Vec<String> = voters.iter().map(voter_mention).collect();
        text.push_str(&format!("{}: {}\n", label.glyph(), mentions.join(", ")));
    }

    text
}

/// `@handle` when the user has one, otherwise a `tg://user` markup link
pub fn voter_mention(voter: &VoterRecord) -> String {
    match voter.username.as_deref() {
        Some(handle) if !handle.is_empty() => format!("@{}", handle),
        _ => format!("[{}](tg://user?id={})", voter.full_name, voter.user_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vote_store::ChoiceLabel;
    use chrono::Utc;

    fn session_with(votes: Vec<(ChoiceLabel, Vec<VoterRecord>)>) -> VotingSession {
        VotingSession {
            id: "q1".to_string(),
            title: "Pizza night?".to_string(),
            created_at: Utc::now(),
            votes,
        }
    }

    #[test]
    fn test_empty_session_renders_title_only() {
        let session = session_with(vec![]);
        assert_eq!(render_session_text(&session), "Pizza night?\n\n");
    }

    #[test]
    fn test_mention_fallback_without_handle() {
        let voter = VoterRecord::new(2, None, "Bob Smith");
        assert_eq!(voter_mention(&voter), "[Bob Smith](tg://user?id=2)");

        let voter = VoterRecord::new(3, Some(""), "Carol");
        assert_eq!(voter_mention(&voter), "[Carol](tg://user?id=3)");
    }

    #[test]
    fn test_lines_follow_first_vote_order() {
        let session = session_with(vec![
            (ChoiceLabel::Envelope, vec![VoterRecord::new(3, Some("carol"), "Carol")]),
            (ChoiceLabel::Red, vec![VoterRecord::new(1, Some("alice"), "Alice")]),
        ]);

        assert_eq!(
            render_session_text(&session),
            "Pizza night?\n\n💌: @carol\n❤️: @alice\n"
        );
    }

    #[test]
    fn test_empty_voter_list_is_skipped() {
        let session = session_with(vec![(ChoiceLabel::Yellow, vec![])]);
        assert_eq!(render_session_text(&session), "Pizza night?\n\n");
    }

    #[test]
    fn test_unlisted_label_uses_raw_name() {
        let session = session_with(vec![(
            ChoiceLabel::from("vote_green"),
            vec![VoterRecord::new(1, Some("alice"), "Alice")],
        )]);
        assert_eq!(render_session_text(&session), "Pizza night?\n\nvote_green: @alice\n");
    }
}
