//! Presentational rendering of one bot summary.
//!
//! Pure: a bot record plus an ownership flag in, styled lines out. No state,
//! no network. The dashboard decides selection and handles the chat/edit
//! actions the footer hints at.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::bot::{Bot, Privacy};
use crate::utils::text::{single_line, truncate_to_width};
use crate::utils::url::resolve_avatar_url;

pub fn card_lines(bot: &Bot, is_owner: bool, base_url: &str, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let badge = match bot.privacy {
        Privacy::Public => Span::styled("● public", Style::default().fg(Color::Green)),
        Privacy::Private => Span::styled("● private", Style::default().fg(Color::DarkGray)),
    };
    lines.push(Line::from(vec![
        Span::styled(
            bot.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        badge,
    ]));

    if !bot.type_of_bot.is_empty() {
        lines.push(Line::from(Span::styled(
            bot.type_of_bot.clone(),
            Style::default().fg(Color::Cyan),
        )));
    }

    if !bot.bio.is_empty() {
        lines.push(Line::from(Span::raw(truncate_to_width(
            &single_line(&bot.bio),
            width,
        ))));
    }

    if let Some(first) = bot.first_message.as_deref().filter(|f| !f.is_empty()) {
        let quoted = format!("\u{201c}{}\u{201d}", single_line(first));
        lines.push(Line::from(Span::styled(
            truncate_to_width(&quoted, width),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    if let Some(avatar) = bot.avatar.as_deref() {
        lines.push(Line::from(Span::styled(
            truncate_to_width(&resolve_avatar_url(base_url, avatar), width),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let footer = if is_owner {
        "[Enter] chat   [e] edit"
    } else {
        "[Enter] chat"
    };
    lines.push(Line::from(Span::styled(
        footer,
        Style::default().fg(Color::DarkGray),
    )));

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bot() -> Bot {
        Bot {
            bot_id: "b1".to_string(),
            user_id: Some("u1".to_string()),
            name: "Luna".to_string(),
            avatar: Some("b1_cat.png".to_string()),
            type_of_bot: "Companion".to_string(),
            privacy: Privacy::Public,
            bio: "A cheerful companion bot.".to_string(),
            first_message: Some("Hi there!".to_string()),
            situation: String::new(),
            back_story: String::new(),
            personality: String::new(),
            chatting_way: String::new(),
        }
    }

    fn rendered_text(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn card_shows_name_badge_type_bio_and_greeting() {
        let lines = card_lines(&sample_bot(), false, "http://localhost:8000", 60);
        let text = rendered_text(&lines);

        assert!(text[0].contains("Luna"));
        assert!(text[0].contains("public"));
        assert_eq!(text[1], "Companion");
        assert_eq!(text[2], "A cheerful companion bot.");
        assert_eq!(text[3], "\u{201c}Hi there!\u{201d}");
    }

    #[test]
    fn private_bots_get_the_private_badge() {
        let mut bot = sample_bot();
        bot.privacy = Privacy::Private;
        let lines = card_lines(&bot, false, "http://localhost:8000", 60);
        assert!(rendered_text(&lines)[0].contains("private"));
    }

    #[test]
    fn owner_cards_offer_the_edit_action() {
        let bot = sample_bot();
        let owned = rendered_text(&card_lines(&bot, true, "http://localhost:8000", 60));
        let unowned = rendered_text(&card_lines(&bot, false, "http://localhost:8000", 60));

        assert!(owned.last().unwrap().contains("[e] edit"));
        assert!(!unowned.last().unwrap().contains("edit"));
    }

    #[test]
    fn avatar_reference_is_resolved_against_the_origin() {
        let lines = card_lines(&sample_bot(), false, "http://localhost:8000", 80);
        let text = rendered_text(&lines);
        assert!(text
            .iter()
            .any(|line| line == "http://localhost:8000/uploads/b1_cat.png"));
    }

    #[test]
    fn optional_fields_collapse_when_absent() {
        let mut bot = sample_bot();
        bot.first_message = None;
        bot.avatar = None;
        bot.bio = String::new();
        let lines = card_lines(&bot, false, "http://localhost:8000", 60);
        // Name line plus type plus footer.
        assert_eq!(lines.len(), 3);
    }
}
