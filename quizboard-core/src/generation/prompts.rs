//! Prompt construction for each content kind.

use crate::player::Player;
use crate::session::SessionConfig;
use llm_client::Message;

/// Persona used for board design when the session has none configured.
const BOARD_DESIGNER_PERSONA: &str = "You are a game designer.";

/// Messages asking for a board title and tile concepts.
pub fn board_messages(config: &SessionConfig) -> Vec<Message> {
    let persona = if config.system_persona.trim().is_empty() {
        BOARD_DESIGNER_PERSONA
    } else {
        config.system_persona.as_str()
    };

    let prompt = format!(
        r#"Analyze the domain request: "{domain}".
1. Create a short, punchy title (3-5 words) that captures the essence of this domain.
2. Generate 20 distinct board game tile concepts for this domain.

For each concept, provide a concise visual keyword to search for an icon (e.g. "sword", "bitcoin", "atom").

Return strictly a JSON object. Format:
{{
  "title": "The Generated Title",
  "tiles": [{{"name": "Concept Name", "keyword": "search-term"}}, ...]
}}
Do not use Markdown."#,
        domain = config.domain
    );

    vec![Message::system(persona), Message::user(prompt)]
}

/// Messages asking for a scenario question about one tile's topic.
pub fn question_messages(config: &SessionConfig, topic: &str, player: &Player) -> Vec<Message> {
    let mut instructions = String::new();
    if let Some(note) = config.difficulty.prompt_note() {
        instructions.push_str(note);
    }
    let preferences = config.question_preferences.trim();
    if !preferences.is_empty() {
        instructions.push_str(&format!(
            "\nUser Preferences: {preferences}\nIMPORTANT: Tailor the question to match these preferences."
        ));
    }

    let prompt = format!(
        r#"{status}
Current Topic: "{topic}" inside Domain: "{domain}".

Instructions:
{instructions}

Task: Generate a scenario-based multiple-choice question.
- Be dynamic.
- Provide a short scenario setup that frames the question.

Format (JSON):
{{
  "scenario": "Brief scenario context (2-4 sentences).",
  "question": "Question text?",
  "options": ["Option 1", "Option 2", "Option 3", "Option 4"],
  "correctIndex": 0,
  "hint": "Clue.",
  "explanation": "Why.",
  "reward": 150
}}"#,
        status = player_status(player),
        domain = config.domain,
    );

    vec![Message::system(config.persona()), Message::user(prompt)]
}

/// Messages asking for a two-choice dilemma.
pub fn event_messages(config: &SessionConfig, context: &str, player: &Player) -> Vec<Message> {
    let prompt = format!(
        r#"You are the Decision Master.
{status}

Generate a decision event for the topic: "{context}".
Present a situational dilemma with TWO choices: one safe, one risky.

Constraints:
- Do NOT start with "Welcome to...".
- Keep the GM comment reacting to the current situation.

Format (JSON):
{{
  "gm_comment": "Narrative intro or reaction to player status.",
  "scenario": "You found a bug in production...",
  "options": [
    {{"text": "Hotfix immediately", "outcome": "Risk: High. Success: +300 Cr. Fail: -100 Cr.", "type": "risky"}},
    {{"text": "Wait for QA", "outcome": "Safe: +50 Cr.", "type": "safe"}}
  ]
}}"#,
        status = player_status(player),
    );

    vec![Message::system(config.persona()), Message::user(prompt)]
}

/// Messages asking for a boss scenario.
pub fn boss_messages(config: &SessionConfig, player: &Player) -> Vec<Message> {
    let prompt = format!(
        r#"THIS IS A BOSS BATTLE.
Domain: "{domain}". Level: {level}.

Create a high-stakes, complex strategic scenario.
It must be significantly harder than normal questions.

Constraints:
- Do NOT use generic intros like "Welcome to the Boss Level".
- Jump straight into the crisis.
- The GM comment should be intimidating.

Format (JSON):
{{
  "gm_comment": "Intimidating intro. Tell them what is at stake.",
  "scenario": "Your entire company is facing a hostile takeover...",
  "options": ["Option A", "Option B", "Option C", "Option D"],
  "correctIndex": 0,
  "explanation": "Why this is the only survivable move."
}}"#,
        domain = config.domain,
        level = player.level,
    );

    vec![Message::system(config.persona()), Message::user(prompt)]
}

fn player_status(player: &Player) -> String {
    format!(
        "Player Stats: Level: {}, Credits: {}, Streak: {}",
        player.level, player.score, player.streak
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Difficulty;
    use llm_client::Role;

    #[test]
    fn test_board_prompt_mentions_domain() {
        let config = SessionConfig::new("Supply Chain");
        let messages = board_messages(&config);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[1].content.contains("\"Supply Chain\""));
        assert!(messages[1].content.contains("Do not use Markdown."));
    }

    #[test]
    fn test_question_prompt_embeds_status_and_notes() {
        let config = SessionConfig::new("Finance")
            .with_difficulty(Difficulty::Hard)
            .with_question_preferences("Focus on bonds");
        let mut player = Player::new(1000);
        player.streak = 3;

        let messages = question_messages(&config, "Yield Curves", &player);
        let prompt = &messages[1].content;
        assert!(prompt.contains("Player Stats: Level: 1, Credits: 1000, Streak: 3"));
        assert!(prompt.contains("\"Yield Curves\" inside Domain: \"Finance\""));
        assert!(prompt.contains("Question should be complex."));
        assert!(prompt.contains("User Preferences: Focus on bonds"));
    }

    #[test]
    fn test_normal_difficulty_has_no_note() {
        let config = SessionConfig::new("Finance");
        let messages = question_messages(&config, "Tax", &Player::new(1000));
        assert!(!messages[1].content.contains("foundational"));
        assert!(!messages[1].content.contains("complex."));
    }

    #[test]
    fn test_boss_prompt_uses_level() {
        let config = SessionConfig::new("Chess");
        let mut player = Player::new(0);
        player.level = 4;
        let messages = boss_messages(&config, &player);
        assert!(messages[1].content.contains("Domain: \"Chess\". Level: 4."));
    }
}
