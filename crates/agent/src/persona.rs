//! Built-in personas.
//!
//! A persona is the fixed configuration a conversation runs with: system
//! instruction, greeting, model defaults, exit phrases, and the lines
//! printed when the conversation ends.

use std::fmt;

use rand::seq::IndexedRandom;

use crate::exit::{ExitDetector, ExitReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonaKind {
    /// Creative-writing partner with book search.
    Muse,
    /// Georgian-speaking pizza cashier.
    Gino,
}

impl fmt::Display for PersonaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersonaKind::Muse => write!(f, "muse"),
            PersonaKind::Gino => write!(f, "gino"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Persona {
    pub kind: PersonaKind,
    /// Speaker label shown before replies.
    pub name: &'static str,
    pub summary: &'static str,
    pub system_prompt: &'static str,
    pub greeting: &'static str,
    pub default_model: &'static str,
    pub default_temperature: f32,
    /// Needs the book index (and its credentials) at startup.
    pub uses_book_search: bool,
    user_exit_phrases: &'static [&'static str],
    reply_exit_phrases: &'static [&'static str],
}

const MUSE_PROMPT: &str = r#"
You are "Muse," a friendly and brilliant AI creative partner for a book author.
Your goal is to help the user brainstorm, develop characters, outline plots, and overcome writer's block.
You have access to a special tool called `book_database_search`.
Use it when the user asks for inspiration from existing books, wants to know about common tropes, or wants to find examples of specific plot devices.
Before suggesting a completely new idea, you can quickly search the database to see if similar concepts exist, which can enrich your answer.
Be encouraging, collaborative, and inspiring. Ask clarifying questions to better understand the user's vision.
"#;

const GINO_PROMPT: &str = r#"
You are an AI assistant for 'Nebula Pizza Store', a friendly and helpful virtual cashier.
Your goal is to provide an excellent customer experience by helping users order pizza.

---
**CRITICAL INSTRUCTION: You MUST conduct the entire conversation in the Georgian language (ქართული ენა).**
All your greetings, questions, and responses to the user must be in Georgian.
---

Your capabilities (perform all these in Georgian):
- Greet the customer warmly.
- Present the menu and answer questions about it. You must translate the menu items and details into Georgian for the customer.
- Take the customer's order item by item.
- Suggest popular items or pairings if the customer is unsure.
- Handle order modifications (e.g., adding/removing toppings).
- Confirm the complete order with the customer before finalizing.
- Be conversational, polite, and a little bit fun. Use emojis where appropriate!

Our Menu (This is your source of truth data. Translate it for the user):
- Pizzas:
  - Margherita: Tomato, Mozzarella, Basil - $12
  - Pepperoni: Classic Pepperoni, Mozzarella - $14
  - Veggie Supreme: Bell Peppers, Onions, Olives, Mushrooms - $15
  - Meat Lover's: Pepperoni, Sausage, Bacon - $16
- Sides:
  - Garlic Knots (6 pcs) - $6
  - Caesar Salad - $8
- Drinks:
  - Soda (Coke, Sprite) - $2
  - Water - $1

Important Rules (follow these strictly):
1.  **Language:** Your primary and only language for user interaction is Georgian.
2.  **No Payments:** Do not take payment information.
3.  **Menu Adherence:** If asked about something not on the menu, politely state that it's not available (in Georgian).
4.  **Final Confirmation:** At the end of the conversation, summarize the final order and ask for confirmation (in Georgian).
"#;

const MUSE_EXIT_PHRASES: &[&str] = &["quit", "exit", "goodbye", "thanks", "thank you", "bye"];

const MUSE_FAREWELLS: &[&str] = &[
    "It was a pleasure helping you. Happy writing! 👋",
    "Take care and let your creativity flow! ✨",
    "Looking forward to your next masterpiece. Goodbye! 📚",
    "Until next time, author! 🎩",
];

const GINO_USER_EXIT_PHRASES: &[&str] = &[
    "ნახვამდის",
    "კარგად",
    "შეხვედრამდე",
    "მადლობა და ნახვამდის",
    "გემრიელად მიირთვით",
    "წარმატებები",
];

const GINO_REPLY_EXIT_PHRASES: &[&str] = &[
    "თქვენი შეკვეთა მიღებულია",
    "თქვენი შეკვეთა დადასტურებულია",
    "გმადლობთ",
    "ნებულა პიცერიაში შეკვეთისთვის",
    "დღეს სასიამოვნო დღეს გისურვებთ",
    "კარგ დღეს გისურვებთ",
    "შეკვეთა დასრულდა",
    "დროებით",
    "ნახვამდის",
    "👋",
];

impl Persona {
    pub fn muse() -> Self {
        Self {
            kind: PersonaKind::Muse,
            name: "Muse",
            summary: "Creative-writing partner that can search a book database",
            system_prompt: MUSE_PROMPT,
            greeting: "🤖 Hello! I'm Muse, your creative partner. How can I help you with your book today?",
            default_model: "gemini-1.5-flash",
            default_temperature: 0.7,
            uses_book_search: true,
            user_exit_phrases: MUSE_EXIT_PHRASES,
            reply_exit_phrases: &[],
        }
    }

    pub fn gino() -> Self {
        Self {
            kind: PersonaKind::Gino,
            name: "Gino",
            summary: "Nebula Pizza Store cashier (Georgian)",
            system_prompt: GINO_PROMPT,
            greeting: "გამარჯობა, რით შემიძლია დაგეხმაროთ?",
            default_model: "gemini-2.0-flash",
            default_temperature: 0.5,
            uses_book_search: false,
            user_exit_phrases: GINO_USER_EXIT_PHRASES,
            reply_exit_phrases: GINO_REPLY_EXIT_PHRASES,
        }
    }

    pub fn all() -> Vec<Self> {
        vec![Self::muse(), Self::gino()]
    }

    /// Look a persona up by name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "muse" => Some(Self::muse()),
            "gino" => Some(Self::gino()),
            _ => None,
        }
    }

    pub fn exit_detector(&self) -> ExitDetector {
        ExitDetector::new(
            self.user_exit_phrases.iter().copied(),
            self.reply_exit_phrases.iter().copied(),
        )
    }

    /// Line printed before reading input.
    pub fn quit_hint(&self) -> &'static str {
        "Type 'quit' to exit."
    }

    /// A reply as shown to the user.
    pub fn reply_line(&self, reply: &str) -> String {
        format!("{}: {}", self.name, reply)
    }

    /// Inline report for a turn that failed outright.
    pub fn error_line(&self, error: &dyn fmt::Display) -> String {
        match self.kind {
            PersonaKind::Muse => format!("[Error: An unexpected error occurred: {error}]"),
            PersonaKind::Gino => format!("[შეცდომა: მოხდა შეცდომა: {error}]"),
        }
    }

    /// Closing line for the given exit.
    pub fn farewell(&self, reason: &ExitReason) -> String {
        match self.kind {
            PersonaKind::Muse => {
                let line = MUSE_FAREWELLS
                    .choose(&mut rand::rng())
                    .copied()
                    .unwrap_or(MUSE_FAREWELLS[0]);
                self.reply_line(line)
            }
            PersonaKind::Gino => match reason {
                ExitReason::QuitCommand => "ნახვამდის! 👋".to_string(),
                ExitReason::UserPhrase(_) => self.reply_line(
                    "გმადლობთ სტუმრობისთვის! გემრიელად მიირთვით და მალე ისევ მობრძანდით! 👋",
                ),
                ExitReason::ReplyPhrase(_) => "🍕 ნახვამდის! 👋".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        assert_eq!(Persona::from_name("Muse").unwrap().kind, PersonaKind::Muse);
        assert_eq!(Persona::from_name(" gino ").unwrap().kind, PersonaKind::Gino);
        assert!(Persona::from_name("marvin").is_none());
    }

    #[test]
    fn model_defaults() {
        let muse = Persona::muse();
        assert_eq!(muse.default_model, "gemini-1.5-flash");
        assert!((muse.default_temperature - 0.7).abs() < f32::EPSILON);
        assert!(muse.uses_book_search);

        let gino = Persona::gino();
        assert_eq!(gino.default_model, "gemini-2.0-flash");
        assert!((gino.default_temperature - 0.5).abs() < f32::EPSILON);
        assert!(!gino.uses_book_search);
    }

    #[test]
    fn muse_exits_on_thanks_in_any_case() {
        let detector = Persona::muse().exit_detector();
        assert!(matches!(detector.check_input("Thanks!"), Some(ExitReason::UserPhrase(_))));
        assert!(matches!(detector.check_input("thanks!"), Some(ExitReason::UserPhrase(_))));
        assert_eq!(detector.check_reply("Goodbye!"), None);
    }

    #[test]
    fn gino_exits_on_bot_thanks() {
        let detector = Persona::gino().exit_detector();
        assert_eq!(
            detector.check_reply("თქვენი შეკვეთა: მარგარიტა. გმადლობთ!"),
            Some(ExitReason::ReplyPhrase("გმადლობთ".into()))
        );
        assert_eq!(
            detector.check_input("კარგად იყავით"),
            Some(ExitReason::UserPhrase("კარგად".into()))
        );
    }

    #[test]
    fn muse_farewell_is_one_of_four() {
        let muse = Persona::muse();
        for _ in 0..10 {
            let line = muse.farewell(&ExitReason::QuitCommand);
            let body = line.strip_prefix("Muse: ").unwrap();
            assert!(MUSE_FAREWELLS.contains(&body));
        }
    }

    #[test]
    fn gino_farewells_depend_on_reason() {
        let gino = Persona::gino();
        assert_eq!(gino.farewell(&ExitReason::QuitCommand), "ნახვამდის! 👋");
        assert!(gino
            .farewell(&ExitReason::UserPhrase("კარგად".into()))
            .starts_with("Gino: გმადლობთ სტუმრობისთვის!"));
        assert_eq!(
            gino.farewell(&ExitReason::ReplyPhrase("👋".into())),
            "🍕 ნახვამდის! 👋"
        );
    }

    #[test]
    fn error_lines_are_localised() {
        assert_eq!(
            Persona::muse().error_line(&"timeout"),
            "[Error: An unexpected error occurred: timeout]"
        );
        assert_eq!(
            Persona::gino().error_line(&"timeout"),
            "[შეცდომა: მოხდა შეცდომა: timeout]"
        );
    }
}
