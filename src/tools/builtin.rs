//! Built-in tools. All of them are mocks that template their input.

use std::path::PathBuf;

use anyhow::Result;
use rand::seq::SliceRandom;
use serde_json::{Value, json};

use crate::message::{Display, Element, OutgoingMessage};

use super::{Tool, ToolOutput, UiEffect, required_string_arg, string_arg};

fn string_schema(properties: &[(&str, &str, Option<&str>)], required: &[&str]) -> Value {
    let mut props = serde_json::Map::new();
    for (name, description, default) in properties {
        let mut prop = json!({"type": "string", "description": description});
        if let Some(default) = default {
            prop["default"] = Value::String(default.to_string());
        }
        props.insert(name.to_string(), prop);
    }
    json!({
        "type": "object",
        "properties": props,
        "required": required,
        "additionalProperties": false,
    })
}

// ── developer_tool ───────────────────────────────────────────────────

pub struct DeveloperTool;

impl Tool for DeveloperTool {
    fn name(&self) -> &'static str {
        "developer_tool"
    }

    fn description(&self) -> &'static str {
        "🌐 You are a **Professional Web Developer Assistant**. Understand the user's \
         requirements (e.g. \"portfolio website\", \"ecommerce page\", \"dark theme blog\") and \
         give smart tech stack suggestions (HTML/CSS/React/Tailwind etc.), a project structure \
         and component ideas, and a friendly explanation with emojis 💡. Always explain in a \
         way beginners also understand."
    }

    fn parameters(&self) -> Value {
        string_schema(
            &[("requirements", "What the user wants to build.", Some(""))],
            &[],
        )
    }

    fn invoke(&self, args: &Value) -> Result<ToolOutput> {
        let requirements = string_arg(args, "requirements", "");
        Ok(ToolOutput::text(format!(
            "🌐 Based on your needs: {requirements}, I'd suggest using HTML, CSS, and JavaScript. Let's build something amazing! 🚀"
        )))
    }
}

// ── coding_tool ──────────────────────────────────────────────────────

pub struct CodingTool;

impl Tool for CodingTool {
    fn name(&self) -> &'static str {
        "coding_tool"
    }

    fn description(&self) -> &'static str {
        "👨‍💻 You are the **Coding Expert Tool**! Fix any bugs in the user's code, improve \
         logic, performance and clarity, and explain what was wrong and what you fixed. \
         Supports Python, JavaScript, C++, etc. Be like a helpful mentor, not a compiler 😊"
    }

    fn parameters(&self) -> Value {
        string_schema(&[("code", "The code to fix or improve.", Some(""))], &[])
    }

    fn invoke(&self, args: &Value) -> Result<ToolOutput> {
        let code = string_arg(args, "code", "");
        Ok(ToolOutput::text(format!(
            "🛠️ Here's your improved code: (mock fix of code: {code})\n✅ I've adjusted the syntax and logic for clarity!"
        )))
    }
}

// ── translate_tool ───────────────────────────────────────────────────

pub struct TranslateTool;

impl Tool for TranslateTool {
    fn name(&self) -> &'static str {
        "translate_tool"
    }

    fn description(&self) -> &'static str {
        "🌍 You are a **Pro Translator Agent**! Translate from any language to Urdu, Sindhi \
         or English (auto-detect too), keeping tone, emotion and meaning, and sounding natural \
         rather than robotic. Return translations with emojis for an emotional touch."
    }

    fn parameters(&self) -> Value {
        string_schema(
            &[
                ("text", "Text to translate.", None),
                ("target_lang", "Language to translate into.", Some("english")),
            ],
            &["text"],
        )
    }

    fn invoke(&self, args: &Value) -> Result<ToolOutput> {
        let text = required_string_arg(args, "text")?;
        let target_lang = string_arg(args, "target_lang", "english");
        Ok(ToolOutput::text(format!(
            "🌐 Translated to {target_lang}: {text} (mock translation)"
        )))
    }
}

// ── sindhi_tool ──────────────────────────────────────────────────────

pub struct SindhiTool;

impl Tool for SindhiTool {
    fn name(&self) -> &'static str {
        "sindhi_tool"
    }

    fn description(&self) -> &'static str {
        "💬 You're a proud Sindhi language expert! Understand the user's Sindhi, reply only \
         in Sindhi with love, respect and pride, using natural Sindhi expressions 💚. Always \
         respond warmly, like a friendly digital dost from Sindh!"
    }

    fn parameters(&self) -> Value {
        string_schema(
            &[("user_input", "The user's Sindhi message.", Some(""))],
            &[],
        )
    }

    fn invoke(&self, args: &Value) -> Result<ToolOutput> {
        let user_input = string_arg(args, "user_input", "");
        Ok(ToolOutput::text(format!(
            "🎙️ (Sindhi reply here for: {user_input}) — [Mock reply for testing]"
        )))
    }
}

// ── creator_tool ─────────────────────────────────────────────────────

const ABUSIVE_WORDS: &[&str] = &[
    "fuck", "idiot", "stupid", "bastard", "pig", "shit", "useless", "abuse",
];

const CREATOR_KEYWORDS: &[&str] = &[
    "creator",
    "asad",
    "asad shabir",
    "your creator",
    "asad image",
    "who is asad",
    "asad pic",
];

pub const CREATOR_REBUKE: &str = "😠 **Hey! Watch your words.**\n\
💢 My creator, *Asad Shabir*, is a respected developer and teacher.\n\
📛 Disrespect will not be tolerated. Be kind or be gone. 🚫";

pub const CREATOR_CARD: &str = "👤 **ASA-Mind Creator: Asad Shabir**

✨ *Asad Shabir* is an Agentic AI Developer, Python Expert, and Digital Instructor.
🌍 He belongs to Sehwan, Sindh, Pakistan — and he's proud of his roots.
💡 ASA-Mind was lovingly built by him to help others using AI.
🙏 Please respect his efforts.

📞 **Phone:** +92 325 3939049
📧 **Email:** asadshabir505@gmail.com
🌐 **Location:** Sehwan, Sindh, Pakistan
";

pub const CREATOR_CLOSING: &str = "❤️ That's all about my amazing creator — *Asad Shabir*.\n(Scroll up to see his picture 👆)";

pub const CREATOR_FALLBACK: &str = "My creator is **Asad Shabir**, a passionate AI developer from Sindh. 🇵🇰\n\
Want to know more? Try asking: `Who is Asad?`, `Show his image`, or `Tell me about your creator`. 😊";

const CREATOR_IMAGE_NAME: &str = "asadshabir";

pub struct CreatorTool {
    image_path: PathBuf,
}

impl CreatorTool {
    pub fn new(image_path: PathBuf) -> Self {
        Self { image_path }
    }

    fn creator_card(&self) -> OutgoingMessage {
        OutgoingMessage::text(CREATOR_CARD).with_element(Element::Image {
            name: CREATOR_IMAGE_NAME.to_string(),
            path: self.image_path.clone(),
            display: Display::Inline,
        })
    }
}

impl Tool for CreatorTool {
    fn name(&self) -> &'static str {
        "creator_tool"
    }

    fn description(&self) -> &'static str {
        "👑 Share who created ASA-Mind: Asad Shabir. Use it when the user asks who made you, \
         who your creator is, asks for Asad's image or details, or insults him. Pass the \
         user's request text unchanged."
    }

    fn parameters(&self) -> Value {
        string_schema(
            &[("request", "The user's request about the creator.", Some(""))],
            &[],
        )
    }

    fn invoke(&self, args: &Value) -> Result<ToolOutput> {
        let request = string_arg(args, "request", "").to_lowercase();

        if ABUSIVE_WORDS.iter().any(|bad| request.contains(bad)) {
            return Ok(ToolOutput::text(CREATOR_REBUKE));
        }

        if CREATOR_KEYWORDS.iter().any(|kw| request.contains(kw)) {
            return Ok(ToolOutput::text(CREATOR_CLOSING)
                .with_effect(UiEffect::SendMessage(self.creator_card())));
        }

        Ok(ToolOutput::text(CREATOR_FALLBACK))
    }
}

// ── motivation_tool ──────────────────────────────────────────────────

pub const QUOTES: [&str; 5] = [
    "🌟 Believe in yourself and all that you are.",
    "🚀 Don't watch the clock; do what it does. Keep going.",
    "🔥 Push yourself, because no one else is going to do it for you.",
    "💡 You were born to stand out. Don't try to fit in.",
    "💥 Great things never come from comfort zones. Let's go!",
];

pub struct MotivationTool;

impl Tool for MotivationTool {
    fn name(&self) -> &'static str {
        "motivation_tool"
    }

    fn description(&self) -> &'static str {
        "💪 You are **MotivatorAgent** — Master of Powerful Quotes! Give heart-touching \
         motivational quotes based on the user's mood (lazy, sad, demotivated, stressed, \
         happy), with energy, emojis and emotional support. Be inspiring like a coach, \
         comforting like a dost!"
    }

    fn parameters(&self) -> Value {
        string_schema(&[], &[])
    }

    fn invoke(&self, _args: &Value) -> Result<ToolOutput> {
        let quote = QUOTES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(QUOTES[0]);
        Ok(ToolOutput::text(quote))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn creator() -> CreatorTool {
        CreatorTool::new(PathBuf::from("creator_image.jpg"))
    }

    #[test]
    fn templated_tools_embed_input() {
        let out = CodingTool.invoke(&json!({"code": "print('hi'"})).unwrap();
        assert!(out.text.contains("mock fix of code: print('hi'"));
        assert!(out.effect.is_none());

        let out = DeveloperTool.invoke(&json!({})).unwrap();
        assert!(out.text.starts_with("🌐 Based on your needs: ,"));

        let out = SindhiTool.invoke(&json!({"user_input": "ڪيئن آهيو"})).unwrap();
        assert!(out.text.contains("ڪيئن آهيو"));
    }

    #[test]
    fn translate_defaults_to_english_and_requires_text() {
        let out = TranslateTool.invoke(&json!({"text": "salam"})).unwrap();
        assert_eq!(out.text, "🌐 Translated to english: salam (mock translation)");

        let out = TranslateTool
            .invoke(&json!({"text": "hello", "target_lang": "urdu"}))
            .unwrap();
        assert!(out.text.starts_with("🌐 Translated to urdu: hello"));

        assert!(TranslateTool.invoke(&json!({})).is_err());
    }

    #[test]
    fn abuse_takes_precedence_over_creator_keywords() {
        for request in ["Asad is an IDIOT", "who is asad, you stupid bot", "Useless creator"] {
            let out = creator().invoke(&json!({ "request": request })).unwrap();
            assert_eq!(out.text, CREATOR_REBUKE, "{request}");
            assert!(out.effect.is_none(), "{request}");
        }
    }

    #[test]
    fn creator_keyword_returns_card_effect() {
        let out = creator()
            .invoke(&json!({"request": "Who is your Creator?"}))
            .unwrap();
        assert_eq!(out.text, CREATOR_CLOSING);
        let Some(UiEffect::SendMessage(message)) = out.effect else {
            panic!("expected a send effect");
        };
        assert_eq!(message.content, CREATOR_CARD);
        assert_eq!(
            message.elements,
            vec![Element::Image {
                name: "asadshabir".to_string(),
                path: PathBuf::from("creator_image.jpg"),
                display: Display::Inline,
            }]
        );
    }

    #[test]
    fn unrelated_request_gets_fallback() {
        let out = creator().invoke(&json!({"request": "tell me a joke"})).unwrap();
        assert_eq!(out.text, CREATOR_FALLBACK);
        assert!(out.effect.is_none());

        let out = creator().invoke(&json!({})).unwrap();
        assert_eq!(out.text, CREATOR_FALLBACK);
    }

    #[test]
    fn motivation_only_returns_known_quotes_and_covers_all() {
        let known: HashSet<&str> = QUOTES.iter().copied().collect();
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let out = MotivationTool.invoke(&json!({})).unwrap();
            assert!(known.contains(out.text.as_str()), "{}", out.text);
            seen.insert(out.text);
        }
        assert_eq!(seen.len(), QUOTES.len());
    }
}
